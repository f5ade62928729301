// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arithmetic operators
//!
//! Results keep the operands' primary time only when both operands share it.

use super::shared_time;
use crate::temporal::ArdenDuration;
use crate::value::{ArdenValue, ValueData};

pub(super) fn add(left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    let data = match (left.data(), right.data()) {
        (ValueData::Number(a), ValueData::Number(b)) => ValueData::Number(a + b),
        (ValueData::Time(t), ValueData::Duration(d)) | (ValueData::Duration(d), ValueData::Time(t)) => {
            match d.add_to(*t) {
                Some(shifted) => ValueData::Time(shifted),
                None => ValueData::Null,
            }
        }
        (ValueData::Duration(a), ValueData::Duration(b)) => ValueData::Duration(a.plus(b)),
        _ => ValueData::Null,
    };
    ArdenValue::new(data, shared_time(left, right))
}

pub(super) fn subtract(left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    let data = match (left.data(), right.data()) {
        (ValueData::Number(a), ValueData::Number(b)) => ValueData::Number(a - b),
        (ValueData::Time(t), ValueData::Duration(d)) => match d.negate().add_to(*t) {
            Some(shifted) => ValueData::Time(shifted),
            None => ValueData::Null,
        },
        (ValueData::Time(a), ValueData::Time(b)) => {
            ValueData::Duration(ArdenDuration::between(*b, *a))
        }
        (ValueData::Duration(a), ValueData::Duration(b)) => {
            ValueData::Duration(a.plus(&b.negate()))
        }
        _ => ValueData::Null,
    };
    ArdenValue::new(data, shared_time(left, right))
}

pub(super) fn multiply(left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    let data = match (left.data(), right.data()) {
        (ValueData::Number(a), ValueData::Number(b)) => ValueData::Number(a * b),
        (ValueData::Number(n), ValueData::Duration(d))
        | (ValueData::Duration(d), ValueData::Number(n)) => ValueData::Duration(d.scale(*n)),
        _ => ValueData::Null,
    };
    ArdenValue::new(data, shared_time(left, right))
}

pub(super) fn divide(left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    let data = match (left.data(), right.data()) {
        (ValueData::Number(_), ValueData::Number(b)) if *b == 0.0 => ValueData::Null,
        (ValueData::Number(a), ValueData::Number(b)) => ValueData::Number(a / b),
        (ValueData::Duration(_), ValueData::Number(n)) if *n == 0.0 => ValueData::Null,
        (ValueData::Duration(d), ValueData::Number(n)) => ValueData::Duration(d.scale(1.0 / n)),
        (ValueData::Duration(a), ValueData::Duration(b)) => {
            let divisor = b.as_seconds();
            if divisor == 0.0 {
                ValueData::Null
            } else {
                ValueData::Number(a.as_seconds() / divisor)
            }
        }
        _ => ValueData::Null,
    };
    ArdenValue::new(data, shared_time(left, right))
}
