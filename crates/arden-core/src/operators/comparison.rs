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

//! Comparison operators
//!
//! Numbers, strings and times are ordered; durations are ordered by their
//! length in seconds; booleans only support equality. The operands' primary
//! times do not take part in the comparison, but the result carries the later
//! of the two.

use super::BinaryOperator;
use crate::value::{ArdenValue, ValueData};
use std::cmp::Ordering;

pub(super) fn compare(op: BinaryOperator, left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    let time = left.primary_time().max(right.primary_time());
    let data = match order(left, right) {
        Some(ordering) => ValueData::Boolean(holds(op, ordering)),
        None => match (op, left.data(), right.data()) {
            (BinaryOperator::Equal, ValueData::Boolean(a), ValueData::Boolean(b)) => {
                ValueData::Boolean(a == b)
            }
            (BinaryOperator::NotEqual, ValueData::Boolean(a), ValueData::Boolean(b)) => {
                ValueData::Boolean(a != b)
            }
            _ => ValueData::Null,
        },
    };
    ArdenValue::new(data, time)
}

fn order(left: &ArdenValue, right: &ArdenValue) -> Option<Ordering> {
    match (left.data(), right.data()) {
        (ValueData::Number(a), ValueData::Number(b)) => a.partial_cmp(b),
        (ValueData::String(a), ValueData::String(b)) => Some(a.cmp(b)),
        (ValueData::Time(a), ValueData::Time(b)) => Some(a.cmp(b)),
        (ValueData::Duration(a), ValueData::Duration(b)) => {
            a.as_seconds().partial_cmp(&b.as_seconds())
        }
        _ => None,
    }
}

fn holds(op: BinaryOperator, ordering: Ordering) -> bool {
    match op {
        BinaryOperator::Equal => ordering == Ordering::Equal,
        BinaryOperator::NotEqual => ordering != Ordering::Equal,
        BinaryOperator::GreaterOrEqual => ordering != Ordering::Less,
        BinaryOperator::Greater => ordering == Ordering::Greater,
        BinaryOperator::LessOrEqual => ordering != Ordering::Greater,
        BinaryOperator::Less => ordering == Ordering::Less,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{ArdenDuration, DurationUnit};
    use crate::value::Timestamp;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[rstest]
    #[case(BinaryOperator::Equal, 1.0, 1.0, true)]
    #[case(BinaryOperator::Equal, 1.0, 2.0, false)]
    #[case(BinaryOperator::NotEqual, 1.0, 2.0, true)]
    #[case(BinaryOperator::Less, 1.0, 2.0, true)]
    #[case(BinaryOperator::LessOrEqual, 2.0, 2.0, true)]
    #[case(BinaryOperator::Greater, 1.0, 2.0, false)]
    #[case(BinaryOperator::GreaterOrEqual, 3.0, 2.0, true)]
    fn test_number_comparison(
        #[case] op: BinaryOperator,
        #[case] left: f64,
        #[case] right: f64,
        #[case] expected: bool,
    ) {
        assert_eq!(compare(op, &left.into(), &right.into()), ArdenValue::boolean(expected));
    }

    #[test]
    fn test_string_and_time_ordering() {
        assert!(compare(BinaryOperator::Less, &"abc".into(), &"abd".into()).is_true());
        assert!(compare(BinaryOperator::Greater, &ArdenValue::time(at(5)), &ArdenValue::time(at(4))).is_true());
    }

    #[test]
    fn test_duration_ordering_across_units() {
        let hours = ArdenValue::duration(ArdenDuration::new(36.0, DurationUnit::Hours));
        let day = ArdenValue::duration(ArdenDuration::new(1.0, DurationUnit::Days));
        assert!(compare(BinaryOperator::Greater, &hours, &day).is_true());
    }

    #[test]
    fn test_mismatched_types_are_null() {
        assert!(compare(BinaryOperator::Equal, &1.0.into(), &"1".into()).is_null());
        assert!(compare(BinaryOperator::Less, &true.into(), &false.into()).is_null());
        assert!(compare(BinaryOperator::Equal, &ArdenValue::null(), &ArdenValue::null()).is_null());
    }

    #[test]
    fn test_boolean_equality() {
        assert!(compare(BinaryOperator::Equal, &true.into(), &true.into()).is_true());
        assert!(compare(BinaryOperator::NotEqual, &true.into(), &false.into()).is_true());
    }

    #[test]
    fn test_result_takes_later_primary_time() {
        let early = ArdenValue::new(ValueData::Number(1.0), Some(at(1)));
        let late = ArdenValue::new(ValueData::Number(1.0), Some(at(7)));
        assert_eq!(compare(BinaryOperator::Equal, &early, &late).primary_time(), Some(at(7)));
        assert_eq!(compare(BinaryOperator::Equal, &late, &early).primary_time(), Some(at(7)));
        assert_eq!(
            compare(BinaryOperator::Equal, &early, &1.0.into()).primary_time(),
            Some(at(1))
        );
    }
}
