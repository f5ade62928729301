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

//! Unary sign operators and duration unit constructors

use crate::temporal::{ArdenDuration, DurationUnit};
use crate::value::{ArdenValue, ValueData};

pub(super) fn to_duration(operand: &ArdenValue, unit: DurationUnit) -> ArdenValue {
    let data = match operand.data() {
        ValueData::Number(n) => ValueData::Duration(ArdenDuration::new(*n, unit)),
        _ => ValueData::Null,
    };
    ArdenValue::new(data, operand.primary_time())
}

pub(super) fn plus(operand: &ArdenValue) -> ArdenValue {
    match operand.data() {
        ValueData::Number(_) | ValueData::Duration(_) => operand.clone(),
        _ => ArdenValue::new(ValueData::Null, operand.primary_time()),
    }
}

pub(super) fn minus(operand: &ArdenValue) -> ArdenValue {
    let data = match operand.data() {
        ValueData::Number(n) => ValueData::Number(-n),
        ValueData::Duration(d) => ValueData::Duration(d.negate()),
        _ => ValueData::Null,
    };
    ArdenValue::new(data, operand.primary_time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_unit_builds_a_duration() {
        for unit in DurationUnit::ALL {
            let result = to_duration(&ArdenValue::number(3.0), unit);
            assert_eq!(result, ArdenValue::duration(ArdenDuration::new(3.0, unit)));
        }
    }

    #[test]
    fn test_non_number_unit_operand_is_null() {
        assert!(to_duration(&ArdenValue::string("3"), DurationUnit::Days).is_null());
        assert!(to_duration(&ArdenValue::null(), DurationUnit::Days).is_null());
    }

    #[test]
    fn test_sign_operators() {
        assert_eq!(minus(&ArdenValue::number(2.0)), ArdenValue::number(-2.0));
        let week = ArdenDuration::new(1.0, DurationUnit::Weeks);
        assert_eq!(
            minus(&ArdenValue::duration(week)),
            ArdenValue::duration(week.negate())
        );
        assert_eq!(plus(&ArdenValue::number(2.0)), ArdenValue::number(2.0));
        assert!(plus(&ArdenValue::string("2")).is_null());
        assert!(minus(&ArdenValue::boolean(true)).is_null());
    }
}
