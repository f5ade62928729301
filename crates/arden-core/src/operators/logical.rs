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

//! Logical operators with three-valued (Kleene) semantics

use super::shared_time;
use crate::value::{ArdenValue, ValueData};

pub(super) fn and(left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    // false dominates null, null dominates true:
    // - true and true = true
    // - false and anything = false
    // - true and null = null
    // - null and null = null
    let data = match (left.as_bool(), right.as_bool()) {
        (Some(false), _) | (_, Some(false)) => ValueData::Boolean(false),
        (Some(true), Some(true)) => ValueData::Boolean(true),
        _ => ValueData::Null,
    };
    ArdenValue::new(data, shared_time(left, right))
}

pub(super) fn or(left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
    // dual of and: true dominates null
    let data = match (left.as_bool(), right.as_bool()) {
        (Some(true), _) | (_, Some(true)) => ValueData::Boolean(true),
        (Some(false), Some(false)) => ValueData::Boolean(false),
        _ => ValueData::Null,
    };
    ArdenValue::new(data, shared_time(left, right))
}

pub(super) fn not(operand: &ArdenValue) -> ArdenValue {
    let data = match operand.as_bool() {
        Some(b) => ValueData::Boolean(!b),
        None => ValueData::Null,
    };
    ArdenValue::new(data, operand.primary_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn value(v: Option<bool>) -> ArdenValue {
        v.map(ArdenValue::boolean).unwrap_or_else(ArdenValue::null)
    }

    #[rstest]
    #[case(Some(true), Some(true), Some(true))]
    #[case(Some(true), Some(false), Some(false))]
    #[case(Some(true), None, None)]
    #[case(Some(false), Some(true), Some(false))]
    #[case(Some(false), Some(false), Some(false))]
    #[case(Some(false), None, Some(false))]
    #[case(None, Some(true), None)]
    #[case(None, Some(false), Some(false))]
    #[case(None, None, None)]
    fn test_and_truth_table(
        #[case] left: Option<bool>,
        #[case] right: Option<bool>,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(and(&value(left), &value(right)), value(expected));
    }

    #[rstest]
    #[case(Some(true), Some(true), Some(true))]
    #[case(Some(true), Some(false), Some(true))]
    #[case(Some(true), None, Some(true))]
    #[case(Some(false), Some(true), Some(true))]
    #[case(Some(false), Some(false), Some(false))]
    #[case(Some(false), None, None)]
    #[case(None, Some(true), Some(true))]
    #[case(None, Some(false), None)]
    #[case(None, None, None)]
    fn test_or_truth_table(
        #[case] left: Option<bool>,
        #[case] right: Option<bool>,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(or(&value(left), &value(right)), value(expected));
    }

    #[test]
    fn test_non_boolean_operands_act_as_null() {
        assert!(and(&ArdenValue::number(1.0), &true.into()).is_null());
        assert_eq!(and(&ArdenValue::string("x"), &false.into()), ArdenValue::boolean(false));
        assert!(or(&ArdenValue::number(0.0), &false.into()).is_null());
    }

    #[test]
    fn test_not() {
        assert_eq!(not(&true.into()), ArdenValue::boolean(false));
        assert_eq!(not(&false.into()), ArdenValue::boolean(true));
        assert!(not(&ArdenValue::null()).is_null());
        assert!(not(&ArdenValue::number(1.0)).is_null());
    }
}
