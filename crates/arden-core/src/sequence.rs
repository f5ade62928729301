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

//! Sequence operations
//!
//! List building (the unary and binary comma), time and data sorting, merge
//! and WHERE filtering, both pairwise and over per-candidate predicate
//! results. Sorts are stable.

use crate::value::{ArdenValue, ValueData};
use std::cmp::Ordering;

/// One-element list holding `value` (unary comma)
pub fn singleton(value: ArdenValue) -> ArdenValue {
    ArdenValue::list(vec![value])
}

/// Concatenate two values into one flat list (binary comma)
///
/// List operands contribute their elements, scalars contribute themselves.
pub fn flatten(left: ArdenValue, right: ArdenValue) -> ArdenValue {
    let mut values = left.into_elements();
    values.extend(right.into_elements());
    ArdenValue::list(values)
}

/// Sort by primary time, ascending; untimed elements go last
pub fn sort_by_time(value: ArdenValue) -> ArdenValue {
    let mut values = value.into_elements();
    values.sort_by(|a, b| match (a.primary_time(), b.primary_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ArdenValue::list(values)
}

/// Sort by payload, ascending; nulls go last
pub fn sort_by_data(value: ArdenValue) -> ArdenValue {
    let mut values = value.into_elements();
    values.sort_by(compare_data);
    ArdenValue::list(values)
}

/// Flatten both operands and sort the result by primary time
pub fn merge(left: ArdenValue, right: ArdenValue) -> ArdenValue {
    sort_by_time(flatten(left, right))
}

/// Keep the candidates whose flag is boolean `true`
///
/// Flags pair up with candidates by position. A scalar flag applies to every
/// candidate; missing flags count as false.
pub fn where_filter(candidates: ArdenValue, flags: &ArdenValue) -> ArdenValue {
    let candidates = candidates.into_elements();
    let kept = match flags.as_list() {
        Some(flags) => candidates
            .into_iter()
            .zip(flags.iter().map(ArdenValue::is_true).chain(std::iter::repeat(false)))
            .filter_map(|(candidate, keep)| keep.then_some(candidate))
            .collect(),
        None if flags.is_true() => candidates,
        None => Vec::new(),
    };
    ArdenValue::list(kept)
}

/// Filter candidates against the predicate results gathered one per candidate
///
/// A result that is a list as long as the candidate set is read at the
/// candidate's position, so `x WHERE x > 2` filters pairwise. Any other result
/// is the candidate's flag as is.
pub fn where_per_candidate(candidates: Vec<ArdenValue>, results: Vec<ArdenValue>) -> ArdenValue {
    let count = candidates.len();
    let flags = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            let picked = result
                .as_list()
                .filter(|items| items.len() == count)
                .and_then(|items| items.get(index).cloned());
            picked.unwrap_or(result)
        })
        .collect();
    where_filter(ArdenValue::list(candidates), &ArdenValue::list(flags))
}

/// Total order on payloads used by `sort_by_data`
///
/// Values of the same type compare naturally; different types order by a
/// fixed rank with null ranked last.
pub fn compare_data(a: &ArdenValue, b: &ArdenValue) -> Ordering {
    match (a.data(), b.data()) {
        (ValueData::Number(x), ValueData::Number(y)) => x.total_cmp(y),
        (ValueData::String(x), ValueData::String(y)) => x.cmp(y),
        (ValueData::Time(x), ValueData::Time(y)) => x.cmp(y),
        (ValueData::Duration(x), ValueData::Duration(y)) => {
            x.as_seconds().total_cmp(&y.as_seconds())
        }
        (ValueData::Boolean(x), ValueData::Boolean(y)) => x.cmp(y),
        (ValueData::List(x), ValueData::List(y)) => x.len().cmp(&y.len()),
        (x, y) => type_rank(x).cmp(&type_rank(y)),
    }
}

fn type_rank(data: &ValueData) -> u8 {
    match data {
        ValueData::Boolean(_) => 0,
        ValueData::Number(_) => 1,
        ValueData::String(_) => 2,
        ValueData::Time(_) => 3,
        ValueData::Duration(_) => 4,
        ValueData::List(_) => 5,
        ValueData::Null => 6,
    }
}
