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

//! Arden value representation
//!
//! Every value pairs a payload with a primary time: the instant the datum
//! refers to, such as when a lab result was observed. `None` is the explicit
//! "no primary time" sentinel. Lists never carry a primary time of their own;
//! their elements keep theirs.

use crate::temporal::{ArdenDuration, format_number};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instant used for time payloads and primary times
pub type Timestamp = DateTime<Utc>;

/// Payload of an Arden value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
    /// Missing or unknown value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Numeric value
    Number(f64),
    /// String value
    String(String),
    /// Point in time
    Time(Timestamp),
    /// Signed time offset
    Duration(ArdenDuration),
    /// Ordered sequence of values
    List(Vec<ArdenValue>),
}

/// Immutable Arden value with its primary time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArdenValue {
    data: ValueData,
    primary_time: Option<Timestamp>,
}

impl ArdenValue {
    /// Create a value with an explicit primary time
    ///
    /// The time is dropped for lists.
    pub fn new(data: ValueData, primary_time: Option<Timestamp>) -> Self {
        let primary_time = match data {
            ValueData::List(_) => None,
            _ => primary_time,
        };
        Self { data, primary_time }
    }

    /// Untimed null
    pub fn null() -> Self {
        Self::new(ValueData::Null, None)
    }

    /// Untimed boolean
    pub fn boolean(value: bool) -> Self {
        Self::new(ValueData::Boolean(value), None)
    }

    /// Untimed number
    pub fn number(value: f64) -> Self {
        Self::new(ValueData::Number(value), None)
    }

    /// Untimed string
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueData::String(value.into()), None)
    }

    /// Untimed time payload
    pub fn time(value: Timestamp) -> Self {
        Self::new(ValueData::Time(value), None)
    }

    /// Untimed duration
    pub fn duration(value: ArdenDuration) -> Self {
        Self::new(ValueData::Duration(value), None)
    }

    /// List of values
    pub fn list(values: Vec<ArdenValue>) -> Self {
        Self::new(ValueData::List(values), None)
    }

    /// Empty list
    pub fn empty_list() -> Self {
        Self::list(Vec::new())
    }

    /// Payload of this value
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    /// Consume the value and return its payload
    pub fn into_data(self) -> ValueData {
        self.data
    }

    /// Primary time, `None` when the value is untimed
    pub fn primary_time(&self) -> Option<Timestamp> {
        self.primary_time
    }

    /// Copy of this value with a new primary time
    ///
    /// For lists the time is applied to every element.
    pub fn with_primary_time(&self, time: Option<Timestamp>) -> Self {
        match &self.data {
            ValueData::List(values) => Self::list(
                values
                    .iter()
                    .map(|value| value.with_primary_time(time))
                    .collect(),
            ),
            data => Self::new(data.clone(), time),
        }
    }

    /// Rebind the primary time from `source`
    ///
    /// A time payload in `source` becomes the new primary time; any other
    /// source clears it.
    pub fn change_time(&self, source: &ArdenValue) -> Self {
        match source.data {
            ValueData::Time(time) => self.with_primary_time(Some(time)),
            _ => self.with_primary_time(None),
        }
    }

    /// Whether the payload is null
    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    /// Whether the payload is the boolean `true`
    pub fn is_true(&self) -> bool {
        matches!(self.data, ValueData::Boolean(true))
    }

    /// Boolean payload, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            ValueData::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Numeric payload, if any
    pub fn as_number(&self) -> Option<f64> {
        match self.data {
            ValueData::Number(n) => Some(n),
            _ => None,
        }
    }

    /// String payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Time payload, if any
    pub fn as_time(&self) -> Option<Timestamp> {
        match self.data {
            ValueData::Time(t) => Some(t),
            _ => None,
        }
    }

    /// List elements, if this is a list
    pub fn as_list(&self) -> Option<&[ArdenValue]> {
        match &self.data {
            ValueData::List(values) => Some(values),
            _ => None,
        }
    }

    /// Elements of a list, or the value itself as a single element
    pub fn into_elements(self) -> Vec<ArdenValue> {
        match self.data {
            ValueData::List(values) => values,
            _ => vec![self],
        }
    }

    /// Primary time as a value: a time payload, or null when untimed
    ///
    /// Lists answer with the list of their elements' times.
    pub fn time_of(&self) -> Self {
        match &self.data {
            ValueData::List(values) => Self::list(values.iter().map(Self::time_of).collect()),
            _ => match self.primary_time {
                Some(time) => Self::time(time),
                None => Self::null(),
            },
        }
    }

    /// Type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self.data {
            ValueData::Null => "Null",
            ValueData::Boolean(_) => "Boolean",
            ValueData::Number(_) => "Number",
            ValueData::String(_) => "String",
            ValueData::Time(_) => "Time",
            ValueData::Duration(_) => "Duration",
            ValueData::List(_) => "List",
        }
    }
}

impl Default for ArdenValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<bool> for ArdenValue {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

impl From<f64> for ArdenValue {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<i32> for ArdenValue {
    fn from(value: i32) -> Self {
        Self::number(f64::from(value))
    }
}

impl From<&str> for ArdenValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for ArdenValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<Timestamp> for ArdenValue {
    fn from(value: Timestamp) -> Self {
        Self::time(value)
    }
}

impl From<ArdenDuration> for ArdenValue {
    fn from(value: ArdenDuration) -> Self {
        Self::duration(value)
    }
}

impl From<Vec<ArdenValue>> for ArdenValue {
    fn from(values: Vec<ArdenValue>) -> Self {
        Self::list(values)
    }
}

impl fmt::Display for ArdenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::Null => write!(f, "null"),
            ValueData::Boolean(b) => write!(f, "{b}"),
            ValueData::Number(n) => write!(f, "{}", format_number(*n)),
            ValueData::String(s) => write!(f, "{s}"),
            ValueData::Time(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            ValueData::Duration(d) => write!(f, "{d}"),
            ValueData::List(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
        }
    }
}
