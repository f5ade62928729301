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

//! Durations and calendar arithmetic
//!
//! Durations come in two families. Seconds-based units (SECONDS through
//! WEEKS) have a fixed length. Calendar units (MONTHS, YEARS) are applied to
//! timestamps month by month, so `2024-01-31 + 1 MONTHS` lands on
//! `2024-02-29`. Where a calendar duration has to be expressed in seconds
//! the average Gregorian month is used.

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the average Gregorian month in seconds (365.2425 days / 12)
pub const SECONDS_PER_AVERAGE_MONTH: f64 = 2_629_746.0;

/// Unit keyword attached to a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    /// SECONDS
    Seconds,
    /// MINUTES
    Minutes,
    /// HOURS
    Hours,
    /// DAYS
    Days,
    /// WEEKS
    Weeks,
    /// MONTHS
    Months,
    /// YEARS
    Years,
}

impl DurationUnit {
    /// All units in ascending order of length
    pub const ALL: [DurationUnit; 7] = [
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::Days,
        Self::Weeks,
        Self::Months,
        Self::Years,
    ];

    /// Whether this unit is applied with calendar arithmetic
    pub fn is_calendar(&self) -> bool {
        matches!(self, Self::Months | Self::Years)
    }

    /// Seconds per unit for fixed units, months per unit for calendar units
    pub fn factor(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3_600.0,
            Self::Days => 86_400.0,
            Self::Weeks => 604_800.0,
            Self::Months => 1.0,
            Self::Years => 12.0,
        }
    }

    /// Arden keyword for this unit
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Signed time offset with its declared unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArdenDuration {
    /// Signed amount, expressed in `unit`
    pub amount: f64,
    /// Declared unit
    pub unit: DurationUnit,
}

impl ArdenDuration {
    /// Create a duration of `amount` units
    pub fn new(amount: f64, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    /// Create a duration in seconds
    pub fn seconds(amount: f64) -> Self {
        Self::new(amount, DurationUnit::Seconds)
    }

    /// Whether this duration uses calendar units
    pub fn is_calendar(&self) -> bool {
        self.unit.is_calendar()
    }

    /// Length in months, only for calendar durations
    pub fn as_months(&self) -> Option<f64> {
        self.is_calendar().then(|| self.amount * self.unit.factor())
    }

    /// Length in seconds; calendar durations use the average month
    pub fn as_seconds(&self) -> f64 {
        match self.as_months() {
            Some(months) => months * SECONDS_PER_AVERAGE_MONTH,
            None => self.amount * self.unit.factor(),
        }
    }

    /// Same duration pointing the other way
    pub fn negate(&self) -> Self {
        Self::new(-self.amount, self.unit)
    }

    /// Multiply the amount, keeping the unit
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.amount * factor, self.unit)
    }

    /// Sum of two durations
    ///
    /// Equal units keep their unit. Two calendar durations sum in months; any
    /// other mix is expressed in seconds.
    pub fn plus(&self, other: &ArdenDuration) -> Self {
        if self.unit == other.unit {
            return Self::new(self.amount + other.amount, self.unit);
        }
        match (self.as_months(), other.as_months()) {
            (Some(left), Some(right)) => Self::new(left + right, DurationUnit::Months),
            _ => Self::seconds(self.as_seconds() + other.as_seconds()),
        }
    }

    /// Shift a timestamp by this duration, or `None` when out of range
    pub fn add_to(&self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let Some(months) = self.as_months() else {
            return time.checked_add_signed(delta_from_seconds(self.as_seconds())?);
        };
        if !months.is_finite() {
            return None;
        }
        let whole = months.trunc();
        if whole.abs() > f64::from(u32::MAX) {
            return None;
        }
        let shifted = if whole >= 0.0 {
            time.checked_add_months(Months::new(whole as u32))?
        } else {
            time.checked_sub_months(Months::new((-whole) as u32))?
        };
        let remainder = (months - whole) * SECONDS_PER_AVERAGE_MONTH;
        shifted.checked_add_signed(delta_from_seconds(remainder)?)
    }

    /// Seconds elapsed from `start` to `end`
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let millis = (end - start).num_milliseconds();
        Self::seconds(millis as f64 / 1000.0)
    }
}

impl fmt::Display for ArdenDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_number(self.amount), self.unit)
    }
}

/// Render a number without a trailing `.0` for integral values
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn delta_from_seconds(seconds: f64) -> Option<TimeDelta> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}
