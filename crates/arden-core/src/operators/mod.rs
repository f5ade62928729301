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

//! Operator semantics
//!
//! The operator set is closed. Each operator is an enum variant dispatched
//! through a plain `match` to the function implementing it. Operators are
//! total: operands of the wrong type produce null, never an error.
//!
//! Binary operators broadcast over lists. A list and a scalar combine element
//! by element; two lists combine pairwise when their lengths agree and give
//! null otherwise.

mod arithmetic;
mod comparison;
mod duration;
mod logical;

use crate::temporal::DurationUnit;
use crate::value::{ArdenValue, Timestamp, ValueData};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `=` / `EQ`
    Equal,
    /// `<>` / `NE`
    NotEqual,
    /// `>=` / `GE`
    GreaterOrEqual,
    /// `>` / `GT`
    Greater,
    /// `<=` / `LE`
    LessOrEqual,
    /// `<` / `LT`
    Less,
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl BinaryOperator {
    /// Operator symbol as written in Arden
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
            Self::Less => "<",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Whether this is one of the six comparison operators
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::GreaterOrEqual
                | Self::Greater
                | Self::LessOrEqual
                | Self::Less
        )
    }

    /// Apply the operator, broadcasting over lists
    pub fn run(&self, left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
        match (left.data(), right.data()) {
            (ValueData::List(lhs), ValueData::List(rhs)) => {
                if lhs.len() != rhs.len() {
                    return ArdenValue::null();
                }
                ArdenValue::list(lhs.iter().zip(rhs).map(|(l, r)| self.run(l, r)).collect())
            }
            (ValueData::List(lhs), _) => {
                ArdenValue::list(lhs.iter().map(|l| self.run(l, right)).collect())
            }
            (_, ValueData::List(rhs)) => {
                ArdenValue::list(rhs.iter().map(|r| self.run(left, r)).collect())
            }
            _ => self.run_scalar(left, right),
        }
    }

    fn run_scalar(&self, left: &ArdenValue, right: &ArdenValue) -> ArdenValue {
        match self {
            Self::Add => arithmetic::add(left, right),
            Self::Subtract => arithmetic::subtract(left, right),
            Self::Multiply => arithmetic::multiply(left, right),
            Self::Divide => arithmetic::divide(left, right),
            Self::Equal
            | Self::NotEqual
            | Self::GreaterOrEqual
            | Self::Greater
            | Self::LessOrEqual
            | Self::Less => comparison::compare(*self, left, right),
            Self::And => logical::and(left, right),
            Self::Or => logical::or(left, right),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators, including the duration unit keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Unary `+`
    Plus,
    /// Unary `-`
    Minus,
    /// `NOT`
    Not,
    /// Number to duration in the given unit
    Duration(DurationUnit),
}

impl UnaryOperator {
    /// Operator symbol as written in Arden
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "not",
            Self::Duration(unit) => unit.keyword(),
        }
    }

    /// Apply the operator element-wise
    pub fn run(&self, operand: &ArdenValue) -> ArdenValue {
        if let ValueData::List(values) = operand.data() {
            return ArdenValue::list(values.iter().map(|v| self.run(v)).collect());
        }
        match self {
            Self::Plus => duration::plus(operand),
            Self::Minus => duration::minus(operand),
            Self::Not => logical::not(operand),
            Self::Duration(unit) => duration::to_duration(operand, *unit),
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Primary time shared by both operands, `None` when they differ
fn shared_time(left: &ArdenValue, right: &ArdenValue) -> Option<Timestamp> {
    match (left.primary_time(), right.primary_time()) {
        (Some(l), Some(r)) if l == r => Some(l),
        _ => None,
    }
}
