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

//! Expression AST node definitions

use crate::span::SourcePosition;
use arden_core::{BinaryOperator, DurationUnit, UnaryOperator};
use std::fmt;

/// AST representation of Arden expressions
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpressionNode {
    /// Literal value
    Literal(LiteralValue),

    /// Variable reference
    Identifier(Identifier),

    /// The implicit WHERE candidate `it`
    It(SourcePosition),

    /// NOW, EVENTTIME, TRIGGERTIME or CURRENTTIME
    Clock(ClockValue),

    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp(Box<BinaryOpData>),

    /// Unary operation (sign, NOT, duration unit)
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// `TIME OF expr`
    TimeOf(Box<ExpressionNode>),

    /// Unary comma `, expr`
    Singleton(Box<ExpressionNode>),

    /// Binary comma `left, right`
    Concat {
        /// Left operand
        left: Box<ExpressionNode>,
        /// Right operand
        right: Box<ExpressionNode>,
    },

    /// `left MERGE right`
    Merge {
        /// Left operand
        left: Box<ExpressionNode>,
        /// Right operand
        right: Box<ExpressionNode>,
    },

    /// `SORT [DATA|TIME] expr`
    Sort {
        /// Sort key
        order: SortOrder,
        /// Sequence to sort
        operand: Box<ExpressionNode>,
    },

    /// `candidates WHERE predicate`
    Where(Box<WhereData>),

    /// Grammar form without compiler support
    Reserved {
        /// Which construct was written
        construct: ReservedConstruct,
        /// Where it was written
        position: SourcePosition,
    },
}

/// Binary operation data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// WHERE expression data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhereData {
    /// Sequence being filtered
    pub candidates: ExpressionNode,
    /// Condition evaluated once per candidate with `it` bound to it
    pub predicate: ExpressionNode,
}

/// Identifier with its position
///
/// Arden identifiers are case-insensitive; [`Identifier::key`] gives the
/// normalized form used for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    /// Name as written
    pub name: String,
    /// Position of the name
    pub position: SourcePosition,
}

impl Identifier {
    /// Create an identifier
    pub fn new(name: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// Lookup key
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralValue {
    /// `NULL`
    Null,
    /// `TRUE` / `FALSE`
    Boolean(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// ISO 8601 date or date-time literal, kept as written
    Time(String),
    /// `()`
    EmptyList,
}

/// Clock keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockValue {
    /// `NOW`, the activation's now-cursor
    Now,
    /// `EVENTTIME`
    EventTime,
    /// `TRIGGERTIME`
    TriggerTime,
    /// `CURRENTTIME`
    CurrentTime,
}

/// Sort key of a SORT expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// `SORT` / `SORT DATA`
    #[default]
    Data,
    /// `SORT TIME`
    Time,
}

/// Grammar forms the parser recognizes but the compiler does not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReservedConstruct {
    /// `IS [NOT] <type>`
    IsComparison,
    /// `[NOT] IN`
    InComparison,
    /// `OCCURS ...`
    Occurs,
    /// `IS WITHIN ... TO ...` and friends
    RangeComparison,
    /// `MATCHES PATTERN`
    MatchesPattern,
    /// `FIND ... IN STRING`
    Find,
    /// Functions written `f OF x`
    OfFunction,
    /// Functions written `f n FROM x`
    FromFunction,
    /// `INDEX ... OF`
    IndexFunction,
    /// `AS NUMBER`, `AS TIME`, `AS STRING`
    AsConversion,
    /// `x[i]`
    ElementAccess,
    /// `**`
    Power,
    /// `FORMATTED WITH`
    Formatted,
    /// `||`
    StringConcat,
    /// `SEQTO`
    SeqTo,
    /// `BEFORE`
    Before,
    /// `AFTER`
    After,
    /// `AGO`
    Ago,
}

impl ReservedConstruct {
    /// Keyword shown in diagnostics
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::IsComparison => "IS",
            Self::InComparison => "IN",
            Self::Occurs => "OCCURS",
            Self::RangeComparison => "WITHIN",
            Self::MatchesPattern => "MATCHES PATTERN",
            Self::Find => "FIND",
            Self::OfFunction => "OF",
            Self::FromFunction => "FROM",
            Self::IndexFunction => "INDEX",
            Self::AsConversion => "AS",
            Self::ElementAccess => "[]",
            Self::Power => "**",
            Self::Formatted => "FORMATTED WITH",
            Self::StringConcat => "||",
            Self::SeqTo => "SEQTO",
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::Ago => "AGO",
        }
    }
}

impl fmt::Display for ReservedConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl ExpressionNode {
    /// Create a literal expression
    pub fn literal(value: LiteralValue) -> Self {
        Self::Literal(value)
    }

    /// Create a number literal
    pub fn number(value: f64) -> Self {
        Self::Literal(LiteralValue::Number(value))
    }

    /// Create a string literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(LiteralValue::String(value.into()))
    }

    /// Create a boolean literal
    pub fn boolean(value: bool) -> Self {
        Self::Literal(LiteralValue::Boolean(value))
    }

    /// Create a `NULL` literal
    pub fn null() -> Self {
        Self::Literal(LiteralValue::Null)
    }

    /// Create an ISO time literal
    pub fn time(text: impl Into<String>) -> Self {
        Self::Literal(LiteralValue::Time(text.into()))
    }

    /// Create an identifier reference without position information
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(Identifier::new(name, SourcePosition::default()))
    }

    /// Create an `it` reference without position information
    pub fn it() -> Self {
        Self::It(SourcePosition::default())
    }

    /// Create a `NOW` reference
    pub fn now() -> Self {
        Self::Clock(ClockValue::Now)
    }

    /// Create a binary operation
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a unary operation
    pub fn unary_op(op: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Attach a duration unit to a numeric expression
    pub fn duration(amount: ExpressionNode, unit: DurationUnit) -> Self {
        Self::unary_op(UnaryOperator::Duration(unit), amount)
    }

    /// Create a `TIME OF` expression
    pub fn time_of(operand: ExpressionNode) -> Self {
        Self::TimeOf(Box::new(operand))
    }

    /// Create a unary comma
    pub fn singleton(operand: ExpressionNode) -> Self {
        Self::Singleton(Box::new(operand))
    }

    /// Create a binary comma
    pub fn concat(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::Concat {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build a comma list from several expressions
    ///
    /// A single element becomes a unary comma; no elements give `()`.
    pub fn list(items: impl IntoIterator<Item = ExpressionNode>) -> Self {
        let mut items = items.into_iter();
        let Some(first) = items.next() else {
            return Self::Literal(LiteralValue::EmptyList);
        };
        let first = Self::singleton(first);
        items.fold(first, Self::concat)
    }

    /// Create a MERGE expression
    pub fn merge(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::Merge {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a SORT expression
    pub fn sort(order: SortOrder, operand: ExpressionNode) -> Self {
        Self::Sort {
            order,
            operand: Box::new(operand),
        }
    }

    /// Create a WHERE expression
    pub fn where_(candidates: ExpressionNode, predicate: ExpressionNode) -> Self {
        Self::Where(Box::new(WhereData {
            candidates,
            predicate,
        }))
    }

    /// Create a reserved construct without position information
    pub fn reserved(construct: ReservedConstruct) -> Self {
        Self::Reserved {
            construct,
            position: SourcePosition::default(),
        }
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Get as identifier if this is one
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Number of nodes in this expression
    pub fn complexity(&self) -> usize {
        match self {
            Self::Literal(_)
            | Self::Identifier(_)
            | Self::It(_)
            | Self::Clock(_)
            | Self::Reserved { .. } => 1,
            Self::BinaryOp(data) => 1 + data.left.complexity() + data.right.complexity(),
            Self::UnaryOp { operand, .. }
            | Self::TimeOf(operand)
            | Self::Singleton(operand)
            | Self::Sort { operand, .. } => 1 + operand.complexity(),
            Self::Concat { left, right } | Self::Merge { left, right } => {
                1 + left.complexity() + right.complexity()
            }
            Self::Where(data) => 1 + data.candidates.complexity() + data.predicate.complexity(),
        }
    }
}
