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

//! Statement AST node definitions

use crate::expression::{ExpressionNode, Identifier};
use crate::span::SourcePosition;
use smallvec::SmallVec;
use std::fmt;

/// Statement in a DATA, LOGIC or ACTION block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    /// `target := phrase` or `LET target BE phrase`
    Assign(Box<Assignment>),

    /// `IF ... THEN ... ELSEIF ... ELSE ... ENDIF`
    If(Box<IfData>),

    /// `FOR id IN expr DO ... ENDDO`
    For(Box<ForData>),

    /// `WHILE expr DO ... ENDDO`
    While(Box<WhileData>),

    /// `CONCLUDE expr`
    Conclude {
        /// Logic result; only boolean true concludes positively
        value: ExpressionNode,
        /// Statement position
        position: SourcePosition,
    },

    /// `RETURN expr, ...`
    Return {
        /// Returned values, in order
        values: Vec<ExpressionNode>,
        /// Statement position
        position: SourcePosition,
    },

    /// `WRITE expr [AT destination]`
    Write {
        /// Message to deliver
        message: ExpressionNode,
        /// DESTINATION variable; the default destination when absent
        destination: Option<Identifier>,
        /// Statement position
        position: SourcePosition,
    },

    /// `CALL var [WITH args] [DELAY expr]`
    Call(Box<CallData>),
}

/// Assignment data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    /// What is assigned to
    pub target: LeftHandSide,
    /// Right-hand side
    pub phrase: AssignPhrase,
    /// Statement position
    pub position: SourcePosition,
}

/// IF statement data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IfData {
    /// IF branch followed by ELSEIF branches, tried in order
    pub branches: Vec<ConditionalBranch>,
    /// ELSE body
    pub otherwise: Option<Vec<Statement>>,
    /// Statement position
    pub position: SourcePosition,
}

/// One IF or ELSEIF branch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionalBranch {
    /// Condition; the branch runs only when it is boolean true
    pub condition: ExpressionNode,
    /// Branch body
    pub body: Vec<Statement>,
    /// Position of the condition keyword
    pub position: SourcePosition,
}

/// FOR statement data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForData {
    /// Loop variable, a data variable
    pub variable: Identifier,
    /// Sequence iterated over
    pub sequence: ExpressionNode,
    /// Loop body
    pub body: Vec<Statement>,
    /// Statement position
    pub position: SourcePosition,
}

/// WHILE statement data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhileData {
    /// Loop condition, re-evaluated before every iteration
    pub condition: ExpressionNode,
    /// Loop body
    pub body: Vec<Statement>,
    /// Statement position
    pub position: SourcePosition,
}

/// CALL statement data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallData {
    /// MLM or INTERFACE variable being called
    pub target: Identifier,
    /// Arguments
    pub arguments: SmallVec<[ExpressionNode; 4]>,
    /// DELAY expression
    pub delay: Option<ExpressionNode>,
    /// Statement position
    pub position: SourcePosition,
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LeftHandSide {
    /// `x := ...`
    Identifier(Identifier),
    /// `TIME OF x := ...`
    TimeOf(Identifier),
    /// `NOW := ...`
    Now(SourcePosition),
    /// `(a, b) := ...`
    IdentifierList(Vec<Identifier>, SourcePosition),
}

impl LeftHandSide {
    /// Position of the target
    pub fn position(&self) -> SourcePosition {
        match self {
            Self::Identifier(id) | Self::TimeOf(id) => id.position,
            Self::Now(position) | Self::IdentifierList(_, position) => *position,
        }
    }

    /// The identifier, when the target is a bare identifier
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignPhrase {
    /// Plain expression
    Expression(ExpressionNode),
    /// `READ {mapping}`
    Read {
        /// Query mapping
        mapping: String,
    },
    /// `CALL var WITH args`
    Call {
        /// Called variable
        target: Identifier,
        /// Arguments
        arguments: SmallVec<[ExpressionNode; 4]>,
    },
    /// `ARGUMENT`
    Argument,
    /// `MLM 'name' [FROM INSTITUTION 'x']` or `MLM MLM_SELF`
    Mlm(MlmReference),
    /// `INTERFACE {..}`, `EVENT {..}`, `MESSAGE {..}`, `DESTINATION {..}`
    Mapping {
        /// Declaration kind
        kind: MappingKind,
        /// Mapping text between the braces
        mapping: String,
    },
}

/// Module referenced by an MLM declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MlmReference {
    /// `MLM 'name' [FROM INSTITUTION 'institution']`
    Named {
        /// Module name
        name: String,
        /// Institution qualifier
        institution: Option<String>,
    },
    /// `MLM MLM_SELF`
    SelfReference,
}

/// Kinds of mapping declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MappingKind {
    /// `INTERFACE`
    Interface,
    /// `EVENT`
    Event,
    /// `MESSAGE`
    Message,
    /// `DESTINATION`
    Destination,
}

impl MappingKind {
    /// Keyword of the declaration
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Interface => "INTERFACE",
            Self::Event => "EVENT",
            Self::Message => "MESSAGE",
            Self::Destination => "DESTINATION",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl Statement {
    /// Create an assignment
    pub fn assign(target: LeftHandSide, phrase: AssignPhrase, position: SourcePosition) -> Self {
        Self::Assign(Box::new(Assignment {
            target,
            phrase,
            position,
        }))
    }

    /// Create `name := expression` without position information
    pub fn let_(name: impl Into<String>, expression: ExpressionNode) -> Self {
        Self::assign(
            LeftHandSide::Identifier(Identifier::new(name, SourcePosition::default())),
            AssignPhrase::Expression(expression),
            SourcePosition::default(),
        )
    }

    /// Create a mapping declaration without position information
    pub fn declare(
        name: impl Into<String>,
        kind: MappingKind,
        mapping: impl Into<String>,
    ) -> Self {
        Self::assign(
            LeftHandSide::Identifier(Identifier::new(name, SourcePosition::default())),
            AssignPhrase::Mapping {
                kind,
                mapping: mapping.into(),
            },
            SourcePosition::default(),
        )
    }

    /// Create `CONCLUDE value` without position information
    pub fn conclude(value: ExpressionNode) -> Self {
        Self::Conclude {
            value,
            position: SourcePosition::default(),
        }
    }

    /// Create `RETURN values` without position information
    pub fn return_(values: Vec<ExpressionNode>) -> Self {
        Self::Return {
            values,
            position: SourcePosition::default(),
        }
    }

    /// Create a CALL statement without position information
    pub fn call(
        target: impl Into<String>,
        arguments: impl IntoIterator<Item = ExpressionNode>,
        delay: Option<ExpressionNode>,
    ) -> Self {
        Self::Call(Box::new(CallData {
            target: Identifier::new(target, SourcePosition::default()),
            arguments: arguments.into_iter().collect(),
            delay,
            position: SourcePosition::default(),
        }))
    }

    /// Position of the statement
    pub fn position(&self) -> SourcePosition {
        match self {
            Self::Assign(data) => data.position,
            Self::If(data) => data.position,
            Self::For(data) => data.position,
            Self::While(data) => data.position,
            Self::Call(data) => data.position,
            Self::Conclude { position, .. }
            | Self::Return { position, .. }
            | Self::Write { position, .. } => *position,
        }
    }
}
