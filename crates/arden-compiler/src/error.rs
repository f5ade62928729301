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

//! Compilation errors
//!
//! Every error a module author can cause carries the source position it was
//! detected at. `UnreachableAlternative` marks compiler defects instead.

use crate::scope::VariableCategory;
use arden_ast::SourcePosition;
use thiserror::Error;

/// Result type for compilation operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Compilation error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A declaration was assigned to something other than a bare identifier
    #[error("{category} variables must be simple identifiers ({position})")]
    InvalidDeclarationTarget {
        /// Kind of declaration
        category: VariableCategory,
        /// Position of the assignment target
        position: SourcePosition,
    },

    /// A grammar construct without compiler support
    #[error("{feature} is not yet implemented ({position})")]
    UnsupportedFeature {
        /// Construct name
        feature: String,
        /// Position of the construct
        position: SourcePosition,
    },

    /// A construct used outside the scope it is valid in
    #[error("'{construct}' is only allowed within the condition of a WHERE ({position})")]
    ScopeViolation {
        /// Construct name
        construct: String,
        /// Position of the construct
        position: SourcePosition,
    },

    /// Reference to a name that has not been assigned
    #[error("Undefined variable '{name}' ({position})")]
    UndefinedVariable {
        /// Name as written
        name: String,
        /// Position of the reference
        position: SourcePosition,
    },

    /// A variable used in a way its kind does not allow
    #[error("'{name}' is a {category} variable and cannot be used {usage} ({position})")]
    InvalidVariableUse {
        /// Name as written
        name: String,
        /// Kind of the variable
        category: VariableCategory,
        /// What was attempted, e.g. "as a value"
        usage: String,
        /// Position of the reference
        position: SourcePosition,
    },

    /// Literal that cannot be represented
    #[error("Invalid literal '{literal}': {reason}")]
    InvalidLiteral {
        /// Literal text
        literal: String,
        /// What is wrong with it
        reason: String,
    },

    /// Statement placed in a block that does not accept it
    #[error("{statement} is not allowed in the {block} block ({position})")]
    MisplacedStatement {
        /// Statement keyword
        statement: String,
        /// Block name
        block: String,
        /// Position of the statement
        position: SourcePosition,
    },

    /// Internal compiler error
    #[error("Internal compiler error: {message}")]
    UnreachableAlternative {
        /// Description of the violated invariant
        message: String,
    },
}

impl CompileError {
    /// Create an unsupported-feature error
    pub fn unsupported(feature: impl Into<String>, position: SourcePosition) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
            position,
        }
    }

    /// Create an internal compiler error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::UnreachableAlternative {
            message: message.into(),
        }
    }

    /// Create an invalid-use error
    pub fn invalid_use(
        name: impl Into<String>,
        category: VariableCategory,
        usage: impl Into<String>,
        position: SourcePosition,
    ) -> Self {
        Self::InvalidVariableUse {
            name: name.into(),
            category,
            usage: usage.into(),
            position,
        }
    }

    /// Source position of the error, if it has one
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            Self::InvalidDeclarationTarget { position, .. }
            | Self::UnsupportedFeature { position, .. }
            | Self::ScopeViolation { position, .. }
            | Self::UndefinedVariable { position, .. }
            | Self::InvalidVariableUse { position, .. }
            | Self::MisplacedStatement { position, .. } => Some(*position),
            Self::InvalidLiteral { .. } | Self::UnreachableAlternative { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CompileError::InvalidDeclarationTarget {
            category: VariableCategory::Interface,
            position: SourcePosition::new(4, 2),
        };
        assert_eq!(
            err.to_string(),
            "INTERFACE variables must be simple identifiers (line 4, column 2)"
        );

        let err = CompileError::unsupported("READ", SourcePosition::new(1, 6));
        assert_eq!(err.to_string(), "READ is not yet implemented (line 1, column 6)");
    }

    #[test]
    fn test_position() {
        let err = CompileError::unsupported("CALL", SourcePosition::new(9, 1));
        assert_eq!(err.position(), Some(SourcePosition::new(9, 1)));
        assert_eq!(CompileError::internal("label").position(), None);
    }
}
