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

//! Error types for module execution
//!
//! Operator evaluation never fails; the errors here come from resolving and
//! invoking other modules, and from violated virtual machine invariants.

use crate::vm::VmError;
use thiserror::Error;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, ArdenError>;

/// Runtime error raised while executing a medical logic module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArdenError {
    /// A referenced module could not be resolved by the host
    #[error("MLM {name}{} not found", institution.as_ref().map(|i| format!(" from institution {i}")).unwrap_or_default())]
    ModuleNotFound {
        /// Module name as written in the declaration
        name: String,
        /// Optional institution qualifier
        institution: Option<String>,
    },

    /// An interface mapping could not be resolved by the host
    #[error("Interface '{mapping}' not found")]
    InterfaceNotFound {
        /// Mapping text of the interface declaration
        mapping: String,
    },

    /// A called module or interface failed
    #[error("Invocation of '{target}' failed: {message}")]
    InvocationTarget {
        /// Name of the invoked module or interface
        target: String,
        /// Failure reported by the callee
        message: String,
    },

    /// Nested module calls exceeded the configured depth
    #[error("Call stack exhausted at depth {depth}")]
    StackExhausted {
        /// Depth at which execution was aborted
        depth: usize,
    },

    /// Virtual machine invariant violation
    #[error("VM error: {0}")]
    Vm(VmError),
}

impl ArdenError {
    /// Create a module-not-found error
    pub fn module_not_found(name: impl Into<String>, institution: Option<&str>) -> Self {
        Self::ModuleNotFound {
            name: name.into(),
            institution: institution.map(str::to_string),
        }
    }

    /// Create an interface-not-found error
    pub fn interface_not_found(mapping: impl Into<String>) -> Self {
        Self::InterfaceNotFound {
            mapping: mapping.into(),
        }
    }

    /// Create an invocation-target error
    pub fn invocation(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvocationTarget {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole activation chain
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StackExhausted { .. })
    }
}

impl From<VmError> for ArdenError {
    fn from(err: VmError) -> Self {
        Self::Vm(err)
    }
}
