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

//! Assignment target analysis

use crate::bytecode::SlotIndex;
use crate::error::{CompileError, CompileResult};
use crate::scope::{CompilerScope, VariableCategory};
use arden_ast::{Identifier, LeftHandSide};

/// Resolved destination of a value assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTarget {
    /// Store into a data variable
    Data(SlotIndex),
    /// Rebind the primary time of an existing data variable
    TimeOf(SlotIndex),
    /// Store into the now-cursor
    Now,
}

/// Resolve the target of `lhs := expression`
///
/// Plain identifiers are allocated on first use. `TIME OF x` requires `x` to
/// already be a data variable.
pub fn resolve_target(lhs: &LeftHandSide, scope: &mut CompilerScope) -> CompileResult<AssignTarget> {
    match lhs {
        LeftHandSide::Identifier(id) => scope.data_slot(id).map(AssignTarget::Data),
        LeftHandSide::TimeOf(id) => scope
            .existing_data_slot(id, "with TIME OF")
            .map(AssignTarget::TimeOf),
        LeftHandSide::Now(_) => Ok(AssignTarget::Now),
        LeftHandSide::IdentifierList(_, position) => {
            Err(CompileError::unsupported("multiple assignment", *position))
        }
    }
}

/// Target of a declaration, which must be a bare identifier
pub fn declaration_target(
    lhs: &LeftHandSide,
    category: VariableCategory,
) -> CompileResult<&Identifier> {
    lhs.as_identifier()
        .ok_or(CompileError::InvalidDeclarationTarget {
            category,
            position: lhs.position(),
        })
}
