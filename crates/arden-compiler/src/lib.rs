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

//! Bytecode compiler for Arden medical logic modules
//!
//! Lowers an [`arden_ast::MlmSource`] into one bytecode program per block.
//! Names are resolved against an explicit [`CompilerScope`] and instructions
//! go through the [`InstructionSink`] trait, with [`BytecodeBuilder`] as the
//! stock implementation.

#![warn(missing_docs)]

pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expression;
pub mod lhs;
pub mod scope;
pub mod statement;

pub use bytecode::{
    Bytecode, BytecodeBuilder, ConstantIndex, Instruction, InstructionSink, JumpKind, Label,
    ModuleSlot, SlotIndex, StringIndex,
};
pub use compiler::{CompiledMlm, MlmCompiler};
pub use config::CompilerConfig;
pub use error::{CompileError, CompileResult};
pub use expression::{ExpressionCompiler, parse_time_literal};
pub use lhs::AssignTarget;
pub use scope::{CompilerScope, ItSlotGuard, Variable, VariableCategory};
pub use statement::{Block, StatementCompiler};
