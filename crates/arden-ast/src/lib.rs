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

//! Abstract Syntax Tree (AST) definitions for Arden medical logic modules
//!
//! The tree is what a parser hands to the compiler: one [`MlmSource`] per
//! module with its DATA, LOGIC and ACTION statements. The grammar is closed,
//! so every node kind is an enum variant and consumers match exhaustively.

#![warn(missing_docs)]

mod expression;
mod module;
mod span;
mod statement;

pub use expression::*;
pub use module::*;
pub use span::*;
pub use statement::*;

pub use arden_core::{BinaryOperator, DurationUnit, UnaryOperator};
