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

//! Runtime for compiled Arden medical logic modules
//!
//! Executes the bytecode produced by `arden-compiler` on a small stack
//! machine and implements [`arden_core::ArdenRunnable`] for compiled modules,
//! so hosts can invoke them and modules can call each other.

#![warn(missing_docs)]

pub mod helpers;
pub mod module;
pub mod vm;

pub use helpers::{DEFAULT_URGENCY, NestedContext};
pub use module::{MedicalLogicModule, MlmActivation, MlmImplementation};
pub use vm::{Activation, Completion, VirtualMachine};
