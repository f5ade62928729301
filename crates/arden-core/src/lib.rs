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

//! Core types for Arden medical logic modules
//!
//! This crate holds everything that compiled modules and their hosts share:
//! the temporally annotated value algebra, the closed operator set, sequence
//! operations, the execution-context protocol and the virtual machine types.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod operators;
pub mod sequence;
pub mod temporal;
pub mod value;
pub mod vm;

pub use context::{
    ArdenEvent, ArdenRunnable, DatabaseQuery, ExecutionContext, MemoryQuery, NullQuery,
};
pub use error::{ArdenError, Result};
pub use operators::{BinaryOperator, UnaryOperator};
pub use temporal::{ArdenDuration, DurationUnit, SECONDS_PER_AVERAGE_MONTH};
pub use value::{ArdenValue, Timestamp, ValueData};
pub use vm::{VmConfig, VmError, VmResult};
