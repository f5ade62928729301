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

//! Compiler and runtime for Arden Syntax medical logic modules
//!
//! Modules are handed over as ASTs ([`arden_ast::MlmSource`]), compiled to
//! per-block bytecode and run against a host-supplied
//! [`ExecutionContext`]:
//!
//! ```
//! use arden_mlm::ast::{ExpressionNode, MlmSource, Statement};
//! use arden_mlm::testing::TestContext;
//! use arden_mlm::MlmEngine;
//!
//! let source = MlmSource::new("hello")
//!     .with_logic(vec![Statement::conclude(ExpressionNode::boolean(true))])
//!     .with_action(vec![Statement::return_(vec![ExpressionNode::string("hi")])]);
//!
//! let engine = MlmEngine::new();
//! let module = engine.compile(&source).unwrap();
//! let results = engine.run(&module, &TestContext::new(), &[]).unwrap();
//! assert_eq!(results[0].as_str(), Some("hi"));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod testing;

pub use arden_ast as ast;
pub use arden_compiler as compiler;
pub use arden_runtime as runtime;

pub use arden_compiler::{CompileError, CompiledMlm, CompilerConfig, MlmCompiler};
pub use arden_core::{
    ArdenDuration, ArdenError, ArdenEvent, ArdenRunnable, ArdenValue, DatabaseQuery, DurationUnit,
    ExecutionContext, MemoryQuery, NullQuery, Timestamp, ValueData, VmConfig, VmError,
};
pub use arden_runtime::{MedicalLogicModule, MlmImplementation};
pub use config::EngineConfig;
pub use engine::MlmEngine;
pub use error::{Error, Result};
