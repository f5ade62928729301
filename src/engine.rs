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

//! Engine facade - the main entry point for compiling and running modules

use crate::config::EngineConfig;
use crate::error::Result;
use arden_ast::MlmSource;
use arden_compiler::MlmCompiler;
use arden_core::{ArdenRunnable, ArdenValue, ExecutionContext};
use arden_runtime::MedicalLogicModule;
use std::sync::Arc;

/// Compiles module sources and runs compiled modules
#[derive(Debug, Clone, Default)]
pub struct MlmEngine {
    config: EngineConfig,
    compiler: MlmCompiler,
}

impl MlmEngine {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            compiler: MlmCompiler::with_config(config.compiler.clone()),
            config,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a module
    pub fn compile(&self, source: &MlmSource) -> Result<Arc<MedicalLogicModule>> {
        let compiled = self.compiler.compile(source)?;
        Ok(MedicalLogicModule::new(compiled, self.config.vm.clone()))
    }

    /// Compile several modules, stopping at the first failure
    pub fn compile_all<'s>(
        &self,
        sources: impl IntoIterator<Item = &'s MlmSource>,
    ) -> Result<Vec<Arc<MedicalLogicModule>>> {
        sources
            .into_iter()
            .map(|source| self.compile(source))
            .collect()
    }

    /// Run a module to completion, returning what its ACTION block returns
    pub fn run(
        &self,
        module: &MedicalLogicModule,
        context: &dyn ExecutionContext,
        arguments: &[ArdenValue],
    ) -> Result<Vec<ArdenValue>> {
        log::debug!("Running MLM '{}'", module.name());
        Ok(module.run(context, arguments)?)
    }
}
