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

//! Executable medical logic modules
//!
//! A [`MedicalLogicModule`] wraps a [`CompiledMlm`] and is shared through
//! `Arc`. Every invocation creates a fresh [`MlmActivation`], runs the DATA
//! block into it, then LOGIC and, when LOGIC concludes true, ACTION.

use crate::helpers::{DEFAULT_URGENCY, urgency_value};
use crate::vm::{Activation, Completion, VirtualMachine};
use arden_compiler::{Bytecode, CompiledMlm};
use arden_core::{ArdenError, ArdenRunnable, ArdenValue, ExecutionContext, Result, VmConfig};
use std::sync::{Arc, Weak};

/// One activation of a module, with DATA already evaluated
pub trait MlmImplementation {
    /// Run the LOGIC block; true when it concludes true
    fn logic(&mut self, context: &dyn ExecutionContext) -> Result<bool>;

    /// Run the ACTION block; the returned values, if it returns any
    fn action(&mut self, context: &dyn ExecutionContext) -> Result<Option<Vec<ArdenValue>>>;

    /// Urgency evaluated after DATA
    fn urgency(&self) -> f64 {
        DEFAULT_URGENCY
    }
}

/// Compiled module ready to be invoked
#[derive(Debug)]
pub struct MedicalLogicModule {
    compiled: CompiledMlm,
    config: VmConfig,
    this: Weak<MedicalLogicModule>,
}

impl MedicalLogicModule {
    /// Wrap a compiled module
    pub fn new(compiled: CompiledMlm, config: VmConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            compiled,
            config,
            this: this.clone(),
        })
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.compiled.name
    }

    /// Institution, if declared
    pub fn institution(&self) -> Option<&str> {
        self.compiled.institution.as_deref()
    }

    /// Compiled blocks
    pub fn compiled(&self) -> &CompiledMlm {
        &self.compiled
    }

    /// Machine limits used for every block
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Bytecode listing of all blocks
    pub fn disassemble(&self) -> String {
        self.compiled.disassemble()
    }

    /// Create an activation and run the DATA block into it
    pub fn instantiate(
        &self,
        context: &dyn ExecutionContext,
        arguments: &[ArdenValue],
    ) -> Result<MlmActivation<'_>> {
        let depth = context.call_depth();
        if depth >= self.config.max_call_depth {
            log::debug!("Refusing to start '{}' at call depth {depth}", self.name());
            return Err(ArdenError::StackExhausted { depth });
        }
        log::debug!(
            "Starting '{}' with {} argument(s) at depth {depth}",
            self.name(),
            arguments.len()
        );

        let mut activation = Activation::new(
            self.compiled.slot_count,
            self.compiled.module_slot_count,
            context.current_time(),
        );
        if let Some(this) = self.this.upgrade() {
            activation = activation.with_self_module(this);
        }

        let mut instance = MlmActivation {
            module: self,
            activation,
            urgency: DEFAULT_URGENCY,
        };
        instance.execute(&self.compiled.data, context)?;
        if let Some(urgency) = &self.compiled.urgency {
            if let Completion::Returned(values) = instance.execute(urgency, context)? {
                instance.urgency = values.first().map_or(DEFAULT_URGENCY, urgency_value);
            }
        }
        Ok(instance)
    }
}

impl ArdenRunnable for MedicalLogicModule {
    fn name(&self) -> &str {
        &self.compiled.name
    }

    fn run(&self, context: &dyn ExecutionContext, arguments: &[ArdenValue]) -> Result<Vec<ArdenValue>> {
        let mut instance = self.instantiate(context, arguments)?;
        let results = if instance.logic(context)? {
            instance.action(context)?.unwrap_or_default()
        } else {
            Vec::new()
        };
        log::debug!("Finished '{}' with {} result(s)", self.name(), results.len());
        Ok(results)
    }
}

/// Live activation of a [`MedicalLogicModule`]
#[derive(Debug)]
pub struct MlmActivation<'m> {
    module: &'m MedicalLogicModule,
    activation: Activation,
    urgency: f64,
}

impl MlmActivation<'_> {
    /// Activation state, for inspection
    pub fn state(&self) -> &Activation {
        &self.activation
    }

    fn execute(&mut self, bytecode: &Bytecode, context: &dyn ExecutionContext) -> Result<Completion> {
        VirtualMachine::new(&self.module.config, context).execute(bytecode, &mut self.activation)
    }
}

impl MlmImplementation for MlmActivation<'_> {
    fn logic(&mut self, context: &dyn ExecutionContext) -> Result<bool> {
        let module = self.module;
        Ok(matches!(
            self.execute(&module.compiled.logic, context)?,
            Completion::Concluded(true)
        ))
    }

    fn action(&mut self, context: &dyn ExecutionContext) -> Result<Option<Vec<ArdenValue>>> {
        let module = self.module;
        match self.execute(&module.compiled.action, context)? {
            Completion::Returned(values) => Ok(Some(values)),
            Completion::Finished | Completion::Concluded(_) => Ok(None),
        }
    }

    fn urgency(&self) -> f64 {
        self.urgency
    }
}
