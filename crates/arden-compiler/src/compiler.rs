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

//! Module compiler
//!
//! Compiles the DATA, LOGIC and ACTION blocks of a module against a single
//! [`CompilerScope`], so variables assigned in DATA are visible to the later
//! blocks. Each block becomes its own [`Bytecode`] terminated by `HALT`.

use crate::bytecode::{Bytecode, BytecodeBuilder, Instruction, InstructionSink};
use crate::config::CompilerConfig;
use crate::error::CompileResult;
use crate::expression::ExpressionCompiler;
use crate::scope::{CompilerScope, VariableCategory};
use crate::statement::{Block, StatementCompiler};
use arden_ast::{ExpressionNode, MlmSource, Statement};

/// Compiled module, ready to be instantiated by a runtime
#[derive(Debug, Clone)]
pub struct CompiledMlm {
    /// Module name
    pub name: String,
    /// Institution, if declared
    pub institution: Option<String>,
    /// DATA block
    pub data: Bytecode,
    /// LOGIC block
    pub logic: Bytecode,
    /// ACTION block
    pub action: Bytecode,
    /// Urgency expression, run after DATA and returning one value
    pub urgency: Option<Bytecode>,
    /// Value slots needed per activation
    pub slot_count: u16,
    /// Module-handle slots needed per activation
    pub module_slot_count: u16,
    /// Declared variables in declaration order
    pub variables: Vec<(String, VariableCategory)>,
}

impl CompiledMlm {
    /// Human-readable listing of every block
    pub fn disassemble(&self) -> String {
        let mut output = format!("MLM {}", self.name);
        if let Some(institution) = &self.institution {
            output.push_str(&format!(" (institution {institution})"));
        }
        output.push_str(&format!(
            "\nSlots: {} value, {} module\n",
            self.slot_count, self.module_slot_count
        ));
        for (name, category) in &self.variables {
            output.push_str(&format!("  {name}: {category}\n"));
        }

        let blocks = [
            Some(&self.data),
            self.urgency.as_ref(),
            Some(&self.logic),
            Some(&self.action),
        ];
        for bytecode in blocks.into_iter().flatten() {
            output.push('\n');
            output.push_str(&bytecode.disassemble());
        }
        output
    }
}

/// Compiles module sources into bytecode
#[derive(Debug, Clone, Default)]
pub struct MlmCompiler {
    config: CompilerConfig,
}

impl MlmCompiler {
    /// Create a compiler with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with custom configuration
    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Compiler configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a module
    pub fn compile(&self, source: &MlmSource) -> CompileResult<CompiledMlm> {
        log::debug!("Compiling MLM '{}'", source.name);
        let mut scope = CompilerScope::new();

        let data = self.compile_block(source, Block::Data, &source.data, &mut scope)?;
        let urgency = source
            .urgency
            .as_ref()
            .map(|expression| self.compile_urgency(source, expression, &mut scope))
            .transpose()?;
        let logic = self.compile_block(source, Block::Logic, &source.logic, &mut scope)?;
        let action = self.compile_block(source, Block::Action, &source.action, &mut scope)?;

        let variables = scope
            .variables()
            .map(|(name, variable)| (name.to_string(), variable.category()))
            .collect();

        log::debug!(
            "Compiled MLM '{}': {} value slots, {} module slots",
            source.name,
            scope.slot_count(),
            scope.module_slot_count()
        );

        Ok(CompiledMlm {
            name: source.name.clone(),
            institution: source.institution.clone(),
            data,
            logic,
            action,
            urgency,
            slot_count: scope.slot_count(),
            module_slot_count: scope.module_slot_count(),
            variables,
        })
    }

    fn compile_block(
        &self,
        source: &MlmSource,
        block: Block,
        statements: &[Statement],
        scope: &mut CompilerScope,
    ) -> CompileResult<Bytecode> {
        let mut builder = BytecodeBuilder::new();
        StatementCompiler::new(&self.config, block).compile_block(statements, scope, &mut builder)?;
        builder.emit(Instruction::Halt);

        let mut bytecode = builder.finalize()?;
        bytecode.source = Some(format!("{}:{}", source.name, block.name().to_lowercase()));
        Ok(bytecode)
    }

    fn compile_urgency(
        &self,
        source: &MlmSource,
        expression: &ExpressionNode,
        scope: &mut CompilerScope,
    ) -> CompileResult<Bytecode> {
        let mut builder = BytecodeBuilder::new();
        ExpressionCompiler::new(&self.config).compile(expression, scope, &mut builder)?;
        builder.emit(Instruction::Return(1));

        let mut bytecode = builder.finalize()?;
        bytecode.source = Some(format!("{}:urgency", source.name));
        Ok(bytecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use arden_ast::{ExpressionNode as E, MappingKind};

    #[test]
    fn test_blocks_share_scope() {
        let source = MlmSource::new("shared")
            .with_data(vec![
                Statement::let_("x", E::number(1.0)),
                Statement::declare("alert", MappingKind::Message, "allergy alert"),
            ])
            .with_logic(vec![Statement::conclude(E::identifier("x"))])
            .with_action(vec![Statement::return_(vec![E::identifier("alert")])]);

        let compiled = MlmCompiler::new().compile(&source).unwrap();
        assert_eq!(compiled.slot_count, 1);
        assert_eq!(
            compiled.variables,
            vec![
                ("x".to_string(), VariableCategory::Data),
                ("alert".to_string(), VariableCategory::Message),
            ]
        );
        assert_eq!(
            compiled.logic.instructions,
            vec![
                Instruction::LoadSlot(0),
                Instruction::Conclude,
                Instruction::Halt
            ]
        );
        assert_eq!(compiled.logic.source.as_deref(), Some("shared:logic"));
        assert_eq!(compiled.action.instructions.last(), Some(&Instruction::Halt));
    }

    #[test]
    fn test_urgency_sees_data_variables() {
        let source = MlmSource::new("urgent")
            .with_data(vec![Statement::let_("level", E::number(80.0))])
            .with_urgency(E::identifier("level"));
        let compiled = MlmCompiler::new().compile(&source).unwrap();
        let urgency = compiled.urgency.unwrap();
        assert_eq!(
            urgency.instructions,
            vec![Instruction::LoadSlot(0), Instruction::Return(1)]
        );
    }

    #[test]
    fn test_logic_variable_not_visible_in_data() {
        let source = MlmSource::new("order")
            .with_data(vec![Statement::let_("y", E::identifier("x"))])
            .with_logic(vec![Statement::let_("x", E::number(1.0))]);
        assert!(matches!(
            MlmCompiler::new().compile(&source),
            Err(CompileError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_disassemble_lists_blocks() {
        let source = MlmSource::new("listing")
            .with_institution("General")
            .with_data(vec![Statement::let_("x", E::string("a"))]);
        let listing = MlmCompiler::new().compile(&source).unwrap().disassemble();
        assert!(listing.starts_with("MLM listing (institution General)"));
        assert!(listing.contains("Source: listing:data"));
        assert!(listing.contains("Source: listing:action"));
        assert!(listing.contains("  x: DATA"));
    }
}
