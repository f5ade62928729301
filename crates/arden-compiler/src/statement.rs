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

//! Statement compiler for DATA, LOGIC and ACTION blocks

use crate::bytecode::{Instruction, InstructionSink, JumpKind, ModuleSlot};
use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult};
use crate::expression::ExpressionCompiler;
use crate::lhs::{AssignTarget, declaration_target, resolve_target};
use crate::scope::{CompilerScope, Variable, VariableCategory};
use arden_ast::{
    AssignPhrase, Assignment, CallData, ExpressionNode, ForData, Identifier, IfData, LeftHandSide,
    MappingKind, MlmReference, SourcePosition, Statement, WhileData,
};
use std::fmt;

/// Block a statement list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// DATA block
    Data,
    /// LOGIC block
    Logic,
    /// ACTION block
    Action,
}

impl Block {
    /// Block keyword
    pub fn name(&self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Logic => "LOGIC",
            Self::Action => "ACTION",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Callee {
    Module(ModuleSlot),
    Interface(String),
}

/// Compiles the statements of one block
pub struct StatementCompiler<'c> {
    config: &'c CompilerConfig,
    block: Block,
    expressions: ExpressionCompiler<'c>,
    depth: usize,
}

impl<'c> StatementCompiler<'c> {
    /// Create a compiler for statements of `block`
    pub fn new(config: &'c CompilerConfig, block: Block) -> Self {
        Self {
            config,
            block,
            expressions: ExpressionCompiler::new(config),
            depth: 0,
        }
    }

    /// Compile a statement list in order
    pub fn compile_block<S: InstructionSink>(
        &mut self,
        statements: &[Statement],
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        for statement in statements {
            self.compile(statement, scope, sink)?;
        }
        Ok(())
    }

    /// Compile a single statement
    pub fn compile<S: InstructionSink>(
        &mut self,
        statement: &Statement,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        if self.depth >= self.config.max_recursion_depth {
            return Err(CompileError::internal("Maximum statement nesting exceeded"));
        }
        self.depth += 1;
        let result = self.compile_statement(statement, scope, sink);
        self.depth -= 1;
        result
    }

    fn compile_statement<S: InstructionSink>(
        &mut self,
        statement: &Statement,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        // IF and WHILE record their own sequence points in front of each condition
        if !matches!(statement, Statement::If(_) | Statement::While(_)) {
            self.sequence_point(statement.position(), sink);
        }

        match statement {
            Statement::Assign(assignment) => self.compile_assignment(assignment, scope, sink),
            Statement::If(data) => self.compile_if(data, scope, sink),
            Statement::For(data) => self.compile_for(data, scope, sink),
            Statement::While(data) => self.compile_while(data, scope, sink),
            Statement::Conclude { value, position } => {
                self.require_block(Block::Logic, "CONCLUDE", *position)?;
                self.expressions.compile(value, scope, sink)?;
                sink.emit(Instruction::Conclude);
                Ok(())
            }
            Statement::Return { values, position } => {
                self.require_block(Block::Action, "RETURN", *position)?;
                let count = u16::try_from(values.len())
                    .map_err(|_| CompileError::internal("too many return values"))?;
                for value in values {
                    self.expressions.compile(value, scope, sink)?;
                }
                sink.emit(Instruction::Return(count));
                Ok(())
            }
            Statement::Write {
                message,
                destination,
                position,
            } => {
                self.require_block(Block::Action, "WRITE", *position)?;
                self.compile_write(message, destination.as_ref(), scope, sink)
            }
            Statement::Call(data) => self.compile_call(data, scope, sink),
        }
    }

    fn sequence_point<S: InstructionSink>(&self, position: SourcePosition, sink: &mut S) {
        if self.config.emit_sequence_points && position.is_known() {
            sink.emit(Instruction::SequencePoint(position.line));
        }
    }

    fn require_block(
        &self,
        expected: Block,
        statement: &str,
        position: SourcePosition,
    ) -> CompileResult<()> {
        if self.block == expected {
            Ok(())
        } else {
            Err(CompileError::MisplacedStatement {
                statement: statement.to_string(),
                block: self.block.name().to_string(),
                position,
            })
        }
    }

    fn compile_assignment<S: InstructionSink>(
        &mut self,
        assignment: &Assignment,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        let target = &assignment.target;
        match &assignment.phrase {
            AssignPhrase::Expression(expression) => {
                self.compile_value_assignment(target, expression, scope, sink)
            }
            AssignPhrase::Read { .. } => {
                Err(CompileError::unsupported("READ", assignment.position))
            }
            AssignPhrase::Call { .. } => {
                Err(CompileError::unsupported("CALL", assignment.position))
            }
            AssignPhrase::Argument => {
                Err(CompileError::unsupported("ARGUMENT", assignment.position))
            }
            AssignPhrase::Mlm(reference) => {
                let id = declaration_target(target, VariableCategory::Mlm)?;
                let slot = scope.declare_module(id)?;
                match reference {
                    MlmReference::Named { name, institution } => {
                        let name = sink.string(name)?;
                        let institution = match institution {
                            Some(institution) => Some(sink.string(institution)?),
                            None => None,
                        };
                        sink.emit(Instruction::FindModule {
                            name,
                            institution,
                            slot,
                        });
                    }
                    MlmReference::SelfReference => sink.emit(Instruction::BindSelf(slot)),
                }
                Ok(())
            }
            AssignPhrase::Mapping { kind, mapping } => {
                let id = declaration_target(target, (*kind).into())?;
                scope.declare_mapping(id, *kind, mapping)
            }
        }
    }

    fn compile_value_assignment<S: InstructionSink>(
        &mut self,
        target: &LeftHandSide,
        expression: &ExpressionNode,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        // A new name is bound before the right-hand side is compiled, so
        // `x := x + 1` on an unbound `x` reads the null initial slot value.
        match resolve_target(target, scope)? {
            AssignTarget::Data(slot) => {
                self.expressions.compile(expression, scope, sink)?;
                sink.emit(Instruction::StoreSlot(slot));
            }
            AssignTarget::TimeOf(slot) => {
                sink.emit(Instruction::LoadSlot(slot));
                self.expressions.compile(expression, scope, sink)?;
                sink.emit(Instruction::ChangeTime);
                sink.emit(Instruction::StoreSlot(slot));
            }
            AssignTarget::Now => {
                self.expressions.compile(expression, scope, sink)?;
                sink.emit(Instruction::StoreNow);
            }
        }
        Ok(())
    }

    fn compile_if<S: InstructionSink>(
        &mut self,
        data: &IfData,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        let end = sink.new_label();
        for branch in &data.branches {
            let next = sink.new_label();
            self.sequence_point(branch.position, sink);
            self.expressions.compile(&branch.condition, scope, sink)?;
            sink.jump(JumpKind::IfNotTrue, next);
            self.compile_block(&branch.body, scope, sink)?;
            sink.jump(JumpKind::Always, end);
            sink.place_label(next);
        }
        if let Some(otherwise) = &data.otherwise {
            self.compile_block(otherwise, scope, sink)?;
        }
        sink.place_label(end);
        Ok(())
    }

    fn compile_for<S: InstructionSink>(
        &mut self,
        data: &ForData,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        self.expressions.compile(&data.sequence, scope, sink)?;
        let slot = scope.data_slot(&data.variable)?;
        sink.emit(Instruction::IterBegin);

        let next = sink.new_label();
        let done = sink.new_label();
        sink.place_label(next);
        sink.jump(JumpKind::IterExhausted, done);
        sink.emit(Instruction::StoreSlot(slot));
        self.compile_block(&data.body, scope, sink)?;
        sink.jump(JumpKind::Always, next);

        sink.place_label(done);
        sink.emit(Instruction::IterEnd);
        Ok(())
    }

    fn compile_while<S: InstructionSink>(
        &mut self,
        data: &WhileData,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        let top = sink.new_label();
        let done = sink.new_label();
        sink.place_label(top);
        self.sequence_point(data.position, sink);
        self.expressions.compile(&data.condition, scope, sink)?;
        sink.jump(JumpKind::IfNotTrue, done);
        self.compile_block(&data.body, scope, sink)?;
        sink.jump(JumpKind::Always, top);
        sink.place_label(done);
        Ok(())
    }

    fn compile_write<S: InstructionSink>(
        &mut self,
        message: &ExpressionNode,
        destination: Option<&Identifier>,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        let mapping = match destination {
            None => String::new(),
            Some(id) => match scope.lookup(id) {
                Some(Variable::Mapping {
                    kind: MappingKind::Destination,
                    mapping,
                }) => mapping.clone(),
                Some(other) => {
                    return Err(CompileError::invalid_use(
                        &id.name,
                        other.category(),
                        "as a WRITE destination",
                        id.position,
                    ));
                }
                None => {
                    return Err(CompileError::UndefinedVariable {
                        name: id.name.clone(),
                        position: id.position,
                    });
                }
            },
        };

        self.expressions.compile(message, scope, sink)?;
        let index = sink.string(&mapping)?;
        sink.emit(Instruction::Write(index));
        Ok(())
    }

    fn compile_call<S: InstructionSink>(
        &mut self,
        data: &CallData,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        let target = &data.target;
        let callee = match scope.lookup(target) {
            Some(Variable::Mlm { slot }) => Callee::Module(*slot),
            Some(Variable::Mapping {
                kind: MappingKind::Interface,
                mapping,
            }) => Callee::Interface(mapping.clone()),
            Some(other) => {
                return Err(CompileError::invalid_use(
                    &target.name,
                    other.category(),
                    "as a CALL target",
                    target.position,
                ));
            }
            None => {
                return Err(CompileError::UndefinedVariable {
                    name: target.name.clone(),
                    position: target.position,
                });
            }
        };

        let arg_count = u8::try_from(data.arguments.len())
            .map_err(|_| CompileError::unsupported("more than 255 CALL arguments", data.position))?;
        for argument in &data.arguments {
            self.expressions.compile(argument, scope, sink)?;
        }

        match (&data.delay, callee) {
            (None, Callee::Module(slot)) => {
                sink.emit(Instruction::CallModule { slot, arg_count });
                sink.emit(Instruction::Pop);
            }
            (None, Callee::Interface(mapping)) => {
                let mapping = sink.string(&mapping)?;
                sink.emit(Instruction::CallInterface { mapping, arg_count });
                sink.emit(Instruction::Pop);
            }
            (Some(delay), Callee::Module(slot)) => {
                self.expressions.compile(delay, scope, sink)?;
                sink.emit(Instruction::CallModuleDelayed { slot, arg_count });
            }
            (Some(delay), Callee::Interface(mapping)) => {
                self.expressions.compile(delay, scope, sink)?;
                let mapping = sink.string(&mapping)?;
                sink.emit(Instruction::CallInterfaceDelayed { mapping, arg_count });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Bytecode, BytecodeBuilder};
    use arden_ast::{ConditionalBranch, ExpressionNode as E};
    use arden_core::{ArdenValue, BinaryOperator};
    use pretty_assertions::assert_eq;

    fn compile_in(
        block: Block,
        statements: &[Statement],
        scope: &mut CompilerScope,
    ) -> CompileResult<Bytecode> {
        let config = CompilerConfig::default();
        let mut builder = BytecodeBuilder::new();
        StatementCompiler::new(&config, block).compile_block(statements, scope, &mut builder)?;
        builder.emit(Instruction::Halt);
        builder.finalize()
    }

    fn pos(line: u32) -> SourcePosition {
        SourcePosition::new(line, 1)
    }

    #[test]
    fn test_statement_nesting_limit() {
        let config = CompilerConfig {
            max_recursion_depth: 8,
            ..CompilerConfig::default()
        };
        let nest = |levels: usize| {
            let mut statement = Statement::let_("x", E::number(1.0));
            for _ in 0..levels {
                statement = Statement::While(Box::new(WhileData {
                    condition: E::boolean(false),
                    body: vec![statement],
                    position: SourcePosition::default(),
                }));
            }
            statement
        };

        let mut builder = BytecodeBuilder::new();
        let shallow = StatementCompiler::new(&config, Block::Data).compile(
            &nest(6),
            &mut CompilerScope::new(),
            &mut builder,
        );
        assert!(shallow.is_ok());

        let mut builder = BytecodeBuilder::new();
        let deep = StatementCompiler::new(&config, Block::Data).compile(
            &nest(20),
            &mut CompilerScope::new(),
            &mut builder,
        );
        assert!(matches!(deep, Err(CompileError::UnreachableAlternative { .. })));
    }

    #[test]
    fn test_assignment_then_reuse_slot() {
        let mut scope = CompilerScope::new();
        let bytecode = compile_in(
            Block::Data,
            &[
                Statement::let_("x", E::number(1.0)),
                Statement::let_("X", E::number(2.0)),
            ],
            &mut scope,
        )
        .unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::PushConstant(0),
                Instruction::StoreSlot(0),
                Instruction::PushConstant(1),
                Instruction::StoreSlot(0),
                Instruction::Halt,
            ]
        );
    }

    #[test]
    fn test_self_reference_reads_fresh_slot() {
        let mut scope = CompilerScope::new();
        let stmt = Statement::let_(
            "x",
            E::binary_op(BinaryOperator::Add, E::identifier("x"), E::number(1.0)),
        );
        let bytecode = compile_in(Block::Data, &[stmt], &mut scope).unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::LoadSlot(0),
                Instruction::PushConstant(0),
                Instruction::Binary(BinaryOperator::Add),
                Instruction::StoreSlot(0),
                Instruction::Halt,
            ]
        );
    }

    #[test]
    fn test_read_argument_and_call_phrase_unsupported() {
        let target = || LeftHandSide::Identifier(Identifier::new("a", pos(2)));
        let cases = [
            (AssignPhrase::Read { mapping: "labs".to_string() }, "READ"),
            (AssignPhrase::Argument, "ARGUMENT"),
            (
                AssignPhrase::Call {
                    target: Identifier::new("m", pos(2)),
                    arguments: Default::default(),
                },
                "CALL",
            ),
        ];
        for (phrase, feature) in cases {
            let mut scope = CompilerScope::new();
            let stmt = Statement::assign(target(), phrase, pos(2));
            assert_eq!(
                compile_in(Block::Data, &[stmt], &mut scope).unwrap_err(),
                CompileError::unsupported(feature, pos(2))
            );
        }
    }

    #[test]
    fn test_declaration_requires_identifier() {
        let mut scope = CompilerScope::new();
        let stmt = Statement::assign(
            LeftHandSide::Now(pos(4)),
            AssignPhrase::Mapping {
                kind: MappingKind::Event,
                mapping: "admission".to_string(),
            },
            pos(4),
        );
        assert_eq!(
            compile_in(Block::Data, &[stmt], &mut scope).unwrap_err(),
            CompileError::InvalidDeclarationTarget {
                category: VariableCategory::Event,
                position: pos(4),
            }
        );
    }

    #[test]
    fn test_mlm_declarations() {
        let mut scope = CompilerScope::new();
        let named = Statement::assign(
            LeftHandSide::Identifier(Identifier::new("other", pos(1))),
            AssignPhrase::Mlm(MlmReference::Named {
                name: "other_mlm".to_string(),
                institution: Some("st. elsewhere".to_string()),
            }),
            pos(1),
        );
        let myself = Statement::assign(
            LeftHandSide::Identifier(Identifier::new("me", pos(2))),
            AssignPhrase::Mlm(MlmReference::SelfReference),
            pos(2),
        );
        let bytecode = compile_in(Block::Data, &[named, myself], &mut scope).unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::SequencePoint(1),
                Instruction::FindModule {
                    name: 0,
                    institution: Some(1),
                    slot: 0,
                },
                Instruction::SequencePoint(2),
                Instruction::BindSelf(1),
                Instruction::Halt,
            ]
        );
        assert_eq!(bytecode.strings, vec!["other_mlm", "st. elsewhere"]);
        assert_eq!(scope.module_slot_count(), 2);
    }

    #[test]
    fn test_time_of_and_now_assignments() {
        let mut scope = CompilerScope::new();
        let statements = [
            Statement::let_("x", E::number(3.0)),
            Statement::assign(
                LeftHandSide::TimeOf(Identifier::new("x", pos(2))),
                AssignPhrase::Expression(E::now()),
                SourcePosition::default(),
            ),
            Statement::assign(
                LeftHandSide::Now(SourcePosition::default()),
                AssignPhrase::Expression(E::time("2024-01-01")),
                SourcePosition::default(),
            ),
        ];
        let bytecode = compile_in(Block::Data, &statements, &mut scope).unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::PushConstant(0),
                Instruction::StoreSlot(0),
                Instruction::LoadSlot(0),
                Instruction::LoadNow,
                Instruction::ChangeTime,
                Instruction::StoreSlot(0),
                Instruction::PushConstant(1),
                Instruction::StoreNow,
                Instruction::Halt,
            ]
        );
    }

    #[test]
    fn test_if_lowering() {
        let mut scope = CompilerScope::new();
        let stmt = Statement::If(Box::new(IfData {
            branches: vec![
                ConditionalBranch {
                    condition: E::boolean(false),
                    body: vec![Statement::let_("r", E::number(1.0))],
                    position: pos(1),
                },
                ConditionalBranch {
                    condition: E::null(),
                    body: vec![Statement::let_("r", E::number(2.0))],
                    position: pos(2),
                },
            ],
            otherwise: Some(vec![Statement::let_("r", E::number(3.0))]),
            position: pos(1),
        }));
        let bytecode = compile_in(Block::Logic, &[stmt], &mut scope).unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::SequencePoint(1),
                Instruction::PushConstant(0),
                Instruction::JumpIfNotTrue(4),
                Instruction::PushConstant(1),
                Instruction::StoreSlot(0),
                Instruction::Jump(9),
                Instruction::SequencePoint(2),
                Instruction::PushConstant(2),
                Instruction::JumpIfNotTrue(4),
                Instruction::PushConstant(3),
                Instruction::StoreSlot(0),
                Instruction::Jump(3),
                Instruction::PushConstant(4),
                Instruction::StoreSlot(0),
                Instruction::Halt,
            ]
        );
    }

    #[test]
    fn test_for_and_while_loops_close_back() {
        let mut scope = CompilerScope::new();
        let for_loop = Statement::For(Box::new(ForData {
            variable: Identifier::new("item", pos(1)),
            sequence: E::list([E::number(1.0), E::number(2.0)]),
            body: vec![Statement::let_("last", E::identifier("item"))],
            position: pos(1),
        }));
        let while_loop = Statement::While(Box::new(WhileData {
            condition: E::boolean(false),
            body: vec![],
            position: pos(5),
        }));
        let bytecode = compile_in(Block::Logic, &[for_loop, while_loop], &mut scope).unwrap();
        let instructions = &bytecode.instructions;

        let iter_next = instructions
            .iter()
            .position(|i| matches!(i, Instruction::IterNext(_)))
            .unwrap();
        let Instruction::IterNext(offset) = instructions[iter_next] else {
            unreachable!()
        };
        assert_eq!(
            instructions[(iter_next as i64 + offset as i64) as usize],
            Instruction::IterEnd
        );

        let seq = instructions
            .iter()
            .position(|i| *i == Instruction::SequencePoint(5))
            .unwrap();
        let back = instructions
            .iter()
            .rposition(|i| matches!(i, Instruction::Jump(_)))
            .unwrap();
        let Instruction::Jump(offset) = instructions[back] else {
            unreachable!()
        };
        assert_eq!(back as i64 + offset as i64, seq as i64);
    }

    #[test]
    fn test_block_placement() {
        let mut scope = CompilerScope::new();
        let err = compile_in(
            Block::Action,
            &[Statement::Conclude {
                value: E::boolean(true),
                position: pos(9),
            }],
            &mut scope,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::MisplacedStatement {
                statement: "CONCLUDE".to_string(),
                block: "ACTION".to_string(),
                position: pos(9),
            }
        );
        assert!(matches!(
            compile_in(Block::Logic, &[Statement::return_(vec![])], &mut scope),
            Err(CompileError::MisplacedStatement { .. })
        ));
    }

    #[test]
    fn test_write_destinations() {
        let mut scope = CompilerScope::new();
        let statements = [
            Statement::declare("pager", MappingKind::Destination, "pager 1234"),
            Statement::Write {
                message: E::string("hello"),
                destination: Some(Identifier::new("pager", pos(2))),
                position: pos(2),
            },
            Statement::Write {
                message: E::string("hello"),
                destination: None,
                position: pos(3),
            },
        ];
        let bytecode = compile_in(Block::Action, &statements, &mut scope).unwrap();
        assert_eq!(bytecode.strings, vec!["pager 1234", ""]);
        assert!(bytecode.instructions.contains(&Instruction::Write(0)));
        assert!(bytecode.instructions.contains(&Instruction::Write(1)));
        assert_eq!(bytecode.constants, vec![ArdenValue::string("hello")]);

        let bad = Statement::Write {
            message: E::string("hello"),
            destination: Some(Identifier::new("msg", pos(4))),
            position: pos(4),
        };
        let mut scope = CompilerScope::new();
        let err = compile_in(
            Block::Action,
            &[Statement::declare("msg", MappingKind::Message, "m"), bad],
            &mut scope,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidVariableUse {
                category: VariableCategory::Message,
                ..
            }
        ));
    }

    #[test]
    fn test_call_statements() {
        let mut scope = CompilerScope::new();
        let statements = [
            Statement::declare("iface", MappingKind::Interface, "test interface"),
            Statement::assign(
                LeftHandSide::Identifier(Identifier::new("other", pos(2))),
                AssignPhrase::Mlm(MlmReference::Named {
                    name: "other".to_string(),
                    institution: None,
                }),
                SourcePosition::default(),
            ),
            Statement::call("iface", [E::number(1.0), E::number(2.0)], None),
            Statement::call(
                "other",
                Vec::<E>::new(),
                Some(E::duration(E::number(1.0), arden_core::DurationUnit::Hours)),
            ),
        ];
        let bytecode = compile_in(Block::Action, &statements, &mut scope).unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::FindModule {
                    name: 0,
                    institution: None,
                    slot: 0,
                },
                Instruction::PushConstant(0),
                Instruction::PushConstant(1),
                Instruction::CallInterface {
                    mapping: 1,
                    arg_count: 2,
                },
                Instruction::Pop,
                Instruction::PushConstant(0),
                Instruction::Unary(arden_core::UnaryOperator::Duration(
                    arden_core::DurationUnit::Hours
                )),
                Instruction::CallModuleDelayed {
                    slot: 0,
                    arg_count: 0,
                },
                Instruction::Halt,
            ]
        );

        let err = compile_in(
            Block::Action,
            &[
                Statement::let_("x", E::number(1.0)),
                Statement::call("x", Vec::<E>::new(), None),
            ],
            &mut scope,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidVariableUse {
                category: VariableCategory::Data,
                ..
            }
        ));
    }
}
