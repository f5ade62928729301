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

//! Expression compiler
//!
//! Lowers expression trees into stack code. Every expression leaves exactly
//! one value on the stack.

use crate::bytecode::{Instruction, InstructionSink, JumpKind};
use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult};
use crate::scope::{CompilerScope, Variable, VariableCategory};
use arden_ast::{
    BinaryOpData, ClockValue, ExpressionNode, Identifier, LiteralValue, MappingKind, SortOrder,
    SourcePosition, WhereData,
};
use arden_core::{ArdenValue, Timestamp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Expression compiler that lowers AST expressions into an instruction sink
pub struct ExpressionCompiler<'c> {
    config: &'c CompilerConfig,
    depth: usize,
}

impl<'c> ExpressionCompiler<'c> {
    /// Create a new expression compiler
    pub fn new(config: &'c CompilerConfig) -> Self {
        Self { config, depth: 0 }
    }

    /// Compile an expression, leaving its value on the stack
    pub fn compile<S: InstructionSink>(
        &mut self,
        expression: &ExpressionNode,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        if self.depth >= self.config.max_recursion_depth {
            return Err(CompileError::internal("Maximum recursion depth exceeded"));
        }
        self.depth += 1;
        let result = self.compile_node(expression, scope, sink);
        self.depth -= 1;
        result
    }

    fn compile_node<S: InstructionSink>(
        &mut self,
        expression: &ExpressionNode,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        match expression {
            ExpressionNode::Literal(literal) => self.compile_literal(literal, sink),
            ExpressionNode::Identifier(id) => self.compile_identifier(id, scope, sink),
            ExpressionNode::It(position) => self.compile_it(*position, scope, sink),
            ExpressionNode::Clock(clock) => {
                sink.emit(match clock {
                    ClockValue::Now => Instruction::LoadNow,
                    ClockValue::EventTime => Instruction::LoadEventTime,
                    ClockValue::TriggerTime => Instruction::LoadTriggerTime,
                    ClockValue::CurrentTime => Instruction::LoadCurrentTime,
                });
                Ok(())
            }
            ExpressionNode::BinaryOp(data) => self.compile_binary_op(data, scope, sink),
            ExpressionNode::UnaryOp { op, operand } => {
                self.compile(operand, scope, sink)?;
                sink.emit(Instruction::Unary(*op));
                Ok(())
            }
            ExpressionNode::TimeOf(operand) => {
                self.compile(operand, scope, sink)?;
                sink.emit(Instruction::TimeOf);
                Ok(())
            }
            ExpressionNode::Singleton(operand) => {
                self.compile(operand, scope, sink)?;
                sink.emit(Instruction::Singleton);
                Ok(())
            }
            ExpressionNode::Concat { left, right } => {
                self.compile(left, scope, sink)?;
                self.compile(right, scope, sink)?;
                sink.emit(Instruction::Flatten);
                Ok(())
            }
            ExpressionNode::Merge { left, right } => {
                self.compile(left, scope, sink)?;
                self.compile(right, scope, sink)?;
                sink.emit(Instruction::Merge);
                Ok(())
            }
            ExpressionNode::Sort { order, operand } => {
                self.compile(operand, scope, sink)?;
                sink.emit(match order {
                    SortOrder::Data => Instruction::SortByData,
                    SortOrder::Time => Instruction::SortByTime,
                });
                Ok(())
            }
            ExpressionNode::Where(data) => self.compile_where(data, scope, sink),
            ExpressionNode::Reserved {
                construct,
                position,
            } => Err(CompileError::unsupported(construct.keyword(), *position)),
        }
    }

    fn compile_literal<S: InstructionSink>(
        &self,
        literal: &LiteralValue,
        sink: &mut S,
    ) -> CompileResult<()> {
        let value = match literal {
            LiteralValue::Null => ArdenValue::null(),
            LiteralValue::Boolean(b) => ArdenValue::boolean(*b),
            LiteralValue::Number(n) => ArdenValue::number(*n),
            LiteralValue::String(s) => ArdenValue::string(s.as_str()),
            LiteralValue::Time(text) => ArdenValue::time(parse_time_literal(text)?),
            LiteralValue::EmptyList => ArdenValue::empty_list(),
        };
        sink.push_constant(value)
    }

    fn compile_identifier<S: InstructionSink>(
        &self,
        id: &Identifier,
        scope: &CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        match scope.lookup(id) {
            Some(Variable::Data { slot }) => {
                sink.emit(Instruction::LoadSlot(*slot));
                Ok(())
            }
            Some(Variable::Mapping {
                kind: MappingKind::Event,
                mapping,
            }) => {
                let index = sink.string(mapping)?;
                sink.emit(Instruction::LoadEvent(index));
                Ok(())
            }
            Some(Variable::Mapping {
                kind: MappingKind::Message | MappingKind::Destination,
                mapping,
            }) => sink.push_constant(ArdenValue::string(mapping.as_str())),
            Some(Variable::Mapping {
                kind: MappingKind::Interface,
                ..
            }) => Err(CompileError::invalid_use(
                &id.name,
                VariableCategory::Interface,
                "as a value",
                id.position,
            )),
            Some(Variable::Mlm { .. }) => Err(CompileError::invalid_use(
                &id.name,
                VariableCategory::Mlm,
                "as a value",
                id.position,
            )),
            None => Err(CompileError::UndefinedVariable {
                name: id.name.clone(),
                position: id.position,
            }),
        }
    }

    fn compile_it<S: InstructionSink>(
        &self,
        position: SourcePosition,
        scope: &CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        let slot = scope.current_it().ok_or_else(|| CompileError::ScopeViolation {
            construct: "it".to_string(),
            position,
        })?;
        sink.emit(Instruction::LoadSlot(slot));
        Ok(())
    }

    fn compile_binary_op<S: InstructionSink>(
        &mut self,
        data: &BinaryOpData,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        self.compile(&data.left, scope, sink)?;
        self.compile(&data.right, scope, sink)?;
        sink.emit(Instruction::Binary(data.op));
        Ok(())
    }

    /// Per-candidate loop:
    ///
    /// ```text
    ///       <candidates>
    ///       ITER_BEGIN
    ///       COLLECT_BEGIN
    /// next: ITER_NEXT done
    ///       DUP
    ///       STORE it
    ///       <predicate>
    ///       COLLECT_IF
    ///       JUMP next
    /// done: COLLECT_END
    ///       ITER_END
    /// ```
    fn compile_where<S: InstructionSink>(
        &mut self,
        data: &WhereData,
        scope: &mut CompilerScope,
        sink: &mut S,
    ) -> CompileResult<()> {
        self.compile(&data.candidates, scope, sink)?;
        sink.emit(Instruction::IterBegin);
        sink.emit(Instruction::CollectBegin);

        let next = sink.new_label();
        let done = sink.new_label();
        sink.place_label(next);
        sink.jump(JumpKind::IterExhausted, done);
        sink.emit(Instruction::Duplicate);
        {
            let mut inner = scope.enter_where()?;
            sink.emit(Instruction::StoreSlot(inner.slot()));
            self.compile(&data.predicate, &mut inner, sink)?;
        }
        sink.emit(Instruction::CollectIf);
        sink.jump(JumpKind::Always, next);

        sink.place_label(done);
        sink.emit(Instruction::CollectEnd);
        sink.emit(Instruction::IterEnd);
        Ok(())
    }
}

/// Parse an ISO 8601 date or date-time literal
///
/// Date-times without an offset and plain dates are taken as UTC.
pub fn parse_time_literal(text: &str) -> CompileResult<Timestamp> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(CompileError::InvalidLiteral {
        literal: text.to_string(),
        reason: "expected an ISO 8601 date or date-time".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Bytecode, BytecodeBuilder};
    use arden_ast::ReservedConstruct;
    use arden_core::{BinaryOperator, DurationUnit, UnaryOperator};
    use chrono::TimeZone;
    use rstest::rstest;

    fn compile(expression: &ExpressionNode, scope: &mut CompilerScope) -> CompileResult<Bytecode> {
        let config = CompilerConfig::default();
        let mut builder = BytecodeBuilder::new();
        ExpressionCompiler::new(&config).compile(expression, scope, &mut builder)?;
        builder.finalize()
    }

    fn pos(line: u32) -> SourcePosition {
        SourcePosition::new(line, 1)
    }

    #[test]
    fn test_binary_op_lowering() {
        let mut scope = CompilerScope::new();
        let expr = ExpressionNode::binary_op(
            BinaryOperator::Add,
            ExpressionNode::number(1.0),
            ExpressionNode::duration(ExpressionNode::number(2.0), DurationUnit::Days),
        );
        let bytecode = compile(&expr, &mut scope).unwrap();
        assert_eq!(
            bytecode.instructions,
            vec![
                Instruction::PushConstant(0),
                Instruction::PushConstant(1),
                Instruction::Unary(UnaryOperator::Duration(DurationUnit::Days)),
                Instruction::Binary(BinaryOperator::Add),
            ]
        );
    }

    #[test]
    fn test_it_outside_where_is_scope_violation() {
        let mut scope = CompilerScope::new();
        let err = compile(&ExpressionNode::It(pos(7)), &mut scope).unwrap_err();
        assert_eq!(
            err,
            CompileError::ScopeViolation {
                construct: "it".to_string(),
                position: pos(7),
            }
        );
    }

    #[test]
    fn test_where_binds_it_for_predicate_only() {
        let mut scope = CompilerScope::new();
        let expr = ExpressionNode::where_(
            ExpressionNode::list([ExpressionNode::number(1.0), ExpressionNode::number(5.0)]),
            ExpressionNode::binary_op(
                BinaryOperator::Greater,
                ExpressionNode::it(),
                ExpressionNode::number(2.0),
            ),
        );
        let bytecode = compile(&expr, &mut scope).unwrap();
        assert_eq!(scope.current_it(), None);
        assert!(bytecode.instructions.contains(&Instruction::StoreSlot(0)));
        assert!(bytecode.instructions.contains(&Instruction::LoadSlot(0)));

        // `it` in the candidate expression is outside the WHERE condition
        let bad = ExpressionNode::where_(ExpressionNode::it(), ExpressionNode::boolean(true));
        assert!(matches!(
            compile(&bad, &mut scope),
            Err(CompileError::ScopeViolation { .. })
        ));
    }

    #[test]
    fn test_nested_where_uses_distinct_slots() {
        let mut scope = CompilerScope::new();
        let inner = ExpressionNode::where_(
            ExpressionNode::list([ExpressionNode::number(1.0)]),
            ExpressionNode::binary_op(BinaryOperator::Equal, ExpressionNode::it(), ExpressionNode::number(1.0)),
        );
        let outer = ExpressionNode::where_(
            ExpressionNode::list([ExpressionNode::number(1.0)]),
            ExpressionNode::binary_op(
                BinaryOperator::And,
                ExpressionNode::binary_op(BinaryOperator::Equal, ExpressionNode::it(), ExpressionNode::number(1.0)),
                ExpressionNode::binary_op(BinaryOperator::Equal, inner, ExpressionNode::number(1.0)),
            ),
        );
        let bytecode = compile(&outer, &mut scope).unwrap();
        assert!(bytecode.instructions.contains(&Instruction::StoreSlot(0)));
        assert!(bytecode.instructions.contains(&Instruction::StoreSlot(1)));
        assert_eq!(scope.current_it(), None);
    }

    #[test]
    fn test_undefined_identifier() {
        let mut scope = CompilerScope::new();
        let err = compile(&ExpressionNode::identifier("nope"), &mut scope).unwrap_err();
        assert!(matches!(err, CompileError::UndefinedVariable { name, .. } if name == "nope"));
    }

    #[test]
    fn test_interface_is_not_a_value() {
        let mut scope = CompilerScope::new();
        scope.declare_mapping(
            &Identifier::new("feed", pos(1)),
            MappingKind::Interface,
            "lab feed",
        )
        .unwrap();
        let err = compile(&ExpressionNode::identifier("feed"), &mut scope).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidVariableUse {
                category: VariableCategory::Interface,
                ..
            }
        ));
    }

    #[rstest]
    #[case(ReservedConstruct::Occurs, "OCCURS")]
    #[case(ReservedConstruct::RangeComparison, "WITHIN")]
    #[case(ReservedConstruct::ElementAccess, "[]")]
    #[case(ReservedConstruct::Ago, "AGO")]
    fn test_reserved_construct_unsupported(
        #[case] construct: ReservedConstruct,
        #[case] keyword: &str,
    ) {
        let mut scope = CompilerScope::new();
        let expr = ExpressionNode::Reserved {
            construct,
            position: pos(3),
        };
        assert_eq!(
            compile(&expr, &mut scope).unwrap_err(),
            CompileError::unsupported(keyword, pos(3))
        );
    }

    #[test]
    fn test_recursion_limit() {
        let config = CompilerConfig {
            max_recursion_depth: 4,
            ..CompilerConfig::default()
        };
        let mut expr = ExpressionNode::number(1.0);
        for _ in 0..8 {
            expr = ExpressionNode::unary_op(UnaryOperator::Minus, expr);
        }
        let mut scope = CompilerScope::new();
        let mut builder = BytecodeBuilder::new();
        let result = ExpressionCompiler::new(&config).compile(&expr, &mut scope, &mut builder);
        assert!(matches!(result, Err(CompileError::UnreachableAlternative { .. })));
    }

    #[test]
    fn test_parse_time_literal() {
        let expected = Utc.with_ymd_and_hms(2024, 7, 12, 14, 30, 0).unwrap();
        assert_eq!(parse_time_literal("2024-07-12T14:30:00Z").unwrap(), expected);
        assert_eq!(parse_time_literal("2024-07-12T16:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_time_literal("2024-07-12T14:30:00").unwrap(), expected);
        assert_eq!(
            parse_time_literal("2024-07-12").unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 12, 0, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_time_literal("yesterday"),
            Err(CompileError::InvalidLiteral { .. })
        ));
    }
}
