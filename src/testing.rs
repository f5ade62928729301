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

//! In-memory host for tests
//!
//! [`TestContext`] implements [`ExecutionContext`] with a fixed clock,
//! registered modules and interfaces, canned query results, and logs of
//! written messages and interface calls. Delayed calls run immediately. The [`ast`] module has small
//! constructors for statements that have no shorthand on the AST types.

use arden_core::{
    ArdenError, ArdenEvent, ArdenRunnable, ArdenValue, BinaryOperator, DatabaseQuery,
    ExecutionContext, MemoryQuery, NullQuery, Result, Timestamp,
};
use arden_runtime::{MedicalLogicModule, helpers};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Mapping of the built-in test interface
pub const INTERFACE_MAPPING: &str = "test interface";

/// Query mapping returning one timed column of numbers
pub const READ_MAPPING: &str = "select id from database";

/// Query mapping returning a number column and a string column
pub const READ_MULTIPLE_MAPPING: &str = "select id,value from database";

/// Destination mapping known to the test host besides the default one
pub const DESTINATION_MAPPING: &str = "dest";

/// Message delivered through `WRITE`
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenMessage {
    /// Message value
    pub message: ArdenValue,
    /// Destination mapping; empty for the default destination
    pub destination: String,
}

/// Call scheduled through `CALL ... DELAY`
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedCall {
    /// Name of the scheduled module or interface
    pub target: String,
    /// Requested delay
    pub delay: ArdenValue,
    /// Arguments passed along
    pub arguments: Vec<ArdenValue>,
}

/// Completed interface call
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceCall {
    /// Interface mapping
    pub mapping: String,
    /// Arguments passed in
    pub arguments: Vec<ArdenValue>,
    /// Results handed back
    pub results: Vec<ArdenValue>,
}

struct RecordedInterface {
    mapping: String,
    inner: Arc<dyn ArdenRunnable>,
    log: Arc<Mutex<Vec<InterfaceCall>>>,
}

impl ArdenRunnable for RecordedInterface {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn run(&self, context: &dyn ExecutionContext, arguments: &[ArdenValue]) -> Result<Vec<ArdenValue>> {
        let results = self.inner.run(context, arguments)?;
        self.log.lock().push(InterfaceCall {
            mapping: self.mapping.clone(),
            arguments: arguments.to_vec(),
            results: results.clone(),
        });
        Ok(results)
    }
}

/// Interface returning `(a + b, a * b)` for arguments `a, b`
#[derive(Debug, Default)]
pub struct SumProductInterface;

impl ArdenRunnable for SumProductInterface {
    fn name(&self) -> &str {
        INTERFACE_MAPPING
    }

    fn run(&self, _context: &dyn ExecutionContext, arguments: &[ArdenValue]) -> Result<Vec<ArdenValue>> {
        let [a, b] = arguments else {
            return Err(ArdenError::invocation(
                INTERFACE_MAPPING,
                format!("expected 2 arguments, got {}", arguments.len()),
            ));
        };
        Ok(vec![
            BinaryOperator::Add.run(a, b),
            BinaryOperator::Multiply.run(a, b),
        ])
    }
}

/// In-memory execution context
pub struct TestContext {
    modules: Vec<Arc<MedicalLogicModule>>,
    interfaces: FxHashMap<String, Arc<dyn ArdenRunnable>>,
    queries: FxHashMap<String, MemoryQuery>,
    events: FxHashMap<String, ArdenEvent>,
    destinations: FxHashSet<String>,
    messages: Mutex<Vec<WrittenMessage>>,
    delayed: Mutex<Vec<DelayedCall>>,
    interface_calls: Arc<Mutex<Vec<InterfaceCall>>>,
    current_time: Timestamp,
    event_time: Timestamp,
    trigger_time: Timestamp,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Host with the test interface, the canned queries and a clock fixed at
    /// 2024-01-01T00:00:00Z
    pub fn new() -> Self {
        let epoch = fixed_time(2024, 1, 1);
        let mut context = Self {
            modules: Vec::new(),
            interfaces: FxHashMap::default(),
            queries: FxHashMap::default(),
            events: FxHashMap::default(),
            destinations: [String::new(), DESTINATION_MAPPING.to_string()]
                .into_iter()
                .collect(),
            messages: Mutex::new(Vec::new()),
            delayed: Mutex::new(Vec::new()),
            interface_calls: Arc::default(),
            current_time: epoch,
            event_time: epoch,
            trigger_time: epoch,
        };
        context
            .interfaces
            .insert(INTERFACE_MAPPING.to_string(), Arc::new(SumProductInterface));
        context
            .queries
            .insert(READ_MAPPING.to_string(), MemoryQuery::new(vec![ids()]));
        context.queries.insert(
            READ_MULTIPLE_MAPPING.to_string(),
            MemoryQuery::new(vec![ids(), letters()]),
        );
        context
    }

    /// Host that can resolve `modules`
    pub fn with_modules(modules: impl IntoIterator<Item = Arc<MedicalLogicModule>>) -> Self {
        let mut context = Self::new();
        context.modules.extend(modules);
        context
    }

    /// Register a module
    pub fn add_module(&mut self, module: Arc<MedicalLogicModule>) -> &mut Self {
        self.modules.push(module);
        self
    }

    /// Register an interface under `mapping`
    pub fn add_interface(
        &mut self,
        mapping: impl Into<String>,
        interface: Arc<dyn ArdenRunnable>,
    ) -> &mut Self {
        self.interfaces.insert(mapping.into(), interface);
        self
    }

    /// Register query results under `mapping`
    pub fn add_query(&mut self, mapping: impl Into<String>, query: MemoryQuery) -> &mut Self {
        self.queries.insert(mapping.into(), query);
        self
    }

    /// Register the event returned for its mapping
    pub fn add_event(&mut self, event: ArdenEvent) -> &mut Self {
        self.events.insert(event.mapping.clone(), event);
        self
    }

    /// Accept writes to `mapping` without a warning
    pub fn add_destination(&mut self, mapping: impl Into<String>) -> &mut Self {
        self.destinations.insert(mapping.into());
        self
    }

    /// Fix the clock; event and trigger time follow
    pub fn set_current_time(&mut self, time: Timestamp) -> &mut Self {
        self.current_time = time;
        self.event_time = time;
        self.trigger_time = time;
        self
    }

    /// Fix the event time
    pub fn set_event_time(&mut self, time: Timestamp) -> &mut Self {
        self.event_time = time;
        self
    }

    /// Fix the trigger time
    pub fn set_trigger_time(&mut self, time: Timestamp) -> &mut Self {
        self.trigger_time = time;
        self
    }

    /// Messages written so far, rendered as text
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .map(|written| written.message.to_string())
            .collect()
    }

    /// Messages written so far, with their destinations
    pub fn written(&self) -> Vec<WrittenMessage> {
        self.messages.lock().clone()
    }

    /// Delayed calls scheduled so far
    pub fn delayed_calls(&self) -> Vec<DelayedCall> {
        self.delayed.lock().clone()
    }

    /// Interface calls completed so far
    pub fn interface_calls(&self) -> Vec<InterfaceCall> {
        self.interface_calls.lock().clone()
    }
}

impl ExecutionContext for TestContext {
    fn create_query(&self, mapping: &str) -> Box<dyn DatabaseQuery> {
        match self.queries.get(mapping) {
            Some(query) => Box::new(query.clone()),
            None => Box::new(NullQuery),
        }
    }

    fn get_event(&self, mapping: &str) -> ArdenEvent {
        self.events
            .get(mapping)
            .cloned()
            .unwrap_or_else(|| ArdenEvent::new(mapping))
    }

    fn find_module(&self, name: &str, institution: Option<&str>) -> Result<Arc<dyn ArdenRunnable>> {
        let module = helpers::find_module(name, institution, &self.modules)?;
        Ok(module)
    }

    fn find_interface(&self, mapping: &str) -> Result<Arc<dyn ArdenRunnable>> {
        let inner = self
            .interfaces
            .get(mapping)
            .cloned()
            .ok_or_else(|| ArdenError::interface_not_found(mapping))?;
        Ok(Arc::new(RecordedInterface {
            mapping: mapping.to_string(),
            inner,
            log: Arc::clone(&self.interface_calls),
        }))
    }

    fn write(&self, message: &ArdenValue, destination: &str) -> Result<()> {
        if !self.destinations.contains(destination) {
            log::warn!("Message written to unknown destination '{destination}'");
        }
        self.messages.lock().push(WrittenMessage {
            message: message.clone(),
            destination: destination.to_string(),
        });
        Ok(())
    }

    fn call_with_delay(
        &self,
        caller: &dyn ExecutionContext,
        module: Arc<dyn ArdenRunnable>,
        arguments: Vec<ArdenValue>,
        delay: &ArdenValue,
    ) -> Result<()> {
        self.delayed.lock().push(DelayedCall {
            target: module.name().to_string(),
            delay: delay.clone(),
            arguments: arguments.clone(),
        });
        // No scheduler here: run right away, nested under the caller
        helpers::call(module.as_ref(), caller, &arguments).map(|_| ())
    }

    fn event_time(&self) -> Timestamp {
        self.event_time
    }

    fn trigger_time(&self) -> Timestamp {
        self.trigger_time
    }

    fn current_time(&self) -> Timestamp {
        self.current_time
    }
}

/// Midnight UTC on the given day
///
/// # Panics
///
/// Panics on an invalid date.
pub fn fixed_time(year: i32, month: u32, day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid date {year}-{month}-{day}"))
}

fn timed(value: impl Into<ArdenValue>, year: i32, month: u32, day: u32) -> ArdenValue {
    value
        .into()
        .with_primary_time(Some(fixed_time(year, month, day)))
}

fn ids() -> ArdenValue {
    ArdenValue::list(vec![
        timed(5, 1970, 1, 1),
        timed(3, 1990, 1, 1),
        timed(2, 1990, 1, 2),
        timed(4, 1990, 1, 3),
        timed(1, 2000, 1, 1),
    ])
}

fn letters() -> ArdenValue {
    ArdenValue::list(vec![
        timed("e", 1970, 1, 1),
        timed("c", 1990, 1, 1),
        timed("b", 1990, 1, 2),
        timed("d", 1990, 1, 3),
        timed("a", 2000, 1, 1),
    ])
}

/// Statement constructors for tests
pub mod ast {
    use arden_ast::{
        AssignPhrase, ConditionalBranch, ExpressionNode, ForData, Identifier, IfData,
        LeftHandSide, MlmReference, SourcePosition, Statement, WhileData,
    };

    /// Identifier without position information
    pub fn id(name: &str) -> Identifier {
        Identifier::new(name, SourcePosition::default())
    }

    /// `name := MLM 'module'`
    pub fn declare_mlm(name: &str, module: &str, institution: Option<&str>) -> Statement {
        Statement::assign(
            LeftHandSide::Identifier(id(name)),
            AssignPhrase::Mlm(MlmReference::Named {
                name: module.to_string(),
                institution: institution.map(str::to_string),
            }),
            SourcePosition::default(),
        )
    }

    /// `name := MLM MLM_SELF`
    pub fn declare_self(name: &str) -> Statement {
        Statement::assign(
            LeftHandSide::Identifier(id(name)),
            AssignPhrase::Mlm(MlmReference::SelfReference),
            SourcePosition::default(),
        )
    }

    /// `name := READ {mapping}`
    pub fn read(name: &str, mapping: &str, line: u32) -> Statement {
        let position = SourcePosition::new(line, 1);
        Statement::assign(
            LeftHandSide::Identifier(Identifier::new(name, position)),
            AssignPhrase::Read {
                mapping: mapping.to_string(),
            },
            position,
        )
    }

    /// `TIME OF name := expression`
    pub fn set_time_of(name: &str, expression: ExpressionNode) -> Statement {
        Statement::assign(
            LeftHandSide::TimeOf(id(name)),
            AssignPhrase::Expression(expression),
            SourcePosition::default(),
        )
    }

    /// `NOW := expression`
    pub fn set_now(expression: ExpressionNode) -> Statement {
        Statement::assign(
            LeftHandSide::Now(SourcePosition::default()),
            AssignPhrase::Expression(expression),
            SourcePosition::default(),
        )
    }

    /// `IF condition THEN body [ELSE otherwise] ENDIF`
    pub fn if_then(
        condition: ExpressionNode,
        body: Vec<Statement>,
        otherwise: Option<Vec<Statement>>,
    ) -> Statement {
        Statement::If(Box::new(IfData {
            branches: vec![ConditionalBranch {
                condition,
                body,
                position: SourcePosition::default(),
            }],
            otherwise,
            position: SourcePosition::default(),
        }))
    }

    /// `FOR variable IN sequence DO body ENDDO`
    pub fn for_in(variable: &str, sequence: ExpressionNode, body: Vec<Statement>) -> Statement {
        Statement::For(Box::new(ForData {
            variable: id(variable),
            sequence,
            body,
            position: SourcePosition::default(),
        }))
    }

    /// `WHILE condition DO body ENDDO`
    pub fn while_do(condition: ExpressionNode, body: Vec<Statement>) -> Statement {
        Statement::While(Box::new(WhileData {
            condition,
            body,
            position: SourcePosition::default(),
        }))
    }

    /// `WRITE message [AT destination]`
    pub fn write(message: ExpressionNode, destination: Option<&str>) -> Statement {
        Statement::Write {
            message,
            destination: destination.map(id),
            position: SourcePosition::default(),
        }
    }
}
