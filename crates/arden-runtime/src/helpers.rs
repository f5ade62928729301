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

//! Helpers shared by compiled modules and host implementations

use crate::module::MedicalLogicModule;
use arden_core::{
    ArdenError, ArdenEvent, ArdenRunnable, ArdenValue, DatabaseQuery, ExecutionContext, NullQuery,
    Result, Timestamp,
};
use std::sync::Arc;

/// Urgency of a module without an urgency slot, or whose urgency is not a number
pub const DEFAULT_URGENCY: f64 = 50.0;

/// Urgency denoted by a value
pub fn urgency_value(value: &ArdenValue) -> f64 {
    value.as_number().unwrap_or(DEFAULT_URGENCY)
}

/// Invoke a module or interface one call level deeper
///
/// Fatal errors and failures already attributed to a callee pass through
/// unchanged; anything else is reported as a failure of `runnable`.
pub fn call(
    runnable: &dyn ArdenRunnable,
    context: &dyn ExecutionContext,
    arguments: &[ArdenValue],
) -> Result<Vec<ArdenValue>> {
    let nested = NestedContext::new(context);
    log::debug!(
        "Calling '{}' with {} argument(s) at depth {}",
        runnable.name(),
        arguments.len(),
        nested.call_depth()
    );
    runnable.run(&nested, arguments).map_err(|err| match err {
        err if err.is_fatal() => err,
        err @ ArdenError::InvocationTarget { .. } => err,
        err => ArdenError::invocation(runnable.name(), err.to_string()),
    })
}

/// Context seen by a callee: the caller's host, one call level deeper
pub struct NestedContext<'a> {
    inner: &'a dyn ExecutionContext,
    depth: usize,
}

impl<'a> NestedContext<'a> {
    /// Wrap the caller's context
    pub fn new(inner: &'a dyn ExecutionContext) -> Self {
        Self {
            depth: inner.call_depth() + 1,
            inner,
        }
    }
}

impl ExecutionContext for NestedContext<'_> {
    fn create_query(&self, mapping: &str) -> Box<dyn DatabaseQuery> {
        self.inner.create_query(mapping)
    }

    fn get_event(&self, mapping: &str) -> ArdenEvent {
        self.inner.get_event(mapping)
    }

    fn find_module(&self, name: &str, institution: Option<&str>) -> Result<Arc<dyn ArdenRunnable>> {
        self.inner.find_module(name, institution)
    }

    fn find_interface(&self, mapping: &str) -> Result<Arc<dyn ArdenRunnable>> {
        self.inner.find_interface(mapping)
    }

    fn write(&self, message: &ArdenValue, destination: &str) -> Result<()> {
        self.inner.write(message, destination)
    }

    fn call_with_delay(
        &self,
        caller: &dyn ExecutionContext,
        module: Arc<dyn ArdenRunnable>,
        arguments: Vec<ArdenValue>,
        delay: &ArdenValue,
    ) -> Result<()> {
        self.inner.call_with_delay(caller, module, arguments, delay)
    }

    fn event_time(&self) -> Timestamp {
        self.inner.event_time()
    }

    fn trigger_time(&self) -> Timestamp {
        self.inner.trigger_time()
    }

    fn current_time(&self) -> Timestamp {
        self.inner.current_time()
    }

    fn call_depth(&self) -> usize {
        self.depth
    }
}

/// Restrict a query to `[start, end]`; the null query unless both bounds are times
pub fn constrain_query_within_to(
    query: &dyn DatabaseQuery,
    start: &ArdenValue,
    end: &ArdenValue,
) -> Box<dyn DatabaseQuery> {
    match (start.as_time(), end.as_time()) {
        (Some(start), Some(end)) => query.occurs_within_to(start, end),
        _ => Box::new(NullQuery),
    }
}

/// Restrict a query to outside `[start, end]`; the null query unless both bounds are times
pub fn constrain_query_not_within_to(
    query: &dyn DatabaseQuery,
    start: &ArdenValue,
    end: &ArdenValue,
) -> Box<dyn DatabaseQuery> {
    match (start.as_time(), end.as_time()) {
        (Some(start), Some(end)) => query.occurs_not_within_to(start, end),
        _ => Box::new(NullQuery),
    }
}

/// Pick a module by name (ASCII case-insensitive) and, if given, institution
pub fn find_module<'m>(
    name: &str,
    institution: Option<&str>,
    modules: impl IntoIterator<Item = &'m Arc<MedicalLogicModule>>,
) -> Result<Arc<MedicalLogicModule>> {
    modules
        .into_iter()
        .find(|module| {
            module.name().eq_ignore_ascii_case(name)
                && institution.is_none_or(|wanted| module.institution() == Some(wanted))
        })
        .cloned()
        .ok_or_else(|| ArdenError::module_not_found(name, institution))
}
