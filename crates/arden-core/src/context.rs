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

//! Execution-context protocol
//!
//! Compiled modules never talk to the outside world directly. Everything a
//! module needs from its host (other modules, interfaces, events, database
//! queries, message delivery, delayed invocation and the clock) goes through
//! an [`ExecutionContext`] supplied when the module runs.

use crate::error::{ArdenError, Result};
use crate::value::{ArdenValue, Timestamp, ValueData};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// Something that can be invoked with arguments and returns a result sequence
///
/// Implemented by compiled modules and by host-provided interfaces.
pub trait ArdenRunnable: Send + Sync {
    /// Name used in diagnostics and error messages
    fn name(&self) -> &str;

    /// Run with the given arguments
    fn run(&self, context: &dyn ExecutionContext, arguments: &[ArdenValue])
    -> Result<Vec<ArdenValue>>;
}

impl fmt::Debug for dyn ArdenRunnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArdenRunnable({})", self.name())
    }
}

/// Event resolved from an EVENT mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ArdenEvent {
    /// Mapping text of the declaration
    pub mapping: String,
    /// When the event happened, if known
    pub event_time: Option<Timestamp>,
    /// Whether this event triggered the running module
    pub triggering: bool,
}

impl ArdenEvent {
    /// Event that did not trigger the running module
    pub fn new(mapping: impl Into<String>) -> Self {
        Self {
            mapping: mapping.into(),
            event_time: None,
            triggering: false,
        }
    }

    /// Event that triggered the running module at `time`
    pub fn triggered_at(mapping: impl Into<String>, time: Timestamp) -> Self {
        Self {
            mapping: mapping.into(),
            event_time: Some(time),
            triggering: true,
        }
    }

    /// Value an event variable evaluates to inside a module
    pub fn to_value(&self) -> ArdenValue {
        ArdenValue::new(ValueData::Boolean(self.triggering), self.event_time)
    }
}

/// Host-side database query
pub trait DatabaseQuery: Send + Sync {
    /// Run the query; one value per selected column
    fn execute(&self) -> Vec<ArdenValue>;

    /// Restrict to results whose primary time lies within `[start, end]`
    fn occurs_within_to(&self, start: Timestamp, end: Timestamp) -> Box<dyn DatabaseQuery>;

    /// Restrict to results whose primary time lies outside `[start, end]`
    fn occurs_not_within_to(&self, start: Timestamp, end: Timestamp) -> Box<dyn DatabaseQuery>;
}

/// Query that never returns anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullQuery;

impl DatabaseQuery for NullQuery {
    fn execute(&self) -> Vec<ArdenValue> {
        Vec::new()
    }

    fn occurs_within_to(&self, _start: Timestamp, _end: Timestamp) -> Box<dyn DatabaseQuery> {
        Box::new(NullQuery)
    }

    fn occurs_not_within_to(&self, _start: Timestamp, _end: Timestamp) -> Box<dyn DatabaseQuery> {
        Box::new(NullQuery)
    }
}

/// In-memory query over precomputed result columns
///
/// Narrowing keeps the elements of each column whose primary time falls
/// inside (or outside) the closed interval. Untimed elements never match a
/// time constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuery {
    columns: Vec<ArdenValue>,
}

impl MemoryQuery {
    /// Create a query returning `columns`
    pub fn new(columns: Vec<ArdenValue>) -> Self {
        Self { columns }
    }

    fn narrow(&self, keep: impl Fn(Timestamp) -> bool) -> Box<dyn DatabaseQuery> {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                ArdenValue::list(
                    column
                        .clone()
                        .into_elements()
                        .into_iter()
                        .filter(|value| value.primary_time().is_some_and(&keep))
                        .collect(),
                )
            })
            .collect();
        Box::new(MemoryQuery::new(columns))
    }
}

impl DatabaseQuery for MemoryQuery {
    fn execute(&self) -> Vec<ArdenValue> {
        self.columns.clone()
    }

    fn occurs_within_to(&self, start: Timestamp, end: Timestamp) -> Box<dyn DatabaseQuery> {
        self.narrow(|time| start <= time && time <= end)
    }

    fn occurs_not_within_to(&self, start: Timestamp, end: Timestamp) -> Box<dyn DatabaseQuery> {
        self.narrow(|time| time < start || end < time)
    }
}

/// Host capabilities available to a running module
pub trait ExecutionContext: Send + Sync {
    /// Build a query for a READ mapping
    fn create_query(&self, mapping: &str) -> Box<dyn DatabaseQuery> {
        log::debug!("No query support for mapping '{mapping}', using the null query");
        Box::new(NullQuery)
    }

    /// Resolve an EVENT mapping
    fn get_event(&self, mapping: &str) -> ArdenEvent {
        ArdenEvent::new(mapping)
    }

    /// Resolve another module by name and optional institution
    fn find_module(&self, name: &str, institution: Option<&str>)
    -> Result<Arc<dyn ArdenRunnable>>;

    /// Resolve an INTERFACE mapping to something callable
    fn find_interface(&self, mapping: &str) -> Result<Arc<dyn ArdenRunnable>> {
        Err(ArdenError::interface_not_found(mapping))
    }

    /// Deliver a message to a destination
    ///
    /// An empty destination means the host's default destination.
    fn write(&self, message: &ArdenValue, destination: &str) -> Result<()>;

    /// Schedule `module` to run after `delay` without waiting for it
    ///
    /// `caller` is the context of the scheduling activation. A host that runs
    /// the call before returning must run it through `caller`, one call level
    /// deeper, so that the call depth limit still applies.
    fn call_with_delay(
        &self,
        caller: &dyn ExecutionContext,
        module: Arc<dyn ArdenRunnable>,
        arguments: Vec<ArdenValue>,
        delay: &ArdenValue,
    ) -> Result<()>;

    /// Time of the triggering event
    fn event_time(&self) -> Timestamp {
        self.current_time()
    }

    /// Time the module was triggered
    fn trigger_time(&self) -> Timestamp {
        self.current_time()
    }

    /// Wall-clock time as seen by the module
    fn current_time(&self) -> Timestamp {
        Utc::now()
    }

    /// Number of module activations enclosing the current one
    fn call_depth(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap()
    }

    fn potassium() -> MemoryQuery {
        MemoryQuery::new(vec![ArdenValue::list(vec![
            ArdenValue::new(ValueData::Number(3.9), Some(at(1))),
            ArdenValue::new(ValueData::Number(4.4), Some(at(5))),
            ArdenValue::new(ValueData::Number(5.1), Some(at(9))),
            ArdenValue::number(4.0),
        ])])
    }

    #[test]
    fn test_null_query() {
        assert!(NullQuery.execute().is_empty());
        assert!(NullQuery.occurs_within_to(at(1), at(2)).execute().is_empty());
    }

    #[test]
    fn test_memory_query_within() {
        let narrowed = potassium().occurs_within_to(at(1), at(5));
        let columns = narrowed.execute();
        let values: Vec<_> = columns[0]
            .as_list()
            .unwrap()
            .iter()
            .filter_map(ArdenValue::as_number)
            .collect();
        assert_eq!(values, vec![3.9, 4.4]);
    }

    #[test]
    fn test_memory_query_not_within() {
        let narrowed = potassium().occurs_not_within_to(at(2), at(8));
        let columns = narrowed.execute();
        let values: Vec<_> = columns[0]
            .as_list()
            .unwrap()
            .iter()
            .filter_map(ArdenValue::as_number)
            .collect();
        assert_eq!(values, vec![3.9, 5.1]);
    }

    #[test]
    fn test_event_value() {
        let event = ArdenEvent::triggered_at("admission", at(3));
        let value = event.to_value();
        assert!(value.is_true());
        assert_eq!(value.primary_time(), Some(at(3)));
        assert_eq!(ArdenEvent::new("discharge").to_value(), ArdenValue::boolean(false));
    }
}
