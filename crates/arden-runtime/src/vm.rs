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

//! Stack virtual machine for compiled module blocks
//!
//! One [`VirtualMachine::execute`] call runs one block against an
//! [`Activation`], which carries the variable slots, resolved module handles
//! and now-cursor between the DATA, LOGIC and ACTION blocks of one run.

use crate::helpers;
use arden_compiler::{Bytecode, Instruction};
use arden_core::{
    ArdenRunnable, ArdenValue, ExecutionContext, Result, Timestamp, VmConfig, VmError, VmResult,
    sequence,
};
use smallvec::SmallVec;
use std::sync::Arc;

/// How a block finished
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Ran to the end of the block
    Finished,
    /// Ended by CONCLUDE; true only for a boolean true operand
    Concluded(bool),
    /// Ended by RETURN with the returned values
    Returned(Vec<ArdenValue>),
}

/// Per-run state shared by the blocks of one module activation
#[derive(Debug)]
pub struct Activation {
    /// Data variable slots
    pub slots: Vec<ArdenValue>,
    /// Module handles bound by MLM declarations
    pub modules: Vec<Option<Arc<dyn ArdenRunnable>>>,
    /// Now-cursor read by NOW and written by `NOW := ...`
    pub now: ArdenValue,
    /// Module bound by `MLM MLM_SELF`
    pub self_module: Option<Arc<dyn ArdenRunnable>>,
}

impl Activation {
    /// Create an activation with null slots and the now-cursor at `now`
    pub fn new(slot_count: u16, module_slot_count: u16, now: Timestamp) -> Self {
        Self {
            slots: vec![ArdenValue::null(); usize::from(slot_count)],
            modules: vec![None; usize::from(module_slot_count)],
            now: ArdenValue::time(now),
            self_module: None,
        }
    }

    /// Set the module bound by `MLM MLM_SELF`
    pub fn with_self_module(mut self, module: Arc<dyn ArdenRunnable>) -> Self {
        self.self_module = Some(module);
        self
    }

    fn slot_mut(&mut self, slot: u16) -> VmResult<&mut ArdenValue> {
        self.slots
            .get_mut(usize::from(slot))
            .ok_or(VmError::InvalidSlot(slot))
    }

    fn module(&self, slot: u16) -> VmResult<Arc<dyn ArdenRunnable>> {
        self.modules
            .get(usize::from(slot))
            .and_then(Option::clone)
            .ok_or(VmError::UnboundModule(slot))
    }

    fn bind_module(&mut self, slot: u16, module: Arc<dyn ArdenRunnable>) -> VmResult<()> {
        let entry = self
            .modules
            .get_mut(usize::from(slot))
            .ok_or(VmError::InvalidSlot(slot))?;
        *entry = Some(module);
        Ok(())
    }
}

/// Candidates of one WHERE with the predicate result for each
#[derive(Default)]
struct Collector {
    candidates: Vec<ArdenValue>,
    results: Vec<ArdenValue>,
}

/// Machine state for a single block execution
#[derive(Default)]
struct Frame {
    stack: Vec<ArdenValue>,
    iterators: Vec<std::vec::IntoIter<ArdenValue>>,
    collectors: Vec<Collector>,
    line: Option<u32>,
}

impl Frame {
    fn push(&mut self, value: ArdenValue, limit: usize) -> VmResult<()> {
        if self.stack.len() >= limit {
            return Err(VmError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> VmResult<ArdenValue> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn pop_many(&mut self, count: usize) -> VmResult<SmallVec<[ArdenValue; 4]>> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or(VmError::StackUnderflow)?;
        Ok(self.stack.drain(start..).collect())
    }
}

/// Executes bytecode blocks against a host context
pub struct VirtualMachine<'a> {
    config: &'a VmConfig,
    context: &'a dyn ExecutionContext,
}

impl<'a> VirtualMachine<'a> {
    /// Create a machine bound to a host context
    pub fn new(config: &'a VmConfig, context: &'a dyn ExecutionContext) -> Self {
        Self { config, context }
    }

    /// Run one block to completion
    pub fn execute(&self, bytecode: &Bytecode, activation: &mut Activation) -> Result<Completion> {
        let mut frame = Frame::default();
        let result = self.run(bytecode, activation, &mut frame);
        if let Err(err) = &result {
            let block = bytecode.source.as_deref().unwrap_or("<block>");
            match frame.line {
                Some(line) => log::debug!("{block} failed at line {line}: {err}"),
                None => log::debug!("{block} failed: {err}"),
            }
        }
        result
    }

    fn run(
        &self,
        bytecode: &Bytecode,
        activation: &mut Activation,
        frame: &mut Frame,
    ) -> Result<Completion> {
        let limit = self.config.max_stack_size;
        let mut ip = 0usize;
        let mut steps = 0usize;

        loop {
            steps += 1;
            if steps > self.config.max_execution_steps {
                return Err(VmError::ExecutionLimitExceeded.into());
            }

            let instruction = *bytecode
                .instructions
                .get(ip)
                .ok_or(VmError::InvalidInstructionPointer(ip))?;
            if self.config.debug_mode {
                log::trace!("{ip:4}: {instruction} (stack depth {})", frame.stack.len());
            }

            let mut next = ip + 1;
            match instruction {
                Instruction::PushConstant(index) => {
                    let value = bytecode
                        .constants
                        .get(usize::from(index))
                        .cloned()
                        .ok_or(VmError::InvalidConstantIndex(index))?;
                    frame.push(value, limit)?;
                }
                Instruction::Duplicate => {
                    let top = frame.stack.last().cloned().ok_or(VmError::StackUnderflow)?;
                    frame.push(top, limit)?;
                }
                Instruction::Pop => {
                    frame.pop()?;
                }
                Instruction::LoadSlot(slot) => {
                    let value = activation.slot_mut(slot)?.clone();
                    frame.push(value, limit)?;
                }
                Instruction::StoreSlot(slot) => {
                    let value = frame.pop()?;
                    *activation.slot_mut(slot)? = value;
                }
                Instruction::LoadNow => frame.push(activation.now.clone(), limit)?,
                Instruction::StoreNow => activation.now = frame.pop()?,
                Instruction::LoadEventTime => {
                    frame.push(ArdenValue::time(self.context.event_time()), limit)?
                }
                Instruction::LoadTriggerTime => {
                    frame.push(ArdenValue::time(self.context.trigger_time()), limit)?
                }
                Instruction::LoadCurrentTime => {
                    frame.push(ArdenValue::time(self.context.current_time()), limit)?
                }
                Instruction::LoadEvent(index) => {
                    let mapping = string_at(bytecode, index)?;
                    frame.push(self.context.get_event(mapping).to_value(), limit)?;
                }
                Instruction::Binary(op) => {
                    let right = frame.pop()?;
                    let left = frame.pop()?;
                    frame.push(op.run(&left, &right), limit)?;
                }
                Instruction::Unary(op) => {
                    let operand = frame.pop()?;
                    frame.push(op.run(&operand), limit)?;
                }
                Instruction::ChangeTime => {
                    let time = frame.pop()?;
                    let value = frame.pop()?;
                    frame.push(value.change_time(&time), limit)?;
                }
                Instruction::TimeOf => {
                    let value = frame.pop()?;
                    frame.push(value.time_of(), limit)?;
                }
                Instruction::Singleton => {
                    let value = frame.pop()?;
                    frame.push(sequence::singleton(value), limit)?;
                }
                Instruction::Flatten => {
                    let right = frame.pop()?;
                    let left = frame.pop()?;
                    frame.push(sequence::flatten(left, right), limit)?;
                }
                Instruction::Merge => {
                    let right = frame.pop()?;
                    let left = frame.pop()?;
                    frame.push(sequence::merge(left, right), limit)?;
                }
                Instruction::SortByTime => {
                    let value = frame.pop()?;
                    frame.push(sequence::sort_by_time(value), limit)?;
                }
                Instruction::SortByData => {
                    let value = frame.pop()?;
                    frame.push(sequence::sort_by_data(value), limit)?;
                }
                Instruction::IterBegin => {
                    let sequence = frame.pop()?;
                    frame.iterators.push(sequence.into_elements().into_iter());
                }
                Instruction::IterNext(offset) => {
                    let iterator = frame
                        .iterators
                        .last_mut()
                        .ok_or(VmError::NoActiveIterator)?;
                    match iterator.next() {
                        Some(value) => frame.push(value, limit)?,
                        None => next = jump_target(ip, offset, bytecode)?,
                    }
                }
                Instruction::IterEnd => {
                    frame.iterators.pop().ok_or(VmError::NoActiveIterator)?;
                }
                Instruction::CollectBegin => frame.collectors.push(Collector::default()),
                Instruction::CollectIf => {
                    let result = frame.pop()?;
                    let candidate = frame.pop()?;
                    let collector = frame
                        .collectors
                        .last_mut()
                        .ok_or(VmError::NoActiveIterator)?;
                    collector.candidates.push(candidate);
                    collector.results.push(result);
                }
                Instruction::CollectEnd => {
                    let collector = frame.collectors.pop().ok_or(VmError::NoActiveIterator)?;
                    let kept =
                        sequence::where_per_candidate(collector.candidates, collector.results);
                    frame.push(kept, limit)?;
                }
                Instruction::Jump(offset) => next = jump_target(ip, offset, bytecode)?,
                Instruction::JumpIfNotTrue(offset) => {
                    if !frame.pop()?.is_true() {
                        next = jump_target(ip, offset, bytecode)?;
                    }
                }
                Instruction::SequencePoint(line) => frame.line = Some(line),
                Instruction::FindModule {
                    name,
                    institution,
                    slot,
                } => {
                    let name = string_at(bytecode, name)?;
                    let institution = institution
                        .map(|index| string_at(bytecode, index))
                        .transpose()?;
                    log::debug!("Resolving MLM '{name}' into slot {slot}");
                    let module = self.context.find_module(name, institution)?;
                    activation.bind_module(slot, module)?;
                }
                Instruction::BindSelf(slot) => {
                    let module = activation
                        .self_module
                        .clone()
                        .ok_or(VmError::UnboundModule(slot))?;
                    activation.bind_module(slot, module)?;
                }
                Instruction::CallModule { slot, arg_count } => {
                    let arguments = frame.pop_many(usize::from(arg_count))?;
                    let module = activation.module(slot)?;
                    let results = helpers::call(module.as_ref(), self.context, &arguments)?;
                    frame.push(ArdenValue::list(results), limit)?;
                }
                Instruction::CallInterface { mapping, arg_count } => {
                    let arguments = frame.pop_many(usize::from(arg_count))?;
                    let interface = self.context.find_interface(string_at(bytecode, mapping)?)?;
                    let results = helpers::call(interface.as_ref(), self.context, &arguments)?;
                    frame.push(ArdenValue::list(results), limit)?;
                }
                Instruction::CallModuleDelayed { slot, arg_count } => {
                    let delay = frame.pop()?;
                    let arguments = frame.pop_many(usize::from(arg_count))?;
                    let module = activation.module(slot)?;
                    log::debug!("Scheduling '{}' after {delay}", module.name());
                    self.context.call_with_delay(
                        self.context,
                        module,
                        arguments.into_vec(),
                        &delay,
                    )?;
                }
                Instruction::CallInterfaceDelayed { mapping, arg_count } => {
                    let delay = frame.pop()?;
                    let arguments = frame.pop_many(usize::from(arg_count))?;
                    let interface = self.context.find_interface(string_at(bytecode, mapping)?)?;
                    log::debug!("Scheduling '{}' after {delay}", interface.name());
                    self.context.call_with_delay(
                        self.context,
                        interface,
                        arguments.into_vec(),
                        &delay,
                    )?;
                }
                Instruction::Write(index) => {
                    let message = frame.pop()?;
                    self.context.write(&message, string_at(bytecode, index)?)?;
                }
                Instruction::Conclude => {
                    let value = frame.pop()?;
                    return Ok(Completion::Concluded(value.is_true()));
                }
                Instruction::Return(count) => {
                    let values = frame.pop_many(usize::from(count))?;
                    return Ok(Completion::Returned(values.into_vec()));
                }
                Instruction::Halt => return Ok(Completion::Finished),
            }
            ip = next;
        }
    }
}

fn string_at(bytecode: &Bytecode, index: u16) -> VmResult<&str> {
    bytecode
        .strings
        .get(usize::from(index))
        .map(String::as_str)
        .ok_or(VmError::InvalidStringIndex(index))
}

fn jump_target(ip: usize, offset: i16, bytecode: &Bytecode) -> VmResult<usize> {
    ip.checked_add_signed(isize::from(offset))
        .filter(|target| *target < bytecode.instructions.len())
        .ok_or(VmError::JumpOutOfBounds(offset))
}
