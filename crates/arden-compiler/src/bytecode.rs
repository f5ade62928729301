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

//! Bytecode instruction set for compiled modules
//!
//! Each block of a module compiles to a flat instruction vector with constant
//! and string pools. Jumps are relative to the jumping instruction. Besides the
//! value stack the machine keeps an iterator stack (FOR and WHERE loops) and a
//! collector stack (WHERE results).

use crate::error::{CompileError, CompileResult};
use arden_core::{ArdenValue, BinaryOperator, UnaryOperator, ValueData};
use std::fmt;

/// Index into the constant pool
pub type ConstantIndex = u16;

/// Index into the string pool
pub type StringIndex = u16;

/// Index of a value slot in the activation
pub type SlotIndex = u16;

/// Index of a module-handle slot in the activation
pub type ModuleSlot = u16;

/// Bytecode instruction set for Arden modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // === Stack Operations ===
    /// Push a constant value onto the stack
    PushConstant(ConstantIndex),

    /// Duplicate the top stack value
    Duplicate,

    /// Pop and discard the top stack value
    Pop,

    // === Variables ===
    /// Push the value of a slot
    LoadSlot(SlotIndex),

    /// Pop into a slot
    StoreSlot(SlotIndex),

    /// Push the now-cursor
    LoadNow,

    /// Pop into the now-cursor
    StoreNow,

    /// Push EVENTTIME
    LoadEventTime,

    /// Push TRIGGERTIME
    LoadTriggerTime,

    /// Push CURRENTTIME
    LoadCurrentTime,

    /// Resolve an EVENT mapping and push its value
    LoadEvent(StringIndex),

    // === Operators ===
    /// Stack: [left, right] -> [result]
    Binary(BinaryOperator),

    /// Stack: [operand] -> [result]
    Unary(UnaryOperator),

    /// Rebind primary time
    /// Stack: [value, time] -> [value']
    ChangeTime,

    /// Stack: [value] -> [time of value]
    TimeOf,

    // === Sequences ===
    /// Stack: [value] -> [list of value]
    Singleton,

    /// Stack: [left, right] -> [flat list]
    Flatten,

    /// Stack: [left, right] -> [merged list]
    Merge,

    /// Stack: [list] -> [list sorted by primary time]
    SortByTime,

    /// Stack: [list] -> [list sorted by payload]
    SortByData,

    // === Iteration ===
    /// Pop a sequence and start iterating it
    IterBegin,

    /// Push the next element, or jump when exhausted
    IterNext(i16),

    /// Drop the innermost iterator
    IterEnd,

    /// Start collecting WHERE results
    CollectBegin,

    /// Stack: [candidate, result] -> []; records the predicate result for the candidate
    CollectIf,

    /// Push the candidates whose recorded result is true
    CollectEnd,

    // === Control Flow ===
    /// Jump unconditionally
    Jump(i16),

    /// Jump unless the popped condition is boolean true
    JumpIfNotTrue(i16),

    /// Source line of the statement that follows
    SequencePoint(u32),

    // === Modules ===
    /// Resolve a module by name and optional institution into a module slot
    FindModule {
        /// Module name
        name: StringIndex,
        /// Institution, if qualified
        institution: Option<StringIndex>,
        /// Destination slot
        slot: ModuleSlot,
    },

    /// Bind the executing module into a module slot
    BindSelf(ModuleSlot),

    /// Stack: [args..] -> [results]
    CallModule {
        /// Module slot
        slot: ModuleSlot,
        /// Number of arguments
        arg_count: u8,
    },

    /// Stack: [args..] -> [results]
    CallInterface {
        /// Interface mapping
        mapping: StringIndex,
        /// Number of arguments
        arg_count: u8,
    },

    /// Stack: [args.., delay] -> []
    CallModuleDelayed {
        /// Module slot
        slot: ModuleSlot,
        /// Number of arguments
        arg_count: u8,
    },

    /// Stack: [args.., delay] -> []
    CallInterfaceDelayed {
        /// Interface mapping
        mapping: StringIndex,
        /// Number of arguments
        arg_count: u8,
    },

    /// Stack: [message] -> []
    Write(StringIndex),

    // === Block Exits ===
    /// Stack: [value] -> (block ends with the logic result)
    Conclude,

    /// Stack: [v1..vn] -> (block ends with the returned values)
    Return(u16),

    /// End of block
    Halt,
}

impl Instruction {
    /// Get the stack effect of this instruction (positive = pushes, negative = pops)
    pub fn stack_effect(&self) -> i32 {
        match self {
            Self::PushConstant(_)
            | Self::Duplicate
            | Self::LoadSlot(_)
            | Self::LoadNow
            | Self::LoadEventTime
            | Self::LoadTriggerTime
            | Self::LoadCurrentTime
            | Self::LoadEvent(_)
            | Self::IterNext(_)
            | Self::CollectEnd => 1,

            Self::Pop
            | Self::StoreSlot(_)
            | Self::StoreNow
            | Self::Binary(_)
            | Self::ChangeTime
            | Self::Flatten
            | Self::Merge
            | Self::IterBegin
            | Self::JumpIfNotTrue(_)
            | Self::Write(_)
            | Self::Conclude => -1,

            Self::CollectIf => -2,

            Self::Unary(_)
            | Self::TimeOf
            | Self::Singleton
            | Self::SortByTime
            | Self::SortByData
            | Self::IterEnd
            | Self::CollectBegin
            | Self::Jump(_)
            | Self::SequencePoint(_)
            | Self::FindModule { .. }
            | Self::BindSelf(_)
            | Self::Halt => 0,

            Self::CallModule { arg_count, .. } | Self::CallInterface { arg_count, .. } => {
                1 - i32::from(*arg_count)
            }
            Self::CallModuleDelayed { arg_count, .. }
            | Self::CallInterfaceDelayed { arg_count, .. } => -1 - i32::from(*arg_count),

            Self::Return(count) => -i32::from(*count),
        }
    }

    /// Whether this is a jump whose offset is patched by the builder
    pub fn is_jump(&self) -> bool {
        matches!(self, Self::Jump(_) | Self::JumpIfNotTrue(_) | Self::IterNext(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushConstant(idx) => write!(f, "PUSH_CONST {idx}"),
            Self::Duplicate => write!(f, "DUP"),
            Self::Pop => write!(f, "POP"),
            Self::LoadSlot(slot) => write!(f, "LOAD {slot}"),
            Self::StoreSlot(slot) => write!(f, "STORE {slot}"),
            Self::LoadNow => write!(f, "LOAD_NOW"),
            Self::StoreNow => write!(f, "STORE_NOW"),
            Self::LoadEventTime => write!(f, "LOAD_EVENTTIME"),
            Self::LoadTriggerTime => write!(f, "LOAD_TRIGGERTIME"),
            Self::LoadCurrentTime => write!(f, "LOAD_CURRENTTIME"),
            Self::LoadEvent(idx) => write!(f, "LOAD_EVENT {idx}"),
            Self::Binary(op) => write!(f, "BINARY {op}"),
            Self::Unary(op) => write!(f, "UNARY {op}"),
            Self::ChangeTime => write!(f, "CHANGE_TIME"),
            Self::TimeOf => write!(f, "TIME_OF"),
            Self::Singleton => write!(f, "SINGLETON"),
            Self::Flatten => write!(f, "FLATTEN"),
            Self::Merge => write!(f, "MERGE"),
            Self::SortByTime => write!(f, "SORT_TIME"),
            Self::SortByData => write!(f, "SORT_DATA"),
            Self::IterBegin => write!(f, "ITER_BEGIN"),
            Self::IterNext(offset) => write!(f, "ITER_NEXT {offset}"),
            Self::IterEnd => write!(f, "ITER_END"),
            Self::CollectBegin => write!(f, "COLLECT_BEGIN"),
            Self::CollectIf => write!(f, "COLLECT_IF"),
            Self::CollectEnd => write!(f, "COLLECT_END"),
            Self::Jump(offset) => write!(f, "JUMP {offset}"),
            Self::JumpIfNotTrue(offset) => write!(f, "JMP_NOT_TRUE {offset}"),
            Self::SequencePoint(line) => write!(f, "LINE {line}"),
            Self::FindModule {
                name,
                institution,
                slot,
            } => match institution {
                Some(inst) => write!(f, "FIND_MLM {name} {inst} -> {slot}"),
                None => write!(f, "FIND_MLM {name} -> {slot}"),
            },
            Self::BindSelf(slot) => write!(f, "BIND_SELF -> {slot}"),
            Self::CallModule { slot, arg_count } => write!(f, "CALL_MLM {slot} {arg_count}"),
            Self::CallInterface { mapping, arg_count } => {
                write!(f, "CALL_INTERFACE {mapping} {arg_count}")
            }
            Self::CallModuleDelayed { slot, arg_count } => {
                write!(f, "CALL_MLM_DELAYED {slot} {arg_count}")
            }
            Self::CallInterfaceDelayed { mapping, arg_count } => {
                write!(f, "CALL_INTERFACE_DELAYED {mapping} {arg_count}")
            }
            Self::Write(idx) => write!(f, "WRITE {idx}"),
            Self::Conclude => write!(f, "CONCLUDE"),
            Self::Return(count) => write!(f, "RETURN {count}"),
            Self::Halt => write!(f, "HALT"),
        }
    }
}

/// Bytecode program containing instructions and constant pools
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    /// Instruction sequence
    pub instructions: Vec<Instruction>,

    /// Constant value pool
    pub constants: Vec<ArdenValue>,

    /// String pool (mappings, module names, destinations)
    pub strings: Vec<String>,

    /// Upper bound on stack depth along straight-line execution
    pub max_stack_depth: usize,

    /// Label for diagnostics, e.g. `module:logic`
    pub source: Option<String>,
}

impl Bytecode {
    /// Create new empty bytecode
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant to the pool and return its index
    pub fn add_constant(&mut self, value: ArdenValue) -> CompileResult<ConstantIndex> {
        if let Some(index) = self.constants.iter().position(|v| same_constant(v, &value)) {
            return Ok(index as ConstantIndex);
        }
        let index = ConstantIndex::try_from(self.constants.len())
            .map_err(|_| CompileError::internal("constant pool exhausted"))?;
        self.constants.push(value);
        Ok(index)
    }

    /// Add a string to the pool and return its index
    pub fn add_string(&mut self, string: &str) -> CompileResult<StringIndex> {
        if let Some(index) = self.strings.iter().position(|s| s == string) {
            return Ok(index as StringIndex);
        }
        let index = StringIndex::try_from(self.strings.len())
            .map_err(|_| CompileError::internal("string pool exhausted"))?;
        self.strings.push(string.to_string());
        Ok(index)
    }

    /// Add an instruction to the bytecode
    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Calculate the maximum stack depth required
    pub fn calculate_max_stack_depth(&mut self) {
        let mut current_depth = 0i32;
        let mut max_depth = 0i32;

        for instruction in &self.instructions {
            current_depth += instruction.stack_effect();
            max_depth = max_depth.max(current_depth);
        }

        self.max_stack_depth = max_depth.max(0) as usize;
    }

    /// Pretty print the bytecode for debugging
    pub fn disassemble(&self) -> String {
        let mut output = String::new();
        output.push_str("=== BYTECODE DISASSEMBLY ===\n");

        if let Some(source) = &self.source {
            output.push_str(&format!("Source: {source}\n"));
        }

        output.push_str(&format!("Max Stack Depth: {}\n", self.max_stack_depth));
        output.push_str(&format!("Constants: {}\n", self.constants.len()));
        output.push_str(&format!("Strings: {}\n", self.strings.len()));
        output.push_str("\n--- CONSTANTS ---\n");

        for (i, constant) in self.constants.iter().enumerate() {
            output.push_str(&format!("{i:4}: {constant}\n"));
        }

        output.push_str("\n--- STRINGS ---\n");
        for (i, string) in self.strings.iter().enumerate() {
            output.push_str(&format!("{i:4}: \"{string}\"\n"));
        }

        output.push_str("\n--- INSTRUCTIONS ---\n");
        for (i, instruction) in self.instructions.iter().enumerate() {
            output.push_str(&format!("{i:4}: {instruction}\n"));
        }

        output
    }
}

/// Forward-referenceable jump target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

/// Kind of jump emitted towards a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// [`Instruction::Jump`]
    Always,
    /// [`Instruction::JumpIfNotTrue`]
    IfNotTrue,
    /// [`Instruction::IterNext`]
    IterExhausted,
}

/// Destination for compiled instructions
///
/// The compiler only talks to this trait, so another backend can be plugged
/// in by implementing it.
pub trait InstructionSink {
    /// Append an instruction
    fn emit(&mut self, instruction: Instruction);

    /// Intern a constant
    fn constant(&mut self, value: ArdenValue) -> CompileResult<ConstantIndex>;

    /// Intern a string
    fn string(&mut self, text: &str) -> CompileResult<StringIndex>;

    /// Allocate an unplaced label
    fn new_label(&mut self) -> Label;

    /// Bind a label to the next emitted instruction
    fn place_label(&mut self, label: Label);

    /// Emit a jump to a label placed before or after this point
    fn jump(&mut self, kind: JumpKind, label: Label);

    /// Intern a constant and push it
    fn push_constant(&mut self, value: ArdenValue) -> CompileResult<()> {
        let index = self.constant(value)?;
        self.emit(Instruction::PushConstant(index));
        Ok(())
    }
}

/// Constants share a pool entry only when bit-identical, so `-0.0` stays apart from `0.0`
fn same_constant(a: &ArdenValue, b: &ArdenValue) -> bool {
    if a.primary_time() != b.primary_time() {
        return false;
    }
    match (a.data(), b.data()) {
        (ValueData::Number(x), ValueData::Number(y)) => x.to_bits() == y.to_bits(),
        (ValueData::List(xs), ValueData::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_constant(x, y))
        }
        (x, y) => x == y,
    }
}

/// Bytecode builder utility for constructing bytecode programs
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    bytecode: Bytecode,
    label_targets: Vec<Option<usize>>,
    pending_jumps: Vec<(usize, Label, JumpKind)>,
}

impl BytecodeBuilder {
    /// Create a new bytecode builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instructions emitted so far
    pub fn len(&self) -> usize {
        self.bytecode.instructions.len()
    }

    /// Whether nothing has been emitted yet
    pub fn is_empty(&self) -> bool {
        self.bytecode.instructions.is_empty()
    }

    /// Finalize the bytecode by resolving jumps and calculating stack depth
    pub fn finalize(mut self) -> CompileResult<Bytecode> {
        for (instruction_pos, label, kind) in self.pending_jumps {
            let target_pos = self
                .label_targets
                .get(label.0 as usize)
                .copied()
                .flatten()
                .ok_or_else(|| CompileError::internal(format!("Undefined label: {}", label.0)))?;

            let offset = target_pos as i64 - instruction_pos as i64;
            let offset = i16::try_from(offset).map_err(|_| {
                CompileError::internal(format!("Jump offset too large: {offset}"))
            })?;

            self.bytecode.instructions[instruction_pos] = match kind {
                JumpKind::Always => Instruction::Jump(offset),
                JumpKind::IfNotTrue => Instruction::JumpIfNotTrue(offset),
                JumpKind::IterExhausted => Instruction::IterNext(offset),
            };
        }

        self.bytecode.calculate_max_stack_depth();

        Ok(self.bytecode)
    }
}

impl InstructionSink for BytecodeBuilder {
    fn emit(&mut self, instruction: Instruction) {
        self.bytecode.emit(instruction);
    }

    fn constant(&mut self, value: ArdenValue) -> CompileResult<ConstantIndex> {
        self.bytecode.add_constant(value)
    }

    fn string(&mut self, text: &str) -> CompileResult<StringIndex> {
        self.bytecode.add_string(text)
    }

    fn new_label(&mut self) -> Label {
        self.label_targets.push(None);
        Label((self.label_targets.len() - 1) as u32)
    }

    fn place_label(&mut self, label: Label) {
        let position = self.bytecode.instructions.len();
        if let Some(target) = self.label_targets.get_mut(label.0 as usize) {
            *target = Some(position);
        }
    }

    fn jump(&mut self, kind: JumpKind, label: Label) {
        let position = self.bytecode.instructions.len();
        self.pending_jumps.push((position, label, kind));
        // Placeholder offset, patched in finalize
        let placeholder = match kind {
            JumpKind::Always => Instruction::Jump(0),
            JumpKind::IfNotTrue => Instruction::JumpIfNotTrue(0),
            JumpKind::IterExhausted => Instruction::IterNext(0),
        };
        self.bytecode.emit(placeholder);
    }
}
