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

//! Compile-time scope
//!
//! Tracks what each identifier of a module denotes and hands out activation
//! slots. Data variables live in value slots and are reused on reassignment.
//! MLM variables live in module-handle slots. Mapping variables own no slot
//! at all: their mapping text is resolved against the host on every use.
//!
//! WHERE conditions bind `it` to a fresh value slot. The slot is pushed for
//! the duration of the condition through an [`ItSlotGuard`], which pops it on
//! drop so early returns on errors leave the scope consistent.

use crate::bytecode::{ModuleSlot, SlotIndex};
use crate::error::{CompileError, CompileResult};
use arden_ast::{Identifier, MappingKind};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Kind of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableCategory {
    /// Plain value variable
    Data,
    /// Module reference
    Mlm,
    /// INTERFACE mapping
    Interface,
    /// EVENT mapping
    Event,
    /// MESSAGE mapping
    Message,
    /// DESTINATION mapping
    Destination,
}

impl From<MappingKind> for VariableCategory {
    fn from(kind: MappingKind) -> Self {
        match kind {
            MappingKind::Interface => Self::Interface,
            MappingKind::Event => Self::Event,
            MappingKind::Message => Self::Message,
            MappingKind::Destination => Self::Destination,
        }
    }
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Data => "DATA",
            Self::Mlm => "MLM",
            Self::Interface => "INTERFACE",
            Self::Event => "EVENT",
            Self::Message => "MESSAGE",
            Self::Destination => "DESTINATION",
        };
        f.write_str(keyword)
    }
}

/// What an identifier is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    /// Value slot
    Data {
        /// Slot holding the value
        slot: SlotIndex,
    },
    /// Module-handle slot
    Mlm {
        /// Slot holding the resolved module
        slot: ModuleSlot,
    },
    /// Host-resolved mapping
    Mapping {
        /// Declaration kind
        kind: MappingKind,
        /// Mapping text
        mapping: String,
    },
}

impl Variable {
    /// Category of this variable
    pub fn category(&self) -> VariableCategory {
        match self {
            Self::Data { .. } => VariableCategory::Data,
            Self::Mlm { .. } => VariableCategory::Mlm,
            Self::Mapping { kind, .. } => (*kind).into(),
        }
    }
}

/// Names and slots of one module under compilation
#[derive(Debug, Default)]
pub struct CompilerScope {
    variables: IndexMap<String, Variable, FxBuildHasher>,
    value_slots: u16,
    module_slots: u16,
    it_slots: Vec<SlotIndex>,
    spare_it_slots: Vec<SlotIndex>,
}

impl CompilerScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up what an identifier denotes
    pub fn lookup(&self, id: &Identifier) -> Option<&Variable> {
        self.variables.get(&id.key())
    }

    /// Slot of a data variable, allocating it on first assignment
    ///
    /// Rebinding a name that currently denotes a module or mapping turns it
    /// into a data variable.
    pub fn data_slot(&mut self, id: &Identifier) -> CompileResult<SlotIndex> {
        if let Some(Variable::Data { slot }) = self.lookup(id) {
            return Ok(*slot);
        }
        let slot = self.allocate_value_slot()?;
        log::debug!("Allocated slot {slot} for data variable '{id}'");
        self.variables.insert(id.key(), Variable::Data { slot });
        Ok(slot)
    }

    /// Existing data variable slot, for targets that must already be bound
    pub fn existing_data_slot(&self, id: &Identifier, usage: &str) -> CompileResult<SlotIndex> {
        match self.lookup(id) {
            Some(Variable::Data { slot }) => Ok(*slot),
            Some(other) => Err(CompileError::invalid_use(
                &id.name,
                other.category(),
                usage,
                id.position,
            )),
            None => Err(CompileError::UndefinedVariable {
                name: id.name.clone(),
                position: id.position,
            }),
        }
    }

    /// Bind a name to a module-handle slot
    ///
    /// Redeclaring an MLM variable keeps its slot. A name bound to anything
    /// else is rejected.
    pub fn declare_module(&mut self, id: &Identifier) -> CompileResult<ModuleSlot> {
        self.check_redeclaration(id, VariableCategory::Mlm)?;
        if let Some(Variable::Mlm { slot }) = self.lookup(id) {
            return Ok(*slot);
        }
        let slot = self.module_slots;
        self.module_slots = slot
            .checked_add(1)
            .ok_or_else(|| CompileError::internal("module slots exhausted"))?;
        log::debug!("Allocated module slot {slot} for '{id}'");
        self.variables.insert(id.key(), Variable::Mlm { slot });
        Ok(slot)
    }

    /// Bind a name to a mapping
    ///
    /// A later declaration of the same kind replaces the mapping. A name bound
    /// to a different kind of variable is rejected.
    pub fn declare_mapping(
        &mut self,
        id: &Identifier,
        kind: MappingKind,
        mapping: &str,
    ) -> CompileResult<()> {
        self.check_redeclaration(id, kind.into())?;
        log::debug!("Declared {kind} variable '{id}' -> {{{mapping}}}");
        self.variables.insert(
            id.key(),
            Variable::Mapping {
                kind,
                mapping: mapping.to_string(),
            },
        );
        Ok(())
    }

    fn check_redeclaration(
        &self,
        id: &Identifier,
        category: VariableCategory,
    ) -> CompileResult<()> {
        match self.lookup(id).map(Variable::category) {
            Some(existing) if existing != category => Err(CompileError::invalid_use(
                &id.name,
                existing,
                format!("as {category} declaration target"),
                id.position,
            )),
            _ => Ok(()),
        }
    }

    /// Enter a WHERE condition, binding `it` to a fresh slot
    pub fn enter_where(&mut self) -> CompileResult<ItSlotGuard<'_>> {
        let slot = match self.spare_it_slots.pop() {
            Some(slot) => slot,
            None => self.allocate_value_slot()?,
        };
        self.it_slots.push(slot);
        Ok(ItSlotGuard { scope: self, slot })
    }

    /// Slot `it` currently refers to, if inside a WHERE condition
    pub fn current_it(&self) -> Option<SlotIndex> {
        self.it_slots.last().copied()
    }

    /// Number of value slots an activation needs
    pub fn slot_count(&self) -> u16 {
        self.value_slots
    }

    /// Number of module-handle slots an activation needs
    pub fn module_slot_count(&self) -> u16 {
        self.module_slots
    }

    /// Declared variables in declaration order
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(name, var)| (name.as_str(), var))
    }

    fn allocate_value_slot(&mut self) -> CompileResult<SlotIndex> {
        let slot = self.value_slots;
        self.value_slots = slot
            .checked_add(1)
            .ok_or_else(|| CompileError::internal("value slots exhausted"))?;
        Ok(slot)
    }
}

/// Scope handle that keeps an `it` slot bound while alive
pub struct ItSlotGuard<'a> {
    scope: &'a mut CompilerScope,
    slot: SlotIndex,
}

impl ItSlotGuard<'_> {
    /// Slot bound to `it`
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }
}

impl Deref for ItSlotGuard<'_> {
    type Target = CompilerScope;

    fn deref(&self) -> &CompilerScope {
        self.scope
    }
}

impl DerefMut for ItSlotGuard<'_> {
    fn deref_mut(&mut self) -> &mut CompilerScope {
        self.scope
    }
}

impl Drop for ItSlotGuard<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.scope.it_slots.pop() {
            self.scope.spare_it_slots.push(slot);
        }
    }
}
