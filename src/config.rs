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

//! Engine configuration
//!
//! Loaded from TOML. Every section and every key is optional:
//!
//! ```toml
//! [compiler]
//! max_recursion_depth = 128
//! emit_sequence_points = false
//!
//! [vm]
//! max_stack_size = 512
//! max_execution_steps = 100000
//! max_call_depth = 16
//! debug_mode = true
//! ```

use crate::error::{Error, Result};
use arden_compiler::CompilerConfig;
use arden_core::VmConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compiler and machine settings used by [`crate::MlmEngine`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Compiler settings
    pub compiler: CompilerConfig,
    /// Virtual machine settings
    pub vm: VmConfig,
}

impl EngineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Self::from_toml_str(&text)
    }
}
