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

//! Compiler configuration

use serde::{Deserialize, Serialize};

/// Configuration for the module compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Maximum expression nesting to prevent stack overflow
    pub max_recursion_depth: usize,
    /// Whether to emit sequence points carrying source lines
    pub emit_sequence_points: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 256,
            emit_sequence_points: true,
        }
    }
}
