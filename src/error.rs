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

//! Error type of the engine facade

use arden_compiler::CompileError;
use arden_core::ArdenError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can go wrong between loading a configuration and running a module
#[derive(Error, Debug)]
pub enum Error {
    /// A module failed to compile
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A module failed while running
    #[error(transparent)]
    Runtime(#[from] ArdenError),

    /// Configuration text is not valid
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },
}

impl Error {
    /// The compile error, if this is one
    pub fn as_compile_error(&self) -> Option<&CompileError> {
        match self {
            Self::Compile(err) => Some(err),
            _ => None,
        }
    }

    /// The runtime error, if this is one
    pub fn as_runtime_error(&self) -> Option<&ArdenError> {
        match self {
            Self::Runtime(err) => Some(err),
            _ => None,
        }
    }
}
