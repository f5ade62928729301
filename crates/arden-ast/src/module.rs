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

//! Whole-module input

use crate::expression::ExpressionNode;
use crate::statement::Statement;

/// Parsed medical logic module
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MlmSource {
    /// Module name from the maintenance category
    pub name: String,
    /// Institution from the maintenance category
    pub institution: Option<String>,
    /// DATA block
    pub data: Vec<Statement>,
    /// LOGIC block
    pub logic: Vec<Statement>,
    /// ACTION block
    pub action: Vec<Statement>,
    /// Urgency slot, evaluated after the DATA block
    pub urgency: Option<ExpressionNode>,
}

impl MlmSource {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the institution
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    /// Set the DATA block
    pub fn with_data(mut self, statements: Vec<Statement>) -> Self {
        self.data = statements;
        self
    }

    /// Set the LOGIC block
    pub fn with_logic(mut self, statements: Vec<Statement>) -> Self {
        self.logic = statements;
        self
    }

    /// Set the ACTION block
    pub fn with_action(mut self, statements: Vec<Statement>) -> Self {
        self.action = statements;
        self
    }

    /// Set the urgency expression
    pub fn with_urgency(mut self, urgency: ExpressionNode) -> Self {
        self.urgency = Some(urgency);
        self
    }
}
