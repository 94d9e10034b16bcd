// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::request::{DestinationRequest, TimeBudget};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the reply schema embedded in the prompt. `parser` reads exactly this
/// shape, so bump both together.
pub const PROMPT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_EXAMPLE: &str = r#"{
    "destinations": [
        {
            "name": "Destination 1",
            "longitude": 4.6462,
            "latitude": 52.3874,
            "things_to_do": ["Activity 1", "Activity 2", "Activity 3"],
            "travel_time": "45 minutes"
        },
        {
            "name": "Destination 2",
            "longitude": 5.1214,
            "latitude": 52.0907,
            "things_to_do": ["Activity 1", "Activity 2"],
            "travel_time": "1 hour"
        }
    ]
}"#;

/// Instruction text sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptText(String);

impl PromptText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PromptText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// Formats the instruction from raw parts. Inputs are used verbatim: an age
    /// outside the selector range is passed through for the model to judge.
    pub fn build(origin: &str, budget: &TimeBudget, age: Option<u32>) -> PromptText {
        let audience = match age {
            Some(age) => format!("a {}-year-old child or children", age),
            None => "children".to_string(),
        };

        PromptText(format!(
            "Your task is to generate a list of family-friendly destinations (towns and cities) \
and things to do within {budget} of travel by public transport from {origin}. \
They should be recommended for a family trip with {audience}.\n\
\n\
Reply with a single JSON object and nothing else. Use decimal degrees for coordinates, \
give things_to_do as an array of short strings and travel_time as a short text estimate.\n\
\n\
JSON template (schema version {version}):\n\
{schema}\n",
            budget = budget,
            origin = origin.trim(),
            audience = audience,
            version = PROMPT_SCHEMA_VERSION,
            schema = SCHEMA_EXAMPLE,
        ))
    }
}

pub fn build_prompt(request: &DestinationRequest) -> PromptText {
    PromptBuilder::build(&request.origin, &request.budget, request.age)
}
