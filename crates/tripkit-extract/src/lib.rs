// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Pure half of the trip planner: the user's request, the instruction sent to the
//! language model and the extraction of destination records from its reply.
//!
//! Nothing in this crate performs I/O, so every function here can be called from
//! any number of threads at once.

pub mod parser;
pub mod prompt;
pub mod record;
pub mod request;

pub use parser::{parse_response, Extraction, ExtractionFailure, ExtractionOutcome};
pub use prompt::{build_prompt, PromptBuilder, PromptText, PROMPT_SCHEMA_VERSION};
pub use record::{Coordinates, DestinationRecord, SkipReason, SkippedDestination};
pub use request::{
    DestinationRequest, RequestError, TimeBudget, TimeUnit, AGE_RANGE, TIME_PRESETS,
};
