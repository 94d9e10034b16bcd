// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Travel-time presets offered by the budget selector, in hours.
pub const TIME_PRESETS: [&str; 6] = ["0.5h", "1h", "1.5h", "2h", "2.5h", "3h"];

/// Ages offered by the age selector. Requests outside this range are still accepted.
pub const AGE_RANGE: RangeInclusive<u32> = 0..=18;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("starting point must not be empty")]
    EmptyOrigin,
    #[error("travel time must be a positive number, got {0}")]
    NonPositiveBudget(f64),
    #[error("could not understand travel time '{0}' (try '1.5h' or '45m')")]
    InvalidBudget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Minutes,
}

impl TimeUnit {
    fn noun(self, singular: bool) -> &'static str {
        match (self, singular) {
            (TimeUnit::Hours, true) => "hour",
            (TimeUnit::Hours, false) => "hours",
            (TimeUnit::Minutes, true) => "minute",
            (TimeUnit::Minutes, false) => "minutes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub value: f64,
    pub unit: TimeUnit,
}

impl TimeBudget {
    pub fn new(value: f64, unit: TimeUnit) -> Result<Self, RequestError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(RequestError::NonPositiveBudget(value));
        }
        Ok(Self { value, unit })
    }

    pub fn hours(value: f64) -> Result<Self, RequestError> {
        Self::new(value, TimeUnit::Hours)
    }

    pub fn minutes(value: f64) -> Result<Self, RequestError> {
        Self::new(value, TimeUnit::Minutes)
    }

    pub fn as_minutes(&self) -> f64 {
        match self.unit {
            TimeUnit::Hours => self.value * 60.0,
            TimeUnit::Minutes => self.value,
        }
    }
}

impl fmt::Display for TimeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.noun(self.value == 1.0))
    }
}

impl FromStr for TimeBudget {
    type Err = RequestError;

    /// Accepts selector presets ("1.5h") as well as "90 min", "2 hours" or a bare
    /// number, which is read as hours.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static BUDGET_RE: OnceLock<Regex> = OnceLock::new();
        let re = BUDGET_RE.get_or_init(|| {
            Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?|\.\d+)\s*(h|hrs?|hours?|m|mins?|minutes?)?\s*$")
                .unwrap()
        });

        let caps = re
            .captures(s)
            .ok_or_else(|| RequestError::InvalidBudget(s.to_string()))?;
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| RequestError::InvalidBudget(s.to_string()))?;
        let unit = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
            Some(u) if u.starts_with('m') => TimeUnit::Minutes,
            _ => TimeUnit::Hours,
        };
        Self::new(value, unit)
    }
}

/// One submission of the planner form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRequest {
    pub origin: String,
    pub budget: TimeBudget,
    pub age: Option<u32>,
}

impl DestinationRequest {
    pub fn new(
        origin: impl AsRef<str>,
        budget: TimeBudget,
        age: Option<u32>,
    ) -> Result<Self, RequestError> {
        let origin = origin.as_ref().trim();
        if origin.is_empty() {
            return Err(RequestError::EmptyOrigin);
        }
        Ok(Self {
            origin: origin.to_string(),
            budget,
            age,
        })
    }

    /// Headline shown above the results.
    pub fn title(&self) -> String {
        match self.age {
            Some(age) => format!(
                "Where can I go from {} within {} with {}-year-old?",
                self.origin, self.budget, age
            ),
            None => format!(
                "Where can I go from {} within {} with kids?",
                self.origin, self.budget
            ),
        }
    }
}
