// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Construction of the blocking HTTP clients shared by the service adapters.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "tripkit/",
    env!("CARGO_PKG_VERSION"),
    " (family trip planner; https://github.com/StarTuz/tripkit)"
);

/// Builds a client with a bounded per-request timeout. Built once at startup and
/// handed to each adapter.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(user_agent)
            .with_context(|| format!("invalid User-Agent header: {:?}", user_agent))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .context("failed to build an HTTP client")
}
