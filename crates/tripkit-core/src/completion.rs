// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Adapter for an OpenAI-compatible chat completions endpoint.

use crate::error::ServiceError;
use crate::settings::{ApiKey, CompletionSettings};
use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tripkit_extract::PromptText;

const SERVICE: &str = "completion service";

/// Lowest sampling temperature; replies should be as repeatable as the model allows.
const TEMPERATURE: f32 = 0.0;

/// Sends one prompt and returns the model's raw text reply.
pub trait CompletionService {
    fn complete(&self, prompt: &PromptText) -> Result<String, ServiceError>;
}

impl<T: CompletionService + ?Sized> CompletionService for &T {
    fn complete(&self, prompt: &PromptText) -> Result<String, ServiceError> {
        (**self).complete(prompt)
    }
}

impl<T: CompletionService + ?Sized> CompletionService for Box<T> {
    fn complete(&self, prompt: &PromptText) -> Result<String, ServiceError> {
        (**self).complete(prompt)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    http: Client,
    endpoint: Url,
    api_key: ApiKey,
    settings: CompletionSettings,
}

impl OpenAiClient {
    pub fn new(settings: CompletionSettings, api_key: ApiKey) -> Result<Self> {
        let http = crate::http::build_client(settings.timeout(), crate::http::DEFAULT_USER_AGENT)?;
        Self::with_client(http, settings, api_key)
    }

    /// Uses an already built client, so several adapters can share one pool.
    pub fn with_client(http: Client, settings: CompletionSettings, api_key: ApiKey) -> Result<Self> {
        let endpoint = chat_endpoint(&settings.base_url)?;
        info!(
            "Completion client ready — endpoint={} model={} json_mode={}",
            endpoint, settings.model, settings.json_mode
        );
        Ok(Self {
            http,
            endpoint,
            api_key,
            settings,
        })
    }

    fn chat_request<'a>(&'a self, prompt: &'a PromptText) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt.as_str(),
            }],
            temperature: TEMPERATURE,
            response_format: self.settings.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

impl CompletionService for OpenAiClient {
    fn complete(&self, prompt: &PromptText) -> Result<String, ServiceError> {
        debug!(
            "Requesting completion — model={} prompt_chars={}",
            self.settings.model,
            prompt.as_str().len()
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose())
            .json(&self.chat_request(prompt))
            .send()
            .map_err(|e| ServiceError::transport(SERVICE, e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ServiceError::transport(SERVICE, e))?;
        if !status.is_success() {
            return Err(ServiceError::from_status(SERVICE, status.as_u16(), &body));
        }

        let content = reply_content(&body)?;
        debug!("Completion reply — chars={} raw={}", content.len(), content);
        Ok(content)
    }
}

fn chat_endpoint(base_url: &str) -> Result<Url> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    Url::parse(&url).with_context(|| format!("invalid completion base URL: {:?}", base_url))
}

/// Pulls `choices[0].message.content` out of a chat completion body.
fn reply_content(body: &str) -> Result<String, ServiceError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
            service: SERVICE,
            message: e.to_string(),
        })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ServiceError::EmptyResponse { service: SERVICE })
}
