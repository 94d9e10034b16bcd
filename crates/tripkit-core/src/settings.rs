// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tripkit_extract::Coordinates;

/// Environment variable holding the completion service credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("OPENAI_API_KEY is not set; the completion service needs an API key")]
    MissingApiKey,
    #[error("{section}.timeout_secs must be at least 1")]
    ZeroTimeout { section: &'static str },
}

/// Completion service credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, SettingsError> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(SettingsError::MissingApiKey);
        }
        Ok(Self(key))
    }

    /// Reads the key from the process environment. Call once at startup.
    pub fn from_env() -> Result<Self, SettingsError> {
        std::env::var(API_KEY_ENV)
            .map_err(|_| SettingsError::MissingApiKey)
            .and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    /// Ask the service for a JSON object reply.
    pub json_mode: bool,
    pub timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            json_mode: true,
            timeout_secs: 30,
        }
    }
}

impl CompletionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingSettings {
    pub base_url: String,
    /// Nominatim refuses requests without an identifying User-Agent.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: crate::http::DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl GeocodingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Where the map looks when the origin cannot be geocoded.
    pub default_center: Coordinates,
    pub zoom: f64,
    pub pitch: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            // Amsterdam
            default_center: Coordinates {
                longitude: 4.9041,
                latitude: 52.3676,
            },
            zoom: 8.0,
            pitch: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub completion: CompletionSettings,
    pub geocoding: GeocodingSettings,
    pub map: MapSettings,
}

impl Settings {
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("org", "tripkit", "tripkit")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
    }

    /// Loads settings from `path` (or the default location). A missing file yields
    /// the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            log::debug!(
                "No settings file; using defaults — path={}",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        log::info!("Loaded settings — path={}", path.display());
        Ok(settings)
    }

    /// A zero timeout would make every request fail before it is sent.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.completion.timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout {
                section: "completion",
            });
        }
        if self.geocoding.timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout {
                section: "geocoding",
            });
        }
        Ok(())
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(path)
    }
}
