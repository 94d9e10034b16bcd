// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use thiserror::Error;

/// Longest slice of an error body kept in [`ServiceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Failure talking to the completion or geocoding service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{service} request timed out")]
    Timeout { service: &'static str },
    #[error("{service} could not be reached: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} rejected the credentials (HTTP {status})")]
    Authentication { service: &'static str, status: u16 },
    #[error("{service} rate limit exceeded")]
    RateLimited { service: &'static str },
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} returned an empty reply")]
    EmptyResponse { service: &'static str },
    #[error("{service} returned an unreadable reply: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub(crate) fn transport(service: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ServiceError::Timeout { service }
        } else {
            ServiceError::Network { service, source }
        }
    }

    /// Maps a non-2xx reply to the matching variant.
    pub(crate) fn from_status(service: &'static str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ServiceError::Authentication { service, status },
            429 => ServiceError::RateLimited { service },
            _ => ServiceError::Status {
                service,
                status,
                body: truncate(body.trim(), MAX_ERROR_BODY),
            },
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            ServiceError::Timeout { service }
            | ServiceError::Network { service, .. }
            | ServiceError::Authentication { service, .. }
            | ServiceError::RateLimited { service }
            | ServiceError::Status { service, .. }
            | ServiceError::EmptyResponse { service }
            | ServiceError::InvalidResponse { service, .. } => *service,
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ServiceError::from_status("completion", 401, ""),
            ServiceError::Authentication { status: 401, .. }
        ));
        assert!(matches!(
            ServiceError::from_status("completion", 403, ""),
            ServiceError::Authentication { status: 403, .. }
        ));
        assert!(matches!(
            ServiceError::from_status("geocoding", 429, "slow down"),
            ServiceError::RateLimited {
                service: "geocoding"
            }
        ));
        match ServiceError::from_status("completion", 503, "  overloaded \n") {
            ServiceError::Status { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY * 2);
        match ServiceError::from_status("completion", 500, &body) {
            ServiceError::Status { body, .. } => {
                assert_eq!(body.chars().count(), MAX_ERROR_BODY + 1);
                assert!(body.ends_with('…'));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let err = ServiceError::RateLimited {
            service: "completion",
        };
        assert_eq!(err.to_string(), "completion rate limit exceeded");
        assert_eq!(err.service(), "completion");
    }
}
