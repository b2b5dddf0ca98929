//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library and a nested [`ConfigError`] for environment/config problems. The
//! remote-call variants form the taxonomy callers use to decide on retries:
//!
//! | variant                      | typical cause                  | retried |
//! |------------------------------|--------------------------------|---------|
//! | [`AiLlmError::Auth`]         | 401 / 403                      | never   |
//! | [`AiLlmError::RateLimited`]  | 429                            | yes     |
//! | [`AiLlmError::Upstream`]     | 5xx, 408                       | yes     |
//! | [`AiLlmError::Transport`]    | connect failure, timeout       | yes     |
//! | [`AiLlmError::Rejected`]     | other 4xx                      | no      |
//! | [`AiLlmError::Decode`]       | malformed response payload     | no      |
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Maximum number of characters of an upstream body kept in error messages.
const SNIPPET_MAX_CHARS: usize = 300;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Credentials were rejected by the provider.
    #[error("[AI LLM Service] authentication failed (HTTP {status}) at {url}: {snippet}")]
    Auth {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// The provider throttled the request.
    #[error("[AI LLM Service] rate limited at {url}: {snippet}")]
    RateLimited {
        url: String,
        /// Delay requested by the provider via `Retry-After`, if any.
        retry_after: Option<Duration>,
        snippet: String,
    },

    /// Transient provider failure (5xx, request timeout).
    #[error("[AI LLM Service] upstream error (HTTP {status}) at {url}: {snippet}")]
    Upstream {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// The provider refused the request for a non-transient reason.
    #[error("[AI LLM Service] request rejected (HTTP {status}) at {url}: {snippet}")]
    Rejected {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Underlying HTTP transport error (connection refused, reset, timeout).
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response payload could not be decoded as expected.
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

impl AiLlmError {
    /// Returns `true` for failures that may succeed when the call is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiLlmError::RateLimited { .. } | AiLlmError::Upstream { .. } | AiLlmError::Transport(_)
        )
    }

    /// Delay explicitly requested by the provider, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AiLlmError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Stable, machine-readable code for logs and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AiLlmError::Config(_) => "CONFIG_ERROR",
            AiLlmError::Auth { .. } => "AUTH_ERROR",
            AiLlmError::RateLimited { .. } => "RATE_LIMIT_ERROR",
            AiLlmError::Upstream { .. } | AiLlmError::Transport(_) => "UPSTREAM_ERROR",
            AiLlmError::Rejected { .. } => "UPSTREAM_REJECTED",
            AiLlmError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Classifies a non-success HTTP response into the error taxonomy.
    pub fn from_status(
        status: StatusCode,
        url: impl Into<String>,
        body: &str,
        retry_after: Option<Duration>,
    ) -> Self {
        let url = url.into();
        let snippet = make_snippet(body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiLlmError::Auth {
                status,
                url,
                snippet,
            },
            StatusCode::TOO_MANY_REQUESTS => AiLlmError::RateLimited {
                url,
                retry_after,
                snippet,
            },
            s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => AiLlmError::Upstream {
                status,
                url,
                snippet,
            },
            _ => AiLlmError::Rejected {
                status,
                url,
                snippet,
            },
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Reads an environment variable, falling back to `default` when unset or empty.
pub fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parses an optional number from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but does not
/// parse as `T`. `expected` is the reason reported in that case.
pub fn env_opt_parse<T>(name: &'static str, expected: &'static str) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<T>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: expected,
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    env_opt_parse::<u32>(name, "expected u32")
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] otherwise.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

/// Trims an upstream body to a short single-line snippet for logs and errors.
pub fn make_snippet(body: &str) -> String {
    let flat: String = body
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() > SNIPPET_MAX_CHARS {
        let cut: String = flat.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{cut}…")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        let auth = AiLlmError::from_status(StatusCode::UNAUTHORIZED, "u", "bad key", None);
        assert!(matches!(auth, AiLlmError::Auth { .. }));
        assert!(!auth.is_retryable());

        let limited = AiLlmError::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            "u",
            "",
            Some(Duration::from_secs(2)),
        );
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(2)));

        let upstream = AiLlmError::from_status(StatusCode::BAD_GATEWAY, "u", "", None);
        assert!(upstream.is_retryable());
        assert_eq!(upstream.code(), "UPSTREAM_ERROR");

        let rejected = AiLlmError::from_status(StatusCode::BAD_REQUEST, "u", "", None);
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn snippet_is_flat_and_bounded() {
        let body = format!("line1\nline2\t{}", "x".repeat(1000));
        let s = make_snippet(&body);
        assert!(!s.contains('\n'));
        assert!(s.chars().count() <= SNIPPET_MAX_CHARS + 1);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn endpoint_and_range_validation() {
        assert!(validate_http_endpoint("X", "https://api.openai.com").is_ok());
        assert!(validate_http_endpoint("X", "api.openai.com").is_err());
        assert!(validate_range_f32("temperature", 0.7, 0.0, 2.0).is_ok());
        assert!(validate_range_f32("temperature", f32::NAN, 0.0, 2.0).is_err());
    }
}
