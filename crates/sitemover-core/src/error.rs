// ── Core error types ──
//
// Errors surfaced by the migration engine. Consumers never see raw HTTP
// status codes; the `From<sitemover_api::Error>` impl folds transport-layer
// failures into domain variants, and the retry wrapper adds the operation
// that was being attempted.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Pre-flight errors ────────────────────────────────────────────
    /// The snapshot is missing, unreadable, or malformed.
    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{operation} failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        reason: String,
    },

    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Attach the failed operation's description to an API error.
    pub fn from_api(operation: &str, err: sitemover_api::Error) -> Self {
        match Self::from(err) {
            Self::Remote { message, .. } => Self::Remote {
                operation: operation.to_owned(),
                message,
            },
            other => other,
        }
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitemover_api::Error> for CoreError {
    fn from(err: sitemover_api::Error) -> Self {
        use sitemover_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            ApiError::Api {
                status,
                message,
                code,
                ..
            } => CoreError::Remote {
                operation: "request".into(),
                message: match code {
                    Some(code) => format!("HTTP {status} {code}: {message}"),
                    None => format!("HTTP {status}: {message}"),
                },
            },
            ApiError::DuplicateName { message } => CoreError::Remote {
                operation: "request".into(),
                message: format!("duplicate name: {message}"),
            },
            ApiError::Transport(e) => CoreError::Remote {
                operation: "request".into(),
                message: e.to_string(),
            },
            ApiError::Deserialization { message, .. } => CoreError::Remote {
                operation: "request".into(),
                message: format!("unexpected response body: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_keeps_operation_context() {
        let err = CoreError::from_api(
            "create site Boston",
            sitemover_api::Error::Api {
                status: 400,
                message: "bad parent".into(),
                code: Some("INVALID_PARENT".into()),
                structured: true,
            },
        );
        assert_eq!(
            err.to_string(),
            "create site Boston failed: HTTP 400 INVALID_PARENT: bad parent"
        );
    }

    #[test]
    fn auth_error_is_not_rewrapped() {
        let err = CoreError::from_api(
            "fetch root",
            sitemover_api::Error::Authentication {
                message: "expired".into(),
            },
        );
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
