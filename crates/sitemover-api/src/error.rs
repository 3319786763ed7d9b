use thiserror::Error;

/// Top-level error type for the `sitemover-api` crate.
///
/// Covers every failure mode of the inventory REST surface: authentication,
/// transport, structured API errors, and the duplicate-name business error.
/// `sitemover-core` classifies these into retryable / fatal / duplicate
/// outcomes at the call boundary.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected (expired, revoked, or wrong account).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Inventory API ───────────────────────────────────────────────
    /// Non-success response from the inventory service.
    ///
    /// `code` and `structured` are set when the body carried the
    /// `{error_code, error_message}` shape.
    #[error("Inventory API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        structured: bool,
    },

    /// The service refused a create because the name is already taken.
    #[error("Duplicate name: {message}")]
    DuplicateName { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the token was rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is the duplicate-name business condition.
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, Self::DuplicateName { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Transport failures always qualify. HTTP errors qualify unless the
    /// service answered a 4xx with a structured business error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api {
                status, structured, ..
            } => *status >= 500 || *status == 429 || !*structured,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, structured: bool) -> Error {
        Error::Api {
            status,
            message: "boom".into(),
            code: None,
            structured,
        }
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(api(503, true).is_transient());
        assert!(api(500, false).is_transient());
        assert!(api(429, true).is_transient());
    }

    #[test]
    fn unstructured_client_errors_are_transient() {
        assert!(api(404, false).is_transient());
    }

    #[test]
    fn structured_business_errors_are_not_transient() {
        assert!(!api(400, true).is_transient());
        assert!(
            !Error::DuplicateName {
                message: "duplicate".into()
            }
            .is_transient()
        );
        assert!(
            !Error::Authentication {
                message: "nope".into()
            }
            .is_transient()
        );
    }
}
