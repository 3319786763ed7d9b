//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use sitemover_config::ConfigError;
use sitemover_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const RETRIES: i32 = 8;
    pub const CANCELLED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────

    #[error("Snapshot file not found: {path}")]
    #[diagnostic(
        code(sitemover::snapshot_not_found),
        help("Export a topology snapshot from the legacy controller first.")
    )]
    SnapshotNotFound { path: String },

    #[error("Invalid snapshot: {message}")]
    #[diagnostic(
        code(sitemover::invalid_snapshot),
        help("The snapshot must be JSON or YAML with `domains` and `aps` lists.")
    )]
    InvalidSnapshot { message: String },

    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the inventory service: {message}")]
    #[diagnostic(
        code(sitemover::connection_failed),
        help(
            "Check the API URL and your network.\n\
             For intercepting proxies, try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { message: String },

    #[error("{operation} gave up after {attempts} attempts")]
    #[diagnostic(
        code(sitemover::retries_exhausted),
        help(
            "Last failure: {reason}\n\
             Re-running is safe: existing locations are reused.\n\
             Raise the attempt count with --retries."
        )
    )]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        reason: String,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(sitemover::auth_failed),
        help(
            "The service rejected the API token: {message}\n\
             Run: sitemover config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No API token configured for profile '{profile}'")]
    #[diagnostic(
        code(sitemover::no_credentials),
        help(
            "Configure credentials with: sitemover config init\n\
             Or set the SITEMOVER_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Remote ───────────────────────────────────────────────────────

    #[error("{operation}: name already exists")]
    #[diagnostic(
        code(sitemover::conflict),
        help("{message}\nRun interactively (without --yes) to choose another name.")
    )]
    Conflict { operation: String, message: String },

    #[error("{operation} failed: {message}")]
    #[diagnostic(code(sitemover::api_error))]
    ApiError { operation: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sitemover::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sitemover::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: sitemover config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(sitemover::config),
        help("Config file: {path}")
    )]
    Config { message: String, path: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Migration cancelled")]
    #[diagnostic(code(sitemover::cancelled), help("Nothing was changed remotely."))]
    Cancelled,

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(sitemover::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(sitemover::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::SnapshotNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::RetriesExhausted { .. } => exit_code::RETRIES,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Cancelled => exit_code::CANCELLED,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Input { message } => CliError::InvalidSnapshot { message },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::RetriesExhausted {
                operation,
                attempts,
                reason,
            } => CliError::RetriesExhausted {
                operation,
                attempts,
                reason,
            },

            CoreError::Remote { operation, message } => {
                if message.starts_with("duplicate name") {
                    CliError::Conflict { operation, message }
                } else if message.contains("error sending request") {
                    CliError::ConnectionFailed {
                        message: format!("{operation}: {message}"),
                    }
                } else {
                    CliError::ApiError { operation, message }
                }
            }

            CoreError::Config { message } => CliError::Config {
                message,
                path: sitemover_config::config_path().display().to_string(),
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: sitemover_config::config_path().display().to_string(),
            },
        }
    }
}
