//! Shared helpers for command handlers.

use crate::error::CliError;

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e} (use --yes for unattended runs)"),
    }
}

/// Ask a yes/no question on the terminal.
pub fn confirm(message: &str, default: bool) -> Result<bool, CliError> {
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()
        .map_err(prompt_err)
}
