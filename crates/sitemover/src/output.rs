//! Output formatting: table, JSON, YAML.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Count cell: green when work was done, red for failures, dim for zero.
pub fn paint_count(value: usize, failure: bool, color: bool) -> String {
    let text = value.to_string();
    if !color {
        return text;
    }
    match (value, failure) {
        (0, _) => text.dimmed().to_string(),
        (_, true) => text.red().bold().to_string(),
        (_, false) => text.green().to_string(),
    }
}

pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, which returns a pre-formatted string.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
