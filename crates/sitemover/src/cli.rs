//! Clap derive structures for the `sitemover` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use sitemover_core::MatchStrategy;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitemover -- move a legacy controller's sites, floors and APs to the cloud
#[derive(Debug, Parser)]
#[command(
    name = "sitemover",
    version,
    about = "Migrate legacy wireless controller topologies into a cloud inventory service",
    long_about = "Reads a topology snapshot exported from a legacy wireless controller,\n\
        recreates its location hierarchy (site groups, sites, buildings, floors)\n\
        in the cloud inventory service, and places already-enrolled APs on the\n\
        new floors.\n\n\
        Re-running a migration is safe: existing locations are reused.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service profile to use
    #[arg(long, short = 'p', env = "SITEMOVER_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Inventory API base URL (overrides profile)
    #[arg(long, env = "SITEMOVER_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API bearer token
    #[arg(long, env = "SITEMOVER_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITEMOVER_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Non-interactive: skip prompts and rename duplicates automatically
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "SITEMOVER_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SITEMOVER_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Attempts per remote call before giving up
    #[arg(long, env = "SITEMOVER_RETRIES", global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: Option<u32>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Provision the snapshot's hierarchy and move devices onto it
    Migrate(MigrateArgs),

    /// Show the hierarchy a snapshot would produce (no network access)
    Preview(PreviewArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchBy {
    /// Look devices up by AP MAC address
    Mac,
    /// Use `RFD-<domain>` device-group membership
    Group,
}

impl From<MatchBy> for MatchStrategy {
    fn from(value: MatchBy) -> Self {
        match value {
            MatchBy::Mac => Self::Mac,
            MatchBy::Group => Self::Group,
        }
    }
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Topology snapshot (JSON or YAML)
    pub snapshot: PathBuf,

    /// How enrolled devices are matched to snapshot APs
    #[arg(long, value_enum, default_value = "mac")]
    pub match_by: MatchBy,

    /// Don't warn for every AP placed on a defaulted floor
    #[arg(long)]
    pub no_ap_floor_log: bool,

    /// MAC addresses per lookup request
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub batch_size: Option<u16>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Topology snapshot (JSON or YAML)
    pub snapshot: PathBuf,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Store an API token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
