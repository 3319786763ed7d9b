//! Configuration for sitemover.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `sitemover_core::ServiceConfig` / `RunSettings`. The CLI
//! layers its flag overrides on top of these helpers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitemover_core::{MatchStrategy, RunSettings, ServiceConfig, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/token`.
pub const KEYRING_SERVICE: &str = "sitemover";

pub const DEFAULT_API_URL: &str = "https://api.extremecloudiq.com";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Comma-separated profile names, sorted, for help text.
    pub fn profile_names(&self) -> String {
        let mut names: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        if names.is_empty() {
            "(none)".into()
        } else {
            names.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_mac_batch_size")]
    pub mac_batch_size: usize,

    /// Applied to domains whose country could not be determined.
    #[serde(default = "default_country_code")]
    pub default_country_code: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            page_size: default_page_size(),
            mac_batch_size: default_mac_batch_size(),
            default_country_code: default_country_code(),
        }
    }
}

impl Defaults {
    /// Run settings seeded from these defaults.
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            retry_attempts: self.retry_attempts,
            page_size: self.page_size,
            mac_batch_size: self.mac_batch_size,
            default_country_code: self.default_country_code,
            match_strategy: MatchStrategy::default(),
            log_ap_floor_defaults: true,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_retry_attempts() -> u32 {
    4
}
fn default_page_size() -> u32 {
    100
}
fn default_mac_batch_size() -> usize {
    100
}
fn default_country_code() -> u32 {
    840
}

/// A named inventory service account.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "sitemover").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sitemover");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if present), then `SITEMOVER_*` env vars.
///
/// Nested keys use a double underscore: `SITEMOVER_DEFAULTS__PAGE_SIZE`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SITEMOVER_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Keyring entry name for a profile's token.
pub fn token_key(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

/// Resolve a token from the credential chain (no CLI flag step).
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &token_key(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let keyring_err = |e: keyring::Error| ConfigError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    };
    keyring::Entry::new(KEYRING_SERVICE, &token_key(profile_name))
        .map_err(keyring_err)?
        .set_password(token)
        .map_err(keyring_err)
}

/// TLS mode implied by a profile.
pub fn profile_tls(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `ServiceConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_service_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    Ok(ServiceConfig {
        url: parse_api_url(&profile.api_url)?,
        token: resolve_token(profile, profile_name)?,
        tls: profile_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}
