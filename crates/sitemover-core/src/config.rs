// ── Runtime configuration ──
//
// These types describe how to reach the inventory service and how a run
// behaves. The CLI builds them from profiles and flags; core never reads
// config files.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (intercepting proxies).
    DangerAcceptInvalid,
}

/// Connection settings for one inventory service account.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// API base URL (e.g. `https://api.extremecloudiq.com`).
    pub url: Url,
    /// Bearer token.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// How unplaced devices are matched to snapshot APs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStrategy {
    /// Resolve MAC addresses in batches and place each device on its grid cell.
    #[default]
    Mac,
    /// Use device-group membership (`RFD-<domain>`) and move devices in bulk.
    Group,
}

/// Knobs for a single migration run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Attempts per remote call before giving up.
    pub retry_attempts: u32,
    /// Page size for paginated device and group listings.
    pub page_size: u32,
    /// MACs per lookup request.
    pub mac_batch_size: usize,
    /// Country code applied when a domain has none.
    pub default_country_code: u32,
    pub match_strategy: MatchStrategy,
    /// Warn for every AP placed on a defaulted floor.
    pub log_ap_floor_defaults: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            retry_attempts: 4,
            page_size: 100,
            mac_batch_size: 100,
            default_country_code: 840,
            match_strategy: MatchStrategy::Mac,
            log_ap_floor_defaults: true,
        }
    }
}
