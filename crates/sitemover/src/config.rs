//! CLI configuration: thin wrapper around `sitemover_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --token, --insecure, --timeout, --retries).

use std::time::Duration;

use secrecy::SecretString;

use sitemover_core::{RunSettings, ServiceConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use sitemover_config::{
    Config, DEFAULT_API_URL, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ServiceConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile the flags alone must carry a token; naming a
/// profile that does not exist is an error.
pub fn resolve_service_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ServiceConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let Some(profile) = config.profiles.get(&profile_name) else {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: config.profile_names(),
            });
        }
        let token = global.token.clone().ok_or(CliError::NoCredentials {
            profile: profile_name,
        })?;
        let url = global.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        return Ok(ServiceConfig {
            url: sitemover_config::parse_api_url(url)?,
            token: SecretString::from(token),
            tls: if global.insecure {
                TlsVerification::DangerAcceptInvalid
            } else {
                TlsVerification::SystemDefaults
            },
            timeout: Duration::from_secs(global.timeout.unwrap_or(config.defaults.timeout)),
        });
    };

    // 1. API URL (flag > env > profile)
    let url = sitemover_config::parse_api_url(
        global.api_url.as_deref().unwrap_or(&profile.api_url),
    )?;

    // 2. Token (flag > profile credential chain)
    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => sitemover_config::resolve_token(profile, &profile_name)?,
    };

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        sitemover_config::profile_tls(profile)
    };

    // 4. Timeout (flag > profile > defaults)
    let timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(config.defaults.timeout),
    );

    Ok(ServiceConfig {
        url,
        token,
        tls,
        timeout,
    })
}

/// Run settings from config defaults with the retry override applied.
pub fn run_settings(global: &GlobalOpts, config: &Config) -> RunSettings {
    let mut settings = config.defaults.run_settings();
    if let Some(retries) = global.retries {
        settings.retry_attempts = retries;
    }
    settings
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["sitemover"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["preview", "snapshot.json"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                api_url: "https://lab.example.com".into(),
                token: Some("lab-token".into()),
                timeout: Some(60),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with_lab();
        let svc = resolve_service_config(
            &global(&["-p", "lab", "--api-url", "https://other.example.com", "--timeout", "5", "-k"]),
            &cfg,
        )
        .unwrap();
        assert_eq!(svc.url.as_str(), "https://other.example.com/");
        assert_eq!(svc.timeout, Duration::from_secs(5));
        assert_eq!(svc.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(svc.token.expose_secret(), "lab-token");
    }

    #[test]
    fn profile_timeout_beats_defaults() {
        let svc = resolve_service_config(&global(&["-p", "lab"]), &config_with_lab()).unwrap();
        assert_eq!(svc.timeout, Duration::from_secs(60));
        assert_eq!(svc.url.as_str(), "https://lab.example.com/");
    }

    #[test]
    fn unknown_explicit_profile_is_rejected() {
        let err = resolve_service_config(&global(&["-p", "prod"]), &config_with_lab()).unwrap_err();
        assert!(
            matches!(err, CliError::ProfileNotFound { ref name, ref available } if name == "prod" && available == "lab")
        );
    }

    #[test]
    fn token_flag_works_without_profile() {
        let svc =
            resolve_service_config(&global(&["--token", "abc"]), &Config::default()).unwrap();
        assert_eq!(svc.url.as_str(), "https://api.extremecloudiq.com/");
        assert_eq!(svc.token.expose_secret(), "abc");
    }

    #[test]
    fn retries_flag_overrides_defaults() {
        let settings = run_settings(&global(&["--retries", "7"]), &Config::default());
        assert_eq!(settings.retry_attempts, 7);
        assert_eq!(settings.page_size, 100);
    }
}
