//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util::prompt_err;
use crate::config::{self, Config, DEFAULT_API_URL, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "retry_attempts = {}", cfg.defaults.retry_attempts);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);
    let _ = writeln!(out, "mac_batch_size = {}", cfg.defaults.mac_batch_size);
    let _ = writeln!(
        out,
        "default_country_code = {}",
        cfg.defaults.default_country_code
    );

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

/// Copy of the config with plaintext tokens masked, for JSON/YAML output.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    cfg
}

fn read_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("API token: ").map_err(prompt_err)?;
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "API token cannot be empty".into(),
        });
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("sitemover configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. API URL
            let api_url: String = Input::new()
                .with_prompt("Inventory API URL")
                .default(DEFAULT_API_URL.into())
                .interact_text()
                .map_err(prompt_err)?;
            sitemover_config::parse_api_url(&api_url)?;

            // 3. Token storage
            let choices = &[
                "Store in system keyring (recommended)",
                "Read from an environment variable",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where should the API token come from?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let (token, token_env) = match selection {
                0 => {
                    let token = read_token()?;
                    sitemover_config::store_token(&profile_name, &token)?;
                    eprintln!("   ✓ Token stored in system keyring");
                    (None, None)
                }
                1 => {
                    let var: String = Input::new()
                        .with_prompt("Environment variable name")
                        .default("XIQ_TOKEN".into())
                        .interact_text()
                        .map_err(prompt_err)?;
                    (None, Some(var))
                }
                _ => (Some(read_token()?), None),
            };

            // 4. Build profile and config
            let profile = Profile {
                api_url,
                token,
                token_env,
                ..Profile::default()
            };

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            // 5. Write config
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Try it: sitemover preview <snapshot.json>");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(global.output, &redacted(&cfg), format_config_redacted)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: cfg.profile_names(),
                });
            }

            let token = read_token()?;
            sitemover_config::store_token(&profile_name, &token)?;
            eprintln!("✓ Token stored in keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_tokens_are_masked() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                token: Some("secret-token".into()),
                token_env: Some("LAB_TOKEN".into()),
                ..Profile::default()
            },
        );

        let text = format_config_redacted(&cfg);
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("token = \"****\""));
        assert!(text.contains("token_env = \"LAB_TOKEN\""));
        assert!(!text.contains("secret-token"));

        let masked = redacted(&cfg);
        assert_eq!(masked.profiles["lab"].token.as_deref(), Some("****"));
    }
}
