//! `preview` handler: show what a migration would provision, offline.

use std::fmt::Write as _;

use serde_json::Value;

use sitemover_core::{SuffixResolver, load_snapshot};

use crate::cli::{GlobalOpts, PreviewArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Tree rendering ──────────────────────────────────────────────────

fn render_level(out: &mut String, name: &str, level: &Value, depth: usize, color: bool) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{}", output::heading(name, color));

    let Some(map) = level.as_object() else {
        return;
    };
    for (key, child) in map {
        if key == "BUILDINGS" {
            render_buildings(out, child, depth + 1);
        } else {
            render_level(out, key, child, depth + 1, color);
        }
    }
}

fn render_buildings(out: &mut String, buildings: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    let Some(map) = buildings.as_object() else {
        return;
    };
    for (name, building) in map {
        let address = building
            .pointer("/address/address")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let _ = writeln!(out, "{indent}building {name} ({address})");

        let floors = building.get("FLOORS").and_then(Value::as_object);
        for (floor, info) in floors.into_iter().flatten() {
            let count = info.get("deviceCount").and_then(Value::as_u64).unwrap_or(0);
            let _ = writeln!(out, "{indent}  floor {floor}: {count} APs");
        }
    }
}

fn render_tree(preview: &Value, color: bool) -> String {
    let mut out = String::new();
    if let Some(root) = preview.as_object() {
        for (name, level) in root {
            render_level(&mut out, name, level, 0, color);
        }
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: PreviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !args.snapshot.is_file() {
        return Err(CliError::SnapshotNotFound {
            path: args.snapshot.display().to_string(),
        });
    }

    let cfg = config::load_config_or_default();
    let settings = config::run_settings(global, &cfg);

    // Overlong names are truncated; nothing is prompted for an offline view.
    let mut resolver = SuffixResolver::new();
    let snapshot = load_snapshot(&args.snapshot)?;
    let plan = sitemover_core::prepare(snapshot, &settings, &mut resolver)?;

    for correction in &plan.corrections {
        tracing::warn!("{correction}");
    }

    let color = output::should_color(global.color);
    let out = output::render_single(global.output, &plan.preview, |p| render_tree(p, color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tree_lists_levels_buildings_and_floors() {
        let preview = json!({
            "Global": {
                "USA": {
                    "BUILDINGS": {
                        "HQ": {
                            "address": {"address": "1 Main St", "city": "Boston", "state": "MA", "postal_code": "02110"},
                            "FLOORS": {"floor1": {"deviceCount": 3}}
                        }
                    }
                }
            }
        });

        let text = render_tree(&preview, false);
        assert_eq!(
            text,
            "Global\n  USA\n    building HQ (1 Main St)\n      floor floor1: 3 APs"
        );
    }
}
