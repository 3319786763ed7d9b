//! `migrate` handler: provision the snapshot's hierarchy and place devices.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;
use tracing::{debug, warn};

use sitemover_core::{
    EntityKind, EntityOutcome, MatchStrategy, MigrationSummary, ProgressEvent, load_snapshot,
};

use crate::cli::{GlobalOpts, MigrateArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;
use crate::prompt::Resolver;

// ── Row types ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Location")]
    kind: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Reused")]
    reused: String,
    #[tabled(rename = "Failed")]
    failed: String,
    #[tabled(rename = "Skipped")]
    skipped: String,
}

const KINDS: [EntityKind; 4] = [
    EntityKind::SiteGroup,
    EntityKind::Site,
    EntityKind::Building,
    EntityKind::Floor,
];

fn location_rows(summary: &MigrationSummary, color: bool) -> Vec<LocationRow> {
    let report = &summary.provision;
    KINDS
        .iter()
        .map(|&kind| LocationRow {
            kind: kind.to_string(),
            created: output::paint_count(report.created(kind), false, color),
            reused: output::paint_count(report.reused(kind), false, color),
            failed: output::paint_count(report.failed(kind), true, color),
            skipped: output::paint_count(report.skipped(kind), true, color),
        })
        .collect()
}

// ── Detail rendering ────────────────────────────────────────────────

fn detail(summary: &MigrationSummary, color: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", output::heading("Snapshot", color));
    let _ = writeln!(
        out,
        "  {} domains, {} APs",
        summary.domains_found, summary.aps_found
    );
    if !summary.excluded_domains.is_empty() {
        let _ = writeln!(
            out,
            "  excluded (no APs): {}",
            summary.excluded_domains.join(", ")
        );
    }
    if summary.corrections > 0 {
        let _ = writeln!(out, "  hierarchy corrections: {}", summary.corrections);
    }

    let _ = writeln!(out, "\n{}", output::heading("Locations", color));
    let _ = writeln!(out, "{}", output::render_table(&location_rows(summary, color)));

    let problems: Vec<_> = summary
        .provision
        .entries
        .iter()
        .filter(|e| {
            matches!(
                e.outcome,
                EntityOutcome::Failed { .. } | EntityOutcome::Skipped { .. }
            )
        })
        .collect();
    for entry in problems {
        let _ = writeln!(
            out,
            "  {} '{}' under '{}': {}",
            entry.kind, entry.name, entry.parent, entry.outcome
        );
    }

    let _ = writeln!(
        out,
        "\n{}",
        output::heading(&format!("Devices (match by {})", summary.strategy), color)
    );
    let _ = writeln!(
        out,
        "  moved {} of {} eligible",
        output::paint_count(summary.devices_moved, false, color),
        summary.devices_eligible
    );
    if summary.aps_without_floor > 0 {
        let _ = writeln!(
            out,
            "  APs without a provisioned floor: {}",
            output::paint_count(summary.aps_without_floor, true, color)
        );
    }
    for name in &summary.failed_moves {
        let _ = writeln!(out, "  move failed: {name}");
    }

    match summary.strategy {
        MatchStrategy::Mac => {
            if !summary.unresolved_macs.is_empty() {
                let _ = writeln!(
                    out,
                    "  MACs not in inventory: {}",
                    output::paint_count(summary.unresolved_macs.len(), true, color)
                );
            }
        }
        MatchStrategy::Group => {
            for rejected in &summary.rejected_devices {
                let _ = writeln!(out, "  rejected {}: {}", rejected.hostname, rejected.rejection);
            }
            if !summary.not_in_snapshot.is_empty() {
                let _ = writeln!(
                    out,
                    "  unplaced devices not in snapshot: {}",
                    summary.not_in_snapshot.len()
                );
            }
        }
    }

    out.trim_end().to_owned()
}

// ── Progress ────────────────────────────────────────────────────────

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn batch_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len} MACs")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(spinner_style());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn on_progress(bar: &ProgressBar, event: ProgressEvent) {
    match event {
        ProgressEvent::Stage(stage) => {
            debug!(stage, "migration stage");
            bar.set_style(spinner_style());
            bar.set_message(stage);
        }
        ProgressEvent::MacLookup { done, total } => {
            let total = u64::try_from(total).unwrap_or(u64::MAX);
            if bar.length() != Some(total) {
                bar.set_style(batch_style());
                bar.set_length(total);
            }
            bar.set_position(u64::try_from(done).unwrap_or(u64::MAX));
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: MigrateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !args.snapshot.is_file() {
        return Err(CliError::SnapshotNotFound {
            path: args.snapshot.display().to_string(),
        });
    }

    let cfg = config::load_config_or_default();
    let mut settings = config::run_settings(global, &cfg);
    settings.match_strategy = args.match_by.into();
    settings.log_ap_floor_defaults = !args.no_ap_floor_log;
    if let Some(batch) = args.batch_size {
        settings.mac_batch_size = usize::from(batch);
    }

    let bar = progress_bar(global.quiet);
    let mut resolver = Resolver::for_run(global.yes, bar.clone());

    let snapshot = load_snapshot(&args.snapshot)?;
    let plan = sitemover_core::prepare(snapshot, &settings, &mut resolver)?;
    for correction in &plan.corrections {
        warn!("{correction}");
    }

    let service = config::resolve_service_config(global, &cfg)?;

    if !global.yes {
        if util::confirm("Show the hierarchy preview first?", true)? {
            eprintln!("{}", serde_json::to_string_pretty(&plan.preview)?);
        }
        if !util::confirm(
            &format!(
                "Migrate {} domains to {}?",
                plan.topology.units.len(),
                service.url
            ),
            false,
        )? {
            return Err(CliError::Cancelled);
        }
    }

    let api = sitemover_core::connect(&service)?;
    let summary = sitemover_core::execute(&api, &mut resolver, plan, &settings, |event| {
        on_progress(&bar, event);
    })
    .await;
    bar.finish_and_clear();
    let summary = summary?;

    let color = output::should_color(global.color);
    let out = output::render_single(global.output, &summary, |s| detail(s, color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use sitemover_core::{EntityReport, ProvisionReport, RemoteId};

    use super::*;

    fn summary() -> MigrationSummary {
        MigrationSummary {
            domains_found: 3,
            aps_found: 12,
            excluded_domains: vec!["Lab".into()],
            corrections: 0,
            provision: ProvisionReport {
                entries: vec![
                    EntityReport {
                        kind: EntityKind::Site,
                        name: "Boston".into(),
                        parent: "Global".into(),
                        outcome: EntityOutcome::Created,
                        remote_id: Some(RemoteId(100)),
                    },
                    EntityReport {
                        kind: EntityKind::Building,
                        name: "HQ".into(),
                        parent: "Boston".into(),
                        outcome: EntityOutcome::Failed {
                            reason: "HTTP 400: bad address".into(),
                        },
                        remote_id: None,
                    },
                ],
            },
            strategy: MatchStrategy::Mac,
            devices_eligible: 10,
            devices_moved: 9,
            failed_moves: vec!["ap-7".into()],
            unresolved_macs: Vec::new(),
            aps_without_floor: 2,
            rejected_devices: Vec::new(),
            not_in_snapshot: Vec::new(),
        }
    }

    #[test]
    fn detail_lists_failures_and_counts() {
        let text = detail(&summary(), false);
        assert!(text.contains("3 domains, 12 APs"));
        assert!(text.contains("excluded (no APs): Lab"));
        assert!(text.contains("Building 'HQ' under 'Boston': failed: HTTP 400: bad address"));
        assert!(text.contains("moved 9 of 10 eligible"));
        assert!(text.contains("move failed: ap-7"));
        assert!(text.contains("Site Group"));
    }

    #[test]
    fn location_rows_cover_every_kind() {
        let rows = location_rows(&summary(), false);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].kind, "Site");
        assert_eq!(rows[1].created, "1");
        assert_eq!(rows[2].failed, "1");
    }
}
