// ── Migration facade ──
//
// Two-phase entry point used by the CLI: `prepare` does everything that
// needs no network (ingest, reconcile, preview) so input errors surface
// before any remote call; `execute` provisions the hierarchy and places
// devices with the configured strategy.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::{MatchStrategy, RunSettings};
use crate::error::CoreError;
use crate::ingest::{Snapshot, ingest};
use crate::model::{MacAddress, Topology};
use crate::naming::NameResolver;
use crate::placement::{
    RejectedDevice, assign_grid, collect_pages, execute_assignments, execute_group_moves,
    link_floors, plan_assignments, plan_group_moves, resolve_devices,
};
use crate::preview::build_preview;
use crate::provision::{Orchestrator, ProvisionReport};
use crate::reconcile::{Correction, reconcile};
use crate::remote::InventoryApi;
use crate::retry::RetryPolicy;

/// Progress notifications for long-running stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Stage(&'static str),
    /// MACs processed so far out of the total.
    MacLookup { done: usize, total: usize },
}

/// Everything known before the first remote call.
#[derive(Debug, Clone)]
pub struct Plan {
    pub domains_found: usize,
    pub aps_found: usize,
    pub topology: Topology,
    pub excluded: Vec<String>,
    pub corrections: Vec<Correction>,
    pub preview: Value,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    pub domains_found: usize,
    pub aps_found: usize,
    pub excluded_domains: Vec<String>,
    pub corrections: usize,
    pub provision: ProvisionReport,
    pub strategy: MatchStrategy,
    pub devices_eligible: usize,
    pub devices_moved: usize,
    pub failed_moves: Vec<String>,
    /// MACs the inventory service does not know.
    pub unresolved_macs: Vec<MacAddress>,
    /// APs whose floor could not be provisioned.
    pub aps_without_floor: usize,
    pub rejected_devices: Vec<RejectedDevice>,
    pub not_in_snapshot: Vec<String>,
}

/// Ingest and reconcile a snapshot and build its preview.
pub fn prepare(
    snapshot: Snapshot,
    settings: &RunSettings,
    resolver: &mut impl NameResolver,
) -> Result<Plan, CoreError> {
    let domains_found = snapshot.domains.len();
    let aps_found = snapshot.aps.len();

    let mut topology = ingest(snapshot, settings, resolver)?;
    let hierarchy = reconcile(&mut topology)?;
    let preview = build_preview(&topology)?;

    info!(
        "{domains_found} domains and {aps_found} APs found; {} domains excluded",
        hierarchy.excluded.len()
    );

    Ok(Plan {
        domains_found,
        aps_found,
        topology,
        excluded: hierarchy.excluded,
        corrections: hierarchy.corrections,
        preview,
    })
}

/// Provision the plan's hierarchy and move devices onto it.
pub async fn execute<A: InventoryApi, R: NameResolver>(
    api: &A,
    resolver: &mut R,
    plan: Plan,
    settings: &RunSettings,
    mut progress: impl FnMut(ProgressEvent),
) -> Result<MigrationSummary, CoreError> {
    let retry = RetryPolicy::new(settings.retry_attempts);
    let Plan {
        domains_found,
        aps_found,
        mut topology,
        excluded,
        corrections,
        ..
    } = plan;

    progress(ProgressEvent::Stage("provisioning locations"));
    let mut orchestrator = Orchestrator::new(api, resolver, retry);
    orchestrator.provision(&mut topology).await?;
    let provision = orchestrator.into_report();

    let aps_without_floor = link_floors(&mut topology);
    assign_grid(&mut topology.aps);

    let mut summary = MigrationSummary {
        domains_found,
        aps_found,
        excluded_domains: excluded,
        corrections: corrections.len(),
        provision,
        strategy: settings.match_strategy,
        devices_eligible: 0,
        devices_moved: 0,
        failed_moves: Vec::new(),
        unresolved_macs: Vec::new(),
        aps_without_floor,
        rejected_devices: Vec::new(),
        not_in_snapshot: Vec::new(),
    };

    match settings.match_strategy {
        MatchStrategy::Mac => {
            progress(ProgressEvent::Stage("resolving MAC addresses"));
            let resolution = resolve_devices(
                api,
                &retry,
                &mut topology.aps,
                settings.mac_batch_size,
                |done, total| progress(ProgressEvent::MacLookup { done, total }),
            )
            .await?;

            progress(ProgressEvent::Stage("placing devices"));
            let assignments = plan_assignments(&topology.aps);
            let placed = execute_assignments(api, &retry, &assignments).await?;

            summary.unresolved_macs = resolution.unresolved;
            summary.devices_eligible = placed.eligible;
            summary.devices_moved = placed.moved;
            summary.failed_moves = placed.failed;
        }
        MatchStrategy::Group => {
            progress(ProgressEvent::Stage("collecting unplaced devices"));
            let devices = collect_pages(&retry, "list unplaced devices", settings.page_size, |p, l| {
                api.unplaced_devices(p, l)
            })
            .await?;
            let groups = collect_pages(&retry, "list device groups", settings.page_size, |p, l| {
                api.device_groups(p, l)
            })
            .await?;

            progress(ProgressEvent::Stage("moving devices"));
            let plan = plan_group_moves(&topology, &devices, &groups);
            let placed = execute_group_moves(api, &retry, &plan).await?;

            summary.devices_eligible = placed.eligible;
            summary.devices_moved = placed.moved;
            summary.failed_moves = placed.failed;
            summary.rejected_devices = plan.rejected;
            summary.not_in_snapshot = plan.not_in_snapshot;
        }
    }

    info!(
        "{} of {} eligible devices moved",
        summary.devices_moved, summary.devices_eligible
    );
    Ok(summary)
}
