// ── Device placement ──
//
// Puts enrolled devices on the floors provisioning created. Two strategies:
// MAC matching (resolve snapshot MACs in batches, place each device on its
// grid cell) and device-group matching (unplaced devices whose hostname is a
// snapshot AP and whose single `RFD-<domain>` group names a provisioned
// domain, moved in bulk per floor).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{
    ApRecord, DeviceGroup, DeviceLocation, DomainUnit, FloorId, FloorRecord, GridPosition,
    LocationAssignment, MacAddress, RemoteDevice, RemoteId, Topology,
};
use crate::remote::{ApiError, InventoryApi};
use crate::retry::RetryPolicy;
use sitemover_api::types::Page;

// ── Grid ─────────────────────────────────────────────────────────────

/// Cells per row and rows per page.
pub const GRID_SIDE: u32 = 11;
/// Distance between neighbouring cells, in map units.
pub const GRID_STEP: u32 = 9;
/// Horizontal shift applied to each full page so pages don't overlap.
pub const PAGE_SHIFT: u32 = 3;

const CELLS_PER_PAGE: u32 = GRID_SIDE * GRID_SIDE;

/// Position of the `index`-th AP on a floor (row-major, paged).
pub fn grid_position(index: u32) -> GridPosition {
    let page = index / CELLS_PER_PAGE;
    let cell = index % CELLS_PER_PAGE;
    GridPosition {
        x: (cell % GRID_SIDE) * GRID_STEP + page * PAGE_SHIFT,
        y: (cell / GRID_SIDE) * GRID_STEP,
    }
}

/// Give every AP a grid cell, numbering each floor independently in
/// snapshot order.
pub fn assign_grid(aps: &mut [ApRecord]) {
    let mut counters: HashMap<FloorId, u32> = HashMap::new();
    for ap in aps {
        let counter = counters.entry(ap.floor_id).or_insert(0);
        ap.position = Some(grid_position(*counter));
        *counter += 1;
    }
}

/// Copy remote floor ids from provisioned floors onto their APs. Returns
/// the number of APs left without one.
pub fn link_floors(topology: &mut Topology) -> usize {
    let remote: HashMap<FloorId, RemoteId> = topology
        .floors
        .iter()
        .filter_map(|floor| floor.remote_floor_id.map(|id| (floor.floor_id, id)))
        .collect();

    let mut unlinked = 0;
    for ap in &mut topology.aps {
        ap.remote_floor_id = remote.get(&ap.floor_id).copied();
        if ap.remote_floor_id.is_none() {
            warn!("AP {} has no provisioned floor; it will not be placed", ap.name);
            unlinked += 1;
        }
    }
    unlinked
}

// ── MAC strategy ─────────────────────────────────────────────────────

/// Outcome of batched MAC resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Distinct MACs looked up.
    pub requested: usize,
    pub resolved: usize,
    pub unresolved: Vec<MacAddress>,
}

/// Resolve AP MACs to remote device ids, one lookup per batch.
///
/// `progress` receives `(macs processed, total macs)` after each batch.
pub async fn resolve_devices<A: InventoryApi>(
    api: &A,
    retry: &RetryPolicy,
    aps: &mut [ApRecord],
    batch_size: usize,
    mut progress: impl FnMut(usize, usize),
) -> Result<Resolution, CoreError> {
    let macs: IndexSet<MacAddress> = aps.iter().map(|ap| ap.mac.clone()).collect();
    let macs: Vec<MacAddress> = macs.into_iter().collect();
    let total = macs.len();

    let mut found: HashMap<MacAddress, RemoteId> = HashMap::with_capacity(total);
    let mut processed = 0;
    for (n, batch) in macs.chunks(batch_size.max(1)).enumerate() {
        let devices = retry
            .call(&format!("look up MAC batch {}", n + 1), || {
                api.devices_by_mac(batch)
            })
            .await?;
        debug!("MAC batch {}: {} of {} matched", n + 1, devices.len(), batch.len());
        for device in devices {
            if let Some(mac) = device.mac {
                found.entry(mac).or_insert(device.id);
            }
        }
        processed += batch.len();
        progress(processed, total);
    }

    for ap in aps.iter_mut() {
        ap.remote_device_id = found.get(&ap.mac).copied();
    }

    let unresolved: Vec<MacAddress> = macs
        .into_iter()
        .filter(|mac| !found.contains_key(mac))
        .collect();
    for mac in &unresolved {
        warn!("MAC {mac} not found in remote inventory");
    }

    Ok(Resolution {
        requested: total,
        resolved: total - unresolved.len(),
        unresolved,
    })
}

/// One assignment per AP that has a device id, a remote floor and a cell.
pub fn plan_assignments(aps: &[ApRecord]) -> Vec<LocationAssignment> {
    aps.iter()
        .filter_map(|ap| {
            Some(LocationAssignment {
                device_id: ap.remote_device_id?,
                ap_name: ap.name.clone(),
                location: DeviceLocation::on_floor(ap.remote_floor_id?, ap.position?),
            })
        })
        .collect()
}

/// Result of sending assignments or bulk moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    pub eligible: usize,
    pub moved: usize,
    pub failed: Vec<String>,
}

/// Send each assignment. Rejections by the service are logged and counted;
/// authentication failures and exhausted retries abort.
pub async fn execute_assignments<A: InventoryApi>(
    api: &A,
    retry: &RetryPolicy,
    assignments: &[LocationAssignment],
) -> Result<PlacementReport, CoreError> {
    let mut report = PlacementReport {
        eligible: assignments.len(),
        ..PlacementReport::default()
    };

    for assignment in assignments {
        let operation = format!(
            "assign {} to floor {}",
            assignment.ap_name, assignment.location.floor_id
        );
        let result = retry
            .call(&operation, || {
                api.assign_device(assignment.device_id, &assignment.location)
            })
            .await;
        match result {
            Ok(()) => report.moved += 1,
            Err(CoreError::Remote { message, .. }) => {
                warn!("{operation} was rejected: {message}");
                report.failed.push(assignment.ap_name.clone());
            }
            Err(err) => return Err(err),
        }
    }

    info!("{} of {} devices moved", report.moved, report.eligible);
    Ok(report)
}

// ── Group strategy ───────────────────────────────────────────────────

/// Device groups that carry a migration domain start with this.
pub const GROUP_PREFIX: &str = "RFD-";

/// Why an unplaced device was not moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    NoGroup,
    MultipleGroups(Vec<String>),
    UnrecognizedGroup(String),
    UnknownDomain(String),
    DomainMismatch { group: String, ap_domain: String },
    BuildingMissing(String),
    FloorMissing(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGroup => f.write_str("not a member of any device group"),
            Self::MultipleGroups(groups) => {
                write!(f, "member of several device groups: {}", groups.join(", "))
            }
            Self::UnrecognizedGroup(group) => {
                write!(f, "group {group} does not start with {GROUP_PREFIX}")
            }
            Self::UnknownDomain(domain) => write!(f, "no domain named {domain} in the snapshot"),
            Self::DomainMismatch { group, ap_domain } => {
                write!(f, "group {group} does not match AP domain {ap_domain}")
            }
            Self::BuildingMissing(domain) => write!(f, "building {domain} was not provisioned"),
            Self::FloorMissing(floor) => write!(f, "floor {floor} was not provisioned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedDevice {
    pub hostname: String,
    pub rejection: Rejection,
}

/// Devices moving together to one floor.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkMove {
    pub domain: String,
    pub floor: String,
    pub location: DeviceLocation,
    pub devices: Vec<RemoteId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPlan {
    pub moves: Vec<BulkMove>,
    pub rejected: Vec<RejectedDevice>,
    /// Hostnames of unplaced devices that match no snapshot AP.
    pub not_in_snapshot: Vec<String>,
}

impl GroupPlan {
    pub fn eligible(&self) -> usize {
        self.moves.iter().map(|m| m.devices.len()).sum()
    }
}

/// Fetch every page of a listing, retrying each page on its own.
pub async fn collect_pages<T, F, Fut>(
    retry: &RetryPolicy,
    operation: &str,
    page_size: u32,
    mut fetch: F,
) -> Result<Vec<T>, CoreError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = retry
            .call(&format!("{operation} (page {page})"), || fetch(page, page_size))
            .await?;
        let done = batch.data.is_empty() || page >= batch.total_pages;
        items.extend(batch.data);
        if done {
            return Ok(items);
        }
        page += 1;
    }
}

/// Match unplaced devices to snapshot APs through their device group.
pub fn plan_group_moves(
    topology: &Topology,
    devices: &[RemoteDevice],
    groups: &[DeviceGroup],
) -> GroupPlan {
    let aps: HashMap<&str, &ApRecord> = topology
        .aps
        .iter()
        .map(|ap| (ap.name.as_str(), ap))
        .collect();
    let units: HashMap<&str, &DomainUnit> = topology
        .units
        .iter()
        .map(|unit| (unit.name.as_str(), unit))
        .collect();
    let floors: HashMap<FloorId, &FloorRecord> = topology
        .floors
        .iter()
        .map(|floor| (floor.floor_id, floor))
        .collect();

    let mut membership: HashMap<RemoteId, Vec<&str>> = HashMap::new();
    for group in groups {
        for id in &group.device_ids {
            membership.entry(*id).or_default().push(group.name.as_str());
        }
    }

    let mut plan = GroupPlan::default();
    let mut moves: IndexMap<(String, String), BulkMove> = IndexMap::new();
    let mut seen = HashSet::new();

    for device in devices {
        if !seen.insert(device.id) {
            continue;
        }
        let hostname = device.hostname.clone().unwrap_or_default();
        let Some(ap) = aps.get(hostname.as_str()) else {
            debug!("unplaced device {hostname} ({}) is not in the snapshot", device.id);
            plan.not_in_snapshot.push(hostname);
            continue;
        };

        let groups = membership.get(&device.id).map_or(&[][..], Vec::as_slice);
        let decision = classify(topology, &units, &floors, ap, groups);

        match decision {
            Ok((domain, floor, floor_id)) => {
                moves
                    .entry((domain.clone(), floor.clone()))
                    .or_insert_with(|| BulkMove {
                        domain,
                        floor,
                        location: DeviceLocation::on_floor(floor_id, GridPosition { x: 0, y: 0 }),
                        devices: Vec::new(),
                    })
                    .devices
                    .push(device.id);
            }
            Err(rejection) => {
                warn!("device {hostname} was not moved: {rejection}");
                plan.rejected.push(RejectedDevice {
                    hostname,
                    rejection,
                });
            }
        }
    }

    if !plan.not_in_snapshot.is_empty() {
        info!(
            "{} unplaced devices are not part of the snapshot",
            plan.not_in_snapshot.len()
        );
    }
    plan.moves = moves.into_values().collect();
    plan
}

/// Destination of a matched device: domain, floor name and remote floor.
fn classify(
    topology: &Topology,
    units: &HashMap<&str, &DomainUnit>,
    floors: &HashMap<FloorId, &FloorRecord>,
    ap: &ApRecord,
    groups: &[&str],
) -> Result<(String, String, RemoteId), Rejection> {
    let group = match groups {
        [] => return Err(Rejection::NoGroup),
        [group] => *group,
        many => {
            return Err(Rejection::MultipleGroups(
                many.iter().map(|g| (*g).to_owned()).collect(),
            ));
        }
    };
    let Some(domain) = group.strip_prefix(GROUP_PREFIX) else {
        return Err(Rejection::UnrecognizedGroup(group.to_owned()));
    };
    let Some(unit) = units.get(domain) else {
        return Err(Rejection::UnknownDomain(domain.to_owned()));
    };
    if unit.unit_id != ap.unit_id {
        let ap_domain = topology
            .units
            .iter()
            .find(|u| u.unit_id == ap.unit_id)
            .map_or_else(String::new, |u| u.name.clone());
        return Err(Rejection::DomainMismatch {
            group: group.to_owned(),
            ap_domain,
        });
    }
    if unit.remote_building_id.is_none() {
        return Err(Rejection::BuildingMissing(unit.name.clone()));
    }

    let floor = floors.get(&ap.floor_id);
    let floor_name = floor.map_or_else(String::new, |f| f.name.clone());
    match floor.and_then(|f| f.remote_floor_id) {
        Some(id) => Ok((unit.name.clone(), floor_name, id)),
        None => Err(Rejection::FloorMissing(floor_name)),
    }
}

/// Send one bulk assignment per planned move.
pub async fn execute_group_moves<A: InventoryApi>(
    api: &A,
    retry: &RetryPolicy,
    plan: &GroupPlan,
) -> Result<PlacementReport, CoreError> {
    let mut report = PlacementReport {
        eligible: plan.eligible(),
        ..PlacementReport::default()
    };

    for bulk in &plan.moves {
        let operation = format!(
            "move {} devices to {} / {}",
            bulk.devices.len(),
            bulk.domain,
            bulk.floor
        );
        let result = retry
            .call(&operation, || api.assign_devices(&bulk.devices, &bulk.location))
            .await;
        match result {
            Ok(()) => {
                info!("{operation} succeeded");
                report.moved += bulk.devices.len();
            }
            Err(CoreError::Remote { message, .. }) => {
                warn!("{operation} was rejected: {message}");
                report.failed.push(format!("{} / {}", bulk.domain, bulk.floor));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(report)
}
