// ── Snapshot ingest ──
//
// Turns the extractor's topology snapshot (JSON or YAML) into domain units,
// floor records and AP records. All input problems surface here, before
// any remote call.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RunSettings;
use crate::error::CoreError;
use crate::model::{
    Address, ApRecord, DomainUnit, FloorRecord, MAX_NAME_LEN, MacAddress, Topology,
};
use crate::naming::{EntityKind, NameResolver};

/// Floor name used when a domain with APs has no floors at all.
pub const DEFAULT_FLOOR: &str = "floor1";

// ── Snapshot format ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub domains: Vec<SnapshotDomain>,
    #[serde(default)]
    pub aps: Vec<SnapshotAp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDomain {
    pub name: String,
    #[serde(default)]
    pub location_tree: Vec<String>,
    #[serde(default)]
    pub address: Option<SnapshotAddress>,
    #[serde(default)]
    pub country_code: Option<u32>,
    #[serde(default)]
    pub floors: Vec<String>,
}

/// Either a structured postal address or a single free-form line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotAddress {
    Label(String),
    Structured(Address),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAp {
    pub name: String,
    pub mac: String,
    pub domain: String,
    #[serde(default)]
    pub floor: Option<String>,
}

// ── Loading ──────────────────────────────────────────────────────────

/// Read a snapshot file; `.yaml`/`.yml` parse as YAML, anything else as JSON.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, CoreError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CoreError::input(format!("cannot read {}: {e}", path.display())))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&raw)
            .map_err(|e| CoreError::input(format!("malformed snapshot {}: {e}", path.display())))
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::input(format!("malformed snapshot {}: {e}", path.display())))
    }
}

// ── Building records ─────────────────────────────────────────────────

/// Build the run's records from a snapshot.
///
/// Over-long names go to `resolver.shorten`; a decline is an input error.
pub fn ingest(
    snapshot: Snapshot,
    settings: &RunSettings,
    resolver: &mut impl NameResolver,
) -> Result<Topology, CoreError> {
    if snapshot.domains.is_empty() {
        return Err(CoreError::input("snapshot contains no domains"));
    }

    let mut topology = Topology::default();
    // snapshot domain name → index into topology.units
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for domain in snapshot.domains {
        if by_name.contains_key(&domain.name) {
            return Err(CoreError::input(format!(
                "domain '{}' appears more than once in the snapshot",
                domain.name
            )));
        }

        let name = fit_name(resolver, EntityKind::Building, &domain.name)?;
        let last = domain.location_tree.len().saturating_sub(1);
        let ancestor_path = domain
            .location_tree
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let kind = if i == last {
                    EntityKind::Site
                } else {
                    EntityKind::SiteGroup
                };
                fit_name(resolver, kind, segment.trim())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut unit = DomainUnit::new(
            name,
            ancestor_path,
            domain
                .country_code
                .filter(|code| *code != 0)
                .unwrap_or(settings.default_country_code),
        );
        unit.address = match domain.address {
            Some(SnapshotAddress::Structured(address)) => address,
            Some(SnapshotAddress::Label(label)) if !label.trim().is_empty() => {
                Address::from_label(&label)
            }
            _ => Address::unknown(),
        };

        for floor in domain.floors {
            let floor = floor.trim().to_owned();
            if !floor.is_empty() && !unit.floors.contains(&floor) {
                unit.floors.push(floor);
            }
        }

        by_name.insert(domain.name, topology.units.len());
        topology.units.push(unit);
    }

    for ap in snapshot.aps {
        let Some(&index) = by_name.get(&ap.domain) else {
            warn!(
                "AP {} references unknown domain '{}'; skipping it",
                ap.name, ap.domain
            );
            continue;
        };
        let mac = MacAddress::parse(&ap.mac)
            .map_err(|_| CoreError::input(format!("AP {} has invalid MAC '{}'", ap.name, ap.mac)))?;

        let unit = &mut topology.units[index];
        let floor_name = match ap.floor.map(|f| f.trim().to_owned()).filter(|f| !f.is_empty()) {
            Some(floor) => {
                if !unit.floors.contains(&floor) {
                    warn!(
                        "AP {} is on floor '{floor}' which is not configured on domain {}; adding it",
                        ap.name, unit.name
                    );
                    unit.floors.push(floor.clone());
                }
                floor
            }
            None => {
                let floor = match unit.floors.first() {
                    Some(first) => first.clone(),
                    None => {
                        unit.floors.push(DEFAULT_FLOOR.to_owned());
                        DEFAULT_FLOOR.to_owned()
                    }
                };
                if settings.log_ap_floor_defaults {
                    warn!("AP {} has no floor; placing it on '{floor}' in {}", ap.name, unit.name);
                }
                floor
            }
        };

        let unit_id = unit.unit_id;
        let floor_id = floor_record(&mut topology.floors, unit_id, &floor_name);
        topology.aps.push(ApRecord::new(ap.name, mac, unit_id, floor_id));
    }

    // Floors without APs still get records so they are provisioned.
    for unit in &topology.units {
        for floor in &unit.floors {
            floor_record(&mut topology.floors, unit.unit_id, floor);
        }
    }
    order_floors(&mut topology);

    debug!(
        domains = topology.units.len(),
        floors = topology.floors.len(),
        aps = topology.aps.len(),
        "snapshot ingested"
    );
    Ok(topology)
}

/// Find or create the floor record for `(unit, name)`.
fn floor_record(
    floors: &mut Vec<FloorRecord>,
    unit: crate::model::UnitId,
    name: &str,
) -> crate::model::FloorId {
    if let Some(existing) = floors
        .iter()
        .find(|f| f.unit_id == Some(unit) && f.name == name)
    {
        return existing.floor_id;
    }
    let record = FloorRecord::new(unit, name);
    let id = record.floor_id;
    floors.push(record);
    id
}

/// Sort floor records by unit order, then by the unit's floor order.
fn order_floors(topology: &mut Topology) {
    let rank: HashMap<_, _> = topology
        .units
        .iter()
        .enumerate()
        .flat_map(|(u, unit)| {
            unit.floors
                .iter()
                .enumerate()
                .map(move |(f, name)| ((unit.unit_id, name.clone()), (u, f)))
        })
        .collect();

    topology.floors.sort_by_key(|floor| {
        floor
            .unit_id
            .and_then(|unit| rank.get(&(unit, floor.name.clone())).copied())
            .unwrap_or((usize::MAX, usize::MAX))
    });
}

fn fit_name(
    resolver: &mut impl NameResolver,
    kind: EntityKind,
    name: &str,
) -> Result<String, CoreError> {
    let mut current = name.to_owned();
    while current.chars().count() > MAX_NAME_LEN {
        match resolver.shorten(kind, &current) {
            Some(shorter) if shorter != current => current = shorter,
            _ => {
                return Err(CoreError::input(format!(
                    "{kind} name '{name}' is longer than {MAX_NAME_LEN} characters"
                )));
            }
        }
    }
    Ok(current)
}
