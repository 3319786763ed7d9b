// ── Hierarchy preview ──
//
// Nested view of what a run would provision, shown before anything is
// created. Keys are sorted; every location level may carry a `BUILDINGS`
// map, and every building a `FLOORS` map with per-floor device counts.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{Address, GLOBAL, Topology};

#[derive(Debug, Default, Serialize)]
struct LocationLevel {
    #[serde(flatten)]
    children: BTreeMap<String, LocationLevel>,
    #[serde(rename = "BUILDINGS", skip_serializing_if = "BTreeMap::is_empty")]
    buildings: BTreeMap<String, BuildingPreview>,
}

#[derive(Debug, Serialize)]
struct BuildingPreview {
    address: Address,
    #[serde(rename = "FLOORS")]
    floors: BTreeMap<String, FloorPreview>,
}

#[derive(Debug, Serialize)]
struct FloorPreview {
    #[serde(rename = "deviceCount")]
    device_count: usize,
}

/// Build the preview tree rooted at `Global` from a reconciled topology.
pub fn build_preview(topology: &Topology) -> Result<Value, CoreError> {
    let mut root = LocationLevel::default();

    for unit in &topology.units {
        let level = unit
            .ancestor_path
            .iter()
            .fold(&mut root, |level, segment| {
                level.children.entry(segment.clone()).or_default()
            });

        let floors = topology
            .floors_of(unit.unit_id)
            .map(|floor| {
                (
                    floor.name.clone(),
                    FloorPreview {
                        device_count: topology.device_count_on_floor(floor.floor_id),
                    },
                )
            })
            .collect();

        level.buildings.insert(
            unit.name.clone(),
            BuildingPreview {
                address: unit.address.clone(),
                floors,
            },
        );
    }

    let tree = BTreeMap::from([(GLOBAL, root)]);
    // serde_json's default map is ordered, which sorts every level.
    serde_json::to_value(tree).map_err(|e| CoreError::Internal(format!("preview: {e}")))
}
