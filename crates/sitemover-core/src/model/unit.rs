// ── Snapshot-derived records ──
//
// Produced once by ingest, enriched in place with remote ids as
// provisioning and placement succeed.

use serde::{Deserialize, Serialize};

use super::ids::{FloorId, MacAddress, RemoteId, UnitId};

/// Placeholder used for every address field the snapshot does not supply.
pub const UNKNOWN: &str = "Unknown";

/// Postal address of a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default = "unknown_field")]
    pub address: String,
    #[serde(default = "unknown_field")]
    pub city: String,
    #[serde(default = "unknown_field")]
    pub state: String,
    #[serde(default = "unknown_field")]
    pub postal_code: String,
}

fn unknown_field() -> String {
    UNKNOWN.to_owned()
}

impl Address {
    /// All fields set to `Unknown`.
    pub fn unknown() -> Self {
        Self {
            address: UNKNOWN.into(),
            city: UNKNOWN.into(),
            state: UNKNOWN.into(),
            postal_code: UNKNOWN.into(),
        }
    }

    /// Free-form address line; the remaining fields stay `Unknown`.
    pub fn from_label(label: &str) -> Self {
        Self {
            address: label.trim().to_owned(),
            ..Self::unknown()
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One legacy domain, provisioned as a building.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainUnit {
    pub unit_id: UnitId,
    pub name: String,
    /// Ancestor names, root to parent. Rewritten by the reconciler.
    pub ancestor_path: Vec<String>,
    pub address: Address,
    pub country_code: u32,
    /// Floor names in snapshot order, without duplicates.
    pub floors: Vec<String>,
    pub remote_building_id: Option<RemoteId>,
}

impl DomainUnit {
    pub fn new(name: impl Into<String>, ancestor_path: Vec<String>, country_code: u32) -> Self {
        Self {
            unit_id: UnitId::new(),
            name: name.into(),
            ancestor_path,
            address: Address::unknown(),
            country_code,
            floors: Vec::new(),
            remote_building_id: None,
        }
    }

    /// Name of the site the building sits under, if any.
    pub fn site_name(&self) -> Option<&str> {
        self.ancestor_path.last().map(String::as_str)
    }
}

/// Fixed display settings applied to every created floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorSettings {
    pub db_attenuation: f64,
    pub environment: String,
    pub installation_height: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub map_name: String,
    pub measurement_unit: String,
}

impl Default for FloorSettings {
    fn default() -> Self {
        Self {
            db_attenuation: 15.0,
            environment: "AUTO_ESTIMATE".into(),
            installation_height: 14,
            map_width: 300,
            map_height: 300,
            map_name: String::new(),
            measurement_unit: "FEET".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloorRecord {
    pub floor_id: FloorId,
    /// `None` when the floor could not be tied to a known domain.
    pub unit_id: Option<UnitId>,
    pub name: String,
    pub settings: FloorSettings,
    pub remote_floor_id: Option<RemoteId>,
}

impl FloorRecord {
    pub fn new(unit_id: UnitId, name: impl Into<String>) -> Self {
        Self {
            floor_id: FloorId::new(),
            unit_id: Some(unit_id),
            name: name.into(),
            settings: FloorSettings::default(),
            remote_floor_id: None,
        }
    }
}

/// Cell on a floor map, in map units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApRecord {
    pub name: String,
    pub mac: MacAddress,
    pub unit_id: UnitId,
    pub floor_id: FloorId,
    /// Copied from the floor record once the floor exists remotely.
    pub remote_floor_id: Option<RemoteId>,
    pub position: Option<GridPosition>,
    pub remote_device_id: Option<RemoteId>,
}

impl ApRecord {
    pub fn new(name: impl Into<String>, mac: MacAddress, unit_id: UnitId, floor_id: FloorId) -> Self {
        Self {
            name: name.into(),
            mac,
            unit_id,
            floor_id,
            remote_floor_id: None,
            position: None,
            remote_device_id: None,
        }
    }
}

/// Everything ingest produced for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    pub units: Vec<DomainUnit>,
    pub floors: Vec<FloorRecord>,
    pub aps: Vec<ApRecord>,
}

impl Topology {
    /// Floor records belonging to `unit`, in unit floor order.
    pub fn floors_of(&self, unit: UnitId) -> impl Iterator<Item = &FloorRecord> {
        self.floors
            .iter()
            .filter(move |floor| floor.unit_id == Some(unit))
    }

    pub fn device_count(&self, unit: UnitId) -> usize {
        self.aps.iter().filter(|ap| ap.unit_id == unit).count()
    }

    pub fn device_count_on_floor(&self, floor: FloorId) -> usize {
        self.aps.iter().filter(|ap| ap.floor_id == floor).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_address_fills_unknowns() {
        let address = Address::from_label(" 1 Main St ");
        assert_eq!(address.address, "1 Main St");
        assert_eq!(address.city, UNKNOWN);
        assert!(!address.is_unknown());
        assert!(Address::default().is_unknown());
    }

    #[test]
    fn floor_defaults() {
        let settings = FloorSettings::default();
        assert!((settings.db_attenuation - 15.0).abs() < f64::EPSILON);
        assert_eq!(settings.environment, "AUTO_ESTIMATE");
        assert_eq!(settings.installation_height, 14);
        assert_eq!((settings.map_width, settings.map_height), (300, 300));
        assert_eq!(settings.measurement_unit, "FEET");
    }
}
