// ── Remote device types ──

use serde::{Deserialize, Serialize};

use super::ids::{MacAddress, RemoteId};
use super::unit::GridPosition;

/// Device already enrolled in the inventory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDevice {
    pub id: RemoteId,
    pub hostname: Option<String>,
    /// `None` when the service reported no MAC or an unparseable one.
    pub mac: Option<MacAddress>,
}

/// Configuration group and its member devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGroup {
    pub id: RemoteId,
    pub name: String,
    pub device_ids: Vec<RemoteId>,
}

/// Where a device should sit on a floor map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceLocation {
    pub floor_id: RemoteId,
    pub x: f64,
    pub y: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl DeviceLocation {
    /// Grid coordinates are local to the map; GPS fields stay zeroed.
    pub fn on_floor(floor_id: RemoteId, position: GridPosition) -> Self {
        Self {
            floor_id,
            x: f64::from(position.x),
            y: f64::from(position.y),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

/// One planned placement of a resolved device.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationAssignment {
    pub device_id: RemoteId,
    pub ap_name: String,
    pub location: DeviceLocation,
}
