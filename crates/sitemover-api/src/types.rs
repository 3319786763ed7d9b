//! Wire types for the inventory REST API.
//!
//! The service speaks snake_case JSON, so no `rename_all` is needed. Unknown
//! fields are ignored unless a type explicitly captures them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Pagination ───────────────────────────────────────────────────────

/// Generic pagination wrapper returned by list and lookup endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

fn first_page() -> u32 {
    1
}

// ── Location tree ────────────────────────────────────────────────────

/// One node of `GET /locations/tree`.
///
/// `type` is one of `Global`, `Location`, `Site`, `Building`, `Floor`
/// (casing varies between service releases).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNodeResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Location-group (site group) create payload for `POST /locations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCreate {
    pub parent_id: i64,
    pub name: String,
}

/// Minimal response returned by every create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Sites ────────────────────────────────────────────────────────────

/// Site record from `GET /locations/site?name=`.
///
/// Everything the client does not model lives in `other`, so an update can
/// send the record back unchanged apart from the fields it means to touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub country_code: Option<u32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Server-managed site fields that `PUT /locations/site/{id}` rejects.
pub const SITE_READ_ONLY_FIELDS: &[&str] = &[
    "create_time",
    "update_time",
    "org_id",
    "unique_name",
    "type",
    "id",
    "address",
];

/// Site create payload for `POST /locations/site`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteCreate {
    pub parent_id: i64,
    pub name: String,
    pub country_code: u32,
}

// ── Buildings ────────────────────────────────────────────────────────

/// Building record from `GET /locations/building?name=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Postal address attached to a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPayload {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Building create payload for `POST /locations/building`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingCreate {
    pub parent_id: i64,
    pub name: String,
    pub address: AddressPayload,
}

// ── Floors ───────────────────────────────────────────────────────────

/// Floor record from `GET /locations/floor?name=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Floor create payload for `POST /locations/floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorCreate {
    pub parent_id: i64,
    pub name: String,
    pub db_attenuation: f64,
    pub environment: String,
    pub installation_height: u32,
    pub map_size_width: u32,
    pub map_size_height: u32,
    pub map_name: String,
    pub measurement_unit: String,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Device record from `GET /devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub id: i64,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub location_id: Option<i64>,
}

/// Cloud config group from `GET /ccgs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroupResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub device_ids: Option<Vec<i64>>,
}

/// Placement of a device on a floor map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLocationPayload {
    pub location_id: i64,
    pub x: f64,
    pub y: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Device id list wrapper used by bulk device actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIds {
    pub ids: Vec<i64>,
}

/// Body of `POST /devices/location/:assign`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkLocationAssign {
    pub devices: DeviceIds,
    pub device_location: DeviceLocationPayload,
}
