// ── Domain model ──
//
// Records derived from the topology snapshot, the reconciled hierarchy, and
// the remote-side shapes the engine reasons about.

pub mod device;
pub mod ids;
pub mod location;
pub mod unit;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{DeviceGroup, DeviceLocation, LocationAssignment, RemoteDevice};
pub use ids::{FloorId, MacAddress, RemoteId, UnitId};
pub use location::{
    ChildKind, GLOBAL, LocationKind, LocationNode, MAX_NAME_LEN, ParentRef, RemoteNode,
    RemoteNodeType,
};
pub use unit::{
    Address, ApRecord, DomainUnit, FloorRecord, FloorSettings, GridPosition, Topology, UNKNOWN,
};
