//! Migration engine between a legacy controller snapshot and the cloud
//! inventory service.
//!
//! - **Ingest** ([`ingest`]) turns the extractor's snapshot into
//!   [`DomainUnit`], [`FloorRecord`] and [`ApRecord`] values.
//!
//! - **[`reconcile()`]** rewrites ancestor paths so each location name maps
//!   to one parent and one role for the whole run.
//!
//! - **[`Orchestrator`]** provisions site groups, sites, buildings and floors
//!   in dependency order, reusing what exists and backed by a run-scoped
//!   [`TopologyCache`]. Every remote call goes through [`RetryPolicy`].
//!
//! - **Placement** ([`placement`]) lays APs out on an 11×11 grid per floor
//!   and moves enrolled devices by MAC lookup or by device-group membership.
//!
//! - **[`migrate`]** ties the stages together for the CLI: [`prepare`] needs
//!   no network, [`execute`] does the remote work.
//!
//! The remote side is abstracted by [`InventoryApi`]; duplicate names are
//! settled by a caller-supplied [`NameResolver`].

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod ingest;
pub mod migrate;
pub mod model;
pub mod naming;
pub mod placement;
pub mod preview;
pub mod provision;
pub mod reconcile;
pub mod remote;
pub mod retry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{SiteLookup, TopologyCache};
pub use config::{MatchStrategy, RunSettings, ServiceConfig, TlsVerification};
pub use error::CoreError;
pub use ingest::{Snapshot, load_snapshot};
pub use migrate::{MigrationSummary, Plan, ProgressEvent, execute, prepare};
pub use naming::{EntityKind, NameResolver, SuffixResolver};
pub use preview::build_preview;
pub use provision::{EntityOutcome, EntityReport, Orchestrator, ProvisionReport};
pub use reconcile::{Correction, ReconciledHierarchy, reconcile};
pub use remote::{ApiError, InventoryApi, RemoteSite, connect};
pub use retry::{CallOutcome, Outcome, RetryPolicy};

pub use model::{
    Address, ApRecord, DeviceGroup, DeviceLocation, DomainUnit, FloorRecord, FloorSettings,
    GridPosition, MacAddress, RemoteDevice, RemoteId, RemoteNode, RemoteNodeType, Topology,
};
