// sitemover-api: Async Rust client for the cloud inventory location/device API

pub mod client;
mod devices;
pub mod error;
mod locations;
pub mod transport;
pub mod types;

pub use client::InventoryClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
