// ── Inventory service seam ──
//
// Everything the engine asks of the remote side goes through
// `InventoryApi`. The production implementation wraps `InventoryClient`;
// tests substitute a recording in-memory double. Every method is a single
// request so the retry wrapper can count attempts per call.

use sitemover_api::types::{
    BuildingCreate, BulkLocationAssign, DeviceIds, LocationCreate, Page, SiteCreate, SiteResponse,
};
use sitemover_api::{InventoryClient, TlsMode, TransportConfig};

use crate::config::{ServiceConfig, TlsVerification};
use crate::convert::floor_create;
use crate::error::CoreError;
use crate::model::{
    Address, DeviceGroup, DeviceLocation, FloorSettings, MacAddress, RemoteDevice, RemoteId,
    RemoteNode,
};

pub use sitemover_api::Error as ApiError;

/// A site as the service reports it, with the raw record kept for updates.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSite {
    pub id: RemoteId,
    pub name: String,
    pub country_code: Option<u32>,
    pub record: SiteResponse,
}

impl From<SiteResponse> for RemoteSite {
    fn from(record: SiteResponse) -> Self {
        Self {
            id: RemoteId(record.id),
            name: record.name.clone(),
            country_code: record.country_code,
            record,
        }
    }
}

/// Remote operations the migration engine depends on.
#[allow(async_fn_in_trait)]
pub trait InventoryApi {
    /// Root node(s) when `parent` is `None`, otherwise direct children.
    async fn location_children(&self, parent: Option<RemoteId>)
    -> Result<Vec<RemoteNode>, ApiError>;

    async fn find_sites(&self, name: &str) -> Result<Vec<RemoteSite>, ApiError>;
    async fn find_buildings(&self, name: &str) -> Result<Vec<RemoteNode>, ApiError>;
    async fn find_floors(&self, name: &str) -> Result<Vec<RemoteNode>, ApiError>;

    async fn create_site_group(&self, parent: RemoteId, name: &str) -> Result<RemoteId, ApiError>;
    async fn create_site(
        &self,
        parent: RemoteId,
        name: &str,
        country_code: u32,
    ) -> Result<RemoteId, ApiError>;
    async fn create_building(
        &self,
        parent: RemoteId,
        name: &str,
        address: &Address,
    ) -> Result<RemoteId, ApiError>;
    async fn create_floor(
        &self,
        parent: RemoteId,
        name: &str,
        settings: &FloorSettings,
    ) -> Result<RemoteId, ApiError>;

    /// Rewrite the site record with `country_code`, keeping every other field.
    async fn update_site_country(&self, site: &RemoteSite, country_code: u32)
    -> Result<(), ApiError>;

    async fn unplaced_devices(&self, page: u32, limit: u32)
    -> Result<Page<RemoteDevice>, ApiError>;
    async fn device_groups(&self, page: u32, limit: u32) -> Result<Page<DeviceGroup>, ApiError>;
    async fn devices_by_mac(&self, macs: &[MacAddress]) -> Result<Vec<RemoteDevice>, ApiError>;

    async fn assign_device(
        &self,
        device: RemoteId,
        location: &DeviceLocation,
    ) -> Result<(), ApiError>;
    async fn assign_devices(
        &self,
        devices: &[RemoteId],
        location: &DeviceLocation,
    ) -> Result<(), ApiError>;
}

fn map_page<T, U: From<T>>(page: Page<T>) -> Page<U> {
    Page {
        page: page.page,
        count: page.count,
        total_pages: page.total_pages,
        total_count: page.total_count,
        data: page.data.into_iter().map(U::from).collect(),
    }
}

fn ids(devices: &[RemoteId]) -> Vec<i64> {
    devices.iter().map(|id| id.get()).collect()
}

impl InventoryApi for InventoryClient {
    async fn location_children(
        &self,
        parent: Option<RemoteId>,
    ) -> Result<Vec<RemoteNode>, ApiError> {
        let nodes = self.location_tree(parent.map(RemoteId::get)).await?;
        Ok(nodes.into_iter().map(RemoteNode::from).collect())
    }

    async fn find_sites(&self, name: &str) -> Result<Vec<RemoteSite>, ApiError> {
        let page = InventoryClient::find_sites(self, name).await?;
        Ok(page.data.into_iter().map(RemoteSite::from).collect())
    }

    async fn find_buildings(&self, name: &str) -> Result<Vec<RemoteNode>, ApiError> {
        let page = InventoryClient::find_buildings(self, name).await?;
        Ok(page
            .data
            .into_iter()
            .map(|b| RemoteNode {
                id: RemoteId(b.id),
                name: b.name,
                node_type: crate::model::RemoteNodeType::Building,
                parent_id: b.parent_id.map(RemoteId),
            })
            .collect())
    }

    async fn find_floors(&self, name: &str) -> Result<Vec<RemoteNode>, ApiError> {
        let page = InventoryClient::find_floors(self, name).await?;
        Ok(page
            .data
            .into_iter()
            .map(|f| RemoteNode {
                id: RemoteId(f.id),
                name: f.name,
                node_type: crate::model::RemoteNodeType::Floor,
                parent_id: f.parent_id.map(RemoteId),
            })
            .collect())
    }

    async fn create_site_group(&self, parent: RemoteId, name: &str) -> Result<RemoteId, ApiError> {
        let created = self
            .create_location(&LocationCreate {
                parent_id: parent.get(),
                name: name.to_owned(),
            })
            .await?;
        Ok(RemoteId(created.id))
    }

    async fn create_site(
        &self,
        parent: RemoteId,
        name: &str,
        country_code: u32,
    ) -> Result<RemoteId, ApiError> {
        let created = InventoryClient::create_site(
            self,
            &SiteCreate {
                parent_id: parent.get(),
                name: name.to_owned(),
                country_code,
            },
        )
        .await?;
        Ok(RemoteId(created.id))
    }

    async fn create_building(
        &self,
        parent: RemoteId,
        name: &str,
        address: &Address,
    ) -> Result<RemoteId, ApiError> {
        let created = InventoryClient::create_building(
            self,
            &BuildingCreate {
                parent_id: parent.get(),
                name: name.to_owned(),
                address: address.into(),
            },
        )
        .await?;
        Ok(RemoteId(created.id))
    }

    async fn create_floor(
        &self,
        parent: RemoteId,
        name: &str,
        settings: &FloorSettings,
    ) -> Result<RemoteId, ApiError> {
        let created =
            InventoryClient::create_floor(self, &floor_create(parent, name, settings)).await?;
        Ok(RemoteId(created.id))
    }

    async fn update_site_country(
        &self,
        site: &RemoteSite,
        country_code: u32,
    ) -> Result<(), ApiError> {
        InventoryClient::update_site_country(self, &site.record, country_code).await
    }

    async fn unplaced_devices(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<RemoteDevice>, ApiError> {
        Ok(map_page(self.list_unplaced_devices(page, limit).await?))
    }

    async fn device_groups(&self, page: u32, limit: u32) -> Result<Page<DeviceGroup>, ApiError> {
        Ok(map_page(self.list_device_groups(page, limit).await?))
    }

    async fn devices_by_mac(&self, macs: &[MacAddress]) -> Result<Vec<RemoteDevice>, ApiError> {
        let raw: Vec<String> = macs.iter().map(|mac| mac.as_str().to_owned()).collect();
        let devices = self.find_devices_by_mac(&raw).await?;
        Ok(devices.into_iter().map(RemoteDevice::from).collect())
    }

    async fn assign_device(
        &self,
        device: RemoteId,
        location: &DeviceLocation,
    ) -> Result<(), ApiError> {
        self.assign_device_location(device.get(), &location.into())
            .await
    }

    async fn assign_devices(
        &self,
        devices: &[RemoteId],
        location: &DeviceLocation,
    ) -> Result<(), ApiError> {
        self.assign_devices_location(&BulkLocationAssign {
            devices: DeviceIds { ids: ids(devices) },
            device_location: location.into(),
        })
        .await
    }
}

// ── Client construction ──────────────────────────────────────────────

/// Build an authenticated client from resolved service settings.
pub fn connect(config: &ServiceConfig) -> Result<InventoryClient, CoreError> {
    let transport = TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    };

    InventoryClient::from_token(config.url.as_str(), &config.token, &transport)
        .map_err(CoreError::from)
}
