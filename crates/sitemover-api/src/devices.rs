// Device endpoints: unplaced inventory, config groups, MAC lookup, placement.

use crate::Error;
use crate::client::InventoryClient;
use crate::types::{
    BulkLocationAssign, DeviceGroupResponse, DeviceLocationPayload, DeviceResponse, Page,
};

impl InventoryClient {
    /// One page of devices that have no location assigned.
    pub async fn list_unplaced_devices(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<DeviceResponse>, Error> {
        self.get_with_params(
            "devices",
            &[
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("nullField", "LOCATION_ID".to_owned()),
            ],
        )
        .await
    }

    /// One page of cloud config groups.
    pub async fn list_device_groups(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<DeviceGroupResponse>, Error> {
        self.get_with_params(
            "ccgs",
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Look up devices by MAC address in one request.
    ///
    /// MACs are sent as repeated `macAddresses` parameters; the page is sized
    /// to the batch so all matches come back at once.
    pub async fn find_devices_by_mac(&self, macs: &[String]) -> Result<Vec<DeviceResponse>, Error> {
        let mut params = vec![
            ("page", "1".to_owned()),
            ("limit", macs.len().max(1).to_string()),
        ];
        params.extend(macs.iter().map(|mac| ("macAddresses", mac.clone())));

        let page: Page<DeviceResponse> = self.get_with_params("devices", &params).await?;
        Ok(page.data)
    }

    /// Place one device on a floor.
    pub async fn assign_device_location(
        &self,
        device_id: i64,
        location: &DeviceLocationPayload,
    ) -> Result<(), Error> {
        self.put_no_response(&format!("devices/{device_id}/location"), location)
            .await
    }

    /// Place many devices on the same floor location.
    pub async fn assign_devices_location(&self, body: &BulkLocationAssign) -> Result<(), Error> {
        self.post_no_response("devices/location/:assign", body).await
    }
}
