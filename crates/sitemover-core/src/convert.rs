// ── Wire ↔ domain conversions ──
//
// Each `From` impl maps one `sitemover_api::types` shape onto the model the
// engine works with. Anything that can fail (MAC parsing) degrades to `None`
// rather than rejecting the whole response.

use sitemover_api::types::{
    AddressPayload, DeviceGroupResponse, DeviceLocationPayload, DeviceResponse, FloorCreate,
    TreeNodeResponse,
};

use crate::model::{
    Address, DeviceGroup, DeviceLocation, FloorSettings, MacAddress, RemoteDevice, RemoteId,
    RemoteNode, RemoteNodeType,
};

impl From<TreeNodeResponse> for RemoteNode {
    fn from(node: TreeNodeResponse) -> Self {
        Self {
            id: RemoteId(node.id),
            node_type: RemoteNodeType::from_wire(&node.node_type),
            name: node.name,
            parent_id: node.parent_id.map(RemoteId),
        }
    }
}

impl From<DeviceResponse> for RemoteDevice {
    fn from(device: DeviceResponse) -> Self {
        Self {
            id: RemoteId(device.id),
            mac: device
                .mac_address
                .as_deref()
                .and_then(|raw| MacAddress::parse(raw).ok()),
            hostname: device.hostname,
        }
    }
}

impl From<DeviceGroupResponse> for DeviceGroup {
    fn from(group: DeviceGroupResponse) -> Self {
        Self {
            id: RemoteId(group.id),
            name: group.name,
            device_ids: group
                .device_ids
                .unwrap_or_default()
                .into_iter()
                .map(RemoteId)
                .collect(),
        }
    }
}

impl From<&Address> for AddressPayload {
    fn from(address: &Address) -> Self {
        Self {
            address: address.address.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}

impl From<&DeviceLocation> for DeviceLocationPayload {
    fn from(location: &DeviceLocation) -> Self {
        Self {
            location_id: location.floor_id.get(),
            x: location.x,
            y: location.y,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Floor create payload for `name` under `parent`.
pub fn floor_create(parent: RemoteId, name: &str, settings: &FloorSettings) -> FloorCreate {
    FloorCreate {
        parent_id: parent.get(),
        name: name.to_owned(),
        db_attenuation: settings.db_attenuation,
        environment: settings.environment.clone(),
        installation_height: settings.installation_height,
        map_size_width: settings.map_width,
        map_size_height: settings.map_height,
        map_name: settings.map_name.clone(),
        measurement_unit: settings.measurement_unit.clone(),
    }
}
