// Location hierarchy endpoints: tree walk, name lookups, creates, site update.

use serde_json::Value;

use crate::Error;
use crate::client::InventoryClient;
use crate::types::{
    BuildingCreate, BuildingResponse, CreatedResponse, FloorCreate, FloorResponse, LocationCreate,
    Page, SITE_READ_ONLY_FIELDS, SiteCreate, SiteResponse, TreeNodeResponse,
};

impl InventoryClient {
    // ── Tree ─────────────────────────────────────────────────────────

    /// List one level of the location tree.
    ///
    /// `None` returns the root (Global) node(s); `Some(id)` returns the
    /// direct children of that node.
    pub async fn location_tree(
        &self,
        parent_id: Option<i64>,
    ) -> Result<Vec<TreeNodeResponse>, Error> {
        let mut params = vec![("expandChildren", "false".to_owned())];
        if let Some(id) = parent_id {
            params.push(("parentId", id.to_string()));
        }
        self.get_with_params("locations/tree", &params).await
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub async fn find_sites(&self, name: &str) -> Result<Page<SiteResponse>, Error> {
        self.get_with_params("locations/site", &[("name", name.to_owned())])
            .await
    }

    pub async fn find_buildings(&self, name: &str) -> Result<Page<BuildingResponse>, Error> {
        self.get_with_params("locations/building", &[("name", name.to_owned())])
            .await
    }

    pub async fn find_floors(&self, name: &str) -> Result<Page<FloorResponse>, Error> {
        self.get_with_params("locations/floor", &[("name", name.to_owned())])
            .await
    }

    // ── Creates ──────────────────────────────────────────────────────

    /// Create a location group (site group).
    pub async fn create_location(&self, body: &LocationCreate) -> Result<CreatedResponse, Error> {
        self.post("locations", body).await
    }

    pub async fn create_site(&self, body: &SiteCreate) -> Result<CreatedResponse, Error> {
        self.post("locations/site", body).await
    }

    pub async fn create_building(&self, body: &BuildingCreate) -> Result<CreatedResponse, Error> {
        self.post("locations/building", body).await
    }

    pub async fn create_floor(&self, body: &FloorCreate) -> Result<CreatedResponse, Error> {
        self.post("locations/floor", body).await
    }

    // ── Site update ──────────────────────────────────────────────────

    /// Write a site record back with a new country code.
    ///
    /// The record is sent as fetched, minus the server-managed fields.
    pub async fn update_site_country(
        &self,
        site: &SiteResponse,
        country_code: u32,
    ) -> Result<(), Error> {
        let mut body = site.other.clone();
        for field in SITE_READ_ONLY_FIELDS {
            body.remove(*field);
        }
        body.insert("name".into(), Value::from(site.name.clone()));
        if let Some(parent) = site.parent_id {
            body.insert("parent_id".into(), Value::from(parent));
        }
        body.insert("country_code".into(), Value::from(country_code));

        self.put_no_response(&format!("locations/site/{}", site.id), &Value::Object(body))
            .await
    }
}
