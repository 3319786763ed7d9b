// ── Remote topology cache ──
//
// Run-scoped index of what already exists in the inventory service. Tree
// levels are fetched lazily, name lookups are fetched once, and every node
// the run creates is inserted immediately so later lookups see it without
// a round-trip. Nothing expires; the cache lives exactly as long as a run.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CoreError;
use crate::model::{RemoteId, RemoteNode, RemoteNodeType};
use crate::remote::{InventoryApi, RemoteSite};
use crate::retry::RetryPolicy;

/// Result of a name-scoped site lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteLookup {
    /// Country code missing or zero remotely: a previous import stopped halfway.
    pub needs_backfill: bool,
    pub id: Option<RemoteId>,
    /// Remote record, kept for the backfill update.
    pub record: Option<RemoteSite>,
}

impl SiteLookup {
    fn found(site: RemoteSite) -> Self {
        Self {
            needs_backfill: site.country_code.is_none_or(|code| code == 0),
            id: Some(site.id),
            record: Some(site),
        }
    }

    pub fn exists(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Default)]
pub struct TopologyCache {
    root: Option<RemoteId>,
    nodes: HashMap<RemoteId, RemoteNode>,
    /// Expanded nodes only; a missing key means "not fetched yet".
    children: HashMap<RemoteId, Vec<RemoteId>>,
    sites: HashMap<String, SiteLookup>,
    buildings: HashMap<String, Option<RemoteId>>,
    floors: HashMap<String, Vec<RemoteNode>>,
}

impl TopologyCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Tree ─────────────────────────────────────────────────────────

    /// Id of the Global node, fetching it and its children on first use.
    pub async fn fetch_root<A: InventoryApi>(
        &mut self,
        api: &A,
        retry: &RetryPolicy,
    ) -> Result<RemoteId, CoreError> {
        if let Some(root) = self.root {
            return Ok(root);
        }

        let roots = retry
            .call("fetch location tree", || api.location_children(None))
            .await?;
        let root = roots
            .iter()
            .find(|node| node.node_type == RemoteNodeType::Global)
            .or_else(|| roots.first())
            .cloned()
            .ok_or_else(|| CoreError::Remote {
                operation: "fetch location tree".into(),
                message: "the service returned no root location".into(),
            })?;

        let root_id = root.id;
        debug!("root location {} ({root_id})", root.name);
        for node in roots {
            self.nodes.insert(node.id, node);
        }
        self.root = Some(root_id);
        self.expand(api, retry, root_id).await?;
        Ok(root_id)
    }

    /// Fetch the direct children of `id` unless already known.
    pub async fn expand<A: InventoryApi>(
        &mut self,
        api: &A,
        retry: &RetryPolicy,
        id: RemoteId,
    ) -> Result<(), CoreError> {
        if self.children.contains_key(&id) {
            return Ok(());
        }

        let children = retry
            .call(&format!("fetch children of location {id}"), || {
                api.location_children(Some(id))
            })
            .await?;

        let ids = children.iter().map(|node| node.id).collect();
        for node in children {
            self.nodes.insert(node.id, node);
        }
        self.children.insert(id, ids);
        Ok(())
    }

    pub fn is_expanded(&self, id: RemoteId) -> bool {
        self.children.contains_key(&id)
    }

    /// Direct child of `parent` called `name`, from cached levels only.
    pub fn find_by_name_and_parent(&self, name: &str, parent: RemoteId) -> Option<&RemoteNode> {
        self.children
            .get(&parent)?
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.name == name)
    }

    /// Record a node this run created. It starts out with no children.
    pub fn insert(&mut self, node: RemoteNode) {
        if let Some(parent) = node.parent_id {
            if let Some(siblings) = self.children.get_mut(&parent) {
                if !siblings.contains(&node.id) {
                    siblings.push(node.id);
                }
            }
        }

        match node.node_type {
            RemoteNodeType::Site => {
                self.sites.insert(
                    node.name.clone(),
                    SiteLookup {
                        needs_backfill: false,
                        id: Some(node.id),
                        record: None,
                    },
                );
            }
            RemoteNodeType::Building => {
                self.buildings.insert(node.name.clone(), Some(node.id));
            }
            // Only extend a fetched name; otherwise the next lookup would
            // skip floors of the same name under other buildings.
            RemoteNodeType::Floor => {
                if let Some(floors) = self.floors.get_mut(&node.name) {
                    floors.push(node.clone());
                }
            }
            _ => {}
        }

        self.children.entry(node.id).or_default();
        self.nodes.insert(node.id, node);
    }

    // ── Name-scoped lookups ──────────────────────────────────────────

    pub async fn find_site_by_name<A: InventoryApi>(
        &mut self,
        api: &A,
        retry: &RetryPolicy,
        name: &str,
    ) -> Result<SiteLookup, CoreError> {
        if let Some(hit) = self.sites.get(name) {
            return Ok(hit.clone());
        }

        let sites = retry
            .call(&format!("look up site {name}"), || api.find_sites(name))
            .await?;
        let lookup = sites
            .into_iter()
            .find(|site| site.name == name)
            .map(SiteLookup::found)
            .unwrap_or_default();
        debug!(
            site = name,
            exists = lookup.exists(),
            needs_backfill = lookup.needs_backfill,
            "site lookup"
        );

        self.sites.insert(name.to_owned(), lookup.clone());
        Ok(lookup)
    }

    /// Mark a cached site as no longer needing a country-code backfill.
    pub fn mark_backfilled(&mut self, name: &str) {
        if let Some(site) = self.sites.get_mut(name) {
            site.needs_backfill = false;
        }
    }

    pub async fn find_building<A: InventoryApi>(
        &mut self,
        api: &A,
        retry: &RetryPolicy,
        name: &str,
    ) -> Result<Option<RemoteId>, CoreError> {
        if let Some(hit) = self.buildings.get(name) {
            return Ok(*hit);
        }

        let buildings = retry
            .call(&format!("look up building {name}"), || {
                api.find_buildings(name)
            })
            .await?;
        let id = buildings
            .into_iter()
            .find(|building| building.name == name)
            .map(|building| building.id);

        self.buildings.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Floor `name` under building `parent`.
    pub async fn find_floor<A: InventoryApi>(
        &mut self,
        api: &A,
        retry: &RetryPolicy,
        name: &str,
        parent: RemoteId,
    ) -> Result<Option<RemoteId>, CoreError> {
        if !self.floors.contains_key(name) {
            let floors = retry
                .call(&format!("look up floor {name}"), || api.find_floors(name))
                .await?;
            self.floors.insert(
                name.to_owned(),
                floors.into_iter().filter(|f| f.name == name).collect(),
            );
        }

        Ok(self.floors.get(name).and_then(|floors| {
            floors
                .iter()
                .find(|floor| floor.parent_id == Some(parent))
                .map(|floor| floor.id)
        }))
    }
}
