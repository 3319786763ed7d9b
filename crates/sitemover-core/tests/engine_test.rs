#![allow(clippy::unwrap_used)]
// Engine tests against a recording in-memory inventory service.

use std::cell::RefCell;

use pretty_assertions::assert_eq;
use serde_json::json;
use sitemover_api::types::{Page, SiteResponse};

use sitemover_core::model::{DeviceLocation, DomainUnit, FloorSettings};
use sitemover_core::{
    Address, ApiError, CoreError, DeviceGroup, EntityKind, EntityOutcome, InventoryApi,
    MacAddress, MatchStrategy, NameResolver, Orchestrator, RemoteDevice, RemoteId, RemoteNode,
    RemoteNodeType, RemoteSite, RetryPolicy, RunSettings, Snapshot, SuffixResolver, Topology,
    execute, prepare,
};

// ── Mock inventory ──────────────────────────────────────────────────

const GLOBAL_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Tree(Option<i64>),
    FindSite(String),
    FindBuilding(String),
    FindFloor(String),
    Create(RemoteNodeType, String),
    UpdateSite(i64, u32),
    MacLookup(usize),
    Assign(i64, DeviceLocation),
    BulkAssign(Vec<i64>, DeviceLocation),
    ListUnplaced(u32),
    ListGroups(u32),
}

struct StoredNode {
    node: RemoteNode,
    country_code: Option<u32>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    nodes: Vec<StoredNode>,
    devices: Vec<RemoteDevice>,
    unplaced: Vec<RemoteDevice>,
    groups: Vec<DeviceGroup>,
    calls: Vec<Call>,
    /// Tree requests that fail with a 503 before one succeeds.
    flaky_tree: u32,
}

struct Inventory {
    state: RefCell<State>,
}

impl Inventory {
    fn new() -> Self {
        let state = State {
            next_id: 100,
            nodes: vec![StoredNode {
                node: RemoteNode {
                    id: RemoteId(GLOBAL_ID),
                    name: "Global".into(),
                    node_type: RemoteNodeType::Global,
                    parent_id: None,
                },
                country_code: None,
            }],
            ..State::default()
        };
        Self {
            state: RefCell::new(state),
        }
    }

    fn add(&self, node_type: RemoteNodeType, name: &str, parent: i64, cc: Option<u32>) -> i64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.nodes.push(StoredNode {
            node: RemoteNode {
                id: RemoteId(id),
                name: name.into(),
                node_type,
                parent_id: Some(RemoteId(parent)),
            },
            country_code: cc,
        });
        id
    }

    fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    fn creates(&self) -> Vec<(RemoteNodeType, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(kind, name) => Some((kind, name)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn nodes_named(&self, node_type: RemoteNodeType, name: &str) -> Vec<RemoteNode> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|n| n.node.node_type == node_type && n.node.name == name)
            .map(|n| n.node.clone())
            .collect()
    }

    fn create(
        &self,
        node_type: RemoteNodeType,
        parent: RemoteId,
        name: &str,
        cc: Option<u32>,
    ) -> Result<RemoteId, ApiError> {
        self.record(Call::Create(node_type, name.into()));
        let taken = self.state.borrow().nodes.iter().any(|n| {
            n.node.name == name
                && (node_type != RemoteNodeType::Floor || n.node.parent_id == Some(parent))
        });
        if taken {
            return Err(ApiError::DuplicateName {
                message: format!("Duplicate name: {name}"),
            });
        }
        Ok(RemoteId(self.add(node_type, name, parent.get(), cc)))
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let size = usize::try_from(limit.max(1)).unwrap();
    let total_pages = u32::try_from(items.len().div_ceil(size)).unwrap();
    let start = usize::try_from(page.saturating_sub(1)).unwrap() * size;
    Page {
        page,
        count: limit,
        total_pages,
        total_count: u64::try_from(items.len()).unwrap(),
        data: items.iter().skip(start).take(size).cloned().collect(),
    }
}

impl InventoryApi for Inventory {
    async fn location_children(
        &self,
        parent: Option<RemoteId>,
    ) -> Result<Vec<RemoteNode>, ApiError> {
        self.record(Call::Tree(parent.map(RemoteId::get)));
        {
            let mut state = self.state.borrow_mut();
            if state.flaky_tree > 0 {
                state.flaky_tree -= 1;
                return Err(ApiError::Api {
                    status: 503,
                    message: "Service Unavailable".into(),
                    code: None,
                    structured: false,
                });
            }
        }
        let state = self.state.borrow();
        Ok(state
            .nodes
            .iter()
            .filter(|n| match parent {
                None => n.node.node_type == RemoteNodeType::Global,
                Some(id) => n.node.parent_id == Some(id),
            })
            .map(|n| n.node.clone())
            .collect())
    }

    async fn find_sites(&self, name: &str) -> Result<Vec<RemoteSite>, ApiError> {
        self.record(Call::FindSite(name.into()));
        let state = self.state.borrow();
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.node.node_type == RemoteNodeType::Site && n.node.name == name)
            .map(|n| {
                RemoteSite::from(SiteResponse {
                    id: n.node.id.get(),
                    name: n.node.name.clone(),
                    parent_id: n.node.parent_id.map(RemoteId::get),
                    country_code: n.country_code,
                    other: serde_json::Map::new(),
                })
            })
            .collect())
    }

    async fn find_buildings(&self, name: &str) -> Result<Vec<RemoteNode>, ApiError> {
        self.record(Call::FindBuilding(name.into()));
        Ok(self.nodes_named(RemoteNodeType::Building, name))
    }

    async fn find_floors(&self, name: &str) -> Result<Vec<RemoteNode>, ApiError> {
        self.record(Call::FindFloor(name.into()));
        Ok(self.nodes_named(RemoteNodeType::Floor, name))
    }

    async fn create_site_group(&self, parent: RemoteId, name: &str) -> Result<RemoteId, ApiError> {
        self.create(RemoteNodeType::SiteGroup, parent, name, None)
    }

    async fn create_site(
        &self,
        parent: RemoteId,
        name: &str,
        country_code: u32,
    ) -> Result<RemoteId, ApiError> {
        self.create(RemoteNodeType::Site, parent, name, Some(country_code))
    }

    async fn create_building(
        &self,
        parent: RemoteId,
        name: &str,
        _address: &Address,
    ) -> Result<RemoteId, ApiError> {
        self.create(RemoteNodeType::Building, parent, name, None)
    }

    async fn create_floor(
        &self,
        parent: RemoteId,
        name: &str,
        _settings: &FloorSettings,
    ) -> Result<RemoteId, ApiError> {
        self.create(RemoteNodeType::Floor, parent, name, None)
    }

    async fn update_site_country(
        &self,
        site: &RemoteSite,
        country_code: u32,
    ) -> Result<(), ApiError> {
        self.record(Call::UpdateSite(site.id.get(), country_code));
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.iter_mut().find(|n| n.node.id == site.id) {
            node.country_code = Some(country_code);
        }
        Ok(())
    }

    async fn unplaced_devices(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<RemoteDevice>, ApiError> {
        self.record(Call::ListUnplaced(page));
        Ok(page_of(&self.state.borrow().unplaced, page, limit))
    }

    async fn device_groups(&self, page: u32, limit: u32) -> Result<Page<DeviceGroup>, ApiError> {
        self.record(Call::ListGroups(page));
        Ok(page_of(&self.state.borrow().groups, page, limit))
    }

    async fn devices_by_mac(&self, macs: &[MacAddress]) -> Result<Vec<RemoteDevice>, ApiError> {
        self.record(Call::MacLookup(macs.len()));
        let state = self.state.borrow();
        Ok(state
            .devices
            .iter()
            .filter(|d| d.mac.as_ref().is_some_and(|mac| macs.contains(mac)))
            .cloned()
            .collect())
    }

    async fn assign_device(
        &self,
        device: RemoteId,
        location: &DeviceLocation,
    ) -> Result<(), ApiError> {
        self.record(Call::Assign(device.get(), *location));
        Ok(())
    }

    async fn assign_devices(
        &self,
        devices: &[RemoteId],
        location: &DeviceLocation,
    ) -> Result<(), ApiError> {
        self.record(Call::BulkAssign(
            devices.iter().map(|id| id.get()).collect(),
            *location,
        ));
        Ok(())
    }
}

/// Declines every rename.
struct Declining;

impl NameResolver for Declining {
    fn resolve_duplicate(&mut self, _kind: EntityKind, _name: &str) -> Option<String> {
        None
    }

    fn shorten(&mut self, _kind: EntityKind, _name: &str) -> Option<String> {
        None
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn mac(n: usize) -> MacAddress {
    MacAddress::parse(&format!("00AA{n:08X}")).unwrap()
}

/// One domain `HQ` under `path` with floors F1/F2 and `aps` APs on F1.
fn snapshot(path: &[&str], aps: usize) -> Snapshot {
    let aps: Vec<_> = (0..aps)
        .map(|i| {
            json!({ "name": format!("ap-{i}"), "mac": mac(i).as_str(), "domain": "HQ", "floor": "F1" })
        })
        .collect();
    serde_json::from_value(json!({
        "domains": [{ "name": "HQ", "location_tree": path, "country_code": 840, "floors": ["F1", "F2"] }],
        "aps": aps,
    }))
    .unwrap()
}

fn enroll(inventory: &Inventory, count: usize) {
    let mut state = inventory.state.borrow_mut();
    for i in 0..count {
        state.devices.push(RemoteDevice {
            id: RemoteId(1000 + i64::try_from(i).unwrap()),
            hostname: Some(format!("ap-{i}")),
            mac: Some(mac(i)),
        });
    }
}

async fn run(
    inventory: &Inventory,
    snapshot: Snapshot,
    settings: &RunSettings,
) -> Result<sitemover_core::MigrationSummary, CoreError> {
    let mut resolver = SuffixResolver::new();
    let plan = prepare(snapshot, settings, &mut resolver)?;
    execute(inventory, &mut resolver, plan, settings, |_| {}).await
}

// ── Provisioning ────────────────────────────────────────────────────

#[tokio::test]
async fn creates_in_dependency_order() {
    let inventory = Inventory::new();
    let summary = run(&inventory, snapshot(&["US", "East", "Boston"], 1), &RunSettings::default())
        .await
        .unwrap();

    assert_eq!(
        inventory.creates(),
        vec![
            (RemoteNodeType::SiteGroup, "US".to_owned()),
            (RemoteNodeType::SiteGroup, "East".to_owned()),
            (RemoteNodeType::Site, "Boston".to_owned()),
            (RemoteNodeType::Building, "HQ".to_owned()),
            (RemoteNodeType::Floor, "F1".to_owned()),
            (RemoteNodeType::Floor, "F2".to_owned()),
        ]
    );
    assert_eq!(summary.provision.created(EntityKind::SiteGroup), 2);
    assert_eq!(summary.provision.created(EntityKind::Floor), 2);
}

#[tokio::test]
async fn second_run_reuses_everything() {
    let inventory = Inventory::new();
    let settings = RunSettings::default();
    run(&inventory, snapshot(&["US", "Boston"], 2), &settings)
        .await
        .unwrap();
    let first_creates = inventory.creates().len();

    let summary = run(&inventory, snapshot(&["US", "Boston"], 2), &settings)
        .await
        .unwrap();

    assert_eq!(inventory.creates().len(), first_creates);
    assert_eq!(summary.provision.reused(EntityKind::Building), 1);
    assert_eq!(summary.provision.reused(EntityKind::Floor), 2);
    assert_eq!(summary.provision.created(EntityKind::Floor), 0);
}

#[tokio::test]
async fn site_without_country_code_is_backfilled_once() {
    let inventory = Inventory::new();
    let us = inventory.add(RemoteNodeType::SiteGroup, "US", GLOBAL_ID, None);
    let boston = inventory.add(RemoteNodeType::Site, "Boston", us, None);

    let summary = run(&inventory, snapshot(&["US", "Boston"], 1), &RunSettings::default())
        .await
        .unwrap();

    let updates: Vec<_> = inventory
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::UpdateSite(..)))
        .collect();
    assert_eq!(updates, vec![Call::UpdateSite(boston, 840)]);

    let site = summary
        .provision
        .entries
        .iter()
        .find(|e| e.kind == EntityKind::Site)
        .unwrap();
    assert_eq!(site.outcome, EntityOutcome::Reused { backfilled: true });
    assert!(
        !inventory
            .creates()
            .iter()
            .any(|(kind, _)| matches!(kind, RemoteNodeType::SiteGroup | RemoteNodeType::Site))
    );
}

#[tokio::test]
async fn unit_without_floors_makes_no_building_calls() {
    let inventory = Inventory::new();
    let mut topology = Topology::default();
    topology
        .units
        .push(DomainUnit::new("Empty", vec!["US".into()], 840));

    let mut resolver = SuffixResolver::new();
    let mut orchestrator = Orchestrator::new(&inventory, &mut resolver, RetryPolicy::default());
    orchestrator.provision(&mut topology).await.unwrap();
    let report = orchestrator.into_report();

    assert!(inventory.creates().is_empty());
    assert!(
        !inventory
            .calls()
            .iter()
            .any(|c| matches!(c, Call::FindBuilding(_) | Call::FindFloor(_)))
    );
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.skipped(EntityKind::Building), 1);
}

#[tokio::test]
async fn duplicate_site_name_is_suffixed() {
    let inventory = Inventory::new();
    // Same name already used by a site group elsewhere.
    inventory.add(RemoteNodeType::SiteGroup, "Boston", GLOBAL_ID, None);

    let summary = run(&inventory, snapshot(&["US", "Boston"], 1), &RunSettings::default())
        .await
        .unwrap();

    let sites: Vec<_> = inventory
        .creates()
        .into_iter()
        .filter(|(kind, _)| *kind == RemoteNodeType::Site)
        .map(|(_, name)| name)
        .collect();
    assert_eq!(sites, vec!["Boston", "Boston-2"]);
    assert_eq!(summary.provision.created(EntityKind::Site), 1);
    assert_eq!(summary.provision.created(EntityKind::Building), 1);
}

#[tokio::test]
async fn declined_rename_skips_dependants_only() {
    let inventory = Inventory::new();
    inventory.add(RemoteNodeType::SiteGroup, "Taken", GLOBAL_ID, None);

    let snapshot: Snapshot = serde_json::from_value(json!({
        "domains": [
            { "name": "A", "location_tree": ["Taken"], "floors": ["F1"] },
            { "name": "B", "location_tree": ["Free"], "floors": ["F1"] }
        ],
        "aps": [
            { "name": "a1", "mac": "00:00:00:00:00:01", "domain": "A" },
            { "name": "b1", "mac": "00:00:00:00:00:02", "domain": "B" }
        ]
    }))
    .unwrap();

    let settings = RunSettings::default();
    let mut resolver = Declining;
    let plan = prepare(snapshot, &settings, &mut resolver).unwrap();
    let summary = execute(&inventory, &mut resolver, plan, &settings, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.provision.failed(EntityKind::Site), 1);
    assert_eq!(summary.provision.skipped(EntityKind::Floor), 1);
    assert_eq!(summary.provision.created(EntityKind::Building), 1);
    assert_eq!(summary.aps_without_floor, 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let inventory = Inventory::new();
    inventory.state.borrow_mut().flaky_tree = 3;
    run(&inventory, snapshot(&["US"], 1), &RunSettings::default())
        .await
        .unwrap();

    let inventory = Inventory::new();
    inventory.state.borrow_mut().flaky_tree = 4;
    let err = run(&inventory, snapshot(&["US"], 1), &RunSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::RetriesExhausted { attempts: 4, .. }));
    assert!(inventory.creates().is_empty());
}

// ── Placement ───────────────────────────────────────────────────────

#[tokio::test]
async fn grid_wraps_to_next_page_at_ap_122() {
    let inventory = Inventory::new();
    enroll(&inventory, 122);

    let summary = run(&inventory, snapshot(&["US"], 122), &RunSettings::default())
        .await
        .unwrap();
    assert_eq!(summary.devices_moved, 122);

    let placements: Vec<_> = inventory
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Assign(id, location) => Some((id, location)),
            _ => None,
        })
        .collect();
    let (_, first) = placements[0];
    let (_, last) = placements[121];
    assert!(first.x.abs() < f64::EPSILON && first.y.abs() < f64::EPSILON);
    assert!((last.x - 3.0).abs() < f64::EPSILON && last.y.abs() < f64::EPSILON);
    assert_eq!(last.floor_id, first.floor_id);
}

#[tokio::test]
async fn unknown_macs_are_reported_not_fatal() {
    let inventory = Inventory::new();
    enroll(&inventory, 140);

    let summary = run(&inventory, snapshot(&["US"], 150), &RunSettings::default())
        .await
        .unwrap();

    let lookups: Vec<_> = inventory
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::MacLookup(_)))
        .collect();
    assert_eq!(lookups, vec![Call::MacLookup(100), Call::MacLookup(50)]);
    assert_eq!(summary.devices_moved, 140);
    assert_eq!(summary.devices_eligible, 140);
    assert_eq!(summary.unresolved_macs.len(), 10);
    assert_eq!(summary.unresolved_macs[0], mac(140));
}

#[tokio::test]
async fn group_strategy_moves_members_in_bulk() {
    let inventory = Inventory::new();
    {
        let mut state = inventory.state.borrow_mut();
        for (id, host) in [(1, "ap-0"), (2, "ap-1"), (3, "ap-2"), (4, "printer")] {
            state.unplaced.push(RemoteDevice {
                id: RemoteId(id),
                hostname: Some(host.into()),
                mac: None,
            });
        }
        state.groups.push(DeviceGroup {
            id: RemoteId(50),
            name: "RFD-HQ".into(),
            device_ids: vec![RemoteId(1), RemoteId(2)],
        });
    }

    let settings = RunSettings {
        match_strategy: MatchStrategy::Group,
        page_size: 2,
        ..RunSettings::default()
    };
    let summary = run(&inventory, snapshot(&["US"], 3), &settings).await.unwrap();

    let calls = inventory.calls();
    assert!(calls.contains(&Call::ListUnplaced(2)));
    let bulk: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::BulkAssign(ids, _) => Some(ids.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(bulk, vec![vec![1, 2]]);
    assert_eq!(summary.devices_moved, 2);
    assert_eq!(summary.rejected_devices.len(), 1);
    assert_eq!(summary.not_in_snapshot, vec!["printer"]);
}
