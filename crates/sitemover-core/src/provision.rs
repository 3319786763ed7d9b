// ── Provisioning orchestrator ──
//
// Walks the reconciled units and makes the remote hierarchy match: site
// groups root to leaf, then the site, then the building, then its floors.
// Each entity is looked up first and reused when present; creates that hit
// a duplicate name go back to the `NameResolver` and retry under the same
// parent. Fatal errors unwind the whole run; a declined rename only fails
// that entity and skips what depends on it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::TopologyCache;
use crate::error::CoreError;
use crate::model::{
    Address, DomainUnit, FloorRecord, FloorSettings, GLOBAL, MAX_NAME_LEN, RemoteId, RemoteNode,
    RemoteNodeType, Topology,
};
use crate::naming::{EntityKind, NameResolver};
use crate::remote::{ApiError, InventoryApi};
use crate::retry::{Outcome, RetryPolicy};

// ── Report ───────────────────────────────────────────────────────────

/// Terminal state of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntityOutcome {
    Created,
    Reused { backfilled: bool },
    Failed { reason: String },
    Skipped { reason: String },
}

impl fmt::Display for EntityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Reused { backfilled: false } => f.write_str("reused"),
            Self::Reused { backfilled: true } => f.write_str("reused (country code updated)"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub kind: EntityKind,
    pub name: String,
    pub parent: String,
    #[serde(flatten)]
    pub outcome: EntityOutcome,
    pub remote_id: Option<RemoteId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub entries: Vec<EntityReport>,
}

impl ProvisionReport {
    pub fn count(&self, kind: EntityKind, pred: impl Fn(&EntityOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && pred(&entry.outcome))
            .count()
    }

    pub fn created(&self, kind: EntityKind) -> usize {
        self.count(kind, |o| matches!(o, EntityOutcome::Created))
    }

    pub fn reused(&self, kind: EntityKind) -> usize {
        self.count(kind, |o| matches!(o, EntityOutcome::Reused { .. }))
    }

    pub fn failed(&self, kind: EntityKind) -> usize {
        self.count(kind, |o| matches!(o, EntityOutcome::Failed { .. }))
    }

    pub fn skipped(&self, kind: EntityKind) -> usize {
        self.count(kind, |o| matches!(o, EntityOutcome::Skipped { .. }))
    }
}

// ── Create requests ──────────────────────────────────────────────────

enum Creation<'r> {
    SiteGroup,
    Site { country_code: u32 },
    Building { address: &'r Address },
    Floor { settings: &'r FloorSettings },
}

impl Creation<'_> {
    fn kind(&self) -> EntityKind {
        match self {
            Self::SiteGroup => EntityKind::SiteGroup,
            Self::Site { .. } => EntityKind::Site,
            Self::Building { .. } => EntityKind::Building,
            Self::Floor { .. } => EntityKind::Floor,
        }
    }

    fn node_type(&self) -> RemoteNodeType {
        match self {
            Self::SiteGroup => RemoteNodeType::SiteGroup,
            Self::Site { .. } => RemoteNodeType::Site,
            Self::Building { .. } => RemoteNodeType::Building,
            Self::Floor { .. } => RemoteNodeType::Floor,
        }
    }
}

async fn dispatch<A: InventoryApi>(
    api: &A,
    creation: &Creation<'_>,
    parent: RemoteId,
    name: &str,
) -> Result<RemoteId, ApiError> {
    match creation {
        Creation::SiteGroup => api.create_site_group(parent, name).await,
        Creation::Site { country_code } => api.create_site(parent, name, *country_code).await,
        Creation::Building { address } => api.create_building(parent, name, address).await,
        Creation::Floor { settings } => api.create_floor(parent, name, settings).await,
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// Per-run provisioning context: API handle, cache, resolver and report.
pub struct Orchestrator<'a, A, R> {
    api: &'a A,
    resolver: &'a mut R,
    retry: RetryPolicy,
    cache: TopologyCache,
    report: ProvisionReport,
    reported: HashSet<(EntityKind, String, String)>,
    /// Original name → id for entities the resolver renamed, keyed by kind
    /// and parent (`None` for name-scoped kinds).
    aliases: HashMap<(EntityKind, Option<RemoteId>, String), RemoteId>,
}

impl<'a, A: InventoryApi, R: NameResolver> Orchestrator<'a, A, R> {
    pub fn new(api: &'a A, resolver: &'a mut R, retry: RetryPolicy) -> Self {
        Self {
            api,
            resolver,
            retry,
            cache: TopologyCache::new(),
            report: ProvisionReport::default(),
            reported: HashSet::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &TopologyCache {
        &self.cache
    }

    pub fn report(&self) -> &ProvisionReport {
        &self.report
    }

    pub fn into_report(self) -> ProvisionReport {
        self.report
    }

    /// Provision every unit and its floors, recording remote ids in place.
    pub async fn provision(&mut self, topology: &mut Topology) -> Result<(), CoreError> {
        self.cache.fetch_root(self.api, &self.retry).await?;

        let Topology { units, floors, .. } = topology;

        for floor in floors.iter().filter(|floor| floor.unit_id.is_none()) {
            warn!(
                "floor '{}' is not associated with any domain; skipping it",
                floor.name
            );
            self.record(
                EntityKind::Floor,
                &floor.name,
                GLOBAL,
                EntityOutcome::Skipped {
                    reason: "not associated with any domain".into(),
                },
                None,
            );
        }

        for unit in units.iter_mut() {
            self.provision_unit(unit, floors).await?;
        }
        Ok(())
    }

    async fn provision_unit(
        &mut self,
        unit: &mut DomainUnit,
        floors: &mut [FloorRecord],
    ) -> Result<(), CoreError> {
        let floor_indices: Vec<usize> = floors
            .iter()
            .enumerate()
            .filter(|(_, floor)| floor.unit_id == Some(unit.unit_id))
            .map(|(i, _)| i)
            .collect();

        if floor_indices.is_empty() {
            info!(
                "no floors were found for building {}; skipping creation of building",
                unit.name
            );
            self.record(
                EntityKind::Building,
                &unit.name,
                unit.site_name().unwrap_or(GLOBAL),
                EntityOutcome::Skipped {
                    reason: "no floors".into(),
                },
                None,
            );
            return Ok(());
        }

        let parent_label = unit.site_name().unwrap_or(GLOBAL).to_owned();
        let building_id = match self.find_building(&unit.name).await? {
            Some(id) => {
                warn!(
                    "building {} already exists; floors and APs will be added to it",
                    unit.name
                );
                self.record(
                    EntityKind::Building,
                    &unit.name,
                    &parent_label,
                    EntityOutcome::Reused { backfilled: false },
                    Some(id),
                );
                Some(id)
            }
            None => match self.resolve_site(unit).await? {
                Some(parent) => {
                    let created = self
                        .create_named(
                            &Creation::Building {
                                address: &unit.address,
                            },
                            parent,
                            &unit.name,
                            &parent_label,
                        )
                        .await?;
                    if let Some((id, actual)) = &created {
                        if *actual != unit.name {
                            self.aliases
                                .insert((EntityKind::Building, None, unit.name.clone()), *id);
                        }
                    }
                    created.map(|(id, _)| id)
                }
                None => {
                    self.record(
                        EntityKind::Building,
                        &unit.name,
                        &parent_label,
                        EntityOutcome::Skipped {
                            reason: "parent location unavailable".into(),
                        },
                        None,
                    );
                    None
                }
            },
        };

        unit.remote_building_id = building_id;
        let Some(building_id) = building_id else {
            for &i in &floor_indices {
                warn!(
                    "floor '{}' of {} skipped: building was not provisioned",
                    floors[i].name, unit.name
                );
                self.record(
                    EntityKind::Floor,
                    &floors[i].name,
                    &unit.name,
                    EntityOutcome::Skipped {
                        reason: "building unavailable".into(),
                    },
                    None,
                );
            }
            return Ok(());
        };

        for i in floor_indices {
            let floor = &mut floors[i];
            let existing = self
                .cache
                .find_floor(self.api, &self.retry, &floor.name, building_id)
                .await?;

            match existing {
                Some(id) => {
                    warn!(
                        "there is already a floor named {} in building {}",
                        floor.name, unit.name
                    );
                    floor.remote_floor_id = Some(id);
                    self.record(
                        EntityKind::Floor,
                        &floor.name,
                        &unit.name,
                        EntityOutcome::Reused { backfilled: false },
                        Some(id),
                    );
                }
                None => {
                    let settings = floor.settings.clone();
                    let created = self
                        .create_named(
                            &Creation::Floor {
                                settings: &settings,
                            },
                            building_id,
                            &floor.name,
                            &unit.name,
                        )
                        .await?;
                    floor.remote_floor_id = created.map(|(id, _)| id);
                }
            }
        }

        Ok(())
    }

    async fn find_building(&mut self, name: &str) -> Result<Option<RemoteId>, CoreError> {
        if let Some(id) = self
            .aliases
            .get(&(EntityKind::Building, None, name.to_owned()))
        {
            return Ok(Some(*id));
        }
        self.cache.find_building(self.api, &self.retry, name).await
    }

    /// Id of the location the unit's building goes under, creating site
    /// groups and the site as needed. `None` when a rename was declined.
    async fn resolve_site(&mut self, unit: &DomainUnit) -> Result<Option<RemoteId>, CoreError> {
        let root = self.cache.fetch_root(self.api, &self.retry).await?;
        let Some((site_name, groups)) = unit.ancestor_path.split_last() else {
            return Ok(Some(root));
        };

        if let Some(id) = self
            .aliases
            .get(&(EntityKind::Site, None, site_name.clone()))
        {
            return Ok(Some(*id));
        }

        let lookup = self
            .cache
            .find_site_by_name(self.api, &self.retry, site_name)
            .await?;
        if let Some(id) = lookup.id {
            let mut backfilled = false;
            if let (true, Some(record)) = (lookup.needs_backfill, &lookup.record) {
                let api = self.api;
                self.retry
                    .call(&format!("update site {site_name}"), || {
                        api.update_site_country(record, unit.country_code)
                    })
                    .await?;
                self.cache.mark_backfilled(site_name);
                info!(
                    "site {site_name} is missing a country code; updated it with {}",
                    unit.country_code
                );
                backfilled = true;
            }
            let parent = groups.last().map_or(GLOBAL, String::as_str);
            self.record(
                EntityKind::Site,
                site_name,
                parent,
                EntityOutcome::Reused { backfilled },
                Some(id),
            );
            return Ok(Some(id));
        }

        let mut parent = root;
        let mut parent_label = GLOBAL.to_owned();
        for group in groups {
            let Some(id) = self.resolve_site_group(parent, &parent_label, group).await? else {
                return Ok(None);
            };
            parent = id;
            parent_label.clone_from(group);
        }

        let created = self
            .create_named(
                &Creation::Site {
                    country_code: unit.country_code,
                },
                parent,
                site_name,
                &parent_label,
            )
            .await?;
        Ok(created.map(|(id, actual)| {
            if actual != *site_name {
                self.aliases
                    .insert((EntityKind::Site, None, site_name.clone()), id);
            }
            id
        }))
    }

    async fn resolve_site_group(
        &mut self,
        parent: RemoteId,
        parent_label: &str,
        name: &str,
    ) -> Result<Option<RemoteId>, CoreError> {
        let alias_key = (EntityKind::SiteGroup, Some(parent), name.to_owned());
        if let Some(id) = self.aliases.get(&alias_key) {
            return Ok(Some(*id));
        }

        self.cache.expand(self.api, &self.retry, parent).await?;
        match self.cache.find_by_name_and_parent(name, parent).cloned() {
            Some(node) if node.node_type == RemoteNodeType::SiteGroup => {
                info!("location {name} was found");
                self.record(
                    EntityKind::SiteGroup,
                    name,
                    parent_label,
                    EntityOutcome::Reused { backfilled: false },
                    Some(node.id),
                );
                Ok(Some(node.id))
            }
            found => {
                if let Some(node) = found {
                    warn!(
                        "{name} already exists under {parent_label} as a {}, not a site group",
                        node.node_type
                    );
                }
                let created = self
                    .create_named(&Creation::SiteGroup, parent, name, parent_label)
                    .await?;
                Ok(created.map(|(id, actual)| {
                    if actual != name {
                        self.aliases.insert(alias_key, id);
                    }
                    id
                }))
            }
        }
    }

    /// Create under `parent`, asking the resolver for a new name on every
    /// duplicate. Returns the id and the name actually used.
    async fn create_named(
        &mut self,
        creation: &Creation<'_>,
        parent: RemoteId,
        name: &str,
        parent_label: &str,
    ) -> Result<Option<(RemoteId, String)>, CoreError> {
        let kind = creation.kind();
        let api = self.api;
        let mut current = name.to_owned();

        loop {
            let operation = format!("create {kind} {current}");
            let outcome = self
                .retry
                .run(&operation, || dispatch(api, creation, parent, &current))
                .await?;

            match outcome {
                Outcome::Done(id) => {
                    info!("{kind} {current} was created successfully");
                    self.cache.insert(RemoteNode {
                        id,
                        name: current.clone(),
                        node_type: creation.node_type(),
                        parent_id: Some(parent),
                    });
                    self.record(kind, &current, parent_label, EntityOutcome::Created, Some(id));
                    return Ok(Some((id, current)));
                }
                Outcome::DuplicateName(message) => {
                    warn!("{kind} {current} already exists: {message}");
                    match self.replacement_name(kind, &current) {
                        Some(next) => current = next,
                        None => {
                            self.record(
                                kind,
                                &current,
                                parent_label,
                                EntityOutcome::Failed {
                                    reason: "name already in use and no replacement given".into(),
                                },
                                None,
                            );
                            return Ok(None);
                        }
                    }
                }
            }
        }
    }

    /// A different name within the length limit, or `None` if declined.
    fn replacement_name(&mut self, kind: EntityKind, current: &str) -> Option<String> {
        let mut next = self.resolver.resolve_duplicate(kind, current)?;
        while next.chars().count() > MAX_NAME_LEN {
            let shorter = self.resolver.shorten(kind, &next)?;
            if shorter == next {
                return None;
            }
            next = shorter;
        }
        (next != current && !next.trim().is_empty()).then_some(next)
    }

    fn record(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: &str,
        outcome: EntityOutcome,
        remote_id: Option<RemoteId>,
    ) {
        let key = (kind, name.to_owned(), parent.to_owned());
        if !self.reported.insert(key) {
            return;
        }
        self.report.entries.push(EntityReport {
            kind,
            name: name.to_owned(),
            parent: parent.to_owned(),
            outcome,
            remote_id,
        });
    }
}
