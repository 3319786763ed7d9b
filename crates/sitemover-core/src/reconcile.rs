// ── Hierarchy reconciliation ──
//
// Ancestor paths from the snapshot are free text: the same name can show up
// under different parents, or as a site in one domain and a site group in
// another. This pass rewrites the paths so that every name maps to exactly
// one (parent, child kind) pair for the rest of the run.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{
    ChildKind, GLOBAL, LocationKind, LocationNode, MAX_NAME_LEN, ParentRef, Topology,
};
use crate::naming::truncate_name;

/// Longest generated name; leaves room under the service limit.
const RENAMED_MAX_LEN: usize = MAX_NAME_LEN - 1;

/// A change the reconciler made to a unit's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// `name` was already registered under another parent; the earlier parent wins.
    Reparented {
        unit: String,
        name: String,
        from: ParentRef,
        to: ParentRef,
    },
    /// `from` already plays a different structural role; this occurrence became `to`.
    Renamed {
        unit: String,
        from: String,
        to: String,
    },
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reparented {
                unit,
                name,
                from,
                to,
            } => write!(
                f,
                "{unit}: '{name}' already exists under '{to}'; moved it from '{from}' to '{to}'"
            ),
            Self::Renamed { unit, from, to } => write!(
                f,
                "{unit}: '{from}' already plays a different role in the hierarchy; renamed to '{to}'"
            ),
        }
    }
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledHierarchy {
    /// Canonical nodes in first-seen order, keyed by name.
    pub nodes: IndexMap<String, LocationNode>,
    /// Names of units dropped because no AP belongs to them.
    pub excluded: Vec<String>,
    pub corrections: Vec<Correction>,
}

impl ReconciledHierarchy {
    /// Names from the root down to `name`'s parent.
    pub fn ancestry(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(name).map(|node| &node.parent);

        while let Some(ParentRef::Named(parent)) = current {
            if !seen.insert(parent.as_str()) {
                break;
            }
            chain.push(parent.clone());
            current = self.nodes.get(parent).map(|node| &node.parent);
        }
        chain.reverse();
        chain
    }

    fn register(&mut self, name: &str, kind: LocationKind, parent: ParentRef, child_kind: ChildKind) {
        self.nodes.insert(
            name.to_owned(),
            LocationNode {
                name: name.to_owned(),
                kind,
                parent,
                child_kind,
            },
        );
    }
}

/// Strip spaces and cap at the generated-name length.
fn sanitize(name: &str) -> String {
    let compact: String = name.chars().filter(|c| *c != ' ').collect();
    truncate_name(&compact, RENAMED_MAX_LEN)
}

/// Reconcile every unit's ancestor path in place.
///
/// Units without APs are removed from `topology` (with their floors) and
/// listed in [`ReconciledHierarchy::excluded`].
pub fn reconcile(topology: &mut Topology) -> Result<ReconciledHierarchy, CoreError> {
    let mut hierarchy = ReconciledHierarchy::default();

    if let Some(unit) = topology
        .units
        .iter()
        .find(|unit| unit.name.chars().count() > MAX_NAME_LEN)
    {
        return Err(CoreError::Input {
            message: format!(
                "domain name '{}' exceeds {MAX_NAME_LEN} characters",
                unit.name
            ),
        });
    }

    let empty: HashSet<_> = topology
        .units
        .iter()
        .filter(|unit| topology.device_count(unit.unit_id) == 0)
        .map(|unit| unit.unit_id)
        .collect();
    for unit in topology.units.iter().filter(|u| empty.contains(&u.unit_id)) {
        info!("domain {} has no APs; excluding it", unit.name);
        hierarchy.excluded.push(unit.name.clone());
    }
    topology.units.retain(|unit| !empty.contains(&unit.unit_id));
    topology
        .floors
        .retain(|floor| floor.unit_id.is_none_or(|unit| !empty.contains(&unit)));

    for unit in &mut topology.units {
        let raw = std::mem::take(&mut unit.ancestor_path);
        let mut resolved: Vec<String> = Vec::with_capacity(raw.len());

        for (i, segment) in raw.iter().enumerate() {
            let is_site = i + 1 == raw.len();
            let kind = if is_site {
                LocationKind::Site
            } else {
                LocationKind::SiteGroup
            };
            let child_kind = match raw.get(i + 1) {
                Some(next) => ChildKind::Location(next.clone()),
                None => ChildKind::Building,
            };
            let parent = match resolved.last() {
                Some(prev) => ParentRef::Named(prev.clone()),
                None => ParentRef::Global,
            };

            let Some(existing) = hierarchy.nodes.get(segment).cloned() else {
                hierarchy.register(segment, kind, parent, child_kind);
                resolved.push(segment.clone());
                continue;
            };

            // Same role under the same parent is the same node. Under another
            // parent it is only the same node when the child matches too.
            let reuse = existing.child_kind.same_role(&child_kind)
                && (existing.parent == parent || existing.child_kind == child_kind);
            if reuse {
                if existing.parent != parent {
                    let correction = Correction::Reparented {
                        unit: unit.name.clone(),
                        name: segment.clone(),
                        from: parent,
                        to: existing.parent.clone(),
                    };
                    warn!("{correction}");
                    hierarchy.corrections.push(correction);
                    resolved = hierarchy.ancestry(segment);
                }
                resolved.push(segment.clone());
                continue;
            }

            let previous = resolved.last().map_or(GLOBAL, String::as_str);
            let base = sanitize(&format!("{segment}_{previous}"));
            let mut candidate = base.clone();
            let mut discriminator = 1;
            loop {
                match hierarchy.nodes.get(&candidate) {
                    None => {
                        hierarchy.register(&candidate, kind, parent.clone(), child_kind.clone());
                        break;
                    }
                    Some(node) if node.parent == parent && node.child_kind.same_role(&child_kind) => {
                        break;
                    }
                    Some(_) => {
                        discriminator += 1;
                        let suffix = discriminator.to_string();
                        candidate = format!(
                            "{}{suffix}",
                            truncate_name(&base, RENAMED_MAX_LEN - suffix.len())
                        );
                    }
                }
            }

            let correction = Correction::Renamed {
                unit: unit.name.clone(),
                from: segment.clone(),
                to: candidate.clone(),
            };
            warn!("{correction}");
            hierarchy.corrections.push(correction);
            resolved.push(candidate);
        }

        unit.ancestor_path = resolved;
    }

    Ok(hierarchy)
}
