// ── Location hierarchy types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ids::RemoteId;

/// Name of the implicit root of every hierarchy.
pub const GLOBAL: &str = "Global";

/// Longest name the inventory service accepts.
pub const MAX_NAME_LEN: usize = 32;

// ── Local (reconciled) nodes ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum LocationKind {
    #[strum(serialize = "site group")]
    SiteGroup,
    #[strum(serialize = "site")]
    Site,
}

/// Parent of a reconciled node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRef {
    Global,
    Named(String),
}

impl ParentRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Global => GLOBAL,
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a node is expected to contain.
///
/// A site holds buildings; a site group holds the next path segment. Under
/// one parent, a site group seen with different children is still one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildKind {
    Building,
    Location(String),
}

impl ChildKind {
    pub fn same_role(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Building, Self::Building) | (Self::Location(_), Self::Location(_))
        )
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => f.write_str("buildings"),
            Self::Location(name) => write!(f, "'{name}'"),
        }
    }
}

/// One level of the reconciled hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    pub name: String,
    pub kind: LocationKind,
    pub parent: ParentRef,
    pub child_kind: ChildKind,
}

// ── Remote nodes ─────────────────────────────────────────────────────

/// Node type as reported by the location tree.
///
/// Parsing is case-insensitive and accepts the aliases different service
/// releases use for site groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum RemoteNodeType {
    Global,
    #[strum(to_string = "SiteGroup", serialize = "Location", serialize = "Site_Group")]
    SiteGroup,
    Site,
    Building,
    Floor,
    Unknown,
}

impl RemoteNodeType {
    /// Parse a wire value, mapping anything unrecognized to `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: RemoteId,
    pub name: String,
    pub node_type: RemoteNodeType,
    pub parent_id: Option<RemoteId>,
}
