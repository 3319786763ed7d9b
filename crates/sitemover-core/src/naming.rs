// ── Name resolution strategies ──
//
// The engine never invents a replacement name on its own: when a create
// reports a duplicate, or a snapshot name is too long, it asks a
// `NameResolver`. The CLI answers with an interactive prompt; unattended
// runs and tests use `SuffixResolver`.

use std::collections::HashMap;

use serde::Serialize;
use strum::Display;

use crate::model::MAX_NAME_LEN;

/// Kind of entity a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum EntityKind {
    #[strum(serialize = "Site Group")]
    SiteGroup,
    Site,
    Building,
    Floor,
}

/// Supplies replacement names. Returning `None` declines.
pub trait NameResolver {
    /// `name` is already taken remotely; propose another.
    fn resolve_duplicate(&mut self, kind: EntityKind, name: &str) -> Option<String>;

    /// `name` exceeds the service's length limit; propose a shorter one.
    fn shorten(&mut self, kind: EntityKind, name: &str) -> Option<String>;
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_name(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

/// Deterministic resolver: `name-2`, `name-3`, ... and plain truncation.
#[derive(Debug, Default)]
pub struct SuffixResolver {
    attempts: HashMap<(EntityKind, String), u32>,
}

impl SuffixResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameResolver for SuffixResolver {
    fn resolve_duplicate(&mut self, kind: EntityKind, name: &str) -> Option<String> {
        let base = strip_suffix(name).to_owned();
        let counter = self.attempts.entry((kind, base.clone())).or_insert(1);
        *counter += 1;

        let suffix = format!("-{counter}");
        let keep = MAX_NAME_LEN.saturating_sub(suffix.chars().count());
        Some(format!("{}{suffix}", truncate_name(&base, keep)))
    }

    fn shorten(&mut self, _kind: EntityKind, name: &str) -> Option<String> {
        Some(truncate_name(name, MAX_NAME_LEN))
    }
}

/// `Boston-3` → `Boston`; names without a numeric suffix are returned as-is.
fn strip_suffix(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}
