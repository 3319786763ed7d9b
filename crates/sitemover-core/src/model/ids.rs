// ── Identity types ──
//
// Synthetic ids correlate snapshot records with each other before anything
// exists remotely; `RemoteId` is what the inventory service hands back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// ── RemoteId ────────────────────────────────────────────────────────

/// Numeric id assigned by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub i64);

impl RemoteId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RemoteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ── Synthetic ids ───────────────────────────────────────────────────

/// Stable per-run id of a domain unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable per-run id of a floor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloorId(Uuid);

impl FloorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FloorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FloorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to 12 upper-case hex digits with no separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse any common notation (`aa:bb:..`, `AA-BB-..`, `aabb.ccdd.eeff`, bare hex).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.len() == 12 && normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(normalized))
        } else {
            Err(CoreError::Validation {
                message: format!("invalid MAC address '{raw}'"),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_strips_separators() {
        assert_eq!(
            MacAddress::parse("00-1a-2b-3c-4d-5e").unwrap().as_str(),
            "001A2B3C4D5E"
        );
        assert_eq!(
            MacAddress::parse("00:1a:2b:3c:4d:5e").unwrap().as_str(),
            "001A2B3C4D5E"
        );
        assert_eq!(
            MacAddress::parse("001a.2b3c.4d5e").unwrap().as_str(),
            "001A2B3C4D5E"
        );
    }

    #[test]
    fn mac_address_rejects_garbage() {
        assert!(MacAddress::parse("not-a-mac").is_err());
        assert!(MacAddress::parse("00-11-22-33-44").is_err());
    }

    #[test]
    fn unit_ids_are_unique() {
        assert_ne!(UnitId::new(), UnitId::new());
    }
}
