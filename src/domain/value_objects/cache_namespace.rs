use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// App shell and static assets, served cache-first.
    Static,
    /// API reads, served network-first with cache fallback.
    Api,
}

/// A versioned cache bucket such as `field-maintenance-v1.0.0` or
/// `field-maintenance-offline-v1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheNamespace(String);

impl CacheNamespace {
    pub fn new(prefix: &str, kind: CacheKind, version: &str) -> Result<Self, String> {
        let prefix = prefix.trim();
        let version = version.trim();
        if prefix.is_empty() {
            return Err("Cache namespace prefix cannot be empty".to_string());
        }
        if version.is_empty() {
            return Err("Cache version cannot be empty".to_string());
        }
        let name = match kind {
            CacheKind::Static => format!("{prefix}-{version}"),
            CacheKind::Api => format!("{prefix}-offline-{version}"),
        };
        Ok(Self(name))
    }

    pub fn from_raw(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
