use crate::domain::value_objects::CacheNamespace;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Last-known-good response for a URL inside one cache namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub namespace: CacheNamespace,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        namespace: CacheNamespace,
        url: impl Into<String>,
        status: u16,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            namespace,
            url: url.into(),
            status,
            headers,
            body,
            stored_at: Utc::now(),
        }
    }
}
