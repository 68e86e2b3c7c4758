use crate::domain::value_objects::{MutationId, MutationMethod, MutationPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A write that could not reach the records API and waits in the durable queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMutation {
    pub id: MutationId,
    pub target_url: String,
    pub method: MutationMethod,
    pub payload: MutationPayload,
    /// End-to-end request headers replayed with the mutation.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub record_type: Option<String>,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub synced_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl QueuedMutation {
    pub fn is_pending(&self) -> bool {
        !self.synced
    }

    /// Pending entries that kept failing are reported as stuck so the UI can
    /// flag them for manual attention.
    pub fn is_stuck(&self, threshold: u32) -> bool {
        self.is_pending() && self.attempts >= threshold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationDraft {
    pub id: Option<MutationId>,
    pub target_url: String,
    pub method: MutationMethod,
    pub payload: MutationPayload,
    pub headers: Vec<(String, String)>,
}

/// Headers that describe a single connection or the original body framing
/// and must not be replayed.
const UNREPLAYABLE_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

impl MutationDraft {
    pub fn new(
        target_url: impl Into<String>,
        method: MutationMethod,
        payload: MutationPayload,
    ) -> Result<Self, String> {
        let target_url = target_url.into();
        if target_url.trim().is_empty() {
            return Err("Mutation target url cannot be empty".to_string());
        }
        Ok(Self {
            id: None,
            target_url,
            method,
            payload,
            headers: Vec::new(),
        })
    }

    /// Keeps the end-to-end headers of the intercepted request.
    pub fn with_headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        self.headers = headers
            .into_iter()
            .filter(|(name, _)| {
                let name = name.to_ascii_lowercase();
                !UNREPLAYABLE_HEADERS.contains(&name.as_str())
            })
            .cloned()
            .collect();
        self
    }

    pub fn with_id(mut self, id: MutationId) -> Self {
        self.id = Some(id);
        self
    }
}
