use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Write verbs that may be deferred to the durable queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationMethod {
    Post,
    Put,
    Delete,
}

impl MutationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationMethod::Post => "POST",
            MutationMethod::Put => "PUT",
            MutationMethod::Delete => "DELETE",
        }
    }

    /// Creates rank above updates, updates above deletes. Lower is higher priority.
    pub fn priority(&self) -> u8 {
        match self {
            MutationMethod::Post => 1,
            MutationMethod::Put => 2,
            MutationMethod::Delete => 3,
        }
    }

    pub fn from_http(method: &Method) -> Option<Self> {
        match method {
            &Method::POST => Some(MutationMethod::Post),
            &Method::PUT => Some(MutationMethod::Put),
            &Method::DELETE => Some(MutationMethod::Delete),
            _ => None,
        }
    }

    pub fn to_http(self) -> Method {
        match self {
            MutationMethod::Post => Method::POST,
            MutationMethod::Put => Method::PUT,
            MutationMethod::Delete => Method::DELETE,
        }
    }
}

impl TryFrom<&str> for MutationMethod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "POST" => Ok(MutationMethod::Post),
            "PUT" => Ok(MutationMethod::Put),
            "DELETE" => Ok(MutationMethod::Delete),
            other => Err(format!("Unsupported mutation method: {other}")),
        }
    }
}

impl fmt::Display for MutationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
