use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 10;

/// Locally generated queue key: a base36 millisecond timestamp followed by a
/// random base36 suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MutationId(String);

impl MutationId {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{}{}", to_base36(millis), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Mutation id cannot be empty".to_string());
        }
        if value.chars().any(char::is_whitespace) {
            return Err("Mutation id cannot contain whitespace".to_string());
        }
        if value.len() > 128 {
            return Err("Mutation id is too long".to_string());
        }
        Ok(())
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MutationId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MutationId::new(value)
    }
}

impl From<MutationId> for String {
    fn from(id: MutationId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let ids: HashSet<_> = (0..500).map(|_| MutationId::generate()).collect();
        assert_eq!(ids.len(), 500);
        for id in &ids {
            assert!(MutationId::new(id.to_string()).is_ok());
            assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn rejects_blank_ids() {
        assert!(MutationId::new("  ".to_string()).is_err());
        assert!(MutationId::new("a b".to_string()).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let id: MutationId = serde_json::from_str(r#""lx2k9abc""#).unwrap();
        assert_eq!(id.as_str(), "lx2k9abc");
        assert!(serde_json::from_str::<MutationId>(r#""a b""#).is_err());
        assert!(serde_json::from_str::<MutationId>(r#""""#).is_err());
    }
}
