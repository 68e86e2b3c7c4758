use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A captured photo as produced by the camera collaborator: either a raw
/// base64 string or a `data:<mime>;base64,<data>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Photo(String);

impl Photo {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime_type(&self) -> Option<&str> {
        let header = self.0.strip_prefix("data:")?.split_once(',')?.0;
        header.strip_suffix(";base64")
    }

    pub fn decode(&self) -> Result<Vec<u8>, String> {
        STANDARD
            .decode(encoded_part(&self.0)?)
            .map_err(|e| format!("Photo is not valid base64: {e}"))
    }

    fn validate(value: &str) -> Result<(), String> {
        let encoded = encoded_part(value)?;
        if encoded.is_empty() {
            return Err("Photo data cannot be empty".to_string());
        }
        STANDARD
            .decode(encoded)
            .map(|_| ())
            .map_err(|e| format!("Photo is not valid base64: {e}"))
    }
}

fn encoded_part(value: &str) -> Result<&str, String> {
    match value.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "Photo data URL is missing its payload".to_string())?;
            if !header.ends_with(";base64") {
                return Err("Photo data URL must be base64 encoded".to_string());
            }
            Ok(data.trim())
        }
        None => Ok(value.trim()),
    }
}

impl TryFrom<String> for Photo {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Photo::new(value)
    }
}

impl From<Photo> for String {
    fn from(photo: Photo) -> Self {
        photo.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_data_urls_and_raw_base64() {
        let photo = Photo::from_bytes("image/jpeg", b"\xff\xd8\xff");
        assert_eq!(photo.mime_type(), Some("image/jpeg"));
        assert_eq!(photo.decode().unwrap(), b"\xff\xd8\xff".to_vec());
        assert!(Photo::new("aGVsbG8=".to_string()).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Photo::new("data:image/png,plain".to_string()).is_err());
        assert!(Photo::new("data:image/png;base64,".to_string()).is_err());
        assert!(Photo::new("not base64!!".to_string()).is_err());
        assert!(serde_json::from_str::<Photo>("\"%%%\"").is_err());
    }
}
