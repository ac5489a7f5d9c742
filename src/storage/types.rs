//! Wire types for the remote file store

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque reference to a stored blob: either a full URL or a service file id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this reference can be fetched directly instead of via the files endpoint
    pub fn is_url(&self) -> bool {
        self.0.starts_with("http")
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlobRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BlobRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Upload response: the service returns an id, a url, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedBlob {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl UploadedBlob {
    /// Reference to store alongside an entry (url preferred)
    pub fn location(&self) -> Option<BlobRef> {
        non_empty(&self.url)
            .or_else(|| non_empty(&self.id))
            .map(BlobRef::from)
    }

    /// Reference an operator should pin as FILESS_INDEX_ID (id preferred)
    pub fn identifier(&self) -> Option<BlobRef> {
        non_empty(&self.id)
            .or_else(|| non_empty(&self.url))
            .map(BlobRef::from)
    }
}

/// One row of a files-by-name lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl FileMeta {
    /// Where to download this file from (url preferred)
    pub fn location(&self) -> Option<BlobRef> {
        non_empty(&self.url)
            .or_else(|| non_empty(&self.id))
            .map(BlobRef::from)
    }
}

/// Connection settings for the remote file store
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL for the storage HTTP API
    pub base_url: String,
    /// Bearer key sent with every request
    pub api_key: Option<String>,
    /// Request timeout; transport default when unset
    pub timeout_secs: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.filess.io".to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_reference_preference() {
        let both: UploadedBlob =
            serde_json::from_str(r#"{"id": "f1", "url": "https://cdn.example/f1"}"#).unwrap();
        assert_eq!(both.location().unwrap().as_str(), "https://cdn.example/f1");
        assert_eq!(both.identifier().unwrap().as_str(), "f1");

        let id_only: UploadedBlob = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(id_only.location().unwrap().as_str(), "42");
        assert_eq!(id_only.identifier().unwrap().as_str(), "42");

        let empty: UploadedBlob = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        assert!(empty.location().is_none());
    }

    #[test]
    fn test_file_meta_ignores_unknown_fields() {
        let files: Vec<FileMeta> = serde_json::from_str(
            r#"[{"id": "abc", "name": "pib_journal_index.json", "size": 120}]"#,
        )
        .unwrap();
        assert_eq!(files[0].location().unwrap().as_str(), "abc");
        assert_eq!(files[0].name.as_deref(), Some("pib_journal_index.json"));
    }

    #[test]
    fn test_blob_ref_url_detection() {
        assert!(BlobRef::from("https://files.example/x").is_url());
        assert!(BlobRef::from("http://localhost/x").is_url());
        assert!(!BlobRef::from("abc123").is_url());
    }
}
