//! Storage object metadata

use serde::{Deserialize, Deserializer, Serialize};

/// Metadata of a stored object, as reported after an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    /// Bucket holding the object
    #[serde(default)]
    pub bucket: String,

    /// Full path of the object inside the bucket
    #[serde(rename = "name")]
    pub full_path: String,

    /// Size in bytes (sent as a decimal string on the wire)
    #[serde(default, deserialize_with = "size_from_string")]
    pub size: u64,

    /// MIME type
    pub content_type: Option<String>,

    /// Comma-separated download tokens
    pub download_tokens: Option<String>,

    /// Last update time (RFC 3339)
    pub updated: Option<String>,
}

impl ObjectMetadata {
    /// Last segment of the object path
    pub fn name(&self) -> &str {
        self.full_path.rsplit('/').next().unwrap_or(&self.full_path)
    }

    /// First download token, if the object has any
    pub fn download_token(&self) -> Option<&str> {
        self.download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|t| !t.is_empty()))
    }
}

fn size_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}
