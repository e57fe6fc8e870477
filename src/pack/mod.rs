//! Pack exchange format
//!
//! A pack is the JSON document used to move items in and out of a session:
//!
//! ```json
//! { "metadata": { "version": 1, "createdAt": "...", "dim": 8, "method": "vecplane" },
//!   "items": [ { "id": "...", "text": "...", "type": "word", "token": "", "vector": [ ... ] } ] }
//! ```
//!
//! `items` and a finite numeric `metadata.dim` are required. Everything else
//! is optional on input.

use crate::config::clamp_dim;
use crate::model::Item;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Written into `metadata.method` on export
pub const PACK_METHOD: &str = "vecplane";

/// A complete pack document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub metadata: PackMetadata,
    pub items: Vec<PackItem>,
}

/// Metadata about the pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackMetadata {
    #[serde(default = "default_version")]
    pub version: u32,
    /// RFC 3339 creation time
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Vector dimension, clamped into the supported range on read
    #[serde(deserialize_with = "finite_dim")]
    pub dim: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// An item as stored in a pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub token: String,
    /// Absent vectors import as all-zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
}

fn default_version() -> u32 {
    crate::PACK_VERSION
}

fn default_kind() -> String {
    "word".to_string()
}

/// `null` reads as the empty string
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn finite_dim<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("metadata.dim must be a finite number"));
    }
    Ok(clamp_dim(raw.clamp(0.0, usize::MAX as f64) as usize))
}

impl Pack {
    /// Build a pack from session items
    pub fn from_items<'a>(dim: usize, items: impl IntoIterator<Item = &'a Item>) -> Self {
        Pack {
            metadata: PackMetadata {
                version: crate::PACK_VERSION,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                dim,
                method: Some(PACK_METHOD.to_string()),
            },
            items: items.into_iter().map(PackItem::from).collect(),
        }
    }

    /// Parse and validate a pack from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if !value.get("items").is_some_and(|v| v.is_array()) {
            return Err(Error::InvalidPack("items missing".into()));
        }
        let dim_ok = value
            .get("metadata")
            .and_then(|m| m.get("dim"))
            .and_then(|d| d.as_f64())
            .is_some_and(f64::is_finite);
        if !dim_ok {
            return Err(Error::InvalidPack("metadata.dim missing".into()));
        }

        serde_json::from_value(value).map_err(|e| Error::InvalidPack(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a pack file
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Pack::from_json(&text)
    }

    /// Write this pack as pretty JSON
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

impl From<&Item> for PackItem {
    fn from(item: &Item) -> Self {
        PackItem {
            id: Some(item.id.to_string()),
            text: item.text.clone(),
            kind: item.kind.to_string(),
            token: item.token.clone(),
            vector: Some(item.vector.clone()),
        }
    }
}
