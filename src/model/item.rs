//! Item type - a labeled embedding vector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque unique identifier for an item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create an item ID from any string
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    /// Generate a fresh ID from the clock and a process-wide counter
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut hasher = blake3::Hasher::new();
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&n.to_le_bytes());
        ItemId(hex::encode(&hasher.finalize().as_bytes()[..6]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

/// What an item's text denotes
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    #[default]
    Word,
    Phrase,
    Token,
    /// Any other label carried through import/export verbatim
    Other(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Word => "word",
            ItemKind::Phrase => "phrase",
            ItemKind::Token => "token",
            ItemKind::Other(s) => s,
        }
    }
}

impl From<String> for ItemKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "word" | "" => ItemKind::Word,
            "phrase" => ItemKind::Phrase,
            "token" => ItemKind::Token,
            _ => ItemKind::Other(s),
        }
    }
}

impl From<&str> for ItemKind {
    fn from(s: &str) -> Self {
        ItemKind::from(s.to_string())
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled vector in the session's D-dimensional space
///
/// The vector always has the session dimension and is kept at unit norm
/// unless it is (near-)zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    /// Display text
    pub text: String,

    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Associated source token or operator, possibly empty
    pub token: String,

    pub vector: Vec<f64>,

    /// Label of the pack this item was imported from
    #[serde(skip)]
    pub source: Option<String>,
}

impl Item {
    /// Create an item with a generated ID
    pub fn new(text: impl Into<String>, vector: Vec<f64>) -> Self {
        Item::with_id(ItemId::generate(), text, vector)
    }

    /// Create an item with a specific ID
    pub fn with_id(id: impl Into<ItemId>, text: impl Into<String>, vector: Vec<f64>) -> Self {
        Item {
            id: id.into(),
            text: text.into(),
            kind: ItemKind::Word,
            token: String::new(),
            vector,
            source: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<ItemKind>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Case-insensitive substring match on text or token
    pub fn matches(&self, query_lower: &str) -> bool {
        self.text.to_lowercase().contains(query_lower)
            || self.token.to_lowercase().contains(query_lower)
    }
}
