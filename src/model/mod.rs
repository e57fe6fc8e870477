//! Core data model types for vecplane

mod fingerprint;
mod item;

pub use fingerprint::Fingerprint;
pub use item::{Item, ItemId, ItemKind};
