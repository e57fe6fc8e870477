//! # vecplane
//!
//! Interactive 2D editing of a small set of embedding vectors.
//!
//! A [`Session`] holds labeled unit vectors in a shared D-dimensional space
//! and keeps a two-component PCA view of them. Moving a point in that view
//! rewrites its vector exactly through the inverse projection, while a
//! neighbor listing tracks how similarity to the selected item changes.
//!
//! ## Core Concepts
//!
//! - **Items**: Labeled vectors kept at unit norm
//! - **Basis**: Mean plus two orthonormal principal axes, recomputed on change
//!   unless locked
//! - **Neighbors**: Cosine similarities in an order frozen per focal item
//! - **Packs**: JSON documents used to import and export items
//!
//! ## Example
//!
//! ```ignore
//! use vecplane::Session;
//!
//! let mut session = Session::new();
//! session.seed_demo();
//! let first = session.items()[0].id.clone();
//! session.drag_start(&first);
//! session.drag_step(0.2, -0.1);
//! session.drag_end();
//! ```

pub mod config;
pub mod embedding;
pub mod math;
pub mod model;
pub mod ops;
pub mod pack;
pub mod pca;
pub mod search;

mod error;
mod session;

pub use config::Config;
pub use embedding::{HashedSource, VectorSource};
pub use error::{Error, Result};
pub use model::{Fingerprint, Item, ItemId, ItemKind};
pub use pack::{Pack, PackItem, PackMetadata};
pub use pca::PcaBasis;
pub use search::{NeighborRow, Trend};
pub use session::Session;

/// Pack format version written on export
pub const PACK_VERSION: u32 = 1;
