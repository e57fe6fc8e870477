//! Change-detection fingerprint for the projection cache

use super::Item;
use std::fmt;

/// How many leading components of each vector feed the fingerprint
const SAMPLED_COMPONENTS: usize = 8;

/// Components are rounded to this resolution before hashing
const ROUNDING_SCALE: f64 = 1e6;

/// A BLAKE3 digest of the data a PCA basis was computed from
///
/// Covers the dimension, item count, every item id and a rounded snapshot of
/// the first few components of each vector.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Sentinel for "nothing computed yet"
    pub const EMPTY: Fingerprint = Fingerprint([0u8; 32]);

    /// Fingerprint a set of items at the given dimension
    pub fn of_items(dim: usize, items: &[Item]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(dim as u64).to_le_bytes());
        hasher.update(&(items.len() as u64).to_le_bytes());

        for item in items {
            hasher.update(&(item.id.as_str().len() as u64).to_le_bytes());
            hasher.update(item.id.as_str().as_bytes());
            for &x in item.vector.iter().take(SAMPLED_COMPONENTS) {
                let rounded = (x * ROUNDING_SCALE).round() as i64;
                hasher.update(&rounded.to_le_bytes());
            }
        }

        Fingerprint(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 7 hex chars, for logs
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Fingerprint::EMPTY
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}
