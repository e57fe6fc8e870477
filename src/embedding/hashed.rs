//! Hash-derived vector source

use super::VectorSource;

/// Generates deterministic pseudo-random vectors from a seed string
///
/// Components are drawn uniformly from [-1, 1] by repeatedly hashing the
/// seed with BLAKE3. Same seed and dimension give the same vector.
#[derive(Clone, Debug, Default)]
pub struct HashedSource;

impl HashedSource {
    pub fn new() -> Self {
        HashedSource
    }
}

impl VectorSource for HashedSource {
    fn vector(&self, seed: &str, dim: usize) -> Vec<f64> {
        let mut vector = Vec::with_capacity(dim);
        let mut block = *blake3::hash(seed.as_bytes()).as_bytes();

        // Two bytes per component, rehash when a block is used up
        for i in 0..dim {
            let offset = (i * 2) % 32;
            if offset == 0 && i > 0 {
                block = *blake3::hash(&block).as_bytes();
            }
            let raw = u16::from_le_bytes([block[offset], block[offset + 1]]);
            vector.push(raw as f64 / 32767.5 - 1.0);
        }

        vector
    }

    fn name(&self) -> &str {
        "blake3-hashed"
    }
}
