//! Vector arithmetic over plain `f64` slices

use crate::{Error, Result};

/// Squared-norm floor applied before taking a square root
const NORM_FLOOR_SQ: f64 = 1e-18;

/// Vectors whose raw norm falls below this are left unnormalized
pub const NEAR_ZERO_NORM: f64 = 1e-12;

/// Dot product of two equal-length vectors
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm, floored at `sqrt(1e-18)` so it is always safe to divide by
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).max(NORM_FLOOR_SQ).sqrt()
}

/// True when the unfloored norm is below [`NEAR_ZERO_NORM`]
pub fn is_near_zero(a: &[f64]) -> bool {
    dot(a, a).sqrt() < NEAR_ZERO_NORM
}

/// Scale `v` to unit length in place
pub fn normalize(v: &mut [f64]) {
    let n = norm(v);
    for x in v.iter_mut() {
        *x /= n;
    }
}

/// Normalize unless the vector is (near-)zero. Returns whether it was scaled.
pub fn normalize_if_nonzero(v: &mut [f64]) -> bool {
    if is_near_zero(v) {
        return false;
    }
    normalize(v);
    true
}

/// Cosine similarity `dot / (|a| |b|)`
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    dot(a, b) / (norm(a) * norm(b))
}

/// Elementwise `a - b`
pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| x - y).collect()
}

/// Arithmetic mean of a set of vectors of dimension `dim`
pub fn mean<'a>(vectors: impl IntoIterator<Item = &'a [f64]>, dim: usize) -> Vec<f64> {
    let mut m = vec![0.0; dim];
    let mut count = 0usize;
    for v in vectors {
        for (acc, x) in m.iter_mut().zip(v.iter()) {
            *acc += x;
        }
        count += 1;
    }
    let k = count.max(1) as f64;
    for acc in &mut m {
        *acc /= k;
    }
    m
}

/// Truncate or zero-pad `v` to exactly `dim` components
pub fn coerce(mut v: Vec<f64>, dim: usize) -> Vec<f64> {
    v.resize(dim, 0.0);
    v
}

/// Parse whitespace/comma separated numbers into a vector of length `dim`
///
/// Every token must be a finite number. Short input is zero-padded and long
/// input truncated.
pub fn parse_vector(text: &str, dim: usize) -> Result<Vec<f64>> {
    let values = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|tok| match tok.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(Error::VectorParse(format!("not a finite number: {:?}", tok))),
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(coerce(values, dim))
}
