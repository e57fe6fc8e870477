//! Forward projection and residual-preserving reconstruction
//!
//! Forward maps a vector to `((v - mean)·W1, (v - mean)·W2)`. The inverse
//! adds back the out-of-plane residual captured when a drag gesture starts,
//! so dragging only moves a vector within the plane through `mean` spanned by
//! W1 and W2.

use super::PcaBasis;
use crate::math::{dot, sub};

/// Project `v` onto the plane `(mean, w1, w2)`
pub fn project(v: &[f64], mean: &[f64], w1: &[f64], w2: &[f64]) -> [f64; 2] {
    let mut x = 0.0;
    let mut y = 0.0;
    for i in 0..v.len() {
        let c = v[i] - mean[i];
        x += c * w1[i];
        y += c * w2[i];
    }
    [x, y]
}

/// `mean + x·w1 + y·w2 + residual`
pub fn reconstruct(
    mean: &[f64],
    w1: &[f64],
    w2: &[f64],
    point: [f64; 2],
    residual: &[f64],
) -> Vec<f64> {
    let [x, y] = point;
    (0..mean.len())
        .map(|i| mean[i] + x * w1[i] + y * w2[i] + residual[i])
        .collect()
}

impl PcaBasis {
    /// 2D point of `v` in this basis
    pub fn project(&self, v: &[f64]) -> [f64; 2] {
        project(v, &self.mean, &self.axes[0], &self.axes[1])
    }

    /// Vector whose in-plane coordinates are `point`, plus `residual`
    pub fn reconstruct(&self, point: [f64; 2], residual: &[f64]) -> Vec<f64> {
        reconstruct(&self.mean, &self.axes[0], &self.axes[1], point, residual)
    }

    /// Out-of-plane component of `v` relative to its displayed `point`
    ///
    /// `v - (mean + x·W1 + y·W2)`. When `point` is the forward projection of
    /// `v` this is orthogonal to both axes.
    pub fn residual(&self, v: &[f64], point: [f64; 2]) -> Vec<f64> {
        let zero = vec![0.0; v.len()];
        sub(v, &self.reconstruct(point, &zero))
    }

    /// Residual of `v` against its own forward projection
    pub fn orthogonal_component(&self, v: &[f64]) -> Vec<f64> {
        self.residual(v, self.project(v))
    }

    /// Append the projection of a newly added vector
    pub fn push_point(&mut self, v: &[f64]) {
        let p = self.project(v);
        self.points.push(p);
    }

    /// Re-project a single entry in place. No-op for an out-of-range index.
    pub fn patch_point(&mut self, index: usize, v: &[f64]) -> bool {
        let p = self.project(v);
        match self.points.get_mut(index) {
            Some(slot) => {
                *slot = p;
                true
            }
            None => false,
        }
    }

    /// Fraction of the two eigenvalues' sum carried by each axis
    pub fn variance_split(&self) -> Option<[f64; 2]> {
        let total = self.lambdas[0] + self.lambdas[1];
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        Some([self.lambdas[0] / total, self.lambdas[1] / total])
    }

    /// Cosine between the two axes, for sanity checks
    pub fn axis_overlap(&self) -> f64 {
        dot(&self.axes[0], &self.axes[1])
    }
}
