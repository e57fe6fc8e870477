//! Two-component PCA by deflationary power iteration
//!
//! The basis is deterministic for a given input: power iteration is seeded
//! from the previous axes when their dimension matches (so a recompute moves
//! the view continuously) and from the first coordinate axis otherwise. Axis
//! signs are pinned so that the largest-magnitude coordinate is positive.

use crate::model::Fingerprint;
use log::{debug, trace, warn};
use ndarray::{Array1, Array2, Axis};

/// Power-iteration steps per axis unless configured otherwise
pub const DEFAULT_POWER_ITERATIONS: usize = 80;

/// Norms and eigenvalues below this count as collapsed
const DEGENERATE_EPS: f64 = 1e-10;

/// Squared-norm floor used while iterating
const NORM_FLOOR_SQ: f64 = 1e-18;

/// A 2D principal-component basis and the projection of every item onto it
#[derive(Clone, Debug, PartialEq)]
pub struct PcaBasis {
    /// Mean of the vectors the basis was computed from
    pub mean: Vec<f64>,
    /// Orthonormal principal axes W1, W2
    pub axes: [Vec<f64>; 2],
    /// Eigenvalue estimates for each axis
    pub lambdas: [f64; 2],
    /// 2D point per item, aligned by index with the item sequence
    pub points: Vec<[f64; 2]>,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) revision: u64,
}

impl PcaBasis {
    /// Dimension of the space the basis lives in
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Fingerprint of the data this basis was last validated against
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Session revision this basis was last validated at
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn stamp(&mut self, fingerprint: Fingerprint, revision: u64) {
        self.fingerprint = fingerprint;
        self.revision = revision;
    }
}

/// Compute a 2-component basis for `vectors` (each of length `dim`)
///
/// `previous` seeds the power iteration for continuity. Returns `None` when
/// fewer than two vectors are given, which callers treat as the empty basis.
pub fn compute_basis(
    vectors: &[&[f64]],
    dim: usize,
    previous: Option<&[Vec<f64>; 2]>,
    iterations: usize,
) -> Option<PcaBasis> {
    let n = vectors.len();
    if n < 2 || dim < 2 {
        return None;
    }

    let mut data = Array2::<f64>::zeros((n, dim));
    for (mut row, v) in data.rows_mut().into_iter().zip(vectors) {
        for (dst, src) in row.iter_mut().zip(v.iter()) {
            *dst = *src;
        }
    }

    let mean = data.mean_axis(Axis(0))?;
    let centered = &data - &mean;
    let cov = centered.t().dot(&centered) / (n.saturating_sub(1).max(1) as f64);

    // First axis
    let seed1 = previous.map(|p| p[0].as_slice());
    let (mut w1, lambda1) = power_iteration(&cov, seed1, iterations);
    if norm(&w1) < DEGENERATE_EPS {
        debug!("first axis collapsed (zero covariance), falling back to seed direction");
        w1 = seed_vector(dim, seed1);
        normalize(&mut w1);
    }

    // Deflate and find the second axis
    let col = w1.view().insert_axis(Axis(1));
    let deflated = &cov - &(col.dot(&col.t()) * lambda1);
    let (mut w2, mut lambda2) =
        power_iteration(&deflated, previous.map(|p| p[1].as_slice()), iterations);

    let overlap = w2.dot(&w1);
    w2.scaled_add(-overlap, &w1);
    let w2_norm = norm(&w2);

    if n < 3 || w2_norm < DEGENERATE_EPS || lambda2 < DEGENERATE_EPS {
        debug!(
            "second axis degenerate (n={}, norm={:.3e}, lambda={:.3e}), repairing",
            n, w2_norm, lambda2
        );
        w2 = orthogonal_fallback(&w1)?;
        lambda2 = w2.dot(&cov.dot(&w2));
    } else {
        w2 /= w2_norm;
    }

    stabilize_sign(&mut w1);
    stabilize_sign(&mut w2);

    let xs = centered.dot(&w1);
    let ys = centered.dot(&w2);
    let points = xs.iter().zip(ys.iter()).map(|(&x, &y)| [x, y]).collect();

    trace!("basis computed: n={} dim={} lambdas=({:.4}, {:.4})", n, dim, lambda1, lambda2);

    Some(PcaBasis {
        mean: mean.to_vec(),
        axes: [w1.to_vec(), w2.to_vec()],
        lambdas: [lambda1, lambda2],
        points,
        fingerprint: Fingerprint::EMPTY,
        revision: 0,
    })
}

/// Previous axis when its dimension matches, else the first unit vector
fn seed_vector(dim: usize, previous: Option<&[f64]>) -> Array1<f64> {
    match previous {
        Some(prev) if prev.len() == dim => Array1::from(prev.to_vec()),
        _ => {
            let mut v = Array1::zeros(dim);
            v[0] = 1.0;
            v
        }
    }
}

fn power_iteration(
    matrix: &Array2<f64>,
    seed: Option<&[f64]>,
    iterations: usize,
) -> (Array1<f64>, f64) {
    let mut v = seed_vector(matrix.nrows(), seed);
    normalize(&mut v);

    for _ in 0..iterations {
        let mut next = matrix.dot(&v);
        normalize(&mut next);
        v = next;
    }

    let lambda = v.dot(&matrix.dot(&v));
    (v, lambda)
}

/// Deterministic unit vector orthogonal to `w1`
///
/// Starts from the coordinate axis where `w1` is smallest and walks the
/// remaining coordinates cyclically until Gram-Schmidt leaves a usable vector.
fn orthogonal_fallback(w1: &Array1<f64>) -> Option<Array1<f64>> {
    let d = w1.len();
    let mut start = 0;
    for i in 1..d {
        if w1[i].abs() < w1[start].abs() {
            start = i;
        }
    }

    for k in 0..d {
        let idx = (start + k) % d;
        let mut e = Array1::<f64>::zeros(d);
        e[idx] = 1.0;
        e.scaled_add(-w1[idx], w1);

        let n = norm(&e);
        if n >= DEGENERATE_EPS {
            e /= n;
            return Some(e);
        }
    }

    warn!("no orthogonal fallback direction in dimension {}", d);
    None
}

/// Flip `v` so that its largest-magnitude coordinate is positive
fn stabilize_sign(v: &mut Array1<f64>) {
    let mut idx = 0;
    for i in 1..v.len() {
        if v[i].abs() > v[idx].abs() {
            idx = i;
        }
    }
    if v.get(idx).copied().unwrap_or(0.0) < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

fn normalize(v: &mut Array1<f64>) {
    let n = v.dot(v).max(NORM_FLOOR_SQ).sqrt();
    *v /= n;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{HashedSource, VectorSource};

    fn basis_of(vectors: &[Vec<f64>]) -> PcaBasis {
        let refs: Vec<&[f64]> = vectors.iter().map(|v| v.as_slice()).collect();
        let dim = vectors[0].len();
        compute_basis(&refs, dim, None, DEFAULT_POWER_ITERATIONS).unwrap()
    }

    fn dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    fn assert_orthonormal(basis: &PcaBasis) {
        let [w1, w2] = &basis.axes;
        assert!((dot(w1, w1) - 1.0).abs() < 1e-6, "|W1| = {}", dot(w1, w1));
        assert!((dot(w2, w2) - 1.0).abs() < 1e-6, "|W2| = {}", dot(w2, w2));
        assert!(dot(w1, w2).abs() < 1e-6, "W1.W2 = {}", dot(w1, w2));
    }

    fn random_cloud(n: usize, dim: usize) -> Vec<Vec<f64>> {
        let source = HashedSource::new();
        (0..n).map(|i| source.vector(&format!("p{}", i), dim)).collect()
    }

    #[test]
    fn test_fewer_than_two_vectors_is_empty() {
        assert!(compute_basis(&[], 3, None, 80).is_none());
        let v = [1.0, 0.0, 0.0];
        assert!(compute_basis(&[&v[..]], 3, None, 80).is_none());
    }

    #[test]
    fn test_two_basis_vectors() {
        let basis = basis_of(&[vec![1.0, 0.0], vec![0.0, 1.0]]);

        assert_eq!(basis.mean, vec![0.5, 0.5]);
        assert_orthonormal(&basis);

        // Symmetric about the projected mean along axis 1
        let [a, b] = [basis.points[0], basis.points[1]];
        assert!((a[0] + b[0]).abs() < 1e-9);
        assert!(a[0].abs() > 0.7);
        assert!(a[1].abs() < 1e-9 && b[1].abs() < 1e-9);

        // Axis 2 comes from the Gram-Schmidt repair of e0
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!((basis.axes[1][0] - h).abs() < 1e-9);
        assert!((basis.axes[1][1] - h).abs() < 1e-9);
    }

    #[test]
    fn test_orthonormal_across_item_counts() {
        for n in 2..12 {
            for dim in [2, 3, 8, 32] {
                let basis = basis_of(&random_cloud(n, dim));
                assert_orthonormal(&basis);
                assert_eq!(basis.points.len(), n);
            }
        }
    }

    #[test]
    fn test_collinear_points_get_repaired_axis() {
        let cloud = vec![
            vec![1.0, 1.0, 0.0, 0.0],
            vec![2.0, 2.0, 0.0, 0.0],
            vec![3.0, 3.0, 0.0, 0.0],
            vec![4.0, 4.0, 0.0, 0.0],
        ];
        let basis = basis_of(&cloud);
        assert_orthonormal(&basis);
        assert!(basis.lambdas[1].abs() < 1e-9);
    }

    #[test]
    fn test_identical_points_still_orthonormal() {
        let basis = basis_of(&[vec![0.6, 0.8, 0.0], vec![0.6, 0.8, 0.0]]);
        assert_orthonormal(&basis);
        assert!(basis.points.iter().all(|p| p[0].abs() < 1e-12 && p[1].abs() < 1e-12));
    }

    #[test]
    fn test_sign_stable_across_recompute() {
        let cloud = random_cloud(9, 16);
        let first = basis_of(&cloud);
        let second = basis_of(&cloud);
        assert_eq!(first.axes, second.axes);

        for axis in &first.axes {
            let peak = axis.iter().cloned().fold(0.0f64, |m, x| if x.abs() > m.abs() { x } else { m });
            assert!(peak > 0.0);
        }
    }

    #[test]
    fn test_seeding_from_previous_axes_is_continuous() {
        // Strongly anisotropic so 80 iterations are well converged
        let cloud: Vec<Vec<f64>> = random_cloud(10, 6)
            .into_iter()
            .map(|v| v.iter().enumerate().map(|(j, x)| x * 4f64.powi(-(j as i32))).collect())
            .collect();
        let first = basis_of(&cloud);

        let refs: Vec<&[f64]> = cloud.iter().map(|v| v.as_slice()).collect();
        let again = compute_basis(&refs, 6, Some(&first.axes), DEFAULT_POWER_ITERATIONS).unwrap();
        for (a, b) in first.axes[0].iter().zip(again.axes[0].iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dominant_direction_found() {
        // Spread mostly along coordinate 2
        let cloud = vec![
            vec![0.0, 0.1, 5.0],
            vec![0.1, 0.0, -5.0],
            vec![0.0, -0.1, 2.0],
            vec![-0.1, 0.0, -2.0],
        ];
        let basis = basis_of(&cloud);
        assert!(basis.axes[0][2] > 0.99);
        assert!(basis.lambdas[0] > basis.lambdas[1]);
    }
}
