//! Cosine-target solve: rotate a vector toward another to hit a given cosine
//!
//! The focal vector is replaced by `t·o + sqrt(1 - t²)·w`, where `o` is the
//! normalized other vector and `w` the unit component of the focal vector
//! orthogonal to `o`. The result is unit length, has cosine exactly `t` with
//! `o`, and stays in the plane spanned by the original pair.

use crate::math::{dot, normalize};
use log::{debug, warn};

/// Targets are clamped into `[-LIMIT, LIMIT]`
pub const TARGET_COSINE_LIMIT: f64 = 0.999999;

/// Orthogonal components shorter than this count as parallel
const PARALLEL_EPS: f64 = 1e-10;

/// New focal vector with `cosine(result, other) == target`
///
/// Returns `None` when no rotation plane can be found (every fallback
/// degenerates) or the target is not a finite number. Neither input is
/// modified.
pub fn solve_target_cosine(focal: &[f64], other: &[f64], target: f64) -> Option<Vec<f64>> {
    if !target.is_finite() {
        return None;
    }
    let t = target.clamp(-TARGET_COSINE_LIMIT, TARGET_COSINE_LIMIT);

    let mut f = focal.to_vec();
    let mut o = other.to_vec();
    normalize(&mut f);
    normalize(&mut o);

    let mut w = reject(&f, &o);
    let mut wn = dot(&w, &w).sqrt();

    if wn < PARALLEL_EPS {
        debug!("focal is parallel to other, using e1-based fallback plane");
        let mut e1 = vec![0.0; o.len()];
        if let Some(first) = e1.first_mut() {
            *first = 1.0;
        }
        w = reject(&e1, &o);
        wn = dot(&w, &w).sqrt();
        if wn < PARALLEL_EPS {
            warn!("no rotation plane available, leaving vector unchanged");
            return None;
        }
    }

    let b = (1.0 - t * t).max(0.0).sqrt();
    let mut out: Vec<f64> = o
        .iter()
        .zip(w.iter())
        .map(|(oi, wi)| t * oi + b * wi / wn)
        .collect();
    normalize(&mut out);
    Some(out)
}

/// Component of `v` orthogonal to unit vector `u`
fn reject(v: &[f64], u: &[f64]) -> Vec<f64> {
    let d = dot(v, u);
    v.iter().zip(u.iter()).map(|(x, y)| x - d * y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{HashedSource, VectorSource};
    use crate::math::{cosine, norm};

    #[test]
    fn test_quarter_turn_example() {
        let f = [1.0, 0.0, 0.0];
        let o = [0.0, 1.0, 0.0];
        let out = solve_target_cosine(&f, &o, 0.5).unwrap();

        assert!((dot(&out, &o) - 0.5).abs() < 1e-9);
        assert!((norm(&out) - 1.0).abs() < 1e-9);
        assert!((out[0] - 0.75f64.sqrt()).abs() < 1e-9);
        assert!(out[2].abs() < 1e-12);
    }

    #[test]
    fn test_hits_target_for_random_pairs() {
        let source = HashedSource::new();
        for k in 0..20 {
            let f = source.vector(&format!("f{}", k), 16);
            let o = source.vector(&format!("o{}", k), 16);
            for t in [-0.95, -0.5, -0.1, 0.0, 0.3, 0.77, 0.99] {
                let out = solve_target_cosine(&f, &o, t).unwrap();
                assert!((norm(&out) - 1.0).abs() < 1e-6);
                assert!((cosine(&out, &o) - t).abs() < 1e-6, "t={} got {}", t, cosine(&out, &o));
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let source = HashedSource::new();
        let f = source.vector("focal", 8);
        let o = source.vector("other", 8);

        let once = solve_target_cosine(&f, &o, 0.42).unwrap();
        let twice = solve_target_cosine(&once, &o, 0.42).unwrap();
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_parallel_uses_fallback_plane() {
        let f = [0.0, 2.0, 0.0];
        let o = [0.0, 1.0, 0.0];
        let out = solve_target_cosine(&f, &o, 0.0).unwrap();
        assert!(dot(&out, &o).abs() < 1e-9);
        assert!((out[0] - 1.0).abs() < 1e-9);

        let anti = [0.0, -1.0, 0.0];
        let out = solve_target_cosine(&anti, &o, 0.6).unwrap();
        assert!((cosine(&out, &o) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_fully_degenerate_aborts() {
        let e1 = [1.0, 0.0];
        assert!(solve_target_cosine(&e1, &e1, 0.5).is_none());
        assert!(solve_target_cosine(&[0.0, 1.0], &[0.0, 1.0], f64::NAN).is_none());
    }

    #[test]
    fn test_target_is_clamped() {
        let f = [1.0, 0.0];
        let o = [0.0, 1.0];
        let out = solve_target_cosine(&f, &o, 3.0).unwrap();
        assert!((cosine(&out, &o) - TARGET_COSINE_LIMIT).abs() < 1e-9);
    }

    #[test]
    fn test_inputs_untouched() {
        let f = vec![3.0, 4.0, 0.0];
        let o = vec![0.0, 0.0, 5.0];
        let _ = solve_target_cosine(&f, &o, 0.2);
        assert_eq!(f, vec![3.0, 4.0, 0.0]);
        assert_eq!(o, vec![0.0, 0.0, 5.0]);
    }
}
