//! PCA engine and the projection/reconstruction built on it

mod basis;
mod projection;

pub use basis::{compute_basis, PcaBasis, DEFAULT_POWER_ITERATIONS};
pub use projection::{project, reconstruct};
