//! Vector-editing operations

mod target;

pub use target::{solve_target_cosine, TARGET_COSINE_LIMIT};
