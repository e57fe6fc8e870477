//! Pluggable sources for fresh item vectors

mod hashed;
mod traits;

pub use hashed::HashedSource;
pub use traits::VectorSource;
