//! Vector source trait definition

/// Supplies starting vectors for new or reset items
///
/// Implementations can use:
/// - Deterministic hash-derived vectors (the default)
/// - A real embedding model
/// - Fixed vectors for testing
pub trait VectorSource {
    /// Produce a vector of length `dim` for the given seed string
    ///
    /// The result need not be normalized; the session normalizes it.
    fn vector(&self, seed: &str, dim: usize) -> Vec<f64>;

    /// Get the source name/identifier
    fn name(&self) -> &str;
}
