//! Similarity ranking and keyword filtering

mod keyword;
mod neighbors;

pub use keyword::keyword_filter;
pub use neighbors::{
    NeighborRanking, NeighborRow, Trend, DEFAULT_NEIGHBOR_LIMIT, DEFAULT_TREND_EPSILON,
};
