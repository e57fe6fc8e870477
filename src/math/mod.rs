//! Dense vector primitives shared by the projection and similarity engines

mod vector;

pub use vector::{
    coerce, cosine, dot, is_near_zero, mean, norm, normalize, normalize_if_nonzero,
    parse_vector, sub, NEAR_ZERO_NORM,
};
