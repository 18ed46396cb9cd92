//! Group audit math utilities.

pub mod math;

pub use math::distance::{pairwise_distances, DistanceMetric};
pub use math::matrix::{Matrix, ShapeError};
pub use math::simplex::{check_distribution, SimplexViolation};
pub use math::stable::*;
