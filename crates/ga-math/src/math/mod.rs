//! Core math modules.

pub mod distance;
pub mod matrix;
pub mod simplex;
pub mod stable;
