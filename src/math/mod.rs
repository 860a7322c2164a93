//! Mathematical utilities: quantiles and sample moments.

pub mod moments;
pub mod quantile;

pub use moments::*;
pub use quantile::*;
