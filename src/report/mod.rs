//! Reports over a cleaned table: outlier flags, missing values, load accounting and
//! descriptive statistics, plus their terminal formatting (`format`).

pub mod describe;
pub mod format;
pub mod missing;
pub mod outliers;
pub mod summary;

pub use describe::*;
pub use missing::*;
pub use outliers::*;
pub use summary::*;
