//! Input/output helpers.
//!
//! - upload decoding + raw CSV parsing (`ingest`)
//! - cleaned CSV, JSON report and edits file (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
