//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`DataType`, `DateOrder`, `QuartileMethod`)
//! - the canonical table (`CanonicalTable`, `Column`)
//! - the versioned header synonym table (`SYNONYMS`)

pub mod synonyms;
pub mod types;

pub use synonyms::*;
pub use types::*;
