//! `fit-cleaner` library crate.
//!
//! The binary (`fitclean`) is a thin wrapper around this library so that:
//!
//! - the cleaning pipeline is testable without spawning processes
//! - the normalizer and session can be embedded by other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod normalize;
pub mod plot;
pub mod report;
pub mod session;
pub mod tui;
