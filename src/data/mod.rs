//! Data sources: the seeded sample generator used by `fitclean sample` and the tests.

pub mod sample;

pub use sample::{SampleConfig, SampleData, SampleSummary, generate_sample};
