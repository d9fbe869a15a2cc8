pub mod cli;
pub mod convert;
pub mod error;
pub mod naming;
pub mod run;
pub mod sample;
pub mod stats;
pub mod stream;
pub mod types;

// Re-export commonly used items
pub use error::RescaleError;
pub use run::{RunConfig, RunSummary, run};
pub use sample::{Sample, SampleKind};
