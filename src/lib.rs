// Library surface for the CLI and integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod analysis;
pub mod app_dirs;
pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod session;
pub mod stats;
pub mod time_series;
pub mod trainer;
pub mod util;

pub use error::{TmResult, TypemasterError};
pub use session::{Difficulty, KeystrokeEvent, PartialSubmission, TestSubmission};
pub use trainer::{MidTestPrediction, Progress, TestReport, Trainer};
