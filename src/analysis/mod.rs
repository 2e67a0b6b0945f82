//! Typing performance analytics: accuracy, keystroke rhythm, speed
//! prediction, coaching tips and the lifetime error summary.
pub mod accuracy;
pub mod diff;
pub mod error_stats;
pub mod keystroke;
pub mod predictor;
pub mod suggestions;
pub mod tally;

// Re-export the main entry points for convenience
pub use accuracy::{analyze_errors, ErrorAnalysis, WordError};
pub use error_stats::ErrorStatistics;
pub use keystroke::{analyze_keystrokes, KeystrokeAnalysis, KeystrokeReport};
pub use predictor::{predict_current_test, predict_future, FuturePrediction, PredictionStatus};
pub use suggestions::generate_suggestions;
pub use tally::ErrorTally;
