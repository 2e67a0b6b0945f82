use crate::util::round2;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A single key press as reported by the front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeEvent {
    /// Milliseconds on a monotonic clock. Zero means the clock was not running yet.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub key: String,
}

impl KeystrokeEvent {
    pub fn new(timestamp: f64, key: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp),
            key: key.into(),
        }
    }

    /// The timestamp, if one was actually recorded.
    pub fn time(&self) -> Option<f64> {
        self.timestamp.filter(|t| *t != 0.0)
    }
}

/// A completed typing test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSubmission {
    pub original_text: String,
    pub typed_text: String,
    /// Seconds.
    pub time_taken: f64,
    #[serde(default)]
    pub keystroke_data: Vec<KeystrokeEvent>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A test still in progress, used for live speed prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSubmission {
    pub partial_text: String,
    /// Seconds.
    pub time_elapsed: f64,
    #[serde(default)]
    pub keystroke_data: Vec<KeystrokeEvent>,
}

/// Words per minute using the standard five-characters-per-word convention.
pub fn calculate_wpm(typed_text: &str, time_taken_seconds: f64) -> f64 {
    if time_taken_seconds <= 0.0 {
        return 0.0;
    }

    let minutes = time_taken_seconds / 60.0;
    let char_count = typed_text.chars().count() as f64;

    round2((char_count / 5.0) / minutes)
}
