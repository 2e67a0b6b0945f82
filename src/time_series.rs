use serde::{Deserialize, Serialize};

/// One finished test on the user's speed timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WpmPoint {
    /// RFC 3339 timestamp of the test.
    pub timestamp: String,
    pub wpm: f64,
}

impl WpmPoint {
    pub fn new(timestamp: impl Into<String>, wpm: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            wpm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyPoint {
    pub timestamp: String,
    pub accuracy: f64,
}

impl AccuracyPoint {
    pub fn new(timestamp: impl Into<String>, accuracy: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            accuracy,
        }
    }
}

pub fn wpm_values(history: &[WpmPoint]) -> Vec<f64> {
    history.iter().map(|p| p.wpm).collect()
}
