use crate::analysis::accuracy::{ErrorAnalysis, WordError};
use crate::analysis::tally::ErrorTally;
use serde::{Deserialize, Serialize};

const MOST_COMMON_LIMIT: usize = 10;

/// Lifetime error summary for one user. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorStatistics {
    pub character_errors: ErrorTally,
    pub word_errors: Vec<WordError>,
    pub most_common_errors: ErrorTally,
    pub total_errors: usize,
    pub total_characters: usize,
}

impl ErrorStatistics {
    /// Folds one test's errors into the summary.
    pub fn update(mut self, analysis: &ErrorAnalysis) -> Self {
        self.character_errors.merge(&analysis.character_errors);
        self.word_errors.extend(analysis.word_errors.iter().cloned());
        self.total_errors += analysis.error_count;
        self.total_characters += analysis.total_characters;
        self.most_common_errors = self
            .character_errors
            .top(MOST_COMMON_LIMIT)
            .into_iter()
            .collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.total_characters == 0 && self.character_errors.is_empty()
    }
}
