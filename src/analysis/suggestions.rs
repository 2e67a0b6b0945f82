use crate::analysis::accuracy::ErrorAnalysis;
use crate::analysis::error_stats::ErrorStatistics;
use crate::analysis::keystroke::KeystrokeReport;
use crate::analysis::tally::{split_key, MISSING};
use itertools::Itertools;

const HISTORICAL_MISTAKES: usize = 3;
const ACCURACY_TARGET: f64 = 95.0;
const ACCURACY_FLOOR: f64 = 85.0;
const MIN_SPECIFIC_SUGGESTIONS: usize = 2;

pub const ACCURACY_TIP: &str = "Focus on accuracy over speed - slow down and type correctly";
pub const EASIER_TEXTS_TIP: &str = "Consider practicing with easier texts until accuracy improves";
pub const TOUCH_TYPING_TIP: &str = "Practice touch typing to avoid looking at the keyboard";
pub const BREAKS_TIP: &str = "Take breaks to prevent fatigue during long typing sessions";

/// Turns the analyses of one test plus the user's history into coaching tips.
pub fn generate_suggestions(
    errors: &ErrorAnalysis,
    keystrokes: &KeystrokeReport,
    statistics: &ErrorStatistics,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(tip) = practice_keys(errors) {
        suggestions.push(tip);
    }

    let slow_keys = keystrokes.slow_keys();
    if !slow_keys.is_empty() {
        suggestions.push(format!("Work on speed for keys: {}", slow_keys.join(", ")));
    }

    if errors.accuracy < ACCURACY_TARGET {
        suggestions.push(ACCURACY_TIP.to_string());
    } else if errors.accuracy < ACCURACY_FLOOR {
        suggestions.push(EASIER_TEXTS_TIP.to_string());
    }

    if let Some(tip) = historical_mistakes(statistics) {
        suggestions.push(tip);
    }

    if suggestions.len() < MIN_SPECIFIC_SUGGESTIONS {
        suggestions.push(TOUCH_TYPING_TIP.to_string());
        suggestions.push(BREAKS_TIP.to_string());
    }

    suggestions
}

fn practice_keys(errors: &ErrorAnalysis) -> Option<String> {
    if errors.character_errors.is_empty() {
        return None;
    }

    let missing = MISSING.to_string();
    let keys = errors
        .common_errors
        .iter()
        .filter_map(|(key, _)| split_key(key))
        .map(|(original, _)| original)
        .filter(|original| *original != missing)
        .unique()
        .collect::<Vec<_>>();

    (!keys.is_empty()).then(|| format!("Practice keys: {}", keys.join(", ")))
}

fn historical_mistakes(statistics: &ErrorStatistics) -> Option<String> {
    let readable = statistics
        .most_common_errors
        .keys()
        .take(HISTORICAL_MISTAKES)
        .filter_map(describe_mistake)
        .collect::<Vec<_>>();

    (!readable.is_empty()).then(|| format!("Common mistakes to watch for: {}", readable.join(", ")))
}

/// Reads an error key like `a->i` as a phrase.
pub fn describe_mistake(key: &str) -> Option<String> {
    let (original, typed) = split_key(key)?;
    let missing = MISSING.to_string();

    Some(if original == missing {
        format!("adding '{typed}'")
    } else if typed == missing {
        format!("missing '{original}'")
    } else {
        format!("typing '{typed}' instead of '{original}'")
    })
}
