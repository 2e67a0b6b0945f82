use crate::analysis::diff::{CharMatcher, Tag};
use crate::analysis::tally::{deletion_key, insertion_key, substitution_key, ErrorTally};
use crate::util::round2;
use serde::{Deserialize, Serialize};

const COMMON_ERROR_LIMIT: usize = 5;

/// A word that was typed differently from the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordError {
    pub original: String,
    pub typed: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub accuracy: f64,
    pub error_count: usize,
    pub word_errors: Vec<WordError>,
    pub character_errors: ErrorTally,
    /// Top entries of `character_errors`, highest count first.
    pub common_errors: Vec<(String, u32)>,
    pub total_characters: usize,
}

/// Compares the typed text with the original word by word and classifies
/// every character-level difference.
///
/// Words are paired by position; words past the end of the shorter list are
/// only counted, never diffed. Accuracy is measured against the character
/// length of the whole original text.
pub fn analyze_errors(original_text: &str, typed_text: &str) -> ErrorAnalysis {
    let original_words: Vec<&str> = original_text.split_whitespace().collect();
    let typed_words: Vec<&str> = typed_text.split_whitespace().collect();

    let total_characters = original_text.chars().count();
    let mut error_count = 0;
    let mut word_errors = Vec::new();
    let mut character_errors = ErrorTally::new();

    for (position, (orig_word, typed_word)) in original_words.iter().zip(&typed_words).enumerate() {
        if orig_word == typed_word {
            continue;
        }

        word_errors.push(WordError {
            original: orig_word.to_string(),
            typed: typed_word.to_string(),
            position,
        });
        error_count += tally_word(orig_word, typed_word, &mut character_errors);
    }

    error_count += original_words.len().abs_diff(typed_words.len());

    let accuracy = (1.0 - error_count as f64 / total_characters.max(1) as f64) * 100.0;
    let common_errors = character_errors.top(COMMON_ERROR_LIMIT);

    ErrorAnalysis {
        accuracy: round2(accuracy.max(0.0)),
        error_count,
        word_errors,
        character_errors,
        common_errors,
        total_characters,
    }
}

/// Tallies the character errors of one mismatched word pair and returns how
/// many errors the pair contributes.
///
/// A replace span pairs characters position by position; when the spans
/// differ in length the surplus characters are not tallied, though they
/// still count towards the returned error total.
fn tally_word(original: &str, typed: &str, tally: &mut ErrorTally) -> usize {
    let a: Vec<char> = original.chars().collect();
    let b: Vec<char> = typed.chars().collect();
    let mut errors = 0;

    for op in CharMatcher::new(&a, &b).opcodes() {
        match op.tag {
            Tag::Equal => continue,
            Tag::Replace => {
                for (o, t) in a[op.a_start..op.a_end].iter().zip(&b[op.b_start..op.b_end]) {
                    tally.increment(&substitution_key(*o, *t));
                }
            }
            Tag::Delete => {
                for o in &a[op.a_start..op.a_end] {
                    tally.increment(&deletion_key(*o));
                }
            }
            Tag::Insert => {
                for t in &b[op.b_start..op.b_end] {
                    tally.increment(&insertion_key(*t));
                }
            }
        }
        errors += op.span();
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_is_perfect() {
        let analysis = analyze_errors("hello world", "hello world");

        assert_eq!(analysis.accuracy, 100.0);
        assert_eq!(analysis.error_count, 0);
        assert!(analysis.word_errors.is_empty());
        assert!(analysis.character_errors.is_empty());
        assert_eq!(analysis.total_characters, 11);
    }

    #[test]
    fn test_empty_text_floors_denominator() {
        let analysis = analyze_errors("", "");

        assert_eq!(analysis.accuracy, 100.0);
        assert_eq!(analysis.error_count, 0);
        assert_eq!(analysis.total_characters, 0);
    }

    #[test]
    fn test_single_substitution_scenario() {
        let analysis = analyze_errors("the cat sat", "the cat sit");

        assert_eq!(
            analysis.word_errors,
            vec![WordError {
                original: "sat".into(),
                typed: "sit".into(),
                position: 2,
            }]
        );
        assert_eq!(analysis.character_errors.get("a->i"), Some(1));
        assert_eq!(analysis.character_errors.len(), 1);
        assert_eq!(analysis.error_count, 1);
        assert_eq!(analysis.accuracy, 90.91);
        assert_eq!(analysis.common_errors, vec![("a->i".to_string(), 1)]);
    }

    #[test]
    fn test_deletion_and_insertion_keys() {
        let analysis = analyze_errors("cart bat", "cat baat");

        assert_eq!(analysis.character_errors.get("r->∅"), Some(1));
        assert_eq!(analysis.character_errors.get("∅->a"), Some(1));
        assert_eq!(analysis.error_count, 2);
    }

    #[test]
    fn test_uneven_replace_tallies_only_pairs() {
        // "abc" -> "xy" is one replace of three against two characters
        let analysis = analyze_errors("abc", "xy");

        assert_eq!(analysis.character_errors.get("a->x"), Some(1));
        assert_eq!(analysis.character_errors.get("b->y"), Some(1));
        assert_eq!(analysis.character_errors.get("c->∅"), None);
        assert_eq!(analysis.character_errors.len(), 2);
        assert_eq!(analysis.error_count, 3);
        assert_eq!(analysis.accuracy, 0.0);
    }

    #[test]
    fn test_missing_words_counted_once_each() {
        let analysis = analyze_errors("one two three four", "one two");

        assert_eq!(analysis.error_count, 2);
        assert!(analysis.word_errors.is_empty());
        assert!(analysis.character_errors.is_empty());
        assert_eq!(analysis.accuracy, round2((1.0 - 2.0 / 18.0) * 100.0));
    }

    #[test]
    fn test_extra_typed_words_counted() {
        let analysis = analyze_errors("one", "one more words");
        assert_eq!(analysis.error_count, 2);
    }

    #[test]
    fn test_accuracy_never_negative() {
        let analysis = analyze_errors("ab", "xyzxyz qq rr ss");
        assert_eq!(analysis.accuracy, 0.0);
    }

    #[test]
    fn test_common_errors_capped_and_sorted() {
        let analysis = analyze_errors("abcdefg abcdefg", "hijklmn hijklmn");

        assert_eq!(analysis.common_errors.len(), 5);
        assert!(analysis
            .common_errors
            .windows(2)
            .all(|pair| pair[0].1 >= pair[1].1));
        // all counts tie at 2, so the first-seen keys win
        assert_eq!(analysis.common_errors[0], ("a->h".to_string(), 2));
        assert_eq!(analysis.common_errors[4], ("e->l".to_string(), 2));
    }

    #[test]
    fn test_whitespace_runs_are_word_separators() {
        let analysis = analyze_errors("the  cat\tsat", "the cat sat");
        assert_eq!(analysis.error_count, 0);
        assert_eq!(analysis.total_characters, 12);
    }
}
