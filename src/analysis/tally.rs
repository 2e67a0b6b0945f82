use itertools::Itertools;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder for the missing side of an insertion or deletion.
pub const MISSING: char = '∅';

/// Key for a substitution, e.g. `a->i`.
pub fn substitution_key(original: char, typed: char) -> String {
    format!("{original}->{typed}")
}

/// Key for a character that was left out.
pub fn deletion_key(original: char) -> String {
    format!("{original}->{MISSING}")
}

/// Key for a character that was typed but not expected.
pub fn insertion_key(typed: char) -> String {
    format!("{MISSING}->{typed}")
}

/// Splits an error key back into its original and typed halves.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let mut parts = key.split("->");
    match (parts.next(), parts.next(), parts.next()) {
        (Some(original), Some(typed), None) => Some((original, typed)),
        _ => None,
    }
}

/// Error key counts that remember the order in which keys first appeared.
///
/// Rankings built from a tally sort by count with a stable sort, so the key
/// seen first wins a tie. Serializes as a JSON object in insertion order and
/// deserializes in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTally {
    entries: Vec<(String, u32)>,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, count: u32) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing += count,
            None => self.entries.push((key.to_string(), count)),
        }
    }

    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    /// Adds every count of `other`, appending its unseen keys in its order.
    pub fn merge(&mut self, other: &ErrorTally) {
        for (key, count) in other.iter() {
            self.add(key, count);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most frequent keys, highest count first.
    pub fn top(&self, n: usize) -> Vec<(String, u32)> {
        self.entries
            .iter()
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .take(n)
            .cloned()
            .collect()
    }
}

impl FromIterator<(String, u32)> for ErrorTally {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut tally = ErrorTally::new();
        for (key, count) in iter {
            tally.add(&key, count);
        }
        tally
    }
}

impl Serialize for ErrorTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

struct TallyVisitor;

impl<'de> Visitor<'de> for TallyVisitor {
    type Value = ErrorTally;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of error keys to counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut tally = ErrorTally::new();
        while let Some((key, count)) = access.next_entry::<String, u32>()? {
            tally.add(&key, count);
        }
        Ok(tally)
    }
}

impl<'de> Deserialize<'de> for ErrorTally {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TallyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_forms() {
        assert_eq!(substitution_key('a', 'i'), "a->i");
        assert_eq!(deletion_key('t'), "t->∅");
        assert_eq!(insertion_key('x'), "∅->x");
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a->i"), Some(("a", "i")));
        assert_eq!(split_key("∅->x"), Some(("∅", "x")));
        assert_eq!(split_key("garbage"), None);
    }

    #[test]
    fn test_add_accumulates() {
        let mut tally = ErrorTally::new();
        tally.increment("a->b");
        tally.add("a->b", 2);
        tally.increment("c->d");

        assert_eq!(tally.get("a->b"), Some(3));
        assert_eq!(tally.get("c->d"), Some(1));
        assert_eq!(tally.get("x->y"), None);
        assert_eq!(tally.len(), 2);
    }

    #[test]
    fn test_top_breaks_ties_by_first_seen() {
        let mut tally = ErrorTally::new();
        tally.add("z->a", 1);
        tally.add("b->c", 2);
        tally.add("a->z", 1);
        tally.add("m->n", 2);

        let top = tally.top(3);
        assert_eq!(
            top,
            vec![
                ("b->c".to_string(), 2),
                ("m->n".to_string(), 2),
                ("z->a".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_merge_appends_new_keys_in_order() {
        let mut left: ErrorTally = vec![("a->b".to_string(), 1)].into_iter().collect();
        let right: ErrorTally = vec![("c->d".to_string(), 4), ("a->b".to_string(), 2)]
            .into_iter()
            .collect();
        left.merge(&right);

        let keys: Vec<&str> = left.keys().collect();
        assert_eq!(keys, vec!["a->b", "c->d"]);
        assert_eq!(left.get("a->b"), Some(3));
    }

    #[test]
    fn test_json_keeps_document_order() {
        let json = r#"{"z->a": 1, "a->z": 1, "m->m": 5}"#;
        let tally: ErrorTally = serde_json::from_str(json).unwrap();

        let keys: Vec<&str> = tally.keys().collect();
        assert_eq!(keys, vec!["z->a", "a->z", "m->m"]);
        assert_eq!(
            serde_json::to_string(&tally).unwrap(),
            r#"{"z->a":1,"a->z":1,"m->m":5}"#
        );
    }
}
