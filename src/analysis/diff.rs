use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One edit step turning `a[a_start..a_end]` into `b[b_start..b_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: Tag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

impl Opcode {
    fn new(tag: Tag, a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> Self {
        Self {
            tag,
            a_start,
            a_end,
            b_start,
            b_end,
        }
    }

    /// Size of the larger side of the edit.
    pub fn span(&self) -> usize {
        (self.a_end - self.a_start).max(self.b_end - self.b_start)
    }
}

/// A run of `len` equal characters starting at `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a: usize,
    b: usize,
    len: usize,
}

/// Aligns two character sequences by repeatedly taking the longest common
/// block and recursing on both sides of it.
pub struct CharMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> CharMatcher<'a> {
    pub fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b_index.entry(*c).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// Longest block inside `a[alo..ahi]` / `b[blo..bhi]`; the earliest one
    /// in `a` wins ties, then the earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let mut best = Block {
            a: alo,
            b: blo,
            len: 0,
        };
        // run length of the match ending at b[j], for the previous row of a
        let mut lengths: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_lengths = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_lengths.insert(j, k);
                    if k > best.len {
                        best = Block {
                            a: i + 1 - k,
                            b: j + 1 - k,
                            len: k,
                        };
                    }
                }
            }
            lengths = next_lengths;
        }

        best
    }

    fn matching_blocks(&self) -> Vec<Block> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut found = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }
            found.push(block);
            if alo < block.a && blo < block.b {
                pending.push((alo, block.a, blo, block.b));
            }
            if block.a + block.len < ahi && block.b + block.len < bhi {
                pending.push((block.a + block.len, ahi, block.b + block.len, bhi));
            }
        }
        found.sort_by_key(|block| (block.a, block.b));

        // fuse blocks that touch on both sides
        let mut merged: Vec<Block> = Vec::with_capacity(found.len() + 1);
        for block in found {
            match merged.last_mut() {
                Some(last) if last.a + last.len == block.a && last.b + last.len == block.b => {
                    last.len += block.len;
                }
                _ => merged.push(block),
            }
        }
        merged.push(Block {
            a: self.a.len(),
            b: self.b.len(),
            len: 0,
        });

        merged
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut i = 0;
        let mut j = 0;
        let mut codes = Vec::new();

        for block in self.matching_blocks() {
            let tag = match (i < block.a, j < block.b) {
                (true, true) => Some(Tag::Replace),
                (true, false) => Some(Tag::Delete),
                (false, true) => Some(Tag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                codes.push(Opcode::new(tag, i, block.a, j, block.b));
            }
            i = block.a + block.len;
            j = block.b + block.len;
            if block.len > 0 {
                codes.push(Opcode::new(Tag::Equal, block.a, i, block.b, j));
            }
        }

        codes
    }
}

/// Convenience wrapper over [`CharMatcher`] for two strings.
pub fn char_opcodes(original: &str, typed: &str) -> Vec<Opcode> {
    let a: Vec<char> = original.chars().collect();
    let b: Vec<char> = typed.chars().collect();
    CharMatcher::new(&a, &b).opcodes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(original: &str, typed: &str) -> Vec<Tag> {
        char_opcodes(original, typed).iter().map(|o| o.tag).collect()
    }

    #[test]
    fn test_identical_words() {
        assert_eq!(
            char_opcodes("cat", "cat"),
            vec![Opcode::new(Tag::Equal, 0, 3, 0, 3)]
        );
    }

    #[test]
    fn test_single_substitution() {
        assert_eq!(
            char_opcodes("sat", "sit"),
            vec![
                Opcode::new(Tag::Equal, 0, 1, 0, 1),
                Opcode::new(Tag::Replace, 1, 2, 1, 2),
                Opcode::new(Tag::Equal, 2, 3, 2, 3),
            ]
        );
    }

    #[test]
    fn test_missing_character() {
        assert_eq!(tags("cart", "cat"), vec![Tag::Equal, Tag::Delete, Tag::Equal]);
        let delete = char_opcodes("cart", "cat")[1];
        assert_eq!((delete.a_start, delete.a_end), (2, 3));
    }

    #[test]
    fn test_extra_character() {
        assert_eq!(tags("cat", "caat"), vec![Tag::Equal, Tag::Insert, Tag::Equal]);
    }

    #[test]
    fn test_nothing_in_common() {
        let codes = char_opcodes("abc", "xy");
        assert_eq!(codes, vec![Opcode::new(Tag::Replace, 0, 3, 0, 2)]);
        assert_eq!(codes[0].span(), 3);
    }

    #[test]
    fn test_empty_sides() {
        assert_eq!(char_opcodes("", ""), vec![]);
        assert_eq!(
            char_opcodes("ab", ""),
            vec![Opcode::new(Tag::Delete, 0, 2, 0, 0)]
        );
        assert_eq!(
            char_opcodes("", "ab"),
            vec![Opcode::new(Tag::Insert, 0, 0, 0, 2)]
        );
    }

    #[test]
    fn test_prefers_earliest_longest_block() {
        // "ab" appears twice in the typed word; the first occurrence is used
        let codes = char_opcodes("ab", "abab");
        assert_eq!(
            codes,
            vec![
                Opcode::new(Tag::Equal, 0, 2, 0, 2),
                Opcode::new(Tag::Insert, 2, 2, 2, 4),
            ]
        );
    }
}
