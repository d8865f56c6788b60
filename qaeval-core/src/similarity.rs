//! Lexical similarity primitives
//!
//! Everything here is case-insensitive and works on Unicode scalar values, so
//! lengths are character counts rather than byte counts.

use std::collections::{HashMap, HashSet};

/// Shortest key phrase, in words
pub const MIN_PHRASE_WORDS: usize = 2;
/// Longest key phrase, in words
pub const MAX_PHRASE_WORDS: usize = 5;

/// Sequences at least this long get the popular-character heuristic
const POPULAR_MIN_LEN: usize = 200;

/// Options for [`similarity_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityOptions {
    /// Ignore very frequent characters of the second sequence when seeding
    /// matches. A character is "popular" when the sequence has at least 200
    /// characters and it occurs more than `len / 100 + 1` times.
    pub skip_popular: bool,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self { skip_popular: true }
    }
}

/// Matching-block ratio between two strings, ignoring case.
///
/// Returns `2 * M / T` where `M` is the number of characters covered by the
/// greedy longest-common-block alignment and `T` the combined length. Empty
/// input on either side yields 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_with(a, b, SimilarityOptions::default())
}

/// [`similarity`] with explicit options
pub fn similarity_with(a: &str, b: &str, options: SimilarityOptions) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }

    let matched = BlockMatcher::new(&a, &b, options.skip_popular).matched_len();
    2.0 * matched as f64 / total as f64
}

/// Greedy longest-common-block alignment (Ratcliff/Obershelp)
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, ascending
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char], skip_popular: bool) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if skip_popular && b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block `(i, j, size)` inside `a[alo..ahi]` and `b[blo..bhi]`.
    /// Ties go to the block starting earliest in `a`, then in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters never seed a match but may still extend one
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total characters covered by all matching blocks
    fn matched_len(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            matched += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }

        matched
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split text into runs of words separated only by whitespace.
/// Any other non-word character closes the current run.
fn word_runs(text: &str) -> Vec<Vec<String>> {
    let mut runs = Vec::new();
    let mut run: Vec<String> = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if is_word_char(c) {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            run.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() && !run.is_empty() {
            runs.push(std::mem::take(&mut run));
        }
    }

    if !word.is_empty() {
        run.push(word);
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Every 2- to 5-word n-gram of the lowercased text.
///
/// Windows slide one word at a time, so phrases overlap; a phrase never
/// crosses punctuation.
pub fn key_phrases(text: &str) -> HashSet<String> {
    let mut phrases = HashSet::new();
    if text.is_empty() {
        return phrases;
    }

    for run in word_runs(&text.to_lowercase()) {
        for start in 0..run.len() {
            let longest = (start + MAX_PHRASE_WORDS).min(run.len());
            for end in (start + MIN_PHRASE_WORDS)..=longest {
                phrases.insert(run[start..end].join(" "));
            }
        }
    }

    phrases
}

/// Lowercased whitespace-separated tokens
pub fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        assert!(approx(similarity("Master and Margarita", "Master and Margarita"), 1.0));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(approx(similarity("WOLAND", "woland"), 1.0));
    }

    #[test]
    fn test_empty_side_is_zero() {
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        // "abcd" vs "bcde": block "bcd" -> 2 * 3 / 8
        assert!(approx(similarity("abcd", "bcde"), 0.75));
        // "abxcd" vs "abcd": blocks "ab" + "cd" -> 2 * 4 / 9
        assert!(approx(similarity("abxcd", "abcd"), 8.0 / 9.0));
        assert!(approx(similarity("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_greedy_alignment_is_not_lcs() {
        // The longest block "ab" is taken first, which rules out matching
        // the trailing "c" against the leading one.
        let ratio = similarity("cab", "abc");
        assert!(approx(ratio, 2.0 * 2.0 / 6.0));
    }

    #[test]
    fn test_popular_characters_do_not_seed_matches() {
        let a = format!("y{}", "x".repeat(10));
        let b = "x".repeat(250);

        let plain = similarity_with(&a, &b, SimilarityOptions { skip_popular: false });
        let skipped = similarity(&a, &b);

        assert!(approx(plain, 20.0 / 261.0));
        assert_eq!(skipped, 0.0);
    }

    #[test]
    fn test_unicode_lengths_are_characters() {
        assert!(approx(similarity("Воланд", "воланд"), 1.0));
        assert!(approx(similarity("Берлиоз", "Берлиоз!"), 14.0 / 15.0));
    }

    #[test]
    fn test_key_phrases_windows() {
        let phrases = key_phrases("The Master wrote a novel");
        assert!(phrases.contains("the master"));
        assert!(phrases.contains("master wrote a novel"));
        assert!(phrases.contains("the master wrote a novel"));
        assert!(!phrases.contains("the"));
        // 4 two-word + 3 three-word + 2 four-word + 1 five-word
        assert_eq!(phrases.len(), 10);
    }

    #[test]
    fn test_key_phrases_stop_at_punctuation() {
        let phrases = key_phrases("Pontius Pilate. The procurator");
        assert!(phrases.contains("pontius pilate"));
        assert!(phrases.contains("the procurator"));
        assert!(!phrases.contains("pilate the"));
    }

    #[test]
    fn test_key_phrases_edge_cases() {
        assert!(key_phrases("").is_empty());
        assert!(key_phrases("single").is_empty());
        assert_eq!(key_phrases("Foo Bar"), key_phrases("foo bar"));
    }

    #[test]
    fn test_words_lowercases() {
        let w = words("Who  is\tWOLAND?");
        assert!(w.contains("who"));
        assert!(w.contains("woland?"));
        assert_eq!(w.len(), 3);
    }
}
