//! Edit-distance similarity between messages
//!
//! Used by the anti-spam tracker to block near-duplicate messages and
//! commands. Comparison is case-insensitive.

use chatward_core::strip_colors;
use fancy_regex::Regex as FancyRegex;
use regex::Regex;
use std::sync::OnceLock;

fn special_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("static pattern is valid"))
}

fn repeated_runs() -> &'static [FancyRegex; 3] {
    static RE: OnceLock<[FancyRegex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            FancyRegex::new(r"(.)(?=\1\1+)").expect("static pattern is valid"),
            FancyRegex::new(r"(..)(?=\1\1+)").expect("static pattern is valid"),
            FancyRegex::new(r"(...)(?=\1\1+)").expect("static pattern is valid"),
        ]
    })
}

/// Options for [`prepare_for_similarity`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityOptions {
    /// Drop everything except ASCII letters, digits and whitespace
    pub strip_special_chars: bool,

    /// Shorten runs of the same 1, 2 or 3 characters repeated three or more times
    pub strip_duplicate_chars: bool,
}

/// Levenshtein distance between the lower-cased forms of `a` and `b`
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut costs: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = costs[0];
        costs[0] = i + 1;

        for (j, cb) in b.iter().enumerate() {
            let above = costs[j + 1];
            costs[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(costs[j])
            };
            diagonal = above;
        }
    }

    costs[b.len()]
}

/// Similarity of two strings as a percentage in `0..=100`
///
/// Two empty strings are 100% similar.
pub fn similarity(a: &str, b: &str) -> u8 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100;
    }

    let distance = edit_distance(a, b);
    let ratio = (max_len - distance.min(max_len)) as f64 / max_len as f64;

    (100.0 * ratio).round() as u8
}

/// Normalize a message before comparing it with the previous one
pub fn prepare_for_similarity(text: &str, options: SimilarityOptions) -> String {
    let mut prepared = text.to_string();

    if options.strip_special_chars {
        prepared = special_chars().replace_all(&prepared, "").into_owned();
    }

    if options.strip_duplicate_chars {
        for pattern in repeated_runs() {
            if let Ok(stripped) = pattern.try_replacen(&prepared, 0, "") {
                prepared = stripped.into_owned();
            }
        }
    }

    strip_colors(&prepared.to_lowercase()).into_owned()
}

/// Collapse every run of a repeated character into a single character
pub fn strip_duplicate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = None;

    for c in text.chars() {
        if last != Some(c) {
            out.push(c);
        }
        last = Some(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("HeLLo", "hello"), 0);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("hello", "hello"), 100);
        assert_eq!(similarity("", ""), 100);
        assert!(similarity("abc", "xyz") < 40);
        assert_eq!(similarity("abc", ""), 0);
        // 1 edit over 5 characters
        assert_eq!(similarity("hello", "hallo"), 80);
    }

    #[test]
    fn test_prepare_strips_special_chars() {
        let options = SimilarityOptions {
            strip_special_chars: true,
            strip_duplicate_chars: false,
        };
        assert_eq!(prepare_for_similarity("Hello, World!!", options), "hello world");
    }

    #[test]
    fn test_prepare_strips_repeated_runs() {
        let options = SimilarityOptions {
            strip_special_chars: false,
            strip_duplicate_chars: true,
        };
        assert_eq!(prepare_for_similarity("heeeeey", options), "heey");
        assert_eq!(prepare_for_similarity("hahahaha", options), "haha");
    }

    #[test]
    fn test_prepare_strips_colors() {
        assert_eq!(
            prepare_for_similarity("§cRED text", SimilarityOptions::default()),
            "red text"
        );
    }

    #[test]
    fn test_strip_duplicate() {
        assert_eq!(strip_duplicate("hellooo   there"), "helo there");
        assert_eq!(strip_duplicate(""), "");
    }
}
