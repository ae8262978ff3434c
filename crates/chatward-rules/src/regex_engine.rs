//! Dual regex engine for rule patterns
//!
//! Most rule patterns are plain alternations and character classes that the
//! linear-time `regex` crate handles. Patterns using lookaround, backreferences,
//! atomic groups or possessive quantifiers fall back to `fancy_regex`, whose
//! backtracking is bounded by a configurable backtrack limit.

/// Error produced by the backtracking engine at match time
pub type BacktrackingError = fancy_regex::Error;

/// A compiled regex that auto-selects between linear-time and backtracking engines
#[derive(Debug)]
pub enum CompiledRegex {
    /// Linear-time regex (no lookaround, no backreferences)
    Linear(regex::Regex),
    /// Backtracking regex
    Backtracking(fancy_regex::Regex),
}

impl CompiledRegex {
    /// Compile a pattern, auto-selecting the appropriate engine
    pub fn new(pattern: &str, backtrack_limit: usize) -> Result<Self, String> {
        if needs_backtracking_engine(pattern) {
            fancy_regex::RegexBuilder::new(pattern)
                .backtrack_limit(backtrack_limit)
                .build()
                .map(Self::Backtracking)
                .map_err(|e| e.to_string())
        } else {
            regex::Regex::new(pattern)
                .map(Self::Linear)
                .map_err(|e| e.to_string())
        }
    }

    /// Check if the pattern matches anywhere in `text`
    pub fn is_match(&self, text: &str) -> Result<bool, BacktrackingError> {
        match self {
            Self::Linear(re) => Ok(re.is_match(text)),
            Self::Backtracking(re) => re.is_match(text),
        }
    }

    /// Whether the backtracking engine was selected
    #[cfg(test)]
    const fn uses_backtracking(&self) -> bool {
        matches!(self, Self::Backtracking(_))
    }
}

/// Check if a pattern requires the backtracking engine
///
/// This is a syntactic heuristic. False positives only cost speed.
pub fn needs_backtracking_engine(pattern: &str) -> bool {
    if pattern.contains("(?=")
        || pattern.contains("(?!")
        || pattern.contains("(?<=")
        || pattern.contains("(?<!")
        || pattern.contains("(?>")
    {
        return true;
    }

    if pattern.contains("*+")
        || pattern.contains("++")
        || pattern.contains("?+")
        || pattern.contains("}+")
    {
        return true;
    }

    // Backreferences \1 through \9
    pattern
        .as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'\\' && matches!(pair[1], b'1'..=b'9'))
}
