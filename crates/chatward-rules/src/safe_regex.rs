//! Case-insensitive regex matching with a cooperative time budget
//!
//! Rule patterns are written by server operators and matched against text
//! written by players, so a bad pattern must never take the server down.
//! [`SafeRegex`] strips formatting codes from pattern and text, compiles the
//! pattern case-insensitively (caching the result), and checks a deadline:
//! after compiling, between successive matches, and once matching finishes.
//! The backtracking engine is additionally bounded by its backtrack limit.
//!
//! The guard is cooperative: a pattern stuck inside a single match still
//! holds its thread until the engine returns or hits the backtrack limit.
//!
//! Replacement can instead keep the text's color codes, or run the pattern
//! case-sensitively on the text as written; see [`ReplaceMode`].
//!
//! Faults are reported (framed warning, audit entry, metric) and the caller
//! gets a fail-open answer: no match, or the text unchanged.

use crate::regex_engine::CompiledRegex;
use chatward_core::strip_colors;
use chatward_telemetry::{AuditEntry, AuditKind, AuditSink, MetricsCollector};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

const FRAME: &str = "*----------------------------------------------*";

/// Why a regex operation was abandoned
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegexFault {
    /// The deadline passed
    #[error("regex timed out after {0:?}")]
    Timeout(Duration),

    /// The pattern does not compile
    #[error("malformed regex: {0}")]
    Syntax(String),

    /// The backtracking engine gave up (backtrack limit and similar)
    #[error("regex failed while matching: {0}")]
    Runtime(String),
}

impl RegexFault {
    fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Syntax(_) => "syntax",
            Self::Runtime(_) => "runtime",
        }
    }
}

struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    fn check(&self) -> Result<(), RegexFault> {
        let elapsed = self.start.elapsed();
        if elapsed >= self.budget {
            Err(RegexFault::Timeout(elapsed))
        } else {
            Ok(())
        }
    }
}

/// How [`SafeRegex::replace`] treats pattern and text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Case-insensitive, color codes stripped from pattern and text
    Normalized,
    /// Case-insensitive, color codes stripped from the pattern only
    KeepColors,
    /// Case-sensitive, pattern and text used as written
    Exact,
}

/// Guarded regex matcher shared by every rule of an engine
pub struct SafeRegex {
    timeout: Duration,
    backtrack_limit: usize,
    cache: Mutex<HashMap<String, Arc<CompiledRegex>>>,
    audit: Arc<dyn AuditSink>,
    metrics: MetricsCollector,
}

impl SafeRegex {
    pub fn new(
        timeout: Duration,
        backtrack_limit: usize,
        audit: Arc<dyn AuditSink>,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            timeout,
            backtrack_limit,
            cache: Mutex::new(HashMap::new()),
            audit,
            metrics,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of compiled patterns held
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drop every compiled pattern
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Compile `source` as given, reusing an earlier compilation
    fn compile(&self, source: &str) -> Result<Arc<CompiledRegex>, RegexFault> {
        if let Some(compiled) = self.cache.lock().get(source) {
            return Ok(Arc::clone(compiled));
        }

        let compiled = CompiledRegex::new(source, self.backtrack_limit)
            .map(Arc::new)
            .map_err(RegexFault::Syntax)?;

        self.cache
            .lock()
            .insert(source.to_string(), Arc::clone(&compiled));

        Ok(compiled)
    }

    /// Test whether `pattern` matches anywhere in `text`, surfacing faults
    pub fn try_is_match(&self, pattern: &str, text: &str) -> Result<bool, RegexFault> {
        let deadline = Deadline::new(self.timeout);
        let source = format!("(?i){}", strip_colors(pattern));
        let text = strip_colors(text);

        let compiled = self.compile(&source)?;
        deadline.check()?;

        let matched = compiled
            .is_match(&text)
            .map_err(|e| RegexFault::Runtime(e.to_string()))?;
        deadline.check()?;

        Ok(matched)
    }

    /// Replace every match of `pattern` in color-stripped `text`, surfacing faults
    ///
    /// `replacement` may reference capture groups as `$1` or `${name}`.
    pub fn try_replace_all(
        &self,
        pattern: &str,
        text: &str,
        replacement: &str,
    ) -> Result<String, RegexFault> {
        self.try_replace(pattern, text, replacement, ReplaceMode::Normalized)
    }

    /// Replace every match of `pattern` in `text` under the given mode, surfacing faults
    pub fn try_replace(
        &self,
        pattern: &str,
        text: &str,
        replacement: &str,
        mode: ReplaceMode,
    ) -> Result<String, RegexFault> {
        let deadline = Deadline::new(self.timeout);
        let (source, text) = match mode {
            ReplaceMode::Normalized => (format!("(?i){}", strip_colors(pattern)), strip_colors(text)),
            ReplaceMode::KeepColors => (format!("(?i){}", strip_colors(pattern)), Cow::Borrowed(text)),
            ReplaceMode::Exact => (pattern.to_string(), Cow::Borrowed(text)),
        };

        let compiled = self.compile(&source)?;
        deadline.check()?;

        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        match compiled.as_ref() {
            CompiledRegex::Linear(re) => {
                for caps in re.captures_iter(&text) {
                    deadline.check()?;
                    let Some(whole) = caps.get(0) else { continue };

                    out.push_str(&text[last..whole.start()]);
                    caps.expand(replacement, &mut out);
                    last = whole.end();
                }
            }
            CompiledRegex::Backtracking(re) => {
                let expander = fancy_regex::Expander::default();

                for caps in re.captures_iter(&text) {
                    deadline.check()?;
                    let caps = caps.map_err(|e| RegexFault::Runtime(e.to_string()))?;
                    let Some(whole) = caps.get(0) else { continue };

                    out.push_str(&text[last..whole.start()]);
                    expander.append_expansion(&mut out, replacement, &caps);
                    last = whole.end();
                }
            }
        }

        out.push_str(&text[last..]);
        deadline.check()?;

        Ok(out)
    }

    /// Test whether `pattern` matches anywhere in `text`
    ///
    /// Any fault is reported and treated as no match.
    pub fn is_match(&self, pattern: &str, text: &str) -> bool {
        match self.try_is_match(pattern, text) {
            Ok(matched) => matched,
            Err(fault) => {
                self.report(&fault, pattern, text);
                false
            }
        }
    }

    /// Replace every match of `pattern` in color-stripped `text`
    ///
    /// Any fault is reported and `text` is returned unchanged.
    pub fn replace_all(&self, pattern: &str, text: &str, replacement: &str) -> String {
        self.replace(pattern, text, replacement, ReplaceMode::Normalized)
    }

    /// Replace every match of `pattern` in `text` under the given mode
    ///
    /// Any fault is reported and `text` is returned unchanged.
    pub fn replace(&self, pattern: &str, text: &str, replacement: &str, mode: ReplaceMode) -> String {
        match self.try_replace(pattern, text, replacement, mode) {
            Ok(replaced) => replaced,
            Err(fault) => {
                self.report(&fault, pattern, text);
                text.to_string()
            }
        }
    }

    fn report(&self, fault: &RegexFault, pattern: &str, text: &str) {
        self.metrics.record_regex_fault(fault.label());

        let (kind, headline, audit_message) = match fault {
            RegexFault::Syntax(reason) => (
                AuditKind::MalformedRegex,
                format!("Malformed regex: '{}'", pattern),
                format!("Malformed regex: {}\nRegex: {}", reason, pattern),
            ),
            RegexFault::Timeout(_) | RegexFault::Runtime(_) => (
                AuditKind::RegexTimeout,
                format!("Regex timed out after {}ms!", self.timeout.as_millis()),
                format!(
                    "Regex check timed out (bad regex?)!\nString checked: {}\nRegex: {}",
                    text, pattern
                ),
            ),
        };

        warn!("{}", FRAME);
        warn!(fault = %fault, "{}", headline);
        warn!("REG EX: {}", pattern);
        warn!("STRING: {}", text);
        warn!("{}", FRAME);

        self.audit.record(AuditEntry::new(kind, audit_message));
    }
}
