//! Validation check records and score aggregation.
//!
//! Checks are appended in a fixed, protocol-defined order and never mutated
//! afterwards; the order is both the display order and the scoring order.

use serde::Serialize;
use std::fmt;

/// Outcome code for a single validation check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckCode {
    /// The check passed.
    Pass,
    /// The check passed with reservations.
    Warn,
    /// The check failed.
    Fail,
}

impl CheckCode {
    /// Get the code as the lowercase wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }

    /// Points awarded toward the score.
    fn points(&self) -> u32 {
        match self {
            Self::Pass => 2,
            Self::Warn => 1,
            Self::Fail => 0,
        }
    }
}

impl fmt::Display for CheckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional detail attached to a check: nothing, a single line, or an
/// ordered list of lines.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckMessage {
    /// No detail.
    None,
    /// A single human-readable line.
    Text(String),
    /// An ordered list of lines (e.g. aggregated schema violations).
    List(Vec<String>),
}

impl CheckMessage {
    /// Returns true when no detail is attached.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<&str> for CheckMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CheckMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for CheckMessage {
    fn from(lines: Vec<String>) -> Self {
        Self::List(lines)
    }
}

/// One recorded validation outcome.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationCheck {
    /// What was checked, e.g. `Header Check / Cache-Control`.
    pub label: String,
    /// The observed value (header value, address, status code, ...).
    pub value: String,
    /// Pass/warn/fail outcome.
    pub code: CheckCode,
    /// Optional detail explaining the outcome.
    pub message: CheckMessage,
}

impl ValidationCheck {
    /// Create a passing check with no message.
    pub fn pass(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, CheckCode::Pass)
    }

    /// Create a failing check with no message.
    pub fn fail(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, CheckCode::Fail)
    }

    /// Create a check with the given code and no message.
    pub fn new(label: impl Into<String>, value: impl Into<String>, code: CheckCode) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            code,
            message: CheckMessage::None,
        }
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<CheckMessage>) -> Self {
        self.message = message.into();
        self
    }
}

/// Reduce a check list into a percentage score.
///
/// Pass counts 2 points, warn 1, fail 0; the result is
/// `round(100 * points / (2 * checks), 2)`. The denominator is the number
/// of checks actually recorded, so scores are only comparable between
/// structurally similar responses. An empty list scores 0.
pub fn aggregate_score(checks: &[ValidationCheck]) -> f64 {
    if checks.is_empty() {
        return 0.0;
    }

    let points: u32 = checks.iter().map(|check| check.code.points()).sum();
    let raw = f64::from(points) / (checks.len() as f64 * 2.0) * 100.0;
    (raw * 100.0).round() / 100.0
}
