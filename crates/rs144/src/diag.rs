use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

/**
 * Diagnostics emitted while decoding a packet.
 *
 * The decoder never fails: a malformed field leaves its slot empty and
 * reports what was wrong through a [`DiagSink`]. Three severities cover
 * the taxonomy:
 *
 * | Severity  | Meaning                                                  |
 * | --------- | -------------------------------------------------------- |
 * | `Error`   | malformed field, the value could not be extracted        |
 * | `Warning` | the value was extracted but deviates from the APRS spec  |
 * | `Hint`    | a suggestion about non-standard spellings in the comment |
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Error => "error",
                Self::Warning => "warning",
                Self::Hint => "hint",
            }
        )
    }
}

/// Where decode diagnostics go. Tests inject a [`CaptureSink`]; quiet
/// operation is a [`NullSink`], not a flag on the decoded record.
pub trait DiagSink {
    fn report(&mut self, severity: Severity, message: String);
}

/// Forwards diagnostics to the `tracing` subscriber.
pub struct LogSink;

impl DiagSink for LogSink {
    fn report(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Error | Severity::Warning => warn!("{message}"),
            Severity::Hint => info!("{message}"),
        }
    }
}

/// Swallows everything (the `quiet` mode).
pub struct NullSink;

impl DiagSink for NullSink {
    fn report(&mut self, _severity: Severity, _message: String) {}
}

/// Collects diagnostics for later inspection.
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub messages: Vec<(Severity, String)>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any collected message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.contains(needle))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|(s, _)| *s == severity).count()
    }
}

impl DiagSink for CaptureSink {
    fn report(&mut self, severity: Severity, message: String) {
        self.messages.push((severity, message));
    }
}
