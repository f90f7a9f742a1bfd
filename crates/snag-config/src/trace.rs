//! Trace capture configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How much of the call stack to record when a trace is attached to an error.
///
/// The caller location is recorded in every mode; the mode only governs the
/// full backtrace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktraceMode {
    /// Follow `RUST_LIB_BACKTRACE` / `RUST_BACKTRACE`, like `Backtrace::capture`.
    #[default]
    Auto,
    /// Always capture, regardless of the environment.
    Always,
    /// Never capture; traces carry the location only.
    Never,
}

impl BacktraceMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for BacktraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TraceConfig {
    /// Backtrace capture policy for newly attached traces.
    #[serde(default)]
    pub backtrace: BacktraceMode,
}
