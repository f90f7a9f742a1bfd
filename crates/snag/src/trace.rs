//! Call-site traces attached to errors when they start unwinding.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, OnceLock};

use snag_config::{BacktraceMode, SnagConfig};

static CONFIG: OnceLock<SnagConfig> = OnceLock::new();

/// Install the process-wide configuration.
///
/// Only the first call wins; returns `false` if a configuration was already
/// installed or lazily loaded by an earlier trace capture.
pub fn configure(config: SnagConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// The active configuration, loaded from figment sources on first use.
pub fn config() -> &'static SnagConfig {
    CONFIG.get_or_init(|| {
        SnagConfig::load().unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to load snag configuration; using defaults");
            SnagConfig::default()
        })
    })
}

/// Where an error started unwinding.
///
/// Always carries the source location of the raise; the full backtrace is
/// captured according to [`BacktraceMode`].
#[derive(Clone)]
pub struct Trace {
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

impl Trace {
    /// Capture a trace at the caller's location.
    #[must_use]
    #[track_caller]
    pub fn capture() -> Self {
        Self::capture_with(config().trace.backtrace)
    }

    /// Capture a trace with an explicit backtrace policy.
    #[must_use]
    #[track_caller]
    pub fn capture_with(mode: BacktraceMode) -> Self {
        let location = Location::caller();
        let backtrace = match mode {
            BacktraceMode::Auto => Backtrace::capture(),
            BacktraceMode::Always => Backtrace::force_capture(),
            BacktraceMode::Never => Backtrace::disabled(),
        };

        tracing::trace!(
            file = location.file(),
            line = location.line(),
            backtrace = %mode,
            "attached trace to error"
        );

        Self {
            location,
            backtrace: Arc::new(backtrace),
        }
    }

    /// Source location of the raise.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// The recorded backtrace; disabled or unsupported when not captured.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Whether a full backtrace was recorded, not just the location.
    #[must_use]
    pub fn has_backtrace(&self) -> bool {
        self.backtrace.status() == BacktraceStatus::Captured
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.location)?;
        if self.has_backtrace() {
            write!(f, "\n\nStack backtrace:\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("location", &self.location)
            .field("backtrace", &self.backtrace.status())
            .finish()
    }
}
