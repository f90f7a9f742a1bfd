//! The failure value carried by a signal.
//!
//! An [`Error`] is a link in a singly-linked cause chain: an optional
//! message, an optional cause, and at most one [`Trace`] per chain. Errors
//! are immutable once built; wrapping produces a new outer link. Cloning is
//! cheap and shares the chain.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::captured::{CapturedValue, Payload};
use crate::chain::{Chain, chain};
use crate::trace::Trace;

/// A single failure occurrence.
#[derive(Clone)]
pub struct Error {
    inner: Arc<Inner>,
}

struct Inner {
    message: Option<Cow<'static, str>>,
    cause: Option<Cause>,
    trace: Option<Trace>,
}

#[derive(Debug)]
enum Cause {
    Error(Error),
    Captured(CapturedValue),
    Foreign(Box<dyn StdError + Send + Sync + 'static>),
    Anyhow(anyhow::Error),
}

impl Cause {
    fn as_dyn(&self) -> &(dyn StdError + 'static) {
        match self {
            Self::Error(error) => error,
            Self::Captured(value) => value,
            Self::Foreign(error) => &**error,
            Self::Anyhow(error) => &**error,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anyhow(error) => write!(f, "{}", AnyhowChain(error)),
            _ => fmt::Display::fmt(self.as_dyn(), f),
        }
    }
}

/// Renders an `anyhow` chain the way `{:#}` does, joining context layers with
/// `": "`. Stops after the first [`Error`] link, which renders its own causes.
pub(crate) struct AnyhowChain<'a>(pub(crate) &'a anyhow::Error);

impl fmt::Display for AnyhowChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, link) in self.0.chain().enumerate() {
            if index > 0 {
                f.write_str(": ")?;
            }
            write!(f, "{link}")?;
            if link.is::<Error>() {
                break;
            }
        }
        Ok(())
    }
}

impl Error {
    fn from_parts(
        message: Option<Cow<'static, str>>,
        cause: Option<Cause>,
        trace: Option<Trace>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                message,
                cause,
                trace,
            }),
        }
    }

    /// A leaf error with a message and no trace.
    ///
    /// The trace is attached when the error is first raised.
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self::from_parts(Some(message.into()), None, None)
    }

    /// Adopt any standard error.
    ///
    /// An [`Error`] passed through here is returned as-is rather than
    /// wrapped, so generic code can accept both without double wrapping.
    #[must_use]
    pub fn from_std<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(error))
    }

    /// Adopt a boxed standard error, unboxing it if it is already an [`Error`].
    #[must_use]
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        match error.downcast::<Self>() {
            Ok(error) => *error,
            Err(error) => Self::from_parts(None, Some(Cause::Foreign(error)), None),
        }
    }

    /// Wrap a raw panic payload. See [`CapturedValue`].
    #[must_use]
    pub fn captured(payload: Payload) -> Self {
        Self::from(CapturedValue::new(payload))
    }

    /// A new error with `message` as outer context and `self` as cause.
    ///
    /// Renders as `"{message}: {self}"`. No trace is added.
    #[must_use]
    pub fn wrap(self, message: impl Into<Cow<'static, str>>) -> Self {
        Self::from_parts(Some(message.into()), Some(Cause::Error(self)), None)
    }

    /// A new, message-less link that carries `trace` and has `self` as cause.
    pub(crate) fn traced(self, trace: Trace) -> Self {
        Self::from_parts(None, Some(Cause::Error(self)), Some(trace))
    }

    /// A traced link over a raw payload.
    pub(crate) fn captured_with_trace(value: CapturedValue, trace: Trace) -> Self {
        Self::from_parts(None, Some(Cause::Captured(value)), Some(trace))
    }

    /// This link's own message, if it has one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.inner.message.as_deref()
    }

    /// The wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.cause.as_ref().map(Cause::as_dyn)
    }

    /// The raw payload when this link wraps one.
    #[must_use]
    pub fn captured_value(&self) -> Option<&CapturedValue> {
        match &self.inner.cause {
            Some(Cause::Captured(value)) => Some(value),
            _ => None,
        }
    }

    /// The trace carried by this link itself.
    #[must_use]
    pub fn trace(&self) -> Option<&Trace> {
        self.inner.trace.as_ref()
    }

    /// The trace carried anywhere in the chain.
    #[must_use]
    pub fn find_trace(&self) -> Option<&Trace> {
        self.chain()
            .filter_map(|link| link.downcast_ref::<Self>())
            .find_map(Self::trace)
    }

    /// This error followed by every error it wraps.
    #[must_use]
    pub fn chain(&self) -> Chain<'_> {
        chain(self)
    }

    /// The innermost error of the chain.
    #[must_use]
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        self.chain().last().unwrap_or(self)
    }

    /// The first link of type `E`, searching outermost first.
    #[must_use]
    pub fn find<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.chain().find_map(|link| link.downcast_ref::<E>())
    }

    /// Whether any link in the chain is an `E`.
    #[must_use]
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.find::<E>().is_some()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.inner.message, &self.inner.cause) {
            (Some(message), Some(cause)) => write!(f, "{message}: {cause}"),
            (Some(message), None) => f.write_str(message),
            (None, Some(cause)) => write!(f, "{cause}"),
            (None, None) => Ok(()),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("message", &self.inner.message)
                .field("cause", &self.inner.cause)
                .field("trace", &self.inner.trace)
                .finish();
        }

        write!(f, "{self}")?;

        // Trace-only links render exactly like their cause; skip them.
        let causes: Vec<String> = self
            .chain()
            .skip(1)
            .filter(|link| {
                link.downcast_ref::<Self>()
                    .is_none_or(|error| error.message().is_some())
            })
            .map(ToString::to_string)
            .collect();
        if !causes.is_empty() {
            f.write_str("\n\nCaused by:")?;
            for (index, cause) in causes.iter().enumerate() {
                write!(f, "\n    {index}: {cause}")?;
            }
        }

        if let Some(trace) = self.find_trace() {
            write!(f, "\n\n{trace}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause()
    }
}

impl From<&'static str> for Error {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<CapturedValue> for Error {
    fn from(value: CapturedValue) -> Self {
        Self::from_parts(None, Some(Cause::Captured(value)), None)
    }
}

impl From<anyhow::Error> for Error {
    /// Unwraps an [`Error`] only when it is the outermost link. `downcast`
    /// alone would also find one under `.context(..)` and drop the context.
    fn from(error: anyhow::Error) -> Self {
        if let Some(ours) = error.chain().next().and_then(|link| link.downcast_ref::<Self>()) {
            return ours.clone();
        }
        Self::from_parts(None, Some(Cause::Anyhow(error)), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use pretty_assertions::assert_eq;
    use snag_config::BacktraceMode;

    #[test]
    fn leaf_renders_its_message() {
        let error = Error::new("disk full");
        assert_eq!(error.to_string(), "disk full");
        assert_eq!(error.message(), Some("disk full"));
        assert!(error.cause().is_none());
        assert!(error.trace().is_none());
    }

    #[test]
    fn wrap_prepends_context() {
        let error = Error::new("disk full").wrap("step X failed");
        assert_eq!(error.to_string(), "step X failed: disk full");
        assert_eq!(error.chain().count(), 2);
        assert_eq!(error.root_cause().to_string(), "disk full");
    }

    #[test]
    fn traced_link_renders_like_its_cause() {
        let error = Error::new("disk full").traced(Trace::capture_with(BacktraceMode::Never));
        assert_eq!(error.to_string(), "disk full");
        assert!(error.trace().is_some());
        assert!(error.message().is_none());
    }

    #[test]
    fn find_trace_searches_the_chain() {
        let error = Error::new("disk full")
            .traced(Trace::capture_with(BacktraceMode::Never))
            .wrap("step X failed");
        assert!(error.trace().is_none());
        assert!(error.find_trace().is_some());
    }

    #[test]
    fn from_std_keeps_foreign_error_reachable() {
        let error = Error::from_std(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert_eq!(error.to_string(), "no such file");
        let io_error = error.find::<io::Error>().expect("io error in chain");
        assert_eq!(io_error.kind(), io::ErrorKind::NotFound);
        assert!(error.is::<io::Error>());
        assert!(!error.is::<std::fmt::Error>());
    }

    #[test]
    fn from_std_does_not_rewrap_errors() {
        let original = Error::new("already ours");
        let adopted = Error::from_std(original.clone());
        assert!(Arc::ptr_eq(&original.inner, &adopted.inner));
    }

    #[test]
    fn anyhow_errors_convert_both_ways() {
        let foreign = Error::from(anyhow::anyhow!("from anyhow"));
        assert_eq!(foreign.to_string(), "from anyhow");

        let ours = Error::new("round trip");
        let back = Error::from(anyhow::Error::new(ours.clone()));
        assert!(Arc::ptr_eq(&ours.inner, &back.inner));
    }

    #[test]
    fn anyhow_context_over_our_error_is_kept() {
        let ours = Error::new("disk full");
        let wrapped = anyhow::Error::new(ours.clone()).context("step X failed");
        let error = Error::from(wrapped);
        assert_eq!(error.to_string(), "step X failed: disk full");
        assert!(!Arc::ptr_eq(&ours.inner, &error.inner));
        assert!(error.is::<Error>());
        assert_eq!(error.root_cause().to_string(), "disk full");
    }

    #[test]
    fn anyhow_context_over_foreign_error_renders_every_layer() {
        let wrapped = anyhow::Error::new(io::Error::other("connection reset"))
            .context("fetch failed")
            .context("sync failed");
        let error = Error::from(wrapped);
        assert_eq!(error.to_string(), "sync failed: fetch failed: connection reset");
        assert!(error.is::<io::Error>());
    }

    #[test]
    fn anyhow_context_stops_at_our_rendered_chain() {
        let ours = Error::new("disk full").wrap("write failed");
        let error = Error::from(anyhow::Error::new(ours).context("step X failed"));
        assert_eq!(error.to_string(), "step X failed: write failed: disk full");
    }

    #[test]
    fn captured_payload_renders_as_text() {
        let error = Error::captured(Box::new("raw payload"));
        assert_eq!(error.to_string(), "raw payload");
        let value = error.captured_value().expect("captured link");
        assert!(value.is::<&'static str>());
    }

    #[test]
    fn debug_lists_causes_and_trace() {
        let error = Error::new("disk full")
            .traced(Trace::capture_with(BacktraceMode::Never))
            .wrap("step X failed");
        let rendered = format!("{error:?}");
        assert!(rendered.starts_with("step X failed: disk full"));
        assert!(rendered.contains("Caused by:\n    0: disk full"));
        assert!(rendered.contains(&format!("at {}", file!())));
    }

    #[test]
    fn empty_error_renders_empty() {
        let error = Error::from_parts(None, None, None);
        assert_eq!(error.to_string(), "");
    }
}
