//! Raising errors as unwinds, and turning intercepted unwinds back into errors.
//!
//! A signal is an unwind whose payload is an [`Error`]. It is started with
//! [`std::panic::resume_unwind`], so the panic hook does not run and nothing
//! is printed; the error reaches the nearest boundary untouched. Any other
//! panic is a foreign signal and is normalized by [`classify`].

use std::borrow::Cow;
use std::error::Error as StdError;
use std::panic;

use crate::captured::{CapturedValue, Payload};
use crate::chain::chain;
use crate::error::Error;
use crate::trace::Trace;

/// Normalize an intercepted unwind payload.
///
/// - `None` stays `None`; no error is built for an absent payload.
/// - An [`Error`], a boxed standard error or an [`anyhow::Error`] is adopted
///   and given a trace if its chain has none.
/// - Anything else is wrapped in a [`CapturedValue`] and always gets a trace,
///   captured at the caller.
#[must_use]
#[track_caller]
pub fn classify(payload: Option<Payload>) -> Option<Error> {
    // `Option::map` would report the closure as the trace location.
    match payload {
        Some(payload) => Some(classify_payload(payload)),
        None => None,
    }
}

#[track_caller]
pub(crate) fn classify_payload(payload: Payload) -> Error {
    let payload = match payload.downcast::<Error>() {
        Ok(error) => return ensure_trace(*error),
        Err(payload) => payload,
    };
    let payload = match payload.downcast::<Box<dyn StdError + Send + Sync>>() {
        Ok(error) => return ensure_trace(Error::from_boxed(*error)),
        Err(payload) => payload,
    };
    let payload = match payload.downcast::<anyhow::Error>() {
        Ok(error) => return ensure_trace(Error::from(*error)),
        Err(payload) => payload,
    };

    Error::captured_with_trace(CapturedValue::new(payload), Trace::capture())
}

/// Return `error` if its chain already carries a trace, otherwise wrap it in
/// a new link traced at the caller.
///
/// When the error is known to have no trace, capturing one directly at the
/// failure site gives a more useful leading location than delegating here.
#[must_use]
#[track_caller]
pub fn ensure_trace(error: Error) -> Error {
    if has_trace(&error) {
        error
    } else {
        error.traced(Trace::capture())
    }
}

/// Whether any link of the chain is an [`Error`] carrying a trace.
///
/// Foreign errors that wrap an [`Error`] as their source are seen through.
#[must_use]
pub fn has_trace(error: &(dyn StdError + 'static)) -> bool {
    chain(error).any(|link| {
        link.downcast_ref::<Error>()
            .is_some_and(|error| error.trace().is_some())
    })
}

/// Start a signal if there is an error; return normally otherwise.
#[track_caller]
pub fn raise(error: Option<Error>) {
    if let Some(error) = error {
        throw(error);
    }
}

/// Start a signal carrying `error`, adding a trace at the caller if the
/// chain has none. Never returns.
#[track_caller]
pub fn throw(error: impl Into<Error>) -> ! {
    let error = ensure_trace(error.into());
    panic::resume_unwind(Box::new(error))
}

/// Unwrap a result, raising its error.
///
/// The generic form of the per-type "try" adapters: `Ok` values pass through
/// unchanged, an `Err` is adopted with [`Error::from_std`] and thrown.
#[track_caller]
pub fn must<T, E>(result: Result<T, E>) -> T
where
    E: StdError + Send + Sync + 'static,
{
    match result {
        Ok(value) => value,
        Err(error) => throw(Error::from_std(error)),
    }
}

/// [`must`] for `anyhow` results.
#[track_caller]
pub fn must_anyhow<T>(result: anyhow::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => throw(error),
    }
}

/// Signal-raising helpers on `Result`.
pub trait ResultExt<T> {
    /// See [`must`].
    fn must(self) -> T;

    /// Like [`must`], with `message` prepended to the error.
    fn or_raise_with(self, message: impl Into<Cow<'static, str>>) -> T;

    /// Prepend `message` to the error without raising or tracing it.
    fn with_message(self, message: impl Into<Cow<'static, str>>) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    #[track_caller]
    fn must(self) -> T {
        must(self)
    }

    #[track_caller]
    fn or_raise_with(self, message: impl Into<Cow<'static, str>>) -> T {
        match self {
            Ok(value) => value,
            Err(error) => throw(Error::from_std(error).wrap(message)),
        }
    }

    fn with_message(self, message: impl Into<Cow<'static, str>>) -> Result<T, Error> {
        self.map_err(|error| Error::from_std(error).wrap(message))
    }
}
