//! Boundaries: interception points for signals.
//!
//! A boundary guards a body. When the body returns normally or unwinds, the
//! outcome is classified (see [`classify`](crate::classify)) and handed to a
//! [`Boundary`] policy, which either terminates the signal (records it
//! somewhere and stops) or hands back an error to keep unwinding with.
//!
//! A boundary only ever sees signals raised inside the body it guards; there
//! is no ambient "current panic" to consult.
//!
//! Bodies run under [`AssertUnwindSafe`]. Callers are responsible for any
//! state the body leaves half-updated when it unwinds. Boundaries do nothing
//! when the crate is built with `panic = "abort"`.

use std::borrow::Cow;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use crate::error::Error;
use crate::raise::{classify_payload, raise, throw};

/// Policy applied when a guarded body exits.
pub trait Boundary {
    /// Receive `None` on a normal exit or the classified error of an
    /// intercepted signal. Return the error that must keep unwinding, or
    /// `None` to let the guarded scope return normally.
    fn on_exit(self, caught: Option<Error>) -> Option<Error>;
}

/// Run `body` under `boundary`.
///
/// Returns `Some` with the body's value on a normal exit, `None` when a
/// signal was intercepted and suppressed by the policy. An error returned by
/// the policy is raised from here.
#[track_caller]
pub fn guard<T, B>(boundary: B, body: impl FnOnce() -> T) -> Option<T>
where
    B: Boundary,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => {
            raise(boundary.on_exit(None));
            Some(value)
        }
        Err(payload) => {
            let error = classify_payload(payload);
            tracing::debug!(%error, "boundary intercepted signal");
            match boundary.on_exit(Some(error)) {
                Some(error) => throw(error),
                None => {
                    tracing::debug!("boundary suppressed signal");
                    None
                }
            }
        }
    }
}

/// [`guard`] for policies that never suppress a signal.
///
/// Should the policy return `None` anyway, the intercepted error keeps
/// unwinding.
#[track_caller]
fn guard_through<T, B>(boundary: B, body: impl FnOnce() -> T) -> T
where
    B: Boundary,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => {
            raise(boundary.on_exit(None));
            value
        }
        Err(payload) => {
            let error = classify_payload(payload);
            tracing::debug!(%error, "boundary intercepted signal");
            let fallback = error.clone();
            throw(boundary.on_exit(Some(error)).unwrap_or(fallback))
        }
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Ensure a trace and keep unwinding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaiseTrace;

impl Boundary for RaiseTrace {
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        caught
    }
}

/// Write the error into a caller-owned slot and stop.
#[derive(Debug)]
pub struct Recover<'a> {
    pub sink: &'a mut Option<Error>,
}

impl Boundary for Recover<'_> {
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        if let Some(error) = caught {
            *self.sink = Some(error);
        }
        None
    }
}

/// Write the error into a slot; keep unwinding unless `predicate` accepts it.
///
/// The slot is written in both cases.
pub struct RecoverOnly<'a, P> {
    pub sink: &'a mut Option<Error>,
    pub predicate: P,
}

impl<P> Boundary for RecoverOnly<'_, P>
where
    P: FnOnce(&Error) -> bool,
{
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        let error = caught?;
        *self.sink = Some(error.clone());
        if (self.predicate)(&error) {
            None
        } else {
            Some(error)
        }
    }
}

/// Destination for [`RecoverChannel`]. Delivery must never block.
pub trait ErrorSender {
    /// Hand `error` over if it can be accepted right now; give it back
    /// otherwise.
    fn try_deliver(&self, error: Error) -> Result<(), Error>;
}

impl ErrorSender for mpsc::SyncSender<Error> {
    fn try_deliver(&self, error: Error) -> Result<(), Error> {
        self.try_send(error).map_err(|error| match error {
            mpsc::TrySendError::Full(error) | mpsc::TrySendError::Disconnected(error) => error,
        })
    }
}

impl ErrorSender for mpsc::Sender<Error> {
    fn try_deliver(&self, error: Error) -> Result<(), Error> {
        self.send(error).map_err(|mpsc::SendError(error)| error)
    }
}

impl ErrorSender for tokio::sync::mpsc::Sender<Error> {
    fn try_deliver(&self, error: Error) -> Result<(), Error> {
        use tokio::sync::mpsc::error::TrySendError;

        self.try_send(error).map_err(|error| match error {
            TrySendError::Full(error) | TrySendError::Closed(error) => error,
        })
    }
}

impl ErrorSender for tokio::sync::mpsc::UnboundedSender<Error> {
    fn try_deliver(&self, error: Error) -> Result<(), Error> {
        self.send(error).map_err(|error| error.0)
    }
}

impl<S: ErrorSender + ?Sized> ErrorSender for &S {
    fn try_deliver(&self, error: Error) -> Result<(), Error> {
        (**self).try_deliver(error)
    }
}

/// Deliver the error to a channel without blocking and stop.
///
/// A report the channel cannot take immediately is dropped: a full or
/// unreceived channel means nobody is listening right now.
#[derive(Debug)]
pub struct RecoverChannel<S> {
    pub sender: S,
}

impl<S: ErrorSender> Boundary for RecoverChannel<S> {
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        if let Some(error) = caught {
            if let Err(error) = self.sender.try_deliver(error) {
                tracing::warn!(%error, "error report dropped; channel cannot accept it");
            }
        }
        None
    }
}

/// Hand the error to a callback and stop.
///
/// For background work with no caller to report to.
pub struct RecoverWith<F> {
    pub handler: F,
}

impl<F> Boundary for RecoverWith<F>
where
    F: FnOnce(Error),
{
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        if let Some(error) = caught {
            (self.handler)(error);
        }
        None
    }
}

/// Wrap the error with a message, write it into a slot and stop.
#[derive(Debug)]
pub struct RecoverWithMessage<'a> {
    pub sink: &'a mut Option<Error>,
    pub message: Cow<'static, str>,
}

impl Boundary for RecoverWithMessage<'_> {
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        if let Some(error) = caught {
            *self.sink = Some(error.wrap(self.message));
        }
        None
    }
}

/// Wrap the error with a message and keep unwinding.
#[derive(Debug, Clone)]
pub struct Detail {
    pub message: Cow<'static, str>,
}

impl Boundary for Detail {
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        caught.map(|error| error.wrap(self.message))
    }
}

/// Suppress errors `predicate` accepts; keep unwinding with the rest.
pub struct Ignore<P> {
    pub predicate: P,
}

impl<P> Boundary for Ignore<P>
where
    P: FnOnce(&Error) -> bool,
{
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        let error = caught?;
        if (self.predicate)(&error) {
            None
        } else {
            Some(error)
        }
    }
}

/// Replace the error and keep unwinding with the replacement; `None`
/// suppresses.
pub struct Transform<F> {
    pub transform: F,
}

impl<F> Boundary for Transform<F>
where
    F: FnOnce(Error) -> Option<Error>,
{
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        caught.and_then(self.transform)
    }
}

/// Run a callback only when the body exits normally.
pub struct RunOnSuccess<F> {
    pub callback: F,
}

impl<F> Boundary for RunOnSuccess<F>
where
    F: FnOnce(),
{
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        if caught.is_none() {
            (self.callback)();
        }
        caught
    }
}

/// Run a callback only when a signal is intercepted, then keep unwinding.
pub struct RunOnFailure<F> {
    pub callback: F,
}

impl<F> Boundary for RunOnFailure<F>
where
    F: FnOnce(&Error),
{
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        if let Some(error) = &caught {
            (self.callback)(error);
        }
        caught
    }
}

/// Write the full report of an escaping error to `out`, then keep unwinding.
///
/// Signals skip the panic hook, so this is how a fatal one becomes visible.
#[derive(Debug)]
pub struct Report<W> {
    pub out: W,
}

impl<W: Write> Boundary for Report<W> {
    fn on_exit(self, caught: Option<Error>) -> Option<Error> {
        let error = caught?;
        tracing::error!(%error, "uncaught signal");
        let mut out = self.out;
        if let Err(write_error) = writeln!(out, "Error: {error:?}") {
            tracing::warn!(%write_error, "failed to write uncaught signal report");
        }
        Some(error)
    }
}

// ---------------------------------------------------------------------------
// Guarding functions
// ---------------------------------------------------------------------------

/// Make sure any signal leaving `body` carries a trace. Never suppresses.
#[track_caller]
pub fn raise_trace<T>(body: impl FnOnce() -> T) -> T {
    guard_through(RaiseTrace, body)
}

/// Intercept any signal from `body`, writing its error into `sink`.
#[track_caller]
pub fn recover<T>(sink: &mut Option<Error>, body: impl FnOnce() -> T) -> Option<T> {
    guard(Recover { sink }, body)
}

/// Like [`recover`], but errors `predicate` rejects keep unwinding after
/// being written into `sink`.
#[track_caller]
pub fn recover_only<T, P>(
    sink: &mut Option<Error>,
    predicate: P,
    body: impl FnOnce() -> T,
) -> Option<T>
where
    P: FnOnce(&Error) -> bool,
{
    guard(RecoverOnly { sink, predicate }, body)
}

/// Intercept any signal from `body` and deliver its error to `sender`
/// without blocking. Undeliverable reports are dropped.
#[track_caller]
pub fn recover_channel<T, S>(sender: S, body: impl FnOnce() -> T) -> Option<T>
where
    S: ErrorSender,
{
    guard(RecoverChannel { sender }, body)
}

/// Intercept any signal from `body` and pass its error to `handler`.
#[track_caller]
pub fn recover_with<T, F>(handler: F, body: impl FnOnce() -> T) -> Option<T>
where
    F: FnOnce(Error),
{
    guard(RecoverWith { handler }, body)
}

/// Intercept any signal from `body`, writing its error into `sink` wrapped
/// with `message`.
#[track_caller]
pub fn recover_with_message<T>(
    sink: &mut Option<Error>,
    message: impl Into<Cow<'static, str>>,
    body: impl FnOnce() -> T,
) -> Option<T> {
    let message = message.into();
    guard(RecoverWithMessage { sink, message }, body)
}

/// Annotate any signal leaving `body` with `message`. Never suppresses.
#[track_caller]
pub fn detail<T>(message: impl Into<Cow<'static, str>>, body: impl FnOnce() -> T) -> T {
    let message = message.into();
    guard_through(Detail { message }, body)
}

/// Suppress signals from `body` whose error `predicate` accepts.
#[track_caller]
pub fn ignore<T, P>(predicate: P, body: impl FnOnce() -> T) -> Option<T>
where
    P: FnOnce(&Error) -> bool,
{
    guard(Ignore { predicate }, body)
}

/// Replace the error of any signal from `body`; a `None` replacement
/// suppresses the signal.
#[track_caller]
pub fn transform<T, F>(transform: F, body: impl FnOnce() -> T) -> Option<T>
where
    F: FnOnce(Error) -> Option<Error>,
{
    guard(Transform { transform }, body)
}

/// Run `callback` after `body` returns normally. Signals pass through.
#[track_caller]
pub fn run_on_success<T, F>(callback: F, body: impl FnOnce() -> T) -> T
where
    F: FnOnce(),
{
    guard_through(RunOnSuccess { callback }, body)
}

/// Run `callback` with the error of any signal leaving `body`, then let the
/// signal continue.
#[track_caller]
pub fn run_on_failure<T, F>(callback: F, body: impl FnOnce() -> T) -> T
where
    F: FnOnce(&Error),
{
    guard_through(RunOnFailure { callback }, body)
}

/// Print any signal leaving `body` to stderr, message chain and trace
/// included, and let it keep unwinding.
///
/// Wrap `main` or a thread's entry point with it: a signal nobody catches
/// otherwise ends the thread without printing anything.
///
/// ```should_panic
/// fn run() {
///     snag::throw("disk full");
/// }
///
/// fn main() {
///     snag::report_uncaught(run);
/// }
/// ```
#[track_caller]
pub fn report_uncaught<T>(body: impl FnOnce() -> T) -> T {
    report_to(io::stderr(), body)
}

/// [`report_uncaught`] writing to `out` instead of stderr.
#[track_caller]
pub fn report_to<T, W>(out: W, body: impl FnOnce() -> T) -> T
where
    W: Write,
{
    guard_through(Report { out }, body)
}
