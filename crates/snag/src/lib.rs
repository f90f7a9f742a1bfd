//! # snag
//!
//! Exception-style control flow on top of Rust unwinding.
//!
//! A failure is raised as a signal (an unwind carrying an [`Error`]) and
//! travels up the stack until a boundary intercepts it. Intermediate frames
//! neither check nor forward anything. Every error that crosses a raise or
//! a boundary gets exactly one [`Trace`] per cause chain, attached as close
//! to the original failure as possible.
//!
//! - [`throw`], [`raise`], [`must`]: start a signal.
//! - [`classify`], [`ensure_trace`], [`has_trace`]: normalize intercepted
//!   payloads and manage traces.
//! - [`boundary`]: policies that suppress, record, redirect, annotate,
//!   transform or re-raise a signal.
//! - [`catch`], [`catch_only`], [`caught`], [`ignoring`], [`unpanic`]: run
//!   an operation and get its outcome back as a value.
//!
//! # Usage
//!
//! ```
//! use std::io;
//!
//! use snag::{catch, detail, must};
//!
//! fn write_block() -> io::Result<()> {
//!     Err(io::Error::other("disk full"))
//! }
//!
//! fn step_x() {
//!     detail("step X failed", || must(write_block()));
//! }
//!
//! let error = catch(step_x).unwrap_err();
//! assert_eq!(error.to_string(), "step X failed: disk full");
//! assert!(snag::has_trace(&error));
//! ```
//!
//! # Uncaught signals
//!
//! Signals are started with [`std::panic::resume_unwind`], which skips the
//! panic hook. A signal that no boundary intercepts ends its thread (or the
//! process, from `main`) without printing anything. Wrap entry points in
//! [`report_uncaught`] to print the error, its causes and its trace to
//! stderr first; for a joined thread, pass the `Err` of
//! [`JoinHandle::join`](std::thread::JoinHandle::join) to [`classify`].
//!
//! Trace capture follows [`snag_config::SnagConfig`]; see [`configure`].

pub mod boundary;
mod captured;
mod catch;
mod chain;
mod error;
mod raise;
mod trace;

pub use boundary::{
    Boundary, ErrorSender, detail, guard, ignore, raise_trace, recover, recover_channel,
    recover_only, recover_with, recover_with_message, report_to, report_uncaught, run_on_failure,
    run_on_success, transform,
};
pub use captured::{CapturedValue, Payload};
pub use catch::{catch, catch_only, caught, caught_only, ignoring, unpanic, with_transform};
pub use chain::{Chain, chain};
pub use error::Error;
pub use raise::{ResultExt, classify, ensure_trace, has_trace, must, must_anyhow, raise, throw};
pub use snag_config::{BacktraceMode, SnagConfig, TraceConfig};
pub use trace::{Trace, config, configure};
