//! Run an operation under a boundary and report its outcome as a value.

use crate::boundary::{ignore, recover, recover_only, transform};
use crate::error::Error;

/// Run `op`, turning any signal it raises into `Err`.
///
/// The error always carries a trace.
#[track_caller]
pub fn catch<T>(op: impl FnOnce() -> T) -> Result<T, Error> {
    let mut caught = None;
    match (recover(&mut caught, op), caught) {
        (Some(value), _) => Ok(value),
        (None, Some(error)) => Err(error),
        (None, None) => unreachable!("recover suppresses a signal only after recording it"),
    }
}

/// Run `op`, turning signals whose error `predicate` accepts into `Err`.
///
/// Any other signal escapes `catch_only` and continues to the enclosing
/// boundary.
#[track_caller]
pub fn catch_only<T, P>(predicate: P, op: impl FnOnce() -> T) -> Result<T, Error>
where
    P: FnOnce(&Error) -> bool,
{
    let mut caught = None;
    match (recover_only(&mut caught, predicate, op), caught) {
        (Some(value), _) => Ok(value),
        (None, Some(error)) => Err(error),
        (None, None) => unreachable!("recover_only suppresses a signal only after recording it"),
    }
}

/// Whether `op` raised a signal.
#[track_caller]
pub fn caught<T>(op: impl FnOnce() -> T) -> bool {
    catch(op).is_err()
}

/// Whether `op` raised a signal that `predicate` accepts. Other signals
/// escape.
#[track_caller]
pub fn caught_only<T, P>(predicate: P, op: impl FnOnce() -> T) -> bool
where
    P: FnOnce(&Error) -> bool,
{
    catch_only(predicate, op).is_err()
}

/// Run `op`, discarding signals whose error `predicate` accepts. Other
/// signals escape.
#[track_caller]
pub fn ignoring<P>(predicate: P, op: impl FnOnce())
where
    P: FnOnce(&Error) -> bool,
{
    ignore(predicate, op);
}

/// Run `op`, replacing the error of any signal it raises with the result of
/// `transform`. The replacement keeps unwinding; `None` suppresses it.
#[track_caller]
pub fn with_transform<F>(transform_error: F, op: impl FnOnce())
where
    F: FnOnce(Error) -> Option<Error>,
{
    transform(transform_error, op);
}

/// Convert the unwind of an operation without a value into an ordinary
/// return.
#[must_use]
#[track_caller]
pub fn unpanic(op: impl FnOnce()) -> Option<Error> {
    catch(op).err()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{has_trace, must, throw};

    fn fail(message: &'static str) {
        throw(message);
    }

    fn panic_with(code: i32) {
        panic!("raw {code}");
    }

    fn mentions_missing(error: &Error) -> bool {
        error.to_string().contains("missing")
    }

    #[test]
    fn catch_returns_value_without_signal() {
        assert_eq!(catch(|| 42).expect("no signal"), 42);
    }

    #[test]
    fn catch_returns_traced_error() {
        let error = catch(|| fail("failure A")).expect_err("signal caught");
        assert_eq!(error.to_string(), "failure A");
        assert!(has_trace(&error));
    }

    #[test]
    fn catch_stops_at_first_failure() {
        let mut reached = Vec::new();
        let result = catch(|| {
            reached.push("A");
            fail("failure A");
            reached.push("B");
            fail("failure B");
        });
        assert_eq!(result.expect_err("signal caught").to_string(), "failure A");
        assert_eq!(reached, vec!["A"]);
    }

    #[test]
    fn catch_converts_foreign_panics() {
        let error = catch(|| panic_with(7)).expect_err("panic caught");
        assert_eq!(error.to_string(), "raw 7");
        assert!(error.captured_value().is_some());
    }

    #[test]
    fn catch_only_returns_accepted_error() {
        let error = catch_only(mentions_missing, || fail("file missing")).expect_err("caught");
        assert_eq!(error.to_string(), "file missing");
    }

    #[test]
    fn catch_only_lets_rejected_error_escape() {
        let mut returned = false;
        let outer = catch(|| {
            let _ = catch_only(mentions_missing, || fail("disk full"));
            returned = true;
        });
        assert!(!returned);
        assert_eq!(outer.expect_err("escaped").to_string(), "disk full");
    }

    #[test]
    fn catch_only_matches_error_kinds() {
        let not_found = |error: &Error| {
            error
                .find::<io::Error>()
                .is_some_and(|source| source.kind() == io::ErrorKind::NotFound)
        };
        let error = catch_only(not_found, || {
            must(std::fs::read("definitely/not/a/real/file"));
        })
        .expect_err("missing file caught");
        assert!(error.is::<io::Error>());
    }

    #[rstest]
    #[case("file missing", true)]
    #[case("disk full", false)]
    fn caught_only_reports_or_escapes(#[case] message: &'static str, #[case] accepted: bool) {
        let outer = catch(|| caught_only(mentions_missing, || fail(message)));
        if accepted {
            assert!(outer.expect("accepted error stays inside"));
        } else {
            assert_eq!(outer.expect_err("rejected error escapes").to_string(), message);
        }
    }

    #[test]
    fn caught_reports_failure() {
        assert!(caught(|| fail("boom")));
        assert!(!caught(|| ()));
    }

    #[test]
    fn ignoring_swallows_matching_errors() {
        let printed = std::cell::Cell::new(false);
        ignoring(mentions_missing, || {
            fail("file missing");
            printed.set(true);
        });
        assert!(!printed.get());
    }

    #[test]
    fn ignoring_reraises_other_errors() {
        let outer = catch(|| ignoring(mentions_missing, || fail("disk full")));
        assert_eq!(outer.expect_err("escaped").to_string(), "disk full");
    }

    #[test]
    fn with_transform_identity_keeps_chain() {
        let before = catch(|| fail("disk full")).expect_err("caught");
        let leaf = before.root_cause().to_string();

        let after = catch(|| with_transform(Some, || crate::raise(Some(before.clone()))))
            .expect_err("caught");
        assert_eq!(after.to_string(), before.to_string());
        assert_eq!(after.root_cause().to_string(), leaf);
        let traced = after
            .chain()
            .filter_map(|link| link.downcast_ref::<Error>())
            .filter(|link| link.trace().is_some())
            .count();
        assert_eq!(traced, 1);
    }

    #[test]
    fn with_transform_none_suppresses() {
        let outer = catch(|| with_transform(|_| None, || fail("disk full")));
        assert!(outer.is_ok());
    }

    #[test]
    fn unpanic_converts_unwind() {
        assert!(unpanic(|| ()).is_none());
        let error = unpanic(|| fail("boom")).expect("unwind converted");
        assert_eq!(error.to_string(), "boom");
    }
}
