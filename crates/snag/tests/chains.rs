//! Cause chains that mix snag errors with foreign error types.

use std::io;

use pretty_assertions::assert_eq;
use anyhow::Context as _;
use snag::{Error, catch, detail, has_trace, must, must_anyhow, raise_trace, throw};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
enum StoreError {
    #[error("store unavailable")]
    Unavailable(#[source] Error),
    #[error("record {0} not found")]
    NotFound(u64),
}

fn fail(message: &'static str) {
    throw(message);
}

fn traced_links(error: &Error) -> usize {
    error
        .chain()
        .filter_map(|link| link.downcast_ref::<Error>())
        .filter(|link| link.trace().is_some())
        .count()
}

#[test]
fn trace_inside_foreign_wrapper_is_not_duplicated() {
    let inner = catch(|| must(Err::<(), _>(io::Error::other("connection reset"))))
        .expect_err("caught");
    assert_eq!(traced_links(&inner), 1);

    let wrapped = StoreError::Unavailable(inner);
    assert!(has_trace(&wrapped));

    let error = catch(|| must(Err::<(), _>(wrapped))).expect_err("caught");
    assert_eq!(error.to_string(), "store unavailable");
    assert_eq!(traced_links(&error), 1);
    assert!(error.is::<StoreError>());
    assert!(error.is::<io::Error>());
    assert_eq!(error.root_cause().to_string(), "connection reset");
}

#[test]
fn foreign_error_without_trace_gets_one() {
    let error = catch(|| must(Err::<(), _>(StoreError::NotFound(7)))).expect_err("caught");
    assert_eq!(error.to_string(), "record 7 not found");
    assert_eq!(traced_links(&error), 1);
    let store = error.find::<StoreError>().expect("store error in chain");
    assert!(matches!(store, StoreError::NotFound(7)));
}

#[test]
fn nested_details_stack_outermost_first() {
    let error = catch(|| {
        detail("request failed", || {
            detail("step X failed", || fail("disk full"));
        });
    })
    .expect_err("caught");

    assert_eq!(error.to_string(), "request failed: step X failed: disk full");
    assert_eq!(traced_links(&error), 1);
    let rendered = format!("{error:?}");
    assert!(rendered.contains("Caused by:"));
    assert!(rendered.contains("step X failed: disk full"));
}

#[test]
fn raise_trace_keeps_original_trace() {
    let original = catch(|| fail("disk full")).expect_err("caught");
    let location = original.find_trace().expect("traced").location();

    let error = catch(|| raise_trace(|| snag::raise(Some(original.clone())))).expect_err("caught");
    assert_eq!(traced_links(&error), 1);
    assert_eq!(error.find_trace().expect("traced").location(), location);
}

#[test]
fn anyhow_context_survives_a_round_trip() {
    let error = catch(|| {
        must_anyhow(Err::<(), _>(Error::new("disk full")).context("step X failed"));
    })
    .expect_err("caught");

    assert_eq!(error.to_string(), "step X failed: disk full");
    assert_eq!(traced_links(&error), 1);
    assert_eq!(error.root_cause().to_string(), "disk full");
}
