//! Walking the `source()` links of an error.

use std::error::Error as StdError;
use std::iter::FusedIterator;

/// Iterate over `error` and every error it wraps, outermost first.
///
/// Stops at the first link without a source, or at a link whose source is
/// itself; foreign error types occasionally report themselves as their own
/// cause.
#[must_use]
pub fn chain<'a>(error: &'a (dyn StdError + 'static)) -> Chain<'a> {
    Chain { next: Some(error) }
}

/// Iterator returned by [`chain`] and [`Error::chain`](crate::Error::chain).
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.source().filter(|source| {
            !std::ptr::addr_eq(
                *source as *const dyn StdError,
                current as *const dyn StdError,
            )
        });
        Some(current)
    }
}

impl FusedIterator for Chain<'_> {}
