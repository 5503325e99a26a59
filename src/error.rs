use std::fmt::{Display, Formatter};

/// The single error that is allowed to propagate out of this crate.
///
/// Malformed JSON is never an `Err` — it becomes a [`crate::Diagnostic`] on
/// an otherwise-successful return. Cancellation is the one exception: a
/// caller that cancels mid-parse gets a `Result::Err(Cancelled)` rather than
/// a partial [`crate::ParseResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl Display for Cancelled {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation cancelled")
    }
}

impl std::error::Error for Cancelled {}
