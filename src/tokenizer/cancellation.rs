/// A cooperative cancellation signal polled at character granularity by the
/// tokenizer and sanitizer, and at bulk granularity by the parser driver
/// between stages.
///
/// There is no async variant of this trait: this crate has no cooperative
/// scheduler in its dependency graph, so the asynchronous entry points named
/// in the external-interface surface are elided (see the crate's design
/// notes); this trait is what keeps cancellation checks in place regardless.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

impl CancellationToken for std::cell::Cell<bool> {
    fn is_cancelled(&self) -> bool {
        self.get()
    }
}

pub(crate) fn check(cancel: Option<&dyn CancellationToken>) -> Result<(), crate::Cancelled> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(crate::Cancelled),
        _ => Ok(()),
    }
}
