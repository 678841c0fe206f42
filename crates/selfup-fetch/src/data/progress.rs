/// Receiver of progress updates in `[0.0, 1.0]`.
///
/// Updates are delivered synchronously on the task doing the work and are
/// non-decreasing within one phase. Sharing a sink between concurrent
/// operations is up to the caller.
pub trait ProgressSink: Send + Sync {
    fn set_progress(&self, value: f32);
}

impl<F> ProgressSink for F
where
    F: Fn(f32) + Send + Sync,
{
    fn set_progress(&self, value: f32) { self(value) }
}

/// Discards all progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_progress(&self, _value: f32) {}
}
