//! Progress reporting hook for long loops.

/// Receives progress of a job's main loop.
pub trait RunProgress {
    /// A loop over `total` items labelled `label` begins.
    fn start(&self, label: &str, total: u64);
    fn advance(&self);
    fn finish(&self);
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl RunProgress for NoProgress {
    fn start(&self, _label: &str, _total: u64) {}

    fn advance(&self) {}

    fn finish(&self) {}
}
