//! Progress reporting for sweeps.
//!
//! [`ProgressCallback`] decouples sweep progress from any rendering
//! backend. The CLI supplies `indicatif` bars; library callers and tests
//! use [`NullProgress`].

/// Receives progress updates from a running sweep.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of iterations.
    fn set_total(&self, total: u64);

    /// Advance by `delta` iterations.
    fn inc(&self, delta: u64);

    /// Update the message shown alongside the indicator.
    fn set_message(&self, msg: String);

    /// Mark the sweep as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
