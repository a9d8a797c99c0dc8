use scout_model::{CategoryEvent, ProgressEvent};

use crate::phase_machine::PhaseUpdate;
use crate::tracker::JobOutcome;

/// Receives what the controller sees while monitoring. Rendering lives with
/// the implementor; every method defaults to doing nothing.
pub trait JobObserver: Send + Sync {
    fn on_progress(&self, _event: &ProgressEvent, _update: &PhaseUpdate) {}

    /// Called exactly once per correlation id.
    fn on_complete(&self, _outcome: &JobOutcome) {}

    fn on_category_event(&self, _event: &CategoryEvent) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {}
