use std::sync::{Mutex, PoisonError};

use scout_model::{CorrelationId, Phase, ProgressEvent, Termination};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::phase_machine::{PhaseMachine, PhaseUpdate};

/// Final state of a monitored job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub correlation_id: CorrelationId,
    pub termination: Termination,
    /// Terminal phase that resolved the tracker.
    pub phase: Phase,
    pub result_detail: Option<String>,
    pub discovered: u32,
    pub events_observed: usize,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.termination == Termination::Success
    }
}

/// Result of feeding one event to a tracker.
#[derive(Debug, Clone)]
pub struct Observation {
    pub update: PhaseUpdate,
    /// Set only on the call that resolved the tracker.
    pub completed: Option<JobOutcome>,
}

/// How a wait on the tracker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Awaited {
    Completed(JobOutcome),
    Interrupted,
}

/// Single-assignment completion signal for one correlation id.
///
/// The first terminal event resolves the tracker; later terminal events are
/// swallowed so completion logic never fires twice.
#[derive(Debug)]
pub struct CompletionTracker {
    correlation_id: CorrelationId,
    machine: Mutex<PhaseMachine>,
    outcome: watch::Sender<Option<JobOutcome>>,
}

impl CompletionTracker {
    pub fn new(correlation_id: CorrelationId) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            correlation_id,
            machine: Mutex::new(PhaseMachine::new()),
            outcome,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Feeds one event. Returns `None` for events of other jobs.
    pub fn observe(&self, event: &ProgressEvent) -> Option<Observation> {
        if event.correlation_id != self.correlation_id {
            debug!(
                correlation_id = %self.correlation_id,
                foreign = %event.correlation_id,
                "ignoring progress event for another job"
            );
            return None;
        }

        let (update, events_observed, discovered) = {
            let mut machine =
                self.machine.lock().unwrap_or_else(PoisonError::into_inner);
            let update = machine.apply(event);
            (update, machine.events_seen(), machine.discovered())
        };

        let completed = update.termination.and_then(|termination| {
            let outcome = JobOutcome {
                correlation_id: self.correlation_id.clone(),
                termination,
                phase: event.phase,
                result_detail: event.result_detail.clone(),
                discovered,
                events_observed,
            };
            self.resolve(outcome)
        });

        if update.termination.is_some() && completed.is_none() {
            debug!(
                correlation_id = %self.correlation_id,
                phase = %event.phase,
                "duplicate terminal event swallowed"
            );
        }

        Some(Observation { update, completed })
    }

    fn resolve(&self, outcome: JobOutcome) -> Option<JobOutcome> {
        let mut resolved = None;
        self.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome.clone());
            resolved = Some(outcome);
            true
        });
        resolved
    }

    pub fn outcome(&self) -> Option<JobOutcome> {
        self.outcome.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Suspends until the tracker resolves.
    pub async fn wait(&self) -> Option<JobOutcome> {
        let mut rx = self.outcome.subscribe();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|slot| slot.clone())
    }

    /// Suspends until the tracker resolves or `stop` fires. Resolution wins a
    /// tie so an already finished job is never reported as interrupted.
    pub async fn wait_or_stop(&self, stop: &CancellationToken) -> Awaited {
        tokio::select! {
            biased;
            outcome = self.wait() => match outcome {
                Some(outcome) => Awaited::Completed(outcome),
                None => Awaited::Interrupted,
            },
            _ = stop.cancelled() => Awaited::Interrupted,
        }
    }
}
