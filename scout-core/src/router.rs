use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use scout_contracts::ProgressHandler;
use scout_model::{CorrelationId, ProgressEvent};
use tracing::{debug, info};

use crate::observer::JobObserver;
use crate::tracker::{CompletionTracker, JobOutcome};

/// Counters for a stream carrying many jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub events_observed: usize,
    pub jobs_seen: usize,
    pub jobs_completed: usize,
}

/// How many completed correlation ids a router remembers so late events for
/// them are swallowed instead of starting a fresh tracker.
pub const DEFAULT_COMPLETED_MEMORY: usize = 1024;

/// Bounded, insertion-ordered set of finished jobs.
#[derive(Debug)]
struct CompletedIds {
    order: VecDeque<CorrelationId>,
    ids: HashSet<CorrelationId>,
    capacity: usize,
}

impl CompletedIds {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity.min(64)),
            ids: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    fn contains(&self, id: &CorrelationId) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: CorrelationId) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[derive(Debug)]
struct Jobs {
    live: HashMap<CorrelationId, Arc<CompletionTracker>>,
    completed: CompletedIds,
}

/// Demultiplexes an entity-wide progress stream into one tracker per
/// correlation id, so each job completes exactly once.
///
/// A tracker lives only until its job resolves; afterwards the id is kept in
/// a bounded completed set and further events for it are dropped.
pub struct ProgressRouter {
    observer: Arc<dyn JobObserver>,
    jobs: Mutex<Jobs>,
    stats: Mutex<RouterStats>,
}

impl fmt::Debug for ProgressRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressRouter")
            .field("stats", &self.stats())
            .field("live_jobs", &self.live_jobs())
            .finish()
    }
}

impl ProgressRouter {
    pub fn new(observer: Arc<dyn JobObserver>) -> Self {
        Self::with_completed_memory(observer, DEFAULT_COMPLETED_MEMORY)
    }

    pub fn with_completed_memory(
        observer: Arc<dyn JobObserver>,
        completed_memory: usize,
    ) -> Self {
        Self {
            observer,
            jobs: Mutex::new(Jobs {
                live: HashMap::new(),
                completed: CompletedIds::new(completed_memory),
            }),
            stats: Mutex::new(RouterStats::default()),
        }
    }

    pub fn route(&self, event: ProgressEvent) -> Option<JobOutcome> {
        let tracker = {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            if jobs.completed.contains(&event.correlation_id) {
                debug!(
                    correlation_id = %event.correlation_id,
                    phase = %event.phase,
                    "event for completed job dropped"
                );
                return None;
            }
            match jobs.live.get(&event.correlation_id) {
                Some(tracker) => Arc::clone(tracker),
                None => {
                    let tracker = Arc::new(CompletionTracker::new(
                        event.correlation_id.clone(),
                    ));
                    jobs.live
                        .insert(event.correlation_id.clone(), Arc::clone(&tracker));
                    self.bump(|stats| stats.jobs_seen += 1);
                    tracker
                }
            }
        };

        let observation = tracker.observe(&event)?;
        self.bump(|stats| stats.events_observed += 1);
        self.observer.on_progress(&event, &observation.update);

        if let Some(outcome) = &observation.completed {
            {
                let mut jobs =
                    self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
                jobs.live.remove(&outcome.correlation_id);
                jobs.completed.insert(outcome.correlation_id.clone());
            }
            self.bump(|stats| stats.jobs_completed += 1);
            info!(
                correlation_id = %outcome.correlation_id,
                termination = %outcome.termination,
                discovered = outcome.discovered,
                "discovery pass finished"
            );
            self.observer.on_complete(outcome);
        }
        observation.completed
    }

    pub fn stats(&self) -> RouterStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Jobs with a tracker that has not resolved yet.
    pub fn live_jobs(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .len()
    }

    /// Completed ids currently remembered.
    pub fn remembered_completions(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .completed
            .len()
    }

    pub fn handler(self: &Arc<Self>) -> ProgressHandler {
        let router = Arc::clone(self);
        Arc::new(move |event| {
            router.route(event);
        })
    }

    fn bump(&self, update: impl FnOnce(&mut RouterStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }
}
