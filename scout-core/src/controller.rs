use std::sync::Arc;

use scout_contracts::{
    CategoryHandler, Directory, EventSource, JobService, ProgressHandler,
};
use scout_model::{
    CorrelationId, DiscoveryRequest, EntityCategory, EntityId, JobRequest,
    ScanMode, ScanRequest,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ControllerConfig;
use crate::error::{Result, ScoutError};
use crate::observer::JobObserver;
use crate::router::{ProgressRouter, RouterStats};
use crate::subscriptions::{
    CascadingSubscriptionSet, CompositeSubscription, SubscriptionHandle,
};
use crate::tracker::{Awaited, CompletionTracker, JobOutcome};

/// What to do when the caller stops monitoring before the job finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopAction {
    /// Stop listening and leave the job running on the service.
    #[default]
    Detach,
    /// Ask the service to cancel the job, then wait up to the configured
    /// grace period for its terminal event.
    CancelJob,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    Completed(JobOutcome),
    /// Monitoring was stopped by the caller. `outcome` is set when the
    /// terminal event still arrived during the cancel grace period.
    Stopped { outcome: Option<JobOutcome> },
}

impl MonitorOutcome {
    pub fn outcome(&self) -> Option<&JobOutcome> {
        match self {
            MonitorOutcome::Completed(outcome) => Some(outcome),
            MonitorOutcome::Stopped { outcome } => outcome.as_ref(),
        }
    }
}

/// Summary of a scan session returned once the discoverer was stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub discoverer: EntityId,
    pub mode: ScanMode,
    pub stats: RouterStats,
}

/// Drives discovery jobs on the remote service: submit, subscribe, wait for
/// the terminal phase or a stop signal, release.
#[derive(Debug, Clone)]
pub struct DiscoveryJobController {
    events: Arc<dyn EventSource>,
    jobs: Arc<dyn JobService>,
    directory: Arc<dyn Directory>,
    config: ControllerConfig,
}

impl DiscoveryJobController {
    pub fn new(
        events: Arc<dyn EventSource>,
        jobs: Arc<dyn JobService>,
        directory: Arc<dyn Directory>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            events,
            jobs,
            directory,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Discovery request in the configured default mode.
    pub fn discovery_request(&self) -> DiscoveryRequest {
        DiscoveryRequest::new(self.config.default_scan_mode)
    }

    /// Fire-and-forget submission; returns without subscribing.
    #[instrument(skip(self, request), fields(correlation_id = %request.id(), kind = request.kind()))]
    pub async fn submit(&self, request: JobRequest) -> Result<CorrelationId> {
        let request = self.prepare(request)?;
        self.submit_job(&request).await?;
        info!("job submitted");
        Ok(request.id().clone())
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: &CorrelationId) -> Result<()> {
        self.jobs.cancel(id).await.map_err(ScoutError::Submission)?;
        info!("cancel requested");
        Ok(())
    }

    /// Submits `request` and follows its progress until a terminal phase or
    /// until `stop` fires.
    ///
    /// The progress subscription is opened before the job is submitted so no
    /// event is missed, and it is released on every exit path.
    #[instrument(
        skip(self, request, observer, stop),
        fields(correlation_id = %request.id(), kind = request.kind())
    )]
    pub async fn run_monitored(
        &self,
        request: JobRequest,
        observer: Arc<dyn JobObserver>,
        stop: CancellationToken,
        on_stop: StopAction,
    ) -> Result<MonitorOutcome> {
        let request = self.prepare(request)?;
        let id = request.id().clone();
        let tracker = Arc::new(CompletionTracker::new(id.clone()));

        let subscription = self
            .events
            .subscribe_progress_by_correlation_id(
                &id,
                completion_handler(Arc::clone(&tracker), observer),
            )
            .await
            .map_err(ScoutError::subscription)?;
        let handle = SubscriptionHandle::new(format!("progress:{id}"), subscription);
        debug!("progress subscription acquired");

        handle
            .scoped(async {
                self.submit_job(&request).await?;
                info!("job submitted; awaiting completion");
                self.await_completion(&tracker, &stop, on_stop).await
            })
            .await
    }

    /// Puts a discoverer into scan mode until `stop` fires, then commands it
    /// back to `Off` and releases the progress subscription.
    #[instrument(
        skip(self, request, observer, stop),
        fields(discoverer = %request.discoverer, mode = %request.mode)
    )]
    pub async fn run_scan(
        &self,
        request: ScanRequest,
        observer: Arc<dyn JobObserver>,
        stop: CancellationToken,
    ) -> Result<ScanSummary> {
        request.validate()?;
        let config = request
            .config
            .clone()
            .or_else(|| self.config.discovery.clone());
        let router = Arc::new(ProgressRouter::new(observer));

        let subscription = self
            .events
            .subscribe_progress_by_entity_id(&request.discoverer, router.handler())
            .await
            .map_err(ScoutError::subscription)?;
        let handle = SubscriptionHandle::new(
            format!("scan:{}", request.discoverer),
            subscription,
        );

        handle
            .scoped(async {
                self.jobs
                    .set_scan_mode(&request.discoverer, request.mode, config.as_ref())
                    .await
                    .map_err(ScoutError::Submission)?;
                info!("discoverer scanning; waiting for stop");

                stop.cancelled().await;

                if self.config.stop_scan_on_exit {
                    self.jobs
                        .set_scan_mode(&request.discoverer, ScanMode::Off, None)
                        .await
                        .map_err(ScoutError::Submission)?;
                    info!("discoverer commanded off");
                }

                Ok(ScanSummary {
                    discoverer: request.discoverer.clone(),
                    mode: request.mode,
                    stats: router.stats(),
                })
            })
            .await
    }

    /// Subscribes to change events of every category given and, when
    /// discoverers are among them, to the progress of each discoverer known
    /// right now. The returned composite releases all of them in reverse
    /// acquisition order.
    #[instrument(skip(self, categories, observer), fields(category_count = categories.len()))]
    pub async fn run_monitor_all(
        &self,
        categories: &[EntityCategory],
        observer: Arc<dyn JobObserver>,
    ) -> Result<CompositeSubscription> {
        let set = Arc::new(CascadingSubscriptionSet::new());

        let category_handler: CategoryHandler = {
            let observer = Arc::clone(&observer);
            Arc::new(move |event| observer.on_category_event(&event))
        };
        set.acquire_each(categories.iter().copied(), |category| {
            let events = &self.events;
            let handler = Arc::clone(&category_handler);
            async move { events.subscribe_category_events(category, handler).await }
        })
        .await?;

        if categories.contains(&EntityCategory::Discoverer) {
            let discoverers = match self
                .directory
                .list_all_entities(EntityCategory::Discoverer)
                .await
            {
                Ok(discoverers) => discoverers,
                Err(err) => {
                    if let Err(release) = set.release_all().await {
                        warn!(error = %release, "release after lookup failure incomplete");
                    }
                    return Err(ScoutError::Directory(err));
                }
            };
            debug!(count = discoverers.len(), "fanning out over discoverers");

            let router = Arc::new(ProgressRouter::new(observer));
            set.acquire_each(discoverers, |discoverer| {
                let events = &self.events;
                let handler = router.handler();
                async move {
                    events
                        .subscribe_progress_by_entity_id(&discoverer, handler)
                        .await
                }
            })
            .await?;
        }

        info!(held = set.len().await, "monitoring all");
        Ok(set.as_composite())
    }

    fn prepare(&self, request: JobRequest) -> Result<JobRequest> {
        let request = match request {
            JobRequest::Discovery(mut discovery) => {
                if discovery.config.is_none() {
                    discovery.config = self.config.discovery.clone();
                }
                JobRequest::Discovery(discovery)
            }
            other => other,
        };
        request.validate()?;
        Ok(request)
    }

    async fn submit_job(&self, request: &JobRequest) -> Result<()> {
        match request {
            JobRequest::Discovery(discovery) => {
                self.jobs.submit_discovery(discovery).await
            }
            JobRequest::Registration(registration) => {
                self.jobs.submit_registration(registration).await
            }
        }
        .map_err(ScoutError::Submission)
    }

    async fn await_completion(
        &self,
        tracker: &CompletionTracker,
        stop: &CancellationToken,
        on_stop: StopAction,
    ) -> Result<MonitorOutcome> {
        match tracker.wait_or_stop(stop).await {
            Awaited::Completed(outcome) => {
                info!(
                    termination = %outcome.termination,
                    discovered = outcome.discovered,
                    "job reached terminal phase"
                );
                Ok(MonitorOutcome::Completed(outcome))
            }
            Awaited::Interrupted => match on_stop {
                StopAction::Detach => {
                    info!("monitoring stopped; job left running");
                    Ok(MonitorOutcome::Stopped {
                        outcome: tracker.outcome(),
                    })
                }
                StopAction::CancelJob => {
                    self.jobs
                        .cancel(tracker.correlation_id())
                        .await
                        .map_err(ScoutError::Submission)?;
                    info!("cancel requested; waiting for terminal event");

                    let outcome =
                        tokio::time::timeout(self.config.cancel_grace(), tracker.wait())
                            .await
                            .ok()
                            .flatten();
                    if outcome.is_none() {
                        warn!(
                            grace_ms = self.config.cancel_grace_ms,
                            "no terminal event within cancel grace period"
                        );
                    }
                    Ok(MonitorOutcome::Stopped { outcome })
                }
            },
        }
    }
}

fn completion_handler(
    tracker: Arc<CompletionTracker>,
    observer: Arc<dyn JobObserver>,
) -> ProgressHandler {
    Arc::new(move |event| {
        let Some(observation) = tracker.observe(&event) else {
            return;
        };
        observer.on_progress(&event, &observation.update);
        if let Some(outcome) = &observation.completed {
            observer.on_complete(outcome);
        }
    })
}
