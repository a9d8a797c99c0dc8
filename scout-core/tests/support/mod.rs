#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scout_core::contracts::{
    CategoryHandler, Directory, EventSource, JobService, ProgressHandler,
    ServiceError, Subscription, SubscriptionError,
};
use scout_core::model::{
    CategoryEvent, CorrelationId, DiscoveryConfig, DiscoveryRequest,
    EntityCategory, EntityId, Phase, ProgressEvent, ScanMode,
    ServerRegistrationRequest,
};
use scout_core::{JobObserver, JobOutcome, PhaseUpdate};

/// Shared, ordered record of everything the fakes were asked to do.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn correlation(raw: &str) -> CorrelationId {
    CorrelationId::parse(raw).unwrap()
}

pub fn entity(raw: &str) -> EntityId {
    EntityId::parse(raw).unwrap()
}

enum Route {
    Correlation(CorrelationId),
    Entity(EntityId),
    Category(EntityCategory),
}

enum Handler {
    Progress(ProgressHandler),
    Category(CategoryHandler),
}

struct Registration {
    key: String,
    route: Route,
    handler: Handler,
}

#[derive(Default)]
struct SourceState {
    registrations: HashMap<u64, Registration>,
    next_token: u64,
    subscribe_calls: usize,
    fail_subscribe_at: Option<usize>,
    fail_release: HashSet<String>,
    release_calls: Vec<String>,
}

/// In-memory push source. Handlers run synchronously inside `emit_*`.
#[derive(Clone, Default)]
pub struct FakeEventSource {
    inner: Arc<Mutex<SourceState>>,
    journal: Journal,
}

impl fmt::Debug for FakeEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.inner.lock().unwrap().registrations.len();
        f.debug_struct("FakeEventSource")
            .field("active", &active)
            .finish()
    }
}

impl FakeEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        Arc::clone(&self.journal)
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Makes the `nth` subscribe call (1-based) fail.
    pub fn fail_subscribe_at(&self, nth: usize) {
        self.inner.lock().unwrap().fail_subscribe_at = Some(nth);
    }

    pub fn fail_release_of(&self, key: &str) {
        self.inner.lock().unwrap().fail_release.insert(key.to_string());
    }

    pub fn active(&self) -> usize {
        self.inner.lock().unwrap().registrations.len()
    }

    pub fn release_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().release_calls.clone()
    }

    /// Delivers to correlation and discoverer subscriptions. Returns how many
    /// handlers saw the event.
    pub fn emit_progress(&self, event: ProgressEvent) -> usize {
        let handlers: Vec<ProgressHandler> = {
            let guard = self.inner.lock().unwrap();
            let mut tokens: Vec<_> = guard.registrations.keys().copied().collect();
            tokens.sort_unstable();
            tokens
                .into_iter()
                .filter_map(|token| {
                    let registration = &guard.registrations[&token];
                    let matches = match &registration.route {
                        Route::Correlation(id) => *id == event.correlation_id,
                        Route::Entity(id) => {
                            event.discoverer_id.as_ref() == Some(id)
                        }
                        Route::Category(_) => false,
                    };
                    match (&registration.handler, matches) {
                        (Handler::Progress(handler), true) => {
                            Some(Arc::clone(handler))
                        }
                        _ => None,
                    }
                })
                .collect()
        };

        for handler in &handlers {
            handler(event.clone());
        }
        handlers.len()
    }

    pub fn emit_category(&self, event: CategoryEvent) -> usize {
        let handlers: Vec<CategoryHandler> = {
            let guard = self.inner.lock().unwrap();
            guard
                .registrations
                .values()
                .filter_map(|registration| match (&registration.route, &registration.handler) {
                    (Route::Category(category), Handler::Category(handler))
                        if *category == event.category =>
                    {
                        Some(Arc::clone(handler))
                    }
                    _ => None,
                })
                .collect()
        };

        for handler in &handlers {
            handler(event.clone());
        }
        handlers.len()
    }

    fn register(
        &self,
        key: String,
        route: Route,
        handler: Handler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError> {
        let mut guard = self.inner.lock().unwrap();
        guard.subscribe_calls += 1;
        if guard.fail_subscribe_at == Some(guard.subscribe_calls) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("subscribe-failed {key}"));
            return Err(SubscriptionError::Transport(format!(
                "refused {key}"
            )));
        }

        guard.next_token += 1;
        let token = guard.next_token;
        guard.registrations.insert(
            token,
            Registration {
                key: key.clone(),
                route,
                handler,
            },
        );
        self.journal.lock().unwrap().push(format!("subscribe {key}"));

        Ok(Box::new(FakeSubscription {
            key,
            token,
            source: self.clone(),
        }))
    }
}

#[async_trait]
impl EventSource for FakeEventSource {
    async fn subscribe_progress_by_correlation_id(
        &self,
        id: &CorrelationId,
        handler: ProgressHandler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError> {
        self.register(
            format!("progress:{id}"),
            Route::Correlation(id.clone()),
            Handler::Progress(handler),
        )
    }

    async fn subscribe_progress_by_entity_id(
        &self,
        entity: &EntityId,
        handler: ProgressHandler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError> {
        self.register(
            format!("entity:{entity}"),
            Route::Entity(entity.clone()),
            Handler::Progress(handler),
        )
    }

    async fn subscribe_category_events(
        &self,
        category: EntityCategory,
        handler: CategoryHandler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError> {
        self.register(
            format!("category:{category}"),
            Route::Category(category),
            Handler::Category(handler),
        )
    }
}

struct FakeSubscription {
    key: String,
    token: u64,
    source: FakeEventSource,
}

impl fmt::Debug for FakeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeSubscription")
            .field("key", &self.key)
            .finish()
    }
}

#[async_trait]
impl Subscription for FakeSubscription {
    async fn release(&self) -> Result<(), SubscriptionError> {
        let mut guard = self.source.inner.lock().unwrap();
        guard.registrations.remove(&self.token);
        guard.release_calls.push(self.key.clone());
        self.source
            .journal
            .lock()
            .unwrap()
            .push(format!("release {}", self.key));
        if guard.fail_release.contains(&self.key) {
            return Err(SubscriptionError::ReleaseFailed(self.key.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCall {
    SubmitDiscovery(CorrelationId),
    SubmitRegistration(CorrelationId),
    Cancel(CorrelationId),
    SetScanMode(EntityId, ScanMode, Option<DiscoveryConfig>),
}

#[derive(Debug, Default)]
struct JobState {
    calls: Vec<JobCall>,
    submitted_configs: Vec<Option<DiscoveryConfig>>,
    reject_submit: Option<ServiceError>,
    reject_scan_mode: Option<ServiceError>,
    reject_scan_off: Option<ServiceError>,
    reject_cancel: Option<ServiceError>,
    scripted: HashMap<CorrelationId, Vec<ProgressEvent>>,
    confirm_cancel: bool,
}

/// Job service double. Scripted events are pushed through the fake source
/// while the submit call is in flight, like a fast remote service would.
#[derive(Debug, Clone)]
pub struct RecordingJobService {
    inner: Arc<Mutex<JobState>>,
    source: FakeEventSource,
}

impl RecordingJobService {
    pub fn new(source: FakeEventSource) -> Self {
        Self {
            inner: Arc::default(),
            source,
        }
    }

    pub fn script(&self, id: &CorrelationId, events: Vec<ProgressEvent>) {
        self.inner
            .lock()
            .unwrap()
            .scripted
            .insert(id.clone(), events);
    }

    pub fn reject_submissions(&self, error: ServiceError) {
        self.inner.lock().unwrap().reject_submit = Some(error);
    }

    pub fn reject_scan_mode(&self, error: ServiceError) {
        self.inner.lock().unwrap().reject_scan_mode = Some(error);
    }

    /// Fail `Off` requests; active modes are unaffected.
    pub fn reject_scan_off(&self, error: ServiceError) {
        self.inner.lock().unwrap().reject_scan_off = Some(error);
    }

    pub fn reject_cancel(&self, error: ServiceError) {
        self.inner.lock().unwrap().reject_cancel = Some(error);
    }

    /// Emit a `Cancelled` event when a cancel request arrives.
    pub fn confirm_cancel(&self) {
        self.inner.lock().unwrap().confirm_cancel = true;
    }

    pub fn calls(&self) -> Vec<JobCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn submitted_configs(&self) -> Vec<Option<DiscoveryConfig>> {
        self.inner.lock().unwrap().submitted_configs.clone()
    }

    fn accept(&self, call: JobCall, id: &CorrelationId) -> Result<(), ServiceError> {
        let scripted = {
            let mut guard = self.inner.lock().unwrap();
            self.source
                .journal()
                .lock()
                .unwrap()
                .push(format!("submit {id}"));
            guard.calls.push(call);
            if let Some(error) = guard.reject_submit.clone() {
                return Err(error);
            }
            guard.scripted.remove(id).unwrap_or_default()
        };

        for event in scripted {
            self.source.emit_progress(event);
        }
        Ok(())
    }
}

#[async_trait]
impl JobService for RecordingJobService {
    async fn submit_discovery(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<(), ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .submitted_configs
            .push(request.config.clone());
        self.accept(JobCall::SubmitDiscovery(request.id.clone()), &request.id)
    }

    async fn submit_registration(
        &self,
        request: &ServerRegistrationRequest,
    ) -> Result<(), ServiceError> {
        self.accept(JobCall::SubmitRegistration(request.id.clone()), &request.id)
    }

    async fn cancel(&self, id: &CorrelationId) -> Result<(), ServiceError> {
        let (confirm, rejection) = {
            let mut guard = self.inner.lock().unwrap();
            guard.calls.push(JobCall::Cancel(id.clone()));
            (guard.confirm_cancel, guard.reject_cancel.clone())
        };
        self.source
            .journal()
            .lock()
            .unwrap()
            .push(format!("cancel {id}"));
        if let Some(error) = rejection {
            return Err(error);
        }
        if confirm {
            self.source.emit_progress(
                ProgressEvent::new(id.clone(), Phase::Cancelled)
                    .with_result("cancelled by request"),
            );
        }
        Ok(())
    }

    async fn set_scan_mode(
        &self,
        discoverer: &EntityId,
        mode: ScanMode,
        config: Option<&DiscoveryConfig>,
    ) -> Result<(), ServiceError> {
        let mut guard = self.inner.lock().unwrap();
        let call = JobCall::SetScanMode(discoverer.clone(), mode, config.cloned());
        self.source
            .journal()
            .lock()
            .unwrap()
            .push(format!("scan-mode {discoverer} {mode}"));
        guard.calls.push(call);
        if mode.is_active()
            && let Some(error) = guard.reject_scan_mode.clone()
        {
            return Err(error);
        }
        if mode == ScanMode::Off
            && let Some(error) = guard.reject_scan_off.clone()
        {
            return Err(error);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entities: Arc<Mutex<HashMap<EntityCategory, Vec<EntityId>>>>,
    failure: Arc<Mutex<Option<ServiceError>>>,
}

impl StaticDirectory {
    pub fn with(category: EntityCategory, ids: &[&str]) -> Self {
        let directory = Self::default();
        directory
            .entities
            .lock()
            .unwrap()
            .insert(category, ids.iter().map(|raw| entity(raw)).collect());
        directory
    }

    pub fn fail_with(&self, error: ServiceError) {
        *self.failure.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn list_all_entities(
        &self,
        category: EntityCategory,
    ) -> Result<Vec<EntityId>, ServiceError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self
            .entities
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .unwrap_or_default())
    }
}

/// Observer that keeps everything it is told.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<(Phase, PhaseUpdate)>>,
    pub completions: Mutex<Vec<JobOutcome>>,
    pub category_events: Mutex<Vec<CategoryEvent>>,
}

impl RecordingObserver {
    pub fn phases(&self) -> Vec<Phase> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .map(|(phase, _)| *phase)
            .collect()
    }

    pub fn completions(&self) -> Vec<JobOutcome> {
        self.completions.lock().unwrap().clone()
    }
}

impl JobObserver for RecordingObserver {
    fn on_progress(&self, event: &ProgressEvent, update: &PhaseUpdate) {
        self.progress
            .lock()
            .unwrap()
            .push((event.phase, update.clone()));
    }

    fn on_complete(&self, outcome: &JobOutcome) {
        self.completions.lock().unwrap().push(outcome.clone());
    }

    fn on_category_event(&self, event: &CategoryEvent) {
        self.category_events.lock().unwrap().push(event.clone());
    }
}
