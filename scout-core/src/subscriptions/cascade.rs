use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use scout_contracts::{Subscription, SubscriptionError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::handle::{SubscriptionHandle, release_detached};
use crate::error::{ReleaseErrors, ReleaseFailure, Result, ScoutError};

/// Ordered arena of subscriptions released last-in, first-out.
///
/// A failed acquisition releases everything acquired before it, so a
/// partially built fan-out never leaks subscriptions. Dropping the set with
/// handles still held releases them in the background, in the same order.
#[derive(Default)]
pub struct CascadingSubscriptionSet {
    handles: Mutex<Vec<SubscriptionHandle>>,
}

impl fmt::Debug for CascadingSubscriptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held = self.handles.try_lock().ok().map(|guard| guard.len());
        f.debug_struct("CascadingSubscriptionSet")
            .field("held", &held)
            .finish()
    }
}

impl CascadingSubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.lock().await.is_empty()
    }

    /// Labels of held handles in acquisition order.
    pub async fn labels(&self) -> Vec<String> {
        let guard = self.handles.lock().await;
        guard.iter().map(|handle| handle.label().to_string()).collect()
    }

    /// Opens one more subscription and appends it. Returns its position in
    /// acquisition order.
    pub async fn acquire<F, Fut>(
        &self,
        label: impl Into<String>,
        factory: F,
    ) -> Result<usize>
    where
        F: FnOnce() -> Fut,
        Fut: Future<
                Output = std::result::Result<
                    Box<dyn Subscription>,
                    SubscriptionError,
                >,
            >,
    {
        let label = label.into();
        match factory().await {
            Ok(subscription) => {
                let mut guard = self.handles.lock().await;
                guard.push(SubscriptionHandle::new(label.clone(), subscription));
                debug!(label = %label, held = guard.len(), "subscription acquired");
                Ok(guard.len() - 1)
            }
            Err(source) => {
                warn!(
                    label = %label,
                    error = %source,
                    "subscription failed; unwinding acquired siblings"
                );
                let released_with_errors = self.release_all().await.err();
                Err(ScoutError::Subscription {
                    source,
                    released_with_errors,
                })
            }
        }
    }

    /// Acquires one subscription per item, in iteration order. Stops and
    /// unwinds everything on the first failure.
    pub async fn acquire_each<T, I, F, Fut>(
        &self,
        items: I,
        mut factory: F,
    ) -> Result<usize>
    where
        T: Display,
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Fut,
        Fut: Future<
                Output = std::result::Result<
                    Box<dyn Subscription>,
                    SubscriptionError,
                >,
            >,
    {
        let mut acquired = 0;
        for item in items {
            let label = item.to_string();
            self.acquire(label, || factory(item)).await?;
            acquired += 1;
        }
        Ok(acquired)
    }

    /// Releases every held handle in reverse acquisition order. Individual
    /// failures are collected and the remaining handles are still released.
    pub async fn release_all(&self) -> std::result::Result<(), ReleaseErrors> {
        let drained = std::mem::take(&mut *self.handles.lock().await);
        if drained.is_empty() {
            return Ok(());
        }

        let mut failures = Vec::new();
        for handle in drained.into_iter().rev() {
            if let Err(error) = handle.release().await {
                warn!(
                    label = %handle.label(),
                    error = %error,
                    "subscription release failed; continuing"
                );
                failures.push(ReleaseFailure {
                    label: handle.label().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReleaseErrors { failures })
        }
    }

    /// Exposes the whole set as one releasable resource.
    pub fn as_composite(self: &Arc<Self>) -> CompositeSubscription {
        CompositeSubscription {
            set: Arc::clone(self),
        }
    }
}

impl Drop for CascadingSubscriptionSet {
    fn drop(&mut self) {
        let pending: Vec<_> = self
            .handles
            .get_mut()
            .iter_mut()
            .rev()
            .filter_map(|handle| {
                let label = handle.label().to_string();
                handle.detach().map(|inner| (label, inner))
            })
            .collect();
        if !pending.is_empty() {
            warn!(count = pending.len(), "subscription set dropped before release_all");
        }
        release_detached(pending);
    }
}

/// A [`CascadingSubscriptionSet`] seen as a single subscription.
#[derive(Debug, Clone)]
pub struct CompositeSubscription {
    set: Arc<CascadingSubscriptionSet>,
}

impl CompositeSubscription {
    pub fn members(&self) -> &CascadingSubscriptionSet {
        &self.set
    }

    /// Releases all members; see [`CascadingSubscriptionSet::release_all`].
    pub async fn release_all(&self) -> std::result::Result<(), ReleaseErrors> {
        self.set.release_all().await
    }
}

#[async_trait]
impl Subscription for CompositeSubscription {
    async fn release(&self) -> std::result::Result<(), SubscriptionError> {
        self.set.release_all().await.map_err(|errors| {
            let labels = errors.labels().collect::<Vec<_>>().join(", ");
            SubscriptionError::ReleaseFailed(format!("{errors}: {labels}"))
        })
    }
}
