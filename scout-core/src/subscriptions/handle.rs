use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use scout_contracts::{Subscription, SubscriptionError};
use tracing::{debug, warn};

use crate::error::{ReleaseErrors, Result, ScoutError};

/// Owned, releasable subscription.
///
/// The wrapped subscription is released at most once no matter how many
/// paths call [`SubscriptionHandle::release`]. A handle dropped before it was
/// released (for example because the future owning it was dropped) hands the
/// release to the current tokio runtime.
pub struct SubscriptionHandle {
    label: String,
    inner: Arc<dyn Subscription>,
    released: AtomicBool,
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("label", &self.label)
            .field("released", &self.is_released())
            .finish()
    }
}

impl SubscriptionHandle {
    pub fn new(label: impl Into<String>, inner: Box<dyn Subscription>) -> Self {
        Self {
            label: label.into(),
            inner: Arc::from(inner),
            released: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub async fn release(&self) -> std::result::Result<(), SubscriptionError> {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!(label = %self.label, "subscription already released");
            return Ok(());
        }
        debug!(label = %self.label, "releasing subscription");
        self.inner.release().await
    }

    /// Marks the handle released without releasing it and hands back the
    /// subscription, or `None` when it was already released.
    pub(crate) fn detach(&mut self) -> Option<Arc<dyn Subscription>> {
        if std::mem::replace(self.released.get_mut(), true) {
            None
        } else {
            Some(Arc::clone(&self.inner))
        }
    }

    /// Runs `body` and then releases the subscription, whatever the body
    /// returned. A release failure only surfaces when the body succeeded.
    pub async fn scoped<T, F>(&self, body: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = body.await;
        let released = self.release().await;

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => {
                Err(ScoutError::Release(ReleaseErrors::single(&self.label, err)))
            }
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(
                    label = %self.label,
                    error = %release_err,
                    "release failed while unwinding an earlier error"
                );
                Err(err)
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let label = std::mem::take(&mut self.label);
        if let Some(inner) = self.detach() {
            release_detached(vec![(label, inner)]);
        }
    }
}

/// Releases subscriptions whose owner went away, in the given order, on the
/// current runtime. Without a runtime the subscriptions are leaked with a
/// warning.
pub(crate) fn release_detached(pending: Vec<(String, Arc<dyn Subscription>)>) {
    if pending.is_empty() {
        return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        for (label, _) in &pending {
            warn!(label = %label, "subscription dropped outside a runtime; not released");
        }
        return;
    };

    runtime.spawn(async move {
        for (label, inner) in pending {
            match inner.release().await {
                Ok(()) => debug!(label = %label, "released dropped subscription"),
                Err(error) => warn!(
                    label = %label,
                    error = %error,
                    "release of dropped subscription failed"
                ),
            }
        }
    });
}
