use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use scout_model::{
    CategoryEvent, CorrelationId, EntityCategory, EntityId, ProgressEvent,
};

use crate::error::SubscriptionError;
use crate::subscription::Subscription;

/// Callback invoked for each progress event, in source order.
pub type ProgressHandler = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Callback invoked for each entity change notification.
pub type CategoryHandler = Arc<dyn Fn(CategoryEvent) + Send + Sync>;

/// Push source delivering notifications until the returned subscription is
/// released.
#[async_trait]
pub trait EventSource: Send + Sync + Debug {
    /// Progress of a single job. Events for one id arrive in emission order.
    async fn subscribe_progress_by_correlation_id(
        &self,
        id: &CorrelationId,
        handler: ProgressHandler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError>;

    /// Progress of every job a discoverer runs.
    async fn subscribe_progress_by_entity_id(
        &self,
        entity: &EntityId,
        handler: ProgressHandler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError>;

    async fn subscribe_category_events(
        &self,
        category: EntityCategory,
        handler: CategoryHandler,
    ) -> Result<Box<dyn Subscription>, SubscriptionError>;
}
