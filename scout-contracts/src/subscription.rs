use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::SubscriptionError;

/// An open channel of events from a push source.
///
/// Implementations stop delivery once `release` returns. Callers are not
/// required to serialise calls, so a second `release` must not fail just
/// because the first one already ran.
#[async_trait]
pub trait Subscription: Send + Sync + Debug {
    async fn release(&self) -> Result<(), SubscriptionError>;
}
