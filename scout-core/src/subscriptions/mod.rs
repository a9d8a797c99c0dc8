//! Ownership of push-source subscriptions: idempotent single handles and the
//! cascading set that releases many of them in reverse acquisition order.

pub mod cascade;
pub mod handle;

pub use cascade::{CascadingSubscriptionSet, CompositeSubscription};
pub use handle::SubscriptionHandle;
