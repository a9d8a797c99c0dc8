use thiserror::Error;

/// Failures raised by a push event source while opening, holding, or
/// releasing a subscription.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Subscription rejected: {0}")]
    Rejected(String),

    #[error("Event source unavailable: {0}")]
    Transport(String),

    #[error("Subscription closed by the event source")]
    Closed,

    #[error("Release failed: {0}")]
    ReleaseFailed(String),
}

/// Failures reported by the job-submission service or directory lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Transport(String),
}
