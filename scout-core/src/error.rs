use scout_contracts::{ServiceError, SubscriptionError};
use scout_model::{EntityCategory, ModelError};
use thiserror::Error;

/// One handle that failed to release during a cascading release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    pub label: String,
    pub error: SubscriptionError,
}

/// Release failures collected while unwinding a set of subscriptions. Every
/// handle was still attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} subscription(s) failed to release", .failures.len())]
pub struct ReleaseErrors {
    pub failures: Vec<ReleaseFailure>,
}

impl ReleaseErrors {
    pub fn single(label: impl Into<String>, error: SubscriptionError) -> Self {
        Self {
            failures: vec![ReleaseFailure {
                label: label.into(),
                error,
            }],
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.label.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ModelError),

    #[error("Submission rejected: {0}")]
    Submission(#[source] ServiceError),

    #[error("Subscription failed: {source}")]
    Subscription {
        #[source]
        source: SubscriptionError,
        /// Failures hit while releasing siblings acquired before the failure.
        released_with_errors: Option<ReleaseErrors>,
    },

    #[error(transparent)]
    Release(#[from] ReleaseErrors),

    #[error("Directory lookup failed: {0}")]
    Directory(#[source] ServiceError),

    #[error("No {0} selected and none given")]
    MissingSelection(EntityCategory),
}

impl ScoutError {
    pub fn subscription(source: SubscriptionError) -> Self {
        ScoutError::Subscription {
            source,
            released_with_errors: None,
        }
    }

    /// Caller errors are raised before anything is sent to the service.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ScoutError::InvalidRequest(_) | ScoutError::MissingSelection(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
