//! Contracts for the push event source, job-submission service, and
//! directory lookup the Scout controller drives.
#![allow(missing_docs)]

pub mod error;
pub mod event_source;
pub mod job_service;
pub mod subscription;

pub use error::{ServiceError, SubscriptionError};
pub use event_source::{CategoryHandler, EventSource, ProgressHandler};
pub use job_service::{Directory, JobService};
pub use subscription::Subscription;
