//! Client-side controller for long-running discovery jobs.
//!
//! The crate classifies progress events ([`PhaseMachine`]), resolves one
//! completion per job ([`CompletionTracker`]), owns subscription lifetimes
//! ([`CascadingSubscriptionSet`]), and orchestrates submit, monitor, and
//! release ([`DiscoveryJobController`]).
#![allow(missing_docs)]

pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod phase_machine;
pub mod router;
pub mod session;
pub mod subscriptions;
pub mod tracker;

pub use config::ControllerConfig;
pub use controller::{
    DiscoveryJobController, MonitorOutcome, ScanSummary, StopAction,
};
pub use error::{ReleaseErrors, ReleaseFailure, Result, ScoutError};
pub use observer::{JobObserver, NoopObserver};
pub use phase_machine::{PhaseMachine, PhaseUpdate};
pub use router::{ProgressRouter, RouterStats};
pub use session::SessionContext;
pub use subscriptions::{
    CascadingSubscriptionSet, CompositeSubscription, SubscriptionHandle,
};
pub use tracker::{Awaited, CompletionTracker, JobOutcome, Observation};

pub use scout_contracts as contracts;
pub use scout_model as model;
