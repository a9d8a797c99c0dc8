//! Configuration loading and logging setup for Scout client processes.
#![allow(missing_docs)]

pub mod client;
pub mod telemetry;

pub use client::{
    CANCEL_GRACE_VAR, CONFIG_JSON_VAR, CONFIG_PATH_VAR, ClientConfig,
    ConfigFormat, ConfigSource, DEFAULT_LOG_FILTER,
};
pub use telemetry::init_tracing;
