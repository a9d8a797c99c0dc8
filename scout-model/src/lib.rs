//! Data model shared by the Scout discovery client crates.
#![allow(missing_docs)]

pub mod discovery;
pub mod error;
pub mod events;
pub mod ids;
pub mod phase;
pub mod requests;

// Intentionally curated re-exports for downstream consumers.
pub use discovery::{
    AddressRange, DEFAULT_SERVER_PORT, DiscoveryConfig, PortRange, ScanMode,
};
pub use error::{ModelError, Result as ModelResult};
pub use events::{
    CategoryEvent, DETAIL_URL, EntityCategory, EntityChange, ProgressEvent,
};
pub use ids::{CorrelationId, EntityId};
pub use phase::{Phase, Termination};
pub use requests::{
    DiscoveryRequest, JobRequest, ScanRequest, ServerRegistrationRequest,
};
