use std::fmt::Debug;

use async_trait::async_trait;
use scout_model::{
    CorrelationId, DiscoveryConfig, DiscoveryRequest, EntityId, ScanMode,
    ServerRegistrationRequest,
};

use crate::error::ServiceError;

/// Remote service that accepts discovery jobs and scan-mode commands.
#[async_trait]
pub trait JobService: Send + Sync + Debug {
    async fn submit_discovery(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<(), ServiceError>;

    async fn submit_registration(
        &self,
        request: &ServerRegistrationRequest,
    ) -> Result<(), ServiceError>;

    /// Ask the service to cancel a job. The service confirms by emitting a
    /// terminal `Cancelled` event on the job's progress stream.
    async fn cancel(&self, id: &CorrelationId) -> Result<(), ServiceError>;

    async fn set_scan_mode(
        &self,
        discoverer: &EntityId,
        mode: ScanMode,
        config: Option<&DiscoveryConfig>,
    ) -> Result<(), ServiceError>;
}

/// Lookup of the entities the service currently knows about.
#[async_trait]
pub trait Directory: Send + Sync + Debug {
    async fn list_all_entities(
        &self,
        category: scout_model::EntityCategory,
    ) -> Result<Vec<EntityId>, ServiceError>;
}
