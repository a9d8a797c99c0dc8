use url::Url;

use crate::discovery::{DiscoveryConfig, ScanMode};
use crate::error::{ModelError, Result};
use crate::ids::{CorrelationId, EntityId};

/// Ad-hoc discovery job submitted to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveryRequest {
    pub id: CorrelationId,
    /// Discoverer to run the job on; the service picks one when absent.
    pub discoverer: Option<EntityId>,
    pub mode: ScanMode,
    pub config: Option<DiscoveryConfig>,
}

impl DiscoveryRequest {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            id: CorrelationId::generate(),
            discoverer: None,
            mode,
            config: None,
        }
    }

    pub fn with_id(mut self, id: CorrelationId) -> Self {
        self.id = id;
        self
    }

    pub fn with_discoverer(mut self, discoverer: EntityId) -> Self {
        self.discoverer = Some(discoverer);
        self
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// `Off` is a stop command, not a job mode.
    pub fn validate(&self) -> Result<()> {
        if !self.mode.is_active() {
            return Err(ModelError::InvalidConfig(
                "mode `off` cannot be used to submit a discovery job".into(),
            ));
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }
}

/// Registration of a single, already known server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerRegistrationRequest {
    pub id: CorrelationId,
    pub discovery_url: String,
    /// Activate the registered endpoints once discovered.
    pub activate: bool,
}

impl ServerRegistrationRequest {
    pub fn new(discovery_url: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::generate(),
            discovery_url: discovery_url.into(),
            activate: false,
        }
    }

    pub fn with_id(mut self, id: CorrelationId) -> Self {
        self.id = id;
        self
    }

    pub fn activated(mut self) -> Self {
        self.activate = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(self.discovery_url.trim()).map_err(|err| {
            ModelError::InvalidConfig(format!(
                "discovery url `{}`: {err}",
                self.discovery_url
            ))
        })?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ModelError::InvalidConfig(format!(
                "discovery url `{}` has no host",
                self.discovery_url
            )));
        }
        Ok(())
    }
}

/// Either kind of job the controller can submit and monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobRequest {
    Discovery(DiscoveryRequest),
    Registration(ServerRegistrationRequest),
}

impl JobRequest {
    pub fn id(&self) -> &CorrelationId {
        match self {
            JobRequest::Discovery(request) => &request.id,
            JobRequest::Registration(request) => &request.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JobRequest::Discovery(_) => "discovery",
            JobRequest::Registration(_) => "registration",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            JobRequest::Discovery(request) => request.validate(),
            JobRequest::Registration(request) => request.validate(),
        }
    }
}

impl From<DiscoveryRequest> for JobRequest {
    fn from(value: DiscoveryRequest) -> Self {
        JobRequest::Discovery(value)
    }
}

impl From<ServerRegistrationRequest> for JobRequest {
    fn from(value: ServerRegistrationRequest) -> Self {
        JobRequest::Registration(value)
    }
}

/// Command putting one discoverer into an active scan mode until stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanRequest {
    pub discoverer: EntityId,
    pub mode: ScanMode,
    pub config: Option<DiscoveryConfig>,
}

impl ScanRequest {
    /// Rejects `ScanMode::Off` up front; stopping is the controller's job.
    pub fn new(
        discoverer: EntityId,
        mode: ScanMode,
        config: Option<DiscoveryConfig>,
    ) -> Result<Self> {
        let request = Self {
            discoverer,
            mode,
            config,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mode.is_active() {
            return Err(ModelError::InvalidConfig(
                "mode `off` cannot start a scan".into(),
            ));
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }
}
