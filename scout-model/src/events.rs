use std::collections::HashMap;
use std::fmt;

use crate::ids::{CorrelationId, EntityId};
use crate::phase::Phase;

/// Detail key the service uses for the URL currently being probed.
pub const DETAIL_URL: &str = "url";

/// One progress notification for a discovery job.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressEvent {
    pub correlation_id: CorrelationId,
    /// Discoverer that produced the event, when the source knows it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub discoverer_id: Option<EntityId>,
    pub phase: Phase,
    pub progress: u32,
    pub total: u32,
    pub discovered: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub result_detail: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub detail_map: HashMap<String, String>,
}

impl ProgressEvent {
    pub fn new(correlation_id: CorrelationId, phase: Phase) -> Self {
        Self {
            correlation_id,
            discoverer_id: None,
            phase,
            progress: 0,
            total: 0,
            discovered: 0,
            result_detail: None,
            detail_map: HashMap::new(),
        }
    }

    pub fn with_counts(mut self, progress: u32, total: u32) -> Self {
        self.progress = progress;
        self.total = total;
        self
    }

    pub fn with_discovered(mut self, discovered: u32) -> Self {
        self.discovered = discovered;
        self
    }

    pub fn with_result(mut self, detail: impl Into<String>) -> Self {
        self.result_detail = Some(detail.into());
        self
    }

    pub fn with_detail(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.detail_map.insert(key.into(), value.into());
        self
    }

    pub fn with_discoverer(mut self, discoverer: EntityId) -> Self {
        self.discoverer_id = Some(discoverer);
        self
    }

    pub fn probed_url(&self) -> Option<&str> {
        self.detail_map.get(DETAIL_URL).map(String::as_str)
    }
}

/// Entity categories the service publishes change notifications for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityCategory {
    Application,
    Endpoint,
    Supervisor,
    Publisher,
    Gateway,
    Discoverer,
    WriterGroup,
    DatasetWriter,
    DatasetVariable,
    DatasetEvent,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 10] = [
        EntityCategory::Application,
        EntityCategory::Endpoint,
        EntityCategory::Supervisor,
        EntityCategory::Publisher,
        EntityCategory::Gateway,
        EntityCategory::Discoverer,
        EntityCategory::WriterGroup,
        EntityCategory::DatasetWriter,
        EntityCategory::DatasetVariable,
        EntityCategory::DatasetEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityCategory::Application => "application",
            EntityCategory::Endpoint => "endpoint",
            EntityCategory::Supervisor => "supervisor",
            EntityCategory::Publisher => "publisher",
            EntityCategory::Gateway => "gateway",
            EntityCategory::Discoverer => "discoverer",
            EntityCategory::WriterGroup => "writer_group",
            EntityCategory::DatasetWriter => "dataset_writer",
            EntityCategory::DatasetVariable => "dataset_variable",
            EntityCategory::DatasetEvent => "dataset_event",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityChange {
    New,
    Updated,
    Deleted,
}

/// Change notification for one entity in a monitored category.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryEvent {
    pub category: EntityCategory,
    pub change: EntityChange,
    pub entity_id: EntityId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: HashMap<String, String>,
}

impl CategoryEvent {
    pub fn new(
        category: EntityCategory,
        change: EntityChange,
        entity_id: EntityId,
    ) -> Self {
        Self {
            category,
            change,
            entity_id,
            attributes: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probed_url_reads_the_url_detail() {
        let id = CorrelationId::parse("reg-1").unwrap();
        let bare = ProgressEvent::new(id.clone(), Phase::Started);
        assert_eq!(bare.probed_url(), None);

        let probing = ProgressEvent::new(id, Phase::EndpointsDiscoveryStarted)
            .with_detail("attempt", "2")
            .with_detail(DETAIL_URL, "opc.tcp://plc-7:4840");
        assert_eq!(probing.probed_url(), Some("opc.tcp://plc-7:4840"));
    }
}
