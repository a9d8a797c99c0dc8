use std::collections::HashMap;

use scout_model::{
    DiscoveryConfig, DiscoveryRequest, EntityCategory, EntityId, ScanMode,
    ScanRequest,
};

use crate::error::{Result, ScoutError};

/// Entities the caller has selected for the current session.
///
/// Passed explicitly to whatever needs defaults for missing arguments, and
/// cleared explicitly; nothing here is process-wide.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    selected: HashMap<EntityCategory, EntityId>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `id` for `category`, returning the previous selection.
    pub fn select(
        &mut self,
        category: EntityCategory,
        id: EntityId,
    ) -> Option<EntityId> {
        self.selected.insert(category, id)
    }

    pub fn clear(&mut self, category: EntityCategory) -> Option<EntityId> {
        self.selected.remove(&category)
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self, category: EntityCategory) -> Option<&EntityId> {
        self.selected.get(&category)
    }

    /// An explicit id wins over the session selection.
    pub fn resolve(
        &self,
        category: EntityCategory,
        explicit: Option<EntityId>,
    ) -> Result<EntityId> {
        explicit
            .or_else(|| self.selected(category).cloned())
            .ok_or(ScoutError::MissingSelection(category))
    }

    /// Scan command for the explicit or selected discoverer.
    pub fn scan_request(
        &self,
        explicit: Option<EntityId>,
        mode: ScanMode,
        config: Option<DiscoveryConfig>,
    ) -> Result<ScanRequest> {
        let discoverer = self.resolve(EntityCategory::Discoverer, explicit)?;
        Ok(ScanRequest::new(discoverer, mode, config)?)
    }

    /// Discovery job pinned to the explicit or selected discoverer, if any.
    pub fn discovery_request(
        &self,
        explicit: Option<EntityId>,
        mode: ScanMode,
    ) -> DiscoveryRequest {
        let request = DiscoveryRequest::new(mode);
        match explicit.or_else(|| {
            self.selected(EntityCategory::Discoverer).cloned()
        }) {
            Some(discoverer) => request.with_discoverer(discoverer),
            None => request,
        }
    }
}
