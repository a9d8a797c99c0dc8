use std::time::Duration;

use scout_model::{DiscoveryConfig, ScanMode};
use serde::{Deserialize, Serialize};

/// Knobs for [`crate::DiscoveryJobController`].
///
/// Every field carries a default so partial configuration files work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// After asking the service to cancel a job, how long to keep listening
    /// for its terminal event before releasing the subscription (ms).
    pub cancel_grace_ms: u64,
    /// Command the discoverer back to `Off` when a scan session ends.
    pub stop_scan_on_exit: bool,
    /// Mode used for discovery requests built without an explicit mode.
    pub default_scan_mode: ScanMode,
    /// Applied to discovery requests and scans that carry no config.
    pub discovery: Option<DiscoveryConfig>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cancel_grace_ms: 10_000,
            stop_scan_on_exit: true,
            default_scan_mode: ScanMode::Fast,
            discovery: None,
        }
    }
}

impl ControllerConfig {
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}
