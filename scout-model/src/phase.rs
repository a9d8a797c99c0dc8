use std::fmt;

/// Stage of a discovery job as reported by the remote service.
///
/// Variants are declared in the order a well-behaved job traverses them.
/// Registration-only jobs skip the scan phases, and the progress phases may
/// repeat any number of times (including zero). `Cancelled` and `Error` can
/// follow any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Pending,
    Started,
    NetworkScanStarted,
    NetworkScanProgress,
    NetworkScanFinished,
    PortScanStarted,
    PortScanProgress,
    PortScanFinished,
    ServerDiscoveryStarted,
    EndpointsDiscoveryStarted,
    EndpointsDiscoveryFinished,
    ServerDiscoveryFinished,
    Finished,
    Cancelled,
    Error,
}

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    Success,
    Cancelled,
    Failed,
}

impl Phase {
    pub const ALL: [Phase; 15] = [
        Phase::Pending,
        Phase::Started,
        Phase::NetworkScanStarted,
        Phase::NetworkScanProgress,
        Phase::NetworkScanFinished,
        Phase::PortScanStarted,
        Phase::PortScanProgress,
        Phase::PortScanFinished,
        Phase::ServerDiscoveryStarted,
        Phase::EndpointsDiscoveryStarted,
        Phase::EndpointsDiscoveryFinished,
        Phase::ServerDiscoveryFinished,
        Phase::Finished,
        Phase::Cancelled,
        Phase::Error,
    ];

    /// Terminal classification; `None` for every non-terminal phase.
    pub fn termination(self) -> Option<Termination> {
        match self {
            Phase::Finished => Some(Termination::Success),
            Phase::Cancelled => Some(Termination::Cancelled),
            Phase::Error => Some(Termination::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.termination().is_some()
    }

    /// Phases that the service emits repeatedly as counters advance.
    pub fn is_progress_tick(self) -> bool {
        matches!(self, Phase::NetworkScanProgress | Phase::PortScanProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Started => "started",
            Phase::NetworkScanStarted => "network_scan_started",
            Phase::NetworkScanProgress => "network_scan_progress",
            Phase::NetworkScanFinished => "network_scan_finished",
            Phase::PortScanStarted => "port_scan_started",
            Phase::PortScanProgress => "port_scan_progress",
            Phase::PortScanFinished => "port_scan_finished",
            Phase::ServerDiscoveryStarted => "server_discovery_started",
            Phase::EndpointsDiscoveryStarted => "endpoints_discovery_started",
            Phase::EndpointsDiscoveryFinished => "endpoints_discovery_finished",
            Phase::ServerDiscoveryFinished => "server_discovery_finished",
            Phase::Finished => "finished",
            Phase::Cancelled => "cancelled",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Success => write!(f, "success"),
            Termination::Cancelled => write!(f, "cancelled"),
            Termination::Failed => write!(f, "failed"),
        }
    }
}
