use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ipnetwork::IpNetwork;

use crate::error::{ModelError, Result};

/// Well-known port discovery servers listen on.
pub const DEFAULT_SERVER_PORT: u16 = 4840;

/// Operating mode a discoverer is commanded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanMode {
    /// Stop scanning. Only meaningful as a "stop" command, never as a job mode.
    Off,
    /// Local subnets and default ports with short probe timeouts.
    #[default]
    Fast,
    /// Full scan of the configured address and port ranges.
    Scan,
}

impl ScanMode {
    pub fn is_active(self) -> bool {
        !matches!(self, ScanMode::Off)
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Off => write!(f, "off"),
            ScanMode::Fast => write!(f, "fast"),
            ScanMode::Scan => write!(f, "scan"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(ScanMode::Off),
            "fast" => Ok(ScanMode::Fast),
            "scan" => Ok(ScanMode::Scan),
            other => Err(ModelError::InvalidConfig(format!(
                "unknown scan mode `{other}`"
            ))),
        }
    }
}

/// Inclusive port range; a single port has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start == 0 {
            return Err(ModelError::InvalidRange(
                "port 0 is not probeable".into(),
            ));
        }
        if start > end {
            return Err(ModelError::InvalidRange(format!(
                "port range {start}-{end} is inverted"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(port: u16) -> Result<Self> {
        Self::new(port, port)
    }

    pub fn len(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    /// Parses a comma or semicolon separated list such as `80,443,1000-2000`.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        split_list(raw).map(str::parse).collect()
    }
}

impl FromStr for PortRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let parse_port = |value: &str| {
            value.trim().parse::<u16>().map_err(|err| {
                ModelError::InvalidRange(format!("`{s}`: {err}"))
            })
        };

        match s.split_once('-') {
            Some((start, end)) => {
                Self::new(parse_port(start)?, parse_port(end)?)
            }
            None => Self::single(parse_port(s)?),
        }
    }
}

impl TryFrom<String> for PortRange {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PortRange> for String {
    fn from(value: PortRange) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Address block to probe, in CIDR notation. A bare address is a /32 (or /128).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct AddressRange(pub IpNetwork);

impl AddressRange {
    pub fn network(&self) -> IpNetwork {
        self.0
    }

    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        split_list(raw).map(str::parse).collect()
    }
}

impl FromStr for AddressRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<IpNetwork>()
            .map(AddressRange)
            .map_err(|err| ModelError::InvalidRange(format!("`{s}`: {err}")))
    }
}

impl TryFrom<String> for AddressRange {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AddressRange> for String {
    fn from(value: AddressRange) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

/// Scan tuning sent along with a discovery request or scan-mode command.
///
/// Unset fields leave the choice to the discoverer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiscoveryConfig {
    pub address_ranges: Vec<AddressRange>,
    pub port_ranges: Vec<PortRange>,
    /// Upper bound on concurrent network (ping) probes.
    pub max_network_probes: Option<u32>,
    /// Upper bound on concurrent port probes.
    pub max_port_probes: Option<u32>,
    pub network_probe_timeout_ms: Option<u64>,
    pub port_probe_timeout_ms: Option<u64>,
    /// Idle time between two scan passes while a discoverer stays in scan mode.
    pub idle_time_between_scans_ms: Option<u64>,
}

impl DiscoveryConfig {
    /// Preset paired with [`ScanMode::Fast`].
    pub fn fast() -> Self {
        Self {
            address_ranges: Vec::new(),
            port_ranges: vec![PortRange {
                start: DEFAULT_SERVER_PORT,
                end: DEFAULT_SERVER_PORT,
            }],
            max_network_probes: Some(1_000),
            max_port_probes: Some(1_000),
            network_probe_timeout_ms: Some(1_000),
            port_probe_timeout_ms: Some(1_000),
            idle_time_between_scans_ms: None,
        }
    }

    pub fn network_probe_timeout(&self) -> Option<Duration> {
        self.network_probe_timeout_ms.map(Duration::from_millis)
    }

    pub fn port_probe_timeout(&self) -> Option<Duration> {
        self.port_probe_timeout_ms.map(Duration::from_millis)
    }

    pub fn idle_time_between_scans(&self) -> Option<Duration> {
        self.idle_time_between_scans_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        for range in &self.port_ranges {
            PortRange::new(range.start, range.end)?;
        }

        let limits = [
            ("max_network_probes", self.max_network_probes.map(u64::from)),
            ("max_port_probes", self.max_port_probes.map(u64::from)),
            ("network_probe_timeout_ms", self.network_probe_timeout_ms),
            ("port_probe_timeout_ms", self.port_probe_timeout_ms),
        ];
        for (name, value) in limits {
            if value == Some(0) {
                return Err(ModelError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}
