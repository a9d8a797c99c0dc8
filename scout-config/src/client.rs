use anyhow::{Context, anyhow};
use scout_core::ControllerConfig;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

pub const CONFIG_PATH_VAR: &str = "SCOUT_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "SCOUT_CONFIG_JSON";
pub const CANCEL_GRACE_VAR: &str = "SCOUT_CANCEL_GRACE";

pub const DEFAULT_LOG_FILTER: &str = "info,scout_core=info";

/// Source that produced the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Everything a Scout client process needs before it builds a controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Controller knobs: cancel grace period, scan shutdown behaviour, and
    /// the discovery defaults applied to requests that carry none.
    pub controller: ControllerConfig,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load client configuration using environment variables.
    /// Evaluation order:
    /// 1) `$SCOUT_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$SCOUT_CONFIG_JSON` (inline JSON),
    /// 3) the first default file found in the working directory,
    /// 4) defaults.
    ///
    /// A `.env` file is read first when present. `$SCOUT_CANCEL_GRACE`
    /// overrides the cancel grace period of whatever was loaded.
    pub fn load_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        let env_file_loaded = dotenvy::dotenv().map(|_| true).or_else(
            |err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            },
        )?;
        debug!(env_file_loaded, "environment prepared");

        Self::load_from_vars(|key| env::var(key).ok(), Path::new("."))
    }

    /// Same as [`ClientConfig::load_from_env`] but reads variables through
    /// `lookup` and searches default files under `base_dir`.
    pub fn load_from_vars(
        lookup: impl Fn(&str) -> Option<String>,
        base_dir: &Path,
    ) -> anyhow::Result<(Self, ConfigSource)> {
        let non_blank = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        let (mut config, source) =
            if let Some(path_str) = non_blank(CONFIG_PATH_VAR) {
                let path = PathBuf::from(path_str);
                let config = Self::load_from_file(&path)?;
                (config, ConfigSource::EnvPath(path))
            } else if let Some(raw) = non_blank(CONFIG_JSON_VAR) {
                let parsed = ConfigFormat::Json
                    .parse(&raw)
                    .with_context(|| format!("failed to parse {CONFIG_JSON_VAR}"))?;
                (parsed, ConfigSource::EnvInline)
            } else if let Some(path) = Self::find_default_file(base_dir) {
                let config = Self::load_from_file(&path)?;
                (config, ConfigSource::File(path))
            } else {
                (Self::default(), ConfigSource::Default)
            };

        if let Some(raw) = non_blank(CANCEL_GRACE_VAR) {
            config.apply_cancel_grace(&raw)?;
        }

        config.validate()?;
        Ok((config, source))
    }

    /// Reads `path` and parses it in the format its extension names. Files
    /// with any other extension are tried as each format in turn.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read scout config from {}", path.display())
        })?;
        let parsed = match ConfigFormat::from_path(path) {
            Some(format) => format.parse(&contents),
            None => Self::parse_any(&contents),
        };
        parsed.with_context(|| format!("invalid scout config {}", path.display()))
    }

    /// Parses `contents` as the first format that accepts it.
    pub fn parse_any(contents: &str) -> anyhow::Result<Self> {
        let mut rejections = Vec::with_capacity(ConfigFormat::ALL.len());
        for format in ConfigFormat::ALL {
            match format.parse(contents) {
                Ok(config) => return Ok(config),
                Err(err) => rejections.push(format!("{format} error: {err}")),
            }
        }
        Err(anyhow!("no config format matched; {}", rejections.join("; ")))
    }

    /// Rejects discovery defaults the service would refuse anyway.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(discovery) = &self.controller.discovery {
            discovery
                .validate()
                .context("invalid controller.discovery defaults")?;
        }
        Ok(())
    }

    fn apply_cancel_grace(&mut self, raw: &str) -> anyhow::Result<()> {
        let grace = humantime::parse_duration(raw.trim()).with_context(|| {
            format!("failed to parse {CANCEL_GRACE_VAR}={raw}")
        })?;
        self.controller.cancel_grace_ms = u64::try_from(grace.as_millis())
            .with_context(|| format!("{CANCEL_GRACE_VAR} is out of range"))?;
        Ok(())
    }

    /// `scout.<ext>` then `config/scout.<ext>`, TOML before JSON.
    fn find_default_file(base_dir: &Path) -> Option<PathBuf> {
        [base_dir.to_path_buf(), base_dir.join("config")]
            .into_iter()
            .flat_map(|dir| {
                ConfigFormat::ALL.map(|format| {
                    dir.join("scout").with_extension(format.extension())
                })
            })
            .find(|path| path.is_file())
    }
}

/// On-disk formats a client config may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Sniffing order for files without a known extension.
    pub const ALL: [ConfigFormat; 2] = [ConfigFormat::Toml, ConfigFormat::Json];

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" | "tml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    pub fn parse(self, contents: &str) -> anyhow::Result<ClientConfig> {
        let config = match self {
            Self::Toml => toml::from_str(contents)?,
            Self::Json => serde_json::from_str(contents)?,
        };
        Ok(config)
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
