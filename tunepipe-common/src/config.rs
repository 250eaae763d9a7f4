//! Configuration loading and resolution
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TUNEPIPE_*`, then the legacy `PORT` / `PYTHON_API`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together as [`ConfigOverrides`] (the binary parses them
//! with clap); this module layers them over the TOML file and the defaults and
//! produces one immutable [`Config`] that is built once at startup.

use crate::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_BIND_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_RESOLVER_URL: &str = "http://localhost:5050";
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";
pub const DEFAULT_BITRATE_KBPS: u32 = 192;
pub const DEFAULT_RESOLVER_TIMEOUT_SECS: u64 = 30;

/// Constant bitrates libmp3lame accepts for CBR output
pub const SUPPORTED_BITRATES_KBPS: [u32; 7] = [64, 96, 128, 160, 192, 256, 320];

/// Legacy environment variable for the listening port
pub const LEGACY_PORT_ENV: &str = "PORT";
/// Legacy environment variable for the resolution service base URL
pub const LEGACY_RESOLVER_ENV: &str = "PYTHON_API";

/// Resolved relay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP listening port
    pub port: u16,
    /// Interface to bind
    pub bind_address: IpAddr,
    /// Base URL of the resolution service (no trailing slash)
    pub resolver_url: String,
    /// Transcoder executable (name on PATH or absolute path)
    pub transcoder_path: PathBuf,
    /// Constant MP3 bitrate in kbps
    pub bitrate_kbps: u32,
    /// Timeout for a single resolution request
    pub resolver_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS,
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            transcoder_path: PathBuf::from(DEFAULT_TRANSCODER),
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            resolver_timeout: Duration::from_secs(DEFAULT_RESOLVER_TIMEOUT_SECS),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<IpAddr>,
    pub resolver_url: Option<String>,
    pub transcoder_path: Option<PathBuf>,
    pub bitrate_kbps: Option<u32>,
    pub resolver_timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Fill unset fields from the legacy `PORT` / `PYTHON_API` variables
    ///
    /// Blank values are treated as unset, so the defaults apply. An
    /// unparseable `PORT` is a configuration error rather than being ignored.
    pub fn with_legacy_env(mut self) -> Result<Self> {
        if self.port.is_none() {
            if let Some(raw) = non_blank_env(LEGACY_PORT_ENV) {
                let port = raw.parse::<u16>().map_err(|e| {
                    Error::Config(format!("{}={:?} is not a valid port: {}", LEGACY_PORT_ENV, raw, e))
                })?;
                self.port = Some(port);
            }
        }

        if self.resolver_url.is_none() {
            self.resolver_url = non_blank_env(LEGACY_RESOLVER_ENV);
        }

        Ok(self)
    }
}

/// Trimmed value of an environment variable, `None` when unset or blank
fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Optional settings read from `config.toml`
///
/// ```toml
/// port = 4000
/// bind_address = "127.0.0.1"
/// resolver_url = "http://localhost:5050"
/// transcoder_path = "/usr/bin/ffmpeg"
/// bitrate_kbps = 192
/// resolver_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<IpAddr>,
    pub resolver_url: Option<String>,
    pub transcoder_path: Option<PathBuf>,
    pub bitrate_kbps: Option<u32>,
    pub resolver_timeout_secs: Option<u64>,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Load the TOML tier
///
/// An explicitly requested file must exist. Without one the platform default
/// locations are checked and a missing file simply yields `None`.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<Option<TomlConfig>> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        return TomlConfig::parse(&content).map(Some);
    }

    match default_config_path() {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            info!("Loaded configuration from {}", path.display());
            TomlConfig::parse(&content).map(Some)
        }
        None => {
            debug!("No config file found, using command line, environment and defaults");
            Ok(None)
        }
    }
}

/// First existing default config file for the platform
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("tunepipe").join("config.toml"));
    let system_config = if cfg!(unix) {
        Some(PathBuf::from("/etc/tunepipe/config.toml"))
    } else {
        None
    };

    [user_config, system_config]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
}

impl Config {
    /// Layer overrides over the TOML file over compiled defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, file: Option<TomlConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Config::default();

        let resolver_url = overrides
            .resolver_url
            .or(file.resolver_url)
            .unwrap_or(defaults.resolver_url);

        let config = Config {
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            bind_address: overrides
                .bind_address
                .or(file.bind_address)
                .unwrap_or(defaults.bind_address),
            resolver_url: resolver_url.trim().trim_end_matches('/').to_string(),
            transcoder_path: overrides
                .transcoder_path
                .or(file.transcoder_path)
                .unwrap_or(defaults.transcoder_path),
            bitrate_kbps: overrides
                .bitrate_kbps
                .or(file.bitrate_kbps)
                .unwrap_or(defaults.bitrate_kbps),
            resolver_timeout: overrides
                .resolver_timeout_secs
                .or(file.resolver_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.resolver_timeout),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the relay cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }

        if self.resolver_url.is_empty() {
            return Err(Error::Config("resolver_url must not be empty".to_string()));
        }
        if !(self.resolver_url.starts_with("http://") || self.resolver_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "resolver_url must be an http(s) URL, got {:?}",
                self.resolver_url
            )));
        }

        if self.transcoder_path.as_os_str().is_empty() {
            return Err(Error::Config("transcoder_path must not be empty".to_string()));
        }

        if !SUPPORTED_BITRATES_KBPS.contains(&self.bitrate_kbps) {
            return Err(Error::Config(format!(
                "bitrate_kbps must be one of {:?}, got {}",
                SUPPORTED_BITRATES_KBPS, self.bitrate_kbps
            )));
        }

        if self.resolver_timeout.is_zero() {
            return Err(Error::Config("resolver_timeout_secs must be non-zero".to_string()));
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Full URL of the resolver's `get-audio` endpoint
    pub fn resolver_endpoint(&self) -> String {
        format!("{}/get-audio", self.resolver_url)
    }
}
