//! Router configuration.
//!
//! Everything has a default, so a config file only needs the parts it
//! changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::linking::LinkerConfig;
use crate::routing::SearchConfig;

/// Errors from loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The file is not valid JSON for this structure
    #[error("invalid configuration: {message}")]
    Parse { message: String },

    /// An updater needs an API URL that was not given
    #[error("no API URL configured for {0}")]
    MissingEndpoint(&'static str),

    /// An updater would poll continuously
    #[error("poll period for {0} must be positive")]
    InvalidPollPeriod(String),
}

fn poll_period(secs: u64, feed: &str) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidPollPeriod(feed.to_string()));
    }
    Ok(Duration::from_secs(secs))
}

/// Shared-vehicle position feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleFeedConfig {
    pub url: Option<String>,
    /// Sent as the `x-apikey` header when set.
    pub api_key: Option<String>,
    pub poll_period_secs: u64,
    pub timeout_secs: u64,
}

impl Default for VehicleFeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            poll_period_secs: 60,
            timeout_secs: 30,
        }
    }
}

impl VehicleFeedConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .ok_or(ConfigError::MissingEndpoint("vehicles"))
    }

    /// Fails for a zero period.
    pub fn poll_period(&self) -> Result<Duration, ConfigError> {
        poll_period(self.poll_period_secs, "vehicles")
    }
}

/// Parking zone geometry feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParkingZonesConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub poll_period_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ParkingZonesConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            // Zones change rarely
            poll_period_secs: 24 * 60 * 60,
            timeout_secs: 30,
        }
    }
}

impl ParkingZonesConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .ok_or(ConfigError::MissingEndpoint("parking_zones"))
    }

    /// Fails for a zero period.
    pub fn poll_period(&self) -> Result<Duration, ConfigError> {
        poll_period(self.poll_period_secs, "parking_zones")
    }
}

/// Top-level configuration of the router binary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub linker: LinkerConfig,
    pub search: SearchConfig,
    /// Vehicle updates are disabled when absent.
    pub vehicles: Option<VehicleFeedConfig>,
    /// Parking zone updates are disabled when absent.
    pub parking_zones: Option<ParkingZonesConfig>,
    /// JSON network description to load at startup.
    pub network_path: Option<PathBuf>,
}

impl RouterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::DominanceKind;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RouterConfig::from_json("{}").unwrap();
        assert_eq!(config.linker, LinkerConfig::default());
        assert_eq!(config.search.dominance, DominanceKind::MinimumWeight);
        assert!(config.vehicles.is_none());
        assert!(config.parking_zones.is_none());
        assert!(config.network_path.is_none());
    }

    #[test]
    fn load_partial_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "search": {{"walk_speed_mps": 1.5, "dominance": "pareto"}},
                "vehicles": {{"url": "http://localhost:8080/vehicles"}},
                "parking_zones": {{}},
                "network_path": "network.json"
            }}"#
        )
        .unwrap();

        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.search.walk_speed_mps, 1.5);
        assert_eq!(config.search.dominance, DominanceKind::Pareto);
        assert_eq!(config.search.board_cost_secs, SearchConfig::default().board_cost_secs);

        let vehicles = config.vehicles.unwrap();
        assert_eq!(vehicles.endpoint().unwrap(), "http://localhost:8080/vehicles");
        assert_eq!(vehicles.poll_period(), Ok(Duration::from_secs(60)));

        let zones = config.parking_zones.unwrap();
        assert_eq!(zones.endpoint(), Err(ConfigError::MissingEndpoint("parking_zones")));
        assert_eq!(zones.poll_period(), Ok(Duration::from_secs(86_400)));
        assert_eq!(config.network_path, Some(PathBuf::from("network.json")));
    }

    #[test]
    fn load_errors() {
        let err = RouterConfig::load("/nonexistent/trip-router.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let err = RouterConfig::from_json("{\"search\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn zero_poll_period_is_rejected() {
        let config = RouterConfig::from_json(
            r#"{"vehicles": {"url": "http://v", "poll_period_secs": 0},
                "parking_zones": {"url": "http://z", "poll_period_secs": 0}}"#,
        )
        .unwrap();
        let err = config.vehicles.unwrap().poll_period().unwrap_err();
        assert_eq!(err, ConfigError::InvalidPollPeriod("vehicles".into()));
        assert_eq!(err.to_string(), "poll period for vehicles must be positive");
        assert_eq!(
            config.parking_zones.unwrap().poll_period(),
            Err(ConfigError::InvalidPollPeriod("parking_zones".into()))
        );
    }
}
