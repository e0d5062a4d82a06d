//! External feeds of shared vehicles and parking zones.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::{ParkingZonesConfig, VehicleFeedConfig};

use super::error::UpdaterError;

/// Operator of a vehicle, as published by the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub provider_id: i32,
    pub provider_name: String,
}

/// One vehicle as published by the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub provider_vehicle_id: String,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub gearbox: Option<String>,
    #[serde(default)]
    pub range_in_meters: Option<f64>,
    #[serde(default)]
    pub provider: Option<ProviderRecord>,
    #[serde(default)]
    pub start_price: Option<f64>,
    #[serde(default)]
    pub km_price: Option<f64>,
}

/// One parking zone polygon set as published by the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingZoneRecord {
    pub provider_id: i32,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    /// `true` for zones vehicles may be left in, `false` for forbidden areas.
    pub is_allowed: bool,
    /// Rings of `[longitude, latitude]` pairs.
    pub polygons: Vec<Vec<[f64; 2]>>,
}

/// Source of the current set of available vehicles.
pub trait VehicleFeed: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Vec<VehicleRecord>, UpdaterError>> + Send;
}

/// Source of the current parking zone geometry.
pub trait ParkingZoneFeed: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Vec<ParkingZoneRecord>, UpdaterError>> + Send;
}

/// JSON-over-HTTP client shared by the feeds.
#[derive(Debug, Clone)]
struct JsonClient {
    http: reqwest::Client,
    url: String,
}

impl JsonClient {
    fn new(url: &str, api_key: Option<&str>, timeout_secs: u64) -> Result<Self, UpdaterError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| UpdaterError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert(HeaderName::from_static("x-apikey"), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self) -> Result<T, UpdaterError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(UpdaterError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpdaterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpdaterError::Json {
            message: e.to_string(),
        })
    }
}

/// Vehicle feed served over HTTP as a JSON array of [`VehicleRecord`]s.
#[derive(Debug, Clone)]
pub struct HttpVehicleFeed {
    client: JsonClient,
}

impl HttpVehicleFeed {
    /// Fails if no URL is configured.
    pub fn from_config(config: &VehicleFeedConfig) -> Result<Self, UpdaterError> {
        let url = config.endpoint()?;
        Ok(Self {
            client: JsonClient::new(url, config.api_key.as_deref(), config.timeout_secs)?,
        })
    }
}

impl VehicleFeed for HttpVehicleFeed {
    async fn fetch(&self) -> Result<Vec<VehicleRecord>, UpdaterError> {
        self.client.get().await
    }
}

/// Parking zone feed served over HTTP as a JSON array of [`ParkingZoneRecord`]s.
#[derive(Debug, Clone)]
pub struct HttpParkingZoneFeed {
    client: JsonClient,
}

impl HttpParkingZoneFeed {
    /// Fails if no URL is configured.
    pub fn from_config(config: &ParkingZonesConfig) -> Result<Self, UpdaterError> {
        let url = config.endpoint()?;
        Ok(Self {
            client: JsonClient::new(url, config.api_key.as_deref(), config.timeout_secs)?,
        })
    }
}

impl ParkingZoneFeed for HttpParkingZoneFeed {
    async fn fetch(&self) -> Result<Vec<ParkingZoneRecord>, UpdaterError> {
        self.client.get().await
    }
}

/// A feed whose contents are set by hand.
///
/// Useful for tests and for running without an external API.
#[derive(Debug, Default)]
pub struct StaticFeed<T> {
    records: Mutex<Vec<T>>,
}

impl<T: Clone> StaticFeed<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Replace what the next fetch returns.
    pub fn set(&self, records: Vec<T>) {
        *self.records.lock() = records;
    }

    fn snapshot(&self) -> Vec<T> {
        self.records.lock().clone()
    }
}

impl VehicleFeed for StaticFeed<VehicleRecord> {
    async fn fetch(&self) -> Result<Vec<VehicleRecord>, UpdaterError> {
        Ok(self.snapshot())
    }
}

impl ParkingZoneFeed for StaticFeed<ParkingZoneRecord> {
    async fn fetch(&self) -> Result<Vec<ParkingZoneRecord>, UpdaterError> {
        Ok(self.snapshot())
    }
}
