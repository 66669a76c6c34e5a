//! Sources of the device position used on start-up.
//!
//! A position lookup is one-shot: the controller never retries it and falls
//! back to its default city on any error.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};

use crate::{error::GeolocationError, model::Coordinates};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";
const LOOKUP_TIMEOUT_MILLIS: u64 = 3000;

#[async_trait]
pub trait GeolocationProvider: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// How the start-up position is obtained, as stored in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    #[default]
    Ip,
    Fixed,
    Disabled,
}

impl GeolocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeolocationMode::Ip => "ip",
            GeolocationMode::Fixed => "fixed",
            GeolocationMode::Disabled => "disabled",
        }
    }

    pub const fn all() -> &'static [GeolocationMode] {
        &[GeolocationMode::Ip, GeolocationMode::Fixed, GeolocationMode::Disabled]
    }
}

impl std::fmt::Display for GeolocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    url: String,
    http: Client,
}

impl IpGeolocation {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_IP_LOOKUP_URL)
    }

    pub fn with_url(url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(LOOKUP_TIMEOUT_MILLIS))
            .build()
            .unwrap_or_default();
        Self { url: url.to_string(), http }
    }
}

impl Default for IpGeolocation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let res = self.http.get(&self.url).send().await?;

        if !res.status().is_success() {
            return Err(GeolocationError::Unavailable(format!(
                "lookup returned status {}",
                res.status()
            )));
        }

        let body: IpLookupResponse = res.json().await?;

        if body.status != "success" {
            return Err(GeolocationError::Unavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => {
                tracing::info!(
                    latitude,
                    longitude,
                    city = body.city.as_deref().unwrap_or("unknown"),
                    "resolved position from IP"
                );
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(GeolocationError::Unavailable("lookup returned no coordinates".into())),
        }
    }
}

/// Always reports the configured coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Geolocation switched off; behaves like a denied permission prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationProvider for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Denied)
    }
}
