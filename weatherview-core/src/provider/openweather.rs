use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::FetchError,
    model::{ConditionCategory, CurrentConditions, ForecastPoint, Location, UnitSystem},
};

use super::WeatherSource;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Image URL for an OpenWeather icon code such as `"10n"`.
pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}.png")
}

#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Self {
        // Falls back to a default client if the TLS backend cannot be configured.
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn api_key(&self) -> Result<&str, FetchError> {
        self.api_key.as_deref().ok_or(FetchError::MissingCredential)
    }

    /// `q` for a city, `lat`/`lon` for coordinates, plus key and units.
    fn location_query(
        &self,
        location: &Location,
        unit: UnitSystem,
    ) -> Result<Vec<(&'static str, String)>, FetchError> {
        let api_key = self.api_key()?;

        let mut query = match location {
            Location::City(name) => vec![("q", name.clone())],
            Location::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
        };
        query.push(("appid", api_key.to_string()));
        query.push(("units", unit.as_str().to_string()));

        Ok(query)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        not_found: &str,
    ) -> Result<T, FetchError> {
        let url = format!("{}/data/2.5/{endpoint}", self.base_url);
        tracing::debug!(%endpoint, location = %not_found, "requesting OpenWeather");

        let res = self.http.get(&url).query(query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(not_found.to_string()));
        }

        if !status.is_success() {
            let message = serde_json::from_str::<OwError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| truncate_body(&body));
            return Err(FetchError::Api { status: status.as_u16(), message });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OwError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn current_conditions(
        &self,
        location: &Location,
        unit: UnitSystem,
    ) -> Result<CurrentConditions, FetchError> {
        let query = self.location_query(location, unit)?;

        let parsed: OwCurrentResponse =
            self.get_json("weather", &query, &location.to_string()).await?;

        let weather = parsed.weather.into_iter().next();
        let (group, description, icon) = weather
            .map(|w| (w.main, w.description, w.icon))
            .unwrap_or_else(|| (String::new(), "Unknown".to_string(), String::new()));

        Ok(CurrentConditions {
            location_name: parsed.name,
            temperature: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            description,
            icon,
            condition: ConditionCategory::from_group(&group),
            sunrise: parsed.sys.sunrise.and_then(unix_to_utc),
            sunset: parsed.sys.sunset.and_then(unix_to_utc),
        })
    }

    async fn forecast(
        &self,
        location: &Location,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastPoint>, FetchError> {
        let query = self.location_query(location, unit)?;

        let parsed: OwForecastResponse =
            self.get_json("forecast", &query, &location.to_string()).await?;

        parsed
            .list
            .into_iter()
            .map(|entry| -> Result<ForecastPoint, FetchError> {
                let time = unix_to_utc(entry.dt).ok_or_else(|| {
                    FetchError::Malformed(format!("forecast timestamp out of range: {}", entry.dt))
                })?;
                let (icon, description) = entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| (w.icon, w.description))
                    .unwrap_or_default();
                Ok(ForecastPoint { time, temperature: entry.main.temp, icon, description })
            })
            .collect()
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
