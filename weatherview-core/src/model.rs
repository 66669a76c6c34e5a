use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// City shown before the first fetch cycle completes.
pub const PLACEHOLDER_CITY: &str = "Locating...";
/// City shown when the data source does not know the requested location.
pub const NOT_FOUND_MESSAGE: &str = "City not found";
/// City shown when a fetch cycle fails for any other reason.
pub const ERROR_MESSAGE: &str = "Error";
/// Upper bound on the number of hourly points kept in a view.
pub const FORECAST_LIMIT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where a fetch cycle is aimed. Refreshes reuse whichever form was last used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    City(String),
    Coordinates(Coordinates),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::Coordinates(c) => write!(f, "{:.4}, {:.4}", c.latitude, c.longitude),
        }
    }
}

/// Coarse condition group as reported by the data source (`weather[0].main`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Atmosphere,
    #[default]
    Unknown,
}

impl ConditionCategory {
    pub fn from_group(group: &str) -> Self {
        match group {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Drizzle" => Self::Drizzle,
            "Thunderstorm" => Self::Thunderstorm,
            "Snow" => Self::Snow,
            "Mist" | "Smoke" | "Haze" | "Dust" | "Fog" | "Sand" | "Ash" | "Squall"
            | "Tornado" => Self::Atmosphere,
            _ => Self::Unknown,
        }
    }
}

/// Current conditions as returned by a [`crate::WeatherSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub temperature: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub condition: ConditionCategory,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub icon: String,
    pub description: String,
}

/// Keep the first [`FORECAST_LIMIT`] points in source order.
pub fn merge_forecast(points: Vec<ForecastPoint>) -> Vec<ForecastPoint> {
    points.into_iter().take(FORECAST_LIMIT).collect()
}

/// Everything the presentation layer needs to draw one frame.
///
/// Replaced wholesale on each fetch cycle. `None` in a numeric field is the
/// "unavailable" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub city: String,
    pub temperature: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub wind_speed: Option<f64>,
    pub description: String,
    pub icon: String,
    pub condition: ConditionCategory,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub forecast: Vec<ForecastPoint>,
    pub unit: UnitSystem,
    pub location: Option<Location>,
}

impl ViewState {
    pub fn placeholder(unit: UnitSystem) -> Self {
        Self::blank(PLACEHOLDER_CITY, String::new(), unit, None)
    }

    /// A view carrying an error message in place of the city and no readings.
    pub fn degraded(message: &str, unit: UnitSystem, location: Option<Location>) -> Self {
        Self::blank(message, "N/A".to_string(), unit, location)
    }

    /// Fresh view for a successful current-conditions fetch. The forecast
    /// starts empty and is filled in once it arrives.
    pub fn from_current(
        current: CurrentConditions,
        unit: UnitSystem,
        location: Location,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            city: current.location_name,
            temperature: Some(current.temperature),
            humidity_pct: Some(current.humidity_pct),
            wind_speed: Some(current.wind_speed),
            description: current.description,
            icon: current.icon,
            condition: current.condition,
            sunrise: current.sunrise,
            sunset: current.sunset,
            fetched_at: Some(fetched_at),
            forecast: Vec::new(),
            unit,
            location: Some(location),
        }
    }

    pub fn is_available(&self) -> bool {
        self.temperature.is_some()
    }

    fn blank(city: &str, description: String, unit: UnitSystem, location: Option<Location>) -> Self {
        Self {
            city: city.to_string(),
            temperature: None,
            humidity_pct: None,
            wind_speed: None,
            description,
            icon: String::new(),
            condition: ConditionCategory::Unknown,
            sunrise: None,
            sunset: None,
            fetched_at: None,
            forecast: Vec::new(),
            unit,
            location,
        }
    }
}
