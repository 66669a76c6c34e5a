use crate::{
    Config,
    error::FetchError,
    model::{CurrentConditions, ForecastPoint, Location, UnitSystem},
    provider::openweather::OpenWeatherSource,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Remote source of current conditions and hourly forecasts.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current_conditions(
        &self,
        location: &Location,
        unit: UnitSystem,
    ) -> Result<CurrentConditions, FetchError>;

    /// Forecast points in chronological order, as many as the source returns.
    /// Asked for the same location as the current conditions it accompanies.
    async fn forecast(
        &self,
        location: &Location,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastPoint>, FetchError>;
}

/// Construct the OpenWeather source from config. A missing key is not an
/// error here; it surfaces as [`FetchError::MissingCredential`] on the first
/// fetch so the view can report it.
pub fn source_from_config(config: &Config, env_api_key: Option<String>) -> Box<dyn WeatherSource> {
    let api_key = config.resolve_api_key(env_api_key);
    if api_key.is_none() {
        tracing::warn!("no OpenWeather API key configured");
    }
    Box::new(OpenWeatherSource::new(api_key))
}
