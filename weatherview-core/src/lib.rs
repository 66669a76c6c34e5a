//! Core library for the `weatherview` widget.
//!
//! This crate defines:
//! - The weather view controller: location resolution, fetch cycles,
//!   unit switching, periodic and manual refresh
//! - Abstractions over the weather data source and geolocation
//! - Shared domain models (view state, conditions, forecast points)
//! - Background theme lookup and chart preparation
//! - Configuration & credentials handling
//!
//! It is used by `weatherview-cli`, but any front end can drive a
//! [`WeatherViewController`] through its [`ViewHandle`].

pub mod chart;
pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod theme;

pub use chart::ChartSeries;
pub use config::Config;
pub use controller::{Command, ControllerSettings, ViewHandle, ViewSnapshot, WeatherViewController};
pub use error::{ControllerClosed, FetchError, GeolocationError};
pub use geolocation::{GeolocationMode, GeolocationProvider};
pub use model::{
    ConditionCategory, Coordinates, CurrentConditions, ForecastPoint, Location, UnitSystem,
    ViewState,
};
pub use provider::WeatherSource;
pub use theme::{BackgroundTheme, TimeOfDay};
