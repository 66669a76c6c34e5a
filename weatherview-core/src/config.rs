use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    controller::ControllerSettings,
    geolocation::{
        FixedPosition, GeolocationMode, GeolocationProvider, IpGeolocation, NoGeolocation,
    },
    model::{Coordinates, UnitSystem},
};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_CITY: &str = "New York";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30 * 60;

/// Start-up position settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub mode: GeolocationMode,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "New York"
/// units = "metric"
/// refresh_interval_secs = 1800
///
/// [geolocation]
/// mode = "ip"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub default_city: String,
    pub units: UnitSystem,
    pub refresh_interval_secs: u64,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            units: UnitSystem::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherview", "weatherview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key to use: a non-empty environment value wins over the file.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            default_city: self.default_city.clone(),
            unit: self.units,
            refresh_interval: self.refresh_interval(),
        }
    }

    /// Build the start-up position source described by `[geolocation]`.
    pub fn geolocation_provider(&self) -> Result<Box<dyn GeolocationProvider>> {
        let geo = &self.geolocation;
        let provider: Box<dyn GeolocationProvider> = match geo.mode {
            GeolocationMode::Ip => Box::new(IpGeolocation::new()),
            GeolocationMode::Disabled => Box::new(NoGeolocation),
            GeolocationMode::Fixed => match (geo.latitude, geo.longitude) {
                (Some(latitude), Some(longitude)) => {
                    Box::new(FixedPosition(Coordinates { latitude, longitude }))
                }
                _ => {
                    return Err(anyhow!(
                        "Geolocation mode 'fixed' needs both latitude and longitude.\n\
                         Hint: run `weatherview configure` or edit the config file."
                    ));
                }
            },
        };

        Ok(provider)
    }
}
