use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Select, Text};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use weatherview_core::{
    Config, GeolocationMode, UnitSystem, ViewHandle, WeatherViewController,
    config::API_KEY_ENV, provider::source_from_config,
};

use crate::render::Rendered;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherview", version, about = "Current weather and hourly forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, default city, units and start-up location.
    Configure,

    /// Show the weather once and exit.
    Show {
        /// City to look up; without it the start-up location is used.
        city: Option<String>,

        /// Unit system: metric or imperial.
        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,
    },

    /// Keep the view open, refreshing periodically and reading commands from stdin.
    Watch {
        /// City to switch to after start-up.
        city: Option<String>,

        /// Unit system: metric or imperial.
        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,
    },
}

fn parse_units(value: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(value).map_err(|e| e.to_string())
}

/// A line typed while watching.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    ToggleUnit,
    Refresh,
    Quit,
    Nothing,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" => Input::Nothing,
        "q" | "quit" | "exit" => Input::Quit,
        "u" | "unit" | "units" => Input::ToggleUnit,
        "r" | "refresh" => Input::Refresh,
        text => Input::Search(text.to_string()),
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units } => show(city, units).await,
            Command::Watch { city, units } => watch(city, units).await,
        }
    }
}

fn build_controller(
    config: &Config,
    units: Option<UnitSystem>,
) -> Result<(WeatherViewController, ViewHandle)> {
    let mut settings = config.controller_settings();
    if let Some(units) = units {
        settings.unit = units;
    }

    let source = source_from_config(config, std::env::var(API_KEY_ENV).ok());
    let geolocation = config.geolocation_provider()?;

    Ok(WeatherViewController::new(source, geolocation, settings))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key (leave empty to keep current):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let current_city = config.default_city.clone();
    config.default_city = Text::new("Default city:")
        .with_default(&current_city)
        .prompt()
        .context("Failed to read default city")?;

    config.units = Select::new("Units:", vec![UnitSystem::Metric, UnitSystem::Imperial])
        .prompt()
        .context("Failed to read unit system")?;

    let mode = Select::new("Start-up location:", GeolocationMode::all().to_vec())
        .prompt()
        .context("Failed to read geolocation mode")?;
    config.geolocation.mode = mode;

    if mode == GeolocationMode::Fixed {
        config.geolocation.latitude =
            Some(CustomType::<f64>::new("Latitude:").prompt().context("Failed to read latitude")?);
        config.geolocation.longitude = Some(
            CustomType::<f64>::new("Longitude:").prompt().context("Failed to read longitude")?,
        );
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn show(city: Option<String>, units: Option<UnitSystem>) -> Result<()> {
    let config = Config::load()?;
    let (mut controller, _handle) = build_controller(&config, units)?;

    match city {
        Some(city) => controller.search_city(&city).await,
        None => controller.initialize().await,
    }
    controller.teardown();

    println!("{}", Rendered::new(&controller.snapshot(), &Local));
    Ok(())
}

async fn watch(city: Option<String>, units: Option<UnitSystem>) -> Result<()> {
    let config = Config::load()?;
    let (controller, mut handle) = build_controller(&config, units)?;
    tracing::info!(refresh_secs = config.refresh_interval_secs, "starting watch session");
    let controller_task = tokio::spawn(controller.run());

    if let Some(city) = city {
        handle.search(city).await?;
    }

    println!("Type a city to search, `u` to toggle units, `r` to refresh, `q` to quit.");

    drive(&mut handle, BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c()).await?;

    controller_task.await.context("Controller task failed")?;
    tracing::debug!("watch session ended");
    Ok(())
}

/// Render snapshots and forward input lines until the user quits, `input`
/// ends, `shutdown` resolves or the controller goes away.
async fn drive<R, S>(handle: &mut ViewHandle, input: R, shutdown: S) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = handle.changed() => match changed {
                Ok(snapshot) => println!("{}", Rendered::new(&snapshot, &Local)),
                Err(_) => break,
            },
            line = lines.next_line() => {
                let input = match line.context("Failed to read from stdin")? {
                    Some(line) => parse_input(&line),
                    None => Input::Quit,
                };
                match input {
                    Input::Search(text) => handle.search(text).await?,
                    Input::ToggleUnit => handle.toggle_unit().await?,
                    Input::Refresh => handle.refresh().await?,
                    Input::Nothing => {}
                    Input::Quit => {
                        handle.shutdown().await?;
                        break;
                    }
                }
            },
            _ = &mut shutdown => {
                tracing::info!("interrupted, shutting down");
                handle.shutdown().await?;
                break;
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use weatherview_core::{
        ControllerSettings, geolocation::NoGeolocation, provider::openweather::OpenWeatherSource,
    };

    #[test]
    fn parses_watch_input() {
        assert_eq!(parse_input("  "), Input::Nothing);
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input("u\n"), Input::ToggleUnit);
        assert_eq!(parse_input("refresh"), Input::Refresh);
        assert_eq!(parse_input(" San Francisco "), Input::Search("San Francisco".into()));
    }

    #[test]
    fn parses_show_arguments() {
        let cli = Cli::try_parse_from(["weatherview", "show", "Paris", "--units", "imperial"])
            .expect("arguments should parse");

        match cli.command {
            Command::Show { city, units } => {
                assert_eq!(city.as_deref(), Some("Paris"));
                assert_eq!(units, Some(UnitSystem::Imperial));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn offline_controller() -> (WeatherViewController, ViewHandle) {
        WeatherViewController::new(
            Box::new(OpenWeatherSource::new(None)),
            Box::new(NoGeolocation),
            ControllerSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_survives_busy_input() {
        let (controller, mut handle) = offline_controller();
        let task = tokio::spawn(controller.run());

        let (mut writer, reader) = tokio::io::duplex(64);
        let typing = tokio::spawn(async move {
            while writer.write_all(b"r\n").await.is_ok() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        tokio::time::timeout(
            Duration::from_secs(5),
            drive(&mut handle, BufReader::new(reader), shutdown),
        )
        .await
        .expect("shutdown future should fire while input keeps arriving")
        .unwrap();

        task.await.unwrap();
        assert!(handle.snapshot().last_refresh.is_some());
        typing.await.unwrap();
    }

    #[tokio::test]
    async fn end_of_input_quits() {
        let (controller, mut handle) = offline_controller();
        let task = tokio::spawn(controller.run());

        drive(&mut handle, BufReader::new(&b"u\n\nq\n"[..]), std::future::pending::<()>())
            .await
            .unwrap();

        task.await.unwrap();
        assert_eq!(handle.snapshot().unit, UnitSystem::Metric);
    }

    #[test]
    fn rejects_unknown_units() {
        let err = Cli::try_parse_from(["weatherview", "watch", "--units", "kelvin"]).unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }
}
