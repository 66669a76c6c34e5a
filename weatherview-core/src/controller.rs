//! The weather view controller.
//!
//! One controller owns the [`ViewState`] and is the only thing that mutates
//! it. The presentation layer talks to it through a [`ViewHandle`]: commands
//! go in over an mpsc channel, snapshots come back over a `watch` channel.
//! Commands are handled one at a time, so fetch cycles never overlap and
//! results land in the order the commands were issued.

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    chart::ChartSeries,
    config::{DEFAULT_CITY, DEFAULT_REFRESH_INTERVAL_SECS},
    error::{ControllerClosed, FetchError},
    geolocation::GeolocationProvider,
    model::{ERROR_MESSAGE, Location, NOT_FOUND_MESSAGE, UnitSystem, ViewState, merge_forecast},
    provider::WeatherSource,
    theme::{BackgroundTheme, TimeOfDay, background_theme},
};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// City used when no position is available at start-up.
    pub default_city: String,
    pub unit: UnitSystem,
    pub refresh_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            unit: UnitSystem::default(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

/// Inbound events from the presentation layer (and the refresh timer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    ToggleUnit,
    Refresh,
    Shutdown,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub view: ViewState,
    pub loading: bool,
    pub unit: UnitSystem,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl ViewSnapshot {
    pub fn theme(&self) -> BackgroundTheme {
        background_theme(self.view.condition, TimeOfDay::from_icon(&self.view.icon))
    }

    pub fn chart<Tz: TimeZone>(&self, tz: &Tz) -> ChartSeries {
        ChartSeries::from_forecast(&self.view.forecast, tz)
    }
}

/// Presentation-side end of a controller.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ViewSnapshot>,
}

impl ViewHandle {
    pub async fn send(&self, command: Command) -> Result<(), ControllerClosed> {
        self.commands.send(command).await.map_err(|_| ControllerClosed)
    }

    pub async fn search(&self, text: impl Into<String>) -> Result<(), ControllerClosed> {
        self.send(Command::Search(text.into())).await
    }

    pub async fn toggle_unit(&self) -> Result<(), ControllerClosed> {
        self.send(Command::ToggleUnit).await
    }

    pub async fn refresh(&self) -> Result<(), ControllerClosed> {
        self.send(Command::Refresh).await
    }

    pub async fn shutdown(&self) -> Result<(), ControllerClosed> {
        self.send(Command::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next snapshot the caller has not seen yet.
    pub async fn changed(&mut self) -> Result<ViewSnapshot, ControllerClosed> {
        self.snapshots.changed().await.map_err(|_| ControllerClosed)?;
        Ok(self.snapshots.borrow_and_update().clone())
    }
}

/// Periodic refresh task. Aborted on [`RefreshTimer::cancel`] and on drop.
#[derive(Debug)]
pub struct RefreshTimer {
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Send [`Command::Refresh`] every `period`, starting one period from now.
    /// The task ends by itself once every command sender is gone.
    pub fn start(period: Duration, commands: mpsc::WeakSender<Command>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(tx) = commands.upgrade() else { break };
                if tx.send(Command::Refresh).await.is_err() {
                    break;
                }
                tracing::debug!("refresh timer fired");
            }
        });

        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug)]
pub struct WeatherViewController {
    source: Box<dyn WeatherSource>,
    geolocation: Box<dyn GeolocationProvider>,
    settings: ControllerSettings,
    view: ViewState,
    unit: UnitSystem,
    loading: bool,
    /// Last location whose current conditions were fetched successfully.
    resolved: Option<Location>,
    last_refresh: Option<DateTime<Utc>>,
    fetch_cycles: u64,
    initialized: bool,
    timer: Option<RefreshTimer>,
    commands_tx: mpsc::WeakSender<Command>,
    commands_rx: mpsc::Receiver<Command>,
    snapshots: watch::Sender<ViewSnapshot>,
}

impl WeatherViewController {
    pub fn new(
        source: Box<dyn WeatherSource>,
        geolocation: Box<dyn GeolocationProvider>,
        settings: ControllerSettings,
    ) -> (Self, ViewHandle) {
        let unit = settings.unit;
        let view = ViewState::placeholder(unit);

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, snapshots_rx) = watch::channel(ViewSnapshot {
            view: view.clone(),
            loading: false,
            unit,
            last_refresh: None,
        });

        let controller = Self {
            source,
            geolocation,
            settings,
            view,
            unit,
            loading: false,
            resolved: None,
            last_refresh: None,
            fetch_cycles: 0,
            initialized: false,
            timer: None,
            commands_tx: commands_tx.downgrade(),
            commands_rx,
            snapshots,
        };

        let handle = ViewHandle { commands: commands_tx, snapshots: snapshots_rx };
        (controller, handle)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn unit(&self) -> UnitSystem {
        self.unit
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn resolved_location(&self) -> Option<&Location> {
        self.resolved.as_ref()
    }

    /// Number of fetch cycles started so far.
    pub fn fetch_cycles(&self) -> u64 {
        self.fetch_cycles
    }

    pub fn has_refresh_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(RefreshTimer::is_running)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            view: self.view.clone(),
            loading: self.loading,
            unit: self.unit,
            last_refresh: self.last_refresh,
        }
    }

    /// Resolve the start-up location, fetch it and start the refresh timer.
    /// Only the first call does anything.
    pub async fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let location = match self.geolocation.current_position().await {
            Ok(coordinates) => Location::Coordinates(coordinates),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    fallback = %self.settings.default_city,
                    "geolocation failed, using default city"
                );
                Location::City(self.settings.default_city.clone())
            }
        };

        self.fetch_weather(location).await;
        self.start_timer();
    }

    /// Fetch `name` unless it is blank or already the displayed city.
    pub async fn search_city(&mut self, name: &str) {
        let query = name.trim();
        if query.is_empty() || query == self.view.city {
            tracing::debug!(query, "ignoring search");
            return;
        }

        self.fetch_weather(Location::City(query.to_string())).await;
    }

    /// Switch metric/imperial and re-fetch the resolved location.
    pub async fn toggle_unit(&mut self) {
        let Some(location) = self.resolved.clone() else {
            tracing::debug!("no resolved location yet, ignoring unit toggle");
            return;
        };

        self.unit = self.unit.toggled();
        tracing::info!(unit = %self.unit, "unit system toggled");
        self.fetch_weather(location).await;
    }

    /// Re-fetch the resolved location. The refresh time is stamped even if the
    /// fetch fails or there is nothing to fetch; a location that never loaded
    /// is not retried here.
    pub async fn refresh(&mut self) {
        self.last_refresh = Some(Utc::now());

        let Some(location) = self.resolved.clone() else {
            tracing::debug!("no resolved location, skipping refresh");
            self.publish();
            return;
        };

        self.fetch_weather(location).await;
    }

    /// Stop the refresh timer. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
            tracing::debug!("refresh timer cancelled");
        }
    }

    /// Initialize, then serve commands until [`Command::Shutdown`] or until
    /// every [`ViewHandle`] is dropped.
    pub async fn run(mut self) {
        self.initialize().await;

        while let Some(command) = self.commands_rx.recv().await {
            match command {
                Command::Search(text) => self.search_city(&text).await,
                Command::ToggleUnit => self.toggle_unit().await,
                Command::Refresh => self.refresh().await,
                Command::Shutdown => break,
            }
        }

        self.teardown();
    }

    fn start_timer(&mut self) {
        if self.timer.is_some() {
            return;
        }
        self.timer = Some(RefreshTimer::start(
            self.settings.refresh_interval,
            self.commands_tx.clone(),
        ));
    }

    /// One fetch cycle: current conditions, then the forecast.
    async fn fetch_weather(&mut self, location: Location) {
        self.fetch_cycles += 1;
        let unit = self.unit;

        self.loading = true;
        self.publish();

        let outcome = self.source.current_conditions(&location, unit).await;
        self.loading = false;

        let current = match outcome {
            Ok(current) => current,
            Err(err) if err.is_terminal_before_request() => {
                tracing::error!(error = %err, "fetch aborted");
                self.publish();
                return;
            }
            Err(FetchError::NotFound(query)) => {
                tracing::warn!(%query, "location not found");
                self.view = ViewState::degraded(NOT_FOUND_MESSAGE, unit, self.resolved.clone());
                self.publish();
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, %location, "failed to fetch current conditions");
                self.view = ViewState::degraded(ERROR_MESSAGE, unit, self.resolved.clone());
                self.publish();
                return;
            }
        };

        tracing::info!(
            city = %current.location_name,
            temp = current.temperature,
            %unit,
            "current conditions fetched"
        );

        self.resolved = Some(location.clone());
        self.view = ViewState::from_current(current, unit, location.clone(), Utc::now());
        self.publish();

        match self.source.forecast(&location, unit).await {
            Ok(points) => {
                self.view.forecast = merge_forecast(points);
                tracing::debug!(points = self.view.forecast.len(), "forecast merged");
            }
            Err(err) => {
                tracing::warn!(error = %err, %location, "failed to fetch forecast");
                self.view.forecast.clear();
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
