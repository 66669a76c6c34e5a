use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Display, Formatter};
use weatherview_core::{ChartSeries, UnitSystem, ViewSnapshot, provider::openweather::icon_url};

const BAR_WIDTH: usize = 30;
const NOT_AVAILABLE: &str = "N/A";

/// Text rendering of one snapshot, times shown in `tz`.
///
/// Readings are labelled with the unit of the view they were fetched in,
/// which can lag behind `snapshot.unit` while a toggle is in flight.
pub struct Rendered<'a, Tz> {
    snapshot: &'a ViewSnapshot,
    tz: &'a Tz,
}

impl<'a, Tz> Rendered<'a, Tz> {
    pub fn new(snapshot: &'a ViewSnapshot, tz: &'a Tz) -> Self {
        Self { snapshot, tz }
    }
}

impl<Tz> Display for Rendered<'_, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { snapshot, tz } = *self;

        if snapshot.loading {
            return write!(f, "Loading...");
        }

        let view = &snapshot.view;
        let unit = view.unit;

        writeln!(f, "{}", view.city)?;
        writeln!(f, "{}  {}", temperature(view.temperature, unit), view.description)?;
        if !view.icon.is_empty() {
            writeln!(f, "Icon: {}", icon_url(&view.icon))?;
        }
        writeln!(
            f,
            "Humidity: {}   Wind: {}",
            view.humidity_pct.map_or_else(|| NOT_AVAILABLE.to_string(), |h| format!("{h}%")),
            view.wind_speed
                .map_or_else(|| NOT_AVAILABLE.to_string(), |w| format!("{w:.1} {}", unit.wind_speed_symbol())),
        )?;

        if let (Some(sunrise), Some(sunset)) = (view.sunrise, view.sunset) {
            writeln!(f, "Sunrise: {}   Sunset: {}", clock(sunrise, tz), clock(sunset, tz))?;
        }

        write!(f, "Theme: {}", snapshot.theme().name)?;

        if let Some(fetched_at) = view.fetched_at {
            write!(f, "\nUpdated: {}", timestamp(fetched_at, tz))?;
        }
        if let Some(last_refresh) = snapshot.last_refresh {
            write!(f, "\nLast refresh: {}", timestamp(last_refresh, tz))?;
        }

        if !view.forecast.is_empty() {
            write!(f, "\n\nHourly forecast:")?;
            for point in &view.forecast {
                write!(
                    f,
                    "\n  {:>5}  {:>8}  [{}] {}",
                    clock(point.time, tz),
                    temperature(Some(point.temperature), unit),
                    point.icon,
                    point.description
                )?;
            }

            write!(f, "\n\nTemperature over time:")?;
            Chart { series: &snapshot.chart(tz), unit }.fmt(f)?;
        }

        Ok(())
    }
}

fn temperature(value: Option<f64>, unit: UnitSystem) -> String {
    match value {
        Some(t) => format!("{t:.1}{}", unit.temperature_symbol()),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn clock<Tz>(time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.with_timezone(tz).format("%H:%M").to_string()
}

fn timestamp<Tz>(time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Horizontal bar per point, scaled between the series minimum and maximum.
/// Each bar starts on a new line.
struct Chart<'a> {
    series: &'a ChartSeries,
    unit: UnitSystem,
}

impl Display for Chart<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some((lo, hi)) = self.series.range() else {
            return Ok(());
        };
        let span = hi - lo;

        for (label, &t) in self.series.labels.iter().zip(&self.series.temperatures) {
            let filled = if span > f64::EPSILON {
                1 + (((t - lo) / span) * (BAR_WIDTH - 1) as f64).round() as usize
            } else {
                BAR_WIDTH
            };
            write!(
                f,
                "\n  {label:>5} |{:<width$} {}",
                "#".repeat(filled),
                temperature(Some(t), self.unit),
                width = BAR_WIDTH
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherview_core::{ConditionCategory, ForecastPoint, Location, ViewState};

    fn snapshot() -> ViewSnapshot {
        let mut view = ViewState::placeholder(UnitSystem::Metric);
        view.city = "Paris".into();
        view.temperature = Some(18.0);
        view.humidity_pct = Some(55);
        view.wind_speed = Some(3.6);
        view.description = "scattered clouds".into();
        view.icon = "03d".into();
        view.condition = ConditionCategory::Clouds;
        view.location = Some(Location::City("Paris".into()));
        view.forecast = (0..3)
            .map(|i| ForecastPoint {
                time: Utc.with_ymd_and_hms(2026, 5, 1, 9 + 3 * i, 0, 0).unwrap(),
                temperature: 12.0 + f64::from(i),
                icon: "04d".into(),
                description: "broken clouds".into(),
            })
            .collect();

        ViewSnapshot { view, loading: false, unit: UnitSystem::Metric, last_refresh: None }
    }

    fn render(snapshot: &ViewSnapshot) -> String {
        Rendered::new(snapshot, &Utc).to_string()
    }

    #[test]
    fn renders_current_conditions_and_forecast() {
        let text = render(&snapshot());

        assert!(text.starts_with("Paris\n18.0°C  scattered clouds"));
        assert!(text.contains("Icon: https://openweathermap.org/img/wn/03d.png"));
        assert!(text.contains("Humidity: 55%   Wind: 3.6 m/s"));
        assert!(text.contains("Theme: clouds-day"));
        assert!(text.contains("09:00"));
        assert!(text.contains("[04d] broken clouds"));
        assert!(text.contains("Temperature over time:"));
        assert!(text.contains("9:00 |#"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn renders_unavailable_readings() {
        let mut snap = snapshot();
        snap.view = ViewState::degraded("City not found", UnitSystem::Imperial, None);
        snap.unit = UnitSystem::Imperial;

        let text = render(&snap);
        assert!(text.starts_with("City not found\nN/A"));
        assert!(text.contains("Humidity: N/A   Wind: N/A"));
        assert!(!text.contains("Icon:"));
        assert!(!text.contains("Hourly forecast"));
    }

    #[test]
    fn labels_follow_the_unit_the_view_was_fetched_in() {
        let mut snap = snapshot();
        // Toggled to imperial, but the metric readings are still on screen.
        snap.unit = UnitSystem::Imperial;

        let text = render(&snap);
        assert!(text.contains("18.0°C"));
        assert!(text.contains("3.6 m/s"));
        assert!(!text.contains("°F"));
        assert!(!text.contains("mph"));
    }

    #[test]
    fn loading_hides_view() {
        let mut snap = snapshot();
        snap.loading = true;
        assert_eq!(render(&snap), "Loading...");
    }

    #[test]
    fn chart_bars_scale_between_extremes() {
        let series = ChartSeries {
            labels: vec!["1:00".into(), "2:00".into()],
            temperatures: vec![0.0, 10.0],
        };
        let text = Chart { series: &series, unit: UnitSystem::Metric }.to_string();
        let lines: Vec<&str> = text.lines().skip(1).collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches('#').count(), 1);
        assert_eq!(lines[1].matches('#').count(), BAR_WIDTH);
    }

    #[test]
    fn flat_series_fills_every_bar() {
        let series = ChartSeries { labels: vec!["1:00".into()], temperatures: vec![4.0] };
        let text = Chart { series: &series, unit: UnitSystem::Imperial }.to_string();
        assert_eq!(text.matches('#').count(), BAR_WIDTH);
    }
}
