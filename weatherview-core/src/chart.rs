use chrono::{TimeZone, Timelike};

use crate::model::ForecastPoint;

/// Temperature-over-time series ready for a chart renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub temperatures: Vec<f64>,
}

impl ChartSeries {
    /// Labels are `"{hour}:00"` in `tz`, one per point, in the same order.
    pub fn from_forecast<Tz: TimeZone>(points: &[ForecastPoint], tz: &Tz) -> Self {
        let labels = points
            .iter()
            .map(|p| format!("{}:00", p.time.with_timezone(tz).hour()))
            .collect();
        let temperatures = points.iter().map(|p| p.temperature).collect();

        Self { labels, temperatures }
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    /// (min, max) of the temperatures, `None` when empty.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.temperatures.iter().fold(None, |acc, &t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn point(hour: u32, temperature: f64) -> ForecastPoint {
        ForecastPoint {
            time: Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap(),
            temperature,
            icon: "04d".into(),
            description: "broken clouds".into(),
        }
    }

    #[test]
    fn labels_follow_hours_in_order() {
        let points = vec![point(3, 5.0), point(6, 7.5), point(9, 4.0)];
        let series = ChartSeries::from_forecast(&points, &Utc);

        assert_eq!(series.labels, vec!["3:00", "6:00", "9:00"]);
        assert_eq!(series.temperatures, vec![5.0, 7.5, 4.0]);
        assert_eq!(series.range(), Some((4.0, 7.5)));
    }

    #[test]
    fn labels_use_requested_zone() {
        let points = vec![point(23, 1.0)];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let series = ChartSeries::from_forecast(&points, &plus_two);

        assert_eq!(series.labels, vec!["1:00"]);
    }

    #[test]
    fn empty_forecast_gives_empty_series() {
        let series = ChartSeries::from_forecast(&[], &Utc);
        assert!(series.is_empty());
        assert_eq!(series.range(), None);
    }
}
