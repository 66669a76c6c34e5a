use serde::Serialize;

use crate::model::ConditionCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Day,
    Night,
}

impl TimeOfDay {
    /// OpenWeather icon codes end in `d` or `n`; anything else counts as day.
    pub fn from_icon(icon: &str) -> Self {
        if icon.ends_with('n') { TimeOfDay::Night } else { TimeOfDay::Day }
    }
}

/// Background style for the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundTheme {
    pub name: &'static str,
    pub gradient: &'static str,
}

struct ThemePair {
    day: BackgroundTheme,
    night: BackgroundTheme,
}

const fn theme(name: &'static str, gradient: &'static str) -> BackgroundTheme {
    BackgroundTheme { name, gradient }
}

const DEFAULT_THEMES: ThemePair = ThemePair {
    day: theme(
        "default-day",
        "linear-gradient(135deg, rgba(0,0,0,0.7), rgba(255, 0, 150, 0.7))",
    ),
    night: theme(
        "default-night",
        "linear-gradient(135deg, rgba(0,0,0,0.9), rgba(90, 0, 80, 0.8))",
    ),
};

const THEMES: &[(ConditionCategory, ThemePair)] = &[
    (
        ConditionCategory::Clear,
        ThemePair {
            day: theme("clear-day", "linear-gradient(135deg, #56ccf2, #f2c94c)"),
            night: theme("clear-night", "linear-gradient(135deg, #0f2027, #2c5364)"),
        },
    ),
    (
        ConditionCategory::Clouds,
        ThemePair {
            day: theme("clouds-day", "linear-gradient(135deg, #bdc3c7, #2c3e50)"),
            night: theme("clouds-night", "linear-gradient(135deg, #232526, #414345)"),
        },
    ),
    (
        ConditionCategory::Rain,
        ThemePair {
            day: theme("rain-day", "linear-gradient(135deg, #4b79a1, #283e51)"),
            night: theme("rain-night", "linear-gradient(135deg, #141e30, #243b55)"),
        },
    ),
    (
        ConditionCategory::Drizzle,
        ThemePair {
            day: theme("drizzle-day", "linear-gradient(135deg, #89f7fe, #66a6ff)"),
            night: theme("drizzle-night", "linear-gradient(135deg, #1e3c72, #2a5298)"),
        },
    ),
    (
        ConditionCategory::Thunderstorm,
        ThemePair {
            day: theme("storm-day", "linear-gradient(135deg, #373b44, #4286f4)"),
            night: theme("storm-night", "linear-gradient(135deg, #0f0c29, #302b63)"),
        },
    ),
    (
        ConditionCategory::Snow,
        ThemePair {
            day: theme("snow-day", "linear-gradient(135deg, #e6dada, #274046)"),
            night: theme("snow-night", "linear-gradient(135deg, #8e9eab, #1c2833)"),
        },
    ),
    (
        ConditionCategory::Atmosphere,
        ThemePair {
            day: theme("mist-day", "linear-gradient(135deg, #d7d2cc, #304352)"),
            night: theme("mist-night", "linear-gradient(135deg, #3e5151, #1c1c1c)"),
        },
    ),
];

/// Background for a condition at a time of day. Categories absent from the
/// table, including [`ConditionCategory::Unknown`], use the default pair.
pub fn background_theme(condition: ConditionCategory, time_of_day: TimeOfDay) -> BackgroundTheme {
    let pair = THEMES
        .iter()
        .find(|(category, _)| *category == condition)
        .map(|(_, pair)| pair)
        .unwrap_or(&DEFAULT_THEMES);

    match time_of_day {
        TimeOfDay::Day => pair.day,
        TimeOfDay::Night => pair.night,
    }
}
