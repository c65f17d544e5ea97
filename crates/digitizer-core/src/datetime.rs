// File: crates/digitizer-core/src/datetime.rs
// Summary: Date/time axis units; conversion between text and a linear serial value.
// Notes:
// - The serial value is seconds since 1970-01-01T00:00:00 (naive, no zone).
// - Time-only axes measure seconds from midnight.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DigitizeError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// Axis carries no date component.
    Skip,
    #[default]
    MonthDayYear,
    DayMonthYear,
    YearMonthDay,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// Axis carries no time component.
    #[default]
    Skip,
    HourMinute,
    HourMinuteSecond,
}

impl DateFormat {
    /// Accepted spellings; the first one is used for formatting.
    fn patterns(self) -> &'static [&'static str] {
        match self {
            DateFormat::Skip => &[],
            DateFormat::MonthDayYear => &["%m/%d/%Y", "%m-%d-%Y", "%b %d %Y", "%B %d %Y"],
            DateFormat::DayMonthYear => &["%d/%m/%Y", "%d-%m-%Y", "%d %b %Y", "%d %B %Y"],
            DateFormat::YearMonthDay => &["%Y/%m/%d", "%Y-%m-%d", "%Y %b %d"],
        }
    }
}

impl TimeFormat {
    fn patterns(self) -> &'static [&'static str] {
        match self {
            TimeFormat::Skip => &[],
            TimeFormat::HourMinute => &["%H:%M", "%I:%M %p"],
            TimeFormat::HourMinuteSecond => &["%H:%M:%S", "%I:%M:%S %p"],
        }
    }
}

/// Units of a Cartesian axis value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AxisUnits {
    #[default]
    Number,
    DateTime { date: DateFormat, time: TimeFormat },
}

const SECONDS_PER_DAY: i64 = 86_400;

fn epoch() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

impl AxisUnits {
    pub fn is_date_time(&self) -> bool {
        matches!(self, AxisUnits::DateTime { .. })
    }

    /// Reject configurations that cannot represent any value.
    pub fn validate(&self) -> Result<()> {
        if let AxisUnits::DateTime { date: DateFormat::Skip, time: TimeFormat::Skip } = self {
            return Err(DigitizeError::InvalidSettings(
                "date/time axis needs a date format, a time format, or both".into(),
            ));
        }
        Ok(())
    }

    /// Parse user text into the linear value used for fitting.
    pub fn parse(&self, text: &str) -> Result<f64> {
        let text = text.trim();
        match *self {
            AxisUnits::Number => text
                .parse::<f64>()
                .map_err(|_| DigitizeError::InvalidSettings(format!("'{text}' is not a number"))),
            AxisUnits::DateTime { date, time } => {
                self.validate()?;
                parse_date_time(date, time, text)
                    .ok_or_else(|| DigitizeError::DateTimeParse { input: text.to_string() })
            }
        }
    }

    /// Input validator: true when `text` parses under these units.
    pub fn is_acceptable(&self, text: &str) -> bool {
        self.parse(text).is_ok()
    }

    /// Render a linear value for display/export.
    pub fn format(&self, value: f64) -> String {
        match *self {
            AxisUnits::Number => format!("{value}"),
            AxisUnits::DateTime { date, time } => format_date_time(date, time, value)
                .unwrap_or_else(|| format!("{value}")),
        }
    }
}

fn parse_date_time(date: DateFormat, time: TimeFormat, text: &str) -> Option<f64> {
    let base = epoch();
    match (date, time) {
        (DateFormat::Skip, TimeFormat::Skip) => None,
        (DateFormat::Skip, t) => t
            .patterns()
            .iter()
            .find_map(|p| NaiveTime::parse_from_str(text, p).ok())
            .map(|tm| tm.num_seconds_from_midnight() as f64),
        (d, TimeFormat::Skip) => parse_date(d, text).map(|dt| (dt - base).num_seconds() as f64),
        (d, t) => {
            for dp in d.patterns() {
                for tp in t.patterns() {
                    let pattern = format!("{dp} {tp}");
                    if let Ok(dt) = NaiveDateTime::parse_from_str(text, &pattern) {
                        return Some((dt - base).num_seconds() as f64);
                    }
                }
            }
            // A bare date is accepted on a combined axis as midnight.
            parse_date(d, text).map(|dt| (dt - base).num_seconds() as f64)
        }
    }
}

fn parse_date(date: DateFormat, text: &str) -> Option<NaiveDateTime> {
    date.patterns()
        .iter()
        .find_map(|p| NaiveDate::parse_from_str(text, p).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn format_date_time(date: DateFormat, time: TimeFormat, value: f64) -> Option<String> {
    let secs = value.round() as i64;
    match (date, time) {
        (DateFormat::Skip, TimeFormat::Skip) => None,
        (DateFormat::Skip, t) => {
            let of_day = secs.rem_euclid(SECONDS_PER_DAY) as u32;
            let tm = NaiveTime::from_num_seconds_from_midnight_opt(of_day, 0)?;
            Some(tm.format(t.patterns()[0]).to_string())
        }
        (d, t) => {
            let dt = DateTime::<Utc>::from_timestamp(secs, 0)?.naive_utc();
            let mut out = dt.format(d.patterns()[0]).to_string();
            if let Some(tp) = t.patterns().first() {
                out.push(' ');
                out.push_str(&dt.format(tp).to_string());
            }
            Some(out)
        }
    }
}
