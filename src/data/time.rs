//! Time-of-day and date values as they come off the wire.
//!
//! Records written by different clients disagree on how `start_time` and
//! `date` look: one sends `"09:30"`, another `"2024-07-10T09:30:00"`.
//! Everything here folds those spellings into one canonical value, and keeps
//! whatever cannot be read around as a [`TimeField::Malformed`] or
//! [`DateField::Malformed`] instead of failing the whole response.

use chrono::prelude::*;
use serde::{Deserialize, Serialize, de::Visitor};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Shown wherever a time could not be read.
pub const TIME_PLACEHOLDER: &str = "??:??";

/// Formats accepted for a bare time of day.
///
/// `%.f` also matches an absent fractional part.
const BARE_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S%.f"];

/// Formats accepted for a datetime without an offset.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// The time string could not be read in any supported form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a recognizable time")]
pub struct ParseTimeError(pub String);

/// The two shapes a time-of-day arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRepr {
    /// `HH:mm`, `H:mm`, `HH:mm:ss` or `HH:mm:ss.fff`.
    Bare(NaiveTime),

    /// An ISO-8601 datetime. A trailing `Z` or offset is accepted, but only
    /// the wall-clock time as written is kept; no timezone conversion happens.
    FullDateTime(NaiveDateTime),
}

impl TimeRepr {
    /// The time of day this represents.
    #[inline]
    pub fn time(self) -> NaiveTime {
        match self {
            Self::Bare(time) => time,
            Self::FullDateTime(datetime) => datetime.time(),
        }
    }
}

impl FromStr for TimeRepr {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if s.contains(['T', ' ']) {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_local())
                .ok()
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                })
                .map(Self::FullDateTime)
        } else {
            BARE_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                .map(Self::Bare)
        };
        parsed.ok_or_else(|| ParseTimeError(s.to_string()))
    }
}

/// A wall-clock time at minute precision.
///
/// Always displays and serializes as zero-padded `HH:mm`. Seconds present in
/// the source are dropped, not rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Construct from an hour and minute. [`None`] if either is out of range.
    #[inline]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Hour component (0-23).
    #[inline]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    /// Minute component (0-59).
    #[inline]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Signed number of minutes from `self` until `end` on the same day.
    ///
    /// Negative when `end` is earlier; spans never wrap past midnight.
    #[inline]
    pub fn minutes_until(self, end: Self) -> i64 {
        (end.0 - self.0).num_minutes()
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        let truncated = time.hour() * 3600 + time.minute() * 60;
        Self(NaiveTime::from_num_seconds_from_midnight_opt(truncated, 0).unwrap_or(time))
    }
}

impl From<TimeRepr> for ClockTime {
    #[inline]
    fn from(repr: TimeRepr) -> Self {
        repr.time().into()
    }
}

impl FromStr for ClockTime {
    type Err = ParseTimeError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<TimeRepr>().map(Self::from)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ClockTimeVisitor;

        impl Visitor<'_> for ClockTimeVisitor {
            type Value = ClockTime;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a time of day such as `09:30` or an ISO-8601 datetime")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ClockTimeVisitor)
    }
}

/// A time field read from a record.
///
/// Deserializing a [`TimeField`] never fails: unreadable input is kept
/// verbatim so the surrounding record still loads and the cell can show
/// [`TIME_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeField {
    /// Parsed and normalized.
    Valid(ClockTime),

    /// Could not be parsed. Holds the raw text.
    Malformed(String),
}

impl TimeField {
    /// Parse leniently. Never fails.
    pub fn parse(s: &str) -> Self {
        s.parse::<ClockTime>()
            .map_or_else(|_| Self::Malformed(s.to_string()), Self::Valid)
    }

    /// The time, if it was readable.
    #[inline]
    pub fn valid(&self) -> Option<ClockTime> {
        match self {
            Self::Valid(time) => Some(*time),
            Self::Malformed(_) => None,
        }
    }

    /// The raw text, if it was not readable.
    #[inline]
    pub fn malformed(&self) -> Option<&str> {
        match self {
            Self::Valid(_) => None,
            Self::Malformed(raw) => Some(raw),
        }
    }
}

impl From<ClockTime> for TimeField {
    #[inline]
    fn from(time: ClockTime) -> Self {
        Self::Valid(time)
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(time) => fmt::Display::fmt(time, f),
            Self::Malformed(_) => f.write_str(TIME_PLACEHOLDER),
        }
    }
}

/// Malformed values are written back untouched so nothing the server sent is lost.
impl Serialize for TimeField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Valid(time) => time.serialize(serializer),
            Self::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for TimeField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|raw| Self::parse(&raw))
    }
}

/// Serde adapter for optional time fields, where `null`, a missing key and
/// an empty string all mean "not given".
pub mod opt_time {
    use super::TimeField;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// See [module docs](self).
    pub fn serialize<S>(value: &Option<TimeField>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    /// See [module docs](self).
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<TimeField>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| TimeField::parse(&raw)))
    }
}

/// Canonical `HH:mm` text for any accepted time spelling, or [`TIME_PLACEHOLDER`].
///
/// ```
/// # use shiftboard::data::time::normalize_time;
/// assert_eq!(normalize_time("9:05"), "09:05");
/// assert_eq!(normalize_time("2024-07-10T18:00:00Z"), "18:00");
/// assert_eq!(normalize_time("soon"), "??:??");
/// ```
pub fn normalize_time(s: &str) -> String {
    TimeField::parse(s).to_string()
}

/// Calendar date of a `YYYY-MM-DD` string, ignoring anything after a `T` or space.
pub fn normalize_date(s: &str) -> Option<NaiveDate> {
    s.trim()
        .split(['T', ' '])
        .next()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}

/// A date field read from a record. Like [`TimeField`], never fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateField {
    /// Parsed calendar date.
    Valid(NaiveDate),

    /// Could not be parsed. Holds the raw text.
    Malformed(String),
}

impl DateField {
    /// Parse leniently with [`normalize_date`]. Never fails.
    pub fn parse(s: &str) -> Self {
        normalize_date(s).map_or_else(|| Self::Malformed(s.to_string()), Self::Valid)
    }

    /// The date, if it was readable.
    #[inline]
    pub fn valid(&self) -> Option<NaiveDate> {
        match self {
            Self::Valid(date) => Some(*date),
            Self::Malformed(_) => None,
        }
    }
}

impl From<NaiveDate> for DateField {
    #[inline]
    fn from(date: NaiveDate) -> Self {
        Self::Valid(date)
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(date) => fmt::Display::fmt(date, f),
            Self::Malformed(raw) => write!(f, "{raw:?}"),
        }
    }
}

impl Serialize for DateField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Valid(date) => date.serialize(serializer),
            Self::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for DateField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|raw| Self::parse(&raw))
    }
}
