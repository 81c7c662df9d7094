//! See [`WeekdayPolicy`]

use super::month::YearMonth;
use bitflags::bitflags;
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

bitflags! {
    /// Which days of the week accept availability requests and appear on the grid.
    ///
    /// On the wire this is seven booleans (`monday` through `sunday`);
    /// a day missing from the payload counts as disabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WeekdayPolicy: u8 {
        /// Monday
        const MONDAY    = 1 << 0;
        /// Tuesday
        const TUESDAY   = 1 << 1;
        /// Wednesday
        const WEDNESDAY = 1 << 2;
        /// Thursday
        const THURSDAY  = 1 << 3;
        /// Friday
        const FRIDAY    = 1 << 4;
        /// Saturday
        const SATURDAY  = 1 << 5;
        /// Sunday
        const SUNDAY    = 1 << 6;

        /// Monday through Friday
        const WEEKDAYS = Self::MONDAY.bits()
            | Self::TUESDAY.bits()
            | Self::WEDNESDAY.bits()
            | Self::THURSDAY.bits()
            | Self::FRIDAY.bits();
    }
}

impl WeekdayPolicy {
    /// The flag for a single weekday.
    #[inline]
    pub fn day(weekday: Weekday) -> Self {
        Self::from_bits_retain(1 << weekday.num_days_from_monday())
    }

    /// Whether requests may be made for `weekday`.
    #[inline]
    pub fn allows(self, weekday: Weekday) -> bool {
        self.contains(Self::day(weekday))
    }

    /// Whether `date` falls on an enabled weekday.
    #[inline]
    pub fn allows_date(self, date: NaiveDate) -> bool {
        self.allows(date.weekday())
    }

    /// Every date of `month` on an enabled weekday, ascending.
    ///
    /// This is the column set of the admin grid and the choice list for new requests.
    pub fn in_scope_dates(self, month: YearMonth) -> Vec<NaiveDate> {
        month.days().filter(|&date| self.allows_date(date)).collect()
    }

    /// Enabled weekdays, Monday first.
    pub fn weekdays(self) -> impl Iterator<Item = Weekday> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(move |&weekday| self.allows(weekday))
    }
}

/// A day name in a weekday list was not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a day of the week")]
pub struct ParsePolicyError(pub String);

/// Comma-separated day names, such as `mon,wed,fri` or `Monday, Friday`.
///
/// The empty string and `none` both mean no days.
impl FromStr for WeekdayPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::empty());
        }
        s.split(',')
            .map(str::trim)
            .map(|name| {
                name.parse::<Weekday>()
                    .map(Self::day)
                    .map_err(|_| ParsePolicyError(name.to_string()))
            })
            .try_fold(Self::empty(), |acc, day| day.map(|day| acc | day))
    }
}

impl fmt::Display for WeekdayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, weekday) in self.weekdays().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{weekday}")?;
        }
        Ok(())
    }
}

/// Wire form of [`WeekdayPolicy`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
struct DaySettings {
    monday: bool,
    tuesday: bool,
    wednesday: bool,
    thursday: bool,
    friday: bool,
    saturday: bool,
    sunday: bool,
}

impl From<DaySettings> for WeekdayPolicy {
    fn from(value: DaySettings) -> Self {
        let DaySettings {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
        } = value;
        let mut policy = Self::empty();
        policy.set(Self::MONDAY, monday);
        policy.set(Self::TUESDAY, tuesday);
        policy.set(Self::WEDNESDAY, wednesday);
        policy.set(Self::THURSDAY, thursday);
        policy.set(Self::FRIDAY, friday);
        policy.set(Self::SATURDAY, saturday);
        policy.set(Self::SUNDAY, sunday);
        policy
    }
}

impl From<WeekdayPolicy> for DaySettings {
    fn from(value: WeekdayPolicy) -> Self {
        Self {
            monday: value.contains(WeekdayPolicy::MONDAY),
            tuesday: value.contains(WeekdayPolicy::TUESDAY),
            wednesday: value.contains(WeekdayPolicy::WEDNESDAY),
            thursday: value.contains(WeekdayPolicy::THURSDAY),
            friday: value.contains(WeekdayPolicy::FRIDAY),
            saturday: value.contains(WeekdayPolicy::SATURDAY),
            sunday: value.contains(WeekdayPolicy::SUNDAY),
        }
    }
}

impl Serialize for WeekdayPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        DaySettings::from(*self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WeekdayPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        DaySettings::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date;

    #[test]
    fn test_missing_days_are_disabled() {
        let policy = serde_json::from_str::<WeekdayPolicy>(r#"{"monday": true, "friday": true}"#)
            .unwrap();
        assert_eq!(policy, WeekdayPolicy::MONDAY | WeekdayPolicy::FRIDAY);
        assert_eq!(
            serde_json::to_value(policy).unwrap(),
            serde_json::json!({
                "monday": true,
                "tuesday": false,
                "wednesday": false,
                "thursday": false,
                "friday": true,
                "saturday": false,
                "sunday": false,
            }),
        );
    }

    #[test]
    fn test_in_scope_dates() {
        // July 2024 starts on a Monday
        let july = YearMonth::new(2024, 7).unwrap();
        let mondays = WeekdayPolicy::MONDAY.in_scope_dates(july);
        assert_eq!(
            mondays,
            [
                date!(7 / 1 / 2024),
                date!(7 / 8 / 2024),
                date!(7 / 15 / 2024),
                date!(7 / 22 / 2024),
                date!(7 / 29 / 2024),
            ],
        );
        assert!(WeekdayPolicy::empty().in_scope_dates(july).is_empty());
        assert_eq!(WeekdayPolicy::all().in_scope_dates(july).len(), 31);
    }

    #[test]
    fn test_parse_day_list() {
        assert_eq!(
            "mon, Wednesday,fri".parse::<WeekdayPolicy>(),
            Ok(WeekdayPolicy::MONDAY | WeekdayPolicy::WEDNESDAY | WeekdayPolicy::FRIDAY),
        );
        assert_eq!("none".parse::<WeekdayPolicy>(), Ok(WeekdayPolicy::empty()));
        assert_eq!(
            "mon,funday".parse::<WeekdayPolicy>(),
            Err(ParsePolicyError("funday".to_string())),
        );
        assert_eq!(WeekdayPolicy::WEEKDAYS.to_string(), "Mon,Tue,Wed,Thu,Fri");
        assert_eq!(
            WeekdayPolicy::WEEKDAYS.to_string().parse::<WeekdayPolicy>(),
            Ok(WeekdayPolicy::WEEKDAYS),
        );
    }
}
