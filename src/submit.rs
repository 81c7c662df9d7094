//! Rules for employees submitting availability

use crate::data::{AvailabilityRequest, ClockTime, UserId, WeekdayPolicy, YearMonth};
use chrono::NaiveDate;
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use serde::Serialize;
use thiserror::Error;

/// Longest accepted request note, in characters.
pub const DESCRIPTION_LIMIT: usize = 200;

/// A request could not be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SubmitError {
    /// The weekday of the date is not enabled.
    #[error("requests cannot be made for {date} ({weekday})")]
    #[diagnostic(code(shiftboard::submit::out_of_scope))]
    OutOfScope {
        /// Requested date.
        date: NaiveDate,
        /// Its weekday.
        weekday: chrono::Weekday,
    },

    /// An available request needs both times.
    #[error("an available request for {date} needs a start and an end time")]
    #[diagnostic(code(shiftboard::submit::missing_time))]
    MissingTime {
        /// Requested date.
        date: NaiveDate,
    },

    /// The end is not after the start.
    #[error("{start}-{end} is not a valid time range")]
    #[diagnostic(code(shiftboard::submit::empty_span))]
    EmptySpan {
        /// Requested start.
        start: ClockTime,
        /// Requested end.
        end: ClockTime,
    },

    /// The note is too long.
    #[error(
        "description is {len} characters; at most {limit} are allowed",
        limit = DESCRIPTION_LIMIT
    )]
    #[diagnostic(code(shiftboard::submit::description_too_long))]
    DescriptionTooLong {
        /// Characters given.
        len: usize,
    },
}

impl SubmitError {
    /// Status the service answers with for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Self::OutOfScope { .. } => 400,
            Self::MissingTime { .. }
            | Self::EmptySpan { .. }
            | Self::DescriptionTooLong { .. } => 422,
        }
    }
}

/// Body of an availability request submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRequest {
    /// Requested day.
    pub date: NaiveDate,

    /// Whether the employee can work.
    #[serde(rename = "canwork")]
    pub can_work: bool,

    /// Preferred start. Only for available requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<ClockTime>,

    /// Preferred end. Only for available requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<ClockTime>,

    /// Free-form note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRequest {
    /// Available on `date` from `start` to `end`.
    pub fn available(date: NaiveDate, start: ClockTime, end: ClockTime) -> Self {
        Self {
            date,
            can_work: true,
            start_time: Some(start),
            end_time: Some(end),
            description: None,
        }
    }

    /// Not available on `date`.
    pub fn unavailable(date: NaiveDate) -> Self {
        Self {
            date,
            can_work: false,
            start_time: None,
            end_time: None,
            description: None,
        }
    }

    /// Attach a note.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the request against `policy` and return it in the form it is stored.
    ///
    /// Unavailable requests lose any times, and a blank note becomes [`None`].
    ///
    /// # Errors
    ///
    /// See [`SubmitError`].
    pub fn validate(self, policy: WeekdayPolicy) -> Result<Self, SubmitError> {
        let Self {
            date,
            can_work,
            start_time,
            end_time,
            description,
        } = self;

        if !policy.allows_date(date) {
            return Err(SubmitError::OutOfScope {
                date,
                weekday: chrono::Datelike::weekday(&date),
            });
        }

        let (start_time, end_time) = if can_work {
            let (Some(start), Some(end)) = (start_time, end_time) else {
                return Err(SubmitError::MissingTime { date });
            };
            if start.minutes_until(end) <= 0 {
                return Err(SubmitError::EmptySpan { start, end });
            }
            (Some(start), Some(end))
        } else {
            (None, None)
        };

        let description = description.filter(|text| !text.trim().is_empty());
        if let Some(len) = description
            .as_deref()
            .map(|text| text.chars().count())
            .filter(|&len| len > DESCRIPTION_LIMIT)
        {
            return Err(SubmitError::DescriptionTooLong { len });
        }

        Ok(Self {
            date,
            can_work,
            start_time,
            end_time,
            description,
        })
    }
}

/// In-scope dates of `month` that `user` has not submitted a request for yet.
pub fn open_dates(
    month: YearMonth,
    policy: WeekdayPolicy,
    existing: &[AvailabilityRequest],
    user: UserId,
) -> Vec<NaiveDate> {
    let taken = existing
        .iter()
        .filter(|request| request.user_id == user)
        .map(|request| request.date.as_str())
        .collect::<FxHashSet<_>>();
    policy
        .in_scope_dates(month)
        .into_iter()
        .filter(|date| !taken.contains(date.to_string().as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{date, requests};

    fn hm(hour: u32, minute: u32) -> ClockTime {
        ClockTime::from_hm(hour, minute).unwrap()
    }

    #[test]
    fn test_open_dates_skip_submitted() {
        let july = YearMonth::new(2024, 7).unwrap();
        let existing = requests! {
            1: 3 @ "2024-07-01" => cannot,
            2: 5 @ "2024-07-08" => can,
        };
        assert_eq!(
            open_dates(july, WeekdayPolicy::MONDAY, &existing, UserId(3)),
            [
                date!(7 / 8 / 2024),
                date!(7 / 15 / 2024),
                date!(7 / 22 / 2024),
                date!(7 / 29 / 2024),
            ],
            "other users' requests do not close a date",
        );
    }

    #[test]
    fn test_validate_scope_and_times() {
        let monday = date!(7 / 1 / 2024);
        let tuesday = date!(7 / 2 / 2024);
        assert_eq!(
            NewRequest::unavailable(tuesday).validate(WeekdayPolicy::MONDAY),
            Err(SubmitError::OutOfScope {
                date: tuesday,
                weekday: chrono::Weekday::Tue,
            }),
        );
        assert_eq!(
            NewRequest {
                start_time: None,
                ..NewRequest::available(monday, hm(9, 0), hm(12, 0))
            }
            .validate(WeekdayPolicy::MONDAY),
            Err(SubmitError::MissingTime { date: monday }),
        );
        assert_eq!(
            NewRequest::available(monday, hm(12, 0), hm(9, 0)).validate(WeekdayPolicy::MONDAY),
            Err(SubmitError::EmptySpan {
                start: hm(12, 0),
                end: hm(9, 0),
            }),
        );
    }

    #[test]
    fn test_validate_normalizes() {
        let monday = date!(7 / 1 / 2024);
        let stored = NewRequest {
            start_time: Some(hm(9, 0)),
            ..NewRequest::unavailable(monday).with_description("   ")
        }
        .validate(WeekdayPolicy::MONDAY)
        .unwrap();
        assert_eq!(stored, NewRequest::unavailable(monday), "times and blank notes are dropped");
    }

    #[test]
    fn test_description_limit_counts_characters() {
        let monday = date!(7 / 1 / 2024);
        let fits = "あ".repeat(DESCRIPTION_LIMIT);
        assert!(
            NewRequest::unavailable(monday)
                .with_description(fits)
                .validate(WeekdayPolicy::MONDAY)
                .is_ok(),
            "multi-byte text is limited by characters, not bytes",
        );
        assert_eq!(
            NewRequest::unavailable(monday)
                .with_description("x".repeat(DESCRIPTION_LIMIT + 1))
                .validate(WeekdayPolicy::MONDAY),
            Err(SubmitError::DescriptionTooLong { len: DESCRIPTION_LIMIT + 1 }),
        );
    }
}
