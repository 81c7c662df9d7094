//! See [`ConfirmedShift`]

use super::{
    time::{ClockTime, DateField, TimeField},
    user::UserId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

super::id_type! {
    /// Server-assigned identifier of a [`ConfirmedShift`].
    ShiftId as "s"
}

/// An assignment the administrator has committed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedShift {
    /// Duplicate of the shift's ID.
    pub id: ShiftId,

    /// Who works the shift.
    pub user_id: UserId,

    /// Day of the shift. Matched against grid columns after normalization.
    pub date: DateField,

    /// Start of the shift.
    pub start_time: TimeField,

    /// End of the shift.
    pub end_time: TimeField,

    /// Denormalized display name some endpoints include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
}

/// Body of a create or update call for a [`ConfirmedShift`].
///
/// Times are always sent in the short `HH:mm` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDraft {
    /// Day of the shift.
    pub date: NaiveDate,

    /// Start of the shift.
    pub start_time: ClockTime,

    /// End of the shift.
    pub end_time: ClockTime,

    /// Who works the shift.
    pub user_id: UserId,
}

impl ShiftDraft {
    /// Signed length of the shift in minutes.
    #[inline]
    pub fn minutes(&self) -> i64 {
        self.start_time.minutes_until(self.end_time)
    }
}

impl ConfirmedShift {
    /// Materialize a draft under a fresh id.
    pub fn from_draft(id: ShiftId, draft: ShiftDraft) -> Self {
        let ShiftDraft {
            date,
            start_time,
            end_time,
            user_id,
        } = draft;
        Self {
            id,
            user_id,
            date: date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            user_display_name: None,
        }
    }
}
