//! See [`AvailabilityRequest`]

use super::{
    time::{TimeField, opt_time},
    user::UserId,
};
use serde::{Deserialize, Serialize};

super::id_type! {
    /// Server-assigned identifier of an [`AvailabilityRequest`].
    RequestId as "r"
}

/// An employee's statement about one day: whether they can work, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// Duplicate of the request's ID.
    pub id: RequestId,

    /// Who submitted the request.
    pub user_id: UserId,

    /// The requested day, exactly as the server sent it.
    ///
    /// Matched against grid columns by string equality with the
    /// canonical `YYYY-MM-DD` form, so a request stored with a time suffix
    /// never matches a column.
    pub date: String,

    /// `true` when the employee says they are available.
    #[serde(rename = "canwork")]
    pub can_work: bool,

    /// Preferred start, when available.
    #[serde(default, with = "opt_time")]
    pub start_time: Option<TimeField>,

    /// Preferred end, when available.
    #[serde(default, with = "opt_time")]
    pub end_time: Option<TimeField>,

    /// Free-form note from the employee.
    #[serde(default)]
    pub description: Option<String>,

    /// Denormalized display name some endpoints include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
}
