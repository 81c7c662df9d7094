//! Errors and diagnostics shared across the crate

use crate::{
    data::{ClockTime, ShiftId, UserId},
    ops::BulkReport,
};
use chrono::NaiveDate;
use miette::Diagnostic;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// One entry of a field-level validation failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    /// Path to the offending field, such as `["body", "start_time"]`.
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,

    /// Human-readable complaint.
    pub msg: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = self.loc.iter().filter_map(|part| match part {
            serde_json::Value::String(s) if s == "body" => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
        match path.next() {
            Some(first) => {
                f.write_str(&first)?;
                for part in path {
                    write!(f, ".{part}")?;
                }
                write!(f, ": {}", self.msg)
            }
            None => f.write_str(&self.msg),
        }
    }
}

/// The `detail` member of an error response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    /// A single message.
    Message(String),

    /// Per-field validation failures.
    Fields(Vec<FieldError>),
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => f.write_str(msg),
            Self::Fields(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{field}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Detail {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

/// A call through [`ShiftApi`](crate::api::ShiftApi) failed.
#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    /// The request never got a response.
    #[error("could not reach the shift API")]
    #[diagnostic(
        code(shiftboard::api::transport),
        help("check `api_url` and that the server is running"),
    )]
    Transport(#[source] reqwest::Error),

    /// The server answered 401.
    #[error("the session is no longer valid")]
    #[diagnostic(
        code(shiftboard::api::session),
        help("run `shiftboard login` and pass the new token with `--token` or SHIFTBOARD_TOKEN"),
    )]
    SessionInvalid,

    /// The server refused the call.
    #[error("the server rejected the request ({status}): {detail}")]
    #[diagnostic(code(shiftboard::api::rejected))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// What the server said.
        detail: Detail,
    },

    /// The response did not have the expected shape.
    #[error("unexpected response from the shift API")]
    #[diagnostic(code(shiftboard::api::decode))]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Shorthand for [`ApiError::Rejected`] with a plain message.
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            detail: Detail::Message(detail.into()),
        }
    }

    /// HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionInvalid => Some(401),
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|status| status.as_u16()),
            Self::Decode(_) => None,
        }
    }
}

/// An administrator operation could not be carried out.
#[derive(Debug, Error, Diagnostic)]
pub enum OpError {
    /// The user or date is not on the current grid.
    #[error("{user} has no cell on {date} in the current grid")]
    #[diagnostic(
        code(shiftboard::op::unknown_cell),
        help("the date must fall on an enabled weekday of the month being viewed"),
    )]
    UnknownCell {
        /// Requested user.
        user: UserId,
        /// Requested date.
        date: NaiveDate,
    },

    /// Only a cell with an available request can be confirmed.
    #[error("{user} has no open availability request on {date}")]
    #[diagnostic(code(shiftboard::op::not_confirmable))]
    NotConfirmable {
        /// Requested user.
        user: UserId,
        /// Requested date.
        date: NaiveDate,
    },

    /// Edit and delete need a confirmed shift in the cell.
    #[error("{user} has no confirmed shift on {date}")]
    #[diagnostic(code(shiftboard::op::not_confirmed))]
    NotConfirmed {
        /// Requested user.
        user: UserId,
        /// Requested date.
        date: NaiveDate,
    },

    /// A start or end time is absent or unreadable.
    #[error("no usable {which} time for {user} on {date}")]
    #[diagnostic(
        code(shiftboard::op::missing_time),
        help("pass `--start` and `--end` explicitly"),
    )]
    MissingTime {
        /// `"start"` or `"end"`.
        which: &'static str,
        /// Requested user.
        user: UserId,
        /// Requested date.
        date: NaiveDate,
    },

    /// The shift would end at or before its start.
    #[error("shift {start}-{end} has no length")]
    #[diagnostic(code(shiftboard::op::empty_span))]
    EmptySpan {
        /// Proposed start.
        start: ClockTime,
        /// Proposed end.
        end: ClockTime,
    },

    /// The change was saved but refreshing the grid failed.
    #[error("{shift} was saved but the grid could not be reloaded")]
    #[diagnostic(code(shiftboard::op::stale))]
    Stale {
        /// What was saved.
        shift: Saved,
        /// Why the reload failed.
        #[source]
        #[diagnostic_source]
        source: ApiError,
    },

    /// A bulk run finished but refreshing the grid failed.
    ///
    /// The report of what was created and what was refused rides along.
    #[error("the bulk confirmation finished but the grid could not be reloaded")]
    #[diagnostic(
        code(shiftboard::op::stale_bulk),
        help("the shifts listed as confirmed exist; reload the month to see them"),
    )]
    StaleBulk {
        /// Outcome of the run.
        report: Box<BulkReport>,
        /// Why the reload failed.
        #[source]
        #[diagnostic_source]
        source: ApiError,
    },

    /// The collaborator refused or failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),
}

/// What a mutation managed to persist, reported by [`OpError::Stale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    /// A shift was created or updated.
    Shift(ShiftId),
    /// A shift was deleted.
    Deleted(ShiftId),
    /// The weekday policy was replaced.
    Policy,
}

impl fmt::Display for Saved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(id) => write!(f, "shift {id}"),
            Self::Deleted(id) => write!(f, "deletion of {id}"),
            Self::Policy => f.write_str("the weekday policy"),
        }
    }
}

/// A date or time on a record could not be read.
///
/// Never fatal: the grid still builds and shows a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("unreadable {field} {raw:?} on {record}")]
#[diagnostic(
    code(shiftboard::malformed),
    severity(Warning),
    help("the cell is shown with a placeholder; correct the record on the server"),
)]
pub struct MalformedValue {
    /// Which record, e.g. `s.12`.
    pub record: String,
    /// Which field, e.g. `start_time`.
    pub field: &'static str,
    /// The unreadable text.
    pub raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_shapes() {
        let message = serde_json::from_str::<Detail>(r#""User already registered""#).unwrap();
        assert_eq!(message.to_string(), "User already registered");

        let fields = serde_json::from_str::<Detail>(
            r#"[
                {
                    "loc": ["body", "start_time"],
                    "msg": "field required",
                    "type": "value_error.missing"
                },
                {"loc": ["query", "month", 0], "msg": "not an integer"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            fields.to_string(),
            "start_time: field required; query.month.0: not an integer",
        );
    }

    #[test]
    fn test_status_of_errors() {
        assert_eq!(ApiError::SessionInvalid.status(), Some(401));
        assert_eq!(ApiError::rejected(409, "exists").status(), Some(409));
    }
}
