//! Records exchanged with the shift API

/// Declare a numeric id newtype for a record kind.
///
/// Ids from different tables are distinct types so a [`UserId`] can never be
/// passed where a [`ShiftId`] is expected.
macro_rules! id_type {
    ($(#[$meta:meta])* $Name:ident as $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $Name(pub u64);

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ".{}"), self.0)
            }
        }

        impl std::str::FromStr for $Name {
            type Err = std::num::ParseIntError;

            /// Accepts both the bare number and the prefixed display form.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix(concat!($prefix, "."))
                    .unwrap_or(s)
                    .parse()
                    .map($Name)
            }
        }
    };
}

pub(crate) use id_type;

pub mod month;
pub mod policy;
pub mod request;
pub mod shift;
pub mod time;
pub mod user;

pub use month::*;
pub use policy::*;
pub use request::*;
pub use shift::*;
pub use time::*;
pub use user::*;

#[cfg(test)]
pub use crate::{date, requests, shifts, users};

/// Create a [`NaiveDate`](chrono::NaiveDate) literal.
///
/// Expects `m/d/y` format.
#[macro_export]
macro_rules! date {
    ($mo:literal/$d:literal/$yr:literal) => {
        ::chrono::NaiveDate::from_ymd_opt($yr, $mo, $d)
            .unwrap_or_else(|| panic!("`{}/{}/{}` is not a valid date", $mo, $d, $yr))
    };
}

/// Create a [`Vec`] of [`User`]s for testing.
///
/// `id: "username"`, optionally followed by `as "Display Name"` and `[admin]`.
#[macro_export]
macro_rules! users {
    ($(
        $id:literal: $username:literal $(as $name:literal)? $([$admin:ident])?
    ),* $(,)?) => {
        vec![$(
            $crate::data::user::User {
                id: $crate::data::user::UserId($id),
                username: $username.to_string(),
                display_name: None$(.or(Some($name)))?.unwrap_or($username).to_string(),
                admin: false $(|| stringify!($admin) == "admin")?,
            }
        ),*]
    };
}

/// Create a [`Vec`] of [`AvailabilityRequest`]s for testing.
///
/// `id: user @ "date" => can("start" to "end")`, `=> can` (no times) or `=> cannot`.
#[macro_export]
macro_rules! requests {
    (@times can($start:literal to $end:literal)) => {
        (
            true,
            Some($crate::data::time::TimeField::parse($start)),
            Some($crate::data::time::TimeField::parse($end)),
        )
    };
    (@times can) => {
        (true, None, None)
    };
    (@times cannot) => {
        (false, None, None)
    };

    ($(
        $id:literal: $user:literal @ $date:literal
            => $kind:ident $(($start:literal to $end:literal))?
    ),* $(,)?) => {
        vec![$({
            let (can_work, start_time, end_time) =
                $crate::requests!(@times $kind $(($start to $end))?);
            $crate::data::request::AvailabilityRequest {
                id: $crate::data::request::RequestId($id),
                user_id: $crate::data::user::UserId($user),
                date: $date.to_string(),
                can_work,
                start_time,
                end_time,
                description: None,
                user_display_name: None,
            }
        }),*]
    };
}

/// Create a [`Vec`] of [`ConfirmedShift`]s for testing.
///
/// `id: user @ "date" "start" to "end"`. Dates and times are kept as raw
/// strings so malformed input can be expressed too.
#[macro_export]
macro_rules! shifts {
    ($(
        $id:literal: $user:literal @ $date:literal $start:literal to $end:literal
    ),* $(,)?) => {
        vec![$(
            $crate::data::shift::ConfirmedShift {
                id: $crate::data::shift::ShiftId($id),
                user_id: $crate::data::user::UserId($user),
                date: $crate::data::time::DateField::parse($date),
                start_time: $crate::data::time::TimeField::parse($start),
                end_time: $crate::data::time::TimeField::parse($end),
                user_display_name: None,
            }
        ),*]
    };
}
