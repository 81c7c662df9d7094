//! The boundary to the shift service
//!
//! Everything the administrator does goes through [`ShiftApi`]. [`HttpApi`]
//! talks to the real service; [`MemoryApi`] keeps the same tables in
//! process and enforces the same rules, for tests and offline work.

pub mod http;
pub mod memory;

pub use http::HttpApi;
pub use memory::{MemoryApi, Snapshot};

use crate::{
    data::{
        AvailabilityRequest, ConfirmedShift, ShiftDraft, ShiftId, User, WeekdayPolicy, YearMonth,
    },
    error::ApiError,
};
use serde::{Deserialize, Serialize};

/// Operations the administrator tool needs from the shift service.
#[allow(
    async_fn_in_trait,
    reason = "all futures are driven on one current-thread runtime and are never sent"
)]
pub trait ShiftApi {
    /// Every registered user, administrators included.
    async fn users(&self) -> Result<Vec<User>, ApiError>;

    /// Availability requests, optionally limited to one month.
    async fn shift_requests(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<AvailabilityRequest>, ApiError>;

    /// Confirmed shifts, optionally limited to one month.
    async fn confirmed_shifts(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<ConfirmedShift>, ApiError>;

    /// Which weekdays are schedulable.
    async fn weekday_policy(&self) -> Result<WeekdayPolicy, ApiError>;

    /// Create a confirmed shift.
    async fn create_shift(&self, draft: &ShiftDraft) -> Result<ConfirmedShift, ApiError>;

    /// Replace a confirmed shift.
    async fn update_shift(
        &self,
        id: ShiftId,
        draft: &ShiftDraft,
    ) -> Result<ConfirmedShift, ApiError>;

    /// Remove a confirmed shift.
    async fn delete_shift(&self, id: ShiftId) -> Result<(), ApiError>;

    /// Replace the weekday policy. Returns what the service stored.
    async fn set_weekday_policy(&self, policy: WeekdayPolicy) -> Result<WeekdayPolicy, ApiError>;
}

impl<A: ShiftApi + ?Sized> ShiftApi for &A {
    #[inline]
    async fn users(&self) -> Result<Vec<User>, ApiError> {
        (**self).users().await
    }

    #[inline]
    async fn shift_requests(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<AvailabilityRequest>, ApiError> {
        (**self).shift_requests(month).await
    }

    #[inline]
    async fn confirmed_shifts(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<ConfirmedShift>, ApiError> {
        (**self).confirmed_shifts(month).await
    }

    #[inline]
    async fn weekday_policy(&self) -> Result<WeekdayPolicy, ApiError> {
        (**self).weekday_policy().await
    }

    #[inline]
    async fn create_shift(&self, draft: &ShiftDraft) -> Result<ConfirmedShift, ApiError> {
        (**self).create_shift(draft).await
    }

    #[inline]
    async fn update_shift(
        &self,
        id: ShiftId,
        draft: &ShiftDraft,
    ) -> Result<ConfirmedShift, ApiError> {
        (**self).update_shift(id, draft).await
    }

    #[inline]
    async fn delete_shift(&self, id: ShiftId) -> Result<(), ApiError> {
        (**self).delete_shift(id).await
    }

    #[inline]
    async fn set_weekday_policy(&self, policy: WeekdayPolicy) -> Result<WeekdayPolicy, ApiError> {
        (**self).set_weekday_policy(policy).await
    }
}

/// `?year=&month=` query of the list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct MonthQuery {
    year: i32,
    month: u32,
}

impl From<YearMonth> for MonthQuery {
    fn from(value: YearMonth) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
        }
    }
}

/// A bearer token issued by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Token {
    /// The token itself.
    pub access_token: String,

    /// Always `bearer`.
    pub token_type: String,
}
