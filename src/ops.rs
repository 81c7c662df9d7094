//! Administrator operations on the monthly grid
//!
//! [`Board`] holds everything the administrator is looking at: the
//! collaborator, the month, and the grid built from the last fetch. Every
//! mutation goes through the collaborator and is followed by a full reload,
//! so the grid always reflects the service and is never patched locally.

use crate::{
    api::ShiftApi,
    data::{ClockTime, ShiftDraft, ShiftId, TimeField, UserId, WeekdayPolicy, YearMonth},
    error::{ApiError, OpError, Saved},
    recon::{Candidate, Cell, CellStatus, Grid},
};
use chrono::NaiveDate;
use itertools::Itertools;
use smallvec::SmallVec;

/// Fetch users, requests, shifts and policy for `month` and reconcile them.
///
/// The four reads run concurrently and are awaited together; if any one
/// fails the whole load fails and no grid is produced.
///
/// # Errors
///
/// The first [`ApiError`] any of the reads returns.
pub async fn fetch_grid<A: ShiftApi>(api: &A, month: YearMonth) -> Result<Grid, ApiError> {
    let (users, requests, shifts, policy) = tokio::try_join!(
        api.users(),
        api.shift_requests(Some(month)),
        api.confirmed_shifts(Some(month)),
        api.weekday_policy(),
    )?;
    let users = users.into_iter().filter(|user| !user.admin).collect_vec();
    Ok(Grid::build(month, policy, &users, &requests, &shifts))
}

/// Outcome of [`Board::bulk_confirm`].
#[derive(Debug, Default)]
pub struct BulkReport {
    /// Candidates that became shifts, with the new ids.
    pub confirmed: Vec<(Candidate, ShiftId)>,

    /// Candidates the service refused, with why.
    pub failed: SmallVec<[(Candidate, ApiError); 1]>,
}

impl BulkReport {
    /// Whether every candidate was confirmed.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The administrator's view of one month.
#[derive(Debug)]
pub struct Board<A> {
    api: A,
    month: YearMonth,
    grid: Grid,
}

impl<A: ShiftApi> Board<A> {
    /// Load `month` through `api`.
    ///
    /// # Errors
    ///
    /// See [`fetch_grid`].
    pub async fn load(api: A, month: YearMonth) -> Result<Self, ApiError> {
        let grid = fetch_grid(&api, month).await?;
        Ok(Self { api, month, grid })
    }

    /// The collaborator.
    #[inline]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The month being viewed.
    #[inline]
    pub fn month(&self) -> YearMonth {
        self.month
    }

    /// The grid as of the last load.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Fetch everything again. On failure the previous grid is kept.
    ///
    /// # Errors
    ///
    /// See [`fetch_grid`].
    pub async fn reload(&mut self) -> Result<(), ApiError> {
        self.grid = fetch_grid(&self.api, self.month).await?;
        Ok(())
    }

    /// Switch to another month.
    ///
    /// # Errors
    ///
    /// See [`fetch_grid`]. The board stays on the old month on failure.
    pub async fn goto(&mut self, month: YearMonth) -> Result<(), ApiError> {
        self.grid = fetch_grid(&self.api, month).await?;
        self.month = month;
        Ok(())
    }

    async fn reload_after(&mut self, saved: Saved) -> Result<(), OpError> {
        self.reload()
            .await
            .map_err(|source| OpError::Stale { shift: saved, source })
    }

    fn cell(&self, user: UserId, date: NaiveDate) -> Result<&Cell, OpError> {
        self.grid
            .cell(user, date)
            .ok_or(OpError::UnknownCell { user, date })
    }

    /// Turn the available request at (`user`, `date`) into a confirmed shift.
    ///
    /// `start` and `end` override the requested times when given.
    ///
    /// # Errors
    ///
    /// - [`OpError::UnknownCell`] if the cell is not on the grid
    /// - [`OpError::NotConfirmable`] unless the cell shows an available request
    /// - [`OpError::MissingTime`] if a time is neither given nor readable on the request
    /// - [`OpError::EmptySpan`] if the shift would not end after it starts
    /// - [`OpError::Api`] if the service refuses
    pub async fn confirm(
        &mut self,
        user: UserId,
        date: NaiveDate,
        start: Option<ClockTime>,
        end: Option<ClockTime>,
    ) -> Result<ShiftId, OpError> {
        let CellStatus::RequestedAvailable {
            start: requested_start,
            end: requested_end,
        } = &self.cell(user, date)?.status
        else {
            return Err(OpError::NotConfirmable { user, date });
        };

        let pick = |given: Option<ClockTime>, requested: Option<&TimeField>, which| {
            given
                .or_else(|| requested.and_then(|field| field.valid()))
                .ok_or(OpError::MissingTime { which, user, date })
        };
        let start_time = pick(start, requested_start.as_ref(), "start")?;
        let end_time = pick(end, requested_end.as_ref(), "end")?;
        let draft = checked_draft(user, date, start_time, end_time)?;

        let shift = self.api.create_shift(&draft).await?;
        self.reload_after(Saved::Shift(shift.id)).await?;
        Ok(shift.id)
    }

    /// Confirm every [bulk candidate](Grid::bulk_candidates), one after another.
    ///
    /// A refused candidate does not stop the run, and shifts created before
    /// it stay in place. The grid is reloaded once at the end.
    ///
    /// # Errors
    ///
    /// Only [`OpError::StaleBulk`], if the final reload fails. The report
    /// travels inside it.
    pub async fn bulk_confirm(&mut self) -> Result<BulkReport, OpError> {
        let mut report = BulkReport::default();
        for candidate in self.grid.bulk_candidates() {
            match self.api.create_shift(&candidate.draft).await {
                Ok(shift) => report.confirmed.push((candidate, shift.id)),
                Err(e) => report.failed.push((candidate, e)),
            }
        }
        match self.reload().await {
            Ok(()) => Ok(report),
            Err(source) => Err(OpError::StaleBulk {
                report: Box::new(report),
                source,
            }),
        }
    }

    /// Change the times of the confirmed shift at (`user`, `date`).
    ///
    /// # Errors
    ///
    /// - [`OpError::UnknownCell`] if the cell is not on the grid
    /// - [`OpError::NotConfirmed`] unless the cell shows a confirmed shift
    /// - [`OpError::EmptySpan`] if the shift would not end after it starts
    /// - [`OpError::Api`] if the service refuses
    pub async fn edit(
        &mut self,
        user: UserId,
        date: NaiveDate,
        start: ClockTime,
        end: ClockTime,
    ) -> Result<ShiftId, OpError> {
        let id = self.confirmed_id(user, date)?;
        let draft = checked_draft(user, date, start, end)?;
        let shift = self.api.update_shift(id, &draft).await?;
        self.reload_after(Saved::Shift(shift.id)).await?;
        Ok(shift.id)
    }

    /// Remove the confirmed shift at (`user`, `date`).
    ///
    /// Afterwards the cell shows whatever request remains, or nothing.
    ///
    /// # Errors
    ///
    /// - [`OpError::UnknownCell`] if the cell is not on the grid
    /// - [`OpError::NotConfirmed`] unless the cell shows a confirmed shift
    /// - [`OpError::Api`] if the service refuses
    pub async fn delete(&mut self, user: UserId, date: NaiveDate) -> Result<ShiftId, OpError> {
        let id = self.confirmed_id(user, date)?;
        self.api.delete_shift(id).await?;
        self.reload_after(Saved::Deleted(id)).await?;
        Ok(id)
    }

    /// Replace the weekday policy. The grid's columns change accordingly.
    ///
    /// # Errors
    ///
    /// [`OpError::Api`] if the service refuses, [`OpError::Stale`] if the reload fails.
    pub async fn set_policy(&mut self, policy: WeekdayPolicy) -> Result<WeekdayPolicy, OpError> {
        let stored = self.api.set_weekday_policy(policy).await?;
        self.reload_after(Saved::Policy).await?;
        Ok(stored)
    }

    fn confirmed_id(&self, user: UserId, date: NaiveDate) -> Result<ShiftId, OpError> {
        let cell = self.cell(user, date)?;
        match (&cell.status, cell.shift_id) {
            (CellStatus::Confirmed { .. }, Some(id)) => Ok(id),
            _ => Err(OpError::NotConfirmed { user, date }),
        }
    }
}

fn checked_draft(
    user: UserId,
    date: NaiveDate,
    start: ClockTime,
    end: ClockTime,
) -> Result<ShiftDraft, OpError> {
    let draft = ShiftDraft {
        date,
        start_time: start,
        end_time: end,
        user_id: user,
    };
    if draft.minutes() <= 0 {
        return Err(OpError::EmptySpan { start, end });
    }
    Ok(draft)
}
