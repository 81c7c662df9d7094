//! See [`MemoryApi`]

use super::ShiftApi;
use crate::{
    data::{
        AvailabilityRequest, ConfirmedShift, DateField, RequestId, ShiftDraft, ShiftId, User,
        UserId, WeekdayPolicy, YearMonth, normalize_date,
    },
    error::ApiError,
    submit::NewRequest,
};
use miette::Diagnostic;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use thiserror::Error;

/// Everything [`MemoryApi`] holds, in a form that can be saved to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Registered users.
    pub users: Vec<User>,

    /// Availability requests.
    pub requests: Vec<AvailabilityRequest>,

    /// Confirmed shifts.
    pub shifts: Vec<ConfirmedShift>,

    /// Schedulable weekdays.
    pub policy: WeekdayPolicy,
}

/// A snapshot file could not be used.
#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    /// The file could not be read.
    #[error("could not read snapshot {}", path.display())]
    #[diagnostic(code(shiftboard::snapshot::read))]
    Read {
        /// The snapshot path.
        path: PathBuf,
        /// Why.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a snapshot.
    #[error("snapshot {} is not valid", path.display())]
    #[diagnostic(
        code(shiftboard::snapshot::parse),
        help("a snapshot is a JSON object with `users`, `requests`, `shifts` and `policy`"),
    )]
    Parse {
        /// The snapshot path.
        path: PathBuf,
        /// Why.
        #[source]
        source: serde_json::Error,
    },

    /// The file could not be written.
    #[error("could not write snapshot {}", path.display())]
    #[diagnostic(code(shiftboard::snapshot::write))]
    Write {
        /// The snapshot path.
        path: PathBuf,
        /// Why.
        #[source]
        source: std::io::Error,
    },
}

impl Snapshot {
    /// Read a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Read`] or [`SnapshotError::Parse`].
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let write_err = |source: std::io::Error| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        std::fs::write(path, text).map_err(write_err)
    }

    fn next_id(&self) -> u64 {
        let users = self.users.iter().map(|user| user.id.0);
        let requests = self.requests.iter().map(|request| request.id.0);
        let shifts = self.shifts.iter().map(|shift| shift.id.0);
        users.chain(requests).chain(shifts).max().map_or(1, |id| id + 1)
    }
}

/// [`ShiftApi`] that keeps its tables in memory.
///
/// Applies the same rules as the service: writes for unknown users or ids
/// are refused, and a user has at most one request and one confirmed shift
/// per date. Safe to share by reference.
#[derive(Debug, Default)]
pub struct MemoryApi {
    users: RwLock<Vec<User>>,
    requests: RwLock<Vec<AvailabilityRequest>>,
    shifts: RwLock<Vec<ConfirmedShift>>,
    policy: RwLock<WeekdayPolicy>,
    next_id: AtomicU64,
}

impl MemoryApi {
    /// Start from the contents of `snapshot`.
    pub fn new(snapshot: Snapshot) -> Self {
        let next_id = snapshot.next_id();
        let Snapshot {
            users,
            requests,
            shifts,
            policy,
        } = snapshot;
        Self {
            users: RwLock::new(users),
            requests: RwLock::new(requests),
            shifts: RwLock::new(shifts),
            policy: RwLock::new(policy),
            next_id: AtomicU64::new(next_id),
        }
    }

    /// Copy out the current contents.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.read().clone(),
            requests: self.requests.read().clone(),
            shifts: self.shifts.read().clone(),
            policy: *self.policy.read(),
        }
    }

    fn fresh_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed).max(1)
    }

    fn check_user(&self, id: UserId) -> Result<(), ApiError> {
        if self.users.read().iter().any(|user| user.id == id) {
            Ok(())
        } else {
            Err(ApiError::rejected(404, format!("user {id} not found")))
        }
    }

    /// Submit an availability request on behalf of `user`.
    ///
    /// # Errors
    ///
    /// - 404 if `user` does not exist
    /// - 400 or 422 if the request fails [validation](NewRequest::validate)
    /// - 409 if `user` already has a request for that date
    pub fn submit_request(
        &self,
        user: UserId,
        request: NewRequest,
    ) -> Result<AvailabilityRequest, ApiError> {
        self.check_user(user)?;
        let policy = *self.policy.read();
        let NewRequest {
            date,
            can_work,
            start_time,
            end_time,
            description,
        } = request
            .validate(policy)
            .map_err(|e| ApiError::rejected(e.status(), e.to_string()))?;

        let mut requests = self.requests.write();
        let key = date.to_string();
        if requests.iter().any(|r| r.user_id == user && r.date == key) {
            return Err(ApiError::rejected(
                409,
                format!("a request for {date} is already registered"),
            ));
        }
        let stored = AvailabilityRequest {
            id: RequestId(self.fresh_id()),
            user_id: user,
            date: key,
            can_work,
            start_time: start_time.map(Into::into),
            end_time: end_time.map(Into::into),
            description,
            user_display_name: None,
        };
        requests.push(stored.clone());
        Ok(stored)
    }

    fn with_display_names<T>(
        &self,
        mut records: Vec<T>,
        slot: impl Fn(&mut T) -> (UserId, &mut Option<String>),
    ) -> Vec<T> {
        let users = self.users.read();
        for record in &mut records {
            let (user_id, name) = slot(record);
            if let Some(user) = users.iter().find(|user| user.id == user_id) {
                *name = Some(user.display_name.clone());
            }
        }
        records
    }
}

impl ShiftApi for MemoryApi {
    async fn users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.read().clone())
    }

    async fn shift_requests(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<AvailabilityRequest>, ApiError> {
        let requests = self
            .requests
            .read()
            .iter()
            .filter(|request| {
                month.is_none_or(|month| {
                    normalize_date(&request.date).is_some_and(|d| month.contains(d))
                })
            })
            .cloned()
            .collect();
        Ok(self.with_display_names(requests, |r| (r.user_id, &mut r.user_display_name)))
    }

    async fn confirmed_shifts(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<ConfirmedShift>, ApiError> {
        let shifts = self
            .shifts
            .read()
            .iter()
            .filter(|shift| {
                month.is_none_or(|month| shift.date.valid().is_some_and(|d| month.contains(d)))
            })
            .cloned()
            .collect();
        Ok(self.with_display_names(shifts, |s| (s.user_id, &mut s.user_display_name)))
    }

    async fn weekday_policy(&self) -> Result<WeekdayPolicy, ApiError> {
        Ok(*self.policy.read())
    }

    /// # Errors
    ///
    /// - 404 if the user does not exist
    /// - 409 if the user already has a shift on that date
    async fn create_shift(&self, draft: &ShiftDraft) -> Result<ConfirmedShift, ApiError> {
        self.check_user(draft.user_id)?;
        let mut shifts = self.shifts.write();
        if shifts.iter().any(|shift| {
            shift.user_id == draft.user_id && shift.date == DateField::Valid(draft.date)
        }) {
            return Err(ApiError::rejected(
                409,
                format!("{} already has a shift on {}", draft.user_id, draft.date),
            ));
        }
        let shift = ConfirmedShift::from_draft(ShiftId(self.fresh_id()), *draft);
        shifts.push(shift.clone());
        Ok(shift)
    }

    /// # Errors
    ///
    /// - 404 if the shift or the user does not exist
    /// - 409 if the move would collide with another shift of the user
    async fn update_shift(
        &self,
        id: ShiftId,
        draft: &ShiftDraft,
    ) -> Result<ConfirmedShift, ApiError> {
        self.check_user(draft.user_id)?;
        let mut shifts = self.shifts.write();
        if shifts.iter().any(|shift| {
            shift.id != id
                && shift.user_id == draft.user_id
                && shift.date == DateField::Valid(draft.date)
        }) {
            return Err(ApiError::rejected(
                409,
                format!("{} already has a shift on {}", draft.user_id, draft.date),
            ));
        }
        let shift = shifts
            .iter_mut()
            .find(|shift| shift.id == id)
            .ok_or_else(|| ApiError::rejected(404, format!("shift {id} not found")))?;
        *shift = ConfirmedShift::from_draft(id, *draft);
        Ok(shift.clone())
    }

    /// # Errors
    ///
    /// 404 if the shift does not exist.
    async fn delete_shift(&self, id: ShiftId) -> Result<(), ApiError> {
        let mut shifts = self.shifts.write();
        let index = shifts
            .iter()
            .position(|shift| shift.id == id)
            .ok_or_else(|| ApiError::rejected(404, format!("shift {id} not found")))?;
        shifts.remove(index);
        Ok(())
    }

    async fn set_weekday_policy(&self, policy: WeekdayPolicy) -> Result<WeekdayPolicy, ApiError> {
        *self.policy.write() = policy;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::ClockTime, date, requests, shifts, users};

    fn api() -> MemoryApi {
        MemoryApi::new(Snapshot {
            users: users! { 1: "root" [admin], 3: "sato" as "Sato", 5: "kim" as "Kim" },
            requests: requests! {
                10: 3 @ "2024-07-01" => can("09:00" to "13:00"),
                11: 5 @ "2024-08-05" => cannot,
            },
            shifts: shifts! { 20: 3 @ "2024-07-08" "10:00" to "14:00" },
            policy: WeekdayPolicy::MONDAY,
        })
    }

    fn draft(user: u64, date: chrono::NaiveDate) -> ShiftDraft {
        ShiftDraft {
            date,
            start_time: ClockTime::from_hm(9, 0).unwrap(),
            end_time: ClockTime::from_hm(12, 0).unwrap(),
            user_id: UserId(user),
        }
    }

    #[tokio::test]
    async fn test_month_filter_and_names() {
        let api = api();
        let july = YearMonth::new(2024, 7);
        let requests = api.shift_requests(july).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_display_name.as_deref(), Some("Sato"));
        assert_eq!(api.shift_requests(None).await.unwrap().len(), 2);
        assert_eq!(api.confirmed_shifts(july).await.unwrap().len(), 1);
        assert!(api.confirmed_shifts(YearMonth::new(2024, 8)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rules() {
        let api = api();
        let created = api.create_shift(&draft(5, date!(7 / 8 / 2024))).await.unwrap();
        assert_eq!(created.id, ShiftId(21), "ids continue after the largest in the snapshot");

        let dup = api.create_shift(&draft(3, date!(7 / 8 / 2024))).await;
        assert_eq!(dup.map_err(|e| e.status()).err(), Some(Some(409)));

        let ghost = api.create_shift(&draft(99, date!(7 / 8 / 2024))).await;
        assert_eq!(ghost.map_err(|e| e.status()).err(), Some(Some(404)));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let api = api();
        let moved = api
            .update_shift(ShiftId(20), &draft(3, date!(7 / 15 / 2024)))
            .await
            .unwrap();
        assert_eq!(moved.date, DateField::Valid(date!(7 / 15 / 2024)));
        assert_eq!(moved.start_time.to_string(), "09:00");

        assert_eq!(
            api.update_shift(ShiftId(77), &draft(3, date!(7 / 1 / 2024)))
                .await
                .map_err(|e| e.status())
                .err(),
            Some(Some(404)),
        );

        api.delete_shift(ShiftId(20)).await.unwrap();
        assert!(api.snapshot().shifts.is_empty());
        assert!(
            api.delete_shift(ShiftId(20)).await.is_err(),
            "second delete has nothing to remove",
        );
    }

    #[test]
    fn test_submit_request_rules() {
        let api = api();
        let monday = date!(7 / 15 / 2024);
        let nine = ClockTime::from_hm(9, 0).unwrap();
        let noon = ClockTime::from_hm(12, 0).unwrap();

        let stored = api
            .submit_request(UserId(5), NewRequest::available(monday, nine, noon))
            .unwrap();
        assert_eq!(stored.date, "2024-07-15");
        assert_eq!(stored.start_time.map(|t| t.to_string()).as_deref(), Some("09:00"));

        let again = api.submit_request(UserId(5), NewRequest::unavailable(monday));
        assert_eq!(again.map_err(|e| e.status()).err(), Some(Some(409)));

        let tuesday = api.submit_request(UserId(5), NewRequest::unavailable(date!(7 / 16 / 2024)));
        assert_eq!(tuesday.map_err(|e| e.status()).err(), Some(Some(400)));
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("shiftboard-snapshot-{}.json", std::process::id()));
        let snapshot = api().snapshot();
        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.unwrap(), snapshot);
    }
}
