//! Reconciliation of availability requests and confirmed shifts into a
//! month-long grid of per-user, per-day statuses.
//!
//! Building a [`Grid`] is pure: the same users, requests, shifts and policy
//! (in the same order) always give the same grid, and nothing here touches
//! the network. Unreadable dates and times never stop the build; they are
//! collected as [`MalformedValue`] warnings on the grid instead.

use crate::{
    data::{
        AvailabilityRequest, ClockTime, ConfirmedShift, DateField, RequestId, ShiftDraft,
        ShiftId, TIME_PLACEHOLDER, TimeField, User, UserId, WeekdayPolicy, YearMonth,
    },
    error::MalformedValue,
};
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::{fmt, iter::Sum};

/// Length of a shift, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WorkDuration(u32);

impl WorkDuration {
    /// Minutes from `start` to `end` on the same day.
    ///
    /// [`None`] when `end` is not after `start`; such a span counts as unset.
    pub fn between(start: ClockTime, end: ClockTime) -> Option<Self> {
        u32::try_from(start.minutes_until(end))
            .ok()
            .filter(|&minutes| minutes > 0)
            .map(Self)
    }

    /// Construct from a minute count.
    #[inline]
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Whole minutes.
    #[inline]
    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Fractional hours, e.g. `4.5` for four and a half hours.
    #[inline]
    pub fn hours(self) -> f64 {
        f64::from(self.0) / 60.0
    }
}

/// `4h30m`, or `4h` when there are no leftover minutes.
impl fmt::Display for WorkDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes) = (self.0 / 60, self.0 % 60);
        if minutes > 0 {
            write!(f, "{hours}h{minutes:02}m")
        } else {
            write!(f, "{hours}h")
        }
    }
}

impl Sum for WorkDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|d| d.0).sum())
    }
}

/// Working duration of an optional pair of times. Blank unless both are valid and ordered.
pub fn working_duration(
    start: Option<&TimeField>,
    end: Option<&TimeField>,
) -> Option<WorkDuration> {
    WorkDuration::between(start?.valid()?, end?.valid()?)
}

/// What a cell of the grid shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellStatus {
    /// A confirmed shift exists. Always wins over any request.
    Confirmed {
        /// Shift start.
        start: TimeField,
        /// Shift end.
        end: TimeField,
    },

    /// The employee said they can work, optionally giving times.
    RequestedAvailable {
        /// Preferred start.
        start: Option<TimeField>,
        /// Preferred end.
        end: Option<TimeField>,
    },

    /// The employee said they cannot work.
    RequestedUnavailable,

    /// Nothing on record.
    NotSubmitted,
}

impl CellStatus {
    /// The discriminant alone.
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Confirmed { .. } => CellKind::Confirmed,
            Self::RequestedAvailable { .. } => CellKind::Available,
            Self::RequestedUnavailable => CellKind::Unavailable,
            Self::NotSubmitted => CellKind::NotSubmitted,
        }
    }

    /// Start and end, where the status carries them.
    pub fn times(&self) -> (Option<&TimeField>, Option<&TimeField>) {
        match self {
            Self::Confirmed { start, end } => (Some(start), Some(end)),
            Self::RequestedAvailable { start, end } => (start.as_ref(), end.as_ref()),
            Self::RequestedUnavailable | Self::NotSubmitted => (None, None),
        }
    }

    /// Working duration, when both times are readable and ordered.
    #[inline]
    pub fn duration(&self) -> Option<WorkDuration> {
        let (start, end) = self.times();
        working_duration(start, end)
    }
}

/// Compact text for terminal tables and CSV.
///
/// `09:00-13:00` confirmed, `ok 09:00-13:00` or `ok` available, `no`
/// unavailable, `-` nothing submitted.
impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn span(
            f: &mut fmt::Formatter<'_>,
            start: Option<&TimeField>,
            end: Option<&TimeField>,
        ) -> fmt::Result {
            match (start, end) {
                (None, None) => Ok(()),
                (start, end) => {
                    if let Some(start) = start {
                        write!(f, "{start}")?;
                    }
                    f.write_str("-")?;
                    if let Some(end) = end {
                        write!(f, "{end}")?;
                    }
                    Ok(())
                }
            }
        }

        match self {
            Self::Confirmed { start, end } => span(f, Some(start), Some(end)),
            Self::RequestedAvailable { start, end } => {
                f.write_str("ok")?;
                if start.is_some() || end.is_some() {
                    f.write_str(" ")?;
                }
                span(f, start.as_ref(), end.as_ref())
            }
            Self::RequestedUnavailable => f.write_str("no"),
            Self::NotSubmitted => f.write_str("-"),
        }
    }
}

/// Variant names of [`CellStatus`] without their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum CellKind {
    /// See [`CellStatus::Confirmed`]
    Confirmed,
    /// See [`CellStatus::RequestedAvailable`]
    Available,
    /// See [`CellStatus::RequestedUnavailable`]
    Unavailable,
    /// See [`CellStatus::NotSubmitted`]
    NotSubmitted,
}

/// One user on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column date.
    pub date: NaiveDate,

    /// What to show.
    pub status: CellStatus,

    /// The confirmed shift this cell shows, if any.
    pub shift_id: Option<ShiftId>,

    /// The matching availability request, if any, even when a shift overrides it.
    pub request_id: Option<RequestId>,

    /// Note attached to the matching request.
    pub description: Option<String>,
}

impl Cell {
    /// Shorthand for `self.status.kind()`.
    #[inline]
    pub fn kind(&self) -> CellKind {
        self.status.kind()
    }

    /// Shorthand for `self.status.duration()`.
    #[inline]
    pub fn duration(&self) -> Option<WorkDuration> {
        self.status.duration()
    }

    fn reconcile(
        date: NaiveDate,
        shift: Option<&ConfirmedShift>,
        request: Option<&AvailabilityRequest>,
        warnings: &mut Vec<MalformedValue>,
    ) -> Self {
        let mut note = |record: String, field: &'static str, value: Option<&TimeField>| {
            if let Some(raw) = value.and_then(TimeField::malformed) {
                warnings.push(MalformedValue {
                    record,
                    field,
                    raw: raw.to_string(),
                });
            }
        };

        let status = match (shift, request) {
            (Some(shift), _) => {
                note(shift.id.to_string(), "start_time", Some(&shift.start_time));
                note(shift.id.to_string(), "end_time", Some(&shift.end_time));
                CellStatus::Confirmed {
                    start: shift.start_time.clone(),
                    end: shift.end_time.clone(),
                }
            }
            (None, Some(request)) if request.can_work => {
                note(request.id.to_string(), "start_time", request.start_time.as_ref());
                note(request.id.to_string(), "end_time", request.end_time.as_ref());
                CellStatus::RequestedAvailable {
                    start: request.start_time.clone(),
                    end: request.end_time.clone(),
                }
            }
            (None, Some(_)) => CellStatus::RequestedUnavailable,
            (None, None) => CellStatus::NotSubmitted,
        };

        Self {
            date,
            status,
            shift_id: shift.map(|shift| shift.id),
            request_id: request.map(|request| request.id),
            description: request.and_then(|request| request.description.clone()),
        }
    }
}

/// One user's line of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Whose row this is.
    pub user: User,

    /// One cell per grid date, in the same order as [`Grid::dates`].
    pub cells: Vec<Cell>,
}

impl Row {
    /// The cell for `date`, if `date` is a grid column.
    pub fn cell(&self, date: NaiveDate) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&date, |cell| cell.date)
            .ok()
            .and_then(|i| self.cells.get(i))
    }

    /// Sum of the durations of this user's confirmed shifts on the grid.
    pub fn confirmed_total(&self) -> WorkDuration {
        self.cells
            .iter()
            .filter(|cell| cell.kind() == CellKind::Confirmed)
            .filter_map(Cell::duration)
            .sum()
    }
}

/// Counts shown above the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Users times dates.
    pub cells: usize,
    /// Cells showing a confirmed shift.
    pub confirmed: usize,
    /// Cells with an available request and no shift yet.
    pub pending: usize,
    /// Cells with an unavailable request and no shift.
    pub unavailable: usize,
    /// Cells with any request, confirmed or not.
    pub submitted: usize,
    /// `cells - submitted`.
    pub not_submitted: usize,
    /// Total length of all confirmed shifts.
    pub confirmed_time: WorkDuration,
}

/// A cell [`Grid::bulk_candidates`] would confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Display name of the user, for reports.
    pub display_name: String,

    /// The request being confirmed.
    pub request_id: Option<RequestId>,

    /// What would be created.
    pub draft: ShiftDraft,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ShiftDraft {
            date,
            start_time,
            end_time,
            ..
        } = &self.draft;
        write!(f, "{} {date} {start_time}-{end_time}", self.display_name)
    }
}

/// The reconciled month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    month: YearMonth,
    policy: WeekdayPolicy,
    dates: Vec<NaiveDate>,
    rows: Vec<Row>,
    warnings: Vec<MalformedValue>,
}

impl Grid {
    /// Reconcile `requests` and `shifts` for `users` over the in-scope dates of `month`.
    ///
    /// - Columns are the days of `month` whose weekday `policy` enables, ascending.
    /// - Rows follow the order of `users`; administrators are left out.
    /// - A shift matches a cell when its normalized date equals the column date.
    /// - A request matches a cell when its date string is exactly the column's
    ///   `YYYY-MM-DD` text.
    /// - When several records match one cell, the first in input order wins.
    pub fn build(
        month: YearMonth,
        policy: WeekdayPolicy,
        users: &[User],
        requests: &[AvailabilityRequest],
        shifts: &[ConfirmedShift],
    ) -> Self {
        let dates = policy.in_scope_dates(month);
        let mut warnings = Vec::new();

        let mut shift_index = FxHashMap::<(UserId, NaiveDate), &ConfirmedShift>::default();
        for shift in shifts {
            match &shift.date {
                DateField::Valid(date) => {
                    shift_index.entry((shift.user_id, *date)).or_insert(shift);
                }
                DateField::Malformed(raw) => warnings.push(MalformedValue {
                    record: shift.id.to_string(),
                    field: "date",
                    raw: raw.clone(),
                }),
            }
        }

        let mut request_index = FxHashMap::<(UserId, &str), &AvailabilityRequest>::default();
        for request in requests {
            request_index
                .entry((request.user_id, request.date.as_str()))
                .or_insert(request);
        }

        let keys = dates.iter().map(NaiveDate::to_string).collect::<Vec<_>>();
        let mut rows = Vec::new();
        for user in users.iter().filter(|user| !user.admin) {
            let mut cells = Vec::with_capacity(dates.len());
            for (&date, key) in dates.iter().zip(&keys) {
                let shift = shift_index.get(&(user.id, date)).copied();
                let request = request_index.get(&(user.id, key.as_str())).copied();
                cells.push(Cell::reconcile(date, shift, request, &mut warnings));
            }
            rows.push(Row {
                user: user.clone(),
                cells,
            });
        }

        Self {
            month,
            policy,
            dates,
            rows,
            warnings,
        }
    }

    /// The month this grid covers.
    #[inline]
    pub fn month(&self) -> YearMonth {
        self.month
    }

    /// The policy the columns were chosen with.
    #[inline]
    pub fn policy(&self) -> WeekdayPolicy {
        self.policy
    }

    /// Column dates, ascending.
    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// One row per non-admin user.
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Unreadable values met while building.
    #[inline]
    pub fn warnings(&self) -> &[MalformedValue] {
        &self.warnings
    }

    /// The row of `user`.
    pub fn row(&self, user: UserId) -> Option<&Row> {
        self.rows.iter().find(|row| row.user.id == user)
    }

    /// The cell at (`user`, `date`).
    pub fn cell(&self, user: UserId, date: NaiveDate) -> Option<&Cell> {
        self.row(user)?.cell(date)
    }

    /// Every cell with its row's user, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (&User, &Cell)> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter().map(move |cell| (&row.user, cell)))
    }

    /// Count cells by status.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            cells: self.rows.len() * self.dates.len(),
            ..Summary::default()
        };
        for (_, cell) in self.cells() {
            match cell.kind() {
                CellKind::Confirmed => summary.confirmed += 1,
                CellKind::Available => summary.pending += 1,
                CellKind::Unavailable => summary.unavailable += 1,
                CellKind::NotSubmitted => {}
            }
            if cell.request_id.is_some() {
                summary.submitted += 1;
            }
        }
        summary.not_submitted = summary.cells - summary.submitted;
        summary.confirmed_time = self.rows.iter().map(Row::confirmed_total).sum();
        summary
    }

    /// Every available, unconfirmed cell whose start and end are both readable, in grid order.
    pub fn bulk_candidates(&self) -> Vec<Candidate> {
        self.cells()
            .filter_map(|(user, cell)| match &cell.status {
                CellStatus::RequestedAvailable {
                    start: Some(start),
                    end: Some(end),
                } => Some(Candidate {
                    display_name: user.display_name.clone(),
                    request_id: cell.request_id,
                    draft: ShiftDraft {
                        date: cell.date,
                        start_time: start.valid()?,
                        end_time: end.valid()?,
                        user_id: user.id,
                    },
                }),
                _ => None,
            })
            .collect()
    }

    /// Number of cells showing [`TIME_PLACEHOLDER`].
    pub fn placeholder_count(&self) -> usize {
        self.cells()
            .filter(|(_, cell)| cell.status.to_string().contains(TIME_PLACEHOLDER))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{date, requests, shifts, users};

    fn july() -> YearMonth {
        YearMonth::new(2024, 7).unwrap()
    }

    fn hm(hour: u32, minute: u32) -> TimeField {
        ClockTime::from_hm(hour, minute).unwrap().into()
    }

    #[test]
    fn test_columns_follow_policy() {
        let policy = WeekdayPolicy::WEDNESDAY | WeekdayPolicy::FRIDAY;
        let grid = Grid::build(july(), policy, &users! { 1: "a" }, &[], &[]);
        assert_eq!(grid.dates().len(), 9, "July 2024 has 5 Wednesdays and 4 Fridays");
        assert!(grid.dates().iter().all(|&d| policy.allows_date(d)));
        assert!(grid.dates().is_sorted());
        assert_eq!(grid.rows()[0].cells.len(), grid.dates().len());
    }

    #[test]
    fn test_confirmed_shift_wins_over_request() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::all(),
            &users! { 3: "sato" },
            &requests! { 20: 3 @ "2024-07-10" => cannot },
            &shifts! { 40: 3 @ "2024-07-10" "09:00" to "13:00" },
        );
        let cell = grid.cell(crate::data::UserId(3), date!(7 / 10 / 2024)).unwrap();
        assert_eq!(
            cell.status,
            CellStatus::Confirmed {
                start: hm(9, 0),
                end: hm(13, 0),
            },
        );
        assert_eq!(cell.shift_id, Some(ShiftId(40)));
        assert_eq!(cell.request_id, Some(RequestId(20)), "the overridden request is still linked");
    }

    #[test]
    fn test_request_statuses() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::all(),
            &users! { 3: "sato", 5: "kim" },
            &requests! {
                1: 3 @ "2024-07-01" => can("2024-07-01T10:00:00" to "15:00"),
                2: 3 @ "2024-07-02" => can,
                3: 5 @ "2024-07-01" => cannot,
            },
            &[],
        );
        let grid = &grid;
        let at = move |user, day| {
            let date = NaiveDate::from_ymd_opt(2024, 7, day).unwrap();
            &grid.cell(UserId(user), date).unwrap().status
        };
        assert_eq!(
            at(3, 1),
            &CellStatus::RequestedAvailable {
                start: Some(hm(10, 0)),
                end: Some(hm(15, 0)),
            },
        );
        assert_eq!(at(3, 2), &CellStatus::RequestedAvailable { start: None, end: None });
        assert_eq!(at(5, 1), &CellStatus::RequestedUnavailable);
        assert_eq!(at(5, 2), &CellStatus::NotSubmitted);
    }

    #[test]
    fn test_date_matching_rules() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::all(),
            &users! { 3: "sato" },
            &requests! { 1: 3 @ "2024-07-03T00:00:00" => cannot },
            &shifts! { 2: 3 @ "2024-07-04T00:00:00" "09:00" to "12:00" },
        );
        assert_eq!(
            grid.cell(UserId(3), date!(7 / 3 / 2024)).unwrap().kind(),
            CellKind::NotSubmitted,
            "request dates are compared verbatim",
        );
        assert_eq!(
            grid.cell(UserId(3), date!(7 / 4 / 2024)).unwrap().kind(),
            CellKind::Confirmed,
            "shift dates are normalized before matching",
        );
    }

    #[test]
    fn test_first_duplicate_wins() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::all(),
            &users! { 3: "sato" },
            &requests! {
                1: 3 @ "2024-07-05" => cannot,
                2: 3 @ "2024-07-05" => can,
            },
            &shifts! {
                7: 3 @ "2024-07-08" "09:00" to "10:00",
                8: 3 @ "2024-07-08" "11:00" to "17:00",
            },
        );
        assert_eq!(
            grid.cell(UserId(3), date!(7 / 5 / 2024)).unwrap().request_id,
            Some(RequestId(1)),
        );
        assert_eq!(grid.cell(UserId(3), date!(7 / 8 / 2024)).unwrap().shift_id, Some(ShiftId(7)));
    }

    #[test]
    fn test_malformed_values_warn_and_show_placeholder() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::all(),
            &users! { 3: "sato" },
            &requests! { 1: 3 @ "2024-07-09" => can("morning" to "12:00") },
            &shifts! {
                2: 3 @ "2024-07-10" "09:00" to "late",
                3: 3 @ "someday" "09:00" to "10:00",
            },
        );
        assert_eq!(
            grid.cell(UserId(3), date!(7 / 10 / 2024)).unwrap().status.to_string(),
            "09:00-??:??",
        );
        assert_eq!(grid.placeholder_count(), 2);
        let fields = grid
            .warnings()
            .iter()
            .map(|w| (w.record.as_str(), w.field))
            .collect::<Vec<_>>();
        assert_eq!(fields, [("s.3", "date"), ("r.1", "start_time"), ("s.2", "end_time")]);
        assert!(
            grid.bulk_candidates().is_empty(),
            "malformed times cannot be confirmed in bulk",
        );
    }

    #[test]
    fn test_admins_have_no_row() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::WEEKDAYS,
            &users! { 1: "root" [admin], 2: "sato" },
            &[],
            &[],
        );
        assert_eq!(grid.rows().len(), 1);
        assert!(grid.row(UserId(1)).is_none());
    }

    #[test]
    fn test_durations() {
        let duration = WorkDuration::between(
            ClockTime::from_hm(9, 0).unwrap(),
            ClockTime::from_hm(13, 30).unwrap(),
        )
        .unwrap();
        assert_eq!(duration.minutes(), 270);
        assert_eq!(duration.hours(), 4.5);
        assert_eq!(duration.to_string(), "4h30m");
        assert_eq!(WorkDuration::from_minutes(240).to_string(), "4h");
        assert_eq!(working_duration(Some(&hm(13, 0)), Some(&hm(9, 0))), None);
        assert_eq!(working_duration(Some(&hm(9, 0)), Some(&hm(9, 0))), None);
        assert_eq!(working_duration(Some(&hm(9, 0)), None), None);
    }

    #[test]
    fn test_summary_and_candidates() {
        let grid = Grid::build(
            july(),
            WeekdayPolicy::MONDAY,
            &users! { 3: "sato" as "Sato", 5: "kim" as "Kim" },
            &requests! {
                1: 3 @ "2024-07-01" => can("09:00" to "13:00"),
                2: 3 @ "2024-07-08" => can("10:00" to "12:30"),
                3: 5 @ "2024-07-01" => can,
                4: 5 @ "2024-07-08" => cannot,
            },
            &shifts! { 9: 3 @ "2024-07-01" "09:00" to "13:00" },
        );
        assert_eq!(
            grid.summary(),
            Summary {
                cells: 10,
                confirmed: 1,
                pending: 2,
                unavailable: 1,
                submitted: 4,
                not_submitted: 6,
                confirmed_time: WorkDuration::from_minutes(240),
            },
        );

        let candidates = grid.bulk_candidates();
        assert_eq!(candidates.len(), 1, "confirmed and time-less cells are skipped");
        assert_eq!(candidates[0].to_string(), "Sato 2024-07-08 10:00-12:30");
        assert_eq!(candidates[0].request_id, Some(RequestId(2)));
    }

    #[test]
    fn test_build_is_deterministic() {
        let users = users! { 3: "sato", 5: "kim" };
        let requests = requests! { 1: 5 @ "2024-07-15" => can("9:00" to "17:00") };
        let shifts = shifts! { 2: 3 @ "2024-07-16" "08:00" to "12:00" };
        let a = Grid::build(july(), WeekdayPolicy::WEEKDAYS, &users, &requests, &shifts);
        let b = Grid::build(july(), WeekdayPolicy::WEEKDAYS, &users, &requests, &shifts);
        assert_eq!(a, b);
    }
}
