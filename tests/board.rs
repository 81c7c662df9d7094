use shiftboard::{
    api::{MemoryApi, ShiftApi, Snapshot},
    data::{ClockTime, UserId, WeekdayPolicy, YearMonth},
    date,
    export::summary_line,
    ops::Board,
    recon::{CellKind, WorkDuration},
    shifts,
    submit::{NewRequest, open_dates},
    users,
};

fn hm(hour: u32, minute: u32) -> ClockTime {
    ClockTime::from_hm(hour, minute).unwrap()
}

fn july() -> YearMonth {
    YearMonth::new(2024, 7).unwrap()
}

/// Sato is booked on the 10th and Kim on the 19th before anyone has submitted.
fn service() -> MemoryApi {
    MemoryApi::new(Snapshot {
        users: users! { 1: "root" as "Root" [admin], 3: "sato" as "Sato", 5: "kim" as "Kim" },
        requests: Vec::new(),
        shifts: shifts! {
            40: 3 @ "2024-07-10" "09:00" to "13:00",
            41: 5 @ "2024-07-19" "13:00" to "17:00",
        },
        policy: WeekdayPolicy::WEEKDAYS,
    })
}

fn submit_week(api: &MemoryApi) {
    api.submit_request(UserId(3), NewRequest::unavailable(date!(7 / 10 / 2024)))
        .unwrap();
    api.submit_request(
        UserId(5),
        NewRequest::available(date!(7 / 12 / 2024), hm(10, 0), hm(15, 30))
            .with_description("school run"),
    )
    .unwrap();
    api.submit_request(UserId(5), NewRequest::available(date!(7 / 15 / 2024), hm(9, 0), hm(12, 0)))
        .unwrap();
}

#[tokio::test]
async fn test_submission_rules() {
    let api = service();
    submit_week(&api);

    let saturday = api
        .submit_request(UserId(5), NewRequest::unavailable(date!(7 / 13 / 2024)))
        .unwrap_err();
    assert_eq!(saturday.status(), Some(400), "weekends are outside the policy");

    let again = api
        .submit_request(UserId(5), NewRequest::unavailable(date!(7 / 12 / 2024)))
        .unwrap_err();
    assert_eq!(again.status(), Some(409), "one request per user and date");

    let requests = api.shift_requests(Some(july())).await.unwrap();
    let open = open_dates(july(), WeekdayPolicy::WEEKDAYS, &requests, UserId(5));
    assert_eq!(open.len(), 23 - 2);
    assert!(!open.contains(&date!(7 / 12 / 2024)));
    assert!(!open.contains(&date!(7 / 15 / 2024)));
    assert!(open.contains(&date!(7 / 10 / 2024)), "Sato's request does not close Kim's dates");
}

#[tokio::test]
async fn test_admin_month() {
    let api = service();
    submit_week(&api);
    let mut board = Board::load(&api, july()).await.unwrap();

    let grid = board.grid();
    assert_eq!(grid.dates().len(), 23);
    assert_eq!(grid.rows().len(), 2, "root is an administrator and has no row");
    assert!(grid.warnings().is_empty());

    let booked = grid.cell(UserId(3), date!(7 / 10 / 2024)).unwrap();
    assert_eq!(
        booked.kind(),
        CellKind::Confirmed,
        "a confirmed shift wins over a conflicting request",
    );
    assert_eq!(booked.status.to_string(), "09:00-13:00");
    assert!(booked.request_id.is_some(), "the request is still linked");

    let pending = grid.cell(UserId(5), date!(7 / 12 / 2024)).unwrap();
    assert_eq!(pending.kind(), CellKind::Available);
    assert_eq!(pending.description.as_deref(), Some("school run"));

    // bulk confirm: Kim's two available days
    let candidates = grid.bulk_candidates();
    assert_eq!(
        candidates.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["Kim 2024-07-12 10:00-15:30", "Kim 2024-07-15 09:00-12:00"],
    );
    let report = board.bulk_confirm().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.confirmed.len(), 2);
    assert!(board.grid().bulk_candidates().is_empty(), "nothing left after a clean run");

    let summary = board.grid().summary();
    assert_eq!(summary.confirmed, 4);
    assert_eq!(summary.pending, 0);
    assert_eq!(summary.confirmed_time, WorkDuration::from_minutes(16 * 60 + 30));
    assert_eq!(
        summary_line(&summary),
        "confirmed 4 · pending 0 · unavailable 0 · not submitted 43 · 16h30m confirmed",
    );

    // deleting reveals whatever request remains
    board.delete(UserId(5), date!(7 / 12 / 2024)).await.unwrap();
    assert_eq!(
        board.grid().cell(UserId(5), date!(7 / 12 / 2024)).unwrap().kind(),
        CellKind::Available,
    );
    board.delete(UserId(3), date!(7 / 10 / 2024)).await.unwrap();
    assert_eq!(
        board.grid().cell(UserId(3), date!(7 / 10 / 2024)).unwrap().kind(),
        CellKind::Unavailable,
    );
    board.delete(UserId(5), date!(7 / 19 / 2024)).await.unwrap();
    assert_eq!(
        board.grid().cell(UserId(5), date!(7 / 19 / 2024)).unwrap().kind(),
        CellKind::NotSubmitted,
        "a shift booked without a request leaves nothing behind",
    );

    let remaining = api.confirmed_shifts(Some(july())).await.unwrap();
    assert_eq!(remaining.len(), 1, "only Kim's 15th is left");
    assert_eq!(board.grid().row(UserId(5)).unwrap().confirmed_total().to_string(), "3h");
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let path = std::env::temp_dir().join(format!("shiftboard-board-{}.json", std::process::id()));
    {
        let api = service();
        submit_week(&api);
        let mut board = Board::load(&api, july()).await.unwrap();
        board
            .edit(UserId(3), date!(7 / 10 / 2024), hm(8, 0), hm(12, 0))
            .await
            .unwrap();
        api.snapshot().save(&path).unwrap();
    }

    let api = MemoryApi::new(Snapshot::load(&path).unwrap());
    std::fs::remove_file(&path).unwrap();
    let board = Board::load(&api, july()).await.unwrap();
    assert_eq!(
        board.grid().cell(UserId(3), date!(7 / 10 / 2024)).unwrap().status.to_string(),
        "08:00-12:00",
        "edits are kept in the snapshot",
    );
    assert_eq!(board.grid().bulk_candidates().len(), 2);
}
