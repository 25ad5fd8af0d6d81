use chrono::{DateTime, Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Actor, CancelShiftCmd, EndShiftCmd, Engine, EngineError, MoneyCents, Role, ShiftListFilter,
    ShiftStatus, ShiftType, StartShiftCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    seed_user(&db, "own1", "owner", None).await;
    seed_user(&db, "mgr1", "manager", Some("st1")).await;
    seed_user(&db, "emp1", "employee", Some("st1")).await;
    seed_user(&db, "emp2", "employee", Some("st1")).await;
    seed_user(&db, "emp3", "employee", Some("st2")).await;
    seed_station(&db, "st1", "North Road", "own1").await;
    seed_station(&db, "st2", "South Road", "own1").await;

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn seed_user(db: &DatabaseConnection, username: &str, role: &str, station: Option<&str>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, role, station_id) VALUES (?, ?, ?, ?)",
        vec![username.into(), "password".into(), role.into(), station.into()],
    ))
    .await
    .unwrap();
}

async fn seed_station(db: &DatabaseConnection, id: &str, name: &str, owner: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO stations (id, name, owner_id) VALUES (?, ?, ?)",
        vec![id.into(), name.into(), owner.into()],
    ))
    .await
    .unwrap();
}

async fn seed_reading(
    db: &DatabaseConnection,
    station: &str,
    recorded_at: DateTime<Utc>,
    cash: i64,
    online: i64,
    credit: i64,
) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO nozzle_readings (id, station_id, recorded_at, cash_minor, online_minor, \
         credit_minor) VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            Uuid::new_v4().to_string().into(),
            station.into(),
            recorded_at.into(),
            cash.into(),
            online.into(),
            credit.into(),
        ],
    ))
    .await
    .unwrap();
}

fn employee() -> Actor {
    Actor::new("emp1", Role::Employee).station_id("st1")
}

fn manager() -> Actor {
    Actor::new("mgr1", Role::Manager).station_id("st1")
}

#[tokio::test]
async fn start_shift_creates_active_shift() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();

    assert_eq!(shift.status, ShiftStatus::Active);
    assert_eq!(shift.shift_type, ShiftType::Custom);
    assert_eq!(shift.employee_id, "emp1");
    assert_eq!(shift.station_id, "st1");
    assert!(shift.end_time.is_none());
    assert!(shift.expected_cash.is_none());
}

#[tokio::test]
async fn second_active_shift_for_same_employee_conflicts() {
    let (engine, _db) = engine_with_db().await;

    engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let err = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn manager_starts_shift_on_behalf_of_employee() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(
            &manager(),
            StartShiftCmd::new("st1")
                .employee_id("emp1")
                .shift_type(ShiftType::Morning)
                .opening_cash(MoneyCents::new(10_000)),
        )
        .await
        .unwrap();

    assert_eq!(shift.employee_id, "emp1");
    assert_eq!(shift.shift_type, ShiftType::Morning);
    assert_eq!(shift.opening_cash, Some(MoneyCents::new(10_000)));
}

#[tokio::test]
async fn employee_cannot_start_shift_for_someone_else() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .start_shift(&employee(), StartShiftCmd::new("st1").employee_id("emp2"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}

#[tokio::test]
async fn manager_cannot_assign_shift_to_employee_of_other_station() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .start_shift(&manager(), StartShiftCmd::new("st1").employee_id("emp3"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn start_shift_on_unknown_station_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .start_shift(&employee(), StartShiftCmd::new("nowhere"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn end_shift_reconciles_against_readings() {
    let (engine, db) = engine_with_db().await;
    let start = Utc::now();

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1").start_time(start))
        .await
        .unwrap();
    seed_reading(&db, "st1", start + Duration::minutes(10), 3_000_00, 500_00, 0).await;
    seed_reading(&db, "st1", start + Duration::minutes(20), 2_000_00, 0, 100_00).await;
    // Outside the window and on another station: ignored.
    seed_reading(&db, "st1", start - Duration::hours(1), 9_999_00, 0, 0).await;
    seed_reading(&db, "st2", start + Duration::minutes(15), 7_777_00, 0, 0).await;

    let ended = engine
        .end_shift(
            &employee(),
            EndShiftCmd::new(shift.id, MoneyCents::new(4_800_00))
                .actual_online(MoneyCents::new(500_00))
                .end_time(start + Duration::hours(8)),
        )
        .await
        .unwrap();

    assert_eq!(ended.status, ShiftStatus::Ended);
    assert_eq!(ended.expected_cash, Some(MoneyCents::new(5_000_00)));
    assert_eq!(ended.actual_cash, Some(MoneyCents::new(4_800_00)));
    assert_eq!(ended.cash_difference, Some(MoneyCents::new(-200_00)));
    assert!(ended.end_time.is_some());
}

#[tokio::test]
async fn end_shift_twice_fails_with_invalid_state() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    engine
        .end_shift(&employee(), EndShiftCmd::new(shift.id, MoneyCents::ZERO))
        .await
        .unwrap();
    let err = engine
        .end_shift(&employee(), EndShiftCmd::new(shift.id, MoneyCents::ZERO))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn other_employee_cannot_end_a_colleagues_shift() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let intruder = Actor::new("emp2", Role::Employee).station_id("st1");
    let err = engine
        .end_shift(&intruder, EndShiftCmd::new(shift.id, MoneyCents::ZERO))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}

#[tokio::test]
async fn manager_may_end_an_employees_shift() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let ended = engine
        .end_shift(&manager(), EndShiftCmd::new(shift.id, MoneyCents::ZERO))
        .await
        .unwrap();

    assert_eq!(ended.status, ShiftStatus::Ended);
}

#[tokio::test]
async fn end_time_before_start_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let start = Utc::now();

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1").start_time(start))
        .await
        .unwrap();
    let err = engine
        .end_shift(
            &employee(),
            EndShiftCmd::new(shift.id, MoneyCents::ZERO).end_time(start - Duration::minutes(5)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn end_unknown_shift_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .end_shift(&employee(), EndShiftCmd::new(Uuid::new_v4(), MoneyCents::ZERO))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn cancel_requires_manager_rank() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let err = engine
        .cancel_shift(&employee(), CancelShiftCmd::new(shift.id, "opened twice"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}

#[tokio::test]
async fn cancel_requires_a_reason() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let err = engine
        .cancel_shift(&manager(), CancelShiftCmd::new(shift.id, "   "))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn cancel_sets_no_cash_figures() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let cancelled = engine
        .cancel_shift(&manager(), CancelShiftCmd::new(shift.id, "opened by mistake"))
        .await
        .unwrap();

    assert_eq!(cancelled.status, ShiftStatus::Cancelled);
    assert!(cancelled.end_time.is_some());
    assert!(cancelled.expected_cash.is_none());
    assert!(cancelled.actual_cash.is_none());
    assert!(cancelled.cash_difference.is_none());
    assert_eq!(cancelled.notes.as_deref(), Some("opened by mistake"));
}

#[tokio::test]
async fn cancel_after_end_fails_with_invalid_state() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    engine
        .end_shift(&employee(), EndShiftCmd::new(shift.id, MoneyCents::ZERO))
        .await
        .unwrap();
    let err = engine
        .cancel_shift(&manager(), CancelShiftCmd::new(shift.id, "late void"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn duplicate_active_shift_rows_are_rejected_by_the_schema() {
    let (engine, db) = engine_with_db().await;

    engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();

    // A writer that slips past the in-transaction check hits the partial
    // unique index.
    let backend = db.get_database_backend();
    let result = db
        .execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO shifts (id, station_id, employee_id, shift_date, start_time, \
             shift_type, status) VALUES (?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::new_v4().to_string().into(),
                "st1".into(),
                "emp1".into(),
                Utc::now().date_naive().into(),
                Utc::now().into(),
                "custom".into(),
                "active".into(),
            ],
        ))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn active_shift_returns_own_shift_or_none() {
    let (engine, _db) = engine_with_db().await;

    assert!(engine.active_shift(&employee(), None).await.unwrap().is_none());

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let active = engine.active_shift(&employee(), None).await.unwrap().unwrap();
    assert_eq!(active.id, shift.id);

    engine
        .end_shift(&employee(), EndShiftCmd::new(shift.id, MoneyCents::ZERO))
        .await
        .unwrap();
    assert!(engine.active_shift(&employee(), None).await.unwrap().is_none());
}

#[tokio::test]
async fn employee_cannot_query_another_employees_active_shift() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .active_shift(&employee(), Some("emp2"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}

#[tokio::test]
async fn manager_queries_employees_active_shift() {
    let (engine, _db) = engine_with_db().await;

    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    let active = engine
        .active_shift(&manager(), Some("emp1"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(active.id, shift.id);
}

#[tokio::test]
async fn station_listing_filters_by_status() {
    let (engine, _db) = engine_with_db().await;

    let first = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();
    engine
        .end_shift(&employee(), EndShiftCmd::new(first.id, MoneyCents::ZERO))
        .await
        .unwrap();
    let second = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();

    let all = engine
        .shifts_for_station(&manager(), "st1", &ShiftListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let active_only = engine
        .shifts_for_station(
            &manager(),
            "st1",
            &ShiftListFilter {
                status: Some(ShiftStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(active_only.len(), 1);
    assert_eq!(active_only[0].id, second.id);
}

#[tokio::test]
async fn listing_requires_station_access() {
    let (engine, _db) = engine_with_db().await;

    let outsider = Actor::new("emp3", Role::Employee).station_id("st2");
    let err = engine
        .shifts_for_station(&outsider, "st1", &ShiftListFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}
