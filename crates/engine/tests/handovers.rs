use chrono::{DateTime, Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Actor, BankDepositCmd, CashHandover, ConfirmHandoverCmd, CreateHandoverCmd, EndShiftCmd,
    Engine, EngineError, HandoverStatus, HandoverType, MoneyCents, ResolveDisputeCmd, Role, Shift,
    StartShiftCmd, TolerancePolicy,
};
use migration::MigratorTrait;

async fn engine_with_db(tolerance: TolerancePolicy) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    seed_user(&db, "own1", "owner", None).await;
    seed_user(&db, "own2", "owner", None).await;
    seed_user(&db, "mgr1", "manager", Some("st1")).await;
    seed_user(&db, "emp1", "employee", Some("st1")).await;
    seed_station(&db, "st1", "North Road", "own1").await;
    seed_station(&db, "st2", "South Road", "own2").await;

    let engine = Engine::builder()
        .database(db.clone())
        .tolerance(tolerance)
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

async fn seed_reading(db: &DatabaseConnection, station: &str, recorded_at: DateTime<Utc>, cash: i64) {
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
            0_i64.into(),
            0_i64.into(),
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

fn owner() -> Actor {
    Actor::new("own1", Role::Owner)
}

/// Starts and ends a shift for emp1 at st1 with the given reading and drawer
/// amounts.
async fn ended_shift(
    engine: &Engine,
    db: &DatabaseConnection,
    readings_cash: i64,
    actual_cash: i64,
) -> Shift {
    let start = Utc::now();
    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1").start_time(start))
        .await
        .unwrap();
    seed_reading(db, "st1", start + Duration::minutes(5), readings_cash).await;
    engine
        .end_shift(
            &employee(),
            EndShiftCmd::new(shift.id, MoneyCents::new(actual_cash))
                .end_time(start + Duration::hours(8)),
        )
        .await
        .unwrap()
}

/// A confirmed shift-collection leg for the given shift, counted by mgr1.
async fn confirmed_collection(engine: &Engine, shift: &Shift, counted: i64) -> CashHandover {
    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(counted)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn collection_roots_on_ended_shifts_counted_cash() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 4_800_00).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();

    assert_eq!(collection.status, HandoverStatus::Pending);
    assert_eq!(collection.expected_amount, MoneyCents::new(4_800_00));
    assert_eq!(collection.shift_id, Some(shift.id));
    assert_eq!(collection.from_user_id.as_deref(), Some("emp1"));
    assert!(collection.previous_handover_id.is_none());
}

#[tokio::test]
async fn second_collection_for_same_shift_conflicts() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 5_000_00).await;

    engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    let err = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_collection_root_rows_are_rejected_by_the_schema() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 5_000_00).await;

    engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();

    // A writer that slips past the in-transaction check hits the partial
    // unique index.
    let backend = db.get_database_backend();
    let result = db
        .execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO cash_handovers (id, station_id, shift_id, handover_type, \
             handover_date, status, expected_amount_minor, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::new_v4().to_string().into(),
                "st1".into(),
                shift.id.to_string().into(),
                "shift_collection".into(),
                Utc::now().date_naive().into(),
                "pending".into(),
                5_000_00_i64.into(),
                Utc::now().into(),
            ],
        ))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn collection_on_active_shift_fails_with_invalid_state() {
    let (engine, _db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = engine
        .start_shift(&employee(), StartShiftCmd::new("st1"))
        .await
        .unwrap();

    let err = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn employee_cannot_create_a_collection() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 0, 0).await;

    let err = engine
        .create_handover(
            &employee(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}

#[tokio::test]
async fn confirmation_within_tolerance_confirms() {
    let (engine, db) = engine_with_db(TolerancePolicy::Absolute(MoneyCents::new(50))).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 4_800_00).await;
    assert_eq!(shift.cash_difference, Some(MoneyCents::new(-200_00)));

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    let confirmed = engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(4_799_60)),
        )
        .await
        .unwrap();

    assert_eq!(confirmed.status, HandoverStatus::Confirmed);
    assert_eq!(confirmed.difference, Some(MoneyCents::new(-40)));
    assert_eq!(confirmed.confirmed_by.as_deref(), Some("mgr1"));
    assert!(confirmed.confirmed_at.is_some());
    assert_eq!(confirmed.to_user_id.as_deref(), Some("mgr1"));
}

#[tokio::test]
async fn variance_beyond_tolerance_disputes() {
    let (engine, db) = engine_with_db(TolerancePolicy::Absolute(MoneyCents::new(50))).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 4_800_00).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    let disputed = engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(4_700_00))
                .notes("drawer short"),
        )
        .await
        .unwrap();

    assert_eq!(disputed.status, HandoverStatus::Disputed);
    assert_eq!(disputed.actual_amount, Some(MoneyCents::new(4_700_00)));
    assert_eq!(disputed.difference, Some(MoneyCents::new(-100_00)));
    assert_eq!(disputed.dispute_notes.as_deref(), Some("drawer short"));
    assert!(disputed.confirmed_at.is_none());
}

#[tokio::test]
async fn confirmation_happens_exactly_once() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 5_000_00).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(5_000_00)),
        )
        .await
        .unwrap();
    let err = engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(4_000_00)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn designated_recipient_is_enforced() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 0, 0).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection)
                .shift_id(shift.id)
                .to_user_id("own1"),
        )
        .await
        .unwrap();
    let err = engine
        .confirm_handover(&employee(), ConfirmHandoverCmd::new(collection.id, MoneyCents::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Permission(_)));

    // The designated recipient may confirm.
    engine
        .confirm_handover(&owner(), ConfirmHandoverCmd::new(collection.id, MoneyCents::ZERO))
        .await
        .unwrap();
}

#[tokio::test]
async fn owner_override_keeps_the_designated_recipient() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 0, 0).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection)
                .shift_id(shift.id)
                .to_user_id("mgr1"),
        )
        .await
        .unwrap();
    let confirmed = engine
        .confirm_handover(&owner(), ConfirmHandoverCmd::new(collection.id, MoneyCents::ZERO))
        .await
        .unwrap();

    assert_eq!(confirmed.status, HandoverStatus::Confirmed);
    assert_eq!(confirmed.to_user_id.as_deref(), Some("mgr1"));
    assert_eq!(confirmed.confirmed_by.as_deref(), Some("own1"));
}

#[tokio::test]
async fn owner_bound_handover_requires_a_manager_sender() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 5_000_00).await;
    let collection = confirmed_collection(&engine, &shift, 5_000_00).await;

    let err = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ManagerToOwner)
                .previous_handover_id(collection.id)
                .from_user_id("emp1"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::BusinessRule(_)));
}

#[tokio::test]
async fn disputed_predecessor_blocks_the_next_leg() {
    let (engine, db) = engine_with_db(TolerancePolicy::Absolute(MoneyCents::new(50))).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 4_800_00).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(4_700_00)),
        )
        .await
        .unwrap();

    let err = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ManagerToOwner)
                .previous_handover_id(collection.id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn pending_predecessor_blocks_the_next_leg() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 0, 0).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    let err = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ManagerToOwner)
                .previous_handover_id(collection.id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn resolution_overrides_the_amount_successors_carry() {
    let (engine, db) = engine_with_db(TolerancePolicy::Absolute(MoneyCents::new(50))).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 4_800_00).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();
    let disputed = engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(4_700_00)),
        )
        .await
        .unwrap();
    assert_eq!(disputed.status, HandoverStatus::Disputed);

    // Only owner and above may resolve.
    let err = engine
        .resolve_dispute(
            &manager(),
            ResolveDisputeCmd::new(collection.id, "counted again"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Permission(_)));

    let resolved = engine
        .resolve_dispute(
            &owner(),
            ResolveDisputeCmd::new(collection.id, "recount found 4750")
                .resolved_amount(MoneyCents::new(4_750_00)),
        )
        .await
        .unwrap();
    assert_eq!(resolved.status, HandoverStatus::Resolved);
    assert_eq!(resolved.resolved_amount, Some(MoneyCents::new(4_750_00)));
    assert_eq!(resolved.effective_amount(), Some(MoneyCents::new(4_750_00)));
    // The resolving owner is on record as the settling authority.
    assert_eq!(resolved.confirmed_by.as_deref(), Some("own1"));
    assert!(resolved.confirmed_at.is_some());

    let next = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ManagerToOwner)
                .previous_handover_id(collection.id),
        )
        .await
        .unwrap();
    assert_eq!(next.expected_amount, MoneyCents::new(4_750_00));
}

#[tokio::test]
async fn resolving_a_confirmed_handover_fails_with_invalid_state() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 0, 0).await;
    let collection = confirmed_collection(&engine, &shift, 0).await;

    let err = engine
        .resolve_dispute(&owner(), ResolveDisputeCmd::new(collection.id, "nothing to fix"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn pending_listing_is_scoped_by_role() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 5_000_00).await;

    let collection = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ShiftCollection).shift_id(shift.id),
        )
        .await
        .unwrap();

    // The manager sees the station's pending collection; the employee does
    // not, because it is not addressed to them.
    let seen = engine.pending_handovers(&manager()).await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, collection.id);
    assert!(engine.pending_handovers(&employee()).await.unwrap().is_empty());

    // Owner-bound leg shows up for the station's owner only.
    engine
        .confirm_handover(
            &manager(),
            ConfirmHandoverCmd::new(collection.id, MoneyCents::new(5_000_00)),
        )
        .await
        .unwrap();
    let to_owner = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ManagerToOwner)
                .previous_handover_id(collection.id),
        )
        .await
        .unwrap();

    let owner_sees = engine.pending_handovers(&owner()).await.unwrap();
    assert_eq!(owner_sees.len(), 1);
    assert_eq!(owner_sees[0].id, to_owner.id);

    let other_owner = Actor::new("own2", Role::Owner);
    assert!(engine.pending_handovers(&other_owner).await.unwrap().is_empty());

    let admin = Actor::new("root", Role::SuperAdmin);
    assert_eq!(engine.pending_handovers(&admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn bank_deposit_is_created_confirmed_and_closes_the_chain() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let shift = ended_shift(&engine, &db, 5_000_00, 5_000_00).await;
    let collection = confirmed_collection(&engine, &shift, 5_000_00).await;

    let to_owner = engine
        .create_handover(
            &manager(),
            CreateHandoverCmd::new(HandoverType::ManagerToOwner)
                .previous_handover_id(collection.id),
        )
        .await
        .unwrap();
    engine
        .confirm_handover(
            &owner(),
            ConfirmHandoverCmd::new(to_owner.id, MoneyCents::new(5_000_00)),
        )
        .await
        .unwrap();

    let deposit = engine
        .record_bank_deposit(
            &owner(),
            BankDepositCmd::new("st1", MoneyCents::new(5_000_00))
                .previous_handover_id(to_owner.id)
                .bank_name("First National")
                .deposit_reference("slip-0042"),
        )
        .await
        .unwrap();

    assert_eq!(deposit.status, HandoverStatus::Confirmed);
    assert_eq!(deposit.handover_type, HandoverType::DepositToBank);
    assert_eq!(deposit.expected_amount, MoneyCents::new(5_000_00));
    assert_eq!(deposit.difference, Some(MoneyCents::ZERO));
    assert_eq!(deposit.confirmed_by.as_deref(), Some("own1"));
    assert_eq!(deposit.bank_name.as_deref(), Some("First National"));

    let chain = engine.handover_chain(&owner(), deposit.id).await.unwrap();
    let ids: Vec<_> = chain.iter().map(|handover| handover.id).collect();
    assert_eq!(ids, vec![collection.id, to_owner.id, deposit.id]);
}

#[tokio::test]
async fn manager_cannot_record_a_bank_deposit() {
    let (engine, _db) = engine_with_db(TolerancePolicy::default()).await;

    let err = engine
        .record_bank_deposit(&manager(), BankDepositCmd::new("st1", MoneyCents::new(100)))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Permission(_)));
}

#[tokio::test]
async fn cash_flow_summary_recomputes_the_window() {
    let (engine, db) = engine_with_db(TolerancePolicy::default()).await;
    let before = Utc::now() - Duration::minutes(1);

    let shift = ended_shift(&engine, &db, 5_000_00, 4_999_50).await;
    let collection = confirmed_collection(&engine, &shift, 4_999_50).await;
    engine
        .record_bank_deposit(
            &owner(),
            BankDepositCmd::new("st1", MoneyCents::new(4_999_50))
                .previous_handover_id(collection.id),
        )
        .await
        .unwrap();

    let after = Utc::now() + Duration::minutes(1);
    let summary = engine
        .cash_flow_summary(&owner(), "st1", before, after)
        .await
        .unwrap();

    assert_eq!(summary.shifts_ended, 1);
    assert_eq!(summary.cash_collected, MoneyCents::new(4_999_50));
    assert_eq!(summary.cash_expected, MoneyCents::new(5_000_00));
    assert_eq!(summary.shift_variance, MoneyCents::new(-50));
    // Collection plus deposit are both settled.
    assert_eq!(summary.handover_expected, MoneyCents::new(9_999_00));
    assert_eq!(summary.handover_actual, MoneyCents::new(9_999_00));
    assert_eq!(summary.handover_variance, MoneyCents::ZERO);
    assert_eq!(summary.deposited_to_bank, MoneyCents::new(4_999_50));
    assert_eq!(summary.pending_handovers, 0);
    assert_eq!(summary.disputed_handovers, 0);

    // An empty window yields zeroes.
    let empty = engine
        .cash_flow_summary(&owner(), "st1", before - Duration::hours(2), before)
        .await
        .unwrap();
    assert_eq!(empty.shifts_ended, 0);
    assert_eq!(empty.cash_collected, MoneyCents::ZERO);
}
