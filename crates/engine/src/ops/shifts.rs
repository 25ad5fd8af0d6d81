use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, Statement, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CancelShiftCmd, EndShiftCmd, EngineError, MoneyCents, ReadingAggregate, ResultEngine, Role,
    Shift, ShiftStatus, ShiftType, StartShiftCmd, shifts, variance,
};

use super::{Actor, Engine, normalize_optional_text, require_transition, unique_violation, with_tx};

/// Filters for listing a station's shifts.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC,
/// applied to the shift's start time.
#[derive(Clone, Debug, Default)]
pub struct ShiftListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, only shifts in this status are returned.
    pub status: Option<ShiftStatus>,
}

fn validate_list_filter(filter: &ShiftListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Opens a new active shift.
    ///
    /// An employee opens their own shift; a manager or above may open one on
    /// behalf of an employee of the station. At most one active shift per
    /// (employee, station) pair.
    pub async fn start_shift(&self, actor: &Actor, cmd: StartShiftCmd) -> ResultEngine<Shift> {
        with_tx!(self, |db_tx| {
            self.require_station_access(&db_tx, actor, &cmd.station_id)
                .await?;

            let employee_id = match cmd.employee_id {
                Some(employee_id) if employee_id != actor.username => {
                    actor.require_min_role(Role::Manager)?;
                    let employee = self.require_user_exists(&db_tx, &employee_id).await?;
                    if employee.station_id.as_deref() != Some(cmd.station_id.as_str()) {
                        return Err(EngineError::Validation(format!(
                            "user {employee_id} is not assigned to station {}",
                            cmd.station_id
                        )));
                    }
                    employee_id
                }
                _ => actor.username.clone(),
            };

            let already_active = shifts::Entity::find()
                .filter(shifts::Column::StationId.eq(cmd.station_id.clone()))
                .filter(shifts::Column::EmployeeId.eq(employee_id.clone()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Active.as_str()))
                .one(&db_tx)
                .await?;
            if already_active.is_some() {
                return Err(EngineError::Conflict(format!(
                    "employee {employee_id} already has an active shift at station {}",
                    cmd.station_id
                )));
            }

            let start_time = cmd.start_time.unwrap_or_else(Utc::now);
            let shift = Shift::new(
                cmd.station_id,
                employee_id,
                cmd.shift_date.unwrap_or_else(|| start_time.date_naive()),
                start_time,
                cmd.shift_type.unwrap_or(ShiftType::Custom),
                cmd.opening_cash,
            );
            // The partial unique index on active shifts backs this up against
            // a racing inserter.
            shifts::ActiveModel::from(&shift)
                .insert(&db_tx)
                .await
                .map_err(|err| {
                    unique_violation(
                        err,
                        &format!(
                            "employee {} already has an active shift at station {}",
                            shift.employee_id, shift.station_id
                        ),
                    )
                })?;
            Ok(shift)
        })
    }

    /// Closes an active shift and reconciles its drawer.
    ///
    /// Expected cash is the cash component of the nozzle-reading aggregate
    /// over the shift window; the difference is `actual - expected`. The
    /// transition is guarded on the current status, so two racing closers
    /// cannot both win.
    pub async fn end_shift(&self, actor: &Actor, cmd: EndShiftCmd) -> ResultEngine<Shift> {
        with_tx!(self, |db_tx| {
            let shift = self.require_shift(&db_tx, cmd.shift_id).await?;
            self.require_shift_write(&db_tx, actor, &shift).await?;
            if shift.status != ShiftStatus::Active {
                return Err(EngineError::InvalidState(format!(
                    "shift is {}, not active",
                    shift.status.as_str()
                )));
            }

            let end_time = cmd.end_time.unwrap_or_else(Utc::now);
            if end_time < shift.start_time {
                return Err(EngineError::Validation(
                    "end time must not precede start time".to_string(),
                ));
            }

            let aggregate = self
                .reading_aggregate(&db_tx, &shift.station_id, shift.start_time, end_time)
                .await?;
            let expected_cash = aggregate.cash;
            let cash_difference = variance(expected_cash, cmd.actual_cash);

            let result = shifts::Entity::update_many()
                .col_expr(
                    shifts::Column::Status,
                    Expr::value(ShiftStatus::Ended.as_str()),
                )
                .col_expr(shifts::Column::EndTime, Expr::value(end_time))
                .col_expr(
                    shifts::Column::ExpectedCashMinor,
                    Expr::value(expected_cash.minor()),
                )
                .col_expr(
                    shifts::Column::ActualCashMinor,
                    Expr::value(cmd.actual_cash.minor()),
                )
                .col_expr(
                    shifts::Column::ActualOnlineMinor,
                    Expr::value(cmd.actual_online.map(MoneyCents::minor)),
                )
                .col_expr(
                    shifts::Column::CashDifferenceMinor,
                    Expr::value(cash_difference.minor()),
                )
                .col_expr(
                    shifts::Column::Notes,
                    Expr::value(normalize_optional_text(cmd.notes.as_deref())),
                )
                .filter(shifts::Column::Id.eq(shift.id.to_string()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Active.as_str()))
                .exec(&db_tx)
                .await?;
            require_transition(result, "shift was closed concurrently")?;

            self.require_shift(&db_tx, shift.id).await
        })
    }

    /// Voids a shift opened in error. Manager and above; a reason is
    /// required, no cash figures are computed, and cancelled shifts never
    /// feed handovers.
    pub async fn cancel_shift(&self, actor: &Actor, cmd: CancelShiftCmd) -> ResultEngine<Shift> {
        let reason = cmd.reason.trim().to_string();
        if reason.is_empty() {
            return Err(EngineError::Validation(
                "cancellation reason must not be empty".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let shift = self.require_shift(&db_tx, cmd.shift_id).await?;
            actor.require_min_role(Role::Manager)?;
            if !self
                .can_act_for_station(&db_tx, actor, &shift.station_id)
                .await?
            {
                return Err(EngineError::Permission(format!(
                    "no access to station {}",
                    shift.station_id
                )));
            }
            if shift.status != ShiftStatus::Active {
                return Err(EngineError::InvalidState(format!(
                    "shift is {}, not active",
                    shift.status.as_str()
                )));
            }

            let result = shifts::Entity::update_many()
                .col_expr(
                    shifts::Column::Status,
                    Expr::value(ShiftStatus::Cancelled.as_str()),
                )
                .col_expr(shifts::Column::EndTime, Expr::value(Utc::now()))
                .col_expr(shifts::Column::Notes, Expr::value(reason.clone()))
                .filter(shifts::Column::Id.eq(shift.id.to_string()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Active.as_str()))
                .exec(&db_tx)
                .await?;
            require_transition(result, "shift was closed concurrently")?;

            self.require_shift(&db_tx, shift.id).await
        })
    }

    /// Returns the caller's active shift, if any. A manager or above may ask
    /// for a named employee's active shift instead.
    pub async fn active_shift(
        &self,
        actor: &Actor,
        employee_id: Option<&str>,
    ) -> ResultEngine<Option<Shift>> {
        with_tx!(self, |db_tx| {
            let target = match employee_id {
                Some(employee_id) if employee_id != actor.username => {
                    actor.require_min_role(Role::Manager)?;
                    employee_id
                }
                _ => actor.username.as_str(),
            };
            let row = shifts::Entity::find()
                .filter(shifts::Column::EmployeeId.eq(target.to_string()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Active.as_str()))
                .one(&db_tx)
                .await?;
            let Some(model) = row else {
                return Ok(None);
            };
            let shift = Shift::try_from(model)?;
            if target != actor.username
                && !self
                    .can_act_for_station(&db_tx, actor, &shift.station_id)
                    .await?
            {
                return Err(EngineError::Permission(format!(
                    "no access to station {}",
                    shift.station_id
                )));
            }
            Ok(Some(shift))
        })
    }

    /// Lists a station's shifts, newest first.
    pub async fn shifts_for_station(
        &self,
        actor: &Actor,
        station_id: &str,
        filter: &ShiftListFilter,
    ) -> ResultEngine<Vec<Shift>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            self.require_station_access(&db_tx, actor, station_id)
                .await?;

            let mut query = shifts::Entity::find()
                .filter(shifts::Column::StationId.eq(station_id.to_string()));
            if let Some(from) = filter.from {
                query = query.filter(shifts::Column::StartTime.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(shifts::Column::StartTime.lt(to));
            }
            if let Some(status) = filter.status {
                query = query.filter(shifts::Column::Status.eq(status.as_str()));
            }

            let rows = query
                .order_by_desc(shifts::Column::StartTime)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Shift::try_from).collect()
        })
    }

    pub(super) async fn require_shift(
        &self,
        db: &DatabaseTransaction,
        shift_id: Uuid,
    ) -> ResultEngine<Shift> {
        let model = shifts::Entity::find_by_id(shift_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("shift not exists".to_string()))?;
        Shift::try_from(model)
    }

    /// The shift's own employee may write to it; anyone else needs manager
    /// rank or above plus access to the shift's station.
    async fn require_shift_write(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        shift: &Shift,
    ) -> ResultEngine<()> {
        if actor.username == shift.employee_id {
            return Ok(());
        }
        actor.require_min_role(Role::Manager)?;
        if !self
            .can_act_for_station(db, actor, &shift.station_id)
            .await?
        {
            return Err(EngineError::Permission(format!(
                "no access to station {}",
                shift.station_id
            )));
        }
        Ok(())
    }

    /// Sums nozzle readings for a station over `[from, to]`, split by payment
    /// mode.
    pub(super) async fn reading_aggregate(
        &self,
        db: &DatabaseTransaction,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<ReadingAggregate> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(cash_minor), 0) AS cash, \
                    COALESCE(SUM(online_minor), 0) AS online, \
                    COALESCE(SUM(credit_minor), 0) AS credit \
             FROM nozzle_readings \
             WHERE station_id = ? AND recorded_at >= ? AND recorded_at <= ?"
                .to_string(),
            vec![station_id.into(), from.into(), to.into()],
        );
        let row = db.query_one(stmt).await?;
        let sum = |name: &str| -> i64 {
            row.as_ref()
                .and_then(|r| r.try_get("", name).ok())
                .unwrap_or(0)
        };
        Ok(ReadingAggregate {
            cash: MoneyCents::new(sum("cash")),
            online: MoneyCents::new(sum("online")),
            credit: MoneyCents::new(sum("credit")),
        })
    }
}
