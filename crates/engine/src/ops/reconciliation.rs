use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseTransaction, Statement, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::{EngineError, HandoverStatus, HandoverType, MoneyCents, ResultEngine, ShiftStatus};

use super::{Actor, Engine, with_tx};

/// Derived cash-flow figures for a station over `[from, to)`.
///
/// Recomputable at any time from shifts and handovers; never a separate
/// source of truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub station_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Number of shifts ended in the window.
    pub shifts_ended: u64,
    /// Cash counted in drawers over all ended shifts.
    pub cash_collected: MoneyCents,
    /// Cash the nozzle readings said those shifts should have produced.
    pub cash_expected: MoneyCents,
    /// Net drawer variance over ended shifts.
    pub shift_variance: MoneyCents,
    /// Expected amounts over settled (confirmed or resolved) handovers.
    pub handover_expected: MoneyCents,
    /// Effective settled amounts over the same handovers.
    pub handover_actual: MoneyCents,
    /// `handover_actual - handover_expected`.
    pub handover_variance: MoneyCents,
    /// Amount that reached the bank.
    pub deposited_to_bank: MoneyCents,
    pub pending_handovers: u64,
    pub disputed_handovers: u64,
}

impl Engine {
    /// Aggregates a station's cash flow over `[from, to)`.
    pub async fn cash_flow_summary(
        &self,
        actor: &Actor,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<CashFlowSummary> {
        if from >= to {
            return Err(EngineError::Validation(
                "invalid range: from must be < to".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_station_access(&db_tx, actor, station_id)
                .await?;

            let (shifts_ended, cash_collected, cash_expected, shift_variance) = self
                .ended_shift_totals(&db_tx, station_id, from, to)
                .await?;

            let (handover_expected, handover_actual) = self
                .settled_handover_totals(&db_tx, station_id, from, to)
                .await?;

            let deposited_to_bank = self
                .sum_handovers(
                    &db_tx,
                    station_id,
                    from,
                    to,
                    "COALESCE(SUM(COALESCE(resolved_amount_minor, actual_amount_minor)), 0)",
                    Some(HandoverType::DepositToBank),
                    &[HandoverStatus::Confirmed, HandoverStatus::Resolved],
                )
                .await?;
            let pending_handovers = self
                .count_handovers(&db_tx, station_id, from, to, HandoverStatus::Pending)
                .await?;
            let disputed_handovers = self
                .count_handovers(&db_tx, station_id, from, to, HandoverStatus::Disputed)
                .await?;

            Ok(CashFlowSummary {
                station_id: station_id.to_string(),
                from,
                to,
                shifts_ended,
                cash_collected: MoneyCents::new(cash_collected),
                cash_expected: MoneyCents::new(cash_expected),
                shift_variance: MoneyCents::new(shift_variance),
                handover_expected: MoneyCents::new(handover_expected),
                handover_actual: MoneyCents::new(handover_actual),
                handover_variance: MoneyCents::new(handover_actual - handover_expected),
                deposited_to_bank: MoneyCents::new(deposited_to_bank),
                pending_handovers,
                disputed_handovers,
            })
        })
    }

    async fn ended_shift_totals(
        &self,
        db: &DatabaseTransaction,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<(u64, i64, i64, i64)> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS ended, \
                    COALESCE(SUM(actual_cash_minor), 0) AS collected, \
                    COALESCE(SUM(expected_cash_minor), 0) AS expected, \
                    COALESCE(SUM(cash_difference_minor), 0) AS variance \
             FROM shifts \
             WHERE station_id = ? AND status = ? AND start_time >= ? AND start_time < ?"
                .to_string(),
            vec![
                station_id.into(),
                ShiftStatus::Ended.as_str().into(),
                from.into(),
                to.into(),
            ],
        );
        let row = db.query_one(stmt).await?;
        let get = |name: &str| -> i64 {
            row.as_ref()
                .and_then(|r| r.try_get("", name).ok())
                .unwrap_or(0)
        };
        Ok((
            u64::try_from(get("ended")).unwrap_or(0),
            get("collected"),
            get("expected"),
            get("variance"),
        ))
    }

    async fn settled_handover_totals(
        &self,
        db: &DatabaseTransaction,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<(i64, i64)> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(expected_amount_minor), 0) AS expected, \
                    COALESCE(SUM(COALESCE(resolved_amount_minor, actual_amount_minor)), 0) \
                        AS actual \
             FROM cash_handovers \
             WHERE station_id = ? AND status IN (?, ?) \
               AND created_at >= ? AND created_at < ?"
                .to_string(),
            vec![
                station_id.into(),
                HandoverStatus::Confirmed.as_str().into(),
                HandoverStatus::Resolved.as_str().into(),
                from.into(),
                to.into(),
            ],
        );
        let row = db.query_one(stmt).await?;
        let get = |name: &str| -> i64 {
            row.as_ref()
                .and_then(|r| r.try_get("", name).ok())
                .unwrap_or(0)
        };
        Ok((get("expected"), get("actual")))
    }

    async fn sum_handovers(
        &self,
        db: &DatabaseTransaction,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        select: &str,
        handover_type: Option<HandoverType>,
        statuses: &[HandoverStatus],
    ) -> ResultEngine<i64> {
        let backend = self.database.get_database_backend();
        let mut sql = format!(
            "SELECT {select} AS sum FROM cash_handovers \
             WHERE station_id = ? AND created_at >= ? AND created_at < ?"
        );
        let mut values: Vec<sea_orm::Value> =
            vec![station_id.into(), from.into(), to.into()];
        if let Some(handover_type) = handover_type {
            sql.push_str(" AND handover_type = ?");
            values.push(handover_type.as_str().into());
        }
        if !statuses.is_empty() {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({placeholders})"));
            values.extend(statuses.iter().map(|status| status.as_str().into()));
        }
        let stmt = Statement::from_sql_and_values(backend, sql, values);
        let row = db.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }

    async fn count_handovers(
        &self,
        db: &DatabaseTransaction,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        status: HandoverStatus,
    ) -> ResultEngine<u64> {
        let count = self
            .sum_handovers(db, station_id, from, to, "COUNT(*)", None, &[status])
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
