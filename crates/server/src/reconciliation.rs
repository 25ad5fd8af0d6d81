//! Reconciliation summary endpoint

use api_types::summary::{CashFlowSummary, SummaryQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState, user};

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CashFlowSummary>, ServerError> {
    let actor = user::actor_for(&user)?;
    let summary = state
        .engine
        .cash_flow_summary(&actor, &query.station_id, query.from, query.to)
        .await?;

    Ok(Json(CashFlowSummary {
        station_id: summary.station_id,
        from: summary.from,
        to: summary.to,
        shifts_ended: summary.shifts_ended,
        cash_collected_minor: summary.cash_collected.minor(),
        cash_expected_minor: summary.cash_expected.minor(),
        shift_variance_minor: summary.shift_variance.minor(),
        handover_expected_minor: summary.handover_expected.minor(),
        handover_actual_minor: summary.handover_actual.minor(),
        handover_variance_minor: summary.handover_variance.minor(),
        deposited_to_bank_minor: summary.deposited_to_bank.minor(),
        pending_handovers: summary.pending_handovers,
        disputed_handovers: summary.disputed_handovers,
    }))
}
