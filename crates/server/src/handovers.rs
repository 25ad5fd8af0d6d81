//! Handover-chain API endpoints

use api_types::handover::{
    BankDeposit, DisputeResolve, HandoverConfirm, HandoverCreate, HandoverStatus as ApiStatus,
    HandoverType as ApiType, HandoverView, HandoversResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    BankDepositCmd, CashHandover, ConfirmHandoverCmd, CreateHandoverCmd, MoneyCents,
    ResolveDisputeCmd,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_type(handover_type: ApiType) -> engine::HandoverType {
    match handover_type {
        ApiType::ShiftCollection => engine::HandoverType::ShiftCollection,
        ApiType::EmployeeToManager => engine::HandoverType::EmployeeToManager,
        ApiType::ManagerToOwner => engine::HandoverType::ManagerToOwner,
        ApiType::DepositToBank => engine::HandoverType::DepositToBank,
    }
}

fn view_type(handover_type: engine::HandoverType) -> ApiType {
    match handover_type {
        engine::HandoverType::ShiftCollection => ApiType::ShiftCollection,
        engine::HandoverType::EmployeeToManager => ApiType::EmployeeToManager,
        engine::HandoverType::ManagerToOwner => ApiType::ManagerToOwner,
        engine::HandoverType::DepositToBank => ApiType::DepositToBank,
    }
}

fn view_status(status: engine::HandoverStatus) -> ApiStatus {
    match status {
        engine::HandoverStatus::Pending => ApiStatus::Pending,
        engine::HandoverStatus::Confirmed => ApiStatus::Confirmed,
        engine::HandoverStatus::Disputed => ApiStatus::Disputed,
        engine::HandoverStatus::Resolved => ApiStatus::Resolved,
    }
}

pub(crate) fn view(handover: CashHandover) -> HandoverView {
    HandoverView {
        id: handover.id,
        station_id: handover.station_id,
        shift_id: handover.shift_id,
        handover_type: view_type(handover.handover_type),
        handover_date: handover.handover_date,
        status: view_status(handover.status),
        from_user_id: handover.from_user_id,
        to_user_id: handover.to_user_id,
        expected_amount_minor: handover.expected_amount.minor(),
        actual_amount_minor: handover.actual_amount.map(MoneyCents::minor),
        difference_minor: handover.difference.map(MoneyCents::minor),
        resolved_amount_minor: handover.resolved_amount.map(MoneyCents::minor),
        previous_handover_id: handover.previous_handover_id,
        created_at: handover.created_at,
        confirmed_at: handover.confirmed_at,
        confirmed_by: handover.confirmed_by,
        notes: handover.notes,
        dispute_notes: handover.dispute_notes,
        resolution_notes: handover.resolution_notes,
        bank_name: handover.bank_name,
        deposit_reference: handover.deposit_reference,
        deposit_receipt_url: handover.deposit_receipt_url,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<HandoverCreate>,
) -> Result<(StatusCode, Json<HandoverView>), ServerError> {
    let actor = user::actor_for(&user)?;
    let mut cmd = CreateHandoverCmd::new(map_type(payload.handover_type));
    if let Some(shift_id) = payload.shift_id {
        cmd = cmd.shift_id(shift_id);
    }
    if let Some(previous_handover_id) = payload.previous_handover_id {
        cmd = cmd.previous_handover_id(previous_handover_id);
    }
    if let Some(from_user_id) = payload.from_user_id {
        cmd = cmd.from_user_id(from_user_id);
    }
    if let Some(to_user_id) = payload.to_user_id {
        cmd = cmd.to_user_id(to_user_id);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let handover = state.engine.create_handover(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(view(handover))))
}

pub async fn pending(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<HandoversResponse>, ServerError> {
    let actor = user::actor_for(&user)?;
    let handovers = state.engine.pending_handovers(&actor).await?;
    Ok(Json(HandoversResponse {
        handovers: handovers.into_iter().map(view).collect(),
    }))
}

pub async fn chain(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HandoversResponse>, ServerError> {
    let actor = user::actor_for(&user)?;
    let handovers = state.engine.handover_chain(&actor, id).await?;
    Ok(Json(HandoversResponse {
        handovers: handovers.into_iter().map(view).collect(),
    }))
}

pub async fn confirm(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HandoverConfirm>,
) -> Result<Json<HandoverView>, ServerError> {
    let actor = user::actor_for(&user)?;
    let mut cmd = ConfirmHandoverCmd::new(id, MoneyCents::new(payload.actual_amount_minor));
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let handover = state.engine.confirm_handover(&actor, cmd).await?;
    Ok(Json(view(handover)))
}

pub async fn resolve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisputeResolve>,
) -> Result<Json<HandoverView>, ServerError> {
    let actor = user::actor_for(&user)?;
    let mut cmd = ResolveDisputeCmd::new(id, payload.resolution_notes);
    if let Some(resolved_amount_minor) = payload.resolved_amount_minor {
        cmd = cmd.resolved_amount(MoneyCents::new(resolved_amount_minor));
    }

    let handover = state.engine.resolve_dispute(&actor, cmd).await?;
    Ok(Json(view(handover)))
}

pub async fn bank_deposit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BankDeposit>,
) -> Result<(StatusCode, Json<HandoverView>), ServerError> {
    let actor = user::actor_for(&user)?;
    let mut cmd = BankDepositCmd::new(payload.station_id, MoneyCents::new(payload.amount_minor));
    if let Some(previous_handover_id) = payload.previous_handover_id {
        cmd = cmd.previous_handover_id(previous_handover_id);
    }
    if let Some(deposited_at) = payload.deposited_at {
        cmd = cmd.deposited_at(deposited_at);
    }
    if let Some(bank_name) = payload.bank_name {
        cmd = cmd.bank_name(bank_name);
    }
    if let Some(deposit_reference) = payload.deposit_reference {
        cmd = cmd.deposit_reference(deposit_reference);
    }
    if let Some(deposit_receipt_url) = payload.deposit_receipt_url {
        cmd = cmd.deposit_receipt_url(deposit_receipt_url);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let handover = state.engine.record_bank_deposit(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(view(handover))))
}
