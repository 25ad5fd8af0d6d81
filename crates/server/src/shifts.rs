//! Shift API endpoints

use api_types::shift::{
    ActiveShiftQuery, ShiftCancel, ShiftEnd, ShiftListQuery, ShiftStart,
    ShiftStatus as ApiStatus, ShiftType as ApiType, ShiftView, ShiftsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    CancelShiftCmd, EndShiftCmd, MoneyCents, Shift, ShiftListFilter, StartShiftCmd,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_type(shift_type: ApiType) -> engine::ShiftType {
    match shift_type {
        ApiType::Morning => engine::ShiftType::Morning,
        ApiType::Evening => engine::ShiftType::Evening,
        ApiType::Night => engine::ShiftType::Night,
        ApiType::FullDay => engine::ShiftType::FullDay,
        ApiType::Custom => engine::ShiftType::Custom,
    }
}

fn view_type(shift_type: engine::ShiftType) -> ApiType {
    match shift_type {
        engine::ShiftType::Morning => ApiType::Morning,
        engine::ShiftType::Evening => ApiType::Evening,
        engine::ShiftType::Night => ApiType::Night,
        engine::ShiftType::FullDay => ApiType::FullDay,
        engine::ShiftType::Custom => ApiType::Custom,
    }
}

fn map_status(status: ApiStatus) -> engine::ShiftStatus {
    match status {
        ApiStatus::Active => engine::ShiftStatus::Active,
        ApiStatus::Ended => engine::ShiftStatus::Ended,
        ApiStatus::Cancelled => engine::ShiftStatus::Cancelled,
    }
}

fn view_status(status: engine::ShiftStatus) -> ApiStatus {
    match status {
        engine::ShiftStatus::Active => ApiStatus::Active,
        engine::ShiftStatus::Ended => ApiStatus::Ended,
        engine::ShiftStatus::Cancelled => ApiStatus::Cancelled,
    }
}

pub(crate) fn view(shift: Shift) -> ShiftView {
    ShiftView {
        id: shift.id,
        station_id: shift.station_id,
        employee_id: shift.employee_id,
        shift_date: shift.shift_date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        shift_type: view_type(shift.shift_type),
        status: view_status(shift.status),
        opening_cash_minor: shift.opening_cash.map(MoneyCents::minor),
        expected_cash_minor: shift.expected_cash.map(MoneyCents::minor),
        actual_cash_minor: shift.actual_cash.map(MoneyCents::minor),
        actual_online_minor: shift.actual_online.map(MoneyCents::minor),
        cash_difference_minor: shift.cash_difference.map(MoneyCents::minor),
        notes: shift.notes,
    }
}

pub async fn start(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ShiftStart>,
) -> Result<(StatusCode, Json<ShiftView>), ServerError> {
    let actor = user::actor_for(&user)?;
    let mut cmd = StartShiftCmd::new(payload.station_id);
    if let Some(employee_id) = payload.employee_id {
        cmd = cmd.employee_id(employee_id);
    }
    if let Some(shift_date) = payload.shift_date {
        cmd = cmd.shift_date(shift_date);
    }
    if let Some(start_time) = payload.start_time {
        cmd = cmd.start_time(start_time);
    }
    if let Some(shift_type) = payload.shift_type {
        cmd = cmd.shift_type(map_type(shift_type));
    }
    if let Some(opening_cash_minor) = payload.opening_cash_minor {
        cmd = cmd.opening_cash(MoneyCents::new(opening_cash_minor));
    }

    let shift = state.engine.start_shift(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(view(shift))))
}

pub async fn active(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ActiveShiftQuery>,
) -> Result<Json<Option<ShiftView>>, ServerError> {
    let actor = user::actor_for(&user)?;
    let shift = state
        .engine
        .active_shift(&actor, query.employee_id.as_deref())
        .await?;
    Ok(Json(shift.map(view)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ShiftListQuery>,
) -> Result<Json<ShiftsResponse>, ServerError> {
    let actor = user::actor_for(&user)?;
    let filter = ShiftListFilter {
        from: query.from,
        to: query.to,
        status: query.status.map(map_status),
    };
    let shifts = state
        .engine
        .shifts_for_station(&actor, &query.station_id, &filter)
        .await?;
    Ok(Json(ShiftsResponse {
        shifts: shifts.into_iter().map(view).collect(),
    }))
}

pub async fn end(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShiftEnd>,
) -> Result<Json<ShiftView>, ServerError> {
    let actor = user::actor_for(&user)?;
    let mut cmd = EndShiftCmd::new(id, MoneyCents::new(payload.actual_cash_minor));
    if let Some(actual_online_minor) = payload.actual_online_minor {
        cmd = cmd.actual_online(MoneyCents::new(actual_online_minor));
    }
    if let Some(end_time) = payload.end_time {
        cmd = cmd.end_time(end_time);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let shift = state.engine.end_shift(&actor, cmd).await?;
    Ok(Json(view(shift)))
}

pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShiftCancel>,
) -> Result<Json<ShiftView>, ServerError> {
    let actor = user::actor_for(&user)?;
    let cmd = CancelShiftCmd::new(id, payload.reason);

    let shift = state.engine.cancel_shift(&actor, cmd).await?;
    Ok(Json(view(shift)))
}
