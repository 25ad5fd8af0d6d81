use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod handovers;
mod reconciliation;
mod server;
mod shifts;
mod user;

pub mod types {
    pub mod shift {
        pub use api_types::shift::{
            ActiveShiftQuery, ShiftCancel, ShiftEnd, ShiftListQuery, ShiftStart, ShiftStatus,
            ShiftType, ShiftView, ShiftsResponse,
        };
    }

    pub mod handover {
        pub use api_types::handover::{
            BankDeposit, DisputeResolve, HandoverConfirm, HandoverCreate, HandoverStatus,
            HandoverType, HandoverView, HandoversResponse,
        };
    }

    pub mod summary {
        pub use api_types::summary::{CashFlowSummary, SummaryQuery};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
    code: &'static str,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Permission(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_) | EngineError::BusinessRule(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, code) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let code = err.code();
                (status, message_for_engine_error(err), code)
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err, "BAD_REQUEST"),
        };

        (status, Json(Error { error, code })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
