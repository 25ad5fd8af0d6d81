use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod shift {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ShiftType {
        Morning,
        Evening,
        Night,
        FullDay,
        Custom,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ShiftStatus {
        Active,
        Ended,
        Cancelled,
    }

    /// Request body for opening a shift.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftStart {
        pub station_id: String,
        /// Employee to open the shift for; defaults to the caller. Manager
        /// and above only.
        pub employee_id: Option<String>,
        pub shift_date: Option<NaiveDate>,
        pub start_time: Option<DateTime<Utc>>,
        pub shift_type: Option<ShiftType>,
        pub opening_cash_minor: Option<i64>,
    }

    /// Request body for closing a shift.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftEnd {
        pub actual_cash_minor: i64,
        pub actual_online_minor: Option<i64>,
        pub end_time: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    /// Request body for voiding a shift.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftCancel {
        pub reason: String,
    }

    /// Query for the active-shift lookup.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ActiveShiftQuery {
        pub employee_id: Option<String>,
    }

    /// Query for the station shift listing.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ShiftListQuery {
        pub station_id: String,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub status: Option<ShiftStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftView {
        pub id: Uuid,
        pub station_id: String,
        pub employee_id: String,
        pub shift_date: NaiveDate,
        pub start_time: DateTime<Utc>,
        pub end_time: Option<DateTime<Utc>>,
        pub shift_type: ShiftType,
        pub status: ShiftStatus,
        pub opening_cash_minor: Option<i64>,
        pub expected_cash_minor: Option<i64>,
        pub actual_cash_minor: Option<i64>,
        pub actual_online_minor: Option<i64>,
        pub cash_difference_minor: Option<i64>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftsResponse {
        pub shifts: Vec<ShiftView>,
    }
}

pub mod handover {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum HandoverType {
        ShiftCollection,
        EmployeeToManager,
        ManagerToOwner,
        DepositToBank,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum HandoverStatus {
        Pending,
        Confirmed,
        Disputed,
        Resolved,
    }

    /// Request body for opening a handover leg.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HandoverCreate {
        pub handover_type: HandoverType,
        /// Required for shift collections.
        pub shift_id: Option<Uuid>,
        /// Required for every other type.
        pub previous_handover_id: Option<Uuid>,
        pub from_user_id: Option<String>,
        pub to_user_id: Option<String>,
        pub notes: Option<String>,
    }

    /// Request body for counting a pending handover.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HandoverConfirm {
        pub actual_amount_minor: i64,
        pub notes: Option<String>,
    }

    /// Request body for settling a disputed handover.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DisputeResolve {
        pub resolution_notes: String,
        pub resolved_amount_minor: Option<i64>,
    }

    /// Request body for recording a bank deposit.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankDeposit {
        pub station_id: String,
        pub amount_minor: i64,
        pub previous_handover_id: Option<Uuid>,
        pub deposited_at: Option<DateTime<Utc>>,
        pub bank_name: Option<String>,
        pub deposit_reference: Option<String>,
        pub deposit_receipt_url: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HandoverView {
        pub id: Uuid,
        pub station_id: String,
        pub shift_id: Option<Uuid>,
        pub handover_type: HandoverType,
        pub handover_date: NaiveDate,
        pub status: HandoverStatus,
        pub from_user_id: Option<String>,
        pub to_user_id: Option<String>,
        pub expected_amount_minor: i64,
        pub actual_amount_minor: Option<i64>,
        pub difference_minor: Option<i64>,
        pub resolved_amount_minor: Option<i64>,
        pub previous_handover_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
        pub confirmed_at: Option<DateTime<Utc>>,
        pub confirmed_by: Option<String>,
        pub notes: Option<String>,
        pub dispute_notes: Option<String>,
        pub resolution_notes: Option<String>,
        pub bank_name: Option<String>,
        pub deposit_reference: Option<String>,
        pub deposit_receipt_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HandoversResponse {
        pub handovers: Vec<HandoverView>,
    }
}

pub mod summary {
    use super::*;

    /// Query for the reconciliation summary.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub station_id: String,
        pub from: DateTime<Utc>,
        pub to: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CashFlowSummary {
        pub station_id: String,
        pub from: DateTime<Utc>,
        pub to: DateTime<Utc>,
        pub shifts_ended: u64,
        pub cash_collected_minor: i64,
        pub cash_expected_minor: i64,
        pub shift_variance_minor: i64,
        pub handover_expected_minor: i64,
        pub handover_actual_minor: i64,
        pub handover_variance_minor: i64,
        pub deposited_to_bank_minor: i64,
        pub pending_handovers: u64,
        pub disputed_handovers: u64,
    }
}
