//! Command structs for engine operations.
//!
//! These types group parameters for write operations (shift lifecycle,
//! handover chain, dispute resolution), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{HandoverType, MoneyCents, ShiftType};

/// Open a new shift for an employee at a station.
#[derive(Clone, Debug)]
pub struct StartShiftCmd {
    pub station_id: String,
    /// Employee the shift belongs to. Defaults to the acting user; a manager
    /// or above may set it to open a shift on an employee's behalf.
    pub employee_id: Option<String>,
    pub shift_date: Option<NaiveDate>,
    pub start_time: Option<DateTime<Utc>>,
    pub shift_type: Option<ShiftType>,
    pub opening_cash: Option<MoneyCents>,
}

impl StartShiftCmd {
    #[must_use]
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            employee_id: None,
            shift_date: None,
            start_time: None,
            shift_type: None,
            opening_cash: None,
        }
    }

    #[must_use]
    pub fn employee_id(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    #[must_use]
    pub fn shift_date(mut self, shift_date: NaiveDate) -> Self {
        self.shift_date = Some(shift_date);
        self
    }

    #[must_use]
    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    #[must_use]
    pub fn shift_type(mut self, shift_type: ShiftType) -> Self {
        self.shift_type = Some(shift_type);
        self
    }

    #[must_use]
    pub fn opening_cash(mut self, opening_cash: MoneyCents) -> Self {
        self.opening_cash = Some(opening_cash);
        self
    }
}

/// Close an active shift and reconcile its drawer.
#[derive(Clone, Debug)]
pub struct EndShiftCmd {
    pub shift_id: Uuid,
    /// Cash counted in the drawer at close.
    pub actual_cash: MoneyCents,
    pub actual_online: Option<MoneyCents>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl EndShiftCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, actual_cash: MoneyCents) -> Self {
        Self {
            shift_id,
            actual_cash,
            actual_online: None,
            end_time: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn actual_online(mut self, actual_online: MoneyCents) -> Self {
        self.actual_online = Some(actual_online);
        self
    }

    #[must_use]
    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Void a shift opened in error. Manager and above only.
#[derive(Clone, Debug)]
pub struct CancelShiftCmd {
    pub shift_id: Uuid,
    /// Why the shift is being voided. Must not be empty; stored in the
    /// shift's notes.
    pub reason: String,
}

impl CancelShiftCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            shift_id,
            reason: reason.into(),
        }
    }
}

/// Open a new pending leg of the custody chain.
#[derive(Clone, Debug)]
pub struct CreateHandoverCmd {
    pub handover_type: HandoverType,
    /// Required for shift collections; ignored otherwise.
    pub shift_id: Option<Uuid>,
    /// Required for every type except shift collections.
    pub previous_handover_id: Option<Uuid>,
    /// Sender of the cash. Defaults to the shift's employee for collections
    /// and to the acting user otherwise.
    pub from_user_id: Option<String>,
    /// Intended recipient. May be left open and bound at confirmation.
    pub to_user_id: Option<String>,
    pub notes: Option<String>,
}

impl CreateHandoverCmd {
    #[must_use]
    pub fn new(handover_type: HandoverType) -> Self {
        Self {
            handover_type,
            shift_id: None,
            previous_handover_id: None,
            from_user_id: None,
            to_user_id: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn from_user_id(mut self, from_user_id: impl Into<String>) -> Self {
        self.from_user_id = Some(from_user_id.into());
        self
    }

    #[must_use]
    pub fn shift_id(mut self, shift_id: Uuid) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    #[must_use]
    pub fn previous_handover_id(mut self, previous_handover_id: Uuid) -> Self {
        self.previous_handover_id = Some(previous_handover_id);
        self
    }

    #[must_use]
    pub fn to_user_id(mut self, to_user_id: impl Into<String>) -> Self {
        self.to_user_id = Some(to_user_id.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Count a pending handover and settle or dispute it.
#[derive(Clone, Debug)]
pub struct ConfirmHandoverCmd {
    pub handover_id: Uuid,
    /// Cash the recipient actually counted.
    pub actual_amount: MoneyCents,
    pub notes: Option<String>,
}

impl ConfirmHandoverCmd {
    #[must_use]
    pub fn new(handover_id: Uuid, actual_amount: MoneyCents) -> Self {
        Self {
            handover_id,
            actual_amount,
            notes: None,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Settle a disputed handover. Owner and above only.
#[derive(Clone, Debug)]
pub struct ResolveDisputeCmd {
    pub handover_id: Uuid,
    pub resolution_notes: String,
    /// Settled figure the next leg should carry forward. Defaults to the
    /// counted amount when absent.
    pub resolved_amount: Option<MoneyCents>,
}

impl ResolveDisputeCmd {
    #[must_use]
    pub fn new(handover_id: Uuid, resolution_notes: impl Into<String>) -> Self {
        Self {
            handover_id,
            resolution_notes: resolution_notes.into(),
            resolved_amount: None,
        }
    }

    #[must_use]
    pub fn resolved_amount(mut self, resolved_amount: MoneyCents) -> Self {
        self.resolved_amount = Some(resolved_amount);
        self
    }
}

/// Record a bank deposit closing out the chain. Owner and above only.
#[derive(Clone, Debug)]
pub struct BankDepositCmd {
    pub station_id: String,
    pub amount: MoneyCents,
    /// The manager-to-owner leg this deposit carries forward, when known.
    pub previous_handover_id: Option<Uuid>,
    pub deposited_at: Option<DateTime<Utc>>,
    pub bank_name: Option<String>,
    pub deposit_reference: Option<String>,
    pub deposit_receipt_url: Option<String>,
    pub notes: Option<String>,
}

impl BankDepositCmd {
    #[must_use]
    pub fn new(station_id: impl Into<String>, amount: MoneyCents) -> Self {
        Self {
            station_id: station_id.into(),
            amount,
            previous_handover_id: None,
            deposited_at: None,
            bank_name: None,
            deposit_reference: None,
            deposit_receipt_url: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn bank_name(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = Some(bank_name.into());
        self
    }

    #[must_use]
    pub fn deposit_reference(mut self, deposit_reference: impl Into<String>) -> Self {
        self.deposit_reference = Some(deposit_reference.into());
        self
    }

    #[must_use]
    pub fn deposit_receipt_url(mut self, deposit_receipt_url: impl Into<String>) -> Self {
        self.deposit_receipt_url = Some(deposit_receipt_url.into());
        self
    }

    #[must_use]
    pub fn previous_handover_id(mut self, previous_handover_id: Uuid) -> Self {
        self.previous_handover_id = Some(previous_handover_id);
        self
    }

    #[must_use]
    pub fn deposited_at(mut self, deposited_at: DateTime<Utc>) -> Self {
        self.deposited_at = Some(deposited_at);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
