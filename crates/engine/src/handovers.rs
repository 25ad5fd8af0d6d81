//! Cash handover primitives.
//!
//! A `CashHandover` records one leg of the custody chain: cash collected
//! from an ended shift, employee to manager, manager to owner, owner to
//! bank. Each leg links to its predecessor through `previous_handover_id`,
//! so the full chain for a shift's cash can be walked from any leg.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverType {
    ShiftCollection,
    EmployeeToManager,
    ManagerToOwner,
    DepositToBank,
}

impl HandoverType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShiftCollection => "shift_collection",
            Self::EmployeeToManager => "employee_to_manager",
            Self::ManagerToOwner => "manager_to_owner",
            Self::DepositToBank => "deposit_to_bank",
        }
    }
}

impl TryFrom<&str> for HandoverType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "shift_collection" => Ok(Self::ShiftCollection),
            "employee_to_manager" => Ok(Self::EmployeeToManager),
            "manager_to_owner" => Ok(Self::ManagerToOwner),
            "deposit_to_bank" => Ok(Self::DepositToBank),
            other => Err(EngineError::Validation(format!(
                "invalid handover type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverStatus {
    Pending,
    Confirmed,
    Disputed,
    Resolved,
}

impl HandoverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Disputed => "disputed",
            Self::Resolved => "resolved",
        }
    }

    /// Confirmed and resolved legs carry a settled amount and may be chained
    /// onto; pending and disputed legs may not.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Confirmed | Self::Resolved)
    }
}

impl TryFrom<&str> for HandoverStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "disputed" => Ok(Self::Disputed),
            "resolved" => Ok(Self::Resolved),
            other => Err(EngineError::Validation(format!(
                "invalid handover status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashHandover {
    pub id: Uuid,
    pub station_id: String,
    pub shift_id: Option<Uuid>,
    pub handover_type: HandoverType,
    pub handover_date: NaiveDate,
    pub status: HandoverStatus,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub expected_amount: MoneyCents,
    pub actual_amount: Option<MoneyCents>,
    pub difference: Option<MoneyCents>,
    pub resolved_amount: Option<MoneyCents>,
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

impl CashHandover {
    /// Builds a new pending leg dated from its creation instant.
    /// Confirmation figures start unset.
    pub fn new(
        station_id: String,
        handover_type: HandoverType,
        from_user_id: Option<String>,
        expected_amount: MoneyCents,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            station_id,
            shift_id: None,
            handover_type,
            handover_date: created_at.date_naive(),
            status: HandoverStatus::Pending,
            from_user_id,
            to_user_id: None,
            expected_amount,
            actual_amount: None,
            difference: None,
            resolved_amount: None,
            previous_handover_id: None,
            created_at,
            confirmed_at: None,
            confirmed_by: None,
            notes: None,
            dispute_notes: None,
            resolution_notes: None,
            bank_name: None,
            deposit_reference: None,
            deposit_receipt_url: None,
        }
    }

    /// The amount the next leg of the chain should expect: the resolved
    /// figure when a dispute settled on one, otherwise the counted amount.
    pub fn effective_amount(&self) -> Option<MoneyCents> {
        self.resolved_amount.or(self.actual_amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cash_handovers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub station_id: String,
    pub shift_id: Option<String>,
    pub handover_type: String,
    pub handover_date: Date,
    pub status: String,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub expected_amount_minor: i64,
    pub actual_amount_minor: Option<i64>,
    pub difference_minor: Option<i64>,
    pub resolved_amount_minor: Option<i64>,
    pub previous_handover_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub confirmed_at: Option<DateTimeUtc>,
    pub confirmed_by: Option<String>,
    pub notes: Option<String>,
    pub dispute_notes: Option<String>,
    pub resolution_notes: Option<String>,
    pub bank_name: Option<String>,
    pub deposit_reference: Option<String>,
    pub deposit_receipt_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shifts::Entity",
        from = "Column::ShiftId",
        to = "super::shifts::Column::Id"
    )]
    Shift,
}

impl Related<super::shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shift.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashHandover> for ActiveModel {
    fn from(handover: &CashHandover) -> Self {
        Self {
            id: ActiveValue::Set(handover.id.to_string()),
            station_id: ActiveValue::Set(handover.station_id.clone()),
            shift_id: ActiveValue::Set(handover.shift_id.map(|id| id.to_string())),
            handover_type: ActiveValue::Set(handover.handover_type.as_str().to_string()),
            handover_date: ActiveValue::Set(handover.handover_date),
            status: ActiveValue::Set(handover.status.as_str().to_string()),
            from_user_id: ActiveValue::Set(handover.from_user_id.clone()),
            to_user_id: ActiveValue::Set(handover.to_user_id.clone()),
            expected_amount_minor: ActiveValue::Set(handover.expected_amount.minor()),
            actual_amount_minor: ActiveValue::Set(handover.actual_amount.map(MoneyCents::minor)),
            difference_minor: ActiveValue::Set(handover.difference.map(MoneyCents::minor)),
            resolved_amount_minor: ActiveValue::Set(
                handover.resolved_amount.map(MoneyCents::minor),
            ),
            previous_handover_id: ActiveValue::Set(
                handover.previous_handover_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(handover.created_at),
            confirmed_at: ActiveValue::Set(handover.confirmed_at),
            confirmed_by: ActiveValue::Set(handover.confirmed_by.clone()),
            notes: ActiveValue::Set(handover.notes.clone()),
            dispute_notes: ActiveValue::Set(handover.dispute_notes.clone()),
            resolution_notes: ActiveValue::Set(handover.resolution_notes.clone()),
            bank_name: ActiveValue::Set(handover.bank_name.clone()),
            deposit_reference: ActiveValue::Set(handover.deposit_reference.clone()),
            deposit_receipt_url: ActiveValue::Set(handover.deposit_receipt_url.clone()),
        }
    }
}

impl TryFrom<Model> for CashHandover {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let parse = |value: &str| {
            Uuid::parse_str(value)
                .map_err(|_| EngineError::NotFound("handover not exists".to_string()))
        };
        Ok(Self {
            id: parse(&model.id)?,
            station_id: model.station_id,
            shift_id: model.shift_id.as_deref().map(parse).transpose()?,
            handover_type: HandoverType::try_from(model.handover_type.as_str())?,
            handover_date: model.handover_date,
            status: HandoverStatus::try_from(model.status.as_str())?,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            expected_amount: MoneyCents::new(model.expected_amount_minor),
            actual_amount: model.actual_amount_minor.map(MoneyCents::new),
            difference: model.difference_minor.map(MoneyCents::new),
            resolved_amount: model.resolved_amount_minor.map(MoneyCents::new),
            previous_handover_id: model.previous_handover_id.as_deref().map(parse).transpose()?,
            created_at: model.created_at,
            confirmed_at: model.confirmed_at,
            confirmed_by: model.confirmed_by,
            notes: model.notes,
            dispute_notes: model.dispute_notes,
            resolution_notes: model.resolution_notes,
            bank_name: model.bank_name,
            deposit_reference: model.deposit_reference,
            deposit_receipt_url: model.deposit_receipt_url,
        })
    }
}
