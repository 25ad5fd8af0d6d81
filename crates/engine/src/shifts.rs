//! Shift primitives.
//!
//! A `Shift` is one employee's work period at one station. It is created
//! `active`, transitions exactly once to `ended` or `cancelled`, and is never
//! deleted. The cash figures (`expected_cash`, `cash_difference`) are written
//! once at the end transition and are immutable afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Morning,
    Evening,
    Night,
    FullDay,
    Custom,
}

impl ShiftType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::FullDay => "full_day",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for ShiftType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "morning" => Ok(Self::Morning),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            "full_day" => Ok(Self::FullDay),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::Validation(format!(
                "invalid shift type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    Ended,
    Cancelled,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for ShiftStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid shift status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub station_id: String,
    pub employee_id: String,
    pub shift_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub shift_type: ShiftType,
    pub status: ShiftStatus,
    pub opening_cash: Option<MoneyCents>,
    pub expected_cash: Option<MoneyCents>,
    pub actual_cash: Option<MoneyCents>,
    pub actual_online: Option<MoneyCents>,
    pub cash_difference: Option<MoneyCents>,
    pub notes: Option<String>,
}

impl Shift {
    /// Builds a new active shift. End-of-shift figures all start unset.
    pub fn new(
        station_id: String,
        employee_id: String,
        shift_date: NaiveDate,
        start_time: DateTime<Utc>,
        shift_type: ShiftType,
        opening_cash: Option<MoneyCents>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            station_id,
            employee_id,
            shift_date,
            start_time,
            end_time: None,
            shift_type,
            status: ShiftStatus::Active,
            opening_cash,
            expected_cash: None,
            actual_cash: None,
            actual_online: None,
            cash_difference: None,
            notes: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub station_id: String,
    pub employee_id: String,
    pub shift_date: Date,
    pub start_time: DateTimeUtc,
    pub end_time: Option<DateTimeUtc>,
    pub shift_type: String,
    pub status: String,
    pub opening_cash_minor: Option<i64>,
    pub expected_cash_minor: Option<i64>,
    pub actual_cash_minor: Option<i64>,
    pub actual_online_minor: Option<i64>,
    pub cash_difference_minor: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::handovers::Entity")]
    Handovers,
}

impl Related<super::handovers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Handovers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Shift> for ActiveModel {
    fn from(shift: &Shift) -> Self {
        Self {
            id: ActiveValue::Set(shift.id.to_string()),
            station_id: ActiveValue::Set(shift.station_id.clone()),
            employee_id: ActiveValue::Set(shift.employee_id.clone()),
            shift_date: ActiveValue::Set(shift.shift_date),
            start_time: ActiveValue::Set(shift.start_time),
            end_time: ActiveValue::Set(shift.end_time),
            shift_type: ActiveValue::Set(shift.shift_type.as_str().to_string()),
            status: ActiveValue::Set(shift.status.as_str().to_string()),
            opening_cash_minor: ActiveValue::Set(shift.opening_cash.map(MoneyCents::minor)),
            expected_cash_minor: ActiveValue::Set(shift.expected_cash.map(MoneyCents::minor)),
            actual_cash_minor: ActiveValue::Set(shift.actual_cash.map(MoneyCents::minor)),
            actual_online_minor: ActiveValue::Set(shift.actual_online.map(MoneyCents::minor)),
            cash_difference_minor: ActiveValue::Set(shift.cash_difference.map(MoneyCents::minor)),
            notes: ActiveValue::Set(shift.notes.clone()),
        }
    }
}

impl TryFrom<Model> for Shift {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("shift not exists".to_string()))?,
            station_id: model.station_id,
            employee_id: model.employee_id,
            shift_date: model.shift_date,
            start_time: model.start_time,
            end_time: model.end_time,
            shift_type: ShiftType::try_from(model.shift_type.as_str())?,
            status: ShiftStatus::try_from(model.status.as_str())?,
            opening_cash: model.opening_cash_minor.map(MoneyCents::new),
            expected_cash: model.expected_cash_minor.map(MoneyCents::new),
            actual_cash: model.actual_cash_minor.map(MoneyCents::new),
            actual_online: model.actual_online_minor.map(MoneyCents::new),
            cash_difference: model.cash_difference_minor.map(MoneyCents::new),
            notes: model.notes,
        })
    }
}
