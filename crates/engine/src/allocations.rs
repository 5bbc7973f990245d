//! The module contains the `Allocation`: the slice of one budget assigned
//! to one envelope for that budget's period.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Per-allocation spending state.
///
/// Set to `Under` at creation and not recomputed; only the parent budget's
/// status is derived from the aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Under,
    Full,
    Exceeded,
}

impl AllocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Under => "under",
            Self::Full => "full",
            Self::Exceeded => "exceeded",
        }
    }
}

impl TryFrom<&str> for AllocationStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "under" => Ok(Self::Under),
            "full" => Ok(Self::Full),
            "exceeded" => Ok(Self::Exceeded),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid allocation status: {other}"
            ))),
        }
    }
}

/// The join of one envelope and one budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub envelope_id: Uuid,
    pub amount_minor: i64,
    pub recurring: bool,
    pub status: AllocationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Allocation {
    pub fn new(
        budget_id: Uuid,
        envelope_id: Uuid,
        amount_minor: i64,
        recurring: bool,
    ) -> ResultEngine<Self> {
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            budget_id,
            envelope_id,
            amount_minor,
            recurring,
            status: AllocationStatus::Under,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub budget_id: String,
    pub envelope_id: String,
    pub amount_minor: i64,
    pub recurring: bool,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Budgets,
    #[sea_orm(
        belongs_to = "super::envelopes::Entity",
        from = "Column::EnvelopeId",
        to = "super::envelopes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Envelopes,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::envelopes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Envelopes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Allocation> for ActiveModel {
    fn from(allocation: &Allocation) -> Self {
        Self {
            id: ActiveValue::Set(allocation.id.to_string()),
            budget_id: ActiveValue::Set(allocation.budget_id.to_string()),
            envelope_id: ActiveValue::Set(allocation.envelope_id.to_string()),
            amount_minor: ActiveValue::Set(allocation.amount_minor),
            recurring: ActiveValue::Set(allocation.recurring),
            status: ActiveValue::Set(allocation.status.as_str().to_string()),
            created_at: ActiveValue::Set(allocation.created_at),
            updated_at: ActiveValue::Set(allocation.updated_at),
        }
    }
}

impl TryFrom<Model> for Allocation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("Envelope does not exist".to_string()))?,
            budget_id: Uuid::parse_str(&model.budget_id)
                .map_err(|_| EngineError::NotFound("Budget does not exist".to_string()))?,
            envelope_id: Uuid::parse_str(&model.envelope_id)
                .map_err(|_| EngineError::NotFound("Envelope does not exist".to_string()))?,
            amount_minor: model.amount_minor,
            recurring: model.recurring,
            status: AllocationStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
