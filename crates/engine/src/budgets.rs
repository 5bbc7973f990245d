//! The module contains the `Budget` and its derived status.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// How the sum of a budget's allocations compares to the budgeted amount.
///
/// Derived state: only the status recomputation writes it, and no value is
/// terminal. A budget marked `Invalid` returns to `Incomplete` as soon as
/// an allocation edit brings the total back under the amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Incomplete,
    Complete,
    Invalid,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Complete => "complete",
            Self::Invalid => "invalid",
        }
    }

    /// Classify the total allocated against the budgeted amount.
    ///
    /// Exact integer comparison on minor units.
    pub fn classify(amount_minor: i64, total_allocated_minor: i64) -> Self {
        match total_allocated_minor.cmp(&amount_minor) {
            Ordering::Equal => Self::Complete,
            Ordering::Less => Self::Incomplete,
            Ordering::Greater => Self::Invalid,
        }
    }
}

impl TryFrom<&str> for BudgetStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "incomplete" => Ok(Self::Incomplete),
            "complete" => Ok(Self::Complete),
            "invalid" => Ok(Self::Invalid),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid budget status: {other}"
            ))),
        }
    }
}

/// A user's spending ceiling for one calendar-month period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub period: NaiveDate,
    pub status: BudgetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(user_id: Uuid, amount_minor: i64, period: NaiveDate) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            amount_minor,
            period,
            status: BudgetStatus::Incomplete,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub period: Date,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::allocations::Entity")]
    Allocations,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id.to_string()),
            user_id: ActiveValue::Set(budget.user_id.to_string()),
            amount_minor: ActiveValue::Set(budget.amount_minor),
            period: ActiveValue::Set(budget.period),
            status: ActiveValue::Set(budget.status.as_str().to_string()),
            created_at: ActiveValue::Set(budget.created_at),
            updated_at: ActiveValue::Set(budget.updated_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("Budget does not exist".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::NotFound("Budget does not exist".to_string()))?,
            amount_minor: model.amount_minor,
            period: model.period,
            status: BudgetStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
