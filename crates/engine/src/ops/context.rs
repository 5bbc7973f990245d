use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{Budget, BudgetStatus, EngineError, RequestContext, ResultEngine, allocations, budgets};

use super::{Engine, with_tx};

/// The `(user, budget)` pair an envelope mutation operates against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UserBudget {
    pub user_id: Uuid,
    pub budget_id: Uuid,
}

impl Engine {
    /// Resolve the caller's budget for the context period.
    ///
    /// The shared entry point of every envelope mutation: allocations carry
    /// no notion of "current" on their own.
    pub async fn current_user_budget(&self, ctx: RequestContext) -> ResultEngine<UserBudget> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_budget_by_period(&db_tx, ctx.user_id, ctx.period)
                .await?;
            let budget = Budget::try_from(model)?;
            Ok(UserBudget {
                user_id: ctx.user_id,
                budget_id: budget.id,
            })
        })
    }

    /// Recompute and persist a budget status from the given total.
    ///
    /// Public wrapper for callers that already hold an up-to-date total;
    /// envelope mutations run the same recomputation on their own open
    /// transaction instead, so the total they feed in reflects the write
    /// they just performed.
    pub async fn update_budget_status(
        &self,
        budget_id: Uuid,
        total_expenses_minor: i64,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.recompute_budget_status(&db_tx, budget_id, total_expenses_minor)
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_budget_by_period(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        period: NaiveDate,
    ) -> ResultEngine<budgets::Model> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .filter(budgets::Column::Period.eq(period))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("Budget does not exist".to_string()))
    }

    /// Single writer of `budgets.status`.
    pub(super) async fn recompute_budget_status(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        total_expenses_minor: i64,
    ) -> ResultEngine<()> {
        let model = budgets::Entity::find_by_id(budget_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("Budget does not exist".to_string()))?;

        let status = BudgetStatus::classify(model.amount_minor, total_expenses_minor);
        tracing::debug!(
            budget_id = %budget_id,
            total_expenses_minor,
            status = status.as_str(),
            "recomputed budget status"
        );

        let active = budgets::ActiveModel {
            id: ActiveValue::Set(budget_id.to_string()),
            status: ActiveValue::Set(status.as_str().to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        active.update(db).await?;
        Ok(())
    }

    /// Sum of all allocation amounts for a budget, 0 when there are none.
    pub(super) async fn total_allocated(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<i64> {
        let total = allocations::Entity::find()
            .select_only()
            .column_as(allocations::Column::AmountMinor.sum(), "total")
            .filter(allocations::Column::BudgetId.eq(budget_id.to_string()))
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }
}
