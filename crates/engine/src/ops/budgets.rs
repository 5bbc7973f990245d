use chrono::{NaiveDate, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use uuid::Uuid;

use crate::{Budget, BudgetStatus, EngineError, RequestContext, ResultEngine, budgets};

use super::{Engine, duplicate_of, with_tx};

/// Snapshot of the caller's budget for its period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetData {
    pub period: NaiveDate,
    pub amount_minor: i64,
    pub status: BudgetStatus,
}

impl Engine {
    /// Create the caller's budget for the context period.
    ///
    /// A user has at most one budget per period; a second creation attempt
    /// fails with `Duplicate` ("Budget already exists"). The initial status
    /// is always `Incomplete`.
    pub async fn new_budget(&self, ctx: RequestContext, amount_minor: i64) -> ResultEngine<Uuid> {
        let budget = Budget::new(ctx.user_id, amount_minor, ctx.period)?;
        let budget_id = budget.id;
        tracing::debug!(user_id = %ctx.user_id, period = %ctx.period, "creating budget");

        with_tx!(self, |db_tx| {
            budgets::ActiveModel::from(&budget)
                .insert(&db_tx)
                .await
                .map_err(|err| duplicate_of(err, "Budget"))?;
            Ok(budget_id)
        })
    }

    /// Return the caller's budget for the context period.
    pub async fn current_budget(&self, ctx: RequestContext) -> ResultEngine<BudgetData> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_budget_by_period(&db_tx, ctx.user_id, ctx.period)
                .await?;
            let budget = Budget::try_from(model)?;
            Ok(BudgetData {
                period: budget.period,
                amount_minor: budget.amount_minor,
                status: budget.status,
            })
        })
    }

    /// Change the amount of the caller's budget for the context period.
    ///
    /// Scoped update: only `amount_minor` and `updated_at` are touched, the
    /// derived status is left to the recomputation on the next allocation
    /// change.
    pub async fn update_current_budget(
        &self,
        ctx: RequestContext,
        amount_minor: i64,
    ) -> ResultEngine<Uuid> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            budgets::Entity::update_many()
                .col_expr(budgets::Column::AmountMinor, Expr::value(amount_minor))
                .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(budgets::Column::UserId.eq(ctx.user_id.to_string()))
                .filter(budgets::Column::Period.eq(ctx.period))
                .exec(&db_tx)
                .await?;

            let model = self
                .require_budget_by_period(&db_tx, ctx.user_id, ctx.period)
                .await?;
            let budget = Budget::try_from(model)?;
            Ok(budget.id)
        })
    }
}
