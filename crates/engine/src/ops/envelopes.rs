use chrono::Utc;
use sea_orm::{
    ActiveValue, FromQueryResult, JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Allocation, AllocationStatus, Envelope, EngineError, EnvelopeStatus, Page, RequestContext,
    ResultEngine, SortBy, SortDirection, allocations, envelopes,
};

use super::{Engine, duplicate_of, normalize_optional_text, normalize_required_name, with_tx};

/// Ids produced by an envelope mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EnvelopeIds {
    pub envelope_id: Uuid,
    pub allocation_id: Uuid,
}

/// One row of the envelope listing for a budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnvelopeData {
    pub name: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub recurring: bool,
    pub status: AllocationStatus,
}

#[derive(Debug, FromQueryResult)]
struct EnvelopeRow {
    name: String,
    description: Option<String>,
    amount_minor: i64,
    recurring: bool,
    status: String,
}

impl TryFrom<EnvelopeRow> for EnvelopeData {
    type Error = EngineError;

    fn try_from(row: EnvelopeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            name: row.name,
            description: row.description,
            amount_minor: row.amount_minor,
            recurring: row.recurring,
            status: AllocationStatus::try_from(row.status.as_str())?,
        })
    }
}

impl Engine {
    /// Create an envelope and allocate part of the caller's current budget
    /// to it.
    ///
    /// Everything after budget resolution runs in one transaction: the
    /// envelope insert, the allocation insert and the status recomputation
    /// either all land or none of them do. A name collision for this user
    /// fails with `Duplicate` ("Envelope already exists") and rolls the
    /// whole unit back.
    pub async fn new_envelope(
        &self,
        ctx: RequestContext,
        name: &str,
        description: Option<&str>,
        amount_minor: i64,
        recurring: bool,
    ) -> ResultEngine<EnvelopeIds> {
        let name = normalize_required_name(name, "envelope")?;
        let description = normalize_optional_text(description);
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }

        // Nothing is written when the caller has no budget for the period.
        let user_budget = self.current_user_budget(ctx).await?;
        tracing::debug!(budget_id = %user_budget.budget_id, name = %name, "creating envelope");

        with_tx!(self, |db_tx| {
            let envelope = Envelope::new(user_budget.user_id, name, description);
            envelopes::ActiveModel::from(&envelope)
                .insert(&db_tx)
                .await
                .map_err(|err| duplicate_of(err, "Envelope"))?;

            let allocation =
                Allocation::new(user_budget.budget_id, envelope.id, amount_minor, recurring)?;
            allocations::ActiveModel::from(&allocation)
                .insert(&db_tx)
                .await?;

            // Read back inside the same transaction so the total includes
            // the allocation just written.
            let total = self.total_allocated(&db_tx, user_budget.budget_id).await?;
            self.recompute_budget_status(&db_tx, user_budget.budget_id, total)
                .await?;

            Ok(EnvelopeIds {
                envelope_id: envelope.id,
                allocation_id: allocation.id,
            })
        })
    }

    /// Rename an envelope and change its allocation.
    ///
    /// Looked up by allocation id; a missing allocation fails with
    /// `NotFound` ("Envelope does not exist") before anything is written.
    pub async fn update_envelope(
        &self,
        allocation_id: Uuid,
        name: &str,
        description: Option<&str>,
        amount_minor: i64,
        recurring: bool,
    ) -> ResultEngine<EnvelopeIds> {
        let name = normalize_required_name(name, "envelope")?;
        let description = normalize_optional_text(description);
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = allocations::Entity::find_by_id(allocation_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("Envelope does not exist".to_string()))?;
            let allocation = Allocation::try_from(model)?;
            tracing::debug!(
                allocation_id = %allocation.id,
                budget_id = %allocation.budget_id,
                "updating envelope"
            );

            let envelope_update = envelopes::ActiveModel {
                id: ActiveValue::Set(allocation.envelope_id.to_string()),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            envelope_update
                .update(&db_tx)
                .await
                .map_err(|err| duplicate_of(err, "Envelope"))?;

            let allocation_update = allocations::ActiveModel {
                id: ActiveValue::Set(allocation.id.to_string()),
                amount_minor: ActiveValue::Set(amount_minor),
                recurring: ActiveValue::Set(recurring),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            allocation_update.update(&db_tx).await?;

            let total = self.total_allocated(&db_tx, allocation.budget_id).await?;
            self.recompute_budget_status(&db_tx, allocation.budget_id, total)
                .await?;

            Ok(EnvelopeIds {
                envelope_id: allocation.envelope_id,
                allocation_id: allocation.id,
            })
        })
    }

    /// Paginated, sorted listing of a budget's active envelopes.
    ///
    /// `page` is 1-based at the interface. `sort_by` must be one of the
    /// [`SortBy`] fields; `sort_direction` is `asc`/`desc`, case
    /// insensitive. Disallowed values fail before any query runs.
    pub async fn envelopes(
        &self,
        budget_id: Uuid,
        page: u64,
        size: u64,
        sort_by: &str,
        sort_direction: &str,
    ) -> ResultEngine<Page<EnvelopeData>> {
        let sort_by = SortBy::try_from(sort_by)?;
        let order = Order::from(SortDirection::try_from(sort_direction)?);
        let size = size.max(1);
        let page_zero = page.saturating_sub(1);

        with_tx!(self, |db_tx| {
            let mut query = allocations::Entity::find()
                .join(JoinType::InnerJoin, allocations::Relation::Envelopes.def())
                .filter(allocations::Column::BudgetId.eq(budget_id.to_string()))
                .filter(envelopes::Column::Status.eq(EnvelopeStatus::Active.as_str()))
                .select_only()
                .column(envelopes::Column::Name)
                .column(envelopes::Column::Description)
                .column(allocations::Column::AmountMinor)
                .column(allocations::Column::Recurring)
                .column(allocations::Column::Status);

            query = match sort_by {
                SortBy::Id => query.order_by(envelopes::Column::Id, order),
                SortBy::Name => query.order_by(envelopes::Column::Name, order),
                SortBy::Amount => query.order_by(allocations::Column::AmountMinor, order),
                SortBy::Recurring => query.order_by(allocations::Column::Recurring, order),
                SortBy::Status => query.order_by(allocations::Column::Status, order),
            };

            let paginator = query.into_model::<EnvelopeRow>().paginate(&db_tx, size);
            let totals = paginator.num_items_and_pages().await?;
            let rows = paginator.fetch_page(page_zero).await?;

            let mut content = Vec::with_capacity(rows.len());
            for row in rows {
                content.push(EnvelopeData::try_from(row)?);
            }

            Ok(Page::assemble(
                content,
                page_zero,
                totals.number_of_pages,
                totals.number_of_items,
            ))
        })
    }
}
