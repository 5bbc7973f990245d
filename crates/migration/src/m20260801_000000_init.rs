//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: owned by the auth subsystem, referenced by id
//! - `budgets`: one per user and period, with the derived status
//! - `envelopes`: named spending categories, unique per user by name
//! - `allocations`: the slice of one budget assigned to one envelope
//!
//! The unique indexes here back the engine's `Duplicate` errors: a budget
//! per `(user_id, period)` and an envelope name per user.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    Password,
    Role,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    UserId,
    AmountMinor,
    Period,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Envelopes {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Allocations {
    Table,
    Id,
    BudgetId,
    EnvelopeId,
    AmountMinor,
    Recurring,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-username-unique")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Budgets::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Budgets::Period).date().not_null())
                    .col(ColumnDef::new(Budgets::Status).string().not_null())
                    .col(ColumnDef::new(Budgets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Budgets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-user_id")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id-period-unique")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::Period)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Envelopes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Envelopes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Envelopes::UserId).string().not_null())
                    .col(ColumnDef::new(Envelopes::Name).string().not_null())
                    .col(ColumnDef::new(Envelopes::Description).string())
                    .col(ColumnDef::new(Envelopes::Status).string().not_null())
                    .col(ColumnDef::new(Envelopes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Envelopes::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-envelopes-user_id")
                            .from(Envelopes::Table, Envelopes::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-envelopes-user_id-name-unique")
                    .table(Envelopes::Table)
                    .col(Envelopes::UserId)
                    .col(Envelopes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Allocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Allocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Allocations::BudgetId).string().not_null())
                    .col(ColumnDef::new(Allocations::EnvelopeId).string().not_null())
                    .col(
                        ColumnDef::new(Allocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Allocations::Recurring).boolean().not_null())
                    .col(ColumnDef::new(Allocations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Allocations::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Allocations::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-allocations-budget_id")
                            .from(Allocations::Table, Allocations::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-allocations-envelope_id")
                            .from(Allocations::Table, Allocations::EnvelopeId)
                            .to(Envelopes::Table, Envelopes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-allocations-budget_id")
                    .table(Allocations::Table)
                    .col(Allocations::BudgetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Allocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Envelopes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
