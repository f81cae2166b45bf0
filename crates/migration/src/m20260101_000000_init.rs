//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for Tontine:
//!
//! - `users`: member directory keyed by external account id
//! - `catalog_items`: things members can save toward
//! - `goals`: savings goals with lifecycle status and running balances
//! - `deposits`: append-only contribution records
//! - `interest_events`: append-only interest accrual records
//! - `external_transactions`: treasury ledger entries under reconciliation
//! - `settings`: key/value interest configuration
//! - `notifications`: per-user domain event feed

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    AccountId,
    DisplayName,
    Credential,
    IsAdmin,
    CreatedAt,
}

#[derive(Iden)]
enum CatalogItems {
    Table,
    Id,
    Name,
    PriceMinor,
    Description,
    Category,
    Available,
    CreatedAt,
}

#[derive(Iden)]
enum Goals {
    Table,
    Id,
    UserId,
    ItemName,
    GoalPriceMinor,
    AmountDepositedMinor,
    InterestEarnedMinor,
    Status,
    Note,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Deposits {
    Table,
    Id,
    GoalId,
    AmountMinor,
    RecordedBy,
    Note,
    Source,
    ExternalRef,
    DepositedAt,
    CreatedAt,
}

#[derive(Iden)]
enum InterestEvents {
    Table,
    Id,
    GoalId,
    AmountMinor,
    BalanceBeforeMinor,
    BalanceAfterMinor,
    AccruedAt,
}

#[derive(Iden)]
enum ExternalTransactions {
    Table,
    ExternalId,
    SenderAccountId,
    SenderName,
    AmountMinor,
    Reason,
    OccurredAt,
    GoalId,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Settings {
    Table,
    Key,
    Value,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    UserId,
    GoalId,
    Kind,
    Message,
    IsRead,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::Credential).string())
                    .col(ColumnDef::new(Users::IsAdmin).boolean().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-account_id-unique")
                    .table(Users::Table)
                    .col(Users::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Catalog items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CatalogItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CatalogItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CatalogItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(CatalogItems::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CatalogItems::Description).string())
                    .col(ColumnDef::new(CatalogItems::Category).string().not_null())
                    .col(ColumnDef::new(CatalogItems::Available).boolean().not_null())
                    .col(
                        ColumnDef::new(CatalogItems::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Goals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Goals::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Goals::UserId).string().not_null())
                    .col(ColumnDef::new(Goals::ItemName).string().not_null())
                    .col(
                        ColumnDef::new(Goals::GoalPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Goals::AmountDepositedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Goals::InterestEarnedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Goals::Status).string().not_null())
                    .col(ColumnDef::new(Goals::Note).string())
                    .col(ColumnDef::new(Goals::IsPublic).boolean().not_null())
                    .col(ColumnDef::new(Goals::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Goals::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-goals-user_id")
                            .from(Goals::Table, Goals::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-goals-status")
                    .table(Goals::Table)
                    .col(Goals::Status)
                    .to_owned(),
            )
            .await?;

        // One open goal per user, enforced at the storage layer. Partial
        // indexes have no sea-query builder form, hence the raw statement.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"idx-goals-user_id-open-unique\" \
                 ON \"goals\" (\"user_id\") \
                 WHERE \"status\" IN ('pending_approval', 'active', 'withdrawal_pending')",
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Deposits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Deposits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deposits::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deposits::GoalId).string().not_null())
                    .col(
                        ColumnDef::new(Deposits::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deposits::RecordedBy).string())
                    .col(ColumnDef::new(Deposits::Note).string())
                    .col(ColumnDef::new(Deposits::Source).string().not_null())
                    .col(ColumnDef::new(Deposits::ExternalRef).big_integer())
                    .col(ColumnDef::new(Deposits::DepositedAt).timestamp().not_null())
                    .col(ColumnDef::new(Deposits::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deposits-goal_id")
                            .from(Deposits::Table, Deposits::GoalId)
                            .to(Goals::Table, Goals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-deposits-goal_id-deposited_at")
                    .table(Deposits::Table)
                    .col(Deposits::GoalId)
                    .col(Deposits::DepositedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-deposits-external_ref-unique")
                    .table(Deposits::Table)
                    .col(Deposits::ExternalRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Interest events
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(InterestEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InterestEvents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InterestEvents::GoalId).string().not_null())
                    .col(
                        ColumnDef::new(InterestEvents::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InterestEvents::BalanceBeforeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InterestEvents::BalanceAfterMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InterestEvents::AccruedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-interest_events-goal_id")
                            .from(InterestEvents::Table, InterestEvents::GoalId)
                            .to(Goals::Table, Goals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-interest_events-goal_id-accrued_at")
                    .table(InterestEvents::Table)
                    .col(InterestEvents::GoalId)
                    .col(InterestEvents::AccruedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. External transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExternalTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExternalTransactions::ExternalId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExternalTransactions::SenderAccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalTransactions::SenderName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExternalTransactions::Reason).string())
                    .col(
                        ColumnDef::new(ExternalTransactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExternalTransactions::GoalId).string())
                    .col(
                        ColumnDef::new(ExternalTransactions::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-external_transactions-goal_id")
                            .from(ExternalTransactions::Table, ExternalTransactions::GoalId)
                            .to(Goals::Table, Goals::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-external_transactions-status")
                    .table(ExternalTransactions::Table)
                    .col(ExternalTransactions::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Settings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settings::Value).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Default interest configuration; a fresh database accrues at 5%
        // monthly until an admin changes it.
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Settings::Table)
                    .columns([Settings::Key, Settings::Value])
                    .values_panic(["interest_rate".into(), "0.05".into()])
                    .values_panic(["interest_period".into(), "monthly".into()])
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Notifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).string().not_null())
                    .col(ColumnDef::new(Notifications::GoalId).string())
                    .col(ColumnDef::new(Notifications::Kind).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).string().not_null())
                    .col(ColumnDef::new(Notifications::IsRead).boolean().not_null())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notifications-user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-user_id-created_at")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExternalTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InterestEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deposits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CatalogItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
