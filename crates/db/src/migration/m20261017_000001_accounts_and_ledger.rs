//! Accounts and the append-only ledger.
//!
//! Tables are built with the schema builder so the same migration runs on
//! PostgreSQL and on the in-memory SQLite used by tests. A movement has at most
//! one entry per kind, enforced by a unique index. PostgreSQL also gets a
//! trigger that rejects UPDATE and DELETE on ledger rows.

use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Accounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Accounts::BalanceMinor).gte(0)),
                    )
                    .col(ColumnDef::new(Accounts::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_owner")
                    .table(Accounts::Table)
                    .col(Accounts::OwnerId)
                    .col(Accounts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::AccountId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::CounterpartyId).uuid().null())
                    .col(ColumnDef::new(LedgerEntries::CorrelationId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LedgerEntries::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(LedgerEntries::Category).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::OccurredAt).date().not_null())
                    .col(ColumnDef::new(LedgerEntries::Description).text().null())
                    .col(
                        ColumnDef::new(LedgerEntries::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_account")
                            .from(LedgerEntries::Table, LedgerEntries::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_account_order")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::AccountId)
                    .col(LedgerEntries::OccurredAt)
                    .col(LedgerEntries::RecordedAt)
                    .col(LedgerEntries::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_ledger_entries_correlation_kind")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::CorrelationId)
                    .col(LedgerEntries::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared(IMMUTABLE_LEDGER_SQL)
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared(
                    "DROP TRIGGER IF EXISTS trg_ledger_entries_immutable ON ledger_entries;
                     DROP FUNCTION IF EXISTS reject_ledger_mutation();",
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

const IMMUTABLE_LEDGER_SQL: &str = r"
CREATE OR REPLACE FUNCTION reject_ledger_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'ledger_entries is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_entries_immutable
BEFORE UPDATE OR DELETE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION reject_ledger_mutation();
";

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    OwnerId,
    AccountType,
    BalanceMinor,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    AccountId,
    CounterpartyId,
    CorrelationId,
    Kind,
    AmountMinor,
    Category,
    OccurredAt,
    Description,
    RecordedAt,
}
