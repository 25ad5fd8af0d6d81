use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

use crate::m20260601_091000_stations::Stations;
use crate::m20260610_120000_shifts::Shifts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum CashHandovers {
    Table,
    Id,
    StationId,
    ShiftId,
    HandoverType,
    HandoverDate,
    Status,
    FromUserId,
    ToUserId,
    ExpectedAmountMinor,
    ActualAmountMinor,
    DifferenceMinor,
    ResolvedAmountMinor,
    PreviousHandoverId,
    CreatedAt,
    ConfirmedAt,
    ConfirmedBy,
    Notes,
    DisputeNotes,
    ResolutionNotes,
    BankName,
    DepositReference,
    DepositReceiptUrl,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashHandovers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashHandovers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashHandovers::StationId).string().not_null())
                    .col(ColumnDef::new(CashHandovers::ShiftId).string())
                    .col(
                        ColumnDef::new(CashHandovers::HandoverType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashHandovers::HandoverDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashHandovers::Status).string().not_null())
                    .col(ColumnDef::new(CashHandovers::FromUserId).string())
                    .col(ColumnDef::new(CashHandovers::ToUserId).string())
                    .col(
                        ColumnDef::new(CashHandovers::ExpectedAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashHandovers::ActualAmountMinor).big_integer())
                    .col(ColumnDef::new(CashHandovers::DifferenceMinor).big_integer())
                    .col(ColumnDef::new(CashHandovers::ResolvedAmountMinor).big_integer())
                    .col(ColumnDef::new(CashHandovers::PreviousHandoverId).string())
                    .col(
                        ColumnDef::new(CashHandovers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashHandovers::ConfirmedAt).timestamp())
                    .col(ColumnDef::new(CashHandovers::ConfirmedBy).string())
                    .col(ColumnDef::new(CashHandovers::Notes).string())
                    .col(ColumnDef::new(CashHandovers::DisputeNotes).string())
                    .col(ColumnDef::new(CashHandovers::ResolutionNotes).string())
                    .col(ColumnDef::new(CashHandovers::BankName).string())
                    .col(ColumnDef::new(CashHandovers::DepositReference).string())
                    .col(ColumnDef::new(CashHandovers::DepositReceiptUrl).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_handovers-station_id")
                            .from(CashHandovers::Table, CashHandovers::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_handovers-shift_id")
                            .from(CashHandovers::Table, CashHandovers::ShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_handovers-previous_handover_id")
                            .from(CashHandovers::Table, CashHandovers::PreviousHandoverId)
                            .to(CashHandovers::Table, CashHandovers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_handovers-station_id-created_at")
                    .table(CashHandovers::Table)
                    .col(CashHandovers::StationId)
                    .col(CashHandovers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_handovers-status")
                    .table(CashHandovers::Table)
                    .col(CashHandovers::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_handovers-shift_id")
                    .table(CashHandovers::Table)
                    .col(CashHandovers::ShiftId)
                    .to_owned(),
            )
            .await?;

        // At most one collection root per shift, enforced by the schema.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX \"idx-cash_handovers-one-root\" ON cash_handovers \
                 (shift_id) WHERE handover_type = 'shift_collection'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CashHandovers::Table).to_owned())
            .await?;

        Ok(())
    }
}
