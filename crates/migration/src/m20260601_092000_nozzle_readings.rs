use sea_orm_migration::prelude::*;

use crate::m20260601_091000_stations::Stations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum NozzleReadings {
    Table,
    Id,
    StationId,
    RecordedAt,
    CashMinor,
    OnlineMinor,
    CreditMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NozzleReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NozzleReadings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NozzleReadings::StationId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NozzleReadings::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NozzleReadings::CashMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NozzleReadings::OnlineMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NozzleReadings::CreditMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-nozzle_readings-station_id")
                            .from(NozzleReadings::Table, NozzleReadings::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-nozzle_readings-station_id-recorded_at")
                    .table(NozzleReadings::Table)
                    .col(NozzleReadings::StationId)
                    .col(NozzleReadings::RecordedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NozzleReadings::Table).to_owned())
            .await?;

        Ok(())
    }
}
