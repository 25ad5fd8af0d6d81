use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

use crate::m20260601_090000_users::Users;
use crate::m20260601_091000_stations::Stations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Shifts {
    Table,
    Id,
    StationId,
    EmployeeId,
    ShiftDate,
    StartTime,
    EndTime,
    ShiftType,
    Status,
    OpeningCashMinor,
    ExpectedCashMinor,
    ActualCashMinor,
    ActualOnlineMinor,
    CashDifferenceMinor,
    Notes,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shifts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shifts::StationId).string().not_null())
                    .col(ColumnDef::new(Shifts::EmployeeId).string().not_null())
                    .col(ColumnDef::new(Shifts::ShiftDate).date().not_null())
                    .col(ColumnDef::new(Shifts::StartTime).timestamp().not_null())
                    .col(ColumnDef::new(Shifts::EndTime).timestamp())
                    .col(ColumnDef::new(Shifts::ShiftType).string().not_null())
                    .col(ColumnDef::new(Shifts::Status).string().not_null())
                    .col(ColumnDef::new(Shifts::OpeningCashMinor).big_integer())
                    .col(ColumnDef::new(Shifts::ExpectedCashMinor).big_integer())
                    .col(ColumnDef::new(Shifts::ActualCashMinor).big_integer())
                    .col(ColumnDef::new(Shifts::ActualOnlineMinor).big_integer())
                    .col(ColumnDef::new(Shifts::CashDifferenceMinor).big_integer())
                    .col(ColumnDef::new(Shifts::Notes).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-station_id")
                            .from(Shifts::Table, Shifts::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-employee_id")
                            .from(Shifts::Table, Shifts::EmployeeId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shifts-station_id-start_time")
                    .table(Shifts::Table)
                    .col(Shifts::StationId)
                    .col(Shifts::StartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shifts-employee_id-status")
                    .table(Shifts::Table)
                    .col(Shifts::EmployeeId)
                    .col(Shifts::Status)
                    .to_owned(),
            )
            .await?;

        // At most one active shift per (station, employee), enforced by the
        // schema. Partial indexes are not expressible through the builder.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX \"idx-shifts-one-active\" ON shifts \
                 (station_id, employee_id) WHERE status = 'active'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await?;

        Ok(())
    }
}
