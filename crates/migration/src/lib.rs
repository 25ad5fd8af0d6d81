pub use sea_orm_migration::prelude::*;

mod m20260601_090000_users;
mod m20260601_091000_stations;
mod m20260601_092000_nozzle_readings;
mod m20260610_120000_shifts;
mod m20260612_120000_cash_handovers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_090000_users::Migration),
            Box::new(m20260601_091000_stations::Migration),
            Box::new(m20260601_092000_nozzle_readings::Migration),
            Box::new(m20260610_120000_shifts::Migration),
            Box::new(m20260612_120000_cash_handovers::Migration),
        ]
    }
}
