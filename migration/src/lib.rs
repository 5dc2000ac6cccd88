pub use sea_orm_migration::prelude::*;

mod m20250801_000001_create_users;
mod m20250801_000002_create_service_types;
mod m20250801_000003_create_technicians;
mod m20250801_000004_create_bookings;
mod m20250801_000005_create_technician_assignments;
mod m20250801_000006_create_booking_status_history;
mod m20250801_000007_create_technician_location_history;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_users::Migration),
            Box::new(m20250801_000002_create_service_types::Migration),
            Box::new(m20250801_000003_create_technicians::Migration),
            Box::new(m20250801_000004_create_bookings::Migration),
            Box::new(m20250801_000005_create_technician_assignments::Migration),
            Box::new(m20250801_000006_create_booking_status_history::Migration),
            Box::new(m20250801_000007_create_technician_location_history::Migration),
        ]
    }
}
