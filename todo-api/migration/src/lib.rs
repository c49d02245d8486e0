pub use sea_orm_migration::prelude::*;

mod m20250801_090000_create_tasks_table;
mod m20250801_091500_add_status_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_090000_create_tasks_table::Migration),
            Box::new(m20250801_091500_add_status_index::Migration),
        ]
    }
}
