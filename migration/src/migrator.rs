use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510180001_create_teachers::Migration),
            Box::new(migrations::m202510180002_create_students::Migration),
            Box::new(migrations::m202510180003_create_admins::Migration),
            Box::new(migrations::m202510180004_create_attendance_sessions::Migration),
            Box::new(migrations::m202510180005_create_attendance_records::Migration),
            Box::new(migrations::m202510180006_create_token_history::Migration),
        ]
    }
}
