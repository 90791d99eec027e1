//! Migration: create_users_table
//! Version: 20240101000000

use tidemark::migration::{Migration, MigrationError, SchemaManager};

pub struct CreateUsersTable;

impl Migration for CreateUsersTable {
    fn version(&self) -> &str {
        "20240101000000"
    }

    fn name(&self) -> &str {
        "create_users_table"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.create_table("users", |t| {
            t.increments("id").primary();
            t.string("email", 255).unique();
            t.string("name", 100);
            t.boolean("active").default(true);
            t.timestamps();
            Ok(())
        })
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.drop_table("users")
    }
}
