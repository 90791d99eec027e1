//! Sample migrations bundled with the CLI binary.

mod m20240101000000_create_users_table;
mod m20240101000100_create_posts_table;

use tidemark::migration::{MigrationError, Migrator};

pub fn register(migrator: &mut Migrator) -> Result<(), MigrationError> {
    migrator
        .register(m20240101000000_create_users_table::CreateUsersTable)?
        .register(m20240101000100_create_posts_table::CreatePostsTable)?;
    Ok(())
}
