//! Migration: create_posts_table
//! Version: 20240101000100

use tidemark::migration::{Migration, MigrationError, SchemaManager};

pub struct CreatePostsTable;

impl Migration for CreatePostsTable {
    fn version(&self) -> &str {
        "20240101000100"
    }

    fn name(&self) -> &str {
        "create_posts_table"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.create_table("posts", |t| {
            t.increments("id").primary();
            t.integer("user_id").unsigned();
            t.string("title", 200);
            t.text("body").nullable();
            t.enumeration("status", ["draft", "published"]).default("draft");
            t.timestamps();
            t.foreign_key(["user_id"])
                .references("id")
                .on("users")
                .on_delete("CASCADE");
            t.index(["status"])
        })
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.drop_table("posts")
    }
}
