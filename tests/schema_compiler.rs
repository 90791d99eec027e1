//! End-to-end DDL output for every dialect.

#![allow(clippy::expect_used)] // Test code - expect is acceptable

use tidemark::schema::{Schema, SchemaError};
use tidemark::Dialect;

fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn assert_sql(schema: &Schema, expected: &str) {
    assert_eq!(
        normalize(&schema.build().expect("compiles")),
        normalize(expected),
        "dialect {}",
        schema.dialect()
    );
}

#[test]
fn test_create_with_foreign_key() {
    let cases = [
        (
            Dialect::Sqlite,
            "CREATE TABLE posts (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
             user_id INTEGER NOT NULL,
             FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE);",
        ),
        (
            Dialect::Mysql,
            "CREATE TABLE posts (id INT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,
             user_id INT NOT NULL,
             FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE);",
        ),
        (
            Dialect::Postgres,
            "CREATE TABLE posts (id SERIAL NOT NULL PRIMARY KEY CHECK (id > 0),
             user_id INTEGER NOT NULL,
             FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE);",
        ),
    ];

    for (dialect, expected) in cases {
        let schema = Schema::create(dialect, "posts", |t| {
            t.increments("id").primary();
            t.integer("user_id");
            t.foreign_key(["user_id"])
                .references("id")
                .on("users")
                .on_delete("CASCADE");
            Ok(())
        })
        .expect("schema builds");
        assert_sql(&schema, expected);
    }
}

#[test]
fn test_foreign_key_with_update_action() {
    let schema = Schema::create(Dialect::Mysql, "users", |t| {
        t.increments("id").primary();
        t.integer("role_id");
        t.foreign_key(["role_id"])
            .references("id")
            .on("roles")
            .on_delete("CASCADE")
            .on_update("CASCADE");
        Ok(())
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "CREATE TABLE users (id INT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,
         role_id INT NOT NULL,
         FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE ON UPDATE CASCADE);",
    );
}

#[test]
fn test_foreign_key_without_target_is_rejected() {
    let schema = Schema::create(Dialect::Postgres, "posts", |t| {
        t.integer("user_id");
        t.foreign_key(["user_id"]).references("id");
        Ok(())
    })
    .expect("schema builds");
    assert!(matches!(
        schema.build(),
        Err(SchemaError::IncompleteForeignKey { .. })
    ));
}

#[test]
fn test_column_modifiers() {
    let schema = Schema::create(Dialect::Mysql, "products", |t| {
        t.increments("id").primary();
        t.string("email", 100).unique();
        t.float("price", 8, 2);
        t.decimal("cost", 10, 4).unsigned();
        t.boolean("active").default(true);
        t.string("sku", 32).nullable().default("n/a");
        Ok(())
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "CREATE TABLE products (id INT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,
         email VARCHAR(100) NOT NULL UNIQUE,
         price FLOAT(8,2) NOT NULL,
         cost DECIMAL(10,4) NOT NULL,
         active BOOLEAN NOT NULL DEFAULT TRUE,
         sku VARCHAR(32) DEFAULT 'n/a');",
    );
}

#[test]
fn test_timestamps_are_nullable() {
    let schema = Schema::create(Dialect::Postgres, "logs", |t| {
        t.big_increments("id").primary();
        t.timestamps();
        Ok(())
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "CREATE TABLE logs (id BIGSERIAL NOT NULL PRIMARY KEY CHECK (id > 0),
         created_at TIMESTAMP,
         updated_at TIMESTAMP);",
    );
}

#[test]
fn test_enumeration_per_dialect() {
    let cases = [
        (
            Dialect::Sqlite,
            "CREATE TABLE posts (status TEXT NOT NULL CHECK (status IN ('draft', 'published')));",
        ),
        (
            Dialect::Mysql,
            "CREATE TABLE posts (status ENUM('draft', 'published') NOT NULL);",
        ),
        (
            Dialect::Postgres,
            "CREATE TABLE posts (status TEXT NOT NULL CHECK (status IN ('draft', 'published')));",
        ),
    ];

    for (dialect, expected) in cases {
        let schema = Schema::create(dialect, "posts", |t| {
            t.enumeration("status", ["draft", "published"]);
            Ok(())
        })
        .expect("schema builds");
        assert_sql(&schema, expected);
    }
}

#[test]
fn test_sqlite_composite_key_is_demoted_to_unique() {
    let schema = Schema::create(Dialect::Sqlite, "memberships", |t| {
        t.increments("id");
        t.integer("user_id");
        t.integer("team_id");
        t.primary_key(["user_id", "team_id"])
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "CREATE TABLE memberships (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
         user_id INTEGER NOT NULL,
         team_id INTEGER NOT NULL,
         UNIQUE (user_id, team_id));",
    );
}

#[test]
fn test_sqlite_key_on_incrementing_column_is_absorbed() {
    let schema = Schema::create(Dialect::Sqlite, "tags", |t| {
        t.increments("id");
        t.string("label", 50);
        t.primary_key(["id"])
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "CREATE TABLE tags (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
         label VARCHAR(50) NOT NULL);",
    );
}

#[test]
fn test_lone_incrementing_column_becomes_primary_key() {
    let cases = [
        (
            Dialect::Sqlite,
            "CREATE TABLE tags (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
             label VARCHAR(50) NOT NULL);",
        ),
        (
            Dialect::Mysql,
            "CREATE TABLE tags (id INT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,
             label VARCHAR(50) NOT NULL);",
        ),
        (
            Dialect::Postgres,
            "CREATE TABLE tags (id SERIAL NOT NULL CHECK (id > 0),
             label VARCHAR(50) NOT NULL);",
        ),
    ];

    for (dialect, expected) in cases {
        let schema = Schema::create(dialect, "tags", |t| {
            t.increments("id");
            t.string("label", 50);
            Ok(())
        })
        .expect("schema builds");
        assert_sql(&schema, expected);
    }
}

#[test]
fn test_primary_column_and_table_key_conflict() {
    // Key added first, column flagged afterwards: caught at compile time.
    let schema = Schema::create(Dialect::Mysql, "users", |t| {
        t.integer("tenant_id");
        t.primary_key(["tenant_id"])?;
        t.integer("id").primary();
        Ok(())
    })
    .expect("schema builds");
    assert!(matches!(
        schema.build(),
        Err(SchemaError::DuplicatePrimaryKey { .. })
    ));

    let result = Schema::create(Dialect::Postgres, "users", |t| {
        t.integer("id").primary();
        t.primary_key(["id"])
    });
    assert!(matches!(result, Err(SchemaError::DuplicatePrimaryKey { .. })));

    let schema = Schema::create(Dialect::Sqlite, "users", |t| {
        t.increments("id").primary();
        t.primary_key(["id"])
    })
    .expect("schema builds");
    assert_sql(
        &schema,
        "CREATE TABLE users (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT);",
    );
}

#[test]
fn test_composite_key_kept_outside_sqlite() {
    let schema = Schema::create(Dialect::Postgres, "memberships", |t| {
        t.integer("user_id");
        t.integer("team_id");
        t.primary_key(["user_id", "team_id"])
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "CREATE TABLE memberships (user_id INTEGER NOT NULL,
         team_id INTEGER NOT NULL,
         PRIMARY KEY (user_id, team_id));",
    );
}

#[test]
fn test_unique_and_index_constraints_on_create() {
    let build = |dialect| {
        Schema::create(dialect, "users", |t| {
            t.string("email", 255);
            t.string("name", 100);
            t.unique(["email"])?;
            t.index(["name"])
        })
        .expect("schema builds")
        .statements()
        .expect("compiles")
    };

    assert_eq!(
        build(Dialect::Mysql),
        [
            "CREATE TABLE users (email VARCHAR(255) NOT NULL, name VARCHAR(100) NOT NULL, \
             UNIQUE users_email_unique (email));",
            "CREATE INDEX users_name_index ON users (name);",
        ]
    );
    assert_eq!(
        build(Dialect::Postgres),
        [
            "CREATE TABLE users (email VARCHAR(255) NOT NULL, name VARCHAR(100) NOT NULL, \
             UNIQUE (email));",
            "CREATE INDEX users_name_index ON users (name);",
        ]
    );
}

#[test]
fn test_alter_rename_column() {
    for dialect in Dialect::ALL {
        let schema = Schema::alter(dialect, "users", |t| {
            t.rename_column("name", "full_name");
            Ok(())
        })
        .expect("schema builds");
        assert_sql(&schema, "ALTER TABLE users RENAME COLUMN name TO full_name;");
    }
}

#[test]
fn test_alter_change_column() {
    let build = |dialect| {
        Schema::alter(dialect, "users", |t| {
            t.string("email", 150).nullable().change();
            Ok(())
        })
        .expect("schema builds")
    };

    assert_sql(
        &build(Dialect::Mysql),
        "ALTER TABLE users MODIFY COLUMN email VARCHAR(150);",
    );
    assert_sql(
        &build(Dialect::Postgres),
        "ALTER TABLE users ALTER COLUMN email TYPE VARCHAR(150),
         ALTER COLUMN email DROP NOT NULL;",
    );
}

#[test]
fn test_postgres_change_column_sets_default() {
    let schema = Schema::alter(Dialect::Postgres, "users", |t| {
        t.integer("age").default(18).change();
        Ok(())
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "ALTER TABLE users ALTER COLUMN age TYPE INTEGER,
         ALTER COLUMN age SET NOT NULL,
         ALTER COLUMN age SET DEFAULT 18;",
    );
}

#[test]
fn test_alter_add_and_drop_columns() {
    let build = |dialect| {
        Schema::alter(dialect, "users", |t| {
            t.integer("age").default(0);
            t.drop_column("legacy");
            Ok(())
        })
        .expect("schema builds")
        .statements()
        .expect("compiles")
    };

    assert_eq!(
        build(Dialect::Mysql),
        ["ALTER TABLE users ADD COLUMN age INT NOT NULL DEFAULT 0, DROP COLUMN legacy;"]
    );
    assert_eq!(
        build(Dialect::Sqlite),
        [
            "ALTER TABLE users ADD COLUMN age INTEGER NOT NULL DEFAULT 0;",
            "ALTER TABLE users DROP COLUMN legacy;",
        ]
    );
}

#[test]
fn test_alter_drop_constraints() {
    let build = |dialect| {
        Schema::alter(dialect, "users", |t| {
            t.drop_primary_key()?;
            t.drop_unique("users_email_unique");
            t.drop_foreign_key("users_role_id_foreign");
            t.drop_index("users_name_index");
            Ok(())
        })
        .expect("schema builds")
        .statements()
        .expect("compiles")
    };

    assert_eq!(
        build(Dialect::Mysql),
        ["ALTER TABLE users DROP PRIMARY KEY, DROP CONSTRAINT users_email_unique, \
          DROP FOREIGN KEY users_role_id_foreign, DROP INDEX users_name_index;"]
    );
    assert_eq!(
        build(Dialect::Postgres),
        [
            "ALTER TABLE users DROP CONSTRAINT users_pkey, DROP CONSTRAINT users_email_unique, \
             DROP CONSTRAINT users_role_id_foreign;",
            "DROP INDEX users_name_index;",
        ]
    );
}

#[test]
fn test_alter_add_foreign_key() {
    let schema = Schema::alter(Dialect::Postgres, "users", |t| {
        t.integer("role_id");
        t.foreign_key(["role_id"]).references("id").on("roles");
        Ok(())
    })
    .expect("schema builds");

    assert_sql(
        &schema,
        "ALTER TABLE users ADD COLUMN role_id INTEGER NOT NULL,
         ADD CONSTRAINT users_role_id_foreign FOREIGN KEY (role_id) REFERENCES roles(id);",
    );
}

#[test]
fn test_duplicate_primary_key_is_rejected() {
    let result = Schema::create(Dialect::Mysql, "users", |t| {
        t.integer("id");
        t.primary_key(["id"])?;
        t.primary_key(["id"])
    });
    assert!(matches!(result, Err(SchemaError::DuplicatePrimaryKey { .. })));
}
