//! Renders a [`Table`] into dialect-specific DDL statements.
//!
//! Compilation is pure: the table is only read, so compiling the same table
//! twice yields the same statements.

use super::column::{Column, ColumnOperation};
use super::constraint::{Constraint, ConstraintKind, ConstraintOperation, ForeignKeyTarget};
use super::error::SchemaError;
use super::table::{Table, TableOperation};
use crate::dialect::Dialect;

/// Compile `table` into one or more statements, each terminated with `;`.
pub(crate) fn compile(table: &Table) -> Result<Vec<String>, SchemaError> {
    match table.operation() {
        TableOperation::Create => compile_create(table),
        TableOperation::Alter => compile_alter(table),
        TableOperation::Drop => Ok(vec![format!("DROP TABLE {};", table.name())]),
    }
}

fn compile_create(table: &Table) -> Result<Vec<String>, SchemaError> {
    let dialect = table.dialect();
    let keys = resolve_keys(table);
    check_single_primary_key(table, &keys)?;

    let mut definitions = Vec::with_capacity(table.columns().len() + keys.constraints.len());
    for column in table.columns() {
        if column.operation() != ColumnOperation::Add {
            log::warn!(
                "ignoring {:?} of column '{}' in CREATE TABLE {}",
                column.operation(),
                column.name(),
                table.name()
            );
            continue;
        }
        let force_primary = keys.promoted.as_deref() == Some(column.name());
        definitions.push(column_definition(dialect, column, force_primary)?);
    }

    let mut trailing = Vec::new();
    for constraint in &keys.constraints {
        if constraint.operation() == ConstraintOperation::Drop {
            log::warn!(
                "ignoring drop of constraint '{}' in CREATE TABLE {}",
                constraint.name(),
                table.name()
            );
            continue;
        }
        match constraint.kind() {
            ConstraintKind::PrimaryKey => {
                definitions.push(format!("PRIMARY KEY ({})", constraint.columns().join(", ")));
            }
            ConstraintKind::Unique => definitions.push(unique_fragment(dialect, constraint)),
            ConstraintKind::ForeignKey(target) => {
                definitions.push(foreign_key_fragment(constraint, target)?);
            }
            ConstraintKind::Index => trailing.push(create_index(table.name(), constraint)),
        }
    }

    let mut statements = Vec::with_capacity(1 + trailing.len());
    statements.push(format!(
        "CREATE TABLE {} ({});",
        table.name(),
        definitions.join(", ")
    ));
    statements.extend(trailing);
    Ok(statements)
}

fn compile_alter(table: &Table) -> Result<Vec<String>, SchemaError> {
    let dialect = table.dialect();
    let mut clauses = Vec::new();
    let mut standalone = Vec::new();

    for column in table.columns() {
        let clause = match column.operation() {
            ColumnOperation::Add => {
                format!("ADD COLUMN {}", column_definition(dialect, column, false)?)
            }
            ColumnOperation::Drop => format!("DROP COLUMN {}", column.name()),
            ColumnOperation::Alter => match dialect {
                Dialect::Mysql => {
                    format!("MODIFY COLUMN {}", column_definition(dialect, column, false)?)
                }
                Dialect::Sqlite => {
                    format!("ALTER COLUMN {}", column_definition(dialect, column, false)?)
                }
                Dialect::Postgres => postgres_alter_column(column)?,
            },
            ColumnOperation::Rename => format!(
                "RENAME COLUMN {} TO {}",
                column.old_name().unwrap_or_default(),
                column.name()
            ),
        };
        clauses.push(clause);
    }

    for constraint in table.constraints() {
        let name = constraint.name();
        match (constraint.kind(), constraint.operation()) {
            (ConstraintKind::PrimaryKey, ConstraintOperation::Add) => clauses.push(format!(
                "ADD CONSTRAINT {name} PRIMARY KEY ({})",
                constraint.columns().join(", ")
            )),
            (ConstraintKind::PrimaryKey, ConstraintOperation::Drop) => match dialect {
                Dialect::Mysql => clauses.push("DROP PRIMARY KEY".to_string()),
                Dialect::Sqlite | Dialect::Postgres => {
                    clauses.push(format!("DROP CONSTRAINT {name}"))
                }
            },
            (ConstraintKind::Unique, ConstraintOperation::Add) => clauses.push(format!(
                "ADD CONSTRAINT {name} UNIQUE ({})",
                constraint.columns().join(", ")
            )),
            (ConstraintKind::Unique, ConstraintOperation::Drop) => {
                clauses.push(format!("DROP CONSTRAINT {name}"))
            }
            (ConstraintKind::Index, ConstraintOperation::Add) => {
                standalone.push(create_index(table.name(), constraint))
            }
            (ConstraintKind::Index, ConstraintOperation::Drop) => match dialect {
                Dialect::Mysql => clauses.push(format!("DROP INDEX {name}")),
                Dialect::Sqlite | Dialect::Postgres => {
                    standalone.push(format!("DROP INDEX {name};"))
                }
            },
            (ConstraintKind::ForeignKey(target), ConstraintOperation::Add) => clauses.push(
                format!("ADD CONSTRAINT {name} {}", foreign_key_fragment(constraint, target)?),
            ),
            (ConstraintKind::ForeignKey(_), ConstraintOperation::Drop) => match dialect {
                Dialect::Mysql => clauses.push(format!("DROP FOREIGN KEY {name}")),
                Dialect::Sqlite | Dialect::Postgres => {
                    clauses.push(format!("DROP CONSTRAINT {name}"))
                }
            },
        }
    }

    let mut statements = Vec::new();
    match dialect {
        // SQLite takes a single alteration per ALTER TABLE.
        Dialect::Sqlite => statements.extend(
            clauses
                .iter()
                .map(|clause| format!("ALTER TABLE {} {clause};", table.name())),
        ),
        Dialect::Mysql | Dialect::Postgres if !clauses.is_empty() => {
            statements.push(format!("ALTER TABLE {} {};", table.name(), clauses.join(", ")))
        }
        Dialect::Mysql | Dialect::Postgres => {}
    }
    statements.extend(standalone);
    Ok(statements)
}

/// `<name> <type> [NOT NULL] [DEFAULT x] [UNIQUE] [PRIMARY KEY] [increment] [suffix]`
fn column_definition(
    dialect: Dialect,
    column: &Column,
    force_primary: bool,
) -> Result<String, SchemaError> {
    let data_type = column.data_type().ok_or_else(|| SchemaError::MissingDataType {
        column: column.name().to_string(),
    })?;
    let rendered = data_type.render()?;

    let mut definition = format!("{} {}", column.name(), rendered.fragment);
    if !column.is_nullable() {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = column.default_value() {
        definition.push_str(&format!(" DEFAULT {default}"));
    }
    if column.is_unique() {
        definition.push_str(" UNIQUE");
    }
    if column.is_primary() || force_primary {
        definition.push_str(" PRIMARY KEY");
    }
    if column.is_incrementing() {
        match dialect {
            Dialect::Sqlite => definition.push_str(" AUTOINCREMENT"),
            Dialect::Mysql => definition.push_str(" AUTO_INCREMENT"),
            // SERIAL / BIGSERIAL already carry the sequence.
            Dialect::Postgres => {}
        }
    }
    if let Some(suffix) = rendered.suffix {
        definition.push(' ');
        definition.push_str(&suffix);
    }
    Ok(definition)
}

/// PostgreSQL changes type, nullability and default in separate subclauses.
fn postgres_alter_column(column: &Column) -> Result<String, SchemaError> {
    let data_type = column.data_type().ok_or_else(|| SchemaError::MissingDataType {
        column: column.name().to_string(),
    })?;
    let rendered = data_type.render()?;
    let name = column.name();

    let mut clauses = vec![format!("ALTER COLUMN {name} TYPE {}", rendered.fragment)];
    clauses.push(if column.is_nullable() {
        format!("ALTER COLUMN {name} DROP NOT NULL")
    } else {
        format!("ALTER COLUMN {name} SET NOT NULL")
    });
    if let Some(default) = column.default_value() {
        clauses.push(format!("ALTER COLUMN {name} SET DEFAULT {default}"));
    }
    if column.is_unique() || column.is_primary() || rendered.suffix.is_some() {
        log::warn!("postgres: only type, nullability and default of '{name}' are changed");
    }
    Ok(clauses.join(", "))
}

fn unique_fragment(dialect: Dialect, constraint: &Constraint) -> String {
    let columns = constraint.columns().join(", ");
    match dialect {
        Dialect::Mysql => format!("UNIQUE {} ({columns})", constraint.name()),
        Dialect::Sqlite | Dialect::Postgres => format!("UNIQUE ({columns})"),
    }
}

fn foreign_key_fragment(
    constraint: &Constraint,
    target: &ForeignKeyTarget,
) -> Result<String, SchemaError> {
    if target.table.is_empty() || target.column.is_empty() {
        return Err(SchemaError::IncompleteForeignKey {
            name: constraint.name().to_string(),
        });
    }
    let mut fragment = format!(
        "FOREIGN KEY ({}) REFERENCES {}({})",
        constraint.columns().join(", "),
        target.table,
        target.column
    );
    if let Some(action) = &target.on_delete {
        fragment.push_str(&format!(" ON DELETE {action}"));
    }
    if let Some(action) = &target.on_update {
        fragment.push_str(&format!(" ON UPDATE {action}"));
    }
    Ok(fragment)
}

fn create_index(table: &str, constraint: &Constraint) -> String {
    format!(
        "CREATE INDEX {} ON {table} ({});",
        constraint.name(),
        constraint.columns().join(", ")
    )
}

/// Constraints to emit for a CREATE, after the SQLite key rewrite.
struct ResolvedKeys {
    constraints: Vec<Constraint>,
    /// Incrementing column that must carry `PRIMARY KEY` itself.
    promoted: Option<String>,
}

/// Decide which column or constraint carries the primary key of a CREATE.
///
/// SQLite and MySQL only accept an auto-incrementing column that is a key, so
/// a lone incrementing column with no primary key anywhere is promoted. On
/// SQLite a table-level primary key next to an incrementing column is folded
/// into it: a key on exactly that column is absorbed, any other key becomes
/// UNIQUE.
fn resolve_keys(table: &Table) -> ResolvedKeys {
    let untouched = || ResolvedKeys {
        constraints: table.constraints().to_vec(),
        promoted: None,
    };
    let dialect = table.dialect();
    if dialect == Dialect::Postgres {
        return untouched();
    }
    let Some(incrementing) = table
        .columns()
        .iter()
        .find(|c| c.operation() == ColumnOperation::Add && c.is_incrementing())
    else {
        return untouched();
    };
    let has_primary_key = table
        .constraints()
        .iter()
        .any(|c| c.is_primary_key() && c.operation() == ConstraintOperation::Add);

    if !has_primary_key {
        let has_primary_column = table
            .columns()
            .iter()
            .any(|c| c.operation() == ColumnOperation::Add && c.is_primary());
        if has_primary_column {
            return untouched();
        }
        log::info!(
            "{dialect}: incrementing column '{}' becomes the primary key of {}",
            incrementing.name(),
            table.name()
        );
        return ResolvedKeys {
            constraints: table.constraints().to_vec(),
            promoted: Some(incrementing.name().to_string()),
        };
    }
    if dialect != Dialect::Sqlite {
        return untouched();
    }

    let mut constraints = Vec::with_capacity(table.constraints().len());
    for constraint in table.constraints() {
        if !constraint.is_primary_key() || constraint.operation() != ConstraintOperation::Add {
            constraints.push(constraint.clone());
            continue;
        }
        if constraint.columns() == [incrementing.name()] {
            log::info!(
                "sqlite: primary key on {} is carried by incrementing column '{}'",
                table.name(),
                incrementing.name()
            );
        } else {
            log::warn!(
                "sqlite: demoting primary key ({}) on {} to UNIQUE; '{}' becomes the primary key",
                constraint.columns().join(", "),
                table.name(),
                incrementing.name()
            );
            constraints.push(constraint.demoted_to_unique(table.name()));
        }
    }

    ResolvedKeys {
        constraints,
        promoted: Some(incrementing.name().to_string()),
    }
}

/// A CREATE may declare its primary key once: on one column or as one constraint.
fn check_single_primary_key(table: &Table, keys: &ResolvedKeys) -> Result<(), SchemaError> {
    let columns = table
        .columns()
        .iter()
        .filter(|c| c.operation() == ColumnOperation::Add)
        .filter(|c| c.is_primary() || keys.promoted.as_deref() == Some(c.name()))
        .count();
    let constraints = keys
        .constraints
        .iter()
        .filter(|c| c.is_primary_key() && c.operation() == ConstraintOperation::Add)
        .count();
    if columns + constraints > 1 {
        return Err(SchemaError::DuplicatePrimaryKey {
            table: table.name().to_string(),
        });
    }
    Ok(())
}
