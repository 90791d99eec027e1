//! The table builder handed to `Schema::create` / `Schema::alter` closures.

use super::column::{Column, ColumnOperation};
use super::constraint::{Constraint, ConstraintKind, ConstraintOperation, ForeignKeyTarget};
use super::data_type::{ColumnType, DataType};
use super::error::SchemaError;
use crate::dialect::Dialect;

/// What the compiled statement does to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOperation {
    Create,
    Alter,
    Drop,
}

/// Ordered columns and constraints for one table.
///
/// Column and constraint order is preserved and decides emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    dialect: Dialect,
    operation: TableOperation,
    columns: Vec<Column>,
    constraints: Vec<Constraint>,
}

impl Table {
    pub(crate) fn new(name: &str, dialect: Dialect, operation: TableOperation) -> Self {
        Self {
            name: name.to_string(),
            dialect,
            operation,
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn operation(&self) -> TableOperation {
        self.operation
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Add a column of the given logical type.
    pub fn add_column(&mut self, name: &str, column_type: ColumnType) -> &mut Column {
        self.push_column(name, DataType::new(column_type))
    }

    /// Add a column from a logical type name such as `"mediumText"`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] when the name does not resolve.
    pub fn column(&mut self, name: &str, logical_type: &str) -> Result<&mut Column, SchemaError> {
        let data_type = DataType::resolve(logical_type)?;
        Ok(self.push_column(name, data_type))
    }

    fn push_column(&mut self, name: &str, mut data_type: DataType) -> &mut Column {
        data_type.set_dialect(self.dialect);
        data_type.set_column(name);
        self.columns.push(Column::typed(name, data_type));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    pub fn increments(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Increments)
    }

    pub fn big_increments(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::BigIncrements)
    }

    pub fn tiny_integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::TinyInt)
    }

    pub fn boolean(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Bool)
    }

    pub fn small_integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::SmallInt)
    }

    pub fn medium_integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::MediumInt)
    }

    pub fn integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Int)
    }

    pub fn big_integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::BigInt)
    }

    pub fn float(&mut self, name: &str, precision: u32, scale: u32) -> &mut Column {
        self.add_column(name, ColumnType::Float)
            .precision(precision)
            .scale(scale)
    }

    pub fn double(&mut self, name: &str, precision: u32, scale: u32) -> &mut Column {
        self.add_column(name, ColumnType::Double)
            .precision(precision)
            .scale(scale)
    }

    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> &mut Column {
        self.add_column(name, ColumnType::Decimal)
            .precision(precision)
            .scale(scale)
    }

    pub fn date(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::DateTime)
    }

    pub fn date_time_tz(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::DateTimeTz)
    }

    pub fn time(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Time)
    }

    /// A timestamp column; `precision` of 0 leaves the type unparameterized.
    pub fn timestamp(&mut self, name: &str, precision: u32) -> &mut Column {
        self.add_column(name, ColumnType::Timestamp).precision(precision)
    }

    pub fn timestamp_tz(&mut self, name: &str, precision: u32) -> &mut Column {
        self.add_column(name, ColumnType::TimestampTz)
            .precision(precision)
    }

    /// Nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at", 0).nullable();
        self.timestamp("updated_at", 0).nullable();
    }

    pub fn char(&mut self, name: &str, length: u32) -> &mut Column {
        self.add_column(name, ColumnType::Char).length(length)
    }

    /// A `VARCHAR(length)` column.
    pub fn string(&mut self, name: &str, length: u32) -> &mut Column {
        self.add_column(name, ColumnType::Varchar).length(length)
    }

    pub fn text(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Text)
    }

    pub fn tiny_text(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::TinyText)
    }

    pub fn medium_text(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::MediumText)
    }

    pub fn long_text(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::LongText)
    }

    pub fn binary(&mut self, name: &str, length: u32) -> &mut Column {
        self.add_column(name, ColumnType::Binary).length(length)
    }

    pub fn var_binary(&mut self, name: &str, length: u32) -> &mut Column {
        self.add_column(name, ColumnType::VarBinary).length(length)
    }

    pub fn blob(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Blob)
    }

    pub fn tiny_blob(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::TinyBlob)
    }

    pub fn medium_blob(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::MediumBlob)
    }

    pub fn long_blob(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::LongBlob)
    }

    /// An enumerated column: native `ENUM` on MySQL, `TEXT` plus CHECK elsewhere.
    pub fn enumeration<I, S>(&mut self, name: &str, values: I) -> &mut Column
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data_type = DataType::new(ColumnType::Enum).with_enum_values(values);
        self.push_column(name, data_type)
    }

    pub fn set<I, S>(&mut self, name: &str, values: I) -> &mut Column
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data_type = DataType::new(ColumnType::Set).with_enum_values(values);
        self.push_column(name, data_type)
    }

    pub fn uuid(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Uuid)
    }

    pub fn json(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Json)
    }

    pub fn drop_column(&mut self, name: &str) -> &mut Column {
        self.columns.push(Column::dropped(name));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Column {
        self.columns.push(Column::renamed(from, to));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Add a table-level primary key over `columns`.
    ///
    /// # Errors
    ///
    /// Fails if a primary key drop is pending on this table, or if a primary
    /// key has already been added as a constraint or on a column. On SQLite a
    /// primary incrementing column may coexist with the constraint, which is
    /// then folded into it at compile time.
    pub fn primary_key<I, S>(&mut self, columns: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.has_primary_key(ConstraintOperation::Drop) {
            return Err(SchemaError::PrimaryKeyDropPending {
                table: self.name.clone(),
            });
        }
        if self.has_primary_key(ConstraintOperation::Add) || self.has_primary_column() {
            return Err(SchemaError::DuplicatePrimaryKey {
                table: self.name.clone(),
            });
        }
        let columns = self.column_list(columns)?;
        self.constraints
            .push(Constraint::add(&self.name, ConstraintKind::PrimaryKey, columns));
        Ok(())
    }

    /// Drop the table's primary key (`<table>_pkey`).
    ///
    /// # Errors
    ///
    /// Fails if a primary key add is pending on this table.
    pub fn drop_primary_key(&mut self) -> Result<(), SchemaError> {
        if self.has_primary_key(ConstraintOperation::Add) {
            return Err(SchemaError::PrimaryKeyAddPending {
                table: self.name.clone(),
            });
        }
        if !self.has_primary_key(ConstraintOperation::Drop) {
            let name = format!("{}_pkey", self.name);
            self.constraints
                .push(Constraint::drop(name, ConstraintKind::PrimaryKey));
        }
        Ok(())
    }

    /// Add a unique constraint named `<table>_<cols>_unique`.
    ///
    /// # Errors
    ///
    /// Fails when `columns` is empty.
    pub fn unique<I, S>(&mut self, columns: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = self.column_list(columns)?;
        self.constraints
            .push(Constraint::add(&self.name, ConstraintKind::Unique, columns));
        Ok(())
    }

    pub fn drop_unique(&mut self, name: &str) {
        self.constraints
            .push(Constraint::drop(name, ConstraintKind::Unique));
    }

    /// Add an index named `<table>_<cols>_index`.
    ///
    /// # Errors
    ///
    /// Fails when `columns` is empty.
    pub fn index<I, S>(&mut self, columns: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = self.column_list(columns)?;
        self.constraints
            .push(Constraint::add(&self.name, ConstraintKind::Index, columns));
        Ok(())
    }

    pub fn drop_index(&mut self, name: &str) {
        self.constraints
            .push(Constraint::drop(name, ConstraintKind::Index));
    }

    /// Start a foreign key over `columns`; finish it with
    /// [`Constraint::references`] and [`Constraint::on`].
    pub fn foreign_key<I, S>(&mut self, columns: I) -> &mut Constraint
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.constraints.push(Constraint::add(
            &self.name,
            ConstraintKind::ForeignKey(ForeignKeyTarget::default()),
            columns,
        ));
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    pub fn drop_foreign_key(&mut self, name: &str) {
        self.constraints.push(Constraint::drop(
            name,
            ConstraintKind::ForeignKey(ForeignKeyTarget::default()),
        ));
    }

    fn has_primary_key(&self, operation: ConstraintOperation) -> bool {
        self.constraints
            .iter()
            .any(|c| c.is_primary_key() && c.operation() == operation)
    }

    /// A column added with `.primary()`, other than an incrementing one on SQLite.
    fn has_primary_column(&self) -> bool {
        self.columns.iter().any(|c| {
            c.operation() == ColumnOperation::Add
                && c.is_primary()
                && !(self.dialect == Dialect::Sqlite && c.is_incrementing())
        })
    }

    fn column_list<I, S>(&self, columns: I) -> Result<Vec<String>, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(SchemaError::EmptyColumnList {
                table: self.name.clone(),
            });
        }
        Ok(columns)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code - expect is acceptable
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new("users", Dialect::Mysql, TableOperation::Alter)
    }

    #[test]
    fn test_primary_key_conflicts() {
        let mut t = table();
        t.drop_primary_key().expect("first drop is allowed");
        assert_eq!(
            t.primary_key(["id"]),
            Err(SchemaError::PrimaryKeyDropPending {
                table: "users".to_string()
            })
        );

        let mut t = table();
        t.primary_key(["id"]).expect("first add is allowed");
        assert_eq!(
            t.drop_primary_key(),
            Err(SchemaError::PrimaryKeyAddPending {
                table: "users".to_string()
            })
        );
        assert_eq!(
            t.primary_key(["email"]),
            Err(SchemaError::DuplicatePrimaryKey {
                table: "users".to_string()
            })
        );
    }

    #[test]
    fn test_primary_column_conflicts_with_table_key() {
        let mut t = Table::new("users", Dialect::Postgres, TableOperation::Create);
        t.integer("id").primary();
        assert_eq!(
            t.primary_key(["id"]),
            Err(SchemaError::DuplicatePrimaryKey {
                table: "users".to_string()
            })
        );

        // SQLite folds the constraint into a primary incrementing column.
        let mut t = Table::new("users", Dialect::Sqlite, TableOperation::Create);
        t.increments("id").primary();
        assert!(t.primary_key(["id"]).is_ok());
    }

    #[test]
    fn test_columns_bind_dialect_and_name() {
        let mut t = table();
        t.string("email", 100);
        let data_type = t.columns()[0].data_type().expect("typed column");
        let rendered = data_type.render().expect("bound type renders");
        assert_eq!(rendered.fragment, "VARCHAR(100)");
    }

    #[test]
    fn test_column_by_logical_name() {
        let mut t = table();
        assert!(t.column("bio", "mediumText").is_ok());
        assert_eq!(
            t.column("bio", "jsonb").map(|_| ()),
            Err(SchemaError::UnknownType("jsonb".to_string()))
        );
    }

    #[test]
    fn test_empty_constraint_columns_rejected() {
        let mut t = table();
        let none: [&str; 0] = [];
        assert!(matches!(
            t.unique(none),
            Err(SchemaError::EmptyColumnList { .. })
        ));
    }

    #[test]
    fn test_timestamps_are_nullable() {
        let mut t = table();
        t.timestamps();
        let names: Vec<_> = t.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["created_at", "updated_at"]);
        assert!(t.columns().iter().all(|c| c.is_nullable()));
    }
}
