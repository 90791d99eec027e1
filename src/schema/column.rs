//! Column definitions and column-level operations.

use super::data_type::{quote_literal, ColumnType, DataType};
use std::fmt;

/// What an ALTER does with a column. CREATE only uses `Add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOperation {
    Add,
    Drop,
    Alter,
    Rename,
}

/// A column default, rendered as a SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Quoted as a string literal.
    Str(String),
    /// Emitted verbatim, e.g. `CURRENT_TIMESTAMP`.
    Raw(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Null => f.write_str("NULL"),
            DefaultValue::Bool(true) => f.write_str("TRUE"),
            DefaultValue::Bool(false) => f.write_str("FALSE"),
            DefaultValue::Int(v) => write!(f, "{v}"),
            DefaultValue::Float(v) => write!(f, "{v}"),
            DefaultValue::Str(v) => f.write_str(&quote_literal(v)),
            DefaultValue::Raw(expr) => f.write_str(expr),
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(v: bool) -> Self {
        DefaultValue::Bool(v)
    }
}

impl From<i32> for DefaultValue {
    fn from(v: i32) -> Self {
        DefaultValue::Int(i64::from(v))
    }
}

impl From<i64> for DefaultValue {
    fn from(v: i64) -> Self {
        DefaultValue::Int(v)
    }
}

impl From<f64> for DefaultValue {
    fn from(v: f64) -> Self {
        DefaultValue::Float(v)
    }
}

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        DefaultValue::Str(v.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(v: String) -> Self {
        DefaultValue::Str(v)
    }
}

/// One column of a table, or one column-level step of an ALTER.
///
/// Modifiers return `&mut Self` so they chain off the table helpers:
///
/// ```
/// use tidemark::schema::Schema;
/// use tidemark::Dialect;
///
/// let schema = Schema::create(Dialect::Sqlite, "users", |t| {
///     t.string("email", 100).unique();
///     t.integer("age").nullable().default(18);
///     Ok(())
/// })?;
/// # Ok::<(), tidemark::schema::SchemaError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: Option<DataType>,
    nullable: bool,
    default: Option<DefaultValue>,
    unique: bool,
    primary: bool,
    old_name: Option<String>,
    operation: ColumnOperation,
}

impl Column {
    pub(crate) fn typed(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type: Some(data_type),
            nullable: false,
            default: None,
            unique: false,
            primary: false,
            old_name: None,
            operation: ColumnOperation::Add,
        }
    }

    pub(crate) fn dropped(name: &str) -> Self {
        Self {
            data_type: None,
            operation: ColumnOperation::Drop,
            ..Self::typed(name, DataType::new(ColumnType::Int))
        }
    }

    pub(crate) fn renamed(from: &str, to: &str) -> Self {
        Self {
            data_type: None,
            old_name: Some(from.to_string()),
            operation: ColumnOperation::Rename,
            ..Self::typed(to, DataType::new(ColumnType::Int))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    pub fn operation(&self) -> ColumnOperation {
        self.operation
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Whether the column is a database-generated identity.
    pub fn is_incrementing(&self) -> bool {
        self.data_type
            .as_ref()
            .is_some_and(|t| t.column_type().is_incrementing())
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn default(&mut self, value: impl Into<DefaultValue>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// Default to a raw SQL expression such as `CURRENT_TIMESTAMP`.
    pub fn default_raw(&mut self, expr: impl Into<String>) -> &mut Self {
        self.default = Some(DefaultValue::Raw(expr.into()));
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        if let Some(data_type) = self.data_type.as_mut() {
            data_type.set_unsigned();
        }
        self
    }

    pub fn length(&mut self, length: u32) -> &mut Self {
        if let Some(data_type) = self.data_type.as_mut() {
            data_type.set_length(length);
        }
        self
    }

    pub fn precision(&mut self, precision: u32) -> &mut Self {
        if let Some(data_type) = self.data_type.as_mut() {
            data_type.set_precision(precision);
        }
        self
    }

    pub fn scale(&mut self, scale: u32) -> &mut Self {
        if let Some(data_type) = self.data_type.as_mut() {
            data_type.set_scale(scale);
        }
        self
    }

    /// Turn an added column into a modification of an existing one.
    pub fn change(&mut self) -> &mut Self {
        if self.operation == ColumnOperation::Add {
            self.operation = ColumnOperation::Alter;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_literals() {
        assert_eq!(DefaultValue::from("it's").to_string(), "'it''s'");
        assert_eq!(DefaultValue::from(42).to_string(), "42");
        assert_eq!(DefaultValue::from(1.5).to_string(), "1.5");
        assert_eq!(DefaultValue::from(false).to_string(), "FALSE");
        assert_eq!(DefaultValue::Null.to_string(), "NULL");
        assert_eq!(
            DefaultValue::Raw("CURRENT_TIMESTAMP".into()).to_string(),
            "CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_change_only_applies_to_added_columns() {
        let mut added = Column::typed("name", DataType::new(ColumnType::Varchar));
        added.change();
        assert_eq!(added.operation(), ColumnOperation::Alter);

        let mut renamed = Column::renamed("username", "name");
        renamed.change();
        assert_eq!(renamed.operation(), ColumnOperation::Rename);
        assert_eq!(renamed.old_name(), Some("username"));
    }

    #[test]
    fn test_incrementing_follows_type() {
        let id = Column::typed("id", DataType::new(ColumnType::BigIncrements));
        assert!(id.is_incrementing());
        assert!(!Column::dropped("id").is_incrementing());
    }
}
