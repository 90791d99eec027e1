//! DataTypeResolver: logical column types and their per-dialect rendering.
//!
//! A [`DataType`] pairs a logical [`ColumnType`] with its refinements (length,
//! precision, scale, enum values, unsigned). Rendering produces the type
//! fragment placed after the column name plus an optional suffix clause used
//! to emulate features a dialect lacks, such as `CHECK (id > 0)` for unsigned
//! integers on PostgreSQL.

use super::error::SchemaError;
use crate::dialect::Dialect;
use std::fmt;
use std::str::FromStr;

/// Logical, dialect-neutral column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Increments,
    BigIncrements,
    TinyInt,
    Bool,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    Timestamp,
    TimestampTz,
    Char,
    Varchar,
    Text,
    TinyText,
    MediumText,
    LongText,
    Binary,
    VarBinary,
    Blob,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Enum,
    Set,
    Uuid,
    Json,
}

impl ColumnType {
    /// SQL type name for `dialect`, without refinements.
    pub fn sql_name(self, dialect: Dialect) -> &'static str {
        use ColumnType::*;
        use Dialect::*;

        match (self, dialect) {
            (Increments, Sqlite) => "INTEGER",
            (Increments, Mysql) => "INT",
            (Increments, Postgres) => "SERIAL",
            (BigIncrements, Sqlite) => "INTEGER",
            (BigIncrements, Mysql) => "BIGINT",
            (BigIncrements, Postgres) => "BIGSERIAL",
            (TinyInt, Postgres) => "SMALLINT",
            (TinyInt, _) => "TINYINT",
            (Bool, _) => "BOOLEAN",
            (SmallInt, _) => "SMALLINT",
            (MediumInt, Postgres) => "INTEGER",
            (MediumInt, _) => "MEDIUMINT",
            (Int, Mysql) => "INT",
            (Int, _) => "INTEGER",
            (BigInt, _) => "BIGINT",
            (Float, _) => "FLOAT",
            (Double, Postgres) => "DOUBLE PRECISION",
            (Double, _) => "DOUBLE",
            (Decimal, _) => "DECIMAL",
            (Date, _) => "DATE",
            (DateTime, Postgres) => "TIMESTAMP",
            (DateTime, _) => "DATETIME",
            (DateTimeTz, Postgres) => "TIMESTAMP WITH TIME ZONE",
            (DateTimeTz, _) => "DATETIME",
            (Time, _) => "TIME",
            (Timestamp, _) => "TIMESTAMP",
            (TimestampTz, Postgres) => "TIMESTAMP WITH TIME ZONE",
            (TimestampTz, _) => "TIMESTAMP",
            (Char, _) => "CHAR",
            (Varchar, _) => "VARCHAR",
            (Text, _) => "TEXT",
            (TinyText, Postgres) | (MediumText, Postgres) | (LongText, Postgres) => "TEXT",
            (TinyText, _) => "TINYTEXT",
            (MediumText, _) => "MEDIUMTEXT",
            (LongText, _) => "LONGTEXT",
            (Binary, Postgres) | (VarBinary, Postgres) => "BYTEA",
            (Binary, _) => "BINARY",
            (VarBinary, _) => "VARBINARY",
            (Blob, Postgres) | (TinyBlob, Postgres) | (MediumBlob, Postgres)
            | (LongBlob, Postgres) => "BYTEA",
            (Blob, _) => "BLOB",
            (TinyBlob, _) => "TINYBLOB",
            (MediumBlob, _) => "MEDIUMBLOB",
            (LongBlob, _) => "LONGBLOB",
            (Enum, Mysql) => "ENUM",
            (Set, Mysql) => "SET",
            (Enum, _) | (Set, _) => "TEXT",
            (Uuid, Sqlite) => "TEXT",
            (Uuid, Mysql) => "CHAR(36)",
            (Uuid, Postgres) => "UUID",
            (Json, Sqlite) => "TEXT",
            (Json, Mysql) => "JSON",
            (Json, Postgres) => "JSONB",
        }
    }

    /// Logical name, as accepted by [`ColumnType::from_str`].
    pub fn logical_name(self) -> &'static str {
        use ColumnType::*;

        match self {
            Increments => "increments",
            BigIncrements => "bigIncrements",
            TinyInt => "tinyInt",
            Bool => "bool",
            SmallInt => "smallInt",
            MediumInt => "mediumInt",
            Int => "int",
            BigInt => "bigInt",
            Float => "float",
            Double => "double",
            Decimal => "decimal",
            Date => "date",
            DateTime => "dateTime",
            DateTimeTz => "dateTimeTz",
            Time => "time",
            Timestamp => "timestamp",
            TimestampTz => "timestampTz",
            Char => "char",
            Varchar => "varchar",
            Text => "text",
            TinyText => "tinyText",
            MediumText => "mediumText",
            LongText => "longText",
            Binary => "binary",
            VarBinary => "varBinary",
            Blob => "blob",
            TinyBlob => "tinyBlob",
            MediumBlob => "mediumBlob",
            LongBlob => "longBlob",
            Enum => "enum",
            Set => "set",
            Uuid => "uuid",
            Json => "json",
        }
    }

    /// Whether values are generated by the database (identity column).
    pub fn is_incrementing(self) -> bool {
        matches!(self, ColumnType::Increments | ColumnType::BigIncrements)
    }

    /// Whether the type is an integer that may carry the unsigned flag.
    pub fn is_integer(self) -> bool {
        use ColumnType::*;
        matches!(
            self,
            Increments | BigIncrements | TinyInt | SmallInt | MediumInt | Int | BigInt
        )
    }

    fn is_enumerated(self) -> bool {
        matches!(self, ColumnType::Enum | ColumnType::Set)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

impl FromStr for ColumnType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ColumnType::*;

        let ty = match s {
            "increments" => Increments,
            "bigIncrements" => BigIncrements,
            "tinyInt" => TinyInt,
            "bool" | "boolean" => Bool,
            "smallInt" => SmallInt,
            "mediumInt" => MediumInt,
            "int" | "integer" => Int,
            "bigInt" => BigInt,
            "float" => Float,
            "double" => Double,
            "decimal" => Decimal,
            "date" => Date,
            "dateTime" => DateTime,
            "dateTimeTz" => DateTimeTz,
            "time" => Time,
            "timestamp" => Timestamp,
            "timestampTz" => TimestampTz,
            "char" => Char,
            "varchar" | "string" => Varchar,
            "text" => Text,
            "tinyText" => TinyText,
            "mediumText" => MediumText,
            "longText" => LongText,
            "binary" => Binary,
            "varBinary" => VarBinary,
            "blob" => Blob,
            "tinyBlob" => TinyBlob,
            "mediumBlob" => MediumBlob,
            "longBlob" => LongBlob,
            "enum" => Enum,
            "set" => Set,
            "uuid" => Uuid,
            "json" => Json,
            other => return Err(SchemaError::UnknownType(other.to_string())),
        };
        Ok(ty)
    }
}

/// The rendered form of a [`DataType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedType {
    /// Type text placed right after the column name, e.g. `DECIMAL(8,2)`.
    pub fragment: String,
    /// Trailing clause appended after every other column modifier.
    pub suffix: Option<String>,
}

/// A column type bound to a dialect and column, plus its refinements.
///
/// Refinement setters may be called in any order. When several are set the
/// parenthesized part is chosen by precedence: enum values (MySQL only), then
/// length, then precision with scale, then precision, then scale.
///
/// ```
/// use tidemark::schema::{ColumnType, DataType};
/// use tidemark::Dialect;
///
/// let rendered = DataType::new(ColumnType::Int)
///     .with_dialect(Dialect::Postgres)
///     .with_column("age")
///     .unsigned()
///     .render()?;
/// assert_eq!(rendered.fragment, "INTEGER");
/// assert_eq!(rendered.suffix.as_deref(), Some("CHECK (age > 0)"));
/// # Ok::<(), tidemark::schema::SchemaError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    column_type: ColumnType,
    dialect: Option<Dialect>,
    column: Option<String>,
    unsigned: bool,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    enum_values: Vec<String>,
}

impl DataType {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            dialect: None,
            column: None,
            unsigned: column_type.is_incrementing(),
            length: None,
            precision: None,
            scale: None,
            enum_values: Vec::new(),
        }
    }

    /// Resolve a logical type name such as `"bigIncrements"` or `"decimal"`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] if the name is not a known logical type.
    pub fn resolve(name: &str) -> Result<Self, SchemaError> {
        name.parse::<ColumnType>().map(Self::new)
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length).filter(|l| *l > 0);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision).filter(|p| *p > 0);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale).filter(|s| *s > 0);
        self
    }

    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark an integer type unsigned. Ignored for non-integer types.
    pub fn unsigned(mut self) -> Self {
        self.unsigned = self.column_type.is_integer();
        self
    }

    pub(crate) fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = Some(dialect);
    }

    pub(crate) fn set_column(&mut self, column: &str) {
        self.column = Some(column.to_string());
    }

    pub(crate) fn set_length(&mut self, length: u32) {
        self.length = Some(length).filter(|l| *l > 0);
    }

    pub(crate) fn set_precision(&mut self, precision: u32) {
        self.precision = Some(precision).filter(|p| *p > 0);
    }

    pub(crate) fn set_scale(&mut self, scale: u32) {
        self.scale = Some(scale).filter(|s| *s > 0);
    }

    pub(crate) fn set_unsigned(&mut self) {
        self.unsigned = self.column_type.is_integer();
    }

    /// Render the type fragment and suffix clause.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DialectNotSet`] or [`SchemaError::ColumnNameNotSet`]
    /// when the type has not been bound to a dialect and a column.
    pub fn render(&self) -> Result<RenderedType, SchemaError> {
        let type_name = self.column_type.logical_name().to_string();
        let dialect = self.dialect.ok_or_else(|| SchemaError::DialectNotSet {
            type_name: type_name.clone(),
        })?;
        let column = self
            .column
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(SchemaError::ColumnNameNotSet { type_name })?;

        let mut fragment = self.column_type.sql_name(dialect).to_string();
        if let Some(params) = self.parenthesized(dialect) {
            fragment.push_str(&params);
        }
        if self.unsigned && dialect == Dialect::Mysql {
            fragment.push_str(" UNSIGNED");
        }

        Ok(RenderedType {
            fragment,
            suffix: self.suffix(dialect, column),
        })
    }

    fn parenthesized(&self, dialect: Dialect) -> Option<String> {
        if self.column_type.is_enumerated() {
            // Only MySQL has a native list type; elsewhere the list becomes a CHECK.
            return match dialect {
                Dialect::Mysql if !self.enum_values.is_empty() => {
                    Some(format!("({})", quote_list(&self.enum_values)))
                }
                _ => None,
            };
        }
        match (self.length, self.precision, self.scale) {
            (Some(length), _, _) => Some(format!("({length})")),
            (None, Some(precision), Some(scale)) => Some(format!("({precision},{scale})")),
            (None, Some(precision), None) => Some(format!("({precision})")),
            (None, None, Some(scale)) => Some(format!("({scale})")),
            (None, None, None) => None,
        }
    }

    fn suffix(&self, dialect: Dialect, column: &str) -> Option<String> {
        match dialect {
            Dialect::Postgres if self.unsigned => Some(format!("CHECK ({column} > 0)")),
            Dialect::Sqlite | Dialect::Postgres
                if self.column_type.is_enumerated() && !self.enum_values.is_empty() =>
            {
                Some(format!(
                    "CHECK ({column} IN ({}))",
                    quote_list(&self.enum_values)
                ))
            }
            _ => None,
        }
    }
}

/// Quote a string literal, doubling embedded single quotes.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(", ")
}
