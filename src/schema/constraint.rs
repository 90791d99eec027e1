//! Table-level constraints: primary keys, unique keys, indexes and foreign keys.

/// Whether a constraint is being introduced or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOperation {
    Add,
    Drop,
}

/// Target of a foreign key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub column: String,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Index,
    ForeignKey(ForeignKeyTarget),
}

impl ConstraintKind {
    fn name_suffix(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "pkey",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Index => "index",
            ConstraintKind::ForeignKey(_) => "foreign",
        }
    }
}

/// A named table-level rule.
///
/// Foreign keys are completed through the chaining setters:
///
/// ```
/// use tidemark::schema::Schema;
/// use tidemark::Dialect;
///
/// let schema = Schema::create(Dialect::Postgres, "posts", |t| {
///     t.increments("id").primary();
///     t.integer("author_id");
///     t.foreign_key(["author_id"])
///         .references("id")
///         .on("users")
///         .on_delete("CASCADE");
///     Ok(())
/// })?;
/// assert!(schema.build()?.contains("REFERENCES users(id) ON DELETE CASCADE"));
/// # Ok::<(), tidemark::schema::SchemaError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    name: String,
    kind: ConstraintKind,
    columns: Vec<String>,
    operation: ConstraintOperation,
}

impl Constraint {
    /// Build an `add` constraint with a synthesized name.
    pub(crate) fn add(table: &str, kind: ConstraintKind, columns: Vec<String>) -> Self {
        let name = synthesize_name(table, &kind, &columns);
        Self {
            name,
            kind,
            columns,
            operation: ConstraintOperation::Add,
        }
    }

    /// Build a `drop` constraint referring to an existing name.
    pub(crate) fn drop(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: Vec::new(),
            operation: ConstraintOperation::Drop,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn operation(&self) -> ConstraintOperation {
        self.operation
    }

    pub fn is_primary_key(&self) -> bool {
        self.kind == ConstraintKind::PrimaryKey
    }

    /// Referenced column of a foreign key. No effect on other kinds.
    pub fn references(&mut self, column: impl Into<String>) -> &mut Self {
        if let ConstraintKind::ForeignKey(target) = &mut self.kind {
            target.column = column.into();
        }
        self
    }

    /// Referenced table of a foreign key.
    pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
        if let ConstraintKind::ForeignKey(target) = &mut self.kind {
            target.table = table.into();
        }
        self
    }

    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        if let ConstraintKind::ForeignKey(target) = &mut self.kind {
            target.on_delete = Some(action.into());
        }
        self
    }

    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        if let ConstraintKind::ForeignKey(target) = &mut self.kind {
            target.on_update = Some(action.into());
        }
        self
    }

    /// Copy of this constraint re-kinded as UNIQUE, keeping columns and order.
    pub(crate) fn demoted_to_unique(&self, table: &str) -> Self {
        Self::add(table, ConstraintKind::Unique, self.columns.clone())
    }
}

/// `<table>_pkey` for primary keys, `<table>_<col>[_<col>...]_<kind>` otherwise.
pub(crate) fn synthesize_name(table: &str, kind: &ConstraintKind, columns: &[String]) -> String {
    match kind {
        ConstraintKind::PrimaryKey => format!("{table}_pkey"),
        _ => format!("{table}_{}_{}", columns.join("_"), kind.name_suffix()),
    }
}
