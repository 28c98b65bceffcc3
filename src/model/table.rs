//! Tables and their nested structure (columns, indexes, constraints).

use crate::model::lookup::Lookup;
use crate::normalize::{fold_ident, fold_type, signature, sorted_list, Canonical};
use serde::{Deserialize, Serialize};

/// Table representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub schema: String,
    /// Ordered by ordinal position
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Storage engine tag (e.g. InnoDB), when the engine has one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comment: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns,
            indexes: Vec::new(),
            constraints: Vec::new(),
            engine: None,
            comment: None,
        }
    }

    pub fn with_indexes(mut self, indexes: Vec<Index>) -> Self {
        self.indexes = indexes;
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Columns keyed by folded name
    pub fn column_map(&self) -> Lookup<'_, Column> {
        Lookup::by_name(&self.columns, |c| c.name.as_str())
    }

    /// Indexes keyed by canonical signature
    pub fn index_map(&self) -> Lookup<'_, Index> {
        Lookup::build(&self.indexes, Index::canonical_signature)
    }

    /// Constraints keyed by canonical signature
    pub fn constraint_map(&self) -> Lookup<'_, Constraint> {
        Lookup::build(&self.constraints, Constraint::canonical_signature)
    }
}

impl Canonical for Table {
    fn canonical_signature(&self) -> String {
        let mut cols: Vec<String> = self.columns.iter().map(Column::canonical_signature).collect();
        cols.sort();
        let mut fields = vec![fold_ident(&self.name)];
        fields.extend(cols);
        signature(fields)
    }
}

/// Column representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Declared type as reported by the engine
    pub data_type: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub scale: i32,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub is_auto_increment: bool,
    pub ordinal_position: i32,
}

impl Column {
    /// A nullable, non-key column with no size information
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal_position: i32) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
            size: 0,
            scale: 0,
            nullable: true,
            default_value: None,
            is_primary_key: false,
            is_foreign_key: false,
            is_auto_increment: false,
            ordinal_position,
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.is_foreign_key = true;
        self
    }

    /// Declared type for display, `UNKNOWN` when the engine reported none
    pub fn type_label(&self) -> &str {
        self.data_type.as_deref().unwrap_or("UNKNOWN")
    }

    pub fn folded_type(&self) -> String {
        fold_type(self.data_type.as_deref())
    }
}

impl Canonical for Column {
    fn canonical_signature(&self) -> String {
        signature([
            fold_ident(&self.name),
            self.folded_type(),
            self.size.to_string(),
            self.scale.to_string(),
            self.nullable.to_string(),
            self.is_primary_key.to_string(),
            self.is_foreign_key.to_string(),
        ])
    }
}

/// Index representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub table_name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    /// Access method (BTREE, HASH, SPATIAL, FULLTEXT, ...)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index_type: Option<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_unique: false,
            index_type: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

impl Canonical for Index {
    fn canonical_signature(&self) -> String {
        signature([
            fold_ident(&self.table_name),
            sorted_list(&self.columns),
            self.is_unique.to_string(),
            self.index_type
                .as_deref()
                .map(fold_ident)
                .unwrap_or_else(|| "BTREE".to_string()),
        ])
    }
}

/// Constraint kind. Referential data only exists for foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    #[serde(rename_all = "camelCase")]
    ForeignKey {
        referenced_table: String,
        referenced_columns: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        on_delete: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        on_update: Option<String>,
    },
    Unique,
    Check {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        expression: Option<String>,
    },
}

impl ConstraintKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY_KEY",
            ConstraintKind::ForeignKey { .. } => "FOREIGN_KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::Check { .. } => "CHECK",
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, ConstraintKind::ForeignKey { .. })
    }
}

/// Constraint representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub table_name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl Constraint {
    pub fn primary_key(name: impl Into<String>, table_name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            kind: ConstraintKind::PrimaryKey,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        table_name: impl Into<String>,
        columns: &[&str],
        referenced_table: impl Into<String>,
        referenced_columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            kind: ConstraintKind::ForeignKey {
                referenced_table: referenced_table.into(),
                referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
                on_delete: None,
                on_update: None,
            },
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn unique(name: impl Into<String>, table_name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            kind: ConstraintKind::Unique,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Canonical for Constraint {
    fn canonical_signature(&self) -> String {
        let (ref_table, ref_cols) = match &self.kind {
            ConstraintKind::ForeignKey {
                referenced_table,
                referenced_columns,
                ..
            } => (fold_ident(referenced_table), sorted_list(referenced_columns)),
            _ => (String::new(), String::new()),
        };

        signature([
            fold_ident(&self.table_name),
            self.kind.label().to_string(),
            sorted_list(&self.columns),
            ref_table,
            ref_cols,
        ])
    }
}
