//! Table assembly shared by every dialect.
//!
//! Each dialect supplies four catalog queries that alias their output columns
//! to one common vocabulary; rows are then grouped into [`Table`] values here.
//!
//! | query | columns |
//! |---|---|
//! | tables | `table_name`, `table_comment`, `storage_engine` |
//! | columns | `table_name`, `column_name`, `data_type`, `column_size`, `numeric_scale`, `is_nullable`, `column_default`, `ordinal_position`, `is_auto_increment` |
//! | constraints | `table_name`, `constraint_name`, `constraint_type`, `column_name`, `referenced_table`, `referenced_column`, `delete_rule`, `update_rule`, `check_clause` |
//! | indexes | `table_name`, `index_name`, `column_name`, `is_unique`, `index_type` |
//!
//! Every query takes the schema name as its single parameter.

use crate::capture::{CatalogClient, CatalogRow};
use crate::error::AppError;
use crate::model::{Column, Constraint, ConstraintKind, Index, Table};
use tracing::debug;

/// The four catalog queries a dialect provides for table extraction
pub struct TableQueries {
    pub tables: &'static str,
    pub columns: &'static str,
    pub constraints: &'static str,
    pub indexes: &'static str,
}

/// Run the queries and assemble tables in catalog order
pub async fn extract_tables_with(
    client: &dyn CatalogClient,
    schema: &str,
    queries: &TableQueries,
) -> Result<Vec<Table>, AppError> {
    let mut tables: Vec<Table> = client
        .query(queries.tables, &[schema])
        .await?
        .iter()
        .map(|row| {
            let mut table = Table::new(row.string("table_name"), schema, Vec::new());
            table.comment = row.text("table_comment").filter(|c| !c.is_empty()).map(str::to_string);
            table.engine = row.text("storage_engine").map(str::to_string);
            table
        })
        .collect();

    for row in client.query(queries.columns, &[schema]).await? {
        if let Some(table) = find_table(&mut tables, &row) {
            table.columns.push(column_from_row(&row));
        }
    }

    let constraint_rows = client.query(queries.constraints, &[schema]).await?;
    for (table_name, constraint) in group_constraints(&constraint_rows) {
        if let Some(table) = tables.iter_mut().find(|t| t.name == table_name) {
            flag_key_columns(table, &constraint);
            table.constraints.push(constraint);
        }
    }

    let index_rows = client.query(queries.indexes, &[schema]).await?;
    for index in group_indexes(&index_rows) {
        if let Some(table) = tables.iter_mut().find(|t| t.name == index.table_name) {
            table.indexes.push(index);
        }
    }

    // Dropped columns leave gaps in catalog positions
    for table in &mut tables {
        table.columns.sort_by_key(|c| c.ordinal_position);
        for (i, column) in table.columns.iter_mut().enumerate() {
            column.ordinal_position = i as i32 + 1;
        }
    }

    debug!("Assembled {} tables for schema {}", tables.len(), schema);
    Ok(tables)
}

fn find_table<'a>(tables: &'a mut [Table], row: &CatalogRow) -> Option<&'a mut Table> {
    let name = row.text("table_name")?;
    tables.iter_mut().find(|t| t.name == name)
}

fn column_from_row(row: &CatalogRow) -> Column {
    Column {
        name: row.string("column_name"),
        data_type: row.text("data_type").map(str::to_string),
        size: row.int("column_size").unwrap_or(0),
        scale: row.int("numeric_scale").unwrap_or(0) as i32,
        nullable: row.flag("is_nullable"),
        default_value: row.text("column_default").map(str::to_string),
        is_primary_key: false,
        is_foreign_key: false,
        is_auto_increment: row.flag("is_auto_increment"),
        ordinal_position: row.int("ordinal_position").unwrap_or(0) as i32,
    }
}

/// Map a catalog constraint type. Oracle reports single-letter codes.
fn constraint_kind(row: &CatalogRow) -> Option<ConstraintKind> {
    match row.string("constraint_type").trim().to_uppercase().as_str() {
        "PRIMARY KEY" | "P" => Some(ConstraintKind::PrimaryKey),
        "FOREIGN KEY" | "R" => Some(ConstraintKind::ForeignKey {
            referenced_table: row.string("referenced_table"),
            referenced_columns: Vec::new(),
            on_delete: row.text("delete_rule").map(str::to_string),
            on_update: row.text("update_rule").map(str::to_string),
        }),
        "UNIQUE" | "U" => Some(ConstraintKind::Unique),
        "CHECK" | "C" => Some(ConstraintKind::Check {
            expression: row.text("check_clause").map(str::to_string),
        }),
        _ => None,
    }
}

/// One constraint per (table, name); multi-column rows append in row order
fn group_constraints(rows: &[CatalogRow]) -> Vec<(String, Constraint)> {
    let mut grouped: Vec<(String, Constraint)> = Vec::new();

    for row in rows {
        let table_name = row.string("table_name");
        let name = row.string("constraint_name");
        let column = row.text("column_name").map(str::to_string);
        let referenced = row.text("referenced_column").map(str::to_string);

        let existing = grouped
            .iter()
            .position(|(t, c)| *t == table_name && c.name == name);

        let position = match existing {
            Some(position) => position,
            None => {
                let Some(kind) = constraint_kind(row) else {
                    continue;
                };
                grouped.push((
                    table_name.clone(),
                    Constraint {
                        name,
                        table_name,
                        kind,
                        columns: Vec::new(),
                    },
                ));
                grouped.len() - 1
            }
        };
        let constraint = &mut grouped[position].1;

        if let Some(column) = column {
            if !constraint.columns.contains(&column) {
                constraint.columns.push(column);
            }
        }
        if let (ConstraintKind::ForeignKey { referenced_columns, .. }, Some(referenced)) =
            (&mut constraint.kind, referenced)
        {
            if !referenced_columns.contains(&referenced) {
                referenced_columns.push(referenced);
            }
        }
    }

    grouped
}

fn group_indexes(rows: &[CatalogRow]) -> Vec<Index> {
    let mut grouped: Vec<Index> = Vec::new();

    for row in rows {
        let table_name = row.string("table_name");
        let name = row.string("index_name");
        let column = row.string("column_name");

        match grouped
            .iter()
            .position(|i| i.table_name == table_name && i.name == name)
        {
            Some(position) => grouped[position].columns.push(column),
            None => grouped.push(Index {
                name,
                table_name,
                columns: vec![column],
                is_unique: row.flag("is_unique"),
                index_type: row.text("index_type").map(str::to_string),
            }),
        }
    }

    grouped
}

fn flag_key_columns(table: &mut Table, constraint: &Constraint) {
    for column in table.columns.iter_mut() {
        if !constraint.columns.iter().any(|c| c.eq_ignore_ascii_case(&column.name)) {
            continue;
        }
        match constraint.kind {
            ConstraintKind::PrimaryKey => column.is_primary_key = true,
            ConstraintKind::ForeignKey { .. } => column.is_foreign_key = true,
            _ => {}
        }
    }
}
