//! Schema snapshot: everything captured from one database at one point in time.

use crate::error::{validation_error, AppError};
use crate::model::engine::EngineKind;
use crate::model::lookup::Lookup;
use crate::model::stored::{Routine, Sequence, Trigger, View};
use crate::model::table::Table;
use crate::normalize::Canonical;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Complete schema snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub database_name: String,
    pub engine: EngineKind,
    pub schema_name: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn builder(
        database_name: impl Into<String>,
        engine: EngineKind,
        schema_name: impl Into<String>,
    ) -> SnapshotBuilder {
        SnapshotBuilder {
            snapshot: Snapshot {
                database_name: database_name.into(),
                engine,
                schema_name: schema_name.into(),
                captured_at: Utc::now(),
                tables: Vec::new(),
                views: Vec::new(),
                routines: Vec::new(),
                triggers: Vec::new(),
                sequences: Vec::new(),
                metadata: BTreeMap::new(),
            },
        }
    }

    /// Store every table's columns in ordinal order
    pub fn sort_columns(&mut self) {
        for table in &mut self.tables {
            table.columns.sort_by_key(|c| c.ordinal_position);
        }
    }

    /// Check structural invariants. Deserialized snapshots must pass this
    /// before they reach the diff engine.
    pub fn validate(&self) -> Result<(), AppError> {
        for table in &self.tables {
            require_name("table", &table.name)?;

            let mut ordinals = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                require_name(&format!("column of table '{}'", table.name), &column.name)?;
                ordinals.push(column.ordinal_position);
            }
            ordinals.sort_unstable();
            let dense = ordinals
                .iter()
                .enumerate()
                .all(|(i, &ordinal)| ordinal == i as i32 + 1);
            if !dense {
                return Err(validation_error(format!(
                    "Column ordinal positions of table '{}' must be unique and run from 1 to {}",
                    table.name,
                    table.columns.len()
                )));
            }

            for index in &table.indexes {
                require_name(&format!("index on table '{}'", table.name), &index.name)?;
            }
            for constraint in &table.constraints {
                require_name(&format!("constraint on table '{}'", table.name), &constraint.name)?;
            }
        }

        for view in &self.views {
            require_name("view", &view.name)?;
        }
        for routine in &self.routines {
            require_name("routine", &routine.name)?;
        }
        for trigger in &self.triggers {
            require_name("trigger", &trigger.name)?;
        }
        for sequence in &self.sequences {
            require_name("sequence", &sequence.name)?;
        }

        Ok(())
    }

    pub fn table_map(&self) -> Lookup<'_, Table> {
        Lookup::by_name(&self.tables, |t| t.name.as_str())
    }

    pub fn view_map(&self) -> Lookup<'_, View> {
        Lookup::by_name(&self.views, |v| v.name.as_str())
    }

    pub fn routine_map(&self) -> Lookup<'_, Routine> {
        Lookup::by_name(&self.routines, |r| r.name.as_str())
    }

    pub fn trigger_map(&self) -> Lookup<'_, Trigger> {
        Lookup::by_name(&self.triggers, |t| t.name.as_str())
    }

    pub fn sequence_map(&self) -> Lookup<'_, Sequence> {
        Lookup::by_name(&self.sequences, |s| s.name.as_str())
    }

    /// Number of top-level objects (tables, routines, triggers, sequences, views)
    pub fn object_count(&self) -> usize {
        self.tables.len()
            + self.routines.len()
            + self.triggers.len()
            + self.sequences.len()
            + self.views.len()
    }

    /// SHA-256 over the sorted canonical signatures of every object.
    ///
    /// Two snapshots share a checksum exactly when their signature sets match,
    /// so capture time, engine and object order do not contribute.
    pub fn checksum(&self) -> String {
        let mut signatures: Vec<String> = Vec::new();

        for table in &self.tables {
            signatures.push(format!("T:{}", table.canonical_signature()));
            signatures.extend(table.indexes.iter().map(|i| format!("I:{}", i.canonical_signature())));
            signatures.extend(table.constraints.iter().map(|c| format!("C:{}", c.canonical_signature())));
        }
        signatures.extend(self.views.iter().map(|v| format!("V:{}", v.canonical_signature())));
        signatures.extend(self.routines.iter().map(|r| format!("R:{}", r.canonical_signature())));
        signatures.extend(self.triggers.iter().map(|t| format!("G:{}", t.canonical_signature())));
        signatures.extend(self.sequences.iter().map(|s| format!("S:{}", s.canonical_signature())));
        signatures.sort();

        let mut hasher = Sha256::new();
        for sig in &signatures {
            hasher.update(sig.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// One-line summary for logs and reports
    pub fn summary(&self) -> String {
        format!(
            "Database: {} ({}) | Tables: {} | Views: {} | Routines: {} | Triggers: {} | Sequences: {}",
            self.database_name,
            self.engine.code(),
            self.tables.len(),
            self.views.len(),
            self.routines.len(),
            self.triggers.len(),
            self.sequences.len()
        )
    }
}

fn require_name(what: &str, name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(validation_error(format!("Snapshot contains a {} with an empty name", what)));
    }
    Ok(())
}

/// Assembles a [`Snapshot`] and validates it once, at construction
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.snapshot.captured_at = at;
        self
    }

    pub fn tables(mut self, tables: Vec<Table>) -> Self {
        self.snapshot.tables = tables;
        self
    }

    pub fn views(mut self, views: Vec<View>) -> Self {
        self.snapshot.views = views;
        self
    }

    pub fn routines(mut self, routines: Vec<Routine>) -> Self {
        self.snapshot.routines = routines;
        self
    }

    pub fn triggers(mut self, triggers: Vec<Trigger>) -> Self {
        self.snapshot.triggers = triggers;
        self
    }

    pub fn sequences(mut self, sequences: Vec<Sequence>) -> Self {
        self.snapshot.sequences = sequences;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.metadata.insert(key.into(), value.into());
        self
    }

    /// Sort columns by ordinal position, then validate.
    pub fn build(mut self) -> Result<Snapshot, AppError> {
        self.snapshot.sort_columns();
        self.snapshot.validate()?;
        Ok(self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::Column;
    use crate::model::stored::{RoutineKind, View};

    fn users_table() -> Table {
        Table::new("users", "app", vec![
            Column::new("name", "varchar", 2).with_size(100),
            Column::new("id", "int", 1).primary_key(),
        ])
    }

    #[test]
    fn test_build_sorts_columns_by_ordinal() {
        let snapshot = Snapshot::builder("golden", EngineKind::Mysql, "app")
            .tables(vec![users_table()])
            .build()
            .unwrap();

        assert_eq!(snapshot.tables[0].columns[0].name, "id");
        assert_eq!(snapshot.tables[0].columns[1].name, "name");
    }

    #[test]
    fn test_sort_columns_on_deserialized_snapshot() {
        let built = Snapshot::builder("app", EngineKind::Postgresql, "app")
            .tables(vec![users_table()])
            .build()
            .unwrap();
        let mut json = serde_json::to_value(&built).unwrap();
        json["tables"][0]["columns"].as_array_mut().unwrap().reverse();
        let mut snapshot: Snapshot = serde_json::from_value(json).unwrap();

        snapshot.sort_columns();

        let names: Vec<&str> = snapshot.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_rejects_gap_in_ordinals() {
        let table = Table::new("t", "app", vec![
            Column::new("a", "int", 1),
            Column::new("b", "int", 3),
        ]);
        let result = Snapshot::builder("db", EngineKind::Mysql, "app")
            .tables(vec![table])
            .build();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_duplicate_ordinals() {
        let table = Table::new("t", "app", vec![
            Column::new("a", "int", 1),
            Column::new("b", "int", 1),
        ]);
        let result = Snapshot::builder("db", EngineKind::Mysql, "app")
            .tables(vec![table])
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_names() {
        let result = Snapshot::builder("db", EngineKind::Oracle, "APP")
            .routines(vec![Routine::new("  ", "APP", RoutineKind::Procedure)])
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_table_map_is_case_insensitive_first_wins() {
        let mut shadow = users_table();
        shadow.name = "USERS".to_string();
        shadow.comment = Some("shadow".to_string());

        let snapshot = Snapshot::builder("db", EngineKind::Mysql, "app")
            .tables(vec![users_table(), shadow])
            .build()
            .unwrap();
        let map = snapshot.table_map();

        assert_eq!(map.len(), 1);
        assert!(map.find("Users").unwrap().comment.is_none());
    }

    #[test]
    fn test_checksum_ignores_order_and_capture_time() {
        let a = Snapshot::builder("db", EngineKind::Mysql, "app")
            .tables(vec![users_table()])
            .views(vec![View::new("v1", "app", &["id"]), View::new("v2", "app", &["id"])])
            .build()
            .unwrap();
        let b = Snapshot::builder("other", EngineKind::Postgresql, "public")
            .tables(vec![users_table()])
            .views(vec![View::new("v2", "app", &["id"]), View::new("v1", "app", &["id"])])
            .build()
            .unwrap();

        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_object_count_and_summary() {
        let snapshot = Snapshot::builder("golden", EngineKind::Mysql, "app")
            .tables(vec![users_table()])
            .views(vec![View::new("v1", "app", &["id"])])
            .build()
            .unwrap();

        assert_eq!(snapshot.object_count(), 2);
        assert!(snapshot.summary().starts_with("Database: golden (mysql) | Tables: 1 | Views: 1"));
    }
}
