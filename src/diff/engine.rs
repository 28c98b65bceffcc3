//! Schema Diff Engine
//!
//! Compares a standard snapshot against a user snapshot and classifies every
//! discrepancy as a [`Drift`]. Comparison is a total function: it never fails,
//! it only reports.

use crate::model::{Column, Lookup, Routine, Sequence, Snapshot, Table, Trigger, View};
use crate::normalize::Canonical;
use crate::report::{ComplianceReport, Drift, DriftCategory, DriftKind, Severity};
use std::sync::Arc;
use tracing::{debug, info};

/// How a key resolves across the two sides
enum Pairing<'a, T> {
    Missing(&'a T),
    Both(&'a T, &'a T),
    Extra(&'a T),
}

/// Walk standard keys in order, then user-only keys in order.
fn pair<'a, T>(standard: &Lookup<'a, T>, user: &Lookup<'a, T>) -> Vec<Pairing<'a, T>> {
    let mut pairs: Vec<Pairing<'a, T>> = standard
        .iter()
        .map(|(key, std_item)| match user.get(key) {
            Some(user_item) => Pairing::Both(std_item, user_item),
            None => Pairing::Missing(std_item),
        })
        .collect();

    pairs.extend(
        user.iter()
            .filter(|(key, _)| !standard.contains_key(key))
            .map(|(_, user_item)| Pairing::Extra(user_item)),
    );
    pairs
}

/// The diff engine that compares a user schema against the standard
pub struct DiffEngine;

impl DiffEngine {
    /// Compare two snapshots and return the report with its summary computed
    pub fn compare(
        standard: impl Into<Arc<Snapshot>>,
        user: impl Into<Arc<Snapshot>>,
    ) -> ComplianceReport {
        let standard = standard.into();
        let user = user.into();

        info!(
            "🔍 Comparing user schema '{}' against standard '{}'",
            user.database_name, standard.database_name
        );

        let mut drifts = Vec::new();
        Self::diff_tables(&standard, &user, &mut drifts);
        Self::diff_routines(&standard, &user, &mut drifts);
        Self::diff_triggers(&standard, &user, &mut drifts);
        Self::diff_sequences(&standard, &user, &mut drifts);
        Self::diff_views(&standard, &user, &mut drifts);

        let mut report = ComplianceReport::new(standard, user);
        report.extend_drifts(drifts);

        let summary = report.calculate_summary();
        info!(
            "✅ Comparison complete: {} drifts, score {:.1}, migration ready: {}",
            summary.total_drifts, summary.compliance_score, summary.migration_ready
        );

        report
    }

    fn diff_tables(standard: &Snapshot, user: &Snapshot, drifts: &mut Vec<Drift>) {
        let before = drifts.len();

        for pairing in pair(&standard.table_map(), &user.table_map()) {
            match pairing {
                Pairing::Missing(table) => drifts.push(Drift::missing(
                    DriftCategory::Tables,
                    "Table",
                    &table.name,
                    Severity::Critical,
                )),
                Pairing::Both(std_table, user_table) => {
                    Self::diff_columns(std_table, user_table, drifts);
                    Self::diff_indexes(std_table, user_table, drifts);
                    Self::diff_constraints(std_table, user_table, drifts);
                }
                Pairing::Extra(table) => drifts.push(Drift::extra(
                    DriftCategory::Tables,
                    "Table",
                    &table.name,
                    Severity::Low,
                )),
            }
        }

        debug!("Tables: {} drifts", drifts.len() - before);
    }

    fn diff_columns(std_table: &Table, user_table: &Table, drifts: &mut Vec<Drift>) {
        for pairing in pair(&std_table.column_map(), &user_table.column_map()) {
            match pairing {
                Pairing::Missing(col) => drifts.push(Drift::missing(
                    DriftCategory::Columns,
                    "Column",
                    format!("{}.{}", std_table.name, col.name),
                    Severity::Critical,
                )),
                Pairing::Both(std_col, user_col) => {
                    if std_col.canonical_signature() != user_col.canonical_signature() {
                        let path = format!("{}.{}", std_table.name, std_col.name);
                        Self::compare_columns(&path, std_col, user_col, drifts);
                    }
                }
                Pairing::Extra(col) => drifts.push(Drift::extra(
                    DriftCategory::Columns,
                    "Column",
                    format!("{}.{}", user_table.name, col.name),
                    Severity::Medium,
                )),
            }
        }
    }

    /// Each attribute is checked on its own, so one column can yield several drifts.
    fn compare_columns(path: &str, std_col: &Column, user_col: &Column, drifts: &mut Vec<Drift>) {
        if std_col.folded_type() != user_col.folded_type() {
            drifts.push(Drift::changed(
                DriftCategory::Columns,
                DriftKind::TypeMismatch,
                "Column Data Type",
                path,
                Severity::High,
                std_col.type_label(),
                user_col.type_label(),
                format!(
                    "Column data type differs: expected {}, found {}",
                    std_col.type_label(),
                    user_col.type_label()
                ),
            ));
        }

        if std_col.nullable != user_col.nullable {
            drifts.push(Drift::changed(
                DriftCategory::Columns,
                DriftKind::Modified,
                "Column Nullability",
                path,
                Severity::Medium,
                nullability(std_col),
                nullability(user_col),
                "Column nullability differs",
            ));
        }

        if std_col.is_primary_key != user_col.is_primary_key {
            drifts.push(Drift::changed(
                DriftCategory::Columns,
                DriftKind::Modified,
                "Primary Key",
                path,
                Severity::Critical,
                std_col.is_primary_key.to_string(),
                user_col.is_primary_key.to_string(),
                "Primary key definition differs",
            ));
        }

        if std_col.size != user_col.size && std_col.size > 0 {
            let severity = if user_col.size < std_col.size {
                Severity::High
            } else {
                Severity::Low
            };
            drifts.push(Drift::changed(
                DriftCategory::Columns,
                DriftKind::Modified,
                "Column Size",
                path,
                severity,
                std_col.size.to_string(),
                user_col.size.to_string(),
                format!("Column size differs: expected {}, found {}", std_col.size, user_col.size),
            ));
        }
    }

    fn diff_indexes(std_table: &Table, user_table: &Table, drifts: &mut Vec<Drift>) {
        for pairing in pair(&std_table.index_map(), &user_table.index_map()) {
            match pairing {
                Pairing::Missing(idx) => drifts.push(Drift::missing(
                    DriftCategory::Indexes,
                    "Index",
                    format!("{}.{}", std_table.name, idx.name),
                    Severity::Medium,
                )),
                Pairing::Both(..) => {}
                Pairing::Extra(idx) => drifts.push(Drift::extra(
                    DriftCategory::Indexes,
                    "Index",
                    format!("{}.{}", user_table.name, idx.name),
                    Severity::Low,
                )),
            }
        }
    }

    /// Extra constraints in the user schema are tolerated.
    fn diff_constraints(std_table: &Table, user_table: &Table, drifts: &mut Vec<Drift>) {
        for pairing in pair(&std_table.constraint_map(), &user_table.constraint_map()) {
            if let Pairing::Missing(constraint) = pairing {
                let severity = if constraint.kind.is_foreign_key() {
                    Severity::High
                } else {
                    Severity::Critical
                };
                drifts.push(Drift::missing(
                    DriftCategory::Constraints,
                    constraint.kind.label(),
                    format!("{}.{}", std_table.name, constraint.name),
                    severity,
                ));
            }
        }
    }

    fn diff_routines(standard: &Snapshot, user: &Snapshot, drifts: &mut Vec<Drift>) {
        let before = drifts.len();

        for pairing in pair(&standard.routine_map(), &user.routine_map()) {
            match pairing {
                Pairing::Missing(routine) => drifts.push(Drift::missing(
                    DriftCategory::Routines,
                    routine.kind.label(),
                    &routine.name,
                    Severity::Critical,
                )),
                Pairing::Both(std_routine, user_routine) => {
                    Self::compare_routines(std_routine, user_routine, drifts)
                }
                Pairing::Extra(routine) => drifts.push(Drift::extra(
                    DriftCategory::Routines,
                    routine.kind.label(),
                    &routine.name,
                    Severity::Low,
                )),
            }
        }

        debug!("Routines: {} drifts", drifts.len() - before);
    }

    fn compare_routines(std_routine: &Routine, user_routine: &Routine, drifts: &mut Vec<Drift>) {
        let std_sig = std_routine.canonical_signature();
        let user_sig = user_routine.canonical_signature();
        if std_sig != user_sig {
            drifts.push(Drift::changed(
                DriftCategory::Routines,
                DriftKind::Modified,
                std_routine.kind.label(),
                &std_routine.name,
                Severity::High,
                std_sig,
                user_sig,
                "Routine signature differs (parameters or return type)",
            ));
        }

        if bodies_differ(std_routine.normalized_definition(), user_routine.normalized_definition()) {
            drifts.push(Drift::changed(
                DriftCategory::Routines,
                DriftKind::DefinitionChanged,
                format!("{} Body", std_routine.kind.label()),
                &std_routine.name,
                Severity::Medium,
                "See standard definition",
                "See user definition",
                "Routine implementation differs",
            ));
        }
    }

    fn diff_triggers(standard: &Snapshot, user: &Snapshot, drifts: &mut Vec<Drift>) {
        let before = drifts.len();

        for pairing in pair(&standard.trigger_map(), &user.trigger_map()) {
            match pairing {
                Pairing::Missing(trigger) => drifts.push(Drift::missing(
                    DriftCategory::Triggers,
                    "Trigger",
                    &trigger.name,
                    Severity::High,
                )),
                Pairing::Both(std_trigger, user_trigger) => {
                    Self::compare_triggers(std_trigger, user_trigger, drifts)
                }
                Pairing::Extra(trigger) => drifts.push(Drift::extra(
                    DriftCategory::Triggers,
                    "Trigger",
                    &trigger.name,
                    Severity::Low,
                )),
            }
        }

        debug!("Triggers: {} drifts", drifts.len() - before);
    }

    fn compare_triggers(std_trigger: &Trigger, user_trigger: &Trigger, drifts: &mut Vec<Drift>) {
        let std_sig = std_trigger.canonical_signature();
        let user_sig = user_trigger.canonical_signature();
        if std_sig != user_sig {
            drifts.push(Drift::changed(
                DriftCategory::Triggers,
                DriftKind::Modified,
                "Trigger",
                &std_trigger.name,
                Severity::High,
                std_sig,
                user_sig,
                "Trigger configuration differs (table, timing or event)",
            ));
        }

        if bodies_differ(std_trigger.normalized_definition(), user_trigger.normalized_definition()) {
            drifts.push(Drift::changed(
                DriftCategory::Triggers,
                DriftKind::DefinitionChanged,
                "Trigger Body",
                &std_trigger.name,
                Severity::Medium,
                "See standard definition",
                "See user definition",
                "Trigger body differs",
            ));
        }
    }

    fn diff_sequences(standard: &Snapshot, user: &Snapshot, drifts: &mut Vec<Drift>) {
        for pairing in pair(&standard.sequence_map(), &user.sequence_map()) {
            match pairing {
                Pairing::Missing(seq) => drifts.push(Drift::missing(
                    DriftCategory::Sequences,
                    "Sequence",
                    &seq.name,
                    Severity::High,
                )),
                Pairing::Both(std_seq, user_seq) => Self::compare_sequences(std_seq, user_seq, drifts),
                Pairing::Extra(seq) => drifts.push(Drift::extra(
                    DriftCategory::Sequences,
                    "Sequence",
                    &seq.name,
                    Severity::Low,
                )),
            }
        }
    }

    fn compare_sequences(std_seq: &Sequence, user_seq: &Sequence, drifts: &mut Vec<Drift>) {
        let std_sig = std_seq.canonical_signature();
        let user_sig = user_seq.canonical_signature();
        if std_sig != user_sig {
            drifts.push(Drift::changed(
                DriftCategory::Sequences,
                DriftKind::Modified,
                "Sequence",
                &std_seq.name,
                Severity::Medium,
                std_sig,
                user_sig,
                "Sequence configuration differs",
            ));
        }
    }

    fn diff_views(standard: &Snapshot, user: &Snapshot, drifts: &mut Vec<Drift>) {
        for pairing in pair(&standard.view_map(), &user.view_map()) {
            match pairing {
                Pairing::Missing(view) => drifts.push(Drift::missing(
                    DriftCategory::Views,
                    "View",
                    &view.name,
                    Severity::Medium,
                )),
                Pairing::Both(std_view, user_view) => Self::compare_views(std_view, user_view, drifts),
                Pairing::Extra(view) => drifts.push(Drift::extra(
                    DriftCategory::Views,
                    "View",
                    &view.name,
                    Severity::Low,
                )),
            }
        }
    }

    fn compare_views(std_view: &View, user_view: &View, drifts: &mut Vec<Drift>) {
        let std_sig = std_view.canonical_signature();
        let user_sig = user_view.canonical_signature();
        if std_sig != user_sig {
            drifts.push(Drift::changed(
                DriftCategory::Views,
                DriftKind::Modified,
                "View",
                &std_view.name,
                Severity::High,
                std_sig,
                user_sig,
                "View columns differ",
            ));
        }

        if bodies_differ(std_view.normalized_definition(), user_view.normalized_definition()) {
            drifts.push(Drift::changed(
                DriftCategory::Views,
                DriftKind::DefinitionChanged,
                "View Definition",
                &std_view.name,
                Severity::Medium,
                "See standard definition",
                "See user definition",
                "View definition differs",
            ));
        }
    }
}

/// Bodies are compared only when both sides carry one
fn bodies_differ(standard: Option<String>, user: Option<String>) -> bool {
    match (standard, user) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

fn nullability(col: &Column) -> &'static str {
    if col.nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Constraint, EngineKind, Index, Parameter, ParameterMode, RoutineKind, TriggerEvent,
        TriggerTiming,
    };
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        Table::new("users", "app", vec![
            Column::new("id", "int", 1).primary_key(),
            Column::new("name", "varchar", 2).with_size(100),
        ])
        .with_constraints(vec![Constraint::primary_key("pk_users", "users", &["id"])])
    }

    fn orders() -> Table {
        Table::new("orders", "app", vec![
            Column::new("id", "int", 1).primary_key(),
            Column::new("user_id", "int", 2).not_null().foreign_key(),
        ])
        .with_indexes(vec![Index::new("idx_orders_user", "orders", &["user_id"])])
        .with_constraints(vec![
            Constraint::primary_key("pk_orders", "orders", &["id"]),
            Constraint::foreign_key("fk_orders_user", "orders", &["user_id"], "users", &["id"]),
        ])
    }

    fn snapshot(tables: Vec<Table>) -> Snapshot {
        Snapshot::builder("db", EngineKind::Mysql, "app")
            .tables(tables)
            .build()
            .unwrap()
    }

    fn full_snapshot() -> Snapshot {
        Snapshot::builder("golden", EngineKind::Mysql, "app")
            .tables(vec![users(), orders()])
            .routines(vec![Routine::new("calc_total", "app", RoutineKind::Function)
                .with_parameters(vec![Parameter::new("order_id", "int", ParameterMode::In, 1)])
                .with_definition("BEGIN RETURN 1; END")])
            .triggers(vec![Trigger::new(
                "trg_orders_audit",
                "orders",
                TriggerTiming::After,
                TriggerEvent::InsertUpdate,
            )
            .with_definition("INSERT INTO audit VALUES (NEW.id)")])
            .sequences(vec![Sequence::new("order_seq", "app", 1, 1)])
            .views(vec![View::new("active_users", "app", &["id", "name"])
                .with_definition("SELECT id, name FROM users")])
            .build()
            .unwrap()
    }

    fn only_drift(report: &ComplianceReport) -> &Drift {
        assert_eq!(report.drifts().len(), 1, "drifts: {:#?}", report.drifts());
        &report.drifts()[0]
    }

    #[test]
    fn test_identical_snapshots_are_fully_compliant() {
        let report = DiffEngine::compare(full_snapshot(), full_snapshot());

        assert!(report.drifts().is_empty());
        assert_eq!(report.summary().compliance_score, 100.0);
        assert!(report.summary().migration_ready);
        assert!(report.is_migration_ready());
    }

    #[test]
    fn test_end_to_end_users_orders_scenario() {
        let standard = snapshot(vec![users(), orders()]);
        let mut user_users = users();
        user_users.columns.push(Column::new("extra_col", "text", 3));
        let user = snapshot(vec![user_users]);

        let report = DiffEngine::compare(standard, user);
        let drifts = report.drifts();

        assert_eq!(drifts.len(), 2);
        assert_eq!(drifts[0].object_name, "orders");
        assert_eq!(drifts[0].kind, DriftKind::MissingInUser);
        assert_eq!(drifts[0].severity, Severity::Critical);
        assert_eq!(drifts[1].object_name, "users.extra_col");
        assert_eq!(drifts[1].kind, DriftKind::MissingInStandard);
        assert_eq!(drifts[1].severity, Severity::Medium);
        assert!(!report.summary().migration_ready);
    }

    #[test]
    fn test_rename_inverts_roles_with_same_count() {
        let mut renamed = users();
        renamed.name = "customers".to_string();
        let a = snapshot(vec![users()]);
        let b = snapshot(vec![renamed]);

        let forward = DiffEngine::compare(a.clone(), b.clone());
        let backward = DiffEngine::compare(b, a);

        assert_eq!(forward.drifts().len(), backward.drifts().len());
        assert_eq!(forward.drifts()[0].object_name, "users");
        assert_eq!(forward.drifts()[0].kind, DriftKind::MissingInUser);
        assert_eq!(backward.drifts()[0].object_name, "customers");
        assert_eq!(backward.drifts()[0].kind, DriftKind::MissingInUser);
        assert_eq!(backward.drifts()[1].object_name, "users");
        assert_eq!(backward.drifts()[1].kind, DriftKind::MissingInStandard);
    }

    #[test]
    fn test_missing_table_children_are_not_diffed() {
        let report = DiffEngine::compare(snapshot(vec![orders()]), snapshot(vec![]));
        let drift = only_drift(&report);
        assert_eq!(drift.category, DriftCategory::Tables);
        assert_eq!(drift.severity, Severity::Critical);
    }

    #[test]
    fn test_table_names_match_case_insensitively() {
        let mut upper = users();
        upper.name = "USERS".to_string();
        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![upper]));
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_missing_foreign_key_is_high() {
        let mut user_orders = orders();
        user_orders.constraints.retain(|c| !c.kind.is_foreign_key());

        let report = DiffEngine::compare(snapshot(vec![orders()]), snapshot(vec![user_orders]));
        let drift = only_drift(&report);

        assert_eq!(drift.severity, Severity::High);
        assert_eq!(drift.object_type, "FOREIGN_KEY");
        assert_eq!(drift.object_name, "orders.fk_orders_user");
    }

    #[test]
    fn test_missing_primary_key_constraint_is_critical() {
        let mut user_users = users();
        user_users.constraints.clear();

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        let drift = only_drift(&report);

        assert_eq!(drift.severity, Severity::Critical);
        assert_eq!(drift.object_type, "PRIMARY_KEY");
    }

    #[test]
    fn test_missing_unique_constraint_is_critical() {
        let standard = users().with_constraints(vec![Constraint::unique("uq_name", "users", &["name"])]);
        let user = users().with_constraints(vec![]);

        let report = DiffEngine::compare(snapshot(vec![standard]), snapshot(vec![user]));
        assert_eq!(only_drift(&report).severity, Severity::Critical);
    }

    #[test]
    fn test_extra_constraint_is_tolerated() {
        let user = users().with_constraints(vec![
            Constraint::primary_key("pk_users", "users", &["id"]),
            Constraint::unique("uq_name", "users", &["name"]),
        ]);
        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user]));
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_missing_column_is_critical() {
        let mut user_users = users();
        user_users.columns.truncate(1);

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        let drift = only_drift(&report);

        assert_eq!(drift.severity, Severity::Critical);
        assert_eq!(drift.object_name, "users.name");
    }

    #[test]
    fn test_column_type_mismatch_is_high() {
        let mut user_users = users();
        user_users.columns[1].data_type = Some("text".to_string());

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        let drift = only_drift(&report);

        assert_eq!(drift.kind, DriftKind::TypeMismatch);
        assert_eq!(drift.severity, Severity::High);
        assert_eq!(drift.standard_value, "varchar");
        assert_eq!(drift.user_value, "text");
    }

    #[test]
    fn test_folded_type_aliases_do_not_drift() {
        let mut user_users = users();
        user_users.columns[0].data_type = Some("INT4".to_string());

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_column_nullability_mismatch_is_medium() {
        let mut user_users = users();
        user_users.columns[1].nullable = false;

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        let drift = only_drift(&report);

        assert_eq!(drift.severity, Severity::Medium);
        assert_eq!(drift.object_type, "Column Nullability");
        assert_eq!(drift.user_value, "NOT NULL");
    }

    #[test]
    fn test_primary_key_flag_mismatch_is_critical() {
        let mut user_users = users();
        user_users.columns[0].is_primary_key = false;

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        let drift = only_drift(&report);

        assert_eq!(drift.severity, Severity::Critical);
        assert_eq!(drift.object_type, "Primary Key");
    }

    #[test]
    fn test_smaller_user_size_is_high_larger_is_low() {
        let mut smaller = users();
        smaller.columns[1].size = 50;
        let mut larger = users();
        larger.columns[1].size = 200;

        let shrunk = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![smaller]));
        let grown = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![larger]));

        assert_eq!(only_drift(&shrunk).severity, Severity::High);
        assert_eq!(only_drift(&grown).severity, Severity::Low);
    }

    #[test]
    fn test_one_column_can_yield_multiple_drifts() {
        let mut user_users = users();
        user_users.columns[1].data_type = Some("text".to_string());
        user_users.columns[1].nullable = false;

        let report = DiffEngine::compare(snapshot(vec![users()]), snapshot(vec![user_users]));
        let severities: Vec<Severity> = report.drifts().iter().map(|d| d.severity).collect();

        assert_eq!(severities, vec![Severity::High, Severity::Medium]);
    }

    #[test]
    fn test_missing_index_is_medium_extra_is_low() {
        let mut user_orders = orders();
        user_orders.indexes = vec![Index::new("idx_orders_id", "orders", &["id"]).unique()];

        let report = DiffEngine::compare(snapshot(vec![orders()]), snapshot(vec![user_orders]));
        let drifts = report.drifts();

        assert_eq!(drifts.len(), 2);
        assert_eq!(drifts[0].object_name, "orders.idx_orders_user");
        assert_eq!(drifts[0].severity, Severity::Medium);
        assert_eq!(drifts[1].object_name, "orders.idx_orders_id");
        assert_eq!(drifts[1].severity, Severity::Low);
    }

    #[test]
    fn test_renamed_index_with_same_shape_does_not_drift() {
        let mut user_orders = orders();
        user_orders.indexes = vec![Index::new("orders_user_id_idx", "ORDERS", &["USER_ID"])];

        let report = DiffEngine::compare(snapshot(vec![orders()]), snapshot(vec![user_orders]));
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_duplicate_index_signatures_are_absorbed() {
        let mut standard = orders();
        standard
            .indexes
            .push(Index::new("idx_orders_user_dup", "orders", &["user_id"]));

        let report = DiffEngine::compare(snapshot(vec![standard]), snapshot(vec![orders()]));
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_routine_body_whitespace_and_comments_do_not_drift() {
        let mut standard = full_snapshot();
        let mut user = full_snapshot();
        standard.routines[0].definition = Some("SELECT 1 -- first\nFROM dual".to_string());
        user.routines[0].definition = Some("select   1 /* same */\n  from dual".to_string());

        let report = DiffEngine::compare(standard, user);
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_routine_logic_change_is_one_medium_drift() {
        let mut standard = full_snapshot();
        let mut user = full_snapshot();
        standard.routines[0].definition = Some("SELECT 1".to_string());
        user.routines[0].definition = Some("SELECT 2".to_string());

        let report = DiffEngine::compare(standard, user);
        let drift = only_drift(&report);

        assert_eq!(drift.kind, DriftKind::DefinitionChanged);
        assert_eq!(drift.severity, Severity::Medium);
        assert_eq!(drift.object_type, "FUNCTION Body");
    }

    #[test]
    fn test_logic_change_after_block_comment_with_line_marker() {
        let mut standard = full_snapshot();
        let mut user = full_snapshot();
        standard.routines[0].definition = Some("/* v1 -- legacy */ SELECT 1".to_string());
        user.routines[0].definition = Some("/* v1 -- legacy */ SELECT 2".to_string());

        let report = DiffEngine::compare(standard, user);
        let drift = only_drift(&report);

        assert_eq!(drift.kind, DriftKind::DefinitionChanged);
        assert_eq!(drift.severity, Severity::Medium);
    }

    #[test]
    fn test_routine_parameter_and_logic_change_yield_two_drifts() {
        let standard = full_snapshot();
        let mut user = full_snapshot();
        user.routines[0].parameters[0].data_type = Some("bigint".to_string());
        user.routines[0].definition = Some("BEGIN RETURN 2; END".to_string());

        let report = DiffEngine::compare(standard, user);
        let severities: Vec<Severity> = report.drifts().iter().map(|d| d.severity).collect();

        assert_eq!(severities, vec![Severity::High, Severity::Medium]);
    }

    #[test]
    fn test_missing_body_on_one_side_skips_body_check() {
        let standard = full_snapshot();
        let mut user = full_snapshot();
        user.routines[0].definition = None;
        user.views[0].definition = None;

        let report = DiffEngine::compare(standard, user);
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_missing_routine_is_critical() {
        let standard = full_snapshot();
        let mut user = full_snapshot();
        user.routines.clear();

        let report = DiffEngine::compare(standard, user);
        let drift = only_drift(&report);

        assert_eq!(drift.severity, Severity::Critical);
        assert_eq!(drift.object_type, "FUNCTION");
    }

    #[test]
    fn test_trigger_severities() {
        let standard = full_snapshot();

        let mut missing = full_snapshot();
        missing.triggers.clear();
        let mut retimed = full_snapshot();
        retimed.triggers[0].timing = TriggerTiming::Before;

        let report = DiffEngine::compare(standard.clone(), missing);
        assert_eq!(only_drift(&report).severity, Severity::High);

        let report = DiffEngine::compare(standard, retimed);
        assert_eq!(only_drift(&report).severity, Severity::High);
    }

    #[test]
    fn test_sequence_severities() {
        let standard = full_snapshot();

        let mut missing = full_snapshot();
        missing.sequences.clear();
        let mut changed = full_snapshot();
        changed.sequences[0].increment = 10;

        let report = DiffEngine::compare(standard.clone(), missing);
        assert_eq!(only_drift(&report).severity, Severity::High);

        let report = DiffEngine::compare(standard, changed);
        let drift = only_drift(&report);
        assert_eq!(drift.severity, Severity::Medium);
        assert_eq!(drift.description, "Sequence configuration differs");
    }

    #[test]
    fn test_view_severities() {
        let standard = full_snapshot();

        let mut missing = full_snapshot();
        missing.views.clear();
        let mut rewritten = full_snapshot();
        rewritten.views[0].definition = Some("SELECT id, name FROM users WHERE active = 1".to_string());

        let report = DiffEngine::compare(standard.clone(), missing);
        assert_eq!(only_drift(&report).severity, Severity::Medium);

        let report = DiffEngine::compare(standard, rewritten);
        let drift = only_drift(&report);
        assert_eq!(drift.kind, DriftKind::DefinitionChanged);
        assert_eq!(drift.severity, Severity::Medium);
    }

    #[test]
    fn test_extra_objects_are_low_and_do_not_block() {
        let standard = snapshot(vec![users()]);
        let user = Snapshot::builder("db", EngineKind::Mysql, "app")
            .tables(vec![users(), orders()])
            .sequences(vec![Sequence::new("custom_seq", "app", 1, 1)])
            .views(vec![View::new("custom_view", "app", &["id"])])
            .build()
            .unwrap();

        let report = DiffEngine::compare(standard, user);

        assert_eq!(report.drifts().len(), 3);
        assert!(report.drifts().iter().all(|d| d.severity == Severity::Low));
        assert!(report.is_migration_ready());
    }

    #[test]
    fn test_cross_engine_vocabulary_is_absorbed() {
        let mysql = Snapshot::builder("golden", EngineKind::Mysql, "app")
            .tables(vec![Table::new("t", "app", vec![
                Column::new("id", "bigint", 1).primary_key(),
                Column::new("ts", "timestamp", 2),
            ])])
            .build()
            .unwrap();
        let postgres = Snapshot::builder("tenant", EngineKind::Postgresql, "public")
            .tables(vec![Table::new("T", "public", vec![
                Column::new("ID", "int8", 1).primary_key(),
                Column::new("TS", "TIMESTAMP", 2),
            ])])
            .build()
            .unwrap();

        let report = DiffEngine::compare(mysql, postgres);
        assert!(report.drifts().is_empty());
    }

    #[test]
    fn test_category_order_is_stable() {
        let standard = full_snapshot();
        let user = snapshot(vec![]);

        let report = DiffEngine::compare(standard, user);
        let categories: Vec<DriftCategory> = report.drifts().iter().map(|d| d.category).collect();

        assert_eq!(
            categories,
            vec![
                DriftCategory::Tables,
                DriftCategory::Tables,
                DriftCategory::Routines,
                DriftCategory::Triggers,
                DriftCategory::Sequences,
                DriftCategory::Views,
            ]
        );
        // 6 drifts against 6 objects
        assert_eq!(report.summary().compliance_score, 0.0);
    }
}
