//! Row mapping for stored logic and schema-level objects.
//!
//! Dialect queries alias their output to the column names read here, so the
//! engines differ only in SQL.

use crate::capture::CatalogRow;
use crate::error::AppError;
use crate::model::{
    EngineKind, Parameter, ParameterMode, Routine, RoutineKind, Sequence, Trigger, TriggerEvent,
    TriggerTiming, View,
};
use std::collections::HashMap;
use tracing::warn;

/// `routine_name`, `routine_type`, `return_type`, `definition`, `language`
pub(crate) fn routine_from_row(row: &CatalogRow, schema: &str) -> Routine {
    let mut routine = Routine::new(
        row.string("routine_name"),
        schema,
        RoutineKind::from_catalog(&row.string("routine_type")),
    );
    routine.return_type = row
        .text("return_type")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    routine.definition = row.text("definition").map(str::to_string);
    routine.language = row.text("language").map(str::to_string);
    routine
}

/// `routine_name`, `parameter_name`, `data_type`, `parameter_mode`, `ordinal_position`.
///
/// Unnamed rows (function return slots) are skipped. Each list is sorted by position.
pub(crate) fn group_parameters(rows: &[CatalogRow]) -> HashMap<String, Vec<Parameter>> {
    let mut grouped: HashMap<String, Vec<Parameter>> = HashMap::new();

    for row in rows {
        let Some(name) = row.text("parameter_name").filter(|n| !n.trim().is_empty()) else {
            continue;
        };
        grouped
            .entry(row.string("routine_name"))
            .or_default()
            .push(Parameter {
                name: name.to_string(),
                data_type: row.text("data_type").map(str::to_string),
                mode: ParameterMode::from_catalog(row.text("parameter_mode")),
                position: row.int("ordinal_position").unwrap_or(0) as i32,
            });
    }

    for params in grouped.values_mut() {
        params.sort_by_key(|p| p.position);
    }
    grouped
}

/// `trigger_name`, `table_name`, `timing`, `event`, `definition`, `is_enabled`.
///
/// A missing `is_enabled` column means enabled.
pub(crate) fn trigger_from_row(row: &CatalogRow) -> Trigger {
    let mut trigger = Trigger::new(
        row.string("trigger_name"),
        row.string("table_name"),
        TriggerTiming::from_catalog(row.text("timing")),
        TriggerEvent::from_catalog(row.text("event")),
    );
    trigger.definition = row.text("definition").map(str::to_string);
    trigger.enabled = row.text("is_enabled").is_none() || row.flag("is_enabled");
    trigger
}

/// `sequence_name`, `start_value`, `increment`, `min_value`, `max_value`, `is_cycle`, `cache_size`
pub(crate) fn sequence_from_row(row: &CatalogRow, schema: &str) -> Sequence {
    let mut sequence = Sequence::new(
        row.string("sequence_name"),
        schema,
        row.int("start_value").unwrap_or(1),
        row.int("increment").unwrap_or(1),
    );
    sequence.min_value = row.int("min_value");
    sequence.max_value = row.int("max_value");
    sequence.cycle = row.flag("is_cycle");
    sequence.cache_size = row.int("cache_size").unwrap_or(0);
    sequence
}

/// `view_name`, `definition`, `is_updatable`
pub(crate) fn view_from_row(row: &CatalogRow, schema: &str) -> View {
    let mut view = View::new(row.string("view_name"), schema, &[]);
    view.definition = row.text("definition").map(str::to_string);
    view.updatable = row.flag("is_updatable");
    view
}

/// `view_name`, `column_name`, in row order
pub(crate) fn group_view_columns(rows: &[CatalogRow]) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        if let Some(column) = row.text("column_name") {
            grouped
                .entry(row.string("view_name"))
                .or_default()
                .push(column.to_string());
        }
    }
    grouped
}

/// Attach parameters to their routines. A failed parameter query leaves the
/// routines in place without parameters.
pub(crate) fn attach_parameters(
    engine: EngineKind,
    routines: &mut [Routine],
    rows: Result<Vec<CatalogRow>, AppError>,
) {
    match rows {
        Ok(rows) => {
            let mut grouped = group_parameters(&rows);
            for routine in routines.iter_mut() {
                if let Some(params) = grouped.remove(&routine.name) {
                    routine.parameters = params;
                }
            }
        }
        Err(e) => warn!(
            "⚠️ Could not extract routine parameters from {}: {}",
            engine.display_name(),
            e
        ),
    }
}

/// Attach column lists to their views. A failed column query leaves the views
/// in place without columns.
pub(crate) fn attach_view_columns(
    engine: EngineKind,
    views: &mut [View],
    rows: Result<Vec<CatalogRow>, AppError>,
) {
    match rows {
        Ok(rows) => {
            let mut grouped = group_view_columns(&rows);
            for view in views.iter_mut() {
                if let Some(columns) = grouped.remove(&view.name) {
                    view.columns = columns;
                }
            }
        }
        Err(e) => warn!(
            "⚠️ Could not extract view columns from {}: {}",
            engine.display_name(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake::row;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_return_type_reads_as_none() {
        let r = routine_from_row(
            &row(&[("routine_name", "archive"), ("routine_type", "PROCEDURE"), ("return_type", "")]),
            "app",
        );
        assert_eq!(r.kind, RoutineKind::Procedure);
        assert_eq!(r.return_type, None);
    }

    #[test]
    fn test_group_parameters_sorts_and_skips_return_slot() {
        let rows = vec![
            row(&[("routine_name", "calc"), ("parameter_name", "b"), ("data_type", "int"),
                  ("parameter_mode", "OUT"), ("ordinal_position", "2")]),
            row(&[("routine_name", "calc"), ("data_type", "int"), ("ordinal_position", "0")]),
            row(&[("routine_name", "calc"), ("parameter_name", "a"), ("data_type", "int"),
                  ("parameter_mode", "IN"), ("ordinal_position", "1")]),
        ];

        let grouped = group_parameters(&rows);
        let params = &grouped["calc"];

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[1].mode, ParameterMode::Out);
    }

    #[test]
    fn test_trigger_enabled_defaults_to_true() {
        let enabled = trigger_from_row(&row(&[("trigger_name", "t"), ("table_name", "x"),
                                              ("timing", "AFTER"), ("event", "UPDATE")]));
        let disabled = trigger_from_row(&row(&[("trigger_name", "t"), ("table_name", "x"),
                                               ("is_enabled", "NO")]));

        assert!(enabled.enabled);
        assert_eq!(enabled.event, TriggerEvent::Update);
        assert!(!disabled.enabled);
    }

    #[test]
    fn test_sequence_row_mapping() {
        let seq = sequence_from_row(
            &row(&[("sequence_name", "order_seq"), ("start_value", "100"), ("increment", "5"),
                   ("is_cycle", "Y"), ("cache_size", "20")]),
            "APP",
        );
        assert_eq!(seq.start_value, 100);
        assert_eq!(seq.increment, 5);
        assert!(seq.cycle);
        assert_eq!(seq.min_value, None);
    }
}
