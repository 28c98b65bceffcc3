//! Stored logic and schema-level objects: routines, triggers, sequences, views.

use crate::normalize::{
    fold_ident, fold_type, normalize_definition, ordered_list, signature, sorted_list, Canonical,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stored routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutineKind {
    Procedure,
    Function,
    Package,
    PackageBody,
}

impl RoutineKind {
    pub fn label(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "PROCEDURE",
            RoutineKind::Function => "FUNCTION",
            RoutineKind::Package => "PACKAGE",
            RoutineKind::PackageBody => "PACKAGE_BODY",
        }
    }

    /// Map a catalog object type; anything unrecognized is a procedure
    pub fn from_catalog(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "FUNCTION" => RoutineKind::Function,
            "PACKAGE" => RoutineKind::Package,
            "PACKAGE BODY" | "PACKAGE_BODY" => RoutineKind::PackageBody,
            _ => RoutineKind::Procedure,
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameter passing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    InOut,
}

impl ParameterMode {
    pub fn label(&self) -> &'static str {
        match self {
            ParameterMode::In => "IN",
            ParameterMode::Out => "OUT",
            ParameterMode::InOut => "INOUT",
        }
    }

    /// Map an engine's mode text. Unrecognized or missing modes are `In`.
    pub fn from_catalog(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_uppercase()).as_deref() {
            Some("OUT") => ParameterMode::Out,
            Some("INOUT") | Some("IN/OUT") | Some("IN OUT") => ParameterMode::InOut,
            _ => ParameterMode::In,
        }
    }
}

/// Routine parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub data_type: Option<String>,
    #[serde(default)]
    pub mode: ParameterMode,
    pub position: i32,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, mode: ParameterMode, position: i32) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
            mode,
            position,
        }
    }

    fn signature_part(&self) -> String {
        format!(
            "{}:{}:{}",
            fold_ident(&self.name),
            fold_type(self.data_type.as_deref()),
            self.mode.label()
        )
    }
}

/// Stored procedure, function or package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub name: String,
    pub schema: String,
    pub kind: RoutineKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_type: Option<String>,
    /// Declaration order
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
}

impl Routine {
    pub fn new(name: impl Into<String>, schema: impl Into<String>, kind: RoutineKind) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            kind,
            return_type: None,
            parameters: Vec::new(),
            definition: None,
            language: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn normalized_definition(&self) -> Option<String> {
        self.definition.as_deref().map(normalize_definition)
    }
}

impl Canonical for Routine {
    fn canonical_signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(Parameter::signature_part).collect();
        signature([
            fold_ident(&self.name),
            self.kind.label().to_string(),
            self.return_type
                .as_deref()
                .map(|t| fold_type(Some(t)))
                .unwrap_or_else(|| "VOID".to_string()),
            ordered_list(&params),
        ])
    }
}

/// When a trigger fires relative to its event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
            TriggerTiming::InsteadOf => "INSTEAD_OF",
        }
    }

    /// Parse timing text such as `BEFORE EACH ROW` or `INSTEAD OF`; defaults to `After`
    pub fn from_catalog(value: Option<&str>) -> Self {
        let upper = value.map(str::to_uppercase).unwrap_or_default();
        if upper.contains("BEFORE") {
            TriggerTiming::Before
        } else if upper.contains("INSTEAD") {
            TriggerTiming::InsteadOf
        } else {
            TriggerTiming::After
        }
    }
}

/// Event set a trigger fires on, as a single union value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    InsertUpdate,
    InsertDelete,
    UpdateDelete,
    InsertUpdateDelete,
}

impl TriggerEvent {
    /// Build from individual event flags. `None` when no flag is set.
    pub fn from_flags(insert: bool, update: bool, delete: bool) -> Option<Self> {
        match (insert, update, delete) {
            (true, true, true) => Some(TriggerEvent::InsertUpdateDelete),
            (true, true, false) => Some(TriggerEvent::InsertUpdate),
            (true, false, true) => Some(TriggerEvent::InsertDelete),
            (false, true, true) => Some(TriggerEvent::UpdateDelete),
            (true, false, false) => Some(TriggerEvent::Insert),
            (false, true, false) => Some(TriggerEvent::Update),
            (false, false, true) => Some(TriggerEvent::Delete),
            (false, false, false) => None,
        }
    }

    /// (insert, update, delete)
    pub fn flags(&self) -> (bool, bool, bool) {
        match self {
            TriggerEvent::Insert => (true, false, false),
            TriggerEvent::Update => (false, true, false),
            TriggerEvent::Delete => (false, false, true),
            TriggerEvent::InsertUpdate => (true, true, false),
            TriggerEvent::InsertDelete => (true, false, true),
            TriggerEvent::UpdateDelete => (false, true, true),
            TriggerEvent::InsertUpdateDelete => (true, true, true),
        }
    }

    /// Parse catalog text like `INSERT OR UPDATE`. Unreadable text is `Insert`.
    pub fn from_catalog(value: Option<&str>) -> Self {
        let upper = value.map(str::to_uppercase).unwrap_or_default();
        Self::from_flags(
            upper.contains("INSERT"),
            upper.contains("UPDATE"),
            upper.contains("DELETE"),
        )
        .unwrap_or(TriggerEvent::Insert)
    }

    pub fn union(self, other: TriggerEvent) -> TriggerEvent {
        let (ai, au, ad) = self.flags();
        let (bi, bu, bd) = other.flags();
        Self::from_flags(ai || bi, au || bu, ad || bd).unwrap_or(self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
            TriggerEvent::InsertUpdate => "INSERT_UPDATE",
            TriggerEvent::InsertDelete => "INSERT_DELETE",
            TriggerEvent::UpdateDelete => "UPDATE_DELETE",
            TriggerEvent::InsertUpdateDelete => "INSERT_UPDATE_DELETE",
        }
    }
}

/// Trigger representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub name: String,
    pub table_name: String,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub definition: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Trigger {
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        timing: TriggerTiming,
        event: TriggerEvent,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            timing,
            event,
            definition: None,
            enabled: true,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn normalized_definition(&self) -> Option<String> {
        self.definition.as_deref().map(normalize_definition)
    }
}

impl Canonical for Trigger {
    fn canonical_signature(&self) -> String {
        signature([
            fold_ident(&self.name),
            fold_ident(&self.table_name),
            self.timing.label().to_string(),
            self.event.label().to_string(),
        ])
    }
}

/// Sequence representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub name: String,
    pub schema: String,
    pub start_value: i64,
    pub increment: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub cycle: bool,
    #[serde(default)]
    pub cache_size: i64,
}

impl Sequence {
    pub fn new(name: impl Into<String>, schema: impl Into<String>, start_value: i64, increment: i64) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            start_value,
            increment,
            min_value: None,
            max_value: None,
            cycle: false,
            cache_size: 0,
        }
    }
}

impl Canonical for Sequence {
    // Bounds and cache size are left out: engines report different defaults for them.
    fn canonical_signature(&self) -> String {
        signature([
            fold_ident(&self.name),
            self.start_value.to_string(),
            self.increment.to_string(),
            self.cycle.to_string(),
        ])
    }
}

/// View representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub updatable: bool,
}

impl View {
    pub fn new(name: impl Into<String>, schema: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            definition: None,
            updatable: false,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn normalized_definition(&self) -> Option<String> {
        self.definition.as_deref().map(normalize_definition)
    }
}

impl Canonical for View {
    fn canonical_signature(&self) -> String {
        signature([fold_ident(&self.name), sorted_list(&self.columns)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine_with(params: Vec<Parameter>) -> Routine {
        Routine::new("calc_total", "app", RoutineKind::Function).with_parameters(params)
    }

    #[test]
    fn test_routine_parameter_order_is_significant() {
        let a = routine_with(vec![
            Parameter::new("a", "int", ParameterMode::In, 1),
            Parameter::new("b", "int", ParameterMode::In, 2),
        ]);
        let b = routine_with(vec![
            Parameter::new("b", "int", ParameterMode::In, 1),
            Parameter::new("a", "int", ParameterMode::In, 2),
        ]);
        assert_ne!(a.canonical_signature(), b.canonical_signature());
    }

    #[test]
    fn test_routine_signature_defaults_return_to_void() {
        let r = Routine::new("p", "app", RoutineKind::Procedure);
        assert_eq!(r.canonical_signature(), "P|PROCEDURE|VOID|");
    }

    #[test]
    fn test_parameter_mode_mapping() {
        assert_eq!(ParameterMode::from_catalog(Some("OUT")), ParameterMode::Out);
        assert_eq!(ParameterMode::from_catalog(Some("INOUT")), ParameterMode::InOut);
        assert_eq!(ParameterMode::from_catalog(Some("IN/OUT")), ParameterMode::InOut);
        assert_eq!(ParameterMode::from_catalog(Some("VARIADIC")), ParameterMode::In);
        assert_eq!(ParameterMode::from_catalog(None), ParameterMode::In);
    }

    #[test]
    fn test_trigger_event_composite_parsing() {
        assert_eq!(
            TriggerEvent::from_catalog(Some("INSERT OR UPDATE")),
            TriggerEvent::InsertUpdate
        );
        assert_eq!(
            TriggerEvent::from_catalog(Some("delete")),
            TriggerEvent::Delete
        );
        assert_eq!(TriggerEvent::from_catalog(None), TriggerEvent::Insert);
    }

    #[test]
    fn test_trigger_event_union() {
        let merged = TriggerEvent::Insert
            .union(TriggerEvent::Update)
            .union(TriggerEvent::Delete);
        assert_eq!(merged, TriggerEvent::InsertUpdateDelete);
        assert_eq!(TriggerEvent::Update.union(TriggerEvent::Update), TriggerEvent::Update);
    }

    #[test]
    fn test_trigger_timing_parsing() {
        assert_eq!(TriggerTiming::from_catalog(Some("BEFORE EACH ROW")), TriggerTiming::Before);
        assert_eq!(TriggerTiming::from_catalog(Some("INSTEAD OF")), TriggerTiming::InsteadOf);
        assert_eq!(TriggerTiming::from_catalog(None), TriggerTiming::After);
    }

    #[test]
    fn test_sequence_signature_ignores_cache_size() {
        let mut a = Sequence::new("order_seq", "app", 1, 1);
        let mut b = a.clone();
        a.cache_size = 20;
        b.cache_size = 0;
        assert_eq!(a.canonical_signature(), b.canonical_signature());
    }

    #[test]
    fn test_view_column_order_does_not_matter() {
        let a = View::new("active_users", "app", &["id", "name"]);
        let b = View::new("ACTIVE_USERS", "app", &["name", "id"]);
        assert_eq!(a.canonical_signature(), b.canonical_signature());
    }

    #[test]
    fn test_routine_kind_from_catalog() {
        assert_eq!(RoutineKind::from_catalog("PACKAGE BODY"), RoutineKind::PackageBody);
        assert_eq!(RoutineKind::from_catalog("function"), RoutineKind::Function);
        assert_eq!(RoutineKind::from_catalog("anything"), RoutineKind::Procedure);
    }
}
