//! Drift taxonomy: one classified discrepancy between standard and user schema.
//!
//! The description and recommendation templates are user-facing contract text.
//! Downstream tooling pattern-matches on them, so keep them stable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Drift severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
            Severity::Info => "🔵",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical - Blocks Migration",
            Severity::High => "High - Likely to Cause Issues",
            Severity::Medium => "Medium - Should Be Reviewed",
            Severity::Low => "Low - Minor Difference",
            Severity::Info => "Info - Cosmetic Only",
        }
    }

    /// CRITICAL and HIGH drift block migration
    pub fn blocks_migration(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What kind of discrepancy was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftKind {
    MissingInUser,
    MissingInStandard,
    Modified,
    TypeMismatch,
    DefinitionChanged,
}

impl DriftKind {
    pub fn label(&self) -> &'static str {
        match self {
            DriftKind::MissingInUser => "Missing in User Schema",
            DriftKind::MissingInStandard => "Extra in User Schema",
            DriftKind::Modified => "Modified",
            DriftKind::TypeMismatch => "Data Type Mismatch",
            DriftKind::DefinitionChanged => "Definition Changed",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DriftKind::MissingInUser => "MISSING_IN_USER",
            DriftKind::MissingInStandard => "MISSING_IN_STANDARD",
            DriftKind::Modified => "MODIFIED",
            DriftKind::TypeMismatch => "TYPE_MISMATCH",
            DriftKind::DefinitionChanged => "DEFINITION_CHANGED",
        }
    }
}

/// Object category a drift belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DriftCategory {
    Tables,
    Columns,
    Indexes,
    Constraints,
    Routines,
    Triggers,
    Sequences,
    Views,
}

impl DriftCategory {
    pub fn name(&self) -> &'static str {
        match self {
            DriftCategory::Tables => "Tables",
            DriftCategory::Columns => "Columns",
            DriftCategory::Indexes => "Indexes",
            DriftCategory::Constraints => "Constraints",
            DriftCategory::Routines => "Routines",
            DriftCategory::Triggers => "Triggers",
            DriftCategory::Sequences => "Sequences",
            DriftCategory::Views => "Views",
        }
    }
}

impl fmt::Display for DriftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single detected discrepancy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drift {
    pub category: DriftCategory,
    /// Human label, e.g. "Table", "Column Data Type", "FOREIGN_KEY"
    pub object_type: String,
    /// Dot-qualified when nested, e.g. `users.email`
    pub object_name: String,
    pub kind: DriftKind,
    pub severity: Severity,
    pub standard_value: String,
    pub user_value: String,
    pub description: String,
    pub recommendation: String,
}

impl Drift {
    /// Object present in standard, absent in user
    pub(crate) fn missing(
        category: DriftCategory,
        object_type: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let object_type = object_type.into();
        let name = name.into();
        Self {
            description: format!(
                "{} '{}' exists in standard but missing in user schema",
                object_type, name
            ),
            recommendation: format!(
                "Add the missing {} '{}' to match the standard schema",
                object_type.to_lowercase(),
                name
            ),
            category,
            object_type,
            object_name: name,
            kind: DriftKind::MissingInUser,
            severity,
            standard_value: "Present".to_string(),
            user_value: "Missing".to_string(),
        }
    }

    /// Object present in user, absent in standard
    pub(crate) fn extra(
        category: DriftCategory,
        object_type: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let object_type = object_type.into();
        let name = name.into();
        Self {
            description: format!(
                "{} '{}' exists in user schema but not in standard",
                object_type, name
            ),
            recommendation: format!(
                "Review if {} '{}' should be removed or is a custom addition",
                object_type.to_lowercase(),
                name
            ),
            category,
            object_type,
            object_name: name,
            kind: DriftKind::MissingInStandard,
            severity,
            standard_value: "Not Present".to_string(),
            user_value: "Present".to_string(),
        }
    }

    /// Object present on both sides but differing
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn changed(
        category: DriftCategory,
        kind: DriftKind,
        object_type: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
        standard_value: impl Into<String>,
        user_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let object_type = object_type.into();
        let name = name.into();
        Self {
            recommendation: format!(
                "Modify {} '{}' to match the standard schema",
                object_type.to_lowercase(),
                name
            ),
            category,
            object_type,
            object_name: name,
            kind,
            severity,
            standard_value: standard_value.into(),
            user_value: user_value.into(),
            description: detail.into(),
        }
    }
}
