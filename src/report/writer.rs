//! JSON report output
//!
//! [`ReportDocument`] is the field-stable projection of a compliance report
//! that downstream tooling consumes, over HTTP or as a file on disk.

use crate::error::AppError;
use crate::model::Snapshot;
use crate::report::compliance::{ComplianceReport, ComplianceSummary};
use crate::report::drift::{Drift, DriftCategory, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

const FILE_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Readiness verdict with its blocker counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReadiness {
    pub is_ready: bool,
    /// CRITICAL drift count
    pub blockers: usize,
    /// HIGH drift count
    pub warnings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub database_name: String,
    pub engine: String,
    pub schema_name: String,
    pub captured_at: DateTime<Utc>,
    pub table_count: usize,
    pub view_count: usize,
    pub routine_count: usize,
    pub trigger_count: usize,
    pub sequence_count: usize,
    pub checksum: String,
    pub metadata: BTreeMap<String, String>,
}

impl From<&Snapshot> for SnapshotInfo {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            database_name: snapshot.database_name.clone(),
            engine: snapshot.engine.code().to_string(),
            schema_name: snapshot.schema_name.clone(),
            captured_at: snapshot.captured_at,
            table_count: snapshot.tables.len(),
            view_count: snapshot.views.len(),
            routine_count: snapshot.routines.len(),
            trigger_count: snapshot.triggers.len(),
            sequence_count: snapshot.sequences.len(),
            checksum: snapshot.checksum(),
            metadata: snapshot.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPair {
    pub standard: SnapshotInfo,
    pub user: SnapshotInfo,
}

/// One drift as it appears in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRecord {
    pub object_type: String,
    pub object_name: String,
    /// Human label of the drift kind, e.g. "Missing in User Schema"
    pub drift_type: String,
    pub severity: String,
    pub severity_icon: String,
    pub standard_value: String,
    pub user_value: String,
    pub description: String,
    pub recommendation: String,
}

impl From<&Drift> for DriftRecord {
    fn from(drift: &Drift) -> Self {
        Self {
            object_type: drift.object_type.clone(),
            object_name: drift.object_name.clone(),
            drift_type: drift.kind.label().to_string(),
            severity: drift.severity.name().to_string(),
            severity_icon: drift.severity.icon().to_string(),
            standard_value: drift.standard_value.clone(),
            user_value: drift.user_value.clone(),
            description: drift.description.clone(),
            recommendation: drift.recommendation.clone(),
        }
    }
}

/// Complete report document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub summary: ReportSummary,
    pub migration_readiness: MigrationReadiness,
    pub schemas: SchemaPair,
    /// Drift records grouped by category, in discovery order within a group
    pub drifts: BTreeMap<DriftCategory, Vec<DriftRecord>>,
    pub recommendations: Vec<String>,
}

/// Serialized form of [`ComplianceSummary`]; enum keys become plain strings
/// so the document can also be read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub compliance_score: f64,
    pub total_objects: usize,
    pub total_drifts: usize,
    pub critical_drifts: usize,
    pub high_drifts: usize,
    pub migration_ready: bool,
    pub by_severity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
    pub standard_summary: String,
    pub user_summary: String,
}

impl From<&ComplianceSummary> for ReportSummary {
    fn from(summary: &ComplianceSummary) -> Self {
        Self {
            compliance_score: summary.compliance_score,
            total_objects: summary.total_objects,
            total_drifts: summary.total_drifts,
            critical_drifts: summary.critical_drifts,
            high_drifts: summary.high_drifts,
            migration_ready: summary.migration_ready,
            by_severity: summary
                .by_severity
                .iter()
                .map(|(k, v)| (k.name().to_string(), *v))
                .collect(),
            by_category: summary
                .by_category
                .iter()
                .map(|(k, v)| (k.name().to_string(), *v))
                .collect(),
            by_kind: summary
                .by_kind
                .iter()
                .map(|(k, v)| (k.code().to_string(), *v))
                .collect(),
            standard_summary: summary.standard_summary.clone(),
            user_summary: summary.user_summary.clone(),
        }
    }
}

impl ReportDocument {
    pub fn from_report(report: &ComplianceReport) -> Self {
        let mut drifts: BTreeMap<DriftCategory, Vec<DriftRecord>> = BTreeMap::new();
        for drift in report.drifts() {
            drifts.entry(drift.category).or_default().push(DriftRecord::from(drift));
        }

        Self {
            report_id: report.report_id(),
            generated_at: report.generated_at(),
            tool_version: TOOL_VERSION.to_string(),
            summary: ReportSummary::from(report.summary()),
            migration_readiness: MigrationReadiness {
                is_ready: report.is_migration_ready(),
                blockers: report.drifts_by_severity(Severity::Critical).len(),
                warnings: report.drifts_by_severity(Severity::High).len(),
            },
            schemas: SchemaPair {
                standard: SnapshotInfo::from(report.standard()),
                user: SnapshotInfo::from(report.user()),
            },
            drifts,
            recommendations: recommendations(report),
        }
    }
}

/// Human guidance derived from the drift mix
pub fn recommendations(report: &ComplianceReport) -> Vec<String> {
    let mut lines = Vec::new();

    let critical = report.drifts_by_severity(Severity::Critical).len();
    let high = report.drifts_by_severity(Severity::High).len();

    if critical > 0 {
        lines.push(format!(
            "CRITICAL: {} critical issues must be resolved before migration",
            critical
        ));
    }
    if high > 0 {
        lines.push(format!("HIGH: {} high-priority issues should be reviewed", high));
    }

    if !report.drifts_by_category("Tables").is_empty() {
        lines.push("Review missing or modified tables - these may cause data integrity issues".to_string());
    }
    if !report.drifts_by_category("Routines").is_empty() {
        lines.push("Stored procedures/functions differ - test application functionality thoroughly".to_string());
    }
    if !report.drifts_by_category("Triggers").is_empty() {
        lines.push("Trigger differences detected - verify automated business logic".to_string());
    }

    if report.is_migration_ready() {
        lines.push("✅ Schema is migration-ready. Proceed with standard migration procedures.".to_string());
    } else {
        lines.push("❌ Schema is NOT migration-ready. Resolve critical and high issues first.".to_string());
    }

    lines
}

/// Writes report documents to disk
pub struct ReportWriter;

impl ReportWriter {
    /// File name for a report generated at `at`
    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("compliance_report_{}.json", at.format(FILE_DATE_FORMAT))
    }

    /// Write `report` as pretty JSON under `dir`, creating the directory.
    pub async fn write(report: &ComplianceReport, dir: &Path) -> Result<PathBuf, AppError> {
        let document = ReportDocument::from_report(report);
        Self::write_document(&document, dir).await
    }

    pub async fn write_document(document: &ReportDocument, dir: &Path) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(Self::file_name(Utc::now()));
        let json = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&path, json).await?;

        info!("📄 Report written to: {}", path.display());
        Ok(path)
    }
}
