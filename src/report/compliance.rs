//! Compliance report: both snapshots, the ordered drift list and the
//! aggregate verdict.

use crate::model::Snapshot;
use crate::report::drift::{Drift, DriftCategory, DriftKind, Severity};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Aggregated counts and verdict, computed once per report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    /// 0.0 - 100.0, one decimal place
    pub compliance_score: f64,
    pub total_objects: usize,
    pub total_drifts: usize,
    pub critical_drifts: usize,
    pub high_drifts: usize,
    pub migration_ready: bool,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_category: BTreeMap<DriftCategory, usize>,
    pub by_kind: BTreeMap<DriftKind, usize>,
    pub standard_summary: String,
    pub user_summary: String,
}

/// Score drift count against the number of top-level standard objects.
///
/// An empty standard scores 100 regardless of drift.
pub fn compliance_score(drift_count: usize, total_objects: usize) -> f64 {
    if total_objects == 0 {
        return 100.0;
    }
    let raw = 100.0 - (drift_count as f64 * 100.0 / total_objects as f64);
    (raw.max(0.0) * 10.0).round() / 10.0
}

#[derive(Debug)]
pub struct ComplianceReport {
    report_id: Uuid,
    generated_at: DateTime<Utc>,
    standard: Arc<Snapshot>,
    user: Arc<Snapshot>,
    drifts: Vec<Drift>,
    /// Empty until first requested; cleared whenever the drift list changes
    summary: OnceCell<ComplianceSummary>,
}

impl ComplianceReport {
    pub(crate) fn new(standard: Arc<Snapshot>, user: Arc<Snapshot>) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            standard,
            user,
            drifts: Vec::new(),
            summary: OnceCell::new(),
        }
    }

    pub(crate) fn extend_drifts(&mut self, drifts: Vec<Drift>) {
        self.drifts.extend(drifts);
        self.summary = OnceCell::new();
    }

    pub fn report_id(&self) -> Uuid {
        self.report_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn standard(&self) -> &Snapshot {
        &self.standard
    }

    pub fn user(&self) -> &Snapshot {
        &self.user
    }

    /// Drifts in discovery order
    pub fn drifts(&self) -> &[Drift] {
        &self.drifts
    }

    /// The cached summary, computing it on first access
    pub fn summary(&self) -> &ComplianceSummary {
        self.summary.get_or_init(|| self.compute_summary())
    }

    /// Discard any cached summary and compute it again
    pub fn calculate_summary(&mut self) -> &ComplianceSummary {
        self.summary = OnceCell::new();
        self.summary()
    }

    pub fn is_summary_computed(&self) -> bool {
        self.summary.get().is_some()
    }

    /// No drift is CRITICAL or HIGH
    pub fn is_migration_ready(&self) -> bool {
        !self.drifts.iter().any(|d| d.severity.blocks_migration())
    }

    pub fn drifts_by_severity(&self, severity: Severity) -> Vec<&Drift> {
        self.drifts.iter().filter(|d| d.severity == severity).collect()
    }

    /// Category names match case-insensitively ("tables" finds "Tables")
    pub fn drifts_by_category(&self, category: &str) -> Vec<&Drift> {
        self.drifts
            .iter()
            .filter(|d| d.category.name().eq_ignore_ascii_case(category))
            .collect()
    }

    fn compute_summary(&self) -> ComplianceSummary {
        let mut by_severity = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut by_kind = BTreeMap::new();

        for drift in &self.drifts {
            *by_severity.entry(drift.severity).or_insert(0) += 1;
            *by_category.entry(drift.category).or_insert(0) += 1;
            *by_kind.entry(drift.kind).or_insert(0) += 1;
        }

        let critical_drifts = by_severity.get(&Severity::Critical).copied().unwrap_or(0);
        let high_drifts = by_severity.get(&Severity::High).copied().unwrap_or(0);
        let total_objects = self.standard.object_count();
        let total_drifts = self.drifts.len();

        ComplianceSummary {
            compliance_score: compliance_score(total_drifts, total_objects),
            total_objects,
            total_drifts,
            critical_drifts,
            high_drifts,
            migration_ready: critical_drifts == 0 && high_drifts == 0,
            by_severity,
            by_category,
            by_kind,
            standard_summary: self.standard.summary(),
            user_summary: self.user.summary(),
        }
    }
}
