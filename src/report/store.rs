//! Report Store
//!
//! Keeps generated report documents in memory so they can be fetched again
//! after the request that produced them.

use crate::report::writer::ReportDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lightweight listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListing {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub standard_database: String,
    pub user_database: String,
    pub compliance_score: f64,
    pub total_drifts: usize,
    pub migration_ready: bool,
}

impl From<&ReportDocument> for ReportListing {
    fn from(doc: &ReportDocument) -> Self {
        Self {
            report_id: doc.report_id,
            generated_at: doc.generated_at,
            standard_database: doc.schemas.standard.database_name.clone(),
            user_database: doc.schemas.user.database_name.clone(),
            compliance_score: doc.summary.compliance_score,
            total_drifts: doc.summary.total_drifts,
            migration_ready: doc.summary.migration_ready,
        }
    }
}

/// Reports kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 100;

/// In-memory store for report documents, bounded to `capacity` entries.
/// Saving past the bound evicts the oldest report by generation time.
#[derive(Clone)]
pub struct ReportStore {
    reports: Arc<RwLock<HashMap<Uuid, ReportDocument>>>,
    capacity: usize,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            reports: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn save(&self, document: ReportDocument) -> ReportListing {
        let listing = ReportListing::from(&document);
        let mut reports = self.reports.write().await;
        reports.insert(document.report_id, document);

        while reports.len() > self.capacity {
            let Some(oldest) = reports
                .values()
                .min_by_key(|doc| doc.generated_at)
                .map(|doc| doc.report_id)
            else {
                break;
            };
            reports.remove(&oldest);
            tracing::debug!("Evicted report {}", oldest);
        }
        drop(reports);

        tracing::info!(
            "Stored report {}: score {:.1}, {} drifts",
            listing.report_id,
            listing.compliance_score,
            listing.total_drifts
        );
        listing
    }

    pub async fn get(&self, report_id: Uuid) -> Option<ReportDocument> {
        self.reports.read().await.get(&report_id).cloned()
    }

    /// Newest first
    pub async fn list(&self) -> Vec<ReportListing> {
        let reports = self.reports.read().await;
        let mut list: Vec<ReportListing> = reports.values().map(ReportListing::from).collect();
        list.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        list
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}
