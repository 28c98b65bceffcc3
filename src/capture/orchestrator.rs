//! Compliance orchestration
//!
//! Captures the standard and user databases concurrently, compares them, and
//! optionally writes the JSON report.

use crate::capture::{CaptureOptions, CatalogClient, SchemaInspector};
use crate::diff::DiffEngine;
use crate::error::{capture_error, AppError};
use crate::model::{EngineKind, Snapshot};
use crate::report::{ComplianceReport, ReportWriter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const STANDARD_SIDE: &str = "STANDARD";
const USER_SIDE: &str = "USER";

/// One side of a check: a live client plus what to capture from it
#[derive(Clone)]
pub struct CaptureTarget {
    pub client: Arc<dyn CatalogClient>,
    pub engine: EngineKind,
    /// Explicit schema; `None` lets the dialect resolve it
    pub schema: Option<String>,
}

impl CaptureTarget {
    pub fn new(client: Arc<dyn CatalogClient>, engine: EngineKind, schema: Option<String>) -> Self {
        Self { client, engine, schema }
    }
}

pub struct ComplianceOutcome {
    pub report: ComplianceReport,
    /// Set when a report directory was configured
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ComplianceOrchestrator {
    options: CaptureOptions,
    capture_timeout: Duration,
    report_dir: Option<PathBuf>,
}

impl ComplianceOrchestrator {
    pub fn new(options: CaptureOptions, capture_timeout: Duration) -> Self {
        Self {
            options,
            capture_timeout,
            report_dir: None,
        }
    }

    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    /// Capture both sides in parallel, then compare.
    ///
    /// Either capture failing (or exceeding the timeout) fails the whole run with
    /// [`AppError::Capture`] naming the side.
    pub async fn run(&self, standard: CaptureTarget, user: CaptureTarget) -> Result<ComplianceOutcome, AppError> {
        info!("🚦 Starting compliance check");

        let standard_task = tokio::spawn(capture_side(
            STANDARD_SIDE,
            standard,
            self.options,
            self.capture_timeout,
        ));
        let user_task = tokio::spawn(capture_side(USER_SIDE, user, self.options, self.capture_timeout));

        let (standard_result, user_result) = tokio::join!(standard_task, user_task);
        let standard = standard_result.map_err(|e| capture_error(STANDARD_SIDE, e))??;
        let user = user_result.map_err(|e| capture_error(USER_SIDE, e))??;

        let report = DiffEngine::compare(standard, user);

        let report_path = match &self.report_dir {
            Some(dir) => Some(ReportWriter::write(&report, dir).await?),
            None => None,
        };

        Ok(ComplianceOutcome { report, report_path })
    }
}

async fn capture_side(
    side: &'static str,
    target: CaptureTarget,
    options: CaptureOptions,
    timeout: Duration,
) -> Result<Snapshot, AppError> {
    info!("📸 Capturing {} schema from {}", side, target.client.database_name());

    let capture = SchemaInspector::capture(
        target.client.as_ref(),
        target.engine,
        target.schema.as_deref(),
        options,
    );

    match tokio::time::timeout(timeout, capture).await {
        Ok(Ok(snapshot)) => {
            info!("✅ {} capture: {} objects", side, snapshot.object_count());
            Ok(snapshot)
        }
        Ok(Err(e)) => {
            error!("❌ {} capture failed: {}", side, e);
            Err(capture_error(side, e))
        }
        Err(_) => {
            error!("❌ {} capture timed out after {:?}", side, timeout);
            Err(capture_error(side, format!("timed out after {} seconds", timeout.as_secs())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake::{row, FakeCatalog};
    use crate::capture::postgres;
    use crate::report::Severity;
    use pretty_assertions::assert_eq;

    fn catalog(database: &str, columns: Vec<crate::capture::CatalogRow>) -> Arc<dyn CatalogClient> {
        Arc::new(
            FakeCatalog::new(database)
                .respond(postgres::TABLE_QUERIES.tables, vec![row(&[("table_name", "accounts")])])
                .respond(postgres::TABLE_QUERIES.columns, columns),
        )
    }

    fn column(name: &str, data_type: &str, position: &str) -> crate::capture::CatalogRow {
        row(&[
            ("table_name", "accounts"), ("column_name", name), ("data_type", data_type),
            ("is_nullable", "NO"), ("ordinal_position", position),
        ])
    }

    fn orchestrator() -> ComplianceOrchestrator {
        ComplianceOrchestrator::new(CaptureOptions::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_run_compares_both_sides() {
        let standard = catalog("golden", vec![column("id", "int4", "1"), column("balance", "numeric", "2")]);
        let user = catalog("candidate", vec![column("id", "int4", "1")]);

        let outcome = orchestrator()
            .run(
                CaptureTarget::new(standard, EngineKind::Postgresql, Some("public".to_string())),
                CaptureTarget::new(user, EngineKind::Postgresql, Some("public".to_string())),
            )
            .await
            .unwrap();

        assert_eq!(outcome.report.standard().database_name, "golden");
        assert_eq!(outcome.report.user().database_name, "candidate");
        assert_eq!(outcome.report.drifts_by_severity(Severity::Critical).len(), 1);
        assert!(!outcome.report.is_migration_ready());
        assert!(outcome.report_path.is_none());
    }

    #[tokio::test]
    async fn test_failed_side_is_named() {
        let standard = catalog("golden", vec![column("id", "int4", "1")]);
        let user: Arc<dyn CatalogClient> = Arc::new(
            FakeCatalog::new("candidate").fail(postgres::TABLE_QUERIES.tables, "connection refused"),
        );

        let result = orchestrator()
            .run(
                CaptureTarget::new(standard, EngineKind::Postgresql, None),
                CaptureTarget::new(user, EngineKind::Postgresql, None),
            )
            .await;

        match result {
            Err(AppError::Capture { side, message }) => {
                assert_eq!(side, "USER");
                assert!(message.contains("connection refused"));
            }
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("capture should have failed"),
        }
    }

    #[tokio::test]
    async fn test_writes_report_when_directory_configured() {
        let dir = std::env::temp_dir().join(format!("compliance-orchestrator-{}", uuid::Uuid::new_v4()));
        let standard = catalog("golden", vec![column("id", "int4", "1")]);
        let user = catalog("candidate", vec![column("id", "int4", "1")]);

        let outcome = orchestrator()
            .with_report_dir(&dir)
            .run(
                CaptureTarget::new(standard, EngineKind::Postgresql, None),
                CaptureTarget::new(user, EngineKind::Postgresql, None),
            )
            .await
            .unwrap();

        let path = outcome.report_path.unwrap();
        assert!(path.exists());
        assert!(outcome.report.is_migration_ready());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
