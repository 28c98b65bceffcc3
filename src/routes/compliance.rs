//! Compliance route handlers
//!
//! Compare uploaded snapshots, run live checks against two databases, and
//! read back stored reports.

use crate::capture::{CaptureTarget, CatalogClient, ConnectionParams};
use crate::diff::DiffEngine;
use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::model::{EngineKind, Snapshot};
use crate::report::{ReportDocument, ReportListing};
use crate::routes::SuccessResponse;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Two snapshots to compare
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub standard: Snapshot,
    pub user: Snapshot,
}

/// Compare two uploaded snapshots
pub async fn compare(
    State(state): State<SharedState>,
    Json(mut payload): Json<CompareRequest>,
) -> ApiResult<Json<SuccessResponse<ReportDocument>>> {
    payload.standard.sort_columns();
    payload.user.sort_columns();
    payload
        .standard
        .validate()
        .map_err(|e| validation_error(format!("standard snapshot: {}", e)))?;
    payload
        .user
        .validate()
        .map_err(|e| validation_error(format!("user snapshot: {}", e)))?;

    let report = DiffEngine::compare(payload.standard, payload.user);
    let document = ReportDocument::from_report(&report);
    let listing = state.reports.save(document.clone()).await;

    Ok(Json(SuccessResponse::with_data(
        completion_message(&listing),
        document,
    )))
}

/// Live check against two databases
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Engine code; the configured default when omitted
    pub engine: Option<String>,

    #[validate(length(min = 10, message = "Standard connection string is required"))]
    pub standard_connection: String,

    #[validate(length(min = 10, message = "User connection string is required"))]
    pub user_connection: String,

    pub schema: Option<String>,

    #[serde(default)]
    pub write_report: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub report: ReportDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

/// Capture both databases in parallel and compare them
pub async fn check(
    State(state): State<SharedState>,
    Json(payload): Json<CheckRequest>,
) -> ApiResult<Json<SuccessResponse<CheckResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let compliance = &state.settings.compliance;
    let engine = match payload.engine.as_deref() {
        Some(code) => code.parse::<EngineKind>().map_err(AppError::BadRequest)?,
        None => compliance.default_engine,
    };
    if engine != EngineKind::Postgresql {
        return Err(AppError::UnsupportedEngine(engine.display_name().to_string()));
    }

    let standard_params = ConnectionParams::from_connection_string(&payload.standard_connection)?;
    let user_params = ConnectionParams::from_connection_string(&payload.user_connection)?;
    debug!(
        "Checking {} against {}",
        user_params.to_display_string(),
        standard_params.to_display_string()
    );

    let schema = payload
        .schema
        .filter(|s| !s.trim().is_empty())
        .or_else(|| compliance.schema.clone());
    let standard_client: Arc<dyn CatalogClient> = Arc::new(standard_params.connect()?);
    let user_client: Arc<dyn CatalogClient> = Arc::new(user_params.connect()?);

    let mut orchestrator = compliance.orchestrator();
    if payload.write_report {
        orchestrator = orchestrator.with_report_dir(compliance.report_dir.clone());
    }

    let outcome = orchestrator
        .run(
            CaptureTarget::new(standard_client, engine, schema.clone()),
            CaptureTarget::new(user_client, engine, schema),
        )
        .await?;

    let document = ReportDocument::from_report(&outcome.report);
    let listing = state.reports.save(document.clone()).await;

    Ok(Json(SuccessResponse::with_data(
        completion_message(&listing),
        CheckResponse {
            report: document,
            report_path: outcome.report_path.map(|p| p.display().to_string()),
        },
    )))
}

/// List stored reports, newest first
pub async fn list_reports(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<Vec<ReportListing>>>> {
    let reports = state.reports.list().await;

    Ok(Json(SuccessResponse::with_data(
        format!("{} report(s).", reports.len()),
        reports,
    )))
}

/// Fetch one stored report
pub async fn get_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<ReportDocument>>> {
    let document = state
        .reports
        .get(id)
        .await
        .ok_or_else(|| not_found_error(format!("Report {} not found", id)))?;

    Ok(Json(SuccessResponse::with_data("Report found.", document)))
}

fn completion_message(listing: &ReportListing) -> String {
    info!(
        "Report {} for '{}': score {:.1}, {} drifts",
        listing.report_id, listing.user_database, listing.compliance_score, listing.total_drifts
    );
    if listing.migration_ready {
        format!(
            "Compliance check complete: score {:.1}. Ready for migration.",
            listing.compliance_score
        )
    } else {
        format!(
            "Compliance check complete: score {:.1}. Not ready for migration.",
            listing.compliance_score
        )
    }
}
