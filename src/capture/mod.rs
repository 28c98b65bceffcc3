//! Capture layer
//!
//! Turns a live database into a [`Snapshot`](crate::model::Snapshot). The
//! connection is abstracted as a [`CatalogClient`] that runs catalog queries and
//! returns text rows; each engine's catalog knowledge lives in a [`Dialect`].
//!
//! Only table extraction is fatal. Every other object category degrades to an
//! empty (or partial) collection with a warning when its queries fail.

pub mod connection;
pub mod inspector;
pub mod mssql;
pub mod mysql;
pub mod objects;
pub mod oracle;
pub mod orchestrator;
pub mod postgres;
pub mod tables;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::AppError;
use crate::model::{EngineKind, Routine, Sequence, Table, Trigger, View};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

pub use connection::ConnectionParams;
pub use inspector::SchemaInspector;
pub use orchestrator::{CaptureTarget, ComplianceOrchestrator, ComplianceOutcome};
pub use postgres::PgCatalogClient;

/// One catalog result row. Column names are lower-cased; every value is text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    values: HashMap<String, Option<String>>,
}

impl CatalogRow {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: AsRef<str>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v))
                .collect(),
        }
    }

    /// Raw value; `None` for SQL NULL and for absent columns
    pub fn text(&self, column: &str) -> Option<&str> {
        self.values
            .get(&column.to_lowercase())
            .and_then(|v| v.as_deref())
    }

    /// Value or empty string
    pub fn string(&self, column: &str) -> String {
        self.text(column).unwrap_or_default().to_string()
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.text(column).and_then(|v| v.trim().parse::<i64>().ok())
    }

    /// YES / Y / TRUE / T / 1 (any case) are true, everything else false
    pub fn flag(&self, column: &str) -> bool {
        matches!(
            self.text(column).map(|v| v.trim().to_uppercase()).as_deref(),
            Some("YES" | "Y" | "TRUE" | "T" | "1")
        )
    }
}

/// A live connection able to answer catalog queries
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Name of the database this client is connected to
    fn database_name(&self) -> &str;

    /// Run one query with positional text parameters
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, AppError>;
}

/// Which object categories a capture collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub include_views: bool,
    pub include_triggers: bool,
    pub include_sequences: bool,
    /// When false, routine, trigger and view bodies are dropped
    pub include_definitions: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            include_views: true,
            include_triggers: true,
            include_sequences: true,
            include_definitions: true,
        }
    }
}

/// Per-engine catalog extraction
#[async_trait]
pub trait Dialect: Send + Sync {
    fn engine(&self) -> EngineKind;

    /// Schema used when the current one cannot be resolved
    fn fallback_schema(&self) -> &'static str;

    /// The connection's current schema, or [`Dialect::fallback_schema`]
    async fn resolve_default_schema(&self, client: &dyn CatalogClient) -> String;

    /// Server version text, when the engine exposes one
    async fn server_version(&self, _client: &dyn CatalogClient) -> Option<String> {
        None
    }

    /// Tables with columns, indexes and constraints. Failure aborts the capture.
    async fn extract_tables(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Table>, AppError>;

    async fn extract_routines(&self, client: &dyn CatalogClient, schema: &str) -> Vec<Routine>;

    async fn extract_triggers(&self, client: &dyn CatalogClient, schema: &str) -> Vec<Trigger>;

    async fn extract_sequences(&self, client: &dyn CatalogClient, schema: &str) -> Vec<Sequence>;

    async fn extract_views(&self, client: &dyn CatalogClient, schema: &str) -> Vec<View>;
}

/// The dialect implementation for `engine`
pub fn dialect_for(engine: EngineKind) -> Box<dyn Dialect> {
    match engine {
        EngineKind::Mysql => Box::new(mysql::MysqlDialect),
        EngineKind::Oracle => Box::new(oracle::OracleDialect),
        EngineKind::Mssql => Box::new(mssql::MssqlDialect),
        EngineKind::Postgresql => Box::new(postgres::PostgresDialect),
    }
}

/// Log a failed category and continue with nothing
pub(crate) fn degrade<T>(engine: EngineKind, category: &str, result: Result<Vec<T>, AppError>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(
                "⚠️ Could not extract {} from {}: {}",
                category,
                engine.display_name(),
                e
            );
            Vec::new()
        }
    }
}

/// First row's `column` from a single-value query; `None` on error or no rows
pub(crate) async fn query_scalar(client: &dyn CatalogClient, sql: &str, column: &str) -> Option<String> {
    let rows = client.query(sql, &[]).await.ok()?;
    rows.first()?
        .text(column)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Fold per-event trigger rows into one trigger per name, keeping first-seen order
pub(crate) fn merge_trigger_events(triggers: Vec<Trigger>) -> Vec<Trigger> {
    let mut merged: Vec<Trigger> = Vec::new();
    for trigger in triggers {
        match merged
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(&trigger.name))
        {
            Some(position) => {
                let existing = &mut merged[position];
                existing.event = existing.event.union(trigger.event);
            }
            None => merged.push(trigger),
        }
    }
    merged
}
