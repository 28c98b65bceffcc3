//! MySQL dialect
//!
//! Everything comes from INFORMATION_SCHEMA. MySQL has no sequences.

use crate::capture::objects::{
    attach_parameters, attach_view_columns, routine_from_row, trigger_from_row, view_from_row,
};
use crate::capture::tables::{extract_tables_with, TableQueries};
use crate::capture::{degrade, merge_trigger_events, query_scalar, CatalogClient, Dialect};
use crate::error::AppError;
use crate::model::{EngineKind, Routine, Sequence, Table, Trigger, View};
use async_trait::async_trait;
use tracing::debug;

pub(crate) const CURRENT_SCHEMA: &str = "SELECT DATABASE() AS schema_name";

pub(crate) const SERVER_VERSION: &str = "SELECT VERSION() AS server_version";

pub(crate) const TABLE_QUERIES: TableQueries = TableQueries {
    tables: r#"
        SELECT TABLE_NAME AS table_name,
               TABLE_COMMENT AS table_comment,
               ENGINE AS storage_engine
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
    "#,
    columns: r#"
        SELECT c.TABLE_NAME AS table_name,
               c.COLUMN_NAME AS column_name,
               c.DATA_TYPE AS data_type,
               COALESCE(c.CHARACTER_MAXIMUM_LENGTH, c.NUMERIC_PRECISION, 0) AS column_size,
               COALESCE(c.NUMERIC_SCALE, 0) AS numeric_scale,
               c.IS_NULLABLE AS is_nullable,
               c.COLUMN_DEFAULT AS column_default,
               c.ORDINAL_POSITION AS ordinal_position,
               CASE WHEN c.EXTRA LIKE '%auto_increment%' THEN 'YES' ELSE 'NO' END AS is_auto_increment
        FROM INFORMATION_SCHEMA.COLUMNS c
        JOIN INFORMATION_SCHEMA.TABLES t
            ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
        WHERE c.TABLE_SCHEMA = ? AND t.TABLE_TYPE = 'BASE TABLE'
        ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
    "#,
    constraints: r#"
        SELECT tc.TABLE_NAME AS table_name,
               tc.CONSTRAINT_NAME AS constraint_name,
               tc.CONSTRAINT_TYPE AS constraint_type,
               kcu.COLUMN_NAME AS column_name,
               kcu.REFERENCED_TABLE_NAME AS referenced_table,
               kcu.REFERENCED_COLUMN_NAME AS referenced_column,
               rc.DELETE_RULE AS delete_rule,
               rc.UPDATE_RULE AS update_rule
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON kcu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
            AND kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
            AND kcu.TABLE_NAME = tc.TABLE_NAME
        LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
            ON rc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
            AND rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
        WHERE tc.TABLE_SCHEMA = ?
        ORDER BY tc.TABLE_NAME, tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
    "#,
    indexes: r#"
        SELECT TABLE_NAME AS table_name,
               INDEX_NAME AS index_name,
               COLUMN_NAME AS column_name,
               CASE WHEN NON_UNIQUE = 0 THEN 'YES' ELSE 'NO' END AS is_unique,
               INDEX_TYPE AS index_type
        FROM INFORMATION_SCHEMA.STATISTICS
        WHERE TABLE_SCHEMA = ?
        ORDER BY TABLE_NAME, INDEX_NAME, SEQ_IN_INDEX
    "#,
};

pub(crate) const ROUTINES: &str = r#"
    SELECT ROUTINE_NAME AS routine_name,
           ROUTINE_TYPE AS routine_type,
           DATA_TYPE AS return_type,
           ROUTINE_DEFINITION AS definition,
           EXTERNAL_LANGUAGE AS language
    FROM INFORMATION_SCHEMA.ROUTINES
    WHERE ROUTINE_SCHEMA = ?
    ORDER BY ROUTINE_NAME
"#;

pub(crate) const ROUTINE_PARAMETERS: &str = r#"
    SELECT SPECIFIC_NAME AS routine_name,
           PARAMETER_NAME AS parameter_name,
           DATA_TYPE AS data_type,
           PARAMETER_MODE AS parameter_mode,
           ORDINAL_POSITION AS ordinal_position
    FROM INFORMATION_SCHEMA.PARAMETERS
    WHERE SPECIFIC_SCHEMA = ?
    ORDER BY SPECIFIC_NAME, ORDINAL_POSITION
"#;

pub(crate) const TRIGGERS: &str = r#"
    SELECT TRIGGER_NAME AS trigger_name,
           EVENT_OBJECT_TABLE AS table_name,
           ACTION_TIMING AS timing,
           EVENT_MANIPULATION AS event,
           ACTION_STATEMENT AS definition
    FROM INFORMATION_SCHEMA.TRIGGERS
    WHERE TRIGGER_SCHEMA = ?
    ORDER BY TRIGGER_NAME
"#;

pub(crate) const VIEWS: &str = r#"
    SELECT TABLE_NAME AS view_name,
           VIEW_DEFINITION AS definition,
           IS_UPDATABLE AS is_updatable
    FROM INFORMATION_SCHEMA.VIEWS
    WHERE TABLE_SCHEMA = ?
    ORDER BY TABLE_NAME
"#;

pub(crate) const VIEW_COLUMNS: &str = r#"
    SELECT c.TABLE_NAME AS view_name,
           c.COLUMN_NAME AS column_name
    FROM INFORMATION_SCHEMA.COLUMNS c
    JOIN INFORMATION_SCHEMA.VIEWS v
        ON v.TABLE_SCHEMA = c.TABLE_SCHEMA AND v.TABLE_NAME = c.TABLE_NAME
    WHERE c.TABLE_SCHEMA = ?
    ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
"#;

pub struct MysqlDialect;

impl MysqlDialect {
    async fn try_routines(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Routine>, AppError> {
        let mut routines: Vec<Routine> = client
            .query(ROUTINES, &[schema])
            .await?
            .iter()
            .map(|row| routine_from_row(row, schema))
            .collect();

        attach_parameters(
            self.engine(),
            &mut routines,
            client.query(ROUTINE_PARAMETERS, &[schema]).await,
        );
        Ok(routines)
    }

    async fn try_triggers(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Trigger>, AppError> {
        let rows = client.query(TRIGGERS, &[schema]).await?;
        Ok(merge_trigger_events(rows.iter().map(trigger_from_row).collect()))
    }

    async fn try_views(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<View>, AppError> {
        let mut views: Vec<View> = client
            .query(VIEWS, &[schema])
            .await?
            .iter()
            .map(|row| view_from_row(row, schema))
            .collect();

        attach_view_columns(self.engine(), &mut views, client.query(VIEW_COLUMNS, &[schema]).await);
        Ok(views)
    }
}

#[async_trait]
impl Dialect for MysqlDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Mysql
    }

    fn fallback_schema(&self) -> &'static str {
        "compliance_check"
    }

    async fn resolve_default_schema(&self, client: &dyn CatalogClient) -> String {
        query_scalar(client, CURRENT_SCHEMA, "schema_name")
            .await
            .unwrap_or_else(|| self.fallback_schema().to_string())
    }

    async fn server_version(&self, client: &dyn CatalogClient) -> Option<String> {
        query_scalar(client, SERVER_VERSION, "server_version").await
    }

    async fn extract_tables(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Table>, AppError> {
        extract_tables_with(client, schema, &TABLE_QUERIES).await
    }

    async fn extract_routines(&self, client: &dyn CatalogClient, schema: &str) -> Vec<Routine> {
        degrade(self.engine(), "routines", self.try_routines(client, schema).await)
    }

    async fn extract_triggers(&self, client: &dyn CatalogClient, schema: &str) -> Vec<Trigger> {
        degrade(self.engine(), "triggers", self.try_triggers(client, schema).await)
    }

    async fn extract_sequences(&self, _client: &dyn CatalogClient, schema: &str) -> Vec<Sequence> {
        debug!("MySQL has no sequences; skipping schema {}", schema);
        Vec::new()
    }

    async fn extract_views(&self, client: &dyn CatalogClient, schema: &str) -> Vec<View> {
        degrade(self.engine(), "views", self.try_views(client, schema).await)
    }
}
