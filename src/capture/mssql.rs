//! SQL Server dialect
//!
//! INFORMATION_SCHEMA for tables, routines and views; `sys` catalog views for
//! triggers, sequences, indexes and module bodies. Parameters bind as `@P1`.

use crate::capture::objects::{
    attach_parameters, attach_view_columns, routine_from_row, sequence_from_row, trigger_from_row,
    view_from_row,
};
use crate::capture::tables::{extract_tables_with, TableQueries};
use crate::capture::{degrade, merge_trigger_events, query_scalar, CatalogClient, Dialect};
use crate::error::AppError;
use crate::model::{EngineKind, Routine, Sequence, Table, Trigger, View};
use async_trait::async_trait;

pub(crate) const CURRENT_SCHEMA: &str = "SELECT SCHEMA_NAME() AS schema_name";

pub(crate) const SERVER_VERSION: &str =
    "SELECT CAST(SERVERPROPERTY('ProductVersion') AS NVARCHAR(128)) AS server_version";

pub(crate) const TABLE_QUERIES: TableQueries = TableQueries {
    tables: r#"
        SELECT t.TABLE_NAME AS table_name,
               CAST(ep.value AS NVARCHAR(4000)) AS table_comment
        FROM INFORMATION_SCHEMA.TABLES t
        LEFT JOIN sys.extended_properties ep
            ON ep.major_id = OBJECT_ID(QUOTENAME(t.TABLE_SCHEMA) + '.' + QUOTENAME(t.TABLE_NAME))
            AND ep.minor_id = 0 AND ep.name = 'MS_Description'
        WHERE t.TABLE_SCHEMA = @P1 AND t.TABLE_TYPE = 'BASE TABLE'
        ORDER BY t.TABLE_NAME
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
               COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)),
                              c.COLUMN_NAME, 'IsIdentity') AS is_auto_increment
        FROM INFORMATION_SCHEMA.COLUMNS c
        JOIN INFORMATION_SCHEMA.TABLES t
            ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
        WHERE c.TABLE_SCHEMA = @P1 AND t.TABLE_TYPE = 'BASE TABLE'
        ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
    "#,
    constraints: r#"
        SELECT tc.TABLE_NAME AS table_name,
               tc.CONSTRAINT_NAME AS constraint_name,
               tc.CONSTRAINT_TYPE AS constraint_type,
               kcu.COLUMN_NAME AS column_name,
               ref.TABLE_NAME AS referenced_table,
               ref.COLUMN_NAME AS referenced_column,
               rc.DELETE_RULE AS delete_rule,
               rc.UPDATE_RULE AS update_rule,
               cc.CHECK_CLAUSE AS check_clause
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON kcu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
            AND kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
        LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
            ON rc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
            AND rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
        LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE ref
            ON ref.CONSTRAINT_SCHEMA = rc.UNIQUE_CONSTRAINT_SCHEMA
            AND ref.CONSTRAINT_NAME = rc.UNIQUE_CONSTRAINT_NAME
            AND ref.ORDINAL_POSITION = kcu.ORDINAL_POSITION
        LEFT JOIN INFORMATION_SCHEMA.CHECK_CONSTRAINTS cc
            ON cc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
            AND cc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
        WHERE tc.TABLE_SCHEMA = @P1
        ORDER BY tc.TABLE_NAME, tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
    "#,
    indexes: r#"
        SELECT t.name AS table_name,
               i.name AS index_name,
               c.name AS column_name,
               i.is_unique AS is_unique,
               i.type_desc AS index_type
        FROM sys.indexes i
        JOIN sys.tables t ON t.object_id = i.object_id
        JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        WHERE SCHEMA_NAME(t.schema_id) = @P1 AND i.name IS NOT NULL AND ic.is_included_column = 0
        ORDER BY t.name, i.name, ic.key_ordinal
    "#,
};

pub(crate) const ROUTINES: &str = r#"
    SELECT r.ROUTINE_NAME AS routine_name,
           r.ROUTINE_TYPE AS routine_type,
           r.DATA_TYPE AS return_type,
           m.definition AS definition,
           'T-SQL' AS language
    FROM INFORMATION_SCHEMA.ROUTINES r
    LEFT JOIN sys.sql_modules m
        ON m.object_id = OBJECT_ID(QUOTENAME(r.ROUTINE_SCHEMA) + '.' + QUOTENAME(r.ROUTINE_NAME))
    WHERE r.ROUTINE_SCHEMA = @P1
    ORDER BY r.ROUTINE_NAME
"#;

pub(crate) const ROUTINE_PARAMETERS: &str = r#"
    SELECT SPECIFIC_NAME AS routine_name,
           PARAMETER_NAME AS parameter_name,
           DATA_TYPE AS data_type,
           PARAMETER_MODE AS parameter_mode,
           ORDINAL_POSITION AS ordinal_position
    FROM INFORMATION_SCHEMA.PARAMETERS
    WHERE SPECIFIC_SCHEMA = @P1
    ORDER BY SPECIFIC_NAME, ORDINAL_POSITION
"#;

/// One row per trigger event
pub(crate) const TRIGGERS: &str = r#"
    SELECT t.name AS trigger_name,
           OBJECT_NAME(t.parent_id) AS table_name,
           CASE WHEN t.is_instead_of_trigger = 1 THEN 'INSTEAD OF' ELSE 'AFTER' END AS timing,
           te.type_desc AS event,
           m.definition AS definition,
           CASE WHEN t.is_disabled = 0 THEN 'YES' ELSE 'NO' END AS is_enabled
    FROM sys.triggers t
    JOIN sys.trigger_events te ON te.object_id = t.object_id
    LEFT JOIN sys.sql_modules m ON m.object_id = t.object_id
    WHERE t.parent_class = 1 AND OBJECT_SCHEMA_NAME(t.parent_id) = @P1
    ORDER BY t.name
"#;

pub(crate) const SEQUENCES: &str = r#"
    SELECT s.name AS sequence_name,
           CAST(s.start_value AS BIGINT) AS start_value,
           CAST(s.increment AS BIGINT) AS increment,
           CAST(s.minimum_value AS BIGINT) AS min_value,
           CAST(s.maximum_value AS BIGINT) AS max_value,
           s.is_cycling AS is_cycle,
           s.cache_size AS cache_size
    FROM sys.sequences s
    WHERE SCHEMA_NAME(s.schema_id) = @P1
    ORDER BY s.name
"#;

pub(crate) const VIEWS: &str = r#"
    SELECT TABLE_NAME AS view_name,
           VIEW_DEFINITION AS definition,
           IS_UPDATABLE AS is_updatable
    FROM INFORMATION_SCHEMA.VIEWS
    WHERE TABLE_SCHEMA = @P1
    ORDER BY TABLE_NAME
"#;

pub(crate) const VIEW_COLUMNS: &str = r#"
    SELECT c.TABLE_NAME AS view_name,
           c.COLUMN_NAME AS column_name
    FROM INFORMATION_SCHEMA.COLUMNS c
    JOIN INFORMATION_SCHEMA.VIEWS v
        ON v.TABLE_SCHEMA = c.TABLE_SCHEMA AND v.TABLE_NAME = c.TABLE_NAME
    WHERE c.TABLE_SCHEMA = @P1
    ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
"#;

pub struct MssqlDialect;

impl MssqlDialect {
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

    async fn try_sequences(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Sequence>, AppError> {
        let rows = client.query(SEQUENCES, &[schema]).await?;
        Ok(rows.iter().map(|row| sequence_from_row(row, schema)).collect())
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
impl Dialect for MssqlDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Mssql
    }

    fn fallback_schema(&self) -> &'static str {
        "dbo"
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

    async fn extract_sequences(&self, client: &dyn CatalogClient, schema: &str) -> Vec<Sequence> {
        degrade(self.engine(), "sequences", self.try_sequences(client, schema).await)
    }

    async fn extract_views(&self, client: &dyn CatalogClient, schema: &str) -> Vec<View> {
        degrade(self.engine(), "views", self.try_views(client, schema).await)
    }
}
