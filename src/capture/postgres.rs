//! PostgreSQL dialect and the pooled catalog client
//!
//! Catalog columns in `information_schema` are domain types, so every selected
//! value is cast to `text` and every parameter is bound as `$n::text`.

use crate::capture::objects::{
    attach_parameters, attach_view_columns, routine_from_row, sequence_from_row, trigger_from_row,
    view_from_row,
};
use crate::capture::tables::{extract_tables_with, TableQueries};
use crate::capture::{degrade, merge_trigger_events, query_scalar, CatalogClient, CatalogRow, Dialect};
use crate::error::AppError;
use crate::model::{EngineKind, Routine, Sequence, Table, Trigger, View};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::types::ToSql;
use tracing::debug;

pub(crate) const CURRENT_SCHEMA: &str = "SELECT current_schema()::text AS schema_name";

pub(crate) const SERVER_VERSION: &str = "SELECT current_setting('server_version')::text AS server_version";

pub(crate) const TABLE_QUERIES: TableQueries = TableQueries {
    tables: r#"
        SELECT c.relname::text AS table_name,
               obj_description(c.oid, 'pg_class')::text AS table_comment
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1::text AND c.relkind IN ('r', 'p')
        ORDER BY c.relname
    "#,
    columns: r#"
        SELECT c.table_name::text AS table_name,
               c.column_name::text AS column_name,
               c.udt_name::text AS data_type,
               COALESCE(c.character_maximum_length, c.numeric_precision, 0)::text AS column_size,
               COALESCE(c.numeric_scale, 0)::text AS numeric_scale,
               c.is_nullable::text AS is_nullable,
               c.column_default::text AS column_default,
               c.ordinal_position::text AS ordinal_position,
               CASE WHEN c.is_identity = 'YES' OR c.column_default LIKE 'nextval(%'
                    THEN 'YES' ELSE 'NO' END AS is_auto_increment
        FROM information_schema.columns c
        JOIN information_schema.tables t
            ON t.table_schema = c.table_schema AND t.table_name = c.table_name
        WHERE c.table_schema = $1::text AND t.table_type = 'BASE TABLE'
        ORDER BY c.table_name, c.ordinal_position
    "#,
    constraints: r#"
        SELECT tc.table_name::text AS table_name,
               tc.constraint_name::text AS constraint_name,
               tc.constraint_type::text AS constraint_type,
               kcu.column_name::text AS column_name,
               ccu.table_name::text AS referenced_table,
               ccu.column_name::text AS referenced_column,
               rc.delete_rule::text AS delete_rule,
               rc.update_rule::text AS update_rule,
               cc.check_clause::text AS check_clause
        FROM information_schema.table_constraints tc
        LEFT JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_schema = tc.constraint_schema
            AND kcu.constraint_name = tc.constraint_name
            AND kcu.table_name = tc.table_name
        LEFT JOIN information_schema.referential_constraints rc
            ON rc.constraint_schema = tc.constraint_schema
            AND rc.constraint_name = tc.constraint_name
        LEFT JOIN information_schema.constraint_column_usage ccu
            ON tc.constraint_type = 'FOREIGN KEY'
            AND ccu.constraint_schema = tc.constraint_schema
            AND ccu.constraint_name = tc.constraint_name
        LEFT JOIN information_schema.check_constraints cc
            ON cc.constraint_schema = tc.constraint_schema
            AND cc.constraint_name = tc.constraint_name
        WHERE tc.table_schema = $1::text
          AND tc.constraint_name NOT LIKE '%_not_null'
        ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position
    "#,
    indexes: r#"
        SELECT t.relname::text AS table_name,
               i.relname::text AS index_name,
               a.attname::text AS column_name,
               CASE WHEN ix.indisunique THEN 'YES' ELSE 'NO' END AS is_unique,
               am.amname::text AS index_type
        FROM pg_class t
        JOIN pg_index ix ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        JOIN pg_am am ON i.relam = am.oid
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
        WHERE n.nspname = $1::text AND t.relkind IN ('r', 'p')
        ORDER BY t.relname, i.relname, array_position(ix.indkey, a.attnum)
    "#,
};

pub(crate) const ROUTINES: &str = r#"
    SELECT r.routine_name::text AS routine_name,
           r.routine_type::text AS routine_type,
           CASE WHEN r.data_type = 'USER-DEFINED' THEN r.type_udt_name ELSE r.data_type END::text AS return_type,
           r.routine_definition::text AS definition,
           r.external_language::text AS language
    FROM information_schema.routines r
    WHERE r.routine_schema = $1::text
    ORDER BY r.routine_name
"#;

pub(crate) const ROUTINE_PARAMETERS: &str = r#"
    SELECT r.routine_name::text AS routine_name,
           p.parameter_name::text AS parameter_name,
           p.udt_name::text AS data_type,
           p.parameter_mode::text AS parameter_mode,
           p.ordinal_position::text AS ordinal_position
    FROM information_schema.parameters p
    JOIN information_schema.routines r
        ON r.specific_schema = p.specific_schema AND r.specific_name = p.specific_name
    WHERE p.specific_schema = $1::text
    ORDER BY r.routine_name, p.ordinal_position
"#;

/// One row per event; rows are folded per trigger name
pub(crate) const TRIGGERS: &str = r#"
    SELECT t.trigger_name::text AS trigger_name,
           t.event_object_table::text AS table_name,
           t.action_timing::text AS timing,
           t.event_manipulation::text AS event,
           t.action_statement::text AS definition,
           CASE WHEN pt.tgenabled = 'D' THEN 'NO' ELSE 'YES' END AS is_enabled
    FROM information_schema.triggers t
    LEFT JOIN pg_trigger pt ON pt.tgname = t.trigger_name AND NOT pt.tgisinternal
        AND pt.tgrelid = (quote_ident(t.event_object_schema) || '.' || quote_ident(t.event_object_table))::regclass
    WHERE t.trigger_schema = $1::text
    ORDER BY t.trigger_name
"#;

pub(crate) const SEQUENCES: &str = r#"
    SELECT s.sequencename::text AS sequence_name,
           s.start_value::text AS start_value,
           s.increment_by::text AS increment,
           s.min_value::text AS min_value,
           s.max_value::text AS max_value,
           CASE WHEN s.cycle THEN 'YES' ELSE 'NO' END AS is_cycle,
           s.cache_size::text AS cache_size
    FROM pg_sequences s
    WHERE s.schemaname = $1::text
    ORDER BY s.sequencename
"#;

pub(crate) const VIEWS: &str = r#"
    SELECT v.table_name::text AS view_name,
           v.view_definition::text AS definition,
           v.is_updatable::text AS is_updatable
    FROM information_schema.views v
    WHERE v.table_schema = $1::text
    ORDER BY v.table_name
"#;

pub(crate) const VIEW_COLUMNS: &str = r#"
    SELECT c.table_name::text AS view_name,
           c.column_name::text AS column_name
    FROM information_schema.columns c
    JOIN information_schema.views v
        ON v.table_schema = c.table_schema AND v.table_name = c.table_name
    WHERE c.table_schema = $1::text
    ORDER BY c.table_name, c.ordinal_position
"#;

/// [`CatalogClient`] over a deadpool-postgres pool
#[derive(Clone)]
pub struct PgCatalogClient {
    pool: Pool,
    database: String,
}

impl PgCatalogClient {
    pub fn from_pool(pool: Pool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }
}

#[async_trait]
impl CatalogClient for PgCatalogClient {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, AppError> {
        let client = self.pool.get().await?;
        let params: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = client.query(sql, &params).await?;

        rows.iter()
            .map(|row| {
                let pairs = row
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(i, column)| Ok((column.name().to_string(), row.try_get::<_, Option<String>>(i)?)))
                    .collect::<Result<Vec<_>, tokio_postgres::Error>>()?;
                Ok(CatalogRow::from_pairs(pairs))
            })
            .collect()
    }
}

pub struct PostgresDialect;

impl PostgresDialect {
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
impl Dialect for PostgresDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Postgresql
    }

    fn fallback_schema(&self) -> &'static str {
        "public"
    }

    async fn resolve_default_schema(&self, client: &dyn CatalogClient) -> String {
        match query_scalar(client, CURRENT_SCHEMA, "schema_name").await {
            Some(schema) => schema,
            None => {
                debug!("No current schema on {}; using public", client.database_name());
                self.fallback_schema().to_string()
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake::{row, FakeCatalog};
    use crate::model::{ParameterMode, RoutineKind, TriggerEvent};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_trigger_rows_fold_into_one_trigger() {
        let client = FakeCatalog::new("app").respond(TRIGGERS, vec![
            row(&[("trigger_name", "trg_audit"), ("table_name", "orders"), ("timing", "AFTER"),
                  ("event", "INSERT"), ("definition", "EXECUTE FUNCTION audit()"), ("is_enabled", "YES")]),
            row(&[("trigger_name", "trg_audit"), ("table_name", "orders"), ("timing", "AFTER"),
                  ("event", "DELETE"), ("definition", "EXECUTE FUNCTION audit()"), ("is_enabled", "YES")]),
        ]);

        let triggers = PostgresDialect.extract_triggers(&client, "public").await;

        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].event, TriggerEvent::InsertDelete);
    }

    #[tokio::test]
    async fn test_sequences() {
        let client = FakeCatalog::new("app").respond_to(SEQUENCES, &["billing"], vec![row(&[
            ("sequence_name", "invoice_seq"), ("start_value", "1000"), ("increment", "1"),
            ("min_value", "1"), ("max_value", "9223372036854775807"), ("is_cycle", "NO"),
            ("cache_size", "1"),
        ])]);

        let sequences = PostgresDialect.extract_sequences(&client, "billing").await;

        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].start_value, 1000);
        assert_eq!(sequences[0].max_value, Some(i64::MAX));
        assert!(!sequences[0].cycle);
        assert!(PostgresDialect.extract_sequences(&client, "public").await.is_empty());
    }

    #[tokio::test]
    async fn test_functions_and_inout_parameters() {
        let client = FakeCatalog::new("app")
            .respond(ROUTINES, vec![row(&[
                ("routine_name", "apply_discount"), ("routine_type", "FUNCTION"),
                ("return_type", "numeric"), ("language", "PLPGSQL"),
            ])])
            .respond(ROUTINE_PARAMETERS, vec![row(&[
                ("routine_name", "apply_discount"), ("parameter_name", "amount"),
                ("data_type", "numeric"), ("parameter_mode", "INOUT"), ("ordinal_position", "1"),
            ])]);

        let routines = PostgresDialect.extract_routines(&client, "public").await;

        assert_eq!(routines[0].kind, RoutineKind::Function);
        assert_eq!(routines[0].language.as_deref(), Some("PLPGSQL"));
        assert_eq!(routines[0].parameters[0].mode, ParameterMode::InOut);
    }

    #[tokio::test]
    async fn test_view_failure_degrades_to_empty() {
        let client = FakeCatalog::new("app").fail(VIEWS, "permission denied for schema");
        assert!(PostgresDialect.extract_views(&client, "public").await.is_empty());
    }

    #[tokio::test]
    async fn test_default_schema_falls_back_to_public() {
        let client = FakeCatalog::new("app").respond(CURRENT_SCHEMA, vec![row(&[("schema_name", "")])]);
        assert_eq!(PostgresDialect.resolve_default_schema(&client).await, "public");

        let resolved = FakeCatalog::new("app").respond(CURRENT_SCHEMA, vec![row(&[("schema_name", "tenant_a")])]);
        assert_eq!(PostgresDialect.resolve_default_schema(&resolved).await, "tenant_a");
    }

    #[tokio::test]
    async fn test_server_version() {
        let client = FakeCatalog::new("app").respond(SERVER_VERSION, vec![row(&[("server_version", "16.2")])]);
        assert_eq!(PostgresDialect.server_version(&client).await.as_deref(), Some("16.2"));
    }
}
