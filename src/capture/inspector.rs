//! Schema inspector
//!
//! Drives one dialect against one catalog client and assembles the result
//! into a validated [`Snapshot`].

use crate::capture::{dialect_for, CaptureOptions, CatalogClient};
use crate::error::AppError;
use crate::model::{EngineKind, Snapshot};
use std::time::Instant;
use tracing::{debug, info};

pub struct SchemaInspector;

impl SchemaInspector {
    /// Capture every object category of `schema` (or the connection's current
    /// schema when none is given).
    ///
    /// Only table extraction can fail the capture. The other categories come
    /// back empty when their queries fail, or are skipped when `options`
    /// excludes them.
    pub async fn capture(
        client: &dyn CatalogClient,
        engine: EngineKind,
        schema: Option<&str>,
        options: CaptureOptions,
    ) -> Result<Snapshot, AppError> {
        let started = Instant::now();
        let dialect = dialect_for(engine);

        let schema = match schema.map(str::trim).filter(|s| !s.is_empty()) {
            Some(schema) => schema.to_string(),
            None => dialect.resolve_default_schema(client).await,
        };

        info!(
            "📸 Capturing {} schema {}.{}",
            engine.display_name(),
            client.database_name(),
            schema
        );

        let tables = dialect.extract_tables(client, &schema).await?;
        debug!("Extracted {} tables", tables.len());

        let mut views = if options.include_views {
            dialect.extract_views(client, &schema).await
        } else {
            Vec::new()
        };

        let mut routines = dialect.extract_routines(client, &schema).await;

        let mut triggers = if options.include_triggers {
            dialect.extract_triggers(client, &schema).await
        } else {
            Vec::new()
        };

        let sequences = if options.include_sequences {
            dialect.extract_sequences(client, &schema).await
        } else {
            Vec::new()
        };

        if !options.include_definitions {
            routines.iter_mut().for_each(|r| r.definition = None);
            triggers.iter_mut().for_each(|t| t.definition = None);
            views.iter_mut().for_each(|v| v.definition = None);
        }

        let mut builder = Snapshot::builder(client.database_name(), engine, schema.as_str())
            .metadata("engine", engine.code())
            .metadata("schema", schema.as_str());
        if let Some(version) = dialect.server_version(client).await {
            builder = builder.metadata("serverVersion", version);
        }

        let snapshot = builder
            .tables(tables)
            .views(views)
            .routines(routines)
            .triggers(triggers)
            .sequences(sequences)
            .build()?;

        info!(
            "✅ Captured {} in {:?}",
            snapshot.summary(),
            started.elapsed()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake::{row, FakeCatalog};
    use crate::capture::mysql;
    use pretty_assertions::assert_eq;

    fn shop() -> FakeCatalog {
        FakeCatalog::new("shop")
            .respond(mysql::CURRENT_SCHEMA, vec![row(&[("schema_name", "shop")])])
            .respond(mysql::SERVER_VERSION, vec![row(&[("server_version", "8.0.36")])])
            .respond(mysql::TABLE_QUERIES.tables, vec![row(&[("table_name", "users")])])
            .respond(mysql::TABLE_QUERIES.columns, vec![row(&[
                ("table_name", "users"), ("column_name", "id"), ("data_type", "int"),
                ("is_nullable", "NO"), ("ordinal_position", "1"),
            ])])
            .respond(mysql::ROUTINES, vec![row(&[
                ("routine_name", "touch_user"), ("routine_type", "PROCEDURE"),
                ("definition", "BEGIN UPDATE users SET id = id; END"),
            ])])
            .respond(mysql::TRIGGERS, vec![row(&[
                ("trigger_name", "trg_users_bi"), ("table_name", "users"), ("timing", "BEFORE"),
                ("event", "INSERT"), ("definition", "SET NEW.id = NEW.id"),
            ])])
            .respond(mysql::VIEWS, vec![row(&[("view_name", "v_users"), ("definition", "select id from users")])])
    }

    #[tokio::test]
    async fn test_capture_resolves_schema_and_records_metadata() {
        let snapshot = SchemaInspector::capture(&shop(), EngineKind::Mysql, None, CaptureOptions::default())
            .await
            .unwrap();

        assert_eq!(snapshot.database_name, "shop");
        assert_eq!(snapshot.schema_name, "shop");
        assert_eq!(snapshot.tables.len(), 1);
        assert_eq!(snapshot.routines.len(), 1);
        assert_eq!(snapshot.triggers.len(), 1);
        assert_eq!(snapshot.views.len(), 1);
        assert_eq!(snapshot.metadata.get("engine").map(String::as_str), Some("mysql"));
        assert_eq!(snapshot.metadata.get("serverVersion").map(String::as_str), Some("8.0.36"));
    }

    #[tokio::test]
    async fn test_include_flags_and_definitions() {
        let options = CaptureOptions {
            include_views: false,
            include_triggers: true,
            include_sequences: true,
            include_definitions: false,
        };

        let snapshot = SchemaInspector::capture(&shop(), EngineKind::Mysql, Some("shop"), options)
            .await
            .unwrap();

        assert!(snapshot.views.is_empty());
        assert_eq!(snapshot.routines[0].definition, None);
        assert_eq!(snapshot.triggers[0].definition, None);
    }

    #[tokio::test]
    async fn test_failed_categories_degrade() {
        let client = FakeCatalog::new("shop")
            .respond(mysql::TABLE_QUERIES.tables, vec![row(&[("table_name", "users")])])
            .fail(mysql::ROUTINES, "SELECT command denied")
            .fail(mysql::TRIGGERS, "SELECT command denied")
            .fail(mysql::VIEWS, "SELECT command denied");

        let snapshot = SchemaInspector::capture(&client, EngineKind::Mysql, Some("shop"), CaptureOptions::default())
            .await
            .unwrap();

        assert_eq!(snapshot.tables.len(), 1);
        assert!(snapshot.routines.is_empty());
        assert!(snapshot.triggers.is_empty());
        assert!(snapshot.views.is_empty());
        assert!(!snapshot.metadata.contains_key("serverVersion"));
    }

    #[tokio::test]
    async fn test_table_failure_aborts_capture() {
        let client = FakeCatalog::new("shop").fail(mysql::TABLE_QUERIES.tables, "Unknown database 'shop'");

        let result = SchemaInspector::capture(&client, EngineKind::Mysql, Some("shop"), CaptureOptions::default()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_blank_schema_uses_dialect_fallback() {
        let client = FakeCatalog::new("ORCL");

        let snapshot = SchemaInspector::capture(&client, EngineKind::Oracle, Some("  "), CaptureOptions::default())
            .await
            .unwrap();

        assert_eq!(snapshot.schema_name, "CHECKER");
        assert_eq!(snapshot.object_count(), 0);
    }
}
