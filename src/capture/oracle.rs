//! Oracle dialect
//!
//! Reads the `ALL_*` dictionary views. Owners are stored upper-case, so the
//! schema parameter is always wrapped in `UPPER(:1)`.

use crate::capture::objects::{
    attach_parameters, attach_view_columns, routine_from_row, sequence_from_row, trigger_from_row,
    view_from_row,
};
use crate::capture::tables::{extract_tables_with, TableQueries};
use crate::capture::{degrade, query_scalar, CatalogClient, Dialect};
use crate::error::AppError;
use crate::model::{EngineKind, Routine, Sequence, Table, Trigger, View};
use async_trait::async_trait;
use tracing::{debug, warn};

pub(crate) const CURRENT_SCHEMA: &str =
    "SELECT SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA') AS schema_name FROM DUAL";

pub(crate) const SERVER_VERSION: &str =
    "SELECT BANNER AS server_version FROM V$VERSION WHERE ROWNUM = 1";

pub(crate) const TABLE_QUERIES: TableQueries = TableQueries {
    tables: r#"
        SELECT t.TABLE_NAME AS table_name,
               tc.COMMENTS AS table_comment
        FROM ALL_TABLES t
        LEFT JOIN ALL_TAB_COMMENTS tc
            ON tc.OWNER = t.OWNER AND tc.TABLE_NAME = t.TABLE_NAME
        WHERE t.OWNER = UPPER(:1)
        ORDER BY t.TABLE_NAME
    "#,
    columns: r#"
        SELECT c.TABLE_NAME AS table_name,
               c.COLUMN_NAME AS column_name,
               c.DATA_TYPE AS data_type,
               CASE WHEN c.CHAR_LENGTH > 0 THEN c.CHAR_LENGTH ELSE NVL(c.DATA_PRECISION, 0) END AS column_size,
               NVL(c.DATA_SCALE, 0) AS numeric_scale,
               c.NULLABLE AS is_nullable,
               c.DATA_DEFAULT AS column_default,
               c.COLUMN_ID AS ordinal_position,
               c.IDENTITY_COLUMN AS is_auto_increment
        FROM ALL_TAB_COLUMNS c
        JOIN ALL_TABLES t ON t.OWNER = c.OWNER AND t.TABLE_NAME = c.TABLE_NAME
        WHERE c.OWNER = UPPER(:1)
        ORDER BY c.TABLE_NAME, c.COLUMN_ID
    "#,
    constraints: r#"
        SELECT c.TABLE_NAME AS table_name,
               c.CONSTRAINT_NAME AS constraint_name,
               c.CONSTRAINT_TYPE AS constraint_type,
               cc.COLUMN_NAME AS column_name,
               r.TABLE_NAME AS referenced_table,
               rcc.COLUMN_NAME AS referenced_column,
               c.DELETE_RULE AS delete_rule,
               c.SEARCH_CONDITION AS check_clause
        FROM ALL_CONSTRAINTS c
        LEFT JOIN ALL_CONS_COLUMNS cc
            ON cc.OWNER = c.OWNER AND cc.CONSTRAINT_NAME = c.CONSTRAINT_NAME
        LEFT JOIN ALL_CONSTRAINTS r
            ON r.OWNER = c.R_OWNER AND r.CONSTRAINT_NAME = c.R_CONSTRAINT_NAME
        LEFT JOIN ALL_CONS_COLUMNS rcc
            ON rcc.OWNER = r.OWNER AND rcc.CONSTRAINT_NAME = r.CONSTRAINT_NAME
            AND rcc.POSITION = cc.POSITION
        WHERE c.OWNER = UPPER(:1)
          AND c.CONSTRAINT_TYPE IN ('P', 'R', 'U', 'C')
          AND (c.CONSTRAINT_TYPE <> 'C' OR c.GENERATED = 'USER NAME')
        ORDER BY c.TABLE_NAME, c.CONSTRAINT_NAME, cc.POSITION
    "#,
    indexes: r#"
        SELECT i.TABLE_NAME AS table_name,
               i.INDEX_NAME AS index_name,
               ic.COLUMN_NAME AS column_name,
               CASE WHEN i.UNIQUENESS = 'UNIQUE' THEN 'YES' ELSE 'NO' END AS is_unique,
               i.INDEX_TYPE AS index_type
        FROM ALL_INDEXES i
        JOIN ALL_IND_COLUMNS ic
            ON ic.INDEX_OWNER = i.OWNER AND ic.INDEX_NAME = i.INDEX_NAME
        WHERE i.TABLE_OWNER = UPPER(:1)
        ORDER BY i.TABLE_NAME, i.INDEX_NAME, ic.COLUMN_POSITION
    "#,
};

pub(crate) const ROUTINES: &str = r#"
    SELECT OBJECT_NAME AS routine_name,
           OBJECT_TYPE AS routine_type,
           'PL/SQL' AS language
    FROM ALL_OBJECTS
    WHERE OWNER = UPPER(:1)
      AND OBJECT_TYPE IN ('PROCEDURE', 'FUNCTION', 'PACKAGE', 'PACKAGE BODY')
    ORDER BY OBJECT_NAME
"#;

/// Source lines of one routine: owner, name, object type
pub(crate) const ROUTINE_SOURCE: &str = r#"
    SELECT TEXT AS text
    FROM ALL_SOURCE
    WHERE OWNER = UPPER(:1) AND NAME = :2 AND TYPE = :3
    ORDER BY LINE
"#;

pub(crate) const ROUTINE_PARAMETERS: &str = r#"
    SELECT OBJECT_NAME AS routine_name,
           ARGUMENT_NAME AS parameter_name,
           DATA_TYPE AS data_type,
           IN_OUT AS parameter_mode,
           POSITION AS ordinal_position
    FROM ALL_ARGUMENTS
    WHERE OWNER = UPPER(:1) AND PACKAGE_NAME IS NULL AND ARGUMENT_NAME IS NOT NULL
    ORDER BY OBJECT_NAME, POSITION
"#;

pub(crate) const TRIGGERS: &str = r#"
    SELECT TRIGGER_NAME AS trigger_name,
           TABLE_NAME AS table_name,
           TRIGGER_TYPE AS timing,
           TRIGGERING_EVENT AS event,
           TRIGGER_BODY AS definition,
           CASE WHEN STATUS = 'ENABLED' THEN 'YES' ELSE 'NO' END AS is_enabled
    FROM ALL_TRIGGERS
    WHERE OWNER = UPPER(:1)
    ORDER BY TRIGGER_NAME
"#;

/// The dictionary keeps no start value; it reads as 1
pub(crate) const SEQUENCES: &str = r#"
    SELECT SEQUENCE_NAME AS sequence_name,
           1 AS start_value,
           INCREMENT_BY AS increment,
           MIN_VALUE AS min_value,
           MAX_VALUE AS max_value,
           CYCLE_FLAG AS is_cycle,
           CACHE_SIZE AS cache_size
    FROM ALL_SEQUENCES
    WHERE SEQUENCE_OWNER = UPPER(:1)
    ORDER BY SEQUENCE_NAME
"#;

pub(crate) const VIEWS: &str = r#"
    SELECT VIEW_NAME AS view_name,
           TEXT AS definition
    FROM ALL_VIEWS
    WHERE OWNER = UPPER(:1)
    ORDER BY VIEW_NAME
"#;

pub(crate) const VIEW_COLUMNS: &str = r#"
    SELECT c.TABLE_NAME AS view_name,
           c.COLUMN_NAME AS column_name
    FROM ALL_TAB_COLUMNS c
    JOIN ALL_VIEWS v ON v.OWNER = c.OWNER AND v.VIEW_NAME = c.TABLE_NAME
    WHERE c.OWNER = UPPER(:1)
    ORDER BY c.TABLE_NAME, c.COLUMN_ID
"#;

pub struct OracleDialect;

impl OracleDialect {
    /// Concatenated source lines; `None` when the source cannot be read
    async fn routine_source(&self, client: &dyn CatalogClient, schema: &str, routine: &Routine) -> Option<String> {
        let object_type = routine.kind.label().replace('_', " ");
        match client
            .query(ROUTINE_SOURCE, &[schema, routine.name.as_str(), object_type.as_str()])
            .await
        {
            Ok(lines) if lines.is_empty() => None,
            Ok(lines) => Some(lines.iter().map(|line| line.string("text")).collect()),
            Err(e) => {
                warn!("⚠️ Could not read source of {} {}: {}", object_type, routine.name, e);
                None
            }
        }
    }

    async fn try_routines(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Routine>, AppError> {
        let mut routines: Vec<Routine> = client
            .query(ROUTINES, &[schema])
            .await?
            .iter()
            .map(|row| routine_from_row(row, schema))
            .collect();

        for routine in routines.iter_mut() {
            let definition = self.routine_source(client, schema, routine).await;
            routine.definition = definition;
        }

        attach_parameters(
            self.engine(),
            &mut routines,
            client.query(ROUTINE_PARAMETERS, &[schema]).await,
        );
        debug!("Read {} Oracle routines from {}", routines.len(), schema);
        Ok(routines)
    }

    async fn try_triggers(&self, client: &dyn CatalogClient, schema: &str) -> Result<Vec<Trigger>, AppError> {
        let rows = client.query(TRIGGERS, &[schema]).await?;
        Ok(rows.iter().map(trigger_from_row).collect())
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
impl Dialect for OracleDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Oracle
    }

    fn fallback_schema(&self) -> &'static str {
        "CHECKER"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake::{row, FakeCatalog};
    use crate::model::{ParameterMode, RoutineKind, TriggerEvent, TriggerTiming};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_routine_source_is_joined_by_line() {
        let client = FakeCatalog::new("ORCL")
            .respond(ROUTINES, vec![
                row(&[("routine_name", "CALC_TAX"), ("routine_type", "FUNCTION"), ("language", "PL/SQL")]),
                row(&[("routine_name", "BILLING"), ("routine_type", "PACKAGE BODY"), ("language", "PL/SQL")]),
            ])
            .respond_to(ROUTINE_SOURCE, &["HR", "CALC_TAX", "FUNCTION"], vec![
                row(&[("text", "FUNCTION calc_tax RETURN NUMBER IS\n")]),
                row(&[("text", "BEGIN RETURN 0; END;\n")]),
            ])
            .fail(ROUTINE_SOURCE, "ORA-00942: table or view does not exist")
            .respond(ROUTINE_PARAMETERS, vec![row(&[
                ("routine_name", "CALC_TAX"), ("parameter_name", "P_AMOUNT"),
                ("data_type", "NUMBER"), ("parameter_mode", "IN/OUT"), ("ordinal_position", "1"),
            ])]);

        let routines = OracleDialect.extract_routines(&client, "HR").await;

        assert_eq!(routines.len(), 2);
        assert_eq!(
            routines[0].definition.as_deref(),
            Some("FUNCTION calc_tax RETURN NUMBER IS\nBEGIN RETURN 0; END;\n")
        );
        assert_eq!(routines[0].parameters[0].mode, ParameterMode::InOut);
        assert_eq!(routines[1].kind, RoutineKind::PackageBody);
        assert_eq!(routines[1].definition, None);
    }

    #[tokio::test]
    async fn test_trigger_type_and_composite_event() {
        let client = FakeCatalog::new("ORCL").respond(TRIGGERS, vec![row(&[
            ("trigger_name", "TRG_EMP_AUDIT"), ("table_name", "EMPLOYEES"),
            ("timing", "BEFORE EACH ROW"), ("event", "INSERT OR UPDATE"), ("is_enabled", "NO"),
        ])]);

        let triggers = OracleDialect.extract_triggers(&client, "HR").await;

        assert_eq!(triggers[0].timing, TriggerTiming::Before);
        assert_eq!(triggers[0].event, TriggerEvent::InsertUpdate);
        assert!(!triggers[0].enabled);
    }

    #[tokio::test]
    async fn test_sequence_with_oversized_max_value() {
        let client = FakeCatalog::new("ORCL").respond(SEQUENCES, vec![row(&[
            ("sequence_name", "EMP_SEQ"), ("start_value", "1"), ("increment", "1"), ("min_value", "1"),
            ("max_value", "9999999999999999999999999999"), ("is_cycle", "N"), ("cache_size", "20"),
        ])]);

        let sequences = OracleDialect.extract_sequences(&client, "HR").await;

        assert_eq!(sequences[0].max_value, None);
        assert_eq!(sequences[0].min_value, Some(1));
        assert!(!sequences[0].cycle);
    }

    #[tokio::test]
    async fn test_default_schema_falls_back_to_checker() {
        let client = FakeCatalog::new("ORCL");
        assert_eq!(OracleDialect.resolve_default_schema(&client).await, "CHECKER");
    }
}
