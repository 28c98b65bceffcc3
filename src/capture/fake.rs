//! In-memory catalog client for dialect and inspector tests.

use crate::capture::{CatalogClient, CatalogRow};
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Mutex;

enum Answer {
    Rows(Vec<CatalogRow>),
    Fail(String),
}

struct Rule {
    sql: &'static str,
    params: Option<Vec<String>>,
    answer: Answer,
}

/// Answers queries by exact SQL text (and optionally exact params).
/// Unknown queries return no rows.
pub(crate) struct FakeCatalog {
    database: String,
    rules: Vec<Rule>,
    seen: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub(crate) fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            rules: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond(mut self, sql: &'static str, rows: Vec<CatalogRow>) -> Self {
        self.rules.push(Rule { sql, params: None, answer: Answer::Rows(rows) });
        self
    }

    pub(crate) fn respond_to(mut self, sql: &'static str, params: &[&str], rows: Vec<CatalogRow>) -> Self {
        self.rules.push(Rule {
            sql,
            params: Some(params.iter().map(|p| p.to_string()).collect()),
            answer: Answer::Rows(rows),
        });
        self
    }

    pub(crate) fn fail(mut self, sql: &'static str, message: &str) -> Self {
        self.rules.push(Rule {
            sql,
            params: None,
            answer: Answer::Fail(message.to_string()),
        });
        self
    }

    pub(crate) fn queries_seen(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

/// Build a row from (column, value) pairs; omitted columns read as NULL
pub(crate) fn row(pairs: &[(&str, &str)]) -> CatalogRow {
    CatalogRow::from_pairs(pairs.iter().map(|(k, v)| (*k, Some(v.to_string()))))
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, AppError> {
        self.seen.lock().unwrap().push(sql.to_string());

        let matched = self.rules.iter().find(|rule| {
            rule.sql == sql
                && rule
                    .params
                    .as_ref()
                    .map_or(true, |expected| expected.iter().map(String::as_str).eq(params.iter().copied()))
        });

        match matched.map(|rule| &rule.answer) {
            Some(Answer::Rows(rows)) => Ok(rows.clone()),
            Some(Answer::Fail(message)) => Err(AppError::Internal(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}
