//! Supported database engines

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database engine a snapshot was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Mysql,
    Oracle,
    Mssql,
    Postgresql,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Mysql,
        EngineKind::Oracle,
        EngineKind::Mssql,
        EngineKind::Postgresql,
    ];

    /// Short code used in configuration and request bodies
    pub fn code(&self) -> &'static str {
        match self {
            EngineKind::Mysql => "mysql",
            EngineKind::Oracle => "oracle",
            EngineKind::Mssql => "mssql",
            EngineKind::Postgresql => "postgresql",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EngineKind::Mysql => "MySQL",
            EngineKind::Oracle => "Oracle",
            EngineKind::Mssql => "Microsoft SQL Server",
            EngineKind::Postgresql => "PostgreSQL",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            EngineKind::Mysql => 3306,
            EngineKind::Oracle => 1521,
            EngineKind::Mssql => 1433,
            EngineKind::Postgresql => 5432,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_ascii_lowercase().as_str() {
                "postgres" => Some(EngineKind::Postgresql),
                "sqlserver" => Some(EngineKind::Mssql),
                _ => None,
            })
            .ok_or_else(|| format!("Unknown database type: {}", s))
    }
}
