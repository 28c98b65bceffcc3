//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use crate::capture::{CaptureOptions, ComplianceOrchestrator};
use crate::model::EngineKind;
use crate::report;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Capture and report settings for compliance checks
#[derive(Debug, Clone)]
pub struct ComplianceConfig {
    /// Engine assumed when a check request does not name one
    pub default_engine: EngineKind,
    /// Explicit schema; `None` lets each dialect resolve the current one
    pub schema: Option<String>,
    pub capture_timeout: Duration,
    pub report_dir: PathBuf,
    /// Reports kept in memory before the oldest are evicted
    pub report_store_capacity: usize,
    pub capture: CaptureOptions,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            default_engine: EngineKind::Postgresql,
            schema: None,
            capture_timeout: Duration::from_secs(300),
            report_dir: PathBuf::from("reports"),
            report_store_capacity: report::store::DEFAULT_CAPACITY,
            capture: CaptureOptions::default(),
        }
    }
}

impl ComplianceConfig {
    /// Orchestrator with these capture options; no report directory attached
    pub fn orchestrator(&self) -> ComplianceOrchestrator {
        ComplianceOrchestrator::new(self.capture, self.capture_timeout)
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub compliance: ComplianceConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any variable source. Unparseable values fall back to
    /// their defaults; an unknown engine code is an error.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let server = ServerConfig {
            host: var("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.server.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.server.port),
        };

        let cors = CorsConfig {
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(defaults.cors.allowed_origins),
        };

        let default_engine = match var("COMPLIANCE_ENGINE") {
            Some(code) => code
                .parse::<EngineKind>()
                .map_err(|_| ConfigError::InvalidValue(format!("COMPLIANCE_ENGINE '{}' is not a supported engine", code)))?,
            None => defaults.compliance.default_engine,
        };

        let flag = |key: &str, default: bool| var(key).and_then(|v| parse_bool(&v)).unwrap_or(default);
        let capture = CaptureOptions {
            include_views: flag("INSPECTION_INCLUDE_VIEWS", true),
            include_triggers: flag("INSPECTION_INCLUDE_TRIGGERS", true),
            include_sequences: flag("INSPECTION_INCLUDE_SEQUENCES", true),
            include_definitions: flag("REPORT_INCLUDE_DEFINITIONS", true),
        };

        let compliance = ComplianceConfig {
            default_engine,
            schema: var("COMPLIANCE_SCHEMA")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            capture_timeout: var("CAPTURE_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.compliance.capture_timeout),
            report_dir: var("REPORT_OUTPUT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.compliance.report_dir),
            report_store_capacity: var("REPORT_STORE_CAPACITY")
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.compliance.report_store_capacity),
            capture,
        };

        Ok(Self {
            server,
            cors,
            compliance,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
