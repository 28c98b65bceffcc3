//! Schema compliance checker
//!
//! Captures a standard ("golden") schema and a user schema, compares them
//! object by object through canonical signatures, and classifies every
//! difference as a severity-ranked drift.
//!
//! - [`model`]: dialect-independent schema snapshot types
//! - [`normalize`]: identifier, type and definition folding
//! - [`capture`]: catalog extraction for MySQL, Oracle, SQL Server and PostgreSQL
//! - [`diff`]: the comparison engine
//! - [`report`]: drifts, compliance summary, JSON report output

pub mod capture;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod normalize;
pub mod report;
pub mod routes;
pub mod state;
