//! Drift & Compliance Model
//!
//! Drift taxonomy, the aggregated compliance report and its JSON output.

pub mod compliance;
pub mod drift;
pub mod store;
pub mod writer;

pub use compliance::{compliance_score, ComplianceReport, ComplianceSummary};
pub use drift::{Drift, DriftCategory, DriftKind, Severity};
pub use store::{ReportListing, ReportStore};
pub use writer::{ReportDocument, ReportWriter};
