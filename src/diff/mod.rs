//! Diff Engine
//!
//! Pure comparison of two snapshots into a classified compliance report.

pub mod engine;

pub use engine::DiffEngine;
