#![warn(missing_docs)]
//! Gridbench Report - Run Reports
//!
//! Serializable document describing a finished run:
//! - Metadata (schema, version, timestamp, system)
//! - One entry per executed case
//! - Final counters
//!
//! JSON is the only machine-readable output format.

mod json;
mod report;

pub use json::generate_json_report;
pub use report::{ReportCase, ReportMeta, ReportTotals, RunReport, SystemInfo, SCHEMA_VERSION};
