//! Report Data Structures

use std::time::Duration;

use chrono::{DateTime, Utc};
use gridbench_core::{Classification, RunSummary};
use serde::{Deserialize, Serialize};

/// Current report schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub meta: ReportMeta,
    pub cases: Vec<ReportCase>,
    pub totals: ReportTotals,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system: SystemInfo,
    pub default_budget_ms: u64,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
}

/// Individual case result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCase {
    /// Owning benchmark
    pub benchmark: String,
    /// Case name, or joined labels for grid combinations
    pub case: String,
    /// Dimension labels in declared order; empty for simple cases
    pub labels: Vec<String>,
    /// Warmup probe admission decision
    pub classification: Classification,
    /// Budget-normalized repetitions, or the skip/marginal sentinel
    pub throughput: u64,
}

/// Final run counters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportTotals {
    pub files: usize,
    pub benchmarks: usize,
    pub failed: usize,
}

impl RunReport {
    /// Build a report from a finished run.
    pub fn from_run(summary: &RunSummary, default_budget: Duration) -> Self {
        RunReport {
            meta: ReportMeta {
                schema_version: SCHEMA_VERSION,
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                system: SystemInfo {
                    os: std::env::consts::OS.to_string(),
                    arch: std::env::consts::ARCH.to_string(),
                },
                default_budget_ms: default_budget.as_millis() as u64,
            },
            cases: summary
                .records
                .iter()
                .map(|record| ReportCase {
                    benchmark: record.benchmark.clone(),
                    case: record.case.clone(),
                    labels: record.labels.clone(),
                    classification: record.classification,
                    throughput: record.throughput,
                })
                .collect(),
            totals: ReportTotals {
                files: summary.totals.files,
                benchmarks: summary.totals.benchmarks,
                failed: summary.totals.failed,
            },
        }
    }
}
