#![warn(missing_docs)]
//! Gridbench Core - Execution Engine
//!
//! Provides the benchmark execution machinery:
//! - FIFO work queue with grouped output scopes
//! - Parameter grid expansion with per-option filters
//! - Warmup probe classification (skip / marginal / measure)
//! - Budget-normalized throughput measurement
//! - Suite registry backed by `inventory`

mod classify;
mod console;
mod grid;
mod job;
mod measure;
mod memory;
mod session;
mod suite;

pub use classify::{classify, Classification, MARGINAL_THROUGHPUT};
pub use console::Console;
pub use grid::{expand_grid, CaseData, Combination, DimOption, Dimension, GridError, GridPlan, LabelMap};
pub use job::{CaseError, CaseRecord, GridBench, Job, Phase, PreState, SimpleBench};
pub use measure::{
    pin_to_cpu, pinned_cpu_count, throughput, RepetitionEngine, Timing, WallClockEngine,
};
pub use memory::{trim_memory, HAS_MEMORY_TRIM};
pub use session::{Harness, QueueEntry, RunSummary, RunTotals, SessionConfig};
pub use suite::{LoadError, RegistryLoader, SuiteLoader};

/// A registered benchmark definition file.
///
/// Submitted via the `suite!` macro in the facade crate and collected
/// through `inventory`. The `register` function runs synchronously when
/// discovery appends the matching path, enqueueing its benchmarks
/// before it returns.
#[derive(Debug, Clone, Copy)]
pub struct SuiteDef {
    /// Path this suite answers to during discovery.
    pub path: &'static str,
    /// Registration entry point executed at load time.
    pub register: fn(&Harness),
}

inventory::collect!(SuiteDef);

/// Anchor to prevent LTO from stripping inventory registrations
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<SuiteDef> {}
};
