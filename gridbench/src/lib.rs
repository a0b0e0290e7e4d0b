#![warn(missing_docs)]
//! # Gridbench
//!
//! Micro-benchmark harness for Rust with parameter grids and loss-free failure
//! reporting.
//!
//! Gridbench runs registered benchmark suites through a single scheduling
//! session:
//! - **Deferred Scheduling**: Registration only enqueues; a suite file's
//!   registrations all land before its first benchmark runs
//! - **Parameter Grids**: Declare dimensions and measure the full cartesian
//!   product, with per-option filters to veto combinations
//! - **Probe-Based Admission**: One timed warmup invocation classifies each
//!   case as measured, marginal, or skipped before the budget is spent
//! - **Budget Normalization**: Throughput is reported per budget regardless of
//!   how far the measurement loop overran
//! - **Failure Isolation**: A panicking case fails its benchmark and the run's
//!   exit code, never the rest of the run
//! - **Controlled Environment**: Single-CPU pinning and explicit heap release
//!   before every probe
//! - **JSON Reports**: Machine-readable run reports for tracking results over
//!   time
//!
//! ## Quick Start
//!
//! ```ignore
//! use gridbench::prelude::*;
//!
//! fn register(h: &Harness) {
//!     h.register_simple(SimpleBench::new("parse_u64").case("decimal", || {
//!         let _ = "12345".parse::<u64>();
//!     }));
//!
//!     h.register_complex(
//!         GridBench::new("vec_with_capacity")
//!             .dimension(Dimension::values("n", "Capacity", [16u64, 256, 4096]))
//!             .run(|data| {
//!                 let n = data["n"].as_u64().unwrap() as usize;
//!                 let _ = Vec::<u8>::with_capacity(n);
//!             }),
//!     );
//! }
//!
//! gridbench::suite!("suites/parse.rs", register);
//!
//! fn main() {
//!     if let Err(e) = gridbench::run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

// Re-export core types
pub use gridbench_core::{
    classify, expand_grid, pin_to_cpu, pinned_cpu_count, throughput, trim_memory, CaseData,
    CaseError, CaseRecord, Classification, Combination, Console, DimOption, Dimension, GridBench,
    GridError, GridPlan, Harness, Job, LabelMap, LoadError, Phase, PreState, QueueEntry,
    RegistryLoader, RepetitionEngine, RunSummary, RunTotals, SessionConfig, SimpleBench, SuiteDef,
    SuiteLoader, Timing, WallClockEngine, HAS_MEMORY_TRIM, MARGINAL_THROUGHPUT,
};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Register a benchmark suite under a path in the global registry.
///
/// The path is what discovery patterns are matched against; the function runs
/// when the suite file is loaded and registers its benchmarks on the harness.
///
/// ```ignore
/// fn register(h: &Harness) {
///     h.register_simple(SimpleBench::new("noop").case("only", || {}));
/// }
///
/// gridbench::suite!("suites/noop.rs", register);
/// ```
#[macro_export]
macro_rules! suite {
    ($path:expr, $register:expr) => {
        $crate::internal::inventory::submit! {
            $crate::SuiteDef {
                path: $path,
                register: $register,
            }
        }
    };
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        suite, CaseData, Classification, Dimension, GridBench, Harness, SimpleBench,
    };
}

/// Run the Gridbench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() {
///     gridbench::run().unwrap();
/// }
/// ```
pub use gridbench_cli::run;
