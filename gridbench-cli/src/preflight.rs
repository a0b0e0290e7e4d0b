//! Startup Preconditions
//!
//! Throughput numbers are only comparable when the environment is
//! controlled: the process must be pinned to a single CPU and the
//! allocator must support explicit heap release. Both are verified
//! once before any job runs, and a missing precondition aborts the run.

use gridbench_core::{pin_to_cpu, pinned_cpu_count, HAS_MEMORY_TRIM};
use thiserror::Error;

/// Why the environment cannot host a measurement run
#[derive(Debug, Error)]
pub enum PreflightError {
    /// Explicit heap release is not available on this platform
    #[error("heap release control unavailable (requires glibc malloc_trim)")]
    TrimUnavailable,

    /// Pinning to the requested CPU failed
    #[error("failed to pin to CPU {cpu}: {source}")]
    PinFailed {
        /// Requested CPU index
        cpu: usize,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// The affinity mask could not be read back
    #[error("failed to read CPU affinity: {0}")]
    AffinityUnreadable(#[from] std::io::Error),

    /// The process still runs on more than one CPU after pinning
    #[error("affinity mask spans {actual} CPUs, expected exactly one")]
    NotPinned {
        /// CPUs in the mask after pinning
        actual: usize,
    },
}

/// Verify heap-release control and single-CPU pinning
pub fn check_preflight(cpu: usize) -> Result<(), PreflightError> {
    if !HAS_MEMORY_TRIM {
        return Err(PreflightError::TrimUnavailable);
    }

    pin_to_cpu(cpu).map_err(|source| PreflightError::PinFailed { cpu, source })?;

    let actual = pinned_cpu_count()?;
    if actual != 1 {
        return Err(PreflightError::NotPinned { actual });
    }

    tracing::debug!(cpu, "preflight passed, pinned to a single CPU");
    Ok(())
}
