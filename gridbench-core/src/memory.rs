//! Heap Release Control
//!
//! Cases run back to back on one thread, so free pages left over from
//! one case would otherwise be charged to the next. A blocking trim
//! runs before every warmup probe.

/// Whether this platform can release heap pages on demand.
pub const HAS_MEMORY_TRIM: bool = cfg!(all(target_os = "linux", target_env = "gnu"));

/// Return releasable heap pages to the OS.
///
/// Blocks until the allocator has finished; the probe that follows
/// starts from a trimmed heap.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub fn trim_memory() {
    unsafe {
        libc::malloc_trim(0);
    }
}

/// Return releasable heap pages to the OS (no-op on this platform).
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub fn trim_memory() {}
