//! Measurement Primitives
//!
//! The adaptive repetition engine, budget normalization, and CPU
//! affinity control. The engine is the only component that observes
//! wall-clock time during measurement; everything downstream works
//! with the `Timing` it reports.

use std::time::{Duration, Instant};

/// What one engine invocation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Total elapsed wall-clock time.
    pub elapsed: Duration,
    /// Completed repetitions within that time.
    pub reps: u64,
}

/// Adaptive repetition primitive.
///
/// Repeats an operation until a target duration has elapsed. The
/// engine always completes at least one repetition and only checks the
/// clock between repetitions, so it may overshoot the budget but never
/// undershoots it.
pub trait RepetitionEngine {
    /// Run `op` back to back until at least `budget` has elapsed.
    fn run_until(&mut self, budget: Duration, op: &mut dyn FnMut()) -> Timing;
}

/// Wall-clock engine used for real runs.
#[derive(Debug, Default)]
pub struct WallClockEngine;

impl RepetitionEngine for WallClockEngine {
    fn run_until(&mut self, budget: Duration, op: &mut dyn FnMut()) -> Timing {
        let start = Instant::now();
        let mut reps = 0u64;
        loop {
            op();
            reps += 1;
            let elapsed = start.elapsed();
            if elapsed >= budget {
                return Timing { elapsed, reps };
            }
        }
    }
}

/// Normalize an engine result onto the common per-budget basis.
///
/// Computes `floor(reps * budget / elapsed)` in nanoseconds, correcting
/// for the engine's overshoot so runs with different overshoot
/// magnitudes stay comparable. When `elapsed` equals the budget the
/// result is exactly `reps`. A zero `elapsed` reports zero.
pub fn throughput(timing: Timing, budget: Duration) -> u64 {
    let elapsed = timing.elapsed.as_nanos();
    if elapsed == 0 {
        return 0;
    }
    ((timing.reps as u128 * budget.as_nanos()) / elapsed) as u64
}

/// Pin the current thread to a specific CPU for stable measurements.
///
/// This keeps timings comparable by avoiding core migrations.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();
        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);
        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// Pin the current thread to a specific CPU (no-op on this platform).
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}

/// Number of CPUs in the current thread's affinity mask.
#[cfg(target_os = "linux")]
pub fn pinned_cpu_count() -> Result<usize, std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        let result = libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);
        if result == 0 {
            Ok(libc::CPU_COUNT(set_ref) as usize)
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// Number of CPUs in the affinity mask (always one on this platform).
#[cfg(not(target_os = "linux"))]
pub fn pinned_cpu_count() -> Result<usize, std::io::Error> {
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_engine_runs_at_least_once() {
        let mut engine = WallClockEngine;
        let mut count = 0u64;
        let timing = engine.run_until(Duration::ZERO, &mut || count += 1);
        assert_eq!(timing.reps, 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_wall_clock_engine_reaches_budget() {
        let mut engine = WallClockEngine;
        let budget = Duration::from_millis(5);
        let mut count = 0u64;
        let timing = engine.run_until(budget, &mut || count += 1);
        assert!(timing.elapsed >= budget);
        assert_eq!(timing.reps, count);
        assert!(timing.reps >= 1);
    }

    #[test]
    fn test_throughput_exact_budget_yields_reps() {
        let timing = Timing {
            elapsed: Duration::from_millis(100),
            reps: 7,
        };
        assert_eq!(throughput(timing, Duration::from_millis(100)), 7);
    }

    #[test]
    fn test_throughput_corrects_overshoot() {
        // 10 reps in 2s against a 1s budget scales down to 5.
        let timing = Timing {
            elapsed: Duration::from_secs(2),
            reps: 10,
        };
        assert_eq!(throughput(timing, Duration::from_secs(1)), 5);
    }

    #[test]
    fn test_throughput_floors() {
        // floor(2 * 2 / 3) = 1
        let timing = Timing {
            elapsed: Duration::from_nanos(3),
            reps: 2,
        };
        assert_eq!(throughput(timing, Duration::from_nanos(2)), 1);
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        let timing = Timing {
            elapsed: Duration::ZERO,
            reps: 100,
        };
        assert_eq!(throughput(timing, Duration::from_secs(1)), 0);
    }
}
