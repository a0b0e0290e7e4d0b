//! Gridbench Example Suites
//!
//! This example demonstrates Gridbench features and serves as a template for
//! creating your own benchmark suites.
//!
//! Run with:
//!   cargo run --example demo                        # Run all suites
//!   cargo run --example demo -- list                # List registered suites
//!   cargo run --example demo -- 'suites/grids.rs'   # Run one suite
//!   cargo run --example demo -- --budget 100ms      # Shorter budget per case
//!   cargo run --example demo -- --help              # Show all options

use gridbench::prelude::*;
use std::hint::black_box;
use std::time::Duration;

// ============================================================================
// Basic Benchmarks
// ============================================================================

/// Integer parsing with explicit named cases
fn register_parsing(h: &Harness) {
    h.register_simple(
        SimpleBench::new("parse_u64")
            .description("string to integer")
            .case("decimal", || {
                black_box("1234567890".parse::<u64>().unwrap());
            })
            .case("hex", || {
                black_box(u64::from_str_radix("499602d2", 16).unwrap());
            }),
    );

    h.register_simple(
        SimpleBench::new("format_u64")
            .description("integer to string")
            .case("display", || {
                black_box(1234567890u64.to_string());
            })
            .case("hex", || {
                black_box(format!("{:x}", 1234567890u64));
            }),
    );
}

gridbench::suite!("suites/parsing.rs", register_parsing);

// ============================================================================
// Setup and Teardown
// ============================================================================

/// Setup state lives for the whole case and is consumed by the teardown
fn register_scratch(h: &Harness) {
    h.register_simple(
        SimpleBench::new("sum_small_vec")
            .pre(|| vec![0u8; 1 << 20])
            .post(|scratch: Vec<u8>| drop(scratch))
            .case("u64", || {
                let data: Vec<u64> = (0..1000).collect();
                black_box(data.iter().sum::<u64>());
            }),
    );
}

gridbench::suite!("suites/scratch.rs", register_scratch);

// ============================================================================
// Parameter Grids
// ============================================================================

/// Single-dimension sweep over input size
fn register_grids(h: &Harness) {
    h.register_complex(
        GridBench::new("vec_push")
            .description("grow an unsized vec")
            .dimension(Dimension::values("n", "Items", [100u64, 1_000, 10_000]))
            .run(|data| {
                let n = data["n"].as_u64().unwrap();
                let mut v = Vec::new();
                for i in 0..n {
                    v.push(i);
                }
                black_box(v);
            }),
    );

    // Two dimensions: the full cartesian product is measured, with the
    // map built once per combination and handed to the measured callback.
    h.register_complex(
        GridBench::new("map_lookup")
            .description("hit rate across map sizes")
            .dimension(
                Dimension::new("probe", "Probe")
                    .option("present", "present")
                    .option("absent", "absent"),
            )
            .dimension(Dimension::values("n", "Keys", [16u64, 256, 4096]))
            .pre(|data: &CaseData| {
                let n = data["n"].as_u64().unwrap();
                (0..n)
                    .map(|i| (i, i * 2))
                    .collect::<std::collections::HashMap<u64, u64>>()
            })
            .run_with_state(|data, map: &mut std::collections::HashMap<u64, u64>| {
                let n = data["n"].as_u64().unwrap();
                let key = if data["probe"] == "present" { n / 2 } else { n + 1 };
                black_box(map.get(&key));
            }),
    );

    // An option filter vetoes combinations: the quadratic case is only
    // admitted for the smaller inputs.
    h.register_complex(
        GridBench::new("dedup")
            .dimension(
                Dimension::new("algo", "Algo")
                    .option("sort_dedup", "sort_dedup")
                    .option_when("nested_scan", "nested_scan", |labels| {
                        labels["n"] != "10000"
                    }),
            )
            .dimension(Dimension::values("n", "Items", [100u64, 1_000, 10_000]))
            .run(|data| {
                let n = data["n"].as_u64().unwrap() as usize;
                let input: Vec<u64> = (0..n as u64).map(|i| i % 97).collect();
                match data["algo"].as_str().unwrap() {
                    "sort_dedup" => {
                        let mut v = input.clone();
                        v.sort_unstable();
                        v.dedup();
                        black_box(v);
                    }
                    _ => {
                        let mut v: Vec<u64> = Vec::new();
                        for x in &input {
                            if !v.contains(x) {
                                v.push(*x);
                            }
                        }
                        black_box(v);
                    }
                }
            }),
    );
}

gridbench::suite!("suites/grids.rs", register_grids);

// ============================================================================
// Budget Overrides
// ============================================================================

/// A per-benchmark budget overrides the session default
fn register_compute(h: &Harness) {
    fn fib_naive(n: u32) -> u64 {
        if n <= 1 {
            n as u64
        } else {
            fib_naive(n - 1) + fib_naive(n - 2)
        }
    }

    fn fib_iter(n: u32) -> u64 {
        let mut a = 0u64;
        let mut b = 1u64;
        for _ in 0..n {
            let tmp = a;
            a = b;
            b += tmp;
        }
        a
    }

    h.register_simple(
        SimpleBench::new("fibonacci")
            .budget(Duration::from_millis(250))
            .case("naive", || {
                black_box(fib_naive(20));
            })
            .case("iterative", || {
                black_box(fib_iter(20));
            }),
    );
}

gridbench::suite!("suites/compute.rs", register_compute);

// ============================================================================
// Failure Isolation
// ============================================================================

/// Benchmark that panics mid-measurement, used to show failure isolation
fn register_crash(h: &Harness) {
    h.register_simple(SimpleBench::new("panics_during_measure").case("boom", || {
        static COUNTER: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);
        let count = COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if count >= 5 {
            panic!("Intentional panic for failure isolation demo!");
        }
        black_box(count);
    }));

    // Runs after the crashing benchmark; the run continues and only the
    // exit code remembers the failure.
    h.register_simple(SimpleBench::new("after_crash").case("fine", || {
        black_box(42u64 + 17);
    }));
}

gridbench::suite!("suites/crash.rs", register_crash);

fn main() {
    if let Err(e) = gridbench::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
