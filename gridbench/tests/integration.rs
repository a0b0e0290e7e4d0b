//! Integration tests for Gridbench
//!
//! These tests verify the end-to-end behavior of the benchmarking session:
//! registration through the public facade, real wall-clock measurement with
//! small budgets, and the console output contract.

use gridbench::{
    CaseData, Classification, Console, Dimension, GridBench, Harness, LoadError, RegistryLoader,
    RunSummary, SessionConfig, SimpleBench, WallClockEngine, MARGINAL_THROUGHPUT,
};
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Run a session to completion on a local task set, buffering output.
fn drive<F>(config: SessionConfig, setup: F) -> RunSummary
where
    F: FnOnce(&Harness),
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, async move {
        let (harness, done) =
            Harness::with_parts(config, Box::new(WallClockEngine), Console::buffer());
        setup(&harness);
        harness.finish();
        done.await.unwrap()
    })
}

fn quick_config() -> SessionConfig {
    SessionConfig {
        default_budget: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

fn register_alpha(h: &Harness) {
    h.register_simple(SimpleBench::new("alpha_noop").case("only", || {}));
}

gridbench::suite!("suites/alpha.rs", register_alpha);

fn register_beta(h: &Harness) {
    h.register_simple(SimpleBench::new("beta_noop").case("only", || {}));
    h.register_simple(SimpleBench::new("beta_extra").case("only", || {}));
}

gridbench::suite!("suites/beta.rs", register_beta);

/// Test that a benchmark with two cases emits one measured row per case
#[test]
fn test_simple_benchmark_measures_each_case() {
    let config = SessionConfig {
        default_budget: Duration::from_millis(100),
        ..SessionConfig::default()
    };
    let summary = drive(config, |h| {
        h.register_simple(
            SimpleBench::new("parse_u64")
                .case("decimal", || {
                    let _ = "1234567890".parse::<u64>();
                })
                .case("hex", || {
                    let _ = u64::from_str_radix("499602d2", 16);
                }),
        );
    });

    assert_eq!(summary.totals.benchmarks, 1);
    assert_eq!(summary.totals.failed, 0);
    assert_eq!(summary.records.len(), 2);
    for record in &summary.records {
        assert_eq!(record.classification, Classification::Measured);
        assert!(record.throughput > 0);
    }

    let output = summary.output.unwrap();
    assert!(output.contains("parse_u64"));
    assert!(output.contains("decimal"));
    assert!(output.contains("hex"));
    assert!(output.contains("  Files: 0  Benchmarks: 1  Failed: 0"));
}

/// Test that a grid sweep measures every combination in declared order
#[test]
fn test_grid_sweep_runs_in_declared_order() {
    let summary = drive(quick_config(), |h| {
        h.register_complex(
            GridBench::new("vec_with_capacity")
                .dimension(Dimension::values("n", "Capacity", [16u64, 256]))
                .run(|data| {
                    let n = data["n"].as_u64().unwrap() as usize;
                    let _ = Vec::<u8>::with_capacity(n);
                }),
        );
    });

    let cases: Vec<&str> = summary.records.iter().map(|r| r.case.as_str()).collect();
    assert_eq!(cases, vec!["16", "256"]);
    for record in &summary.records {
        assert_eq!(record.classification, Classification::Measured);
        assert!(record.throughput > 0);
    }
}

/// Test that the record count follows the cartesian product minus vetoes
#[test]
fn test_grid_product_count_with_filter() {
    let summary = drive(quick_config(), |h| {
        h.register_complex(
            GridBench::new("filtered")
                .dimension(
                    Dimension::new("mode", "Mode")
                        .option("plain", "plain")
                        .option_when("fancy", "fancy", |labels| labels["n"] != "3"),
                )
                .dimension(Dimension::values("n", "N", [1u64, 2, 3]))
                .run(|_| {}),
        );
    });

    // 2 x 3 product with one vetoed combination.
    assert_eq!(summary.records.len(), 5);
}

/// Test that an over-budget case is skipped with zero throughput
#[test]
fn test_over_budget_case_is_skipped() {
    let config = SessionConfig {
        default_budget: Duration::from_millis(5),
        ..SessionConfig::default()
    };
    let summary = drive(config, |h| {
        h.register_simple(SimpleBench::new("slow").case("sleepy", || {
            std::thread::sleep(Duration::from_millis(50));
        }));
    });

    assert_eq!(summary.totals.failed, 0);
    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].classification, Classification::Skipped);
    assert_eq!(summary.records[0].throughput, 0);
}

/// Test that a marginal case reports the sentinel instead of measuring
#[test]
fn test_marginal_case_reports_sentinel() {
    let config = SessionConfig {
        default_budget: Duration::from_millis(50),
        ..SessionConfig::default()
    };
    let summary = drive(config, |h| {
        h.register_simple(SimpleBench::new("marginal").case("halfway", || {
            std::thread::sleep(Duration::from_millis(30));
        }));
    });

    assert_eq!(summary.records[0].classification, Classification::Marginal);
    assert_eq!(summary.records[0].throughput, MARGINAL_THROUGHPUT);
}

/// Test that a panicking benchmark fails the run without stopping it
#[test]
fn test_panicking_benchmark_is_isolated() {
    let summary = drive(quick_config(), |h| {
        h.register_simple(SimpleBench::new("boom").case("panics", || panic!("deliberate")));
        h.register_simple(SimpleBench::new("fine").case("still_runs", || {}));
    });

    assert_eq!(summary.totals.benchmarks, 2);
    assert_eq!(summary.totals.failed, 1);
    assert_eq!(summary.exit_code(), 1);

    let survivors: Vec<&str> = summary
        .records
        .iter()
        .map(|r| r.benchmark.as_str())
        .collect();
    assert_eq!(survivors, vec!["fine"]);

    let output = summary.output.unwrap();
    assert!(output.contains("error:"));
    assert!(output.contains("deliberate"));
}

/// Test that a panicking grid filter fails its job and the run goes on
#[test]
fn test_panicking_grid_filter_is_isolated() {
    let summary = drive(quick_config(), |h| {
        h.register_complex(
            GridBench::new("vetoed")
                .dimension(
                    Dimension::new("n", "N")
                        .option("1", 1u64)
                        .option_when("2", 2u64, |_| panic!("filter fell over")),
                )
                .run(|_| {}),
        );
        h.register_simple(SimpleBench::new("fine").case("still_runs", || {}));
    });

    assert_eq!(summary.totals.benchmarks, 2);
    assert_eq!(summary.totals.failed, 1);
    assert_eq!(summary.exit_code(), 1);

    // Expansion aborted before any case of the vetoed grid ran.
    let survivors: Vec<&str> = summary
        .records
        .iter()
        .map(|r| r.benchmark.as_str())
        .collect();
    assert_eq!(survivors, vec!["fine"]);

    let output = summary.output.unwrap();
    assert!(output.contains("error:"));
    assert!(output.contains("filter fell over"));
}

/// Test that setup state flows through measurement to teardown
#[test]
fn test_setup_state_reaches_teardown() {
    let finals: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = finals.clone();
    let summary = drive(quick_config(), move |h| {
        h.register_complex(
            GridBench::new("stateful")
                .dimension(Dimension::values("n", "N", [100u64]))
                .pre(|data: &CaseData| data["n"].as_u64().unwrap())
                .run_with_state(|_data, state: &mut u64| *state += 1)
                .post(move |state: u64| sink.borrow_mut().push(state)),
        );
    });

    assert_eq!(summary.totals.failed, 0);
    let finals = finals.borrow();
    assert_eq!(finals.len(), 1);
    // The probe and at least one measured repetition ran on the state.
    assert!(finals[0] >= 102);
}

/// Test that the header row and sweep separators shape grid output
#[test]
fn test_grid_output_has_header_and_separators() {
    let summary = drive(quick_config(), |h| {
        h.register_complex(
            GridBench::new("matrix")
                .dimension(Dimension::values("a", "Alpha", [1u64, 2]))
                .dimension(Dimension::values("b", "Beta", [10u64, 20]))
                .run(|_| {}),
        );
    });

    let output = summary.output.unwrap();
    assert!(output.contains("Alpha  Beta"));
    // One separator per inner sweep.
    let blanks = output.lines().filter(|l| l.is_empty()).count();
    assert!(blanks >= 2);
}

/// Test that the name filter drops benchmarks at registration
#[test]
fn test_filter_limits_run_to_matches() {
    let config = SessionConfig {
        filter: Some(Regex::new("^keep").unwrap()),
        default_budget: Duration::from_millis(10),
    };
    let summary = drive(config, |h| {
        h.register_simple(SimpleBench::new("keep_this").case("only", || {}));
        h.register_simple(SimpleBench::new("drop_that").case("only", || {}));
    });

    assert_eq!(summary.totals.benchmarks, 1);
    assert_eq!(summary.records[0].benchmark, "keep_this");
}

/// Test that suites registered with the macro load through the registry
#[test]
fn test_macro_registered_suites_load_by_path() {
    let summary = drive(quick_config(), |h| {
        let mut loader = RegistryLoader;
        h.append_file("suites/alpha.rs", &mut loader).unwrap();
        h.append_file("suites/beta.rs", &mut loader).unwrap();
    });

    assert_eq!(summary.totals.files, 2);
    assert_eq!(summary.totals.benchmarks, 3);

    let output = summary.output.unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "suites/alpha.rs");
    // Benchmarks indent under their file scope.
    assert_eq!(lines[1], "  alpha_noop");
    assert!(output.contains("suites/beta.rs"));
    assert!(output.contains("  Files: 2  Benchmarks: 3  Failed: 0"));
}

/// Test that a missing suite path surfaces a load error
#[test]
fn test_unknown_suite_path_fails_to_load() {
    let summary = drive(quick_config(), |h| {
        let mut loader = RegistryLoader;
        let err = h.append_file("suites/nope.rs", &mut loader).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    });

    // The file was counted and its scope closed despite the error.
    assert_eq!(summary.totals.files, 1);
    assert_eq!(summary.totals.benchmarks, 0);
}
