//! Benchmark Jobs
//!
//! Job declarations and the per-case lifecycle: optional setup, heap
//! trim, timed warmup probe, classification, measurement, teardown.
//! The teardown consumes the setup state exactly once no matter how
//! the measured phases end. Every panic inside a case is caught at
//! its phase and surfaced as a `CaseError`; the scheduler catches
//! anything that escapes the job body itself.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::classify::{classify, Classification, MARGINAL_THROUGHPUT};
use crate::console::Console;
use crate::grid::{expand_grid, CaseData, Dimension, GridError};
use crate::measure::{throughput, RepetitionEngine};
use crate::memory::trim_memory;

/// Type-erased state produced by a case's setup and consumed by its
/// teardown.
pub type PreState = Box<dyn Any>;

/// Lifecycle phase in which a case panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The setup callback.
    Setup,
    /// The single timed warmup invocation.
    Probe,
    /// The repetition engine's measurement loop.
    Measure,
    /// The teardown callback.
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Setup => "setup",
            Phase::Probe => "probe",
            Phase::Measure => "measure",
            Phase::Teardown => "teardown",
        };
        f.write_str(s)
    }
}

/// Why a job failed. Aborts the rest of the job's cases; the run
/// itself continues with the next queue entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaseError {
    /// A case callback panicked.
    #[error("{phase} panicked in case '{case}': {message}")]
    Panicked {
        /// Case label.
        case: String,
        /// Phase that panicked.
        phase: Phase,
        /// Recovered panic payload.
        message: String,
    },
    /// A case panicked and the teardown that still ran panicked too.
    #[error("{phase} panicked in case '{case}': {message}; teardown also panicked: {teardown}")]
    PanickedWithTeardown {
        /// Case label.
        case: String,
        /// Phase of the first panic.
        phase: Phase,
        /// First panic payload.
        message: String,
        /// Teardown panic payload.
        teardown: String,
    },
    /// A panic escaped the job outside any case phase. Grid filter
    /// predicates run there, during expansion.
    #[error("benchmark panicked: {message}")]
    Unwound {
        /// Recovered panic payload.
        message: String,
    },
    /// The benchmark declared an empty case set.
    #[error("benchmark declares no cases")]
    EmptyCases,
    /// A grid benchmark declared no run callback.
    #[error("benchmark declares no run callback")]
    MissingCallback,
    /// The parameter grid could not be expanded.
    #[error("malformed parameter grid: {0}")]
    Grid(#[from] GridError),
}

/// Extract a printable message from a panic payload.
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Benchmark with explicit named cases.
pub struct SimpleBench {
    name: String,
    description: Option<String>,
    budget: Option<Duration>,
    cases: Vec<(String, Box<dyn FnMut()>)>,
    pre: Option<Box<dyn FnMut() -> PreState>>,
    post: Option<Box<dyn FnMut(PreState)>>,
}

impl SimpleBench {
    /// Benchmark with no cases yet.
    pub fn new(name: impl Into<String>) -> Self {
        SimpleBench {
            name: name.into(),
            description: None,
            budget: None,
            cases: Vec::new(),
            pre: None,
            post: None,
        }
    }

    /// Description shown next to the name in the output scope.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Per-benchmark time budget, overriding the session default.
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Add a named case. Cases run in declaration order.
    pub fn case(mut self, name: impl Into<String>, mut callback: impl FnMut() + 'static) -> Self {
        self.cases.push((name.into(), Box::new(move || callback())));
        self
    }

    /// Setup run before each case; its return value is handed to
    /// [`post`](Self::post).
    pub fn pre<S: Any>(mut self, mut setup: impl FnMut() -> S + 'static) -> Self {
        self.pre = Some(Box::new(move || Box::new(setup()) as PreState));
        self
    }

    /// Teardown run after each case, consuming the setup state.
    pub fn post<S: Any>(mut self, mut teardown: impl FnMut(S) + 'static) -> Self {
        self.post = Some(Box::new(move |state: PreState| match state.downcast::<S>() {
            Ok(state) => teardown(*state),
            Err(_) => panic!("teardown state type does not match setup"),
        }));
        self
    }
}

/// Benchmark over a parameter grid.
pub struct GridBench {
    name: String,
    description: Option<String>,
    budget: Option<Duration>,
    dimensions: Vec<Dimension>,
    pre: Option<Box<dyn FnMut(&CaseData) -> PreState>>,
    post: Option<Box<dyn FnMut(PreState)>>,
    run: Option<Box<dyn FnMut(&CaseData, &mut PreState)>>,
}

impl GridBench {
    /// Benchmark with no dimensions yet.
    pub fn new(name: impl Into<String>) -> Self {
        GridBench {
            name: name.into(),
            description: None,
            budget: None,
            dimensions: Vec::new(),
            pre: None,
            post: None,
            run: None,
        }
    }

    /// Description shown next to the name in the output scope.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Per-benchmark time budget, overriding the session default.
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Append a dimension. Declaration order fixes sweep order.
    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Setup run before each combination, handed the combination's
    /// data; its return value goes to [`post`](Self::post).
    pub fn pre<S: Any>(mut self, mut setup: impl FnMut(&CaseData) -> S + 'static) -> Self {
        self.pre = Some(Box::new(move |data| Box::new(setup(data)) as PreState));
        self
    }

    /// Teardown run after each combination, consuming the setup state.
    pub fn post<S: Any>(mut self, mut teardown: impl FnMut(S) + 'static) -> Self {
        self.post = Some(Box::new(move |state: PreState| match state.downcast::<S>() {
            Ok(state) => teardown(*state),
            Err(_) => panic!("teardown state type does not match setup"),
        }));
        self
    }

    /// Measured callback receiving the combination's data.
    pub fn run(mut self, mut callback: impl FnMut(&CaseData) + 'static) -> Self {
        self.run = Some(Box::new(move |data, _state| callback(data)));
        self
    }

    /// Measured callback receiving the combination's data and the
    /// setup state.
    pub fn run_with_state<S: Any>(
        mut self,
        mut callback: impl FnMut(&CaseData, &mut S) + 'static,
    ) -> Self {
        self.run = Some(Box::new(move |data, state| {
            match state.downcast_mut::<S>() {
                Some(state) => callback(data, state),
                None => panic!("case state type does not match setup"),
            }
        }));
        self
    }
}

/// One registered benchmark awaiting execution.
pub enum Job {
    /// Benchmark with explicit named cases.
    Simple(SimpleBench),
    /// Benchmark over a parameter grid.
    Grid(GridBench),
}

impl Job {
    /// Benchmark name.
    pub fn name(&self) -> &str {
        match self {
            Job::Simple(bench) => &bench.name,
            Job::Grid(bench) => &bench.name,
        }
    }

    /// Optional description for the output scope label.
    pub fn description(&self) -> Option<&str> {
        match self {
            Job::Simple(bench) => bench.description.as_deref(),
            Job::Grid(bench) => bench.description.as_deref(),
        }
    }

    /// Whether this is a parameter-grid benchmark.
    pub fn is_complex(&self) -> bool {
        matches!(self, Job::Grid(_))
    }

    /// Per-benchmark budget override, if declared.
    pub fn budget(&self) -> Option<Duration> {
        match self {
            Job::Simple(bench) => bench.budget,
            Job::Grid(bench) => bench.budget,
        }
    }
}

/// Outcome of one executed case.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    /// Owning benchmark.
    pub benchmark: String,
    /// Case name, or joined labels for grid combinations.
    pub case: String,
    /// Dimension labels in declared order; empty for simple cases.
    pub labels: Vec<String>,
    /// Admission decision from the warmup probe.
    pub classification: Classification,
    /// Budget-normalized repetitions, or the skip/marginal sentinel.
    pub throughput: u64,
}

/// Execute one job: expand its cases, run each through the lifecycle,
/// emit one row per case, and append to `records`.
pub(crate) fn run_job(
    job: &mut Job,
    budget: Duration,
    engine: &mut dyn RepetitionEngine,
    console: &mut Console,
    records: &mut Vec<CaseRecord>,
) -> Result<(), CaseError> {
    let name = job.name().to_string();
    match job {
        Job::Simple(bench) => run_simple(&name, bench, budget, engine, console, records),
        Job::Grid(bench) => run_grid(&name, bench, budget, engine, console, records),
    }
}

fn run_simple(
    name: &str,
    bench: &mut SimpleBench,
    budget: Duration,
    engine: &mut dyn RepetitionEngine,
    console: &mut Console,
    records: &mut Vec<CaseRecord>,
) -> Result<(), CaseError> {
    if bench.cases.is_empty() {
        return Err(CaseError::EmptyCases);
    }
    for (case_name, callback) in &mut bench.cases {
        let state: PreState = match bench.pre.as_mut() {
            Some(pre) => run_setup(case_name, || pre())?,
            None => Box::new(()),
        };
        let outcome = measure_case(&mut || callback(), budget, engine);
        let teardown_panic = run_teardown(bench.post.as_mut(), state);
        let (classification, result) = settle(case_name, outcome, teardown_panic)?;

        console.case_row(result, case_name);
        records.push(CaseRecord {
            benchmark: name.to_string(),
            case: case_name.clone(),
            labels: Vec::new(),
            classification,
            throughput: result,
        });
    }
    Ok(())
}

fn run_grid(
    name: &str,
    bench: &mut GridBench,
    budget: Duration,
    engine: &mut dyn RepetitionEngine,
    console: &mut Console,
    records: &mut Vec<CaseRecord>,
) -> Result<(), CaseError> {
    let plan = expand_grid(&bench.dimensions)?;
    let run = bench.run.as_mut().ok_or(CaseError::MissingCallback)?;

    if bench.dimensions.len() > 1 {
        let names: Vec<&str> = bench
            .dimensions
            .iter()
            .map(|d| d.display_name.as_str())
            .collect();
        console.header_row(&names);
    }

    for combo in &plan.combinations {
        let labels: Vec<String> = combo.labels.iter().map(|(_, l)| l.clone()).collect();
        let case_label = labels.join("  ");

        let mut state: PreState = match bench.pre.as_mut() {
            Some(pre) => run_setup(&case_label, || pre(&combo.data))?,
            None => Box::new(()),
        };
        let outcome = measure_case(&mut || run(&combo.data, &mut state), budget, engine);
        let teardown_panic = run_teardown(bench.post.as_mut(), state);
        let (classification, result) = settle(&case_label, outcome, teardown_panic)?;

        console.case_row(result, &case_label);
        records.push(CaseRecord {
            benchmark: name.to_string(),
            case: labels.join(" "),
            labels,
            classification,
            throughput: result,
        });

        // Innermost sweep boundary; structural equality, so duplicate
        // values in the last dimension match early.
        if combo.data.get(&plan.sweep_key) == Some(&plan.sweep_end) {
            console.blank();
        }
    }
    Ok(())
}

/// Probe, classify, and (when admitted) measure one case.
fn measure_case(
    op: &mut dyn FnMut(),
    budget: Duration,
    engine: &mut dyn RepetitionEngine,
) -> Result<(Classification, u64), (Phase, String)> {
    trim_memory();

    let probe_start = Instant::now();
    catch_unwind(AssertUnwindSafe(|| op())).map_err(|p| (Phase::Probe, panic_message(p)))?;
    let probe = probe_start.elapsed();

    match classify(probe, budget) {
        Classification::Skipped => Ok((Classification::Skipped, 0)),
        Classification::Marginal => Ok((Classification::Marginal, MARGINAL_THROUGHPUT)),
        Classification::Measured => {
            let timing = catch_unwind(AssertUnwindSafe(|| engine.run_until(budget, op)))
                .map_err(|p| (Phase::Measure, panic_message(p)))?;
            Ok((Classification::Measured, throughput(timing, budget)))
        }
    }
}

fn run_setup(case: &str, setup: impl FnOnce() -> PreState) -> Result<PreState, CaseError> {
    catch_unwind(AssertUnwindSafe(setup)).map_err(|p| CaseError::Panicked {
        case: case.to_string(),
        phase: Phase::Setup,
        message: panic_message(p),
    })
}

/// Run the teardown with the case's state. Returns the panic message
/// if the teardown itself panicked.
fn run_teardown(post: Option<&mut Box<dyn FnMut(PreState)>>, state: PreState) -> Option<String> {
    match post {
        Some(post) => catch_unwind(AssertUnwindSafe(|| post(state)))
            .err()
            .map(panic_message),
        None => None,
    }
}

/// Combine the measured outcome with the teardown outcome. A teardown
/// panic after a successful measurement still fails the case; one
/// after a failed measurement is reported alongside, not dropped.
fn settle(
    case: &str,
    outcome: Result<(Classification, u64), (Phase, String)>,
    teardown_panic: Option<String>,
) -> Result<(Classification, u64), CaseError> {
    match (outcome, teardown_panic) {
        (Ok(result), None) => Ok(result),
        (Ok(_), Some(teardown)) => Err(CaseError::Panicked {
            case: case.to_string(),
            phase: Phase::Teardown,
            message: teardown,
        }),
        (Err((phase, message)), None) => Err(CaseError::Panicked {
            case: case.to_string(),
            phase,
            message,
        }),
        (Err((phase, message)), Some(teardown)) => Err(CaseError::PanickedWithTeardown {
            case: case.to_string(),
            phase,
            message,
            teardown,
        }),
    }
}
