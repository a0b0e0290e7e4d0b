//! Run Session and Scheduler
//!
//! A session owns the FIFO work queue, the run counters, and the
//! console. Registration entry points enqueue; nothing executes
//! inline. The first registration while the queue is idle arms a
//! drain on the local task set, so every registration made by the
//! same synchronous call stack lands in the queue before the first
//! job runs. A drain then consumes the queue to exhaustion without
//! yielding. When the queue empties after discovery has finished,
//! the session prints the summary and resolves its completion
//! channel; before that it simply parks until the next registration
//! re-arms it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use regex::Regex;
use tokio::sync::oneshot;

use crate::console::Console;
use crate::job::{panic_message, run_job, CaseError, CaseRecord, GridBench, Job, SimpleBench};
use crate::measure::{RepetitionEngine, WallClockEngine};
use crate::suite::{LoadError, SuiteLoader};

/// One entry in the scheduler's queue.
pub enum QueueEntry {
    /// Begin a labeled output scope.
    GroupOpen(String),
    /// End the current scope, followed by a blank separator.
    GroupClose,
    /// A registered benchmark.
    Job(Job),
}

/// Run-wide counters reported in the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTotals {
    /// Files appended during discovery.
    pub files: usize,
    /// Benchmarks executed.
    pub benchmarks: usize,
    /// Benchmarks that failed.
    pub failed: usize,
}

/// Final outcome of a drained run.
#[derive(Debug)]
pub struct RunSummary {
    /// Final counters.
    pub totals: RunTotals,
    /// Every executed case in run order.
    pub records: Vec<CaseRecord>,
    /// Captured console output when the session ran buffered.
    pub output: Option<String>,
}

impl RunSummary {
    /// Process exit status for this run: 1 when any benchmark failed.
    pub fn exit_code(&self) -> i32 {
        if self.totals.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Session-wide execution settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Budget applied where a benchmark declares none.
    pub default_budget: Duration,
    /// Name filter; non-matching registrations are dropped at enqueue.
    pub filter: Option<Regex>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_budget: Duration::from_secs(1),
            filter: None,
        }
    }
}

struct SessionState {
    queue: VecDeque<QueueEntry>,
    totals: RunTotals,
    records: Vec<CaseRecord>,
    running: bool,
    discovery_done: bool,
    console: Console,
    engine: Box<dyn RepetitionEngine>,
    default_budget: Duration,
    filter: Option<Regex>,
    done_tx: Option<oneshot::Sender<RunSummary>>,
}

/// Handle to the session scheduler. Cloning shares the session.
///
/// Must live inside a tokio `LocalSet`: drains are spawned with
/// `spawn_local` and run at the next cooperative yield.
#[derive(Clone)]
pub struct Harness {
    state: Rc<RefCell<SessionState>>,
}

impl Harness {
    /// Session writing to stdout, measuring with the wall-clock engine.
    pub fn new(config: SessionConfig) -> (Self, oneshot::Receiver<RunSummary>) {
        Self::with_parts(config, Box::new(WallClockEngine), Console::stdout())
    }

    /// Session with an explicit engine and console, for embedding and
    /// tests.
    pub fn with_parts(
        config: SessionConfig,
        engine: Box<dyn RepetitionEngine>,
        console: Console,
    ) -> (Self, oneshot::Receiver<RunSummary>) {
        let (done_tx, done_rx) = oneshot::channel();
        let state = SessionState {
            queue: VecDeque::new(),
            totals: RunTotals::default(),
            records: Vec::new(),
            running: false,
            discovery_done: false,
            console,
            engine,
            default_budget: config.default_budget,
            filter: config.filter,
            done_tx: Some(done_tx),
        };
        (
            Harness {
                state: Rc::new(RefCell::new(state)),
            },
            done_rx,
        )
    }

    /// Register a benchmark with explicit named cases.
    pub fn register_simple(&self, bench: SimpleBench) {
        self.register(Job::Simple(bench));
    }

    /// Register a parameter-grid benchmark.
    pub fn register_complex(&self, bench: GridBench) {
        self.register(Job::Grid(bench));
    }

    fn register(&self, job: Job) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(filter) = &state.filter {
                if !filter.is_match(job.name()) {
                    tracing::debug!(benchmark = job.name(), "dropped by filter");
                    return;
                }
            }
            tracing::debug!(
                benchmark = job.name(),
                complex = job.is_complex(),
                "registered"
            );
            state.queue.push_back(QueueEntry::Job(job));
        }
        self.arm();
    }

    /// Open a labeled group scope around subsequent registrations.
    pub fn open_group(&self, label: impl Into<String>) {
        self.state
            .borrow_mut()
            .queue
            .push_back(QueueEntry::GroupOpen(label.into()));
        self.arm();
    }

    /// Close the innermost group scope.
    pub fn close_group(&self) {
        self.state.borrow_mut().queue.push_back(QueueEntry::GroupClose);
        self.arm();
    }

    /// Append one benchmark file: open a scope named after the path,
    /// run the loader's registrations synchronously, close the scope.
    ///
    /// The closing marker is enqueued even when loading fails, keeping
    /// scopes balanced; the error is returned for the caller to decide
    /// whether discovery continues.
    pub fn append_file(&self, path: &str, loader: &mut dyn SuiteLoader) -> Result<(), LoadError> {
        tracing::info!(path, "loading benchmark file");
        {
            let mut state = self.state.borrow_mut();
            state.totals.files += 1;
            state
                .queue
                .push_back(QueueEntry::GroupOpen(path.to_string()));
        }
        self.arm();
        let result = loader.load(path, self);
        self.state.borrow_mut().queue.push_back(QueueEntry::GroupClose);
        self.arm();
        result
    }

    /// Declare discovery complete. Once the queue drains the session
    /// prints the summary and resolves the completion channel.
    pub fn finish(&self) {
        let complete_now = {
            let mut state = self.state.borrow_mut();
            state.discovery_done = true;
            !state.running && state.queue.is_empty()
        };
        if complete_now {
            self.complete();
        }
    }

    /// Schedule a drain unless one is already pending or running. The
    /// drain starts at the next cooperative yield, never inline.
    fn arm(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.running {
                return;
            }
            state.running = true;
        }
        let harness = self.clone();
        tokio::task::spawn_local(async move {
            harness.drain();
        });
    }

    /// Consume the queue to exhaustion, then either complete the run
    /// or park until the next registration re-arms.
    fn drain(&self) {
        loop {
            let entry = self.state.borrow_mut().queue.pop_front();
            match entry {
                Some(QueueEntry::GroupOpen(label)) => {
                    self.state.borrow_mut().console.open_scope(&label);
                }
                Some(QueueEntry::GroupClose) => {
                    let mut state = self.state.borrow_mut();
                    state.console.close_scope();
                    state.console.blank();
                }
                Some(QueueEntry::Job(mut job)) => {
                    self.execute_job(&mut job);
                }
                None => {
                    let discovery_done = {
                        let mut state = self.state.borrow_mut();
                        state.running = false;
                        state.discovery_done
                    };
                    if discovery_done {
                        self.complete();
                    }
                    return;
                }
            }
        }
    }

    /// Run one job inside its failure boundary.
    fn execute_job(&self, job: &mut Job) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        let scope = match job.description() {
            Some(desc) => format!("{} - {}", job.name(), desc),
            None => job.name().to_string(),
        };
        state.console.open_scope(&scope);
        state.totals.benchmarks += 1;

        let budget = job.budget().unwrap_or(state.default_budget);
        // Grid filters run user code during expansion, outside the
        // per-case guards. Nothing above this frame catches a panic;
        // one that escaped would strand the drain task.
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            run_job(
                job,
                budget,
                &mut *state.engine,
                &mut state.console,
                &mut state.records,
            )
        }))
        .unwrap_or_else(|panic| {
            Err(CaseError::Unwound {
                message: panic_message(panic),
            })
        });
        match outcome {
            Ok(()) => {}
            Err(err) => {
                state.totals.failed += 1;
                state.console.error(&err.to_string());
                tracing::error!(benchmark = job.name(), error = %err, "benchmark failed");
            }
        }
        state.console.close_scope();
    }

    fn complete(&self) {
        let mut state = self.state.borrow_mut();
        let tx = match state.done_tx.take() {
            Some(tx) => tx,
            None => return,
        };
        let totals = state.totals;
        state
            .console
            .summary(totals.files, totals.benchmarks, totals.failed);
        let records = std::mem::take(&mut state.records);
        let output = state.console.take_buffer();
        drop(state);
        let _ = tx.send(RunSummary {
            totals,
            records,
            output,
        });
    }
}
