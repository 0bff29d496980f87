//! Batch execution: the allocator and its worker pool.
//!
//! The allocator reads one run configuration, fans the execute-flagged
//! instances out over a fixed-size pool of worker threads, and aggregates
//! one summary row per instance. All shared state is carried by an injected
//! [`BatchContext`]: the cooperative abort flag plus the lock-guarded result
//! summary. Errors never cross a worker boundary — every instance ends as a
//! Passed / Failed / Aborted summary row, and the exit code is computed only
//! after every worker has joined.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::datatable::ModuleData;
use crate::engine::{AbortFlag, DriverScript, FlowStrategy, KeywordFlow};
use crate::manifest::RunConfiguration;
use crate::params::TestParameters;
use crate::registry::KeywordRegistry;
use crate::report::{format_elapsed, InstanceStatus, ResultSummary, SummaryEntry};
use crate::result::VolanteResult;
use crate::session::SessionBackend;
use crate::settings::Settings;

/// Shared state injected into every worker: the abort flag and the summary
/// sink. Replaces any notion of process-global harness state.
#[derive(Debug)]
pub struct BatchContext {
    abort: AbortFlag,
    summary: Mutex<ResultSummary>,
    write_delay: Option<Duration>,
}

impl Default for BatchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchContext {
    /// Create a fresh context with an empty summary
    #[must_use]
    pub fn new() -> Self {
        Self {
            abort: AbortFlag::new(),
            summary: Mutex::new(ResultSummary::new()),
            write_delay: None,
        }
    }

    /// Artificial delay inside the summary critical section, for isolation
    /// testing of concurrent summary writes
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Handle to the shared abort flag
    #[must_use]
    pub fn abort_flag(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Append one summary row under the summary lock
    pub fn record(&self, entry: SummaryEntry) {
        let mut summary = self.summary.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = self.write_delay {
            std::thread::sleep(delay);
        }
        summary.add_entry(entry);
    }

    /// Run a closure against the locked summary
    pub fn with_summary<T>(&self, f: impl FnOnce(&mut ResultSummary) -> T) -> T {
        let mut summary = self.summary.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut summary)
    }

    /// Clone out the current summary
    #[must_use]
    pub fn snapshot(&self) -> ResultSummary {
        self.summary
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Result of one batch execution
#[derive(Debug)]
pub struct BatchOutcome {
    /// Process exit code: 0 when every instance passed, 1 otherwise
    pub exit_code: i32,
    /// The finalized batch summary
    pub summary: ResultSummary,
}

type StrategyFactory = Arc<dyn Fn() -> Box<dyn FlowStrategy> + Send + Sync>;

/// Drives the batch execution of test instances from a run configuration
pub struct Allocator {
    settings: Settings,
    run_config: RunConfiguration,
    backend: Arc<dyn SessionBackend>,
    datatable_dir: PathBuf,
    strategy_factory: StrategyFactory,
}

impl Allocator {
    /// Allocator for keyword-driven execution: every instance dispatches
    /// through the shared registry over a sub-iterative data layout.
    #[must_use]
    pub fn keyword_driven(
        settings: Settings,
        run_config: RunConfiguration,
        backend: Arc<dyn SessionBackend>,
        registry: Arc<KeywordRegistry>,
        datatable_dir: impl Into<PathBuf>,
    ) -> Self {
        let factory: StrategyFactory =
            Arc::new(move || Box::new(KeywordFlow::new(Arc::clone(&registry))));
        Self {
            settings,
            run_config,
            backend,
            datatable_dir: datatable_dir.into(),
            strategy_factory: factory,
        }
    }

    /// Allocator with a custom per-instance strategy factory (modular
    /// flavors, non-iterative layouts)
    #[must_use]
    pub fn with_strategy(
        settings: Settings,
        run_config: RunConfiguration,
        backend: Arc<dyn SessionBackend>,
        datatable_dir: impl Into<PathBuf>,
        strategy_factory: impl Fn() -> Box<dyn FlowStrategy> + Send + Sync + 'static,
    ) -> Self {
        Self {
            settings,
            run_config,
            backend,
            datatable_dir: datatable_dir.into(),
            strategy_factory: Arc::new(strategy_factory),
        }
    }

    /// Execute the batch and compute the overall exit code.
    ///
    /// Fails only when the run configuration itself is unusable; individual
    /// instance failures are summary rows, never errors.
    pub fn run_batch(&self) -> VolanteResult<BatchOutcome> {
        self.run_batch_with(Arc::new(BatchContext::new()))
    }

    /// Execute the batch against an externally supplied context
    pub fn run_batch_with(&self, context: Arc<BatchContext>) -> VolanteResult<BatchOutcome> {
        let start = Instant::now();
        info!(
            run_configuration = %self.run_config.name,
            threads = self.settings.thread_count,
            "starting test batch execution"
        );

        let instances = self.run_config.instances_to_run()?;
        self.initialize_summary(&context, instances.len());

        let queue: Arc<Mutex<VecDeque<TestParameters>>> =
            Arc::new(Mutex::new(instances.into_iter().collect()));
        let thread_count = self.settings.thread_count.max(1);

        std::thread::scope(|scope| {
            for worker in 0..thread_count {
                let queue = Arc::clone(&queue);
                let context = Arc::clone(&context);
                scope.spawn(move || loop {
                    let params = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
                    let Some(params) = params else { break };
                    self.run_instance(&context, params, worker);
                });
            }
        });

        // Every worker has joined; the exit code is final.
        let exit_code = context.with_summary(|summary| {
            summary.add_footer(format_elapsed(start.elapsed()));
            i32::from(!summary.all_passed())
        });
        let summary = context.snapshot();
        self.flush_summary(&summary);
        info!(exit_code, "test batch execution complete");

        Ok(BatchOutcome { exit_code, summary })
    }

    fn flush_summary(&self, summary: &ResultSummary) {
        let Some(base) = &self.settings.report_path else {
            return;
        };
        let flushed = std::fs::create_dir_all(base)
            .map_err(crate::result::VolanteError::from)
            .and_then(|()| summary.to_json())
            .and_then(|json| std::fs::write(base.join("Summary.json"), json).map_err(Into::into));
        if let Err(e) = flushed {
            warn!(error = %e, "could not flush batch summary");
        }
    }

    /// Copy the module's data table next to the report output, once per
    /// module, when the settings ask for test data in the report.
    fn copy_runtime_datatable(&self, data_path: &std::path::Path, module: &str) {
        if !self.settings.include_test_data_in_report {
            return;
        }
        let Some(base) = &self.settings.report_path else {
            return;
        };
        let dest_dir = base.join("datatables");
        let dest = dest_dir.join(format!("{module}.yaml"));
        if dest.exists() {
            return;
        }
        let copied = std::fs::create_dir_all(&dest_dir)
            .and_then(|()| std::fs::copy(data_path, &dest).map(|_| ()));
        if let Err(e) = copied {
            warn!(error = %e, "could not copy run-time data table");
        }
    }

    fn initialize_summary(&self, context: &BatchContext, instance_count: usize) {
        context.with_summary(|summary| {
            summary.add_heading(format!(
                "{} - Automation Execution Results Summary",
                self.settings.project_name
            ));
            summary.add_sub_heading(
                "Date & Time",
                summary.started_at.format("%d-%b-%Y %H:%M:%S").to_string(),
                "OnError",
                self.settings.on_error.to_string(),
            );
            summary.add_sub_heading(
                "Run Configuration",
                self.run_config.name.clone(),
                "No. of threads",
                self.settings.thread_count.max(1).to_string(),
            );
            summary.add_sub_heading(
                "Total instances",
                instance_count.to_string(),
                "",
                String::new(),
            );
        });
    }

    fn run_instance(&self, context: &BatchContext, params: TestParameters, worker: usize) {
        if context.abort_flag().is_set() {
            info!(
                test_case = %params.test_case,
                "abort flag set, recording instance as aborted"
            );
            context.record(SummaryEntry {
                params,
                report_name: "N/A".to_string(),
                execution_time: "N/A".to_string(),
                status: InstanceStatus::Aborted,
            });
            return;
        }

        info!(worker, test_case = %params.test_case, instance = %params.test_instance, "worker picked up instance");
        let entry = match self.drive_one(context, params.clone()) {
            Ok(outcome) => SummaryEntry {
                params: outcome.params,
                report_name: outcome.report_name,
                execution_time: outcome.execution_time,
                status: outcome.status,
            },
            Err(description) => {
                error!(test_case = %params.test_case, %description, "instance failed outside the engine");
                SummaryEntry {
                    params,
                    report_name: "N/A".to_string(),
                    execution_time: "N/A".to_string(),
                    status: InstanceStatus::Failed,
                }
            }
        };
        context.record(entry);
    }

    /// Run one engine, converting errors and panics into a failure
    /// description so nothing escapes the worker.
    fn drive_one(
        &self,
        context: &BatchContext,
        params: TestParameters,
    ) -> Result<crate::engine::EngineOutcome, String> {
        let data_path = self
            .datatable_dir
            .join(format!("{}.yaml", params.module));
        let data = match ModuleData::load(&data_path) {
            Ok(data) => data,
            Err(e) => {
                return Err(format!(
                    "Could not load data table {}: {e}",
                    data_path.display()
                ))
            }
        };
        self.copy_runtime_datatable(&data_path, &params.module);

        let engine = DriverScript::new(params, self.settings.clone(), context.abort_flag());
        let strategy = (self.strategy_factory)();
        let result = catch_unwind(AssertUnwindSafe(|| {
            engine.run(self.backend.as_ref(), data, strategy)
        }));

        match result {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(e.to_string()),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "worker panicked".to_string());
                warn!(%message, "test instance panicked");
                Err(message)
            }
        }
    }
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("run_configuration", &self.run_config.name)
            .field("threads", &self.settings.thread_count)
            .field("datatable_dir", &self.datatable_dir)
            .finish_non_exhaustive()
    }
}
