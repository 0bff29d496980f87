//! The driver-script engine.
//!
//! One engine run drives one test instance end to end: resolve parameters,
//! open a session, initialize the log and data table, iterate over data rows
//! executing the flow, tear down, expose the outcome. The iteration logic is
//! shared across flavors through a [`FlowStrategy`]; there is exactly one
//! engine.
//!
//! Failure inside a long browser-driving run must not lose the evidence
//! already gathered, so each iteration is isolated: a failed step routes
//! through the on-error policy instead of unwinding, and teardown (session
//! quit, log footer, elapsed time) runs on every exit path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::context::StepContext;
use crate::datatable::{DataTable, ModuleData, RowSelection};
use crate::flow::{BusinessFlow, KeywordStep};
use crate::params::{IterationMode, OnError, TestParameters};
use crate::registry::KeywordRegistry;
use crate::report::{format_elapsed, InstanceStatus, Status, TestLog};
use crate::result::{StepOutcome, VolanteError, VolanteResult};
use crate::session::{SessionBackend, SessionFactory};
use crate::settings::Settings;

/// Cooperative batch-wide abort signal.
///
/// Set by the Stop on-error policy; checked at iteration and test-instance
/// boundaries only — an in-flight keyword cannot be interrupted.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    /// Create an unset flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check the flag
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Engine lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Resolving configuration and opening the session
    Init,
    /// Running the iteration loop
    Iterating,
    /// Releasing the session and finalizing the log
    Teardown,
    /// Finished normally
    Done,
    /// Finished after observing the batch abort flag
    Aborted,
}

/// What an engine run hands back to the batch harness
#[derive(Debug)]
pub struct EngineOutcome {
    /// Resolved parameters snapshot of the executed instance
    pub params: TestParameters,
    /// Final instance status, derived from the log
    pub status: InstanceStatus,
    /// Report name of the instance
    pub report_name: String,
    /// Wall-clock execution time, formatted `HH:MM:SS`
    pub execution_time: String,
    /// Detail of the first failure, when failed
    pub failure_description: Option<String>,
    /// Iterations that actually executed
    pub iterations_run: u32,
    /// Iterations abandoned by the on-error policy or the abort flag
    pub iterations_skipped: u32,
    /// The full structured log
    pub log: TestLog,
}

/// Per-flavor behavior plugged into the engine
pub trait FlowStrategy: Send {
    /// Row-selection policy for the data table
    fn row_selection(&self) -> RowSelection;

    /// Total iterations configured for the test case (All iteration mode)
    fn iteration_count(&self, table: &DataTable, params: &TestParameters) -> VolanteResult<u32> {
        table.iteration_count(&params.test_case)
    }

    /// The ordered steps executed each iteration
    fn load_steps(
        &mut self,
        data: &ModuleData,
        params: &TestParameters,
    ) -> VolanteResult<Vec<KeywordStep>>;

    /// Execute one step with the cursor already positioned
    fn execute_step(&mut self, step: &KeywordStep, ctx: &mut StepContext) -> StepOutcome;

    /// Hook before the first iteration
    fn on_start(&mut self, _ctx: &mut StepContext) -> StepOutcome {
        StepOutcome::Ok
    }

    /// Hook after the last iteration; runs on every exit path
    fn on_finish(&mut self, _ctx: &mut StepContext) {}
}

/// Keyword-driven flavor: steps come from the business flow, dispatch goes
/// through the shared registry.
pub struct KeywordFlow {
    registry: Arc<KeywordRegistry>,
    selection: RowSelection,
}

impl KeywordFlow {
    /// Sub-iterative keyword flow (the common layout)
    #[must_use]
    pub fn new(registry: Arc<KeywordRegistry>) -> Self {
        Self {
            registry,
            selection: RowSelection::SubIterative,
        }
    }

    /// Keyword flow over a non-iterative data layout
    #[must_use]
    pub fn non_iterative(registry: Arc<KeywordRegistry>) -> Self {
        Self {
            registry,
            selection: RowSelection::NonIterative,
        }
    }
}

impl std::fmt::Debug for KeywordFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordFlow")
            .field("selection", &self.selection)
            .field("keywords", &self.registry.len())
            .finish()
    }
}

impl FlowStrategy for KeywordFlow {
    fn row_selection(&self) -> RowSelection {
        self.selection
    }

    fn load_steps(
        &mut self,
        data: &ModuleData,
        params: &TestParameters,
    ) -> VolanteResult<Vec<KeywordStep>> {
        info!(test_case = %params.test_case, "loading business flow");
        Ok(BusinessFlow::load(data, &params.test_case)?.steps)
    }

    fn execute_step(&mut self, step: &KeywordStep, ctx: &mut StepContext) -> StepOutcome {
        self.registry.invoke(&step.keyword, ctx)
    }
}

/// User-authored modular test script, one type per test case
pub trait TestScript: Send {
    /// Setup before the first iteration
    fn setup(&mut self, _ctx: &mut StepContext) -> StepOutcome {
        StepOutcome::Ok
    }

    /// One full pass through the test logic, driven by the cursor row
    fn run_iteration(&mut self, ctx: &mut StepContext) -> StepOutcome;

    /// Teardown after the last iteration; runs on every exit path
    fn teardown(&mut self, _ctx: &mut StepContext) {}
}

/// Modular flavor: the whole iteration is one user-defined step.
pub struct ModularFlow {
    script: Box<dyn TestScript>,
    selection: RowSelection,
}

impl ModularFlow {
    /// Iterative modular flow (one data row per iteration)
    #[must_use]
    pub fn new(script: Box<dyn TestScript>) -> Self {
        Self {
            script,
            selection: RowSelection::Iterative,
        }
    }

    /// Modular flow over a non-iterative data layout
    #[must_use]
    pub fn non_iterative(script: Box<dyn TestScript>) -> Self {
        Self {
            script,
            selection: RowSelection::NonIterative,
        }
    }
}

impl std::fmt::Debug for ModularFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModularFlow")
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl FlowStrategy for ModularFlow {
    fn row_selection(&self) -> RowSelection {
        self.selection
    }

    fn load_steps(
        &mut self,
        _data: &ModuleData,
        params: &TestParameters,
    ) -> VolanteResult<Vec<KeywordStep>> {
        Ok(vec![KeywordStep::new(params.test_case.clone())])
    }

    fn execute_step(&mut self, _step: &KeywordStep, ctx: &mut StepContext) -> StepOutcome {
        self.script.run_iteration(ctx)
    }

    fn on_start(&mut self, ctx: &mut StepContext) -> StepOutcome {
        self.script.setup(ctx)
    }

    fn on_finish(&mut self, ctx: &mut StepContext) {
        self.script.teardown(ctx);
    }
}

/// What the iteration loop does after a handled failure
enum ErrorResponse {
    Continue,
    SkipToEnd,
}

/// Drives one test instance through INIT, ITERATING, TEARDOWN and DONE.
pub struct DriverScript {
    params: TestParameters,
    settings: Settings,
    abort: AbortFlag,
    state: EngineState,
    current_iteration: u32,
    current_sub_iteration: u32,
    iterations_run: u32,
    iterations_skipped: u32,
}

impl DriverScript {
    /// Create an engine for one test instance
    #[must_use]
    pub fn new(params: TestParameters, settings: Settings, abort: AbortFlag) -> Self {
        Self {
            params,
            settings,
            abort,
            state: EngineState::Init,
            current_iteration: 1,
            current_sub_iteration: 0,
            iterations_run: 0,
            iterations_skipped: 0,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Execute the test instance.
    ///
    /// Errors returned here mean the instance never got past configuration
    /// (bad range, unresolvable mode, session open failure); the batch
    /// harness converts them into a Failed summary row. Once the session is
    /// open every path runs teardown and yields an outcome.
    pub fn run(
        mut self,
        backend: &dyn SessionBackend,
        data: ModuleData,
        mut strategy: Box<dyn FlowStrategy>,
    ) -> VolanteResult<EngineOutcome> {
        let start = Instant::now();
        info!(
            module = %self.params.module,
            test_case = %self.params.test_case,
            instance = %self.params.test_instance,
            "starting test execution"
        );

        self.settings.resolve(&mut self.params);
        self.params.validate_range()?;

        let table = DataTable::new(
            self.params.module.clone(),
            data,
            strategy.row_selection(),
        )
        .with_default_sheet(self.settings.default_sheet.clone())
        .with_reference_identifier(self.settings.reference_identifier.clone());

        self.initialize_iterations(&table, strategy.as_ref())?;

        let factory = SessionFactory::new(self.settings.clone());
        let session = factory.open(&mut self.params, backend)?;

        let log = self.initialize_log();
        let mut ctx = StepContext::new(
            self.params.clone(),
            table,
            log,
            session,
            std::time::Duration::from_secs(self.settings.element_wait_timeout_secs),
            std::time::Duration::from_secs(self.settings.page_load_timeout_secs),
        );

        // From here on the session is live: every path below must reach
        // teardown exactly once.
        self.state = EngineState::Iterating;
        let iterate_result = self.run_iterations(&mut ctx, strategy.as_mut());

        self.state = EngineState::Teardown;
        strategy.on_finish(&mut ctx);
        if let Err(e) = iterate_result {
            // Hard error mid-phase (e.g. missing business flow); recorded as
            // a failure so the summary shows it, but teardown still runs.
            error!(error = %e, "iteration phase aborted");
            ctx.log.update_log("Error", e.to_string(), Status::Fail);
        }
        if let Err(e) = ctx.session.quit() {
            warn!(error = %e, "failed to quit driver session");
            ctx.log
                .update_log("Quit driver session", e.to_string(), Status::Warning);
        }

        let execution_time = format_elapsed(start.elapsed());
        ctx.log.add_footer(execution_time.clone());

        if let Some(base) = &self.settings.report_path {
            let flushed = std::fs::create_dir_all(base)
                .map_err(VolanteError::from)
                .and_then(|()| ctx.log.write_json(base).map(|_| ()));
            if let Err(e) = flushed {
                warn!(error = %e, "could not flush report file");
            }
        }

        if self.state != EngineState::Aborted {
            self.state = EngineState::Done;
        }
        info!(
            status = %ctx.log.status(),
            execution_time = %execution_time,
            "test execution complete"
        );

        Ok(EngineOutcome {
            params: self.params.clone(),
            status: ctx.log.status(),
            report_name: ctx.log.name.clone(),
            execution_time,
            failure_description: ctx.log.failure_description().map(String::from),
            iterations_run: self.iterations_run,
            iterations_skipped: self.iterations_skipped,
            log: ctx.log,
        })
    }

    /// Compute the iteration window before the session opens
    fn initialize_iterations(
        &mut self,
        table: &DataTable,
        strategy: &dyn FlowStrategy,
    ) -> VolanteResult<()> {
        match self.params.iteration_mode {
            IterationMode::All => {
                let count = strategy.iteration_count(table, &self.params)?;
                if count == 0 {
                    return Err(VolanteError::TestCaseNotFound {
                        test_case: self.params.test_case.clone(),
                        sheet: self.settings.default_sheet.clone(),
                    });
                }
                self.params.start_iteration = 1;
                self.params.end_iteration = count;
                self.current_iteration = 1;
            }
            IterationMode::One => {
                self.params.start_iteration = 1;
                self.params.end_iteration = 1;
                self.current_iteration = 1;
            }
            IterationMode::Range => {
                // Bounds already validated
                self.current_iteration = self.params.start_iteration;
            }
        }
        debug!(
            start = self.params.start_iteration,
            end = self.params.end_iteration,
            "iteration window initialized"
        );
        Ok(())
    }

    fn initialize_log(&self) -> TestLog {
        let mut log = TestLog::new(self.params.report_name());
        if let Some(base) = &self.settings.report_path {
            log = log.with_report_path(base.clone());
        }
        log.add_heading(format!(
            "{} - {} Automation Execution Results",
            self.settings.project_name,
            self.params.report_name()
        ));
        log.add_sub_heading(
            "Date & Time",
            log.started_at.format("%d-%b-%Y %H:%M:%S").to_string(),
            "Iteration Mode",
            self.params.iteration_mode.to_string(),
        );
        log.add_sub_heading(
            "Start Iteration",
            self.params.start_iteration.to_string(),
            "End Iteration",
            self.params.end_iteration.to_string(),
        );
        log.add_sub_heading(
            "Browser/Platform",
            self.params.browser_and_platform(),
            "Executed on",
            self.executed_on(),
        );
        if let Some(device) = &self.params.device_name {
            if let Some(mode) = self.params.execution_mode {
                if matches!(
                    mode,
                    crate::capabilities::ExecutionMode::LocalEmulatedDevice
                        | crate::capabilities::ExecutionMode::RemoteEmulatedDevice
                        | crate::capabilities::ExecutionMode::CloudDevice
                        | crate::capabilities::ExecutionMode::AppiumDevice
                ) {
                    log.add_sub_heading(
                        "Device Name",
                        device.clone(),
                        "Device Type",
                        self.params
                            .device_type
                            .map_or_else(String::new, |d| d.to_string()),
                    );
                }
            }
        }
        log
    }

    fn executed_on(&self) -> String {
        use crate::capabilities::ExecutionMode as Mode;
        let url = self.params.remote_url.as_deref().unwrap_or("");
        match self.params.execution_mode {
            Some(Mode::Local) => "Local Machine".to_string(),
            Some(Mode::Remote) => format!("Remote Machine @ {url}"),
            Some(Mode::LocalEmulatedDevice) => "Emulated Device on Local Machine".to_string(),
            Some(Mode::RemoteEmulatedDevice) => {
                format!("Emulated Device on Remote Machine @ {url}")
            }
            Some(Mode::Grid) => format!("Grid @ {url}"),
            Some(Mode::CloudDevice) => format!("Cloud Device Farm @ {url}"),
            Some(Mode::AppiumDevice) => format!("Device on Appium Server @ {url}"),
            None => String::new(),
        }
    }

    fn run_iterations(
        &mut self,
        ctx: &mut StepContext,
        strategy: &mut dyn FlowStrategy,
    ) -> VolanteResult<()> {
        let steps = strategy.load_steps(ctx.table.data(), &self.params)?;

        if let outcome @ StepOutcome::Failed { .. } = strategy.on_start(ctx) {
            if let ErrorResponse::SkipToEnd = self.handle_failure(ctx, outcome) {
                self.iterations_skipped +=
                    self.params.end_iteration - self.current_iteration + 1;
                return Ok(());
            }
        }

        while self.current_iteration <= self.params.end_iteration {
            ctx.log
                .add_section(format!("Iteration: {}", self.current_iteration));
            debug!(iteration = self.current_iteration, "starting iteration");

            let outcome = self.execute_flow(ctx, strategy, &steps);
            self.iterations_run += 1;

            if outcome.is_failed() {
                if let ErrorResponse::SkipToEnd = self.handle_failure(ctx, outcome) {
                    self.iterations_skipped +=
                        self.params.end_iteration - self.current_iteration;
                    self.current_iteration = self.params.end_iteration;
                }
            }

            self.current_iteration += 1;
        }
        Ok(())
    }

    /// Execute one iteration's steps, stopping at the first failed step.
    fn execute_flow(
        &mut self,
        ctx: &mut StepContext,
        strategy: &mut dyn FlowStrategy,
        steps: &[KeywordStep],
    ) -> StepOutcome {
        // Sub-iteration counters restart each iteration, per keyword
        let mut keyword_directory: HashMap<String, u32> = HashMap::new();

        for step in steps {
            for _ in 0..step.repeat_count {
                let sub_iteration = keyword_directory
                    .entry(step.keyword.clone())
                    .and_modify(|n| *n += 1)
                    .or_insert(1);
                self.current_sub_iteration = *sub_iteration;

                let row = ctx.table.set_current_row(
                    &ctx.params.test_case,
                    self.current_iteration,
                    self.current_sub_iteration,
                );
                if row.is_none() {
                    return StepOutcome::failed_as(
                        "Data not found",
                        format!(
                            "No data row for test case \"{}\", iteration {}, sub-iteration {}",
                            ctx.params.test_case,
                            self.current_iteration,
                            self.current_sub_iteration
                        ),
                    );
                }

                if self.current_sub_iteration > 1 {
                    ctx.log.add_subsection(format!(
                        "{} (Sub-Iteration: {})",
                        step.keyword, self.current_sub_iteration
                    ));
                } else {
                    ctx.log.add_subsection(step.keyword.clone());
                }

                let outcome = strategy.execute_step(step, ctx);
                if outcome.is_failed() {
                    return outcome;
                }
            }
        }
        StepOutcome::Ok
    }

    /// Shared failure handler: log the failure, then apply the abort flag /
    /// on-error policy to decide what happens to the remaining iterations.
    fn handle_failure(&mut self, ctx: &mut StepContext, outcome: StepOutcome) -> ErrorResponse {
        let StepOutcome::Failed {
            error_name,
            detail,
            cause,
        } = outcome
        else {
            return ErrorResponse::Continue;
        };

        error!(iteration = self.current_iteration, %error_name, %detail, "step failed");
        match self.capture_failure_screenshot(ctx) {
            Some(reference) => {
                ctx.log
                    .update_log_with_screenshot(&error_name, &detail, Status::Fail, reference);
            }
            None => ctx.log.update_log(&error_name, &detail, Status::Fail),
        }
        if let Some(cause) = cause {
            ctx.log
                .update_log("Caused by", cause, Status::Debug);
        }

        ctx.log.add_subsection("ErrorResponse");
        if self.abort.is_set() {
            ctx.log.update_log(
                "Harness Info",
                "Test execution aborted! All subsequent tests abandoned...",
                Status::Done,
            );
            self.state = EngineState::Aborted;
            return ErrorResponse::SkipToEnd;
        }

        match self.settings.on_error {
            OnError::NextIteration => {
                ctx.log.update_log(
                    "Harness Info",
                    "Iteration terminated. Proceeding to the next iteration (if applicable)...",
                    Status::Done,
                );
                ErrorResponse::Continue
            }
            OnError::NextTestCase => {
                ctx.log.update_log(
                    "Harness Info",
                    "Test case terminated. Proceeding to the next test case (if applicable)...",
                    Status::Done,
                );
                ErrorResponse::SkipToEnd
            }
            OnError::Stop => {
                self.abort.set();
                ctx.log.update_log(
                    "Harness Info",
                    "Test execution stopped! All subsequent tests will be aborted...",
                    Status::Done,
                );
                ErrorResponse::SkipToEnd
            }
        }
    }

    /// Best-effort failure screenshot; headless browsers and broken sessions
    /// simply skip it.
    fn capture_failure_screenshot(&self, ctx: &mut StepContext) -> Option<String> {
        if !ctx.params.browser.is_some_and(|b| b.supports_screenshots()) {
            return None;
        }
        match ctx.session.screenshot() {
            Ok(shot) if shot.is_valid() => {
                let name = format!(
                    "{}_iteration{}_error.png",
                    ctx.params.report_name(),
                    self.current_iteration
                );
                if let Ok(dir) = ctx.log.create_sub_folder("screenshots") {
                    let path = dir.join(&name);
                    if let Err(e) = std::fs::write(&path, &shot.data) {
                        debug!(error = %e, "could not write failure screenshot");
                    }
                }
                Some(name)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "could not capture failure screenshot");
                None
            }
        }
    }
}

impl std::fmt::Debug for DriverScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverScript")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("current_iteration", &self.current_iteration)
            .finish_non_exhaustive()
    }
}
