//! Shared fakes for the integration suite: a counting session backend and
//! small step libraries with data-driven failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use volante::{
    Capabilities, DriverSession, LibraryRegistrar, Screenshot, SessionBackend, StepLibrary,
    StepOutcome, VolanteResult,
};

/// Call counters shared between a backend and the sessions it opens
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub opened: AtomicUsize,
    pub quits: AtomicUsize,
    pub navigations: AtomicUsize,
}

impl SessionCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

/// Backend producing counting in-memory sessions
#[derive(Debug, Default)]
pub struct MockBackend {
    pub counters: Arc<SessionCounters>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MockBackend {
    fn open(&self, _capabilities: &Capabilities) -> VolanteResult<Box<dyn DriverSession>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockSession {
    counters: Arc<SessionCounters>,
}

impl DriverSession for MockSession {
    fn navigate(&mut self, _url: &str) -> VolanteResult<()> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn click(&mut self, _locator: &str) -> VolanteResult<()> {
        Ok(())
    }

    fn type_text(&mut self, _locator: &str, _text: &str) -> VolanteResult<()> {
        Ok(())
    }

    fn read_text(&mut self, _locator: &str) -> VolanteResult<String> {
        Ok(String::new())
    }

    fn execute_script(&mut self, _code: &str) -> VolanteResult<String> {
        Ok("undefined".to_string())
    }

    fn screenshot(&mut self) -> VolanteResult<Screenshot> {
        // Empty screenshots are treated as unavailable by the engine
        Ok(Screenshot::new(Vec::new(), 0, 0))
    }

    fn set_timeouts(&mut self, _element_wait: Duration, _page_load: Duration) -> VolanteResult<()> {
        Ok(())
    }

    fn maximize_window(&mut self) -> VolanteResult<()> {
        Ok(())
    }

    fn quit(&mut self) -> VolanteResult<()> {
        self.counters.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Step library recording every invocation and failing where the data row
/// carries `FailFlag: yes`.
pub struct RecordingLibrary {
    pub invocations: Arc<Mutex<Vec<String>>>,
}

impl RecordingLibrary {
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl StepLibrary for RecordingLibrary {
    fn name(&self) -> &'static str {
        "RecordingLibrary"
    }

    fn register(&self, steps: &mut LibraryRegistrar<'_>) -> VolanteResult<()> {
        for keyword in ["enterUsername", "enterPassword", "clickSubmit"] {
            let invocations = Arc::clone(&self.invocations);
            steps.step(keyword, move |ctx| {
                let username = ctx.table.value("Username").unwrap_or_default();
                invocations
                    .lock()
                    .unwrap()
                    .push(format!("{keyword}:{username}"));
                if matches!(ctx.table.value("FailFlag").as_deref(), Ok("yes")) {
                    StepOutcome::failed(format!("{keyword} forced to fail"))
                } else {
                    StepOutcome::Ok
                }
            })?;
        }
        Ok(())
    }
}

/// Module data for a "Login" test case.
///
/// `fail_flags[i]` forces every keyword of iteration `i + 1` to fail.
pub fn login_module_yaml(iterations: usize, fail_flags: &[usize]) -> String {
    let mut rows = String::new();
    for i in 1..=iterations {
        let flag = if fail_flags.contains(&i) { "yes" } else { "no" };
        rows.push_str(&format!(
            "      - [Login, '{i}', '1', user{i}, '{flag}']\n"
        ));
    }
    format!(
        "sheets:\n\
         \x20 General_Data:\n\
         \x20   columns: [TestCase, Iteration, SubIteration, Username, FailFlag]\n\
         \x20   rows:\n\
         {rows}\
         \x20 Business_Flow:\n\
         \x20   columns: [TestCase]\n\
         \x20   rows:\n\
         \x20     - [Login, 'enterUsername,1', 'enterPassword,1', 'clickSubmit,1']\n"
    )
}
