//! Shared execution context for keyword handlers.

use crate::datatable::DataTable;
use crate::params::TestParameters;
use crate::report::TestLog;
use crate::session::DriverSession;
use std::time::Duration;

/// Everything a business-component handler may touch during one step.
///
/// One context exists per engine run; the engine positions the data-table
/// cursor and opens report sections before each step, handlers read data,
/// drive the session and append their own log records.
pub struct StepContext {
    /// Resolved parameters of the running test instance
    pub params: TestParameters,
    /// Module data with the cursor positioned for the current step
    pub table: DataTable,
    /// The instance's structured log
    pub log: TestLog,
    /// The live driver session
    pub session: Box<dyn DriverSession>,
    /// Element-wait timeout configured on the session
    pub element_wait: Duration,
    /// Page-load timeout configured on the session
    pub page_load: Duration,
}

impl StepContext {
    /// Create a context for one engine run
    #[must_use]
    pub fn new(
        params: TestParameters,
        table: DataTable,
        log: TestLog,
        session: Box<dyn DriverSession>,
        element_wait: Duration,
        page_load: Duration,
    ) -> Self {
        Self {
            params,
            table,
            log,
            session,
            element_wait,
            page_load,
        }
    }
}

impl std::fmt::Debug for StepContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("params", &self.params)
            .field("current_row", &self.table.current_row())
            .finish_non_exhaustive()
    }
}
