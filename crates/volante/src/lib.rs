//! # Volante
//!
//! Keyword-driven test automation harness: declarative test instances from a
//! run manifest, data-table-driven iteration, explicit keyword dispatch, and
//! parallel batch execution with a structured result summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Allocator (batch harness)                                           │
//! │  manifest → worker pool → one DriverScript per instance → summary    │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  DriverScript (engine)                                               │
//! │  resolve → open session → iterate data rows → teardown → outcome     │
//! │      │                                                               │
//! │      ├── FlowStrategy: KeywordFlow (registry dispatch)               │
//! │      │                 ModularFlow (user TestScript)                 │
//! │      ├── DataTable: iterative / sub-iterative / non-iterative        │
//! │      └── TestLog: append-only structured report                      │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  SessionBackend (opaque automation API: open / drive / quit)         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use volante::{
//!     Allocator, KeywordRegistry, LibraryRegistrar, Manifest, Settings,
//!     StepLibrary, StepOutcome, VolanteResult,
//! };
//! # use volante::{Capabilities, DriverSession, SessionBackend};
//! # struct MyBackend;
//! # impl SessionBackend for MyBackend {
//! #     fn open(&self, _: &Capabilities) -> VolanteResult<Box<dyn DriverSession>> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! struct LoginPage;
//!
//! impl StepLibrary for LoginPage {
//!     fn name(&self) -> &'static str {
//!         "LoginPage"
//!     }
//!
//!     fn register(&self, steps: &mut LibraryRegistrar<'_>) -> VolanteResult<()> {
//!         steps.step("enterUsername", |ctx| {
//!             let username = match ctx.table.value("Username") {
//!                 Ok(v) => v,
//!                 Err(e) => return StepOutcome::failed(e.to_string()),
//!             };
//!             match ctx.session.type_text("#username", &username) {
//!                 Ok(()) => StepOutcome::Ok,
//!                 Err(e) => StepOutcome::failed(e.to_string()),
//!             }
//!         })
//!     }
//! }
//!
//! fn main() -> VolanteResult<()> {
//!     let settings = Settings::load("settings.yaml")?;
//!     let registry = Arc::new(KeywordRegistry::builder().library(&LoginPage)?.build());
//!     let manifest = Manifest::load("manifest.yaml")?;
//!     let run_config = manifest.run_configuration(&settings.run_configuration)?;
//!
//!     let allocator = Allocator::keyword_driven(
//!         settings,
//!         run_config,
//!         Arc::new(MyBackend),
//!         registry,
//!         "datatables",
//!     );
//!     let outcome = allocator.run_batch()?;
//!     std::process::exit(outcome.exit_code);
//! }
//! ```

pub mod batch;
pub mod capabilities;
pub mod context;
pub mod datatable;
pub mod engine;
pub mod flow;
pub mod manifest;
pub mod params;
pub mod registry;
pub mod report;
pub mod result;
pub mod session;
pub mod settings;

pub use batch::{Allocator, BatchContext, BatchOutcome};
pub use capabilities::{
    Browser, Capabilities, CloudCredentials, DeviceType, ExecutionMode, Platform, ProxyConfig,
    ScreenOrientation,
};
pub use context::StepContext;
pub use datatable::{DataTable, ModuleData, RowSelection, Sheet};
pub use engine::{
    AbortFlag, DriverScript, EngineOutcome, EngineState, FlowStrategy, KeywordFlow, ModularFlow,
    TestScript,
};
pub use flow::{BusinessFlow, KeywordStep};
pub use manifest::{Manifest, ManifestEntry, RunConfiguration};
pub use params::{IterationMode, OnError, TestParameters, TestParametersBuilder};
pub use registry::{KeywordRegistry, KeywordRegistryBuilder, LibraryRegistrar, StepLibrary};
pub use report::{
    format_elapsed, InstanceStatus, ReportRecord, ResultSummary, Status, SummaryEntry, TestLog,
};
pub use result::{StepOutcome, VolanteError, VolanteResult};
pub use session::{DriverSession, Screenshot, SessionBackend, SessionFactory};
pub use settings::{CloudSettings, Settings};
