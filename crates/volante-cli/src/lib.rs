//! Volante CLI: manifest planning, validation and project scaffolding.
//!
//! Batch execution lives in the `volante` library because keyword handlers
//! are user code linked into the user's own runner binary; this CLI covers
//! everything that can run without them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod output;

pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
