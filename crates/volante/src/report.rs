//! Test logs and the batch result summary.
//!
//! A [`TestLog`] is the append-only structured record of one test instance:
//! headings, per-iteration sections, per-keyword subsections and status
//! records. The [`ResultSummary`] collects one row per test instance across
//! the batch. Both are plain data, JSON-exportable; rendering them to HTML
//! or spreadsheet files is a concern of external writers.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::params::TestParameters;
use crate::result::VolanteResult;

/// Status of one logged step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Step succeeded
    Pass,
    /// Step failed; fails the test instance
    Fail,
    /// Noteworthy but non-fatal (e.g. teardown trouble)
    Warning,
    /// Informational milestone
    Done,
    /// Diagnostic detail (stack traces, chained causes)
    Debug,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warning => "WARNING",
            Self::Done => "DONE",
            Self::Debug => "DEBUG",
        };
        write!(f, "{name}")
    }
}

/// Final status of one test instance, as reported to the batch summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStatus {
    /// Every logged step passed
    Passed,
    /// At least one step failed
    Failed,
    /// The abort flag was set before the instance started
    Aborted,
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "Passed"),
            Self::Failed => write!(f, "Failed"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

/// One appended log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Section (iteration) the record belongs to
    pub section: String,
    /// Subsection (keyword) the record belongs to
    pub subsection: String,
    /// Step name
    pub step: String,
    /// Free-text detail
    pub detail: String,
    /// Step status
    pub status: Status,
    /// Screenshot file reference, captured on error
    pub screenshot: Option<String>,
}

/// Key/value pair line under the log heading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubHeading {
    /// Left label
    pub key1: String,
    /// Left value
    pub value1: String,
    /// Right label
    pub key2: String,
    /// Right value
    pub value2: String,
}

/// Append-only structured log of one test instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestLog {
    /// Report name (`module_testcase_instance`)
    pub name: String,
    /// Heading line
    pub heading: String,
    /// Key/value lines under the heading
    pub sub_headings: Vec<SubHeading>,
    /// Appended records
    pub records: Vec<ReportRecord>,
    /// Execution time written by the footer
    pub footer_time: Option<String>,
    /// When the log was opened
    pub started_at: DateTime<Local>,
    #[serde(skip)]
    report_path: Option<PathBuf>,
    #[serde(skip)]
    current_section: String,
    #[serde(skip)]
    current_subsection: String,
}

impl TestLog {
    /// Open a log for a report name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heading: String::new(),
            sub_headings: Vec::new(),
            records: Vec::new(),
            footer_time: None,
            started_at: Local::now(),
            report_path: None,
            current_section: String::new(),
            current_subsection: String::new(),
        }
    }

    /// Attach a filesystem location for screenshots and sub-folders
    #[must_use]
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Set the heading line
    pub fn add_heading(&mut self, text: impl Into<String>) {
        self.heading = text.into();
    }

    /// Add a two-column key/value line under the heading
    pub fn add_sub_heading(
        &mut self,
        key1: impl Into<String>,
        value1: impl Into<String>,
        key2: impl Into<String>,
        value2: impl Into<String>,
    ) {
        self.sub_headings.push(SubHeading {
            key1: key1.into(),
            value1: value1.into(),
            key2: key2.into(),
            value2: value2.into(),
        });
    }

    /// Open a section (one per iteration)
    pub fn add_section(&mut self, name: impl Into<String>) {
        self.current_section = name.into();
        self.current_subsection.clear();
    }

    /// Open a subsection within the current section (one per keyword)
    pub fn add_subsection(&mut self, name: impl Into<String>) {
        self.current_subsection = name.into();
    }

    /// Append a status record under the current section/subsection
    pub fn update_log(&mut self, step: impl Into<String>, detail: impl Into<String>, status: Status) {
        self.records.push(ReportRecord {
            section: self.current_section.clone(),
            subsection: self.current_subsection.clone(),
            step: step.into(),
            detail: detail.into(),
            status,
            screenshot: None,
        });
    }

    /// Append a failure record carrying a screenshot reference
    pub fn update_log_with_screenshot(
        &mut self,
        step: impl Into<String>,
        detail: impl Into<String>,
        status: Status,
        screenshot: impl Into<String>,
    ) {
        self.records.push(ReportRecord {
            section: self.current_section.clone(),
            subsection: self.current_subsection.clone(),
            step: step.into(),
            detail: detail.into(),
            status,
            screenshot: Some(screenshot.into()),
        });
    }

    /// Write the footer with the instance execution time
    pub fn add_footer(&mut self, execution_time: impl Into<String>) {
        self.footer_time = Some(execution_time.into());
    }

    /// Create a sub-folder under the report path
    pub fn create_sub_folder(&self, name: &str) -> VolanteResult<PathBuf> {
        let base = self.report_path.clone().unwrap_or_else(std::env::temp_dir);
        let path = base.join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Final status: failed iff any FAIL record was appended
    #[must_use]
    pub fn status(&self) -> InstanceStatus {
        if self.records.iter().any(|r| r.status == Status::Fail) {
            InstanceStatus::Failed
        } else {
            InstanceStatus::Passed
        }
    }

    /// Detail of the first failure, when the instance failed
    #[must_use]
    pub fn failure_description(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.status == Status::Fail)
            .map(|r| r.detail.as_str())
    }

    /// Export the log as pretty-printed JSON
    pub fn to_json(&self) -> VolanteResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON export next to the report path
    pub fn write_json(&self, dir: impl AsRef<Path>) -> VolanteResult<PathBuf> {
        let path = dir.as_ref().join(format!("{}.json", self.name));
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

/// One row of the batch result summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Parameters snapshot of the executed instance
    pub params: TestParameters,
    /// Report name, or "N/A" when no report was produced
    pub report_name: String,
    /// Execution time, or "N/A" for aborted instances
    pub execution_time: String,
    /// Final status
    pub status: InstanceStatus,
}

/// Batch-level results summary: one entry per test instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Unique id of this batch run
    pub run_id: String,
    /// Heading line
    pub heading: String,
    /// Key/value lines under the heading
    pub sub_headings: Vec<SubHeading>,
    /// One row per executed (or aborted) test instance
    pub entries: Vec<SummaryEntry>,
    /// Total batch execution time, written once at the end
    pub footer_time: Option<String>,
    /// When the batch started
    pub started_at: DateTime<Local>,
}

impl Default for ResultSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSummary {
    /// Create an empty summary with a fresh run id
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            heading: String::new(),
            sub_headings: Vec::new(),
            entries: Vec::new(),
            footer_time: None,
            started_at: Local::now(),
        }
    }

    /// Set the heading line
    pub fn add_heading(&mut self, text: impl Into<String>) {
        self.heading = text.into();
    }

    /// Add a two-column key/value line under the heading
    pub fn add_sub_heading(
        &mut self,
        key1: impl Into<String>,
        value1: impl Into<String>,
        key2: impl Into<String>,
        value2: impl Into<String>,
    ) {
        self.sub_headings.push(SubHeading {
            key1: key1.into(),
            value1: value1.into(),
            key2: key2.into(),
            value2: value2.into(),
        });
    }

    /// Append one instance row
    pub fn add_entry(&mut self, entry: SummaryEntry) {
        self.entries.push(entry);
    }

    /// Write the footer with the total batch time
    pub fn add_footer(&mut self, total_time: impl Into<String>) {
        self.footer_time = Some(total_time.into());
    }

    /// Count of failed instances
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == InstanceStatus::Failed)
            .count()
    }

    /// Count of aborted instances
    #[must_use]
    pub fn aborted_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == InstanceStatus::Aborted)
            .count()
    }

    /// True when every instance passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.status == InstanceStatus::Passed)
    }

    /// Export the summary as pretty-printed JSON
    pub fn to_json(&self) -> VolanteResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Format a duration as `HH:MM:SS` for report footers
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
