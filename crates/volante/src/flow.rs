//! Business flows: the ordered keyword steps of a test case.
//!
//! A flow is read from the module's `Business_Flow` sheet — one row per test
//! case, the first column naming the test case, each following column one
//! `keyword[,repeat]` entry, stopping at the first empty cell.

use serde::{Deserialize, Serialize};

use crate::datatable::{ModuleData, Sheet, BUSINESS_FLOW_SHEET, TEST_CASE_COLUMN};
use crate::result::{VolanteError, VolanteResult};

/// One parsed unit of a business flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStep {
    /// Keyword naming the business-component handler
    pub keyword: String,
    /// How many times the keyword runs within one iteration
    pub repeat_count: u32,
}

impl KeywordStep {
    /// Create a step executed once
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            repeat_count: 1,
        }
    }

    /// Parse a `keyword[,repeat]` entry
    pub fn parse(entry: &str) -> VolanteResult<Self> {
        let mut parts = entry.splitn(2, ',');
        let keyword = parts.next().unwrap_or("").trim();
        if keyword.is_empty() {
            return Err(VolanteError::config(format!(
                "Empty keyword in flow entry \"{entry}\""
            )));
        }

        let repeat_count = match parts.next() {
            None => 1,
            Some(count) => count.trim().parse::<u32>().map_err(|_| {
                VolanteError::config(format!(
                    "Invalid repeat count \"{}\" for keyword \"{keyword}\"",
                    count.trim()
                ))
            })?,
        };
        if repeat_count == 0 {
            return Err(VolanteError::config(format!(
                "Repeat count for keyword \"{keyword}\" must be at least 1"
            )));
        }

        Ok(Self {
            keyword: keyword.to_string(),
            repeat_count,
        })
    }
}

/// The ordered steps defining one test case's logic
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusinessFlow {
    /// Steps, in execution order
    pub steps: Vec<KeywordStep>,
}

impl BusinessFlow {
    /// Build a flow from pre-parsed steps
    #[must_use]
    pub fn new(steps: Vec<KeywordStep>) -> Self {
        Self { steps }
    }

    /// Load the flow for a test case from module data.
    ///
    /// A missing test case row or an empty flow are configuration errors,
    /// reported before any iteration runs.
    pub fn load(data: &ModuleData, test_case: &str) -> VolanteResult<Self> {
        let sheet = data.sheet(BUSINESS_FLOW_SHEET).ok_or_else(|| {
            VolanteError::config(format!("No \"{BUSINESS_FLOW_SHEET}\" sheet in module data"))
        })?;
        Self::from_sheet(sheet, test_case)
    }

    fn from_sheet(sheet: &Sheet, test_case: &str) -> VolanteResult<Self> {
        let tc_col = sheet.column_index(TEST_CASE_COLUMN).unwrap_or(0);
        let row = sheet
            .row_index_from(test_case, tc_col, 0)
            .ok_or_else(|| VolanteError::TestCaseNotFound {
                test_case: test_case.to_string(),
                sheet: BUSINESS_FLOW_SHEET.to_string(),
            })?;

        let mut steps = Vec::new();
        let mut column = tc_col + 1;
        loop {
            let entry = sheet.value_at(row, column);
            if entry.is_empty() {
                break;
            }
            steps.push(KeywordStep::parse(entry)?);
            column += 1;
        }

        if steps.is_empty() {
            return Err(VolanteError::EmptyFlow {
                test_case: test_case.to_string(),
            });
        }

        Ok(Self { steps })
    }

    /// Number of steps in the flow
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the flow has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
