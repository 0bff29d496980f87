//! Row-indexed test data tables.
//!
//! Each module owns one data file holding named sheets; a sheet is a header
//! row plus string cells. The engine positions a cursor on one row per
//! (test case, iteration[, sub-iteration]) and keyword handlers read cell
//! values off the cursor. Row lookups that find nothing return `None`
//! rather than failing — callers decide whether a missing row is an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::result::{VolanteError, VolanteResult};

/// Column naming the test case a row belongs to
pub const TEST_CASE_COLUMN: &str = "TestCase";
/// Column naming the iteration a row belongs to
pub const ITERATION_COLUMN: &str = "Iteration";
/// Column naming the sub-iteration a row belongs to
pub const SUB_ITERATION_COLUMN: &str = "SubIteration";
/// Sheet holding the ordered keyword entries per test case
pub const BUSINESS_FLOW_SHEET: &str = "Business_Flow";
/// Sheet holding shared key/value test data
pub const COMMON_SHEET: &str = "Common";

/// How the cursor maps (test case, iteration, sub-iteration) onto a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowSelection {
    /// One row per iteration number
    #[default]
    Iterative,
    /// One row per (iteration, sub-iteration) pair
    SubIterative,
    /// A single fixed row per test case; iteration count is always 1
    NonIterative,
}

/// One named sheet: a header row plus string cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Column names, in order
    pub columns: Vec<String>,
    /// Data rows; short rows read as empty cells
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Index of a named column
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value by row and column index; empty for out-of-range cells
    #[must_use]
    pub fn value_at(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    /// Cell value by row and column name
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        Some(self.value_at(row, idx))
    }

    /// First row whose `column` cell equals `key`, scanning from `from`
    #[must_use]
    pub fn row_index_from(&self, key: &str, column: usize, from: usize) -> Option<usize> {
        (from..self.rows.len()).find(|&row| self.value_at(row, column) == key)
    }

    /// Number of rows whose `column` cell equals `key`
    #[must_use]
    pub fn row_count(&self, key: &str, column: usize) -> usize {
        (0..self.rows.len())
            .filter(|&row| self.value_at(row, column) == key)
            .count()
    }
}

/// All sheets of one module's data file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleData {
    /// Sheets by name
    pub sheets: HashMap<String, Sheet>,
}

impl ModuleData {
    /// Load a module data file from YAML
    pub fn load(path: impl AsRef<Path>) -> VolanteResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&text)?)
    }

    /// Parse a module data file from a YAML string
    pub fn from_yaml(text: &str) -> VolanteResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Get a sheet by name
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }
}

/// Cursor-positioned view over one module's test data
#[derive(Debug, Clone)]
pub struct DataTable {
    module: String,
    data: ModuleData,
    selection: RowSelection,
    default_sheet: String,
    reference_identifier: String,
    current_row: Option<usize>,
}

impl DataTable {
    /// Create a data table over loaded module data
    #[must_use]
    pub fn new(module: impl Into<String>, data: ModuleData, selection: RowSelection) -> Self {
        Self {
            module: module.into(),
            data,
            selection,
            default_sheet: "General_Data".to_string(),
            reference_identifier: "#".to_string(),
            current_row: None,
        }
    }

    /// Override the default data sheet name
    #[must_use]
    pub fn with_default_sheet(mut self, name: impl Into<String>) -> Self {
        self.default_sheet = name.into();
        self
    }

    /// Override the common-data reference prefix
    #[must_use]
    pub fn with_reference_identifier(mut self, prefix: impl Into<String>) -> Self {
        self.reference_identifier = prefix.into();
        self
    }

    /// The module this table belongs to
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The row-selection policy in effect
    #[must_use]
    pub fn selection(&self) -> RowSelection {
        self.selection
    }

    /// The underlying module data (business-flow sheet access)
    #[must_use]
    pub fn data(&self) -> &ModuleData {
        &self.data
    }

    fn default_sheet(&self) -> VolanteResult<&Sheet> {
        self.data.sheet(&self.default_sheet).ok_or_else(|| {
            VolanteError::config(format!(
                "Module \"{}\" has no \"{}\" sheet",
                self.module, self.default_sheet
            ))
        })
    }

    /// First row of the test case in the default sheet
    #[must_use]
    pub fn row_index(&self, test_case: &str) -> Option<usize> {
        let sheet = self.default_sheet().ok()?;
        let col = sheet.column_index(TEST_CASE_COLUMN)?;
        sheet.row_index_from(test_case, col, 0)
    }

    /// Number of rows the test case owns in the default sheet
    #[must_use]
    pub fn row_count(&self, test_case: &str) -> usize {
        let Ok(sheet) = self.default_sheet() else {
            return 0;
        };
        sheet
            .column_index(TEST_CASE_COLUMN)
            .map_or(0, |col| sheet.row_count(test_case, col))
    }

    /// Number of sub-iteration rows within one iteration of the test case
    #[must_use]
    pub fn sub_iteration_count(&self, test_case: &str) -> usize {
        let Ok(sheet) = self.default_sheet() else {
            return 0;
        };
        let Some(tc_col) = sheet.column_index(TEST_CASE_COLUMN) else {
            return 0;
        };
        let Some(it_col) = sheet.column_index(ITERATION_COLUMN) else {
            return 0;
        };
        (0..sheet.rows.len())
            .filter(|&row| {
                sheet.value_at(row, tc_col) == test_case && sheet.value_at(row, it_col) == "1"
            })
            .count()
    }

    /// Number of iterations configured for the test case.
    ///
    /// Sub-iterative layouts divide the test-case row count by the number of
    /// rows iteration 1 owns; every test case must therefore configure at
    /// least one sub-iteration row for its first iteration.
    pub fn iteration_count(&self, test_case: &str) -> VolanteResult<u32> {
        match self.selection {
            RowSelection::NonIterative => Ok(1),
            RowSelection::Iterative => Ok(self.row_count(test_case) as u32),
            RowSelection::SubIterative => {
                let total = self.row_count(test_case);
                let subs = self.sub_iteration_count(test_case);
                if subs == 0 {
                    return Err(VolanteError::config(format!(
                        "Test case \"{test_case}\" has no sub-iteration rows for iteration 1"
                    )));
                }
                Ok((total / subs) as u32)
            }
        }
    }

    /// Position the cursor for (test case, iteration, sub-iteration).
    ///
    /// Returns the selected row, or `None` when no row matches — the
    /// caller must check before reading values.
    pub fn set_current_row(
        &mut self,
        test_case: &str,
        iteration: u32,
        sub_iteration: u32,
    ) -> Option<usize> {
        let sheet = self.default_sheet().ok()?;
        let tc_col = sheet.column_index(TEST_CASE_COLUMN)?;

        let row = match self.selection {
            RowSelection::NonIterative => sheet.row_index_from(test_case, tc_col, 0),
            RowSelection::Iterative => {
                let it_col = sheet.column_index(ITERATION_COLUMN)?;
                let iteration = iteration.to_string();
                (0..sheet.rows.len()).find(|&row| {
                    sheet.value_at(row, tc_col) == test_case
                        && sheet.value_at(row, it_col) == iteration
                })
            }
            RowSelection::SubIterative => {
                let it_col = sheet.column_index(ITERATION_COLUMN)?;
                let sub_col = sheet.column_index(SUB_ITERATION_COLUMN)?;
                let iteration = iteration.to_string();
                let sub_iteration = sub_iteration.to_string();
                (0..sheet.rows.len()).find(|&row| {
                    sheet.value_at(row, tc_col) == test_case
                        && sheet.value_at(row, it_col) == iteration
                        && sheet.value_at(row, sub_col) == sub_iteration
                })
            }
        };

        self.current_row = row;
        row
    }

    /// The row the cursor currently points at
    #[must_use]
    pub fn current_row(&self) -> Option<usize> {
        self.current_row
    }

    /// Read a cell off the cursor row, resolving common-data references.
    ///
    /// A value prefixed with the reference identifier is looked up in the
    /// Common sheet (`Key`/`Value` columns) instead.
    pub fn value(&self, column: &str) -> VolanteResult<String> {
        let row = self.current_row.ok_or_else(|| {
            VolanteError::config("The data table cursor has not been positioned")
        })?;
        let sheet = self.default_sheet()?;
        let raw = sheet.value(row, column).ok_or_else(|| {
            VolanteError::config(format!(
                "Sheet \"{}\" has no \"{column}\" column",
                self.default_sheet
            ))
        })?;

        if let Some(key) = raw.strip_prefix(&self.reference_identifier) {
            return self.common_value(key);
        }
        Ok(raw.to_string())
    }

    fn common_value(&self, key: &str) -> VolanteResult<String> {
        let sheet = self.data.sheet(COMMON_SHEET).ok_or_else(|| {
            VolanteError::config(format!(
                "Module \"{}\" references common data but has no \"{COMMON_SHEET}\" sheet",
                self.module
            ))
        })?;
        let key_col = sheet.column_index("Key").unwrap_or(0);
        let value_col = sheet.column_index("Value").unwrap_or(1);
        sheet
            .row_index_from(key, key_col, 0)
            .map(|row| sheet.value_at(row, value_col).to_string())
            .ok_or_else(|| {
                VolanteError::config(format!("Common data key \"{key}\" not found"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_table(selection: RowSelection) -> DataTable {
        let yaml = r"
sheets:
  General_Data:
    columns: [TestCase, Iteration, SubIteration, Username, Password]
    rows:
      - [Login, '1', '1', admin, secret]
      - [Login, '1', '2', admin2, secret2]
      - [Login, '2', '1', guest, '#GuestPassword']
      - [Login, '2', '2', guest2, other]
      - [Search, '1', '1', finder, pw]
  Common:
    columns: [Key, Value]
    rows:
      - [GuestPassword, shared-secret]
";
        DataTable::new("Login", ModuleData::from_yaml(yaml).unwrap(), selection)
    }

    #[test]
    fn test_row_count_per_test_case() {
        let table = login_table(RowSelection::SubIterative);
        assert_eq!(table.row_count("Login"), 4);
        assert_eq!(table.row_count("Search"), 1);
        assert_eq!(table.row_count("Missing"), 0);
    }

    #[test]
    fn test_iteration_count_divides_by_sub_iterations() {
        let table = login_table(RowSelection::SubIterative);
        // 4 rows, 2 sub-iterations in iteration 1 -> 2 iterations
        assert_eq!(table.iteration_count("Login").unwrap(), 2);
    }

    #[test]
    fn test_iteration_count_without_sub_rows_is_config_error() {
        let table = login_table(RowSelection::SubIterative);
        let err = table.iteration_count("Missing").unwrap_err();
        assert!(err.to_string().contains("no sub-iteration rows"));
    }

    #[test]
    fn test_non_iterative_count_is_one() {
        let table = login_table(RowSelection::NonIterative);
        assert_eq!(table.iteration_count("Login").unwrap(), 1);
    }

    #[test]
    fn test_missing_row_is_none_not_error() {
        let mut table = login_table(RowSelection::SubIterative);
        assert_eq!(table.set_current_row("Login", 9, 1), None);
        assert_eq!(table.current_row(), None);
    }

    #[test]
    fn test_sub_iterative_cursor() {
        let mut table = login_table(RowSelection::SubIterative);
        assert_eq!(table.set_current_row("Login", 1, 2), Some(1));
        assert_eq!(table.value("Username").unwrap(), "admin2");

        assert_eq!(table.set_current_row("Login", 2, 2), Some(3));
        assert_eq!(table.value("Username").unwrap(), "guest2");
    }

    #[test]
    fn test_iterative_cursor_ignores_sub_iteration() {
        let mut table = login_table(RowSelection::Iterative);
        assert_eq!(table.set_current_row("Login", 2, 7), Some(2));
        assert_eq!(table.value("Username").unwrap(), "guest");
    }

    #[test]
    fn test_common_reference_resolution() {
        let mut table = login_table(RowSelection::SubIterative);
        table.set_current_row("Login", 2, 1);
        assert_eq!(table.value("Password").unwrap(), "shared-secret");
    }

    #[test]
    fn test_unpositioned_cursor_is_error() {
        let table = login_table(RowSelection::SubIterative);
        let err = table.value("Username").unwrap_err();
        assert!(err.to_string().contains("cursor"));
    }

    #[test]
    fn test_unknown_column_is_error() {
        let mut table = login_table(RowSelection::SubIterative);
        table.set_current_row("Login", 1, 1);
        assert!(table.value("Nope").is_err());
    }
}
