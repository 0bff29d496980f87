//! Test parameters for a single test instance.
//!
//! One `TestParameters` value describes one test instance drawn from the run
//! manifest: what to run (module / test case / instance), how to iterate over
//! the data table, and where to run it (mode, browser, device). Unset fields
//! are filled in from the global [`Settings`](crate::settings::Settings)
//! before execution; after resolution the parameters are treated as
//! immutable, only the engine's iteration cursor advances.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capabilities::{
    Browser, DeviceType, ExecutionMode, Platform, ScreenOrientation,
};
use crate::result::VolanteError;

/// Which data-table rows of a test case to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IterationMode {
    /// Every iteration configured in the data table
    #[default]
    All,
    /// The first iteration only
    One,
    /// An explicit start..=end range
    Range,
}

impl fmt::Display for IterationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::One => write!(f, "One"),
            Self::Range => write!(f, "Range"),
        }
    }
}

impl std::str::FromStr for IterationMode {
    type Err = VolanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(Self::All),
            "One" => Ok(Self::One),
            "Range" => Ok(Self::Range),
            other => Err(VolanteError::config(format!(
                "Unknown iteration mode: {other}"
            ))),
        }
    }
}

/// What the engine does with the rest of a test instance after an iteration fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OnError {
    /// Log the failure and continue with the next iteration
    #[default]
    NextIteration,
    /// Abandon the remaining iterations of this test case
    NextTestCase,
    /// Abandon this test case and abort every test instance that has not
    /// started yet
    Stop,
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextIteration => write!(f, "NextIteration"),
            Self::NextTestCase => write!(f, "NextTestCase"),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

impl std::str::FromStr for OnError {
    type Err = VolanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NextIteration" => Ok(Self::NextIteration),
            "NextTestCase" => Ok(Self::NextTestCase),
            "Stop" => Ok(Self::Stop),
            other => Err(VolanteError::config(format!(
                "Unknown on-error option: {other}"
            ))),
        }
    }
}

/// Input parameters for one test instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestParameters {
    /// Module (scenario) the test case belongs to; names the data sheet
    pub module: String,
    /// Test case name
    pub test_case: String,
    /// Instance id, distinguishing repeated runs of the same test case
    pub test_instance: String,
    /// Free-text description; defaults to the test case name
    pub description: String,
    /// Iteration mode
    pub iteration_mode: IterationMode,
    /// First iteration to run (Range mode)
    pub start_iteration: u32,
    /// Last iteration to run, inclusive; computed for All mode
    pub end_iteration: u32,
    /// Execution mode, when the manifest pins one
    pub execution_mode: Option<ExecutionMode>,
    /// Browser, when the manifest pins one
    pub browser: Option<Browser>,
    /// Browser version, for grid dispatch
    pub browser_version: Option<String>,
    /// Platform, when the manifest pins one
    pub platform: Option<Platform>,
    /// Device type, when the manifest pins one
    pub device_type: Option<DeviceType>,
    /// Device name, for device modes
    pub device_name: Option<String>,
    /// Remote endpoint URL
    pub remote_url: Option<String>,
}

impl TestParameters {
    /// Create parameters for a module / test case pair, everything else unset
    #[must_use]
    pub fn new(module: impl Into<String>, test_case: impl Into<String>) -> Self {
        let test_case = test_case.into();
        Self {
            module: module.into(),
            test_case,
            test_instance: "Instance1".to_string(),
            description: String::new(),
            iteration_mode: IterationMode::All,
            start_iteration: 1,
            end_iteration: 1,
            execution_mode: None,
            browser: None,
            browser_version: None,
            platform: None,
            device_type: None,
            device_name: None,
            remote_url: None,
        }
    }

    /// Start building parameters fluently
    #[must_use]
    pub fn builder(module: impl Into<String>, test_case: impl Into<String>) -> TestParametersBuilder {
        TestParametersBuilder {
            params: Self::new(module, test_case),
        }
    }

    /// Screen orientation derived from the device type (portrait fallback)
    #[must_use]
    pub fn screen_orientation(&self) -> ScreenOrientation {
        self.device_type
            .map_or(ScreenOrientation::Portrait, |d| d.screen_orientation())
    }

    /// Report name for this instance: `module_testcase_instance`
    #[must_use]
    pub fn report_name(&self) -> String {
        format!("{}_{}_{}", self.module, self.test_case, self.test_instance)
    }

    /// Browser and platform in one display string, for report headers
    #[must_use]
    pub fn browser_and_platform(&self) -> String {
        let mut out = self
            .browser
            .map_or_else(|| "unset".to_string(), |b| b.to_string());
        if let Some(version) = &self.browser_version {
            out.push(' ');
            out.push_str(version);
        }
        if let Some(platform) = self.platform {
            out.push_str(" on ");
            out.push_str(&platform.to_string());
        }
        out
    }

    /// Validate the iteration range.
    ///
    /// Range mode with `start > end` is a configuration error; it must be
    /// rejected before any driver session is opened.
    pub fn validate_range(&self) -> Result<(), VolanteError> {
        if self.iteration_mode == IterationMode::Range
            && self.start_iteration > self.end_iteration
        {
            return Err(VolanteError::config(format!(
                "StartIteration ({}) cannot be greater than EndIteration ({})",
                self.start_iteration, self.end_iteration
            )));
        }
        Ok(())
    }
}

/// Fluent builder for [`TestParameters`]
#[derive(Debug, Clone)]
pub struct TestParametersBuilder {
    params: TestParameters,
}

impl TestParametersBuilder {
    /// Set the instance id
    #[must_use]
    pub fn instance(mut self, id: impl Into<String>) -> Self {
        self.params.test_instance = id.into();
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.params.description = text.into();
        self
    }

    /// Set the iteration mode
    #[must_use]
    pub fn iteration_mode(mut self, mode: IterationMode) -> Self {
        self.params.iteration_mode = mode;
        self
    }

    /// Set the iteration range (implies Range mode)
    #[must_use]
    pub fn iteration_range(mut self, start: u32, end: u32) -> Self {
        self.params.iteration_mode = IterationMode::Range;
        self.params.start_iteration = start;
        self.params.end_iteration = end;
        self
    }

    /// Set the execution mode
    #[must_use]
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.params.execution_mode = Some(mode);
        self
    }

    /// Set the browser
    #[must_use]
    pub fn browser(mut self, browser: Browser) -> Self {
        self.params.browser = Some(browser);
        self
    }

    /// Set the browser version
    #[must_use]
    pub fn browser_version(mut self, version: impl Into<String>) -> Self {
        self.params.browser_version = Some(version.into());
        self
    }

    /// Set the platform
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.params.platform = Some(platform);
        self
    }

    /// Set the device type
    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.params.device_type = Some(device_type);
        self
    }

    /// Set the device name
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.params.device_name = Some(name.into());
        self
    }

    /// Set the remote endpoint URL
    #[must_use]
    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.params.remote_url = Some(url.into());
        self
    }

    /// Build the parameters
    #[must_use]
    pub fn build(self) -> TestParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let params = TestParameters::builder("Login", "ValidCredentials").build();
        assert_eq!(params.module, "Login");
        assert_eq!(params.test_case, "ValidCredentials");
        assert_eq!(params.test_instance, "Instance1");
        assert_eq!(params.iteration_mode, IterationMode::All);
        assert!(params.browser.is_none());
    }

    #[test]
    fn test_report_name_format() {
        let params = TestParameters::builder("Login", "ValidCredentials")
            .instance("Instance2")
            .build();
        assert_eq!(params.report_name(), "Login_ValidCredentials_Instance2");
    }

    #[test]
    fn test_range_validation_rejects_inverted_bounds() {
        let params = TestParameters::builder("Login", "ValidCredentials")
            .iteration_range(5, 2)
            .build();
        let err = params.validate_range().unwrap_err();
        assert!(err.to_string().contains("StartIteration"));
    }

    #[test]
    fn test_range_validation_accepts_equal_bounds() {
        let params = TestParameters::builder("Login", "ValidCredentials")
            .iteration_range(3, 3)
            .build();
        assert!(params.validate_range().is_ok());
    }

    #[test]
    fn test_range_validation_ignores_other_modes() {
        // start > end is irrelevant outside Range mode
        let mut params = TestParameters::new("Login", "ValidCredentials");
        params.start_iteration = 9;
        params.end_iteration = 1;
        assert!(params.validate_range().is_ok());
    }

    #[test]
    fn test_orientation_from_device_type() {
        let params = TestParameters::builder("Login", "ValidCredentials")
            .device_type(DeviceType::TabletLandscape)
            .build();
        assert_eq!(params.screen_orientation(), ScreenOrientation::Landscape);

        let unset = TestParameters::new("Login", "ValidCredentials");
        assert_eq!(unset.screen_orientation(), ScreenOrientation::Portrait);
    }

    #[test]
    fn test_browser_and_platform_display() {
        let params = TestParameters::builder("Login", "ValidCredentials")
            .browser(Browser::Firefox)
            .browser_version("128")
            .platform(Platform::Linux)
            .build();
        assert_eq!(params.browser_and_platform(), "Firefox 128 on Linux");
    }
}
