//! The run manifest: which test instances a batch executes.
//!
//! A manifest file holds named run configurations, each an ordered list of
//! test-instance entries. Entries carry the same columns as the original
//! run-manager sheet; any field left empty falls back to the global settings
//! default at resolution time. The manifest is read once at batch start and
//! never mutated during the run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::capabilities::{Browser, DeviceType, ExecutionMode, Platform};
use crate::params::{IterationMode, TestParameters};
use crate::result::{VolanteError, VolanteResult};

/// One row of the run manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestEntry {
    /// "Yes" to execute this instance, anything else to skip it
    pub execute: String,
    /// Module (scenario) name
    pub test_scenario: String,
    /// Test case name
    pub test_case: String,
    /// Instance discriminator; numeric values are prefixed with "Instance"
    pub test_instance: String,
    /// Free-text description
    pub description: String,
    /// Iteration mode; empty means All
    pub iteration_mode: String,
    /// Start iteration for Range mode
    pub start_iteration: Option<u32>,
    /// End iteration for Range mode
    pub end_iteration: Option<u32>,
    /// Execution mode; empty means the settings default
    pub execution_mode: String,
    /// Remote endpoint; empty or "N/A" means the settings default
    pub remote_url: String,
    /// Device type; empty means the settings default
    pub device_type: String,
    /// Device name; empty or "N/A" means the settings default
    pub device_name: String,
    /// Browser; empty means the settings default
    pub browser: String,
    /// Browser version; empty means unspecified
    pub browser_version: String,
    /// Platform; empty means the settings default
    pub platform: String,
}

impl ManifestEntry {
    /// Whether this entry is flagged for execution
    #[must_use]
    pub fn should_execute(&self) -> bool {
        self.execute.eq_ignore_ascii_case("yes")
    }

    /// Build test parameters from this entry.
    ///
    /// Unset fields stay `None` for the settings resolver; invalid enum
    /// values are manifest errors.
    pub fn to_params(&self) -> VolanteResult<TestParameters> {
        if self.test_scenario.is_empty() || self.test_case.is_empty() {
            return Err(VolanteError::Manifest {
                message: "Every entry needs a test_scenario and a test_case".to_string(),
            });
        }

        let mut params = TestParameters::new(&self.test_scenario, &self.test_case);

        if !self.test_instance.is_empty() {
            params.test_instance = if self.test_instance.chars().all(|c| c.is_ascii_digit()) {
                format!("Instance{}", self.test_instance)
            } else {
                self.test_instance.clone()
            };
        }
        params.description = self.description.clone();

        if !self.iteration_mode.is_empty() {
            params.iteration_mode = IterationMode::from_str(&self.iteration_mode)
                .map_err(Self::manifest_error)?;
        }
        if let Some(start) = self.start_iteration {
            params.start_iteration = start;
        }
        if let Some(end) = self.end_iteration {
            params.end_iteration = end;
        }

        if !self.execution_mode.is_empty() {
            params.execution_mode =
                Some(ExecutionMode::from_str(&self.execution_mode).map_err(Self::manifest_error)?);
        }
        if !self.browser.is_empty() {
            params.browser = Some(Browser::from_str(&self.browser).map_err(Self::manifest_error)?);
        }
        if !self.browser_version.is_empty() {
            params.browser_version = Some(self.browser_version.clone());
        }
        if !self.platform.is_empty() {
            params.platform =
                Some(Platform::from_str(&self.platform).map_err(Self::manifest_error)?);
        }
        if !self.device_type.is_empty() {
            params.device_type =
                Some(DeviceType::from_str(&self.device_type).map_err(Self::manifest_error)?);
        }
        if Self::is_set(&self.device_name) {
            params.device_name = Some(self.device_name.clone());
        }
        if Self::is_set(&self.remote_url) {
            params.remote_url = Some(self.remote_url.clone());
        }

        Ok(params)
    }

    fn is_set(value: &str) -> bool {
        !value.is_empty() && !value.eq_ignore_ascii_case("n/a")
    }

    fn manifest_error(err: VolanteError) -> VolanteError {
        VolanteError::Manifest {
            message: err.to_string(),
        }
    }
}

/// The full manifest file: run configurations by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Run configurations, each an ordered instance list
    pub run_configurations: HashMap<String, Vec<ManifestEntry>>,
}

impl Manifest {
    /// Load a manifest file from YAML
    pub fn load(path: impl AsRef<Path>) -> VolanteResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a manifest from a YAML string
    pub fn from_yaml(text: &str) -> VolanteResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Select one run configuration
    pub fn run_configuration(&self, name: &str) -> VolanteResult<RunConfiguration> {
        let entries = self.run_configurations.get(name).ok_or_else(|| {
            VolanteError::Manifest {
                message: format!("No run configuration named \"{name}\""),
            }
        })?;
        Ok(RunConfiguration {
            name: name.to_string(),
            entries: entries.clone(),
        })
    }
}

/// One selected run configuration, immutable for the duration of the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Configuration name
    pub name: String,
    /// Instance entries, in manifest order
    pub entries: Vec<ManifestEntry>,
}

impl RunConfiguration {
    /// Parameters for every entry flagged execute=Yes, in manifest order
    pub fn instances_to_run(&self) -> VolanteResult<Vec<TestParameters>> {
        self.entries
            .iter()
            .filter(|e| e.should_execute())
            .map(ManifestEntry::to_params)
            .collect()
    }
}
