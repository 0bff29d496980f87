//! Global settings and parameter resolution.
//!
//! A `Settings` value holds the process-wide defaults that a run manifest may
//! leave unspecified per test instance. [`Settings::resolve`] merges them into
//! a [`TestParameters`] value: explicit manifest fields always win, every
//! unset field falls back to the default. Resolution never fails — invalid
//! combinations surface downstream, in the session factory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::capabilities::{
    Browser, CloudCredentials, DeviceType, ExecutionMode, Platform, ProxyConfig,
};
use crate::params::{OnError, TestParameters};
use crate::result::VolanteResult;

/// Cloud device-farm account settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSettings {
    /// Account user name
    pub username: String,
    /// Account password or API token
    pub password: String,
    /// Device name to cloud device id mapping
    #[serde(default)]
    pub devices: HashMap<String, String>,
}

/// Process-wide execution defaults, loaded once at batch start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project name shown in report headings
    pub project_name: String,
    /// Name of the manifest section (run configuration) to execute
    pub run_configuration: String,
    /// Default execution mode
    pub execution_mode: ExecutionMode,
    /// Default browser
    pub browser: Browser,
    /// Default platform
    pub platform: Platform,
    /// Default device type
    pub device_type: DeviceType,
    /// Default device name for device modes
    pub device_name: Option<String>,
    /// Default remote endpoint URL
    pub remote_url: Option<String>,
    /// What to do with the rest of a test instance after an iteration fails
    pub on_error: OnError,
    /// Worker pool size for batch execution
    pub thread_count: usize,
    /// Element-wait timeout, in seconds, applied to every session
    pub element_wait_timeout_secs: u64,
    /// Page-load timeout, in seconds, applied to every session
    pub page_load_timeout_secs: u64,
    /// Sheet holding iteration data within each module's data table
    pub default_sheet: String,
    /// Prefix marking a cell value as a reference into the Common sheet
    pub reference_identifier: String,
    /// Directory for structured report output; reports stay in memory when unset
    pub report_path: Option<PathBuf>,
    /// Copy data tables next to the report output
    pub include_test_data_in_report: bool,
    /// Accept untrusted SSL certificates when opening sessions
    pub accept_ssl_certs: bool,
    /// Proxy applied to every session, when the environment requires one
    pub proxy: Option<ProxyConfig>,
    /// Cloud device-farm account, required for [`ExecutionMode::CloudDevice`]
    pub cloud: Option<CloudSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: "Volante".to_string(),
            run_configuration: "Default".to_string(),
            execution_mode: ExecutionMode::Local,
            browser: Browser::Chrome,
            platform: Platform::Any,
            device_type: DeviceType::Desktop,
            device_name: None,
            remote_url: None,
            on_error: OnError::NextIteration,
            thread_count: 1,
            element_wait_timeout_secs: 10,
            page_load_timeout_secs: 30,
            default_sheet: "General_Data".to_string(),
            reference_identifier: "#".to_string(),
            report_path: None,
            include_test_data_in_report: false,
            accept_ssl_certs: false,
            proxy: None,
            cloud: None,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> VolanteResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&text)?)
    }

    /// Fill every unset field of `params` with the corresponding default.
    ///
    /// Cloud-device mode with no browser pinned gets the
    /// [`Browser::CloudDefault`] sentinel rather than the default browser.
    /// Emulated-device modes force Chrome at session-factory time, not here.
    pub fn resolve(&self, params: &mut TestParameters) {
        if params.description.is_empty() {
            debug!(
                test_case = %params.test_case,
                "description unspecified, defaulting to the test case name"
            );
            params.description = params.test_case.clone();
        }

        if params.execution_mode.is_none() {
            params.execution_mode = Some(self.execution_mode);
        }

        if params.browser.is_none() {
            let browser = match params.execution_mode {
                Some(ExecutionMode::CloudDevice) => Browser::CloudDefault,
                _ => self.browser,
            };
            debug!(%browser, "browser unspecified, applying default");
            params.browser = Some(browser);
        }

        if params.platform.is_none() {
            params.platform = Some(self.platform);
        }

        if params.device_type.is_none() {
            params.device_type = Some(self.device_type);
        }

        if params.device_name.is_none() {
            params.device_name = self.device_name.clone();
        }

        if params.remote_url.is_none() {
            params.remote_url = self.remote_url.clone();
        }
    }

    /// Look up the cloud device id for a device name
    #[must_use]
    pub fn cloud_device_id(&self, device_name: &str) -> Option<&str> {
        self.cloud
            .as_ref()
            .and_then(|c| c.devices.get(device_name))
            .map(String::as_str)
    }

    /// Cloud account credentials, when configured
    #[must_use]
    pub fn cloud_credentials(&self) -> Option<CloudCredentials> {
        self.cloud.as_ref().map(|c| CloudCredentials {
            username: c.username.clone(),
            password: c.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fills_unset_fields() {
        let settings = Settings {
            browser: Browser::Firefox,
            platform: Platform::Linux,
            remote_url: Some("http://hub:4444".to_string()),
            ..Default::default()
        };
        let mut params = TestParameters::new("Login", "ValidCredentials");
        settings.resolve(&mut params);

        assert_eq!(params.execution_mode, Some(ExecutionMode::Local));
        assert_eq!(params.browser, Some(Browser::Firefox));
        assert_eq!(params.platform, Some(Platform::Linux));
        assert_eq!(params.device_type, Some(DeviceType::Desktop));
        assert_eq!(params.remote_url.as_deref(), Some("http://hub:4444"));
        assert_eq!(params.description, "ValidCredentials");
    }

    #[test]
    fn test_resolve_keeps_explicit_fields() {
        let settings = Settings::default();
        let mut params = TestParameters::builder("Login", "ValidCredentials")
            .browser(Browser::Edge)
            .description("custom description")
            .build();
        settings.resolve(&mut params);

        assert_eq!(params.browser, Some(Browser::Edge));
        assert_eq!(params.description, "custom description");
    }

    #[test]
    fn test_cloud_mode_defaults_to_cloud_sentinel_browser() {
        let settings = Settings::default();
        let mut params = TestParameters::builder("Login", "ValidCredentials")
            .execution_mode(ExecutionMode::CloudDevice)
            .build();
        settings.resolve(&mut params);
        assert_eq!(params.browser, Some(Browser::CloudDefault));
    }

    #[test]
    fn test_cloud_device_id_lookup() {
        let mut devices = HashMap::new();
        devices.insert("Pixel 8".to_string(), "cloud-4711".to_string());
        let settings = Settings {
            cloud: Some(CloudSettings {
                username: "ci".to_string(),
                password: "secret".to_string(),
                devices,
            }),
            ..Default::default()
        };
        assert_eq!(settings.cloud_device_id("Pixel 8"), Some("cloud-4711"));
        assert_eq!(settings.cloud_device_id("Pixel 9"), None);
    }

    #[test]
    fn test_settings_yaml_round_trip() {
        let settings = Settings {
            thread_count: 4,
            on_error: OnError::Stop,
            ..Default::default()
        };
        let yaml = serde_yaml_ng::to_string(&settings).unwrap();
        let back: Settings = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.thread_count, 4);
        assert_eq!(back.on_error, OnError::Stop);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "project_name: Storefront\nthread_count: 3\n";
        let settings: Settings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(settings.project_name, "Storefront");
        assert_eq!(settings.thread_count, 3);
        assert_eq!(settings.browser, Browser::Chrome);
    }
}
