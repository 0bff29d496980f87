//! Driver sessions and the session factory.
//!
//! The automation backend itself is out of scope: the engine only sees the
//! [`DriverSession`] trait (an opaque handle with navigate / interact /
//! screenshot / quit operations) and obtains one through a
//! [`SessionBackend`]. The [`SessionFactory`] is the piece that belongs to
//! this crate: a closed dispatch over [`ExecutionMode`] that builds the
//! mode-specific [`Capabilities`] and uniformly applies the two session
//! timeouts plus desktop window maximization.

use std::time::Duration;
use tracing::info;

use crate::capabilities::{Browser, Capabilities, ExecutionMode};
use crate::params::TestParameters;
use crate::result::{VolanteError, VolanteResult};
use crate::settings::Settings;

/// Screenshot data captured from a live session
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Check if the screenshot has data
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// A live, stateful connection to a browser or device automation backend.
///
/// Owned exclusively by one engine run; [`DriverSession::quit`] must be
/// called on every exit path, success or failure. All calls block the
/// worker thread; the two timeouts set at session open are the only bounds
/// on how long a call may take.
pub trait DriverSession: Send {
    /// Navigate to a URL
    fn navigate(&mut self, url: &str) -> VolanteResult<()>;

    /// Click the element matching a locator
    fn click(&mut self, locator: &str) -> VolanteResult<()>;

    /// Type text into the element matching a locator
    fn type_text(&mut self, locator: &str, text: &str) -> VolanteResult<()>;

    /// Read the text content of the element matching a locator
    fn read_text(&mut self, locator: &str) -> VolanteResult<String>;

    /// Evaluate a script in the page and return its stringified result
    fn execute_script(&mut self, code: &str) -> VolanteResult<String>;

    /// Capture a screenshot of the current viewport
    fn screenshot(&mut self) -> VolanteResult<Screenshot>;

    /// Configure the element-wait and page-load timeouts
    fn set_timeouts(&mut self, element_wait: Duration, page_load: Duration) -> VolanteResult<()>;

    /// Maximize the window (desktop-class device types only)
    fn maximize_window(&mut self) -> VolanteResult<()>;

    /// Release the session. Required on every exit path.
    fn quit(&mut self) -> VolanteResult<()>;
}

/// Factory contract for the concrete automation backend.
///
/// Implementations map a [`Capabilities`] request onto whatever automation
/// API they wrap; the engine never learns which one.
pub trait SessionBackend: Send + Sync {
    /// One-time OS-level environment preparation (e.g. disabling a popup
    /// blocker). Called before every `open`; not retried on failure, so
    /// implementations should make any mutation idempotent.
    fn prepare_environment(&self) -> VolanteResult<()> {
        Ok(())
    }

    /// Open a live session for the given capability set
    fn open(&self, capabilities: &Capabilities) -> VolanteResult<Box<dyn DriverSession>>;
}

/// Builds driver sessions from resolved test parameters
#[derive(Debug)]
pub struct SessionFactory {
    settings: Settings,
}

impl SessionFactory {
    /// Create a factory over the given settings
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Open a session for the given parameters.
    ///
    /// Emulated-device modes force Chrome; the forced browser is written
    /// back into `params` so reports show what actually ran. After open,
    /// the element-wait and page-load timeouts are applied and desktop-class
    /// device types get a maximized window.
    pub fn open(
        &self,
        params: &mut TestParameters,
        backend: &dyn SessionBackend,
    ) -> VolanteResult<Box<dyn DriverSession>> {
        let capabilities = self.build_capabilities(params)?;
        info!(mode = %capabilities.mode, browser = %capabilities.browser, "opening driver session");

        backend.prepare_environment()?;
        let mut session = backend.open(&capabilities)?;

        session.set_timeouts(
            Duration::from_secs(self.settings.element_wait_timeout_secs),
            Duration::from_secs(self.settings.page_load_timeout_secs),
        )?;

        if params
            .device_type
            .is_some_and(|d| d.is_desktop_class())
        {
            session.maximize_window()?;
        }

        Ok(session)
    }

    fn build_capabilities(&self, params: &mut TestParameters) -> VolanteResult<Capabilities> {
        let mode = params
            .execution_mode
            .ok_or_else(|| VolanteError::config("Execution mode has not been resolved"))?;
        let browser = params
            .browser
            .ok_or_else(|| VolanteError::config("Browser has not been resolved"))?;

        let mut caps = Capabilities::new(mode, browser);
        caps.accept_ssl_certs = self.settings.accept_ssl_certs;
        caps.proxy = self.settings.proxy.clone();

        match mode {
            ExecutionMode::Local => {}

            ExecutionMode::Remote => {
                caps.remote_url = Some(self.required_remote_url(params)?);
            }

            ExecutionMode::LocalEmulatedDevice => {
                // Mobile emulation is only supported on Chrome
                params.browser = Some(Browser::Chrome);
                caps.browser = Browser::Chrome;
                caps.device_name = Some(self.required_device_name(params)?);
                caps.orientation = Some(params.screen_orientation());
            }

            ExecutionMode::RemoteEmulatedDevice => {
                params.browser = Some(Browser::Chrome);
                caps.browser = Browser::Chrome;
                caps.device_name = Some(self.required_device_name(params)?);
                caps.orientation = Some(params.screen_orientation());
                caps.remote_url = Some(self.required_remote_url(params)?);
            }

            ExecutionMode::Grid => {
                caps.browser_version = params.browser_version.clone();
                caps.platform = params.platform;
                caps.remote_url = Some(self.required_remote_url(params)?);
            }

            ExecutionMode::CloudDevice => {
                let device_name = self.required_device_name(params)?;
                let device_id = self
                    .settings
                    .cloud_device_id(&device_name)
                    .ok_or_else(|| {
                        VolanteError::config(format!(
                            "No cloud device id configured for device \"{device_name}\""
                        ))
                    })?
                    .to_string();
                caps.device_name = Some(device_name);
                caps.device_id = Some(device_id);
                caps.cloud_credentials = Some(self.settings.cloud_credentials().ok_or_else(
                    || VolanteError::config("Cloud credentials are not configured"),
                )?);
                caps.remote_url = Some(self.required_remote_url(params)?);
            }

            ExecutionMode::AppiumDevice => {
                caps.device_name = Some(self.required_device_name(params)?);
                caps.orientation = Some(params.screen_orientation());
                caps.platform = params.platform;
                caps.remote_url = Some(self.required_remote_url(params)?);
            }
        }

        Ok(caps)
    }

    fn required_remote_url(&self, params: &TestParameters) -> VolanteResult<String> {
        params.remote_url.clone().ok_or_else(|| {
            VolanteError::config(format!(
                "Execution mode {} requires a remote URL",
                params.execution_mode.map_or_else(String::new, |m| m.to_string())
            ))
        })
    }

    fn required_device_name(&self, params: &TestParameters) -> VolanteResult<String> {
        params.device_name.clone().ok_or_else(|| {
            VolanteError::config("A device name is required for device execution modes")
        })
    }
}
