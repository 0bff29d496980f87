//! Execution targets and session capabilities.
//!
//! Closed enumerations for where a test runs (mode, browser, platform,
//! device class) plus the capability set handed to a session backend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::VolanteError;

/// Where and how a driver session is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Browser on the local machine
    Local,
    /// Browser on a remote machine
    Remote,
    /// Emulated mobile device on the local machine
    LocalEmulatedDevice,
    /// Emulated mobile device on a remote machine
    RemoteEmulatedDevice,
    /// A browser grid node
    Grid,
    /// A cloud device-farm device
    CloudDevice,
    /// A mobile device behind an Appium server
    AppiumDevice,
}

impl ExecutionMode {
    /// Modes that require a remote endpoint URL
    #[must_use]
    pub const fn requires_remote_url(&self) -> bool {
        !matches!(self, Self::Local | Self::LocalEmulatedDevice)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "Local",
            Self::Remote => "Remote",
            Self::LocalEmulatedDevice => "LocalEmulatedDevice",
            Self::RemoteEmulatedDevice => "RemoteEmulatedDevice",
            Self::Grid => "Grid",
            Self::CloudDevice => "CloudDevice",
            Self::AppiumDevice => "AppiumDevice",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = VolanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Local" => Ok(Self::Local),
            "Remote" => Ok(Self::Remote),
            "LocalEmulatedDevice" => Ok(Self::LocalEmulatedDevice),
            "RemoteEmulatedDevice" => Ok(Self::RemoteEmulatedDevice),
            "Grid" => Ok(Self::Grid),
            "CloudDevice" => Ok(Self::CloudDevice),
            "AppiumDevice" => Ok(Self::AppiumDevice),
            other => Err(VolanteError::config(format!(
                "Unknown execution mode: {other}"
            ))),
        }
    }
}

/// Browser used for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Browser {
    /// Chrome / Chromium
    Chrome,
    /// Chrome in headless mode
    ChromeHeadless,
    /// Microsoft Edge
    Edge,
    /// Firefox
    Firefox,
    /// Safari
    Safari,
    /// Opera
    Opera,
    /// Whatever default browser the cloud device exposes
    CloudDefault,
}

impl Browser {
    /// Headless browsers cannot link screenshots into the test log
    #[must_use]
    pub const fn supports_screenshots(&self) -> bool {
        !matches!(self, Self::ChromeHeadless)
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chrome => "Chrome",
            Self::ChromeHeadless => "ChromeHeadless",
            Self::Edge => "Edge",
            Self::Firefox => "Firefox",
            Self::Safari => "Safari",
            Self::Opera => "Opera",
            Self::CloudDefault => "CloudDefault",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Browser {
    type Err = VolanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Chrome" => Ok(Self::Chrome),
            "ChromeHeadless" => Ok(Self::ChromeHeadless),
            "Edge" => Ok(Self::Edge),
            "Firefox" => Ok(Self::Firefox),
            "Safari" => Ok(Self::Safari),
            "Opera" => Ok(Self::Opera),
            "CloudDefault" => Ok(Self::CloudDefault),
            other => Err(VolanteError::config(format!("Unknown browser: {other}"))),
        }
    }
}

/// Operating system platform for grid / remote dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Any available platform
    Any,
    /// Windows
    Windows,
    /// Linux
    Linux,
    /// macOS
    Mac,
    /// Android
    Android,
    /// iOS
    Ios,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "Any",
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Mac => "Mac",
            Self::Android => "Android",
            Self::Ios => "Ios",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Platform {
    type Err = VolanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Any" => Ok(Self::Any),
            "Windows" => Ok(Self::Windows),
            "Linux" => Ok(Self::Linux),
            "Mac" => Ok(Self::Mac),
            "Android" => Ok(Self::Android),
            "Ios" | "iOS" => Ok(Self::Ios),
            other => Err(VolanteError::config(format!("Unknown platform: {other}"))),
        }
    }
}

/// Class of device the test runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Large desktop display
    LargeDesktop,
    /// Desktop or laptop
    Desktop,
    /// Tablet held upright
    TabletPortrait,
    /// Tablet held sideways
    TabletLandscape,
    /// Phone held upright
    MobilePortrait,
    /// Phone held sideways
    MobileLandscape,
}

impl DeviceType {
    /// Desktop-class devices get a maximized window after session open
    #[must_use]
    pub const fn is_desktop_class(&self) -> bool {
        matches!(self, Self::LargeDesktop | Self::Desktop)
    }

    /// Screen orientation derived from the device type.
    ///
    /// Portrait is the fallback for desktop-class types.
    #[must_use]
    pub const fn screen_orientation(&self) -> ScreenOrientation {
        match self {
            Self::MobileLandscape | Self::TabletLandscape => ScreenOrientation::Landscape,
            _ => ScreenOrientation::Portrait,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LargeDesktop => "LargeDesktop",
            Self::Desktop => "Desktop",
            Self::TabletPortrait => "TabletPortrait",
            Self::TabletLandscape => "TabletLandscape",
            Self::MobilePortrait => "MobilePortrait",
            Self::MobileLandscape => "MobileLandscape",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for DeviceType {
    type Err = VolanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LargeDesktop" => Ok(Self::LargeDesktop),
            "Desktop" => Ok(Self::Desktop),
            "TabletPortrait" => Ok(Self::TabletPortrait),
            "TabletLandscape" => Ok(Self::TabletLandscape),
            "MobilePortrait" => Ok(Self::MobilePortrait),
            "MobileLandscape" => Ok(Self::MobileLandscape),
            other => Err(VolanteError::config(format!("Unknown device type: {other}"))),
        }
    }
}

/// Screen orientation, derived from the device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenOrientation {
    /// Upright
    Portrait,
    /// Sideways
    Landscape,
}

impl fmt::Display for ScreenOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Portrait => write!(f, "Portrait"),
            Self::Landscape => write!(f, "Landscape"),
        }
    }
}

/// HTTP proxy configuration passed into session capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Authentication domain, when the proxy requires auth
    #[serde(default)]
    pub domain: Option<String>,
    /// Authentication user name
    #[serde(default)]
    pub username: Option<String>,
    /// Authentication password
    #[serde(default)]
    pub password: Option<String>,
}

/// Credentials for a cloud device farm
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudCredentials {
    /// Account user name
    pub username: String,
    /// Account password or API token
    pub password: String,
}

/// Full capability set handed to a [`SessionBackend`](crate::session::SessionBackend).
///
/// Built by the session factory from resolved test parameters; the backend
/// treats it as an opaque request and maps it onto whatever automation API
/// it wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Execution mode the capability set was built for
    pub mode: ExecutionMode,
    /// Browser to launch
    pub browser: Browser,
    /// Requested browser version (grid dispatch)
    pub browser_version: Option<String>,
    /// Requested platform (grid dispatch)
    pub platform: Option<Platform>,
    /// Device to emulate or allocate, for device modes
    pub device_name: Option<String>,
    /// Cloud device id, for [`ExecutionMode::CloudDevice`]
    pub device_id: Option<String>,
    /// Screen orientation, for device modes
    pub orientation: Option<ScreenOrientation>,
    /// Remote endpoint, for remote/grid/cloud/Appium modes
    pub remote_url: Option<String>,
    /// Proxy, when the environment requires one
    pub proxy: Option<ProxyConfig>,
    /// Accept untrusted SSL certificates
    pub accept_ssl_certs: bool,
    /// Cloud account credentials, for [`ExecutionMode::CloudDevice`]
    pub cloud_credentials: Option<CloudCredentials>,
}

impl Capabilities {
    /// Create a minimal capability set for a mode and browser
    #[must_use]
    pub fn new(mode: ExecutionMode, browser: Browser) -> Self {
        Self {
            mode,
            browser,
            browser_version: None,
            platform: None,
            device_name: None,
            device_id: None,
            orientation: None,
            remote_url: None,
            proxy: None,
            accept_ssl_certs: false,
            cloud_credentials: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_execution_mode_round_trip() {
        for mode in [
            ExecutionMode::Local,
            ExecutionMode::Remote,
            ExecutionMode::LocalEmulatedDevice,
            ExecutionMode::RemoteEmulatedDevice,
            ExecutionMode::Grid,
            ExecutionMode::CloudDevice,
            ExecutionMode::AppiumDevice,
        ] {
            let parsed = ExecutionMode::from_str(&mode.to_string()).unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn test_unknown_mode_is_config_error() {
        let err = ExecutionMode::from_str("Mainframe").unwrap_err();
        assert!(err.to_string().contains("Unknown execution mode"));
    }

    #[test]
    fn test_remote_url_requirement() {
        assert!(!ExecutionMode::Local.requires_remote_url());
        assert!(!ExecutionMode::LocalEmulatedDevice.requires_remote_url());
        assert!(ExecutionMode::Grid.requires_remote_url());
        assert!(ExecutionMode::CloudDevice.requires_remote_url());
    }

    #[test]
    fn test_orientation_derivation() {
        assert_eq!(
            DeviceType::MobilePortrait.screen_orientation(),
            ScreenOrientation::Portrait
        );
        assert_eq!(
            DeviceType::TabletLandscape.screen_orientation(),
            ScreenOrientation::Landscape
        );
        // Desktop types fall back to portrait
        assert_eq!(
            DeviceType::Desktop.screen_orientation(),
            ScreenOrientation::Portrait
        );
    }

    #[test]
    fn test_desktop_class() {
        assert!(DeviceType::LargeDesktop.is_desktop_class());
        assert!(DeviceType::Desktop.is_desktop_class());
        assert!(!DeviceType::MobilePortrait.is_desktop_class());
    }

    #[test]
    fn test_headless_screenshot_support() {
        assert!(Browser::Chrome.supports_screenshots());
        assert!(!Browser::ChromeHeadless.supports_screenshots());
    }

    #[test]
    fn test_capabilities_serialize() {
        let caps = Capabilities::new(ExecutionMode::Local, Browser::Firefox);
        let json = serde_json::to_string(&caps).unwrap();
        assert!(json.contains("Firefox"));
    }
}
