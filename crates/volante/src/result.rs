//! Result and error types for Volante.

use thiserror::Error;

/// Result type for Volante operations
pub type VolanteResult<T> = Result<T, VolanteError>;

/// Errors that can occur in Volante
#[derive(Debug, Error)]
pub enum VolanteError {
    /// Unresolvable configuration (bad execution mode, missing URL/credentials,
    /// invalid enum value from the manifest or settings). Fatal for the test
    /// instance that hit it; never retried.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// No handler is registered for a keyword
    #[error("Keyword '{keyword}' not found in the step registry")]
    KeywordNotFound {
        /// The keyword that failed to resolve
        keyword: String,
    },

    /// A keyword was registered twice
    #[error("Keyword '{keyword}' is already registered by '{existing}'")]
    DuplicateKeyword {
        /// The keyword being registered
        keyword: String,
        /// The library that registered it first
        existing: String,
    },

    /// Session backend failed to open a driver session
    #[error("Failed to open driver session: {message}")]
    SessionOpen {
        /// Error message
        message: String,
    },

    /// A driver call failed mid-step
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Test case missing from a data sheet
    #[error("Test case \"{test_case}\" is not found in the {sheet} sheet")]
    TestCaseNotFound {
        /// The test case that was looked up
        test_case: String,
        /// The sheet that was searched
        sheet: String,
    },

    /// Business flow is empty for a test case
    #[error("No business flow found against the test case \"{test_case}\"")]
    EmptyFlow {
        /// The test case without a flow
        test_case: String,
    },

    /// Manifest could not be parsed
    #[error("Run manifest error: {message}")]
    Manifest {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VolanteError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a session-open error
    #[must_use]
    pub fn session_open(message: impl Into<String>) -> Self {
        Self::SessionOpen {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}

/// Outcome of executing a single step of a business flow.
///
/// Step failures are data, not unwound errors: the iteration loop pattern
/// matches on this instead of catching error types, and the named error
/// channel feeds the report heading for the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step completed
    Ok,
    /// The step failed
    Failed {
        /// Heading under which the failure is reported (e.g. "Error",
        /// "Keyword not found", or a domain-specific channel)
        error_name: String,
        /// Human-readable failure description
        detail: String,
        /// Chained cause, if any
        cause: Option<String>,
    },
}

impl StepOutcome {
    /// Create a failed outcome with the generic error channel
    #[must_use]
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed {
            error_name: "Error".to_string(),
            detail: detail.into(),
            cause: None,
        }
    }

    /// Create a failed outcome reported under a named error channel
    #[must_use]
    pub fn failed_as(error_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Failed {
            error_name: error_name.into(),
            detail: detail.into(),
            cause: None,
        }
    }

    /// Attach a chained cause to a failed outcome (no-op on `Ok`)
    #[must_use]
    pub fn with_cause(self, cause: impl Into<String>) -> Self {
        match self {
            Self::Ok => Self::Ok,
            Self::Failed {
                error_name, detail, ..
            } => Self::Failed {
                error_name,
                detail,
                cause: Some(cause.into()),
            },
        }
    }

    /// Check if the outcome is a failure
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<VolanteError> for StepOutcome {
    fn from(err: VolanteError) -> Self {
        match err {
            VolanteError::KeywordNotFound { ref keyword } => Self::Failed {
                error_name: "Keyword not found".to_string(),
                detail: format!("Keyword '{keyword}' not found in the step registry"),
                cause: None,
            },
            other => Self::failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = VolanteError::config("bad execution mode");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bad execution mode"));
    }

    #[test]
    fn test_keyword_not_found_names_keyword() {
        let err = VolanteError::KeywordNotFound {
            keyword: "clickSubmit".to_string(),
        };
        assert!(err.to_string().contains("clickSubmit"));
    }

    #[test]
    fn test_duplicate_keyword_names_both_sides() {
        let err = VolanteError::DuplicateKeyword {
            keyword: "login".to_string(),
            existing: "LoginPage".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("login"));
        assert!(msg.contains("LoginPage"));
    }

    #[test]
    fn test_step_outcome_with_cause() {
        let outcome = StepOutcome::failed("element not found").with_cause("timeout after 30s");
        match outcome {
            StepOutcome::Failed { detail, cause, .. } => {
                assert_eq!(detail, "element not found");
                assert_eq!(cause.as_deref(), Some("timeout after 30s"));
            }
            StepOutcome::Ok => panic!("expected failure"),
        }
    }

    #[test]
    fn test_step_outcome_from_keyword_error() {
        let outcome: StepOutcome = VolanteError::KeywordNotFound {
            keyword: "missing".to_string(),
        }
        .into();
        match outcome {
            StepOutcome::Failed { error_name, .. } => {
                assert_eq!(error_name, "Keyword not found");
            }
            StepOutcome::Ok => panic!("expected failure"),
        }
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VolanteError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
