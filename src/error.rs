// SPDX-License-Identifier: MIT

//! Typed error handling for flowstep
//!
//! Failures raised while a flow is stepping fall into three kinds:
//! - `RetryableError` - transient, the engine re-attempts the same decision point
//! - `ConfigurationError` - the flow itself is wired wrong (missing activity body, no activity for a state)
//! - anything else - an application failure raised by an activity body, always fatal

use thiserror::Error;

/// Result type returned by activity bodies
pub type ActivityResult = Result<(), FlowError>;

const DEFAULT_RETRYABLE_MESSAGE: &str = "Retryable exception thrown by an executing activity.";

/// Transient failure signalling "retry the current decision + execution pair"
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RetryableError {
    pub message: String,
    /// Opaque data an activity may attach for its handlers
    pub extra: Option<serde_json::Value>,
}

impl RetryableError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

impl Default for RetryableError {
    fn default() -> Self {
        Self::new(DEFAULT_RETRYABLE_MESSAGE)
    }
}

/// Errors caused by how a flow or its configuration was put together
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Activity constructed without a body
    #[error("Activity '{activity}' has no implementation")]
    MissingImplementation { activity: String },

    /// Decider returned nothing for a non-terminal state
    #[error("Decider returned no activity for state {state}")]
    NoActivity { state: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors while reading configuration
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Top-level error type for flowstep
#[derive(Debug, Error)]
pub enum FlowError {
    /// Transient failure, eligible for bounded re-attempt
    #[error("Retryable error: {0}")]
    Retryable(#[from] RetryableError),

    /// Flow wiring errors, never retried
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Failure raised by application code inside an activity
    #[error("Application error: {0}")]
    Application(Box<dyn std::error::Error + Send + Sync>),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Create a retryable error
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable(RetryableError::new(message))
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::InvalidConfig(message.into()))
    }

    /// Wrap an application error
    pub fn application(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Application(Box::new(err))
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

// Allow conversion from &str for backward compatibility
impl From<&str> for FlowError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for FlowError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for FlowError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Application(err)
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::application(err)
    }
}
