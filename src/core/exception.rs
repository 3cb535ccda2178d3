// SPDX-License-Identifier: MIT OR Apache-2.0

//! Element Error Types
//!
//! Every failure an element can raise, grouped by how the pipeline reacts to it.

use thiserror::Error;

/// Result type for element operations
pub type ElementResult<T> = Result<T, ElementError>;

/// How the surrounding pipeline treats an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad or missing parameters; aborts pipeline start
    Configuration,
    /// A field of one event could not be resolved; only that event is dropped
    Resolution,
    /// Broker or store failure
    ExternalResource,
    /// Lifecycle operation invoked out of order
    Lifecycle,
    /// Anything else raised while processing
    Runtime,
}

/// Comprehensive element error types
#[derive(Error, Debug)]
pub enum ElementError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        config_key: Option<String>,
    },

    #[error("Invalid parameter '{parameter:?}': {message}")]
    InvalidParameter {
        message: String,
        parameter: Option<String>,
        expected: Option<String>,
    },

    #[error("Missing required parameter: {parameter}")]
    MissingParameter { parameter: String },

    #[error("Initialization failed: {message}")]
    InitializationFailed {
        message: String,
        component: Option<String>,
    },

    #[error("Field not found: {path}")]
    FieldNotFound { path: String },

    #[error("Type mismatch at '{path}': expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Connection unavailable: {message}")]
    ConnectionUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Publish failed: {message}")]
    PublishFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Store write failed: {message}")]
    StoreWriteFailed { message: String },

    #[error("Flush of {pending} buffered events failed: {source}")]
    FlushFailed {
        pending: usize,
        source: Box<ElementError>,
    },

    #[error("Lifecycle violation in '{element}': {operation} called while {state}")]
    LifecycleViolation {
        element: String,
        operation: String,
        state: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Runtime error: {message}")]
    Runtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ElementError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            config_key: None,
        }
    }

    /// Create a configuration error with a specific key
    pub fn configuration_with_key(message: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            config_key: Some(config_key.into()),
        }
    }

    /// Create an invalid parameter error with details
    pub fn invalid_parameter_with_details(
        message: impl Into<String>,
        parameter: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            message: message.into(),
            parameter: Some(parameter.into()),
            expected: Some(expected.into()),
        }
    }

    pub fn missing_parameter(parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
        }
    }

    /// Create an initialization failed error with component
    pub fn initialization_failed_with_component(
        message: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self::InitializationFailed {
            message: message.into(),
            component: Some(component.into()),
        }
    }

    pub fn field_not_found(path: impl Into<String>) -> Self {
        Self::FieldNotFound { path: path.into() }
    }

    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a connection unavailable error
    pub fn connection_unavailable(message: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection unavailable error with source
    pub fn connection_unavailable_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn publish_failed(message: impl Into<String>) -> Self {
        Self::PublishFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn store_write_failed(message: impl Into<String>) -> Self {
        Self::StoreWriteFailed {
            message: message.into(),
        }
    }

    pub fn flush_failed(pending: usize, source: ElementError) -> Self {
        Self::FlushFailed {
            pending,
            source: Box::new(source),
        }
    }

    pub fn lifecycle_violation(
        element: impl Into<String>,
        operation: impl Into<String>,
        state: impl std::fmt::Display,
    ) -> Self {
        Self::LifecycleViolation {
            element: element.into(),
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            source: None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ElementError::Configuration { .. }
            | ElementError::InvalidParameter { .. }
            | ElementError::MissingParameter { .. }
            | ElementError::InitializationFailed { .. } => ErrorCategory::Configuration,
            ElementError::FieldNotFound { .. } | ElementError::TypeMismatch { .. } => {
                ErrorCategory::Resolution
            }
            ElementError::ConnectionUnavailable { .. }
            | ElementError::PublishFailed { .. }
            | ElementError::StoreWriteFailed { .. }
            | ElementError::FlushFailed { .. } => ErrorCategory::ExternalResource,
            ElementError::LifecycleViolation { .. } => ErrorCategory::Lifecycle,
            ElementError::Serialization(_) | ElementError::Runtime { .. } => ErrorCategory::Runtime,
        }
    }

    /// True for errors that only concern the event being processed
    pub fn is_resolution_error(&self) -> bool {
        self.category() == ErrorCategory::Resolution
    }

    /// Configuration and lifecycle errors cannot be recovered at runtime
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Lifecycle
        )
    }
}
