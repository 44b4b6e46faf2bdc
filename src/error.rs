//! Structured error types for configuration binding.

use serde::Serialize;
use std::path::PathBuf;

/// Boxed error used as the cause of coercion and adapter failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Source errors
    SourceUnreadable,

    // Field declaration errors
    ArrayOnScalar,
    InvalidDirective,

    // Value errors
    MissingRequired,
    NumberFormat,
    NoAdapter,
    AdapterFailed,

    // Internal errors
    Internal,
}

/// A fatal configuration error. Binding stops at the first one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration variable {key} was not provided (field {field})")]
    MissingRequired { field: String, key: String },

    #[error("field {field} has an array directive even though it is not a sequence type")]
    ArrayOnScalar { field: String },

    #[error("field {field} has an invalid directive: {reason}")]
    InvalidDirective { field: String, reason: String },

    #[error("failed to parse {value:?} as {type_name} for {key} (field {field})")]
    NumberFormat {
        field: String,
        key: String,
        value: String,
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    #[error(
        "no adapter registered for type {type_name} of field {field}; \
         ignore the field or register an adapter for it"
    )]
    NoAdapter {
        field: String,
        key: String,
        type_name: &'static str,
    },

    #[error("adapter for {type_name} failed to convert {key} (field {field})")]
    AdapterFailed {
        field: String,
        key: String,
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("internal binder error: {0}")]
    Internal(String),
}

impl ConfigError {
    /// The programmatic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::SourceUnreadable { .. } => ErrorCode::SourceUnreadable,
            ConfigError::MissingRequired { .. } => ErrorCode::MissingRequired,
            ConfigError::ArrayOnScalar { .. } => ErrorCode::ArrayOnScalar,
            ConfigError::InvalidDirective { .. } => ErrorCode::InvalidDirective,
            ConfigError::NumberFormat { .. } => ErrorCode::NumberFormat,
            ConfigError::NoAdapter { .. } => ErrorCode::NoAdapter,
            ConfigError::AdapterFailed { .. } => ErrorCode::AdapterFailed,
            ConfigError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// The declared name of the offending field, when the error belongs to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::MissingRequired { field, .. }
            | ConfigError::ArrayOnScalar { field }
            | ConfigError::InvalidDirective { field, .. }
            | ConfigError::NumberFormat { field, .. }
            | ConfigError::NoAdapter { field, .. }
            | ConfigError::AdapterFailed { field, .. } => Some(field.as_str()),
            ConfigError::SourceUnreadable { .. } | ConfigError::Internal(_) => None,
        }
    }

    // Convenience constructors. Field names are filled in by the binder.

    pub fn number_format(
        key: &str,
        value: &str,
        type_name: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        ConfigError::NumberFormat {
            field: String::new(),
            key: key.to_string(),
            value: value.to_string(),
            type_name,
            source: source.into(),
        }
    }

    pub fn no_adapter(key: &str, type_name: &'static str) -> Self {
        ConfigError::NoAdapter {
            field: String::new(),
            key: key.to_string(),
            type_name,
        }
    }

    pub fn adapter_failed(key: &str, type_name: &'static str, source: anyhow::Error) -> Self {
        ConfigError::AdapterFailed {
            field: String::new(),
            key: key.to_string(),
            type_name,
            source: source.into(),
        }
    }

    pub fn invalid_directive(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidDirective {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the declared field name if the error does not carry one yet.
    pub(crate) fn with_field(mut self, name: &str) -> Self {
        match &mut self {
            ConfigError::MissingRequired { field, .. }
            | ConfigError::ArrayOnScalar { field }
            | ConfigError::InvalidDirective { field, .. }
            | ConfigError::NumberFormat { field, .. }
            | ConfigError::NoAdapter { field, .. }
            | ConfigError::AdapterFailed { field, .. } => {
                if field.is_empty() {
                    *field = name.to_string();
                }
            }
            ConfigError::SourceUnreadable { .. } | ConfigError::Internal(_) => {}
        }
        self
    }

    /// Replace any raw value carried by the error with `placeholder`.
    ///
    /// Adapter causes are free-form and may echo the raw value, so they are
    /// replaced wholesale.
    pub(crate) fn redact(mut self, placeholder: &str) -> Self {
        match &mut self {
            ConfigError::NumberFormat { value, source, .. } => {
                *value = placeholder.to_string();
                *source = placeholder.to_string().into();
            }
            ConfigError::AdapterFailed { source, .. } => {
                *source = placeholder.to_string().into();
            }
            _ => {}
        }
        self
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
