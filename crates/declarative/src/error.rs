//! Error types for resolution and graph building.
//!
//! Resolution is deterministic: the same inputs always fail the same way,
//! so nothing here is retryable. Each error names the offending option and
//! the layer that supplied it so users can fix the right input.

use crate::types::Layer;
use thiserror::Error;

/// Categories of resolution errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A value could not be normalized for its option
    Value,
    /// Two options contradict each other
    Conflict,
    /// The external template renderer failed
    Render,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Value => "Invalid option value",
            Self::Conflict => "Conflicting options",
            Self::Render => "Template rendering failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Value => "Fix the value at the reported layer; flags accept true/false/yes/no",
            Self::Conflict => "Set only one of the conflicting options",
            Self::Render => "Check that the template exists and is readable",
        }
    }
}

/// Errors that can occur while resolving options or building a graph.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw value could not be normalized for its option
    #[error("invalid value for '{option}' from {layer}: expected {expected}, got {found}")]
    InvalidValue {
        /// Option name
        option: String,
        /// Layer that supplied the value
        layer: Layer,
        /// What the option accepts
        expected: &'static str,
        /// The rejected value
        found: String,
    },

    /// Resolved options contradict each other
    #[error("'{option}' ({layer}) conflicts with '{conflicts_with}': {reason}")]
    InconsistentState {
        /// Option whose value cannot be honoured
        option: String,
        /// Option it conflicts with
        conflicts_with: String,
        /// Layer that supplied `option`
        layer: Layer,
        /// Why the combination is rejected
        reason: String,
    },

    /// The template renderer collaborator failed
    #[error("template '{template}' failed to render: {message}")]
    Render {
        /// Template path handed to the renderer
        template: String,
        /// Renderer's error message
        message: String,
    },
}

impl Error {
    /// Create an invalid value error.
    pub fn invalid_value(
        option: impl Into<String>,
        layer: Layer,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            option: option.into(),
            layer,
            expected,
            found: found.into(),
        }
    }

    /// Create a render error.
    pub fn render(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidValue { .. } => ErrorCategory::Value,
            Error::InconsistentState { .. } => ErrorCategory::Conflict,
            Error::Render { .. } => ErrorCategory::Render,
        }
    }

    /// Option the error is about, if any
    pub fn option(&self) -> Option<&str> {
        match self {
            Error::InvalidValue { option, .. } | Error::InconsistentState { option, .. } => {
                Some(option)
            }
            Error::Render { .. } => Some("template"),
        }
    }

    /// Layer that supplied the offending value, if known
    pub fn layer(&self) -> Option<Layer> {
        match self {
            Error::InvalidValue { layer, .. } | Error::InconsistentState { layer, .. } => {
                Some(*layer)
            }
            Error::Render { .. } => None,
        }
    }
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;
