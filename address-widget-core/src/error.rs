//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Core layer error type
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// A collaborator call (validate, create, load, places...) failed
    #[error("Service error: {operation} - {message}")]
    ServiceError { operation: String, message: String },

    /// Address not found by id
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// Place not found by prediction id
    #[error("Place not found: {0}")]
    PlaceNotFound(String),

    /// A modal action needed a candidate but the last result carried none
    #[error("No candidate address available")]
    NoCandidate,

    /// Invalid widget configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// network error
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl CoreError {
    /// Shorthand for a failed collaborator call.
    pub fn service(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServiceError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::AddressNotFound(_)
            | Self::PlaceNotFound(_)
            | Self::NoCandidate
            | Self::ValidationError(_) => true,
            Self::ServiceError { .. }
            | Self::ConfigError(_)
            | Self::SerializationError(_)
            | Self::NetworkError(_) => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_errors_are_user_facing() {
        assert!(CoreError::NoCandidate.is_expected());
        assert!(CoreError::AddressNotFound("a-1".to_string()).is_expected());
        assert!(!CoreError::service("validateAddress", "timeout").is_expected());
    }

    #[test]
    fn serializes_with_code_tag() {
        let json = serde_json::to_value(CoreError::PlaceNotFound("p-9".to_string())).unwrap();
        assert_eq!(json["code"], "PlaceNotFound");
        assert_eq!(json["details"], "p-9");
    }
}
