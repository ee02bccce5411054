//! Error types for the reconciler.

use aws_sdk_eks::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// Result alias used throughout the reconciliation engine.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Provider failure classes. Only the throttling family is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Throttling,
    TooManyRequests,
    RequestLimitExceeded,
    Permanent,
}

impl FailureKind {
    /// Classify an AWS error code.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("Throttling" | "ThrottlingException") => Self::Throttling,
            Some("TooManyRequests" | "TooManyRequestsException") => Self::TooManyRequests,
            Some("RequestLimitExceeded") => Self::RequestLimitExceeded,
            _ => Self::Permanent,
        }
    }

    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::Permanent)
    }
}

/// Errors that can occur while reconciling clusters.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("[{operation}] {message}")]
    Provider {
        operation: String,
        kind: FailureKind,
        code: Option<String>,
        message: String,
    },

    #[error("Retries exhausted after {attempts} attempts: {source}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
}

impl ReconcileError {
    /// Convert an AWS SDK error, classifying it by its service error code.
    pub fn aws<E>(operation: &str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let code = err.code().map(str::to_string);
        let kind = FailureKind::from_code(code.as_deref());
        let message = match (err.code(), err.message()) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message.to_string(),
            _ => DisplayErrorContext(&err).to_string(),
        };

        Self::Provider {
            operation: operation.to_string(),
            kind,
            code,
            message,
        }
    }

    /// Build a provider error directly, mainly for provider test doubles.
    pub fn provider(operation: &str, code: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.to_string(),
            kind: FailureKind::from_code(Some(code)),
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    /// Failure class of this error; anything that is not a provider error is permanent.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Provider { kind, .. } => *kind,
            _ => FailureKind::Permanent,
        }
    }

    /// Returns true if this error is transient and should be retried.
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_from_code() {
        assert_eq!(
            FailureKind::from_code(Some("ThrottlingException")),
            FailureKind::Throttling
        );
        assert_eq!(
            FailureKind::from_code(Some("Throttling")),
            FailureKind::Throttling
        );
        assert_eq!(
            FailureKind::from_code(Some("TooManyRequestsException")),
            FailureKind::TooManyRequests
        );
        assert_eq!(
            FailureKind::from_code(Some("RequestLimitExceeded")),
            FailureKind::RequestLimitExceeded
        );
        assert_eq!(
            FailureKind::from_code(Some("ResourceNotFoundException")),
            FailureKind::Permanent
        );
        assert_eq!(FailureKind::from_code(None), FailureKind::Permanent);
    }

    #[test]
    fn test_message_text_does_not_drive_classification() {
        let err = ReconcileError::provider(
            "eks::addon",
            "InvalidParameterException",
            "ThrottlingException mentioned in message",
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ReconcileError::provider("eks::client", "Throttling", "Rate exceeded");
        assert_eq!(err.to_string(), "[eks::client] Rate exceeded");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_exhausted_retries_keeps_last_error_text() {
        let last = ReconcileError::provider("eks::nodegroup", "Throttling", "Rate exceeded");
        let err = ReconcileError::ExhaustedRetries {
            attempts: 3,
            source: Box::new(last),
        };
        assert_eq!(
            err.to_string(),
            "Retries exhausted after 3 attempts: [eks::nodegroup] Rate exceeded"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display_cluster_not_found() {
        let err = ReconcileError::ClusterNotFound("my-cluster".to_string());
        assert_eq!(err.to_string(), "Cluster not found: my-cluster");
    }

    #[test]
    fn test_error_display_configuration_missing() {
        let err = ReconcileError::ConfigurationMissing("SNS_TOPIC_ARN".to_string());
        assert_eq!(err.to_string(), "Configuration missing: SNS_TOPIC_ARN");
        assert_eq!(err.kind(), FailureKind::Permanent);
    }
}
