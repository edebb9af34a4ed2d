//! Error types for providers, widget runtimes, and the dashboard viewer.

use thiserror::Error;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for widget runtime operations.
pub type WidgetResult<T> = Result<T, WidgetError>;

/// Fallback message shown when an error carries no usable text.
pub const GENERIC_LOAD_ERROR: &str = "Failed to load data";

/// Errors raised at a provider boundary (data, storage, realtime).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request reached the backend but failed.
    #[error("request to {endpoint} failed: {message}")]
    Request {
        /// Endpoint the request was issued against.
        endpoint: String,
        /// Failure description from the backend or transport.
        message: String,
    },

    /// The request did not complete in time.
    #[error("request to {0} timed out")]
    Timeout(String),

    /// The backend could not be reached at all.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Local persistence failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The provider does not implement this capability.
    #[error("operation not supported: {0}")]
    NotSupported(String),
}

impl ProviderError {
    /// Build a request failure for an endpoint.
    pub fn request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors surfaced by a widget runtime.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The data provider failed after all retries.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A raw payload could not be reshaped into the widget's data model.
    #[error("invalid widget data: {0}")]
    Transform(String),

    /// The runtime task has stopped and no longer accepts commands.
    #[error("widget runtime is closed")]
    Closed,

    /// A free-form error message.
    #[error("{0}")]
    Message(String),
}

impl WidgetError {
    /// Human-readable message for display, falling back to a generic text.
    #[must_use]
    pub fn display_message(&self) -> String {
        let message = match self {
            Self::Provider(ProviderError::Request { message, .. }) => message.clone(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            GENERIC_LOAD_ERROR.to_string()
        } else {
            message
        }
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transform(err.to_string())
    }
}

/// Errors raised while loading a dashboard.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Storage has no dashboard with this id.
    #[error("Dashboard not found: {0}")]
    NotFound(String),

    /// Storage failed while loading.
    #[error("Failed to load dashboard: {0}")]
    Load(#[source] ProviderError),

    /// Neither a dashboard id nor a direct config was given.
    #[error("no dashboard id or config provided")]
    NoSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::request("/api/kpi", "502 bad gateway");
        assert_eq!(err.to_string(), "request to /api/kpi failed: 502 bad gateway");

        let err = ProviderError::Timeout("/api/kpi".to_string());
        assert_eq!(err.to_string(), "request to /api/kpi timed out");
    }

    #[test]
    fn test_display_message_uses_request_message() {
        let err = WidgetError::from(ProviderError::request("/api/kpi", "Service down"));
        assert_eq!(err.display_message(), "Service down");
    }

    #[test]
    fn test_display_message_falls_back_when_empty() {
        let err = WidgetError::Message("   ".to_string());
        assert_eq!(err.display_message(), GENERIC_LOAD_ERROR);

        let err = WidgetError::from(ProviderError::request("/api/kpi", ""));
        assert_eq!(err.display_message(), GENERIC_LOAD_ERROR);
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<i32>("invalid").unwrap_err();

        assert!(matches!(WidgetError::from(serde_err), WidgetError::Transform(_)));

        let serde_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        assert!(matches!(
            ProviderError::from(serde_err),
            ProviderError::Serialization(_)
        ));
    }

    #[test]
    fn test_viewer_errors_are_distinct() {
        let not_found = ViewerError::NotFound("missing-id".to_string());
        let failed = ViewerError::Load(ProviderError::Unavailable("offline".to_string()));

        assert_eq!(not_found.to_string(), "Dashboard not found: missing-id");
        assert!(failed.to_string().starts_with("Failed to load dashboard"));
        assert_ne!(not_found.to_string(), failed.to_string());
    }
}
