//! CLI error types.

use thiserror::Error;

use tessera_widgets::{ProviderError, ViewerError};

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Dashboard storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] ProviderError),

    /// The dashboard could not be loaded.
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    /// A dashboard with this id already exists.
    #[error("dashboard already exists: {0} (use --force to overwrite)")]
    AlreadyExists(String),

    /// No dashboard with this id.
    #[error("dashboard not found: {0}")]
    NotFound(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_already_exists() {
        let err = CliError::AlreadyExists("ops".into());
        assert_eq!(err.to_string(), "dashboard already exists: ops (use --force to overwrite)");
    }

    #[test]
    fn cli_error_viewer_is_transparent() {
        let err = CliError::from(ViewerError::NotFound("ops".into()));
        assert_eq!(err.to_string(), "Dashboard not found: ops");
    }

    #[test]
    fn cli_error_from_io() {
        let err = CliError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(matches!(err, CliError::Io(_)));
        assert_eq!(err.to_string(), "IO error: disk");
    }
}
