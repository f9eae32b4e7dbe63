//! CLI error type.

use std::fmt;

use patchforge::EngineError;

/// Errors surfaced to the terminal user.
#[derive(Debug)]
pub enum CliError {
    /// The engine rejected or failed an operation.
    Engine(EngineError),
    /// Bad or missing command-line configuration.
    Config(String),
    /// The requested version is not present in the fetched catalog.
    UnknownVersion(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(e) => write!(f, "{}", e),
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::UnknownVersion(v) => write!(
                f,
                "version '{}' not found in the catalog. Run 'patchforge versions' to see what is available.",
                v
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unknown_version() {
        let err = CliError::UnknownVersion("9.9.9".to_string());
        assert!(err.to_string().contains("9.9.9"));
    }

    #[test]
    fn test_engine_error_passthrough() {
        let err = CliError::from(EngineError::Cancelled);
        assert!(matches!(err, CliError::Engine(EngineError::Cancelled)));
    }
}
