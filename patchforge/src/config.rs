//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default server base URL for catalog and archive requests.
pub const DEFAULT_SERVER_URL: &str = "https://api.patchforge.dev";

/// Configuration for the version-state engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the version server.
    pub server_url: String,

    /// The user-owned asset file patches are applied to.
    pub target_file: PathBuf,

    /// Asset hierarchy root receiving auxiliary assets and logic
    /// objects. Defaults to the target file's parent directory.
    pub hierarchy_root: PathBuf,

    /// Directory where version payloads are stored.
    pub data_dir: PathBuf,

    /// Directory for temporary downloads and extraction.
    pub staging_dir: PathBuf,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl EngineConfig {
    /// Create a configuration for the given target file with defaults
    /// for everything else.
    pub fn new(target_file: impl Into<PathBuf>) -> Self {
        let target_file = target_file.into();
        let hierarchy_root = target_file
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let data_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("patchforge");

        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            target_file,
            hierarchy_root,
            data_dir,
            staging_dir: std::env::temp_dir().join("patchforge-staging"),
            timeout: Duration::from_secs(300),
        }
    }

    /// Set the server base URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the asset hierarchy root.
    pub fn with_hierarchy_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.hierarchy_root = root.into();
        self
    }

    /// Set the version payload data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the staging directory for downloads and extraction.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("/avatars/base.asset");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.target_file, PathBuf::from("/avatars/base.asset"));
        assert_eq!(config.hierarchy_root, PathBuf::from("/avatars"));
        assert!(config.data_dir.ends_with("patchforge"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new("/a/base.asset")
            .with_server_url("https://versions.example.com/")
            .with_data_dir("/var/lib/pf")
            .with_staging_dir("/tmp/pf")
            .with_hierarchy_root("/a/hierarchy")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.server_url, "https://versions.example.com/");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/pf"));
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/pf"));
        assert_eq!(config.hierarchy_root, PathBuf::from("/a/hierarchy"));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
