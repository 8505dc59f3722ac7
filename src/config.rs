//! Configuration loaded from `routescribe.toml`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::{Result, RouteError};
use crate::routes::DuplicateStrategy;

/// Config file looked up in the scanned directory when none is given.
pub const CONFIG_FILE: &str = "routescribe.toml";

/// Top-level Routescribe configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub inspect: InspectConfig,
}

/// Which files are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Descend into subdirectories.
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Files larger than this many bytes are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Directory names never entered.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Also scan `_test.go` files.
    #[serde(default)]
    pub include_tests: bool,
    /// Worker threads for parsing; 0 uses rayon's default.
    #[serde(default)]
    pub threads: usize,
}

/// How declarations become endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    pub duplicate_strategy: DuplicateStrategy,
    /// Fall back to the handler function's doc comment.
    #[serde(default = "default_true")]
    pub handler_docs: bool,
}

/// Live server inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectConfig {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    1024 * 1024
}

fn default_exclude_dirs() -> Vec<String> {
    [
        "vendor",
        "node_modules",
        "testdata",
        ".git",
        ".svn",
        ".hg",
        ".idea",
        ".vscode",
        "dist",
        "build",
        "bin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_file_size: default_max_file_size(),
            exclude_dirs: default_exclude_dirs(),
            include_tests: false,
            threads: 0,
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            duplicate_strategy: DuplicateStrategy::default(),
            handler_docs: true,
        }
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            port: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InspectConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl RouteConfig {
    /// Load config from a TOML file, falling back to defaults. A malformed
    /// file is reported and ignored.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                warn!(file = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Load config from a file the user asked for explicitly.
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RouteError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Config for a scan of `root`: its `routescribe.toml` if present.
    pub fn for_directory(root: &Path) -> Self {
        Self::load(&root.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = RouteConfig::default();
        assert!(config.scan.recursive);
        assert_eq!(config.scan.max_file_size, 1024 * 1024);
        assert!(config.scan.exclude_dirs.iter().any(|d| d == "vendor"));
        assert!(!config.scan.include_tests);
        assert_eq!(config.resolve.duplicate_strategy, DuplicateStrategy::KeepFirst);
        assert!(config.resolve.handler_docs);
        assert_eq!(config.inspect.port, None);
        assert_eq!(config.inspect.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file() {
        let config: RouteConfig = toml::from_str(
            r#"
[scan]
recursive = false

[resolve]
duplicate_strategy = "merge"

[inspect]
port = 8080
"#,
        )
        .unwrap();
        assert!(!config.scan.recursive);
        assert_eq!(config.scan.max_file_size, 1024 * 1024);
        assert_eq!(config.resolve.duplicate_strategy, DuplicateStrategy::Merge);
        assert!(config.resolve.handler_docs);
        assert_eq!(config.inspect.port, Some(8080));
    }

    #[test]
    fn test_load_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(RouteConfig::for_directory(dir.path()), RouteConfig::default());

        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[resolve]\nduplicate_strategy = \"sometimes\"\n").unwrap();
        assert_eq!(RouteConfig::load(&path), RouteConfig::default());
        assert!(matches!(RouteConfig::try_load(&path), Err(RouteError::Config(_))));

        fs::write(&path, "[resolve]\nduplicate_strategy = \"replace_new\"\n").unwrap();
        assert_eq!(
            RouteConfig::try_load(&path).unwrap().resolve.duplicate_strategy,
            DuplicateStrategy::ReplaceNew
        );
        assert!(matches!(
            RouteConfig::try_load(&dir.path().join("missing.toml")),
            Err(RouteError::NotFound(_))
        ));
    }
}
