//! # Routescribe
//!
//! Endpoint documentation extracted from Go web-server source code.
//!
//! Routescribe reads Go files, recognizes route registrations written for
//! net/http, Gin, Echo, Chi, Fiber and Gorilla Mux, and folds them into one
//! de-duplicated endpoint list with a full audit of every duplicate.
//!
//! ## Key Features
//!
//! - **Syntax-aware**: registrations are read from a tree-sitter syntax tree,
//!   so commented-out routes and route-like strings are never reported
//! - **Canonical endpoints**: `/users/:id`, `/users/{id}` and `/users/{id}/`
//!   are one endpoint
//! - **Auditable**: every duplicate is recorded with the strategy applied and
//!   its outcome
//! - **Deterministic**: the same inputs in the same order give the same output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use routescribe::{ReportFormat, Routescribe};
//!
//! let scribe = Routescribe::for_directory("./server");
//! let analysis = scribe.analyze().unwrap();
//! println!("{} endpoints", analysis.endpoints.len());
//!
//! let markdown = scribe.render(&analysis, ReportFormat::Markdown).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod report;
pub mod routes;
pub mod scan;
pub mod shapes;

// Re-exports for convenience
pub use config::RouteConfig;
pub use error::{Result, RouteError};
pub use report::{ReportContext, ReportFormat};
pub use routes::{
    ConflictRecord, DuplicateStrategy, EndpointRecord, Fingerprint, HttpMethod, Outcome,
    RawDeclaration, Summary,
};
pub use scan::{analyze_directory, analyze_sources, Analysis, SourceFile};

use std::path::PathBuf;

/// A configured scan of one directory tree.
pub struct Routescribe {
    /// Directory (or single file) to scan
    root: PathBuf,
    config: RouteConfig,
}

impl Routescribe {
    pub fn new<P: Into<PathBuf>>(root: P, config: RouteConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Use the directory's `routescribe.toml`, or defaults when it has none.
    pub fn for_directory<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        let config = RouteConfig::for_directory(&root);
        Self { root, config }
    }

    /// Discover, parse and resolve every Go file under the root.
    pub fn analyze(&self) -> Result<Analysis> {
        analyze_directory(&self.root, &self.config)
    }

    /// Render an analysis. Curl examples point at the inspected server when
    /// a port is configured.
    pub fn render(&self, analysis: &Analysis, format: ReportFormat) -> Result<String> {
        let base_url = self
            .config
            .inspect
            .port
            .map(|port| format!("http://localhost:{}", port));
        let ctx = ReportContext::now().with_base_url(base_url);
        report::render(format, analysis, &ctx)
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_and_render() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.go"),
            r#"package main

func main() {
	r := mux.NewRouter()
	// Posts collection
	r.HandleFunc("/posts", handlePosts).Methods("GET", "POST")
	// router.GET("/ignored", h)
	http.ListenAndServe(":8080", r)
}
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("routescribe.toml"),
            "[resolve]\nduplicate_strategy = \"merge\"\n",
        )
        .unwrap();

        let scribe = Routescribe::for_directory(dir.path());
        assert_eq!(scribe.config().resolve.duplicate_strategy, DuplicateStrategy::Merge);

        let analysis = scribe.analyze().unwrap();
        let keys: Vec<String> = analysis
            .endpoints
            .iter()
            .map(|e| e.fingerprint.to_string())
            .collect();
        assert_eq!(keys, vec!["GET /posts", "POST /posts"]);
        assert!(analysis.conflicts.is_empty());
        assert!(analysis
            .endpoints
            .iter()
            .all(|e| e.description == "Posts collection"));

        let summary = scribe.render(&analysis, ReportFormat::Summary).unwrap();
        assert!(summary.starts_with("Endpoints: 2 (GET 1, POST 1)"));
    }
}
