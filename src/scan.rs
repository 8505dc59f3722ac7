//! File discovery and the end-to-end scan pipeline.

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{RouteConfig, ScanConfig};
use crate::error::{Result, RouteError};
use crate::parser::{extract_file, is_go_file, FileExtraction, HandlerIndex};
use crate::routes::{attach_shapes, resolve, ConflictRecord, EndpointRecord, RawDeclaration, Summary};
use crate::shapes::{DataShapeProvider, InferredShapes, LiveInspector};

/// A Go source file held in memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// A file that was found but not analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Files selected for a scan, in lexicographic path order.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// Everything one run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub endpoints: Vec<EndpointRecord>,
    pub conflicts: Vec<ConflictRecord>,
    pub summary: Summary,
    pub skipped: Vec<SkippedFile>,
    pub files_scanned: usize,
    /// Declarations with an unknown method or an empty path.
    pub dropped: usize,
}

impl Analysis {
    /// Run extra shape providers over the endpoints and refresh the summary.
    pub fn attach(&mut self, providers: &[&dyn DataShapeProvider]) -> usize {
        let attached = attach_shapes(&mut self.endpoints, providers);
        self.summary = Summary::of(&self.endpoints, &self.conflicts);
        attached
    }
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"))
}

/// Find the Go files under `root`.
///
/// Respects .gitignore and `.routescribeignore`, never enters the configured
/// excluded directories, and skips `_test.go` files unless asked to.
pub fn discover_files(root: &Path, config: &ScanConfig) -> Result<Discovery> {
    if !root.exists() {
        return Err(RouteError::NotFound(root.to_path_buf()));
    }

    let mut discovery = Discovery::default();
    if root.is_file() {
        if is_go_file(root) {
            discovery.files.push(root.to_path_buf());
        }
        return Ok(discovery);
    }

    let excluded = config.exclude_dirs.clone();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .add_custom_ignore_filename(".routescribeignore")
        .max_depth(if config.recursive { None } else { Some(1) })
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry.depth() > 0
                && excluded.iter().any(|d| entry.file_name() == d.as_str()))
        })
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !is_go_file(entry.path()) {
            continue;
        }
        let path = entry.into_path();
        if !config.include_tests && is_test_file(&path) {
            debug!(file = %path.display(), "skipping test file");
            continue;
        }

        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if size > config.max_file_size {
            warn!(file = %path.display(), size, limit = config.max_file_size, "file too large");
            discovery.skipped.push(SkippedFile {
                path,
                reason: format!("larger than {} bytes", config.max_file_size),
            });
            continue;
        }
        discovery.files.push(path);
    }

    // full-path string order, so "a-b/x.go" comes before "a/x.go"
    discovery
        .files
        .sort_by_cached_key(|p| p.to_string_lossy().into_owned());
    Ok(discovery)
}

/// Read files in parallel, keeping their order.
pub fn read_sources(files: &[PathBuf]) -> (Vec<SourceFile>, Vec<SkippedFile>) {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, fs::read_to_string(path)))
        .collect();

    let mut sources = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (path, result) in results {
        match result {
            Ok(text) => sources.push(SourceFile::new(path.clone(), text)),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "unreadable file");
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (sources, skipped)
}

/// Parse every source in parallel. Results come back in input order.
pub fn extract_all(sources: &[SourceFile], threads: usize) -> (Vec<FileExtraction>, Vec<SkippedFile>) {
    let run = || -> Vec<_> {
        sources
            .par_iter()
            .map(|s| (s, extract_file(&s.path, &s.text)))
            .collect()
    };

    let results = if threads > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!(threads, error = %e, "falling back to the global thread pool");
                run()
            }
        }
    } else {
        run()
    };

    let mut extractions = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (source, result) in results {
        match result {
            Ok(extraction) => extractions.push(extraction),
            Err(e) => {
                warn!(file = %source.path.display(), error = %e, "skipping file");
                skipped.push(SkippedFile {
                    path: source.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (extractions, skipped)
}

/// Analyze in-memory sources. Sources are processed in the order given.
pub fn analyze_sources(sources: &[SourceFile], config: &RouteConfig) -> Analysis {
    let (extractions, skipped) = extract_all(sources, config.scan.threads);
    analyze_extractions(&extractions, skipped, config)
}

fn analyze_extractions(
    extractions: &[FileExtraction],
    skipped: Vec<SkippedFile>,
    config: &RouteConfig,
) -> Analysis {
    let index = HandlerIndex::build(extractions);
    let mut declarations: Vec<RawDeclaration> = extractions
        .iter()
        .flat_map(|e| e.declarations.iter().cloned())
        .collect();

    if config.resolve.handler_docs {
        let filled = index.fill_descriptions(&mut declarations);
        debug!(filled, "descriptions taken from handler docs");
    }

    let declared = declarations.len();
    let resolution = resolve(declarations, config.resolve.duplicate_strategy);
    let mut analysis = Analysis {
        summary: Summary::default(),
        endpoints: resolution.endpoints,
        conflicts: resolution.conflicts,
        skipped,
        files_scanned: extractions.len(),
        dropped: resolution.dropped,
    };

    let inferred = InferredShapes::new(&index);
    analysis.attach(&[&inferred]);

    info!(
        files = analysis.files_scanned,
        declarations = declared,
        endpoints = analysis.endpoints.len(),
        conflicts = analysis.conflicts.len(),
        strategy = %config.resolve.duplicate_strategy,
        "analysis complete"
    );
    analysis
}

/// Discover, parse and resolve every Go file under `root`. When a port is
/// configured, a live server is inspected as well; an unreachable server
/// is logged and otherwise ignored.
pub fn analyze_directory(root: &Path, config: &RouteConfig) -> Result<Analysis> {
    let discovery = discover_files(root, &config.scan)?;
    info!(root = %root.display(), files = discovery.files.len(), "scanning");

    let (sources, mut skipped) = read_sources(&discovery.files);
    skipped.extend(discovery.skipped);

    let mut analysis = analyze_sources(&sources, config);
    analysis.skipped.extend(skipped);
    analysis.skipped.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(port) = config.inspect.port {
        match LiveInspector::connect(port, config.inspect.timeout()) {
            Ok(inspector) => {
                let attached = analysis.attach(&[&inspector]);
                info!(url = inspector.base_url(), attached, "live inspection done");
            }
            Err(e) => warn!(port, error = %e, "live inspection skipped"),
        }
    }
    Ok(analysis)
}
