//! Core value types: methods, positions, raw declarations and strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::conventions::Convention;
use crate::error::RouteError;

/// HTTP verbs a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Connect,
    Trace,
}

impl HttpMethod {
    /// Verbs accepted as fluent router members (`r.GET`, `e.POST`).
    pub const FLUENT: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a method name, ignoring ASCII case. Returns `None` for anything
    /// that is not a standard verb.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
            HttpMethod::Patch,
            HttpMethod::Options,
            HttpMethod::Head,
            HttpMethod::Connect,
            HttpMethod::Trace,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a declaration was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    pub line: usize,
}

impl SourcePosition {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Short display: "routes.go:12"
    pub fn display_short(&self) -> String {
        let fname = self
            .file
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file.display().to_string());
        format!("{}:{}", fname, self.line)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// One route registration as written in source, before resolution.
///
/// `path` already carries any group/subrouter prefix in effect at the call
/// site. `method` is kept verbatim so that unrecognized verbs can be dropped
/// by the resolver instead of by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeclaration {
    pub method: String,
    pub path: String,
    pub handler: String,
    pub comment: Option<String>,
    pub position: SourcePosition,
    pub convention: Convention,
}

impl RawDeclaration {
    /// The adjacent comment, treating whitespace-only text as absent.
    pub fn comment_text(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// What to do when a fingerprint is seen again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStrategy {
    #[default]
    KeepFirst,
    ReplaceNew,
    Merge,
}

impl DuplicateStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateStrategy::KeepFirst => "keep_first",
            DuplicateStrategy::ReplaceNew => "replace_new",
            DuplicateStrategy::Merge => "merge",
        }
    }
}

impl fmt::Display for DuplicateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicateStrategy {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_first" | "first" | "keep" => Ok(DuplicateStrategy::KeepFirst),
            "replace_new" | "replace" => Ok(DuplicateStrategy::ReplaceNew),
            "merge" => Ok(DuplicateStrategy::Merge),
            _ => Err(RouteError::InvalidStrategy(s.to_string())),
        }
    }
}

/// What actually happened to a record on a fingerprint collision.
///
/// Differs from the strategy: `ReplaceNew` falls back to `KeptFirst` when the
/// incoming description is not more informative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    KeptFirst,
    Replaced,
    Merged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::KeptFirst => "Kept First",
            Outcome::Replaced => "Replaced With New",
            Outcome::Merged => "Merged Descriptions",
        })
    }
}
