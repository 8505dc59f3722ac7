//! Canonical route paths. Every placeholder syntax collapses to `{param}`,
//! empty segments and trailing slashes disappear, literals keep their case.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::conventions::Convention;

/// The single placeholder token every parameter syntax normalizes to.
pub const PARAM_TOKEN: &str = "{param}";

/// A route path in canonical, comparable form.
///
/// Empty only when the raw path was empty; such paths never reach a
/// fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any segment is a placeholder.
    pub fn has_params(&self) -> bool {
        self.0.contains(PARAM_TOKEN)
    }

    /// First path segment ("/users/{param}" -> "users"), `None` for root.
    pub fn first_segment(&self) -> Option<&str> {
        self.0.trim_start_matches('/').split('/').next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

enum Segment {
    Param,
    /// net/http `{$}` end-of-path anchor, matches nothing by itself
    Anchor,
    Literal,
}

/// Normalize a raw route path as written under `convention`.
pub fn normalize(raw: &str, convention: Convention) -> NormalizedPath {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NormalizedPath(String::new());
    }

    let path = strip_scheme_and_host(trimmed);

    let mut segments: Vec<&str> = Vec::new();
    for segment in split_segments(path) {
        if segment.is_empty() {
            continue;
        }
        match classify(segment, convention) {
            Segment::Param => segments.push(PARAM_TOKEN),
            Segment::Anchor => {}
            Segment::Literal => segments.push(segment),
        }
    }

    NormalizedPath(format!("/{}", segments.join("/")))
}

/// Drop `scheme://host[:port]` or a bare `host[:port]` from a path that does
/// not start with `/`.
fn strip_scheme_and_host(path: &str) -> &str {
    if path.starts_with('/') {
        return path;
    }
    if let Some(idx) = path.find("://") {
        let rest = &path[idx + 3..];
        return match rest.find('/') {
            Some(slash) => &rest[slash..],
            None => "/",
        };
    }
    match path.find('/') {
        Some(slash) if looks_like_host(&path[..slash]) => &path[slash..],
        None if looks_like_host(path) && path.contains(':') => "/",
        _ => path,
    }
}

/// `localhost`, `localhost:8080`, `api.example.com`, `127.0.0.1:3000`.
fn looks_like_host(segment: &str) -> bool {
    let (host, port) = match segment.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (segment, None),
    };
    if host.is_empty() || host.contains(|c: char| matches!(c, '{' | '}' | '<' | '>' | '*' | ':')) {
        return false;
    }
    if let Some(port) = port {
        if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }
    if host == "localhost" {
        return true;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return port.is_some();
    }
    let ipv4 = labels.len() == 4 && labels.iter().all(|l| l.chars().all(|c| c.is_ascii_digit()));
    let tld = labels
        .last()
        .is_some_and(|l| l.len() >= 2 && l.chars().all(|c| c.is_ascii_alphabetic()));
    ipv4 || tld
}

/// Split on `/` outside of braces, so regex placeholders like
/// `{rest:[a-z/]+}` stay one segment.
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

fn classify(segment: &str, convention: Convention) -> Segment {
    // {id}, {id:int}, {id:[0-9]+}, {path...}
    if let Some(inner) = segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
    {
        if inner == "$" && convention == Convention::DirectHandler {
            return Segment::Anchor;
        }
        let name = inner
            .split(':')
            .next()
            .unwrap_or("")
            .trim_end_matches("...");
        if !name.is_empty() && braces_balanced(inner) {
            return Segment::Param;
        }
        return Segment::Literal;
    }

    // :id (Gin, Echo, httprouter)
    if let Some(name) = segment.strip_prefix(':') {
        if is_identifier(name) {
            return Segment::Param;
        }
        return Segment::Literal;
    }

    // *filepath or bare * catch-all
    if let Some(name) = segment.strip_prefix('*') {
        if name.is_empty() || is_identifier(name) {
            return Segment::Param;
        }
    }

    Segment::Literal
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn braces_balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(p: &str) -> String {
        normalize(p, Convention::FluentMethod).as_str().to_string()
    }

    #[test]
    fn test_placeholder_styles_collapse() {
        assert_eq!(norm("/users/:id"), "/users/{param}");
        assert_eq!(norm("/users/{id}"), "/users/{param}");
        assert_eq!(norm("/users/{id:int}"), "/users/{param}");
        assert_eq!(norm("/users/{id:[0-9]+}"), "/users/{param}");
        assert_eq!(norm("/files/*filepath"), "/files/{param}");
        assert_eq!(norm("/static/*"), "/static/{param}");
        assert_eq!(norm("/files/{path...}"), "/files/{param}");
        assert_eq!(
            norm("/items/{item_id}/comments/:cid"),
            "/items/{param}/comments/{param}"
        );
    }

    #[test]
    fn test_slashes_collapse() {
        assert_eq!(norm("/users/"), "/users");
        assert_eq!(norm("/users"), "/users");
        assert_eq!(norm("//api///v1//users/"), "/api/v1/users");
        assert_eq!(norm("users"), "/users");
        assert_eq!(norm("/"), "/");
    }

    #[test]
    fn test_literal_case_preserved() {
        assert_eq!(norm("/Users/Profile"), "/Users/Profile");
        assert_ne!(norm("/Users"), norm("/users"));
    }

    #[test]
    fn test_scheme_and_host_stripped() {
        assert_eq!(norm("http://localhost:8080/users"), "/users");
        assert_eq!(norm("https://api.example.com"), "/");
        assert_eq!(norm("localhost:8080/users"), "/users");
        assert_eq!(norm("localhost/users/:id"), "/users/{param}");
        assert_eq!(norm("127.0.0.1:3000/health"), "/health");
        assert_eq!(norm("api.example.com/v1/items"), "/v1/items");
        assert_eq!(norm("localhost:8080"), "/");
    }

    #[test]
    fn test_relative_paths_keep_first_segment() {
        assert_eq!(norm("users/:id"), "/users/{param}");
        assert_eq!(norm("v1.0/users"), "/v1.0/users");
        assert_eq!(norm(":id/edit"), "/{param}/edit");
        assert_eq!(norm("report.pdf"), "/report.pdf");
    }

    #[test]
    fn test_unrecognized_placeholder_is_literal() {
        assert_eq!(norm("/files/{}"), "/files/{}");
        assert_eq!(norm("/files/:id.json"), "/files/:id.json");
        assert_eq!(norm("/files/file.{ext}"), "/files/file.{ext}");
    }

    #[test]
    fn test_regex_placeholder_with_slash() {
        assert_eq!(norm("/docs/{rest:[a-z/]+}"), "/docs/{param}");
    }

    #[test]
    fn test_end_anchor_only_for_direct_handler() {
        assert_eq!(
            normalize("/{$}", Convention::DirectHandler).as_str(),
            "/"
        );
        assert_eq!(
            normalize("/items/{$}", Convention::DirectHandler).as_str(),
            "/items"
        );
    }

    #[test]
    fn test_empty_path() {
        assert!(normalize("", Convention::DirectHandler).is_empty());
        assert!(normalize("   ", Convention::MethodList).is_empty());
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "/users/:id",
            "/users/{id:int}/",
            "//a//b/",
            "http://host/x/{y}",
            "/files/{}",
            "/a{b/c",
            "/docs/{rest:[a-z/]+}",
            "/Mixed/Case/*path",
            "relative/path",
            "/",
        ];
        for convention in Convention::ALL {
            for raw in samples {
                let once = normalize(raw, convention);
                let twice = normalize(once.as_str(), convention);
                assert_eq!(once, twice, "not idempotent for {raw:?}");
            }
        }
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(norm_path("/users/{param}").first_segment(), Some("users"));
        assert_eq!(norm_path("/").first_segment(), None);
    }

    fn norm_path(p: &str) -> NormalizedPath {
        normalize(p, Convention::MethodList)
    }
}
