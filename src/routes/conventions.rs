//! Route-registration conventions. One tagged variant per call shape, each
//! answering which routes a call site declares.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{HttpMethod, RawDeclaration, SourcePosition};

// ── Call-site Shape ──────────────────────────────────────────────────────────

/// An argument as the matchers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// String literal, quotes removed
    Str(String),
    /// Identifier or selector (`getUsers`, `h.GetUsers`)
    Name(String),
    /// Anonymous function; `params` are its parameter names
    FuncLit { params: Vec<String> },
    /// Anything else, as source text
    Other(String),
}

impl CallArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CallArg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_str(&self) -> bool {
        matches!(self, CallArg::Str(_))
    }

    /// Text used as the handler name when this argument is a handler.
    pub fn handler_text(&self) -> String {
        match self {
            CallArg::Str(s) => format!("\"{}\"", s),
            CallArg::Name(n) => n.clone(),
            CallArg::FuncLit { .. } => "func literal".to_string(),
            CallArg::Other(text) => text.clone(),
        }
    }
}

/// One `.Member(args)` link of a fluent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLink {
    pub member: String,
    pub args: Vec<CallArg>,
}

impl CallLink {
    pub fn new(member: impl Into<String>, args: Vec<CallArg>) -> Self {
        Self {
            member: member.into(),
            args,
        }
    }

    fn str_arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).and_then(CallArg::as_str)
    }

    /// Path contributed to the chain's prefix by a grouping link.
    fn prefix_contribution(&self) -> Option<&str> {
        match self.member.as_str() {
            // Gin/Echo/Fiber Group("/p"), Mux PathPrefix("/p"), Chi Route("/p", fn)
            "Group" | "PathPrefix" | "Route" => self.str_arg(0),
            _ => None,
        }
    }
}

/// A complete call chain at one source location, e.g.
/// `api.HandleFunc("/users", h).Methods("GET")` is base `api` with links
/// `HandleFunc`, `Methods`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Text of the innermost receiver (`http`, `r`, `s.router`); `None` for a bare call.
    pub base: Option<String>,
    /// Prefix bound to `base` in the enclosing lexical scope.
    pub base_prefix: String,
    pub links: Vec<CallLink>,
    pub position: SourcePosition,
    /// Comment attached to the statement, if any.
    pub comment: Option<String>,
}

impl CallSite {
    pub fn last(&self) -> Option<&CallLink> {
        self.links.last()
    }

    fn find(&self, members: &[&str]) -> Option<(usize, &CallLink)> {
        self.links
            .iter()
            .enumerate()
            .find(|(_, l)| members.contains(&l.member.as_str()))
    }

    fn has(&self, member: &str) -> bool {
        self.links.iter().any(|l| l.member == member)
    }

    /// Prefix in effect before link `upto`: the scope prefix of the base plus
    /// every grouping link that precedes it.
    pub fn prefix_before(&self, upto: usize) -> String {
        links_prefix(&self.base_prefix, &self.links[..upto.min(self.links.len())])
    }

    /// Prefix of the whole chain, used when the chain is bound to a variable.
    pub fn chain_prefix(&self) -> String {
        self.prefix_before(self.links.len())
    }

    fn declaration(
        &self,
        convention: Convention,
        method: &str,
        path: String,
        handler: String,
    ) -> RawDeclaration {
        RawDeclaration {
            method: method.to_string(),
            path,
            handler,
            comment: self.comment.clone(),
            position: self.position.clone(),
            convention,
        }
    }
}

/// Prefix produced by a chain of links starting from `base_prefix`.
pub fn links_prefix(base_prefix: &str, links: &[CallLink]) -> String {
    links
        .iter()
        .filter_map(CallLink::prefix_contribution)
        .fold(base_prefix.to_string(), |acc, p| join_paths(&acc, p))
}

/// Join a group prefix and a route path with exactly one slash between them.
pub fn join_paths(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return prefix.to_string();
    }
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ── Conventions ──────────────────────────────────────────────────────────────

/// Supported route-registration call shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// `http.HandleFunc(path, handler)`, `mux.Handle(path, handler)`
    DirectHandler,
    /// `router.GET(path, handler)`, `e.POST(path, handler)`, `r.Get(path, handler)`
    FluentMethod,
    /// `r.HandleFunc(path, handler).Methods("GET", "POST")`
    MethodList,
    /// `router.Handle("PATCH", path, handler)`
    ExplicitMethod,
}

/// Members that register a handler directly (net/http, Mux without `.Methods`).
const DIRECT_MEMBERS: &[&str] = &["HandleFunc", "Handle"];

/// Members that take the method as the first positional argument.
const EXPLICIT_MEMBERS: &[&str] = &["Handle", "Add", "Method", "MethodFunc"];

/// Mux links that carry the handler when the path is given by `Path(...)`.
const MUX_HANDLER_MEMBERS: &[&str] = &["HandlerFunc", "Handler"];

/// Receivers that are HTTP clients, not routers.
const CLIENT_RECEIVERS: &[&str] = &["http", "client", "httpClient", "resty"];

impl Convention {
    /// Every convention, in matching order (first match wins).
    pub const ALL: [Convention; 4] = [
        Convention::MethodList,
        Convention::ExplicitMethod,
        Convention::FluentMethod,
        Convention::DirectHandler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Convention::DirectHandler => "direct_handler",
            Convention::FluentMethod => "fluent_method",
            Convention::MethodList => "method_list",
            Convention::ExplicitMethod => "explicit_method",
        }
    }

    /// Declarations this convention recognizes at `site`. Empty when the
    /// shape does not fit; a partial fit is never an error.
    pub fn match_site(&self, site: &CallSite) -> Vec<RawDeclaration> {
        match self {
            Convention::DirectHandler => match_direct(site),
            Convention::FluentMethod => match_fluent(site),
            Convention::MethodList => match_method_list(site),
            Convention::ExplicitMethod => match_explicit(site),
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every convention against a call site; the first one that matches wins.
pub fn match_call_site(site: &CallSite) -> Vec<RawDeclaration> {
    for convention in Convention::ALL {
        let found = convention.match_site(site);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn match_direct(site: &CallSite) -> Vec<RawDeclaration> {
    let Some(link) = site.last() else {
        return Vec::new();
    };
    if !DIRECT_MEMBERS.contains(&link.member.as_str()) || link.args.len() != 2 {
        return Vec::new();
    }
    // Methods(...) anywhere in the chain belongs to the method-list shape
    if site.has("Methods") {
        return Vec::new();
    }
    let Some(pattern) = link.str_arg(0) else {
        return Vec::new();
    };

    // Go 1.22 ServeMux patterns carry their method: "POST /items/{id}"
    let (method, path) = split_method_pattern(pattern);
    let full = join_paths(&site.prefix_before(site.links.len() - 1), path);
    vec![site.declaration(
        Convention::DirectHandler,
        method.unwrap_or("GET"),
        full,
        link.args[1].handler_text(),
    )]
}

fn split_method_pattern(pattern: &str) -> (Option<&str>, &str) {
    let trimmed = pattern.trim();
    if let Some((head, rest)) = trimmed.split_once(char::is_whitespace) {
        if HttpMethod::parse(head).is_some() && head.chars().all(|c| c.is_ascii_uppercase()) {
            return (Some(head), rest.trim_start());
        }
    }
    (None, trimmed)
}

fn match_fluent(site: &CallSite) -> Vec<RawDeclaration> {
    let Some(link) = site.last() else {
        return Vec::new();
    };
    let Some(method) = fluent_verb(&link.member) else {
        return Vec::new();
    };
    if link.args.len() < 2 {
        return Vec::new();
    }
    let Some(path) = link.str_arg(0) else {
        return Vec::new();
    };

    // PascalCase verbs are shared with HTTP clients: http.Get(url),
    // client.Post(url, "application/json", body)
    let pascal = link.member.chars().skip(1).any(|c| c.is_ascii_lowercase());
    if pascal {
        let is_client = site.links.len() == 1
            && site
                .base
                .as_deref()
                .is_some_and(|b| CLIENT_RECEIVERS.contains(&b));
        if is_client || link.args[1].is_str() {
            return Vec::new();
        }
    }

    let handler = pick_handler(&link.args[1..]);
    let full = join_paths(&site.prefix_before(site.links.len() - 1), path);
    vec![site.declaration(Convention::FluentMethod, method.as_str(), full, handler)]
}

/// Name fragments that mark a route-level middleware rather than the handler.
const MIDDLEWARE_HINTS: &[&str] = &[
    "middleware", "auth", "cors", "csrf", "gzip", "jwt", "logger", "ratelimit", "recover",
    "requestid", "timeout",
];

/// Gin puts route middleware before the handler (`r.GET(p, mw, h)`), Echo
/// after it (`e.GET(p, h, mw)`). The handler is the first argument that does
/// not look like middleware, falling back to the first one.
fn pick_handler(args: &[CallArg]) -> String {
    args.iter()
        .find(|arg| !looks_like_middleware(arg))
        .or_else(|| args.first())
        .map(CallArg::handler_text)
        .unwrap_or_default()
}

fn looks_like_middleware(arg: &CallArg) -> bool {
    let text = match arg {
        CallArg::Name(name) => name.as_str(),
        // middleware.Logger(), requireRole("admin")
        CallArg::Other(text) => text.split('(').next().unwrap_or_default(),
        _ => return false,
    };
    // "author" is a resource, not auth middleware
    let lower = text.to_ascii_lowercase().replace("author", "");
    let last = lower.rsplit('.').next().unwrap_or_default();
    last.ends_with("mw")
        || last.starts_with("require")
        || MIDDLEWARE_HINTS.iter().any(|hint| lower.contains(hint))
}

fn fluent_verb(member: &str) -> Option<HttpMethod> {
    HttpMethod::FLUENT.into_iter().find(|m| {
        let upper = m.as_str();
        if member == upper {
            return true;
        }
        // Get, Post, Delete ...
        let mut chars = upper.chars();
        chars.next().is_some_and(|first| {
            member.starts_with(first) && member[1..] == upper[1..].to_ascii_lowercase()
        })
    })
}

fn match_method_list(site: &CallSite) -> Vec<RawDeclaration> {
    let Some((_, methods_link)) = site.find(&["Methods"]) else {
        return Vec::new();
    };
    let methods: Vec<String> = methods_link
        .args
        .iter()
        .filter_map(CallArg::as_str)
        .map(|m| m.trim().to_ascii_uppercase())
        .filter(|m| !m.is_empty())
        .collect();
    if methods.is_empty() {
        return Vec::new();
    }

    // r.HandleFunc(path, h).Methods(...) or r.Path(path).HandlerFunc(h).Methods(...)
    let route = site
        .find(DIRECT_MEMBERS)
        .filter(|(_, l)| l.args.len() >= 2)
        .and_then(|(i, l)| Some((i, l.str_arg(0)?, l.args[1].handler_text())))
        .or_else(|| {
            let (i, path_link) = site.find(&["Path"])?;
            let path = path_link.str_arg(0)?;
            let handler = site
                .find(MUX_HANDLER_MEMBERS)
                .and_then(|(_, l)| l.args.first())
                .map(CallArg::handler_text)?;
            Some((i, path, handler))
        });
    let Some((route_idx, path, handler)) = route else {
        return Vec::new();
    };

    let full = join_paths(&site.prefix_before(route_idx), path);
    methods
        .iter()
        .map(|m| site.declaration(Convention::MethodList, m, full.clone(), handler.clone()))
        .collect()
}

fn match_explicit(site: &CallSite) -> Vec<RawDeclaration> {
    let Some(link) = site.last() else {
        return Vec::new();
    };
    if !EXPLICIT_MEMBERS.contains(&link.member.as_str()) || link.args.len() < 3 {
        return Vec::new();
    }
    let (Some(method), Some(path)) = (link.str_arg(0), link.str_arg(1)) else {
        return Vec::new();
    };
    let handler = pick_handler(&link.args[2..]);
    let full = join_paths(&site.prefix_before(site.links.len() - 1), path);
    vec![site.declaration(Convention::ExplicitMethod, method.trim(), full, handler)]
}
