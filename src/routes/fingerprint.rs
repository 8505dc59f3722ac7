//! Endpoint identity: (HTTP method, normalized path).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::conventions::Convention;
use super::normalize::{normalize, NormalizedPath};
use super::types::{HttpMethod, RawDeclaration};

/// The unique key of an endpoint. Handler, description and file never take
/// part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub method: HttpMethod,
    pub path: NormalizedPath,
}

impl Fingerprint {
    /// Fingerprint a method and raw path. `None` when the method is not a
    /// known verb or the path normalizes to nothing.
    pub fn of(method: &str, raw_path: &str, convention: Convention) -> Option<Self> {
        let method = HttpMethod::parse(method)?;
        let path = normalize(raw_path, convention);
        if path.is_empty() {
            return None;
        }
        Some(Self { method, path })
    }

    pub fn from_declaration(decl: &RawDeclaration) -> Option<Self> {
        Self::of(&decl.method, &decl.path, decl.convention)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convention_independent() {
        let colon = Fingerprint::of("GET", "/users/:id", Convention::FluentMethod);
        let brace = Fingerprint::of("GET", "/users/{id}", Convention::MethodList);
        let typed = Fingerprint::of("GET", "/users/{id:int}", Convention::DirectHandler);
        assert!(colon.is_some());
        assert_eq!(colon, brace);
        assert_eq!(brace, typed);
        assert_eq!(colon.unwrap().to_string(), "GET /users/{param}");
    }

    #[test]
    fn test_method_distinguishes() {
        let get = Fingerprint::of("GET", "/posts", Convention::MethodList);
        let post = Fingerprint::of("POST", "/posts", Convention::MethodList);
        assert_ne!(get, post);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Fingerprint::of("FETCH", "/users", Convention::ExplicitMethod).is_none());
        assert!(Fingerprint::of("GET", "", Convention::FluentMethod).is_none());
        assert!(Fingerprint::of("GET", "  ", Convention::FluentMethod).is_none());
    }

    #[test]
    fn test_trailing_slash_same_endpoint() {
        assert_eq!(
            Fingerprint::of("GET", "/users/", Convention::DirectHandler),
            Fingerprint::of("GET", "/users", Convention::FluentMethod)
        );
    }
}
