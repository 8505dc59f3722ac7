//! Resolved endpoints and the conflict audit log.

use serde::{Deserialize, Serialize};

use super::fingerprint::Fingerprint;
use super::types::{DuplicateStrategy, HttpMethod, Outcome, RawDeclaration, SourcePosition};

/// Description given to endpoints that have no comment.
pub const DEFAULT_DESCRIPTION: &str = "Handler function";

/// Whether a description carries no information of its own.
pub fn is_placeholder(description: &str) -> bool {
    let d = description.trim();
    d.is_empty() || d == DEFAULT_DESCRIPTION
}

/// The parts list for a fresh description.
pub(crate) fn parts_of(description: &str) -> Vec<String> {
    if is_placeholder(description) {
        Vec::new()
    } else {
        vec![description.trim().to_string()]
    }
}

/// A request or response body shape attached to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataShape {
    pub name: String,
    pub description: String,
    pub shape: String,
}

impl DataShape {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        shape: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            shape: shape.into(),
        }
    }
}

/// A resolved, de-duplicated endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub fingerprint: Fingerprint,
    /// Path as written (with group prefix), not normalized.
    pub display_path: String,
    pub description: String,
    /// Distinct descriptions that make up `description`, in arrival order.
    /// Empty while the description is the placeholder.
    #[serde(skip)]
    pub description_parts: Vec<String>,
    pub handler: String,
    /// First entry is the originating declaration; merges append.
    pub sources: Vec<SourcePosition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_shapes: Vec<DataShape>,
}

impl EndpointRecord {
    /// Create the record for a fingerprint's first declaration.
    pub fn from_declaration(fingerprint: Fingerprint, decl: &RawDeclaration) -> Self {
        let description = decl.comment_text().unwrap_or(DEFAULT_DESCRIPTION);
        Self {
            fingerprint,
            display_path: decl.path.trim().to_string(),
            description: description.to_string(),
            description_parts: parts_of(description),
            handler: decl.handler.clone(),
            sources: vec![decl.position.clone()],
            data_shapes: Vec::new(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.fingerprint.method
    }

    /// The position that created this record.
    pub fn origin(&self) -> Option<&SourcePosition> {
        self.sources.first()
    }

    /// Whether the description is more than the placeholder.
    pub fn is_documented(&self) -> bool {
        !is_placeholder(&self.description)
    }

    /// `curl /path` for GET, `curl -X METHOD /path` otherwise.
    pub fn curl_example(&self, base_url: Option<&str>) -> String {
        let url = match base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), self.display_path),
            None => self.display_path.clone(),
        };
        match self.method() {
            HttpMethod::Get => format!("curl {}", url),
            method => format!("curl -X {} {}", method, url),
        }
    }
}

/// One fingerprint collision, with the record before and after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub fingerprint: Fingerprint,
    pub existing: EndpointRecord,
    pub incoming: RawDeclaration,
    pub strategy: DuplicateStrategy,
    pub outcome: Outcome,
    pub resolved: EndpointRecord,
}
