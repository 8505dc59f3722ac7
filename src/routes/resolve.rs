//! Duplicate resolution. Folds the ordered declaration stream into one record
//! per fingerprint and logs every collision. Outcomes depend on arrival order,
//! so the fold is strictly sequential.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::fingerprint::Fingerprint;
use super::record::{is_placeholder, parts_of, ConflictRecord, EndpointRecord, DEFAULT_DESCRIPTION};
use super::types::{DuplicateStrategy, Outcome, RawDeclaration};

/// Joins descriptions under the merge strategy.
pub const MERGE_SEPARATOR: &str = "; ";

/// Decides whether an incoming description is more informative than the one
/// already on a record (used by `ReplaceNew`).
pub trait ReplacePolicy {
    fn outranks(&self, incoming: &str, existing: &str) -> bool;
}

/// Default policy: a real description beats the placeholder; otherwise the
/// strictly longer description wins. Ties keep the existing one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionLength;

impl ReplacePolicy for DescriptionLength {
    fn outranks(&self, incoming: &str, existing: &str) -> bool {
        if is_placeholder(incoming) {
            return false;
        }
        if is_placeholder(existing) {
            return true;
        }
        incoming.trim().chars().count() > existing.trim().chars().count()
    }
}

/// What a single `push` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// First time this fingerprint was seen.
    Created,
    /// Fingerprint already resolved; the strategy produced this outcome.
    Conflict(Outcome),
    /// Unknown method or empty path; not an endpoint, not a conflict.
    Dropped,
}

/// Result of folding a declaration stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// One record per fingerprint, in first-discovery order.
    pub endpoints: Vec<EndpointRecord>,
    /// Every collision, in discovery order.
    pub conflicts: Vec<ConflictRecord>,
    /// Declarations dropped before fingerprinting.
    pub dropped: usize,
}

/// The fold state. Owned by a single caller for the length of one run.
pub struct ConflictResolver<P: ReplacePolicy = DescriptionLength> {
    strategy: DuplicateStrategy,
    policy: P,
    endpoints: IndexMap<Fingerprint, EndpointRecord>,
    conflicts: Vec<ConflictRecord>,
    dropped: usize,
}

impl ConflictResolver<DescriptionLength> {
    pub fn new(strategy: DuplicateStrategy) -> Self {
        Self::with_policy(strategy, DescriptionLength)
    }
}

impl<P: ReplacePolicy> ConflictResolver<P> {
    pub fn with_policy(strategy: DuplicateStrategy, policy: P) -> Self {
        Self {
            strategy,
            policy,
            endpoints: IndexMap::new(),
            conflicts: Vec::new(),
            dropped: 0,
        }
    }

    pub fn strategy(&self) -> DuplicateStrategy {
        self.strategy
    }

    /// Number of distinct endpoints so far.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Fold one declaration into the state.
    pub fn push(&mut self, decl: RawDeclaration) -> Step {
        let Some(fingerprint) = Fingerprint::from_declaration(&decl) else {
            debug!(
                method = %decl.method,
                path = %decl.path,
                at = %decl.position,
                "dropping declaration without a valid fingerprint"
            );
            self.dropped += 1;
            return Step::Dropped;
        };

        match self.endpoints.entry(fingerprint) {
            Entry::Vacant(slot) => {
                let record = EndpointRecord::from_declaration(slot.key().clone(), &decl);
                slot.insert(record);
                Step::Created
            }
            Entry::Occupied(mut slot) => {
                let fingerprint = slot.key().clone();
                let record = slot.get_mut();
                let existing = record.clone();
                let outcome = apply_strategy(self.strategy, &self.policy, record, &decl);
                let resolved = record.clone();

                debug!(
                    %fingerprint,
                    at = %decl.position,
                    first = ?existing.origin().map(|p| p.to_string()),
                    %outcome,
                    "duplicate endpoint"
                );

                self.conflicts.push(ConflictRecord {
                    fingerprint,
                    existing,
                    incoming: decl,
                    strategy: self.strategy,
                    outcome,
                    resolved,
                });
                Step::Conflict(outcome)
            }
        }
    }

    pub fn finish(self) -> Resolution {
        Resolution {
            endpoints: self.endpoints.into_values().collect(),
            conflicts: self.conflicts,
            dropped: self.dropped,
        }
    }
}

/// Fold an ordered declaration stream with the default replace policy.
pub fn resolve<I>(declarations: I, strategy: DuplicateStrategy) -> Resolution
where
    I: IntoIterator<Item = RawDeclaration>,
{
    declarations
        .into_iter()
        .fold(ConflictResolver::new(strategy), |mut resolver, decl| {
            resolver.push(decl);
            resolver
        })
        .finish()
}

fn apply_strategy<P: ReplacePolicy>(
    strategy: DuplicateStrategy,
    policy: &P,
    record: &mut EndpointRecord,
    decl: &RawDeclaration,
) -> Outcome {
    match strategy {
        DuplicateStrategy::KeepFirst => Outcome::KeptFirst,
        DuplicateStrategy::ReplaceNew => {
            let incoming = decl.comment_text().unwrap_or(DEFAULT_DESCRIPTION);
            if !policy.outranks(incoming, &record.description) {
                return Outcome::KeptFirst;
            }
            record.description = incoming.to_string();
            record.description_parts = parts_of(incoming);
            record.handler = decl.handler.clone();
            record.sources = vec![decl.position.clone()];
            Outcome::Replaced
        }
        DuplicateStrategy::Merge => {
            if let Some(part) = merge_descriptions(&record.description_parts, decl.comment_text()) {
                record.description_parts.push(part);
                record.description = record.description_parts.join(MERGE_SEPARATOR);
            }
            record.sources.push(decl.position.clone());
            Outcome::Merged
        }
    }
}

/// The part `incoming` adds to an already merged description, if any. The
/// placeholder never takes part, and text character-identical to a part
/// already present is not repeated.
pub fn merge_descriptions(parts: &[String], incoming: Option<&str>) -> Option<String> {
    let incoming = incoming.map(str::trim).filter(|text| !is_placeholder(text))?;
    if parts.iter().any(|part| part == incoming) {
        return None;
    }
    Some(incoming.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::conventions::Convention;
    use crate::routes::types::SourcePosition;

    fn decl(method: &str, path: &str, comment: &str, handler: &str, file: &str, line: usize) -> RawDeclaration {
        RawDeclaration {
            method: method.to_string(),
            path: path.to_string(),
            handler: handler.to_string(),
            comment: if comment.is_empty() {
                None
            } else {
                Some(comment.to_string())
            },
            position: SourcePosition::new(file, line),
            convention: Convention::FluentMethod,
        }
    }

    const STRATEGIES: [DuplicateStrategy; 3] = [
        DuplicateStrategy::KeepFirst,
        DuplicateStrategy::ReplaceNew,
        DuplicateStrategy::Merge,
    ];

    #[test]
    fn test_identical_duplicate_keeps_first() {
        let input = vec![
            decl("GET", "/users", "List users", "a", "a.go", 1),
            decl("GET", "/users", "List users", "b", "b.go", 1),
        ];
        for strategy in [DuplicateStrategy::KeepFirst, DuplicateStrategy::ReplaceNew] {
            let res = resolve(input.clone(), strategy);
            assert_eq!(res.endpoints.len(), 1);
            assert_eq!(res.conflicts.len(), 1);
            assert_eq!(res.conflicts[0].outcome, Outcome::KeptFirst);
            assert_eq!(res.endpoints[0].handler, "a");
        }
    }

    #[test]
    fn test_replace_with_more_informative() {
        let input = vec![
            decl("GET", "/users", "", "listUsers", "a.go", 4),
            decl("GET", "/users", "Fetch all users", "getUsers", "b.go", 9),
        ];
        let res = resolve(input, DuplicateStrategy::ReplaceNew);
        let ep = &res.endpoints[0];
        assert_eq!(ep.description, "Fetch all users");
        assert_eq!(ep.handler, "getUsers");
        assert_eq!(ep.sources, vec![SourcePosition::new("b.go", 9)]);
        assert_eq!(res.conflicts[0].outcome, Outcome::Replaced);
        assert_eq!(res.conflicts[0].existing.description, DEFAULT_DESCRIPTION);
        assert_eq!(res.conflicts[0].resolved.description, "Fetch all users");
    }

    #[test]
    fn test_replace_ignores_shorter_or_placeholder() {
        let input = vec![
            decl("GET", "/users", "Fetch all users", "a", "a.go", 1),
            decl("GET", "/users", "Users", "b", "a.go", 2),
            decl("GET", "/users", "", "c", "a.go", 3),
        ];
        let res = resolve(input, DuplicateStrategy::ReplaceNew);
        assert_eq!(res.endpoints[0].handler, "a");
        assert!(res
            .conflicts
            .iter()
            .all(|c| c.outcome == Outcome::KeptFirst));
    }

    #[test]
    fn test_merge_descriptions() {
        let input = vec![
            decl("POST", "/users", "Create a user", "a", "a.go", 1),
            decl("POST", "/users", "Validates email", "b", "b.go", 7),
            decl("POST", "/users", "Create a user", "c", "c.go", 2),
        ];
        let res = resolve(input, DuplicateStrategy::Merge);
        let ep = &res.endpoints[0];
        assert_eq!(ep.description, "Create a user; Validates email");
        assert_eq!(ep.handler, "a");
        assert_eq!(ep.sources.len(), 3);
        assert_eq!(ep.sources[1], SourcePosition::new("b.go", 7));
        assert_eq!(res.conflicts.len(), 2);
        assert!(res.conflicts.iter().all(|c| c.outcome == Outcome::Merged));
    }

    #[test]
    fn test_merge_with_placeholder() {
        let parts = |p: &[&str]| p.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(merge_descriptions(&[], Some("Real")), Some("Real".to_string()));
        assert_eq!(merge_descriptions(&parts(&["Real"]), None), None);
        assert_eq!(merge_descriptions(&parts(&["Real"]), Some(DEFAULT_DESCRIPTION)), None);
        assert_eq!(merge_descriptions(&parts(&["A"]), Some(" A ")), None);
        assert_eq!(merge_descriptions(&parts(&["A"]), Some("B")), Some("B".to_string()));
    }

    #[test]
    fn test_merge_separator_inside_comment() {
        let input = vec![
            decl("PUT", "/items", "Create; update", "a", "a.go", 1),
            decl("PUT", "/items", "Create; update", "b", "b.go", 1),
            decl("PUT", "/items", "Create", "c", "c.go", 1),
            decl("PUT", "/items", "Create; update", "d", "d.go", 1),
        ];
        let res = resolve(input, DuplicateStrategy::Merge);
        assert_eq!(res.endpoints[0].description, "Create; update; Create");
        assert_eq!(res.conflicts[0].resolved.description, "Create; update");
        assert!(res.conflicts.iter().all(|c| c.outcome == Outcome::Merged));
    }

    #[test]
    fn test_merge_after_placeholder_and_replace() {
        let input = vec![
            decl("GET", "/a", "", "a", "a.go", 1),
            decl("GET", "/a", "One", "b", "a.go", 2),
            decl("GET", "/a", "One", "c", "a.go", 3),
            decl("GET", "/a", "Two", "d", "a.go", 4),
        ];
        let res = resolve(input, DuplicateStrategy::Merge);
        assert_eq!(res.endpoints[0].description, "One; Two");

        let mut resolver = ConflictResolver::new(DuplicateStrategy::ReplaceNew);
        resolver.push(decl("GET", "/b", "", "a", "a.go", 1));
        resolver.push(decl("GET", "/b", "Longer text", "b", "a.go", 2));
        let res = resolver.finish();
        assert_eq!(res.endpoints[0].description_parts, vec!["Longer text"]);
    }

    #[test]
    fn test_order_sensitivity() {
        let first = decl("GET", "/items", "Old listing", "oldList", "a.go", 1);
        let second = decl("GET", "/items", "New listing", "newList", "b.go", 1);

        let forward = resolve(vec![first.clone(), second.clone()], DuplicateStrategy::KeepFirst);
        let backward = resolve(vec![second, first], DuplicateStrategy::KeepFirst);

        assert_eq!(forward.endpoints[0].handler, "oldList");
        assert_eq!(backward.endpoints[0].handler, "newList");
        assert_ne!(forward.endpoints[0].description, backward.endpoints[0].description);
        assert_eq!(forward.conflicts.len(), backward.conflicts.len());
    }

    #[test]
    fn test_conflict_count_independent_of_strategy() {
        let input = vec![
            decl("GET", "/a", "", "h1", "a.go", 1),
            decl("GET", "/a/", "Alpha", "h2", "a.go", 2),
            decl("POST", "/a", "", "h3", "a.go", 3),
            decl("GET", "/b/:id", "Beta", "h4", "b.go", 1),
            decl("GET", "/b/{id}", "Beta by id", "h5", "b.go", 2),
            decl("GET", "/b/{id:int}", "", "h6", "c.go", 1),
        ];
        for strategy in STRATEGIES {
            let res = resolve(input.clone(), strategy);
            assert_eq!(res.endpoints.len(), 3, "{strategy}");
            assert_eq!(res.conflicts.len(), 3, "{strategy}");
            assert!(res.conflicts.iter().all(|c| c.strategy == strategy));
        }
    }

    #[test]
    fn test_cross_convention_duplicate() {
        let mut mux = decl("GET", "/users/{id}", "", "getUser", "b.go", 1);
        mux.convention = Convention::MethodList;
        let input = vec![decl("GET", "/users/:id", "", "showUser", "a.go", 1), mux];
        for strategy in STRATEGIES {
            let res = resolve(input.clone(), strategy);
            assert_eq!(res.endpoints.len(), 1);
            assert_eq!(res.conflicts.len(), 1);
            assert_eq!(res.endpoints[0].fingerprint.to_string(), "GET /users/{param}");
        }
    }

    #[test]
    fn test_first_discovery_order() {
        let input = vec![
            decl("GET", "/z", "", "z", "a.go", 1),
            decl("GET", "/a", "", "a", "a.go", 2),
            decl("GET", "/z", "", "z2", "a.go", 3),
            decl("DELETE", "/m", "", "m", "a.go", 4),
        ];
        let res = resolve(input, DuplicateStrategy::Merge);
        let order: Vec<String> = res.endpoints.iter().map(|e| e.fingerprint.to_string()).collect();
        assert_eq!(order, vec!["GET /z", "GET /a", "DELETE /m"]);
    }

    #[test]
    fn test_invalid_declarations_dropped() {
        let input = vec![
            decl("FETCH", "/users", "", "h", "a.go", 1),
            decl("GET", "", "", "h", "a.go", 2),
            decl("GET", "/ok", "", "h", "a.go", 3),
        ];
        let res = resolve(input, DuplicateStrategy::KeepFirst);
        assert_eq!(res.endpoints.len(), 1);
        assert_eq!(res.conflicts.len(), 0);
        assert_eq!(res.dropped, 2);
    }

    #[test]
    fn test_deterministic() {
        let input = vec![
            decl("GET", "/a", "One", "h1", "a.go", 1),
            decl("GET", "/a", "Two", "h2", "b.go", 1),
            decl("PUT", "/a", "", "h3", "b.go", 2),
        ];
        for strategy in STRATEGIES {
            let one = serde_json::to_string(&resolve(input.clone(), strategy)).unwrap();
            let two = serde_json::to_string(&resolve(input.clone(), strategy)).unwrap();
            assert_eq!(one, two);
        }
    }

    #[test]
    fn test_custom_policy() {
        struct AlwaysReplace;
        impl ReplacePolicy for AlwaysReplace {
            fn outranks(&self, _incoming: &str, _existing: &str) -> bool {
                true
            }
        }

        let mut resolver = ConflictResolver::with_policy(DuplicateStrategy::ReplaceNew, AlwaysReplace);
        assert_eq!(resolver.push(decl("GET", "/a", "Long description", "h1", "a.go", 1)), Step::Created);
        assert_eq!(
            resolver.push(decl("GET", "/a", "", "h2", "a.go", 2)),
            Step::Conflict(Outcome::Replaced)
        );
        let res = resolver.finish();
        assert_eq!(res.endpoints[0].handler, "h2");
        assert_eq!(res.endpoints[0].description, DEFAULT_DESCRIPTION);
    }
}
