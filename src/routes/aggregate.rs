//! Summary statistics over a resolved endpoint set, and data-shape attachment.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::record::{ConflictRecord, EndpointRecord};
use super::types::{DuplicateStrategy, HttpMethod, Outcome};
use crate::shapes::DataShapeProvider;

/// Counts derived from one run. Computing it never mutates its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub endpoint_count: usize,
    pub methods: BTreeMap<HttpMethod, usize>,
    pub conflict_count: usize,
    pub conflicts_by_strategy: BTreeMap<DuplicateStrategy, usize>,
    pub conflicts_by_outcome: BTreeMap<Outcome, usize>,
    /// Endpoints whose description is not the placeholder.
    pub documented_count: usize,
    /// Distinct first path segments ("/" counts as one group).
    pub route_groups: usize,
    pub data_shape_count: usize,
}

impl Summary {
    pub fn of(endpoints: &[EndpointRecord], conflicts: &[ConflictRecord]) -> Self {
        let mut methods = BTreeMap::new();
        let mut groups = BTreeSet::new();
        for ep in endpoints {
            *methods.entry(ep.method()).or_insert(0) += 1;
            groups.insert(ep.fingerprint.path.first_segment().unwrap_or("/"));
        }

        let mut conflicts_by_strategy = BTreeMap::new();
        let mut conflicts_by_outcome = BTreeMap::new();
        for conflict in conflicts {
            *conflicts_by_strategy.entry(conflict.strategy).or_insert(0) += 1;
            *conflicts_by_outcome.entry(conflict.outcome).or_insert(0) += 1;
        }

        Self {
            endpoint_count: endpoints.len(),
            methods,
            conflict_count: conflicts.len(),
            conflicts_by_strategy,
            conflicts_by_outcome,
            documented_count: endpoints.iter().filter(|e| e.is_documented()).count(),
            route_groups: groups.len(),
            data_shape_count: endpoints.iter().map(|e| e.data_shapes.len()).sum(),
        }
    }

    /// Percentage of endpoints with a real description.
    pub fn documentation_coverage(&self) -> f64 {
        if self.endpoint_count == 0 {
            return 0.0;
        }
        self.documented_count as f64 / self.endpoint_count as f64 * 100.0
    }
}

/// Ask every provider for shapes and attach them. Fingerprints, descriptions
/// and the conflict log are untouched. Returns the number of shapes attached.
pub fn attach_shapes(endpoints: &mut [EndpointRecord], providers: &[&dyn DataShapeProvider]) -> usize {
    let mut attached = 0;
    for endpoint in endpoints.iter_mut() {
        for provider in providers {
            let shapes = provider.shapes_for(endpoint);
            if shapes.is_empty() {
                continue;
            }
            debug!(
                endpoint = %endpoint.fingerprint,
                provider = provider.name(),
                count = shapes.len(),
                "attaching data shapes"
            );
            attached += shapes.len();
            endpoint.data_shapes.extend(shapes);
        }
    }
    attached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::record::DataShape;
    use crate::routes::resolve::resolve;
    use crate::routes::types::{RawDeclaration, SourcePosition};
    use crate::routes::conventions::Convention;

    fn decl(method: &str, path: &str, comment: Option<&str>) -> RawDeclaration {
        RawDeclaration {
            method: method.to_string(),
            path: path.to_string(),
            handler: "h".to_string(),
            comment: comment.map(str::to_string),
            position: SourcePosition::new("a.go", 1),
            convention: Convention::FluentMethod,
        }
    }

    #[test]
    fn test_summary_counts() {
        let res = resolve(
            vec![
                decl("GET", "/users", Some("List users")),
                decl("POST", "/users", None),
                decl("GET", "/users/", None),
                decl("GET", "/health", None),
                decl("DELETE", "/users/:id", None),
            ],
            DuplicateStrategy::ReplaceNew,
        );
        let summary = Summary::of(&res.endpoints, &res.conflicts);
        assert_eq!(summary.endpoint_count, 4);
        assert_eq!(summary.methods[&HttpMethod::Get], 2);
        assert_eq!(summary.methods[&HttpMethod::Post], 1);
        assert_eq!(summary.methods[&HttpMethod::Delete], 1);
        assert_eq!(summary.conflict_count, 1);
        assert_eq!(summary.conflicts_by_strategy[&DuplicateStrategy::ReplaceNew], 1);
        assert_eq!(summary.conflicts_by_outcome[&Outcome::KeptFirst], 1);
        assert_eq!(summary.documented_count, 1);
        assert_eq!(summary.route_groups, 2);
        assert!((summary.documentation_coverage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_idempotent_and_empty() {
        let empty = Summary::of(&[], &[]);
        assert_eq!(empty.endpoint_count, 0);
        assert_eq!(empty.documentation_coverage(), 0.0);

        let res = resolve(vec![decl("GET", "/", None)], DuplicateStrategy::KeepFirst);
        assert_eq!(
            Summary::of(&res.endpoints, &res.conflicts),
            Summary::of(&res.endpoints, &res.conflicts)
        );
        assert_eq!(Summary::of(&res.endpoints, &res.conflicts).route_groups, 1);
    }

    struct Fixed;

    impl DataShapeProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn shapes_for(&self, endpoint: &EndpointRecord) -> Vec<DataShape> {
            if endpoint.method() == HttpMethod::Get {
                vec![DataShape::new("Response", "Status response", "{\"status\": \"ok\"}")]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_attach_shapes_keeps_identity() {
        let mut res = resolve(
            vec![decl("GET", "/health", None), decl("POST", "/scan", None)],
            DuplicateStrategy::KeepFirst,
        );
        let before: Vec<_> = res.endpoints.iter().map(|e| e.fingerprint.clone()).collect();
        let attached = attach_shapes(&mut res.endpoints, &[&Fixed]);
        let after: Vec<_> = res.endpoints.iter().map(|e| e.fingerprint.clone()).collect();

        assert_eq!(attached, 1);
        assert_eq!(before, after);
        assert_eq!(res.endpoints[0].data_shapes.len(), 1);
        assert!(res.endpoints[1].data_shapes.is_empty());
        assert_eq!(Summary::of(&res.endpoints, &res.conflicts).data_shape_count, 1);
    }
}
