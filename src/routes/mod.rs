//! Route extraction core: conventions, normalization, fingerprints,
//! duplicate resolution and aggregation.

pub mod aggregate;
pub mod conventions;
pub mod fingerprint;
pub mod normalize;
pub mod record;
pub mod resolve;
pub mod types;

pub use aggregate::{attach_shapes, Summary};
pub use conventions::{match_call_site, CallArg, CallLink, CallSite, Convention};
pub use fingerprint::Fingerprint;
pub use normalize::{normalize, NormalizedPath, PARAM_TOKEN};
pub use record::{ConflictRecord, DataShape, EndpointRecord, DEFAULT_DESCRIPTION};
pub use resolve::{resolve, ConflictResolver, DescriptionLength, ReplacePolicy, Resolution, Step};
pub use types::{DuplicateStrategy, HttpMethod, Outcome, RawDeclaration, SourcePosition};
