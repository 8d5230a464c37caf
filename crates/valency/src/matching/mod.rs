//! Pattern matching over solved graphs: discovery, overlap resolution, claiming,
//! annotation, and rewrite planning.
pub mod annotate;
pub mod matcher;
pub mod rewrite;

pub use annotate::{AnnotationPolicy, NodeAnnotations};
pub use matcher::{
    ClaimedNodes, MatchResult, MatcherConfig, OverlapResolution, PatternFilter, PatternMatch,
    PatternMatcher,
};
pub use rewrite::RewritePlan;
