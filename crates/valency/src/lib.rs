#![forbid(unsafe_code)]
//! valency: orbital adjacency caching, subgraph pattern matching, and socket-driven growth
//! for procedural module placement.
//!
//! Modules:
//! - orbital: direction-to-orbital assignment and the per-node orbital neighbor cache
//! - rules: compiled modules, sockets, bounds, and patterns
//! - matching: pattern discovery, overlap resolution, claiming, annotation, rewrite plans
//! - growth: seeds, frontier strategies, budgets, and the placement loop
//!
//! For a walkthrough, see the README.
pub mod error;
pub mod events;
pub mod graph;
pub mod growth;
pub mod matching;
pub mod orbital;
pub mod rng;
pub mod rules;

#[cfg(test)]
mod test_support;

/// Convenient re-exports for common types. Import with `use valency::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::events::{
        EventSink, FnSink, MultiSink, ValencyEvent, ValencyEventKind, VecSink,
    };
    pub use crate::graph::{Edge, NodeState};
    pub use crate::growth::{
        GrowthBudget, GrowthConfig, GrowthEngine, GrowthResult, GrowthStrategy, PlacedModule,
        PlacedOutput, SeedPoint, Termination,
    };
    pub use crate::matching::{
        AnnotationPolicy, ClaimedNodes, MatchResult, MatcherConfig, NodeAnnotations,
        OverlapResolution, PatternFilter, PatternMatch, PatternMatcher, RewritePlan,
    };
    pub use crate::orbital::{OrbitalCache, OrbitalSet};
    pub use crate::rules::{
        Aabb, CompiledBondingRules, CompiledPattern, CompiledPatternSet, CompiledSocket,
        LayerMasks, ModuleDefinition, ModuleIndex, OutputStrategy, PatternEntry,
        PatternSettings, SocketRules, TransformMode,
    };
}
