//! Subgraph pattern matching over a solved graph.
//!
//! [`PatternMatcher`] binds every pattern entry to a distinct node by walking the pattern's
//! adjacency links through an [`OrbitalCache`]. Exclusive patterns are searched first, then
//! additive ones. All matches are then ordered by [`OverlapResolution`], and an exclusive
//! matcher claims nodes for exclusive matches in that order.
use std::collections::{BTreeSet, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::events::{EventSink, ValencyEvent, ValencyEventKind};
use crate::graph::NodeState;
use crate::matching::annotate::{AnnotationPolicy, NodeAnnotations};
use crate::orbital::OrbitalCache;
use crate::rules::{CompiledPattern, CompiledPatternSet, PatternSettings};

const UNBOUND: usize = usize::MAX;

/// Order in which overlapping matches compete for claims.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlapResolution {
    /// Higher pattern weight first.
    #[default]
    WeightBased,
    /// More entries first.
    LargestFirst,
    /// Fewer entries first.
    SmallestFirst,
    /// Discovery order.
    FirstDefined,
}

/// Selects which patterns a matcher considers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternFilter {
    /// Every listed tag must be present on the pattern.
    pub required_tags: Vec<String>,
    /// No listed tag may be present on the pattern.
    pub excluded_tags: Vec<String>,
    /// When non-empty, only these pattern names are considered.
    pub pattern_names: Vec<String>,
}

impl PatternFilter {
    pub fn is_empty(&self) -> bool {
        self.required_tags.is_empty() && self.excluded_tags.is_empty() && self.pattern_names.is_empty()
    }

    pub fn allows(&self, settings: &PatternSettings) -> bool {
        if !self.pattern_names.is_empty() && !self.pattern_names.contains(&settings.name) {
            return false;
        }
        self.required_tags.iter().all(|t| settings.has_tag(t))
            && !self.excluded_tags.iter().any(|t| settings.has_tag(t))
    }
}

/// Configuration for a [`PatternMatcher`].
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherConfig {
    pub overlap_resolution: OverlapResolution,
    /// Whether this matcher claims nodes for exclusive matches.
    pub exclusive: bool,
    pub annotation_policy: AnnotationPolicy,
    pub filter: PatternFilter,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            overlap_resolution: OverlapResolution::WeightBased,
            exclusive: true,
            annotation_policy: AnnotationPolicy::ClaimedOrAdditive,
            filter: PatternFilter::default(),
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overlap resolution.
    pub fn with_overlap_resolution(mut self, overlap_resolution: OverlapResolution) -> Self {
        self.overlap_resolution = overlap_resolution;
        self
    }

    /// Sets whether matches claim their nodes exclusively.
    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Sets the annotation policy.
    pub fn with_annotation_policy(mut self, annotation_policy: AnnotationPolicy) -> Self {
        self.annotation_policy = annotation_policy;
        self
    }

    /// Sets the pattern filter.
    pub fn with_filter(mut self, filter: PatternFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Nodes owned by exclusive matches. Shared by all matchers that run over one cluster;
/// it only ever grows during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimedNodes {
    nodes: HashSet<usize>,
}

impl ClaimedNodes {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    pub fn claim(&mut self, node: usize) -> bool {
        self.nodes.insert(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Claimed nodes in ascending order.
    pub fn sorted(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self.nodes.iter().copied().collect();
        nodes.sort_unstable();
        nodes
    }
}

/// One occurrence of a pattern.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern_index: usize,
    /// Node bound to each entry, in entry order.
    pub entry_to_node: Vec<usize>,
    pub claimed: bool,
}

impl PatternMatch {
    /// Nodes bound to active entries.
    pub fn active_nodes<'a>(&'a self, pattern: &'a CompiledPattern) -> impl Iterator<Item = usize> + 'a {
        pattern.active_entries().map(|e| self.entry_to_node[e])
    }
}

/// Summary of a matching pass.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Distinct patterns with at least one annotated match.
    pub patterns_matched: usize,
    /// Distinct nodes covered by active entries of annotated matches.
    pub nodes_annotated: usize,
    /// `(pattern_index, effective_count)` for patterns below their minimum.
    pub min_match_violations: Vec<(usize, u32)>,
    /// Patterns whose effective count reached their maximum.
    pub max_match_limit_reached: Vec<usize>,
}

impl MatchResult {
    pub fn satisfies_minimums(&self) -> bool {
        self.min_match_violations.is_empty()
    }
}

pub struct PatternMatcher<'a> {
    config: MatcherConfig,
    patterns: &'a CompiledPatternSet,
    cache: &'a OrbitalCache,
    states: &'a [NodeState],
    matches: Vec<PatternMatch>,
}

impl<'a> PatternMatcher<'a> {
    /// Creates a matcher for one cluster.
    ///
    /// Fails when a pattern is malformed or `states` does not cover every cache node.
    pub fn try_new(
        config: MatcherConfig,
        patterns: &'a CompiledPatternSet,
        cache: &'a OrbitalCache,
        states: &'a [NodeState],
    ) -> Result<Self> {
        config.validate()?;
        patterns.validate()?;
        if states.len() != cache.num_nodes() {
            return Err(Error::SizeMismatch {
                what: "node states",
                expected: cache.num_nodes(),
                actual: states.len(),
            });
        }
        Ok(Self {
            config,
            patterns,
            cache,
            states,
            matches: Vec::new(),
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn patterns(&self) -> &CompiledPatternSet {
        self.patterns
    }

    /// Matches from the last run, in resolved order.
    pub fn matches(&self) -> &[PatternMatch] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<PatternMatch> {
        self.matches
    }

    pub fn run(&mut self, claimed: &mut ClaimedNodes) -> MatchResult {
        self.run_with_events(claimed, &mut ())
    }

    /// Finds, orders, and claims matches. Results of an earlier run are discarded.
    pub fn run_with_events(&mut self, claimed: &mut ClaimedNodes, sink: &mut dyn EventSink) -> MatchResult {
        self.matches.clear();

        let mut exclusive = Vec::new();
        let mut additive = Vec::new();
        for (index, pattern) in self.patterns.patterns.iter().enumerate() {
            if !self.config.filter.allows(&pattern.settings) {
                debug!("Pattern '{}' excluded by filter.", pattern.name());
                if sink.wants(ValencyEventKind::PatternSkipped) {
                    sink.send(ValencyEvent::PatternSkipped {
                        pattern: pattern.name().to_owned(),
                    });
                }
                continue;
            }
            if pattern.settings.exclusive {
                exclusive.push(index);
            } else {
                additive.push(index);
            }
        }

        for &index in exclusive.iter().chain(&additive) {
            self.find_matches(index, claimed, sink);
        }

        self.resolve_overlaps();
        if self.config.exclusive {
            self.claim(claimed, sink);
        }

        let mut result = MatchResult::default();
        self.check_match_limits(&exclusive, &additive, &mut result);

        let policy = self.config.annotation_policy;
        let mut patterns_matched = BTreeSet::new();
        let mut nodes = HashSet::new();
        for m in &self.matches {
            let pattern = &self.patterns.patterns[m.pattern_index];
            if !policy.includes(m, pattern) {
                continue;
            }
            patterns_matched.insert(m.pattern_index);
            nodes.extend(m.active_nodes(pattern));
        }
        result.patterns_matched = patterns_matched.len();
        result.nodes_annotated = nodes.len();

        info!(
            "Matching found {} matches across {} patterns; {} nodes annotated, {} claimed.",
            self.matches.len(),
            result.patterns_matched,
            result.nodes_annotated,
            claimed.len()
        );

        result
    }

    /// Per-node annotations of the last run under the configured policy.
    pub fn annotate(&self) -> NodeAnnotations {
        NodeAnnotations::from_matches(
            self.states.len(),
            self.patterns,
            &self.matches,
            self.config.annotation_policy,
        )
    }

    fn find_matches(&mut self, pattern_index: usize, claimed: &ClaimedNodes, sink: &mut dyn EventSink) {
        let pattern = &self.patterns.patterns[pattern_index];
        let root = &pattern.entries[0];
        let max = pattern.settings.max_matches.map(|m| m as usize);
        let mut found = 0usize;

        for node in 0..self.states.len() {
            if max.is_some_and(|max| found >= max) {
                break;
            }
            if pattern.settings.exclusive && claimed.contains(node) {
                continue;
            }
            if !root.accepts(self.states[node]) || !root.boundary_clear(self.cache.orbital_mask(node)) {
                continue;
            }
            let Some(entry_to_node) = self.try_match_from(pattern, node) else {
                continue;
            };

            if sink.wants(ValencyEventKind::MatchFound) {
                sink.send(ValencyEvent::MatchFound {
                    pattern: pattern.name().to_owned(),
                    pattern_index,
                    nodes: entry_to_node.clone(),
                });
            }
            self.matches.push(PatternMatch {
                pattern_index,
                entry_to_node,
                claimed: false,
            });
            found += 1;
        }

        debug!("Pattern '{}': {} matches.", pattern.name(), found);
    }

    fn try_match_from(&self, pattern: &CompiledPattern, root: usize) -> Option<Vec<usize>> {
        let mut entry_to_node = vec![UNBOUND; pattern.entries.len()];
        entry_to_node[0] = root;

        if !self.bind_from(pattern, 0, &mut entry_to_node) || entry_to_node.contains(&UNBOUND) {
            return None;
        }
        debug_assert!(self.verify(pattern, &entry_to_node));
        Some(entry_to_node)
    }

    /// Depth-first binding of the entries adjacent to `entry`. Every orbital has at most
    /// one neighbor, so the binding from a root is unique and the first failed link
    /// rejects it.
    fn bind_from(&self, pattern: &CompiledPattern, entry: usize, entry_to_node: &mut [usize]) -> bool {
        let current = entry_to_node[entry];

        for adj in &pattern.entries[entry].adjacency {
            let target = adj.target_entry;
            let neighbor = self.cache.neighbor_at_orbital(current, adj.source_orbital as usize);

            if entry_to_node[target] != UNBOUND {
                if neighbor != Some(entry_to_node[target]) {
                    return false;
                }
                continue;
            }

            let Some(neighbor) = neighbor else {
                return false;
            };
            // Matches are node-injective.
            if entry_to_node.contains(&neighbor) {
                return false;
            }
            if !self.node_satisfies(pattern, target, neighbor)
                || self.cache.neighbor_at_orbital(neighbor, adj.target_orbital as usize) != Some(current)
            {
                return false;
            }

            entry_to_node[target] = neighbor;
            if !self.bind_from(pattern, target, entry_to_node) {
                return false;
            }
        }

        true
    }

    fn node_satisfies(&self, pattern: &CompiledPattern, entry: usize, node: usize) -> bool {
        let entry = &pattern.entries[entry];
        entry.accepts(self.states[node]) && entry.boundary_clear(self.cache.orbital_mask(node))
    }

    /// Every adjacency link holds in both directions for a complete binding.
    fn verify(&self, pattern: &CompiledPattern, entry_to_node: &[usize]) -> bool {
        pattern.entries.iter().enumerate().all(|(e, entry)| {
            let node = entry_to_node[e];
            self.node_satisfies(pattern, e, node)
                && entry.adjacency.iter().all(|adj| {
                    let other = entry_to_node[adj.target_entry];
                    self.cache.neighbor_at_orbital(node, adj.source_orbital as usize) == Some(other)
                        && self.cache.neighbor_at_orbital(other, adj.target_orbital as usize) == Some(node)
                })
        })
    }

    fn resolve_overlaps(&mut self) {
        let patterns = &self.patterns.patterns;
        match self.config.overlap_resolution {
            OverlapResolution::WeightBased => self.matches.sort_by(|a, b| {
                let wa = patterns[a.pattern_index].settings.weight;
                let wb = patterns[b.pattern_index].settings.weight;
                wb.total_cmp(&wa)
            }),
            OverlapResolution::LargestFirst => self
                .matches
                .sort_by(|a, b| b.entry_to_node.len().cmp(&a.entry_to_node.len())),
            OverlapResolution::SmallestFirst => self
                .matches
                .sort_by(|a, b| a.entry_to_node.len().cmp(&b.entry_to_node.len())),
            OverlapResolution::FirstDefined => {}
        }
    }

    fn claim(&mut self, claimed: &mut ClaimedNodes, sink: &mut dyn EventSink) {
        for (index, m) in self.matches.iter_mut().enumerate() {
            let pattern = &self.patterns.patterns[m.pattern_index];
            if !pattern.settings.exclusive {
                continue;
            }
            if m.active_nodes(pattern).any(|n| claimed.contains(n)) {
                if sink.wants(ValencyEventKind::MatchRejected) {
                    sink.send(ValencyEvent::MatchRejected {
                        pattern: pattern.name().to_owned(),
                        match_index: index,
                    });
                }
                continue;
            }

            let nodes: Vec<usize> = m.active_nodes(pattern).collect();
            for &n in &nodes {
                claimed.claim(n);
            }
            m.claimed = true;
            if sink.wants(ValencyEventKind::MatchClaimed) {
                sink.send(ValencyEvent::MatchClaimed {
                    pattern: pattern.name().to_owned(),
                    match_index: index,
                    nodes,
                });
            }
        }
    }

    /// Effective counts include only claimed matches for exclusive patterns.
    fn check_match_limits(&self, exclusive: &[usize], additive: &[usize], result: &mut MatchResult) {
        let mut counts = vec![0u32; self.patterns.len()];
        for m in &self.matches {
            let pattern = &self.patterns.patterns[m.pattern_index];
            if pattern.settings.exclusive && !m.claimed {
                continue;
            }
            counts[m.pattern_index] += 1;
        }

        let mut considered: Vec<usize> = exclusive.iter().chain(additive).copied().collect();
        considered.sort_unstable();
        for index in considered {
            let settings = &self.patterns.patterns[index].settings;
            let count = counts[index];
            if settings.min_matches > 0 && count < settings.min_matches {
                result.min_match_violations.push((index, count));
            }
            if settings.max_matches.is_some_and(|max| count >= max) {
                result.max_match_limit_reached.push(index);
            }
        }
    }
}
