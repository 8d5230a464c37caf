//! Compiled pattern definitions consumed by the matcher.
//!
//! A pattern is an ordered list of entries. Entry 0 is the root; every other entry must
//! be reachable from it through adjacency links. Each link names the orbital it leaves
//! from on the source node and the orbital on the target node that must point back.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::NodeState;
use crate::orbital::MAX_ORBITALS;
use crate::rules::ModuleIndex;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternAdjacency {
    pub target_entry: usize,
    pub source_orbital: u8,
    pub target_orbital: u8,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    /// Module indices this entry accepts. Empty accepts any node.
    pub accepted_modules: Vec<ModuleIndex>,
    /// Inactive entries constrain the match but are never claimed or rewritten.
    pub active: bool,
    /// Orbitals that must have no neighbor.
    pub boundary_mask: u64,
    pub adjacency: Vec<PatternAdjacency>,
}

impl Default for PatternEntry {
    fn default() -> Self {
        Self::any()
    }
}

impl PatternEntry {
    /// Active wildcard entry.
    pub fn any() -> Self {
        Self {
            accepted_modules: Vec::new(),
            active: true,
            boundary_mask: 0,
            adjacency: Vec::new(),
        }
    }

    pub fn accepting(modules: impl IntoIterator<Item = ModuleIndex>) -> Self {
        Self {
            accepted_modules: modules.into_iter().collect(),
            ..Self::any()
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Sets the orbitals that must have no neighbor.
    pub fn with_boundary(mut self, boundary_mask: u64) -> Self {
        self.boundary_mask = boundary_mask;
        self
    }

    /// Adds a link from this entry to `target_entry`.
    pub fn with_adjacency(mut self, target_entry: usize, source_orbital: u8, target_orbital: u8) -> Self {
        self.adjacency.push(PatternAdjacency {
            target_entry,
            source_orbital,
            target_orbital,
        });
        self
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.accepted_modules.is_empty()
    }

    /// Whether a node in `state` can bind to this entry.
    #[inline]
    pub fn accepts(&self, state: NodeState) -> bool {
        if self.is_wildcard() {
            return true;
        }
        state
            .module()
            .is_some_and(|m| self.accepted_modules.contains(&m))
    }

    /// Whether a node with occupied orbitals `mask` leaves the boundary orbitals empty.
    #[inline]
    pub fn boundary_clear(&self, mask: u64) -> bool {
        mask & self.boundary_mask == 0
    }
}

/// What the rewrite pass does with a match.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputStrategy {
    /// Only annotate nodes.
    #[default]
    Annotate,
    /// Drop active nodes.
    Remove,
    /// Move active nodes to a separate output.
    Fork,
    /// Replace active nodes by one node at the replacement transform.
    Collapse,
    /// Change the module of active nodes to the swap target.
    Swap,
}

/// Where a collapsed match places its replacement node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    /// Average position of the active nodes.
    #[default]
    Centroid,
    /// Node bound to entry 0.
    PatternRoot,
    /// First active entry's node.
    FirstMatch,
}

#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSettings {
    pub name: String,
    pub weight: f32,
    pub exclusive: bool,
    pub min_matches: u32,
    /// `None` means unlimited.
    pub max_matches: Option<u32>,
    pub tags: Vec<String>,
    pub output_strategy: OutputStrategy,
    pub transform_mode: TransformMode,
    pub swap_target: Option<ModuleIndex>,
}

impl PatternSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            exclusive: true,
            min_matches: 0,
            max_matches: None,
            tags: Vec::new(),
            output_strategy: OutputStrategy::Annotate,
            transform_mode: TransformMode::Centroid,
            swap_target: None,
        }
    }

    /// Sets the weight.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Sets whether matches claim their nodes exclusively.
    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Sets the minimum and optional maximum match counts.
    pub fn with_match_limits(mut self, min_matches: u32, max_matches: Option<u32>) -> Self {
        self.min_matches = min_matches;
        self.max_matches = max_matches;
        self
    }

    /// Adds a tag used by pattern filters.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the rewrite output strategy.
    pub fn with_output(mut self, output_strategy: OutputStrategy) -> Self {
        self.output_strategy = output_strategy;
        self
    }

    /// Sets the transform mode.
    pub fn with_transform_mode(mut self, transform_mode: TransformMode) -> Self {
        self.transform_mode = transform_mode;
        self
    }

    /// Sets the module that `Swap` writes into matched nodes.
    pub fn with_swap_target(mut self, module: ModuleIndex) -> Self {
        self.swap_target = Some(module);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPattern {
    pub entries: Vec<PatternEntry>,
    pub settings: PatternSettings,
}

impl CompiledPattern {
    pub fn new(settings: PatternSettings, entries: Vec<PatternEntry>) -> Self {
        Self { entries, settings }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn active_entries(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.active)
            .map(|(i, _)| i)
    }

    /// Structural checks. Any failure makes the whole pattern set unusable.
    pub fn validate(&self) -> Result<()> {
        let name = self.name();
        if self.entries.is_empty() {
            return Err(Error::malformed(name, "pattern has no entries"));
        }
        if !self.settings.weight.is_finite() || self.settings.weight < 0.0 {
            return Err(Error::malformed(
                name,
                format!("invalid weight {}", self.settings.weight),
            ));
        }
        if let Some(max) = self.settings.max_matches {
            if self.settings.min_matches > max {
                return Err(Error::malformed(
                    name,
                    format!(
                        "min_matches {} above max_matches {max}",
                        self.settings.min_matches
                    ),
                ));
            }
        }
        if self.settings.output_strategy == OutputStrategy::Swap && self.settings.swap_target.is_none() {
            return Err(Error::malformed(name, "swap output without a swap target"));
        }

        let n = self.entries.len();
        for (i, entry) in self.entries.iter().enumerate() {
            for adj in &entry.adjacency {
                if adj.target_entry >= n {
                    return Err(Error::malformed(
                        name,
                        format!("entry {i} links to missing entry {}", adj.target_entry),
                    ));
                }
                if adj.target_entry == i {
                    return Err(Error::malformed(name, format!("entry {i} links to itself")));
                }
                if adj.source_orbital as usize >= MAX_ORBITALS
                    || adj.target_orbital as usize >= MAX_ORBITALS
                {
                    return Err(Error::malformed(
                        name,
                        format!("entry {i} uses an orbital index of 64 or more"),
                    ));
                }
            }
        }

        let mut reached = vec![false; n];
        let mut stack = vec![0usize];
        reached[0] = true;
        while let Some(i) = stack.pop() {
            for adj in &self.entries[i].adjacency {
                if !reached[adj.target_entry] {
                    reached[adj.target_entry] = true;
                    stack.push(adj.target_entry);
                }
            }
        }
        if let Some(orphan) = reached.iter().position(|r| !r) {
            return Err(Error::malformed(
                name,
                format!("entry {orphan} unreachable from root"),
            ));
        }
        Ok(())
    }
}

/// All patterns of one rules asset, in author order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledPatternSet {
    pub patterns: Vec<CompiledPattern>,
}

impl CompiledPatternSet {
    pub fn new(patterns: Vec<CompiledPattern>) -> Self {
        Self { patterns }
    }

    pub fn push(&mut self, pattern: CompiledPattern) -> usize {
        self.patterns.push(pattern);
        self.patterns.len() - 1
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CompiledPattern> {
        self.patterns.get(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.name() == name)
    }

    pub fn validate(&self) -> Result<()> {
        self.patterns.iter().try_for_each(CompiledPattern::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str) -> CompiledPattern {
        CompiledPattern::new(
            PatternSettings::new(name),
            vec![
                PatternEntry::accepting([0]).with_adjacency(1, 0, 1),
                PatternEntry::any(),
            ],
        )
    }

    #[test]
    fn wildcard_accepts_everything() {
        let e = PatternEntry::any();
        assert!(e.accepts(NodeState::Unset));
        assert!(e.accepts(NodeState::Resolved(9)));
        let typed = PatternEntry::accepting([2, 3]);
        assert!(typed.accepts(NodeState::Resolved(3)));
        assert!(!typed.accepts(NodeState::Resolved(1)));
        assert!(!typed.accepts(NodeState::Boundary));
    }

    #[test]
    fn valid_pattern_passes() {
        assert!(pair("p").validate().is_ok());
    }

    #[test]
    fn empty_pattern_is_malformed() {
        let p = CompiledPattern::new(PatternSettings::new("empty"), vec![]);
        assert!(matches!(p.validate(), Err(Error::MalformedPattern { .. })));
    }

    #[test]
    fn dangling_and_self_links_are_malformed() {
        let mut p = pair("dangling");
        p.entries[0].adjacency[0].target_entry = 5;
        assert!(p.validate().is_err());

        let mut p = pair("self");
        p.entries[1] = PatternEntry::any().with_adjacency(1, 0, 0);
        assert!(p.validate().is_err());

        let mut p = pair("orbital");
        p.entries[0].adjacency[0].source_orbital = 64;
        assert!(p.validate().is_err());
    }

    #[test]
    fn unreachable_entry_is_malformed() {
        let p = CompiledPattern::new(
            PatternSettings::new("island"),
            vec![PatternEntry::any(), PatternEntry::any()],
        );
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("entry 1 unreachable"));
    }

    #[test]
    fn swap_needs_target() {
        let mut p = pair("swap");
        p.settings.output_strategy = OutputStrategy::Swap;
        assert!(p.validate().is_err());
        p.settings.swap_target = Some(1);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn set_validation_fails_on_any_bad_pattern() {
        let mut set = CompiledPatternSet::default();
        set.push(pair("ok"));
        assert!(set.validate().is_ok());
        set.push(CompiledPattern::new(PatternSettings::new("bad"), vec![]));
        assert!(set.validate().is_err());
        assert_eq!(set.find("bad"), Some(1));
    }
}
