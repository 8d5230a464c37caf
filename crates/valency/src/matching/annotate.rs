//! Per-node annotation streams produced from matches.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::matching::matcher::PatternMatch;
use crate::rules::{CompiledPattern, CompiledPatternSet};

/// Which matches get written to nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnnotationPolicy {
    /// Claimed matches and matches of additive patterns; unclaimed exclusive matches are skipped.
    #[default]
    ClaimedOrAdditive,
    /// Every discovered match.
    All,
}

impl AnnotationPolicy {
    #[inline]
    pub fn includes(self, m: &PatternMatch, pattern: &CompiledPattern) -> bool {
        match self {
            AnnotationPolicy::ClaimedOrAdditive => m.claimed || !pattern.settings.exclusive,
            AnnotationPolicy::All => true,
        }
    }
}

/// Pattern name and match index per node. Match indices count only included matches,
/// in resolved order; a later match overwrites an earlier one on shared nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAnnotations {
    pub pattern_names: Vec<Option<String>>,
    pub match_indices: Vec<Option<usize>>,
}

impl NodeAnnotations {
    pub fn from_matches(
        num_nodes: usize,
        patterns: &CompiledPatternSet,
        matches: &[PatternMatch],
        policy: AnnotationPolicy,
    ) -> Self {
        let mut out = Self {
            pattern_names: vec![None; num_nodes],
            match_indices: vec![None; num_nodes],
        };

        let mut counter = 0usize;
        for m in matches {
            let Some(pattern) = patterns.get(m.pattern_index) else {
                continue;
            };
            if !policy.includes(m, pattern) {
                continue;
            }
            for node in m.active_nodes(pattern) {
                if node < num_nodes {
                    out.pattern_names[node] = Some(pattern.name().to_owned());
                    out.match_indices[node] = Some(counter);
                }
            }
            counter += 1;
        }

        out
    }

    pub fn len(&self) -> usize {
        self.pattern_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_names.is_empty()
    }

    pub fn pattern_name(&self, node: usize) -> Option<&str> {
        self.pattern_names.get(node)?.as_deref()
    }

    pub fn match_index(&self, node: usize) -> Option<usize> {
        self.match_indices.get(node).copied().flatten()
    }

    pub fn annotated_count(&self) -> usize {
        self.match_indices.iter().filter(|m| m.is_some()).count()
    }

    /// Raw attribute encoding: `-1` for nodes without a match.
    pub fn raw_match_indices(&self) -> Vec<i32> {
        self.match_indices
            .iter()
            .map(|m| m.map_or(-1, |i| i as i32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{PatternEntry, PatternSettings};

    fn set() -> CompiledPatternSet {
        CompiledPatternSet::new(vec![
            CompiledPattern::new(
                PatternSettings::new("excl"),
                vec![
                    PatternEntry::any().with_adjacency(1, 0, 1),
                    PatternEntry::any().inactive(),
                ],
            ),
            CompiledPattern::new(
                PatternSettings::new("add").with_exclusive(false),
                vec![PatternEntry::any()],
            ),
        ])
    }

    fn matches() -> Vec<PatternMatch> {
        vec![
            PatternMatch {
                pattern_index: 0,
                entry_to_node: vec![0, 1],
                claimed: true,
            },
            PatternMatch {
                pattern_index: 0,
                entry_to_node: vec![2, 3],
                claimed: false,
            },
            PatternMatch {
                pattern_index: 1,
                entry_to_node: vec![3],
                claimed: false,
            },
        ]
    }

    #[test]
    fn default_policy_skips_unclaimed_exclusive_matches() {
        let ann = NodeAnnotations::from_matches(4, &set(), &matches(), AnnotationPolicy::default());
        assert_eq!(ann.pattern_name(0), Some("excl"));
        assert_eq!(ann.match_index(0), Some(0));
        // Inactive entries are never annotated.
        assert_eq!(ann.pattern_name(1), None);
        assert_eq!(ann.pattern_name(2), None);
        assert_eq!(ann.pattern_name(3), Some("add"));
        assert_eq!(ann.match_index(3), Some(1));
        assert_eq!(ann.raw_match_indices(), vec![0, -1, -1, 1]);
        assert_eq!(ann.annotated_count(), 2);
    }

    #[test]
    fn all_policy_counts_every_match() {
        let ann = NodeAnnotations::from_matches(4, &set(), &matches(), AnnotationPolicy::All);
        assert_eq!(ann.match_index(2), Some(1));
        assert_eq!(ann.match_index(3), Some(2));
        assert_eq!(ann.annotated_count(), 3);
    }
}
