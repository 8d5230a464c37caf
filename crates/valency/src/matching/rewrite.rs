//! Turning matches into topology edits.
//!
//! The matcher never changes the graph. [`RewritePlan`] collects what each included
//! match's output strategy asks for so the caller can apply it to its own node streams.
use std::collections::{BTreeMap, BTreeSet};

use glam::{Affine3A, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::NodeState;
use crate::matching::annotate::AnnotationPolicy;
use crate::matching::matcher::PatternMatch;
use crate::rules::{CompiledPattern, CompiledPatternSet, ModuleIndex, OutputStrategy, TransformMode};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewritePlan {
    /// Nodes dropped by `Remove` and by the non-surviving nodes of `Collapse`.
    pub removed: BTreeSet<usize>,
    /// Nodes moved to a separate output by `Fork`.
    pub forked: BTreeSet<usize>,
    /// Surviving node of each `Collapse` and its replacement transform.
    pub collapsed: BTreeMap<usize, Affine3A>,
    /// New module per node from `Swap`.
    pub swaps: BTreeMap<usize, ModuleIndex>,
}

impl RewritePlan {
    /// Applies every included match in order. `transforms` holds one world transform per
    /// node and must cover every node a match uses.
    pub fn from_matches(
        patterns: &CompiledPatternSet,
        matches: &[PatternMatch],
        policy: AnnotationPolicy,
        transforms: &[Affine3A],
    ) -> Result<Self> {
        let mut plan = Self::default();

        for m in matches {
            let Some(pattern) = patterns.get(m.pattern_index) else {
                return Err(Error::InvalidConfig(format!(
                    "match refers to missing pattern {}",
                    m.pattern_index
                )));
            };
            if !policy.includes(m, pattern) {
                continue;
            }
            if let Some(&node) = m.entry_to_node.iter().find(|&&n| n >= transforms.len()) {
                return Err(Error::SizeMismatch {
                    what: "node transforms",
                    expected: node + 1,
                    actual: transforms.len(),
                });
            }

            match pattern.settings.output_strategy {
                OutputStrategy::Annotate => {}
                OutputStrategy::Remove => plan.removed.extend(m.active_nodes(pattern)),
                OutputStrategy::Fork => plan.forked.extend(m.active_nodes(pattern)),
                OutputStrategy::Collapse => {
                    let replacement = replacement_transform(m, pattern, transforms);
                    let mut active = m.active_nodes(pattern);
                    if let Some(first) = active.next() {
                        plan.collapsed.insert(first, replacement);
                    }
                    plan.removed.extend(active);
                }
                OutputStrategy::Swap => {
                    if let Some(target) = pattern.settings.swap_target {
                        for node in m.active_nodes(pattern) {
                            plan.swaps.insert(node, target);
                        }
                    }
                }
            }
        }

        debug!(
            "Rewrite plan: {} removed, {} forked, {} collapsed, {} swapped.",
            plan.removed.len(),
            plan.forked.len(),
            plan.collapsed.len(),
            plan.swaps.len()
        );

        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.forked.is_empty() && self.collapsed.is_empty() && self.swaps.is_empty()
    }

    /// Whether `node` leaves the main output.
    pub fn drops(&self, node: usize) -> bool {
        self.removed.contains(&node) || self.forked.contains(&node)
    }

    /// Nodes in `0..num_nodes` that stay in the main output.
    pub fn kept_nodes(&self, num_nodes: usize) -> impl Iterator<Item = usize> + '_ {
        (0..num_nodes).filter(move |&n| !self.drops(n))
    }

    /// Writes swap targets into `states`. Returns how many nodes changed.
    pub fn apply_swaps(&self, states: &mut [NodeState]) -> usize {
        let mut changed = 0;
        for (&node, &module) in &self.swaps {
            if let Some(state) = states.get_mut(node) {
                *state = NodeState::Resolved(module);
                changed += 1;
            }
        }
        changed
    }

    /// Writes replacement transforms into `transforms`.
    pub fn apply_collapses(&self, transforms: &mut [Affine3A]) {
        for (&node, &t) in &self.collapsed {
            if let Some(slot) = transforms.get_mut(node) {
                *slot = t;
            }
        }
    }
}

/// Centroid gives a pure translation; the other modes copy the chosen node's transform.
fn replacement_transform(m: &PatternMatch, pattern: &CompiledPattern, transforms: &[Affine3A]) -> Affine3A {
    match pattern.settings.transform_mode {
        TransformMode::Centroid => {
            let (sum, count) = m
                .active_nodes(pattern)
                .fold((Vec3::ZERO, 0u32), |(s, c), n| {
                    (s + Vec3::from(transforms[n].translation), c + 1)
                });
            if count > 0 {
                Affine3A::from_translation(sum / count as f32)
            } else {
                Affine3A::IDENTITY
            }
        }
        TransformMode::PatternRoot => transforms[m.entry_to_node[0]],
        TransformMode::FirstMatch => m
            .active_nodes(pattern)
            .next()
            .map_or(Affine3A::IDENTITY, |n| transforms[n]),
    }
}
