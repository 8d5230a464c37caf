//! Flat neighbor lookup table over a solved graph.
//!
//! The cache answers "which node sits at orbital `o` of node `n`" in O(1). It is built
//! once per cluster from per-node orbital masks and per-edge packed slot pairs (see
//! [`crate::orbital::pack_slot_pair`]) and is read-only afterwards.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::Edge;
use crate::orbital::{unpack_slot_pair, MAX_ORBITALS, NO_ORBITAL_MATCH};

const NO_NEIGHBOR: i32 = -1;

/// Neighbor lookup table: `[num_nodes * max_orbitals]` neighbor indices plus one
/// occupied-orbital mask per node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrbitalCache {
    num_nodes: usize,
    max_orbitals: usize,
    neighbors: Vec<i32>,
    masks: Vec<u64>,
}

impl OrbitalCache {
    /// Builds the cache.
    ///
    /// `node_masks[n]` is node `n`'s occupied-orbital mask and `edge_slots[e]` the packed
    /// slot pair of `edges[e]`. Slots equal to [`NO_ORBITAL_MATCH`] or `>= max_orbitals`
    /// are ignored, as are edges whose endpoints fall outside the node range.
    ///
    /// Fails only on degenerate input: no nodes, `max_orbitals` outside `1..=64`, or an
    /// `edge_slots` array whose length differs from `edges`.
    pub fn build(
        node_masks: &[u64],
        edges: &[Edge],
        edge_slots: &[u16],
        max_orbitals: usize,
    ) -> Result<Self> {
        if node_masks.is_empty() {
            return Err(Error::EmptyInput("orbital cache needs at least one node".into()));
        }
        if max_orbitals == 0 || max_orbitals > MAX_ORBITALS {
            return Err(Error::InvalidConfig(format!(
                "max_orbitals must be in 1..={MAX_ORBITALS}, got {max_orbitals}"
            )));
        }
        if edge_slots.len() != edges.len() {
            return Err(Error::SizeMismatch {
                what: "edge slot pairs",
                expected: edges.len(),
                actual: edge_slots.len(),
            });
        }

        let num_nodes = node_masks.len();
        let mut cache = Self {
            num_nodes,
            max_orbitals,
            neighbors: vec![NO_NEIGHBOR; num_nodes * max_orbitals],
            masks: node_masks.to_vec(),
        };

        let mut skipped = 0usize;
        for (edge, &packed) in edges.iter().zip(edge_slots) {
            if edge.start >= num_nodes || edge.end >= num_nodes {
                warn!(
                    "Edge ({}, {}) references a node outside 0..{}; skipping.",
                    edge.start, edge.end, num_nodes
                );
                continue;
            }

            let (start_slot, end_slot) = unpack_slot_pair(packed);
            if !cache.record(edge.start, start_slot, edge.end) {
                skipped += 1;
            }
            // A self-loop only ever resolves to the start node's slot.
            if edge.start != edge.end && !cache.record(edge.end, end_slot, edge.start) {
                skipped += 1;
            }
        }

        debug!(
            "Orbital cache built: {} nodes, {} orbitals, {} edges, {} endpoint slots skipped.",
            num_nodes,
            max_orbitals,
            edges.len(),
            skipped
        );

        Ok(cache)
    }

    fn record(&mut self, node: usize, slot: u8, neighbor: usize) -> bool {
        if slot == NO_ORBITAL_MATCH || slot as usize >= self.max_orbitals {
            return false;
        }
        self.neighbors[node * self.max_orbitals + slot as usize] = neighbor as i32;
        true
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn max_orbitals(&self) -> usize {
        self.max_orbitals
    }

    /// Neighbor at `orbital` of `node`, or `None` for an empty slot or out-of-range query.
    #[inline]
    pub fn neighbor_at_orbital(&self, node: usize, orbital: usize) -> Option<usize> {
        if node >= self.num_nodes || orbital >= self.max_orbitals {
            return None;
        }
        let raw = self.neighbors[node * self.max_orbitals + orbital];
        (raw >= 0).then_some(raw as usize)
    }

    /// Occupied-orbital mask of `node`; 0 when out of range.
    #[inline]
    pub fn orbital_mask(&self, node: usize) -> u64 {
        self.masks.get(node).copied().unwrap_or(0)
    }

    #[inline]
    pub fn has_orbitals(&self, node: usize) -> bool {
        self.orbital_mask(node) != 0
    }

    /// Number of filled neighbor slots of `node`.
    pub fn neighbor_count(&self, node: usize) -> usize {
        self.neighbor_slots(node).filter(|&raw| raw >= 0).count()
    }

    /// Iterates `(orbital, neighbor)` for every filled slot of `node`, in orbital order.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbor_slots(node)
            .enumerate()
            .filter(|(_, raw)| *raw >= 0)
            .map(|(orbital, raw)| (orbital, raw as usize))
    }

    fn neighbor_slots(&self, node: usize) -> impl Iterator<Item = i32> + '_ {
        let range = if node < self.num_nodes {
            node * self.max_orbitals..(node + 1) * self.max_orbitals
        } else {
            0..0
        };
        self.neighbors[range].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::orbital::{pack_slot_pair, UNMATCHED_SLOT_PAIR};
    use crate::test_support::{grid_fixture, E, N, S, W};

    #[test]
    fn rejects_degenerate_input() {
        assert!(matches!(
            OrbitalCache::build(&[], &[], &[], 4),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            OrbitalCache::build(&[0], &[], &[], 0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            OrbitalCache::build(&[0], &[], &[], 65),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            OrbitalCache::build(&[0, 0], &[Edge::new(0, 1)], &[], 4),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn grid_center_sees_all_four_neighbors() {
        let grid = grid_fixture();
        let cache = grid.cache();
        // Row-major 3x3, node 4 is the center.
        assert_eq!(cache.neighbor_at_orbital(4, E), Some(5));
        assert_eq!(cache.neighbor_at_orbital(4, W), Some(3));
        assert_eq!(cache.neighbor_at_orbital(4, N), Some(7));
        assert_eq!(cache.neighbor_at_orbital(4, S), Some(1));
        assert_eq!(cache.neighbor_count(4), 4);
        assert_eq!(cache.orbital_mask(4), 0b1111);
    }

    #[test]
    fn grid_corner_has_empty_slots() {
        let grid = grid_fixture();
        let cache = grid.cache();
        assert_eq!(cache.neighbor_at_orbital(0, W), None);
        assert_eq!(cache.neighbor_at_orbital(0, S), None);
        assert_eq!(cache.neighbor_at_orbital(0, E), Some(1));
        assert_eq!(cache.neighbor_at_orbital(0, N), Some(3));
        assert_eq!(cache.neighbor_count(0), 2);
        assert!(cache.has_orbitals(0));
    }

    #[test]
    fn out_of_range_queries_are_empty() {
        let grid = grid_fixture();
        let cache = grid.cache();
        assert_eq!(cache.neighbor_at_orbital(99, 0), None);
        assert_eq!(cache.neighbor_at_orbital(0, 9), None);
        assert_eq!(cache.orbital_mask(99), 0);
        assert_eq!(cache.neighbors(99).count(), 0);
    }

    #[test]
    fn sentinel_and_oversized_slots_are_ignored() {
        let edges = [Edge::new(0, 1), Edge::new(1, 2)];
        let slots = [UNMATCHED_SLOT_PAIR, pack_slot_pair(0, 7)];
        let cache = OrbitalCache::build(&[0, 1, 0], &edges, &slots, 4).unwrap();
        assert_eq!(cache.neighbor_count(0), 0);
        assert_eq!(cache.neighbor_at_orbital(1, 0), Some(2));
        assert_eq!(cache.neighbor_count(2), 0);
    }

    #[test]
    fn out_of_range_edges_are_skipped() {
        let edges = [Edge::new(0, 5)];
        let slots = [pack_slot_pair(0, 1)];
        let cache = OrbitalCache::build(&[1, 0], &edges, &slots, 2).unwrap();
        assert_eq!(cache.neighbor_count(0), 0);
    }

    #[test]
    fn building_twice_is_identical() {
        let grid = grid_fixture();
        let a = OrbitalCache::build(&grid.masks, &grid.edges, &grid.slots, 4).unwrap();
        let b = OrbitalCache::build(&grid.masks, &grid.edges, &grid.slots, 4).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn edges_resolve_symmetrically(
            raw_edges in prop::collection::vec((0usize..12, 0usize..12, 0u8..8, 0u8..8), 0..40)
        ) {
            // Keep only edges whose endpoint slots are still free so no slot is overwritten.
            let mut taken = vec![false; 12 * 8];
            let mut edges = Vec::new();
            let mut slots = Vec::new();
            let mut masks = vec![0u64; 12];
            for (a, b, sa, sb) in raw_edges {
                if a == b || taken[a * 8 + sa as usize] || taken[b * 8 + sb as usize] {
                    continue;
                }
                taken[a * 8 + sa as usize] = true;
                taken[b * 8 + sb as usize] = true;
                masks[a] |= 1 << sa;
                masks[b] |= 1 << sb;
                edges.push(Edge::new(a, b));
                slots.push(pack_slot_pair(sa, sb));
            }

            let cache = OrbitalCache::build(&masks, &edges, &slots, 8).unwrap();
            for (edge, packed) in edges.iter().zip(&slots) {
                let (sa, sb) = unpack_slot_pair(*packed);
                prop_assert_eq!(cache.neighbor_at_orbital(edge.start, sa as usize), Some(edge.end));
                prop_assert_eq!(cache.neighbor_at_orbital(edge.end, sb as usize), Some(edge.start));
            }
            for node in 0..12 {
                for orbital in 0..8 {
                    if masks[node] & (1 << orbital) == 0 {
                        prop_assert_eq!(cache.neighbor_at_orbital(node, orbital), None);
                    }
                }
            }
        }
    }
}
