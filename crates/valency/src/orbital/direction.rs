//! Direction-based orbital assignment.
//!
//! Maps each edge direction to the best matching orbital of an [`OrbitalSet`] and
//! produces the per-node masks and per-edge packed slot pairs that
//! [`crate::orbital::OrbitalCache::build`] consumes.
use glam::Vec3;
use mint::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::graph::Edge;
use crate::orbital::{orbital_bit, pack_slot_pair, MAX_ORBITALS, NO_ORBITAL_MATCH};

/// A named direction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Orbital {
    pub name: String,
    /// Unit direction.
    pub direction: Vec3,
}

/// Ordered set of orbitals for one layer. Orbital `i` owns mask bit `i`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalSet {
    pub layer_name: String,
    pub orbitals: Vec<Orbital>,
    /// Minimum dot product between an edge direction and an orbital direction.
    pub dot_threshold: f32,
}

impl OrbitalSet {
    pub fn new(layer_name: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
            orbitals: Vec::new(),
            // cos(45°)
            dot_threshold: std::f32::consts::FRAC_1_SQRT_2,
        }
    }

    /// Four horizontal cardinal orbitals in the order E, W, N, S (+X, -X, +Y, -Y).
    pub fn cardinal(layer_name: impl Into<String>) -> Self {
        let mut set = Self::new(layer_name);
        for (name, dir) in [
            ("E", Vec3::X),
            ("W", Vec3::NEG_X),
            ("N", Vec3::Y),
            ("S", Vec3::NEG_Y),
        ] {
            set.orbitals.push(Orbital {
                name: name.into(),
                direction: dir,
            });
        }
        set
    }

    /// Appends an orbital, normalizing its direction.
    pub fn add_orbital(
        &mut self,
        name: impl Into<String>,
        direction: impl Into<Vector3<f32>>,
    ) -> Result<usize> {
        if self.orbitals.len() >= MAX_ORBITALS {
            return Err(Error::InvalidConfig(format!(
                "layer '{}' already has {MAX_ORBITALS} orbitals",
                self.layer_name
            )));
        }
        let direction = Vec3::from(direction.into());
        let Some(direction) = direction.try_normalize() else {
            return Err(Error::InvalidConfig(
                "orbital direction must be non-zero and finite".into(),
            ));
        };
        self.orbitals.push(Orbital {
            name: name.into(),
            direction,
        });
        Ok(self.orbitals.len() - 1)
    }

    pub fn with_dot_threshold(mut self, dot_threshold: f32) -> Self {
        self.dot_threshold = dot_threshold;
        self
    }

    pub fn len(&self) -> usize {
        self.orbitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbitals.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.orbitals.iter().position(|o| o.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.orbitals.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "layer '{}' has no orbitals",
                self.layer_name
            )));
        }
        if self.orbitals.len() > MAX_ORBITALS {
            return Err(Error::InvalidConfig(format!(
                "layer '{}' has more than {MAX_ORBITALS} orbitals",
                self.layer_name
            )));
        }
        for (i, a) in self.orbitals.iter().enumerate() {
            if self.orbitals[..i].iter().any(|b| b.name == a.name) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate orbital name '{}' in layer '{}'",
                    a.name, self.layer_name
                )));
            }
        }
        Ok(())
    }

    /// Best orbital for `direction`, or `None` when nothing reaches the dot threshold.
    /// Ties keep the lower orbital index.
    pub fn find_matching_orbital(&self, direction: Vec3) -> Option<u8> {
        let dir = direction.try_normalize()?;
        let mut best: Option<(usize, f32)> = None;
        for (i, orbital) in self.orbitals.iter().enumerate().take(MAX_ORBITALS) {
            let dot = dir.dot(orbital.direction);
            if dot < self.dot_threshold {
                continue;
            }
            if best.is_none_or(|(_, d)| dot > d) {
                best = Some((i, dot));
            }
        }
        best.map(|(i, _)| i as u8)
    }

    /// Assigns orbitals to both endpoints of every edge from node positions.
    pub fn assign(
        &self,
        positions: &[Vector3<f32>],
        edges: &[Edge],
    ) -> Result<OrbitalAssignment> {
        self.validate()?;
        let mut node_masks = vec![0u64; positions.len()];
        let mut edge_slots = Vec::with_capacity(edges.len());
        let mut unmatched = 0usize;

        for edge in edges {
            let (Some(a), Some(b)) = (positions.get(edge.start), positions.get(edge.end)) else {
                return Err(Error::InvalidConfig(format!(
                    "edge ({}, {}) references a node outside 0..{}",
                    edge.start,
                    edge.end,
                    positions.len()
                )));
            };
            let (a, b) = (Vec3::from(*a), Vec3::from(*b));

            let mut slot_for = |from: usize, dir: Vec3| match self.find_matching_orbital(dir) {
                Some(slot) => {
                    node_masks[from] |= orbital_bit(slot as usize);
                    slot
                }
                None => {
                    unmatched += 1;
                    NO_ORBITAL_MATCH
                }
            };
            let start_slot = slot_for(edge.start, b - a);
            let end_slot = slot_for(edge.end, a - b);
            edge_slots.push(pack_slot_pair(start_slot, end_slot));
        }

        if unmatched > 0 {
            warn!(
                "Layer '{}': {} edge directions did not match any orbital.",
                self.layer_name, unmatched
            );
        }

        Ok(OrbitalAssignment {
            node_masks,
            edge_slots,
            unmatched,
        })
    }
}

/// Output of [`OrbitalSet::assign`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrbitalAssignment {
    pub node_masks: Vec<u64>,
    pub edge_slots: Vec<u16>,
    /// Edge endpoints whose direction matched no orbital.
    pub unmatched: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital::unpack_slot_pair;

    #[test]
    fn cardinal_set_matches_axis_directions() {
        let set = OrbitalSet::cardinal("main");
        assert_eq!(set.find_matching_orbital(Vec3::X), Some(0));
        assert_eq!(set.find_matching_orbital(Vec3::NEG_X), Some(1));
        assert_eq!(set.find_matching_orbital(Vec3::new(0.1, 2.0, 0.0)), Some(2));
        assert_eq!(set.find_matching_orbital(Vec3::NEG_Y * 5.0), Some(3));
    }

    #[test]
    fn vertical_direction_matches_nothing() {
        let set = OrbitalSet::cardinal("main");
        assert_eq!(set.find_matching_orbital(Vec3::Z), None);
        assert_eq!(set.find_matching_orbital(Vec3::ZERO), None);
    }

    #[test]
    fn add_orbital_rejects_zero_direction() {
        let mut set = OrbitalSet::new("up");
        assert!(set.add_orbital("zero", [0.0, 0.0, 0.0]).is_err());
        assert_eq!(set.add_orbital("up", [0.0, 0.0, 3.0]).unwrap(), 0);
        assert_eq!(set.orbitals[0].direction, Vec3::Z);
    }

    #[test]
    fn validate_rejects_duplicates_and_empty() {
        assert!(OrbitalSet::new("empty").validate().is_err());
        let mut set = OrbitalSet::cardinal("main");
        set.orbitals.push(set.orbitals[0].clone());
        assert!(set.validate().is_err());
    }

    #[test]
    fn assign_packs_both_endpoints() {
        let set = OrbitalSet::cardinal("main");
        let positions: Vec<Vector3<f32>> = vec![
            Vec3::ZERO.into(),
            Vec3::X.into(),
            Vec3::new(0.0, 0.0, 1.0).into(),
        ];
        let edges = [Edge::new(0, 1), Edge::new(0, 2)];
        let out = set.assign(&positions, &edges).unwrap();

        assert_eq!(unpack_slot_pair(out.edge_slots[0]), (0, 1));
        assert_eq!(
            unpack_slot_pair(out.edge_slots[1]),
            (NO_ORBITAL_MATCH, NO_ORBITAL_MATCH)
        );
        assert_eq!(out.node_masks, vec![0b01, 0b10, 0]);
        assert_eq!(out.unmatched, 2);
    }

    #[test]
    fn assign_rejects_dangling_edges() {
        let set = OrbitalSet::cardinal("main");
        let positions: Vec<Vector3<f32>> = vec![Vec3::ZERO.into()];
        assert!(set.assign(&positions, &[Edge::new(0, 3)]).is_err());
    }
}
