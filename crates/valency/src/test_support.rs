//! Shared fixtures for unit tests.
use glam::{Affine3A, Mat3, Vec3};
use mint::Vector3;

use crate::graph::{Edge, NodeState};
use crate::orbital::{orbital_bit, pack_slot_pair, OrbitalCache};
use crate::rules::{
    Aabb, CompiledBondingRules, CompiledSocket, LayerMasks, ModuleDefinition, ModuleIndex,
    SocketRules,
};

pub const E: usize = 0;
pub const W: usize = 1;
pub const N: usize = 2;
pub const S: usize = 3;

pub const MODULE_A: ModuleIndex = 0;
pub const MODULE_B: ModuleIndex = 1;

pub fn bits(orbitals: &[usize]) -> u64 {
    orbitals.iter().fold(0, |acc, &o| acc | orbital_bit(o))
}

/// 3x3 row-major grid, node `y * 3 + x`, +x is E and +y is N.
pub struct GridFixture {
    pub positions: Vec<Vector3<f32>>,
    pub masks: Vec<u64>,
    pub edges: Vec<Edge>,
    pub slots: Vec<u16>,
    /// Middle row resolved to A, top and bottom rows to B.
    pub states: Vec<NodeState>,
}

impl GridFixture {
    pub fn cache(&self) -> OrbitalCache {
        OrbitalCache::build(&self.masks, &self.edges, &self.slots, 4).unwrap()
    }
}

pub fn grid_fixture() -> GridFixture {
    let mut positions = Vec::new();
    let mut masks = vec![0u64; 9];
    let mut edges = Vec::new();
    let mut slots = Vec::new();
    let mut states = Vec::new();

    for y in 0..3 {
        for x in 0..3 {
            let node = y * 3 + x;
            positions.push(Vec3::new(x as f32, y as f32, 0.0).into());
            states.push(NodeState::Resolved(if y == 1 { MODULE_A } else { MODULE_B }));
            if x < 2 {
                edges.push(Edge::new(node, node + 1));
                slots.push(pack_slot_pair(E as u8, W as u8));
                masks[node] |= orbital_bit(E);
                masks[node + 1] |= orbital_bit(W);
            }
            if y < 2 {
                edges.push(Edge::new(node, node + 3));
                slots.push(pack_slot_pair(N as u8, S as u8));
                masks[node] |= orbital_bit(N);
                masks[node + 3] |= orbital_bit(S);
            }
        }
    }

    GridFixture {
        positions,
        masks,
        edges,
        slots,
        states,
    }
}

/// Module A occupies all four orbitals; module B occupies E and W with N and S as boundary.
pub fn grid_rules() -> CompiledBondingRules {
    let mut rules = CompiledBondingRules::new(1).unwrap();
    rules
        .push_module(ModuleDefinition::new("A").with_layer(LayerMasks::new(bits(&[E, W, N, S]))))
        .unwrap();
    rules
        .push_module(
            ModuleDefinition::new("B")
                .with_layer(LayerMasks::new(bits(&[E, W])).with_boundary(bits(&[N, S]))),
        )
        .unwrap();
    rules
}

pub const CROSS: ModuleIndex = 0;
pub const HALL: ModuleIndex = 1;
pub const CAP: ModuleIndex = 2;

/// Socket frame at `position` whose +Z faces `outward` and whose +Y is world up.
/// `outward` must be horizontal.
pub fn socket_facing(position: Vec3, outward: Vec3) -> Affine3A {
    let z = outward.normalize();
    let y = Vec3::Z;
    let x = y.cross(z);
    Affine3A::from_mat3_translation(Mat3::from_cols(x, y, z), position)
}

/// Unit-cell corridor pieces on a single "door" socket type: a four-way cross, a
/// straight hall along X, and a cap with one door on -X. All weigh 1.
pub fn corridor_rules() -> (CompiledBondingRules, SocketRules) {
    corridor_rules_with(&[])
}

/// Corridor pieces with `(module, min, max)` spawn limits applied.
pub fn corridor_rules_with(
    limits: &[(ModuleIndex, u32, Option<u32>)],
) -> (CompiledBondingRules, SocketRules) {
    let mut sockets = SocketRules::new();
    let door = sockets.add_type("door").unwrap();
    sockets.initialize_self_compatible();

    let cell = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let socket = |name: &str, dir: Vec3| CompiledSocket::new(name, door, socket_facing(dir * 0.5, dir));

    let defs = [
        ModuleDefinition::new("cross")
            .with_socket(socket("east", Vec3::X))
            .with_socket(socket("west", Vec3::NEG_X))
            .with_socket(socket("north", Vec3::Y))
            .with_socket(socket("south", Vec3::NEG_Y)),
        ModuleDefinition::new("hall")
            .with_socket(socket("east", Vec3::X))
            .with_socket(socket("west", Vec3::NEG_X)),
        ModuleDefinition::new("cap").with_socket(socket("west", Vec3::NEG_X)),
    ];

    let mut rules = CompiledBondingRules::new(1).unwrap();
    for (module, def) in defs.into_iter().enumerate() {
        let mut def = def.with_layer(LayerMasks::default()).with_bounds(cell);
        if let Some(&(_, min, max)) = limits.iter().find(|(m, ..)| *m == module) {
            def = def.with_spawn_limits(min, max);
        }
        rules.push_module(def).unwrap();
    }
    (rules, sockets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital::OrbitalSet;

    #[test]
    fn direction_assignment_reproduces_fixture() {
        let grid = grid_fixture();
        let out = OrbitalSet::cardinal("main")
            .assign(&grid.positions, &grid.edges)
            .unwrap();
        assert_eq!(out.node_masks, grid.masks);
        assert_eq!(out.edge_slots, grid.slots);
        assert_eq!(out.unmatched, 0);
    }

    #[test]
    fn module_b_never_fits_a_node_with_both_vertical_neighbors() {
        let grid = grid_fixture();
        let rules = grid_rules();
        let cache = grid.cache();
        for node in 0..9 {
            let mask = cache.orbital_mask(node);
            let vertical = cache.neighbor_at_orbital(node, N).is_some()
                && cache.neighbor_at_orbital(node, S).is_some();
            if vertical {
                assert!(!rules.module_fits(MODULE_B, &[mask]), "node {node}");
            }
        }
        assert!(rules.module_fits(MODULE_A, &[cache.orbital_mask(4)]));
        assert!(!rules.module_fits(MODULE_A, &[cache.orbital_mask(0)]));
    }
}
