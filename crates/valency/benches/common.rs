#![allow(dead_code)]

use std::f32::consts::PI;
use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::{Affine3A, Mat3, Vec3};
use valency::prelude::*;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Square grid with cardinal orbitals. Nodes alternate between modules 0 and 1 in a
/// checkerboard.
pub struct Grid {
    pub cache: OrbitalCache,
    pub states: Vec<NodeState>,
}

pub fn grid(side: usize) -> Grid {
    let mut positions: Vec<mint::Vector3<f32>> = Vec::with_capacity(side * side);
    let mut edges = Vec::new();
    let mut states = Vec::with_capacity(side * side);
    for y in 0..side {
        for x in 0..side {
            let node = y * side + x;
            positions.push(Vec3::new(x as f32, y as f32, 0.0).into());
            states.push(NodeState::Resolved((x + y) % 2));
            if x + 1 < side {
                edges.push(Edge::new(node, node + 1));
            }
            if y + 1 < side {
                edges.push(Edge::new(node, node + side));
            }
        }
    }
    let assignment = OrbitalSet::cardinal("grid")
        .assign(&positions, &edges)
        .expect("grid edges are valid");
    let cache = OrbitalCache::build(&assignment.node_masks, &edges, &assignment.edge_slots, 4)
        .expect("grid cache builds");
    Grid { cache, states }
}

fn socket_facing(position: Vec3, outward: Vec3) -> Affine3A {
    let z = outward.normalize();
    let y = Vec3::Z;
    Affine3A::from_mat3_translation(Mat3::from_cols(y.cross(z), y, z), position)
}

/// Unit-cell corridor pieces sharing one door socket type.
pub fn corridor_rules() -> (CompiledBondingRules, SocketRules) {
    let mut sockets = SocketRules::new();
    let door = sockets.add_type("door").expect("socket type");
    sockets.initialize_self_compatible();

    let cell = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let socket = |name: &str, dir: Vec3| CompiledSocket::new(name, door, socket_facing(dir * 0.5, dir));
    let mut rules = CompiledBondingRules::new(1).expect("rules");
    let defs = [
        ModuleDefinition::new("cross")
            .with_weight(0.5)
            .with_socket(socket("east", Vec3::X))
            .with_socket(socket("west", Vec3::NEG_X))
            .with_socket(socket("north", Vec3::Y))
            .with_socket(socket("south", Vec3::NEG_Y)),
        ModuleDefinition::new("hall")
            .with_weight(2.0)
            .with_socket(socket("east", Vec3::X))
            .with_socket(socket("west", Vec3::NEG_X))
            .with_local_transform(Affine3A::from_rotation_z(PI)),
        ModuleDefinition::new("corner")
            .with_socket(socket("west", Vec3::NEG_X))
            .with_socket(socket("north", Vec3::Y)),
        ModuleDefinition::new("cap")
            .with_weight(0.25)
            .with_spawn_limits(2, None)
            .with_socket(socket("west", Vec3::NEG_X)),
    ];
    for def in defs {
        rules
            .push_module(def.with_layer(LayerMasks::default()).with_bounds(cell))
            .expect("module");
    }
    (rules, sockets)
}
