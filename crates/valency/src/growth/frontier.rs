//! Open sockets waiting to be filled.
use std::collections::VecDeque;

use glam::Affine3A;
use rand::Rng;

use crate::growth::config::GrowthStrategy;
use crate::rng::rand_index;
use crate::rules::SocketTypeIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenSocket {
    /// Index of the owning placed module.
    pub placed_index: usize,
    /// Socket index within the owner's module.
    pub socket_index: usize,
    pub socket_type: SocketTypeIndex,
    pub world: Affine3A,
    /// Depth of the owner.
    pub depth: u32,
    /// Summed weight of the owner's branch.
    pub cumulative_weight: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Frontier {
    items: VecDeque<OpenSocket>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, socket: OpenSocket) {
        self.items.push_back(socket);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenSocket> {
        self.items.iter()
    }

    /// Removes and returns the next socket for `strategy`.
    pub fn select(&mut self, strategy: GrowthStrategy, rng: &mut dyn Rng) -> Option<OpenSocket> {
        match strategy {
            GrowthStrategy::Dfs => self.items.pop_back(),
            GrowthStrategy::Bfs => self.items.pop_front(),
            GrowthStrategy::Random => {
                let i = rand_index(rng, self.items.len());
                self.items.swap_remove_back(i)
            }
        }
    }
}
