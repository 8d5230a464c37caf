//! Frontier-driven growth of module trees from seeds.
//!
//! Seeds are placed first. Every open socket is then taken from the frontier in
//! [`GrowthStrategy`](crate::growth::GrowthStrategy) order and filled with the first
//! compatible module that stays within limits without overlapping earlier placements. A socket's outward direction is its
//! local +Z axis; attaching flips the child socket half a turn about the parent socket's
//! local X so the two sockets face each other.
use std::f32::consts::PI;

use glam::{Affine3A, Quat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventSink, ValencyEvent, ValencyEventKind};
use crate::growth::bounds::BoundsTracker;
use crate::growth::config::GrowthConfig;
use crate::growth::distribution::DistributionTracker;
use crate::growth::frontier::{Frontier, OpenSocket};
use crate::growth::seed::{resolve_seed_module, SeedPoint};
use crate::rng::{hash_combine, rand01, shuffle};
use crate::rules::{Aabb, CompiledBondingRules, ModuleIndex, SocketRules, SocketTypeIndex};

/// One placement, seeds included.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedModule {
    pub module: ModuleIndex,
    pub transform: Affine3A,
    /// Invalid when the module has no bounds.
    pub bounds: Aabb,
    /// `None` for seeds.
    pub parent: Option<usize>,
    pub parent_socket: Option<usize>,
    pub child_socket: Option<usize>,
    pub depth: u32,
    pub cumulative_weight: f32,
    /// Index of the seed this placement grew from.
    pub seed_index: usize,
}

impl PlacedModule {
    pub fn is_seed(&self) -> bool {
        self.parent.is_none()
    }
}

/// Why a run stopped.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    FrontierExhausted,
    BudgetReached,
    HaltedOnFailure,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthResult {
    /// Seeds first, then placements in order.
    pub placed: Vec<PlacedModule>,
    pub seed_count: usize,
    pub termination: Termination,
    pub sockets_processed: usize,
    pub branches_died: usize,
}

impl GrowthResult {
    /// Placements beyond the seeds.
    pub fn grown(&self) -> &[PlacedModule] {
        &self.placed[self.seed_count..]
    }

    pub fn count_of(&self, module: ModuleIndex) -> usize {
        self.placed.iter().filter(|p| p.module == module).count()
    }
}

/// Per-placement output row.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOutput {
    pub module: ModuleIndex,
    pub module_name: String,
    pub transform: Affine3A,
    pub bounds: Aabb,
    pub parent: Option<usize>,
    pub depth: u32,
    pub seed_index: usize,
    /// Deterministic seed for downstream consumers.
    pub seed: u64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    module: ModuleIndex,
    socket: usize,
}

/// Transform of a child whose socket `child_offset` attaches to a parent socket at
/// `parent_socket_world`.
pub fn attach_transform(parent_socket_world: &Affine3A, child_offset: &Affine3A) -> Affine3A {
    let flip = Affine3A::from_quat(Quat::from_rotation_x(PI));
    *parent_socket_world * flip * child_offset.inverse()
}

pub struct GrowthEngine<'a> {
    config: GrowthConfig,
    rules: &'a CompiledBondingRules,
    sockets: &'a SocketRules,
}

impl<'a> GrowthEngine<'a> {
    pub fn try_new(
        config: GrowthConfig,
        rules: &'a CompiledBondingRules,
        sockets: &'a SocketRules,
    ) -> Result<Self> {
        config.validate()?;
        rules.validate()?;
        sockets.validate()?;
        if rules.is_empty() {
            return Err(Error::EmptyInput("compiled rules have no modules".into()));
        }
        for module in 0..rules.module_count() {
            if let Some(socket) = rules
                .sockets(module)
                .iter()
                .find(|s| s.socket_type >= sockets.len())
            {
                return Err(Error::InvalidConfig(format!(
                    "socket '{}' of module '{}' uses unknown socket type {}",
                    socket.name,
                    rules.name(module),
                    socket.socket_type
                )));
            }
        }
        Ok(Self {
            config,
            rules,
            sockets,
        })
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Grows from `seeds` with an rng seeded from the configured seed.
    pub fn run(&self, seeds: &[SeedPoint]) -> Result<GrowthResult> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.run_with_rng(seeds, &mut rng, &mut ())
    }

    /// Grows from `seeds`. Fails only when no seed resolves to a module.
    pub fn run_with_rng(
        &self,
        seeds: &[SeedPoint],
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
    ) -> Result<GrowthResult> {
        if seeds.is_empty() {
            return Err(Error::EmptyInput("no seed points provided".into()));
        }

        let mut state = RunState {
            placed: Vec::new(),
            frontier: Frontier::new(),
            bounds: BoundsTracker::new(),
            distribution: DistributionTracker::new(self.rules),
        };

        for (seed_index, seed) in seeds.iter().enumerate() {
            let Some(module) = resolve_seed_module(self.rules, seed, rng) else {
                warn!("Seed {} resolves to no module; skipping.", seed_index);
                if sink.wants(ValencyEventKind::Warning) {
                    sink.send(ValencyEvent::Warning {
                        context: format!("seed:{seed_index}"),
                        message: "No candidate module for seed".into(),
                    });
                }
                continue;
            };
            if !state.distribution.record_spawn(module) {
                warn!(
                    "Seed {} places '{}' beyond its spawn maximum.",
                    seed_index,
                    self.rules.name(module)
                );
            }
            let bounds = self.world_bounds(module, &seed.transform);
            state.bounds.add(bounds);
            state.placed.push(PlacedModule {
                module,
                transform: seed.transform,
                bounds,
                parent: None,
                parent_socket: None,
                child_socket: None,
                depth: 0,
                cumulative_weight: self.rules.weight(module),
                seed_index: state.placed.len(),
            });
        }

        let seed_count = state.placed.len();
        if seed_count == 0 {
            return Err(Error::EmptyInput("no seed modules could be resolved".into()));
        }
        for index in 0..seed_count {
            self.expand(&mut state, index, None);
        }

        let result = self.grow(state, seed_count, rng, sink);

        info!(
            "Growth placed {} modules from {} seeds ({:?}); {} sockets processed, {} branches died.",
            result.placed.len() - seed_count,
            seed_count,
            result.termination,
            result.sockets_processed,
            result.branches_died
        );
        if sink.wants(ValencyEventKind::GrowthHalted) {
            sink.send(ValencyEvent::GrowthHalted {
                placed: result.placed.len(),
                termination: result.termination,
            });
        }

        Ok(result)
    }

    fn grow(
        &self,
        mut state: RunState,
        seed_count: usize,
        rng: &mut dyn Rng,
        sink: &mut dyn EventSink,
    ) -> GrowthResult {
        let budget = self.config.budget;
        let mut sockets_processed = 0usize;
        let mut branches_died = 0usize;

        let termination = loop {
            let grown = state.placed.len() - seed_count;
            if grown >= budget.max_total_modules {
                break Termination::BudgetReached;
            }
            let Some(socket) = state.frontier.select(self.config.strategy, rng) else {
                break Termination::FrontierExhausted;
            };
            sockets_processed += 1;

            if socket.depth + 1 > budget.max_depth {
                continue;
            }

            let candidates = self.ordered_candidates(
                socket.socket_type,
                &state.distribution,
                budget.max_total_modules - grown,
                rng,
            );

            let mut filled = false;
            for c in &candidates {
                let cumulative = socket.cumulative_weight + self.rules.weight(c.module);
                if budget.max_cumulative_weight.is_some_and(|cap| cumulative > cap) {
                    continue;
                }
                if !state.distribution.can_spawn(c.module) {
                    continue;
                }
                if self.try_place(&mut state, &socket, *c, cumulative, sink) {
                    filled = true;
                    break;
                }
            }

            if !filled {
                branches_died += 1;
                debug!(
                    "Socket {} of placement {} died after {} candidates.",
                    socket.socket_index,
                    socket.placed_index,
                    candidates.len()
                );
                if sink.wants(ValencyEventKind::BranchDied) {
                    sink.send(ValencyEvent::BranchDied {
                        parent: socket.placed_index,
                        socket_index: socket.socket_index,
                        depth: socket.depth,
                        candidates: candidates.len(),
                    });
                }
                if self.config.stop_on_first_failure {
                    break Termination::HaltedOnFailure;
                }
            }
        };

        GrowthResult {
            placed: state.placed,
            seed_count,
            termination,
            sockets_processed,
            branches_died,
        }
    }

    /// Every `(module, socket)` whose socket type connects to `socket_type`.
    fn compatible_candidates(&self, socket_type: SocketTypeIndex) -> Vec<Candidate> {
        let mut out = Vec::new();
        for module in 0..self.rules.module_count() {
            for (socket, s) in self.rules.sockets(module).iter().enumerate() {
                if self.sockets.are_compatible(socket_type, s.socket_type) {
                    out.push(Candidate { module, socket });
                }
            }
        }
        out
    }

    /// Shuffled, then by weight plus a precomputed jitter, then most urgent minimum first
    /// when the remaining budget is at risk.
    fn ordered_candidates(
        &self,
        socket_type: SocketTypeIndex,
        distribution: &DistributionTracker,
        remaining: usize,
        rng: &mut dyn Rng,
    ) -> Vec<Candidate> {
        let mut candidates = self.compatible_candidates(socket_type);
        shuffle(&mut candidates, rng);

        let jitter = self.config.weight_jitter;
        let mut keyed: Vec<(f32, Candidate)> = candidates
            .into_iter()
            .map(|c| (self.rules.weight(c.module) + jitter * rand01(rng), c))
            .collect();
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        let mut ordered: Vec<Candidate> = keyed.into_iter().map(|(_, c)| c).collect();

        if distribution.at_risk(remaining) {
            ordered.sort_by(|a, b| {
                let ua = distribution.urgency(a.module, remaining);
                let ub = distribution.urgency(b.module, remaining);
                ub.total_cmp(&ua)
            });
        }
        ordered
    }

    fn try_place(
        &self,
        state: &mut RunState,
        socket: &OpenSocket,
        candidate: Candidate,
        cumulative_weight: f32,
        sink: &mut dyn EventSink,
    ) -> bool {
        let offset = self.rules.sockets(candidate.module)[candidate.socket].offset;
        let transform = attach_transform(&socket.world, &offset);
        let bounds = self.world_bounds(candidate.module, &transform);
        if state.bounds.overlaps_any(&bounds) {
            return false;
        }
        if !state.distribution.record_spawn(candidate.module) {
            return false;
        }

        let index = state.placed.len();
        let depth = socket.depth + 1;
        state.bounds.add(bounds);
        state.placed.push(PlacedModule {
            module: candidate.module,
            transform,
            bounds,
            parent: Some(socket.placed_index),
            parent_socket: Some(socket.socket_index),
            child_socket: Some(candidate.socket),
            depth,
            cumulative_weight,
            seed_index: state.placed[socket.placed_index].seed_index,
        });

        if sink.wants(ValencyEventKind::PlacementMade) {
            sink.send(ValencyEvent::PlacementMade {
                index,
                module: candidate.module,
                depth,
                parent: Some(socket.placed_index),
            });
        }

        self.expand(state, index, Some(candidate.socket));
        true
    }

    /// Pushes the open sockets of a placement, skipping the one it was attached by.
    fn expand(&self, state: &mut RunState, index: usize, used_socket: Option<usize>) {
        let placed = &state.placed[index];
        if self.rules.is_dead_end(placed.module) {
            return;
        }
        for (socket_index, socket) in self.rules.sockets(placed.module).iter().enumerate() {
            if used_socket == Some(socket_index) {
                continue;
            }
            state.frontier.push(OpenSocket {
                placed_index: index,
                socket_index,
                socket_type: socket.socket_type,
                world: placed.transform * socket.offset,
                depth: placed.depth,
                cumulative_weight: placed.cumulative_weight,
            });
        }
    }

    /// Local bounds, inflated, in world space.
    pub fn world_bounds(&self, module: ModuleIndex, transform: &Affine3A) -> Aabb {
        let local = self.rules.local_bounds(module);
        let local = if self.config.bounds_inflation != 0.0 {
            local.expand_by(self.config.bounds_inflation)
        } else {
            local
        };
        local.transformed(transform)
    }

    /// Output rows with per-placement seeds and, if enabled, local transform variants.
    pub fn outputs(&self, result: &GrowthResult) -> Vec<PlacedOutput> {
        result
            .placed
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let seed = hash_combine(self.config.seed, i);
                let transform = if self.config.apply_local_transforms
                    && self.rules.has_local_transform(p.module)
                {
                    p.transform * self.rules.local_transform(p.module, seed)
                } else {
                    p.transform
                };
                PlacedOutput {
                    module: p.module,
                    module_name: self.rules.name(p.module).to_owned(),
                    transform,
                    bounds: p.bounds,
                    parent: p.parent,
                    depth: p.depth,
                    seed_index: p.seed_index,
                    seed,
                }
            })
            .collect()
    }
}

struct RunState {
    placed: Vec<PlacedModule>,
    frontier: Frontier,
    bounds: BoundsTracker,
    distribution: DistributionTracker,
}
