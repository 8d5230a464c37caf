//! Socket-driven growth: seeds, an open-socket frontier, and a placement loop bounded
//! by budget, spawn limits, and overlap.
pub mod bounds;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod frontier;
pub mod seed;

pub use bounds::BoundsTracker;
pub use config::{GrowthBudget, GrowthConfig, GrowthStrategy};
pub use distribution::DistributionTracker;
pub use engine::{
    attach_transform, GrowthEngine, GrowthResult, PlacedModule, PlacedOutput, Termination,
};
pub use frontier::{Frontier, OpenSocket};
pub use seed::{pick_weighted, resolve_seed_module, seed_candidates, SeedPoint};
