//! Growth configuration.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the next open socket is taken from the frontier.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GrowthStrategy {
    /// Newest socket first; grows long tendrils.
    Dfs,
    /// Oldest socket first; grows in rings around the seeds.
    #[default]
    Bfs,
    /// Uniformly random socket; organic growth.
    Random,
}

/// Limits that bound a growth run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthBudget {
    /// Placements beyond the seeds.
    pub max_total_modules: usize,
    /// Deepest allowed placement; seeds have depth 0.
    pub max_depth: u32,
    /// Cap on the summed module weight along one branch.
    pub max_cumulative_weight: Option<f32>,
}

impl Default for GrowthBudget {
    fn default() -> Self {
        Self {
            max_total_modules: 256,
            max_depth: 32,
            max_cumulative_weight: None,
        }
    }
}

/// Configuration for a [`crate::growth::GrowthEngine`].
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthConfig {
    pub strategy: GrowthStrategy,
    pub budget: GrowthBudget,
    /// Halt the whole run at the first socket that cannot be filled.
    pub stop_on_first_failure: bool,
    /// Added to every face of a module's local bounds before the overlap test.
    pub bounds_inflation: f32,
    /// Base seed for the default rng and for per-placement output seeds.
    pub seed: u64,
    /// Upper bound of the random bonus added to a candidate's weight when ordering.
    pub weight_jitter: f32,
    /// Apply each module's seeded local transform variant to output transforms.
    pub apply_local_transforms: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            strategy: GrowthStrategy::Bfs,
            budget: GrowthBudget::default(),
            stop_on_first_failure: false,
            bounds_inflation: 0.0,
            seed: 0,
            weight_jitter: 0.05,
            apply_local_transforms: false,
        }
    }
}

impl GrowthConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: GrowthStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the whole growth budget.
    pub fn with_budget(mut self, budget: GrowthBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the maximum number of non-seed placements.
    pub fn with_max_total_modules(mut self, max_total_modules: usize) -> Self {
        self.budget.max_total_modules = max_total_modules;
        self
    }

    /// Sets the maximum placement depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.budget.max_depth = max_depth;
        self
    }

    /// Sets the cap on summed module weight along a branch.
    pub fn with_max_cumulative_weight(mut self, max_cumulative_weight: f32) -> Self {
        self.budget.max_cumulative_weight = Some(max_cumulative_weight);
        self
    }

    /// Sets whether the first unfillable socket halts the run.
    pub fn with_stop_on_first_failure(mut self, stop_on_first_failure: bool) -> Self {
        self.stop_on_first_failure = stop_on_first_failure;
        self
    }

    /// Sets the bounds inflation.
    pub fn with_bounds_inflation(mut self, bounds_inflation: f32) -> Self {
        self.bounds_inflation = bounds_inflation;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the weight jitter.
    pub fn with_weight_jitter(mut self, weight_jitter: f32) -> Self {
        self.weight_jitter = weight_jitter;
        self
    }

    /// Sets whether output transforms include local transform variants.
    pub fn with_local_transforms(mut self, apply_local_transforms: bool) -> Self {
        self.apply_local_transforms = apply_local_transforms;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.bounds_inflation.is_finite() {
            return Err(Error::InvalidConfig("bounds_inflation must be finite".into()));
        }
        if !self.weight_jitter.is_finite() || self.weight_jitter < 0.0 {
            return Err(Error::InvalidConfig("weight_jitter must be >= 0".into()));
        }
        if let Some(cap) = self.budget.max_cumulative_weight {
            if !cap.is_finite() || cap < 0.0 {
                return Err(Error::InvalidConfig(
                    "max_cumulative_weight must be finite and >= 0".into(),
                ));
            }
        }
        Ok(())
    }
}
