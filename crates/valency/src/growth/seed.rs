//! Resolving seed points to modules.
use glam::Affine3A;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rng::rand01;
use crate::rules::{CompiledBondingRules, ModuleIndex};

/// Where growth starts, optionally naming the module to place there.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPoint {
    pub transform: Affine3A,
    pub module_name: Option<String>,
}

impl SeedPoint {
    pub fn new(transform: Affine3A) -> Self {
        Self {
            transform,
            module_name: None,
        }
    }

    pub fn named(transform: Affine3A, module_name: impl Into<String>) -> Self {
        Self {
            transform,
            module_name: Some(module_name.into()),
        }
    }
}

/// Candidate modules for a seed: modules with the requested name, or every module that
/// exposes at least one socket when the name is absent or unknown.
pub fn seed_candidates(rules: &CompiledBondingRules, seed: &SeedPoint) -> Vec<ModuleIndex> {
    if let Some(name) = seed.module_name.as_deref() {
        let named: Vec<ModuleIndex> = rules.modules_named(name).collect();
        if !named.is_empty() {
            return named;
        }
    }
    (0..rules.module_count())
        .filter(|&m| rules.has_sockets(m))
        .collect()
}

/// Weighted pick among `candidates`. Falls back to the first candidate when all weights
/// are zero.
pub fn pick_weighted(
    rules: &CompiledBondingRules,
    candidates: &[ModuleIndex],
    rng: &mut dyn Rng,
) -> Option<ModuleIndex> {
    let first = *candidates.first()?;
    let total: f32 = candidates.iter().map(|&m| rules.weight(m)).sum();
    if total <= 0.0 {
        return Some(first);
    }
    let mut pick = rand01(rng) * total;
    for &m in candidates {
        pick -= rules.weight(m);
        if pick <= 0.0 {
            return Some(m);
        }
    }
    candidates.last().copied()
}

pub fn resolve_seed_module(
    rules: &CompiledBondingRules,
    seed: &SeedPoint,
    rng: &mut dyn Rng,
) -> Option<ModuleIndex> {
    pick_weighted(rules, &seed_candidates(rules, seed), rng)
}
