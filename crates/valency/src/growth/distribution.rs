//! Per-module spawn counting against declared minimums and maximums.
use crate::rules::{CompiledBondingRules, ModuleIndex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionTracker {
    counts: Vec<u32>,
    min: Vec<u32>,
    max: Vec<Option<u32>>,
}

impl DistributionTracker {
    pub fn new(rules: &CompiledBondingRules) -> Self {
        let n = rules.module_count();
        Self {
            counts: vec![0; n],
            min: (0..n).map(|m| rules.min_spawns(m)).collect(),
            max: (0..n).map(|m| rules.max_spawns(m)).collect(),
        }
    }

    /// Counts one spawn. Refuses (and counts nothing) when the module is at its maximum.
    pub fn record_spawn(&mut self, module: ModuleIndex) -> bool {
        if !self.can_spawn(module) {
            return false;
        }
        self.counts[module] += 1;
        true
    }

    #[inline]
    pub fn can_spawn(&self, module: ModuleIndex) -> bool {
        match (self.counts.get(module), self.max.get(module)) {
            (Some(&count), Some(&max)) => max.is_none_or(|max| count < max),
            _ => false,
        }
    }

    pub fn spawn_count(&self, module: ModuleIndex) -> u32 {
        self.counts.get(module).copied().unwrap_or(0)
    }

    /// Spawns still needed to reach the module's minimum.
    pub fn deficit(&self, module: ModuleIndex) -> u32 {
        match (self.min.get(module), self.counts.get(module)) {
            (Some(&min), Some(&count)) => min.saturating_sub(count),
            _ => 0,
        }
    }

    pub fn needs_minimum(&self, module: ModuleIndex) -> bool {
        self.deficit(module) > 0
    }

    pub fn modules_needing_minimum(&self) -> impl Iterator<Item = ModuleIndex> + '_ {
        (0..self.counts.len()).filter(|&m| self.needs_minimum(m))
    }

    pub fn modules_at_maximum(&self) -> impl Iterator<Item = ModuleIndex> + '_ {
        (0..self.counts.len()).filter(|&m| !self.can_spawn(m))
    }

    /// Sum of all deficits.
    pub fn outstanding_minimum(&self) -> u64 {
        (0..self.counts.len()).map(|m| self.deficit(m) as u64).sum()
    }

    /// Deficit over remaining placements; 1.0 or more means the module must be chosen now.
    pub fn urgency(&self, module: ModuleIndex, remaining: usize) -> f32 {
        let deficit = self.deficit(module);
        if deficit == 0 {
            return 0.0;
        }
        if remaining == 0 {
            return f32::INFINITY;
        }
        deficit as f32 / remaining as f32
    }

    /// Outstanding minimums can no longer all be met unless they are preferred.
    pub fn at_risk(&self, remaining: usize) -> bool {
        let outstanding = self.outstanding_minimum();
        outstanding > 0 && outstanding >= remaining as u64
    }
}
