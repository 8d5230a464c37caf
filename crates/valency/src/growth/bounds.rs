//! Linear-scan overlap tracking for placed bounds.
use crate::rules::Aabb;

/// World bounds of every placement so far. Invalid boxes are never stored.
#[derive(Debug, Clone, Default)]
pub struct BoundsTracker {
    boxes: Vec<Aabb>,
}

impl BoundsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and stores nothing for an invalid box.
    pub fn add(&mut self, bounds: Aabb) -> bool {
        if !bounds.is_valid() {
            return false;
        }
        self.boxes.push(bounds);
        true
    }

    pub fn overlaps_any(&self, bounds: &Aabb) -> bool {
        bounds.is_valid() && self.boxes.iter().any(|b| b.overlaps(bounds))
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
    }
}
