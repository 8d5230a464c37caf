//! Axis-aligned bounding boxes for placed modules.
use glam::{Affine3A, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Faces closer than this are treated as touching, not overlapping.
pub const OVERLAP_TOLERANCE: f32 = 1e-4;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Aabb {
    /// A box that never overlaps anything. Modules without bounds use it.
    pub const INVALID: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Finite and `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grows every face by `amount`; a negative amount shrinks and may invalidate the box.
    pub fn expand_by(&self, amount: f32) -> Self {
        if !self.is_valid() {
            return *self;
        }
        let delta = Vec3::splat(amount);
        Self::new(self.min - delta, self.max + delta)
    }

    /// Box enclosing the eight transformed corners.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        if !self.is_valid() {
            return Self::INVALID;
        }
        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = transform.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self::new(min, max)
    }

    /// Strict overlap test. Invalid boxes never overlap and shared faces do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let t = OVERLAP_TOLERANCE;
        self.min.x < other.max.x - t
            && self.max.x > other.min.x + t
            && self.min.y < other.max.y - t
            && self.max.y > other.min.y + t
            && self.min.z < other.max.z - t
            && self.max.z > other.min.z + t
    }
}
