//! Packed 64-bit references used in per-node attribute streams.
//!
//! Both encodings reserve bit 32 as a presence flag. The all-zero word therefore always
//! means "no value" while index 0 in the payload stays a valid reference.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::NodeState;

const PRESENT: u64 = 1 << 32;

/// Reference to one socket of one rules asset: `rules_index` in bits 40..56,
/// presence in bit 32, `socket_index` in bits 0..32.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedSocketRef(pub u64);

impl PackedSocketRef {
    pub const INVALID: PackedSocketRef = PackedSocketRef(0);

    pub const fn pack(rules_index: u16, socket_index: u32) -> Self {
        Self(((rules_index as u64) << 40) | PRESENT | socket_index as u64)
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 & PRESENT != 0
    }

    /// `(rules_index, socket_index)`, or `None` for [`Self::INVALID`].
    pub const fn unpack(self) -> Option<(u16, u32)> {
        if !self.is_valid() {
            return None;
        }
        Some((((self.0 >> 40) & 0xFFFF) as u16, self.0 as u32))
    }
}

/// A [`NodeState`] packed as raw `i32` in bits 0..32 plus the presence bit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedModuleData(pub u64);

impl PackedModuleData {
    pub const INVALID: PackedModuleData = PackedModuleData(0);

    pub fn pack(state: NodeState) -> Self {
        Self(PRESENT | state.to_raw() as u32 as u64)
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 & PRESENT != 0
    }

    /// Decoded state; an invalid word decodes as [`NodeState::Unset`].
    pub fn state(self) -> NodeState {
        if !self.is_valid() {
            return NodeState::Unset;
        }
        NodeState::from_raw(self.0 as u32 as i32)
    }
}

impl From<NodeState> for PackedModuleData {
    fn from(state: NodeState) -> Self {
        Self::pack(state)
    }
}
