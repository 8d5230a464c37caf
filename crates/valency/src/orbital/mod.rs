//! Orbitals: directional connection slots on graph nodes.
//!
//! An orbital is identified by an index in `0..64`; a node's occupied orbitals are a
//! `u64` bitmask. Edges carry a packed pair of one-byte slot indices, one per endpoint.
pub mod cache;
pub mod direction;

pub use cache::OrbitalCache;
pub use direction::{Orbital, OrbitalAssignment, OrbitalSet};

/// Maximum number of orbitals a mask can describe.
pub const MAX_ORBITALS: usize = 64;

/// Slot byte meaning "this endpoint matched no orbital".
pub const NO_ORBITAL_MATCH: u8 = 0xFF;

/// Packed slot pair for an edge where neither endpoint matched an orbital.
pub const UNMATCHED_SLOT_PAIR: u16 = pack_slot_pair(NO_ORBITAL_MATCH, NO_ORBITAL_MATCH);

/// Packs the start node's slot into the low byte and the end node's slot into the high byte.
#[inline]
pub const fn pack_slot_pair(start_slot: u8, end_slot: u8) -> u16 {
    (start_slot as u16) | ((end_slot as u16) << 8)
}

/// Returns `(start_slot, end_slot)`.
#[inline]
pub const fn unpack_slot_pair(packed: u16) -> (u8, u8) {
    ((packed & 0xFF) as u8, (packed >> 8) as u8)
}

/// Bit for orbital `index`, or 0 when the index cannot be represented.
#[inline]
pub const fn orbital_bit(index: usize) -> u64 {
    if index < MAX_ORBITALS {
        1u64 << index
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_pair_layout_is_low_start_high_end() {
        let packed = pack_slot_pair(3, 7);
        assert_eq!(packed, 0x0703);
        assert_eq!(unpack_slot_pair(packed), (3, 7));
    }

    #[test]
    fn unmatched_pair_unpacks_to_sentinels() {
        assert_eq!(
            unpack_slot_pair(UNMATCHED_SLOT_PAIR),
            (NO_ORBITAL_MATCH, NO_ORBITAL_MATCH)
        );
    }

    #[test]
    fn orbital_bit_ignores_out_of_range() {
        assert_eq!(orbital_bit(0), 1);
        assert_eq!(orbital_bit(63), 1 << 63);
        assert_eq!(orbital_bit(64), 0);
    }
}
