//! Deterministic randomness helpers shared by the matcher and the growth engine.
//!
//! Every random draw in the crate goes through a caller-provided [`Rng`], so a
//! cluster seeded with [`seed_for_cluster`] reproduces the same placements on every run.
use rand::Rng;

/// Generate a random float in the range [0, 1).
#[inline]
pub fn rand01(rng: &mut dyn Rng) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Uniform index in `0..len`. Returns 0 when `len` is 0 or 1.
#[inline]
pub fn rand_index(rng: &mut dyn Rng, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    (rng.next_u64() % len as u64) as usize
}

/// Fisher–Yates shuffle.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn Rng) {
    for i in (1..items.len()).rev() {
        let j = rand_index(rng, i + 1);
        items.swap(i, j);
    }
}

/// Creates a deterministic seed for one cluster from a base seed.
pub fn seed_for_cluster(base_seed: u64, cluster_index: usize) -> u64 {
    let c = cluster_index as u64;
    mix_u64(base_seed ^ c.wrapping_mul(0x9E3779B97F4A7C15))
}

/// Combines a seed with an index into a new well-mixed seed.
pub fn hash_combine(seed: u64, index: usize) -> u64 {
    mix_u64(seed.wrapping_add((index as u64).wrapping_mul(0xBF58476D1CE4E5B9)))
}

#[inline]
pub(crate) fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}


#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::testing::FixedRng;
    use super::*;

    #[test]
    fn rand01_returns_zero_for_zero_input() {
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand01(&mut rng), 0.0);
    }

    #[test]
    fn rand01_values_in_range() {
        for value in [0, 1, 1000, u32::MAX / 2, u32::MAX] {
            let mut rng = FixedRng { value };
            let result = rand01(&mut rng);
            assert!(
                (0.0..=1.0).contains(&result),
                "rand01({value}) = {result} is out of range"
            );
        }
    }

    #[test]
    fn rand_index_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for len in 1..20 {
            for _ in 0..50 {
                assert!(rand_index(&mut rng, len) < len);
            }
        }
        assert_eq!(rand_index(&mut rng, 0), 0);
    }

    #[test]
    fn shuffle_is_a_permutation_and_deterministic() {
        let mut a: Vec<u32> = (0..32).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(11));
        shuffle(&mut b, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn cluster_seeds_differ_per_cluster() {
        let a = seed_for_cluster(42, 0);
        let b = seed_for_cluster(42, 1);
        assert_ne!(a, b);
        assert_eq!(a, seed_for_cluster(42, 0));
    }

    #[test]
    fn hash_combine_depends_on_index() {
        assert_ne!(hash_combine(7, 0), hash_combine(7, 1));
        assert_eq!(hash_combine(7, 5), hash_combine(7, 5));
    }
}
