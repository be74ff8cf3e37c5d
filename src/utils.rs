/// Multiplier of the [Fibonacci hashing][fibonacci-hashing] scheme: `2^64 / φ`.
///
/// [fibonacci-hashing]: https://en.wikipedia.org/wiki/Hash_function#Fibonacci_hashing
const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Final avalanche step of [SplitMix64][splitmix].
///
/// ```text
/// x -> (x ^ (x >> 30)) * C1 -> (x ^ (x >> 27)) * C2 -> x ^ (x >> 31)
/// ```
///
/// [splitmix]: https://prng.di.unimi.it/splitmix64.c
pub fn finalize(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Combine an accumulated hash with the next value.
///
/// Order-sensitive: `mix(mix(h, a), b) != mix(mix(h, b), a)` in general,
/// which is what sibling order in a Safra tree requires.
pub fn mix(seed: u64, value: u64) -> u64 {
    finalize(seed.rotate_left(5) ^ value.wrapping_mul(GOLDEN))
}

/// Fold a sequence of values into one hash.
pub fn mix_all(seed: u64, values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(seed, mix)
}

pub trait MyHash {
    /// Deterministic structural hash.
    ///
    /// Equal values must hash equally, independent of process or run.
    fn hash(&self) -> u64;
}

impl MyHash for u64 {
    fn hash(&self) -> u64 {
        finalize(*self)
    }
}

impl MyHash for (u64, u64) {
    fn hash(&self) -> u64 {
        mix(finalize(self.0), self.1)
    }
}

impl MyHash for (u64, u64, u64) {
    fn hash(&self) -> u64 {
        mix(mix(finalize(self.0), self.1), self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_zero() {
        // SplitMix64 maps 0 to 0; everything else avalanches.
        assert_eq!(finalize(0), 0);
        assert_ne!(finalize(1), 1);
        assert_ne!(finalize(1), finalize(2));
    }

    #[test]
    fn test_mix_is_order_sensitive() {
        let ab = mix(mix(7, 1), 2);
        let ba = mix(mix(7, 2), 1);
        assert_ne!(ab, ba);
        assert_eq!(ab, mix_all(7, [1, 2]));
    }

    #[test]
    fn test_mix_large_values() {
        // Must not overflow in debug builds.
        let h = mix_all(u64::MAX, [u64::MAX, u64::MAX - 1, 0]);
        assert_eq!(h, mix(mix(mix(u64::MAX, u64::MAX), u64::MAX - 1), 0));
    }

    #[test]
    fn test_tuples() {
        assert_eq!(MyHash::hash(&(1u64, 2u64)), MyHash::hash(&(1u64, 2u64)));
        assert_ne!(MyHash::hash(&(1u64, 2u64)), MyHash::hash(&(2u64, 1u64)));
        assert_ne!(
            MyHash::hash(&(1u64, 2u64, 3u64)),
            MyHash::hash(&(3u64, 2u64, 1u64))
        );
    }
}
