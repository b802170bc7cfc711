// Test-case factories: originals and their locally edited variants.

use rand::Rng;

use super::base::generate_base;
use super::exp_size;
use super::mix::combine;
use super::mutate::{mutate_global, mutate_local};

/// Most extra buffers mixed into a fresh original.
const MAX_EXTRA_MIXES: usize = 3;
/// Most global mutation rounds applied to a fresh original.
const MAX_GLOBAL_ROUNDS: usize = 3;

/// Size and variant tuning for test-case generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenConfig {
    /// Lower bound of `log2(original size)`.
    pub min_size_log2: f64,
    /// Upper bound of `log2(original size)` (exclusive).
    pub max_size_log2: f64,
    /// Most local mutation rounds used to derive a variant.
    pub max_variant_rounds: usize,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            min_size_log2: 8.0,  // 256 B
            max_size_log2: 22.0, // 4 MiB
            max_variant_rounds: 2,
        }
    }
}

/// Generate an original test buffer with an exponentially distributed size.
pub fn generate_original<R: Rng>(rng: &mut R, config: &GenConfig) -> Vec<u8> {
    let size = exp_size(rng, config.min_size_log2, config.max_size_log2);
    generate_original_sized(rng, size)
}

/// Generate an original test buffer of exactly `size` bytes.
///
/// A base buffer is mixed with 0-3 more synthesized buffers, then receives
/// 0-3 global mutations.
pub fn generate_original_sized<R: Rng>(rng: &mut R, size: usize) -> Vec<u8> {
    let mut data = generate_base(rng, size);
    for _ in 0..rng.random_range(0..=MAX_EXTRA_MIXES) {
        let extra = generate_base(rng, size);
        data = combine(rng, data, &extra);
    }
    for _ in 0..rng.random_range(0..=MAX_GLOBAL_ROUNDS) {
        data = mutate_global(rng, data);
    }
    data
}

/// Derive a modified variant of `original` with 0 to `max_variant_rounds`
/// local mutations. Zero rounds yields an exact copy.
pub fn generate_variant<R: Rng>(rng: &mut R, original: &[u8], config: &GenConfig) -> Vec<u8> {
    let rounds = rng.random_range(0..=config.max_variant_rounds);
    generate_variant_rounds(rng, original, rounds)
}

/// Derive a variant of `original` with exactly `rounds` local mutations.
pub fn generate_variant_rounds<R: Rng>(rng: &mut R, original: &[u8], rounds: usize) -> Vec<u8> {
    let mut variant = original.to_vec();
    for _ in 0..rounds {
        variant = mutate_local(rng, variant);
    }
    variant
}
