// Randomized input synthesis and mutation.
//
// Every entry point takes an explicit `&mut R: Rng` so a whole fuzz case can
// be replayed from one recorded seed.

pub mod base;
pub mod factory;
pub mod mix;
pub mod mutate;

use rand::Rng;

pub use base::{BasePattern, generate_base};
pub use factory::{
    GenConfig, generate_original, generate_original_sized, generate_variant,
    generate_variant_rounds,
};
pub use mix::{MixError, MixStrategy, mix, mix_with};
pub use mutate::{mutate_global, mutate_local};

/// Draw `2^u` for `u` uniform in `[lo_log2, hi_log2)`, truncated to an integer.
///
/// Sizes drawn this way spread evenly across orders of magnitude, so tiny and
/// huge values are both common.
pub fn exp_size<R: Rng>(rng: &mut R, lo_log2: f64, hi_log2: f64) -> usize {
    let exp = if hi_log2 > lo_log2 {
        rng.random_range(lo_log2..hi_log2)
    } else {
        lo_log2
    };
    2f64.powf(exp) as usize
}

/// Overwrite `count` distinct positions of `buf` with random bytes.
///
/// `count` is clamped to `buf.len()`.
pub fn scatter_bytes<R: Rng>(rng: &mut R, buf: &mut [u8], count: usize) {
    let count = count.min(buf.len());
    if count == 0 {
        return;
    }
    for pos in rand::seq::index::sample(rng, buf.len(), count) {
        buf[pos] = rng.random();
    }
}
