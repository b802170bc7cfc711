// Baseline buffer synthesis.
//
// Produces buffers with a coarse structure (constant runs, byte ramps,
// periodic ramps, noise) that a block-matching delta tool handles very
// differently.

use rand::Rng;

/// Shortest period of the periodic ramp pattern.
pub const MIN_PERIOD: usize = 1024;
/// Longest period of the periodic ramp pattern.
pub const MAX_PERIOD: usize = 4096;
/// Offset added to every byte of the periodic ramp.
const PERIODIC_OFFSET: usize = 13;

/// Structural pattern of a synthesized baseline buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasePattern {
    /// Every byte has the same value.
    Constant(u8),
    /// Byte `i` is `i mod 256`.
    Ramp,
    /// Byte `i` is `((i mod period) + 13) mod 256`.
    ///
    /// Periods in `[1024, 4096]` land on and between common block sizes.
    Periodic { period: usize },
    /// Uniformly random bytes.
    Random,
}

impl BasePattern {
    /// Pick a pattern: 20% constant, 20% ramp, 20% periodic, 40% random.
    ///
    /// Constant buffers are all-zero 30% of the time.
    pub fn choose<R: Rng>(rng: &mut R) -> Self {
        let t: f64 = rng.random();
        if t < 0.2 {
            let value = if rng.random_bool(0.3) { 0 } else { rng.random() };
            Self::Constant(value)
        } else if t < 0.4 {
            Self::Ramp
        } else if t < 0.6 {
            Self::Periodic {
                period: rng.random_range(MIN_PERIOD..=MAX_PERIOD),
            }
        } else {
            Self::Random
        }
    }

    /// Render `size` bytes of this pattern.
    ///
    /// The RNG is only consumed by [`BasePattern::Random`]. A zero period is
    /// treated as period 1.
    pub fn render<R: Rng>(self, rng: &mut R, size: usize) -> Vec<u8> {
        match self {
            Self::Constant(value) => vec![value; size],
            Self::Ramp => (0..size).map(|i| i as u8).collect(),
            Self::Periodic { period } => {
                let period = period.max(1);
                (0..size)
                    .map(|i| ((i % period) + PERIODIC_OFFSET) as u8)
                    .collect()
            }
            Self::Random => {
                let mut buf = vec![0u8; size];
                rng.fill(buf.as_mut_slice());
                buf
            }
        }
    }
}

/// Synthesize a baseline buffer of exactly `size` bytes with a randomly chosen pattern.
pub fn generate_base<R: Rng>(rng: &mut R, size: usize) -> Vec<u8> {
    BasePattern::choose(rng).render(rng, size)
}
