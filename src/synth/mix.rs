// Combining two equal-length buffers into one.

use rand::Rng;

/// Error returned when mixing buffers of different lengths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MixError {
    #[error("cannot mix buffers of different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// How two buffers `a` and `b` of length `size` are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixStrategy {
    /// `a[..at] ++ b[..size - at]`.
    ///
    /// The tail comes from the *start* of `b`, not from `b[at..]`.
    Splice { at: usize },
    /// `a[..start] ++ b[..end - start] ++ a[start..start + size - end]`.
    WindowSwap { start: usize, end: usize },
    /// Byte-wise XOR, computed in place in `a`.
    Xor,
    /// Alternate randomly sized chunks of `a` and `b`, each read from its own
    /// cursor. Chunk lengths are `2^(u * log_max) + 1` for `u` uniform in `[0, 1)`.
    Interleave { log_max: u32 },
}

impl MixStrategy {
    /// Pick a strategy for buffers of length `size` (must be non-zero):
    /// 20% splice, 20% window swap, 20% XOR, 40% interleave.
    pub fn choose<R: Rng>(rng: &mut R, size: usize) -> Self {
        debug_assert!(size > 0);
        let last = size.saturating_sub(1);
        let t: f64 = rng.random();
        if t < 0.2 {
            Self::Splice {
                at: rng.random_range(0..=last),
            }
        } else if t < 0.4 {
            let x = rng.random_range(0..=last);
            let y = rng.random_range(0..=last);
            Self::WindowSwap {
                start: x.min(y),
                end: x.max(y),
            }
        } else if t < 0.6 {
            Self::Xor
        } else {
            Self::Interleave {
                log_max: rng.random_range(6..=12),
            }
        }
    }
}

/// Mix two equal-length buffers with a randomly chosen strategy.
///
/// Returns a buffer of exactly `a.len()` bytes. Empty inputs are returned
/// unchanged without consuming randomness.
pub fn mix<R: Rng>(rng: &mut R, a: Vec<u8>, b: &[u8]) -> Result<Vec<u8>, MixError> {
    check_lengths(&a, b)?;
    Ok(combine(rng, a, b))
}

/// Mix two equal-length buffers with an explicit strategy.
///
/// Positions in `strategy` are clamped to the buffer length.
pub fn mix_with<R: Rng>(
    rng: &mut R,
    strategy: MixStrategy,
    a: Vec<u8>,
    b: &[u8],
) -> Result<Vec<u8>, MixError> {
    check_lengths(&a, b)?;
    if a.is_empty() {
        return Ok(a);
    }
    Ok(apply(rng, strategy, a, b))
}

fn check_lengths(a: &[u8], b: &[u8]) -> Result<(), MixError> {
    if a.len() != b.len() {
        return Err(MixError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Mix buffers already known to share a length.
pub(crate) fn combine<R: Rng>(rng: &mut R, a: Vec<u8>, b: &[u8]) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return a;
    }
    let strategy = MixStrategy::choose(rng, a.len());
    apply(rng, strategy, a, b)
}

fn apply<R: Rng>(rng: &mut R, strategy: MixStrategy, mut a: Vec<u8>, b: &[u8]) -> Vec<u8> {
    let size = a.len();
    match strategy {
        MixStrategy::Splice { at } => {
            let at = at.min(size);
            a.truncate(at);
            a.extend_from_slice(&b[..size - at]);
            a
        }
        MixStrategy::WindowSwap { start, end } => {
            let end = end.min(size);
            let start = start.min(end);
            let mut out = Vec::with_capacity(size);
            out.extend_from_slice(&a[..start]);
            out.extend_from_slice(&b[..end - start]);
            out.extend_from_slice(&a[start..start + (size - end)]);
            out
        }
        MixStrategy::Xor => {
            for (x, y) in a.iter_mut().zip(b) {
                *x ^= y;
            }
            a
        }
        MixStrategy::Interleave { log_max } => {
            let mut out = Vec::with_capacity(size);
            let mut cursors = [0usize; 2];
            while out.len() < size {
                let which = usize::from(rng.random_bool(0.5));
                let source: &[u8] = if which == 0 { &a } else { b };
                let u: f64 = rng.random();
                let chunk = 2f64.powf(u * f64::from(log_max)) as usize + 1;
                let cursor = cursors[which];
                let take = chunk.min(size - cursor);
                out.extend_from_slice(&source[cursor..cursor + take]);
                cursors[which] += take;
            }
            out.truncate(size);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn xor_scenario() {
        let out = mix_with(&mut rng(), MixStrategy::Xor, vec![0xFF; 8], &[0x0F; 8]).unwrap();
        assert_eq!(out, vec![0xF0; 8]);
    }

    #[test]
    fn splice_takes_tail_from_start_of_b() {
        let a = vec![1, 2, 3, 4, 5];
        let b = [10, 20, 30, 40, 50];
        let out = mix_with(&mut rng(), MixStrategy::Splice { at: 2 }, a, &b).unwrap();
        assert_eq!(out, vec![1, 2, 10, 20, 30]);
    }

    #[test]
    fn window_swap_borrows_middle_from_b() {
        let a = vec![1, 2, 3, 4, 5, 6];
        let b = [10, 20, 30, 40, 50, 60];
        let out = mix_with(
            &mut rng(),
            MixStrategy::WindowSwap { start: 1, end: 4 },
            a,
            &b,
        )
        .unwrap();
        // a[..1] ++ b[..3] ++ a[1..3]
        assert_eq!(out, vec![1, 10, 20, 30, 2, 3]);
    }

    #[test]
    fn interleave_draws_from_both_cursors() {
        let a = vec![0u8; 10_000];
        let b = [1u8; 10_000];
        let out = mix_with(&mut rng(), MixStrategy::Interleave { log_max: 6 }, a, &b).unwrap();
        assert_eq!(out.len(), 10_000);
        assert!(out.contains(&0) && out.contains(&1));
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = mix(&mut rng(), vec![0; 3], &[0; 4]).unwrap_err();
        assert_eq!(err, MixError::LengthMismatch { left: 3, right: 4 });
        let err = mix_with(&mut rng(), MixStrategy::Xor, vec![], &[0]).unwrap_err();
        assert_eq!(err, MixError::LengthMismatch { left: 0, right: 1 });
    }

    #[test]
    fn empty_inputs_mix_to_empty() {
        assert!(mix(&mut rng(), Vec::new(), &[]).unwrap().is_empty());
        assert!(
            mix_with(&mut rng(), MixStrategy::Splice { at: 3 }, Vec::new(), &[])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn every_strategy_preserves_length() {
        let mut rng = rng();
        for size in [1usize, 2, 17, 4096, 9000] {
            for _ in 0..40 {
                let a: Vec<u8> = (0..size).map(|i| i as u8).collect();
                let b = vec![0xAB; size];
                assert_eq!(mix(&mut rng, a, &b).unwrap().len(), size);
            }
        }
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        let out = mix_with(
            &mut rng(),
            MixStrategy::WindowSwap { start: 50, end: 100 },
            vec![1, 2, 3],
            &[4, 5, 6],
        )
        .unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }
}
