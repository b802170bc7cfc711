// Buffer mutators.
//
// Global mutations perturb a buffer broadly without changing its length.
// Local mutations imitate incremental edits between two versions of a file:
// small patches, inserted or deleted spans, moved blocks.

use rand::Rng;

use super::base::generate_base;
use super::mix::combine;
use super::{exp_size, scatter_bytes};

/// Size of the replacement buffer synthesized when a local mutation is asked
/// to edit an empty buffer.
pub const EMPTY_FALLBACK_SIZE: usize = 1024;

/// Apply one broad mutation to `buf`; the length never changes.
///
/// Half of the time a sparse set of positions (one per `2^[3, 15)` bytes, at
/// least one) is overwritten with random bytes; otherwise a random span
/// `[l, r)` is reversed. Empty buffers are returned untouched.
pub fn mutate_global<R: Rng>(rng: &mut R, mut buf: Vec<u8>) -> Vec<u8> {
    let size = buf.len();
    if size == 0 {
        return buf;
    }
    if rng.random_bool(0.5) {
        let granularity = exp_size(rng, 3.0, 15.0).max(1);
        scatter_bytes(rng, &mut buf, (size / granularity).max(1));
    } else {
        let x = rng.random_range(0..size);
        let y = rng.random_range(0..size);
        buf[x.min(y)..x.max(y)].reverse();
    }
    buf
}

/// Apply one edit-like mutation to `buf`.
///
/// An empty input is replaced by a freshly synthesized 1024-byte buffer.
/// Otherwise: 20% sparse substitution, 40% insertion/deletion rounds, 20%
/// block relocation, 20% mixing with a same-size synthesized buffer.
pub fn mutate_local<R: Rng>(rng: &mut R, buf: Vec<u8>) -> Vec<u8> {
    if buf.is_empty() {
        return generate_base(rng, EMPTY_FALLBACK_SIZE);
    }
    let t: f64 = rng.random();
    if t < 0.2 {
        substitute(rng, buf)
    } else if t < 0.6 {
        insert_or_delete(rng, buf)
    } else if t < 0.8 {
        relocate_blocks(rng, buf)
    } else {
        let noise = generate_base(rng, buf.len());
        combine(rng, buf, &noise)
    }
}

fn substitute<R: Rng>(rng: &mut R, mut buf: Vec<u8>) -> Vec<u8> {
    let size = buf.len();
    let count = if rng.random_bool(0.5) {
        rng.random_range(1..=3)
    } else {
        size / (1 + exp_size(rng, 3.0, 16.0))
    };
    scatter_bytes(rng, &mut buf, count.clamp(1, size));
    buf
}

fn insert_or_delete<R: Rng>(rng: &mut R, mut buf: Vec<u8>) -> Vec<u8> {
    let insert = rng.random_bool(0.5);
    let rounds = rng.random_range(1..=3);
    for _ in 0..rounds {
        let len = buf.len();
        if len == 0 {
            break;
        }
        let size = exp_size(rng, 1.0, 15.0);
        if insert {
            let pos = rng.random_range(0..=len);
            let fresh = generate_base(rng, size.min(len * 2));
            buf.splice(pos..pos, fresh);
        } else {
            let size = deletion_len(len, size, rng.random_bool(0.5));
            let pos = rng.random_range(0..=len - size);
            delete_span(&mut buf, pos, size);
        }
    }
    buf
}

/// Bytes a deletion round removes from a buffer of `len > 0` bytes: `size`
/// clamped to `[1, len - 1]`, or what remains after that when `complement`.
fn deletion_len(len: usize, size: usize, complement: bool) -> usize {
    let size = size.min(len - 1).max(1);
    if complement { len - size } else { size }
}

fn delete_span(buf: &mut Vec<u8>, pos: usize, size: usize) {
    buf.drain(pos..pos + size);
}

fn relocate_blocks<R: Rng>(rng: &mut R, mut buf: Vec<u8>) -> Vec<u8> {
    let rounds = if rng.random_bool(0.7) {
        rng.random_range(1..=3)
    } else {
        rng.random_range(100..=300)
    };
    for _ in 0..rounds {
        let src = rng.random_range(0..=buf.len());
        let size = exp_size(rng, 10.0, 16.0).min(buf.len() - src);
        let cut = rng.random_bool(0.8);
        let part = lift_block(&mut buf, src, size, cut);
        let dst = rng.random_range(0..=buf.len());
        paste_over(&mut buf, dst, part);
    }
    buf
}

/// Take `[src, src + size)` out of `buf`, removing it when `cut`.
fn lift_block(buf: &mut Vec<u8>, src: usize, size: usize, cut: bool) -> Vec<u8> {
    if cut {
        buf.drain(src..src + size).collect()
    } else {
        buf[src..src + size].to_vec()
    }
}

// Overwrites `[dst, dst + part.len())` clamped to the end of `buf`, so the
// buffer grows when the block runs past it.
fn paste_over(buf: &mut Vec<u8>, dst: usize, part: Vec<u8>) {
    let end = (dst + part.len()).min(buf.len());
    buf.splice(dst..end, part);
}
