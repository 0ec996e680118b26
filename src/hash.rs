//! Hash families and the round combiner.
//!
//! A family is any pure function of `(key, round)`. The builder in
//! `table` evaluates the same `(key, round)` pairs many times across
//! construction attempts and requires identical results every time, so
//! implementations must carry no hidden state.
//!
//! Two scan policies ship with the crate:
//! - whole-key ([`FibMix`], [`Xxh3`]): every byte of the key feeds every
//!   round; the round index only seeds the mix.
//! - prefix ([`FibMixPrefix`]): round `r` scans only the first `r + 1`
//!   bytes. Cheaper for long keys, but low rounds separate keys poorly,
//!   so builds may need more rounds to converge.

use xxhash_rust::xxh3::xxh3_64_with_seed;

pub(crate) const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;

/// One member-per-round hash family.
///
/// Rounds start at 1 and act as a domain separator: distinct rounds
/// should behave like independent hash functions over the same key.
pub trait HashFamily {
    /// Hash `key` for `round`. Must be deterministic: identical
    /// `(key, round)` inputs yield identical outputs.
    fn hash(&self, key: &[u8], round: u32) -> u64;
}

impl<F: HashFamily + ?Sized> HashFamily for &F {
    #[inline]
    fn hash(&self, key: &[u8], round: u32) -> u64 {
        (**self).hash(key, round)
    }
}

/// Adapter turning a plain `fn(&[u8], u32) -> u64` (or closure) into a
/// family, for callers that pick hash functions dynamically.
#[derive(Clone, Copy, Debug)]
pub struct FnFamily<F>(pub F);

impl<F: Fn(&[u8], u32) -> u64> HashFamily for FnFamily<F> {
    #[inline]
    fn hash(&self, key: &[u8], round: u32) -> u64 {
        (self.0)(key, round)
    }
}

#[inline]
fn fib_seed(round: u32) -> u64 {
    GOLDEN.wrapping_mul(round as u64)
}

#[inline]
fn fib_step(h: u64, byte: u8) -> u64 {
    h ^ (byte as u64)
        .wrapping_add(GOLDEN)
        .wrapping_add(h << 6)
        .wrapping_add(h >> 2)
}

/// Whole-key policy: a Fibonacci-constant byte mix seeded by the round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FibMix;

impl HashFamily for FibMix {
    #[inline]
    fn hash(&self, key: &[u8], round: u32) -> u64 {
        let mut h = fib_seed(round);
        for &b in key {
            h = fib_step(h, b);
        }
        h
    }
}

/// Prefix policy: same mix as [`FibMix`], but round `r` scans at most the
/// first `r + 1` bytes of the key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FibMixPrefix;

impl HashFamily for FibMixPrefix {
    #[inline]
    fn hash(&self, key: &[u8], round: u32) -> u64 {
        let take = (round as usize).saturating_add(1).min(key.len());
        let mut h = fib_seed(round);
        for &b in &key[..take] {
            h = fib_step(h, b);
        }
        h
    }
}

/// Whole-key policy backed by xxh3, with the round folded into the seed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Xxh3;

impl HashFamily for Xxh3 {
    #[inline]
    fn hash(&self, key: &[u8], round: u32) -> u64 {
        xxh3_64_with_seed(key, fib_seed(round))
    }
}

/// XOR-fold `hash(key, r)` for `r in 1..=rounds`, rotating each round's
/// contribution by `2r` bits before folding so per-round values land on
/// different bit positions. Pure function of `(family, key, rounds)`.
#[inline]
pub fn combined<F: HashFamily + ?Sized>(family: &F, key: &[u8], rounds: u32) -> u64 {
    let mut acc = 0u64;
    for r in 1..=rounds {
        acc ^= family.hash(key, r).rotate_left((2 * r) % 64);
    }
    acc
}
