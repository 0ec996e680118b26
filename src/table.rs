//! Static table layer: the round-search builder and the two lookup paths.
//!
//! [`RoundTable::build`] tries round counts `k = 1, 2, ...` until every
//! key lands in its own slot of the caller-supplied buffer. Construction
//! is deterministic for a fixed `(keys, buffer length, family, options)`
//! tuple; a failed build can only be fixed by a bigger buffer, a wider
//! round cap, or a different family, never by retrying.
//!
//! The layer never allocates. The slot buffer is borrowed mutably for the
//! table's whole lifetime, which also makes the exclusive-access-during-
//! build contract a compile-time fact rather than a convention.

use core::fmt;

use crate::hash::{combined, HashFamily};

/// Integer width of a table slot.
///
/// `EMPTY` is the maximum representable value and is reserved: a build
/// refuses key counts that do not fit strictly below it, so stored
/// construction indices can never collide with the sentinel.
pub trait SlotIndex: Copy + Eq {
    const EMPTY: Self;
    fn from_usize(i: usize) -> Self;
    fn to_usize(self) -> usize;
}

macro_rules! impl_slot_index {
    ($($t:ty),*) => {$(
        impl SlotIndex for $t {
            const EMPTY: Self = <$t>::MAX;
            #[inline]
            fn from_usize(i: usize) -> Self {
                i as $t
            }
            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    )*};
}

impl_slot_index!(u8, u16, u32, u64);

/// Construction-time knobs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BuildOptions {
    /// Upper bound on the number of rounds tried before the build fails.
    pub max_rounds: u32,
    /// Additionally bound rounds by the key count. More rounds than keys
    /// rarely help; disable only for stress scenarios.
    pub cap_rounds_at_count: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_rounds: 254,
            cap_rounds_at_count: true,
        }
    }
}

impl BuildOptions {
    fn round_cap(&self, count: usize) -> u32 {
        if self.cap_rounds_at_count {
            self.max_rounds.min(count.min(u32::MAX as usize) as u32)
        } else {
            self.max_rounds
        }
    }
}

/// Why a build produced no table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// No collision-free placement exists within the round cap. Duplicate
    /// keys always end here, for any table size and cap.
    RoundsExhausted,
    /// Zero-length slot buffer.
    EmptyTable,
    /// The key count does not fit strictly below the slot type's `EMPTY`
    /// sentinel.
    CountExceedsSentinel,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::RoundsExhausted => {
                write!(f, "no collision-free placement within the round cap")
            }
            BuildError::EmptyTable => write!(f, "slot buffer is empty"),
            BuildError::CountExceedsSentinel => {
                write!(f, "key count does not fit below the EMPTY sentinel")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// A built, read-only view over a caller-owned slot buffer.
///
/// Each occupied slot holds the construction index of the key placed
/// there; all other slots hold [`SlotIndex::EMPTY`]. A value of this type
/// only exists after a successful build, so "queryable" is enforced by
/// construction.
pub struct RoundTable<'t, I, F> {
    slots: &'t mut [I],
    count: usize,
    num_hashes: u32,
    family: F,
}

impl<'t, I: SlotIndex, F: HashFamily> RoundTable<'t, I, F> {
    /// Build a table over `keys` in the supplied buffer.
    ///
    /// Keys are placed in the given order; the first key to reach a slot
    /// wins and a later key hitting an occupied slot aborts the attempt
    /// (no displacement, no chaining). On any failure the buffer is left
    /// fully `EMPTY`-filled.
    ///
    /// Work is `O(count)` combined hashes per attempt, each costing
    /// `O(k)` family calls, so `O(count * round_cap^2)` in the worst case.
    pub fn build<K: AsRef<[u8]>>(
        slots: &'t mut [I],
        keys: &[K],
        family: F,
        options: BuildOptions,
    ) -> Result<Self, BuildError> {
        let table_size = slots.len();
        if table_size == 0 {
            return Err(BuildError::EmptyTable);
        }
        slots.fill(I::EMPTY);
        let count = keys.len();
        if count >= I::EMPTY.to_usize() {
            return Err(BuildError::CountExceedsSentinel);
        }

        let round_cap = options.round_cap(count);
        'rounds: for k in 1..=round_cap {
            // Every attempt starts from a clean table, including the one
            // after a failed placement.
            slots.fill(I::EMPTY);
            for (i, key) in keys.iter().enumerate() {
                let idx = (combined(&family, key.as_ref(), k) % table_size as u64) as usize;
                if slots[idx] != I::EMPTY {
                    continue 'rounds;
                }
                slots[idx] = I::from_usize(i);
            }
            return Ok(Self {
                slots,
                count,
                num_hashes: k,
                family,
            });
        }
        slots.fill(I::EMPTY);
        Err(BuildError::RoundsExhausted)
    }

    #[inline]
    fn slot_of(&self, key: &[u8]) -> usize {
        (combined(&self.family, key, self.num_hashes) % self.slots.len() as u64) as usize
    }

    /// Unchecked lookup: the raw slot value for `key`, `O(num_hashes)`.
    ///
    /// The caller must guarantee `key` was in the build set. For any other
    /// key the result is an arbitrary construction index or `EMPTY`: an
    /// in-bounds read either way, but meaningless. Use [`check_at`] when
    /// membership is not known.
    ///
    /// [`check_at`]: RoundTable::check_at
    #[inline]
    pub fn entry(&self, key: &[u8]) -> I {
        self.slots[self.slot_of(key)]
    }

    /// Checked lookup: resolve `key` against the build-time `keys` and a
    /// parallel `values` slice, `O(num_hashes)` plus one comparison.
    ///
    /// `key_eq` compares a stored key against the probe bytes. An `EMPTY`
    /// slot, a comparator mismatch, or slices shorter than the build set
    /// all yield `None`; a probe that merely aliases an occupied slot can
    /// therefore never return another key's value.
    pub fn check_at<'v, K, V>(
        &self,
        key: &[u8],
        keys: &[K],
        values: &'v [V],
        key_eq: impl Fn(&K, &[u8]) -> bool,
    ) -> Option<&'v V> {
        let e = self.entry(key);
        if e == I::EMPTY {
            return None;
        }
        let e = e.to_usize();
        if e >= self.count {
            return None;
        }
        let stored = keys.get(e)?;
        if !key_eq(stored, key) {
            return None;
        }
        values.get(e)
    }

    /// Rounds folded into the combined hash by the accepted build.
    #[inline]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Number of keys placed at build time.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots in the borrowed buffer.
    #[inline]
    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    /// The raw slot buffer.
    #[inline]
    pub fn slots(&self) -> &[I] {
        self.slots
    }
}

impl<I, F> fmt::Debug for RoundTable<'_, I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundTable")
            .field("table_size", &self.slots.len())
            .field("count", &self.count)
            .field("num_hashes", &self.num_hashes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FibMix;

    #[test]
    fn empty_buffer_is_rejected() {
        let mut slots: [u16; 0] = [];
        let err = RoundTable::build(&mut slots, &[b"a".as_ref()], FibMix, BuildOptions::default());
        assert_eq!(err.err(), Some(BuildError::EmptyTable));
    }

    #[test]
    fn count_must_fit_below_sentinel() {
        // u8 sentinel is 255, so 255 keys are one too many.
        let keys: Vec<String> = (0..255).map(|i| format!("key-{i}")).collect();
        let mut slots = [0u8; 4096];
        let err = RoundTable::build(&mut slots, &keys, FibMix, BuildOptions::default());
        assert_eq!(err.err(), Some(BuildError::CountExceedsSentinel));
        assert!(slots.iter().all(|&s| s == u8::EMPTY));
    }

    #[test]
    fn failed_build_leaves_buffer_empty_filled() {
        let mut slots = [0u16; 1];
        let err = RoundTable::build(
            &mut slots,
            &[b"a".as_ref(), b"b".as_ref()],
            FibMix,
            BuildOptions::default(),
        );
        assert_eq!(err.err(), Some(BuildError::RoundsExhausted));
        assert_eq!(slots, [u16::EMPTY]);
    }
}
