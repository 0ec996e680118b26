//! RoundHashMap: owning growth wrapper around the static table layer.
//!
//! Inserts are staged and invisible until an explicit `build()`, which
//! merges them into the append-only entry sequence and performs a full
//! rebuild over all entries (never incremental). Entry indices are stable
//! once assigned and never reused.
//!
//! The rebuild searches table sizes starting at `3 * entry_count`,
//! accepting the first build whose round count stays within the quality
//! cap `ceil(log2(entry_count)) + 2`, growing the table otherwise. The
//! search is bounded by a hard ceiling; a still-failing build at the
//! ceiling is a fatal error that implies duplicate keys or pathological
//! hash collisions, not a transient condition.

use core::fmt;

use crate::hash::{combined, FibMixPrefix, HashFamily};
use crate::table::{BuildOptions, RoundTable, SlotIndex};

// u16 slots: sentinel 0xFFFF, so at most 65_534 entries.
const EMPTY: u16 = <u16 as SlotIndex>::EMPTY;

// Hard ceilings for the table-size search.
const TABLE_SIZE_CEILING: usize = 65_536;
const TABLE_GROWTH_FACTOR_CEILING: usize = 128;

/// Table-size search exhausted without a successful build.
///
/// This is deterministic, not transient: the input contains duplicate
/// keys, or the hash family cannot separate it within the round cap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FatalBuildError {
    /// Entries in the sequence the rebuild ran over.
    pub entry_count: usize,
    /// Last table size tried before giving up.
    pub table_size: usize,
}

impl fmt::Display for FatalBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table search exhausted at {} slots for {} entries: \
             duplicate keys or pathologically colliding hashes",
            self.table_size, self.entry_count
        )
    }
}

impl std::error::Error for FatalBuildError {}

/// A string-keyed map built on the round-search table.
///
/// Defaults to the prefix hash family; any [`HashFamily`] can be
/// substituted at construction.
pub struct RoundHashMap<V, F = FibMixPrefix> {
    family: F,
    table: Vec<u16>,
    num_hashes: u32,
    entries: Vec<(String, V)>,
    staged: Vec<(String, V)>,
}

impl<V> RoundHashMap<V> {
    pub fn new() -> Self {
        Self::with_family(FibMixPrefix)
    }
}

impl<V> Default for RoundHashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F: HashFamily> RoundHashMap<V, F> {
    pub fn with_family(family: F) -> Self {
        Self {
            family,
            table: Vec::new(),
            num_hashes: 0,
            entries: Vec::new(),
            staged: Vec::new(),
        }
    }

    /// Stage an entry for the next [`build`](RoundHashMap::build). No
    /// hashing happens here and the entry is not visible to lookups yet.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.staged.push((key.into(), value));
    }

    /// Number of built entries (staged ones excluded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries staged but not yet built.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Rounds used by the last accepted build, or 0 before any build.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Slots in the current table, or 0 before any build.
    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Built entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge staged entries into the sequence and rebuild the table over
    /// all entries. A no-op when nothing is staged.
    ///
    /// On a fatal error the table is cleared and lookups return `None`
    /// until a later build succeeds; the entry sequence (including the
    /// offending keys) is kept so the caller can inspect it.
    pub fn build(&mut self) -> Result<(), FatalBuildError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        self.entries.reserve(self.staged.len());
        self.entries.append(&mut self.staged);
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<(), FatalBuildError> {
        let n = self.entries.len();
        debug_assert!(n > 0);
        let quality_cap = ceil_log2(n) + 2;
        let max_table_size = TABLE_SIZE_CEILING.min(TABLE_GROWTH_FACTOR_CEILING * n);
        let mut table_size = 3 * n;
        let keys: Vec<&[u8]> = self.entries.iter().map(|(k, _)| k.as_bytes()).collect();

        // Each step grows table_size strictly, so the search terminates
        // within max_table_size iterations.
        loop {
            self.table.clear();
            self.table.resize(table_size, EMPTY);
            let built = RoundTable::build(
                self.table.as_mut_slice(),
                &keys,
                &self.family,
                BuildOptions::default(),
            );
            let num_hashes = built.as_ref().map(|t| t.num_hashes()).ok();
            drop(built);

            if let Some(k) = num_hashes {
                if k <= quality_cap {
                    self.num_hashes = k;
                    return Ok(());
                }
            }

            let grown = if table_size < 16 {
                table_size + 1
            } else {
                table_size + table_size / 5 + 1
            };
            if grown > max_table_size {
                // A build that succeeded but missed the quality cap is
                // still usable; take it rather than fail.
                if let Some(k) = num_hashes {
                    self.num_hashes = k;
                    return Ok(());
                }
                self.num_hashes = 0;
                self.table.clear();
                return Err(FatalBuildError {
                    entry_count: n,
                    table_size,
                });
            }
            table_size = grown;
        }
    }

    fn slot(&self, key: &str) -> Option<usize> {
        if self.num_hashes == 0 {
            return None;
        }
        let idx =
            (combined(&self.family, key.as_bytes(), self.num_hashes) % self.table.len() as u64)
                as usize;
        let e = self.table[idx];
        if e == EMPTY {
            None
        } else {
            Some(e as usize)
        }
    }

    /// Checked lookup. Safe for keys that may be absent; `None` before the
    /// first successful build.
    pub fn get(&self, key: &str) -> Option<&V> {
        let e = self.slot(key)?;
        let (stored, value) = self.entries.get(e)?;
        if stored.as_str() != key {
            return None;
        }
        Some(value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let e = self.slot(key)?;
        let (stored, value) = self.entries.get_mut(e)?;
        if stored.as_str() != key {
            return None;
        }
        Some(value)
    }

    /// Unchecked fast path: skips both the sentinel and the stored-key
    /// comparison.
    ///
    /// The caller must guarantee `key` is a built member. For any other
    /// key this may panic or return an arbitrary entry's value; it also
    /// panics on a map with no successful build.
    pub fn get_existing(&self, key: &str) -> &V {
        let idx =
            (combined(&self.family, key.as_bytes(), self.num_hashes) % self.table.len() as u64)
                as usize;
        let e = self.table[idx] as usize;
        &self.entries[e].1
    }

    /// Drop all entries, staged entries, and the table.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.staged.clear();
        self.table.clear();
        self.num_hashes = 0;
    }
}

impl<V, F> fmt::Debug for RoundHashMap<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundHashMap")
            .field("len", &self.entries.len())
            .field("staged", &self.staged.len())
            .field("table_size", &self.table.len())
            .field("num_hashes", &self.num_hashes)
            .finish_non_exhaustive()
    }
}

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        (n - 1).ilog2() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::ceil_log2;

    #[test]
    fn ceil_log2_matches_definition() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(6), 3);
        assert_eq!(ceil_log2(64), 6);
        assert_eq!(ceil_log2(65), 7);
    }
}
