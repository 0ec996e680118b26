//! roundhash: static, read-mostly tables mapping a fixed key set to small
//! integer slots, with collision-free O(1) lookup and no chains.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: lookup performance close to a minimal perfect hash without a
//!   perfect-hash compiler step, for code that knows its key set at
//!   construction time.
//! - Layers:
//!   - hash: `HashFamily` strategy trait plus the round combiner that
//!     XOR-folds per-round hashes (rotated per round) into one index.
//!   - table: `RoundTable<'t, I, F>`, the construction core. Tries round
//!     counts `k = 1, 2, ...` until every key places into its own slot of
//!     a caller-owned buffer, or the round cap is exhausted. Exposes the
//!     unchecked (`entry`) and checked (`check_at`) read paths.
//!   - map: `RoundHashMap<V, F>`, an owning wrapper for dynamically grown
//!     key sets. Stages inserts, then on `build()` merges and fully
//!     rebuilds, searching table sizes under a quality cap on the round
//!     count.
//!
//! Constraints
//! - Single-threaded, fully synchronous; no locking, no suspension.
//! - The static layer never allocates: the slot buffer is caller-owned
//!   and borrowed mutably for the table's lifetime, so exclusive access
//!   during a build is enforced by the borrow checker.
//! - Construction either fully succeeds or fails; a failed build leaves
//!   the buffer `EMPTY`-filled and produces no queryable value.
//! - Builds are deterministic: retrying identical inputs never helps.
//!   The remedies are a larger table, a wider round cap, or a different
//!   hash family.
//!
//! Why this split?
//! - The hash family is the only pluggable policy (whole-key vs prefix
//!   scan, or a caller-supplied function); isolating it keeps the builder
//!   generic over that choice.
//! - The table layer holds every placement invariant; the map layer only
//!   adds ownership and the size-search policy on top and never touches
//!   slots directly.
//!
//! Sentinel encoding
//! - A slot is one unsigned integer; the maximum value of the slot type
//!   (`SlotIndex::EMPTY`) is reserved for "empty". Builds reject key
//!   counts that do not fit strictly below the sentinel, so valid indices
//!   and the sentinel never overlap.
//!
//! Notes and non-goals
//! - No concurrent mutation, no incremental rebuilds, no key deletion,
//!   no persistence of built tables.
//! - `entry` and `get_existing` are fast paths with a membership
//!   precondition; `check_at` and `get` are the only safe paths for keys
//!   that may be absent.
//! - After a build completes, shared read-only access is fine; nothing
//!   mutates between builds.

mod hash;
mod map;
mod table;

// Public surface
pub use hash::{combined, FibMix, FibMixPrefix, FnFamily, HashFamily, Xxh3};
pub use map::{FatalBuildError, RoundHashMap};
pub use table::{BuildError, BuildOptions, RoundTable, SlotIndex};
