//! Cache-eviction policies for partitions.
//!
//! The policy is a value chosen at mount time, and victim selection is a
//! pure function over an ordered list of candidate tuples - no dispatch
//! baked into the partition itself.

use std::time::Duration;

/// How a partition reclaims space when a creation or write would not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CachingScheme {
    /// Never evict; operations that do not fit fail immediately.
    #[default]
    None,
    /// Evict evictable files in creation order.
    Fifo,
    /// Evict evictable files in last-access order.
    Lru,
}

/// One file the policy may evict.
///
/// Candidates are pre-filtered by the partition: only evictable files
/// with no open handle qualify. `stamp` is the creation date under FIFO
/// and the last-access date under LRU.
#[derive(Debug, Clone)]
pub(crate) struct EvictionCandidate {
    pub(crate) dir_path: String,
    pub(crate) file_name: String,
    pub(crate) bytes: u64,
    pub(crate) stamp: Duration,
}

/// Select eviction victims freeing at least `needed` bytes.
///
/// Victims are taken in ascending `(stamp, path)` order; the path
/// tie-break keeps selection deterministic when stamps collide. Returns
/// `None` when the candidates cannot cover `needed` - in which case
/// nothing must be evicted at all.
pub(crate) fn select_victims(
    mut candidates: Vec<EvictionCandidate>,
    needed: u64,
) -> Option<Vec<EvictionCandidate>> {
    candidates.sort_by(|a, b| {
        a.stamp
            .cmp(&b.stamp)
            .then_with(|| a.dir_path.cmp(&b.dir_path))
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    let mut reclaimed = 0u64;
    let mut victims = Vec::new();
    for candidate in candidates {
        if reclaimed >= needed {
            break;
        }
        reclaimed += candidate.bytes;
        victims.push(candidate);
    }

    if reclaimed >= needed {
        Some(victims)
    } else {
        None
    }
}
