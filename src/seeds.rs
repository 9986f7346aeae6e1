use std::cmp::Ordering;
use std::collections::BTreeSet;

use num_traits::float::FloatCore;

/// Key of a queued point: reachability first, then the point index, so that
/// equal reachabilities pop in a stable order across runs.
#[derive(Clone, Copy, Debug)]
struct SeedEntry<A> {
    reachability: A,
    point: usize,
}

impl<A> PartialEq for SeedEntry<A>
where
    A: FloatCore,
{
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A> Eq for SeedEntry<A> where A: FloatCore {}

impl<A> PartialOrd for SeedEntry<A>
where
    A: FloatCore,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for SeedEntry<A>
where
    A: FloatCore,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.reachability
            .partial_cmp(&other.reachability)
            .expect("reachability is never NaN")
            .then_with(|| self.point.cmp(&other.point))
    }
}

/// Priority queue of candidate points keyed by their current reachability.
///
/// OPTICS shrinks a queued point's reachability whenever a denser path to it
/// turns up, so the queue must support decrease-key. An ordered set does:
/// re-keying is an explicit remove under the old key plus re-insert under
/// the new one, both O(log n). A point is queued at most once, so no stale
/// entries can ever reach the ordering.
pub(crate) struct SeedQueue<A> {
    entries: BTreeSet<SeedEntry<A>>,
}

impl<A> SeedQueue<A>
where
    A: FloatCore,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeSet::new(),
        }
    }

    /// Queues a point under its current reachability. A point must not be
    /// queued twice.
    pub(crate) fn insert(&mut self, point: usize, reachability: A) {
        let inserted = self.entries.insert(SeedEntry {
            reachability,
            point,
        });
        debug_assert!(inserted, "a point may be queued at most once");
    }

    /// Removes and returns the point with the smallest reachability, ties
    /// going to the lower point index.
    pub(crate) fn pop_min(&mut self) -> Option<usize> {
        self.entries.pop_first().map(|entry| entry.point)
    }

    /// Re-keys a queued point after its reachability improved. `current`
    /// must be the key the point was queued under.
    pub(crate) fn decrease_key(&mut self, point: usize, current: A, improved: A) {
        debug_assert!(improved < current);
        let removed = self.entries.remove(&SeedEntry {
            reachability: current,
            point,
        });
        debug_assert!(removed, "decrease_key requires a queued point");
        self.entries.insert(SeedEntry {
            reachability: improved,
            point,
        });
    }
}
