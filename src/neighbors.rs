use num_traits::float::FloatCore;
use petal_neighbors::distance::Metric;

use crate::store::{undefined, PointStore};

/// A point inside the scan radius of a query, along with the squared
/// distance between the two, so later steps never recompute it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Neighbor<A> {
    pub(crate) point: usize,
    pub(crate) rdistance: A,
}

/// Collects every point within `eps` of `center`, `center` itself included,
/// in storage order.
///
/// `reps` is the squared radius; comparisons stay in squared form so the
/// scan never takes a square root. The scan is a plain pass over all rows,
/// O(n·d) per call.
pub(crate) fn neighbors_within<A, M>(
    store: &PointStore<A>,
    center: usize,
    reps: A,
    metric: &M,
) -> Vec<Neighbor<A>>
where
    A: FloatCore,
    M: Metric<A>,
{
    let query = store.point(center);
    (0..store.len())
        .filter_map(|point| {
            let rdistance = metric.rdistance(&store.point(point), &query);
            (rdistance <= reps).then_some(Neighbor { point, rdistance })
        })
        .collect()
}

/// Squared core distance of the scanned point: the squared distance to its
/// `min_samples`-th nearest neighbor, or [`undefined`] when the neighborhood
/// holds no more than `min_samples` points.
///
/// Position 0 of the sorted neighborhood is the point itself at distance
/// zero, so a core point needs `min_samples` neighbors besides itself.
pub(crate) fn core_distance<A>(neighborhood: &[Neighbor<A>], min_samples: usize) -> A
where
    A: FloatCore,
{
    if neighborhood.len() <= min_samples {
        return undefined();
    }
    let mut rdistances: Vec<A> = neighborhood.iter().map(|n| n.rdistance).collect();
    let (_, nth, _) = rdistances
        .select_nth_unstable_by(min_samples, |a, b| a.partial_cmp(b).expect("finite distance"));
    *nth
}
