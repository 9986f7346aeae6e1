use std::collections::HashMap;

use log::debug;
use ndarray::{ArrayBase, Data, Ix2};
use num_traits::float::FloatCore;
use petal_neighbors::distance::{Euclidean, Metric};
use serde::{Deserialize, Serialize};

use super::Fit;
use crate::error::OpticsError;
use crate::extract::partition_by_borders;
use crate::neighbors::{core_distance, neighbors_within, Neighbor};
use crate::peaks::{reachability_peaks, PeakMode};
use crate::seeds::SeedQueue;
use crate::store::{undefined, PointStore};

/// OPTICS (ordering points to identify the clustering structure) clustering
/// algorithm.
///
/// Fitting arranges the input points in a density-based order and records
/// for each point the squared distance at which it became reachable from
/// its predecessors; points that never become reachable carry the
/// [`undefined`] sentinel. Cluster borders are then picked among the maxima
/// of that reachability sequence according to [`PeakMode`], and points whose
/// reachability exceeds `outlier_threshold` are diverted to the outlier
/// bucket.
///
/// `eps` is a radius in true distance units and is squared once per
/// neighborhood scan; reachability values and `outlier_threshold` are in
/// squared units, matching the reachability plot. Passing `A::max_value()`
/// as `eps` removes the radius limit.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use petal_neighbors::distance::Euclidean;
/// use optics_clustering::{Fit, Optics, PeakMode};
///
/// let points = array![
///     [1.0, 2.0],
///     [1.1, 2.2],
///     [0.9, 1.9],
///     [1.0, 2.1],
///     [-2.0, 3.0],
///     [-2.2, 3.1],
///     [-2.1, 3.2],
/// ];
/// let mut model = Optics::new(0.5, 2, Euclidean::default());
/// model.peak_mode = PeakMode::TopK(2);
/// let (clusters, outliers) = model.fit(&points, None).unwrap();
///
/// assert_eq!(clusters.len(), 2);          // two clusters found
/// assert_eq!(clusters[&0], [0, 2, 3, 1]); // the first blob, in emission order
/// assert_eq!(clusters[&1], [4, 5, 6]);    // the second blob
/// assert!(outliers.is_empty());
/// ```
#[derive(Debug, Deserialize, Serialize)]
pub struct Optics<A, M> {
    /// The radius of a neighborhood.
    pub eps: A,

    /// The number of neighbors, the point itself not counted, a point needs
    /// within `eps` to be a core point.
    pub min_samples: usize,

    /// The metric to compute distance between the entries.
    pub metric: M,

    /// How cluster borders are picked from the reachability sequence.
    pub peak_mode: PeakMode<A>,

    /// Reachability above which an ordered point is diverted to the outlier
    /// bucket, in the same squared units as the reachability sequence. Zero
    /// or negative disables outlier separation.
    pub outlier_threshold: A,

    ordered: Vec<usize>,
    reachability: Vec<A>,
}

impl<A> Default for Optics<A, Euclidean>
where
    A: FloatCore,
{
    fn default() -> Self {
        Self {
            eps: A::from(0.5_f32).expect("valid float"),
            min_samples: 5,
            metric: Euclidean::default(),
            peak_mode: PeakMode::Persistence(A::zero()),
            outlier_threshold: A::zero(),
            ordered: vec![],
            reachability: vec![],
        }
    }
}

impl<A, M> Optics<A, M>
where
    A: FloatCore,
    M: Metric<A>,
{
    #[must_use]
    pub fn new(eps: A, min_samples: usize, metric: M) -> Self {
        Self {
            eps,
            min_samples,
            metric,
            peak_mode: PeakMode::Persistence(A::zero()),
            outlier_threshold: A::zero(),
            ordered: vec![],
            reachability: vec![],
        }
    }

    /// The order in which the latest fit emitted the points.
    #[must_use]
    pub fn cluster_ordering(&self) -> &[usize] {
        &self.ordered
    }

    /// Reachability of each point, indexed by row. Emission freezes a
    /// point's reachability, so these are the values the ordering recorded.
    #[must_use]
    pub fn reachability(&self) -> &[A] {
        &self.reachability
    }

    /// The reachability sequence in emission order, i.e. the reachability
    /// plot.
    #[must_use]
    pub fn reachability_plot(&self) -> Vec<A> {
        self.ordered.iter().map(|&idx| self.reachability[idx]).collect()
    }

    /// Re-cuts the latest ordering along `borders` without re-fitting.
    ///
    /// `borders` must be strictly ascending positions in the ordering. The
    /// returned map keys clusters by their position in the ordering, empty
    /// clusters included; the vector holds the outliers.
    ///
    /// # Errors
    ///
    /// Returns [`OpticsError::DimensionMismatch`] for a border beyond the
    /// ordering and [`OpticsError::InvalidParameter`] for unsorted borders.
    pub fn extract_clusters_and_outliers(
        &self,
        borders: &[usize],
        outlier_threshold: A,
    ) -> Result<(HashMap<usize, Vec<usize>>, Vec<usize>), OpticsError> {
        let plot = self.reachability_plot();
        let buckets = partition_by_borders(&self.ordered, &plot, borders, outlier_threshold)?;
        Ok(Self::label_buckets(buckets))
    }

    /// Computes the cluster ordering of `input` and extracts clusters and
    /// outliers from it, calling `on_processed` with each point index the
    /// moment it is emitted.
    ///
    /// The callback sees every point exactly once, synchronously, in
    /// emission order. It must not touch the model or the input.
    ///
    /// # Errors
    ///
    /// Returns [`OpticsError::InvalidParameter`] for a negative `eps`, zero
    /// `min_samples`, or an invalid `peak_mode`, before anything is
    /// computed. The fitted state left behind by a failed call is
    /// unspecified.
    pub fn fit_with_progress<S, F>(
        &mut self,
        input: &ArrayBase<S, Ix2>,
        mut on_processed: F,
    ) -> Result<(HashMap<usize, Vec<usize>>, Vec<usize>), OpticsError>
    where
        S: Data<Elem = A>,
        F: FnMut(usize),
    {
        self.validate()?;
        self.ordered.clear();
        self.reachability.clear();
        if input.is_empty() {
            return Ok((HashMap::new(), vec![]));
        }

        debug!("computing the cluster ordering of {} points", input.nrows());
        let reps = self.metric.distance_to_rdistance(self.eps);
        let mut store = PointStore::new(input.view());
        self.ordered.reserve(store.len());
        for idx in 0..store.len() {
            if store.processed(idx) {
                continue;
            }
            expand(
                idx,
                reps,
                self.min_samples,
                &self.metric,
                &mut store,
                &mut self.ordered,
                &mut on_processed,
            );
        }
        self.reachability = store.into_reachability();

        let mut borders = reachability_peaks(&self.reachability_plot(), self.peak_mode)?;
        borders.sort_unstable();
        let (clusters, outliers) =
            self.extract_clusters_and_outliers(&borders, self.outlier_threshold)?;
        debug!(
            "extracted {} clusters and {} outliers",
            clusters.len(),
            outliers.len()
        );
        Ok((clusters, outliers))
    }

    fn validate(&self) -> Result<(), OpticsError> {
        if self.eps < A::zero() {
            return Err(OpticsError::InvalidParameter {
                reason: "eps must be non-negative",
            });
        }
        if self.min_samples == 0 {
            return Err(OpticsError::InvalidParameter {
                reason: "min_samples must be at least 1",
            });
        }
        self.peak_mode.validate()
    }

    fn label_buckets(buckets: Vec<Vec<usize>>) -> (HashMap<usize, Vec<usize>>, Vec<usize>) {
        let mut buckets = buckets.into_iter();
        let outliers = buckets.next().unwrap_or_default();
        (buckets.enumerate().collect(), outliers)
    }
}

/// Fits the OPTICS pipeline to the given input data.
///
/// # Parameters
/// - `input`: A 2D array representing the dataset to cluster. Each row corresponds to a data point.
/// - `_params`: An optional parameter for prelabelled data. Not used in this implementation, but required for consistency.
///
/// # Returns
/// A tuple containing:
/// - `HashMap<usize, Vec<usize>>`: A mapping of cluster IDs to the indices of points in each cluster.
/// - `Vec<usize>`: A vector of indices representing the outliers that do not belong to any cluster.
impl<S, A, M>
    Fit<
        ArrayBase<S, Ix2>,
        HashMap<usize, Vec<usize>>,
        Result<(HashMap<usize, Vec<usize>>, Vec<usize>), OpticsError>,
    > for Optics<A, M>
where
    A: FloatCore,
    S: Data<Elem = A>,
    M: Metric<A>,
{
    fn fit(
        &mut self,
        input: &ArrayBase<S, Ix2>,
        _params: Option<&HashMap<usize, Vec<usize>>>,
    ) -> Result<(HashMap<usize, Vec<usize>>, Vec<usize>), OpticsError> {
        self.fit_with_progress(input, |_| {})
    }
}

/// Emits `origin` and, when it is a core point, everything density-reachable
/// from it, draining the seed queue in `(reachability, index)` order.
fn expand<A, M, F>(
    origin: usize,
    reps: A,
    min_samples: usize,
    metric: &M,
    store: &mut PointStore<A>,
    ordered: &mut Vec<usize>,
    on_processed: &mut F,
) where
    A: FloatCore,
    M: Metric<A>,
    F: FnMut(usize),
{
    let neighborhood = neighbors_within(store, origin, reps, metric);
    store.set_reachability(origin, undefined());
    let origin_core = core_distance(&neighborhood, min_samples);
    store.mark_processed(origin);
    ordered.push(origin);
    on_processed(origin);
    if origin_core == undefined() {
        return;
    }

    let mut seeds = SeedQueue::new();
    update_seeds(&neighborhood, origin_core, store, &mut seeds);
    while let Some(next) = seeds.pop_min() {
        let neighborhood = neighbors_within(store, next, reps, metric);
        let next_core = core_distance(&neighborhood, min_samples);
        store.mark_processed(next);
        ordered.push(next);
        on_processed(next);
        if next_core != undefined() {
            update_seeds(&neighborhood, next_core, store, &mut seeds);
        }
    }
}

/// Offers every unprocessed neighbor of a core point a reachability through
/// it, queueing the neighbor or re-keying it when that is an improvement.
fn update_seeds<A>(
    neighborhood: &[Neighbor<A>],
    center_core: A,
    store: &mut PointStore<A>,
    seeds: &mut SeedQueue<A>,
) where
    A: FloatCore,
{
    for &Neighbor { point, rdistance } in neighborhood {
        if store.processed(point) {
            continue;
        }
        let candidate = if rdistance.gt(&center_core) {
            rdistance
        } else {
            center_core
        };
        let current = store.reachability(point);
        if current == undefined() {
            store.set_reachability(point, candidate);
            seeds.insert(point, candidate);
        } else if candidate < current {
            seeds.decrease_key(point, current, candidate);
            store.set_reachability(point, candidate);
        }
    }
}
