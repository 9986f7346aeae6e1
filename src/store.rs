use ndarray::{Array2, ArrayView1, ArrayView2};
use num_traits::float::FloatCore;

use crate::error::OpticsError;

/// The reachability assigned to points with no density connection.
///
/// The sentinel is the largest finite value of the float type, so it sorts
/// after every distance the engine can compute under plain numeric
/// comparison. The engine never applies arithmetic to it.
#[must_use]
pub fn undefined<A: FloatCore>() -> A {
    A::max_value()
}

/// Packs row vectors into the dense matrix the model consumes, verifying
/// that every point has the same dimensionality as the first.
///
/// # Errors
///
/// Returns [`OpticsError::DimensionMismatch`] at the first row whose length
/// differs from the first row's.
pub fn matrix_from_points<A>(points: &[Vec<A>]) -> Result<Array2<A>, OpticsError>
where
    A: FloatCore,
{
    let dim = points.first().map_or(0, Vec::len);
    if let Some(point) = points.iter().find(|point| point.len() != dim) {
        return Err(OpticsError::DimensionMismatch {
            expected: dim,
            found: point.len(),
        });
    }
    let data = points.iter().flatten().copied().collect();
    Ok(Array2::from_shape_vec((points.len(), dim), data).expect("valid shape"))
}

/// Owns the mutable per-point state for a single OPTICS run.
///
/// Coordinates are borrowed from the caller's matrix; every other component
/// refers to a point by its row index and goes through this store to read
/// coordinates or touch state.
pub(crate) struct PointStore<'a, A> {
    points: ArrayView2<'a, A>,
    reachability: Vec<A>,
    processed: Vec<bool>,
}

impl<'a, A> PointStore<'a, A>
where
    A: FloatCore,
{
    pub(crate) fn new(points: ArrayView2<'a, A>) -> Self {
        let mut store = Self {
            points,
            reachability: vec![],
            processed: vec![],
        };
        store.reset();
        store
    }

    /// Forgets all reachability values and processed flags.
    pub(crate) fn reset(&mut self) {
        let n = self.points.nrows();
        self.reachability.clear();
        self.reachability.resize(n, undefined());
        self.processed.clear();
        self.processed.resize(n, false);
    }

    pub(crate) fn len(&self) -> usize {
        self.points.nrows()
    }

    pub(crate) fn point(&self, idx: usize) -> ArrayView1<'_, A> {
        self.points.row(idx)
    }

    pub(crate) fn reachability(&self, idx: usize) -> A {
        self.reachability[idx]
    }

    /// Records a new reachability value. A point starts at [`undefined`] and
    /// only ever improves, never worsens.
    pub(crate) fn set_reachability(&mut self, idx: usize, value: A) {
        assert!(value >= A::zero(), "reachability must be non-negative");
        self.reachability[idx] = value;
    }

    pub(crate) fn processed(&self, idx: usize) -> bool {
        self.processed[idx]
    }

    pub(crate) fn mark_processed(&mut self, idx: usize) {
        self.processed[idx] = true;
    }

    /// Hands the per-point reachability values back once a run is complete.
    pub(crate) fn into_reachability(self) -> Vec<A> {
        self.reachability
    }
}

#[cfg(test)]
mod test {
    use ndarray::array;

    use super::*;

    #[test]
    fn fresh_store_state() {
        let points = array![[0.0_f64, 0.0], [1.0, 1.0]];
        let store = PointStore::new(points.view());
        assert_eq!(store.len(), 2);
        assert_eq!(store.reachability(0), undefined::<f64>());
        assert!(!store.processed(0));
        assert_eq!(store.point(1)[0], 1.0);
    }

    #[test]
    fn reset_clears_mutations() {
        let points = array![[0.0_f64, 0.0], [1.0, 1.0]];
        let mut store = PointStore::new(points.view());
        store.set_reachability(0, 0.25);
        store.mark_processed(1);
        store.reset();
        assert_eq!(store.reachability(0), undefined::<f64>());
        assert!(!store.processed(1));
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_reachability_aborts() {
        let points = array![[0.0_f64, 0.0]];
        let mut store = PointStore::new(points.view());
        store.set_reachability(0, -1.0);
    }

    #[test]
    fn matrix_from_uniform_rows() {
        let matrix = matrix_from_points(&[vec![1.0_f64, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(matrix.shape(), [2, 2]);
        assert_eq!(matrix[[1, 0]], 3.0);
    }

    #[test]
    fn matrix_from_ragged_rows() {
        let result = matrix_from_points(&[vec![1.0_f64, 2.0], vec![3.0]]);
        assert_eq!(
            result,
            Err(OpticsError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn matrix_from_no_rows() {
        let matrix = matrix_from_points::<f64>(&[]).unwrap();
        assert_eq!(matrix.nrows(), 0);
    }
}
