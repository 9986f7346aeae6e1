use itertools::Itertools;
use num_traits::float::FloatCore;

use crate::error::OpticsError;
use crate::store::undefined;

/// Splits a cluster ordering into an outlier bucket and one bucket per
/// segment between consecutive borders.
///
/// `reachability` is the emission-order reachability sequence belonging to
/// `ordered`. `borders` must be strictly ascending positions in `[0, n]`; a
/// border belongs to the segment on its right. A point whose reachability
/// exceeds `outlier_threshold` goes to bucket 0 no matter which segment it
/// sits in; a zero or negative threshold turns outlier separation off.
///
/// Always returns `borders.len() + 2` buckets of point indices, bucket 0
/// being the outliers, empty buckets included.
///
/// # Errors
///
/// Returns [`OpticsError::DimensionMismatch`] when `reachability` and
/// `ordered` disagree in length or a border lies beyond the ordering, and
/// [`OpticsError::InvalidParameter`] when the borders are not strictly
/// ascending.
pub fn partition_by_borders<A>(
    ordered: &[usize],
    reachability: &[A],
    borders: &[usize],
    outlier_threshold: A,
) -> Result<Vec<Vec<usize>>, OpticsError>
where
    A: FloatCore,
{
    if reachability.len() != ordered.len() {
        return Err(OpticsError::DimensionMismatch {
            expected: ordered.len(),
            found: reachability.len(),
        });
    }
    if let Some(&out) = borders.iter().find(|&&border| border > ordered.len()) {
        return Err(OpticsError::DimensionMismatch {
            expected: ordered.len(),
            found: out,
        });
    }
    if borders.iter().tuple_windows().any(|(a, b)| a >= b) {
        return Err(OpticsError::InvalidParameter {
            reason: "cluster borders must be strictly ascending",
        });
    }

    let cutoff = if outlier_threshold <= A::zero() {
        undefined()
    } else {
        outlier_threshold
    };
    let mut buckets = vec![Vec::new(); borders.len() + 2];
    let mut segment = 0;
    for (pos, (&point, &reach)) in ordered.iter().zip(reachability).enumerate() {
        while segment < borders.len() && borders[segment] <= pos {
            segment += 1;
        }
        if reach > cutoff {
            buckets[0].push(point);
        } else {
            buckets[segment + 1].push(point);
        }
    }
    Ok(buckets)
}

#[cfg(test)]
mod test {
    use crate::undefined;

    use super::*;

    const ORDERED: [usize; 5] = [4, 0, 1, 3, 2];
    const PLOT: [f64; 5] = [9.0, 1.0, 1.5, 8.0, 2.0];

    #[test]
    fn splits_along_borders() {
        let buckets = partition_by_borders(&ORDERED, &PLOT, &[3], 0.0).unwrap();
        assert_eq!(buckets, [vec![], vec![4, 0, 1], vec![3, 2]]);
    }

    #[test]
    fn high_reachability_points_become_outliers() {
        let buckets = partition_by_borders(&ORDERED, &PLOT, &[3], 5.0).unwrap();
        assert_eq!(buckets, [vec![4, 3], vec![0, 1], vec![2]]);
    }

    #[test]
    fn empty_buckets_are_preserved() {
        let buckets = partition_by_borders(&ORDERED, &PLOT, &[0, 5], 0.0).unwrap();
        assert_eq!(buckets, [vec![], vec![], vec![4, 0, 1, 3, 2], vec![]]);
    }

    #[test]
    fn no_borders_yield_one_cluster() {
        let buckets = partition_by_borders(&ORDERED, &PLOT, &[], 0.0).unwrap();
        assert_eq!(buckets, [vec![], vec![4, 0, 1, 3, 2]]);
    }

    #[test]
    fn disabled_threshold_keeps_sentinel_points() {
        let plot = [undefined::<f64>(), 1.0, 1.5, 8.0, 2.0];
        let buckets = partition_by_borders(&ORDERED, &plot, &[], 0.0).unwrap();
        assert!(buckets[0].is_empty());
        assert_eq!(buckets[1].len(), 5);
    }

    #[test]
    fn border_beyond_the_ordering_is_rejected() {
        assert_eq!(
            partition_by_borders(&ORDERED, &PLOT, &[6], 0.0),
            Err(OpticsError::DimensionMismatch {
                expected: 5,
                found: 6
            })
        );
    }

    #[test]
    fn unsorted_borders_are_rejected() {
        let unsorted = partition_by_borders(&ORDERED, &PLOT, &[3, 1], 0.0);
        let duplicated = partition_by_borders(&ORDERED, &PLOT, &[2, 2], 0.0);
        let expected = Err(OpticsError::InvalidParameter {
            reason: "cluster borders must be strictly ascending",
        });
        assert_eq!(unsorted, expected);
        assert_eq!(duplicated, expected);
    }

    #[test]
    fn mismatched_plot_length_is_rejected() {
        assert_eq!(
            partition_by_borders(&ORDERED, &PLOT[..4], &[], 0.0),
            Err(OpticsError::DimensionMismatch {
                expected: 5,
                found: 4
            })
        );
    }
}
