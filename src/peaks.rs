use std::cmp::Ordering;

use num_traits::float::FloatCore;
use serde::{Deserialize, Serialize};

use crate::error::OpticsError;

/// How cluster borders are chosen among the maxima of a reachability
/// sequence.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum PeakMode<A> {
    /// Split at the `k - 1` most persistent maxima, yielding up to `k`
    /// clusters.
    TopK(usize),
    /// Split at every maximum whose persistence reaches the threshold.
    Persistence(A),
}

impl<A> PeakMode<A>
where
    A: FloatCore,
{
    pub(crate) fn validate(self) -> Result<(), OpticsError> {
        match self {
            Self::TopK(0) => Err(OpticsError::InvalidParameter {
                reason: "the number of clusters must be at least 1",
            }),
            Self::Persistence(threshold) if threshold < A::zero() => {
                Err(OpticsError::InvalidParameter {
                    reason: "the persistence threshold must be non-negative",
                })
            }
            _ => Ok(()),
        }
    }
}

/// A local minimum paired with the local maximum at which its sub-level-set
/// component merged into an older one.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct PairedExtrema<A> {
    pub min_index: usize,
    pub max_index: usize,
    pub persistence: A,
}

const UNSEEN: usize = usize::MAX;

fn find(parent: &mut [usize], mut pos: usize) -> usize {
    while parent[pos] != pos {
        let grandparent = parent[parent[pos]];
        parent[pos] = grandparent;
        pos = grandparent;
    }
    pos
}

/// Pairs the local minima of `signal` with local maxima by flooding its
/// sub-level sets from the bottom up.
///
/// Positions are visited in ascending `(value, index)` order. A position
/// with no flooded neighbor births a component at a local minimum; a
/// position whose both neighbors are flooded is the maximum where two
/// components meet, and the one with the younger (higher) birth minimum
/// dies there. A pair's persistence is the height difference between its
/// maximum and its minimum. The global minimum never dies and is not
/// reported.
///
/// Pairs come back sorted by decreasing persistence, equally persistent
/// pairs by ascending maximum index.
#[must_use]
pub fn paired_extrema<A>(signal: &[A]) -> Vec<PairedExtrema<A>>
where
    A: FloatCore,
{
    let n = signal.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| {
        signal[a]
            .partial_cmp(&signal[b])
            .expect("reachability is never NaN")
            .then_with(|| a.cmp(&b))
    });

    // Path-halving union-find over positions; a root remembers the index of
    // the minimum its component was born at.
    let mut parent = vec![UNSEEN; n];
    let mut birth = vec![UNSEEN; n];
    let mut pairs = Vec::new();

    for &pos in &order {
        let left = pos.checked_sub(1).filter(|&l| parent[l] != UNSEEN);
        let right = (pos + 1 < n).then_some(pos + 1).filter(|&r| parent[r] != UNSEEN);
        match (left, right) {
            (None, None) => {
                parent[pos] = pos;
                birth[pos] = pos;
            }
            (Some(side), None) | (None, Some(side)) => {
                parent[pos] = find(&mut parent, side);
            }
            (Some(left), Some(right)) => {
                let left_root = find(&mut parent, left);
                let right_root = find(&mut parent, right);
                let (older, younger) = match signal[birth[left_root]]
                    .partial_cmp(&signal[birth[right_root]])
                    .expect("reachability is never NaN")
                    .then_with(|| birth[left_root].cmp(&birth[right_root]))
                {
                    Ordering::Greater => (right_root, left_root),
                    _ => (left_root, right_root),
                };
                pairs.push(PairedExtrema {
                    min_index: birth[younger],
                    max_index: pos,
                    persistence: signal[pos] - signal[birth[younger]],
                });
                parent[younger] = older;
                parent[pos] = older;
            }
        }
    }

    pairs.sort_unstable_by(|a, b| {
        b.persistence
            .partial_cmp(&a.persistence)
            .expect("persistence is never NaN")
            .then_with(|| a.max_index.cmp(&b.max_index))
    });
    pairs
}

/// Picks cluster borders from a reachability sequence.
///
/// In [`PeakMode::TopK`] the `k - 1` most persistent maxima come back,
/// most persistent first, or fewer when the sequence does not have that
/// many paired extrema. In [`PeakMode::Persistence`] every paired maximum
/// at least as persistent as the threshold comes back.
///
/// Indices are positions in `signal`. Sort them ascending before handing
/// them to [`partition_by_borders`](crate::partition_by_borders).
///
/// # Errors
///
/// Returns [`OpticsError::InvalidParameter`] for zero clusters or a
/// negative persistence threshold.
pub fn reachability_peaks<A>(signal: &[A], mode: PeakMode<A>) -> Result<Vec<usize>, OpticsError>
where
    A: FloatCore,
{
    mode.validate()?;
    let pairs = paired_extrema(signal);
    let peaks = match mode {
        PeakMode::TopK(k) => pairs.iter().take(k - 1).map(|p| p.max_index).collect(),
        PeakMode::Persistence(threshold) => pairs
            .iter()
            .filter(|p| p.persistence >= threshold)
            .map(|p| p.max_index)
            .collect(),
    };
    Ok(peaks)
}

#[cfg(test)]
mod test {
    use crate::undefined;

    use super::*;

    // One merge maximum between two valleys.
    const TWO_VALLEYS: [f64; 5] = [5.0, 1.0, 2.0, 0.5, 6.0];

    // Three valleys of increasing depth; pairs are (2, 1, 2.0), (6, 5, 2.0)
    // and (0, 3, 5.0).
    const THREE_VALLEYS: [f64; 8] = [1.0, 4.0, 2.0, 6.0, 0.0, 5.0, 3.0, 7.0];

    #[test]
    fn pairs_a_single_merge() {
        assert_eq!(
            paired_extrema(&TWO_VALLEYS),
            [PairedExtrema {
                min_index: 1,
                max_index: 2,
                persistence: 1.0
            }]
        );
    }

    #[test]
    fn pairs_sort_by_persistence_then_index() {
        let pairs = paired_extrema(&THREE_VALLEYS);
        assert_eq!(
            pairs,
            [
                PairedExtrema {
                    min_index: 0,
                    max_index: 3,
                    persistence: 5.0
                },
                PairedExtrema {
                    min_index: 2,
                    max_index: 1,
                    persistence: 2.0
                },
                PairedExtrema {
                    min_index: 6,
                    max_index: 5,
                    persistence: 2.0
                },
            ]
        );
    }

    #[test]
    fn monotone_and_flat_signals_have_no_pairs() {
        assert!(paired_extrema(&[1.0_f64, 2.0, 3.0, 4.0]).is_empty());
        assert!(paired_extrema(&[1.0_f64, 1.0, 1.0]).is_empty());
        assert!(paired_extrema::<f64>(&[]).is_empty());
        assert!(paired_extrema(&[7.0_f64]).is_empty());
    }

    #[test]
    fn sentinel_values_form_ordinary_maxima() {
        let signal = [undefined::<f64>(), 1.0, undefined::<f64>(), 2.0, undefined::<f64>()];
        let pairs = paired_extrema(&signal);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].min_index, 3);
        assert_eq!(pairs[0].max_index, 2);
        assert_eq!(reachability_peaks(&signal, PeakMode::TopK(2)).unwrap(), [2]);
    }

    #[test]
    fn top_k_caps_the_border_count() {
        assert_eq!(
            reachability_peaks(&THREE_VALLEYS, PeakMode::TopK(1)).unwrap(),
            Vec::<usize>::new()
        );
        assert_eq!(
            reachability_peaks(&THREE_VALLEYS, PeakMode::TopK(3)).unwrap(),
            [3, 1]
        );
        assert_eq!(
            reachability_peaks(&THREE_VALLEYS, PeakMode::TopK(10)).unwrap(),
            [3, 1, 5]
        );
    }

    #[test]
    fn threshold_keeps_peaks_at_or_above() {
        assert_eq!(
            reachability_peaks(&THREE_VALLEYS, PeakMode::Persistence(2.0)).unwrap(),
            [3, 1, 5]
        );
        assert_eq!(
            reachability_peaks(&THREE_VALLEYS, PeakMode::Persistence(2.5)).unwrap(),
            [3]
        );
        assert_eq!(
            reachability_peaks(&THREE_VALLEYS, PeakMode::Persistence(6.0)).unwrap(),
            Vec::<usize>::new()
        );
    }

    #[test]
    fn invalid_modes_are_rejected() {
        assert_eq!(
            reachability_peaks(&TWO_VALLEYS, PeakMode::TopK(0)),
            Err(OpticsError::InvalidParameter {
                reason: "the number of clusters must be at least 1"
            })
        );
        assert_eq!(
            reachability_peaks(&TWO_VALLEYS, PeakMode::Persistence(-0.1)),
            Err(OpticsError::InvalidParameter {
                reason: "the persistence threshold must be non-negative"
            })
        );
    }
}
