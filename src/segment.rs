//! Temporal segmentation of the sample axis.
//!
//! Splits `[0, n_samples)` into `n_segments` contiguous `(start, end)` pairs
//! (end exclusive).  Every segment has `floor(n_samples / n_segments)`
//! samples except the last one, which is stretched to `n_samples`:
//!
//! ```text
//! n_samples = 10, n_segments = 3   →   (0,3) (3,6) (6,10)
//! ```
use crate::error::{Result, XaiError};

/// Compute the `(start, end)` sample ranges of `n_segments` segments.
///
/// Segment `k` spans `[k·L, (k+1)·L)` with `L = n_samples / n_segments`.
/// Its end is forced to `n_samples` when the following boundary
/// `(k+2)·L` would overshoot the recording, and the final segment always
/// ends at `n_samples` so the ranges cover the whole axis.
///
/// # Errors
///
/// [`XaiError::InvalidConfiguration`] when `n_segments == 0` or
/// `n_segments > n_samples`.
///
/// # Examples
///
/// ```
/// use exg_xai::segment::segment_indices;
/// assert_eq!(segment_indices(8, 2).unwrap(), vec![(0, 4), (4, 8)]);
/// ```
pub fn segment_indices(n_samples: usize, n_segments: usize) -> Result<Vec<(usize, usize)>> {
    if n_segments == 0 {
        return Err(XaiError::config("segment count must be at least 1"));
    }
    if n_segments > n_samples {
        return Err(XaiError::config(format!(
            "cannot split {n_samples} samples into {n_segments} segments"
        )));
    }

    let seg_len = n_samples / n_segments;
    let last = n_segments - 1;

    Ok((0..n_segments)
        .map(|k| {
            let start = k * seg_len;
            let end = if (k + 2) * seg_len > n_samples || k == last {
                n_samples
            } else {
                (k + 1) * seg_len
            };
            (start, end)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split() {
        let seg = segment_indices(1000, 8).unwrap();
        assert_eq!(seg.len(), 8);
        assert_eq!(seg[0], (0, 125));
        assert_eq!(seg[7], (875, 1000));
    }

    #[test]
    fn remainder_goes_to_last_segment() {
        assert_eq!(segment_indices(10, 3).unwrap(), vec![(0, 3), (3, 6), (6, 10)]);
        // remainder (2) is as large as the segment length (2)
        assert_eq!(segment_indices(8, 3).unwrap(), vec![(0, 2), (2, 4), (4, 8)]);
    }

    #[test]
    fn single_segment_covers_everything() {
        assert_eq!(segment_indices(17, 1).unwrap(), vec![(0, 17)]);
    }

    #[test]
    fn one_sample_per_segment() {
        let seg = segment_indices(5, 5).unwrap();
        assert_eq!(seg, vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
    }

    #[test]
    fn zero_segments_rejected() {
        assert!(matches!(
            segment_indices(100, 0),
            Err(XaiError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn more_segments_than_samples_rejected() {
        assert!(segment_indices(3, 4).is_err());
    }

    #[test]
    fn contiguous_and_covering_for_all_counts() {
        for n in 1..=64usize {
            for k in 1..=n {
                let seg = segment_indices(n, k).unwrap();
                assert_eq!(seg.len(), k);
                assert_eq!(seg[0].0, 0);
                assert_eq!(seg[k - 1].1, n, "n={n} k={k}");
                for w in seg.windows(2) {
                    assert_eq!(w[0].1, w[1].0, "gap/overlap at n={n} k={k}");
                }
                for &(s, e) in &seg {
                    assert!(s < e && e <= n);
                }
            }
        }
    }
}
