//! Trial labels and class partitioning.
//!
//! Two encodings are accepted and can be converted into each other:
//!
//! * class index — `1` (left hand) or `2` (right hand), one per trial;
//! * one-hot    — `[1, 0]` for class 1, `[0, 1]` for class 2, shape `[N, 2]`.
//!
//! A one-hot row belongs to a class only if the **whole row** equals that
//! class's code; anything else is rejected.
use std::collections::BTreeMap;

use ndarray::{s, Array2, Array3};

use crate::error::{Result, XaiError};

/// Class index of left-hand motor imagery.
pub const LEFT_HAND: u8 = 1;
/// Class index of right-hand motor imagery.
pub const RIGHT_HAND: u8 = 2;

const ONE_HOT: [(u8, [f32; 2]); 2] = [(LEFT_HAND, [1.0, 0.0]), (RIGHT_HAND, [0.0, 1.0])];

/// Label vector aligned with the trial axis of a trial tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    /// One class index (1 or 2) per trial.
    Classes(Vec<u8>),
    /// One one-hot row per trial, shape `[N, 2]`.
    OneHot(Array2<f32>),
}

impl Labels {
    /// Number of trials labelled.
    pub fn len(&self) -> usize {
        match self {
            Labels::Classes(c) => c.len(),
            Labels::OneHot(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class index of every trial.
    ///
    /// # Errors
    ///
    /// [`XaiError::ShapeMismatch`] if a class index is not 1 or 2, or a
    /// one-hot row matches neither code.
    pub fn classes(&self) -> Result<Vec<u8>> {
        match self {
            Labels::Classes(c) => {
                if let Some(&bad) = c.iter().find(|&&v| v != LEFT_HAND && v != RIGHT_HAND) {
                    return Err(XaiError::ShapeMismatch {
                        what: "class index (1 or 2)",
                        expected: RIGHT_HAND as usize,
                        got: bad as usize,
                    });
                }
                Ok(c.clone())
            }
            Labels::OneHot(m) => {
                if m.ncols() != 2 {
                    return Err(XaiError::ShapeMismatch {
                        what: "one-hot label width",
                        expected: 2,
                        got: m.ncols(),
                    });
                }
                m.rows()
                    .into_iter()
                    .enumerate()
                    .map(|(i, row)| {
                        ONE_HOT
                            .iter()
                            .find(|(_, code)| row.iter().eq(code.iter()))
                            .map(|&(class, _)| class)
                            .ok_or(XaiError::ShapeMismatch {
                                what: "one-hot row matching a class code",
                                expected: 1,
                                got: i,
                            })
                    })
                    .collect()
            }
        }
    }

    /// Convert to the one-hot encoding.
    pub fn to_one_hot(&self) -> Result<Array2<f32>> {
        let classes = self.classes()?;
        let mut out = Array2::<f32>::zeros((classes.len(), 2));
        for (i, &c) in classes.iter().enumerate() {
            out[[i, (c - 1) as usize]] = 1.0;
        }
        Ok(out)
    }

    /// `n` copies of `class`, encoded like `self`.
    pub fn repeat_like(&self, class: u8, n: usize) -> Labels {
        match self {
            Labels::Classes(_) => Labels::Classes(vec![class; n]),
            Labels::OneHot(_) => {
                let mut m = Array2::<f32>::zeros((n, 2));
                m.column_mut((class - 1) as usize).fill(1.0);
                Labels::OneHot(m)
            }
        }
    }
}

impl From<Vec<u8>> for Labels {
    fn from(classes: Vec<u8>) -> Self {
        Labels::Classes(classes)
    }
}

/// Fail unless `labels` has exactly one entry per trial of `data`.
pub fn check_aligned(data: &Array3<f32>, labels: &Labels) -> Result<()> {
    let n_trials = data.shape()[0];
    if labels.len() != n_trials {
        return Err(XaiError::ShapeMismatch {
            what: "label count vs trial count",
            expected: n_trials,
            got: labels.len(),
        });
    }
    Ok(())
}

/// Trials of a single class, with their positions in the source tensor.
#[derive(Debug, Clone)]
pub struct ClassTrials {
    /// `[n_class_trials, C, T]`
    pub trials: Array3<f32>,
    /// Row of each trial in the unpartitioned tensor.
    pub indices: Vec<usize>,
}

/// Split `data` by class: `{1: trials of class 1, 2: trials of class 2}`.
///
/// Classes without trials are absent from the map.
pub fn partition_by_class(data: &Array3<f32>, labels: &Labels) -> Result<BTreeMap<u8, ClassTrials>> {
    check_aligned(data, labels)?;
    let classes = labels.classes()?;

    let mut out = BTreeMap::new();
    for class in [LEFT_HAND, RIGHT_HAND] {
        let indices: Vec<usize> = classes
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| (c == class).then_some(i))
            .collect();
        if indices.is_empty() {
            continue;
        }
        let trials = select_trials(data, &indices);
        out.insert(class, ClassTrials { trials, indices });
    }
    Ok(out)
}

/// Trials at `indices`, in that order.
pub fn select_trials(data: &Array3<f32>, indices: &[usize]) -> Array3<f32> {
    if indices.is_empty() {
        let (_, c, t) = data.dim();
        return Array3::zeros((0, c, t));
    }
    let mut out = Array3::<f32>::zeros((indices.len(), data.shape()[1], data.shape()[2]));
    for (row, &i) in indices.iter().enumerate() {
        out.slice_mut(s![row, .., ..]).assign(&data.slice(s![i, .., ..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn one_hot_round_trip_matches_classes() {
        let l = Labels::Classes(vec![1, 2, 2, 1]);
        let oh = l.to_one_hot().unwrap();
        assert_eq!(oh, array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(Labels::OneHot(oh).classes().unwrap(), vec![1, 2, 2, 1]);
    }

    #[test]
    fn partial_one_hot_row_rejected() {
        let l = Labels::OneHot(array![[1.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(l.classes(), Err(XaiError::ShapeMismatch { got: 1, .. })));
    }

    #[test]
    fn class_outside_range_rejected() {
        assert!(Labels::Classes(vec![1, 3]).classes().is_err());
        assert!(Labels::Classes(vec![0]).classes().is_err());
    }

    #[test]
    fn partition_keeps_original_rows() {
        let data = Array3::from_shape_fn((5, 2, 3), |(n, _, _)| n as f32);
        let labels = Labels::Classes(vec![2, 1, 2, 2, 1]);
        let parts = partition_by_class(&data, &labels).unwrap();
        assert_eq!(parts[&1].indices, vec![1, 4]);
        assert_eq!(parts[&2].indices, vec![0, 2, 3]);
        assert_eq!(parts[&2].trials.shape(), &[3, 2, 3]);
        assert_eq!(parts[&1].trials[[1, 0, 0]], 4.0);
    }

    #[test]
    fn partition_rejects_misaligned_labels() {
        let data = Array3::<f32>::zeros((3, 1, 4));
        let err = partition_by_class(&data, &Labels::Classes(vec![1, 2])).unwrap_err();
        assert!(matches!(err, XaiError::ShapeMismatch { expected: 3, got: 2, .. }));
    }

    #[test]
    fn repeat_like_follows_encoding() {
        let oh = Labels::OneHot(Array2::zeros((0, 2)));
        assert_eq!(oh.repeat_like(2, 2), Labels::OneHot(array![[0.0, 1.0], [0.0, 1.0]]));
        assert_eq!(Labels::Classes(vec![]).repeat_like(1, 3), Labels::Classes(vec![1, 1, 1]));
    }
}
