//! Classifier seam.
//!
//! The engine never trains anything: it only asks an already trained model
//! for its loss and accuracy on a (possibly perturbed) feature tensor.
//! Any model plugs in by implementing [`Classifier`].
//!
//! [`NearestCentroid`] is a small deterministic reference model used by the
//! `xai` binary and the tests.
use std::collections::BTreeMap;

use ndarray::{Array1, Array3, ArrayView1};

use crate::error::XaiError;
use crate::labels::{check_aligned, Labels};

/// Metrics reported by [`Classifier::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    /// Fraction of correctly classified trials, in `[0, 1]`.
    pub accuracy: f32,
}

/// A trained two-class model that can be evaluated on a batch.
pub trait Classifier {
    /// Evaluate on `features` (`[N, …]`) against `labels` (one per trial).
    ///
    /// Must not modify the model.
    fn evaluate(&self, features: &Array3<f32>, labels: &Labels) -> anyhow::Result<Evaluation>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn evaluate(&self, features: &Array3<f32>, labels: &Labels) -> anyhow::Result<Evaluation> {
        (**self).evaluate(features, labels)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn evaluate(&self, features: &Array3<f32>, labels: &Labels) -> anyhow::Result<Evaluation> {
        (**self).evaluate(features, labels)
    }
}

/// Assigns each trial to the class whose mean feature vector is closest
/// (squared Euclidean distance over the flattened `[C, F]` features).
///
/// The loss is the cross-entropy of `softmax(−distance²)`.
#[derive(Debug, Clone)]
pub struct NearestCentroid {
    centroids: BTreeMap<u8, Array1<f32>>,
    dim: (usize, usize),
}

impl NearestCentroid {
    /// Class means of `features` (`[N, C, F]`).
    pub fn fit(features: &Array3<f32>, labels: &Labels) -> crate::Result<Self> {
        check_aligned(features, labels)?;
        let classes = labels.classes()?;
        let (_, c, f) = features.dim();
        let flat = flatten(features);

        let mut sums: BTreeMap<u8, (Array1<f32>, usize)> = BTreeMap::new();
        for (row, &class) in flat.outer_iter().zip(&classes) {
            let entry = sums.entry(class).or_insert_with(|| (Array1::zeros(c * f), 0));
            entry.0 += &row;
            entry.1 += 1;
        }
        if sums.is_empty() {
            return Err(XaiError::config("cannot fit a classifier on zero trials"));
        }
        let centroids = sums.into_iter().map(|(k, (s, n))| (k, s / n as f32)).collect();
        Ok(Self { centroids, dim: (c, f) })
    }

    /// Squared distance from `x` to every centroid, by class.
    fn distances(&self, x: ArrayView1<'_, f32>) -> Vec<(u8, f32)> {
        self.centroids
            .iter()
            .map(|(&k, c)| (k, x.iter().zip(c.iter()).map(|(a, b)| (a - b) * (a - b)).sum()))
            .collect()
    }

    /// Predicted class of every trial.
    pub fn predict(&self, features: &Array3<f32>) -> crate::Result<Vec<u8>> {
        self.check_dim(features)?;
        Ok(flatten(features)
            .outer_iter()
            .map(|row| {
                self.distances(row)
                    .into_iter()
                    .fold((0u8, f32::INFINITY), |best, (k, d)| if d < best.1 { (k, d) } else { best })
                    .0
            })
            .collect())
    }

    fn check_dim(&self, features: &Array3<f32>) -> crate::Result<()> {
        let (_, c, f) = features.dim();
        if (c, f) != self.dim {
            return Err(XaiError::ShapeMismatch {
                what: "feature size per trial",
                expected: self.dim.0 * self.dim.1,
                got: c * f,
            });
        }
        Ok(())
    }
}

fn flatten(features: &Array3<f32>) -> ndarray::Array2<f32> {
    let (n, c, f) = features.dim();
    ndarray::Array2::from_shape_fn((n, c * f), |(i, k)| features[[i, k / f, k % f]])
}

impl Classifier for NearestCentroid {
    fn evaluate(&self, features: &Array3<f32>, labels: &Labels) -> anyhow::Result<Evaluation> {
        check_aligned(features, labels)?;
        self.check_dim(features)?;
        let truth = labels.classes()?;
        let n = truth.len();
        if n == 0 {
            return Ok(Evaluation { loss: 0.0, accuracy: 0.0 });
        }

        let mut correct = 0usize;
        let mut loss = 0.0_f64;
        for (row, &class) in flatten(features).outer_iter().zip(&truth) {
            let dist = self.distances(row);
            let predicted = dist
                .iter()
                .fold((0u8, f32::INFINITY), |best, &(k, d)| if d < best.1 { (k, d) } else { best })
                .0;
            if predicted == class {
                correct += 1;
            }
            // log-sum-exp over the logits −d²
            let max_logit = dist.iter().map(|&(_, d)| -(d as f64)).fold(f64::NEG_INFINITY, f64::max);
            let lse = max_logit + dist.iter().map(|&(_, d)| (-(d as f64) - max_logit).exp()).sum::<f64>().ln();
            let own = dist.iter().find(|&&(k, _)| k == class).map(|&(_, d)| -(d as f64));
            loss += match own {
                Some(logit) => lse - logit,
                None => f64::from(f32::MAX),
            };
        }

        Ok(Evaluation { loss: (loss / n as f64) as f32, accuracy: correct as f32 / n as f32 })
    }
}
