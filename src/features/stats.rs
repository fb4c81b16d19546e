//! Statistical characteristics of each channel.
//!
//! For every trial and channel the output row is
//!
//! ```text
//! [ mean, mean², variance, skewness, kurtosis, entropy, auc, zero crossings,
//!   peak-to-peak, reserved = 0, corr(ch, 0), …, corr(ch, C-1) ]
//! ```
//!
//! so `F = N_DESCRIPTORS + C`.  Zero crossings are sign changes between
//! consecutive samples, with `0.0` counted as non-negative.  Moments are population moments
//! (`ddof = 0`); kurtosis is Fisher's (excess) kurtosis.  Entropy is the
//! log-energy entropy `Σ ln(x²)`, which is `−∞` as soon as one sample is
//! exactly zero (e.g. after zero ablation).  Non-finite entropies and
//! undefined correlations (a constant channel) are replaced by
//! [`DEGENERATE_SENTINEL`].
use ndarray::{s, Array2, Array3, ArrayView2};

use crate::error::Result;
use crate::features::TrialTransform;

/// Number of per-channel descriptors before the correlation row.
pub const N_DESCRIPTORS: usize = 10;

/// Stand-in for a statistic that has no finite value.
pub const DEGENERATE_SENTINEL: f32 = -5.0;

/// Slot 9 is reserved for a future descriptor and always holds this value.
const RESERVED: f64 = 0.0;

/// Statistical-characteristics extractor, `[N, C, T]` → `[N, C, 10 + C]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics;

/// The nine computed descriptors of one signal plus the reserved slot.
pub fn descriptors(x: &[f32]) -> [f64; N_DESCRIPTORS] {
    let n = x.len() as f64;
    let mean = x.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_sq = x.iter().map(|&v| (v as f64).powi(2)).sum::<f64>() / n;

    let (m2, m3, m4) = x.iter().fold((0.0, 0.0, 0.0), |(a, b, c), &v| {
        let d = v as f64 - mean;
        let d2 = d * d;
        (a + d2, b + d2 * d, c + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    let (skew, kurt) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        (0.0, 0.0)
    };

    let entropy: f64 = x.iter().map(|&v| ((v as f64) * (v as f64)).ln()).sum();
    let auc: f64 = x.windows(2).map(|w| (w[0] as f64 + w[1] as f64) / 2.0).sum();
    let crossings = x.windows(2).filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0)).count() as f64;
    let (lo, hi) = x
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    [mean, mean_sq, m2, skew, kurt, entropy, auc, crossings, (hi - lo) as f64, RESERVED]
}

/// Pearson correlation between the rows of `x` (`[C, T]`).
///
/// Entries involving a constant channel are `NaN`.
pub fn correlation_matrix(x: ArrayView2<'_, f32>) -> Array2<f64> {
    let (n_ch, n_t) = x.dim();
    let centred: Vec<Vec<f64>> = x
        .rows()
        .into_iter()
        .map(|row| {
            let m = row.iter().map(|&v| v as f64).sum::<f64>() / n_t as f64;
            row.iter().map(|&v| v as f64 - m).collect()
        })
        .collect();
    let norms: Vec<f64> = centred.iter().map(|r| r.iter().map(|v| v * v).sum::<f64>().sqrt()).collect();

    Array2::from_shape_fn((n_ch, n_ch), |(i, j)| {
        let dot: f64 = centred[i].iter().zip(&centred[j]).map(|(a, b)| a * b).sum();
        dot / (norms[i] * norms[j])
    })
}

impl TrialTransform for Statistics {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn transform(&self, data: &Array3<f32>) -> Result<Array3<f32>> {
        let (n_trials, n_ch, _) = data.dim();
        let mut out = Array3::<f32>::zeros((n_trials, n_ch, N_DESCRIPTORS + n_ch));

        for tr in 0..n_trials {
            let trial = data.slice(s![tr, .., ..]);
            let corr = correlation_matrix(trial);
            for ch in 0..n_ch {
                let row: Vec<f32> = trial.row(ch).to_vec();
                let desc = descriptors(&row);
                let mut dst = out.slice_mut(s![tr, ch, ..]);
                for (k, &v) in desc.iter().enumerate() {
                    dst[k] = if v == f64::NEG_INFINITY { DEGENERATE_SENTINEL } else { v as f32 };
                }
                for (k, &r) in corr.row(ch).iter().enumerate() {
                    dst[N_DESCRIPTORS + k] = if r.is_finite() { r as f32 } else { DEGENERATE_SENTINEL };
                }
            }
        }
        Ok(out)
    }
}
