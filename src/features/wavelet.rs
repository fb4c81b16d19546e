//! One-level Haar (db1) discrete wavelet transform.
//!
//! Matches `pywt.dwt(x, 'db1')` with the default symmetric extension:
//!
//! ```text
//! cA[k] = (x[2k] + x[2k+1]) / √2
//! cD[k] = (x[2k] − x[2k+1]) / √2        k = 0 .. ceil(T/2)
//! ```
//!
//! For odd `T` the last pair is `(x[T-1], x[T-1])`.
use ndarray::{s, Array3};

use crate::error::Result;
use crate::features::TrialTransform;

/// Haar DWT feature extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wavelet {
    /// Append the detail coefficients after the approximation ones.
    pub detail: bool,
}

impl Wavelet {
    /// Approximation coefficients only, `F = ceil(T/2)`.
    pub fn approximation() -> Self {
        Self { detail: false }
    }

    /// Approximation then detail coefficients, `F = 2 · ceil(T/2)`.
    pub fn with_detail() -> Self {
        Self { detail: true }
    }
}

/// `(cA, cD)` of a single signal.
pub fn haar_dwt(x: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = x.len();
    let half = n.div_ceil(2);
    let mut ca = Vec::with_capacity(half);
    let mut cd = Vec::with_capacity(half);
    for k in 0..half {
        let a = x[2 * k];
        let b = if 2 * k + 1 < n { x[2 * k + 1] } else { a };
        ca.push((a + b) * std::f32::consts::FRAC_1_SQRT_2);
        cd.push((a - b) * std::f32::consts::FRAC_1_SQRT_2);
    }
    (ca, cd)
}

impl TrialTransform for Wavelet {
    fn name(&self) -> &'static str {
        if self.detail { "wavelet+detail" } else { "wavelet" }
    }

    fn transform(&self, data: &Array3<f32>) -> Result<Array3<f32>> {
        let (n_trials, n_ch, n_t) = data.dim();
        let half = n_t.div_ceil(2);
        let width = if self.detail { 2 * half } else { half };

        let mut out = Array3::<f32>::zeros((n_trials, n_ch, width));
        for tr in 0..n_trials {
            for ch in 0..n_ch {
                let row: Vec<f32> = data.slice(s![tr, ch, ..]).to_vec();
                let (ca, cd) = haar_dwt(&row);
                let mut dst = out.slice_mut(s![tr, ch, ..]);
                for (d, v) in dst.iter_mut().zip(ca.iter().chain(cd.iter().take(width - half))) {
                    *d = *v;
                }
            }
        }
        Ok(out)
    }
}
