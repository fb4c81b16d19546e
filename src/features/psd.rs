//! Welch power spectral density.
//!
//! Matches `scipy.signal.welch(x, fs)` with its defaults: periodic Hann
//! window, `nperseg = 256`, 50 % overlap, constant detrend, one-sided
//! density scaling, mean over segments.  Signals shorter than `nperseg` use
//! a single segment of the whole signal, zero-padded to `nfft`, so the
//! output always has `nfft / 2 + 1` bins (129 by default).
use ndarray::{s, Array3};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{Result, XaiError};
use crate::features::TrialTransform;
use crate::filter::hann_periodic;

/// Welch estimator parameters.
#[derive(Debug, Clone)]
pub struct WelchConfig {
    /// Sampling rate in Hz (only scales the density).
    ///
    /// Default: `250.0`.
    pub sfreq: f32,
    /// Samples per segment.
    ///
    /// Default: `256`.
    pub nperseg: usize,
    /// Samples shared by consecutive segments.
    ///
    /// Default: `128`.
    pub noverlap: usize,
    /// FFT length; the output has `nfft / 2 + 1` bins.
    ///
    /// Default: `256`.
    pub nfft: usize,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self { sfreq: 250.0, nperseg: 256, noverlap: 128, nfft: 256 }
    }
}

/// Welch PSD extractor, `[N, C, T]` → `[N, C, nfft/2 + 1]`.
#[derive(Debug, Clone, Default)]
pub struct Welch {
    pub cfg: WelchConfig,
}

impl Welch {
    pub fn new(cfg: WelchConfig) -> Self {
        Self { cfg }
    }

    /// Reject segment settings the estimator cannot honour.
    ///
    /// # Errors
    ///
    /// [`XaiError::InvalidConfiguration`] if `nperseg` is 0, `nfft < nperseg`
    /// or `noverlap >= nperseg`.
    pub fn check(&self) -> Result<()> {
        let WelchConfig { nperseg, noverlap, nfft, .. } = self.cfg;
        if nperseg == 0 {
            return Err(XaiError::config("nperseg must be at least 1"));
        }
        if nfft < nperseg {
            return Err(XaiError::config(format!("nfft ({nfft}) must be at least nperseg ({nperseg})")));
        }
        if noverlap >= nperseg {
            return Err(XaiError::config(format!(
                "noverlap ({noverlap}) must be smaller than nperseg ({nperseg})"
            )));
        }
        Ok(())
    }

    /// Number of frequency bins produced.
    pub fn n_bins(&self) -> usize {
        self.cfg.nfft / 2 + 1
    }

    /// PSD of one signal.
    pub fn psd(&self, x: &[f32]) -> Result<Vec<f32>> {
        let n = x.len();
        if n == 0 {
            return Err(XaiError::config("cannot estimate the PSD of an empty signal"));
        }
        self.check()?;
        let nperseg = self.cfg.nperseg.min(n);
        let noverlap = if nperseg < self.cfg.nperseg { nperseg / 2 } else { self.cfg.noverlap };
        if noverlap >= nperseg {
            return Err(XaiError::config(format!(
                "noverlap ({noverlap}) must be smaller than nperseg ({nperseg})"
            )));
        }
        let nfft = self.cfg.nfft;
        let step = nperseg - noverlap;
        let n_seg = (n - nperseg) / step + 1;

        let win = hann_periodic(nperseg);
        let win_sq: f64 = win.iter().map(|w| w * w).sum();
        let scale = 1.0 / (self.cfg.sfreq as f64 * win_sq);

        let mut planner: FftPlanner<f64> = FftPlanner::new();
        let fft = planner.plan_fft_forward(nfft);

        let n_bins = nfft / 2 + 1;
        let mut acc = vec![0.0_f64; n_bins];
        let mut buf = vec![Complex::<f64>::default(); nfft];
        for seg in 0..n_seg {
            let chunk = &x[seg * step..seg * step + nperseg];
            let mean = chunk.iter().map(|&v| v as f64).sum::<f64>() / nperseg as f64;

            buf.iter_mut().for_each(|b| *b = Complex::default());
            for ((b, &v), &w) in buf.iter_mut().zip(chunk).zip(&win) {
                b.re = (v as f64 - mean) * w;
            }
            fft.process(&mut buf);

            for (a, b) in acc.iter_mut().zip(&buf) {
                *a += b.norm_sqr();
            }
        }

        // one-sided: fold the negative frequencies into every bin except DC
        // (and Nyquist when nfft is even)
        let last_doubled = if nfft % 2 == 0 { n_bins - 1 } else { n_bins };
        Ok(acc
            .iter()
            .enumerate()
            .map(|(k, &p)| {
                let fold = if k > 0 && k < last_doubled { 2.0 } else { 1.0 };
                (p * scale * fold / n_seg as f64) as f32
            })
            .collect())
    }
}

impl TrialTransform for Welch {
    fn name(&self) -> &'static str {
        "psd"
    }

    fn transform(&self, data: &Array3<f32>) -> Result<Array3<f32>> {
        self.check()?;
        let (n_trials, n_ch, _) = data.dim();
        let mut out = Array3::<f32>::zeros((n_trials, n_ch, self.n_bins()));
        for tr in 0..n_trials {
            for ch in 0..n_ch {
                let row: Vec<f32> = data.slice(s![tr, ch, ..]).to_vec();
                let p = self.psd(&row)?;
                out.slice_mut(s![tr, ch, ..])
                    .assign(&ndarray::ArrayView1::from(&p));
            }
        }
        Ok(out)
    }
}
