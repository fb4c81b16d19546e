//! Zero-phase FIR filtering by overlap-add FFT convolution.
//!
//! Zero phase comes from shifting the output left by `(N-1)/2` samples
//! (linear-phase FIR), not from running the filter twice.  Edges are
//! extended with `N-1` reflect-limited samples on each side to suppress
//! the start-up transient.
//!
//! [`FirFilter`] plans its FFTs once per (filter, signal length) so the same
//! band can be run over every trial and channel without re-planning.
use std::sync::Arc;

use ndarray::{s, Array3};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// A linear-phase FIR filter prepared for signals of a fixed length.
pub struct FirFilter {
    n_taps: usize,
    n_x: usize,
    n_fft: usize,
    h_fft: Vec<Complex<f32>>,
    fwd: Arc<dyn Fft<f32>>,
    inv: Arc<dyn Fft<f32>>,
}

impl FirFilter {
    /// Prepare `taps` (odd length) for signals of `n_x` samples.
    pub fn new(taps: &[f32], n_x: usize) -> Self {
        let n_taps = taps.len();
        let n_ext = n_x + 2 * (n_taps - 1);
        let n_fft = choose_fft_len(n_taps, n_ext);

        let mut planner: FftPlanner<f32> = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft: Vec<Complex<f32>> = taps
            .iter()
            .map(|&v| Complex { re: v, im: 0.0 })
            .chain(std::iter::repeat(Complex::default()))
            .take(n_fft)
            .collect();
        fwd.process(&mut h_fft);

        Self { n_taps, n_x, n_fft, h_fft, fwd, inv }
    }

    /// Filter one signal; the output has the same length as `x`.
    ///
    /// # Panics
    ///
    /// If `x.len()` differs from the length the filter was prepared for.
    pub fn apply(&self, x: &[f32]) -> Vec<f32> {
        assert_eq!(x.len(), self.n_x, "FirFilter prepared for another signal length");
        if x.is_empty() {
            return vec![];
        }
        let shift = (self.n_taps - 1) / 2;
        let n_edge = self.n_taps - 1;
        let x_ext = reflect_limited_pad(x, n_edge);
        let n_ext = x_ext.len();

        let n_seg = self.n_fft - self.n_taps + 1;
        let inv_scale = 1.0 / self.n_fft as f32;
        let mut y = vec![0.0_f32; n_ext];
        let mut buf = vec![Complex::<f32>::default(); self.n_fft];

        for start in (0..n_ext).step_by(n_seg) {
            let stop = (start + n_seg).min(n_ext);
            buf.iter_mut().for_each(|b| *b = Complex::default());
            for (b, &v) in buf.iter_mut().zip(&x_ext[start..stop]) {
                b.re = v;
            }

            self.fwd.process(&mut buf);
            for (b, &hf) in buf.iter_mut().zip(&self.h_fft) {
                *b *= hf;
            }
            self.inv.process(&mut buf);

            let out_start = start.saturating_sub(shift);
            let out_end = (out_start + self.n_fft).min(n_ext);
            let prod_start = shift.saturating_sub(start);
            for (o, p) in (out_start..out_end).zip(prod_start..self.n_fft) {
                y[o] += buf[p].re * inv_scale;
            }
        }

        y[n_edge..n_edge + self.n_x].to_vec()
    }

    /// Filter every `(trial, channel)` row of `data` (`[N, C, T]`).
    pub fn apply_trials(&self, data: &Array3<f32>) -> Array3<f32> {
        let (n_trials, n_ch, _) = data.dim();
        let mut out = Array3::<f32>::zeros(data.raw_dim());
        for tr in 0..n_trials {
            for ch in 0..n_ch {
                let row: Vec<f32> = data.slice(s![tr, ch, ..]).to_vec();
                let filtered = self.apply(&row);
                out.slice_mut(s![tr, ch, ..])
                    .assign(&ndarray::ArrayView1::from(&filtered));
            }
        }
        out
    }
}

/// Odd reflection around the end samples, `n_pad` samples per side
/// (limited to the signal length, zero beyond).
fn reflect_limited_pad(x: &[f32], n_pad: usize) -> Vec<f32> {
    let n = x.len();
    let reach = n_pad.min(n - 1);
    let first = x[0];
    let last = x[n - 1];

    let mut out = Vec::with_capacity(n + 2 * n_pad);
    out.extend(std::iter::repeat(0.0).take(n_pad - reach));
    out.extend((1..=reach).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=reach).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_pad - reach));
    out
}

/// Power-of-two FFT size minimising
/// `ceil(n_x / (N - n_h + 1)) · N · (log2 N + 1) + 4e-5 · N · n_x`.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let max_pow = (n_x as f64).log2().ceil() as u32 + 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;

    let mut best_n = 1_usize << max_pow.max(min_pow);
    let mut best_cost = f64::INFINITY;
    for pow in min_pow..=max_pow {
        let n = 1_usize << pow;
        if n < min_fft {
            continue;
        }
        let n_seg = (n - n_h + 1) as f64;
        let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
            + 4e-5 * n as f64 * n_x as f64;
        if cost < best_cost {
            best_cost = cost;
            best_n = n;
        }
    }
    best_n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::design::design_bandpass;
    use std::f32::consts::PI;

    fn tone(freq: f32, sfreq: f32, n: usize) -> Vec<f32> {
        (0..n).map(|i| (2.0 * PI * freq * i as f32 / sfreq).sin()).collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn output_length_matches_input() {
        let h = design_bandpass(8.0, 12.0, 250.0).unwrap();
        let f = FirFilter::new(&h, 1000);
        assert_eq!(f.apply(&tone(10.0, 250.0, 1000)).len(), 1000);
    }

    #[test]
    fn passband_tone_survives_stopband_tone_does_not() {
        let h = design_bandpass(8.0, 12.0, 250.0).unwrap();
        let n = 2000;
        let f = FirFilter::new(&h, n);
        let pass = f.apply(&tone(10.0, 250.0, n));
        let stop = f.apply(&tone(30.0, 250.0, n));
        let inner = h.len()..n - h.len();
        assert!(rms(&pass[inner.clone()]) > 0.6, "pass rms = {}", rms(&pass[inner.clone()]));
        assert!(rms(&stop[inner.clone()]) < 0.05, "stop rms = {}", rms(&stop[inner]));
    }

    #[test]
    fn reflect_limited_pad_values() {
        let x = [1.0_f32, 2.0, 3.0, 4.0, 5.0];
        let padded = reflect_limited_pad(&x, 3);
        assert_eq!(&padded[..3], &[-2.0_f32, -1.0, 0.0]);
        assert_eq!(&padded[3..8], &x[..]);
        assert_eq!(&padded[8..], &[6.0_f32, 7.0, 8.0]);
    }

    #[test]
    fn short_signal_padded_with_zeros() {
        let padded = reflect_limited_pad(&[1.0, 2.0], 3);
        assert_eq!(padded, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0]);
    }
}
