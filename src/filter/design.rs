//! Windowed-sinc FIR design for the FBCSP filter bank.
//!
//! A band-pass `[l_freq, h_freq]` at sampling rate `sfreq` is built the way
//! `mne.filter.create_filter(l_freq, h_freq, fir_window='hamming')` does:
//!   • lower transition bandwidth = min(max(0.25 · l_freq, 2), l_freq)
//!   • upper transition bandwidth = min(max(0.25 · h_freq, 2), nyq − h_freq)
//!   • filter length N            = ceil(3.3 / min(bw) · sfreq), rounded to odd
//!   • response = lowpass(h_cut) − lowpass(l_cut), cut-offs at the middle
//!     of each transition band
use std::f64::consts::PI;

/// Lower transition bandwidth: `min(max(0.25 · l_freq, 2.0), l_freq)`.
pub fn lower_trans_bandwidth(l_freq: f32) -> f32 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Upper transition bandwidth: `min(max(0.25 · h_freq, 2.0), nyq − h_freq)`.
pub fn upper_trans_bandwidth(h_freq: f32, sfreq: f32) -> f32 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of taps for a transition bandwidth, `ceil(3.3 / trans_bw · sfreq)`
/// rounded up to odd.
pub fn auto_filter_length(trans_bw: f32, sfreq: f32) -> usize {
    let n_raw = (3.3 / trans_bw * sfreq).ceil() as usize;
    if n_raw % 2 == 0 { n_raw + 1 } else { n_raw }
}

/// Design a zero-phase band-pass FIR for `[l_freq, h_freq]` Hz.
///
/// Returns `None` when the band is empty or does not fit below Nyquist.
pub fn design_bandpass(l_freq: f32, h_freq: f32, sfreq: f32) -> Option<Vec<f32>> {
    let nyq = sfreq / 2.0;
    if !(l_freq > 0.0 && l_freq < h_freq && h_freq < nyq) {
        return None;
    }
    let tb_l = lower_trans_bandwidth(l_freq);
    let tb_h = upper_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(tb_l.min(tb_h), sfreq);

    let low = firwin(n, l_freq - tb_l / 2.0, sfreq);
    let high = firwin(n, h_freq + tb_h / 2.0, sfreq);

    Some(high.iter().zip(low.iter()).map(|(&h, &l)| (h - l) as f32).collect())
}

/// Hamming-windowed sinc lowpass with unit DC gain, `cutoff_hz` at −6 dB.
pub fn firwin(n: usize, cutoff_hz: f32, sfreq: f32) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz as f64 / (sfreq as f64 / 2.0);

    let win = hamming(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Symmetric Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Periodic Hann window of length `n` (`scipy.signal.get_window('hann', n)`).
pub fn hann_periodic(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}
