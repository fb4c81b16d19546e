mod common;
use common::{max_abs_diff, SFREQ};
use exg_xai::filter::{design_bandpass, FirFilter};
use std::f32::consts::PI;

fn tone(freq: f32, n: usize) -> Vec<f32> {
    (0..n).map(|i| (2.0 * PI * freq * i as f32 / SFREQ).sin()).collect()
}

fn rms(x: &[f32]) -> f32 {
    (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
}

// ── Filter bank ───────────────────────────────────────────────────────────────

#[test]
fn every_fbcsp_band_is_designable() {
    for k in 0..9 {
        let lo = 4.0 + 4.0 * k as f32;
        let h = design_bandpass(lo, lo + 4.0, SFREQ)
            .unwrap_or_else(|| panic!("band {lo}-{} Hz", lo + 4.0));
        assert!(h.len() % 2 == 1);
    }
}

#[test]
fn passband_tone_survives() {
    let h = design_bandpass(8.0, 12.0, SFREQ).unwrap();
    let x = tone(10.0, 1000);
    let y = FirFilter::new(&h, x.len()).apply(&x);
    // interior only; edges carry the padding transient
    let mid = 300..700;
    let err = max_abs_diff(&y[mid.clone()], &x[mid]);
    assert!(err < 0.05, "passband error {err:.3}");
}

#[test]
fn stopband_tone_removed() {
    let h = design_bandpass(8.0, 12.0, SFREQ).unwrap();
    let x = tone(30.0, 1000);
    let y = FirFilter::new(&h, x.len()).apply(&x);
    assert!(rms(&y[300..700]) < 0.01 * rms(&x[300..700]));
}

#[test]
fn zero_phase() {
    // a passband tone comes out without a lag
    let h = design_bandpass(8.0, 12.0, SFREQ).unwrap();
    let x = tone(10.0, 1000);
    let y = FirFilter::new(&h, x.len()).apply(&x);
    let lag0: f32 = (300..700).map(|i| x[i] * y[i]).sum();
    let lag3: f32 = (300..700).map(|i| x[i] * y[i + 3]).sum();
    assert!(lag0 > lag3);
}

#[test]
fn filter_is_reusable_across_signals() {
    let h = design_bandpass(12.0, 16.0, SFREQ).unwrap();
    let f = FirFilter::new(&h, 500);
    let a = tone(14.0, 500);
    let b: Vec<f32> = a.iter().map(|v| 2.0 * v).collect();
    let ya = f.apply(&a);
    let yb = f.apply(&b);
    let doubled: Vec<f32> = ya.iter().map(|v| 2.0 * v).collect();
    assert!(max_abs_diff(&yb, &doubled) < 1e-4);
}
