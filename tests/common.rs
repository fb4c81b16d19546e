/// Shared synthetic-data builders for the integration tests.
use exg_xai::Labels;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

#[allow(unused)]
pub const SFREQ: f32 = 250.0;

#[allow(unused)]
/// Two-class motor-imagery stand-in, `[2 · n_per_class, n_ch, n_t]`.
///
/// Class 1 trials carry a 10 Hz rhythm on channel 0, class 2 trials on
/// channel 1; every sample gets uniform noise in ±0.1.  Trials alternate
/// 1, 2, 1, 2, … so class blocks are never contiguous.
pub fn two_class_trials(n_per_class: usize, n_ch: usize, n_t: usize, seed: u64) -> (Array3<f32>, Labels) {
    assert!(n_ch >= 2);
    let mut rng = StdRng::seed_from_u64(seed);
    let n = 2 * n_per_class;
    let classes: Vec<u8> = (0..n).map(|i| if i % 2 == 0 { 1 } else { 2 }).collect();
    let mut data = Array3::<f32>::zeros((n, n_ch, n_t));
    for ((tr, ch, t), v) in data.indexed_iter_mut() {
        let active = (classes[tr] == 1 && ch == 0) || (classes[tr] == 2 && ch == 1);
        let rhythm = if active { (2.0 * PI * 10.0 * t as f32 / SFREQ).sin() } else { 0.0 };
        *v = rhythm + rng.gen_range(-0.1..0.1);
    }
    (data, Labels::Classes(classes))
}

#[allow(unused)]
/// `[n, c, t]` tensor whose value encodes its own position: `i·10⁴ + j·10² + k`.
pub fn indexed(n: usize, c: usize, t: usize) -> Array3<f32> {
    Array3::from_shape_fn((n, c, t), |(i, j, k)| (i * 10_000 + j * 100 + k) as f32)
}

#[allow(unused)]
pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0f32, f32::max)
}
