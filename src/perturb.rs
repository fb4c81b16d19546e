//! Perturbation strategies for ablation and permutation importance.
//!
//! Every strategy acts on one *target* (a segment `[start, end)` of the
//! sample axis, or a whole channel) across all trials:
//!
//! | strategy        | segment                              | channel                     |
//! |-----------------|--------------------------------------|-----------------------------|
//! | `Zero`          | samples set to 0                     | channel set to 0            |
//! | `Linear`        | straight line between the end points | —                           |
//! | `Permute`       | copied from another trial (per ch.)  | copied from another trial   |
//!
//! [`perturb`] always returns a fresh tensor and leaves its input untouched;
//! [`ablate`] does the same for the strategies that never draw.
//! The `*_inplace` helpers mutate a tensor the caller already owns.
use ndarray::{s, Array3, Axis};
use rand::Rng;

use crate::error::{Result, XaiError};

/// How the target is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perturbation {
    /// Replace with zeros.
    Zero,
    /// Replace with a linear ramp between the segment's first and last sample.
    Linear,
    /// Replace with the same target taken from a random other trial.
    Permute,
}

/// What is perturbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Samples `[start, end)` of every channel.
    Segment { start: usize, end: usize },
    /// Every sample of one channel.
    Channel(usize),
}

impl From<(usize, usize)> for Target {
    fn from((start, end): (usize, usize)) -> Self {
        Target::Segment { start, end }
    }
}

/// Return a perturbed deep copy of `data` (`[N, C, T]`).
///
/// `rng` is only drawn from by [`Perturbation::Permute`].
///
/// # Errors
///
/// * [`XaiError::ShapeMismatch`] if the target lies outside the tensor.
/// * [`XaiError::InvalidConfiguration`] for `Linear` on a channel target,
///   or `Permute` with fewer than two trials.
pub fn perturb<R: Rng + ?Sized>(
    data: &Array3<f32>,
    kind: Perturbation,
    target: Target,
    rng: &mut R,
) -> Result<Array3<f32>> {
    if kind != Perturbation::Permute {
        return ablate(data, kind, target);
    }
    check_target(data, target)?;
    let n_trials = data.shape()[0];
    if n_trials < 2 {
        return Err(XaiError::config(format!(
            "permutation needs at least two trials, got {n_trials}"
        )));
    }
    let mut out = data.clone();
    match target {
        Target::Segment { start, end } => permute_segment(data, &mut out, start, end, rng),
        Target::Channel(ch) => permute_channel(data, &mut out, ch, rng),
    }
    Ok(out)
}

/// Deterministic counterpart of [`perturb`] for `Zero` and `Linear`.
///
/// # Errors
///
/// As [`perturb`]; `Permute` is rejected since it needs a random source.
pub fn ablate(data: &Array3<f32>, kind: Perturbation, target: Target) -> Result<Array3<f32>> {
    check_target(data, target)?;
    let mut out = data.clone();
    match (kind, target) {
        (Perturbation::Zero, Target::Segment { start, end }) => zero_segment_inplace(&mut out, start, end),
        (Perturbation::Zero, Target::Channel(ch)) => zero_channel_inplace(&mut out, ch),
        (Perturbation::Linear, Target::Segment { start, end }) => interpolate_segment_inplace(&mut out, start, end),
        (Perturbation::Linear, Target::Channel(_)) => {
            return Err(XaiError::config("linear interpolation is only defined for segments"));
        }
        (Perturbation::Permute, _) => {
            return Err(XaiError::config("permutation needs a random source, use `perturb`"));
        }
    }
    Ok(out)
}

fn check_target(data: &Array3<f32>, target: Target) -> Result<()> {
    let (_, n_ch, n_t) = data.dim();
    match target {
        Target::Segment { start, end } => {
            if end > n_t {
                return Err(XaiError::ShapeMismatch { what: "segment end", expected: n_t, got: end });
            }
            if start >= end {
                return Err(XaiError::ShapeMismatch { what: "segment start (< end)", expected: end, got: start });
            }
        }
        Target::Channel(ch) => {
            if ch >= n_ch {
                return Err(XaiError::ShapeMismatch { what: "channel index", expected: n_ch, got: ch });
            }
        }
    }
    Ok(())
}

/// `data[:, :, start..end] = 0`
pub fn zero_segment_inplace(data: &mut Array3<f32>, start: usize, end: usize) {
    data.slice_mut(s![.., .., start..end]).fill(0.0);
}

/// `data[:, ch, :] = 0`
pub fn zero_channel_inplace(data: &mut Array3<f32>, ch: usize) {
    data.index_axis_mut(Axis(1), ch).fill(0.0);
}

/// Replace `[start, end)` of every trial/channel with evenly spaced values
/// from `x[start]` to `x[end - 1]` (both kept exactly).
pub fn interpolate_segment_inplace(data: &mut Array3<f32>, start: usize, end: usize) {
    let len = end - start;
    let (n_trials, n_ch, _) = data.dim();
    for tr in 0..n_trials {
        for ch in 0..n_ch {
            let first = data[[tr, ch, start]];
            let last = data[[tr, ch, end - 1]];
            let mut seg = data.slice_mut(s![tr, ch, start..end]);
            if len == 1 {
                continue;
            }
            let step = (last - first) / (len - 1) as f32;
            for (k, v) in seg.iter_mut().enumerate() {
                *v = first + step * k as f32;
            }
            seg[len - 1] = last;
        }
    }
}

/// Index of a uniformly drawn trial other than `i`.
fn other_trial<R: Rng + ?Sized>(i: usize, n_trials: usize, rng: &mut R) -> usize {
    let p = rng.gen_range(0..n_trials - 1);
    if p >= i { p + 1 } else { p }
}

// Sources are always read from the unperturbed `src`, so a trial copied
// earlier in the loop is never copied again.
fn permute_segment<R: Rng + ?Sized>(
    src: &Array3<f32>,
    out: &mut Array3<f32>,
    start: usize,
    end: usize,
    rng: &mut R,
) {
    let (n_trials, n_ch, _) = src.dim();
    for i in 0..n_trials {
        for ch in 0..n_ch {
            let p = other_trial(i, n_trials, rng);
            out.slice_mut(s![i, ch, start..end])
                .assign(&src.slice(s![p, ch, start..end]));
        }
    }
}

fn permute_channel<R: Rng + ?Sized>(src: &Array3<f32>, out: &mut Array3<f32>, ch: usize, rng: &mut R) {
    let n_trials = src.shape()[0];
    for i in 0..n_trials {
        let p = other_trial(i, n_trials, rng);
        out.slice_mut(s![i, ch, ..]).assign(&src.slice(s![p, ch, ..]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp(n: usize, c: usize, t: usize) -> Array3<f32> {
        Array3::from_shape_fn((n, c, t), |(i, j, k)| (i * 100 + j * 10 + k) as f32 + 1.0)
    }

    #[test]
    fn zero_segment_touches_only_target() {
        let data = ramp(3, 2, 8);
        let mut rng = StdRng::seed_from_u64(0);
        let out = perturb(&data, Perturbation::Zero, (2, 5).into(), &mut rng).unwrap();
        for ((i, j, k), &v) in out.indexed_iter() {
            if (2..5).contains(&k) {
                assert_eq!(v, 0.0);
            } else {
                assert_eq!(v.to_bits(), data[[i, j, k]].to_bits());
            }
        }
    }

    #[test]
    fn zero_channel_touches_only_target() {
        let data = ramp(3, 4, 6);
        let mut rng = StdRng::seed_from_u64(0);
        let out = perturb(&data, Perturbation::Zero, Target::Channel(2), &mut rng).unwrap();
        for ((i, j, k), &v) in out.indexed_iter() {
            let expected = if j == 2 { 0.0 } else { data[[i, j, k]] };
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn linear_keeps_end_points_and_is_monotonic() {
        let mut data = ramp(2, 2, 10);
        // non-linear interior
        data[[0, 0, 4]] = -50.0;
        data[[1, 1, 5]] = 90.0;
        let mut rng = StdRng::seed_from_u64(0);
        let out = perturb(&data, Perturbation::Linear, (2, 8).into(), &mut rng).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(out[[i, j, 2]], data[[i, j, 2]]);
                assert_eq!(out[[i, j, 7]], data[[i, j, 7]]);
                for k in 2..7 {
                    assert!(out[[i, j, k + 1]] >= out[[i, j, k]]);
                }
                assert_eq!(out[[i, j, 8]], data[[i, j, 8]]);
            }
        }
    }

    #[test]
    fn linear_matches_linspace() {
        let mut data = Array3::<f32>::zeros((1, 1, 5));
        data[[0, 0, 0]] = 1.0;
        data[[0, 0, 4]] = 3.0;
        interpolate_segment_inplace(&mut data, 0, 5);
        let got: Vec<f32> = data.iter().copied().collect();
        assert_eq!(got, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn linear_on_channel_is_rejected() {
        let data = ramp(2, 2, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let err = perturb(&data, Perturbation::Linear, Target::Channel(0), &mut rng).unwrap_err();
        assert!(matches!(err, XaiError::InvalidConfiguration { .. }));
    }

    #[test]
    fn permuted_segment_comes_from_another_trial() {
        let data = ramp(5, 3, 12);
        let mut rng = StdRng::seed_from_u64(42);
        let out = perturb(&data, Perturbation::Permute, (4, 8).into(), &mut rng).unwrap();
        for i in 0..5 {
            for j in 0..3 {
                let got = out.slice(s![i, j, 4..8]);
                let donor = (0..5).find(|&p| data.slice(s![p, j, 4..8]) == got);
                assert!(matches!(donor, Some(p) if p != i), "trial {i} ch {j}");
                // outside the segment nothing changes
                assert_eq!(out.slice(s![i, j, ..4]), data.slice(s![i, j, ..4]));
                assert_eq!(out.slice(s![i, j, 8..]), data.slice(s![i, j, 8..]));
            }
        }
    }

    #[test]
    fn permuted_channel_comes_from_another_trial() {
        let data = ramp(4, 3, 6);
        let mut rng = StdRng::seed_from_u64(3);
        let out = perturb(&data, Perturbation::Permute, Target::Channel(1), &mut rng).unwrap();
        for i in 0..4 {
            let got = out.slice(s![i, 1, ..]);
            let donor = (0..4).find(|&p| data.slice(s![p, 1, ..]) == got);
            assert!(matches!(donor, Some(p) if p != i));
            assert_eq!(out.slice(s![i, 0, ..]), data.slice(s![i, 0, ..]));
        }
    }

    #[test]
    fn permutation_with_two_trials_swaps() {
        let data = ramp(2, 1, 4);
        let mut rng = StdRng::seed_from_u64(9);
        let out = perturb(&data, Perturbation::Permute, Target::Channel(0), &mut rng).unwrap();
        assert_eq!(out.slice(s![0, .., ..]), data.slice(s![1, .., ..]));
        assert_eq!(out.slice(s![1, .., ..]), data.slice(s![0, .., ..]));
    }

    #[test]
    fn permutation_needs_two_trials() {
        let data = ramp(1, 2, 4);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(perturb(&data, Perturbation::Permute, Target::Channel(0), &mut rng).is_err());
    }

    #[test]
    fn donor_draw_is_roughly_uniform() {
        let n = 4;
        let mut counts = [0usize; 4];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..6000 {
            counts[other_trial(0, n, &mut rng)] += 1;
        }
        assert_eq!(counts[0], 0);
        for &c in &counts[1..] {
            assert!((1700..2300).contains(&c), "counts = {counts:?}");
        }
    }

    #[test]
    fn out_of_range_targets() {
        let data = ramp(2, 2, 4);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            perturb(&data, Perturbation::Zero, Target::Channel(2), &mut rng),
            Err(XaiError::ShapeMismatch { .. })
        ));
        assert!(perturb(&data, Perturbation::Zero, (2, 5).into(), &mut rng).is_err());
        assert!(perturb(&data, Perturbation::Zero, (3, 3).into(), &mut rng).is_err());
    }

    #[test]
    fn ablate_matches_perturb_and_refuses_permute() {
        let data = ramp(3, 2, 10);
        let mut rng = StdRng::seed_from_u64(0);
        for (kind, target) in [
            (Perturbation::Zero, Target::Segment { start: 2, end: 6 }),
            (Perturbation::Zero, Target::Channel(1)),
            (Perturbation::Linear, Target::Segment { start: 0, end: 10 }),
        ] {
            assert_eq!(ablate(&data, kind, target).unwrap(), perturb(&data, kind, target, &mut rng).unwrap());
        }
        let err = ablate(&data, Perturbation::Permute, Target::Channel(0)).unwrap_err();
        assert!(matches!(err, XaiError::InvalidConfiguration { .. }));
    }

    #[test]
    fn input_is_never_mutated() {
        let data = ramp(3, 2, 8);
        let copy = data.clone();
        let mut rng = StdRng::seed_from_u64(1);
        for kind in [Perturbation::Zero, Perturbation::Linear, Perturbation::Permute] {
            let _ = perturb(&data, kind, (0, 4).into(), &mut rng).unwrap();
        }
        assert_eq!(data, copy);
    }
}
