mod common;
use common::two_class_trials;
use exg_xai::features::{SupervisedTransform, TrialTransform, DEGENERATE_SENTINEL, N_DESCRIPTORS};
use exg_xai::{perturb, Fbcsp, FeatureExtractor, Labels, Perturbation, Statistics, Target, Wavelet, Welch, XaiError};
use ndarray::{s, Array3};

// ── Shapes through the dispatch enum ──────────────────────────────────────────

#[test]
fn output_shapes() {
    let (data, labels) = two_class_trials(5, 4, 1000, 10);
    let cases = [
        (FeatureExtractor::wavelet(), vec![10, 4, 500]),
        (FeatureExtractor::psd(), vec![10, 4, 129]),
        (FeatureExtractor::statistics(), vec![10, 4, 14]),
        (FeatureExtractor::fbcsp(), vec![10, 1, 396]),
    ];
    for (extractor, shape) in cases {
        let out = extractor.extract(&data, &labels, 396).unwrap();
        assert_eq!(out.shape(), shape.as_slice(), "{extractor:?}");
    }
}

#[test]
fn extractors_leave_input_alone() {
    let (data, labels) = two_class_trials(4, 3, 600, 11);
    let copy = data.clone();
    for extractor in [
        FeatureExtractor::wavelet(),
        FeatureExtractor::psd(),
        FeatureExtractor::statistics(),
        FeatureExtractor::fbcsp(),
    ] {
        extractor.extract(&data, &labels, 50).unwrap();
        assert_eq!(data, copy, "{}", extractor.name());
    }
}

#[test]
fn odd_length_wavelet() {
    let data = Array3::<f32>::ones((2, 2, 7));
    assert_eq!(Wavelet::approximation().transform(&data).unwrap().shape(), &[2, 2, 4]);
    assert_eq!(Wavelet::with_detail().transform(&data).unwrap().shape(), &[2, 2, 8]);
}

// ── PSD ───────────────────────────────────────────────────────────────────────

#[test]
fn psd_peak_on_the_active_channel() {
    let (data, _) = two_class_trials(2, 2, 1000, 12);
    let psd = Welch::default().transform(&data).unwrap();
    // trial 0 is class 1: 10 Hz on channel 0 → bin round(10 · 256 / 250) = 10
    let row = psd.slice(s![0, 0, ..]);
    let peak = row.iter().enumerate().fold((0, f32::MIN), |m, (k, &v)| if v > m.1 { (k, v) } else { m }).0;
    assert_eq!(peak, 10);
    assert!(psd[[0, 0, 10]] > 100.0 * psd[[0, 1, 10]]);
}

// ── Statistics ────────────────────────────────────────────────────────────────

#[test]
fn statistics_after_zero_ablation_are_finite() {
    let (data, _) = two_class_trials(3, 3, 400, 13);
    let mut rng = rand::thread_rng();
    let zeroed = perturb(&data, Perturbation::Zero, Target::Segment { start: 100, end: 200 }, &mut rng).unwrap();
    let out = Statistics.transform(&zeroed).unwrap();
    assert!(out.iter().all(|v| v.is_finite()));
    // log-energy entropy of a signal with exact zeros
    assert!(out.slice(s![.., .., 5]).iter().all(|&v| v == DEGENERATE_SENTINEL));

    let dead = perturb(&data, Perturbation::Zero, Target::Channel(2), &mut rng).unwrap();
    let out = Statistics.transform(&dead).unwrap();
    for tr in 0..6 {
        assert_eq!(out[[tr, 2, N_DESCRIPTORS + 2]], DEGENERATE_SENTINEL);
        assert_eq!(out[[tr, 0, N_DESCRIPTORS + 2]], DEGENERATE_SENTINEL);
        assert_eq!(out[[tr, 0, 9]], 0.0);
    }
}

// ── FBCSP ─────────────────────────────────────────────────────────────────────

#[test]
fn fbcsp_pads_to_budget() {
    let (data, labels) = two_class_trials(6, 3, 500, 14);
    let out = Fbcsp::default().transform(&data, &labels, 100).unwrap();
    assert_eq!(out.shape(), &[12, 1, 100]);
    // 9 bands × 3 filters
    assert!(out.slice(s![.., 0, 27..]).iter().all(|&v| v == 0.0));
    assert!(out.slice(s![.., 0, ..27]).iter().any(|&v| v != 0.0));
}

#[test]
fn fbcsp_respects_a_small_budget() {
    let (data, labels) = two_class_trials(6, 3, 500, 15);
    let out = Fbcsp::default().transform(&data, &labels, 5).unwrap();
    assert_eq!(out.shape(), &[12, 1, 5]);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn fbcsp_errors() {
    let (data, labels) = two_class_trials(3, 3, 400, 17);
    let fbcsp = Fbcsp::default();
    assert!(matches!(fbcsp.transform(&data, &labels, 0), Err(XaiError::InvalidConfiguration { .. })));
    assert!(matches!(
        fbcsp.transform(&data, &Labels::Classes(vec![1; 6]), 10),
        Err(XaiError::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        fbcsp.transform(&data, &Labels::Classes(vec![1, 2]), 10),
        Err(XaiError::ShapeMismatch { .. })
    ));
}
