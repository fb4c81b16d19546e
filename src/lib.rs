//! # exg-xai — feature extraction and explainability for motor-imagery EEG
//!
//! `exg-xai` turns trial-segmented EEG into alternative feature spaces and
//! measures which temporal segments and which channels a trained two-class
//! classifier relies on, by destroying them one at a time and watching the
//! accuracy.
//!
//! ## Pipeline overview
//!
//! ```text
//! [N, C, T] trials + labels (1 = left hand, 2 = right hand)
//!   │
//!   ├─ segment::segment_indices()   n_segments contiguous ranges of T
//!   ├─ perturb::perturb()           zero / linear / permute one target
//!   │                               on a fresh deep copy
//!   ├─ features (optional)          wavelet │ psd │ statistics │ fbcsp
//!   ├─ Classifier::evaluate()       external, read-only
//!   └─ sensitivity                  one accuracy per target
//!        │
//!        ├─→ ablation     (zero segments, linear segments, zero channels)
//!        └─→ permutation  (permuted segments, permuted channels)
//!              │
//!              └─ serialize::save()   one comma-separated line per result
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use exg_xai::{explain, AnalysisConfig, FeatureExtractor, NearestCentroid};
//! use exg_xai::io::TrialSet;
//! use std::path::Path;
//!
//! // 1. Trials [N, C, T] and class labels
//! let set = TrialSet::load(Path::new("data/A01T.safetensors")).unwrap();
//!
//! // 2. Any trained classifier; here a nearest-centroid on statistics
//! let extractor = FeatureExtractor::statistics();
//! let cfg = AnalysisConfig { seed: Some(1), ..AnalysisConfig::default() };
//! let feats = extractor.extract(&set.trials, &set.labels, cfg.n_features).unwrap();
//! let model = NearestCentroid::fit(&feats, &set.labels).unwrap();
//!
//! // 3. Baseline, ablation and permutation in one call
//! let report = explain(&set.trials, &set.labels, &model, Some(&extractor), &cfg).unwrap();
//! for r in report.ablation.results() {
//!     println!("{}: {:?}", r.name, r.drops_from(report.baseline));
//! }
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use exg_xai::perturb::{perturb, Perturbation, Target};
//! use exg_xai::segment::segment_indices;
//! use exg_xai::features::{Statistics, TrialTransform};
//! use ndarray::Array3;
//!
//! let data: Array3<f32> = Array3::zeros((10, 22, 1000));
//! let segments = segment_indices(1000, 8).unwrap();
//! let mut rng = rand::thread_rng();
//! let copy = perturb(&data, Perturbation::Zero, segments[3].into(), &mut rng).unwrap();
//! let feats = Statistics.transform(&copy).unwrap();    // [10, 22, 32]
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod filter;
pub mod io;
pub mod labels;
pub mod perturb;
pub mod segment;
pub mod sensitivity;
pub mod serialize;
pub mod trials;

use ndarray::Array3;
use tracing::info;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `exg_xai::Foo` without having to know the internal module layout.

// classifier seam
pub use classifier::{Classifier, Evaluation, NearestCentroid};

// config
pub use config::{AnalysisConfig, TrialConfig};

// errors
pub use error::{Result, XaiError};

// features
pub use features::{
    FeatureExtractor, SupervisedTransform, TrialTransform,
    Fbcsp, FbcspConfig, Statistics, Wavelet, Welch, WelchConfig,
};

// labels
pub use labels::{partition_by_class, ClassTrials, Labels, LEFT_HAND, RIGHT_HAND};

// perturbation + segments
pub use perturb::{ablate, perturb, Perturbation, Target};
pub use segment::segment_indices;

// sensitivity
pub use sensitivity::{
    ablation, ablation_by_class, baseline_accuracy, permutation,
    AblationResult, AccuracyResult, ClassAblation, Granularity, PermutationResult,
};

// serialization
pub use serialize::{save, save_results, write_rows, Row};

// trials
pub use trials::{extract_trials, Event};

/// Baseline, ablation and permutation of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    /// Accuracy on the unperturbed dataset.
    pub baseline: f32,
    pub ablation: AblationResult,
    pub permutation: PermutationResult,
}

/// Run the **full sensitivity analysis** on one dataset.
///
/// # Steps
///
/// 1. Evaluate the classifier on the unperturbed trials (routed through
///    `extractor` when given).
/// 2. [`ablation`]: zero each segment, interpolate each segment, zero each
///    channel.
/// 3. [`permutation`]: permute each segment, then each channel, seeded from
///    [`AnalysisConfig::seed`].
///
/// `data` and `labels` are read-only throughout.
///
/// # Errors
///
/// Returns an error if:
/// * `labels` does not have one entry per trial;
/// * [`AnalysisConfig::n_segments`] is 0 or larger than the sample count;
/// * the extractor or the classifier fails.
///
/// # Examples
///
/// ```
/// use exg_xai::{explain, AnalysisConfig, Classifier, Evaluation, Labels};
/// use ndarray::Array3;
///
/// struct Always;
/// impl Classifier for Always {
///     fn evaluate(&self, _: &Array3<f32>, _: &Labels) -> anyhow::Result<Evaluation> {
///         Ok(Evaluation { loss: 0.0, accuracy: 1.0 })
///     }
/// }
///
/// let data = Array3::<f32>::zeros((4, 2, 8));
/// let labels = Labels::Classes(vec![1, 1, 2, 2]);
/// let cfg = AnalysisConfig { n_segments: 2, seed: Some(0), ..AnalysisConfig::default() };
/// let report = explain(&data, &labels, &Always, None, &cfg).unwrap();
/// assert_eq!(report.ablation.zero.accuracies, vec![1.0, 1.0]);
/// assert_eq!(report.permutation.channel.len(), 2);
/// ```
pub fn explain<C: Classifier + ?Sized>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    cfg: &AnalysisConfig,
) -> anyhow::Result<Explanation> {
    let baseline = baseline_accuracy(data, labels, classifier, extractor, cfg)?;
    info!(baseline, "baseline accuracy");
    let ablation = ablation(data, labels, classifier, extractor, cfg)?;
    let permutation = permutation(data, labels, classifier, extractor, cfg)?;
    Ok(Explanation { baseline, ablation, permutation })
}
