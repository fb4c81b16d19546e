//! Ablation and permutation sensitivity analysis.
//!
//! ## One run
//!
//! ```text
//! for target in segments | channels:
//!     copy      = perturb(data, kind, target)          // fresh deep copy
//!     features  = extractor?(copy)                     // optional
//!     accuracy  = classifier.evaluate(features, labels)
//!     result[target] = accuracy
//! ```
//!
//! The source tensor and the labels are never modified, so one dataset can
//! be reused across every strategy, granularity and target.
//!
//! Supervised extractors (FBCSP) learn their filters from the *unperturbed*
//! dataset and labels: they are fitted once per call on `data`, not on the
//! perturbed copy, and that one feature tensor is shared by every target.
//!
//! ## Composites
//!
//! | call            | results, in order                                   |
//! |-----------------|-----------------------------------------------------|
//! | [`ablation`]    | segment zero, segment linear, channel zero          |
//! | [`permutation`] | segment permutation, channel permutation            |
use std::borrow::Cow;
use std::collections::BTreeMap;

use anyhow::Context;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::config::AnalysisConfig;
use crate::features::FeatureExtractor;
use crate::labels::{check_aligned, partition_by_class, Labels};
use crate::perturb::{ablate, perturb, Perturbation, Target};
use crate::segment::segment_indices;

/// What a run iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// The `n_segments` temporal segments of the sample axis.
    Segments,
    /// Every channel.
    Channels,
}

/// Accuracies of one run, indexed by target (segment or channel index).
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyResult {
    /// `"<strategy>_<granularity>"`, e.g. `"zero_segments"`.
    pub name: String,
    pub accuracies: Vec<f32>,
}

impl AccuracyResult {
    pub fn len(&self) -> usize {
        self.accuracies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accuracies.is_empty()
    }

    /// `baseline − accuracy` per target; positive means the target mattered.
    pub fn drops_from(&self, baseline: f32) -> Vec<f32> {
        self.accuracies.iter().map(|a| baseline - a).collect()
    }
}

/// Output of [`ablation`].
#[derive(Debug, Clone, PartialEq)]
pub struct AblationResult {
    pub zero: AccuracyResult,
    pub linear: AccuracyResult,
    pub channel_zero: AccuracyResult,
}

impl AblationResult {
    /// The three results in their fixed order.
    pub fn results(&self) -> [&AccuracyResult; 3] {
        [&self.zero, &self.linear, &self.channel_zero]
    }
}

/// Output of [`permutation`].
#[derive(Debug, Clone, PartialEq)]
pub struct PermutationResult {
    pub segment: AccuracyResult,
    pub channel: AccuracyResult,
}

impl PermutationResult {
    /// The two results in their fixed order.
    pub fn results(&self) -> [&AccuracyResult; 2] {
        [&self.segment, &self.channel]
    }
}

/// Baseline and ablation of the trials of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAblation {
    /// Accuracy on the class's unperturbed trials.
    pub baseline: f32,
    pub ablation: AblationResult,
}

fn strategy_name(kind: Perturbation) -> &'static str {
    match kind {
        Perturbation::Zero => "zero",
        Perturbation::Linear => "linear",
        Perturbation::Permute => "permutation",
    }
}

fn targets(data: &Array3<f32>, granularity: Granularity, n_segments: usize) -> crate::Result<Vec<Target>> {
    let (_, n_ch, n_t) = data.dim();
    Ok(match granularity {
        Granularity::Segments => segment_indices(n_t, n_segments)?.into_iter().map(Target::from).collect(),
        Granularity::Channels => (0..n_ch).map(Target::Channel).collect(),
    })
}

/// How a run turns a perturbed tensor into classifier input.
enum Route<'a> {
    /// The classifier sees the perturbed trials.
    Raw,
    /// Features are recomputed from every perturbed copy.
    PerTarget(&'a FeatureExtractor),
    /// Supervised features of the unperturbed data, shared by every target.
    Fixed(Array3<f32>),
}

impl<'a> Route<'a> {
    /// Supervised extractors are fitted here, once.
    fn prepare(
        data: &Array3<f32>,
        labels: &Labels,
        extractor: Option<&'a FeatureExtractor>,
        n_features: usize,
    ) -> crate::Result<Self> {
        Ok(match extractor {
            None => Route::Raw,
            Some(e @ FeatureExtractor::Trials(_)) => Route::PerTarget(e),
            Some(e @ FeatureExtractor::Supervised(_)) => Route::Fixed(e.extract(data, labels, n_features)?),
        })
    }

    fn features<'b>(
        &'b self,
        perturbed: &'b Array3<f32>,
        labels: &Labels,
        n_features: usize,
    ) -> crate::Result<Cow<'b, Array3<f32>>> {
        Ok(match self {
            Route::Raw => Cow::Borrowed(perturbed),
            Route::PerTarget(e) => Cow::Owned(e.extract(perturbed, labels, n_features)?),
            Route::Fixed(features) => Cow::Borrowed(features),
        })
    }
}

fn run_name(kind: Perturbation, granularity: Granularity) -> String {
    let granularity = match granularity {
        Granularity::Segments => "segments",
        Granularity::Channels => "channels",
    };
    format!("{}_{granularity}", strategy_name(kind))
}

/// Evaluate `classifier` once per target on `apply(target)`.
#[allow(clippy::too_many_arguments)]
fn run_targets<C, F>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    route: &Route<'_>,
    kind: Perturbation,
    granularity: Granularity,
    cfg: &AnalysisConfig,
    mut apply: F,
) -> anyhow::Result<AccuracyResult>
where
    C: Classifier + ?Sized,
    F: FnMut(Target) -> crate::Result<Array3<f32>>,
{
    let name = run_name(kind, granularity);
    let targets = targets(data, granularity, cfg.n_segments)?;
    let mut accuracies = vec![0.0_f32; targets.len()];
    for (i, &target) in targets.iter().enumerate() {
        let perturbed = apply(target)?;
        let features = route.features(&perturbed, labels, cfg.n_features)?;
        let eval = classifier
            .evaluate(&features, labels)
            .with_context(|| format!("{name}: evaluating target {i}"))?;
        debug!(run = %name, target = i, accuracy = eval.accuracy, "target evaluated");
        accuracies[i] = eval.accuracy;
    }

    Ok(AccuracyResult { name, accuracies })
}

/// Run one strategy over every target of one granularity.
///
/// # Errors
///
/// Configuration and shape errors from segmenting, perturbing or
/// extracting, and whatever the classifier reports.  An unsupported
/// combination (linear interpolation of a channel) is rejected before the
/// classifier is called.
#[allow(clippy::too_many_arguments)]
pub fn run<C, R>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    kind: Perturbation,
    granularity: Granularity,
    cfg: &AnalysisConfig,
    rng: &mut R,
) -> anyhow::Result<AccuracyResult>
where
    C: Classifier + ?Sized,
    R: Rng + ?Sized,
{
    check_aligned(data, labels)?;
    let route = Route::prepare(data, labels, extractor, cfg.n_features)?;
    run_targets(data, labels, classifier, &route, kind, granularity, cfg, |target| {
        perturb(data, kind, target, &mut *rng)
    })
}

/// Accuracy on the unperturbed dataset, with the same feature routing as
/// the sensitivity runs.
pub fn baseline_accuracy<C: Classifier + ?Sized>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    cfg: &AnalysisConfig,
) -> anyhow::Result<f32> {
    check_aligned(data, labels)?;
    let route = Route::prepare(data, labels, extractor, cfg.n_features)?;
    let features = route.features(data, labels, cfg.n_features)?;
    let eval = classifier.evaluate(&features, labels).context("evaluating baseline")?;
    debug!(accuracy = eval.accuracy, "baseline evaluated");
    Ok(eval.accuracy)
}

/// Segment zeroing, segment linear interpolation and channel zeroing.
pub fn ablation<C: Classifier + ?Sized>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    cfg: &AnalysisConfig,
) -> anyhow::Result<AblationResult> {
    check_aligned(data, labels)?;
    info!(
        trials = data.shape()[0],
        segments = cfg.n_segments,
        extractor = extractor.map_or("raw", FeatureExtractor::name),
        "applying ablation"
    );
    let route = Route::prepare(data, labels, extractor, cfg.n_features)?;
    let one = |kind, granularity| {
        run_targets(data, labels, classifier, &route, kind, granularity, cfg, |target| ablate(data, kind, target))
    };

    Ok(AblationResult {
        zero: one(Perturbation::Zero, Granularity::Segments)?,
        linear: one(Perturbation::Linear, Granularity::Segments)?,
        channel_zero: one(Perturbation::Zero, Granularity::Channels)?,
    })
}

/// Segment and channel permutation, seeded from `cfg.seed`.
pub fn permutation<C: Classifier + ?Sized>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    cfg: &AnalysisConfig,
) -> anyhow::Result<PermutationResult> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    permutation_with_rng(data, labels, classifier, extractor, cfg, &mut rng)
}

/// [`permutation`] with a caller-supplied random source.
pub fn permutation_with_rng<C, R>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    cfg: &AnalysisConfig,
    rng: &mut R,
) -> anyhow::Result<PermutationResult>
where
    C: Classifier + ?Sized,
    R: Rng + ?Sized,
{
    check_aligned(data, labels)?;
    info!(
        trials = data.shape()[0],
        segments = cfg.n_segments,
        extractor = extractor.map_or("raw", FeatureExtractor::name),
        "applying permutation"
    );
    let route = Route::prepare(data, labels, extractor, cfg.n_features)?;
    let mut one = |granularity| {
        run_targets(data, labels, classifier, &route, Perturbation::Permute, granularity, cfg, |target| {
            perturb(data, Perturbation::Permute, target, &mut *rng)
        })
    };
    let segment = one(Granularity::Segments)?;
    let channel = one(Granularity::Channels)?;
    Ok(PermutationResult { segment, channel })
}

/// [`ablation`] restricted to the trials of each class in turn.
///
/// Each class's sub-dataset is labelled with that class only and gets its
/// own baseline.  Supervised extractors need both classes to fit, so they
/// fail here with an invalid-configuration error.
pub fn ablation_by_class<C: Classifier + ?Sized>(
    data: &Array3<f32>,
    labels: &Labels,
    classifier: &C,
    extractor: Option<&FeatureExtractor>,
    cfg: &AnalysisConfig,
) -> anyhow::Result<BTreeMap<u8, ClassAblation>> {
    let mut out = BTreeMap::new();
    for (class, part) in partition_by_class(data, labels)? {
        let class_labels = labels.repeat_like(class, part.indices.len());
        let baseline = baseline_accuracy(&part.trials, &class_labels, classifier, extractor, cfg)
            .with_context(|| format!("class {class}"))?;
        info!(class, trials = part.indices.len(), baseline, "class baseline");
        let ablation = ablation(&part.trials, &class_labels, classifier, extractor, cfg)
            .with_context(|| format!("class {class}"))?;
        out.insert(class, ClassAblation { baseline, ablation });
    }
    Ok(out)
}
