//! Feature extractors.
//!
//! Every extractor maps a trial tensor `[N, C, T]` to a feature tensor
//! `[N, C', F]` and never mutates its input.  What an extractor needs is
//! part of its type:
//!
//! * [`TrialTransform`] — the trial tensor only (wavelet, PSD, statistics);
//! * [`SupervisedTransform`] — the trial tensor, its labels and a feature
//!   budget (FBCSP, which learns class-separating filters).
//!
//! [`FeatureExtractor`] tags which of the two contracts applies, so callers
//! dispatch on the contract rather than on the extractor's identity.
use ndarray::Array3;

use crate::error::Result;
use crate::labels::Labels;

pub mod fbcsp;
pub mod psd;
pub mod stats;
pub mod wavelet;

pub use fbcsp::{Fbcsp, FbcspConfig, FbcspModel};
pub use psd::{Welch, WelchConfig};
pub use stats::{Statistics, DEGENERATE_SENTINEL, N_DESCRIPTORS};
pub use wavelet::Wavelet;

/// Extractor that only looks at the trials.
pub trait TrialTransform {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `[N, C, T]` → `[N, C, F]`.
    fn transform(&self, data: &Array3<f32>) -> Result<Array3<f32>>;
}

/// Extractor that learns from labelled trials.
pub trait SupervisedTransform {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `[N, C, T]` + labels → `[N, 1, n_features]`.
    fn transform(&self, data: &Array3<f32>, labels: &Labels, n_features: usize) -> Result<Array3<f32>>;
}

/// A feature extractor together with the inputs it requires.
pub enum FeatureExtractor {
    /// Needs the trial tensor only.
    Trials(Box<dyn TrialTransform>),
    /// Needs trials, labels and a feature budget.
    Supervised(Box<dyn SupervisedTransform>),
}

impl FeatureExtractor {
    /// Haar approximation coefficients ([`Wavelet::approximation`]).
    pub fn wavelet() -> Self {
        Self::Trials(Box::new(Wavelet::approximation()))
    }

    /// Welch PSD with the default 256-sample segments.
    pub fn psd() -> Self {
        Self::Trials(Box::new(Welch::default()))
    }

    /// Per-channel descriptors plus the channel correlation row.
    pub fn statistics() -> Self {
        Self::Trials(Box::new(Statistics))
    }

    /// Filter-bank CSP with the default bank.
    pub fn fbcsp() -> Self {
        Self::Supervised(Box::new(Fbcsp::default()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trials(t) => t.name(),
            Self::Supervised(t) => t.name(),
        }
    }

    /// Extract features from `data` as the extractor's contract requires.
    ///
    /// `labels` and `n_features` are only read by supervised extractors.
    pub fn extract(&self, data: &Array3<f32>, labels: &Labels, n_features: usize) -> Result<Array3<f32>> {
        match self {
            Self::Trials(t) => t.transform(data),
            Self::Supervised(t) => t.transform(data, labels, n_features),
        }
    }
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Trials(_) => "Trials",
            Self::Supervised(_) => "Supervised",
        };
        write!(f, "FeatureExtractor::{kind}({})", self.name())
    }
}
