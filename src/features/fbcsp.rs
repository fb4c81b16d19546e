//! Filter-Bank Common Spatial Patterns.
//!
//! Fitting ([`Fbcsp::fit`]):
//!   1. split the trials by class;
//!   2. for every band of the filter bank, band-pass each trial and average
//!      the trace-normalised spatial covariance per class (`C₁`, `C₂`);
//!   3. whiten the composite `C₁ + C₂` and diagonalise the whitened `C₁`;
//!      the eigenvectors with the largest and smallest eigenvalues give the
//!      `n_w` filter pairs that maximise one class's variance relative to the
//!      other's;
//!   4. the feature of a filter is `ln(var(wᵀX) / Σ var)` over the band's
//!      filters;
//!   5. rank all band × filter features by their mutual information with
//!      the class and keep the best `n_features`.
//!
//! As a [`SupervisedTransform`], the per-class feature matrices are stacked
//! along the trial axis, put back in the original trial order, zero-padded
//! to the feature budget and shaped `[N, 1, n_features]`.
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{s, Array2, Array3, ArrayView2};
use tracing::{debug, warn};

use crate::error::{Result, XaiError};
use crate::features::SupervisedTransform;
use crate::filter::{design_bandpass, FirFilter};
use crate::labels::{partition_by_class, ClassTrials, Labels, LEFT_HAND, RIGHT_HAND};

/// Eigenvalues below this are treated as zero when whitening.
const EIG_FLOOR: f64 = 1e-12;

/// FBCSP parameters.
#[derive(Debug, Clone)]
pub struct FbcspConfig {
    /// Sampling rate of the trials in Hz.
    ///
    /// Default: `250.0`.
    pub sfreq: f32,
    /// Filter-bank pass bands `(low, high)` in Hz.
    ///
    /// Default: nine 4 Hz bands from 4–8 Hz to 36–40 Hz.
    pub bands: Vec<(f32, f32)>,
    /// Spatial filter pairs kept per band (`2 · n_w` filters).
    ///
    /// Default: `2`.
    pub n_w: usize,
    /// Histogram bins of the mutual-information estimate.
    ///
    /// Default: `10`.
    pub mi_bins: usize,
}

impl Default for FbcspConfig {
    fn default() -> Self {
        Self {
            sfreq: 250.0,
            bands: (1..10).map(|k| (4.0 * k as f32, 4.0 * (k + 1) as f32)).collect(),
            n_w: 2,
            mi_bins: 10,
        }
    }
}

/// FBCSP extractor.
#[derive(Debug, Clone, Default)]
pub struct Fbcsp {
    pub cfg: FbcspConfig,
}

/// Spatial filters of one band.
struct BandCsp {
    taps: Vec<f32>,
    /// `[n_filters, C]`, one filter per row.
    filters: DMatrix<f64>,
}

/// Filters and feature selection learned by [`Fbcsp::fit`].
pub struct FbcspModel {
    bands: Vec<BandCsp>,
    n_channels: usize,
    /// Indices into the band-major feature vector, best first.
    selected: Vec<usize>,
}

impl Fbcsp {
    pub fn new(cfg: FbcspConfig) -> Self {
        Self { cfg }
    }

    /// Learn spatial filters from `data` and keep the `n_features` most
    /// informative features (fewer if the bank produces fewer).
    ///
    /// # Errors
    ///
    /// * [`XaiError::InvalidConfiguration`] if `n_features == 0`, `n_w == 0`,
    ///   a band cannot be designed at this rate, or one class has no trials.
    /// * [`XaiError::ShapeMismatch`] if labels and trials disagree.
    pub fn fit(&self, data: &Array3<f32>, labels: &Labels, n_features: usize) -> Result<FbcspModel> {
        if n_features == 0 {
            return Err(XaiError::config("FBCSP feature budget must be at least 1"));
        }
        if self.cfg.n_w == 0 {
            return Err(XaiError::config("FBCSP needs at least one filter pair per band"));
        }
        let parts = partition_by_class(data, labels)?;
        let (c1, c2) = match (parts.get(&LEFT_HAND), parts.get(&RIGHT_HAND)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(XaiError::config("FBCSP needs trials of both classes")),
        };

        let (_, n_ch, n_t) = data.dim();
        let mut bands = Vec::with_capacity(self.cfg.bands.len());
        for &(lo, hi) in &self.cfg.bands {
            let taps = design_bandpass(lo, hi, self.cfg.sfreq).ok_or_else(|| {
                XaiError::config(format!("band {lo}-{hi} Hz is not valid at {} Hz", self.cfg.sfreq))
            })?;
            let fir = FirFilter::new(&taps, n_t);
            let cov1 = mean_covariance(&fir.apply_trials(&c1.trials));
            let cov2 = mean_covariance(&fir.apply_trials(&c2.trials));
            let filters = csp_filters(&cov1, &cov2, self.cfg.n_w);
            bands.push(BandCsp { taps, filters });
        }

        let mut model = FbcspModel { bands, n_channels: n_ch, selected: vec![] };

        // Rank on the full feature set of both classes.
        let f1 = model.all_features(&c1.trials);
        let f2 = model.all_features(&c2.trials);
        let n_total = f1.ncols();
        let scores: Vec<f64> = (0..n_total)
            .map(|j| {
                let column: Vec<f64> = f1.column(j).iter().chain(f2.column(j).iter()).copied().collect();
                let classes: Vec<bool> =
                    std::iter::repeat(false).take(f1.nrows()).chain(std::iter::repeat(true).take(f2.nrows())).collect();
                mutual_information(&column, &classes, self.cfg.mi_bins)
            })
            .collect();

        let mut order: Vec<usize> = (0..n_total).collect();
        order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));
        order.truncate(n_features.min(n_total));

        debug!(n_total, kept = order.len(), "FBCSP features ranked");
        model.selected = order;
        Ok(model)
    }
}

impl FbcspModel {
    /// Number of features produced by [`FbcspModel::transform`].
    pub fn n_selected(&self) -> usize {
        self.selected.len()
    }

    /// Selected features of every trial, `[N, n_selected]`.
    pub fn transform(&self, data: &Array3<f32>) -> Result<Array2<f32>> {
        let n_ch = data.shape()[1];
        if n_ch != self.n_channels {
            return Err(XaiError::ShapeMismatch { what: "FBCSP channel count", expected: self.n_channels, got: n_ch });
        }
        let all = self.all_features(data);
        let mut out = Array2::<f32>::zeros((data.shape()[0], self.selected.len()));
        for (dst, &src) in self.selected.iter().enumerate() {
            out.column_mut(dst).assign(&all.column(src).mapv(|v| v as f32));
        }
        Ok(out)
    }

    /// Log-variance-ratio features of every band and filter, band-major.
    fn all_features(&self, data: &Array3<f32>) -> Array2<f64> {
        let (n_trials, _, n_t) = data.dim();
        let per_band: usize = self.bands.iter().map(|b| b.filters.nrows()).sum();
        let mut out = Array2::<f64>::zeros((n_trials, per_band));

        let mut col = 0;
        for band in &self.bands {
            let filtered = FirFilter::new(&band.taps, n_t).apply_trials(data);
            let m = band.filters.nrows();
            for tr in 0..n_trials {
                let x = to_matrix(filtered.slice(s![tr, .., ..]));
                let z = &band.filters * x;
                let vars: Vec<f64> = z
                    .row_iter()
                    .map(|r| variance(&r.iter().copied().collect::<Vec<f64>>()))
                    .collect();
                let total: f64 = vars.iter().sum();
                for (k, v) in vars.iter().enumerate() {
                    out[[tr, col + k]] = if total > 0.0 && *v > 0.0 { (v / total).ln() } else { 0.0 };
                }
            }
            col += m;
        }
        out
    }
}

impl SupervisedTransform for Fbcsp {
    fn name(&self) -> &'static str {
        "fbcsp"
    }

    fn transform(&self, data: &Array3<f32>, labels: &Labels, n_features: usize) -> Result<Array3<f32>> {
        let model = self.fit(data, labels, n_features)?;
        let parts = partition_by_class(data, labels)?;

        // per-class matrices stacked along the trial axis
        let per_class: Vec<(&ClassTrials, Array2<f32>)> = parts
            .values()
            .map(|part| model.transform(&part.trials).map(|f| (part, f)))
            .collect::<Result<_>>()?;

        let width = model.n_selected();
        if width < n_features {
            warn!(width, n_features, "FBCSP produced fewer features than requested, zero-padding");
        }
        if width > n_features {
            return Err(XaiError::config(format!(
                "FBCSP selected {width} features for a budget of {n_features}"
            )));
        }

        let n_trials = data.shape()[0];
        let mut out = Array3::<f32>::zeros((n_trials, 1, n_features));
        for (part, feats) in &per_class {
            for (row, &trial) in part.indices.iter().enumerate() {
                out.slice_mut(s![trial, 0, ..width]).assign(&feats.row(row));
            }
        }
        Ok(out)
    }
}

fn to_matrix(x: ArrayView2<'_, f32>) -> DMatrix<f64> {
    let (r, c) = x.dim();
    DMatrix::from_fn(r, c, |i, j| x[[i, j]] as f64)
}

/// Average of the trace-normalised covariances `XXᵀ / tr(XXᵀ)`.
fn mean_covariance(trials: &Array3<f32>) -> DMatrix<f64> {
    let (n_trials, n_ch, _) = trials.dim();
    let mut acc = DMatrix::<f64>::zeros(n_ch, n_ch);
    for tr in 0..n_trials {
        let x = to_matrix(trials.slice(s![tr, .., ..]));
        let cov = &x * x.transpose();
        let trace = cov.trace();
        if trace > 0.0 {
            acc += cov / trace;
        }
    }
    if n_trials > 0 {
        acc /= n_trials as f64;
    }
    acc
}

/// CSP filters `[m, C]`: the `n_w` most and `n_w` least class-1-dominant
/// directions (all channels when `2·n_w ≥ C`).
fn csp_filters(cov1: &DMatrix<f64>, cov2: &DMatrix<f64>, n_w: usize) -> DMatrix<f64> {
    let n_ch = cov1.nrows();
    let composite = SymmetricEigen::new(cov1 + cov2);
    let inv_sqrt = composite
        .eigenvalues
        .map(|l| if l > EIG_FLOOR { 1.0 / l.sqrt() } else { 0.0 });
    let whitening = DMatrix::from_diagonal(&inv_sqrt) * composite.eigenvectors.transpose();

    let s1 = &whitening * cov1 * whitening.transpose();
    let eig = SymmetricEigen::new(s1);
    let mut order: Vec<usize> = (0..n_ch).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b].partial_cmp(&eig.eigenvalues[a]).unwrap_or(std::cmp::Ordering::Equal)
    });

    let picks: Vec<usize> = if 2 * n_w >= n_ch {
        order
    } else {
        order[..n_w].iter().chain(order[n_ch - n_w..].iter()).copied().collect()
    };

    let projection = eig.eigenvectors.transpose() * whitening;
    DMatrix::from_fn(picks.len(), n_ch, |i, j| projection[(picks[i], j)])
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Mutual information (nats) between a feature and a binary class,
/// the feature discretised into `bins` equal-width bins.
pub fn mutual_information(feature: &[f64], class: &[bool], bins: usize) -> f64 {
    let n = feature.len();
    if n == 0 || bins == 0 {
        return 0.0;
    }
    let lo = feature.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = feature.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (hi - lo) / bins as f64;

    let mut joint = vec![[0usize; 2]; bins];
    for (&v, &c) in feature.iter().zip(class) {
        let b = if width > 0.0 { (((v - lo) / width) as usize).min(bins - 1) } else { 0 };
        joint[b][c as usize] += 1;
    }
    let n_class = [class.iter().filter(|&&c| !c).count(), class.iter().filter(|&&c| c).count()];

    let nf = n as f64;
    let mut mi = 0.0;
    for cell in &joint {
        let n_bin = (cell[0] + cell[1]) as f64;
        for c in 0..2 {
            let n_bc = cell[c] as f64;
            if n_bc > 0.0 {
                mi += n_bc / nf * (n_bc * nf / (n_bin * n_class[c] as f64)).ln();
            }
        }
    }
    mi
}
