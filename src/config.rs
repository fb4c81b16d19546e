//! Analysis configuration.
//!
//! [`AnalysisConfig`] holds the parameters of a sensitivity run and
//! [`TrialConfig`] the parameters used to cut trials out of a continuous
//! recording.  Defaults match the motor-imagery experiments (250 Hz,
//! 4 s windows starting 2 s after the cue, 8 segments, 396 FBCSP features).

/// Configuration of an ablation / permutation run.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use exg_xai::AnalysisConfig;
///
/// let cfg = AnalysisConfig {
///     n_segments: 4,
///     seed: Some(7),        // reproducible permutations
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(cfg.n_features, 396);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Number of temporal segments the sample axis is split into.
    ///
    /// Segment boundaries come from [`crate::segment::segment_indices`]; the
    /// last segment absorbs the remainder of the integer division.
    ///
    /// Default: `8`.
    pub n_segments: usize,

    /// Feature budget handed to supervised extractors (FBCSP).
    ///
    /// The FBCSP output is zero-padded on the right up to this width.
    /// Ignored by extractors that only take the trial tensor.
    ///
    /// Default: `396`.
    pub n_features: usize,

    /// Seed for the trial draws of the permutation strategy.
    ///
    /// `None` seeds from OS entropy, so two runs differ.  Set it when the
    /// permutation accuracies must be reproducible.
    ///
    /// Default: `None`.
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_segments: 8,
            n_features: 396,
            seed: None,
        }
    }
}

/// Configuration for cutting trials out of a continuous recording
/// (see [`crate::trials::extract_trials`]).
#[derive(Debug, Clone)]
pub struct TrialConfig {
    /// Sampling rate of the recording in Hz.
    ///
    /// Default: `250.0`.
    pub sfreq: f32,

    /// Offset of the trial window after the trial-start event, in seconds.
    ///
    /// Default: `2.0`.
    pub start_second: f32,

    /// Length of the trial window in seconds.
    ///
    /// Default: `4.0` (1 000 samples at 250 Hz).
    pub signal_length: f32,

    /// Also accept trials whose start event is flagged as containing
    /// artefacts (event type 1023).
    ///
    /// Default: `true`.
    pub consider_artefacts: bool,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            sfreq: 250.0,
            start_second: 2.0,
            signal_length: 4.0,
            consider_artefacts: true,
        }
    }
}

impl TrialConfig {
    /// First sample of the window relative to the start event,
    /// `floor(start_second × sfreq)`.
    pub fn offset_samples(&self) -> usize {
        (self.start_second * self.sfreq) as usize
    }

    /// Number of samples per trial,
    /// `floor((start_second + signal_length) × sfreq) − floor(start_second × sfreq)`.
    ///
    /// ```
    /// use exg_xai::TrialConfig;
    /// assert_eq!(TrialConfig::default().window_samples(), 1000);
    /// ```
    pub fn window_samples(&self) -> usize {
        let end = ((self.start_second + self.signal_length) * self.sfreq) as usize;
        end - self.offset_samples()
    }
}
