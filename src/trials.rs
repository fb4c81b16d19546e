//! Cue-locked trial extraction.
//!
//! Cuts fixed-length windows out of continuous `[C, T]` data.  A trial is
//! a start event (type 768, or 1023 for trials flagged with artefacts) that
//! is immediately followed by a cue event: 769 (left hand → class 1) or
//! 770 (right hand → class 2).  The window starts
//! [`TrialConfig::offset_samples`] after the start event and spans
//! [`TrialConfig::window_samples`] samples.
use ndarray::{s, Array2, Array3};
use tracing::debug;

use crate::config::TrialConfig;
use crate::error::{Result, XaiError};
use crate::labels::{Labels, LEFT_HAND, RIGHT_HAND};

/// Start of a clean trial.
pub const EVENT_TRIAL_START: u16 = 768;
/// Start of a trial rejected for artefacts.
pub const EVENT_REJECTED_TRIAL: u16 = 1023;
/// Left-hand cue.
pub const EVENT_CUE_LEFT: u16 = 769;
/// Right-hand cue.
pub const EVENT_CUE_RIGHT: u16 = 770;

/// One row of an event table: sample position and event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub position: usize,
    pub kind: u16,
}

/// Extract labelled trials from `data` ([C, T]).
///
/// Returns the trial tensor `[N, C, window_samples]` and class-index labels.
///
/// # Errors
///
/// [`XaiError::ShapeMismatch`] if a trial window runs past the end of the
/// recording.
pub fn extract_trials(
    data: &Array2<f32>,
    events: &[Event],
    cfg: &TrialConfig,
) -> Result<(Array3<f32>, Labels)> {
    let is_start = |kind: u16| {
        kind == EVENT_TRIAL_START || (cfg.consider_artefacts && kind == EVENT_REJECTED_TRIAL)
    };

    let mut starts = Vec::new();
    let mut classes = Vec::new();
    for pair in events.windows(2) {
        if !is_start(pair[0].kind) {
            continue;
        }
        let class = match pair[1].kind {
            EVENT_CUE_LEFT => LEFT_HAND,
            EVENT_CUE_RIGHT => RIGHT_HAND,
            _ => continue,
        };
        starts.push(pair[0].position);
        classes.push(class);
    }

    let (n_ch, n_t) = data.dim();
    let offset = cfg.offset_samples();
    let window = cfg.window_samples();

    let mut out = Array3::<f32>::zeros((starts.len(), n_ch, window));
    for (i, &pos) in starts.iter().enumerate() {
        let begin = pos + offset;
        let end = begin + window;
        if end > n_t {
            return Err(XaiError::ShapeMismatch {
                what: "trial window end vs recording length",
                expected: n_t,
                got: end,
            });
        }
        out.slice_mut(s![i, .., ..])
            .assign(&data.slice(s![.., begin..end]));
    }

    debug!(n_trials = starts.len(), window, "extracted trials");
    Ok((out, Labels::Classes(classes)))
}
