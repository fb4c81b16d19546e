//! FIR band-pass design and application for the FBCSP filter bank.
//!
//! - [`design`]: Hamming-windowed sinc band-pass design with MNE-style
//!   automatic transition bands, plus the windows used elsewhere.
//! - [`apply`]: Overlap-add zero-phase convolution over trial tensors.

pub mod apply;
pub mod design;

pub use apply::FirFilter;
pub use design::{design_bandpass, firwin, hamming, hann_periodic};
