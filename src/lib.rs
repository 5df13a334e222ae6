#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]

//! contfind decides which channels of a 1-D averaged spectrum contain only
//! continuum (line-free) emission, producing the channel selection used to
//! build continuum-only images from a spectral-line data cube.
//!
//! The engine estimates robust baseline statistics (median and scaled MAD
//! over edge or lowest-percentile channels), windows the spectrum between
//! two asymmetric thresholds, post-processes the surviving contiguous
//! groups (zero-variance rejection, edge trimming, narrow-group and
//! inner-window rejection), and optionally refines the result adaptively
//! (sigma rescaling, linear slope removal and re-selection).
//!
//! Spectrum extraction, plotting and persistence are the callers' jobs:
//! the engine operates purely on in-memory sequences and is deterministic
//! for identical inputs.
//!
//! # Examples
//!
//! ```rust
//! use contfind::{select_continuum, SelectorConfigBuilder};
//! use ndarray::Array1;
//!
//! // 200-channel spectrum: flat noise plus a spectral line in 90..110
//! let spectrum = Array1::from_iter((0..200usize).map(|i| {
//!     let noise = 0.02 * (((i * 3) % 17) as f64 - 8.0) / 8.0;
//!     if (90..110).contains(&i) {
//!         noise + 1.0
//!     } else {
//!         noise
//!     }
//! }));
//!
//! let config = SelectorConfigBuilder::default()
//!     .n_baseline_channels(40)
//!     .build()
//!     .unwrap();
//!
//! let result = select_continuum(spectrum.view(), &config);
//! assert!(result.channels.contains(&50));
//! assert!(!result.channels.contains(&100));
//! println!("continuum channels: {}", result.selection);
//! ```
//!
//! The selection string uses inclusive, 0-based `start~end` ranges joined
//! by `;` (e.g. `"10~80;119~190"`), the format consumed downstream.

pub mod baseline;
pub mod config;
pub mod constants;
pub mod error;
pub mod groups;
pub mod ranges;
pub mod refine;
pub mod selector;
mod stats;

pub use baseline::{baseline_stats, BaselineSide, BaselineStats};
pub use config::{
    auto_sigma, AveragingMode, BaselineMode, NarrowPolicy, ResolutionMode, SelectorConfig,
    SelectorConfigBuilder, SpectralSetup, TrimPolicy,
};
pub use error::ContfindError;
pub use groups::ChannelGroup;
pub use refine::{
    refine_selection, refine_windows, RefinementDiagnostics, RefinementOutcome, RescaleDecision,
    SpectralWindow,
};
pub use selector::{select_continuum, SelectionDiagnostics, SelectionResult};

pub use ndarray;
