// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Empirically tuned constants.
//!
//! These values were calibrated against archival pipeline runs; existing
//! continuum selections are only reproducible with these exact values.

/// Scale dividing a raw median absolute deviation so it is comparable to a
/// Gaussian standard deviation.
pub const MAD_GAUSSIAN_SCALE: f64 = 0.6745;

/// Spread below this is treated as a constant (fully masked) sample block.
pub const DEGENERATE_MAD_FLOOR: f64 = 1e-17;

/// Variance below this marks a channel group as carrying no information.
pub const ZERO_VARIANCE_FLOOR: f64 = 1e-17;

/// Extra width of the negative threshold relative to the positive one.
/// Suppresses false rejection of weak absorption features.
pub const NEGATIVE_THRESHOLD_FACTOR: f64 = 1.15;

/// Sigma boost applied when every above-threshold feature is a
/// single-channel peak.
pub const SINGLE_CHANNEL_PEAK_BOOST: f64 = 1.5;

/// Coefficient of the median bias correction in percentile baseline mode.
pub const MEDIAN_CORRECTION_COEFF: f64 = 6.3;

/// Reference percentile of the median bias correction.
pub const MEDIAN_CORRECTION_REF_PCT: f64 = 5.0;

/// Coefficient of the spread bias correction in percentile baseline mode.
pub const PERCENTILE_CORRECTION_COEFF: f64 = 2.8;

/// Exponent of the percentile spread bias correction.
pub const PERCENTILE_CORRECTION_EXPONENT: f64 = -0.25;

/// Reference percentile of the spread bias correction.
pub const PERCENTILE_CORRECTION_REF_PCT: f64 = 10.0;

/// Exponent of the channel-count term of the spread bias correction.
pub const EDGE_CORRECTION_EXPONENT: f64 = 0.08;

/// Reference channel count of the spread bias correction.
pub const EDGE_CORRECTION_REF_CHANNELS: f64 = 128.0;

/// Default cap on the number of channels trimmed from each group edge.
pub const MAX_TRIM_DEFAULT: usize = 20;

/// Fraction of a group trimmed from each edge under the auto trim policy.
pub const AUTO_TRIM_FRACTION: f64 = 0.1;

/// Fraction of fill-valued samples above which a group is rejected.
pub const FILL_REJECT_FRACTION: f64 = 0.1;

/// Count of fill-valued samples above which a group is rejected.
pub const FILL_REJECT_MIN: usize = 3;

/// Selected fraction of the spectrum above which slope removal is attempted.
pub const DESLOPE_FRACTION_DEFAULT: f64 = 0.8;

/// Smallest-to-largest group ratio below which a de-sloped selection is
/// discarded in favour of the original.
pub const DESLOPE_SMALL_GROUP_FRACTION: f64 = 0.2;

/// Floor of the sigma rescale factor.
pub const RESCALE_FLOOR: f64 = 0.333;

/// Rescale factor for few-group selections with a low channel ratio.
pub const RESCALE_LOW: f64 = 0.5;

/// Rescale factor for few-group selections with a middling channel ratio.
pub const RESCALE_MID: f64 = 0.7;

/// Ceiling of the rescale factor for few-group selections. Keeps sigma
/// strictly shrinking whenever a rescale fires.
pub const RESCALE_CEILING: f64 = 0.9;

/// Reference bandwidth of the rescale attenuation \[Hz\].
pub const REFERENCE_BANDWIDTH_HZ: f64 = 1.875e9;

/// Aggregate bandwidth below this fraction of the reference counts as
/// narrow for the strongest sigma reduction.
pub const NARROW_BANDWIDTH_FRACTION: f64 = 0.03125;

/// Windows starting above this frequency take the strongest sigma
/// reduction \[Hz\].
pub const HIGH_FREQUENCY_HZ: f64 = 600e9;

/// Channel width at or above which a window is in wide-channel mode \[Hz\].
pub const WIDE_CHANNEL_WIDTH_HZ: f64 = 15.625e6;

/// Channel count at or below which half-width channels still count as
/// wide-channel mode.
pub const WIDE_CHANNEL_MAX_CHANNELS: usize = 256;
