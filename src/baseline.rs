//! Robust baseline statistics for a 1-D spectrum.
//!
//! The baseline channels estimate the level and spread of the line-free
//! part of the spectrum. A sample drawn from the lowest values is biased
//! low, so empirically calibrated correction factors restore an estimate
//! of the true median and the effective spread; see
//! [`crate::constants`] for the calibration values.

use log::debug;
use ndarray::ArrayView1;

use crate::{
    config::{BaselineMode, SelectorConfig},
    constants::{
        DEGENERATE_MAD_FLOOR, EDGE_CORRECTION_EXPONENT, EDGE_CORRECTION_REF_CHANNELS,
        MEDIAN_CORRECTION_COEFF, MEDIAN_CORRECTION_REF_PCT, PERCENTILE_CORRECTION_COEFF,
        PERCENTILE_CORRECTION_EXPONENT, PERCENTILE_CORRECTION_REF_PCT,
    },
    stats::{mad, median},
};

/// Which side of the spectrum's value distribution supplied the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineSide {
    /// The lowest values (emission-dominated spectrum).
    Low,
    /// The highest values (absorption-dominated spectrum).
    High,
}

/// Robust statistics of the baseline channels, recomputed on every
/// selector call.
#[derive(Debug, Clone, Copy)]
pub struct BaselineStats {
    /// Median of the baseline sample.
    pub median: f64,
    /// Scaled median absolute deviation of the baseline sample.
    pub mad: f64,
    /// Spread bias correction for the baseline-definition policy.
    pub correction_factor: f64,
    /// Bias-corrected estimate of the spectrum's true median.
    pub true_median: f64,
    /// Squared fraction of samples consistent with pure noise; 1.0 for a
    /// noise-only spectrum, shrinking as line content grows.
    pub signal_ratio: f64,
    /// Reciprocal of `signal_ratio`; diagnostic for line contamination.
    pub line_strength_factor: f64,
    /// Which value-distribution side supplied the baseline.
    pub side: BaselineSide,
    /// Whether the degenerate-baseline retry was taken.
    pub degenerate_retry: bool,
}

/// Compute baseline statistics for `spectrum` under `config`.
///
/// The spectrum must be non-empty; `n_baseline_channels >= 2` is a caller
/// precondition enforced by the config builder.
pub fn baseline_stats(spectrum: ArrayView1<f64>, config: &SelectorConfig) -> BaselineStats {
    let n = spectrum.len();
    let samples: Vec<f64> = spectrum.iter().copied().collect();

    let (mut baseline, mut side) = pick_baseline(&samples, config);
    let mut med = median(&baseline);
    let mut spread = mad(&baseline, med);
    let mut degenerate_retry = false;

    if spread < DEGENERATE_MAD_FLOOR && n > 1 {
        // A constant block (typically a fully masked edge) has swallowed the
        // baseline sample. Retry once with samples matching the first/last
        // spectrum value removed.
        let first = samples[0];
        let last = samples[n - 1];
        let filtered: Vec<f64> = samples
            .iter()
            .copied()
            .filter(|&v| v != first && v != last)
            .collect();
        if !filtered.is_empty() {
            degenerate_retry = true;
            let (retried, retried_side) = pick_baseline(&filtered, config);
            baseline = retried;
            side = retried_side;
            med = median(&baseline);
            spread = mad(&baseline, med);
            debug!(
                "degenerate baseline spread, retried on {} of {} samples",
                filtered.len(),
                n
            );
        }
    }

    let pct = 100.0 * config.n_baseline_channels as f64 / n as f64;
    let correction_factor = correction_factor(config.baseline_mode, n, pct);
    let sigma_effective = config.sigma_multiplier * correction_factor;

    // Fraction of the full spectrum further than two effective sigma from
    // the observed baseline median.
    let cutoff = 2.0 * sigma_effective * spread;
    let beyond = samples.iter().filter(|&&v| (v - med).abs() > cutoff).count();
    let signal_ratio = (1.0 - beyond as f64 / n as f64).powi(2);
    let line_strength_factor = if signal_ratio > 0.0 {
        1.0 / signal_ratio
    } else {
        f64::INFINITY
    };

    let correction =
        median_correction_factor(config.baseline_mode, pct) * spread * signal_ratio;
    let true_median = match side {
        BaselineSide::Low => med + correction,
        BaselineSide::High => med - correction,
    };

    BaselineStats {
        median: med,
        mad: spread,
        correction_factor,
        true_median,
        signal_ratio,
        line_strength_factor,
        side,
        degenerate_retry,
    }
}

/// Select the baseline sample from `samples` (in spectral order).
fn pick_baseline(samples: &[f64], config: &SelectorConfig) -> (Vec<f64>, BaselineSide) {
    let n_base = config.n_baseline_channels.min(samples.len()).max(1);
    match config.baseline_mode {
        BaselineMode::Edge => {
            let half = (n_base / 2).min(samples.len() / 2).max(1);
            let lower = samples[..half].to_vec();
            let upper = samples[samples.len() - half..].to_vec();
            let lower_spread = mad(&lower, median(&lower));
            let upper_spread = mad(&upper, median(&upper));
            let chosen = if lower_spread < DEGENERATE_MAD_FLOOR
                && upper_spread >= DEGENERATE_MAD_FLOOR
            {
                upper
            } else if upper_spread < DEGENERATE_MAD_FLOOR
                && lower_spread >= DEGENERATE_MAD_FLOOR
            {
                lower
            } else {
                lower.into_iter().chain(upper).collect()
            };
            (chosen, BaselineSide::Low)
        }
        BaselineMode::Percentile => {
            let mut sorted = samples.to_vec();
            sorted.sort_by(f64::total_cmp);
            let lowest = sorted[..n_base].to_vec();
            let highest = sorted[sorted.len() - n_base..].to_vec();
            let low_spread = mad(&lowest, median(&lowest));
            let high_spread = mad(&highest, median(&highest));
            if low_spread > high_spread {
                // absorption-dominated profile: the quiet side is on top
                (highest, BaselineSide::High)
            } else {
                (lowest, BaselineSide::Low)
            }
        }
    }
}

/// Spread bias correction for the baseline-definition policy.
fn correction_factor(mode: BaselineMode, n_channels: usize, pct: f64) -> f64 {
    let edge_value =
        (n_channels as f64 / EDGE_CORRECTION_REF_CHANNELS).powf(EDGE_CORRECTION_EXPONENT);
    match mode {
        BaselineMode::Edge => edge_value,
        BaselineMode::Percentile => {
            edge_value
                * PERCENTILE_CORRECTION_COEFF
                * (pct / PERCENTILE_CORRECTION_REF_PCT).powf(PERCENTILE_CORRECTION_EXPONENT)
        }
    }
}

/// Median bias correction for the baseline-definition policy.
fn median_correction_factor(mode: BaselineMode, pct: f64) -> f64 {
    match mode {
        BaselineMode::Edge => 0.0,
        BaselineMode::Percentile => {
            MEDIAN_CORRECTION_COEFF * (MEDIAN_CORRECTION_REF_PCT / pct).sqrt()
        }
    }
}
