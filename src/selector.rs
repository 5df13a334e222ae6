//! The core continuum channel classifier.
//!
//! [`select_continuum`] is a pure function of a spectrum and a
//! [`SelectorConfig`]: it estimates baseline statistics, windows the
//! spectrum between two robust thresholds, and post-processes the
//! surviving contiguous groups. An empty selection is a legitimate
//! outcome, not an error.

use log::{debug, trace};
use ndarray::ArrayView1;

use crate::{
    baseline::{baseline_stats, BaselineStats},
    config::{NarrowPolicy, SelectorConfig},
    constants::NEGATIVE_THRESHOLD_FACTOR,
    groups::{
        flatten_groups, reject_narrow, reject_narrow_inner_windows, reject_zero_variance,
        split_contiguous, trim_edge_minima, trim_edges,
    },
    ranges,
};

/// Channel counts surviving each stage of the selection pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionDiagnostics {
    /// Sigma multiplier after the baseline bias correction.
    pub sigma_effective: f64,
    /// Channels inside the threshold window.
    pub candidates: usize,
    /// Candidates left after the edge-at-minimum trim.
    pub after_edge_minimum: usize,
    /// Candidates left after zero-variance rejection.
    pub after_zero_variance: usize,
    /// Candidates left after group-edge trimming.
    pub after_trim: usize,
    /// Candidates left after narrow-group rejection.
    pub after_narrow: usize,
}

/// Result of one continuum selection pass.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Selected continuum channel indices, strictly increasing.
    pub channels: Vec<usize>,
    /// The selection encoded as a range string, e.g. `"5~20;30~40"`.
    pub selection: String,
    /// Upper classification threshold.
    pub positive_threshold: f64,
    /// Lower classification threshold. Deliberately further from the median
    /// than the positive one so weak absorption features survive.
    pub negative_threshold: f64,
    /// Number of contiguous groups in `channels`; zero iff empty.
    pub group_count: usize,
    /// Baseline statistics the thresholds were derived from.
    pub stats: BaselineStats,
    /// Per-stage diagnostics.
    pub diagnostics: SelectionDiagnostics,
}

/// Classify every channel of `spectrum` as continuum or line.
///
/// The spectrum must be non-empty, with invalid samples already replaced
/// by `config.fill_value` upstream.
pub fn select_continuum(spectrum: ArrayView1<f64>, config: &SelectorConfig) -> SelectionResult {
    let n = spectrum.len();
    let stats = baseline_stats(spectrum, config);
    let sigma_effective = config.sigma_multiplier * stats.correction_factor;

    let positive_threshold = stats.true_median + sigma_effective * stats.mad;
    let negative_threshold =
        stats.true_median - NEGATIVE_THRESHOLD_FACTOR * sigma_effective * stats.mad;
    trace!(
        "thresholds [{negative_threshold:.6e}, {positive_threshold:.6e}], sigma_effective {sigma_effective:.3}"
    );

    let mut diagnostics = SelectionDiagnostics {
        sigma_effective,
        ..Default::default()
    };

    let candidates: Vec<usize> = spectrum
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > negative_threshold && v < positive_threshold)
        .map(|(i, _)| i)
        .collect();
    diagnostics.candidates = candidates.len();

    let channels = trim_edge_minima(&candidates, spectrum);
    diagnostics.after_edge_minimum = channels.len();
    if channels.is_empty() {
        return empty_result(positive_threshold, negative_threshold, stats, diagnostics);
    }

    let channels = reject_zero_variance(&channels, spectrum, config.fill_value);
    diagnostics.after_zero_variance = channels.len();
    if channels.is_empty() {
        return empty_result(positive_threshold, negative_threshold, stats, diagnostics);
    }

    let trimmed = trim_edges(
        split_contiguous(&channels),
        config.trim_policy,
        config.max_trim,
        config.max_trim_fraction,
    );
    let mut channels = flatten_groups(&trimmed);
    diagnostics.after_trim = channels.len();
    if channels.is_empty() {
        return empty_result(positive_threshold, negative_threshold, stats, diagnostics);
    }

    if trimmed.len() > 1 {
        let narrow = resolve_narrow(config.narrow_threshold, n);
        let kept = reject_narrow(split_contiguous(&channels), narrow, n);
        channels = flatten_groups(&kept);
    }
    diagnostics.after_narrow = channels.len();
    if channels.is_empty() {
        return empty_result(positive_threshold, negative_threshold, stats, diagnostics);
    }

    let channels = reject_narrow_inner_windows(&channels);
    let group_count = split_contiguous(&channels).len();
    debug!(
        "selected {} of {} channels in {} groups",
        channels.len(),
        n,
        group_count
    );

    SelectionResult {
        selection: ranges::encode(&channels, &config.range_separator),
        positive_threshold,
        negative_threshold,
        group_count,
        stats,
        diagnostics,
        channels,
    }
}

fn resolve_narrow(policy: NarrowPolicy, n_channels: usize) -> f64 {
    match policy {
        NarrowPolicy::Auto => (n_channels as f64).log10().ceil(),
        NarrowPolicy::Channels(c) => c as f64,
        NarrowPolicy::Fraction(f) => f,
    }
}

fn empty_result(
    positive_threshold: f64,
    negative_threshold: f64,
    stats: BaselineStats,
    diagnostics: SelectionDiagnostics,
) -> SelectionResult {
    SelectionResult {
        channels: Vec::new(),
        selection: String::new(),
        positive_threshold,
        negative_threshold,
        group_count: 0,
        stats,
        diagnostics,
    }
}
