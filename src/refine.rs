//! Adaptive refinement of a continuum selection.
//!
//! A single selector pass can misjudge spectra with many line groups,
//! baseline contamination, or a residual spectral slope. The controller
//! runs the pipeline `InitialSelect -> MaybeRescale -> MaybeDeslope ->
//! Finalize`: it inspects the first pass, optionally rescales the sigma
//! multiplier and re-selects, optionally removes a fitted linear slope and
//! re-selects, and returns the final selection together with the spectrum
//! it was made on. Each decision is a separately testable function
//! returning a tagged value rather than a fall-through conditional.

use log::debug;
use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;

use crate::{
    config::{auto_sigma, AveragingMode, ResolutionMode, SelectorConfig, SpectralSetup},
    constants::{
        DESLOPE_SMALL_GROUP_FRACTION, HIGH_FREQUENCY_HZ, NARROW_BANDWIDTH_FRACTION,
        REFERENCE_BANDWIDTH_HZ, RESCALE_CEILING, RESCALE_FLOOR, RESCALE_LOW, RESCALE_MID,
        SINGLE_CHANNEL_PEAK_BOOST,
    },
    groups::split_contiguous,
    selector::{select_continuum, SelectionResult},
    stats::linear_fit,
};

/// Decision taken at the rescale stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RescaleDecision {
    /// Every above-threshold feature is a single-channel peak: raise sigma
    /// so isolated spikes stop fragmenting the selection.
    BoostForPeaks(f64),
    /// Group statistics point at line contamination: lower sigma.
    Lower(f64),
    /// The selection stands as-is.
    Keep,
}

/// Decisions taken by the controller, returned alongside the selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementDiagnostics {
    /// Channels above vs. below the true median over the full spectrum.
    pub channel_ratio: f64,
    /// Whether the single-channel-peak sigma boost was applied.
    pub peak_boost: bool,
    /// Sigma rescale factor applied by the group-statistics rule, if any.
    pub rescale_factor: Option<f64>,
    /// Fitted spectral slope removed from the spectrum, if kept.
    pub slope: Option<f64>,
    /// Whether the de-sloped selection was kept.
    pub desloped: bool,
    /// Whether a de-sloped selection was computed but discarded.
    pub deslope_discarded: bool,
}

/// Final product of the refinement pipeline.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    /// The final channel selection.
    pub selection: SelectionResult,
    /// The spectrum the final selection was made on. Differs from the
    /// input only when slope removal was kept.
    pub spectrum: Array1<f64>,
    /// The sigma multiplier in effect for the final selection.
    pub sigma_final: f64,
    /// Decisions taken along the way.
    pub diagnostics: RefinementDiagnostics,
}

/// A spectral window queued for batch refinement.
#[derive(Debug, Clone)]
pub struct SpectralWindow {
    /// Averaged spectrum of the window.
    pub spectrum: Array1<f64>,
    /// Window geometry.
    pub setup: SpectralSetup,
}

/// Run the full refinement pipeline on one spectrum.
pub fn refine_selection(
    spectrum: ArrayView1<f64>,
    config: &SelectorConfig,
    setup: &SpectralSetup,
) -> RefinementOutcome {
    let n = spectrum.len();
    let mode = setup.resolution_mode(n);
    let bandwidth_hz = setup.bandwidth_hz(n);

    let mut diagnostics = RefinementDiagnostics::default();
    let mut sigma = config.sigma_multiplier;
    let mut work = spectrum.to_owned();

    // InitialSelect
    let mut current = select_with_sigma(work.view(), config, sigma);

    // MaybeRescale
    let ratio = channel_ratio(work.view(), current.stats.true_median);
    diagnostics.channel_ratio = ratio;
    match rescale_decision(
        &current,
        work.view(),
        sigma,
        mode,
        bandwidth_hz,
        setup.first_freq_hz,
        ratio,
    ) {
        RescaleDecision::BoostForPeaks(factor) => {
            sigma *= factor;
            diagnostics.peak_boost = true;
            debug!("single-channel peaks dominate, boosting sigma to {sigma:.2}");
            current = select_with_sigma(work.view(), config, sigma);
        }
        RescaleDecision::Lower(factor) => {
            sigma *= factor;
            diagnostics.rescale_factor = Some(factor);
            debug!(
                "rescaling sigma by {factor:.3} to {sigma:.2} ({} groups, channel ratio {ratio:.2})",
                current.group_count
            );
            current = select_with_sigma(work.view(), config, sigma);
        }
        RescaleDecision::Keep => {}
    }

    // MaybeDeslope
    if deslope_trigger(&current, n, config.deslope_fraction) {
        let (detrended, slope) = remove_slope(work.view(), &current.channels, current.stats.mad);
        // a boost compensating for isolated spikes no longer applies to the
        // flattened spectrum
        let mut deslope_sigma = sigma;
        if diagnostics.peak_boost {
            deslope_sigma /= SINGLE_CHANNEL_PEAK_BOOST;
        }
        let candidate = select_with_sigma(detrended.view(), config, deslope_sigma);
        if discard_desloped(&current, &candidate) {
            diagnostics.deslope_discarded = true;
            debug!("slope removal fragmented the selection, keeping the original");
        } else {
            diagnostics.desloped = true;
            diagnostics.slope = Some(slope);
            debug!("removed spectral slope {slope:.3e} per channel");
            sigma = deslope_sigma;
            work = detrended;
            current = candidate;
        }
    }

    // Finalize
    RefinementOutcome {
        selection: current,
        spectrum: work,
        sigma_final: sigma,
        diagnostics,
    }
}

/// Refine a batch of independent spectral windows in parallel.
///
/// Windows share no mutable state; outcomes come back in input order.
pub fn refine_windows(
    windows: &[SpectralWindow],
    config: &SelectorConfig,
) -> Vec<RefinementOutcome> {
    windows
        .par_iter()
        .map(|w| refine_selection(w.spectrum.view(), config, &w.setup))
        .collect()
}

/// Channels above vs. below `true_median` over the full spectrum.
///
/// An all-emission spectrum has no channels below the median estimate; the
/// ratio is reported as infinite, which no rescale trigger matches.
pub fn channel_ratio(spectrum: ArrayView1<f64>, true_median: f64) -> f64 {
    let above = spectrum.iter().filter(|&&v| v > true_median).count();
    let below = spectrum.iter().filter(|&&v| v < true_median).count();
    if below == 0 {
        f64::INFINITY
    } else {
        above as f64 / below as f64
    }
}

/// Decide whether (and how) to rescale sigma after the first pass.
#[allow(clippy::too_many_arguments)]
pub fn rescale_decision(
    result: &SelectionResult,
    spectrum: ArrayView1<f64>,
    sigma: f64,
    mode: ResolutionMode,
    bandwidth_hz: f64,
    first_freq_hz: f64,
    channel_ratio: f64,
) -> RescaleDecision {
    let (peak_groups, all_single) = peak_structure(spectrum, result.positive_threshold);
    if all_single
        && peak_groups > 1
        && sigma < auto_sigma(ResolutionMode::Wide, AveragingMode::Mean)
    {
        return RescaleDecision::BoostForPeaks(SINGLE_CHANNEL_PEAK_BOOST);
    }

    let groups = result.group_count;
    let lower = groups > 3
        || (groups > 1 && channel_ratio < 1.0)
        || channel_ratio < 0.5
        || (groups == 2 && channel_ratio < 1.3);
    if lower {
        let factor = rescale_factor(groups, channel_ratio, mode, bandwidth_hz, first_freq_hz);
        if factor < 1.0 {
            return RescaleDecision::Lower(factor);
        }
    }
    RescaleDecision::Keep
}

/// Sigma reduction factor for the group-statistics rescale rule.
pub fn rescale_factor(
    groups: usize,
    channel_ratio: f64,
    mode: ResolutionMode,
    bandwidth_hz: f64,
    first_freq_hz: f64,
) -> f64 {
    if bandwidth_hz < NARROW_BANDWIDTH_FRACTION * REFERENCE_BANDWIDTH_HZ
        || first_freq_hz > HIGH_FREQUENCY_HZ
    {
        return RESCALE_FLOOR;
    }
    if groups <= 2 {
        return if channel_ratio < RESCALE_LOW {
            RESCALE_LOW
        } else if channel_ratio < 1.0 {
            RESCALE_MID
        } else {
            RESCALE_CEILING
        };
    }
    match mode {
        // wide-channel windows are trusted at their configured sigma
        ResolutionMode::Wide => 1.0,
        ResolutionMode::Fine => {
            let attenuation = bandwidth_hz / REFERENCE_BANDWIDTH_HZ;
            (3_f64.ln() / (groups as f64).ln())
                .powf(attenuation)
                .clamp(RESCALE_FLOOR, 1.0)
        }
    }
}

/// Whether the selection warrants a slope-removal pass.
pub fn deslope_trigger(result: &SelectionResult, n_channels: usize, deslope_fraction: f64) -> bool {
    if result.channels.is_empty() {
        return false;
    }
    if result.channels.len() as f64 > deslope_fraction * n_channels as f64 {
        return true;
    }
    let largest = split_contiguous(&result.channels)
        .iter()
        .map(|g| g.len())
        .max()
        .unwrap_or(0);
    largest as f64 > n_channels as f64 / 3.0 && result.group_count <= 2
}

/// Whether a de-sloped selection should be discarded in favour of the
/// original.
///
/// A de-sloped pass that fragments a previously single-group selection
/// into a few groups, one of them tiny, has manufactured line-like
/// features out of the fit residuals rather than revealed real lines.
pub fn discard_desloped(prior: &SelectionResult, desloped: &SelectionResult) -> bool {
    if desloped.channels.is_empty() {
        return true;
    }
    if desloped.group_count > 3 || prior.group_count != 1 {
        return false;
    }
    let lens: Vec<usize> = split_contiguous(&desloped.channels)
        .iter()
        .map(|g| g.len())
        .collect();
    let smallest = lens.iter().copied().min().unwrap_or(0);
    let largest = lens.iter().copied().max().unwrap_or(0);
    (smallest as f64) < DESLOPE_SMALL_GROUP_FRACTION * largest as f64
}

/// Group structure of the channels above the positive threshold: group
/// count and whether every group is a single channel.
fn peak_structure(spectrum: ArrayView1<f64>, positive_threshold: f64) -> (usize, bool) {
    let above: Vec<usize> = spectrum
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > positive_threshold)
        .map(|(i, _)| i)
        .collect();
    let groups = split_contiguous(&above);
    let all_single = !groups.is_empty() && groups.iter().all(|g| g.len() == 1);
    (groups.len(), all_single)
}

/// Fit a weighted line to the selected channels and subtract the slope
/// from the whole spectrum, preserving the level at the fit centroid.
fn remove_slope(
    spectrum: ArrayView1<f64>,
    channels: &[usize],
    spread: f64,
) -> (Array1<f64>, f64) {
    let x: Vec<f64> = channels.iter().map(|&c| c as f64).collect();
    let y: Vec<f64> = channels.iter().map(|&c| spectrum[c]).collect();
    let weight = if spread > 0.0 {
        1.0 / (spread * spread)
    } else {
        1.0
    };
    let w = vec![weight; x.len()];
    let fit = linear_fit(&x, &y, &w);
    let detrended = Array1::from_iter(
        spectrum
            .iter()
            .enumerate()
            .map(|(i, &v)| v - fit.slope * (i as f64 - fit.centroid)),
    );
    (detrended, fit.slope)
}

fn select_with_sigma(
    spectrum: ArrayView1<f64>,
    config: &SelectorConfig,
    sigma: f64,
) -> SelectionResult {
    let pass = SelectorConfig {
        sigma_multiplier: sigma,
        ..config.clone()
    };
    select_continuum(spectrum, &pass)
}
