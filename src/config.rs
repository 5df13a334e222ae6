//! Configuration surface for continuum channel selection.

use derive_builder::Builder;

use crate::constants::{
    DESLOPE_FRACTION_DEFAULT, MAX_TRIM_DEFAULT, WIDE_CHANNEL_MAX_CHANNELS, WIDE_CHANNEL_WIDTH_HZ,
};

/// How the baseline (noise-estimation) channels are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineMode {
    /// Channels taken off both spectrum edges.
    Edge,
    /// The lowest-value channels anywhere in the spectrum.
    #[default]
    Percentile,
}

/// Minimum-width policy for contiguous channel groups.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NarrowPolicy {
    /// `ceil(log10(n_channels))`.
    #[default]
    Auto,
    /// Absolute minimum group width in channels.
    Channels(usize),
    /// Fraction of the spectrum length, rounded.
    Fraction(f64),
}

/// Edge-trimming policy for contiguous channel groups.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrimPolicy {
    /// 10% of the group width, capped by `max_trim` and `max_trim_fraction`.
    #[default]
    Auto,
    /// Absolute channel count trimmed from each group edge.
    Channels(usize),
    /// Fraction of the group width, rounded up.
    Fraction(f64),
}

/// Options for a continuum selection pass.
///
/// Build one with [`SelectorConfigBuilder`]; validation happens at build
/// time, so a constructed config is always usable and the selector itself
/// never re-validates.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SelectorConfig {
    /// Number of channels used to estimate the baseline level and spread.
    /// Must be at least 2.
    pub n_baseline_channels: usize,
    /// Number of robust-spread units above the baseline defining the
    /// classification threshold.
    #[builder(default = "3.5")]
    pub sigma_multiplier: f64,
    /// How baseline channels are chosen.
    #[builder(default)]
    pub baseline_mode: BaselineMode,
    /// Minimum width of a surviving channel group.
    #[builder(default)]
    pub narrow_threshold: NarrowPolicy,
    /// How many channels to trim from each group edge.
    #[builder(default)]
    pub trim_policy: TrimPolicy,
    /// Cap on channels trimmed from each group edge.
    #[builder(default = "MAX_TRIM_DEFAULT")]
    pub max_trim: usize,
    /// Cap on the trimmed fraction of a group.
    #[builder(default = "1.0")]
    pub max_trim_fraction: f64,
    /// Separator between ranges in the encoded selection string.
    #[builder(default = "String::from(\";\")")]
    pub range_separator: String,
    /// Value the extraction stage substituted for invalid samples.
    #[builder(default = "0.0")]
    pub fill_value: f64,
    /// Selected fraction of the spectrum above which the refinement
    /// controller attempts slope removal.
    #[builder(default = "DESLOPE_FRACTION_DEFAULT")]
    pub deslope_fraction: f64,
}

impl SelectorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(n) = self.n_baseline_channels {
            if n < 2 {
                return Err(format!("n_baseline_channels must be at least 2, got {n}"));
            }
        }
        if let Some(sigma) = self.sigma_multiplier {
            if !(sigma > 0.0) {
                return Err(format!("sigma_multiplier must be positive, got {sigma}"));
            }
        }
        if let Some(f) = self.max_trim_fraction {
            if !(f > 0.0 && f <= 1.0) {
                return Err(format!("max_trim_fraction must be in (0, 1], got {f}"));
            }
        }
        if let Some(NarrowPolicy::Fraction(f)) = self.narrow_threshold {
            if !(f > 0.0 && f < 1.0) {
                return Err(format!("narrow fraction must be in (0, 1), got {f}"));
            }
        }
        if let Some(TrimPolicy::Fraction(f)) = self.trim_policy {
            if !(f > 0.0 && f < 1.0) {
                return Err(format!("trim fraction must be in (0, 1), got {f}"));
            }
        }
        if let Some(f) = self.deslope_fraction {
            if !(f > 0.0 && f <= 1.0) {
                return Err(format!("deslope_fraction must be in (0, 1], got {f}"));
            }
        }
        if let Some(sep) = &self.range_separator {
            if sep.is_empty() {
                return Err("range_separator must not be empty".into());
            }
        }
        Ok(())
    }
}

/// Spectral-window geometry supplied by the extraction stage.
#[derive(Debug, Clone, Copy)]
pub struct SpectralSetup {
    /// Width of one channel \[Hz\].
    pub channel_width_hz: f64,
    /// Frequency of the first channel \[Hz\].
    pub first_freq_hz: f64,
    /// Frequency of the last channel \[Hz\].
    pub last_freq_hz: f64,
}

impl SpectralSetup {
    /// Total bandwidth covered by `n_channels` \[Hz\].
    pub fn bandwidth_hz(&self, n_channels: usize) -> f64 {
        self.channel_width_hz.abs() * n_channels as f64
    }

    /// Resolution mode of a window with `n_channels` channels.
    pub fn resolution_mode(&self, n_channels: usize) -> ResolutionMode {
        let width = self.channel_width_hz.abs();
        if width >= WIDE_CHANNEL_WIDTH_HZ
            || (width >= WIDE_CHANNEL_WIDTH_HZ / 2.0 && n_channels <= WIDE_CHANNEL_MAX_CHANNELS)
        {
            ResolutionMode::Wide
        } else {
            ResolutionMode::Fine
        }
    }
}

/// Coarse or fine channelization of a spectral window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Narrow channels; standard detection threshold.
    Fine,
    /// Wide channels; needs a higher detection threshold.
    Wide,
}

/// How the 1-D spectrum was averaged out of the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AveragingMode {
    /// Plain mean over the spatial region.
    #[default]
    Mean,
    /// Peak over MAD; noisier per channel, needs a higher threshold.
    PeakOverMad,
}

/// Default sigma multiplier for a resolution/averaging combination.
///
/// Callers resolving a `sigma_multiplier = auto` request should use this.
pub fn auto_sigma(mode: ResolutionMode, averaging: AveragingMode) -> f64 {
    match (mode, averaging) {
        (ResolutionMode::Fine, AveragingMode::Mean) => 3.5,
        (ResolutionMode::Wide, AveragingMode::Mean) => 4.5,
        (ResolutionMode::Fine, AveragingMode::PeakOverMad) => 6.0,
        (ResolutionMode::Wide, AveragingMode::PeakOverMad) => 6.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = SelectorConfigBuilder::default()
            .n_baseline_channels(32)
            .build()
            .unwrap();
        assert_eq!(config.baseline_mode, BaselineMode::Percentile);
        assert_eq!(config.max_trim, MAX_TRIM_DEFAULT);
        assert_eq!(config.range_separator, ";");
        assert!((config.sigma_multiplier - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_rejects_tiny_baseline() {
        let result = SelectorConfigBuilder::default()
            .n_baseline_channels(1)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_bad_fraction() {
        let result = SelectorConfigBuilder::default()
            .n_baseline_channels(32)
            .narrow_threshold(NarrowPolicy::Fraction(1.5))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_resolution_mode_wide_channels() {
        let setup = SpectralSetup {
            channel_width_hz: 15.625e6,
            first_freq_hz: 100.0e9,
            last_freq_hz: 102.0e9,
        };
        assert_eq!(setup.resolution_mode(128), ResolutionMode::Wide);

        let fine = SpectralSetup {
            channel_width_hz: 488.28125e3,
            ..setup
        };
        assert_eq!(fine.resolution_mode(3840), ResolutionMode::Fine);
        // half-width channels still count as wide when there are few of them
        let half = SpectralSetup {
            channel_width_hz: 7.8125e6,
            ..setup
        };
        assert_eq!(half.resolution_mode(256), ResolutionMode::Wide);
        assert_eq!(half.resolution_mode(512), ResolutionMode::Fine);
    }

    #[test]
    fn test_auto_sigma_defaults() {
        assert!((auto_sigma(ResolutionMode::Fine, AveragingMode::Mean) - 3.5).abs() < 1e-12);
        assert!((auto_sigma(ResolutionMode::Wide, AveragingMode::Mean) - 4.5).abs() < 1e-12);
        assert!((auto_sigma(ResolutionMode::Fine, AveragingMode::PeakOverMad) - 6.0).abs() < 1e-12);
        assert!((auto_sigma(ResolutionMode::Wide, AveragingMode::PeakOverMad) - 6.5).abs() < 1e-12);
    }
}
