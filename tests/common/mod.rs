//! Shared synthetic spectra for the integration scenarios.

use lazy_static::lazy_static;
use ndarray::Array1;

/// Samples in the reference noise spectra.
pub const NOISE_LEN: usize = 1000;

/// Mean level of the reference noise spectra.
pub const NOISE_MEAN: f64 = 1.0;

/// Standard deviation of the reference noise spectra.
pub const NOISE_SIGMA: f64 = 0.1;

lazy_static! {
    /// A flat, constant-mean, constant-spread noise spectrum.
    pub static ref NOISE_SPECTRUM: Array1<f64> = gaussian_noise(NOISE_LEN, NOISE_MEAN, NOISE_SIGMA, 1);
}

/// Deterministic Gaussian-ish noise: sum of twelve LCG uniforms, clamped
/// to three sigma so scenario thresholds have guaranteed margins.
pub fn gaussian_noise(n: usize, mean: f64, sigma: f64, seed: u64) -> Array1<f64> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).max(1);
    let mut next = move || {
        // Numerical Recipes 64-bit LCG
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    Array1::from_iter((0..n).map(|_| {
        let z: f64 = (0..12).map(|_| next()).sum::<f64>() - 6.0;
        mean + sigma * z.clamp(-3.0, 3.0)
    }))
}

/// The noise spectrum with channels `[500, 520)` elevated by ten sigma.
pub fn planted_line_spectrum() -> Array1<f64> {
    let mut spectrum = NOISE_SPECTRUM.clone();
    for ch in 500..520 {
        spectrum[ch] += 10.0 * NOISE_SIGMA;
    }
    spectrum
}

/// The noise spectrum with the first and last 50 channels forced to a
/// constant floor below everything else (masked cube edges).
pub fn masked_edges_spectrum() -> Array1<f64> {
    let mut spectrum = NOISE_SPECTRUM.clone();
    let floor = NOISE_MEAN - 5.0 * NOISE_SIGMA;
    for ch in 0..50 {
        spectrum[ch] = floor;
    }
    for ch in 950..1000 {
        spectrum[ch] = floor;
    }
    spectrum
}

/// Channels carrying the bump hidden under [`sloped_ramp_spectrum`]'s ramp.
pub const RAMP_BUMP: std::ops::Range<usize> = 870..882;

/// A steep linear ramp with faint noise and a small bump at [`RAMP_BUMP`].
///
/// On the raw spectrum the ramp inflates the baseline spread enough that
/// everything classifies as continuum; after slope removal the bump stands
/// out and fragments the selection into one wide and one narrow group.
pub fn sloped_ramp_spectrum() -> Array1<f64> {
    let n = 1000;
    let rise = 1.0;
    let noise = gaussian_noise(n, 0.0, 0.002, 7);
    let mut spectrum =
        Array1::from_iter((0..n).map(|i| 10.0 + rise * i as f64 / n as f64 + noise[i]));
    for ch in RAMP_BUMP {
        spectrum[ch] += 0.04;
    }
    spectrum
}
