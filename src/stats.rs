//! Robust statistics over spectrum samples.

use crate::constants::MAD_GAUSSIAN_SCALE;

/// Median of a non-empty sample.
pub(crate) fn median(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Median absolute deviation about `center`, scaled by 1/0.6745 so it is
/// comparable to a Gaussian standard deviation.
pub(crate) fn mad(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations) / MAD_GAUSSIAN_SCALE
}

/// Population variance of a non-empty sample.
pub(crate) fn variance(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// A weighted least-squares line through a set of points.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LinearFit {
    /// Slope per unit x.
    pub slope: f64,
    /// Value of the line at x = 0.
    pub intercept: f64,
    /// Weighted centroid of the x values.
    pub centroid: f64,
}

/// Fit a weighted straight line through `(x, y)` pairs.
///
/// Degenerate inputs (all x equal, zero total weight) yield a flat line
/// through the weighted mean rather than an error.
pub(crate) fn linear_fit(x: &[f64], y: &[f64], weights: &[f64]) -> LinearFit {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), weights.len());
    let wsum: f64 = weights.iter().sum();
    if wsum <= 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            centroid: 0.0,
        };
    }
    let xbar = x.iter().zip(weights).map(|(xi, wi)| xi * wi).sum::<f64>() / wsum;
    let ybar = y.iter().zip(weights).map(|(yi, wi)| yi * wi).sum::<f64>() / wsum;
    let mut num = 0.0;
    let mut den = 0.0;
    for ((xi, yi), wi) in x.iter().zip(y).zip(weights) {
        num += wi * (xi - xbar) * (yi - ybar);
        den += wi * (xi - xbar).powi(2);
    }
    let slope = if den > 0.0 { num / den } else { 0.0 };
    LinearFit {
        slope,
        intercept: ybar - slope * xbar,
        centroid: xbar,
    }
}
