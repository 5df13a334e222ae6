//! Pure operations over ordered channel-index sets.
//!
//! A channel set is a strictly increasing `Vec<usize>`; a [`ChannelGroup`]
//! is a maximal run of contiguous indices within one. All operations here
//! are pure: no I/O, no shared state, deterministic for identical inputs.

use ndarray::ArrayView1;

use crate::{
    config::TrimPolicy,
    constants::{AUTO_TRIM_FRACTION, FILL_REJECT_FRACTION, FILL_REJECT_MIN, ZERO_VARIANCE_FLOOR},
    stats::variance,
};

/// A maximal run of contiguous channel indices, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelGroup {
    /// First channel of the run.
    pub start: usize,
    /// Last channel of the run.
    pub end: usize,
}

impl ChannelGroup {
    /// Number of channels in the run. Always at least 1.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// The channel indices of the run, in order.
    pub fn channels(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

/// Split an ordered channel set into maximal contiguous groups.
pub fn split_contiguous(channels: &[usize]) -> Vec<ChannelGroup> {
    let mut groups = Vec::new();
    let mut iter = channels.iter().copied();
    let Some(first) = iter.next() else {
        return groups;
    };
    let mut start = first;
    let mut prev = first;
    for ch in iter {
        if ch != prev + 1 {
            groups.push(ChannelGroup { start, end: prev });
            start = ch;
        }
        prev = ch;
    }
    groups.push(ChannelGroup { start, end: prev });
    groups
}

/// Flatten groups back into an ordered channel set.
pub fn flatten_groups(groups: &[ChannelGroup]) -> Vec<usize> {
    groups.iter().flat_map(ChannelGroup::channels).collect()
}

/// Drop groups below a minimum width.
///
/// `narrow >= 1` is an absolute channel count; `0 < narrow < 1` is a
/// fraction of the spectrum length, rounded.
pub fn reject_narrow(
    groups: Vec<ChannelGroup>,
    narrow: f64,
    spectrum_len: usize,
) -> Vec<ChannelGroup> {
    let min_len = if narrow >= 1.0 {
        narrow.round() as usize
    } else {
        (narrow * spectrum_len as f64).round() as usize
    };
    groups.into_iter().filter(|g| g.len() >= min_len).collect()
}

/// Drop contiguous groups whose samples carry no information: near-zero
/// variance (constant or masked blocks), or more than [`FILL_REJECT_MIN`]
/// samples and 10% of the group equal to the upstream fill value.
pub fn reject_zero_variance(
    channels: &[usize],
    spectrum: ArrayView1<f64>,
    fill_value: f64,
) -> Vec<usize> {
    let kept: Vec<ChannelGroup> = split_contiguous(channels)
        .into_iter()
        .filter(|group| {
            let values: Vec<f64> = group.channels().map(|ch| spectrum[ch]).collect();
            let n_fill = values.iter().filter(|&&v| v == fill_value).count();
            let mostly_fill = n_fill > FILL_REJECT_MIN
                && n_fill as f64 > FILL_REJECT_FRACTION * values.len() as f64;
            variance(&values) > ZERO_VARIANCE_FLOOR && !mostly_fill
        })
        .collect();
    flatten_groups(&kept)
}

/// Trim channels from both edges of each group.
///
/// A group emptied by trimming is dropped, unless the whole selection would
/// vanish, in which case the central channel of the widest input group is
/// kept as its representative.
pub fn trim_edges(
    groups: Vec<ChannelGroup>,
    policy: TrimPolicy,
    max_trim: usize,
    max_trim_fraction: f64,
) -> Vec<ChannelGroup> {
    let mut trimmed: Vec<ChannelGroup> = Vec::with_capacity(groups.len());
    for group in &groups {
        let len = group.len();
        let trim = trim_count(len, policy, max_trim, max_trim_fraction);
        if 2 * trim < len {
            trimmed.push(ChannelGroup {
                start: group.start + trim,
                end: group.end - trim,
            });
        }
    }
    if trimmed.is_empty() {
        if let Some(widest) = groups.iter().max_by_key(|g| g.len()) {
            let mid = widest.start + widest.len() / 2;
            trimmed.push(ChannelGroup { start: mid, end: mid });
        }
    }
    trimmed
}

fn trim_count(len: usize, policy: TrimPolicy, max_trim: usize, max_trim_fraction: f64) -> usize {
    match policy {
        TrimPolicy::Channels(n) => n,
        TrimPolicy::Fraction(f) => (f * len as f64).ceil() as usize,
        TrimPolicy::Auto => {
            let mut trim = (AUTO_TRIM_FRACTION * len as f64).ceil() as usize;
            trim = trim.min(max_trim);
            if trim as f64 > max_trim_fraction * len as f64 {
                trim = (max_trim_fraction * len as f64).floor() as usize;
            }
            trim
        }
    }
}

/// With between three and seven groups, drop any non-edge group shorter
/// than both the first and the last group.
///
/// Spectra fragmenting into a few windows usually do so because real lines
/// sit between continuum stretches; an inner window much narrower than both
/// edge windows is more likely line wing than continuum.
pub fn reject_narrow_inner_windows(channels: &[usize]) -> Vec<usize> {
    let groups = split_contiguous(channels);
    if !(3..=7).contains(&groups.len()) {
        return channels.to_vec();
    }
    let (first_len, last_len) = match (groups.first(), groups.last()) {
        (Some(f), Some(l)) => (f.len(), l.len()),
        _ => return channels.to_vec(),
    };
    let kept: Vec<ChannelGroup> = groups
        .iter()
        .enumerate()
        .filter(|(i, g)| {
            *i == 0 || *i == groups.len() - 1 || g.len() >= first_len || g.len() >= last_len
        })
        .map(|(_, g)| *g)
        .collect();
    flatten_groups(&kept)
}

/// Remove candidate channels equal to the global spectrum minimum that run
/// contiguously inward from either spectrum edge.
///
/// Cubes clipped at the window edges leave constant-minimum blocks there;
/// those channels must not seed a continuum group.
pub fn trim_edge_minima(channels: &[usize], spectrum: ArrayView1<f64>) -> Vec<usize> {
    let n = spectrum.len();
    if n == 0 || channels.is_empty() {
        return channels.to_vec();
    }
    let global_min = spectrum.iter().copied().fold(f64::INFINITY, f64::min);
    let mut low = 0;
    while low < n && spectrum[low] == global_min {
        low += 1;
    }
    let mut high = n;
    while high > low && spectrum[high - 1] == global_min {
        high -= 1;
    }
    channels
        .iter()
        .copied()
        .filter(|&ch| ch >= low && ch < high)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_split_contiguous() {
        let channels = [0, 1, 2, 5, 6, 9];
        let groups = split_contiguous(&channels);
        assert_eq!(
            groups,
            vec![
                ChannelGroup { start: 0, end: 2 },
                ChannelGroup { start: 5, end: 6 },
                ChannelGroup { start: 9, end: 9 },
            ]
        );
        assert!(split_contiguous(&[]).is_empty());
    }

    #[test]
    fn test_flatten_round_trips() {
        let channels = vec![3, 4, 5, 8, 10, 11];
        assert_eq!(flatten_groups(&split_contiguous(&channels)), channels);
    }

    #[test]
    fn test_reject_narrow_absolute() {
        let groups = split_contiguous(&[0, 1, 2, 3, 10, 20, 21]);
        let kept = reject_narrow(groups, 2.0, 100);
        assert_eq!(flatten_groups(&kept), vec![0, 1, 2, 3, 20, 21]);
    }

    #[test]
    fn test_reject_narrow_fractional() {
        // 0.05 of 100 channels -> minimum width 5
        let groups = split_contiguous(&[0, 1, 2, 3, 10, 11, 12, 13, 14]);
        let kept = reject_narrow(groups, 0.05, 100);
        assert_eq!(flatten_groups(&kept), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_reject_zero_variance_constant_block() {
        let mut spectrum = Array1::from_elem(20, 1.0);
        for ch in 10..20 {
            spectrum[ch] = 1.0 + 0.01 * ch as f64;
        }
        let channels: Vec<usize> = (0..20).collect();
        // [0, 10) is constant and must be dropped; the contiguous set is a
        // single group, so split first by excluding channel 9
        let candidates: Vec<usize> = channels.iter().copied().filter(|&c| c != 9).collect();
        let kept = reject_zero_variance(&candidates, spectrum.view(), 0.0);
        assert_eq!(kept, (10..20).collect::<Vec<usize>>());
    }

    #[test]
    fn test_reject_zero_variance_fill_values() {
        let mut spectrum = Array1::from_iter((0..30).map(|i| 1.0 + 0.01 * i as f64));
        // poison 5 of 10 samples in the second group with the fill value
        for ch in [20, 22, 24, 26, 28] {
            spectrum[ch] = 0.0;
        }
        let candidates: Vec<usize> = (0..30).filter(|&c| c != 15).collect();
        let kept = reject_zero_variance(&candidates, spectrum.view(), 0.0);
        assert_eq!(kept, (0..15).collect::<Vec<usize>>());
    }

    #[test]
    fn test_trim_edges_auto() {
        // width 30 -> auto trim is ceil(3.0) = 3 from each edge
        let groups = vec![ChannelGroup { start: 0, end: 29 }];
        let trimmed = trim_edges(groups, TrimPolicy::Auto, 20, 1.0);
        assert_eq!(trimmed, vec![ChannelGroup { start: 3, end: 26 }]);
    }

    #[test]
    fn test_trim_edges_auto_caps_at_max_trim() {
        let groups = vec![ChannelGroup { start: 0, end: 999 }];
        let trimmed = trim_edges(groups, TrimPolicy::Auto, 20, 1.0);
        assert_eq!(trimmed, vec![ChannelGroup { start: 20, end: 979 }]);
    }

    #[test]
    fn test_trim_edges_sole_group_keeps_representative() {
        let groups = vec![ChannelGroup { start: 10, end: 13 }];
        let trimmed = trim_edges(groups, TrimPolicy::Channels(5), 20, 1.0);
        assert_eq!(trimmed, vec![ChannelGroup { start: 12, end: 12 }]);
    }

    #[test]
    fn test_trim_edges_drops_emptied_group_when_others_survive() {
        let groups = vec![
            ChannelGroup { start: 0, end: 2 },
            ChannelGroup { start: 10, end: 49 },
        ];
        let trimmed = trim_edges(groups, TrimPolicy::Channels(2), 20, 1.0);
        assert_eq!(trimmed, vec![ChannelGroup { start: 12, end: 47 }]);
    }

    #[test]
    fn test_reject_narrow_inner_windows() {
        // groups: [0..9] (10), [20..21] (2), [30..39] (10) -> inner dropped
        let mut channels: Vec<usize> = (0..10).collect();
        channels.extend([20, 21]);
        channels.extend(30..40);
        let kept = reject_narrow_inner_windows(&channels);
        let expected: Vec<usize> = (0..10).chain(30..40).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_reject_narrow_inner_windows_keeps_wide_inner() {
        // inner group as wide as the first edge group survives
        let mut channels: Vec<usize> = (0..5).collect();
        channels.extend(20..25);
        channels.extend(30..40);
        assert_eq!(reject_narrow_inner_windows(&channels), channels);
    }

    #[test]
    fn test_reject_narrow_inner_windows_idempotent() {
        let mut channels: Vec<usize> = (0..10).collect();
        channels.extend([15]);
        channels.extend([20, 21]);
        channels.extend(30..38);
        let once = reject_narrow_inner_windows(&channels);
        let twice = reject_narrow_inner_windows(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reject_narrow_inner_windows_two_groups_noop() {
        let channels: Vec<usize> = (0..10).chain(20..22).collect();
        assert_eq!(reject_narrow_inner_windows(&channels), channels);
    }

    #[test]
    fn test_trim_edge_minima() {
        let mut spectrum = Array1::from_elem(100, 1.0);
        for ch in 0..10 {
            spectrum[ch] = -5.0;
        }
        for ch in 95..100 {
            spectrum[ch] = -5.0;
        }
        spectrum[50] = 2.0;
        let channels: Vec<usize> = (0..100).collect();
        let kept = trim_edge_minima(&channels, spectrum.view());
        assert_eq!(kept, (10..95).collect::<Vec<usize>>());
    }

    #[test]
    fn test_trim_edge_minima_interior_minimum_untouched() {
        let mut spectrum = Array1::from_iter((0..50).map(|i| 1.0 + 0.001 * i as f64));
        spectrum[25] = -1.0;
        let channels: Vec<usize> = (0..50).collect();
        assert_eq!(trim_edge_minima(&channels, spectrum.view()), channels);
    }
}
