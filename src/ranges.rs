//! Conversions between channel-index sets and range-selection strings.
//!
//! Selections use inclusive, 0-based `"start~end"` tokens joined by a
//! separator (`";"` by default), e.g. `"5~20;30~40"`. This is the format
//! consumed by the imaging stage and must be preserved exactly.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{error::ContfindError, groups::split_contiguous};

lazy_static! {
    static ref RANGE_TOKEN: Regex = Regex::new(r"^(\d+)(?:~(\d+))?$").unwrap();
}

/// Encode an ordered channel set as a range-selection string.
///
/// Each contiguous run becomes one `start~end` token; a single channel
/// encodes as `ch~ch`. An empty set encodes as an empty string.
pub fn encode(channels: &[usize], separator: &str) -> String {
    split_contiguous(channels)
        .iter()
        .map(|g| format!("{}~{}", g.start, g.end))
        .join(separator)
}

/// Decode a range-selection string into an ordered channel set.
///
/// The inverse of [`encode`] for non-overlapping ranges. A bare index is
/// accepted as a one-channel range. Overlapping or touching ranges merge.
///
/// # Errors
///
/// [`ContfindError::BadRangeToken`] on malformed tokens and
/// [`ContfindError::ReversedRange`] when a token's bounds are reversed.
pub fn decode(selection: &str, separator: &str) -> Result<Vec<usize>, ContfindError> {
    let mut channels = Vec::new();
    if selection.is_empty() {
        return Ok(channels);
    }
    for token in selection.split(separator) {
        let (start, end) = parse_token(token)?;
        channels.extend(start..=end);
    }
    channels.sort_unstable();
    channels.dedup();
    Ok(channels)
}

/// Total number of channels named by a selection string.
///
/// # Errors
///
/// Same as [`decode`].
pub fn count_channels(selection: &str, separator: &str) -> Result<usize, ContfindError> {
    if selection.is_empty() {
        return Ok(0);
    }
    selection
        .split(separator)
        .map(|token| parse_token(token).map(|(start, end)| end - start + 1))
        .sum()
}

/// Width of the largest contiguous range in a selection string.
///
/// # Errors
///
/// Same as [`decode`].
pub fn channels_in_largest_group(selection: &str, separator: &str) -> Result<usize, ContfindError> {
    if selection.is_empty() {
        return Ok(0);
    }
    let mut largest = 0;
    for token in selection.split(separator) {
        let (start, end) = parse_token(token)?;
        largest = largest.max(end - start + 1);
    }
    Ok(largest)
}

/// Aggregate bandwidth covered by a selection \[Hz\].
///
/// # Errors
///
/// Same as [`decode`].
pub fn aggregate_bandwidth_hz(
    selection: &str,
    separator: &str,
    channel_width_hz: f64,
) -> Result<f64, ContfindError> {
    Ok(count_channels(selection, separator)? as f64 * channel_width_hz.abs())
}

fn parse_token(token: &str) -> Result<(usize, usize), ContfindError> {
    let bad = || ContfindError::BadRangeToken {
        token: token.to_string(),
    };
    let caps = RANGE_TOKEN.captures(token.trim()).ok_or_else(bad)?;
    let start: usize = caps[1].parse().map_err(|_| bad())?;
    let end: usize = match caps.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| bad())?,
        None => start,
    };
    if start > end {
        return Err(ContfindError::ReversedRange {
            token: token.to_string(),
            start,
            end,
        });
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(&[5, 6, 7, 30, 40, 41], ";"), "5~7;30~30;40~41");
        assert_eq!(encode(&[], ";"), "");
    }

    #[test]
    fn test_decode_inverse_of_encode() {
        let channels: Vec<usize> = (3..20).chain(45..60).chain([99]).collect();
        let encoded = encode(&channels, ";");
        assert_eq!(decode(&encoded, ";").unwrap(), channels);
    }

    #[test]
    fn test_decode_bare_index_and_custom_separator() {
        assert_eq!(decode("4,9~11", ",").unwrap(), vec![4, 9, 10, 11]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode("5~", ";"),
            Err(ContfindError::BadRangeToken { .. })
        ));
        assert!(matches!(
            decode("a~b", ";"),
            Err(ContfindError::BadRangeToken { .. })
        ));
        assert!(matches!(
            decode("9~4", ";"),
            Err(ContfindError::ReversedRange { start: 9, end: 4, .. })
        ));
    }

    #[test]
    fn test_count_channels() {
        assert_eq!(count_channels("5~20;30~40", ";").unwrap(), 27);
        assert_eq!(count_channels("", ";").unwrap(), 0);
        assert_eq!(count_channels("7~7", ";").unwrap(), 1);
    }

    #[test]
    fn test_channels_in_largest_group() {
        assert_eq!(channels_in_largest_group("5~20;30~40", ";").unwrap(), 16);
        assert_eq!(channels_in_largest_group("", ";").unwrap(), 0);
    }

    #[test]
    fn test_aggregate_bandwidth() {
        let bw = aggregate_bandwidth_hz("0~9", ";", -122e3).unwrap();
        assert!((bw - 1.22e6).abs() < 1e-6);
    }
}
