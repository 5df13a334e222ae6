//! Errors reported by contfind.

use thiserror::Error;

/// Errors arising while decoding channel-range selection strings.
#[derive(Error, Debug)]
pub enum ContfindError {
    /// A selection token did not match the `start~end` syntax.
    #[error("invalid channel range token {token:?}: expected \"start~end\"")]
    BadRangeToken {
        /// The offending token.
        token: String,
    },

    /// A selection token had its bounds reversed.
    #[error("reversed channel range {token:?}: start {start} > end {end}")]
    ReversedRange {
        /// The offending token.
        token: String,
        /// Parsed start channel.
        start: usize,
        /// Parsed end channel.
        end: usize,
    },
}
