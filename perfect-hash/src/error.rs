//! Errors.

use core::time::Duration;
use displaydoc::Display;
use thiserror::Error;

/// Rejected build input.
///
/// Detected before any hashing takes place.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidInput {
    /// {values} values supplied for {keys} keys
    LengthMismatch {
        /// Number of keys.
        keys: usize,
        /// Number of values.
        values: usize,
    },

    /// keys at positions {first} and {second} are equal
    DuplicateKey {
        /// Position of the first occurrence.
        first: usize,
        /// Position of the repeated occurrence.
        second: usize,
    },

    /// values at positions {first} and {second} are equal
    DuplicateValue {
        /// Position of the first occurrence.
        first: usize,
        /// Position of the repeated occurrence.
        second: usize,
    },

    /// value {value} at position {index} does not fit in a codomain
    ValueTooLarge {
        /// Position of the value.
        index: usize,
        /// The offending value.
        value: usize,
    },
}

/// bucket {bucket} found no displacement within {pilots} pilots
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub struct BucketFailure {
    /// Id of the bucket, in `[0, bucket_count)`.
    pub bucket: usize,

    /// Number of pilots tried before giving up.
    ///
    /// Zero when the bucket holds keys that no displacement can separate under the current
    /// secondary hash.
    pub pilots: u64,
}

/// Construction failures.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// invalid input: {0}
    InvalidInput(#[from] InvalidInput),

    /// ran out of seeds after {attempts} attempts, last failure: {last}
    Exhausted {
        /// Number of seed pairs tried.
        attempts: u32,
        /// Failure of the last attempt.
        last: BucketFailure,
    },

    /// time budget exceeded during attempt {attempts}
    TimedOut {
        /// Time spent before giving up.
        elapsed: Duration,
        /// Number of the attempt that was running or about to start.
        attempts: u32,
    },
}

impl BuildError {
    /// Whether the input itself was rejected, as opposed to the randomized search failing.
    ///
    /// Search failures can be retried with a different seed stream or a larger budget.
    #[inline]
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Deserialization validation failures.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// codomain size is zero
    ZeroCodomain,

    /// codomain size {0} is too large
    CodomainTooLarge(usize),

    /// table is empty
    NoBuckets,
}
