//! Seeded string hashes.
//!
//! Every hash in this crate comes from a single family of 64-bit hashes over byte strings,
//! indexed by a [`Seed`]. Two different seeds applied to the same key behave as if they were
//! independent functions, which is what lets a failed construction be retried with fresh seeds.
//!
//! The family is rapidhash keyed with the seed. Like the rest of the persisted state, its output
//! is portable: a [`Phf`](crate::Phf) built on one platform evaluates identically on another.

use core::hash::Hasher;
use rapidhash::{RapidHasher, RapidRng};

/// Start of the default seed stream. Hexadecimal digits of pi - 3.
const DEFAULT_STREAM: u64 = 0x243f_6a88_85a3_08d3;

/// Odd multiplier separating pilots. Fractional part of the golden ratio.
const PILOT_MULTIPLIER: u64 = 0x9e37_79b9_7f4a_7c15;

/// A seed selecting one instance of the string hash family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Seed(u64);

impl Seed {
    /// Wrap a raw seed value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw seed value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Hash a byte string.
    ///
    /// Depends only on the seed and on `data`.
    #[inline]
    #[must_use]
    pub fn hash_bytes(self, data: &[u8]) -> u64 {
        let mut state = RapidHasher::new(self.0);
        state.write(data);
        state.finish()
    }

    /// Iterate through pseudo-random seeds.
    ///
    /// This returns an infinite iterator of different instances of `Self`. The returned values are
    /// deterministic, so rebuilding from the same keys reproduces the same hasher.
    #[inline]
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::iter_from(DEFAULT_STREAM)
    }

    /// Iterate through pseudo-random seeds, starting the stream from `start`.
    #[inline]
    pub fn iter_from(start: u64) -> impl Iterator<Item = Self> {
        let mut rng = RapidRng::new(start);
        core::iter::repeat_with(move || Self(rng.next()))
    }
}

impl From<u64> for Seed {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Seed> for u64 {
    #[inline]
    fn from(seed: Seed) -> Self {
        seed.0
    }
}

/// Derive the hash of a key under pilot `pilot` from its secondary fingerprint.
///
/// Pilot `p` and pilot `q != p` give unrelated positions for the same fingerprint, so a bucket
/// can be reshuffled without rehashing its keys.
#[inline]
#[must_use]
pub(crate) const fn pilot_mix(fingerprint: u64, pilot: u64) -> u64 {
    // murmur3 finalizer
    let mut x = fingerprint ^ pilot.wrapping_mul(PILOT_MULTIPLIER);
    x ^= x >> 33i32;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33i32;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33i32;
    x
}

/// Map a 64-bit hash uniformly into `[0, range)`.
///
/// Returns 0 if `range` is 0.
#[inline]
#[must_use]
pub(crate) const fn reduce(hash: u64, range: usize) -> usize {
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "the product of two 64-bit numbers fits in 128 bits"
    )]
    let product = hash as u128 * range as u128;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "the high half of the product is below `range`"
    )]
    let high = (product >> 64i32) as usize;
    high
}

/// Compute the slot of a key from its secondary fingerprint and its bucket's displacement.
///
/// The displacement encodes `pilot * slots + offset`. The pilot picks the instance of the
/// secondary hash, the offset rotates the resulting position within `[0, slots)`.
///
/// `slots` must be non-zero and at most `isize::MAX`.
#[inline]
#[must_use]
#[allow(clippy::arithmetic_side_effects, reason = "slots is non-zero and below isize::MAX")]
pub(crate) const fn displace(fingerprint: u64, displacement: u64, slots: usize) -> usize {
    let pilot = displacement / slots as u64;
    #[allow(clippy::cast_possible_truncation, reason = "below slots")]
    let offset = (displacement % slots as u64) as usize;
    rotate(reduce(pilot_mix(fingerprint, pilot), slots), offset, slots)
}

/// Compute `(base + offset) mod slots` for `base, offset < slots`.
#[inline]
#[must_use]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "both terms are below slots <= isize::MAX"
)]
pub(crate) const fn rotate(base: usize, offset: usize, slots: usize) -> usize {
    let sum = base + offset;
    if sum >= slots {
        sum - slots
    } else {
        sum
    }
}
