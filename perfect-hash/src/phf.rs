//! Compiled perfect hash functions.

use super::builder::Builder;
use super::error::BuildError;
use super::hash::{displace, reduce, Seed};

/// A perfect hash function over byte strings.
///
/// Maps every key of the training set to a distinct index in `[0, codomain_size())`. Keys outside
/// the training set map to arbitrary, but deterministic, indices in the same range. There is no
/// membership check: pair the function with a key table if you need one.
///
/// The entire state consists of the codomain size, two seeds and a table of displacements and
/// values. See
/// [`RawParts`](crate::RawParts) for persisting it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "crate::RawParts", into = "crate::RawParts")
)]
pub struct Phf {
    /// Size of the codomain, `ng`. Never zero.
    codomain: usize,

    /// Seed of the bucket-selecting hash.
    primary: Seed,

    /// Seed of the slot-selecting hash.
    secondary: Seed,

    /// One entry per bucket and slot, `displacement * codomain + value`. Never empty.
    table: Vec<u64>,
}

impl Phf {
    /// Assemble from parts that are already known to be valid.
    pub(crate) fn new(
        codomain: usize,
        primary: Seed,
        secondary: Seed,
        table: Vec<u64>,
    ) -> Self {
        debug_assert!(codomain > 0, "empty codomain");
        debug_assert!(!table.is_empty(), "empty table");
        Self {
            codomain,
            primary,
            secondary,
            table,
        }
    }

    /// Split into fields.
    pub(crate) fn into_parts(self) -> (usize, Seed, Seed, Vec<u64>) {
        (self.codomain, self.primary, self.secondary, self.table)
    }

    /// Build a minimal perfect hash function mapping `keys[i]` to `i`, with the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// See [`Builder::build`].
    #[inline]
    pub fn build<K: AsRef<[u8]>>(keys: &[K]) -> Result<Self, BuildError> {
        Builder::new().build(keys)
    }

    /// Build a perfect hash function mapping `keys[i]` to `values[i]`, with the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// See [`Builder::build_with_values`].
    #[inline]
    pub fn build_with_values<K: AsRef<[u8]>>(
        keys: &[K],
        values: &[usize],
    ) -> Result<Self, BuildError> {
        Builder::new().build_with_values(keys, values)
    }

    /// Hash a key.
    ///
    /// The whole point. Guaranteed to return `i` for `keys[i]` of the training set, or the
    /// assigned value for builds with explicit values.
    ///
    /// The result is always less than [`codomain_size`](Self::codomain_size), even for keys
    /// outside the training set.
    #[inline]
    pub fn evaluate<K: ?Sized + AsRef<[u8]>>(&self, key: &K) -> usize {
        let key = key.as_ref();
        let codomain = self.codomain as u64;
        let slots = self.table.len();

        let bucket = reduce(self.primary.hash_bytes(key), slots);
        #[allow(clippy::arithmetic_side_effects, reason = "codomain is non-zero")]
        let displacement = self.table[bucket] / codomain;
        let slot = displace(self.secondary.hash_bytes(key), displacement, slots);

        #[allow(
            clippy::arithmetic_side_effects,
            clippy::cast_possible_truncation,
            reason = "codomain is non-zero, the remainder is below it"
        )]
        let value = (self.table[slot] % codomain) as usize;
        value
    }

    /// Get the boundary on indices.
    ///
    /// This is `ng` such that all keys map into `[0; ng)`.
    #[inline]
    #[must_use]
    pub const fn codomain_size(&self) -> usize {
        self.codomain
    }

    /// The number of buckets, which is also the number of slots keys are placed into.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.table.len()
    }

    /// Seed of the bucket-selecting hash.
    #[inline]
    #[must_use]
    pub const fn primary_seed(&self) -> Seed {
        self.primary
    }

    /// Seed of the slot-selecting hash.
    #[inline]
    #[must_use]
    pub const fn secondary_seed(&self) -> Seed {
        self.secondary
    }

    /// The table, one `displacement * codomain + value` entry per bucket.
    ///
    /// The displacement part belongs to the bucket with the entry's index, the value part to the
    /// slot with the entry's index.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &[u64] {
        &self.table
    }
}
