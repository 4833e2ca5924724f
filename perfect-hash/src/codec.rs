//! Persisted form of a [`Phf`].
//!
//! A [`Phf`] is fully described by four fields. [`RawParts`] exposes them as plain data, so that
//! a function built once can be stored and reloaded without rebuilding. With the `serde` feature,
//! both [`RawParts`] and [`Phf`] implement `Serialize` and `Deserialize`; deserializing a [`Phf`]
//! goes through [`RawParts`] and rejects invalid records.

use super::error::DecodeError;
use super::hash::Seed;
use super::phf::Phf;

/// The four fields that make up a [`Phf`].
#[allow(
    clippy::exhaustive_structs,
    reason = "the persisted format is fixed, adding a field would break stored functions"
)]
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawParts {
    /// Size of the codomain. Must be non-zero.
    pub codomain: usize,

    /// Seed of the bucket-selecting hash.
    pub primary: Seed,

    /// Seed of the slot-selecting hash.
    pub secondary: Seed,

    /// One `displacement * codomain + value` entry per bucket. Must be non-empty.
    pub table: Vec<u64>,
}

impl From<(usize, u64, u64, Vec<u64>)> for RawParts {
    #[inline]
    fn from((codomain, primary, secondary, table): (usize, u64, u64, Vec<u64>)) -> Self {
        Self {
            codomain,
            primary: Seed::new(primary),
            secondary: Seed::new(secondary),
            table,
        }
    }
}

impl From<RawParts> for (usize, u64, u64, Vec<u64>) {
    #[inline]
    fn from(parts: RawParts) -> Self {
        (
            parts.codomain,
            parts.primary.get(),
            parts.secondary.get(),
            parts.table,
        )
    }
}

impl Phf {
    /// Copy out the persisted state.
    #[inline]
    #[must_use]
    pub fn to_raw_parts(&self) -> RawParts {
        self.clone().into_raw_parts()
    }

    /// Convert into the persisted state.
    #[inline]
    #[must_use]
    pub fn into_raw_parts(self) -> RawParts {
        let (codomain, primary, secondary, table) = self.into_parts();
        RawParts {
            codomain,
            primary,
            secondary,
            table,
        }
    }

    /// Restore from persisted state.
    ///
    /// Table entries are not checked: any table evaluates within the codomain, although one that
    /// did not come from a build is unlikely to be perfect.
    ///
    /// # Errors
    ///
    /// Fails if the codomain is empty or larger than `isize::MAX`, or if there are no buckets.
    #[inline]
    pub fn from_raw_parts(parts: RawParts) -> Result<Self, DecodeError> {
        if parts.codomain == 0 {
            return Err(DecodeError::ZeroCodomain);
        }
        if parts.codomain > isize::MAX as usize {
            return Err(DecodeError::CodomainTooLarge(parts.codomain));
        }
        if parts.table.is_empty() {
            return Err(DecodeError::NoBuckets);
        }
        Ok(Self::new(
            parts.codomain,
            parts.primary,
            parts.secondary,
            parts.table,
        ))
    }
}

impl TryFrom<RawParts> for Phf {
    type Error = DecodeError;

    #[inline]
    fn try_from(parts: RawParts) -> Result<Self, DecodeError> {
        Self::from_raw_parts(parts)
    }
}

impl From<Phf> for RawParts {
    #[inline]
    fn from(phf: Phf) -> Self {
        phf.into_raw_parts()
    }
}
