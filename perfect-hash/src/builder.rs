//! Construction.
//!
//! The build loop draws `(primary, secondary)` seed pairs from a deterministic stream and runs the
//! displacement solver once per pair. A pair fails when some bucket exhausts its pilot budget;
//! the next pair reshuffles bucket membership entirely. Building the same keys with the same
//! configuration always tries the same pairs in the same order, so it yields the same [`Phf`] or
//! the same error.

use super::buckets::Buckets;
use super::error::{BucketFailure, BuildError, InvalidInput};
use super::hash::Seed;
use super::phf::Phf;
use super::solver::{Interrupt, Solver};
use core::time::Duration;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::time::Instant;

/// Smallest accepted load factor.
const MIN_LOAD_FACTOR: f64 = 0.01;

/// Upper bound on the table size. Keeps slot arithmetic and allocation sizes in range.
const MAX_SLOTS: usize = isize::MAX as usize / 2;

/// Construction parameters.
///
/// Setters clamp out-of-range values to the nearest valid one.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
    /// Keys per slot of the table.
    load_factor: f64,

    /// Per-bucket pilot budget.
    max_pilots: u64,

    /// Number of seed pairs to try.
    max_retries: u32,

    /// Grow the table by 1% after each failed attempt.
    grow_table: bool,

    /// Wall-clock limit for the whole build.
    time_budget: Option<Duration>,

    /// Start of the seed stream. `None` selects the default stream.
    seed: Option<u64>,
}

impl Default for BuildConfig {
    #[inline]
    fn default() -> Self {
        Self {
            load_factor: 1.0,
            max_pilots: 1 << 16i32,
            max_retries: 32,
            grow_table: false,
            time_budget: None,
            seed: None,
        }
    }
}

impl BuildConfig {
    /// Set the number of keys per slot of the table. Clamped to `[0.01, 1]`; `NaN` and
    /// non-positive values select 1.
    ///
    /// There is one bucket per slot. A lower load factor gives a larger table and a faster build;
    /// the codomain is unaffected.
    #[inline]
    #[must_use]
    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = if load_factor > 0.0 {
            load_factor.clamp(MIN_LOAD_FACTOR, 1.0)
        } else {
            1.0
        };
        self
    }

    /// Set the per-bucket pilot budget. Clamped to at least 1.
    #[inline]
    #[must_use]
    pub fn with_max_pilots(mut self, max_pilots: u64) -> Self {
        self.max_pilots = max_pilots.max(1);
        self
    }

    /// Set the number of seed pairs to try before giving up. Clamped to at least 1.
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Grow the table by 1% after each failed attempt, so that hard inputs eventually become
    /// tractable.
    #[inline]
    #[must_use]
    pub const fn with_table_growth(mut self, grow_table: bool) -> Self {
        self.grow_table = grow_table;
        self
    }

    /// Limit the wall-clock time of a build.
    #[inline]
    #[must_use]
    pub const fn with_time_budget(mut self, time_budget: Option<Duration>) -> Self {
        self.time_budget = time_budget;
        self
    }

    /// Start the seed stream at `seed` instead of the default.
    #[inline]
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Compute the initial table size for `n` keys.
    fn slots_for(&self, n: usize) -> usize {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "the float only rounds the padding, `n` is restored by `max`"
        )]
        let padded = (n as f64 / self.load_factor).ceil() as usize;
        padded.max(n).max(1).min(MAX_SLOTS)
    }
}

/// Builds [`Phf`]s with a given [`BuildConfig`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    /// Parameters shared by every build.
    config: BuildConfig,
}

impl Builder {
    /// Create a builder with the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a minimal perfect hash function mapping `keys[i]` to `i`.
    ///
    /// # Errors
    ///
    /// Fails with [`BuildError::InvalidInput`] if `keys` contains duplicates, and with
    /// [`BuildError::Exhausted`] or [`BuildError::TimedOut`] if the search gives up.
    ///
    /// # Panics
    ///
    /// Panics if `keys` contains more than `isize::MAX / 2` elements.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "very heavy, we'd rather not copy it to every crate"
    )]
    pub fn build<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Phf, BuildError> {
        // Asserting this is enough to guarantee that the table size never overflows
        assert!(keys.len() <= isize::MAX as usize / 2, "Too many keys");
        find_duplicate_key(keys)?;
        self.search(keys, None, keys.len().max(1))
    }

    /// Build a perfect hash function mapping `keys[i]` to `values[i]`.
    ///
    /// The codomain is `[0, max(values) + 1)`.
    ///
    /// # Errors
    ///
    /// Fails with [`BuildError::InvalidInput`] if the lengths differ, if `keys` or `values`
    /// contain duplicates, or if a value is `isize::MAX` or larger. Fails with
    /// [`BuildError::Exhausted`] or [`BuildError::TimedOut`] if the search gives up.
    ///
    /// Values close to `isize::MAX` leave little room for displacements in the table, which makes
    /// the search likely to fail.
    ///
    /// # Panics
    ///
    /// Panics if `keys` contains more than `isize::MAX / 2` elements.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "very heavy, we'd rather not copy it to every crate"
    )]
    pub fn build_with_values<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
        values: &[usize],
    ) -> Result<Phf, BuildError> {
        assert!(keys.len() <= isize::MAX as usize / 2, "Too many keys");
        if keys.len() != values.len() {
            return Err(InvalidInput::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            }
            .into());
        }
        find_duplicate_key(keys)?;
        find_duplicate_value(values)?;

        let codomain = match values.iter().enumerate().max_by_key(|&(_, &value)| value) {
            // Keeping the codomain within isize::MAX lets slot arithmetic never overflow
            Some((index, &value)) if value >= isize::MAX as usize => {
                return Err(InvalidInput::ValueTooLarge { index, value }.into());
            }
            #[allow(clippy::arithmetic_side_effects, reason = "checked above")]
            Some((_, &value)) => value + 1,
            None => 1,
        };
        self.search(keys, Some(values), codomain)
    }

    /// Run the retry loop.
    fn search<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
        values: Option<&[usize]>,
        codomain: usize,
    ) -> Result<Phf, BuildError> {
        let started = Instant::now();
        let deadline = self
            .config
            .time_budget
            .and_then(|budget| started.checked_add(budget));

        let mut seeds = match self.config.seed {
            Some(start) => Box::new(Seed::iter_from(start)) as Box<dyn Iterator<Item = Seed>>,
            None => Box::new(Seed::iter()),
        };
        let pairs = core::iter::from_fn(|| Some((seeds.next()?, seeds.next()?)));

        let mut slots = self.config.slots_for(keys.len());
        let mut last = BucketFailure {
            bucket: 0,
            pilots: 0,
        };
        for (attempt, (primary, secondary)) in (1..=self.config.max_retries).zip(pairs) {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                let elapsed = started.elapsed();
                error!("time budget exhausted before attempt {attempt} after {elapsed:?}");
                return Err(BuildError::TimedOut {
                    elapsed,
                    attempts: attempt,
                });
            }

            info!(
                "attempt {attempt}: {} keys, {slots} slots, codomain {codomain}, seeds {:#x}/{:#x}",
                keys.len(),
                primary.get(),
                secondary.get(),
            );

            let outcome = Buckets::new(keys, values, primary, secondary, slots)
                .map_err(Interrupt::from)
                .and_then(|buckets| {
                    debug!(
                        "largest bucket holds {} keys, {} of {} buckets are empty",
                        buckets.max_size(),
                        buckets.empty_count(),
                        buckets.bucket_count(),
                    );
                    Solver::new(slots, codomain, self.config.max_pilots, deadline).solve(&buckets)
                });

            match outcome {
                Ok(table) => {
                    info!(
                        "built perfect hash function after {attempt} attempts in {:?}",
                        started.elapsed(),
                    );
                    return Ok(Phf::new(codomain, primary, secondary, table));
                }
                Err(Interrupt::Bucket(failure)) => {
                    warn!("attempt {attempt} failed: {failure}");
                    last = failure;
                }
                Err(Interrupt::Deadline) => {
                    let elapsed = started.elapsed();
                    error!("time budget exhausted during attempt {attempt} after {elapsed:?}");
                    return Err(BuildError::TimedOut {
                        elapsed,
                        attempts: attempt,
                    });
                }
            }

            if self.config.grow_table {
                slots = grow(slots);
            }
        }

        error!(
            "no perfect hash function found after {} attempts",
            self.config.max_retries,
        );
        Err(BuildError::Exhausted {
            attempts: self.config.max_retries,
            last,
        })
    }
}

/// Grow a table by 1%, rounded up, without exceeding the size limit.
fn grow(slots: usize) -> usize {
    slots.saturating_add(slots.div_ceil(100)).min(MAX_SLOTS)
}

/// Fail if two keys are equal.
fn find_duplicate_key<K: AsRef<[u8]>>(keys: &[K]) -> Result<(), InvalidInput> {
    let mut seen: HashMap<&[u8], usize> = HashMap::with_capacity(keys.len());
    for (second, key) in keys.iter().enumerate() {
        if let Some(&first) = seen.get(key.as_ref()) {
            return Err(InvalidInput::DuplicateKey { first, second });
        }
        seen.insert(key.as_ref(), second);
    }
    Ok(())
}

/// Fail if two values are equal.
fn find_duplicate_value(values: &[usize]) -> Result<(), InvalidInput> {
    let mut seen: HashMap<usize, usize> = HashMap::with_capacity(values.len());
    for (second, &value) in values.iter().enumerate() {
        if let Some(&first) = seen.get(&value) {
            return Err(InvalidInput::DuplicateValue { first, second });
        }
        seen.insert(value, second);
    }
    Ok(())
}
