//! Displacement search.
//!
//! There is one bucket per slot of the table. Buckets are handled largest first. For each bucket,
//! pilots `0, 1, 2, ...` are tried in turn; a pilot selects an instance of the secondary hash and
//! thereby a base position for every key of the bucket. An offset then rotates all base positions
//! at once. The first `(pilot, offset)` pair that moves every key onto a free slot is recorded as
//! the displacement `pilot * slots + offset`, which is the smallest acceptable displacement of the
//! bucket.
//!
//! Once every key has a slot, entry `j` of the table stores both the displacement of bucket `j`
//! and the value of the key occupying slot `j`, as `displacement * codomain + value`.

#![allow(clippy::arithmetic_side_effects, reason = "many false positives")]

use super::bitmap::BitMap;
use super::buckets::{Buckets, Entry};
use super::error::BucketFailure;
use super::hash::{displace, pilot_mix, reduce, rotate};
use std::time::Instant;

/// Why a solving attempt stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// A bucket ran out of pilots.
    Bucket(BucketFailure),

    /// The deadline passed.
    Deadline,
}

impl From<BucketFailure> for Interrupt {
    fn from(failure: BucketFailure) -> Self {
        Self::Bucket(failure)
    }
}

/// Displacement search parameters for one attempt.
pub(crate) struct Solver {
    /// Number of slots, which is also the number of buckets.
    slots: usize,

    /// Values are in `[0, codomain)`.
    codomain: usize,

    /// Per-bucket pilot budget.
    max_pilots: u64,

    /// Time after which the attempt is abandoned.
    deadline: Option<Instant>,
}

impl Solver {
    /// Create a solver.
    ///
    /// # Panics
    ///
    /// Panics if `slots` or `codomain` is zero.
    pub fn new(slots: usize, codomain: usize, max_pilots: u64, deadline: Option<Instant>) -> Self {
        assert!(slots > 0, "table must not be empty");
        assert!(codomain > 0, "codomain must not be empty");
        Self {
            slots,
            codomain,
            max_pilots,
            deadline,
        }
    }

    /// Place every key and produce the table.
    ///
    /// Key targets must be below the codomain size. Empty buckets get displacement 0, free slots
    /// get value 0.
    ///
    /// # Errors
    ///
    /// Returns the first bucket that exhausted its pilot budget, or [`Interrupt::Deadline`] if the
    /// deadline passed between two buckets.
    ///
    /// # Panics
    ///
    /// Panics if the number of buckets differs from the number of slots.
    pub fn solve(&self, buckets: &Buckets) -> Result<Vec<u64>, Interrupt> {
        assert_eq!(buckets.bucket_count(), self.slots, "one bucket per slot");

        let mut free = BitMap::new_ones(self.slots);

        // We'll fill these per-bucket and per-slot arrays during the course of the algorithm
        let mut displacements = vec![0; self.slots];
        let mut values = vec![0; self.slots];

        // Scratch space for base positions, reused between buckets
        let mut bases = Vec::with_capacity(buckets.max_size());
        let mut placed = 0;

        for (bucket, entries) in buckets.iter() {
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(Interrupt::Deadline);
            }

            let displacement = self
                .find_displacement(entries, &free, &mut bases)
                .map_err(|pilots| BucketFailure { bucket, pilots })?;
            displacements[bucket] = displacement;

            for entry in entries {
                let slot = displace(entry.fingerprint, displacement, self.slots);
                free.reset(slot);
                values[slot] = entry.target;
            }
            placed += entries.len();
        }

        debug_assert_eq!(free.count_ones(), self.slots - placed, "slot claimed twice");

        // `find_displacement` guarantees this doesn't overflow
        let codomain = self.codomain as u64;
        Ok(displacements
            .into_iter()
            .zip(values)
            .map(|(displacement, value)| displacement * codomain + value as u64)
            .collect())
    }

    /// Find the smallest displacement that moves a bucket onto free slots.
    ///
    /// `bases` is scratch space. On failure, returns the number of pilots tried: either the
    /// whole budget, or fewer if displacements stopped fitting into a table entry.
    fn find_displacement(
        &self,
        entries: &[Entry],
        free: &BitMap,
        bases: &mut Vec<usize>,
    ) -> Result<u64, u64> {
        for pilot in 0..self.max_pilots {
            bases.clear();
            bases.extend(
                entries
                    .iter()
                    .map(|entry| reduce(pilot_mix(entry.fingerprint, pilot), self.slots)),
            );

            // Rotation preserves distinctness, so colliding bases rule out the whole pilot
            if bases
                .iter()
                .enumerate()
                .any(|(i, base)| bases[..i].contains(base))
            {
                continue;
            }

            if let Some(offset) = self.first_free_offset(bases, free) {
                // Displacements only grow from here on, so if this one doesn't fit, none will
                return self.encode(pilot, offset).ok_or(pilot + 1);
            }
        }

        Err(self.max_pilots)
    }

    /// Compute `pilot * slots + offset`, provided that a table entry can still hold it next to
    /// any value.
    fn encode(&self, pilot: u64, offset: usize) -> Option<u64> {
        let displacement = pilot
            .checked_mul(self.slots as u64)?
            .checked_add(offset as u64)?;
        let codomain = self.codomain as u64;
        displacement
            .checked_mul(codomain)?
            .checked_add(codomain - 1)
            .map(|_| displacement)
    }

    /// Find the smallest offset that moves every base position onto a free slot.
    fn first_free_offset(&self, bases: &[usize], free: &BitMap) -> Option<usize> {
        let (&lead, rest) = bases.split_first()?;
        let mut offset = 0;
        while offset < self.slots {
            // Jump to the next offset at which the leading key lands on a free slot
            let position = rotate(lead, offset, self.slots);
            let next_free = free.next_one_cyclic(position)?;
            offset += (next_free + self.slots - position) % self.slots;
            if offset >= self.slots {
                return None;
            }

            if rest
                .iter()
                .all(|&base| free.get(rotate(base, offset, self.slots)))
            {
                return Some(offset);
            }
            offset += 1;
        }
        None
    }
}
