//! Bucket assignment.
//!
//! Keys are split into buckets by the primary hash. Only the secondary fingerprint and the target
//! of each key survive this step; the solver never looks at the keys themselves.

#![allow(clippy::arithmetic_side_effects, reason = "many false positives")]

use super::error::BucketFailure;
use super::hash::{reduce, Seed};

/// A key, as seen by the displacement solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Entry {
    /// Secondary hash of the key.
    pub fingerprint: u64,

    /// Value the key maps to. Identity builds store the position of the key here.
    pub target: usize,
}

/// Keys, split into buckets.
pub(crate) struct Buckets {
    /// Entries, ordered such that all buckets are consecutive
    entries: Vec<Entry>,

    /// Buckets, grouped by size. The tuple is `(Bucket, start)`.
    by_size: Vec<Vec<(usize, usize)>>,

    /// The number of buckets, including empty ones.
    bucket_count: usize,
}

impl Buckets {
    /// Split keys into `bucket_count` buckets.
    ///
    /// `targets`, if present, must have the same length as `keys`.
    ///
    /// # Errors
    ///
    /// If two keys of one bucket share a secondary fingerprint, no displacement can separate them.
    /// This is reported as a failure of that bucket after zero pilots.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    pub fn new<K: AsRef<[u8]>>(
        keys: &[K],
        targets: Option<&[usize]>,
        primary: Seed,
        secondary: Seed,
        bucket_count: usize,
    ) -> Result<Self, BucketFailure> {
        assert!(bucket_count > 0, "at least one bucket is required");

        let mut keyed: Vec<(usize, Entry)> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let key = key.as_ref();
                let entry = Entry {
                    fingerprint: secondary.hash_bytes(key),
                    target: targets.map_or(i, |targets| targets[i]),
                };
                (reduce(primary.hash_bytes(key), bucket_count), entry)
            })
            .collect();

        // Sort entries by bucket. The sort is stable, so keys of a bucket keep their input order.
        // Narrower keys mean fewer radix passes.
        if bucket_count <= 1 << 16i32 {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "bucket < bucket_count <= 2^16"
            )]
            radsort::sort_by_key(&mut keyed, |(bucket, _)| *bucket as u16);
        } else if bucket_count as u64 <= 1 << 32i32 {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "bucket < bucket_count <= 2^32"
            )]
            radsort::sort_by_key(&mut keyed, |(bucket, _)| *bucket as u32);
        } else {
            radsort::sort_by_key(&mut keyed, |(bucket, _)| *bucket as u64);
        }

        // We'll store per-size bucket lists here
        let mut by_size: Vec<Vec<(usize, usize)>> = Vec::new();

        // A manual group_by, just two pointers
        let mut left = 0;
        while left < keyed.len() {
            let bucket = keyed[left].0;
            let mut right = left + 1;
            while right < keyed.len() && keyed[right].0 == bucket {
                right += 1;
            }

            // Ensure that fingerprints don't collide inside the bucket. The bucket size is
            // expected to be very small, so quadratic approach is faster than sorting.
            let run = &keyed[left..right];
            if run
                .iter()
                .enumerate()
                .any(|(i, (_, a))| run[..i].iter().any(|(_, b)| a.fingerprint == b.fingerprint))
            {
                return Err(BucketFailure { bucket, pilots: 0 });
            }

            // Add bucket to its per-size list
            let size = right - left;
            while by_size.len() <= size {
                by_size.push(Vec::new());
            }
            by_size[size].push((bucket, left));
            left = right;
        }

        Ok(Self {
            entries: keyed.into_iter().map(|(_, entry)| entry).collect(),
            by_size,
            bucket_count,
        })
    }

    /// Iterate over non-empty buckets in decreasing size order.
    ///
    /// Buckets of equal size are yielded in increasing id order. Yields `(Bucket, [Entry])`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Entry])> {
        self.by_size
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .flat_map(move |(size, buckets)| {
                buckets
                    .iter()
                    .map(move |&(bucket, start)| (bucket, &self.entries[start..start + size]))
            })
    }

    /// The number of buckets, including empty ones.
    pub const fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// The size of the largest bucket.
    pub fn max_size(&self) -> usize {
        self.by_size.len().saturating_sub(1)
    }

    /// The number of buckets without keys.
    pub fn empty_count(&self) -> usize {
        self.bucket_count - self.by_size.iter().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 6] = ["Je", "suis", "un", "ensemble", "de", "clés"];

    fn seeds() -> (Seed, Seed) {
        (Seed::new(0x5eed_0001), Seed::new(0x5eed_0002))
    }

    #[test]
    fn every_key_lands_in_its_bucket() {
        let (primary, secondary) = seeds();
        let buckets = Buckets::new(&KEYS, None, primary, secondary, 3).unwrap();

        let mut seen = Vec::new();
        for (bucket, entries) in buckets.iter() {
            for entry in entries {
                let key = KEYS[entry.target];
                assert_eq!(reduce(primary.hash_bytes(key.as_bytes()), 3), bucket);
                assert_eq!(entry.fingerprint, secondary.hash_bytes(key.as_bytes()));
                seen.push(entry.target);
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..KEYS.len()).collect::<Vec<_>>(), "keys lost or duplicated");
    }

    #[test]
    fn largest_buckets_come_first() {
        let keys: Vec<String> = (0..1000).map(|i| format!("key-{i}")).collect();
        let (primary, secondary) = seeds();
        let buckets = Buckets::new(&keys, None, primary, secondary, 250).unwrap();

        let order: Vec<(usize, usize)> = buckets
            .iter()
            .map(|(bucket, entries)| (entries.len(), bucket))
            .collect();
        assert!(
            order
                .windows(2)
                .all(|w| w[0].0 > w[1].0 || (w[0].0 == w[1].0 && w[0].1 < w[1].1)),
            "buckets are not ordered by decreasing size, then increasing id",
        );
        assert_eq!(order.first().map(|(size, _)| *size), Some(buckets.max_size()));

        let non_empty = order.len();
        assert_eq!(buckets.empty_count(), 250 - non_empty);
        assert_eq!(order.iter().map(|(size, _)| size).sum::<usize>(), 1000);
    }

    #[test]
    fn targets_follow_keys() {
        let (primary, secondary) = seeds();
        let targets = [9, 12, 15, 18, 21, 24];
        let buckets = Buckets::new(&KEYS, Some(&targets[..]), primary, secondary, 6).unwrap();
        for (_, entries) in buckets.iter() {
            for entry in entries {
                let i = targets.iter().position(|&t| t == entry.target).unwrap();
                assert_eq!(entry.fingerprint, secondary.hash_bytes(KEYS[i].as_bytes()));
            }
        }
    }

    #[test]
    fn keys_within_a_bucket_keep_input_order() {
        let (primary, secondary) = seeds();
        let buckets = Buckets::new(&KEYS, None, primary, secondary, 1).unwrap();
        let (bucket, entries) = buckets.iter().next().unwrap();
        assert_eq!(bucket, 0);
        let targets: Vec<usize> = entries.iter().map(|entry| entry.target).collect();
        assert_eq!(targets, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn identical_fingerprints_fail_the_bucket() {
        // Equal keys always share a fingerprint and a bucket
        let keys = ["same", "other", "same"];
        let (primary, secondary) = seeds();
        let failure = Buckets::new(&keys, None, primary, secondary, 1)
            .err()
            .expect("colliding fingerprints accepted");
        assert_eq!(failure, BucketFailure { bucket: 0, pilots: 0 });
    }

    #[test]
    fn no_keys_no_buckets() {
        let keys: [&[u8]; 0] = [];
        let (primary, secondary) = seeds();
        let buckets = Buckets::new(&keys, None, primary, secondary, 1).unwrap();
        assert_eq!(buckets.iter().count(), 0);
        assert_eq!(buckets.max_size(), 0);
        assert_eq!(buckets.empty_count(), 1);
    }
}
