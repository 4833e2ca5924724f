//! Bitmap API.

/// Bit-compressed [`Vec<bool>`], used to track free slots of the codomain.
pub(crate) struct BitMap {
    /// Underlying container.
    ///
    /// Bit `index` is stored in word `index / 64` at bit `index % 64`, counting from LSB. Bits past
    /// `len` are always zero.
    words: Vec<u64>,

    /// Number of addressable bits.
    len: usize,
}

#[allow(
    clippy::arithmetic_side_effects,
    reason = "indices are bounded by `len`, divisions are by a constant"
)]
impl BitMap {
    /// Create a bitmap of a given length, filled with one bits.
    pub fn new_ones(len: usize) -> Self {
        let mut words = vec![u64::MAX; len.div_ceil(64)];
        if len % 64 != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1 << (len % 64)) - 1;
            }
        }
        Self { words, len }
    }

    /// Get the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "bit index {index} out of bounds");
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Set the bit at `index` to zero.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn reset(&mut self, index: usize) {
        assert!(index < self.len, "bit index {index} out of bounds");
        self.words[index / 64] &= !(1 << (index % 64));
    }

    /// Find the first one bit at or after `start`, wrapping around to the beginning.
    ///
    /// Returns `None` if the bitmap holds no one bits.
    pub fn next_one_cyclic(&self, start: usize) -> Option<usize> {
        self.next_one_in(start, self.len)
            .or_else(|| self.next_one_in(0, start.min(self.len)))
    }

    /// Find the first one bit in `[start, end)`.
    fn next_one_in(&self, start: usize, end: usize) -> Option<usize> {
        if start >= end {
            return None;
        }
        let mut word_index = start / 64;
        // Mask out bits below `start` in the first word
        let mut word = self.words[word_index] & (u64::MAX << (start % 64));
        loop {
            if word != 0 {
                let index = word_index * 64 + word.trailing_zeros() as usize;
                return (index < end).then_some(index);
            }
            word_index += 1;
            if word_index * 64 >= end {
                return None;
            }
            word = self.words[word_index];
        }
    }

    /// Count one bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }
}
