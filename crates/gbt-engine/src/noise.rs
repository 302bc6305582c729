//! Shared pseudo-random bit table for the noise channel.
//!
//! The table is generated once from a fixed seed and handed to every
//! synthesizer behind an `Arc`, so renders are reproducible across calls.

use alloc::boxed::Box;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of bits in the table (the 15-bit counter period).
pub const NOISE_TABLE_LEN: usize = 0x7FFF;

/// Seed used for the application-wide table.
pub const NOISE_SEED: u64 = 0;

/// Read-only table of noise levels (`true` = high).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseTable {
    bits: Box<[bool]>,
}

impl NoiseTable {
    /// Generate the table with the standard seed.
    pub fn generate() -> Self {
        Self::with_seed(NOISE_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let bits = (0..NOISE_TABLE_LEN).map(|_| rng.gen::<bool>()).collect();
        Self { bits }
    }

    /// Level at `index`; indices wrap at the table length.
    pub fn bit(&self, index: usize) -> bool {
        self.bits[index % NOISE_TABLE_LEN]
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl Default for NoiseTable {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_table() {
        assert_eq!(NoiseTable::generate(), NoiseTable::generate());
        assert_ne!(NoiseTable::with_seed(1), NoiseTable::with_seed(2));
    }

    #[test]
    fn roughly_balanced() {
        let table = NoiseTable::generate();
        assert_eq!(table.len(), NOISE_TABLE_LEN);
        let high = (0..table.len()).filter(|&i| table.bit(i)).count();
        // A fair coin over 32767 flips stays well within 45-55%.
        assert!(high > table.len() * 45 / 100 && high < table.len() * 55 / 100);
    }
}
