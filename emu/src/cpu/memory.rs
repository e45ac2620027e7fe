//! # Data Memory
//!
//! Sparse, word-granular data memory. Every byte address touched by a store owns a
//! bank of [`SLOTS_PER_BANK`] values; loads and stores only use slot 0, the other
//! slots exist so that a state dump prints a uniform row per address.
//!
//! Banks are created zeroed on first store and never removed. A load from an address
//! without a bank reads 0 and creates nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SLOTS_PER_BANK: usize = 8;

pub type Bank = [i64; SLOTS_PER_BANK];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMemory {
    // Ordered so dumps list addresses from lowest to highest.
    banks: BTreeMap<i64, Bank>,
}

impl DataMemory {
    #[must_use]
    pub fn read_word(&self, address: i64) -> i64 {
        self.banks.get(&address).map_or(0, |bank| bank[0])
    }

    pub fn write_word(&mut self, address: i64, value: i64) {
        self.banks.entry(address).or_insert([0; SLOTS_PER_BANK])[0] = value;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    /// Touched addresses with their bank, lowest address first.
    pub fn banks(&self) -> impl Iterator<Item = (i64, &Bank)> {
        self.banks.iter().map(|(address, bank)| (*address, bank))
    }
}
