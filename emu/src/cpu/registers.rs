//! # LEGv8 Register File
//!
//! 32 signed registers, R0-R31, all zero at reset. None of them is hardwired: R31 is
//! as writable as any other register in this machine.

use serde::{Deserialize, Serialize};

/// Number of architectural registers.
pub const REGISTER_COUNT: usize = 32;

/// Registers printed on each row of a state dump.
pub const REGISTERS_PER_ROW: usize = 8;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers([i64; REGISTER_COUNT]);

impl Registers {
    pub fn set_register_at(&mut self, reg: u8, new_value: i64) {
        let reg = usize::from(reg);
        assert!(
            reg < REGISTER_COUNT,
            "Invalid register index: {reg} (0x{reg:X})"
        );
        self.0[reg] = new_value;
    }

    #[must_use]
    pub const fn register_at(&self, reg: u8) -> i64 {
        self.0[reg as usize]
    }

    /// Rows of [`REGISTERS_PER_ROW`] registers, with the index of their first register.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[i64])> {
        self.0
            .chunks(REGISTERS_PER_ROW)
            .enumerate()
            .map(|(row, values)| (row * REGISTERS_PER_ROW, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_zeroed() {
        let registers = Registers::default();
        assert_eq!(registers, Registers([0; REGISTER_COUNT]));
    }

    #[test]
    fn r31_is_general_purpose() {
        let mut registers = Registers::default();
        registers.set_register_at(31, -9);
        assert_eq!(registers.register_at(31), -9);
    }

    #[test]
    #[should_panic(expected = "Invalid register index")]
    fn out_of_range() {
        Registers::default().set_register_at(32, 1);
    }

    #[test]
    fn rows_of_eight() {
        let mut registers = Registers::default();
        registers.set_register_at(9, 4);

        let rows = registers.rows().collect::<Vec<_>>();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().map(|(start, _)| *start).collect::<Vec<_>>(),
            vec![0, 8, 16, 24]
        );
        assert_eq!(rows[1].1, &[0, 4, 0, 0, 0, 0, 0, 0]);
    }
}
