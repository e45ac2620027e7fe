//! Text format of the simulation trace.
//!
//! ```text
//! Cycle:3\t104\tSTUR\tR5, [R0, #1]
//! registers:
//! r0:\t100\t0\t0\t0\t0\t42\t0\t0\t
//! r8:\t0\t0\t0\t0\t0\t0\t0\t0\t
//! r16:\t0\t0\t0\t0\t0\t0\t0\t0\t
//! r24:\t0\t0\t0\t0\t0\t0\t0\t0\t
//! data:
//! 104:42\t0\t0\t0\t0\t0\t0\t0\t
//! ============
//! ```
//!
//! The `data:` section only appears once a store has touched memory.

use std::fmt::{Display, Formatter, Result};

use crate::cpu::memory::DataMemory;
use crate::cpu::opcode::Mnemonic;
use crate::cpu::registers::Registers;

pub const SEPARATOR: &str = "============";

/// Header line of a retired instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub cycle: u64,
    pub address: u32,
    pub mnemonic: Mnemonic,
    pub operands: String,
}

impl Display for TraceEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "Cycle:{}\t{}\t{}\t{}",
            self.cycle, self.address, self.mnemonic, self.operands
        )
    }
}

/// Register file and data memory as printed after every trace entry, separator
/// included.
pub struct StateDump<'a> {
    registers: &'a Registers,
    memory: &'a DataMemory,
}

impl<'a> StateDump<'a> {
    #[must_use]
    pub const fn new(registers: &'a Registers, memory: &'a DataMemory) -> Self {
        Self { registers, memory }
    }
}

impl Display for StateDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "registers:")?;
        for (start, values) in self.registers.rows() {
            write!(f, "r{start}:\t")?;
            for value in values {
                write!(f, "{value}\t")?;
            }
            writeln!(f)?;
        }

        if !self.memory.is_empty() {
            writeln!(f, "data:")?;
            for (address, bank) in self.memory.banks() {
                write!(f, "{address}:")?;
                for value in bank {
                    write!(f, "{value}\t")?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "{SEPARATOR}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_header() {
        let entry = TraceEntry {
            cycle: 12,
            address: 140,
            mnemonic: Mnemonic::Cbz,
            operands: "R1, #-4".to_string(),
        };
        assert_eq!(entry.to_string(), "Cycle:12\t140\tCBZ\tR1, #-4");
    }

    #[test]
    fn registers_only_without_memory() {
        let mut registers = Registers::default();
        registers.set_register_at(31, -1);
        let memory = DataMemory::default();

        assert_eq!(
            StateDump::new(&registers, &memory).to_string(),
            "registers:\n\
             r0:\t0\t0\t0\t0\t0\t0\t0\t0\t\n\
             r8:\t0\t0\t0\t0\t0\t0\t0\t0\t\n\
             r16:\t0\t0\t0\t0\t0\t0\t0\t0\t\n\
             r24:\t0\t0\t0\t0\t0\t0\t0\t-1\t\n\
             ============\n"
        );
    }

    #[test]
    fn memory_rows_have_eight_slots() {
        let registers = Registers::default();
        let mut memory = DataMemory::default();
        memory.write_word(136, 7);
        memory.write_word(96, -2);

        let dump = StateDump::new(&registers, &memory).to_string();
        let data = dump.split("data:\n").nth(1).unwrap();
        assert_eq!(
            data,
            "96:-2\t0\t0\t0\t0\t0\t0\t0\t\n\
             136:7\t0\t0\t0\t0\t0\t0\t0\t\n\
             ============\n"
        );
    }
}
