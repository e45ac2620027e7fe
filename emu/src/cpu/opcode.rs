//! # LEGv8 Opcode Classification
//!
//! The top 11 bits (31-21) of every instruction word are the *opcode field*.
//! Formats with wider immediates steal low opcode bits for their operands, which is
//! why some mnemonics own a whole range of opcode field values instead of a single one:
//!
//! ```text
//! ┌───────────┬──────────┬────────┬──────────────────────────────────┐
//! │ Opcode    │ Mnemonic │ Format │ Why a range                      │
//! ├───────────┼──────────┼────────┼──────────────────────────────────┤
//! │ 160-191   │ B        │ B      │ 6-bit opcode, 26-bit offset      │
//! │ 1104      │ AND      │ R      │                                  │
//! │ 1112      │ ADD      │ R      │                                  │
//! │ 1160-1161 │ ADDI     │ I      │ 10-bit opcode, 12-bit immediate  │
//! │ 1360      │ ORR      │ R      │                                  │
//! │ 1440-1447 │ CBZ      │ CB     │ 8-bit opcode, 19-bit offset      │
//! │ 1448-1455 │ CBNZ     │ CB     │ 8-bit opcode, 19-bit offset      │
//! │ 1624      │ SUB      │ R      │                                  │
//! │ 1672-1673 │ SUBI     │ I      │ 10-bit opcode, 12-bit immediate  │
//! │ 1684-1687 │ MOVZ     │ IM     │ 9-bit opcode, 2-bit shift code   │
//! │ 1690      │ LSR      │ R      │                                  │
//! │ 1691      │ LSL      │ R      │                                  │
//! │ 1692      │ ASR      │ R      │                                  │
//! │ 1872      │ EOR      │ R      │                                  │
//! │ 1940-1943 │ MOVK     │ IM     │ 9-bit opcode, 2-bit shift code   │
//! │ 1984      │ STUR     │ D      │                                  │
//! │ 1986      │ LDUR     │ D      │                                  │
//! │ 2038      │ BREAK    │ BREAK  │                                  │
//! │ 0         │ NOP      │ NOP    │                                  │
//! └───────────┴──────────┴────────┴──────────────────────────────────┘
//! ```
//!
//! Every other value is unclassified. The same table serves the decode pass and the
//! execution engine.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// Number of meaningful bits in the opcode field.
pub const OPCODE_FIELD_WIDTH: u8 = 11;

/// Operand layout of an instruction word.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    D,
    B,
    CB,
    IM,
    Break,
    Nop,
    /// A literal word found after the halt instruction.
    RawData,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::R => f.write_str("R"),
            Self::I => f.write_str("I"),
            Self::D => f.write_str("D"),
            Self::B => f.write_str("B"),
            Self::CB => f.write_str("CB"),
            Self::IM => f.write_str("IM"),
            Self::Break => f.write_str("BREAK"),
            Self::Nop => f.write_str("NOP"),
            Self::RawData => f.write_str("RAW-DATA"),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum Mnemonic {
    B,
    And,
    Add,
    Addi,
    Orr,
    Cbz,
    Cbnz,
    Sub,
    Subi,
    Movz,
    Movk,
    Lsr,
    Lsl,
    Asr,
    Eor,
    Stur,
    Ldur,
    Break,
    Nop,
}

impl Mnemonic {
    /// Shift mnemonics print their `shamt` instead of a second source register.
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::Lsl | Self::Lsr | Self::Asr)
    }
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::B => f.write_str("B"),
            Self::And => f.write_str("AND"),
            Self::Add => f.write_str("ADD"),
            Self::Addi => f.write_str("ADDI"),
            Self::Orr => f.write_str("ORR"),
            Self::Cbz => f.write_str("CBZ"),
            Self::Cbnz => f.write_str("CBNZ"),
            Self::Sub => f.write_str("SUB"),
            Self::Subi => f.write_str("SUBI"),
            Self::Movz => f.write_str("MOVZ"),
            Self::Movk => f.write_str("MOVK"),
            Self::Lsr => f.write_str("LSR"),
            Self::Lsl => f.write_str("LSL"),
            Self::Asr => f.write_str("ASR"),
            Self::Eor => f.write_str("EOR"),
            Self::Stur => f.write_str("STUR"),
            Self::Ldur => f.write_str("LDUR"),
            Self::Break => f.write_str("BREAK"),
            Self::Nop => f.write_str("NOP"),
        }
    }
}

/// Extracts the opcode field (bits 31-21) of an instruction word.
#[must_use]
pub fn opcode_field(word: u32) -> u16 {
    // 11 bits always fit.
    word.get_bits((32 - OPCODE_FIELD_WIDTH)..=31) as u16
}

/// Looks up the mnemonic and format owning `opcode`.
///
/// Returns `None` for values outside the instruction table.
#[must_use]
pub const fn classify(opcode: u16) -> Option<(Mnemonic, Format)> {
    let found = match opcode {
        160..=191 => (Mnemonic::B, Format::B),
        1104 => (Mnemonic::And, Format::R),
        1112 => (Mnemonic::Add, Format::R),
        1160..=1161 => (Mnemonic::Addi, Format::I),
        1360 => (Mnemonic::Orr, Format::R),
        1440..=1447 => (Mnemonic::Cbz, Format::CB),
        1448..=1455 => (Mnemonic::Cbnz, Format::CB),
        1624 => (Mnemonic::Sub, Format::R),
        1672..=1673 => (Mnemonic::Subi, Format::I),
        1684..=1687 => (Mnemonic::Movz, Format::IM),
        1940..=1943 => (Mnemonic::Movk, Format::IM),
        1690 => (Mnemonic::Lsr, Format::R),
        1691 => (Mnemonic::Lsl, Format::R),
        1692 => (Mnemonic::Asr, Format::R),
        1872 => (Mnemonic::Eor, Format::R),
        1984 => (Mnemonic::Stur, Format::D),
        1986 => (Mnemonic::Ldur, Format::D),
        2038 => (Mnemonic::Break, Format::Break),
        0 => (Mnemonic::Nop, Format::Nop),
        _ => return None,
    };

    Some(found)
}
