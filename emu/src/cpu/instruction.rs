//! # LEGv8 Instruction Formats
//!
//! Each format slices the 32-bit word at fixed boundaries (bit 0 is the lsb):
//!
//! ```text
//!        31              21 20     16 15        10 9      5 4      0
//! R   : [     opcode      ][   Rm   ][   shamt   ][   Rn   ][   Rd   ]
//!        31            22 21                   10 9      5 4      0
//! I   : [    opcode      ][      immediate      ][   Rn   ][   Rd   ]
//!        31              21 20           12 11 10 9      5 4      0
//! D   : [     opcode      ][   address     ][op2][   Rn   ][   Rt   ]
//!        31     26 25                                             0
//! B   : [ opcode  ][                    offset                     ]
//!        31        24 23                                5 4      0
//! CB  : [  opcode    ][             offset               ][   Rt   ]
//!        31          23 22 21 20                       5 4      0
//! IM  : [   opcode     ][sc ][          field           ][   Rd   ]
//! ```
//!
//! The immediate of I, and the offsets of B and CB are two's complement; the D address
//! is an unsigned word offset.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::bitwise::{Bits, sign_extend};
use crate::cpu::opcode::{Format, Mnemonic};

/// Address of the first word of a program image.
pub const FIRST_ADDRESS: u32 = 96;

/// Size in bytes of an instruction or data word.
pub const SIZE_OF_INSTRUCTION: u32 = 4;

/// Operand fields of a decoded word, one variant per [`Format`].
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Operands {
    R {
        rm: u8,
        shamt: u8,
        rn: u8,
        rd: u8,
    },
    I {
        immediate: i16,
        rn: u8,
        rd: u8,
    },
    D {
        /// Offset in words from the base register.
        address: u16,
        op2: u8,
        rn: u8,
        rt: u8,
    },
    B {
        /// Branch distance in instructions.
        offset: i32,
    },
    CB {
        /// Branch distance in instructions.
        offset: i32,
        /// Register compared against zero.
        rt: u8,
    },
    IM {
        shift_code: u8,
        field: u16,
        rd: u8,
    },
    Break,
    Nop,
    RawData {
        value: i32,
    },
}

impl Operands {
    /// Extracts the fields `format` defines from `word`.
    #[must_use]
    pub fn decode(format: Format, word: u32) -> Self {
        let register = |range: RangeInclusive<u8>| word.get_bits(range) as u8;

        match format {
            Format::R => Self::R {
                rm: register(16..=20),
                shamt: register(10..=15),
                rn: register(5..=9),
                rd: register(0..=4),
            },
            Format::I => Self::I {
                immediate: sign_extend(word.get_bits(10..=21).into(), 12) as i16,
                rn: register(5..=9),
                rd: register(0..=4),
            },
            Format::D => Self::D {
                address: word.get_bits(12..=20) as u16,
                op2: register(10..=11),
                rn: register(5..=9),
                rt: register(0..=4),
            },
            Format::B => Self::B {
                offset: sign_extend(word.get_bits(0..=25).into(), 26) as i32,
            },
            Format::CB => Self::CB {
                offset: sign_extend(word.get_bits(5..=23).into(), 19) as i32,
                rt: register(0..=4),
            },
            Format::IM => Self::IM {
                shift_code: register(21..=22),
                field: word.get_bits(5..=20) as u16,
                rd: register(0..=4),
            },
            Format::Break => Self::Break,
            Format::Nop => Self::Nop,
            Format::RawData => Self::RawData {
                value: sign_extend(word.into(), 32) as i32,
            },
        }
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        match self {
            Self::R { .. } => Format::R,
            Self::I { .. } => Format::I,
            Self::D { .. } => Format::D,
            Self::B { .. } => Format::B,
            Self::CB { .. } => Format::CB,
            Self::IM { .. } => Format::IM,
            Self::Break => Format::Break,
            Self::Nop => Format::Nop,
            Self::RawData { .. } => Format::RawData,
        }
    }

    /// Renders the operand list as it appears after the mnemonic.
    ///
    /// Formats without operands render as an empty string, raw data as its value.
    #[must_use]
    pub fn disassembler(&self, mnemonic: Mnemonic) -> String {
        match self {
            Self::R { rm, shamt, rn, rd } => {
                if mnemonic.is_shift() {
                    format!("R{rd}, R{rn}, #{shamt}")
                } else {
                    format!("R{rd}, R{rn}, R{rm}")
                }
            }
            Self::I { immediate, rn, rd } => format!("R{rd}, R{rn}, #{immediate}"),
            Self::D {
                address, rn, rt, ..
            } => format!("R{rt}, [R{rn}, #{address}]"),
            Self::B { offset } => format!("#{offset}"),
            Self::CB { offset, rt } => format!("R{rt}, #{offset}"),
            Self::IM {
                shift_code,
                field,
                rd,
            } => format!("R{rd}, {field}, LSL {shift_code}"),
            Self::Break | Self::Nop => String::new(),
            Self::RawData { value } => value.to_string(),
        }
    }
}

/// One line of the program image after decoding.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// The 32 `0`/`1` characters as read, whitespace removed.
    pub raw: String,
    pub address: u32,
    /// `None` when `raw` is not a valid 32-bit binary string.
    pub bits: Option<u32>,
    /// Bits 31-21, only for words that went through classification.
    pub opcode: Option<u16>,
    pub mnemonic: Option<Mnemonic>,
    /// `None` when the word could not be classified.
    pub operands: Option<Operands>,
}

impl Instruction {
    #[must_use]
    pub fn format(&self) -> Option<Format> {
        self.operands.as_ref().map(Operands::format)
    }

    /// Address of the `index`-th word of a program image.
    #[must_use]
    pub const fn address_of(index: usize) -> u32 {
        FIRST_ADDRESS + SIZE_OF_INSTRUCTION * index as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_r() {
        // ADD R3, R1, R2 with shamt 5
        let word = (1112 << 21) | (2 << 16) | (5 << 10) | (1 << 5) | 3;
        assert_eq!(
            Operands::decode(Format::R, word),
            Operands::R {
                rm: 2,
                shamt: 5,
                rn: 1,
                rd: 3
            }
        );
    }

    #[test]
    fn decode_i_negative_immediate() {
        // ADDI R2, R1, #-1
        let word = (1160 << 21) | (0xFFF << 10) | (1 << 5) | 2;
        let operands = Operands::decode(Format::I, word);
        assert_eq!(
            operands,
            Operands::I {
                immediate: -1,
                rn: 1,
                rd: 2
            }
        );
        assert_eq!("R2, R1, #-1", operands.disassembler(Mnemonic::Addi));
    }

    #[test]
    fn decode_d() {
        // LDUR R6, [R0, #511] with op2 = 0b10
        let word = (1986 << 21) | (511 << 12) | (0b10 << 10) | 6;
        let operands = Operands::decode(Format::D, word);
        assert_eq!(
            operands,
            Operands::D {
                address: 511,
                op2: 0b10,
                rn: 0,
                rt: 6
            }
        );
        assert_eq!("R6, [R0, #511]", operands.disassembler(Mnemonic::Ldur));
    }

    #[test]
    fn decode_b() {
        let word = 0b000101_11111111111111111111111110;
        let operands = Operands::decode(Format::B, word);
        assert_eq!(operands, Operands::B { offset: -2 });
        assert_eq!("#-2", operands.disassembler(Mnemonic::B));

        let word = 0b000101_00000000000000000000000011;
        assert_eq!(Operands::decode(Format::B, word), Operands::B { offset: 3 });
    }

    #[test]
    fn decode_cb() {
        // CBNZ R4, #-3
        let offset = (-3_i32 as u32) & 0x7_FFFF;
        let word = (0b1011_0101 << 24) | (offset << 5) | 4;
        let operands = Operands::decode(Format::CB, word);
        assert_eq!(operands, Operands::CB { offset: -3, rt: 4 });
        assert_eq!("R4, #-3", operands.disassembler(Mnemonic::Cbnz));
    }

    #[test]
    fn decode_im() {
        // MOVZ R1, 65535, LSL 3
        let word = (0b1_1010_0101 << 23) | (0b11 << 21) | (0xFFFF << 5) | 1;
        let operands = Operands::decode(Format::IM, word);
        assert_eq!(
            operands,
            Operands::IM {
                shift_code: 3,
                field: 0xFFFF,
                rd: 1
            }
        );
        assert_eq!("R1, 65535, LSL 3", operands.disassembler(Mnemonic::Movz));
    }

    #[test]
    fn decode_raw_data() {
        assert_eq!(
            Operands::decode(Format::RawData, 0xFFFF_FFFF),
            Operands::RawData { value: -1 }
        );
        assert_eq!(
            Operands::decode(Format::RawData, 5),
            Operands::RawData { value: 5 }
        );
    }

    #[test]
    fn shift_operands_print_shamt() {
        let operands = Operands::R {
            rm: 0,
            shamt: 4,
            rn: 7,
            rd: 9,
        };
        assert_eq!("R9, R7, #4", operands.disassembler(Mnemonic::Lsl));
        assert_eq!("R9, R7, R0", operands.disassembler(Mnemonic::Orr));
    }

    #[test]
    fn addresses() {
        assert_eq!(Instruction::address_of(0), 96);
        assert_eq!(Instruction::address_of(1), 100);
        assert_eq!(Instruction::address_of(10), 136);
    }
}
