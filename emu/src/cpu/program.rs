//! # Program Image
//!
//! Turns the textual listing (one 32-character binary word per line) into the decoded
//! instruction records. Words are decoded in order and everything after the first
//! `BREAK` is literal data: it is never classified, only read as a signed 32-bit value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::instruction::{Instruction, Operands};
use crate::cpu::opcode::{self, Format};

/// Characters in one line of the program image.
pub const WORD_WIDTH: usize = 32;

/// Non fatal problems found while decoding a line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("line at address {address}: expected 32 binary digits, found {length}")]
    InvalidLength { address: u32, length: usize },

    #[error("line at address {address}: invalid binary digit {found:?}")]
    InvalidDigit { address: u32, found: char },

    #[error("line at address {address}: invalid opcode {opcode}")]
    InvalidOpcode { address: u32, opcode: u16 },
}

/// Parses exactly [`WORD_WIDTH`] `0`/`1` characters into a word.
///
/// # Errors
///
/// Fails when the length is wrong or a character is not a binary digit.
pub fn parse_word(raw: &str, address: u32) -> Result<u32, DecodeError> {
    let length = raw.chars().count();
    if length != WORD_WIDTH {
        return Err(DecodeError::InvalidLength { address, length });
    }

    raw.chars().try_fold(0_u32, |word, c| match c {
        '0' => Ok(word << 1),
        '1' => Ok((word << 1) | 1),
        found => Err(DecodeError::InvalidDigit { address, found }),
    })
}

/// The decoded program, immutable once built.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Decodes every non blank line of `lines`.
    ///
    /// Malformed lines and unknown opcodes are logged and kept as unclassified
    /// records, they never stop the decode pass.
    pub fn decode<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instructions = Vec::new();
        let mut break_hit = false;

        for line in lines {
            let raw: String = line
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if raw.is_empty() {
                continue;
            }

            let address = Instruction::address_of(instructions.len());
            let instruction = if break_hit {
                decode_data(raw, address)
            } else {
                decode_instruction(raw, address)
            };

            if instruction.format() == Some(Format::Break) {
                break_hit = true;
            }

            tracing::debug!(
                "decoded {address}: {:?} {:?}",
                instruction.mnemonic,
                instruction.operands
            );
            instructions.push(instruction);
        }

        Self { instructions }
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

fn decode_instruction(raw: String, address: u32) -> Instruction {
    let mut instruction = Instruction {
        raw,
        address,
        bits: None,
        opcode: None,
        mnemonic: None,
        operands: None,
    };

    let word = match parse_word(&instruction.raw, address) {
        Ok(word) => word,
        Err(e) => {
            tracing::warn!("{e}");
            return instruction;
        }
    };

    let opcode = opcode::opcode_field(word);
    instruction.bits = Some(word);
    instruction.opcode = Some(opcode);

    match opcode::classify(opcode) {
        Some((mnemonic, format)) => {
            instruction.mnemonic = Some(mnemonic);
            instruction.operands = Some(Operands::decode(format, word));
        }
        None => tracing::warn!("{}", DecodeError::InvalidOpcode { address, opcode }),
    }

    instruction
}

fn decode_data(raw: String, address: u32) -> Instruction {
    let bits = parse_word(&raw, address)
        .inspect_err(|e| tracing::warn!("{e}"))
        .ok();

    Instruction {
        operands: bits.map(|word| Operands::decode(Format::RawData, word)),
        raw,
        address,
        bits,
        opcode: None,
        mnemonic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::opcode::Mnemonic;
    use pretty_assertions::assert_eq;

    const BREAK: &str = "11111110110111101111111111100111";
    const ADD_R3_R1_R2: &str = "10001011000000100000000000100011";

    #[test]
    fn parse_word_checks_input() {
        assert_eq!(parse_word(ADD_R3_R1_R2, 96), Ok(0b1000_1011_0000_0010_0000_0000_0010_0011));
        assert_eq!(
            parse_word("0101", 100),
            Err(DecodeError::InvalidLength {
                address: 100,
                length: 4
            })
        );
        assert_eq!(
            parse_word("1000101100000010000000000010002x", 104),
            Err(DecodeError::InvalidDigit {
                address: 104,
                found: '2'
            })
        );
    }

    #[test]
    fn addresses_start_at_96() {
        let program = Program::decode([ADD_R3_R1_R2; 5]);
        let addresses = program
            .instructions()
            .iter()
            .map(|i| i.address)
            .collect::<Vec<_>>();
        assert_eq!(addresses, vec![96, 100, 104, 108, 112]);
    }

    #[test]
    fn whitespace_is_stripped() {
        let program = Program::decode(["10001011000 00010 000000 00001 00011\r", "", "   "]);
        assert_eq!(program.len(), 1);
        assert_eq!(program.instructions()[0].raw, ADD_R3_R1_R2);
        assert_eq!(program.instructions()[0].mnemonic, Some(Mnemonic::Add));
    }

    #[test]
    fn words_after_break_are_data() {
        let program = Program::decode([
            ADD_R3_R1_R2,
            BREAK,
            "00000000000000000000000000000101",
            // Would be an ADD before the BREAK.
            ADD_R3_R1_R2,
            "11111111111111111111111111111110",
        ]);

        let formats = program
            .instructions()
            .iter()
            .map(Instruction::format)
            .collect::<Vec<_>>();
        assert_eq!(
            formats,
            vec![
                Some(Format::R),
                Some(Format::Break),
                Some(Format::RawData),
                Some(Format::RawData),
                Some(Format::RawData),
            ]
        );

        let data = program.get(2).unwrap();
        assert_eq!(data.operands, Some(Operands::RawData { value: 5 }));
        assert_eq!(data.opcode, None);
        assert_eq!(data.mnemonic, None);
        assert_eq!(
            program.get(4).unwrap().operands,
            Some(Operands::RawData { value: -2 })
        );
    }

    #[test]
    fn invalid_opcode_is_kept_unclassified() {
        // Opcode field 2047 is not in the table.
        let program = Program::decode(["11111111111000000000000000000000", ADD_R3_R1_R2]);

        let invalid = program.get(0).unwrap();
        assert_eq!(invalid.opcode, Some(2047));
        assert_eq!(invalid.mnemonic, None);
        assert_eq!(invalid.operands, None);
        assert_eq!(program.get(1).unwrap().mnemonic, Some(Mnemonic::Add));
    }

    #[test]
    fn malformed_line_is_kept_unclassified() {
        let program = Program::decode(["10001", ADD_R3_R1_R2]);

        let malformed = program.get(0).unwrap();
        assert_eq!(malformed.bits, None);
        assert_eq!(malformed.opcode, None);
        assert_eq!(malformed.operands, None);
        assert_eq!(program.get(1).unwrap().address, 100);
    }

    #[test]
    fn blank_input_is_empty() {
        let program = Program::decode(["", "  ", "\r"]);
        assert!(program.is_empty());
        assert_eq!(program.len(), 0);
    }

    #[test]
    fn nop_is_all_zero() {
        let program = Program::decode(["00000000000000000000000000000000"]);
        assert_eq!(program.get(0).unwrap().mnemonic, Some(Mnemonic::Nop));
        assert_eq!(program.get(0).unwrap().operands, Some(Operands::Nop));
    }
}
