//! Disassembly listing of a decoded [`Program`].
//!
//! One line per record: the raw bits split at the field boundaries of the format,
//! the address, the mnemonic and the operands, separated by tabs.
//!
//! ```text
//! 10001011000 00010 000000 00001 00011    96      ADD     R3, R1, R2
//! 11111110110111101111111111100111        100     BREAK
//! 00000000000000000000000000000101        104     5
//! ```

use std::io::{self, Write};

use crate::cpu::instruction::{Instruction, Operands};
use crate::cpu::opcode::Format;
use crate::cpu::program::Program;

/// Printed in place of the mnemonic for records that could not be classified.
pub const INVALID: &str = "INVALID";

/// Widths of the bit groups of `format`, from the msb down.
///
/// Formats without operand fields are printed as a single group.
#[must_use]
pub const fn field_widths(format: Format) -> &'static [usize] {
    match format {
        Format::R => &[11, 5, 6, 5, 5],
        Format::I => &[10, 12, 5, 5],
        Format::D => &[11, 9, 2, 5, 5],
        Format::B => &[6, 26],
        Format::CB => &[8, 19, 5],
        Format::IM => &[9, 2, 16, 5],
        Format::Break | Format::Nop | Format::RawData => &[32],
    }
}

/// Splits `raw` into space separated groups for `format`.
#[must_use]
pub fn group_bits(raw: &str, format: Format) -> String {
    let mut groups = Vec::new();
    let mut rest = raw;

    for width in field_widths(format) {
        let (group, tail) = rest.split_at((*width).min(rest.len()));
        groups.push(group);
        rest = tail;
    }

    groups.join(" ")
}

/// Renders one line of the listing, without the trailing newline.
#[must_use]
pub fn disassemble(instruction: &Instruction) -> String {
    let Instruction {
        raw,
        address,
        mnemonic,
        operands,
        ..
    } = instruction;

    match (operands, mnemonic) {
        (Some(Operands::RawData { value }), _) => format!("{raw}\t{address}\t{value}"),
        (Some(Operands::Break | Operands::Nop), Some(mnemonic)) => {
            format!("{raw}\t{address}\t{mnemonic}")
        }
        (Some(operands), Some(mnemonic)) => format!(
            "{}\t{address}\t{mnemonic}\t{}",
            group_bits(raw, operands.format()),
            operands.disassembler(*mnemonic)
        ),
        _ => format!("{raw}\t{address}\t{INVALID}"),
    }
}

/// Writes the listing of the whole program.
///
/// # Errors
///
/// Forwards failures of `out`.
pub fn write_listing<W: Write>(program: &Program, out: &mut W) -> io::Result<()> {
    for instruction in program.instructions() {
        writeln!(out, "{}", disassemble(instruction))?;
    }

    out.flush()
}
