use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::instruction::{Instruction, Operands};
use crate::cpu::memory::DataMemory;
use crate::cpu::opcode::{self, Mnemonic};
use crate::cpu::program::Program;
use crate::cpu::registers::Registers;
use crate::trace::{StateDump, TraceEntry};

/// Bytes addressed by one unit of a D-format offset.
pub const WORD_SIZE: i64 = 4;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to write the simulation trace")]
    Trace(#[from] std::io::Error),
}

/// Run parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Stops the run after this many retired instructions.
    pub max_cycles: Option<u64>,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A `BREAK` was retired.
    Halted,
    /// The program counter moved past the last record.
    FellOffEnd,
    /// A branch moved the program counter before the first record.
    BranchedBeforeStart,
    /// Control flow reached the data words stored after `BREAK`.
    EnteredData,
    /// [`SimConfig::max_cycles`] was reached.
    CycleLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: Outcome,
    /// Instructions retired, i.e. trace entries written.
    pub retired: u64,
}

/// Final machine state, as written by `--state-json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub summary: RunSummary,
    pub registers: Registers,
    pub memory: DataMemory,
}

/// Result of a single [`LegV8::step`].
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Retired(TraceEntry),
    /// The record could not be classified, nothing happened.
    Skipped,
    Stopped(Outcome),
}

/// Functional LEGv8 interpreter over a decoded [`Program`].
///
/// The program counter is an index into the program, not a byte address: branch
/// offsets count instructions.
pub struct LegV8<'a> {
    program: &'a Program,

    pub registers: Registers,
    pub memory: DataMemory,

    program_counter: i64,
    cycle: u64,
    halted: bool,
}

impl<'a> LegV8<'a> {
    #[must_use]
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            registers: Registers::default(),
            memory: DataMemory::default(),
            program_counter: 0,
            cycle: 1,
            halted: false,
        }
    }

    /// Number of the next cycle, starting from 1.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// The record at the program counter, or how the run ends when there is none.
    fn fetch(&self) -> Result<&'a Instruction, Outcome> {
        let Ok(index) = usize::try_from(self.program_counter) else {
            tracing::warn!(
                "control flow moved to instruction {}, before the start of the program",
                self.program_counter
            );
            return Err(Outcome::BranchedBeforeStart);
        };

        self.program.get(index).ok_or(Outcome::FellOffEnd)
    }

    /// Classifies the record again from its opcode field, so that a record whose
    /// opcode is not in the table is never executed.
    fn decode(instruction: &Instruction) -> Option<(Mnemonic, Operands)> {
        let operands = instruction.operands?;
        let (mnemonic, format) = opcode::classify(instruction.opcode?)?;
        debug_assert_eq!(format, operands.format());

        Some((mnemonic, operands))
    }

    /// Executes the instruction and returns the branch distance when it redirects
    /// control flow.
    fn execute(&mut self, mnemonic: Mnemonic, operands: Operands) -> Option<i32> {
        match operands {
            Operands::B { offset } => Some(offset),
            Operands::R { rm, rn, rd, .. } => {
                self.data_processing(mnemonic, rd, rn, rm);
                None
            }
            Operands::I { immediate, rn, rd } => {
                self.data_processing_immediate(mnemonic, rd, rn, i64::from(immediate));
                None
            }
            Operands::CB { offset, rt } => self.conditional_branch(mnemonic, rt, offset),
            Operands::D {
                address, rn, rt, ..
            } => {
                self.single_data_transfer(mnemonic, rt, rn, address);
                None
            }
            // Wide moves are traced without touching the register file.
            Operands::IM { .. } | Operands::Nop | Operands::RawData { .. } => None,
            Operands::Break => {
                self.halted = true;
                None
            }
        }
    }

    fn data_processing(&mut self, mnemonic: Mnemonic, rd: u8, rn: u8, rm: u8) {
        let op1 = self.registers.register_at(rn);
        let op2 = self.registers.register_at(rm);

        let result = match mnemonic {
            Mnemonic::And => op1 & op2,
            Mnemonic::Add => op1.wrapping_add(op2),
            Mnemonic::Orr => op1 | op2,
            Mnemonic::Eor => op1 ^ op2,
            // SUB is Rm - Rn, unlike the other operations.
            Mnemonic::Sub => op2.wrapping_sub(op1),
            // Shifts are traced without touching the register file.
            _ => return,
        };

        self.registers.set_register_at(rd, result);
    }

    fn data_processing_immediate(&mut self, mnemonic: Mnemonic, rd: u8, rn: u8, immediate: i64) {
        let op1 = self.registers.register_at(rn);

        let result = match mnemonic {
            Mnemonic::Addi => op1.wrapping_add(immediate),
            Mnemonic::Subi => op1.wrapping_sub(immediate),
            _ => return,
        };

        self.registers.set_register_at(rd, result);
    }

    fn conditional_branch(&self, mnemonic: Mnemonic, rt: u8, offset: i32) -> Option<i32> {
        let value = self.registers.register_at(rt);

        let taken = match mnemonic {
            Mnemonic::Cbz => value == 0,
            Mnemonic::Cbnz => value != 0,
            _ => false,
        };

        taken.then_some(offset)
    }

    fn single_data_transfer(&mut self, mnemonic: Mnemonic, rt: u8, rn: u8, offset: u16) {
        let address = self
            .registers
            .register_at(rn)
            .wrapping_add(i64::from(offset) * WORD_SIZE);

        match mnemonic {
            Mnemonic::Stur => {
                let value = self.registers.register_at(rt);
                tracing::debug!("store {value} at {address}");
                self.memory.write_word(address, value);
            }
            Mnemonic::Ldur => {
                let value = self.memory.read_word(address);
                tracing::debug!("load {value} from {address}");
                self.registers.set_register_at(rt, value);
            }
            _ => {}
        }
    }

    /// Fetches, decodes and executes the record at the program counter.
    #[must_use]
    pub fn step(&mut self) -> Step {
        if self.halted {
            return Step::Stopped(Outcome::Halted);
        }

        let instruction = match self.fetch() {
            Ok(instruction) => instruction,
            Err(outcome) => return Step::Stopped(outcome),
        };

        if let Some(Operands::RawData { .. }) = instruction.operands {
            tracing::warn!(
                "control flow reached data at address {}, stopping",
                instruction.address
            );
            return Step::Stopped(Outcome::EnteredData);
        }

        let Some((mnemonic, operands)) = Self::decode(instruction) else {
            tracing::warn!(
                "skipping unclassified instruction at address {}",
                instruction.address
            );
            self.program_counter += 1;
            return Step::Skipped;
        };

        let branch = self.execute(mnemonic, operands);

        // A taken branch moves by `offset - 1`, then every instruction moves by 1.
        if let Some(offset) = branch {
            self.program_counter += i64::from(offset) - 1;
        }
        self.program_counter += 1;

        let entry = TraceEntry {
            cycle: self.cycle,
            address: instruction.address,
            mnemonic,
            operands: operands.disassembler(mnemonic),
        };
        tracing::debug!("{entry}");

        self.cycle += 1;

        Step::Retired(entry)
    }

    /// Runs until the program halts or leaves its code, writing a trace entry with a
    /// full state dump for every retired instruction.
    ///
    /// # Errors
    ///
    /// Fails when `trace` can't be written.
    pub fn run<W: Write>(
        &mut self,
        config: SimConfig,
        trace: &mut W,
    ) -> Result<RunSummary, SimError> {
        let mut retired = 0;

        let outcome = loop {
            if config.max_cycles.is_some_and(|max| retired >= max) {
                tracing::warn!("stopping after {retired} cycles");
                break Outcome::CycleLimit;
            }

            match self.step() {
                Step::Retired(entry) => {
                    retired += 1;
                    writeln!(trace, "{entry}")?;
                    write!(trace, "{}", StateDump::new(&self.registers, &self.memory))?;
                }
                Step::Skipped => {}
                Step::Stopped(outcome) => break outcome,
            }
        };

        trace.flush()?;
        tracing::info!("simulation stopped ({outcome:?}) after {retired} instructions");

        Ok(RunSummary { outcome, retired })
    }

    #[must_use]
    pub fn snapshot(&self, summary: RunSummary) -> Snapshot {
        Snapshot {
            summary,
            registers: self.registers.clone(),
            memory: self.memory.clone(),
        }
    }
}
