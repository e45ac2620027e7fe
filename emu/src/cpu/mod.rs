#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod instruction;

#[allow(clippy::module_name_repetitions)]
pub mod legv8;
pub mod memory;
pub mod opcode;
pub mod program;
pub mod registers;
