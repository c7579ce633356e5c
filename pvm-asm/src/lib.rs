//! Atomic instruction-set types for the PVM.
//!
//! This crate holds everything the interpreter needs to know about the
//! instruction encoding without knowing anything about execution: the opcode
//! table, register identifiers, and the operand-family decoders for the
//! variable-length operand streams.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

mod args;
mod opcode;
mod reg;

pub use args::{
    imm_len, one_imm, one_reg_one_imm, one_reg_one_imm_wide, one_reg_two_imm, sign_extend,
    three_reg, two_imm, two_reg, two_reg_one_imm, two_reg_two_imm,
};
pub use opcode::{InvalidOpcode, Opcode, OperandFamily};
pub use reg::RegId;

/// Register width of the virtual machine.
pub type Word = u64;
