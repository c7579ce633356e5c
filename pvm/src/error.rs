//! Decode and initialisation error implementation
//!
//! Instruction handlers never construct these: everything that can go
//! wrong during execution is reported through
//! [`ExecuteState`](crate::state::ExecuteState). The error types below
//! cover the two fallible edges of the machine, program decoding and
//! program initialisation, and collapse to `PANIC` at the invocation
//! boundary.

use thiserror::Error;

/// Failure to decode a program preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// A declared section runs past the end of the preimage.
    #[error("program preimage ended before the declared sections")]
    UnexpectedEnd,
    /// The jump-table element size is not representable.
    #[error("jump table element size {0} is outside 1..=4")]
    InvalidElementSize(u8),
    /// A length prefix does not fit the 32-bit code address space.
    #[error("declared length does not fit in 32 bits")]
    LengthOverflow,
    /// The bitmask section is shorter than one bit per code octet.
    #[error("opcode bitmask is shorter than the code section")]
    BitmaskTooShort,
    /// A variable-length integer is unterminated or oversized.
    #[error("malformed variable-length integer")]
    MalformedVarint,
}

/// Failure of program initialisation, before the first instruction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    /// The requested segment layout does not fit the address space.
    #[error("memory layout does not fit the 32-bit address space")]
    AddressSpaceOverflow,
    /// More argument data than the input segment can hold.
    #[error("argument data of {0} octets exceeds the input segment")]
    ArgumentsTooLong(usize),
    /// The embedded program preimage is malformed.
    #[error(transparent)]
    Program(#[from] ProgramError),
}
