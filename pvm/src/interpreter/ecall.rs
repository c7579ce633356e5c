//! Host-call boundary.
//!
//! `ECALLI` suspends the machine and hands control to the attached
//! handler, which owns the opaque invocation context and has full mutable
//! access to the machine state. The handler decides whether execution
//! proceeds (the executor then steps past the `ECALLI`) or terminates
//! with the returned state.

use super::Interpreter;
use crate::state::ExecuteState;
use crate::trace::TraceSink;

use pvm_asm::Word;

/// Handler for `ECALLI` instructions.
///
/// The implementing type is stored inside the interpreter and doubles as
/// the caller-owned context: mutate it freely from [`Self::ecall`] and
/// recover it with [`Interpreter::into_parts`] after the invocation.
pub trait EcallHandler: Sized {
    /// Handle the host call `id`.
    ///
    /// Returning [`ExecuteState::Proceed`] resumes execution after the
    /// `ECALLI`; any other state terminates the invocation without
    /// consuming another instruction.
    fn ecall<Tr: TraceSink>(vm: &mut Interpreter<Self, Tr>, id: Word) -> ExecuteState;
}

/// Default handler for programs that must not reach the host: every
/// `ECALLI` panics the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoHost;

impl EcallHandler for NoHost {
    fn ecall<Tr: TraceSink>(_vm: &mut Interpreter<Self, Tr>, _id: Word) -> ExecuteState {
        ExecuteState::Panic
    }
}
