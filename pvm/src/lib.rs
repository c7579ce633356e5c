//! PVM implementation
//!
//! A deterministic, gas-metered, page-protected bytecode virtual machine.
//! The interpreter executes programs decoded from a preimage of code,
//! opcode bitmask, and jump table; memory is paged with per-page access
//! rights; every invocation is bounded by gas and terminates in one of a
//! small, closed set of states.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod consts;
pub mod error;
pub mod interpreter;
pub mod program;
pub mod state;
pub mod trace;
pub mod transactor;

#[cfg(any(test, feature = "test-helpers"))]
pub mod util;

// Fully re-export the instruction-set crate
#[doc(no_inline)]
pub use pvm_asm;

pub mod prelude {
    //! Required implementations for full functionality

    #[doc(no_inline)]
    pub use pvm_asm::{Opcode, RegId, Word};

    pub use crate::consts::*;
    pub use crate::error::{InitError, ProgramError};
    pub use crate::interpreter::{
        invoke, invoke_traced, AccessMode, EcallHandler, Fault, Interpreter, MemoryLayout, NoHost,
        VmMemory,
    };
    pub use crate::program::{Program, ProgramImage};
    pub use crate::state::{ExecuteState, ProgramState};
    pub use crate::trace::{
        HostCallRecord, NullTracer, RecordingTracer, TraceEvent, TraceRecord, TraceSink,
    };
    pub use crate::transactor::Transactor;
}
