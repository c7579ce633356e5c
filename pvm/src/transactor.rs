//! Builder pattern for program invocations

use crate::interpreter::{invoke_traced, EcallHandler, NoHost};
use crate::state::ProgramState;
use crate::trace::{NullTracer, TraceSink};

use pvm_asm::Word;

#[derive(Debug, Clone)]
/// Owns a host-call handler and a trace sink across invocations, keeping
/// the outcome of the most recent one.
pub struct Transactor<Ecal = NoHost, Tr = NullTracer> {
    initial_pc: Word,
    gas_limit: Word,
    ecal_state: Ecal,
    tracer: Tr,
    outcome: Option<(Word, ProgramState)>,
}

impl Transactor {
    /// Transactor without host calls or tracing.
    pub fn new() -> Self {
        Self::with_parts(NoHost, NullTracer)
    }
}

impl Default for Transactor {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ecal, Tr> Transactor<Ecal, Tr> {
    /// Transactor with the given handler state and trace sink.
    pub fn with_parts(ecal_state: Ecal, tracer: Tr) -> Self {
        Self {
            initial_pc: 0,
            gas_limit: 0,
            ecal_state,
            tracer,
            outcome: None,
        }
    }

    /// Entry point for the next invocation.
    pub fn initial_pc(mut self, pc: Word) -> Self {
        self.initial_pc = pc;
        self
    }

    /// Gas limit for the next invocation.
    pub fn gas_limit(mut self, gas: Word) -> Self {
        self.gas_limit = gas;
        self
    }

    /// Outcome of the most recent invocation.
    pub const fn state(&self) -> Option<&ProgramState> {
        match &self.outcome {
            Some((_, state)) => Some(state),
            None => None,
        }
    }

    /// Gas consumed by the most recent invocation.
    pub const fn gas_consumed(&self) -> Option<Word> {
        match &self.outcome {
            Some((gas, _)) => Some(*gas),
            None => None,
        }
    }

    /// Whether the most recent invocation halted cleanly.
    pub fn is_success(&self) -> bool {
        matches!(self.state(), Some(ProgramState::Halted(_)))
    }

    /// Host-call handler state.
    pub const fn ecal_state(&self) -> &Ecal {
        &self.ecal_state
    }

    /// The attached trace sink.
    pub const fn tracer(&self) -> &Tr {
        &self.tracer
    }

    /// Dismantle into handler state and trace sink.
    pub fn into_parts(self) -> (Ecal, Tr) {
        (self.ecal_state, self.tracer)
    }
}

impl<Ecal, Tr> Transactor<Ecal, Tr>
where
    Ecal: EcallHandler,
    Tr: TraceSink,
{
    /// Run one marshalled invocation, keeping its outcome.
    pub fn transact(mut self, blob: &[u8], args: &[u8]) -> Self {
        let (gas_consumed, state, ecal_state, tracer) = invoke_traced(
            blob,
            self.initial_pc,
            self.gas_limit,
            args,
            self.ecal_state,
            self.tracer,
        );

        self.ecal_state = ecal_state;
        self.tracer = tracer;
        self.outcome = Some((gas_consumed, state));
        self
    }
}
