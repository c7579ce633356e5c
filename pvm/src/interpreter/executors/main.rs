use crate::consts::{REG_A0, REG_A1};
use crate::interpreter::ecall::EcallHandler;
use crate::interpreter::initialization::initialize_program;
use crate::interpreter::Interpreter;
use crate::state::{ExecuteState, ProgramState};
use crate::trace::{HostCallRecord, NullTracer, TraceSink};

use pvm_asm::Word;

impl<Ecal, Tr> Interpreter<Ecal, Tr>
where
    Ecal: EcallHandler,
    Tr: TraceSink,
{
    /// Run until a terminal state.
    ///
    /// Host calls are resolved in place: the handler runs synchronously,
    /// and only when it proceeds is the `ECALLI` stepped past. This
    /// ordering lets a handler abort without consuming one more
    /// instruction.
    pub fn run(&mut self) -> ExecuteState {
        loop {
            match self.step() {
                ExecuteState::Proceed => continue,
                ExecuteState::HostCall(id) => {
                    let gas_before = self.gas();
                    let outcome = Ecal::ecall(self, id);

                    let record = HostCallRecord {
                        host_id: id,
                        gas_before,
                        gas_after: self.gas(),
                        service: None,
                    };
                    self.tracer_mut().record_host_call(&record);

                    match outcome {
                        ExecuteState::Proceed => {
                            self.inc_pc();
                        }
                        terminal => return terminal,
                    }
                }
                terminal => return terminal,
            }
        }
    }
}

/// Marshalled invocation with an attached trace sink.
///
/// Runs program initialisation over `blob` and `args`, executes from
/// `initial_pc` under `gas_limit`, and extracts the result window from
/// the argument segment on a clean halt. Initialisation failures cost no
/// gas and return the handler state untouched.
pub fn invoke_traced<Ecal, Tr>(
    blob: &[u8],
    initial_pc: Word,
    gas_limit: Word,
    args: &[u8],
    ecal_state: Ecal,
    tracer: Tr,
) -> (Word, ProgramState, Ecal, Tr)
where
    Ecal: EcallHandler,
    Tr: TraceSink,
{
    let init = match initialize_program(blob, args) {
        Ok(init) => init,
        Err(error) => {
            tracing::debug!(%error, "program initialisation failed");
            return (0, ProgramState::Panicked, ecal_state, tracer);
        }
    };

    let mut vm = Interpreter::from_parts(init, ecal_state, tracer);
    vm.set_pc(initial_pc);
    vm.set_gas(i64::try_from(gas_limit).unwrap_or(i64::MAX));

    let terminal = vm.run();
    let gas_consumed = gas_limit.saturating_sub(vm.gas().max(0) as Word);
    tracing::debug!(?terminal, gas_consumed, "invocation finished");

    let state = match terminal {
        ExecuteState::Halt => {
            let start = vm.registers()[REG_A0];
            let len = vm.registers()[REG_A1];
            match vm.memory().read_octets(start, len) {
                Ok(output) => ProgramState::Halted(output),
                Err(_) => ProgramState::Halted(Vec::new()),
            }
        }
        ExecuteState::OutOfGas => ProgramState::OutOfGas,
        ExecuteState::Fault(address) => ProgramState::Faulted(address),
        ExecuteState::Panic | ExecuteState::HostCall(_) | ExecuteState::Proceed => {
            ProgramState::Panicked
        }
    };

    let (ecal_state, tracer) = vm.into_parts();
    (gas_consumed, state, ecal_state, tracer)
}

/// Marshalled invocation without tracing.
pub fn invoke<Ecal>(
    blob: &[u8],
    initial_pc: Word,
    gas_limit: Word,
    args: &[u8],
    ecal_state: Ecal,
) -> (Word, ProgramState, Ecal)
where
    Ecal: EcallHandler,
{
    let (gas_consumed, state, ecal_state, _) =
        invoke_traced(blob, initial_pc, gas_limit, args, ecal_state, NullTracer);
    (gas_consumed, state, ecal_state)
}
