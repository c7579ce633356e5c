use super::Interpreter;
use crate::state::ExecuteState;

use pvm_asm::Word;

impl<Ecal, Tr> Interpreter<Ecal, Tr> {
    /// Advance the program counter past the current instruction and its
    /// operand stream.
    ///
    /// Handlers that redirect control flow write `pc` directly instead.
    pub(crate) fn inc_pc(&mut self) -> ExecuteState {
        self.pc = self.pc.wrapping_add(1 + self.skip as Word);
        ExecuteState::Proceed
    }
}
