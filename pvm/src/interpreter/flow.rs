use super::Interpreter;
use crate::consts::HALT_ADDRESS;
use crate::state::ExecuteState;

use pvm_asm::Word;

impl<Ecal, Tr> Interpreter<Ecal, Tr> {
    /// Relative jump. The target need not be an instruction boundary
    /// here; a bad target panics on the next fetch.
    pub(crate) fn jump(&mut self, offset: Word) -> ExecuteState {
        self.pc = self.pc.wrapping_add(offset);
        ExecuteState::Proceed
    }

    pub(crate) fn branch(&mut self, condition: bool, offset: Word) -> ExecuteState {
        if condition {
            self.jump(offset)
        } else {
            self.inc_pc()
        }
    }

    /// Dynamic jump through the jump table.
    ///
    /// The halt sentinel is recognised first; only then is the target
    /// checked for table validity.
    pub(crate) fn jump_ind(&mut self, target: Word) -> ExecuteState {
        let a = target & 0xffff_ffff;

        if a == HALT_ADDRESS {
            return ExecuteState::Halt;
        }

        let table = self.program.jump_table();
        if a == 0 || a > 2 * table.len() as Word || a % 2 != 0 {
            return ExecuteState::Panic;
        }

        self.pc = Word::from(table[(a / 2 - 1) as usize]);
        ExecuteState::Proceed
    }
}
