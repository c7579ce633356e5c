use crate::consts::MAX_INSTRUCTION_SKIP;
use crate::interpreter::alu::{
    div_s32, div_s64, div_u32, div_u64, mul_upper_ss, mul_upper_su, mul_upper_uu, rem_s32,
    rem_s64, rem_u32, rem_u64,
};
use crate::interpreter::Interpreter;
use crate::state::ExecuteState;
use crate::trace::{TraceRecord, TraceSink};

use pvm_asm::{
    one_imm, one_reg_one_imm, one_reg_one_imm_wide, one_reg_two_imm, three_reg, two_imm, two_reg,
    two_reg_one_imm, two_reg_two_imm, Opcode, Word,
};

impl<Ecal, Tr> Interpreter<Ecal, Tr>
where
    Tr: TraceSink,
{
    /// Execute a single instruction.
    ///
    /// Order is load-bearing: the gas precondition is checked before the
    /// fetch, the fetch checks before the charge, and the charge before
    /// the handler. A handler can therefore observe a negative counter
    /// only through its own accounting, never through the dispatcher.
    pub fn step(&mut self) -> ExecuteState {
        if self.gas <= 0 {
            return ExecuteState::OutOfGas;
        }

        let index = self.pc as u32 as usize;
        if index >= self.program.code().len() || !self.program.is_instruction_start(index) {
            return ExecuteState::Panic;
        }

        let byte = self.program.code()[index];
        self.skip = self.program.skip(index);

        let mut operands = [0u8; MAX_INSTRUCTION_SKIP];
        operands[..self.skip].copy_from_slice(self.program.operands(index));

        self.gas -= 1;
        self.memory.clear_op_records();

        let pc_before = self.pc as u32;
        let (name, state) = match Opcode::try_from(byte) {
            Ok(op) => {
                tracing::trace!(pc = pc_before, mnemonic = op.mnemonic(), "instruction");
                (op.mnemonic(), self.dispatch(op, &operands[..self.skip]))
            }
            Err(_) => ("invalid", ExecuteState::Panic),
        };

        let (load_addr, load_value) = self.memory.last_load().unwrap_or((0, 0));
        let (store_addr, store_value) = self.memory.last_store().unwrap_or((0, 0));
        let record = TraceRecord {
            step: self.steps,
            pc: pc_before,
            name,
            opcode: byte,
            gas_after: self.gas,
            registers: self.registers,
            load_addr,
            load_value,
            store_addr,
            store_value,
        };
        self.steps += 1;
        self.tracer.record(&record);

        state
    }

    fn dispatch(&mut self, op: Opcode, ops: &[u8]) -> ExecuteState {
        match op {
            Opcode::Trap => ExecuteState::Panic,
            Opcode::Fallthrough => self.inc_pc(),

            Opcode::Ecalli => ExecuteState::HostCall(one_imm(ops)),

            Opcode::LoadImm64 => {
                let (rd, imm) = one_reg_one_imm_wide(ops);
                self.set(rd, imm)
            }

            Opcode::StoreImmU8 => {
                let (addr, value) = two_imm(ops);
                self.store_int::<1>(addr, value)
            }
            Opcode::StoreImmU16 => {
                let (addr, value) = two_imm(ops);
                self.store_int::<2>(addr, value)
            }
            Opcode::StoreImmU32 => {
                let (addr, value) = two_imm(ops);
                self.store_int::<4>(addr, value)
            }
            Opcode::StoreImmU64 => {
                let (addr, value) = two_imm(ops);
                self.store_int::<8>(addr, value)
            }

            Opcode::Jump => self.jump(one_imm(ops)),

            Opcode::JumpInd => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.jump_ind(self.reg(ra).wrapping_add(imm))
            }
            Opcode::LoadImm => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.set(ra, imm)
            }
            Opcode::LoadU8 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<1>(ra, imm, false)
            }
            Opcode::LoadI8 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<1>(ra, imm, true)
            }
            Opcode::LoadU16 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<2>(ra, imm, false)
            }
            Opcode::LoadI16 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<2>(ra, imm, true)
            }
            Opcode::LoadU32 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<4>(ra, imm, false)
            }
            Opcode::LoadI32 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<4>(ra, imm, true)
            }
            Opcode::LoadU64 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.load_int::<8>(ra, imm, false)
            }
            Opcode::StoreU8 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.store_int::<1>(imm, self.reg(ra))
            }
            Opcode::StoreU16 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.store_int::<2>(imm, self.reg(ra))
            }
            Opcode::StoreU32 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.store_int::<4>(imm, self.reg(ra))
            }
            Opcode::StoreU64 => {
                let (ra, imm) = one_reg_one_imm(ops);
                self.store_int::<8>(imm, self.reg(ra))
            }

            Opcode::StoreImmIndU8 => {
                let (ra, offset, value) = one_reg_two_imm(ops);
                self.store_int::<1>(self.reg(ra).wrapping_add(offset), value)
            }
            Opcode::StoreImmIndU16 => {
                let (ra, offset, value) = one_reg_two_imm(ops);
                self.store_int::<2>(self.reg(ra).wrapping_add(offset), value)
            }
            Opcode::StoreImmIndU32 => {
                let (ra, offset, value) = one_reg_two_imm(ops);
                self.store_int::<4>(self.reg(ra).wrapping_add(offset), value)
            }
            Opcode::StoreImmIndU64 => {
                let (ra, offset, value) = one_reg_two_imm(ops);
                self.store_int::<8>(self.reg(ra).wrapping_add(offset), value)
            }

            Opcode::LoadImmJump => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.registers[ra.to_usize()] = value;
                self.jump(offset)
            }
            Opcode::BranchEqImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) == value, offset)
            }
            Opcode::BranchNeImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) != value, offset)
            }
            Opcode::BranchLtUImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) < value, offset)
            }
            Opcode::BranchLeUImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) <= value, offset)
            }
            Opcode::BranchGeUImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) >= value, offset)
            }
            Opcode::BranchGtUImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) > value, offset)
            }
            Opcode::BranchLtSImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch((self.reg(ra) as i64) < value as i64, offset)
            }
            Opcode::BranchLeSImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) as i64 <= value as i64, offset)
            }
            Opcode::BranchGeSImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) as i64 >= value as i64, offset)
            }
            Opcode::BranchGtSImm => {
                let (ra, value, offset) = one_reg_two_imm(ops);
                self.branch(self.reg(ra) as i64 > value as i64, offset)
            }

            Opcode::MoveReg => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, self.reg(ra))
            }
            Opcode::Sbrk => {
                let (rd, ra) = two_reg(ops);
                self.sbrk(rd, ra)
            }
            Opcode::CountSetBits64 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, Word::from(self.reg(ra).count_ones()))
            }
            Opcode::CountSetBits32 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, Word::from((self.reg(ra) as u32).count_ones()))
            }
            Opcode::LeadingZeroBits64 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, Word::from(self.reg(ra).leading_zeros()))
            }
            Opcode::LeadingZeroBits32 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, Word::from((self.reg(ra) as u32).leading_zeros()))
            }
            Opcode::TrailingZeroBits64 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, Word::from(self.reg(ra).trailing_zeros()))
            }
            Opcode::TrailingZeroBits32 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, Word::from((self.reg(ra) as u32).trailing_zeros()))
            }
            Opcode::SignExtend8 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, self.reg(ra) as u8 as i8 as i64 as u64)
            }
            Opcode::SignExtend16 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, self.reg(ra) as u16 as i16 as i64 as u64)
            }
            Opcode::ZeroExtend16 => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, self.reg(ra) & 0xffff)
            }
            Opcode::ReverseBytes => {
                let (rd, ra) = two_reg(ops);
                self.set(rd, self.reg(ra).swap_bytes())
            }

            Opcode::BranchEq => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.branch(self.reg(rd) == self.reg(ra), offset)
            }
            Opcode::BranchNe => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.branch(self.reg(rd) != self.reg(ra), offset)
            }
            Opcode::BranchLtU => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.branch(self.reg(rd) < self.reg(ra), offset)
            }
            Opcode::BranchLtS => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.branch((self.reg(rd) as i64) < self.reg(ra) as i64, offset)
            }
            Opcode::BranchGeU => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.branch(self.reg(rd) >= self.reg(ra), offset)
            }
            Opcode::BranchGeS => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.branch(self.reg(rd) as i64 >= self.reg(ra) as i64, offset)
            }

            Opcode::LoadImmJumpInd => {
                let (rd, ra, value, offset) = two_reg_two_imm(ops);
                // The base register is read before the destination is
                // overwritten; the two may alias.
                let base = self.reg(ra);
                self.registers[rd.to_usize()] = value;
                self.jump_ind(base.wrapping_add(offset))
            }

            Opcode::StoreIndU8 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.store_int::<1>(self.reg(ra).wrapping_add(offset), self.reg(rd))
            }
            Opcode::StoreIndU16 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.store_int::<2>(self.reg(ra).wrapping_add(offset), self.reg(rd))
            }
            Opcode::StoreIndU32 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.store_int::<4>(self.reg(ra).wrapping_add(offset), self.reg(rd))
            }
            Opcode::StoreIndU64 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.store_int::<8>(self.reg(ra).wrapping_add(offset), self.reg(rd))
            }
            Opcode::LoadIndU8 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<1>(rd, self.reg(ra).wrapping_add(offset), false)
            }
            Opcode::LoadIndI8 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<1>(rd, self.reg(ra).wrapping_add(offset), true)
            }
            Opcode::LoadIndU16 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<2>(rd, self.reg(ra).wrapping_add(offset), false)
            }
            Opcode::LoadIndI16 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<2>(rd, self.reg(ra).wrapping_add(offset), true)
            }
            Opcode::LoadIndU32 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<4>(rd, self.reg(ra).wrapping_add(offset), false)
            }
            Opcode::LoadIndI32 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<4>(rd, self.reg(ra).wrapping_add(offset), true)
            }
            Opcode::LoadIndU64 => {
                let (rd, ra, offset) = two_reg_one_imm(ops);
                self.load_int::<8>(rd, self.reg(ra).wrapping_add(offset), false)
            }

            Opcode::Add32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_add(self.reg(rb) as u32))
            }
            Opcode::Sub32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_sub(self.reg(rb) as u32))
            }
            Opcode::Mul32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_mul(self.reg(rb) as u32))
            }
            Opcode::DivU32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, div_u32(self.reg(ra) as u32, self.reg(rb) as u32))
            }
            Opcode::DivS32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, div_s32(self.reg(ra) as i32, self.reg(rb) as i32) as u32)
            }
            Opcode::RemU32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, rem_u32(self.reg(ra) as u32, self.reg(rb) as u32))
            }
            Opcode::RemS32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, rem_s32(self.reg(ra) as i32, self.reg(rb) as i32) as u32)
            }
            Opcode::ShloL32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_shl(self.reg(rb) as u32))
            }
            Opcode::ShloR32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_shr(self.reg(rb) as u32))
            }
            Opcode::SharR32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as i32).wrapping_shr(self.reg(rb) as u32) as u32)
            }

            Opcode::Add64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).wrapping_add(self.reg(rb)))
            }
            Opcode::Sub64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).wrapping_sub(self.reg(rb)))
            }
            Opcode::Mul64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).wrapping_mul(self.reg(rb)))
            }
            Opcode::DivU64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, div_u64(self.reg(ra), self.reg(rb)))
            }
            Opcode::DivS64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, div_s64(self.reg(ra) as i64, self.reg(rb) as i64) as u64)
            }
            Opcode::RemU64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, rem_u64(self.reg(ra), self.reg(rb)))
            }
            Opcode::RemS64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, rem_s64(self.reg(ra) as i64, self.reg(rb) as i64) as u64)
            }
            Opcode::ShloL64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).wrapping_shl(self.reg(rb) as u32))
            }
            Opcode::ShloR64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).wrapping_shr(self.reg(rb) as u32))
            }
            Opcode::SharR64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, (self.reg(ra) as i64).wrapping_shr(self.reg(rb) as u32) as u64)
            }

            Opcode::AddImm32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_add(imm as u32))
            }
            Opcode::AddImm64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra).wrapping_add(imm))
            }
            Opcode::AndImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra) & imm)
            }
            Opcode::XorImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra) ^ imm)
            }
            Opcode::OrImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra) | imm)
            }
            Opcode::MulImm32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_mul(imm as u32))
            }
            Opcode::MulImm64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra).wrapping_mul(imm))
            }
            Opcode::SetLtUImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, Word::from(self.reg(ra) < imm))
            }
            Opcode::SetLtSImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, Word::from((self.reg(ra) as i64) < imm as i64))
            }
            Opcode::SetGtUImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, Word::from(self.reg(ra) > imm))
            }
            Opcode::SetGtSImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, Word::from(self.reg(ra) as i64 > imm as i64))
            }
            Opcode::ShloLImm32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_shl(imm as u32))
            }
            Opcode::ShloRImm32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (self.reg(ra) as u32).wrapping_shr(imm as u32))
            }
            Opcode::SharRImm32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (self.reg(ra) as i32).wrapping_shr(imm as u32) as u32)
            }
            Opcode::ShloLImm64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra).wrapping_shl(imm as u32))
            }
            Opcode::ShloRImm64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra).wrapping_shr(imm as u32))
            }
            Opcode::SharRImm64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, (self.reg(ra) as i64).wrapping_shr(imm as u32) as u64)
            }
            Opcode::NegAddImm32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (imm as u32).wrapping_sub(self.reg(ra) as u32))
            }
            Opcode::NegAddImm64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, imm.wrapping_sub(self.reg(ra)))
            }
            Opcode::ShloLImmAlt32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (imm as u32).wrapping_shl(self.reg(ra) as u32))
            }
            Opcode::ShloRImmAlt32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (imm as u32).wrapping_shr(self.reg(ra) as u32))
            }
            Opcode::SharRImmAlt32 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (imm as i32).wrapping_shr(self.reg(ra) as u32) as u32)
            }
            Opcode::ShloLImmAlt64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, imm.wrapping_shl(self.reg(ra) as u32))
            }
            Opcode::ShloRImmAlt64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, imm.wrapping_shr(self.reg(ra) as u32))
            }
            Opcode::SharRImmAlt64 => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, (imm as i64).wrapping_shr(self.reg(ra) as u32) as u64)
            }
            Opcode::RotR32Imm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (self.reg(ra) as u32).rotate_right(imm as u32))
            }
            Opcode::RotR64Imm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, self.reg(ra).rotate_right(imm as u32))
            }
            Opcode::RotR32ImmAlt => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set32(rd, (imm as u32).rotate_right(self.reg(ra) as u32))
            }
            Opcode::RotR64ImmAlt => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                self.set(rd, imm.rotate_right(self.reg(ra) as u32))
            }
            Opcode::CmovIzImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                if self.reg(ra) == 0 {
                    self.registers[rd.to_usize()] = imm;
                }
                self.inc_pc()
            }
            Opcode::CmovNzImm => {
                let (rd, ra, imm) = two_reg_one_imm(ops);
                if self.reg(ra) != 0 {
                    self.registers[rd.to_usize()] = imm;
                }
                self.inc_pc()
            }

            Opcode::And => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra) & self.reg(rb))
            }
            Opcode::Or => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra) | self.reg(rb))
            }
            Opcode::Xor => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra) ^ self.reg(rb))
            }
            Opcode::AndInv => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra) & !self.reg(rb))
            }
            Opcode::OrInv => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra) | !self.reg(rb))
            }
            Opcode::Xnor => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, !(self.reg(ra) ^ self.reg(rb)))
            }
            Opcode::MulUpperSS => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, mul_upper_ss(self.reg(ra), self.reg(rb)))
            }
            Opcode::MulUpperUU => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, mul_upper_uu(self.reg(ra), self.reg(rb)))
            }
            Opcode::MulUpperSU => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, mul_upper_su(self.reg(ra), self.reg(rb)))
            }
            Opcode::SetLtU => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, Word::from(self.reg(ra) < self.reg(rb)))
            }
            Opcode::SetLtS => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, Word::from((self.reg(ra) as i64) < self.reg(rb) as i64))
            }
            Opcode::CmovIz => {
                let (rd, ra, rb) = three_reg(ops);
                if self.reg(rb) == 0 {
                    self.registers[rd.to_usize()] = self.reg(ra);
                }
                self.inc_pc()
            }
            Opcode::CmovNz => {
                let (rd, ra, rb) = three_reg(ops);
                if self.reg(rb) != 0 {
                    self.registers[rd.to_usize()] = self.reg(ra);
                }
                self.inc_pc()
            }
            Opcode::RotL32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).rotate_left(self.reg(rb) as u32))
            }
            Opcode::RotL64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).rotate_left(self.reg(rb) as u32))
            }
            Opcode::RotR32 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set32(rd, (self.reg(ra) as u32).rotate_right(self.reg(rb) as u32))
            }
            Opcode::RotR64 => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).rotate_right(self.reg(rb) as u32))
            }
            Opcode::Max => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, (self.reg(ra) as i64).max(self.reg(rb) as i64) as u64)
            }
            Opcode::MaxU => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).max(self.reg(rb)))
            }
            Opcode::Min => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, (self.reg(ra) as i64).min(self.reg(rb) as i64) as u64)
            }
            Opcode::MinU => {
                let (rd, ra, rb) = three_reg(ops);
                self.set(rd, self.reg(ra).min(self.reg(rb)))
            }
        }
    }
}
