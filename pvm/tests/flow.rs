use pvm::prelude::*;
use pvm::util::ProgramBuilder;

fn machine(builder: &ProgramBuilder) -> Interpreter {
    let mut vm = Interpreter::initialize(&builder.image(), &[], NoHost, NullTracer)
        .expect("failed to initialize test program");
    vm.set_gas(1_000);
    vm
}

#[test]
fn a_taken_branch_skips_the_fallthrough_path() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(2, 5);
    // At pc 6: r2 == 5, skip the next load_imm (11 + 6 octets).
    builder.branch_imm(Opcode::BranchEqImm, 2, 5, 11 + 6);
    builder.load_imm(3, 1);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[3], 0, "the skipped load must not run");
}

#[test]
fn an_untaken_branch_falls_through() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(2, 5);
    builder.branch_imm(Opcode::BranchNeImm, 2, 5, 100);
    builder.load_imm(3, 1);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[3], 1);
}

#[test]
fn register_branches_compare_both_signednesses() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(2, -1);
    builder.load_imm(3, 1);
    // Unsigned: −1 is max, so r2 < r3 is false and this falls through.
    builder.branch(Opcode::BranchLtU, 2, 3, 100);
    // Signed: −1 < 1, taken; skip the marker load (6 + 6 octets).
    builder.branch(Opcode::BranchLtS, 2, 3, 6 + 6);
    builder.load_imm(4, 1);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[4], 0);
}

#[test]
fn a_backward_jump_forms_a_loop() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(2, 3); // counter
    let top = builder.here() as i32;
    builder.alu_imm(Opcode::AddImm64, 3, 3, 1); // iterations
    builder.alu_imm(Opcode::AddImm64, 2, 2, -1);
    // At pc top + 12: loop while r2 != 0.
    builder.branch_imm(Opcode::BranchNeImm, 2, 0, top - (top + 12));
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[3], 3);
    assert_eq!(vm.registers()[2], 0);
}

#[test]
fn jumping_into_an_operand_stream_panics() {
    let mut builder = ProgramBuilder::new();
    // Lands in the middle of the load_imm at offset 5.
    builder.jump(5 + 2);
    builder.load_imm(2, 7);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[2], 0);
}

#[test]
fn jumping_past_the_code_end_panics() {
    let mut builder = ProgramBuilder::new();
    builder.jump(1000);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
}

#[test]
fn dynamic_jumps_resolve_through_the_jump_table() {
    let mut builder = ProgramBuilder::new();
    // Entry points at the load_imm after the jump_ind (offset 12).
    let target = builder.register_jump_target(12);
    builder.load_imm(2, target as i32);
    builder.jump_ind(2, 0);
    builder.load_imm(3, 9);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[3], 9);
}

#[test]
fn the_halt_sentinel_halts_through_the_return_register() {
    let mut builder = ProgramBuilder::new();
    // r0 holds the halt sentinel after initialisation.
    builder.jump_ind(0, 0);

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Halt);
}

#[test]
fn invalid_dynamic_targets_panic() {
    for (value, offset) in [(0i32, 0i32), (1, 0), (4, 0), (0, 3)] {
        let mut builder = ProgramBuilder::new();
        let _entry = builder.register_jump_target(0);
        builder.load_imm(2, value);
        builder.jump_ind(2, offset);

        let mut vm = machine(&builder);
        // Zero, odd, and beyond-the-table targets are all rejected.
        assert_eq!(vm.run(), ExecuteState::Panic, "target {value}+{offset}");
    }
}

#[test]
fn load_imm_jump_writes_before_jumping() {
    let mut builder = ProgramBuilder::new();
    // Skip the marker load: this instruction is 11 octets, the marker 6.
    builder.load_imm_jump(2, 77, 11 + 6);
    builder.load_imm(3, 1);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[2], 77);
    assert_eq!(vm.registers()[3], 0);
}

#[test]
fn load_imm_jump_ind_reads_the_base_before_overwriting() {
    let mut builder = ProgramBuilder::new();
    // Target the trailing trap, past the marker load.
    let target = builder.register_jump_target(6 + 11 + 6);
    builder.load_imm(2, target as i32);
    // Destination and base are the same register.
    let mut ops = vec![0x02 | (2 << 4), 4u8];
    ops.extend_from_slice(&99i32.to_le_bytes());
    ops.extend_from_slice(&0i32.to_le_bytes());
    builder.instr(Opcode::LoadImmJumpInd, &ops);
    builder.load_imm(3, 1);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    // The jump resolved through the old value; the register now holds
    // the loaded immediate.
    assert_eq!(vm.registers()[2], 99);
    assert_eq!(vm.registers()[3], 0);
}
