use pvm::prelude::*;
use pvm::util::ProgramBuilder;

const RO_BASE: u32 = (LAYOUT_RESERVED_ZONES * ZONE_SIZE) as u32;

fn machine_with_args(builder: &ProgramBuilder, args: &[u8]) -> Interpreter {
    let mut vm = Interpreter::initialize(&builder.image(), args, NoHost, NullTracer)
        .expect("failed to initialize test program");
    vm.set_gas(1_000);
    vm
}

fn machine(builder: &ProgramBuilder) -> Interpreter {
    machine_with_args(builder, &[])
}

#[test]
fn accessing_the_reserved_region_faults() {
    let mut builder = ProgramBuilder::new();
    builder.load(Opcode::LoadU8, 2, 0x10);
    builder.trap();

    let mut vm = machine(&builder);
    vm.set_gas(10);

    assert_eq!(vm.run(), ExecuteState::Fault(0x10));
    assert_eq!(vm.registers()[2], 0, "faulting loads leave the register");
    assert_eq!(vm.gas(), 9, "the faulting instruction is still charged");
}

#[test]
fn stores_read_back_through_the_read_write_segment() {
    let mut builder = ProgramBuilder::new();
    builder.rw_data(vec![0; 8]);
    builder.load_imm(2, 0x1234_5678);
    builder.load_imm(3, RO_BASE as i32); // rw base: no ro data present
    builder.store_ind(Opcode::StoreIndU32, 2, 3, 0);
    builder.load_ind(Opcode::LoadIndU32, 4, 3, 0);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[4], 0x1234_5678);
}

#[test]
fn the_read_only_segment_refuses_stores() {
    let mut builder = ProgramBuilder::new();
    builder.ro_data(vec![1, 2, 3]);
    builder.load(Opcode::LoadU8, 4, RO_BASE);
    builder.store(Opcode::StoreU8, 4, RO_BASE);

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Fault(RO_BASE));
    assert_eq!(vm.registers()[4], 1, "the preceding load saw the data");
}

#[test]
fn loads_extend_according_to_their_signedness() {
    let mut builder = ProgramBuilder::new();
    builder.rw_data(vec![0; 8]);
    builder.store_imm(Opcode::StoreImmU32, RO_BASE, 0xdead_beefu32 as i32);
    builder.load(Opcode::LoadI32, 2, RO_BASE);
    builder.load(Opcode::LoadU32, 3, RO_BASE);
    builder.load(Opcode::LoadU16, 4, RO_BASE);
    builder.load(Opcode::LoadI8, 5, RO_BASE);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[2], 0xffff_ffff_dead_beef);
    assert_eq!(vm.registers()[3], 0xdead_beef);
    assert_eq!(vm.registers()[4], 0xbeef);
    assert_eq!(vm.registers()[5], 0xffff_ffff_ffff_ffef);
}

#[test]
fn multi_octet_slots_are_little_endian() {
    let mut builder = ProgramBuilder::new();
    builder.rw_data(vec![0; 8]);
    builder.store_imm(Opcode::StoreImmU32, RO_BASE, 0x0102_0304);
    builder.load(Opcode::LoadU8, 2, RO_BASE);
    builder.load(Opcode::LoadU8, 3, RO_BASE + 3);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[2], 0x04);
    assert_eq!(vm.registers()[3], 0x01);
}

#[test]
fn the_stack_segment_is_writable_below_the_stack_pointer() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(2, 0x77);
    // r1 holds the exclusive stack end after initialisation.
    builder.store_ind(Opcode::StoreIndU64, 2, 1, -8);
    builder.load_ind(Opcode::LoadIndU64, 3, 1, -8);
    builder.trap();

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[3], 0x77);
}

#[test]
fn the_argument_segment_is_readable() {
    let mut builder = ProgramBuilder::new();
    // r7 holds the argument base after initialisation.
    builder.load_ind(Opcode::LoadIndU8, 2, 7, 1);
    builder.store_ind(Opcode::StoreIndU8, 2, 7, 1);

    let mut vm = machine_with_args(&builder, &[7, 8, 9]);
    let args_base = (ADDRESS_SPACE_SIZE - ZONE_SIZE - INIT_INPUT_SIZE) as u32;

    assert_eq!(vm.run(), ExecuteState::Fault(args_base + 1));
    assert_eq!(vm.registers()[2], 8, "the load saw the argument data");
}

#[test]
fn sbrk_grows_the_heap_page_by_page() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(3, 100);
    builder.two_reg(Opcode::Sbrk, 2, 3); // grow by 100
    builder.two_reg(Opcode::Sbrk, 4, 5); // r5 = 0: query the break
    builder.load_imm(6, 0x55);
    builder.store_ind(Opcode::StoreIndU8, 6, 2, -1);
    builder.trap();

    let mut vm = machine(&builder);
    let heap_base = u64::from(RO_BASE); // empty segments: heap starts at the rw base

    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[2], heap_base + 100);
    assert_eq!(vm.registers()[4], heap_base + 100);
    assert_eq!(vm.memory().heap_pointer(), heap_base + 100);
    assert_eq!(
        vm.memory().access_mode((heap_base / PAGE_SIZE) as u32),
        AccessMode::Write
    );
    // The octet below the break was just stored.
    assert_eq!(
        vm.memory().read_octets(heap_base + 99, 1).unwrap(),
        vec![0x55]
    );
    // The page past the allocation is still unmapped.
    assert_eq!(
        vm.memory().access_mode((heap_base / PAGE_SIZE) as u32 + 1),
        AccessMode::None
    );
}

#[test]
fn sbrk_past_the_address_space_reports_zero() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm_64(3, u64::MAX / 2);
    builder.two_reg(Opcode::Sbrk, 2, 3);
    builder.trap();

    let mut vm = machine(&builder);
    let heap_before = u64::from(RO_BASE);

    assert_eq!(vm.run(), ExecuteState::Panic);
    assert_eq!(vm.registers()[2], 0);
    assert_eq!(vm.memory().heap_pointer(), heap_before);
}

#[test]
fn stores_past_the_heap_break_fault() {
    let mut builder = ProgramBuilder::new();
    builder.load_imm(3, 100);
    builder.two_reg(Opcode::Sbrk, 2, 3);
    // One page was allocated; the next one was not.
    builder.load_imm(4, (RO_BASE + PAGE_SIZE as u32) as i32);
    builder.load_imm(5, 1);
    builder.store_ind(Opcode::StoreIndU8, 5, 4, 0);

    let mut vm = machine(&builder);
    assert_eq!(vm.run(), ExecuteState::Fault(RO_BASE + PAGE_SIZE as u32));
}
