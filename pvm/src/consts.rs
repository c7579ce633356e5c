//! VM parameters

/* REGISTER FILE */

/// Register count of the machine.
pub const VM_REGISTER_COUNT: usize = 13;

/// Return-address register. Program initialisation loads the halt
/// sentinel here so that a conventional `ret` leaves the machine.
pub const REG_RA: usize = 0;

/// Stack-pointer register. Program initialisation loads the exclusive
/// end of the stack segment here.
pub const REG_SP: usize = 1;

/// First argument register; holds the start of the argument segment.
pub const REG_A0: usize = 7;

/// Second argument register; holds the argument data length.
pub const REG_A1: usize = 8;

/* MEMORY GEOMETRY */

/// Size of one memory page, in octets.
pub const PAGE_SIZE: u64 = 4096;

/// Size of one layout zone, in octets.
pub const ZONE_SIZE: u64 = 65536;

/// The first addresses of the space are never accessible.
pub const RESERVED_MEMORY_START: u64 = 65536;

/// Total size of the address space, in octets.
pub const ADDRESS_SPACE_SIZE: u64 = 1 << 32;

/// Highest addressable octet.
pub const MAX_MEMORY_ADDRESS: u64 = ADDRESS_SPACE_SIZE - 1;

/// Jumping here through `JUMP_IND` halts the machine.
pub const HALT_ADDRESS: u64 = ADDRESS_SPACE_SIZE - ZONE_SIZE;

/// Size of the argument/output segment installed by program
/// initialisation.
pub const INIT_INPUT_SIZE: u64 = 1 << 24;

/// Number of pages in the address space.
pub const PAGE_COUNT: usize = (ADDRESS_SPACE_SIZE / PAGE_SIZE) as usize;

/* INSTRUCTION STREAM */

/// Upper bound on the operand-stream length of one instruction.
pub const MAX_INSTRUCTION_SKIP: usize = 24;

/// Number of reserved zones preceding the read-only segment.
pub const LAYOUT_RESERVED_ZONES: u64 = 5;
