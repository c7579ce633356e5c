//! Program initialisation: decode the image, lay out memory, and seed
//! the register file.

use super::memory::MemoryLayout;
use super::{Interpreter, VmMemory};
use crate::consts::*;
use crate::error::InitError;
use crate::program::{Program, ProgramImage};

use pvm_asm::Word;

/// Machine state produced by program initialisation, before a handler
/// or tracer is attached.
#[derive(Debug, Clone)]
pub(crate) struct Initialized {
    pub program: Program,
    pub memory: VmMemory,
    pub registers: [Word; VM_REGISTER_COUNT],
}

/// Run program initialisation over an image blob and argument data.
pub(crate) fn initialize_program(blob: &[u8], args: &[u8]) -> Result<Initialized, InitError> {
    if args.len() as u64 > INIT_INPUT_SIZE {
        return Err(InitError::ArgumentsTooLong(args.len()));
    }

    let image = ProgramImage::decode(blob)?;

    let layout = MemoryLayout::compute(
        image.ro_data.len() as u64,
        image.rw_data.len() as u64,
        u64::from(image.heap_zero_pages),
        u64::from(image.stack_size),
    )?;

    let mut memory = VmMemory::new();
    memory
        .initialize_layout(&layout, &image.ro_data, &image.rw_data, args)
        .map_err(|_| InitError::AddressSpaceOverflow)?;

    let mut registers = [0; VM_REGISTER_COUNT];
    registers[REG_RA] = HALT_ADDRESS;
    registers[REG_SP] = layout.stack_end;
    registers[REG_A0] = layout.args_base;
    registers[REG_A1] = args.len() as Word;

    Ok(Initialized {
        program: image.program,
        memory,
        registers,
    })
}

impl<Ecal, Tr> Interpreter<Ecal, Tr> {
    /// Initialise a machine from an image blob and argument data.
    ///
    /// The program counter starts at zero and the gas counter at zero;
    /// callers set both before running.
    pub fn initialize(
        blob: &[u8],
        args: &[u8],
        ecal_state: Ecal,
        tracer: Tr,
    ) -> Result<Self, InitError> {
        initialize_program(blob, args).map(|init| Self::from_parts(init, ecal_state, tracer))
    }

    pub(crate) fn from_parts(init: Initialized, ecal_state: Ecal, tracer: Tr) -> Self {
        Self {
            registers: init.registers,
            memory: init.memory,
            program: init.program,
            pc: 0,
            gas: 0,
            skip: 0,
            steps: 0,
            ecal_state,
            tracer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_blob(stack_size: u32) -> Vec<u8> {
        ProgramImage {
            ro_data: vec![0xaa; 10],
            rw_data: vec![0xbb; 20],
            heap_zero_pages: 1,
            stack_size,
            program: Program::new(vec![0x00], vec![0x01], vec![]).unwrap(),
        }
        .to_bytes()
    }

    #[test]
    fn registers_are_seeded_for_the_invocation() {
        let init = initialize_program(&image_blob(4096), &[1, 2, 3]).unwrap();

        assert_eq!(init.registers[REG_RA], HALT_ADDRESS);
        assert_eq!(
            init.registers[REG_SP],
            ADDRESS_SPACE_SIZE - 2 * ZONE_SIZE - INIT_INPUT_SIZE
        );
        assert_eq!(
            init.registers[REG_A0],
            ADDRESS_SPACE_SIZE - ZONE_SIZE - INIT_INPUT_SIZE
        );
        assert_eq!(init.registers[REG_A1], 3);

        for index in [2, 3, 4, 5, 6, 9, 10, 11, 12] {
            assert_eq!(init.registers[index], 0, "r{index} must start clear");
        }
    }

    #[test]
    fn segment_data_is_placed_with_the_right_access() {
        let init = initialize_program(&image_blob(4096), &[9, 8]).unwrap();
        let mut memory = init.memory;

        let ro_base = LAYOUT_RESERVED_ZONES * ZONE_SIZE;
        assert_eq!(memory.read_octets(ro_base, 10).unwrap(), vec![0xaa; 10]);
        // Read-only data cannot be written.
        assert!(memory.write_octets(ro_base, &[0]).is_err());

        let rw_base = ro_base + ZONE_SIZE;
        assert_eq!(memory.read_octets(rw_base, 20).unwrap(), vec![0xbb; 20]);
        memory.write_octets(rw_base, &[1]).unwrap();

        let args_base = ADDRESS_SPACE_SIZE - ZONE_SIZE - INIT_INPUT_SIZE;
        assert_eq!(memory.read_octets(args_base, 2).unwrap(), vec![9, 8]);

        // Heap pointer sits past the writable data and zero pages.
        assert_eq!(memory.heap_pointer(), rw_base + 2 * PAGE_SIZE);
    }

    #[test]
    fn oversized_arguments_are_rejected() {
        let args = vec![0; (INIT_INPUT_SIZE + 1) as usize];
        assert!(matches!(
            initialize_program(&image_blob(4096), &args),
            Err(InitError::ArgumentsTooLong(_))
        ));
    }
}
