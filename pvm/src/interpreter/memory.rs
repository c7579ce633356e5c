use super::Interpreter;
use crate::consts::*;
use crate::error::InitError;
use crate::state::ExecuteState;

use pvm_asm::{sign_extend, RegId, Word};

use core::fmt;
use std::collections::HashMap;

const PAGE_LEN: usize = PAGE_SIZE as usize;

/// Access rights of one memory page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessMode {
    /// Page is not accessible.
    None,
    /// Page may be read.
    Read,
    /// Page may be read and written.
    Write,
}

impl AccessMode {
    const fn allows_read(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    const fn allows_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// A denied memory access, carrying the first offending address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// First address of the access that lacked the required rights.
    pub address: u32,
}

/// Round `x` up to the next page boundary.
pub const fn align_page(x: u64) -> u64 {
    (x + PAGE_SIZE - 1) / PAGE_SIZE * PAGE_SIZE
}

/// Round `x` up to the next zone boundary.
pub const fn align_zone(x: u64) -> u64 {
    (x + ZONE_SIZE - 1) / ZONE_SIZE * ZONE_SIZE
}

/// Segment layout installed by program initialisation.
///
/// Bases and region lengths are page-aligned; regions are laid out low to
/// high as reserved zones, read-only data, read-write data plus zeroed
/// heap pages, then (below the fixed tops) stack and argument segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    /// Start of the read-only segment.
    pub ro_base: u64,
    /// Readable length of the read-only segment.
    pub ro_region: u64,
    /// Start of the read-write segment.
    pub rw_base: u64,
    /// Writable length of the read-write segment.
    pub rw_region: u64,
    /// Initial heap pointer: first octet past the writable segment.
    pub heap_base: u64,
    /// Start of the stack segment.
    pub stack_base: u64,
    /// Exclusive end of the stack segment.
    pub stack_end: u64,
    /// Start of the argument segment.
    pub args_base: u64,
    /// Length of the argument segment.
    pub args_region: u64,
}

impl MemoryLayout {
    /// Compute the layout for the requested segment sizes, enforcing
    /// that the zone-aligned segments fit the 32-bit address space.
    pub fn compute(
        ro_len: u64,
        rw_len: u64,
        heap_zero_pages: u64,
        stack_size: u64,
    ) -> Result<Self, InitError> {
        let heap_extra = heap_zero_pages * PAGE_SIZE;

        let total = LAYOUT_RESERVED_ZONES * ZONE_SIZE
            + align_zone(ro_len)
            + align_zone(rw_len + heap_extra)
            + align_zone(stack_size)
            + INIT_INPUT_SIZE;
        if total > ADDRESS_SPACE_SIZE {
            return Err(InitError::AddressSpaceOverflow);
        }

        let ro_base = LAYOUT_RESERVED_ZONES * ZONE_SIZE;
        let rw_base = ro_base + align_zone(ro_len);
        let rw_region = align_page(rw_len + heap_extra);

        let stack_end = ADDRESS_SPACE_SIZE - 2 * ZONE_SIZE - INIT_INPUT_SIZE;
        let args_base = ADDRESS_SPACE_SIZE - ZONE_SIZE - INIT_INPUT_SIZE;

        Ok(Self {
            ro_base,
            ro_region: align_page(ro_len),
            rw_base,
            rw_region,
            heap_base: rw_base + rw_region,
            stack_base: stack_end - align_page(stack_size),
            stack_end,
            args_base,
            args_region: INIT_INPUT_SIZE,
        })
    }
}

/// The paged memory of the VM.
///
/// Every page carries an access mode; data pages materialise lazily on
/// first write, so untouched readable pages read as zeroes.
#[derive(Clone, PartialEq, Eq)]
pub struct VmMemory {
    access: Vec<AccessMode>,
    pages: HashMap<u32, Box<[u8; PAGE_LEN]>>,
    heap_pointer: u64,
    last_load: Option<(u32, u64)>,
    last_store: Option<(u32, u64)>,
}

impl Default for VmMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VmMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmMemory")
            .field("populated_pages", &self.pages.len())
            .field("heap_pointer", &self.heap_pointer)
            .finish()
    }
}

impl VmMemory {
    /// Create an empty memory: every page inaccessible.
    pub fn new() -> Self {
        Self {
            access: vec![AccessMode::None; PAGE_COUNT],
            pages: HashMap::new(),
            heap_pointer: 0,
            last_load: None,
            last_store: None,
        }
    }

    /// Install the given layout, discarding all pre-existing state.
    ///
    /// The read-only and argument segments become readable, the
    /// read-write and stack segments writable, and the segment data is
    /// placed bypassing the runtime write check.
    pub fn initialize_layout(
        &mut self,
        layout: &MemoryLayout,
        ro_data: &[u8],
        rw_data: &[u8],
        args: &[u8],
    ) -> Result<(), Fault> {
        *self = Self::new();

        self.set_access_range(layout.ro_base, layout.ro_region, AccessMode::Read);
        self.set_access_range(layout.rw_base, layout.rw_region, AccessMode::Write);
        self.set_access_range(
            layout.stack_base,
            layout.stack_end - layout.stack_base,
            AccessMode::Write,
        );
        self.set_access_range(layout.args_base, layout.args_region, AccessMode::Read);

        self.write_octets_during_initialization(layout.ro_base, ro_data)?;
        self.write_octets_during_initialization(layout.rw_base, rw_data)?;
        self.write_octets_during_initialization(layout.args_base, args)?;

        self.heap_pointer = layout.heap_base;

        Ok(())
    }

    /// Access mode of the page at `page_index`.
    pub fn access_mode(&self, page_index: u32) -> AccessMode {
        self.access
            .get(page_index as usize)
            .copied()
            .unwrap_or(AccessMode::None)
    }

    /// Read `len` octets starting at `addr`.
    ///
    /// Succeeds iff every address in the range is at least readable;
    /// otherwise reports the first offending address. An empty range
    /// always succeeds.
    pub fn read_octets(&self, addr: u64, len: u64) -> Result<Vec<u8>, Fault> {
        self.check(addr, len, false)?;

        let mut out = vec![0u8; len as usize];
        self.copy_out(addr, &mut out);
        Ok(out)
    }

    /// Read a fixed-width little-endian slot at `addr`.
    pub fn read_bytes<const N: usize>(&self, addr: u64) -> Result<[u8; N], Fault> {
        self.check(addr, N as u64, false)?;

        let mut out = [0u8; N];
        self.copy_out(addr, &mut out);
        Ok(out)
    }

    /// Write `bytes` starting at `addr`.
    ///
    /// Succeeds iff every address in the range is writable; no partial
    /// effect on failure.
    pub fn write_octets(&mut self, addr: u64, bytes: &[u8]) -> Result<(), Fault> {
        self.check(addr, bytes.len() as u64, true)?;
        self.copy_in(addr, bytes);
        Ok(())
    }

    /// Write during initialisation, bypassing the writable check but
    /// still refusing the reserved region.
    pub fn write_octets_during_initialization(
        &mut self,
        addr: u64,
        bytes: &[u8],
    ) -> Result<(), Fault> {
        if bytes.is_empty() {
            return Ok(());
        }

        let end = addr.saturating_add(bytes.len() as u64);
        if addr < RESERVED_MEMORY_START || end > ADDRESS_SPACE_SIZE {
            return Err(Fault {
                address: clamp_address(addr),
            });
        }

        self.copy_in(addr, bytes);
        Ok(())
    }

    /// Mark `page_count` consecutive pages starting at `page_index` as
    /// writable. Used by heap growth.
    pub fn allocate_pages(&mut self, page_index: u32, page_count: u32) {
        let start = page_index as usize;
        let end = (start + page_count as usize).min(PAGE_COUNT);
        for mode in &mut self.access[start..end] {
            *mode = AccessMode::Write;
        }
    }

    /// Current top of the allocated heap.
    pub const fn heap_pointer(&self) -> u64 {
        self.heap_pointer
    }

    /// Replace the heap pointer.
    pub fn set_heap_pointer(&mut self, heap_pointer: u64) {
        self.heap_pointer = heap_pointer;
    }

    /// The most recent load since the records were cleared.
    pub const fn last_load(&self) -> Option<(u32, u64)> {
        self.last_load
    }

    /// The most recent store since the records were cleared.
    pub const fn last_store(&self) -> Option<(u32, u64)> {
        self.last_store
    }

    pub(crate) fn note_load(&mut self, addr: u32, value: u64) {
        self.last_load = Some((addr, value));
    }

    pub(crate) fn note_store(&mut self, addr: u32, value: u64) {
        self.last_store = Some((addr, value));
    }

    pub(crate) fn clear_op_records(&mut self) {
        self.last_load = None;
        self.last_store = None;
    }

    fn set_access_range(&mut self, base: u64, len: u64, mode: AccessMode) {
        let start = (base / PAGE_SIZE) as usize;
        let end = (align_page(base + len) / PAGE_SIZE) as usize;
        for entry in &mut self.access[start..end.min(PAGE_COUNT)] {
            *entry = mode;
        }
    }

    /// Check rights over `[addr, addr + len)`, reporting the first
    /// offending address.
    fn check(&self, addr: u64, len: u64, write: bool) -> Result<(), Fault> {
        if len == 0 {
            return Ok(());
        }

        let end = match addr.checked_add(len) {
            Some(end) => end,
            None => u64::MAX,
        };

        let mut page = addr / PAGE_SIZE;
        let last = (end - 1) / PAGE_SIZE;
        while page <= last {
            let allowed = match self.access.get(page as usize) {
                Some(mode) if write => mode.allows_write(),
                Some(mode) => mode.allows_read(),
                None => false,
            };
            if !allowed {
                let offending = addr.max(page * PAGE_SIZE);
                return Err(Fault {
                    address: clamp_address(offending),
                });
            }
            page += 1;
        }

        Ok(())
    }

    fn copy_out(&self, addr: u64, out: &mut [u8]) {
        let mut offset = 0;
        while offset < out.len() {
            let at = addr + offset as u64;
            let page = (at / PAGE_SIZE) as u32;
            let in_page = (at % PAGE_SIZE) as usize;
            let n = (PAGE_LEN - in_page).min(out.len() - offset);

            if let Some(data) = self.pages.get(&page) {
                out[offset..offset + n].copy_from_slice(&data[in_page..in_page + n]);
            }
            offset += n;
        }
    }

    fn copy_in(&mut self, addr: u64, bytes: &[u8]) {
        let mut offset = 0;
        while offset < bytes.len() {
            let at = addr + offset as u64;
            let page = (at / PAGE_SIZE) as u32;
            let in_page = (at % PAGE_SIZE) as usize;
            let n = (PAGE_LEN - in_page).min(bytes.len() - offset);

            let data = self
                .pages
                .entry(page)
                .or_insert_with(|| Box::new([0u8; PAGE_LEN]));
            data[in_page..in_page + n].copy_from_slice(&bytes[offset..offset + n]);
            offset += n;
        }
    }
}

fn clamp_address(addr: u64) -> u32 {
    u32::try_from(addr).unwrap_or(u32::MAX)
}

impl<Ecal, Tr> Interpreter<Ecal, Tr> {
    /// Load an `N`-octet little-endian slot into `rd`, zero- or
    /// sign-extending to the register width.
    pub(crate) fn load_int<const N: usize>(
        &mut self,
        rd: RegId,
        addr: Word,
        signed: bool,
    ) -> ExecuteState {
        let addr = addr & 0xffff_ffff;
        match self.memory.read_bytes::<N>(addr) {
            Ok(bytes) => {
                let value = if signed {
                    sign_extend(&bytes)
                } else {
                    let mut buf = [0u8; 8];
                    buf[..N].copy_from_slice(&bytes);
                    u64::from_le_bytes(buf)
                };

                self.memory.note_load(addr as u32, value);
                self.registers[rd.to_usize()] = value;
                self.inc_pc()
            }
            Err(fault) => ExecuteState::Fault(fault.address),
        }
    }

    /// Store the low `N` octets of `value` at `addr`, little-endian.
    pub(crate) fn store_int<const N: usize>(&mut self, addr: Word, value: Word) -> ExecuteState {
        let addr = addr & 0xffff_ffff;
        match self.memory.write_octets(addr, &value.to_le_bytes()[..N]) {
            Ok(()) => {
                let stored = value & (u64::MAX >> (64 - 8 * N as u32));
                self.memory.note_store(addr as u32, stored);
                self.inc_pc()
            }
            Err(fault) => ExecuteState::Fault(fault.address),
        }
    }

    /// `SBRK`: grow the heap by `r_A` octets, reporting the new break in
    /// `r_D`; `r_A = 0` queries the current break.
    pub(crate) fn sbrk(&mut self, rd: RegId, ra: RegId) -> ExecuteState {
        let amount = self.reg(ra);
        let heap = self.memory.heap_pointer();

        if amount == 0 {
            self.registers[rd.to_usize()] = heap;
            return self.inc_pc();
        }

        let new = match heap.checked_add(amount) {
            Some(new) if new <= MAX_MEMORY_ADDRESS => new,
            _ => {
                self.registers[rd.to_usize()] = 0;
                return self.inc_pc();
            }
        };

        let boundary = align_page(heap);
        if new > boundary {
            let pages = (align_page(new) - boundary) / PAGE_SIZE;
            self.memory
                .allocate_pages((boundary / PAGE_SIZE) as u32, pages as u32);
        }

        self.memory.set_heap_pointer(new);
        self.registers[rd.to_usize()] = new;
        self.inc_pc()
    }
}
