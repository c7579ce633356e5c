use core::fmt;

/// Operand layout family of an opcode.
///
/// The family decides how the operand octets following the opcode are
/// sliced into register nibbles and little-endian immediates. The actual
/// slicing lives in [`crate::args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandFamily {
    /// No operand octets.
    NoOperands,
    /// One sign-extended immediate of up to four octets.
    OneImm,
    /// Register octet plus one immediate of up to eight octets.
    OneRegOneImmWide,
    /// Length octet plus two sign-extended immediates.
    TwoImm,
    /// Register octet plus one immediate.
    OneRegOneImm,
    /// Register octet, length octet, then two immediates.
    OneRegTwoImm,
    /// One register octet carrying two register nibbles.
    TwoReg,
    /// Register octet plus one immediate.
    TwoRegOneImm,
    /// Register octet, length octet, then two immediates.
    TwoRegTwoImm,
    /// Two register octets carrying three register nibbles.
    ThreeReg,
}

/// A byte that does not map to any opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidOpcode(pub u8);

impl fmt::Display for InvalidOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid opcode {:#04x}", self.0)
    }
}

impl std::error::Error for InvalidOpcode {}

macro_rules! impl_opcodes {
    ($($(#[$attr:meta])* $Variant:ident($family:ident) = $value:literal => $mnemonic:literal,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u8)]
        /// Opcode table of the PVM.
        ///
        /// Discriminants are the wire values. Opcodes are assigned in
        /// operand-family blocks so that the dispatcher can decode operands
        /// uniformly per block.
        pub enum Opcode {
            $($(#[$attr])* $Variant = $value,)+
        }

        impl Opcode {
            /// Lower-case mnemonic, as emitted in trace records.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$Variant => $mnemonic,)+
                }
            }

            /// Operand layout family of this opcode.
            pub const fn family(self) -> OperandFamily {
                match self {
                    $(Self::$Variant => OperandFamily::$family,)+
                }
            }
        }

        impl TryFrom<u8> for Opcode {
            type Error = InvalidOpcode;

            fn try_from(byte: u8) -> Result<Self, Self::Error> {
                match byte {
                    $($value => Ok(Self::$Variant),)+
                    _ => Err(InvalidOpcode(byte)),
                }
            }
        }

        impl From<Opcode> for u8 {
            fn from(op: Opcode) -> u8 {
                op as u8
            }
        }
    };
}

impl_opcodes! {
    /// Unconditional panic.
    Trap(NoOperands) = 0x00 => "trap",
    /// No effect.
    Fallthrough(NoOperands) = 0x01 => "fallthrough",

    /// Host call with immediate identifier.
    Ecalli(OneImm) = 0x0a => "ecalli",

    /// `r_D ← imm` with a full-width (up to eight octet) immediate.
    LoadImm64(OneRegOneImmWide) = 0x14 => "load_imm_64",

    /// `u8[immX] ← immY`.
    StoreImmU8(TwoImm) = 0x1e => "store_imm_u8",
    /// `u16[immX] ← immY`.
    StoreImmU16(TwoImm) = 0x1f => "store_imm_u16",
    /// `u32[immX] ← immY`.
    StoreImmU32(TwoImm) = 0x20 => "store_imm_u32",
    /// `u64[immX] ← immY`.
    StoreImmU64(TwoImm) = 0x21 => "store_imm_u64",

    /// `pc ← pc + imm`.
    Jump(OneImm) = 0x28 => "jump",

    /// Dynamic jump through the jump table at `(r_A + imm) mod 2^32`.
    JumpInd(OneRegOneImm) = 0x32 => "jump_ind",
    /// `r_A ← imm`.
    LoadImm(OneRegOneImm) = 0x33 => "load_imm",
    /// `r_A ← zext(u8[imm])`.
    LoadU8(OneRegOneImm) = 0x34 => "load_u8",
    /// `r_A ← sext(i8[imm])`.
    LoadI8(OneRegOneImm) = 0x35 => "load_i8",
    /// `r_A ← zext(u16[imm])`.
    LoadU16(OneRegOneImm) = 0x36 => "load_u16",
    /// `r_A ← sext(i16[imm])`.
    LoadI16(OneRegOneImm) = 0x37 => "load_i16",
    /// `r_A ← zext(u32[imm])`.
    LoadU32(OneRegOneImm) = 0x38 => "load_u32",
    /// `r_A ← sext(i32[imm])`.
    LoadI32(OneRegOneImm) = 0x39 => "load_i32",
    /// `r_A ← u64[imm]`.
    LoadU64(OneRegOneImm) = 0x3a => "load_u64",
    /// `u8[imm] ← r_A`.
    StoreU8(OneRegOneImm) = 0x3b => "store_u8",
    /// `u16[imm] ← r_A`.
    StoreU16(OneRegOneImm) = 0x3c => "store_u16",
    /// `u32[imm] ← r_A`.
    StoreU32(OneRegOneImm) = 0x3d => "store_u32",
    /// `u64[imm] ← r_A`.
    StoreU64(OneRegOneImm) = 0x3e => "store_u64",

    /// `u8[(r_A + immX) mod 2^32] ← immY`.
    StoreImmIndU8(OneRegTwoImm) = 0x46 => "store_imm_ind_u8",
    /// `u16[(r_A + immX) mod 2^32] ← immY`.
    StoreImmIndU16(OneRegTwoImm) = 0x47 => "store_imm_ind_u16",
    /// `u32[(r_A + immX) mod 2^32] ← immY`.
    StoreImmIndU32(OneRegTwoImm) = 0x48 => "store_imm_ind_u32",
    /// `u64[(r_A + immX) mod 2^32] ← immY`.
    StoreImmIndU64(OneRegTwoImm) = 0x49 => "store_imm_ind_u64",

    /// `r_A ← immX; pc ← pc + immY`.
    LoadImmJump(OneRegTwoImm) = 0x50 => "load_imm_jump",
    /// Branch if `r_A = immX`.
    BranchEqImm(OneRegTwoImm) = 0x51 => "branch_eq_imm",
    /// Branch if `r_A ≠ immX`.
    BranchNeImm(OneRegTwoImm) = 0x52 => "branch_ne_imm",
    /// Branch if `r_A < immX` (unsigned).
    BranchLtUImm(OneRegTwoImm) = 0x53 => "branch_lt_u_imm",
    /// Branch if `r_A ≤ immX` (unsigned).
    BranchLeUImm(OneRegTwoImm) = 0x54 => "branch_le_u_imm",
    /// Branch if `r_A ≥ immX` (unsigned).
    BranchGeUImm(OneRegTwoImm) = 0x55 => "branch_ge_u_imm",
    /// Branch if `r_A > immX` (unsigned).
    BranchGtUImm(OneRegTwoImm) = 0x56 => "branch_gt_u_imm",
    /// Branch if `r_A < immX` (signed).
    BranchLtSImm(OneRegTwoImm) = 0x57 => "branch_lt_s_imm",
    /// Branch if `r_A ≤ immX` (signed).
    BranchLeSImm(OneRegTwoImm) = 0x58 => "branch_le_s_imm",
    /// Branch if `r_A ≥ immX` (signed).
    BranchGeSImm(OneRegTwoImm) = 0x59 => "branch_ge_s_imm",
    /// Branch if `r_A > immX` (signed).
    BranchGtSImm(OneRegTwoImm) = 0x5a => "branch_gt_s_imm",

    /// `r_D ← r_A`.
    MoveReg(TwoReg) = 0x64 => "move_reg",
    /// Grow the heap by `r_A` octets; `r_D` receives the new break.
    Sbrk(TwoReg) = 0x65 => "sbrk",
    /// `r_D ← popcount(r_A)`.
    CountSetBits64(TwoReg) = 0x66 => "count_set_bits_64",
    /// `r_D ← popcount(r_A mod 2^32)`.
    CountSetBits32(TwoReg) = 0x67 => "count_set_bits_32",
    /// `r_D ← clz(r_A)`.
    LeadingZeroBits64(TwoReg) = 0x68 => "leading_zero_bits_64",
    /// `r_D ← clz(r_A mod 2^32)`.
    LeadingZeroBits32(TwoReg) = 0x69 => "leading_zero_bits_32",
    /// `r_D ← ctz(r_A)`.
    TrailingZeroBits64(TwoReg) = 0x6a => "trailing_zero_bits_64",
    /// `r_D ← ctz(r_A mod 2^32)`.
    TrailingZeroBits32(TwoReg) = 0x6b => "trailing_zero_bits_32",
    /// `r_D ← sext8(r_A)`.
    SignExtend8(TwoReg) = 0x6c => "sign_extend_8",
    /// `r_D ← sext16(r_A)`.
    SignExtend16(TwoReg) = 0x6d => "sign_extend_16",
    /// `r_D ← r_A mod 2^16`.
    ZeroExtend16(TwoReg) = 0x6e => "zero_extend_16",
    /// `r_D ← byte-swapped r_A`.
    ReverseBytes(TwoReg) = 0x6f => "reverse_bytes",

    /// Branch if `r_D = r_A`.
    BranchEq(TwoRegOneImm) = 0x78 => "branch_eq",
    /// Branch if `r_D ≠ r_A`.
    BranchNe(TwoRegOneImm) = 0x79 => "branch_ne",
    /// Branch if `r_D < r_A` (unsigned).
    BranchLtU(TwoRegOneImm) = 0x7a => "branch_lt_u",
    /// Branch if `r_D < r_A` (signed).
    BranchLtS(TwoRegOneImm) = 0x7b => "branch_lt_s",
    /// Branch if `r_D ≥ r_A` (unsigned).
    BranchGeU(TwoRegOneImm) = 0x7c => "branch_ge_u",
    /// Branch if `r_D ≥ r_A` (signed).
    BranchGeS(TwoRegOneImm) = 0x7d => "branch_ge_s",

    /// `r_D ← immX`, then dynamic jump via `(r_A + immY) mod 2^32`.
    LoadImmJumpInd(TwoRegTwoImm) = 0x82 => "load_imm_jump_ind",

    /// `u8[(r_A + imm) mod 2^32] ← r_D`.
    StoreIndU8(TwoRegOneImm) = 0x8c => "store_ind_u8",
    /// `u16[(r_A + imm) mod 2^32] ← r_D`.
    StoreIndU16(TwoRegOneImm) = 0x8d => "store_ind_u16",
    /// `u32[(r_A + imm) mod 2^32] ← r_D`.
    StoreIndU32(TwoRegOneImm) = 0x8e => "store_ind_u32",
    /// `u64[(r_A + imm) mod 2^32] ← r_D`.
    StoreIndU64(TwoRegOneImm) = 0x8f => "store_ind_u64",
    /// `r_D ← zext(u8[(r_A + imm) mod 2^32])`.
    LoadIndU8(TwoRegOneImm) = 0x90 => "load_ind_u8",
    /// `r_D ← sext(i8[(r_A + imm) mod 2^32])`.
    LoadIndI8(TwoRegOneImm) = 0x91 => "load_ind_i8",
    /// `r_D ← zext(u16[(r_A + imm) mod 2^32])`.
    LoadIndU16(TwoRegOneImm) = 0x92 => "load_ind_u16",
    /// `r_D ← sext(i16[(r_A + imm) mod 2^32])`.
    LoadIndI16(TwoRegOneImm) = 0x93 => "load_ind_i16",
    /// `r_D ← zext(u32[(r_A + imm) mod 2^32])`.
    LoadIndU32(TwoRegOneImm) = 0x94 => "load_ind_u32",
    /// `r_D ← sext(i32[(r_A + imm) mod 2^32])`.
    LoadIndI32(TwoRegOneImm) = 0x95 => "load_ind_i32",
    /// `r_D ← u64[(r_A + imm) mod 2^32]`.
    LoadIndU64(TwoRegOneImm) = 0x96 => "load_ind_u64",

    /// `r_D ← sext32(r_A + r_B)`.
    Add32(ThreeReg) = 0xa0 => "add_32",
    /// `r_D ← sext32(r_A − r_B)`.
    Sub32(ThreeReg) = 0xa1 => "sub_32",
    /// `r_D ← sext32(r_A × r_B)`.
    Mul32(ThreeReg) = 0xa2 => "mul_32",
    /// `r_D ← sext32(r_A ÷ r_B)` (unsigned).
    DivU32(ThreeReg) = 0xa3 => "div_u_32",
    /// `r_D ← sext32(r_A ÷ r_B)` (signed).
    DivS32(ThreeReg) = 0xa4 => "div_s_32",
    /// `r_D ← sext32(r_A mod r_B)` (unsigned).
    RemU32(ThreeReg) = 0xa5 => "rem_u_32",
    /// `r_D ← sext32(r_A mod r_B)` (signed).
    RemS32(ThreeReg) = 0xa6 => "rem_s_32",
    /// `r_D ← sext32(r_A << (r_B mod 32))`.
    ShloL32(ThreeReg) = 0xa7 => "shlo_l_32",
    /// `r_D ← sext32(r_A >> (r_B mod 32))` (logical).
    ShloR32(ThreeReg) = 0xa8 => "shlo_r_32",
    /// `r_D ← sext32(r_A >> (r_B mod 32))` (arithmetic).
    SharR32(ThreeReg) = 0xa9 => "shar_r_32",

    /// `r_D ← r_A + r_B`.
    Add64(ThreeReg) = 0xaa => "add_64",
    /// `r_D ← r_A − r_B`.
    Sub64(ThreeReg) = 0xab => "sub_64",
    /// `r_D ← r_A × r_B`.
    Mul64(ThreeReg) = 0xac => "mul_64",
    /// `r_D ← r_A ÷ r_B` (unsigned).
    DivU64(ThreeReg) = 0xad => "div_u_64",
    /// `r_D ← r_A ÷ r_B` (signed).
    DivS64(ThreeReg) = 0xae => "div_s_64",
    /// `r_D ← r_A mod r_B` (unsigned).
    RemU64(ThreeReg) = 0xaf => "rem_u_64",
    /// `r_D ← r_A mod r_B` (signed).
    RemS64(ThreeReg) = 0xb0 => "rem_s_64",
    /// `r_D ← r_A << (r_B mod 64)`.
    ShloL64(ThreeReg) = 0xb1 => "shlo_l_64",
    /// `r_D ← r_A >> (r_B mod 64)` (logical).
    ShloR64(ThreeReg) = 0xb2 => "shlo_r_64",
    /// `r_D ← r_A >> (r_B mod 64)` (arithmetic).
    SharR64(ThreeReg) = 0xb3 => "shar_r_64",

    /// `r_D ← sext32(r_A + imm)`.
    AddImm32(TwoRegOneImm) = 0xbe => "add_imm_32",
    /// `r_D ← r_A + imm`.
    AddImm64(TwoRegOneImm) = 0xbf => "add_imm_64",
    /// `r_D ← r_A ∧ imm`.
    AndImm(TwoRegOneImm) = 0xc0 => "and_imm",
    /// `r_D ← r_A ⊕ imm`.
    XorImm(TwoRegOneImm) = 0xc1 => "xor_imm",
    /// `r_D ← r_A ∨ imm`.
    OrImm(TwoRegOneImm) = 0xc2 => "or_imm",
    /// `r_D ← sext32(r_A × imm)`.
    MulImm32(TwoRegOneImm) = 0xc3 => "mul_imm_32",
    /// `r_D ← r_A × imm`.
    MulImm64(TwoRegOneImm) = 0xc4 => "mul_imm_64",
    /// `r_D ← r_A < imm` (unsigned).
    SetLtUImm(TwoRegOneImm) = 0xc5 => "set_lt_u_imm",
    /// `r_D ← r_A < imm` (signed).
    SetLtSImm(TwoRegOneImm) = 0xc6 => "set_lt_s_imm",
    /// `r_D ← r_A > imm` (unsigned).
    SetGtUImm(TwoRegOneImm) = 0xc7 => "set_gt_u_imm",
    /// `r_D ← r_A > imm` (signed).
    SetGtSImm(TwoRegOneImm) = 0xc8 => "set_gt_s_imm",
    /// `r_D ← sext32(r_A << (imm mod 32))`.
    ShloLImm32(TwoRegOneImm) = 0xc9 => "shlo_l_imm_32",
    /// `r_D ← sext32(r_A >> (imm mod 32))` (logical).
    ShloRImm32(TwoRegOneImm) = 0xca => "shlo_r_imm_32",
    /// `r_D ← sext32(r_A >> (imm mod 32))` (arithmetic).
    SharRImm32(TwoRegOneImm) = 0xcb => "shar_r_imm_32",
    /// `r_D ← r_A << (imm mod 64)`.
    ShloLImm64(TwoRegOneImm) = 0xcc => "shlo_l_imm_64",
    /// `r_D ← r_A >> (imm mod 64)` (logical).
    ShloRImm64(TwoRegOneImm) = 0xcd => "shlo_r_imm_64",
    /// `r_D ← r_A >> (imm mod 64)` (arithmetic).
    SharRImm64(TwoRegOneImm) = 0xce => "shar_r_imm_64",
    /// `r_D ← sext32(imm − r_A)`.
    NegAddImm32(TwoRegOneImm) = 0xcf => "neg_add_imm_32",
    /// `r_D ← imm − r_A`.
    NegAddImm64(TwoRegOneImm) = 0xd0 => "neg_add_imm_64",
    /// `r_D ← sext32(imm << (r_A mod 32))`.
    ShloLImmAlt32(TwoRegOneImm) = 0xd1 => "shlo_l_imm_alt_32",
    /// `r_D ← sext32(imm >> (r_A mod 32))` (logical).
    ShloRImmAlt32(TwoRegOneImm) = 0xd2 => "shlo_r_imm_alt_32",
    /// `r_D ← sext32(imm >> (r_A mod 32))` (arithmetic).
    SharRImmAlt32(TwoRegOneImm) = 0xd3 => "shar_r_imm_alt_32",
    /// `r_D ← imm << (r_A mod 64)`.
    ShloLImmAlt64(TwoRegOneImm) = 0xd4 => "shlo_l_imm_alt_64",
    /// `r_D ← imm >> (r_A mod 64)` (logical).
    ShloRImmAlt64(TwoRegOneImm) = 0xd5 => "shlo_r_imm_alt_64",
    /// `r_D ← imm >> (r_A mod 64)` (arithmetic).
    SharRImmAlt64(TwoRegOneImm) = 0xd6 => "shar_r_imm_alt_64",
    /// `r_D ← sext32(rotr32(r_A, imm))`.
    RotR32Imm(TwoRegOneImm) = 0xd7 => "rot_r_32_imm",
    /// `r_D ← rotr64(r_A, imm)`.
    RotR64Imm(TwoRegOneImm) = 0xd8 => "rot_r_64_imm",
    /// `r_D ← sext32(rotr32(imm, r_A))`.
    RotR32ImmAlt(TwoRegOneImm) = 0xd9 => "rot_r_32_imm_alt",
    /// `r_D ← rotr64(imm, r_A)`.
    RotR64ImmAlt(TwoRegOneImm) = 0xda => "rot_r_64_imm_alt",
    /// `r_D ← imm` if `r_A = 0`.
    CmovIzImm(TwoRegOneImm) = 0xdb => "cmov_iz_imm",
    /// `r_D ← imm` if `r_A ≠ 0`.
    CmovNzImm(TwoRegOneImm) = 0xdc => "cmov_nz_imm",

    /// `r_D ← r_A ∧ r_B`.
    And(ThreeReg) = 0xe6 => "and",
    /// `r_D ← r_A ∨ r_B`.
    Or(ThreeReg) = 0xe7 => "or",
    /// `r_D ← r_A ⊕ r_B`.
    Xor(ThreeReg) = 0xe8 => "xor",
    /// `r_D ← r_A ∧ ¬r_B`.
    AndInv(ThreeReg) = 0xe9 => "and_inv",
    /// `r_D ← r_A ∨ ¬r_B`.
    OrInv(ThreeReg) = 0xea => "or_inv",
    /// `r_D ← ¬(r_A ⊕ r_B)`.
    Xnor(ThreeReg) = 0xeb => "xnor",
    /// `r_D ← high 64 bits of r_A × r_B` (signed × signed).
    MulUpperSS(ThreeReg) = 0xec => "mul_upper_s_s",
    /// `r_D ← high 64 bits of r_A × r_B` (unsigned × unsigned).
    MulUpperUU(ThreeReg) = 0xed => "mul_upper_u_u",
    /// `r_D ← high 64 bits of r_A × r_B` (signed × unsigned).
    MulUpperSU(ThreeReg) = 0xee => "mul_upper_s_u",
    /// `r_D ← r_A < r_B` (unsigned).
    SetLtU(ThreeReg) = 0xef => "set_lt_u",
    /// `r_D ← r_A < r_B` (signed).
    SetLtS(ThreeReg) = 0xf0 => "set_lt_s",
    /// `r_D ← r_A` if `r_B = 0`.
    CmovIz(ThreeReg) = 0xf1 => "cmov_iz",
    /// `r_D ← r_A` if `r_B ≠ 0`.
    CmovNz(ThreeReg) = 0xf2 => "cmov_nz",
    /// `r_D ← sext32(rotl32(r_A, r_B))`.
    RotL32(ThreeReg) = 0xf3 => "rot_l_32",
    /// `r_D ← rotl64(r_A, r_B)`.
    RotL64(ThreeReg) = 0xf4 => "rot_l_64",
    /// `r_D ← sext32(rotr32(r_A, r_B))`.
    RotR32(ThreeReg) = 0xf5 => "rot_r_32",
    /// `r_D ← rotr64(r_A, r_B)`.
    RotR64(ThreeReg) = 0xf6 => "rot_r_64",
    /// `r_D ← max(r_A, r_B)` (signed).
    Max(ThreeReg) = 0xf7 => "max",
    /// `r_D ← max(r_A, r_B)` (unsigned).
    MaxU(ThreeReg) = 0xf8 => "max_u",
    /// `r_D ← min(r_A, r_B)` (signed).
    Min(ThreeReg) = 0xf9 => "min",
    /// `r_D ← min(r_A, r_B)` (unsigned).
    MinU(ThreeReg) = 0xfa => "min_u",
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn the_table_has_one_hundred_thirty_nine_opcodes() {
        assert_eq!(Opcode::iter().count(), 139);
    }

    #[test]
    fn every_opcode_round_trips_through_its_byte() {
        for op in Opcode::iter() {
            assert_eq!(Opcode::try_from(u8::from(op)), Ok(op));
        }
    }

    #[test]
    fn unassigned_bytes_are_rejected() {
        let assigned: Vec<u8> = Opcode::iter().map(u8::from).collect();
        for byte in 0..=u8::MAX {
            if !assigned.contains(&byte) {
                assert_eq!(Opcode::try_from(byte), Err(InvalidOpcode(byte)));
            }
        }
    }

    #[test]
    fn the_smoke_vector_opcode_is_pinned() {
        assert_eq!(Opcode::try_from(0xbe), Ok(Opcode::AddImm32));
        assert_eq!(Opcode::AddImm32.mnemonic(), "add_imm_32");
    }

    #[test]
    fn families_follow_the_block_assignment() {
        assert_eq!(Opcode::Trap.family(), OperandFamily::NoOperands);
        assert_eq!(Opcode::Ecalli.family(), OperandFamily::OneImm);
        assert_eq!(Opcode::LoadImm64.family(), OperandFamily::OneRegOneImmWide);
        assert_eq!(Opcode::BranchEqImm.family(), OperandFamily::OneRegTwoImm);
        assert_eq!(Opcode::AddImm32.family(), OperandFamily::TwoRegOneImm);
        assert_eq!(Opcode::Add32.family(), OperandFamily::ThreeReg);
        assert_eq!(Opcode::LoadImmJumpInd.family(), OperandFamily::TwoRegTwoImm);
    }
}
