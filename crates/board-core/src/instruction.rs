//! Raw 32-bit instruction words and their fixed bit-layout views.
//!
//! An [`Instruction`] is the raw word; the per-format view types expose the
//! named bit-fields of that layout without copying anything out. The B- and
//! J-format immediates drop the implicit LSB by right-shifting one bit after
//! reassembly, since branch and jump offsets are always even.

use crate::encoding::Opcode;

/// A raw 32-bit standard instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(u32);

impl Instruction {
    /// Wraps a raw little-endian instruction word.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw word.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Raw 7-bit major opcode field.
    #[must_use]
    pub const fn opcode_bits(self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    /// Decoded major opcode, if it belongs to the implemented set.
    #[must_use]
    pub const fn opcode(self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode_bits())
    }

    /// funct3 field, shared by every format that has one.
    #[must_use]
    pub const fn funct3(self) -> u8 {
        ((self.0 >> 12) & 0x7) as u8
    }

    /// Reinterprets the word through the R-format layout.
    #[must_use]
    pub const fn as_r(self) -> RType {
        RType(self.0)
    }

    /// Reinterprets the word through the I-format layout.
    #[must_use]
    pub const fn as_i(self) -> IType {
        IType(self.0)
    }

    /// Reinterprets the word through the S-format layout.
    #[must_use]
    pub const fn as_s(self) -> SType {
        SType(self.0)
    }

    /// Reinterprets the word through the B-format layout.
    #[must_use]
    pub const fn as_b(self) -> BType {
        BType(self.0)
    }

    /// Reinterprets the word through the U-format layout.
    #[must_use]
    pub const fn as_u(self) -> UType {
        UType(self.0)
    }

    /// Reinterprets the word through the J-format layout.
    #[must_use]
    pub const fn as_j(self) -> JType {
        JType(self.0)
    }

    /// Assembles an R-format word.
    #[must_use]
    pub const fn encode_r(opcode: Opcode, rd: u8, funct3: u8, rs1: u8, rs2: u8, funct7: u8) -> Self {
        Self(
            opcode as u32
                | ((rd as u32 & 0x1F) << 7)
                | ((funct3 as u32 & 0x7) << 12)
                | ((rs1 as u32 & 0x1F) << 15)
                | ((rs2 as u32 & 0x1F) << 20)
                | ((funct7 as u32 & 0x7F) << 25),
        )
    }

    /// Assembles an I-format word; the immediate is truncated to 12 bits.
    #[must_use]
    pub const fn encode_i(opcode: Opcode, rd: u8, funct3: u8, rs1: u8, imm: u32) -> Self {
        Self(
            opcode as u32
                | ((rd as u32 & 0x1F) << 7)
                | ((funct3 as u32 & 0x7) << 12)
                | ((rs1 as u32 & 0x1F) << 15)
                | ((imm & 0xFFF) << 20),
        )
    }

    /// Assembles an S-format word; the immediate is truncated to 12 bits.
    #[must_use]
    pub const fn encode_s(opcode: Opcode, funct3: u8, rs1: u8, rs2: u8, imm: u32) -> Self {
        Self(
            opcode as u32
                | ((imm & 0x1F) << 7)
                | ((funct3 as u32 & 0x7) << 12)
                | ((rs1 as u32 & 0x1F) << 15)
                | ((rs2 as u32 & 0x1F) << 20)
                | (((imm >> 5) & 0x7F) << 25),
        )
    }

    /// Assembles a U-format word; the low 12 immediate bits are dropped.
    #[must_use]
    pub const fn encode_u(opcode: Opcode, rd: u8, imm: u32) -> Self {
        Self(opcode as u32 | ((rd as u32 & 0x1F) << 7) | ((imm >> 12) << 12))
    }
}

/// R-format view: register-register operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RType(u32);

impl RType {
    /// Destination register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 7) & 0x1F) as u8
    }

    /// funct3 field.
    #[must_use]
    pub const fn funct3(self) -> u8 {
        ((self.0 >> 12) & 0x7) as u8
    }

    /// First source register index.
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 15) & 0x1F) as u8
    }

    /// Second source register index.
    #[must_use]
    pub const fn rs2(self) -> u8 {
        ((self.0 >> 20) & 0x1F) as u8
    }

    /// funct7 field.
    #[must_use]
    pub const fn funct7(self) -> u8 {
        ((self.0 >> 25) & 0x7F) as u8
    }
}

/// I-format view: register-immediate operations and loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IType(u32);

impl IType {
    /// Destination register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 7) & 0x1F) as u8
    }

    /// First source register index.
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 15) & 0x1F) as u8
    }

    /// The raw 12-bit immediate field.
    #[must_use]
    pub const fn immediate(self) -> u32 {
        (self.0 >> 20) & 0xFFF
    }

    /// Replaces the 12-bit immediate field.
    pub const fn set_immediate(&mut self, imm: u32) {
        self.0 = (self.0 & !(0xFFF << 20)) | ((imm & 0xFFF) << 20);
    }

    /// The viewed word.
    #[must_use]
    pub const fn word(self) -> Instruction {
        Instruction(self.0)
    }
}

/// S-format view: stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SType(u32);

impl SType {
    /// First source register index (address base).
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 15) & 0x1F) as u8
    }

    /// Second source register index (store value).
    #[must_use]
    pub const fn rs2(self) -> u8 {
        ((self.0 >> 20) & 0x1F) as u8
    }

    /// The 12-bit immediate reassembled from its two fragments.
    #[must_use]
    pub const fn immediate(self) -> u32 {
        let imm0_4 = (self.0 >> 7) & 0x1F;
        let imm5_11 = (self.0 >> 25) & 0x7F;
        (imm5_11 << 5) | imm0_4
    }

    /// Replaces both immediate fragments.
    pub const fn set_immediate(&mut self, imm: u32) {
        self.0 = (self.0 & !((0x1F << 7) | (0x7F << 25)))
            | ((imm & 0x1F) << 7)
            | (((imm >> 5) & 0x7F) << 25);
    }

    /// The viewed word.
    #[must_use]
    pub const fn word(self) -> Instruction {
        Instruction(self.0)
    }
}

/// B-format view: conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BType(u32);

impl BType {
    /// First source register index.
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 15) & 0x1F) as u8
    }

    /// Second source register index.
    #[must_use]
    pub const fn rs2(self) -> u8 {
        ((self.0 >> 20) & 0x1F) as u8
    }

    /// The immediate reassembled from its four fragments, with the
    /// implicit even-offset LSB dropped.
    #[must_use]
    pub const fn immediate(self) -> u32 {
        let imm11 = (self.0 >> 7) & 0x1;
        let imm1_4 = (self.0 >> 8) & 0xF;
        let imm5_10 = (self.0 >> 25) & 0x3F;
        let imm12 = (self.0 >> 31) & 0x1;
        ((imm12 << 12) | (imm11 << 11) | (imm5_10 << 5) | (imm1_4 << 1)) >> 1
    }
}

/// U-format view: upper-immediate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UType(u32);

impl UType {
    /// Destination register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 7) & 0x1F) as u8
    }

    /// The 20-bit immediate field shifted into bits 12..32.
    #[must_use]
    pub const fn immediate(self) -> u32 {
        self.0 & 0xFFFF_F000
    }

    /// Replaces the immediate field; the low 12 bits of `imm` are dropped.
    pub const fn set_immediate(&mut self, imm: u32) {
        self.0 = (self.0 & 0xFFF) | (imm & 0xFFFF_F000);
    }

    /// The viewed word.
    #[must_use]
    pub const fn word(self) -> Instruction {
        Instruction(self.0)
    }
}

/// J-format view: unconditional jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JType(u32);

impl JType {
    /// Destination (link) register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 7) & 0x1F) as u8
    }

    /// The immediate reassembled from its four fragments, with the
    /// implicit even-offset LSB dropped.
    #[must_use]
    pub const fn immediate(self) -> u32 {
        let imm12_19 = (self.0 >> 12) & 0xFF;
        let imm11 = (self.0 >> 20) & 0x1;
        let imm1_10 = (self.0 >> 21) & 0x3FF;
        let imm20 = (self.0 >> 31) & 0x1;
        ((imm20 << 20) | (imm12_19 << 12) | (imm11 << 11) | (imm1_10 << 1)) >> 1
    }
}
