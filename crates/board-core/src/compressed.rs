//! Raw 16-bit compressed (RVC) instruction words, format views, and
//! expansion into standard instructions.
//!
//! Compressed instructions are never executed directly. Each implemented
//! encoding is decoded into its fields and re-encoded as the equivalent
//! standard [`Instruction`], which then runs through the ordinary execute
//! path — one source of truth for the ISA semantics. The only exception is
//! `C.JR`, which is a bare register jump and is reported to the caller
//! instead of expanded.

use crate::encoding::{
    sign_extend, C0Funct, C1Funct, C2Funct, CompressedOpcode, LoadFunct, Opcode, OpImm32Funct,
    OpImmFunct, StoreFunct,
};
use crate::fault::HaltCause;
use crate::instruction::Instruction;
use crate::registers::SP;

/// A raw 16-bit compressed instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedInstruction(u16);

impl CompressedInstruction {
    /// Wraps a raw little-endian compressed instruction word.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw word.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Raw 2-bit opcode field.
    #[must_use]
    pub const fn opcode_bits(self) -> u8 {
        (self.0 & 0b11) as u8
    }

    /// Decoded compressed quadrant, if any.
    #[must_use]
    pub const fn opcode(self) -> Option<CompressedOpcode> {
        CompressedOpcode::from_u8(self.opcode_bits())
    }

    /// funct3 field (bits 13..16).
    #[must_use]
    pub const fn funct3(self) -> u8 {
        ((self.0 >> 13) & 0x7) as u8
    }

    /// Reinterprets the word through the CR-format layout.
    #[must_use]
    pub const fn as_cr(self) -> CrType {
        CrType(self.0)
    }

    /// Reinterprets the word through the CI-format layout.
    #[must_use]
    pub const fn as_ci(self) -> CiType {
        CiType(self.0)
    }

    /// Reinterprets the word through the CSS-format layout.
    #[must_use]
    pub const fn as_css(self) -> CssType {
        CssType(self.0)
    }

    /// Reinterprets the word through the CIW-format layout.
    #[must_use]
    pub const fn as_ciw(self) -> CiwType {
        CiwType(self.0)
    }

    /// Reinterprets the word through the CL-format layout.
    #[must_use]
    pub const fn as_cl(self) -> ClType {
        ClType(self.0)
    }

    /// Reinterprets the word through the CS-format layout.
    #[must_use]
    pub const fn as_cs(self) -> CsType {
        CsType(self.0)
    }

    /// Reinterprets the word through the CB-format layout.
    #[must_use]
    pub const fn as_cb(self) -> CbType {
        CbType(self.0)
    }

    /// Reinterprets the word through the CJ-format layout.
    #[must_use]
    pub const fn as_cj(self) -> CjType {
        CjType(self.0)
    }
}

/// CR-format view: register moves and register jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrType(u16);

impl CrType {
    /// Second source register index.
    #[must_use]
    pub const fn rs2(self) -> u8 {
        ((self.0 >> 2) & 0x1F) as u8
    }

    /// Destination/source register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 7) & 0x1F) as u8
    }

    /// funct4 field (bits 12..16).
    #[must_use]
    pub const fn funct4(self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }
}

/// CI-format view: immediate operations on a full register index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiType(u16);

impl CiType {
    /// Low immediate fragment (bits 2..5).
    #[must_use]
    pub const fn imm1(self) -> u16 {
        (self.0 >> 2) & 0x7
    }

    /// Middle immediate fragment (bits 5..7).
    #[must_use]
    pub const fn imm2(self) -> u16 {
        (self.0 >> 5) & 0x3
    }

    /// Destination/source register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 7) & 0x1F) as u8
    }

    /// High immediate fragment (bit 12).
    #[must_use]
    pub const fn imm3(self) -> u16 {
        (self.0 >> 12) & 0x1
    }
}

/// CSS-format view: stack-pointer-relative stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CssType(u16);

impl CssType {
    /// Source register index.
    #[must_use]
    pub const fn rs2(self) -> u8 {
        ((self.0 >> 2) & 0x1F) as u8
    }

    /// Immediate field (bits 7..13).
    #[must_use]
    pub const fn imm(self) -> u16 {
        (self.0 >> 7) & 0x3F
    }
}

/// CIW-format view: wide-immediate operations on a compressed register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiwType(u16);

impl CiwType {
    /// Compressed destination register index (maps to `x8..x15`).
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 2) & 0x7) as u8
    }

    /// Immediate field (bits 5..13).
    #[must_use]
    pub const fn imm(self) -> u16 {
        (self.0 >> 5) & 0xFF
    }
}

/// CL-format view: compressed-register loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClType(u16);

impl ClType {
    /// Compressed destination register index.
    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 2) & 0x7) as u8
    }

    /// Low immediate fragment (bits 5..7).
    #[must_use]
    pub const fn imm1(self) -> u16 {
        (self.0 >> 5) & 0x3
    }

    /// Compressed base register index.
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 7) & 0x7) as u8
    }

    /// High immediate fragment (bits 10..13).
    #[must_use]
    pub const fn imm2(self) -> u16 {
        (self.0 >> 10) & 0x7
    }
}

/// CS-format view: compressed-register stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsType(u16);

impl CsType {
    /// Compressed source register index.
    #[must_use]
    pub const fn rs2(self) -> u8 {
        ((self.0 >> 2) & 0x7) as u8
    }

    /// Low immediate fragment (bits 5..7).
    #[must_use]
    pub const fn imm1(self) -> u16 {
        (self.0 >> 5) & 0x3
    }

    /// Compressed base register index.
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 7) & 0x7) as u8
    }

    /// High immediate fragment (bits 10..13).
    #[must_use]
    pub const fn imm2(self) -> u16 {
        (self.0 >> 10) & 0x7
    }
}

/// CB-format view: compressed branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CbType(u16);

impl CbType {
    /// Low offset fragment (bits 2..7).
    #[must_use]
    pub const fn offset1(self) -> u16 {
        (self.0 >> 2) & 0x1F
    }

    /// Compressed source register index.
    #[must_use]
    pub const fn rs1(self) -> u8 {
        ((self.0 >> 7) & 0x7) as u8
    }

    /// High offset fragment (bits 10..13).
    #[must_use]
    pub const fn offset2(self) -> u16 {
        (self.0 >> 10) & 0x7
    }
}

/// CJ-format view: compressed jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CjType(u16);

impl CjType {
    /// Jump target field (bits 2..13).
    #[must_use]
    pub const fn target(self) -> u16 {
        (self.0 >> 2) & 0x7FF
    }
}

/// Result of decoding a compressed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Re-encoded standard instruction, to be run through the standard
    /// execute path.
    Standard(Instruction),
    /// `C.JR`: jump to the address held in the named register.
    JumpRegister(u8),
}

/// Offset of the first compressed register in the full register file.
const COMPRESSED_REGISTER_BASE: u8 = 8;

/// Expands a compressed instruction into its standard equivalent.
///
/// # Errors
///
/// Returns the halt diagnostic for unknown quadrants, unimplemented
/// function codes, and reserved encodings.
pub fn expand(instr: CompressedInstruction) -> Result<Expansion, HaltCause> {
    let Some(opcode) = instr.opcode() else {
        return Err(HaltCause::InvalidCompressedOpcode {
            opcode: instr.opcode_bits(),
        });
    };

    match opcode {
        CompressedOpcode::C0 => expand_c0(instr),
        CompressedOpcode::C1 => expand_c1(instr),
        CompressedOpcode::C2 => expand_c2(instr),
    }
}

fn expand_c0(instr: CompressedInstruction) -> Result<Expansion, HaltCause> {
    match C0Funct::from_u8(instr.funct3()) {
        Some(C0Funct::Addi4spn) => {
            let ciw = instr.as_ciw();
            if ciw.imm() == 0 {
                return Err(HaltCause::ReservedCompressed { raw: instr.raw() });
            }

            Ok(Expansion::Standard(Instruction::encode_i(
                Opcode::OpImm,
                ciw.rd() + COMPRESSED_REGISTER_BASE,
                OpImmFunct::Addi as u8,
                SP,
                u32::from(ciw.imm()) / 4,
            )))
        }
        None => Err(HaltCause::InvalidFunction {
            family: "C0",
            funct: instr.funct3(),
        }),
    }
}

fn expand_c1(instr: CompressedInstruction) -> Result<Expansion, HaltCause> {
    let ci = instr.as_ci();
    let imm6 = u64::from((ci.imm3() << 5) | (ci.imm2() << 3) | ci.imm1());

    let expanded = match C1Funct::from_u8(instr.funct3()) {
        Some(C1Funct::Addi) => Instruction::encode_i(
            Opcode::OpImm,
            ci.rd(),
            OpImmFunct::Addi as u8,
            ci.rd(),
            sign_extend(imm6, 6) as u32,
        ),
        Some(C1Funct::Addiw) => Instruction::encode_i(
            Opcode::OpImm32,
            ci.rd(),
            OpImm32Funct::Addiw as u8,
            ci.rd(),
            sign_extend(imm6, 6) as u32,
        ),
        Some(C1Funct::Li) => Instruction::encode_i(
            Opcode::OpImm,
            ci.rd(),
            OpImmFunct::Addi as u8,
            0,
            sign_extend(imm6, 6) as u32,
        ),
        Some(C1Funct::Lui) => {
            let fragments = u64::from(
                (ci.imm3() << 9)
                    | ((ci.imm1() >> 1) << 7)
                    | ((ci.imm2() & 0b01) << 6)
                    | ((ci.imm1() & 0b001) << 5)
                    | (((ci.imm1() & 0b010) >> 1) << 4),
            );
            Instruction::encode_i(
                Opcode::OpImm,
                ci.rd(),
                OpImmFunct::Addi as u8,
                ci.rd(),
                sign_extend(fragments, 9) as u32,
            )
        }
        Some(C1Funct::Andi) => Instruction::encode_i(
            Opcode::OpImm,
            ci.rd(),
            OpImmFunct::Andi as u8,
            ci.rd(),
            sign_extend(imm6, 6) as u32,
        ),
        None => {
            return Err(HaltCause::InvalidFunction {
                family: "C1",
                funct: instr.funct3(),
            })
        }
    };

    Ok(Expansion::Standard(expanded))
}

fn expand_c2(instr: CompressedInstruction) -> Result<Expansion, HaltCause> {
    match C2Funct::from_u8(instr.funct3()) {
        Some(C2Funct::Jump) => {
            let cr = instr.as_cr();

            if cr.rd() != 0 && cr.funct4() == 0b1000 && cr.rs2() != 0 {
                // C.MV
                Ok(Expansion::Standard(Instruction::encode_r(
                    Opcode::Op,
                    cr.rd(),
                    0b000,
                    0,
                    cr.rs2(),
                    0b000_0000,
                )))
            } else if cr.rd() != 0 && cr.funct4() == 0b1000 && cr.rs2() == 0 {
                // C.JR
                Ok(Expansion::JumpRegister(cr.rd()))
            } else {
                Err(HaltCause::InvalidFunction {
                    family: "C2 jump",
                    funct: cr.funct4(),
                })
            }
        }
        Some(C2Funct::Ldsp) => {
            let ci = instr.as_ci();
            let imm = u32::from((ci.imm1() << 6) | (ci.imm3() << 5) | (ci.imm2() << 3));

            Ok(Expansion::Standard(Instruction::encode_i(
                Opcode::Load,
                ci.rd(),
                LoadFunct::Ld as u8,
                SP,
                imm,
            )))
        }
        Some(C2Funct::Sdsp) => {
            let css = instr.as_css();

            Ok(Expansion::Standard(Instruction::encode_s(
                Opcode::Store,
                StoreFunct::Sd as u8,
                SP,
                css.rs2(),
                u32::from(css.imm()),
            )))
        }
        None => Err(HaltCause::InvalidFunction {
            family: "C2",
            funct: instr.funct3(),
        }),
    }
}
