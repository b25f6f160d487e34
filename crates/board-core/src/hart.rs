//! Single-hart fetch/decode/execute loop.

use crate::bus::AddressSpace;
use crate::compressed::{expand, CompressedInstruction, Expansion};
use crate::encoding::{
    is_compressed, sign_extend, BranchFunct, LoadFunct, Opcode, OpFunct, OpImm32Funct, OpImmFunct,
    StoreFunct,
};
use crate::fault::HaltCause;
use crate::instruction::Instruction;
use crate::mmio::AccessWidth;
use crate::registers::RegisterFile;

/// Size in bytes of a standard instruction.
pub const INSTRUCTION_BYTES: u64 = 4;
/// Size in bytes of a compressed instruction.
pub const COMPRESSED_INSTRUCTION_BYTES: u64 = 2;

/// One hart: a register file plus the fetch/decode/execute state machine.
///
/// A core starts halted and begins fetching after its first `reset()`.
/// Halting is terminal for the hart: the core stops advancing until the
/// next reset, while the rest of the board keeps running.
#[derive(Debug)]
pub struct Core {
    regs: RegisterFile,
    next_pc: u64,
    halted: bool,
    cause: Option<HaltCause>,
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Core {
    /// Creates a halted core.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            next_pc: 0,
            halted: true,
            cause: None,
        }
    }

    /// The register file, for inspection.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// The register file, for mutation.
    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// `true` once the core has stopped fetching.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// The latched halt diagnostic, if the core halted on one.
    #[must_use]
    pub const fn halt_cause(&self) -> Option<&HaltCause> {
        self.cause.as_ref()
    }

    /// Zeroes every register and the pc and clears the halt latch.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.next_pc = 0;
        self.halted = false;
        self.cause = None;
    }

    /// Advances the hart by exactly one instruction; no-op while halted.
    ///
    /// On success every mapped MMIO device is ticked once (one simulated
    /// clock edge per instruction retirement) and the pc commits. Any
    /// fault turns into a terminal halt with its diagnostic.
    pub fn step(&mut self, bus: &mut AddressSpace) {
        if self.halted {
            return;
        }

        match self.fetch_and_dispatch(bus) {
            Ok(()) => {
                bus.tick_devices();
                self.regs.set_pc(self.next_pc);
            }
            Err(cause) => self.halt(cause),
        }
    }

    fn halt(&mut self, cause: HaltCause) {
        log::error!("halted core at {:#x}: {cause}", self.regs.pc());
        self.cause = Some(cause);
        self.halted = true;
    }

    fn fetch_and_dispatch(&mut self, bus: &mut AddressSpace) -> Result<(), HaltCause> {
        let pc = self.regs.pc();
        let first = bus.load(pc, AccessWidth::Byte)? as u8;

        if is_compressed(first) {
            let raw = bus.load(pc, AccessWidth::Half)? as u16;
            self.next_pc = pc.wrapping_add(COMPRESSED_INSTRUCTION_BYTES);
            self.dispatch_compressed(CompressedInstruction::from_raw(raw), bus)
        } else {
            let raw = bus.load(pc, AccessWidth::Word)? as u32;
            self.next_pc = pc.wrapping_add(INSTRUCTION_BYTES);
            self.dispatch(Instruction::from_raw(raw), bus)
        }
    }

    fn dispatch_compressed(
        &mut self,
        instr: CompressedInstruction,
        bus: &mut AddressSpace,
    ) -> Result<(), HaltCause> {
        match expand(instr)? {
            Expansion::Standard(expanded) => self.dispatch(expanded, bus),
            Expansion::JumpRegister(rs) => {
                log::trace!("({:#x}) C.JR x{rs}", self.regs.pc());
                self.next_pc = self.regs.read(rs);
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, instr: Instruction, bus: &mut AddressSpace) -> Result<(), HaltCause> {
        let Some(opcode) = instr.opcode() else {
            return Err(HaltCause::InvalidOpcode {
                opcode: instr.opcode_bits(),
            });
        };

        match opcode {
            Opcode::OpImm => self.execute_op_imm(instr),
            Opcode::OpImm32 => self.execute_op_imm32(instr),
            Opcode::Op => self.execute_op(instr),
            Opcode::Store => self.execute_store(instr, bus),
            Opcode::Load => self.execute_load(instr, bus),
            Opcode::Branch => self.execute_branch(instr),
            Opcode::Auipc => {
                let u = instr.as_u();
                log::trace!(
                    "({:#x}) AUIPC x{}, {:#x}",
                    self.regs.pc(),
                    u.rd(),
                    u.immediate()
                );
                self.regs
                    .write(u.rd(), self.regs.pc().wrapping_add(u64::from(u.immediate())));
                Ok(())
            }
            Opcode::Lui => {
                let u = instr.as_u();
                log::trace!(
                    "({:#x}) LUI x{}, {:#x}",
                    self.regs.pc(),
                    u.rd(),
                    u.immediate()
                );
                self.regs
                    .write(u.rd(), sign_extend(u64::from(u.immediate()), 32));
                Ok(())
            }
            Opcode::Jal => {
                let j = instr.as_j();
                let offset = sign_extend(u64::from(j.immediate()), 20).wrapping_mul(2);
                let target = self.regs.pc().wrapping_add(offset);
                log::trace!("({:#x}) JAL x{}, {target:#x}", self.regs.pc(), j.rd());

                let link = self.next_pc;
                self.next_pc = target;
                self.regs.write(j.rd(), link);
                Ok(())
            }
            Opcode::Jalr => {
                let i = instr.as_i();
                let offset = sign_extend(u64::from(i.immediate()), 12);
                log::trace!(
                    "({:#x}) JALR x{}, x{}, {:#x}",
                    self.regs.pc(),
                    i.rd(),
                    i.rs1(),
                    offset as i64
                );

                let link = self.next_pc;
                self.next_pc = self.regs.read(i.rs1()).wrapping_add(offset) & !1;
                self.regs.write(i.rd(), link);
                Ok(())
            }
        }
    }

    fn execute_op(&mut self, instr: Instruction) -> Result<(), HaltCause> {
        let r = instr.as_r();

        match OpFunct::from_parts(r.funct3(), r.funct7()) {
            Some(OpFunct::Add) => {
                log::trace!(
                    "({:#x}) ADD x{}, x{}, x{}",
                    self.regs.pc(),
                    r.rd(),
                    r.rs1(),
                    r.rs2()
                );
                self.regs.write(
                    r.rd(),
                    self.regs.read(r.rs1()).wrapping_add(self.regs.read(r.rs2())),
                );
                Ok(())
            }
            None => Err(HaltCause::InvalidFunction {
                family: "OP",
                funct: r.funct3(),
            }),
        }
    }

    fn execute_op_imm(&mut self, instr: Instruction) -> Result<(), HaltCause> {
        let i = instr.as_i();
        let imm = sign_extend(u64::from(i.immediate()), 12);
        let rs1 = self.regs.read(i.rs1());

        let value = match OpImmFunct::from_u8(instr.funct3()) {
            Some(OpImmFunct::Addi) => {
                log::trace!(
                    "({:#x}) ADDI x{}, x{}, {:#x}",
                    self.regs.pc(),
                    i.rd(),
                    i.rs1(),
                    imm as i64
                );
                rs1.wrapping_add(imm)
            }
            Some(OpImmFunct::Xori) => {
                log::trace!(
                    "({:#x}) XORI x{}, x{}, {:#x}",
                    self.regs.pc(),
                    i.rd(),
                    i.rs1(),
                    imm as i64
                );
                rs1 ^ imm
            }
            Some(OpImmFunct::Ori) => {
                log::trace!(
                    "({:#x}) ORI x{}, x{}, {:#x}",
                    self.regs.pc(),
                    i.rd(),
                    i.rs1(),
                    imm as i64
                );
                rs1 | imm
            }
            Some(OpImmFunct::Andi) => {
                log::trace!(
                    "({:#x}) ANDI x{}, x{}, {:#x}",
                    self.regs.pc(),
                    i.rd(),
                    i.rs1(),
                    imm as i64
                );
                rs1 & imm
            }
            None => {
                return Err(HaltCause::InvalidFunction {
                    family: "OP-IMM",
                    funct: instr.funct3(),
                })
            }
        };

        self.regs.write(i.rd(), value);
        Ok(())
    }

    fn execute_op_imm32(&mut self, instr: Instruction) -> Result<(), HaltCause> {
        let i = instr.as_i();

        match OpImm32Funct::from_u8(instr.funct3()) {
            Some(OpImm32Funct::Addiw) => {
                let imm = sign_extend(u64::from(i.immediate()), 12);
                log::trace!(
                    "({:#x}) ADDIW x{}, x{}, {:#x}",
                    self.regs.pc(),
                    i.rd(),
                    i.rs1(),
                    imm as i64
                );

                let sum = self.regs.read(i.rs1()).wrapping_add(imm) & 0xFFFF_FFFF;
                self.regs.write(i.rd(), sign_extend(sum, 32));
                Ok(())
            }
            None => Err(HaltCause::InvalidFunction {
                family: "OP-IMM-32",
                funct: instr.funct3(),
            }),
        }
    }

    fn execute_branch(&mut self, instr: Instruction) -> Result<(), HaltCause> {
        let b = instr.as_b();
        let offset = sign_extend(u64::from(b.immediate()), 20).wrapping_mul(2);
        let target = self.regs.pc().wrapping_add(offset);

        let taken = match BranchFunct::from_u8(instr.funct3()) {
            Some(BranchFunct::Beq) => {
                log::trace!(
                    "({:#x}) BEQ x{}, x{}, {target:#x}",
                    self.regs.pc(),
                    b.rs1(),
                    b.rs2()
                );
                self.regs.read(b.rs1()) == self.regs.read(b.rs2())
            }
            Some(BranchFunct::Bne) => {
                log::trace!(
                    "({:#x}) BNE x{}, x{}, {target:#x}",
                    self.regs.pc(),
                    b.rs1(),
                    b.rs2()
                );
                self.regs.read(b.rs1()) != self.regs.read(b.rs2())
            }
            None => {
                return Err(HaltCause::InvalidFunction {
                    family: "BRANCH",
                    funct: instr.funct3(),
                })
            }
        };

        if taken {
            self.next_pc = target;
        }
        Ok(())
    }

    fn execute_load(&mut self, instr: Instruction, bus: &mut AddressSpace) -> Result<(), HaltCause> {
        let i = instr.as_i();
        let rs1 = self.regs.read(i.rs1());

        let value = match LoadFunct::from_u8(instr.funct3()) {
            Some(LoadFunct::Lb) => {
                let offset = sign_extend(u64::from(i.immediate()), 12);
                log::trace!(
                    "({:#x}) LB x{}, {:#x}(x{})",
                    self.regs.pc(),
                    i.rd(),
                    offset as i64,
                    i.rs1()
                );
                bus.load(rs1.wrapping_add(offset), AccessWidth::Byte)?
            }
            Some(LoadFunct::Ld) => {
                let offset = sign_extend(u64::from(i.immediate()), 12);
                log::trace!(
                    "({:#x}) LD x{}, {:#x}(x{})",
                    self.regs.pc(),
                    i.rd(),
                    offset as i64,
                    i.rs1()
                );
                bus.load(rs1.wrapping_add(offset), AccessWidth::Double)?
            }
            Some(LoadFunct::Lbu) => {
                log::trace!(
                    "({:#x}) LBU x{}, {:#x}(x{})",
                    self.regs.pc(),
                    i.rd(),
                    i.immediate(),
                    i.rs1()
                );
                bus.load(rs1.wrapping_add(u64::from(i.immediate())), AccessWidth::Byte)?
            }
            None => {
                return Err(HaltCause::InvalidFunction {
                    family: "LOAD",
                    funct: instr.funct3(),
                })
            }
        };

        self.regs.write(i.rd(), value);
        Ok(())
    }

    fn execute_store(
        &mut self,
        instr: Instruction,
        bus: &mut AddressSpace,
    ) -> Result<(), HaltCause> {
        let s = instr.as_s();
        let offset = sign_extend(u64::from(s.immediate()), 12);
        let address = self.regs.read(s.rs1()).wrapping_add(offset);
        let value = self.regs.read(s.rs2());

        let (width, mnemonic) = match StoreFunct::from_u8(instr.funct3()) {
            Some(StoreFunct::Sb) => (AccessWidth::Byte, "SB"),
            Some(StoreFunct::Sh) => (AccessWidth::Half, "SH"),
            Some(StoreFunct::Sw) => (AccessWidth::Word, "SW"),
            Some(StoreFunct::Sd) => (AccessWidth::Double, "SD"),
            None => {
                return Err(HaltCause::InvalidFunction {
                    family: "STORE",
                    funct: instr.funct3(),
                })
            }
        };

        log::trace!(
            "({:#x}) {mnemonic} x{}, {:#x}(x{})",
            self.regs.pc(),
            s.rs2(),
            offset as i64,
            s.rs1()
        );
        bus.store(address, width, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Core;
    use crate::bus::{AddressSpace, MappedDevice};
    use crate::encoding::Opcode;
    use crate::fault::{BusFault, HaltCause};
    use crate::instruction::Instruction;
    use crate::mmio::{AccessWidth, Memory, Mmio};

    fn harness() -> (Core, AddressSpace) {
        let mut space = AddressSpace::new();
        space.add_device(MappedDevice::new(
            "RAM",
            0x0,
            Mmio::Memory(Memory::new(0x1_0000)),
        ));

        let mut core = Core::new();
        core.reset();
        (core, space)
    }

    fn emit(space: &mut AddressSpace, address: u64, instr: Instruction) {
        space
            .store(address, AccessWidth::Word, u64::from(instr.raw()))
            .unwrap();
    }

    #[test]
    fn cores_start_halted_until_reset() {
        let (_, mut space) = harness();
        let mut core = Core::new();

        assert!(core.is_halted());
        core.step(&mut space);
        assert_eq!(core.registers().pc(), 0);

        core.reset();
        assert!(!core.is_halted());
    }

    #[test]
    fn addi_adds_a_sign_extended_immediate_and_advances_pc() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 5);
        emit(&mut space, 0, Instruction::encode_i(Opcode::OpImm, 2, 0, 1, 3));

        core.step(&mut space);

        assert_eq!(core.registers().read(2), 8);
        assert_eq!(core.registers().pc(), 4);
    }

    #[test]
    fn addi_with_all_ones_immediate_subtracts_one() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 5);
        emit(
            &mut space,
            0,
            Instruction::encode_i(Opcode::OpImm, 2, 0, 1, 0xFFF),
        );

        core.step(&mut space);

        assert_eq!(core.registers().read(2), 4);
    }

    #[rstest]
    #[case(0b100, 0b1100, 0b1010, 0b0110)]
    #[case(0b110, 0b1100, 0b1010, 0b1110)]
    #[case(0b111, 0b1100, 0b1010, 0b1000)]
    fn logical_op_imm_functions_apply_their_operator(
        #[case] funct3: u8,
        #[case] rs1_value: u64,
        #[case] imm: u32,
        #[case] expected: u64,
    ) {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, rs1_value);
        emit(
            &mut space,
            0,
            Instruction::encode_i(Opcode::OpImm, 2, funct3, 1, imm),
        );

        core.step(&mut space);

        assert_eq!(core.registers().read(2), expected);
    }

    #[test]
    fn addiw_truncates_to_32_bits_and_re_sign_extends() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 0x7FFF_FFFF);
        emit(
            &mut space,
            0,
            Instruction::encode_i(Opcode::OpImm32, 2, 0, 1, 1),
        );

        core.step(&mut space);

        assert_eq!(core.registers().read(2), 0xFFFF_FFFF_8000_0000);
    }

    #[test]
    fn lui_sign_extends_from_bit_31() {
        let (mut core, mut space) = harness();
        emit(
            &mut space,
            0,
            Instruction::encode_u(Opcode::Lui, 1, 0x8000_0000),
        );
        emit(
            &mut space,
            4,
            Instruction::encode_u(Opcode::Lui, 2, 0x6000_0000),
        );

        core.step(&mut space);
        core.step(&mut space);

        assert_eq!(core.registers().read(1), 0xFFFF_FFFF_8000_0000);
        assert_eq!(core.registers().read(2), 0x6000_0000);
    }

    #[test]
    fn auipc_is_pc_relative() {
        let (mut core, mut space) = harness();
        core.registers_mut().set_pc(0x100);
        emit(
            &mut space,
            0x100,
            Instruction::encode_u(Opcode::Auipc, 1, 0x0000_1000),
        );

        core.step(&mut space);

        assert_eq!(core.registers().read(1), 0x1100);
    }

    #[test]
    fn jal_links_past_the_jump_and_retargets_pc() {
        let (mut core, mut space) = harness();
        core.registers_mut().set_pc(0x1000);
        // JAL x1 with offset bits [10:1] = 4, a byte offset of 8.
        let raw: u32 = (4 << 21) | (1 << 7) | 0x6F;
        space
            .store(0x1000, AccessWidth::Word, u64::from(raw))
            .unwrap();

        core.step(&mut space);

        assert_eq!(core.registers().pc(), 0x1008);
        assert_eq!(core.registers().read(1), 0x1004);
    }

    #[test]
    fn jalr_clears_the_low_target_bit_and_links() {
        let (mut core, mut space) = harness();
        core.registers_mut().set_pc(0x40);
        core.registers_mut().write(5, 0x2001);
        emit(
            &mut space,
            0x40,
            Instruction::encode_i(Opcode::Jalr, 1, 0, 5, 4),
        );

        core.step(&mut space);

        assert_eq!(core.registers().pc(), 0x2004);
        assert_eq!(core.registers().read(1), 0x44);
    }

    #[test]
    fn branches_retarget_only_when_taken() {
        // BEQ x1, x2 with a byte offset of 8.
        let beq: u32 = (2 << 20) | (1 << 15) | (4 << 8) | 0x63;

        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 7);
        core.registers_mut().write(2, 7);
        space.store(0, AccessWidth::Word, u64::from(beq)).unwrap();
        core.step(&mut space);
        assert_eq!(core.registers().pc(), 8);

        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 7);
        core.registers_mut().write(2, 9);
        space.store(0, AccessWidth::Word, u64::from(beq)).unwrap();
        core.step(&mut space);
        assert_eq!(core.registers().pc(), 4);
    }

    #[test]
    fn stores_and_loads_round_trip_through_the_bus() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 0x800);
        core.registers_mut().write(2, 0x1122_3344_5566_7788);

        emit(&mut space, 0, Instruction::encode_s(Opcode::Store, 0b011, 1, 2, 8));
        emit(&mut space, 4, Instruction::encode_i(Opcode::Load, 3, 0b011, 1, 8));
        emit(&mut space, 8, Instruction::encode_i(Opcode::Load, 4, 0b000, 1, 8));

        core.step(&mut space);
        core.step(&mut space);
        core.step(&mut space);

        assert_eq!(core.registers().read(3), 0x1122_3344_5566_7788);
        // Loads zero-extend the fetched bytes.
        assert_eq!(core.registers().read(4), 0x88);
    }

    #[test]
    fn invalid_opcodes_halt_with_a_diagnostic() {
        let (mut core, mut space) = harness();
        space
            .store(0, AccessWidth::Word, 0b111_0011)
            .unwrap();

        core.step(&mut space);

        assert!(core.is_halted());
        assert_eq!(
            core.halt_cause(),
            Some(&HaltCause::InvalidOpcode { opcode: 0b111_0011 })
        );
        // Terminal: further steps do not advance.
        core.step(&mut space);
        assert_eq!(core.registers().pc(), 0);
    }

    #[test]
    fn unmapped_fetch_halts_with_a_bus_fault() {
        let (mut core, mut space) = harness();
        core.registers_mut().set_pc(0xFFFF_0000);

        core.step(&mut space);

        assert!(core.is_halted());
        assert_eq!(
            core.halt_cause(),
            Some(&HaltCause::Bus(BusFault::AccessFault {
                address: 0xFFFF_0000,
                width: 1,
            }))
        );
    }

    #[test]
    fn unmapped_load_halts_the_core() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 0x9000_0000);
        emit(&mut space, 0, Instruction::encode_i(Opcode::Load, 2, 0b011, 1, 0));

        core.step(&mut space);

        assert!(core.is_halted());
    }

    #[test]
    fn reset_clears_the_halt_and_registers() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 0x9000_0000);
        emit(&mut space, 0, Instruction::encode_i(Opcode::Load, 2, 0b011, 1, 0));
        core.step(&mut space);
        assert!(core.is_halted());

        core.reset();

        assert!(!core.is_halted());
        assert_eq!(core.halt_cause(), None);
        assert_eq!(core.registers().read(1), 0);
        assert_eq!(core.registers().pc(), 0);
    }

    #[test]
    fn compressed_instructions_execute_through_the_standard_path() {
        let (mut core, mut space) = harness();
        // C.LI x5, 1 then C.ADDI x5, 2.
        space.store(0, AccessWidth::Half, 0x4285).unwrap();
        let c_addi = (5 << 7) | (2 << 2) | 0b01;
        space.store(2, AccessWidth::Half, c_addi).unwrap();

        core.step(&mut space);
        assert_eq!(core.registers().read(5), 1);
        assert_eq!(core.registers().pc(), 2);

        core.step(&mut space);
        assert_eq!(core.registers().read(5), 3);
        assert_eq!(core.registers().pc(), 4);
    }

    #[test]
    fn c_jr_jumps_to_the_register_value() {
        let (mut core, mut space) = harness();
        core.registers_mut().write(1, 0x2000);
        space.store(0, AccessWidth::Half, 0x8082).unwrap();

        core.step(&mut space);

        assert_eq!(core.registers().pc(), 0x2000);
    }

    #[test]
    fn reserved_compressed_encodings_halt() {
        let (mut core, mut space) = harness();
        // C.ADDI4SPN with a zero immediate field.
        space.store(0, AccessWidth::Half, 0b0000_0000_0000_1000).unwrap();

        core.step(&mut space);

        assert!(core.is_halted());
        assert!(matches!(
            core.halt_cause(),
            Some(HaltCause::ReservedCompressed { .. })
        ));
    }
}
