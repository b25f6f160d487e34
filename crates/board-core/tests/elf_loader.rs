//! ELF64 loading against synthesized images.

use board_core as _;
use elf as _;
use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use std::path::Path;

use board_core::bus::{AddressSpace, MappedDevice};
use board_core::loader::{load_elf, load_elf_bytes, ElfLoadError};
use board_core::mmio::{AccessWidth, Memory, Mmio};

const EHDR_BYTES: usize = 64;
const PHDR_BYTES: usize = 56;

fn put_u16(image: &mut [u8], offset: usize, value: u16) {
    image[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(image: &mut [u8], offset: usize, value: u64) {
    image[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Builds a minimal ELF64 executable whose loadable segments carry the
/// given payloads at the given physical addresses.
fn elf64(segments: &[(u64, &[u8])]) -> Vec<u8> {
    let table_end = EHDR_BYTES + PHDR_BYTES * segments.len();
    let mut image = vec![0_u8; table_end];

    image[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    image[4] = 2; // ELFCLASS64
    image[5] = 1; // little-endian
    image[6] = 1; // EV_CURRENT
    put_u16(&mut image, 16, 2); // ET_EXEC
    put_u16(&mut image, 18, 0xF3); // EM_RISCV
    put_u32(&mut image, 20, 1); // e_version
    put_u64(&mut image, 32, EHDR_BYTES as u64); // e_phoff
    put_u16(&mut image, 52, EHDR_BYTES as u16); // e_ehsize
    put_u16(&mut image, 54, PHDR_BYTES as u16); // e_phentsize
    put_u16(&mut image, 56, segments.len() as u16); // e_phnum

    let mut data_offset = table_end as u64;
    for (index, (paddr, payload)) in segments.iter().enumerate() {
        let phdr = EHDR_BYTES + PHDR_BYTES * index;
        put_u32(&mut image, phdr, 1); // PT_LOAD
        put_u64(&mut image, phdr + 8, data_offset); // p_offset
        put_u64(&mut image, phdr + 16, *paddr); // p_vaddr
        put_u64(&mut image, phdr + 24, *paddr); // p_paddr
        put_u64(&mut image, phdr + 32, payload.len() as u64); // p_filesz
        put_u64(&mut image, phdr + 40, payload.len() as u64 + 16); // p_memsz
        put_u64(&mut image, phdr + 48, 1); // p_align
        data_offset += payload.len() as u64;
    }

    for (_, payload) in segments {
        image.extend_from_slice(payload);
    }

    image
}

fn space_with_ram() -> AddressSpace {
    let mut space = AddressSpace::new();
    space.add_device(MappedDevice::new(
        "RAM",
        0x0,
        Mmio::Memory(Memory::new(0x1_0000)),
    ));
    space
}

#[test]
fn segments_land_byte_for_byte_at_their_physical_address() {
    let mut space = space_with_ram();
    let image = elf64(&[(0x0, b"RISC"), (0x100, &[0x13, 0x05, 0x00, 0x00])]);

    load_elf_bytes(&mut space, &image).expect("image loads");

    assert_eq!(space.load(0x0, AccessWidth::Byte).unwrap(), u64::from(b'R'));
    assert_eq!(space.load(0x3, AccessWidth::Byte).unwrap(), u64::from(b'C'));
    assert_eq!(space.load(0x100, AccessWidth::Word).unwrap(), 0x0000_0513);

    // Bytes beyond p_filesz stay at backing storage's default zero.
    assert_eq!(space.load(0x104, AccessWidth::Word).unwrap(), 0);
}

#[test]
fn an_image_without_segments_loads_nothing() {
    let mut space = space_with_ram();
    let image = elf64(&[]);

    load_elf_bytes(&mut space, &image).expect("empty image loads");
    assert_eq!(space.load(0x0, AccessWidth::Double).unwrap(), 0);
}

#[test]
fn garbage_bytes_are_rejected_as_a_parse_failure() {
    let mut space = space_with_ram();

    let result = load_elf_bytes(&mut space, b"not an elf image");
    assert!(matches!(result, Err(ElfLoadError::Parse(_))));
}

#[test]
fn a_32_bit_image_is_rejected() {
    let mut space = space_with_ram();
    let mut image = elf64(&[]);
    image[4] = 1; // ELFCLASS32

    let result = load_elf_bytes(&mut space, &image);
    assert!(matches!(
        result,
        Err(ElfLoadError::NotElf64) | Err(ElfLoadError::Parse(_))
    ));
}

#[test]
fn a_segment_outside_the_file_image_is_truncated() {
    let mut space = space_with_ram();
    let mut image = elf64(&[(0x0, b"RISC")]);
    // Point the segment's file offset past the end of the image.
    put_u64(&mut image, EHDR_BYTES + 8, 0x10_0000);

    let result = load_elf_bytes(&mut space, &image);
    assert!(matches!(result, Err(ElfLoadError::Truncated { .. })));
}

#[test]
fn a_segment_targeting_unmapped_space_reports_the_bus_fault() {
    let mut space = space_with_ram();
    let image = elf64(&[(0x9000_0000, b"RISC")]);

    let result = load_elf_bytes(&mut space, &image);
    assert!(matches!(result, Err(ElfLoadError::Bus(_))));
}

#[test]
fn a_missing_file_is_an_io_failure_the_caller_decides_about() {
    let mut space = space_with_ram();

    let result = load_elf(&mut space, Path::new("/nonexistent/kernel.elf"));
    assert!(matches!(result, Err(ElfLoadError::Io(_))));
}
