//! ELF64 image loader feeding the bus one byte-store at a time.

use std::fs;
use std::io;
use std::path::Path;

use elf::endian::AnyEndian;
use elf::file::Class;
use elf::ElfBytes;
use thiserror::Error;

use crate::bus::AddressSpace;
use crate::fault::BusFault;
use crate::mmio::AccessWidth;

/// Failure while reading or applying an ELF image.
///
/// Loading reports failure instead of raising; the caller decides whether
/// a missing kernel is fatal.
#[derive(Debug, Error)]
pub enum ElfLoadError {
    /// The file could not be opened or read.
    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),
    /// The image is not a parseable ELF object.
    #[error("failed to parse image: {0}")]
    Parse(#[from] elf::ParseError),
    /// The image is not a 64-bit ELF object.
    #[error("image is not ELF64")]
    NotElf64,
    /// The program header table points outside the file image.
    #[error("segment data at file offset {offset:#x} is outside the image")]
    Truncated {
        /// First file offset that fell outside the image.
        offset: u64,
    },
    /// A segment byte landed outside any mapped device.
    #[error("segment byte rejected by the bus: {0}")]
    Bus(#[from] BusFault),
}

/// Loads the ELF64 image at `path` into the address space.
///
/// # Errors
///
/// Returns [`ElfLoadError`] when the file cannot be read, is not a valid
/// ELF64 object, or a segment byte targets unmapped address space.
pub fn load_elf(space: &mut AddressSpace, path: &Path) -> Result<(), ElfLoadError> {
    let image = fs::read(path)?;
    load_elf_bytes(space, &image)
}

/// Loads an in-memory ELF64 image into the address space.
///
/// Each loadable segment's `p_filesz` bytes are copied from file offset
/// `p_offset` to address `p_paddr` with individual byte stores, so loading
/// participates in the same mapping and fault checks as any other bus
/// write. Bytes between `p_filesz` and `p_memsz` are not explicitly
/// zero-filled; backing storage allocates zeroed.
///
/// # Errors
///
/// Returns [`ElfLoadError`] when the image does not parse as ELF64 or a
/// segment byte targets unmapped address space.
pub fn load_elf_bytes(space: &mut AddressSpace, image: &[u8]) -> Result<(), ElfLoadError> {
    let file: ElfBytes<'_, AnyEndian> = ElfBytes::minimal_parse(image)?;
    if file.ehdr.class != Class::ELF64 {
        return Err(ElfLoadError::NotElf64);
    }

    let Some(segments) = file.segments() else {
        return Ok(());
    };

    for header in segments.iter() {
        if header.p_type != elf::abi::PT_LOAD {
            continue;
        }

        for offset in 0..header.p_filesz {
            let file_offset = header.p_offset + offset;
            let byte = image
                .get(file_offset as usize)
                .copied()
                .ok_or(ElfLoadError::Truncated {
                    offset: file_offset,
                })?;
            space.store(header.p_paddr + offset, AccessWidth::Byte, u64::from(byte))?;
        }

        log::info!(
            "mapped segment to {:#x}:{:#x}",
            header.p_paddr,
            header.p_paddr + header.p_memsz
        );
    }

    Ok(())
}
