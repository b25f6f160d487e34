//! Cycle-stepped emulator of a small RISC-V board.
//!
//! An RV64 core subset with compressed-instruction support, a
//! memory-mapped bus dispatching to peripherals (RAM/flash, UART, GPIO),
//! and a pin-level track-signaling layer connecting peripherals to other
//! board components (buttons, LEDs, headers), orchestrated by a
//! convergence-sweep board scheduler.

/// Board orchestration and the power-up convergence loop.
pub mod board;
pub use board::{Board, PowerOutcome, PowerSwitch};

/// Address-space dispatcher over mapped MMIO devices.
pub mod bus;
pub use bus::{AddressSpace, MappedDevice, MmioId, PinHandle};

/// Compressed (RVC) instruction words, format views, and expansion.
pub mod compressed;
pub use compressed::{expand, CompressedInstruction, Expansion};

/// Connectable capability: named track bindings plus layout attributes.
pub mod connect;
pub use connect::Connector;

/// The stock demo board topology.
pub mod demo;
pub use demo::{demo_board, DemoBoard};

/// Closed set of schedulable board components.
pub mod devices;
pub use devices::{BoardDevice, Button, CpuDevice, DeviceId, Led, PinHeader};

/// Presentation-boundary types for the rendering collaborator.
pub mod draw;
pub use draw::{Color, Frame, InputState, Shape, Vec2};

/// Opcode and function-code classification for the implemented subset.
pub mod encoding;
pub use encoding::{is_compressed, sign_extend, Opcode};

/// Fault and halt taxonomy.
pub mod fault;
pub use fault::{BusFault, HaltCause};

/// Single-hart fetch/decode/execute loop.
pub mod hart;
pub use hart::{Core, COMPRESSED_INSTRUCTION_BYTES, INSTRUCTION_BYTES};

/// Standard 32-bit instruction words and format views.
pub mod instruction;
pub use instruction::Instruction;

/// ELF64 image loader.
pub mod loader;
pub use loader::{load_elf, load_elf_bytes, ElfLoadError};

/// Memory-mapped peripherals and their common raw-access model.
pub mod mmio;
pub use mmio::{AccessWidth, Gpio, IoPin, Memory, Mmio, Uart};

/// General-purpose register file.
pub mod registers;
pub use registers::{RegisterFile, REGISTER_COUNT};

/// Named directional wires between board components.
pub mod track;
pub use track::{Direction, Track};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
