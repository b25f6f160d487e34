use thiserror::Error;

/// Faults raised by bus dispatch during fetch, load, or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusFault {
    /// No mapped device fully contains the requested access span.
    #[error("access fault at {address:#x} ({width}-byte access)")]
    AccessFault {
        /// First byte of the faulting span.
        address: u64,
        /// Access width in bytes.
        width: u8,
    },
    /// Misaligned multi-byte access. Declared as a distinct condition but
    /// not raised by the current dispatch logic, which stays
    /// byte-addressable.
    #[error("unaligned {width}-byte access at {address:#x}")]
    UnalignedAccess {
        /// First byte of the faulting span.
        address: u64,
        /// Access width in bytes.
        width: u8,
    },
}

impl BusFault {
    /// Returns the faulting address.
    #[must_use]
    pub const fn address(self) -> u64 {
        match self {
            Self::AccessFault { address, .. } | Self::UnalignedAccess { address, .. } => address,
        }
    }
}

/// Terminal halt diagnostics for one hart.
///
/// Any of these stops the core from fetching until an explicit reset; the
/// rest of the board keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HaltCause {
    /// The 7-bit major opcode is not in the implemented set.
    #[error("invalid instruction opcode {opcode:#04x}")]
    InvalidOpcode {
        /// Raw 7-bit opcode field.
        opcode: u8,
    },
    /// The function code within an implemented opcode family is unknown.
    #[error("invalid {family} function {funct:#x}")]
    InvalidFunction {
        /// Opcode family the function code belongs to.
        family: &'static str,
        /// Raw function-code value.
        funct: u8,
    },
    /// The 2-bit compressed opcode is not a compressed quadrant.
    #[error("unknown compressed opcode {opcode:#x}")]
    InvalidCompressedOpcode {
        /// Raw 2-bit opcode field.
        opcode: u8,
    },
    /// A compressed encoding whose fields are architecturally reserved.
    #[error("illegal compressed instruction {raw:#06x}")]
    ReservedCompressed {
        /// Raw 16-bit instruction word.
        raw: u16,
    },
    /// Bus dispatch faulted during fetch, load, or store.
    #[error(transparent)]
    Bus(#[from] BusFault),
}
