// SPDX-License-Identifier: MIT OR Apache-2.0

use bitflags::bitflags;

/// Driver-specific command selecting NVM access (`ifd_cmd`).
pub const NVM_ACCESS: u32 =
    (((((((b'E' as u32) << 4) + b'1' as u32) << 4) + b'K' as u32) << 4) + b'G' as u32) << 4 | 5;

/// Largest inline payload the driver accepts in one request, in bytes.
pub const NVM_MAX_DATA: usize = 4096;

newtype_enum! {
    /// Operation carried in [`NvmAccessHeader::command`].
    pub enum NvmCommand: u32 => {
        /// Read shadow RAM into the inline payload.
        READ  = 0xB,
        /// Write the inline payload to shadow RAM.
        WRITE = 0xC,
    }
}

bitflags! {
    /// NVM transaction flags, stored in bits 8..11 of the config word.
    ///
    /// The absence of any flag is the "continue" transaction, see
    /// [`TransFlags::CONTINUE`].
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct TransFlags: u32 {
        /// First command of a transaction, no continuation expected.
        const START_NO_CONTINUE = 0x1;
        /// Last command of a transaction.
        const LAST_COMMAND = 0x2;
        /// Single standalone command ("SA"): start and last at once.
        const START_AND_AUTO_READ = Self::START_NO_CONTINUE.bits() | Self::LAST_COMMAND.bits();
        /// Erase the addressed sector.
        const ERASE = 0x4;
        /// Ask the firmware to recompute the shadow RAM checksum.
        const CHECKSUM = 0x8;
        /// Execute a previously staged command.
        const EXECUTE = 0xF;
    }
}

impl TransFlags {
    /// Middle command of a multi-request transaction.
    pub const CONTINUE: Self = Self::empty();

    /// Position of the transaction field in the config word.
    pub const SHIFT: u32 = 8;

    /// Mask of the transaction field in the config word.
    pub const MASK: u32 = 0xf << Self::SHIFT;

    /// Place the flags in their config word field.
    #[must_use]
    pub const fn config(self) -> u32 {
        self.bits() << Self::SHIFT
    }

    /// Extract the transaction field from a config word.
    #[must_use]
    pub const fn from_config(config: u32) -> Self {
        Self::from_bits_retain((config & Self::MASK) >> Self::SHIFT)
    }
}

/// Fixed part of an NVM access request.
///
/// On the wire this is followed by `data_size` bytes of payload. All fields
/// are in host byte order, since the structure is handed to the kernel by
/// reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct NvmAccessHeader {
    pub command: NvmCommand,
    /// Module pointer (bits 0..7), transaction flags (bits 8..11) and
    /// adapter number (bits 16..31).
    pub config: u32,
    /// Byte offset into shadow RAM.
    pub offset: u32,
    /// Payload length in bytes.
    pub data_size: u32,
}

const _: () = assert!(core::mem::size_of::<NvmAccessHeader>() == NvmAccessHeader::SIZE);

impl NvmAccessHeader {
    /// Size of the header on the wire, in bytes.
    pub const SIZE: usize = 16;

    /// Mask of the module pointer field in the config word.
    pub const MODULE_POINTER_MASK: u32 = 0xff;

    /// Position of the adapter field in the config word.
    pub const ADAPTER_SHIFT: u32 = 16;

    /// Transaction flags of this request.
    #[must_use]
    pub const fn trans_flags(&self) -> TransFlags {
        TransFlags::from_config(self.config)
    }

    /// Serialize the header the way it sits in memory.
    #[must_use]
    pub fn to_ne_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        let fields = [self.command.0, self.config, self.offset, self.data_size];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_ne_bytes());
        }
        bytes
    }

    /// Parse a header from its in-memory representation.
    #[must_use]
    pub fn from_ne_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let field = |i: usize| {
            let mut word = [0; 4];
            word.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_ne_bytes(word)
        };
        Self {
            command: NvmCommand(field(0)),
            config: field(1),
            offset: field(2),
            data_size: field(3),
        }
    }
}
