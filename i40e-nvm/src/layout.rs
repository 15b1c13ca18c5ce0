// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed shadow RAM layout of the i40e NVM.
//!
//! Offsets are 16-bit word indices, as in the X710/XL710 datasheet.

use core::fmt;

/// Index of a 16-bit word in shadow RAM.
///
/// The driver addresses shadow RAM in bytes, so the only way to turn this
/// into a request offset is [`WordOffset::byte_offset`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WordOffset(pub u16);

impl WordOffset {
    /// Byte address of this word, as carried in a request header.
    #[must_use]
    pub const fn byte_offset(self) -> u32 {
        self.0 as u32 * 2
    }

    /// Offset `words` further, wrapping at 16 bits like the firmware does.
    #[must_use]
    pub const fn wrapping_add(self, words: u16) -> Self {
        Self(self.0.wrapping_add(words))
    }
}

impl fmt::Display for WordOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// EMP SR settings pointer.
pub const EMP_SR_SETTINGS_PTR: WordOffset = WordOffset(0x48);

/// Set in the EMP SR pointer when it counts 4 KiB sectors instead of words.
pub const EMP_SR_4K_UNITS: u16 = 0x8000;

/// PHY Capability LAN 0 pointer, relative to the EMP SR settings.
pub const PHY_CAP_LAN0_PTR: u16 = 0x19;

/// Length of PHY Capability data structure 0, in words.
pub const PHY_CAP_SIZE: usize = 0x0d;

/// Index of the section length within the PHY Capability block.
pub const SECTION_LENGTH_INDEX: usize = 0x00;

/// Index of PHY Capabilities Misc0 within the PHY Capability block.
pub const MISC0_INDEX: usize = 0x08;

/// Index of the 40 LESM timer values within the PHY Capability block.
pub const LESM_TIMER_INDEX: usize = 0x0a;

/// Expected section length of the PHY Capability block.
pub const SECTION_LENGTH_EXPECTED: u16 = 0x000b;

/// Expected 40 LESM timer values.
pub const LESM_TIMER_EXPECTED: u16 = 0x0a1e;

/// Distance between the Misc0 fields of consecutive lanes, in words.
pub const LANE_STRIDE: u16 = 0x0c;

/// Number of lanes carrying a Misc0 field.
pub const LANE_COUNT: u8 = 4;

/// Misc0 bit restricting the adapter to qualified modules.
pub const MISC0_UNLOCK_BIT: u16 = 1 << 11;

/// Word addressed by checksum recompute requests.
pub const CHECKSUM_TRIGGER: WordOffset = WordOffset(0);

/// Word offset of the Misc0 field of `lane`, given the resolved block offset.
#[must_use]
pub const fn misc0_offset(phy_cap: WordOffset, lane: u8) -> WordOffset {
    phy_cap.wrapping_add(lane as u16 * LANE_STRIDE + MISC0_INDEX as u16)
}
