// SPDX-License-Identifier: MIT OR Apache-2.0

//! PHY Capability data structure 0.
//!
//! The structure is not at a fixed address. It is found by following two
//! pointers: the EMP SR settings pointer at a fixed word, then the PHY
//! Capability LAN 0 pointer stored at a fixed distance from the EMP SR
//! settings, which is relative to its own location.

use crate::channel::DriverChannel;
use crate::layout::{
    WordOffset, EMP_SR_4K_UNITS, EMP_SR_SETTINGS_PTR, LESM_TIMER_EXPECTED, LESM_TIMER_INDEX,
    MISC0_INDEX, MISC0_UNLOCK_BIT, PHY_CAP_LAN0_PTR, PHY_CAP_SIZE, SECTION_LENGTH_EXPECTED,
    SECTION_LENGTH_INDEX,
};
use crate::{Error, Nvm, Result, Step};
use core::fmt;
use log::debug;

/// Result of walking the pointer chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhyCapPointers {
    /// Raw EMP SR settings pointer.
    pub emp_sr: u16,
    /// Location of the PHY Capability LAN 0 pointer.
    pub lan0_pointer: WordOffset,
    /// Location of PHY Capability data structure 0.
    pub offset: WordOffset,
}

/// Read the raw EMP SR settings pointer.
pub fn read_emp_sr_pointer<C: DriverChannel>(nvm: &mut Nvm<C>) -> Result<u16> {
    let emp_sr = nvm.read_word(EMP_SR_SETTINGS_PTR, Step::EmpSrPointer)?;
    debug!("EMP SR settings pointer: {emp_sr:#06x}");
    Ok(emp_sr)
}

/// Follow the PHY Capability LAN 0 pointer from a raw EMP SR pointer.
///
/// Fails with [`Error::UnsupportedLayout`] without touching the adapter if
/// `emp_sr` counts 4 KiB sectors.
pub fn locate_phy_cap<C: DriverChannel>(
    nvm: &mut Nvm<C>,
    emp_sr: u16,
) -> Result<PhyCapPointers> {
    if emp_sr & EMP_SR_4K_UNITS != 0 {
        return Err(Error::UnsupportedLayout(emp_sr));
    }

    let lan0_pointer = WordOffset(emp_sr).wrapping_add(PHY_CAP_LAN0_PTR);
    let relative = nvm.read_word(lan0_pointer, Step::PhyCapPointer)?;
    let offset = lan0_pointer.wrapping_add(relative);
    debug!("PHY Capability LAN 0 pointer at {lan0_pointer}: {relative:#06x}, block at {offset}");

    Ok(PhyCapPointers {
        emp_sr,
        lan0_pointer,
        offset,
    })
}

/// Find PHY Capability data structure 0.
///
/// Fails with [`Error::UnsupportedLayout`] without issuing the second read
/// if the EMP SR pointer counts 4 KiB sectors.
pub fn resolve_phy_cap_offset<C: DriverChannel>(nvm: &mut Nvm<C>) -> Result<PhyCapPointers> {
    let emp_sr = read_emp_sr_pointer(nvm)?;
    locate_phy_cap(nvm, emp_sr)
}

/// Contents of PHY Capability data structure 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhyCapBlock([u16; PHY_CAP_SIZE]);

impl PhyCapBlock {
    /// Wrap raw block contents.
    #[must_use]
    pub const fn new(words: [u16; PHY_CAP_SIZE]) -> Self {
        Self(words)
    }

    /// All words of the block.
    #[must_use]
    pub const fn words(&self) -> &[u16; PHY_CAP_SIZE] {
        &self.0
    }

    /// Section length, in words.
    #[must_use]
    pub const fn section_length(&self) -> u16 {
        self.0[SECTION_LENGTH_INDEX]
    }

    /// PHY Capabilities Misc0.
    #[must_use]
    pub const fn misc0(&self) -> u16 {
        self.0[MISC0_INDEX]
    }

    /// 40 LESM timer values.
    #[must_use]
    pub const fn lesm_timer(&self) -> u16 {
        self.0[LESM_TIMER_INDEX]
    }

    /// Whether the section length is the one this tool was written against.
    #[must_use]
    pub const fn section_length_ok(&self) -> bool {
        self.section_length() == SECTION_LENGTH_EXPECTED
    }

    /// Whether lane 0 already accepts unqualified modules.
    #[must_use]
    pub const fn misc0_unlocked(&self) -> bool {
        self.misc0() & MISC0_UNLOCK_BIT == 0
    }

    /// Annotation printed next to word `index` in a dump.
    #[must_use]
    pub const fn annotation(index: usize) -> Option<&'static str> {
        match index {
            SECTION_LENGTH_INDEX => Some("(Section Length) should be 0x000b"),
            MISC0_INDEX => Some("(PHY Capabilities Misc0) <== will be modified"),
            LESM_TIMER_INDEX => Some("(40 LESM Timer Values) should be 0x0a1e"),
            _ => None,
        }
    }

    /// The block listing of a dump, with every word tagged by `offset`.
    #[must_use]
    pub const fn listing(&self, offset: WordOffset) -> Listing<'_> {
        Listing {
            offset,
            block: self,
        }
    }
}

/// Word-by-word listing of a [`PhyCapBlock`], see [`PhyCapBlock::listing`].
#[derive(Clone, Copy, Debug)]
pub struct Listing<'a> {
    offset: WordOffset,
    block: &'a PhyCapBlock,
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.offset.0;
        writeln!(f, "PHY Capability data structure 0:")?;
        for (index, word) in self.block.words().iter().enumerate() {
            write!(f, "{offset:08x}  {index:02x}  {word:#06x}")?;
            match PhyCapBlock::annotation(index) {
                Some(note) => writeln!(f, " {note}")?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Everything shown by [`dump_phy_cap_block`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhyCapDump {
    /// Pointer chain leading to the block.
    pub pointers: PhyCapPointers,
    /// Block contents.
    pub block: PhyCapBlock,
}

impl fmt::Display for PhyCapDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EMP SR: {:#06x}", self.pointers.emp_sr)?;
        writeln!(f, "PHY CAP DATA OFFSET: {}", self.pointers.offset)?;
        write!(f, "{}", self.block.listing(self.pointers.offset))
    }
}

/// Read the block at `offset`.
pub fn read_phy_cap_block<C: DriverChannel>(
    nvm: &mut Nvm<C>,
    offset: WordOffset,
) -> Result<PhyCapBlock> {
    let words = nvm.read_words(offset, PHY_CAP_SIZE, Step::PhyCapBlock)?;
    let mut block = [0; PHY_CAP_SIZE];
    block.copy_from_slice(&words);

    let block = PhyCapBlock::new(block);
    if !block.section_length_ok() {
        debug!(
            "unexpected section length {:#06x}, expected {SECTION_LENGTH_EXPECTED:#06x}",
            block.section_length()
        );
    }
    if block.lesm_timer() != LESM_TIMER_EXPECTED {
        debug!(
            "unexpected 40 LESM timer values {:#06x}, expected {LESM_TIMER_EXPECTED:#06x}",
            block.lesm_timer()
        );
    }
    Ok(block)
}

/// Read PHY Capability data structure 0 for display.
///
/// Does not modify the adapter. Callers that must show the pointers even
/// when a later read fails use [`read_emp_sr_pointer`], [`locate_phy_cap`]
/// and [`read_phy_cap_block`] one at a time.
pub fn dump_phy_cap_block<C: DriverChannel>(nvm: &mut Nvm<C>) -> Result<PhyCapDump> {
    let pointers = resolve_phy_cap_offset(nvm)?;
    let block = read_phy_cap_block(nvm, pointers.offset)?;
    Ok(PhyCapDump { pointers, block })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShadowRam;

    fn scenario_a() -> ShadowRam {
        let mut sr = ShadowRam::new(0x100);
        sr.set_word(EMP_SR_SETTINGS_PTR, 0x0010)
            .set_word(WordOffset(0x0029), 0x0005);
        sr
    }

    #[test]
    fn test_resolve() {
        let mut nvm = Nvm::new(scenario_a());
        let pointers = resolve_phy_cap_offset(&mut nvm).unwrap();
        assert_eq!(
            pointers,
            PhyCapPointers {
                emp_sr: 0x0010,
                lan0_pointer: WordOffset(0x0029),
                offset: WordOffset(0x002e),
            }
        );
    }

    #[test]
    fn test_resolve_4k_units() {
        let mut sr = ShadowRam::new(0x100);
        sr.set_word(EMP_SR_SETTINGS_PTR, 0x8005);
        let mut nvm = Nvm::new(sr);
        assert!(matches!(
            resolve_phy_cap_offset(&mut nvm),
            Err(Error::UnsupportedLayout(0x8005))
        ));
        assert_eq!(nvm.channel().journal().len(), 1);
    }

    #[test]
    fn test_locate_skips_read_for_4k_units() {
        let mut nvm = Nvm::new(scenario_a());
        assert!(matches!(
            locate_phy_cap(&mut nvm, 0x8010),
            Err(Error::UnsupportedLayout(0x8010))
        ));
        assert!(nvm.channel().journal().is_empty());

        let pointers = locate_phy_cap(&mut nvm, 0x0010).unwrap();
        assert_eq!(pointers.offset, WordOffset(0x002e));
        assert_eq!(nvm.channel().journal().len(), 1);
    }

    #[test]
    fn test_annotations() {
        let annotated: Vec<_> = (0..PHY_CAP_SIZE)
            .filter(|&i| PhyCapBlock::annotation(i).is_some())
            .collect();
        assert_eq!(annotated, [0, 8, 10]);
    }

    #[test]
    fn test_dump_display() {
        let mut sr = scenario_a();
        for i in 0..PHY_CAP_SIZE as u16 {
            sr.set_word(WordOffset(0x2e + i), i);
        }
        sr.set_word(WordOffset(0x2e), 0x000b)
            .set_word(WordOffset(0x36), 0x0800)
            .set_word(WordOffset(0x38), 0x0a1e);
        let dump = dump_phy_cap_block(&mut Nvm::new(sr)).unwrap();
        assert!(dump.block.section_length_ok());
        assert!(!dump.block.misc0_unlocked());

        let text = dump.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3 + PHY_CAP_SIZE);
        assert_eq!(lines[0], "EMP SR: 0x0010");
        assert_eq!(lines[1], "PHY CAP DATA OFFSET: 0x002e");
        assert_eq!(lines[2], "PHY Capability data structure 0:");
        assert_eq!(
            lines[3],
            "0000002e  00  0x000b (Section Length) should be 0x000b"
        );
        assert_eq!(lines[4], "0000002e  01  0x0001");
        assert_eq!(
            lines[11],
            "0000002e  08  0x0800 (PHY Capabilities Misc0) <== will be modified"
        );
        assert_eq!(
            lines[13],
            "0000002e  0a  0x0a1e (40 LESM Timer Values) should be 0x0a1e"
        );
        assert_eq!(lines[15], "0000002e  0c  0x000c");
    }
}
