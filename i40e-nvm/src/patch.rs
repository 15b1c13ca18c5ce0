// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifting the module qualification restriction.
//!
//! Bit 11 of PHY Capabilities Misc0 restricts the adapter to qualified
//! modules. The [`Patcher`] clears it in the Misc0 field of every lane,
//! then asks the firmware to recompute the shadow RAM checksum.
//!
//! Writes are not transactional. If a step fails, every lane written before
//! it stays written and the checksum is left stale. Interrupting the
//! process has the same effect.

use crate::channel::DriverChannel;
use crate::layout::{misc0_offset, WordOffset, CHECKSUM_TRIGGER, LANE_COUNT, MISC0_UNLOCK_BIT};
use crate::phy_cap::resolve_phy_cap_offset;
use crate::raw::TransFlags;
use crate::{Error, Nvm, Result, Step};
use core::fmt;
use core::time::Duration;
use log::{debug, info};
use std::thread;

/// Pause after each Misc0 write, letting the device complete it.
pub const LANE_WRITE_PAUSE: Duration = Duration::from_secs(1);

/// What happened to one lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneOutcome {
    /// The bit was already clear. Nothing was written.
    Skipped {
        /// Lane number.
        lane: u8,
        /// Value read.
        value: u16,
    },
    /// The bit was cleared and written back.
    Cleared {
        /// Lane number.
        lane: u8,
        /// Value read.
        old: u16,
        /// Value written.
        new: u16,
    },
}

impl LaneOutcome {
    /// Lane number.
    #[must_use]
    pub const fn lane(&self) -> u8 {
        match *self {
            Self::Skipped { lane, .. } | Self::Cleared { lane, .. } => lane,
        }
    }

    /// Whether the lane was written.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Cleared { .. })
    }
}

impl fmt::Display for LaneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { lane, value } => {
                write!(f, "PHY Capabilities Misc{lane}: {value:#06x} skipped")
            }
            Self::Cleared { lane, old, new } => {
                write!(f, "PHY Capabilities Misc{lane}: {old:#06x} -> {new:#06x}")
            }
        }
    }
}

/// Summary of a completed patch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchReport {
    /// Location of PHY Capability data structure 0.
    pub offset: WordOffset,
    /// Outcome of every lane, in order.
    pub lanes: Vec<LaneOutcome>,
    /// Whether a checksum recompute was requested.
    pub checksum_updated: bool,
}

impl PatchReport {
    /// Number of lanes written.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.lanes.iter().filter(|lane| lane.changed()).count()
    }
}

/// The new Misc0 value, or `None` if the bit is already clear.
#[must_use]
pub const fn clear_unlock_bit(value: u16) -> Option<u16> {
    if value & MISC0_UNLOCK_BIT == 0 {
        None
    } else {
        Some(value & !MISC0_UNLOCK_BIT)
    }
}

/// Clears the module qualification bit on every lane.
///
/// The pause between writes defaults to [`std::thread::sleep`] and can be
/// replaced with [`Patcher::with_pause`].
pub struct Patcher<'a, C, P = fn(Duration)> {
    nvm: &'a mut Nvm<C>,
    pause: P,
}

impl<'a, C: DriverChannel> Patcher<'a, C> {
    /// Patcher sleeping for real between writes.
    #[must_use]
    pub fn new(nvm: &'a mut Nvm<C>) -> Self {
        Self {
            nvm,
            pause: thread::sleep,
        }
    }
}

impl<'a, C: DriverChannel, P: FnMut(Duration)> Patcher<'a, C, P> {
    /// Replace the function called after each write.
    #[must_use]
    pub fn with_pause<Q: FnMut(Duration)>(self, pause: Q) -> Patcher<'a, C, Q> {
        Patcher {
            nvm: self.nvm,
            pause,
        }
    }

    /// Patch every lane, then request a checksum update if anything changed.
    ///
    /// `progress` sees each lane outcome as soon as it is final, so lanes
    /// written before a failure are still reported.
    pub fn run(mut self, mut progress: impl FnMut(&LaneOutcome)) -> Result<PatchReport> {
        let offset = resolve_phy_cap_offset(self.nvm)
            .map_err(|err| Error::Resolve(Box::new(err)))?
            .offset;

        let mut lanes = Vec::with_capacity(usize::from(LANE_COUNT));
        for lane in 0..LANE_COUNT {
            let outcome = self.patch_lane(offset, lane)?;
            progress(&outcome);
            lanes.push(outcome);
            if outcome.changed() {
                (self.pause)(LANE_WRITE_PAUSE);
            }
        }

        let checksum_updated = lanes.iter().any(LaneOutcome::changed);
        if checksum_updated {
            self.nvm
                .write_word(CHECKSUM_TRIGGER, 0, TransFlags::CHECKSUM, Step::Checksum)?;
            info!("NVM checksum update requested");
        }

        Ok(PatchReport {
            offset,
            lanes,
            checksum_updated,
        })
    }

    fn patch_lane(&mut self, phy_cap: WordOffset, lane: u8) -> Result<LaneOutcome> {
        let at = misc0_offset(phy_cap, lane);
        let value = self.nvm.read_word(at, Step::ReadMisc0(lane))?;
        let Some(new) = clear_unlock_bit(value) else {
            debug!("Misc{lane} at {at}: {value:#06x}, already unlocked");
            return Ok(LaneOutcome::Skipped { lane, value });
        };

        self.nvm
            .write_word(at, new, TransFlags::empty(), Step::WriteMisc0(lane))?;
        info!("Misc{lane} at {at}: {value:#06x} -> {new:#06x}");
        Ok(LaneOutcome::Cleared {
            lane,
            old: value,
            new,
        })
    }
}

impl<C, P> fmt::Debug for Patcher<'_, C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patcher").finish_non_exhaustive()
    }
}

/// Patch with the default pause, logging each lane, and return the number
/// of lanes written.
pub fn patch_misc0_bits<C: DriverChannel>(nvm: &mut Nvm<C>) -> Result<usize> {
    let report = Patcher::new(nvm).run(|outcome| info!("{outcome}"))?;
    Ok(report.changed_count())
}
