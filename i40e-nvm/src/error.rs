// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::raw::NVM_MAX_DATA;
use core::fmt;
use std::io;
use thiserror::Error;

/// Return type of the fallible operations in this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Channel call sites.
///
/// Every request issued by this crate is tagged with the step it belongs
/// to, so a failure can be traced back to the exact read or write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Read of the EMP SR settings pointer.
    EmpSrPointer,
    /// Read of the PHY Capability LAN 0 pointer.
    PhyCapPointer,
    /// Read of PHY Capability data structure 0.
    PhyCapBlock,
    /// Read of the Misc0 field of a lane.
    ReadMisc0(u8),
    /// Write of the Misc0 field of a lane.
    WriteMisc0(u8),
    /// Checksum recompute request.
    Checksum,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmpSrPointer => f.write_str("reading EMP SR settings pointer"),
            Self::PhyCapPointer => f.write_str("reading PHY Capability LAN 0 pointer"),
            Self::PhyCapBlock => f.write_str("reading PHY Capability data structure 0"),
            Self::ReadMisc0(lane) => write!(f, "reading PHY Capabilities Misc{lane}"),
            Self::WriteMisc0(lane) => write!(f, "writing PHY Capabilities Misc{lane}"),
            Self::Checksum => f.write_str("updating NVM checksum"),
        }
    }
}

/// Errors raised while talking to the adapter.
///
/// None of them are recoverable within one invocation: nothing is retried,
/// and writes that completed before a failure are not rolled back.
#[derive(Debug, Error)]
pub enum Error {
    /// The interface name does not fit in `IFNAMSIZ` or contains a nul.
    #[error("invalid interface name {0:?}")]
    InvalidInterfaceName(String),

    /// The control socket could not be created.
    #[error("failed to open control channel for {ifname}")]
    ChannelOpen {
        /// Interface the channel was meant for.
        ifname: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The host has no driver-specific ioctl interface.
    #[error("driver-specific ioctls are not supported on this platform")]
    Unsupported,

    /// A request payload exceeds the driver limit.
    #[error("payload of {0} bytes exceeds the {limit} byte limit", limit = NVM_MAX_DATA)]
    PayloadTooLarge(usize),

    /// A channel call failed.
    #[error("{step} failed")]
    Transport {
        /// Call site of the failed request.
        step: Step,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The EMP SR pointer is expressed in 4 KiB units.
    #[error("EMP SR pointer {0:#06x} is in 4k units, this is untested")]
    UnsupportedLayout(u16),

    /// The PHY Capability offset could not be resolved before patching.
    #[error("failed to resolve the PHY Capability offset")]
    Resolve(#[source] Box<Error>),
}

impl Error {
    /// The call site that failed, if the error came from a channel call.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Transport { step, .. } => Some(*step),
            Self::Resolve(inner) => inner.step(),
            _ => None,
        }
    }
}
