// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{ArgAction, Parser};
use log::LevelFilter;

/// Show or unlock the PHY module restrictions stored in the NVM of an
/// Intel 700-series (i40e) adapter.
///
/// Unlocking writes to the NVM. Interrupting it part way leaves the NVM
/// with a stale checksum.
#[derive(Debug, Parser)]
#[clap(name = "i40e-unlock")]
pub struct Opt {
    /// Show NVM content to check validness.
    #[clap(short = 'g', long, action, conflicts_with = "unlock")]
    pub show: bool,

    /// Unlock the card and modify NVM.
    #[clap(short = 'u', long, action)]
    pub unlock: bool,

    /// Print more log records; repeat for more detail.
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Network interface of the adapter, for example `ixl0`.
    #[clap(action)]
    pub ifname: Option<String>,
}

/// What the tool was asked to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Show,
    Unlock,
}

impl Opt {
    /// The selected mode, if any.
    pub fn mode(&self) -> Option<Mode> {
        if self.unlock {
            Some(Mode::Unlock)
        } else if self.show {
            Some(Mode::Show)
        } else {
            None
        }
    }

    /// Maximum log level for the requested verbosity.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
