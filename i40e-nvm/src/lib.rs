// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to the shadow RAM of Intel 700-series (i40e) network adapters.
//!
//! The i40e driver exposes the adapter's NVM through a driver-specific
//! ioctl. This crate encodes those requests, walks the firmware pointer
//! structures, and implements the two maintenance operations of the
//! `i40e-unlock` tool: dumping PHY Capability data structure 0 and clearing
//! the module qualification bit in the PHY Capabilities Misc0 fields.
//!
//! # Crate organisation
//!
//! - [`channel`] defines the [`DriverChannel`] seam between this crate and
//!   the operating system, the FreeBSD `SIOCGDRVSPEC`/`SIOCSDRVSPEC`
//!   implementation, and [`ShadowRam`], an in-memory device.
//! - [`request`] holds the per-call [`NvmRequest`] and its wire framing.
//! - [`Nvm`] is the transport primitive: one request, one channel call.
//! - [`phy_cap`] resolves the PHY Capability offset and dumps the block.
//! - [`patch`] clears the unlock bit and requests a checksum update.
//! - [`layout`] collects the fixed shadow RAM offsets and masks.
//!
//! Shadow RAM is addressed in 16-bit words everywhere in this crate, using
//! [`WordOffset`]. Conversion to the byte offsets the driver expects happens
//! only when a request is built.
//!
//! ## Optional crate features
//!
//! - `logger`: Logging implementation for the standard [`log`] crate that
//!   prints decorated records to stderr. See [`helpers::logger`].
//!
//! [`channel`]: crate::channel
//! [`request`]: crate::request

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::ptr_as_ptr, missing_docs, unused)]
#![deny(clippy::all)]
#![deny(clippy::must_use_candidate)]

pub use i40e_nvm_raw as raw;
pub use i40e_nvm_raw::{NvmCommand, TransFlags};

mod error;
pub use self::error::{Error, Result, Step};

pub mod layout;
pub use self::layout::WordOffset;

pub mod request;
pub use self::request::NvmRequest;

pub mod channel;
pub use self::channel::{DriverChannel, ShadowRam};

mod nvm;
pub use self::nvm::Nvm;

pub mod phy_cap;
pub use self::phy_cap::{
    dump_phy_cap_block, locate_phy_cap, read_emp_sr_pointer, read_phy_cap_block,
    resolve_phy_cap_offset,
};

pub mod patch;
pub use self::patch::{patch_misc0_bits, Patcher};

#[cfg(feature = "logger")]
pub mod helpers;
