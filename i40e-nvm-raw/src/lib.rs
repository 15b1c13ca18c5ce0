// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw interface for the i40e NVM access ioctl.
//!
//! The i40e driver exposes the adapter's shadow RAM through a single
//! driver-specific ioctl command. Each request is an [`NvmAccessHeader`]
//! immediately followed by an inline payload of `data_size` bytes. This
//! crate defines that framing and the constants that go into it, with no
//! policy attached.
//!
//! For inspecting and patching an adapter, use the [`i40e-nvm`] crate
//! instead.
//!
//! [`i40e-nvm`]: https://crates.io/crates/i40e-nvm

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(
    clippy::all,
    clippy::must_use_candidate,
    clippy::use_self,
    missing_debug_implementations,
    unused
)]

#[macro_use]
mod enums;

pub mod ifdrv;
mod nvm;

pub use nvm::{NvmAccessHeader, NvmCommand, TransFlags, NVM_ACCESS, NVM_MAX_DATA};
