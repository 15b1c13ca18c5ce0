// SPDX-License-Identifier: MIT OR Apache-2.0

//! The FreeBSD `struct ifdrv` used by `SIOCGDRVSPEC` and `SIOCSDRVSPEC`.

use core::ffi::{c_ulong, c_void};

/// Size of an interface name buffer, including the terminating nul.
pub const IFNAMSIZ: usize = 16;

/// Group number of the interface ioctls.
pub const IOC_GROUP: u8 = b'i';

/// Sequence number shared by `SIOCGDRVSPEC` and `SIOCSDRVSPEC`.
pub const IOC_DRVSPEC: u8 = 123;

/// Driver-specific request addressed to a named interface.
#[derive(Debug)]
#[repr(C)]
pub struct IfDrv {
    /// Nul-terminated interface name.
    pub name: [u8; IFNAMSIZ],
    /// Driver command, [`NVM_ACCESS`](crate::NVM_ACCESS) for this crate.
    pub cmd: c_ulong,
    /// Length of the buffer behind `data`.
    pub len: usize,
    pub data: *mut c_void,
}
