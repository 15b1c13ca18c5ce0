// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driver-specific control channels.
//!
//! A [`DriverChannel`] carries opaque driver requests to one network
//! interface. It mirrors the operating system's get/set driver-specific
//! data ioctls: the request is a single buffer that the driver reads, and
//! on `get` also overwrites with its answer.
//!
//! Channels are released when dropped.

use crate::raw::ifdrv::IFNAMSIZ;
use crate::{Error, Result};
use std::io;

mod shadow_ram;
pub use self::shadow_ram::{ShadowRam, Transaction};

#[cfg(target_os = "freebsd")]
mod drvspec;
#[cfg(target_os = "freebsd")]
pub use self::drvspec::DrvSpecChannel;

/// Transport for driver-specific requests.
pub trait DriverChannel {
    /// Send `data` to the driver and let it write its answer back in place.
    fn get(&mut self, cmd: u32, data: &mut [u8]) -> io::Result<()>;

    /// Send `data` to the driver.
    fn set(&mut self, cmd: u32, data: &[u8]) -> io::Result<()>;
}

impl<T: DriverChannel + ?Sized> DriverChannel for &mut T {
    fn get(&mut self, cmd: u32, data: &mut [u8]) -> io::Result<()> {
        (**self).get(cmd, data)
    }

    fn set(&mut self, cmd: u32, data: &[u8]) -> io::Result<()> {
        (**self).set(cmd, data)
    }
}

/// The control channel of the host operating system.
#[cfg(target_os = "freebsd")]
pub type SystemChannel = DrvSpecChannel;

/// The control channel of the host operating system.
///
/// This platform has none, so the type cannot be constructed.
#[cfg(not(target_os = "freebsd"))]
#[derive(Debug)]
pub enum SystemChannel {}

#[cfg(not(target_os = "freebsd"))]
impl DriverChannel for SystemChannel {
    fn get(&mut self, _cmd: u32, _data: &mut [u8]) -> io::Result<()> {
        match *self {}
    }

    fn set(&mut self, _cmd: u32, _data: &[u8]) -> io::Result<()> {
        match *self {}
    }
}

/// Open the host control channel for `ifname`.
pub fn open(ifname: &str) -> Result<SystemChannel> {
    let name = encode_ifname(ifname)?;

    #[cfg(target_os = "freebsd")]
    {
        DrvSpecChannel::open(ifname, name)
    }

    #[cfg(not(target_os = "freebsd"))]
    {
        let _ = name;
        Err(Error::Unsupported)
    }
}

/// Encode an interface name into a nul-terminated `IFNAMSIZ` buffer.
pub fn encode_ifname(ifname: &str) -> Result<[u8; IFNAMSIZ]> {
    let bytes = ifname.as_bytes();
    if bytes.is_empty() || bytes.len() >= IFNAMSIZ || bytes.contains(&0) {
        return Err(Error::InvalidInterfaceName(ifname.to_owned()));
    }
    let mut name = [0; IFNAMSIZ];
    name[..bytes.len()].copy_from_slice(bytes);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ifname() {
        let name = encode_ifname("ixl0").unwrap();
        assert_eq!(&name[..5], b"ixl0\0");
        assert!(name[4..].iter().all(|&b| b == 0));

        assert!(encode_ifname("fifteen_chars_x").is_ok());
        for bad in ["", "sixteen_chars_xx", "ixl\00"] {
            assert!(matches!(
                encode_ifname(bad),
                Err(Error::InvalidInterfaceName(_))
            ));
        }
    }

    #[cfg(not(target_os = "freebsd"))]
    #[test]
    fn test_open_unsupported() {
        assert!(matches!(open("ixl0"), Err(Error::Unsupported)));
        assert!(matches!(open(""), Err(Error::InvalidInterfaceName(_))));
    }
}
