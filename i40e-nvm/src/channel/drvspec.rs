// SPDX-License-Identifier: MIT OR Apache-2.0

use super::DriverChannel;
use crate::raw::ifdrv::{IfDrv, IFNAMSIZ, IOC_DRVSPEC, IOC_GROUP};
use crate::{Error, Result};
use log::debug;
use nix::sys::socket::{socket, AddressFamily, SockFlag, SockType};
use std::ffi::c_void;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

nix::ioctl_readwrite!(siocgdrvspec, IOC_GROUP, IOC_DRVSPEC, IfDrv);
nix::ioctl_write_ptr!(siocsdrvspec, IOC_GROUP, IOC_DRVSPEC, IfDrv);

/// `SIOCGDRVSPEC`/`SIOCSDRVSPEC` requests on a datagram socket.
#[derive(Debug)]
pub struct DrvSpecChannel {
    name: [u8; IFNAMSIZ],
    socket: OwnedFd,
}

impl DrvSpecChannel {
    pub(super) fn open(ifname: &str, name: [u8; IFNAMSIZ]) -> Result<Self> {
        let socket = socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::empty(),
            None,
        )
        .map_err(|errno| Error::ChannelOpen {
            ifname: ifname.to_owned(),
            source: errno.into(),
        })?;
        debug!("opened control socket for {ifname}");
        Ok(Self { name, socket })
    }

    fn request(&self, cmd: u32, data: *mut c_void, len: usize) -> IfDrv {
        IfDrv {
            name: self.name,
            cmd: cmd.into(),
            len,
            data,
        }
    }
}

impl DriverChannel for DrvSpecChannel {
    fn get(&mut self, cmd: u32, data: &mut [u8]) -> io::Result<()> {
        let mut request = self.request(cmd, data.as_mut_ptr().cast(), data.len());
        // SAFETY: `request` describes `data`, which is valid for reads and
        // writes of `len` bytes for the duration of the call.
        unsafe { siocgdrvspec(self.socket.as_raw_fd(), &mut request) }?;
        Ok(())
    }

    fn set(&mut self, cmd: u32, data: &[u8]) -> io::Result<()> {
        // The kernel only copies in from `data` for SIOCSDRVSPEC.
        let request = self.request(cmd, data.as_ptr().cast_mut().cast(), data.len());
        // SAFETY: `request` describes `data`, which is valid for reads of
        // `len` bytes for the duration of the call.
        unsafe { siocsdrvspec(self.socket.as_raw_fd(), &request) }?;
        Ok(())
    }
}
