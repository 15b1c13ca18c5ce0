// SPDX-License-Identifier: MIT OR Apache-2.0

//! NVM access requests.
//!
//! A request is kept as two parts, the fixed [`NvmAccessHeader`] and a
//! separately owned payload. They are only joined into one buffer, the
//! frame, when handed to a [`DriverChannel`](crate::DriverChannel):
//!
//! ```text
//! +---------+--------+--------+-----------+---------------------+
//! | command | config | offset | data_size | payload (data_size) |
//! +---------+--------+--------+-----------+---------------------+
//!   4 bytes  4 bytes  4 bytes   4 bytes
//! ```

use crate::layout::WordOffset;
use crate::raw::{NvmAccessHeader, NvmCommand, TransFlags, NVM_MAX_DATA};
use crate::{Error, Result};

/// One NVM access request.
///
/// Requests are built fresh for every channel call. The header's
/// `data_size` always equals the payload length, and `offset` is always a
/// byte address derived from a [`WordOffset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NvmRequest {
    header: NvmAccessHeader,
    payload: Vec<u8>,
}

impl NvmRequest {
    fn new(
        command: NvmCommand,
        flags: TransFlags,
        at: WordOffset,
        payload: Vec<u8>,
    ) -> Result<Self> {
        if payload.len() > NVM_MAX_DATA {
            return Err(Error::PayloadTooLarge(payload.len()));
        }
        let header = NvmAccessHeader {
            command,
            config: flags.config(),
            offset: at.byte_offset(),
            // Bounded by NVM_MAX_DATA above.
            data_size: payload.len() as u32,
        };
        Ok(Self { header, payload })
    }

    /// Read `words` words starting at `at`.
    pub fn read(at: WordOffset, words: usize, flags: TransFlags) -> Result<Self> {
        let len = words
            .checked_mul(2)
            .ok_or(Error::PayloadTooLarge(usize::MAX))?;
        Self::new(NvmCommand::READ, flags, at, vec![0; len])
    }

    /// Write `data` starting at `at`.
    pub fn write(at: WordOffset, data: &[u16], flags: TransFlags) -> Result<Self> {
        let payload = data.iter().flat_map(|word| word.to_ne_bytes()).collect();
        Self::new(NvmCommand::WRITE, flags, at, payload)
    }

    /// The fixed request header.
    #[must_use]
    pub const fn header(&self) -> &NvmAccessHeader {
        &self.header
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload decoded as shadow RAM words.
    #[must_use]
    pub fn words(&self) -> impl Iterator<Item = u16> + '_ {
        decode_words(&self.payload)
    }

    /// Join header and payload into the buffer handed to the driver.
    #[must_use]
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(NvmAccessHeader::SIZE + self.payload.len());
        frame.extend_from_slice(&self.header.to_ne_bytes());
        frame.extend_from_slice(&self.payload);
        frame
    }

    /// Take the payload back from a frame the driver filled in.
    ///
    /// The header part of the frame is ignored: only the data travels back.
    pub(crate) fn update_from_frame(&mut self, frame: &[u8]) {
        let returned = frame.get(NvmAccessHeader::SIZE..).unwrap_or_default();
        let len = returned.len().min(self.payload.len());
        self.payload[..len].copy_from_slice(&returned[..len]);
    }
}

/// Split a frame into its header and payload.
///
/// Returns `None` if the frame is shorter than a header or if `data_size`
/// does not match the payload actually present.
#[must_use]
pub fn parse_frame(frame: &[u8]) -> Option<(NvmAccessHeader, &[u8])> {
    if frame.len() < NvmAccessHeader::SIZE {
        return None;
    }
    let (head, payload) = frame.split_at(NvmAccessHeader::SIZE);
    let header = NvmAccessHeader::from_ne_bytes(head.try_into().ok()?);
    (header.data_size as usize == payload.len()).then_some((header, payload))
}

/// Decode native-endian words from a payload.
#[must_use]
pub fn decode_words(payload: &[u8]) -> impl Iterator<Item = u16> + '_ {
    payload
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
}
