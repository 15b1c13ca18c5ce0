// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::channel::DriverChannel;
use crate::layout::WordOffset;
use crate::raw::{NvmCommand, TransFlags, NVM_ACCESS};
use crate::request::NvmRequest;
use crate::{Error, Result, Step};
use log::trace;

/// Shadow RAM of one adapter, reached through a [`DriverChannel`].
///
/// Every method issues exactly one channel call, built from a fresh
/// [`NvmRequest`].
#[derive(Debug)]
pub struct Nvm<C> {
    channel: C,
}

impl<C: DriverChannel> Nvm<C> {
    /// Wrap an open channel.
    #[must_use]
    pub const fn new(channel: C) -> Self {
        Self { channel }
    }

    /// The underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// Release the wrapper, returning the channel.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Issue `request` and return it with the driver's answer filled in.
    ///
    /// Reads go out as "get" calls and have their payload replaced with the
    /// returned data. Everything else goes out as a "set" call.
    pub fn transfer(&mut self, mut request: NvmRequest, step: Step) -> Result<NvmRequest> {
        let header = *request.header();
        trace!(
            "{step}: {:?} config={:#06x} offset={:#x} size={}",
            header.command,
            header.config,
            header.offset,
            header.data_size
        );

        let mut frame = request.to_frame();
        let res = if header.command == NvmCommand::READ {
            self.channel.get(NVM_ACCESS, &mut frame)
        } else {
            self.channel.set(NVM_ACCESS, &frame)
        };
        res.map_err(|source| Error::Transport { step, source })?;

        if header.command == NvmCommand::READ {
            request.update_from_frame(&frame);
        }
        Ok(request)
    }

    /// Read `count` consecutive words starting at `at`.
    pub fn read_words(&mut self, at: WordOffset, count: usize, step: Step) -> Result<Vec<u16>> {
        let request = NvmRequest::read(at, count, TransFlags::START_AND_AUTO_READ)?;
        let answer = self.transfer(request, step)?;
        Ok(answer.words().collect())
    }

    /// Read the word at `at`.
    pub fn read_word(&mut self, at: WordOffset, step: Step) -> Result<u16> {
        let words = self.read_words(at, 1, step)?;
        Ok(words[0])
    }

    /// Write `value` at `at` as a single transaction with extra `flags`.
    pub fn write_word(
        &mut self,
        at: WordOffset,
        value: u16,
        flags: TransFlags,
        step: Step,
    ) -> Result<()> {
        let request = NvmRequest::write(at, &[value], TransFlags::START_AND_AUTO_READ | flags)?;
        self.transfer(request, step)?;
        Ok(())
    }
}
