// SPDX-License-Identifier: MIT OR Apache-2.0

use super::DriverChannel;
use crate::layout::WordOffset;
use crate::raw::{NvmAccessHeader, NvmCommand, TransFlags, NVM_ACCESS};
use crate::request::{decode_words, parse_frame};
use std::io;

/// One request seen by a [`ShadowRam`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Decoded request header.
    pub header: NvmAccessHeader,
    /// Payload as sent for writes, as returned for reads.
    pub data: Vec<u8>,
    /// Whether the request failed.
    pub failed: bool,
}

impl Transaction {
    /// Word index addressed by the request, if its byte offset is even.
    #[must_use]
    pub fn word_offset(&self) -> Option<WordOffset> {
        let words = u16::try_from(self.header.offset / 2).ok()?;
        (self.header.offset % 2 == 0).then_some(WordOffset(words))
    }

    /// Payload decoded as words.
    #[must_use]
    pub fn words(&self) -> Vec<u16> {
        decode_words(&self.data).collect()
    }

    /// Whether this is a write request.
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.header.command == NvmCommand::WRITE
    }
}

/// In-memory shadow RAM behind a [`DriverChannel`].
///
/// The frames are decoded and validated the way the i40e driver does for
/// standalone requests, so the image answers the same requests a real
/// adapter would. Every request is recorded in a journal.
///
/// A write carrying [`TransFlags::CHECKSUM`] only counts as a checksum
/// update and leaves the image untouched.
#[derive(Clone, Debug, Default)]
pub struct ShadowRam {
    words: Vec<u16>,
    journal: Vec<Transaction>,
    checksum_updates: usize,
    failure: Option<(usize, io::ErrorKind)>,
}

impl ShadowRam {
    /// An image of `len` zeroed words.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self::from_words(vec![0; len])
    }

    /// An image with the given contents.
    #[must_use]
    pub fn from_words(words: Vec<u16>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    /// The whole image.
    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// The word at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` is outside the image.
    #[must_use]
    pub fn word(&self, at: WordOffset) -> u16 {
        self.words[usize::from(at.0)]
    }

    /// Set the word at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` is outside the image.
    pub fn set_word(&mut self, at: WordOffset, value: u16) -> &mut Self {
        self.words[usize::from(at.0)] = value;
        self
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn journal(&self) -> &[Transaction] {
        &self.journal
    }

    /// Write requests received so far, including checksum requests.
    #[must_use]
    pub fn writes(&self) -> impl Iterator<Item = &Transaction> {
        self.journal.iter().filter(|t| t.is_write())
    }

    /// Number of checksum recompute requests applied.
    #[must_use]
    pub fn checksum_updates(&self) -> usize {
        self.checksum_updates
    }

    /// Make the request with index `call` (counting from zero) fail.
    pub fn fail_call(&mut self, call: usize, kind: io::ErrorKind) -> &mut Self {
        self.failure = Some((call, kind));
        self
    }

    fn range(&self, header: &NvmAccessHeader) -> io::Result<std::ops::Range<usize>> {
        if header.offset % 2 != 0 || header.data_size % 2 != 0 {
            return Err(io::ErrorKind::InvalidInput.into());
        }
        let start = header.offset as usize / 2;
        let end = start + header.data_size as usize / 2;
        if end > self.words.len() {
            return Err(io::ErrorKind::InvalidInput.into());
        }
        Ok(start..end)
    }

    fn check_call(&mut self, cmd: u32, frame: &[u8]) -> io::Result<NvmAccessHeader> {
        let (header, payload) = parse_frame(frame).ok_or(io::ErrorKind::InvalidInput)?;
        let call = self.journal.len();
        self.journal.push(Transaction {
            header,
            data: payload.to_vec(),
            failed: true,
        });
        match self.failure {
            Some((fail, kind)) if fail == call => return Err(kind.into()),
            _ => {}
        }
        if cmd != NVM_ACCESS {
            return Err(io::ErrorKind::Unsupported.into());
        }
        Ok(header)
    }

    fn complete(&mut self, data: Option<&[u8]>) {
        if let Some(last) = self.journal.last_mut() {
            last.failed = false;
            if let Some(data) = data {
                last.data = data.to_vec();
            }
        }
    }
}

impl DriverChannel for ShadowRam {
    fn get(&mut self, cmd: u32, data: &mut [u8]) -> io::Result<()> {
        let header = self.check_call(cmd, data)?;
        if header.command != NvmCommand::READ {
            return Err(io::ErrorKind::InvalidInput.into());
        }
        let range = self.range(&header)?;
        let payload = &mut data[NvmAccessHeader::SIZE..];
        for (pair, word) in payload.chunks_exact_mut(2).zip(&self.words[range]) {
            pair.copy_from_slice(&word.to_ne_bytes());
        }
        let returned = payload.to_vec();
        self.complete(Some(&returned));
        Ok(())
    }

    fn set(&mut self, cmd: u32, data: &[u8]) -> io::Result<()> {
        let header = self.check_call(cmd, data)?;
        if header.command != NvmCommand::WRITE {
            return Err(io::ErrorKind::InvalidInput.into());
        }
        if header.trans_flags().contains(TransFlags::CHECKSUM) {
            self.checksum_updates += 1;
        } else {
            let range = self.range(&header)?;
            let words = decode_words(&data[NvmAccessHeader::SIZE..]);
            for (slot, word) in self.words[range].iter_mut().zip(words) {
                *slot = word;
            }
        }
        self.complete(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NvmRequest;

    const SA: TransFlags = TransFlags::START_AND_AUTO_READ;

    #[test]
    fn test_read_write() {
        let mut sr = ShadowRam::new(0x10);
        sr.set_word(WordOffset(3), 0xbeef);

        let request = NvmRequest::read(WordOffset(2), 2, SA).unwrap();
        let mut frame = request.to_frame();
        sr.get(NVM_ACCESS, &mut frame).unwrap();
        assert_eq!(decode_words(&frame[16..]).collect::<Vec<_>>(), [0, 0xbeef]);

        let request = NvmRequest::write(WordOffset(4), &[0x1234], SA).unwrap();
        sr.set(NVM_ACCESS, &request.to_frame()).unwrap();
        assert_eq!(sr.word(WordOffset(4)), 0x1234);

        assert_eq!(sr.journal().len(), 2);
        assert_eq!(sr.journal()[0].words(), [0, 0xbeef]);
        assert_eq!(sr.journal()[1].word_offset(), Some(WordOffset(4)));
        assert_eq!(sr.writes().count(), 1);
    }

    #[test]
    fn test_checksum_leaves_image() {
        let mut sr = ShadowRam::from_words(vec![0xaaaa; 4]);
        let request = NvmRequest::write(WordOffset(0), &[0], SA | TransFlags::CHECKSUM).unwrap();
        sr.set(NVM_ACCESS, &request.to_frame()).unwrap();
        assert_eq!(sr.checksum_updates(), 1);
        assert_eq!(sr.words(), [0xaaaa; 4]);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let mut sr = ShadowRam::new(4);

        let mut frame = NvmRequest::read(WordOffset(3), 2, SA).unwrap().to_frame();
        let err = sr.get(NVM_ACCESS, &mut frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let mut frame = NvmRequest::read(WordOffset(0), 1, SA).unwrap().to_frame();
        let err = sr.get(NVM_ACCESS + 1, &mut frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let err = sr.get(NVM_ACCESS, &mut frame[..17]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        assert!(sr.journal().iter().all(|t| t.failed));
    }

    #[test]
    fn test_fail_call() {
        let mut sr = ShadowRam::new(4);
        sr.fail_call(1, io::ErrorKind::PermissionDenied);
        let request = NvmRequest::read(WordOffset(0), 1, SA).unwrap();

        sr.get(NVM_ACCESS, &mut request.to_frame()).unwrap();
        let err = sr.get(NVM_ACCESS, &mut request.to_frame()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        sr.get(NVM_ACCESS, &mut request.to_frame()).unwrap();

        let failed: Vec<_> = sr.journal().iter().map(|t| t.failed).collect();
        assert_eq!(failed, [false, true, false]);
    }
}
