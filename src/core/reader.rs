//! Bounds-checked little-endian field reader.
//!
//! Every fixed-offset layout in the protocol is read through [`WireReader`], which
//! checks the remaining length before each access. A short buffer surfaces as
//! [`ProtocolError::ProtocolViolation`] naming the layout being decoded.

use crate::error::{ProtocolError, Result};
use crate::protocol::message::SteamId;
use bytes::Buf;

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    total: usize,
    layout: &'static str,
}

impl<'a> WireReader<'a> {
    pub fn new(layout: &'static str, buf: &'a [u8]) -> Self {
        Self {
            buf,
            total: buf.len(),
            layout,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.total - self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Fail unless at least `n` more bytes are available.
    pub fn require(&self, n: usize) -> Result<()> {
        if self.buf.len() < n {
            return Err(ProtocolError::short(
                self.layout,
                self.position() + n,
                self.total,
            ));
        }
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self) -> Result<u16> {
        self.require(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn i32(&mut self) -> Result<i32> {
        self.require(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn u64(&mut self) -> Result<u64> {
        self.require(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn steam_id(&mut self) -> Result<SteamId> {
        self.u64().map(SteamId)
    }

    /// Borrow the next `n` bytes without copying.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Borrow everything up to the next NUL and step past the terminator.
    pub fn nul_terminated(&mut self, missing: &'static str) -> Result<&'a [u8]> {
        let end = self
            .buf
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ProtocolError::ProtocolViolation(missing.into()))?;
        let value = &self.buf[..end];
        self.buf = &self.buf[end + 1..];
        Ok(value)
    }

    /// Consume the reader and borrow whatever is left.
    pub fn rest(self) -> &'a [u8] {
        self.buf
    }
}
