//! Variable byte encoding for non-negative integers.
//!
//! An integer is written as its base-128 digits, most significant first. Every digit but
//! the last is stored as-is (high bit clear); the last one carries the high bit, which
//! makes every encoded integer self-delimiting:
//!
//! ```text
//! 137  = 1 * 128 + 9   -> [0x01, 0x89]
//! 1994 = 15 * 128 + 74 -> [0x0F, 0xCA]
//! ```
//!
//! Compressed postings files are plain concatenations of such integers, which is what
//! lets [`VbeReader::skip`] step over a value without decoding it.

use crate::error::{Error, Result};

const TERMINATOR: u8 = 0x80;
const DIGIT_MASK: u8 = 0x7F;

/// Widest encoding of a `u64`: ceil(64 / 7) digits.
const MAX_ENCODED_LEN: usize = 10;

pub fn encode(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_ENCODED_LEN);
    encode_into(value, &mut out);
    out
}

/// Append the encoding of `value` to `out`.
pub fn encode_into(mut value: u64, out: &mut Vec<u8>) {
    let mut digits = [0u8; MAX_ENCODED_LEN];
    let mut len = 0;
    loop {
        digits[len] = (value % 128) as u8;
        len += 1;
        value /= 128;
        if value == 0 {
            break;
        }
    }
    out.extend(digits[1..len].iter().rev());
    out.push(digits[0] | TERMINATOR);
}

/// Decode the integer at the start of `bytes`, returning it with the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut reader = VbeReader::new(bytes);
    let value = reader.next_u64()?;
    Ok((value, reader.position()))
}

/// Sequential cursor over a stream of encoded integers.
#[derive(Debug, Clone)]
pub struct VbeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VbeReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn starting_at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read. Every encoded integer takes at least one.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        loop {
            let byte = *self.data.get(self.pos).ok_or_else(truncated)?;
            self.pos += 1;
            value = value
                .checked_mul(128)
                .and_then(|v| v.checked_add(u64::from(byte & DIGIT_MASK)))
                .ok_or_else(|| Error::format("vbe stream", format!("integer overflows 64 bits at byte {}", self.pos - 1)))?;
            if byte >= TERMINATOR {
                return Ok(value);
            }
        }
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        let at = self.pos;
        let value = self.next_u64()?;
        u32::try_from(value)
            .map_err(|_| Error::format("vbe stream", format!("value {value} at byte {at} does not fit an id")))
    }

    /// Step over one encoded integer without accumulating its value.
    pub fn skip(&mut self) -> Result<()> {
        loop {
            let byte = *self.data.get(self.pos).ok_or_else(truncated)?;
            self.pos += 1;
            if byte >= TERMINATOR {
                return Ok(());
            }
        }
    }

    pub fn skip_n(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.skip()?;
        }
        Ok(())
    }
}

fn truncated() -> Error {
    Error::format("vbe stream", "truncated integer: no terminating byte")
}
