// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Byte- and bit-level cursors over the raw JPEG buffer.
//!
//! [`ByteReader`] is the segment-level cursor used by the marker state
//! machine. [`BitReader`] reads the entropy-coded scan data, handling
//! JPEG byte-stuffing (0xFF 0x00 → 0xFF) in MSB-first bit order.

use crate::error::{JpegError, Result};

/// Byte-granular cursor for marker and segment header parsing.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Resume reading at an absolute byte offset (after scan data).
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Current byte position in the underlying data.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(JpegError::OutOfData);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Read a big-endian 16-bit value (marker codes, segment lengths).
    pub fn read_u16(&mut self) -> Result<u16> {
        if self.pos + 2 > self.data.len() {
            return Err(JpegError::OutOfData);
        }
        let v = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    /// Read `n` bytes as a slice. A zero-length read is a no-op and
    /// always succeeds, even at end of buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n == 0 {
            return Ok(&[]);
        }
        if self.pos >= self.data.len() || self.pos + n > self.data.len() {
            return Err(JpegError::OutOfData);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Advance past `n` bytes (unrecognized segment bodies).
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.pos + n > self.data.len() {
            return Err(JpegError::OutOfData);
        }
        self.pos += n;
        Ok(())
    }
}

/// Bit-level reader for JPEG entropy-coded data.
///
/// Handles byte-stuffing (0xFF 0x00 → 0xFF) and marker detection.
/// Bits are read MSB-first from a 32-bit internal buffer.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bit buffer, MSB-aligned. Valid bits are in the top `bits_left` positions.
    buf: u32,
    bits_left: u8,
    /// Set when a marker (0xFF followed by non-zero byte) is found in the stream.
    marker_found: Option<u8>,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader over the given byte slice.
    /// `pos` should point to the first byte of entropy-coded data (after the SOS header).
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buf: 0,
            bits_left: 0,
            marker_found: None,
        }
    }

    /// Read a single bit (0 or 1).
    pub fn read_bit(&mut self) -> Result<u8> {
        Ok(self.read_bits(1)? as u8)
    }

    /// Read `count` bits (1–16) and return them right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!(count >= 1 && count <= 16);
        while self.bits_left < count {
            self.fill_byte()?;
        }
        self.bits_left -= count;
        let val = (self.buf >> self.bits_left) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Peek at the top `count` bits without consuming them.
    pub fn peek_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!(count >= 1 && count <= 16);
        while self.bits_left < count {
            self.fill_byte()?;
        }
        let val = (self.buf >> (self.bits_left - count)) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Discard `count` bits (must have been peeked already).
    pub fn skip_bits(&mut self, count: u8) {
        debug_assert!(count <= self.bits_left);
        self.bits_left -= count;
    }

    /// Current byte position in the underlying data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the marker byte if a marker was encountered during reading.
    pub fn marker_found(&self) -> Option<u8> {
        self.marker_found
    }

    fn fill_byte(&mut self) -> Result<()> {
        if self.pos >= self.data.len() {
            return Err(JpegError::OutOfData);
        }
        let byte = self.data[self.pos];
        self.pos += 1;

        if byte == 0xFF {
            if self.pos >= self.data.len() {
                return Err(JpegError::OutOfData);
            }
            let next = self.data[self.pos];
            if next == 0x00 {
                // Byte-stuffed 0xFF: the stuffed zero contributes no bits
                self.pos += 1;
            } else {
                // This is a marker — signal it and pad with 1-bits so the
                // final partial byte of the scan can still be drained.
                self.marker_found = Some(next);
                self.pos += 1;
                self.buf = (self.buf << 8) | 0xFF;
                self.bits_left += 8;
                return Ok(());
            }
        }

        self.buf = (self.buf << 8) | (byte as u32);
        self.bits_left += 8;
        Ok(())
    }
}
