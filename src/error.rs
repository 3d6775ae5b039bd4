// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for JPEG decoding.

use thiserror::Error;

/// Errors that can occur while decoding a JPEG stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    /// A byte or bit read was attempted at or past the end of the buffer.
    #[error("unexpected end of JPEG data")]
    OutOfData,
    /// Structural violation: bad segment length, missing SOI/EOI,
    /// invalid Huffman code, table id out of range.
    #[error("malformed JPEG stream: {0}")]
    MalformedStream(&'static str),
    /// Quantization precision outside {8, 16}-bit, or sample precision != 8.
    #[error("unsupported precision: {0}")]
    UnsupportedPrecision(u8),
    /// Non-baseline SOF family (progressive, arithmetic, lossless).
    #[error("unsupported JPEG marker: 0xFF{0:02X}")]
    UnsupportedMarker(u8),
}

pub type Result<T> = std::result::Result<T, JpegError>;
