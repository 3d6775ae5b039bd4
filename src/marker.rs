// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! JPEG marker parsing and iteration.
//!
//! Walks the marker segments in a JPEG byte stream, extracting the
//! headers needed for baseline decoding (DQT, DHT, SOF0, SOS) and
//! skipping everything else. Stops at the SOS marker, returning the
//! byte offset where entropy-coded scan data begins.

use crate::bitio::ByteReader;
use crate::error::{JpegError, Result};

/// JPEG marker constants (low byte; every marker is 0xFF followed by this).
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const SOS: u8 = 0xDA;
pub const TEM: u8 = 0x01;

/// A marker segment borrowed from the input buffer.
#[derive(Debug)]
pub struct MarkerEntry<'a> {
    /// The marker byte (e.g., 0xDB for DQT). Does NOT include the 0xFF prefix.
    pub marker: u8,
    /// Segment body, NOT including the marker or the 2-byte length field.
    /// Empty for standalone markers.
    pub data: &'a [u8],
}

/// True for markers that carry no length field or payload.
fn is_standalone(marker: u8) -> bool {
    marker == SOI || marker == EOI || marker == TEM || (0xD0..=0xD7).contains(&marker)
}

/// Non-baseline SOF family: extended sequential, lossless, differential,
/// progressive, and arithmetic-coded frames are all rejected up front.
fn is_unsupported_sof(marker: u8) -> bool {
    matches!(marker, 0xC1..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
}

/// Iterate over JPEG markers from the start of a byte stream.
///
/// The stream must open with SOI. Returns the collected entries and the
/// byte offset right after the SOS header, where entropy-coded data
/// begins. If EOI is reached before any SOS (no image data), the offset
/// is the position after EOI.
pub fn iterate_markers(data: &[u8]) -> Result<(Vec<MarkerEntry<'_>>, usize)> {
    let mut reader = ByteReader::new(data);

    if reader.read_u16().map_err(|_| JpegError::MalformedStream("missing SOI marker"))? != 0xFFD8 {
        return Err(JpegError::MalformedStream("missing SOI marker"));
    }
    let mut entries = vec![MarkerEntry {
        marker: SOI,
        data: &[],
    }];

    loop {
        // Find the next 0xFF, tolerating stray bytes between segments
        let mut byte = reader.read_u8()?;
        while byte != 0xFF {
            byte = reader.read_u8()?;
        }
        // Skip 0xFF fill bytes
        let mut marker = reader.read_u8()?;
        while marker == 0xFF {
            marker = reader.read_u8()?;
        }
        // Byte-stuffed 0xFF00 outside scan data: ignore gracefully
        if marker == 0x00 {
            continue;
        }

        if is_standalone(marker) {
            log::debug!("marker 0xFF{marker:02X} (standalone)");
            entries.push(MarkerEntry { marker, data: &[] });
            if marker == EOI {
                return Ok((entries, reader.position()));
            }
            continue;
        }

        if is_unsupported_sof(marker) {
            return Err(JpegError::UnsupportedMarker(marker));
        }

        // Length counts itself but not the marker
        let length = reader.read_u16()? as usize;
        if length < 2 {
            return Err(JpegError::MalformedStream("segment length < 2"));
        }
        let body = reader.read_bytes(length - 2)?;
        log::debug!("marker 0xFF{marker:02X}, segment length {length}");
        entries.push(MarkerEntry { marker, data: body });

        // Stop at SOS — scan data follows with no length field
        if marker == SOS {
            return Ok((entries, reader.position()));
        }
    }
}

/// Verify that the stream terminates with EOI after the scan data.
///
/// `pos` is the position the entropy decoder stopped at (it may already
/// have consumed the EOI marker bytes while draining its bit buffer, so
/// the scan starts two bytes early when possible). Trailing segments
/// between the scan and EOI are skipped; a second SOS is a multi-scan
/// image, which this decoder does not support.
pub fn expect_eoi(data: &[u8], pos: usize) -> Result<()> {
    let mut reader = ByteReader::new(data);
    reader.seek(pos.saturating_sub(2));

    loop {
        let mut byte = reader.read_u8()?;
        while byte != 0xFF {
            byte = reader.read_u8()?;
        }
        let marker = reader.read_u8()?;
        match marker {
            0x00 | 0xFF => continue,          // stuffing or fill
            0xD0..=0xD7 => continue,          // restart markers: no payload
            EOI => return Ok(()),
            SOS => return Err(JpegError::MalformedStream("multi-scan image")),
            m if is_standalone(m) => continue,
            _ => {
                let length = reader.read_u16()? as usize;
                if length < 2 {
                    return Err(JpegError::MalformedStream("segment length < 2"));
                }
                reader.skip(length - 2)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterate_minimal_jpeg() {
        // Minimal: SOI + EOI
        let data = [0xFF, 0xD8, 0xFF, 0xD9];
        let (entries, end_pos) = iterate_markers(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].marker, SOI);
        assert_eq!(entries[1].marker, EOI);
        assert_eq!(end_pos, 4);
    }

    #[test]
    fn missing_soi() {
        let data = [0x00, 0x00];
        assert!(matches!(
            iterate_markers(&data),
            Err(JpegError::MalformedStream(_))
        ));
    }

    #[test]
    fn soi_only_does_not_hang() {
        // SOI with nothing after it must fail, not loop
        let data = [0xFF, 0xD8];
        assert_eq!(iterate_markers(&data).unwrap_err(), JpegError::OutOfData);
    }

    #[test]
    fn unknown_segment_is_skipped() {
        // SOI, APP0 with 4 payload bytes, EOI
        let data = [
            0xFF, 0xD8,
            0xFF, 0xE0, 0x00, 0x06, 0xAA, 0xBB, 0xCC, 0xDD,
            0xFF, 0xD9,
        ];
        let (entries, _) = iterate_markers(&data).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].marker, 0xE0);
        assert_eq!(entries[1].data, &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn reject_progressive() {
        let data = [
            0xFF, 0xD8, // SOI
            0xFF, 0xC2, // SOF2
            0x00, 0x0B,
            8, 0, 8, 0, 8, 1,
            1, 0x11, 0,
            0xFF, 0xD9,
        ];
        assert_eq!(
            iterate_markers(&data).unwrap_err(),
            JpegError::UnsupportedMarker(0xC2)
        );
    }

    #[test]
    fn reject_lossless() {
        let data = [0xFF, 0xD8, 0xFF, 0xC3, 0x00, 0x02];
        assert_eq!(
            iterate_markers(&data).unwrap_err(),
            JpegError::UnsupportedMarker(0xC3)
        );
    }

    #[test]
    fn stops_at_sos() {
        let data = [
            0xFF, 0xD8, // SOI
            0xFF, 0xDA, 0x00, 0x08, 1, 1, 0x00, 0, 63, 0, // SOS header
            0x12, 0x34, // entropy data
        ];
        let (entries, scan_start) = iterate_markers(&data).unwrap();
        assert_eq!(entries.last().unwrap().marker, SOS);
        assert_eq!(scan_start, 12);
    }

    #[test]
    fn expect_eoi_skips_trailing_segment() {
        // ... scan ... COM segment, EOI
        let data = [
            0xAB, 0xCD, // leftover scan bytes
            0xFF, 0xFE, 0x00, 0x04, 0x68, 0x69, // COM "hi"
            0xFF, 0xD9,
        ];
        expect_eoi(&data, 2).unwrap();
    }

    #[test]
    fn expect_eoi_missing() {
        let data = [0xAB, 0xCD, 0xEF];
        assert_eq!(expect_eoi(&data, 0).unwrap_err(), JpegError::OutOfData);
    }

    #[test]
    fn expect_eoi_rejects_second_scan() {
        let data = [0xFF, 0xDA, 0x00, 0x08];
        assert!(matches!(
            expect_eoi(&data, 2),
            Err(JpegError::MalformedStream(_))
        ));
    }
}
