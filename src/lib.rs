// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # jpegdec
//!
//! Pure-Rust baseline JPEG decoder. Turns a compressed JPEG byte stream
//! into a grid of RGB values: marker-driven segment parsing, canonical
//! Huffman entropy decoding with byte-stuffing removal, dequantization,
//! zigzag reordering, the inverse 8×8 DCT, and YCbCr → RGB conversion.
//!
//! Supports:
//! - Baseline sequential DCT (SOF0), 8-bit sample precision
//! - YCbCr, grayscale, and up to 4 components
//! - Chroma subsampling (4:2:0, 4:2:2, 4:4:4) with nearest-block upsampling
//! - 8- and 16-bit quantization tables
//!
//! Does NOT support:
//! - Progressive (SOF2), arithmetic, or lossless JPEG — rejected at parse time
//! - Restart intervals (DRI/RSTn) — DRI segments are skipped, predictors
//!   are never reset
//! - Multi-scan (non-interleaved) images
//!
//! The decoder reads from a byte slice and never touches the filesystem;
//! output channel values are unclamped floats, so writing them to an
//! 8-bit raster (round + clamp to 0–255) is the caller's job.
//!
//! ```rust,ignore
//! let data = std::fs::read("photo.jpg")?;
//! let image = jpegdec::decode(&data)?;
//! println!("{}x{}", image.width(), image.height());
//! ```

pub mod bitio;
pub mod color;
pub mod dct;
pub mod error;
pub mod frame;
pub mod huffman;
pub mod marker;
pub mod scan;
pub mod tables;
pub mod zigzag;

use dct::QuantTable;
use error::{JpegError, Result};
use frame::{FrameInfo, ScanComponent};
use huffman::HuffmanDecodeTable;

pub use error::JpegError as Error;
pub use frame::{Component, FrameInfo as ImageInfo};

/// A fully decoded image: frame info plus the RGB pixel buffer.
#[derive(Debug)]
pub struct DecodedImage {
    info: FrameInfo,
    /// Row-major, 3 interleaved channels per pixel, unclamped.
    pixels: Vec<f32>,
}

impl DecodedImage {
    pub fn width(&self) -> u16 {
        self.info.width
    }

    pub fn height(&self) -> u16 {
        self.info.height
    }

    /// Number of components in the source frame (the pixel buffer is
    /// always 3 channels).
    pub fn num_components(&self) -> usize {
        self.info.components.len()
    }

    /// Frame information parsed from SOF (dimensions, sampling factors).
    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    /// The RGB pixel buffer: `height * width * 3` values, row-major.
    /// Values are unclamped; nominal range is 0–255.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }
}

/// Decode a baseline JPEG byte stream.
///
/// All decode state (tables, predictors, pixel buffer) is local to this
/// call; independent buffers can be decoded concurrently with no shared
/// state.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    let (entries, scan_start) = marker::iterate_markers(data)?;

    let mut frame_info: Option<FrameInfo> = None;
    let mut quant_tables: [Option<QuantTable>; 4] = [None, None, None, None];
    let mut dc_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
    let mut ac_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
    let mut scan_components: Option<Vec<ScanComponent>> = None;

    for entry in &entries {
        match entry.marker {
            marker::SOI | marker::EOI => {}
            marker::DQT => {
                // Repeated ids overwrite: last write wins
                for (id, qt) in tables::parse_dqt(entry.data)? {
                    quant_tables[id as usize] = Some(qt);
                }
            }
            marker::DHT => {
                for dht in tables::parse_dht(entry.data)? {
                    if dht.class == 0 {
                        dc_tables[dht.id as usize] = Some(dht.table);
                    } else {
                        ac_tables[dht.id as usize] = Some(dht.table);
                    }
                }
            }
            marker::SOF0 => {
                frame_info = Some(frame::parse_sof(entry.data)?);
            }
            marker::SOS => {
                let fi = frame_info
                    .as_ref()
                    .ok_or(JpegError::MalformedStream("SOS before SOF"))?;
                scan_components = Some(frame::parse_sos(entry.data, fi)?);
            }
            other => {
                log::debug!("ignoring marker 0xFF{other:02X}");
            }
        }
    }

    let fi = frame_info.ok_or(JpegError::MalformedStream("no SOF marker found"))?;
    let scan_components =
        scan_components.ok_or(JpegError::MalformedStream("no SOS marker found"))?;

    let mut pixels = vec![0.0f32; fi.width as usize * fi.height as usize * 3];

    let scan_end = scan::decode_scan(
        data,
        scan_start,
        &fi,
        &scan_components,
        &dc_tables,
        &ac_tables,
        &quant_tables,
        &mut pixels,
    )?;

    // The stream is well-formed only if EOI follows the scan data
    marker::expect_eoi(data, scan_end)?;

    color::ycbcr_to_rgb(&mut pixels);

    Ok(DecodedImage { info: fi, pixels })
}
