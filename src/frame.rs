// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! SOF (frame) and SOS (scan) header parsing.
//!
//! SOF0 gives image dimensions, components, and sampling factors; SOS
//! selects the Huffman tables each component uses for the scan that
//! follows it.

use crate::error::{JpegError, Result};

/// Information about one image component from SOF.
#[derive(Debug, Clone)]
pub struct Component {
    /// Component ID (typically 1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1–4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1–4).
    pub v_sampling: u8,
    /// Quantization table ID (0–3).
    pub quant_table_id: u8,
}

/// Frame information parsed from the SOF0 marker.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Sample precision in bits (must be 8).
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    /// Components in frame order: index 0 = Y, 1 = Cb, 2 = Cr.
    pub components: Vec<Component>,
    /// Maximum horizontal sampling factor across all components.
    pub max_h_sampling: u8,
    /// Maximum vertical sampling factor across all components.
    pub max_v_sampling: u8,
    /// MCU width in pixels (= max_h_sampling * 8).
    pub mcu_width: u16,
    /// MCU height in pixels (= max_v_sampling * 8).
    pub mcu_height: u16,
    /// Number of MCUs horizontally.
    pub mcus_wide: u16,
    /// Number of MCUs vertically.
    pub mcus_tall: u16,
}

/// Parse a SOF0 marker segment body (after the 2-byte length).
pub fn parse_sof(data: &[u8]) -> Result<FrameInfo> {
    if data.len() < 6 {
        return Err(JpegError::OutOfData);
    }

    let precision = data[0];
    if precision != 8 {
        return Err(JpegError::UnsupportedPrecision(precision));
    }

    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    if width == 0 || height == 0 {
        return Err(JpegError::MalformedStream("zero image dimension"));
    }
    if num_components == 0 || num_components > 4 {
        return Err(JpegError::MalformedStream("component count outside 1-4"));
    }
    if data.len() < 6 + num_components * 3 {
        return Err(JpegError::OutOfData);
    }

    let mut components = Vec::with_capacity(num_components);
    let mut max_h = 0u8;
    let mut max_v = 0u8;

    for i in 0..num_components {
        let offset = 6 + i * 3;
        let id = data[offset];
        let sampling = data[offset + 1];
        let h_sampling = sampling >> 4;
        let v_sampling = sampling & 0x0F;
        let quant_table_id = data[offset + 2];

        if h_sampling == 0 || v_sampling == 0 || h_sampling > 4 || v_sampling > 4 {
            return Err(JpegError::MalformedStream("invalid sampling factors"));
        }
        if quant_table_id > 3 {
            return Err(JpegError::MalformedStream("quantization table id > 3"));
        }

        max_h = max_h.max(h_sampling);
        max_v = max_v.max(v_sampling);

        components.push(Component {
            id,
            h_sampling,
            v_sampling,
            quant_table_id,
        });
    }

    let mcu_width = (max_h as u16) * 8;
    let mcu_height = (max_v as u16) * 8;
    let mcus_wide = width.div_ceil(mcu_width);
    let mcus_tall = height.div_ceil(mcu_height);

    log::debug!(
        "SOF0: {width}x{height}, {num_components} components, {mcus_wide}x{mcus_tall} MCUs of {mcu_width}x{mcu_height}"
    );

    Ok(FrameInfo {
        precision,
        height,
        width,
        components,
        max_h_sampling: max_h,
        max_v_sampling: max_v,
        mcu_width,
        mcu_height,
        mcus_wide,
        mcus_tall,
    })
}

/// Huffman table selectors for one scan component.
#[derive(Debug, Clone)]
pub struct ScanComponent {
    /// Index into FrameInfo.components.
    pub comp_idx: usize,
    /// DC Huffman table index (0–3).
    pub dc_table: usize,
    /// AC Huffman table index (0–3).
    pub ac_table: usize,
}

/// Parse an SOS marker segment body (after the 2-byte length).
///
/// Resolves each selector's component id against the frame components.
/// The 3 trailing bytes (spectral selection / successive approximation)
/// carry no information for baseline and are only bounds-checked.
pub fn parse_sos(data: &[u8], frame: &FrameInfo) -> Result<Vec<ScanComponent>> {
    if data.is_empty() {
        return Err(JpegError::OutOfData);
    }
    let num_components = data[0] as usize;
    if data.len() < 1 + num_components * 2 + 3 {
        return Err(JpegError::OutOfData);
    }

    let mut scan_components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 1 + i * 2;
        let comp_id = data[offset];
        let td_ta = data[offset + 1];
        let dc_table = (td_ta >> 4) as usize;
        let ac_table = (td_ta & 0x0F) as usize;

        if dc_table > 3 || ac_table > 3 {
            return Err(JpegError::MalformedStream("Huffman table selector > 3"));
        }

        let comp_idx = frame
            .components
            .iter()
            .position(|c| c.id == comp_id)
            .ok_or(JpegError::MalformedStream("SOS component id not in SOF"))?;

        scan_components.push(ScanComponent {
            comp_idx,
            dc_table,
            ac_table,
        });
    }

    log::debug!("SOS: {num_components} components");
    Ok(scan_components)
}
