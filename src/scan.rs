// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! MCU decode engine: entropy-decodes the scan data block by block,
//! dequantizes, un-zigzags, applies the inverse DCT, and places the
//! samples into the pixel buffer.
//!
//! MCUs are walked in raster order (row outer, column inner), matching
//! encode order so the DC predictor sequence lines up. Within each MCU,
//! a component contributes h_sampling × v_sampling blocks; subsampled
//! chroma samples are replicated over their full sampling footprint
//! (nearest-block upsampling).

use crate::bitio::BitReader;
use crate::dct::{dequantize, idct_block, QuantTable};
use crate::error::{JpegError, Result};
use crate::frame::{Component, FrameInfo, ScanComponent};
use crate::huffman::{extend_sign, HuffmanDecodeTable};
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// Decode the entropy-coded scan into the pixel buffer.
///
/// - `data`: full JPEG file bytes
/// - `scan_start`: byte offset of the first entropy-coded byte (right after the SOS header)
/// - `pixels`: height × width × 3 interleaved channel values, prefilled with 0
///
/// Channels are written in component order (0 = Y, 1 = Cb, 2 = Cr); a
/// fourth component is entropy-decoded to keep the bitstream in sync but
/// not placed. Returns the byte position after the last scan byte read.
pub fn decode_scan(
    data: &[u8],
    scan_start: usize,
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    dc_tables: &[Option<HuffmanDecodeTable>; 4],
    ac_tables: &[Option<HuffmanDecodeTable>; 4],
    quant_tables: &[Option<QuantTable>; 4],
    pixels: &mut [f32],
) -> Result<usize> {
    debug_assert_eq!(
        pixels.len(),
        frame.width as usize * frame.height as usize * 3
    );

    let mut reader = BitReader::new(data, scan_start);
    // Per scan component, initialized to 0 at scan start; never reset
    // (restart markers are not consumed by this decoder).
    let mut dc_pred = vec![0i32; scan_components.len()];

    for mcu_row in 0..frame.mcus_tall as usize {
        for mcu_col in 0..frame.mcus_wide as usize {
            for (sci, sc) in scan_components.iter().enumerate() {
                let comp = &frame.components[sc.comp_idx];
                let dc_tab = dc_tables[sc.dc_table]
                    .as_ref()
                    .ok_or(JpegError::MalformedStream("scan selects undefined DC table"))?;
                let ac_tab = ac_tables[sc.ac_table]
                    .as_ref()
                    .ok_or(JpegError::MalformedStream("scan selects undefined AC table"))?;
                let qt = quant_tables[comp.quant_table_id as usize]
                    .as_ref()
                    .ok_or(JpegError::MalformedStream("component selects undefined quantization table"))?;

                for v in 0..comp.v_sampling as usize {
                    for h in 0..comp.h_sampling as usize {
                        let zz = decode_block(&mut reader, dc_tab, ac_tab, &mut dc_pred[sci])?;

                        // Zigzag → natural order, then dequantize and transform
                        let mut coeffs = [0i16; 64];
                        for zi in 0..64 {
                            coeffs[ZIGZAG_TO_NATURAL[zi]] = zz[zi];
                        }
                        let samples = idct_block(&dequantize(&coeffs, qt));

                        place_block(
                            pixels, frame, comp, sc.comp_idx, mcu_row, mcu_col, v, h, &samples,
                        );
                    }
                }
            }
        }
    }

    Ok(reader.position())
}

/// Decode one 8×8 block of coefficients in zigzag order.
///
/// DC: Huffman symbol gives the magnitude category; that many raw bits
/// follow, sign-extended and added to the running predictor. AC: each
/// symbol packs a zero-run (high nibble) and a size (low nibble);
/// symbol 0x00 is end-of-block, 0xF0 skips 16 zeros. A run that passes
/// position 63 ends the block without writing.
fn decode_block(
    reader: &mut BitReader,
    dc_tab: &HuffmanDecodeTable,
    ac_tab: &HuffmanDecodeTable,
    dc_pred: &mut i32,
) -> Result<[i16; 64]> {
    let mut zz = [0i16; 64];

    let dc_size = dc_tab.decode(reader)?;
    if dc_size > 15 {
        // Category symbols above 15 cannot occur in a valid DC table
        return Err(JpegError::MalformedStream("DC category out of range"));
    }
    if dc_size > 0 {
        let dc_bits = reader.read_bits(dc_size)?;
        *dc_pred = dc_pred.saturating_add(extend_sign(dc_bits, dc_size) as i32);
    }
    zz[0] = (*dc_pred).clamp(i16::MIN as i32, i16::MAX as i32) as i16;

    let mut k = 1;
    while k < 64 {
        let rs = ac_tab.decode(reader)?;
        let run = (rs >> 4) as usize;
        let size = rs & 0x0F;

        if size == 0 {
            if run == 15 {
                // ZRL — skip 16 zeros
                k += 16;
                continue;
            }
            // EOB — remaining coefficients stay zero
            break;
        }

        k += run;
        let ac_bits = reader.read_bits(size)?;
        if k >= 64 {
            // Run passed the end of the block: consume the bits, write nothing
            break;
        }
        zz[k] = extend_sign(ac_bits, size);
        k += 1;
    }

    Ok(zz)
}

/// Copy one transformed 8×8 block into the interleaved pixel buffer.
///
/// Each sample covers a (max_h / h_sampling) × (max_v / v_sampling)
/// pixel footprint; positions past the declared image size are cropped.
#[allow(clippy::too_many_arguments)]
fn place_block(
    pixels: &mut [f32],
    frame: &FrameInfo,
    comp: &Component,
    channel: usize,
    mcu_row: usize,
    mcu_col: usize,
    v: usize,
    h: usize,
    samples: &[f64; 64],
) {
    if channel >= 3 {
        return;
    }
    let width = frame.width as usize;
    let height = frame.height as usize;
    let scale_x = (frame.max_h_sampling / comp.h_sampling) as usize;
    let scale_y = (frame.max_v_sampling / comp.v_sampling) as usize;

    // Block origin in this component's sample space
    let bx = (mcu_col * comp.h_sampling as usize + h) * 8;
    let by = (mcu_row * comp.v_sampling as usize + v) * 8;

    for r in 0..8 {
        for c in 0..8 {
            let sample = samples[r * 8 + c] as f32;
            let px = (bx + c) * scale_x;
            let py = (by + r) * scale_y;
            for dy in 0..scale_y {
                let y = py + dy;
                if y >= height {
                    break;
                }
                for dx in 0..scale_x {
                    let x = px + dx;
                    if x >= width {
                        break;
                    }
                    pixels[(y * width + x) * 3 + channel] = sample;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::parse_sof;

    // A table with a single 1-bit code "0" mapping to `symbol`.
    fn one_code_table(symbol: u8) -> HuffmanDecodeTable {
        let mut bits = [0u8; 16];
        bits[0] = 1;
        HuffmanDecodeTable::build(&bits, &[symbol]).unwrap()
    }

    // Codes "00" -> symbols[0], "01" -> symbols[1].
    fn two_code_table(symbols: [u8; 2]) -> HuffmanDecodeTable {
        let mut bits = [0u8; 16];
        bits[1] = 2;
        HuffmanDecodeTable::build(&bits, &symbols).unwrap()
    }

    #[test]
    fn decode_zero_block() {
        // DC size 0 ("0"), AC EOB ("0"): bits 00, padded with 1s
        let dc = one_code_table(0);
        let ac = one_code_table(0);
        let data = [0b0011_1111u8];
        let mut reader = BitReader::new(&data, 0);
        let mut pred = 0i32;
        let zz = decode_block(&mut reader, &dc, &ac, &mut pred).unwrap();
        assert_eq!(zz, [0i16; 64]);
        assert_eq!(pred, 0);
    }

    #[test]
    fn decode_dc_difference_accumulates() {
        // DC table: "00" -> size 0, "01" -> size 3. AC table: "0" -> EOB.
        let dc = two_code_table([0, 3]);
        let ac = one_code_table(0);

        // Block 1: DC code "01", magnitude 0b101 (=+5), AC EOB "0"
        // Block 2: DC code "01", magnitude 0b010 (=-5), AC EOB "0"
        // Bit stream: 01 101 0 | 01 010 0, padded with 1s
        let data = [0b0110_1001, 0b0100_1111u8];
        let mut reader = BitReader::new(&data, 0);
        let mut pred = 0i32;

        let b1 = decode_block(&mut reader, &dc, &ac, &mut pred).unwrap();
        assert_eq!(b1[0], 5);
        assert_eq!(pred, 5);

        let b2 = decode_block(&mut reader, &dc, &ac, &mut pred).unwrap();
        assert_eq!(b2[0], 0); // 5 + (-5)
        assert_eq!(pred, 0);
    }

    #[test]
    fn decode_ac_run_and_value() {
        // DC: "0" -> size 0. AC: "00" -> EOB, "01" -> 0x21 (run 2, size 1).
        let dc = one_code_table(0);
        let ac = two_code_table([0x00, 0x21]);

        // DC "0", AC "01" + 1 bit magnitude "1" (=+1), AC EOB "00"
        // Bits: 0 01 1 00, padded with 1s -> 0b0011_0011
        let data = [0b0011_0011u8];
        let mut reader = BitReader::new(&data, 0);
        let mut pred = 0i32;
        let zz = decode_block(&mut reader, &dc, &ac, &mut pred).unwrap();
        assert_eq!(zz[0], 0);
        assert_eq!(zz[1], 0);
        assert_eq!(zz[2], 0);
        assert_eq!(zz[3], 1); // run of 2 zeros, then the coefficient
        assert_eq!(zz[4..], [0i16; 60]);
    }

    #[test]
    fn oversized_dc_category_is_rejected() {
        // A DC table may legally carry any symbol byte; a category above
        // 15 must be caught before it reaches the bit reader
        let dc = one_code_table(20);
        let ac = one_code_table(0);
        let data = [0b0000_0000u8];
        let mut reader = BitReader::new(&data, 0);
        let mut pred = 0i32;
        assert!(matches!(
            decode_block(&mut reader, &dc, &ac, &mut pred),
            Err(JpegError::MalformedStream(_))
        ));
    }

    #[test]
    fn dc_predictor_saturates() {
        // DC table: "00" -> size 0, "01" -> size 3. AC table: "0" -> EOB.
        let dc = two_code_table([0, 3]);
        let ac = one_code_table(0);

        // One block with diff +5 against a predictor at the i32 ceiling
        let data = [0b0110_1001u8];
        let mut reader = BitReader::new(&data, 0);
        let mut pred = i32::MAX;
        let zz = decode_block(&mut reader, &dc, &ac, &mut pred).unwrap();
        assert_eq!(pred, i32::MAX);
        assert_eq!(zz[0], i16::MAX); // clamped on write
    }

    #[test]
    fn truncated_scan_is_out_of_data() {
        let dc = two_code_table([0, 8]);
        let ac = one_code_table(0);
        // DC code "01" promises 8 magnitude bits but the buffer ends
        let data = [0b0100_0000u8];
        let mut reader = BitReader::new(&data, 0);
        let mut pred = 0i32;
        assert_eq!(
            decode_block(&mut reader, &dc, &ac, &mut pred),
            Err(JpegError::OutOfData)
        );
    }

    #[test]
    fn chroma_replication_and_crop() {
        // 4:2:0 frame, 10x10 image (one 16x16 MCU, cropped)
        let frame = parse_sof(&[
            8, 0, 10, 0, 10, 3,
            1, 0x22, 0,
            2, 0x11, 0,
            3, 0x11, 0,
        ])
        .unwrap();
        let mut pixels = vec![0.0f32; 10 * 10 * 3];

        // Place a chroma block (channel 1) with a recognizable corner sample
        let mut samples = [0.0f64; 64];
        samples[0] = 42.0;
        samples[9] = 7.0; // sample (1,1)
        place_block(&mut pixels, &frame, &frame.components[1], 1, 0, 0, 0, 0, &samples);

        // Sample (0,0) covers pixels (0..2, 0..2)
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(pixels[(y * 10 + x) * 3 + 1], 42.0);
            }
        }
        // Sample (1,1) covers pixels (2..4, 2..4)
        assert_eq!(pixels[(2 * 10 + 2) * 3 + 1], 7.0);
        assert_eq!(pixels[(3 * 10 + 3) * 3 + 1], 7.0);
        // Luma channel untouched
        assert_eq!(pixels[0], 0.0);
    }

    #[test]
    fn luma_block_outside_image_is_cropped() {
        let frame = parse_sof(&[8, 0, 10, 0, 10, 1, 1, 0x11, 0]).unwrap();
        let mut pixels = vec![0.0f32; 10 * 10 * 3];

        // MCU (1,1): block origin (8,8); only pixels (8..10, 8..10) are in-image
        let samples = [1.0f64; 64];
        place_block(&mut pixels, &frame, &frame.components[0], 0, 1, 1, 0, 0, &samples);

        let written = pixels.iter().filter(|&&p| p != 0.0).count();
        assert_eq!(written, 4); // 2x2 in-image corner
        assert_eq!(pixels[(9 * 10 + 9) * 3], 1.0);
        assert_eq!(pixels[(8 * 10 + 8) * 3], 1.0);
    }
}
