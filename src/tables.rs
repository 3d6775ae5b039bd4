// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! DQT (quantization table) and DHT (Huffman table) segment parsing.
//!
//! Both segment bodies iterate table entries until the declared length
//! is consumed; a single segment can carry multiple tables. Tables are
//! keyed by id 0–3, last write wins.

use crate::dct::QuantTable;
use crate::error::{JpegError, Result};
use crate::huffman::HuffmanDecodeTable;
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// Parse a DQT marker segment body (after the 2-byte length).
///
/// Returns (table_id, QuantTable) pairs. Values are de-zigzagged into
/// natural (row-major) order at parse time.
pub fn parse_dqt(data: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        pos += 1;
        let precision = pq_tq >> 4;
        let table_id = pq_tq & 0x0F;

        if table_id > 3 {
            return Err(JpegError::MalformedStream("quantization table id > 3"));
        }

        let mut values = [0u16; 64];
        if precision == 0 {
            // 8-bit values
            if pos + 64 > data.len() {
                return Err(JpegError::OutOfData);
            }
            for zi in 0..64 {
                values[ZIGZAG_TO_NATURAL[zi]] = data[pos + zi] as u16;
            }
            pos += 64;
        } else if precision == 1 {
            // 16-bit values
            if pos + 128 > data.len() {
                return Err(JpegError::OutOfData);
            }
            for zi in 0..64 {
                values[ZIGZAG_TO_NATURAL[zi]] =
                    u16::from_be_bytes([data[pos + zi * 2], data[pos + zi * 2 + 1]]);
            }
            pos += 128;
        } else {
            return Err(JpegError::UnsupportedPrecision(precision));
        }

        log::debug!("DQT: table id={table_id}, precision={}", if precision == 0 { 8 } else { 16 });
        tables.push((table_id, QuantTable::new(values)));
    }

    Ok(tables)
}

/// One Huffman table parsed from a DHT segment.
#[derive(Debug)]
pub struct DhtEntry {
    /// Table class: 0 = DC, 1 = AC.
    pub class: u8,
    /// Table id (0–3).
    pub id: u8,
    pub table: HuffmanDecodeTable,
}

/// Parse a DHT marker segment body (after the 2-byte length).
///
/// Builds the canonical decode table for each entry in the segment.
pub fn parse_dht(data: &[u8]) -> Result<Vec<DhtEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        pos += 1;
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;

        if class > 1 || id > 3 {
            return Err(JpegError::MalformedStream("Huffman table class/id out of range"));
        }

        if pos + 16 > data.len() {
            return Err(JpegError::OutOfData);
        }
        let mut bits = [0u8; 16];
        bits.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if pos + total > data.len() {
            return Err(JpegError::OutOfData);
        }
        let huffval = &data[pos..pos + total];
        pos += total;

        log::debug!("DHT: class={class}, id={id}, {total} symbols");
        entries.push(DhtEntry {
            class,
            id,
            table: HuffmanDecodeTable::build(&bits, huffval)?,
        });
    }

    Ok(entries)
}
