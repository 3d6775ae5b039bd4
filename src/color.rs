// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! In-place YCbCr → RGB conversion over the decoded pixel buffer.

/// Convert the whole buffer from YCbCr to RGB, in place.
///
/// `pixels` holds 3 interleaved channel values per pixel. Uses the
/// JFIF/ITU-R BT.601 coefficients with the +128 level shift folded in.
/// Values are NOT clamped to any output range; rounding and clamping
/// belong to whatever writes the raster out.
pub fn ycbcr_to_rgb(pixels: &mut [f32]) {
    debug_assert_eq!(pixels.len() % 3, 0);
    for px in pixels.chunks_exact_mut(3) {
        let (y, cb, cr) = (px[0], px[1], px[2]);
        px[0] = y + 1.402 * cr + 128.0;
        px[1] = y - 0.344_136 * cb - 0.714_136 * cr + 128.0;
        px[2] = y + 1.772 * cb + 128.0;
    }
}
