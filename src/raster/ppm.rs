// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Binary PPM (P6) reading and writing.
//!
//! PPM is the carrier format used at the CLI boundary: byte-aligned 8-bit
//! RGB with a trivial ASCII header, so carriers survive encode/decode
//! without any lossy recompression. Only maxval 255 is supported.
//! `#` comments are accepted anywhere whitespace is allowed in the header.

use super::error::{RasterError, Result};
use super::RgbImage;

/// Parse a binary PPM (P6) stream into an [`RgbImage`].
pub fn read_ppm(data: &[u8]) -> Result<RgbImage> {
    if data.len() < 2 || &data[..2] != b"P6" {
        return Err(RasterError::InvalidMagic);
    }

    let mut pos = 2;
    let width = read_header_value(data, &mut pos)?;
    let height = read_header_value(data, &mut pos)?;
    let maxval = read_header_value(data, &mut pos)?;
    if maxval != 255 {
        return Err(RasterError::UnsupportedMaxval(maxval));
    }

    // Exactly one whitespace byte separates the header from pixel data.
    match data.get(pos) {
        Some(b) if b.is_ascii_whitespace() => pos += 1,
        Some(_) => return Err(RasterError::InvalidHeader("missing separator before pixel data")),
        None => return Err(RasterError::UnexpectedEof),
    }

    let n = (width as usize)
        .checked_mul(height as usize)
        .and_then(|p| p.checked_mul(3))
        .ok_or(RasterError::InvalidDimensions)?;
    let end = pos.checked_add(n).ok_or(RasterError::UnexpectedEof)?;
    let pixels = data.get(pos..end).ok_or(RasterError::UnexpectedEof)?;

    RgbImage::from_interleaved(width, height, pixels)
}

/// Serialize an [`RgbImage`] as a binary PPM (P6) stream.
pub fn write_ppm(img: &RgbImage) -> Vec<u8> {
    let header = format!("P6\n{} {}\n255\n", img.width(), img.height());
    let mut out = Vec::with_capacity(header.len() + img.pixel_count() * 3);
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&img.to_interleaved());
    out
}

/// Read one decimal header field, skipping whitespace and `#` comments.
fn read_header_value(data: &[u8], pos: &mut usize) -> Result<u32> {
    // Skip whitespace and comment lines.
    loop {
        match data.get(*pos) {
            Some(b) if b.is_ascii_whitespace() => *pos += 1,
            Some(b'#') => {
                while let Some(&b) = data.get(*pos) {
                    *pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
            }
            Some(_) => break,
            None => return Err(RasterError::UnexpectedEof),
        }
    }

    let start = *pos;
    while let Some(b) = data.get(*pos) {
        if b.is_ascii_digit() {
            *pos += 1;
        } else {
            break;
        }
    }
    if *pos == start {
        return Err(RasterError::InvalidHeader("expected a decimal value"));
    }

    std::str::from_utf8(&data[start..*pos])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(RasterError::InvalidHeader("value out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Channel;

    #[test]
    fn write_read_roundtrip() {
        let rgb: Vec<u8> = (0..2 * 3 * 3).map(|i| (i * 7) as u8).collect();
        let img = RgbImage::from_interleaved(2, 3, &rgb).unwrap();
        let ppm = write_ppm(&img);
        let back = read_ppm(&ppm).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn comments_in_header() {
        let mut data = b"P6\n# made by a test\n2 1\n# another\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let img = read_ppm(&data).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 1);
        assert_eq!(img.plane(Channel::B), &[3, 6]);
    }

    #[test]
    fn bad_magic_rejected() {
        assert!(matches!(read_ppm(b"P5\n1 1\n255\n\x00"), Err(RasterError::InvalidMagic)));
        assert!(matches!(read_ppm(b""), Err(RasterError::InvalidMagic)));
    }

    #[test]
    fn sixteen_bit_maxval_rejected() {
        let data = b"P6\n1 1\n65535\n\x00\x00\x00\x00\x00\x00";
        assert!(matches!(read_ppm(data), Err(RasterError::UnsupportedMaxval(65535))));
    }

    #[test]
    fn truncated_pixel_data_rejected() {
        let data = b"P6\n2 2\n255\n\x01\x02\x03";
        assert!(matches!(read_ppm(data), Err(RasterError::UnexpectedEof)));
    }
}
