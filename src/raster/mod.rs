// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Planar RGB raster images.
//!
//! [`RgbImage`] stores the three color planes separately so the embedding
//! layer can address one plane at a time without striding through
//! interleaved pixels. Samples are 8-bit; pixel order within a plane is
//! row-major, left to right, top to bottom.

pub mod error;
pub mod ppm;

use serde::{Deserialize, Serialize};

use error::RasterError;

/// Maximum pixel dimension (width or height).
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum total pixel count (width × height).
pub const MAX_PIXELS: u32 = 16_000_000;

/// One of the three color planes of an [`RgbImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    /// All channels in wire order (R, G, B).
    pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

    /// ASCII byte used for this channel in the frame header.
    pub fn as_byte(self) -> u8 {
        match self {
            Channel::R => b'R',
            Channel::G => b'G',
            Channel::B => b'B',
        }
    }

    /// Parse the frame-header channel byte.
    pub fn from_byte(byte: u8) -> Option<Channel> {
        match byte {
            b'R' => Some(Channel::R),
            b'G' => Some(Channel::G),
            b'B' => Some(Channel::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
        })
    }
}

/// An owned RGB image with independent 8-bit planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    r: Vec<u8>,
    g: Vec<u8>,
    b: Vec<u8>,
}

impl RgbImage {
    /// Create a black image of the given dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let n = checked_pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            r: vec![0; n],
            g: vec![0; n],
            b: vec![0; n],
        })
    }

    /// Build an image from an interleaved RGB8 buffer (`RGBRGB...`).
    pub fn from_interleaved(width: u32, height: u32, rgb: &[u8]) -> Result<Self, RasterError> {
        let n = checked_pixel_count(width, height)?;
        if rgb.len() != n * 3 {
            return Err(RasterError::BufferSizeMismatch {
                expected: n * 3,
                actual: rgb.len(),
            });
        }
        let mut img = Self::new(width, height)?;
        for (i, px) in rgb.chunks_exact(3).enumerate() {
            img.r[i] = px[0];
            img.g[i] = px[1];
            img.b[i] = px[2];
        }
        Ok(img)
    }

    /// Serialize the planes back into an interleaved RGB8 buffer.
    pub fn to_interleaved(&self) -> Vec<u8> {
        let n = self.r.len();
        let mut out = Vec::with_capacity(n * 3);
        for i in 0..n {
            out.push(self.r[i]);
            out.push(self.g[i]);
            out.push(self.b[i]);
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels per plane.
    pub fn pixel_count(&self) -> usize {
        self.r.len()
    }

    /// Read access to one color plane.
    pub fn plane(&self, channel: Channel) -> &[u8] {
        match channel {
            Channel::R => &self.r,
            Channel::G => &self.g,
            Channel::B => &self.b,
        }
    }

    /// Mutable access to one color plane.
    pub fn plane_mut(&mut self, channel: Channel) -> &mut [u8] {
        match channel {
            Channel::R => &mut self.r,
            Channel::G => &mut self.g,
            Channel::B => &mut self.b,
        }
    }
}

/// Validate dimensions and return the per-plane sample count.
fn checked_pixel_count(width: u32, height: u32) -> Result<usize, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions);
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RasterError::InvalidDimensions);
    }
    match width.checked_mul(height) {
        Some(p) if p <= MAX_PIXELS => Ok(p as usize),
        _ => Err(RasterError::InvalidDimensions),
    }
}
