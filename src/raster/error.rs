// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Error types for raster parsing and construction.

use std::fmt;

/// Errors that can occur while building an [`RgbImage`](super::RgbImage)
/// or parsing a PPM stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Input data is too short or truncated.
    UnexpectedEof,
    /// Missing `P6` magic at the start of a PPM stream.
    InvalidMagic,
    /// A PPM header field is missing, non-numeric, or out of range.
    InvalidHeader(&'static str),
    /// Only 8-bit samples (maxval 255) are supported.
    UnsupportedMaxval(u32),
    /// Width or height is zero, or the pixel count overflows.
    InvalidDimensions,
    /// Buffer length does not match width × height × 3.
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of raster data"),
            Self::InvalidMagic => write!(f, "missing P6 magic (not a binary PPM)"),
            Self::InvalidHeader(msg) => write!(f, "invalid PPM header: {msg}"),
            Self::UnsupportedMaxval(v) => write!(f, "unsupported PPM maxval: {v} (only 255)"),
            Self::InvalidDimensions => write!(f, "invalid image dimensions"),
            Self::BufferSizeMismatch { expected, actual } => {
                write!(f, "pixel buffer size mismatch: expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for RasterError {}

pub type Result<T> = std::result::Result<T, RasterError>;
