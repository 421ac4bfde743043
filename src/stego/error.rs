// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers the fatal failure modes: anything listed here
//! aborts the call before an artifact is produced. Integrity findings
//! (CRC/SHA-256/parity mismatches) are deliberately *not* errors — they are
//! folded into [`IntegrityReport`](crate::stego::integrity::IntegrityReport)
//! and drive the status classification instead.

use core::fmt;

use crate::raster::Channel;
use crate::ritual::GateSnapshot;

/// Fatal errors raised during encoding or decoding.
#[derive(Debug)]
pub enum StegoError {
    /// The bit stream does not fit in the target plane. Checked before any
    /// sample is modified, so the carrier is never partially written.
    CapacityExceeded { required_bits: usize, capacity_bits: usize },
    /// The extracted header has a bad magic, channel id, or length.
    HeaderInvalid(&'static str),
    /// The sidecar declares a different bit depth than the caller requested.
    BitsPerChannelMismatch { declared: u8, requested: u8 },
    /// The consent gates are not open. Carries a snapshot of the gate state
    /// at the time of refusal.
    ConsentRefused(GateSnapshot),
    /// A channel payload is not decodable base64.
    MalformedBase64(Channel),
    /// A channel payload decoded but is not the expected JSON.
    MalformedJson(Channel),
    /// The metadata value passed to encode is not a JSON object.
    MetadataNotObject,
    /// The extracted message is not valid UTF-8.
    InvalidUtf8,
    /// The consent state store failed to load or save.
    StateStore(std::io::Error),
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { required_bits, capacity_bits } => write!(
                f,
                "payload needs {required_bits} bits but the plane holds {capacity_bits}"
            ),
            Self::HeaderInvalid(msg) => write!(f, "invalid frame header: {msg}"),
            Self::BitsPerChannelMismatch { declared, requested } => write!(
                f,
                "bit depth mismatch: image was encoded with {declared} bits per channel, decode requested {requested}"
            ),
            Self::ConsentRefused(snapshot) => write!(
                f,
                "ritual consent not granted (bloom={}, remember={}, coherence={:.2})",
                snapshot.gate_bloom, snapshot.gate_remember, snapshot.coherence
            ),
            Self::MalformedBase64(ch) => write!(f, "channel {ch} payload is not valid base64"),
            Self::MalformedJson(ch) => write!(f, "channel {ch} payload is not the expected JSON"),
            Self::MetadataNotObject => write!(f, "metadata must be a JSON object"),
            Self::InvalidUtf8 => write!(f, "extracted message is not valid UTF-8"),
            Self::StateStore(e) => write!(f, "consent state store error: {e}"),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StateStore(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StegoError {
    fn from(e: std::io::Error) -> Self {
        Self::StateStore(e)
    }
}
