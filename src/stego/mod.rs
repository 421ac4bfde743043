// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Steganographic encoding and decoding.
//!
//! The R plane carries the message, the G plane carries the metadata, and
//! the B plane carries a cross-channel integrity sidecar (CRC-32s, two
//! SHA-256 digests, and an XOR parity block that can rebuild one corrupted
//! channel from the other). Every channel is wrapped in an `MRP1` frame
//! before embedding.
//!
//! This scheme is about *detection*, not secrecy: payloads are base64, not
//! ciphertext, and the embedding does not survive lossy recompression or
//! geometric transforms of the carrier.

pub mod bitplane;
pub mod error;
pub mod frame;
pub mod integrity;
pub mod payload;
mod pipeline;

pub use bitplane::BitDepth;
pub use error::StegoError;
pub use integrity::{IntegrityReport, IntegrityStatus};
pub use payload::Sidecar;
pub use pipeline::{decode, encode, DecodeOutput};
