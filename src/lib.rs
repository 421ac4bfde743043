// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! # mirrorpond-core
//!
//! Tri-channel LSB steganography for RGB raster images. A message, its
//! metadata, and a cross-channel integrity sidecar are spread across the
//! red, green, and blue planes respectively; on extraction the sidecar's
//! CRC-32/SHA-256/XOR-parity material classifies the result as `ok`,
//! `recovered`, `degraded`, or `integrity_failed`, with single-channel
//! parity recovery when exactly one of R/G is corrupted.
//!
//! Every encode and decode is authorized by a persisted consent gate (the
//! `ritual` module) before any image bytes are touched, and recorded
//! through an abstract audit ledger after completion.
//!
//! This is detection-oriented steganography, not encryption: payloads are
//! base64-encoded plaintext and the embedding does not survive lossy
//! recompression of the carrier.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use mirrorpond_core::{encode, decode, BitDepth, RgbImage};
//! use mirrorpond_core::ritual::MemoryStateStore;
//! use mirrorpond_core::ledger::NullLedger;
//!
//! let cover = RgbImage::from_interleaved(width, height, &rgb_bytes)?;
//! let store = MemoryStateStore::open_gates();
//! let meta = serde_json::json!({"author": "pond"});
//!
//! let stego = encode(&cover, "hello", &meta, BitDepth::One, &store, &NullLedger)?;
//! let out = decode(&stego, BitDepth::One, &store, &NullLedger)?;
//! assert_eq!(out.message.as_deref(), Some("hello"));
//! ```

pub mod ledger;
pub mod raster;
pub mod ritual;
pub mod stego;

pub use ledger::{LedgerEntry, MemoryLedger, NullLedger, Operation, OperationLedger};
pub use raster::error::RasterError;
pub use raster::{Channel, RgbImage};
pub use ritual::{ConsentState, ConsentStateStore, GateSnapshot, RitualStep};
pub use stego::{decode, encode, BitDepth, DecodeOutput, IntegrityReport, IntegrityStatus, StegoError};
