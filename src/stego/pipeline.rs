// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Tri-channel encode/decode pipeline.
//!
//! Encode spreads three frames across the carrier's planes:
//! 1. R — base64 of the UTF-8 message
//! 2. G — base64 of the canonical-JSON metadata
//! 3. B — base64 of the integrity sidecar (CRCs, SHA-256 digests, XOR
//!    parity block)
//!
//! Consent is checked before anything else; capacity is checked for all
//! three planes before the first sample is written, so encode either
//! returns a complete stego image or leaves no partial output. Decode
//! never base64-decodes the R/G bodies until verification (and possibly
//! parity recovery) has run, so a corrupted channel reaches the verifier
//! instead of aborting as malformed base64.

use crate::ledger::{LedgerEntry, Operation, OperationLedger};
use crate::raster::{Channel, RgbImage};
use crate::ritual::{self, ConsentStateStore};
use crate::stego::bitplane::{self, BitDepth};
use crate::stego::error::StegoError;
use crate::stego::frame::{self, ParsedFrame};
use crate::stego::integrity::{self, IntegrityReport, IntegrityStatus, VerifyInput};
use crate::stego::payload;

/// Result of a decode: payload (unless withheld) plus the integrity report.
#[derive(Debug)]
pub struct DecodeOutput {
    /// Decoded message; `None` when the status is `integrity_failed`.
    pub message: Option<String>,
    /// Decoded metadata object; `None` when the status is `integrity_failed`.
    pub metadata: Option<serde_json::Value>,
    pub integrity: IntegrityReport,
}

/// Embed a message and metadata into a copy of the cover image.
///
/// The caller's image is never mutated. The consent gates must both be
/// open in the state loaded from `store`.
///
/// # Errors
/// - [`StegoError::ConsentRefused`] if the gates are closed.
/// - [`StegoError::MetadataNotObject`] if `metadata` is not a JSON object.
/// - [`StegoError::CapacityExceeded`] if any frame exceeds its plane.
/// - [`StegoError::StateStore`] if the consent state cannot be loaded.
pub fn encode(
    cover: &RgbImage,
    message: &str,
    metadata: &serde_json::Value,
    depth: BitDepth,
    store: &dyn ConsentStateStore,
    ledger: &dyn OperationLedger,
) -> Result<RgbImage, StegoError> {
    // 1. Consent comes first — before any image bytes are touched.
    let state = store.load()?;
    ritual::check_consent(&state, Operation::Encode)?;

    if !metadata.is_object() {
        return Err(StegoError::MetadataNotObject);
    }

    // 2. Channel bodies: base64 over UTF-8 / canonical JSON.
    let r_b64 = payload::b64_encode(message.as_bytes());
    let g_b64 = payload::b64_encode(payload::canonical_json(metadata).as_bytes());

    // 3. Sidecar: CRCs, both SHA-256 digests, XOR parity block.
    let sidecar = payload::build_sidecar(message, &r_b64, &g_b64, depth);
    let b_b64 = payload::b64_encode(payload::sidecar_to_json(&sidecar).as_bytes());

    // 4. Frames, in wire order.
    let frames = [
        frame::build_frame(Channel::R, r_b64.as_bytes(), true),
        frame::build_frame(Channel::G, g_b64.as_bytes(), true),
        frame::build_frame(Channel::B, b_b64.as_bytes(), true),
    ];

    // 5. Capacity gate over all three planes before any mutation.
    let capacity = bitplane::capacity_bits(cover.width(), cover.height(), depth);
    for f in &frames {
        let required = f.len() * 8;
        if required > capacity {
            return Err(StegoError::CapacityExceeded {
                required_bits: required,
                capacity_bits: capacity,
            });
        }
    }

    // 6. Embed into a copy.
    let mut stego = cover.clone();
    for (channel, f) in Channel::ALL.iter().zip(&frames) {
        let bits = bitplane::bytes_to_bits(f);
        bitplane::embed(stego.plane_mut(*channel), &bits, depth)?;
    }

    log::debug!(
        "encoded {}x{} carrier: r={}B g={}B b={}B at {} bpc",
        cover.width(),
        cover.height(),
        r_b64.len(),
        g_b64.len(),
        b_b64.len(),
        depth.bits()
    );

    // 7. Audit record — fire-and-forget by contract.
    ledger.record(&LedgerEntry {
        operation: Operation::Encode,
        channel_metadata: channel_summary(cover, &[r_b64.len(), g_b64.len(), b_b64.len()]),
        bits_per_channel: depth.bits(),
        status: "ok".to_string(),
    });

    Ok(stego)
}

/// Extract and verify the three channel payloads of a stego image.
///
/// Returns successfully for every integrity status; on `integrity_failed`
/// the message and metadata are withheld and only the report is populated.
///
/// # Errors
/// - [`StegoError::ConsentRefused`] if the gates are closed.
/// - [`StegoError::HeaderInvalid`] on a bad magic/channel id/length.
/// - [`StegoError::BitsPerChannelMismatch`] if the sidecar disagrees with
///   the requested depth.
/// - [`StegoError::MalformedBase64`] / [`StegoError::MalformedJson`] on an
///   undecodable sidecar, or on a verified-but-undecodable payload.
pub fn decode(
    stego: &RgbImage,
    depth: BitDepth,
    store: &dyn ConsentStateStore,
    ledger: &dyn OperationLedger,
) -> Result<DecodeOutput, StegoError> {
    // 1. Consent, as on encode.
    let state = store.load()?;
    ritual::check_consent(&state, Operation::Decode)?;

    // 2. Pull each channel's frame off its plane.
    let capacity = bitplane::capacity_bits(stego.width(), stego.height(), depth);
    let mut frames: Vec<ParsedFrame> = Vec::with_capacity(3);
    for channel in Channel::ALL {
        frames.push(extract_frame(stego, channel, depth, capacity)?);
    }

    // 3. The sidecar must decode — without it there is nothing to verify
    //    against.
    let b_raw = payload::b64_decode(&frames[2].payload, Channel::B)?;
    let sidecar = payload::sidecar_from_json(&b_raw)?;

    // 4. Depth agreement, before any payload content is surfaced.
    if sidecar.bits_per_channel != depth.bits() {
        return Err(StegoError::BitsPerChannelMismatch {
            declared: sidecar.bits_per_channel,
            requested: depth.bits(),
        });
    }

    // 5. Cross-channel verification, with single-channel parity recovery.
    let header_crc_ok = [
        frames[0].crc_matches == Some(true),
        frames[1].crc_matches == Some(true),
        frames[2].crc_matches == Some(true),
    ];
    let outcome = integrity::verify(VerifyInput {
        r_body: &frames[0].payload,
        g_body: &frames[1].payload,
        sidecar: &sidecar,
        header_crc_ok,
        capacity_bounds_ok: true, // enforced during extraction above
    });

    // 6. Surface the payload only when it can be trusted.
    let (message, metadata) = if outcome.report.status == IntegrityStatus::IntegrityFailed {
        (None, None)
    } else {
        let msg_bytes = payload::b64_decode(&outcome.r_body, Channel::R)?;
        let message = String::from_utf8(msg_bytes).map_err(|_| StegoError::InvalidUtf8)?;
        let meta_bytes = payload::b64_decode(&outcome.g_body, Channel::G)?;
        let metadata: serde_json::Value = serde_json::from_slice(&meta_bytes)
            .map_err(|_| StegoError::MalformedJson(Channel::G))?;
        (Some(message), Some(metadata))
    };

    log::debug!("decode finished with status {}", outcome.report.status);

    // 7. Audit record.
    ledger.record(&LedgerEntry {
        operation: Operation::Decode,
        channel_metadata: channel_summary(
            stego,
            &[frames[0].payload.len(), frames[1].payload.len(), frames[2].payload.len()],
        ),
        bits_per_channel: depth.bits(),
        status: outcome.report.status.as_str().to_string(),
    });

    Ok(DecodeOutput { message, metadata, integrity: outcome.report })
}

/// Extract one channel's frame: fixed prefix first to learn the length,
/// then the exact remaining bits.
fn extract_frame(
    stego: &RgbImage,
    channel: Channel,
    depth: BitDepth,
    capacity: usize,
) -> Result<ParsedFrame, StegoError> {
    let plane = stego.plane(channel);

    let prefix_bits = bitplane::extract(plane, frame::PREFIX_LEN * 8, depth)?;
    let prefix = frame::parse_prefix(&bitplane::bits_to_bytes(&prefix_bits))?;
    if prefix.channel != channel {
        return Err(StegoError::HeaderInvalid("channel id does not match its plane"));
    }

    let total_bits = prefix
        .frame_len()
        .checked_mul(8)
        .filter(|&bits| bits <= capacity)
        .ok_or(StegoError::HeaderInvalid("declared payload length exceeds plane capacity"))?;

    let frame_bits = bitplane::extract(plane, total_bits, depth)?;
    frame::parse_frame(&bitplane::bits_to_bytes(&frame_bits))
}

/// Loose per-channel summary for the audit ledger.
fn channel_summary(img: &RgbImage, body_lens: &[usize; 3]) -> serde_json::Value {
    serde_json::json!({
        "width": img.width(),
        "height": img.height(),
        "r_len": body_lens[0],
        "g_len": body_lens[1],
        "b_len": body_lens[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NullLedger;
    use crate::ritual::MemoryStateStore;

    fn gradient_cover(width: u32, height: u32) -> RgbImage {
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                rgb.push((x * 7 + y) as u8);
                rgb.push((x + y * 5) as u8);
                rgb.push((x * 3 + y * 11) as u8);
            }
        }
        RgbImage::from_interleaved(width, height, &rgb).unwrap()
    }

    #[test]
    fn encode_does_not_mutate_cover() {
        let cover = gradient_cover(64, 64);
        let before = cover.clone();
        let store = MemoryStateStore::open_gates();
        let meta = serde_json::json!({"k": "v"});
        let _ = encode(&cover, "hi", &meta, BitDepth::One, &store, &NullLedger).unwrap();
        assert_eq!(cover, before);
    }

    #[test]
    fn stego_differs_only_in_low_bits() {
        let cover = gradient_cover(64, 64);
        let store = MemoryStateStore::open_gates();
        let meta = serde_json::json!({"k": "v"});
        let stego = encode(&cover, "hi", &meta, BitDepth::One, &store, &NullLedger).unwrap();
        for ch in Channel::ALL {
            for (a, b) in cover.plane(ch).iter().zip(stego.plane(ch)) {
                assert_eq!(a & 0xFE, b & 0xFE);
            }
        }
    }

    #[test]
    fn metadata_must_be_object() {
        let cover = gradient_cover(32, 32);
        let store = MemoryStateStore::open_gates();
        let result = encode(
            &cover,
            "hi",
            &serde_json::json!([1, 2, 3]),
            BitDepth::One,
            &store,
            &NullLedger,
        );
        assert!(matches!(result, Err(StegoError::MetadataNotObject)));
    }

    #[test]
    fn oversized_message_rejected_before_mutation() {
        let cover = gradient_cover(16, 16); // 256 bits per plane at depth 1
        let store = MemoryStateStore::open_gates();
        let meta = serde_json::json!({});
        let result = encode(&cover, &"x".repeat(500), &meta, BitDepth::One, &store, &NullLedger);
        assert!(matches!(result, Err(StegoError::CapacityExceeded { .. })));
    }

    #[test]
    fn decode_random_plane_is_header_invalid() {
        let img = gradient_cover(64, 64);
        let store = MemoryStateStore::open_gates();
        let result = decode(&img, BitDepth::One, &store, &NullLedger);
        assert!(matches!(result, Err(StegoError::HeaderInvalid(_))));
    }
}
