// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Corruption and recovery integration tests.
//!
//! Bits are flipped directly in the embedded planes of a stego image, then
//! the decode classification is checked: single-channel damage inside the
//! parity-protected region is repaired (`recovered`), double-channel
//! damage is refused (`integrity_failed`, payload withheld), and damage to
//! a frame's own header CRC only degrades the result.

use mirrorpond_core::ledger::NullLedger;
use mirrorpond_core::ritual::MemoryStateStore;
use mirrorpond_core::stego::frame;
use mirrorpond_core::{decode, encode, BitDepth, Channel, IntegrityStatus, RgbImage};

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

/// A message shorter than its metadata, so the whole R body sits inside
/// the parity-protected region.
const MESSAGE: &str = "meet at the pond";
const META: &str = r#"{"channel": "north", "sequence": 12, "observer": "heron"}"#;

fn encoded_stego() -> RgbImage {
    let cover = gradient_cover(160, 160);
    let store = MemoryStateStore::open_gates();
    let meta: serde_json::Value = serde_json::from_str(META).unwrap();
    encode(&cover, MESSAGE, &meta, BitDepth::One, &store, &NullLedger).unwrap()
}

/// Flip one embedded bit in a channel's payload region (past the header).
/// At depth 1 the bit index is the sample index.
fn flip_payload_bit(img: &mut RgbImage, channel: Channel, payload_bit: usize) {
    let header_bits = (frame::PREFIX_LEN + frame::CRC_LEN) * 8;
    img.plane_mut(channel)[header_bits + payload_bit] ^= 0x01;
}

/// Flip one bit inside a frame's stored-CRC field (header bytes 10-13).
fn flip_header_crc_bit(img: &mut RgbImage, channel: Channel) {
    let crc_field_start = frame::PREFIX_LEN * 8;
    img.plane_mut(channel)[crc_field_start + 3] ^= 0x01;
}

#[test]
fn single_bit_r_corruption_recovers() {
    let mut stego = encoded_stego();
    flip_payload_bit(&mut stego, Channel::R, 10);

    let store = MemoryStateStore::open_gates();
    let out = decode(&stego, BitDepth::One, &store, &NullLedger).unwrap();

    assert_eq!(out.integrity.status, IntegrityStatus::Recovered);
    assert!(!out.integrity.crc_r_ok, "pre-recovery CRC result is kept");
    assert!(out.integrity.crc_g_ok);
    assert_eq!(out.integrity.recovered_channel, Some(Channel::R));
    assert_eq!(out.message.as_deref(), Some(MESSAGE), "message reconstructed via parity");
}

#[test]
fn single_bit_g_corruption_recovers() {
    let mut stego = encoded_stego();
    flip_payload_bit(&mut stego, Channel::G, 25);

    let store = MemoryStateStore::open_gates();
    let out = decode(&stego, BitDepth::One, &store, &NullLedger).unwrap();

    assert_eq!(out.integrity.status, IntegrityStatus::Recovered);
    assert_eq!(out.integrity.recovered_channel, Some(Channel::G));
    let expected: serde_json::Value = serde_json::from_str(META).unwrap();
    assert_eq!(out.metadata, Some(expected));
}

#[test]
fn double_corruption_withholds_payload() {
    let mut stego = encoded_stego();
    flip_payload_bit(&mut stego, Channel::R, 10);
    flip_payload_bit(&mut stego, Channel::G, 25);

    let store = MemoryStateStore::open_gates();
    let out = decode(&stego, BitDepth::One, &store, &NullLedger).unwrap();

    assert_eq!(out.integrity.status, IntegrityStatus::IntegrityFailed);
    assert_eq!(out.message, None, "no plaintext on verification failure");
    assert_eq!(out.metadata, None);
    assert_eq!(out.integrity.recovered_channel, None);
}

#[test]
fn header_crc_damage_only_degrades() {
    let mut stego = encoded_stego();
    flip_header_crc_bit(&mut stego, Channel::B);

    let store = MemoryStateStore::open_gates();
    let out = decode(&stego, BitDepth::One, &store, &NullLedger).unwrap();

    assert_eq!(out.integrity.status, IntegrityStatus::Degraded);
    assert!(!out.integrity.header_crc_b_ok);
    // Payload is still trusted and returned.
    assert_eq!(out.message.as_deref(), Some(MESSAGE));
}

#[test]
fn magic_damage_is_fatal() {
    let mut stego = encoded_stego();
    // First embedded bit is the high bit of 'M'.
    stego.plane_mut(Channel::R)[0] ^= 0x01;

    let store = MemoryStateStore::open_gates();
    let result = decode(&stego, BitDepth::One, &store, &NullLedger);
    assert!(matches!(result, Err(mirrorpond_core::StegoError::HeaderInvalid(_))));
}

#[test]
fn recovered_decode_is_recorded_with_recovered_status() {
    let mut stego = encoded_stego();
    flip_payload_bit(&mut stego, Channel::R, 4);

    let store = MemoryStateStore::open_gates();
    let ledger = mirrorpond_core::MemoryLedger::new();
    let _ = decode(&stego, BitDepth::One, &store, &ledger).unwrap();

    let entries = ledger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, "recovered");
}
