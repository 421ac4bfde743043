// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Channel payload assembly: base64 bodies, canonical JSON, and the
//! cross-channel integrity sidecar.
//!
//! Each channel carries an ASCII base64 body:
//!
//! - **R**: base64 of the UTF-8 message
//! - **G**: base64 of the canonical-JSON metadata object
//! - **B**: base64 of the canonical-JSON [`Sidecar`]
//!
//! Canonical JSON means compact output with object keys in sorted order,
//! so the CRC/SHA-256 values in the sidecar are byte-exact reproducible.
//! The XOR parity block is sized to the G body; R bytes past that length
//! carry no parity protection (the sidecar's CRC still detects their
//! corruption, it just cannot repair it).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::raster::Channel;
use crate::stego::bitplane::BitDepth;
use crate::stego::error::StegoError;

/// The only error-correction scheme this format knows.
pub const ECC_SCHEME_XOR: &str = "xor";

/// Cross-channel integrity sidecar, embedded as the B channel's JSON body.
///
/// Field order is the canonical serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    /// Uppercase-hex CRC-32 of the R base64 body.
    pub crc_r: String,
    /// Uppercase-hex CRC-32 of the G base64 body.
    pub crc_g: String,
    /// Hex SHA-256 of the raw UTF-8 message bytes.
    pub sha256_msg: String,
    /// Hex SHA-256 of the R base64 body.
    pub sha256_msg_b64: String,
    /// Base64 of the XOR parity block.
    pub parity_block_b64: String,
    /// Declared parity block length in bytes.
    pub parity_len: usize,
    /// Bit depth the channels were embedded with.
    pub bits_per_channel: u8,
    /// Always [`ECC_SCHEME_XOR`].
    pub ecc_scheme: String,
}

/// Base64-encode bytes with the standard alphabet (padded).
pub fn b64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Base64-decode a channel body.
pub fn b64_decode(body: &[u8], channel: Channel) -> Result<Vec<u8>, StegoError> {
    STANDARD
        .decode(body)
        .map_err(|_| StegoError::MalformedBase64(channel))
}

/// Serialize a JSON value canonically: compact, object keys sorted.
///
/// `serde_json`'s default object map keeps keys in sorted order, so the
/// compact writer already produces the canonical form — this helper exists
/// so every call site goes through one place.
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json::to_string(value).expect("JSON value serialization cannot fail")
}

/// Uppercase-hex CRC-32 of a byte body, as stored in the sidecar.
pub fn crc32_hex(body: &[u8]) -> String {
    format!("{:08X}", crc32fast::hash(body))
}

/// Hex SHA-256 of a byte body.
pub fn sha256_hex(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Build the XOR parity block. The block length equals `g.len()`:
/// `parity[i] = g[i] ^ r[i]` where R still has bytes, else `g[i]`.
pub fn build_parity(r: &[u8], g: &[u8]) -> Vec<u8> {
    g.iter()
        .enumerate()
        .map(|(i, &gb)| gb ^ r.get(i).copied().unwrap_or(0))
        .collect()
}

/// Reconstruct one channel body from the parity block and the other body.
///
/// XOR parity is symmetric, so the same operation recovers either side:
/// `parity[i] ^ other[i]` yields the missing byte. `tail` supplies bytes
/// past the parity block (the unprotected R overhang when reconstructing
/// R; empty when reconstructing G, whose length equals the block's).
pub fn xor_reconstruct(parity: &[u8], other: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = parity
        .iter()
        .enumerate()
        .map(|(i, &pb)| pb ^ other.get(i).copied().unwrap_or(0))
        .collect();
    out.extend_from_slice(tail);
    out
}

/// Assemble the sidecar for the given message and channel bodies.
pub fn build_sidecar(message: &str, r_b64: &str, g_b64: &str, depth: BitDepth) -> Sidecar {
    let parity = build_parity(r_b64.as_bytes(), g_b64.as_bytes());
    Sidecar {
        crc_r: crc32_hex(r_b64.as_bytes()),
        crc_g: crc32_hex(g_b64.as_bytes()),
        sha256_msg: sha256_hex(message.as_bytes()),
        sha256_msg_b64: sha256_hex(r_b64.as_bytes()),
        parity_block_b64: b64_encode(&parity),
        parity_len: parity.len(),
        bits_per_channel: depth.bits(),
        ecc_scheme: ECC_SCHEME_XOR.to_string(),
    }
}

/// Serialize the sidecar canonically (struct field order is fixed).
pub fn sidecar_to_json(sidecar: &Sidecar) -> String {
    serde_json::to_string(sidecar).expect("sidecar serialization cannot fail")
}

/// Parse a decoded B body as a sidecar.
pub fn sidecar_from_json(body: &[u8]) -> Result<Sidecar, StegoError> {
    serde_json::from_slice(body).map_err(|_| StegoError::MalformedJson(Channel::B))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_sorts_keys() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"zulu": 1, "alpha": {"n": 2, "a": 3}}"#).unwrap();
        assert_eq!(canonical_json(&value), r#"{"alpha":{"a":3,"n":2},"zulu":1}"#);
    }

    #[test]
    fn canonical_json_is_stable() {
        let a: serde_json::Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn crc_hex_is_uppercase_and_padded() {
        let hex = crc32_hex(b"hello");
        assert_eq!(hex.len(), 8);
        assert_eq!(hex, hex.to_ascii_uppercase());
        // Known vector: CRC-32 of "hello" = 0x3610A686.
        assert_eq!(hex, "3610A686");
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parity_when_r_shorter_than_g() {
        let r = b"ab";
        let g = b"wxyz";
        let parity = build_parity(r, g);
        assert_eq!(parity.len(), 4);
        assert_eq!(parity[0], b'w' ^ b'a');
        assert_eq!(parity[1], b'x' ^ b'b');
        // R exhausted — raw G bytes.
        assert_eq!(parity[2], b'y');
        assert_eq!(parity[3], b'z');
    }

    #[test]
    fn parity_when_r_longer_than_g() {
        let r = b"abcdef";
        let g = b"wx";
        let parity = build_parity(r, g);
        // Sized to G; the last four R bytes are unprotected.
        assert_eq!(parity.len(), 2);
    }

    #[test]
    fn reconstruct_r_from_parity_and_g() {
        let r = b"SGVsbG8h".to_vec();
        let g = b"eyJrIjoxfQ==".to_vec();
        let parity = build_parity(&r, &g);
        // R is shorter than the parity block, so there is no tail.
        let rebuilt = xor_reconstruct(&parity, &g, &[]);
        // Reconstruction is block-sized; R's bytes are the prefix, the rest
        // is zero (parity of a missing R byte XOR g = g ^ g = 0).
        assert_eq!(&rebuilt[..r.len()], &r[..]);
        assert!(rebuilt[r.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reconstruct_g_from_parity_and_r() {
        let r = b"SGVsbG8h";
        let g = b"eyJrIjoxfQ==";
        let parity = build_parity(r, g);
        let rebuilt = xor_reconstruct(&parity, r, &[]);
        assert_eq!(rebuilt, g);
    }

    #[test]
    fn sidecar_json_roundtrip() {
        let sidecar = build_sidecar("hi", "aGk=", "e30=", BitDepth::One);
        let json = sidecar_to_json(&sidecar);
        let back = sidecar_from_json(json.as_bytes()).unwrap();
        assert_eq!(back, sidecar);
        assert_eq!(back.ecc_scheme, "xor");
        assert_eq!(back.bits_per_channel, 1);
    }

    #[test]
    fn sidecar_crcs_match_bodies() {
        let sidecar = build_sidecar("hello", "aGVsbG8=", "e30=", BitDepth::Four);
        assert_eq!(sidecar.crc_r, crc32_hex(b"aGVsbG8="));
        assert_eq!(sidecar.crc_g, crc32_hex(b"e30="));
        assert_eq!(sidecar.sha256_msg, sha256_hex(b"hello"));
        assert_eq!(sidecar.sha256_msg_b64, sha256_hex(b"aGVsbG8="));
        assert_eq!(sidecar.parity_len, 4);
    }

    #[test]
    fn b64_decode_malformed_names_channel() {
        match b64_decode(b"!!not-base64!!", Channel::G) {
            Err(StegoError::MalformedBase64(Channel::G)) => {}
            other => panic!("expected MalformedBase64(G), got {other:?}"),
        }
    }

    #[test]
    fn malformed_sidecar_json_rejected() {
        assert!(matches!(
            sidecar_from_json(b"{\"crc_r\": 12}"),
            Err(StegoError::MalformedJson(Channel::B))
        ));
    }
}
