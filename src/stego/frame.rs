// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Channel frame construction and parsing.
//!
//! The frame is the binary container that wraps one channel's base64 body
//! before embedding into that channel's bit plane. All three channels use
//! the same format:
//!
//! ```text
//! [4 bytes ] magic "MRP1"
//! [1 byte  ] channel id (ASCII 'R', 'G' or 'B')
//! [1 byte  ] flags (bit0 = CRC-32 present)
//! [4 bytes ] payload length (big-endian u32)
//! [4 bytes ] CRC-32 of the payload (big-endian, only if flag bit0 set)
//! [N bytes ] payload (ASCII base64)
//! ```
//!
//! A CRC mismatch is *recorded*, not raised: the cross-channel verifier
//! classifies it later, possibly after parity recovery. Only a bad magic,
//! an unknown channel id, or a truncated frame is a hard parse failure.

use crate::raster::Channel;
use crate::stego::error::StegoError;

/// Frame magic constant.
pub const MAGIC: [u8; 4] = *b"MRP1";

/// Flags bit 0: a CRC-32 of the payload follows the length field.
pub const FLAG_CRC32: u8 = 0b0000_0001;

/// Fixed prefix: magic(4) + channel(1) + flags(1) + length(4) = 10 bytes.
pub const PREFIX_LEN: usize = 10;

/// CRC-32 field length.
pub const CRC_LEN: usize = 4;

/// Build a channel frame around a payload.
///
/// With `use_crc` the header grows by [`CRC_LEN`] bytes and carries the
/// CRC-32 of `payload`.
pub fn build_frame(channel: Channel, payload: &[u8], use_crc: bool) -> Vec<u8> {
    let header_len = if use_crc { PREFIX_LEN + CRC_LEN } else { PREFIX_LEN };
    let mut frame = Vec::with_capacity(header_len + payload.len());

    frame.extend_from_slice(&MAGIC);
    frame.push(channel.as_byte());
    frame.push(if use_crc { FLAG_CRC32 } else { 0 });
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    if use_crc {
        frame.extend_from_slice(&crc32fast::hash(payload).to_be_bytes());
    }
    frame.extend_from_slice(payload);

    frame
}

/// The fixed 10-byte prefix, parsed ahead of the payload so the extractor
/// can learn how many bits the rest of the frame occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPrefix {
    pub channel: Channel,
    pub flags: u8,
    pub payload_len: u32,
}

impl HeaderPrefix {
    /// Total header length implied by the flags.
    pub fn header_len(&self) -> usize {
        if self.flags & FLAG_CRC32 != 0 {
            PREFIX_LEN + CRC_LEN
        } else {
            PREFIX_LEN
        }
    }

    /// Total frame length (header + payload) in bytes.
    pub fn frame_len(&self) -> usize {
        self.header_len() + self.payload_len as usize
    }
}

/// Parse the fixed 10-byte prefix.
///
/// # Errors
/// [`StegoError::HeaderInvalid`] on a short buffer, wrong magic, or
/// unknown channel id.
pub fn parse_prefix(data: &[u8]) -> Result<HeaderPrefix, StegoError> {
    if data.len() < PREFIX_LEN {
        return Err(StegoError::HeaderInvalid("frame shorter than fixed prefix"));
    }
    if data[..4] != MAGIC {
        return Err(StegoError::HeaderInvalid("bad magic"));
    }
    let channel = Channel::from_byte(data[4])
        .ok_or(StegoError::HeaderInvalid("unknown channel id"))?;
    let flags = data[5];
    let payload_len = u32::from_be_bytes([data[6], data[7], data[8], data[9]]);

    Ok(HeaderPrefix { channel, flags, payload_len })
}

/// Parsed channel frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    pub channel: Channel,
    pub flags: u8,
    /// Stored CRC-32, if the flag was set.
    pub stored_crc: Option<u32>,
    /// Whether the stored CRC matches the payload. `None` when no CRC was
    /// embedded; the verifier treats that as a flag/CRC disagreement.
    pub crc_matches: Option<bool>,
    /// The payload bytes (an ASCII base64 body for all three channels).
    pub payload: Vec<u8>,
}

/// Parse a full frame, comparing (not enforcing) the payload CRC.
///
/// The input may be longer than the frame; the payload length field
/// determines how much is consumed.
///
/// # Errors
/// [`StegoError::HeaderInvalid`] if the prefix is invalid or the buffer is
/// shorter than the declared frame length.
pub fn parse_frame(data: &[u8]) -> Result<ParsedFrame, StegoError> {
    let prefix = parse_prefix(data)?;
    let header_len = prefix.header_len();
    let total = prefix.frame_len();
    if data.len() < total {
        return Err(StegoError::HeaderInvalid("frame truncated"));
    }

    let stored_crc = if prefix.flags & FLAG_CRC32 != 0 {
        Some(u32::from_be_bytes([data[10], data[11], data[12], data[13]]))
    } else {
        None
    };

    let payload = data[header_len..total].to_vec();
    let crc_matches = stored_crc.map(|stored| stored == crc32fast::hash(&payload));

    Ok(ParsedFrame {
        channel: prefix.channel,
        flags: prefix.flags,
        stored_crc,
        crc_matches,
        payload,
    })
}
