// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Cross-channel integrity verification and single-channel recovery.
//!
//! All checks are recomputed from the extracted channel bodies and compared
//! against the sidecar. Critical checks decide whether the payload can be
//! trusted; non-critical checks only downgrade `ok` to `degraded`. When
//! exactly one of R/G fails its CRC, the verifier attempts to rebuild that
//! body from the XOR parity block and the surviving channel — the
//! reconstruction is accepted only if its CRC-32 matches the stored value.
//!
//! The report always carries the *pre-recovery* check results: a recovered
//! decode still shows `crc_r_ok = false` for the channel that was repaired.

use serde::Serialize;

use crate::raster::Channel;
use crate::stego::payload::{self, Sidecar, ECC_SCHEME_XOR};

/// Outcome classification for one decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// Every critical and non-critical check passed.
    Ok,
    /// One channel failed its CRC and was rebuilt from parity.
    Recovered,
    /// Payload trusted, but a non-critical sidecar check failed.
    Degraded,
    /// Verification failed and no reconstruction was possible; the payload
    /// is withheld.
    IntegrityFailed,
}

impl IntegrityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Recovered => "recovered",
            Self::Degraded => "degraded",
            Self::IntegrityFailed => "integrity_failed",
        }
    }
}

impl std::fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-check results of one decode, plus the derived status.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    // Critical checks.
    pub crc_r_ok: bool,
    pub crc_g_ok: bool,
    pub sha256_ok: bool,
    pub ecc_scheme_ok: bool,
    pub parity_ok: bool,
    // Non-critical sidecar-consistency checks.
    pub header_crc_r_ok: bool,
    pub header_crc_g_ok: bool,
    pub header_crc_b_ok: bool,
    pub parity_len_ok: bool,
    pub capacity_bounds_ok: bool,
    /// Which channel was rebuilt from parity, if any.
    pub recovered_channel: Option<Channel>,
    pub status: IntegrityStatus,
}

impl IntegrityReport {
    fn critical_ok(&self) -> bool {
        self.crc_r_ok && self.crc_g_ok && self.sha256_ok && self.ecc_scheme_ok && self.parity_ok
    }

    fn noncritical_ok(&self) -> bool {
        self.header_crc_r_ok
            && self.header_crc_g_ok
            && self.header_crc_b_ok
            && self.parity_len_ok
            && self.capacity_bounds_ok
    }
}

/// Extracted material handed to the verifier by the orchestrator.
pub struct VerifyInput<'a> {
    /// R body as extracted (base64 string bytes, possibly corrupted).
    pub r_body: &'a [u8],
    /// G body as extracted.
    pub g_body: &'a [u8],
    pub sidecar: &'a Sidecar,
    /// Per-frame header flag/CRC agreement (flag present and CRC matched).
    pub header_crc_ok: [bool; 3],
    /// Declared frame sizes stayed within plane capacity.
    pub capacity_bounds_ok: bool,
}

/// Verification outcome: the report plus the (possibly repaired) bodies.
pub struct VerifyOutcome {
    pub report: IntegrityReport,
    pub r_body: Vec<u8>,
    pub g_body: Vec<u8>,
}

/// Parse a stored hex CRC-32. Accepts either case; `None` on junk.
fn parse_crc_hex(s: &str) -> Option<u32> {
    u32::from_str_radix(s, 16).ok()
}

fn crc_matches(stored: &str, body: &[u8]) -> bool {
    parse_crc_hex(stored) == Some(crc32fast::hash(body))
}

fn sha_matches(stored: &str, body: &[u8]) -> bool {
    payload::sha256_hex(body).eq_ignore_ascii_case(stored)
}

/// Run all checks against the extracted bodies and classify the outcome.
pub fn verify(input: VerifyInput<'_>) -> VerifyOutcome {
    let sidecar = input.sidecar;

    let crc_r_ok = crc_matches(&sidecar.crc_r, input.r_body);
    let crc_g_ok = crc_matches(&sidecar.crc_g, input.g_body);
    let ecc_scheme_ok = sidecar.ecc_scheme == ECC_SCHEME_XOR;

    // Both SHA-256 fields must match: the digest of the base64 body, and
    // the digest of the decoded message bytes (unverifiable if the body
    // does not decode).
    let sha_b64_ok = sha_matches(&sidecar.sha256_msg_b64, input.r_body);
    let sha_msg_ok = payload::b64_decode(input.r_body, Channel::R)
        .map(|msg| sha_matches(&sidecar.sha256_msg, &msg))
        .unwrap_or(false);
    let sha256_ok = sha_b64_ok && sha_msg_ok;

    // An undecodable parity block fails the parity check rather than
    // aborting the call; without a usable block there is nothing to
    // recover from either.
    let parity_block = payload::b64_decode(sidecar.parity_block_b64.as_bytes(), Channel::B).ok();
    let parity_ok = match &parity_block {
        Some(block) => *block == payload::build_parity(input.r_body, input.g_body),
        None => false,
    };
    let parity_len_ok = parity_block
        .as_ref()
        .map(|block| block.len() == sidecar.parity_len)
        .unwrap_or(false);

    let mut report = IntegrityReport {
        crc_r_ok,
        crc_g_ok,
        sha256_ok,
        ecc_scheme_ok,
        parity_ok,
        header_crc_r_ok: input.header_crc_ok[0],
        header_crc_g_ok: input.header_crc_ok[1],
        header_crc_b_ok: input.header_crc_ok[2],
        parity_len_ok,
        capacity_bounds_ok: input.capacity_bounds_ok,
        recovered_channel: None,
        status: IntegrityStatus::IntegrityFailed,
    };

    let mut r_body = input.r_body.to_vec();
    let mut g_body = input.g_body.to_vec();

    if report.critical_ok() {
        report.status = if report.noncritical_ok() {
            IntegrityStatus::Ok
        } else {
            IntegrityStatus::Degraded
        };
        return VerifyOutcome { report, r_body, g_body };
    }

    // Single-channel recovery: exactly one of R/G failed its CRC, the
    // scheme is XOR, and a parity block is present.
    if crc_r_ok != crc_g_ok && ecc_scheme_ok {
        if let Some(block) = &parity_block {
            if crc_g_ok {
                // Rebuild R from parity + G. The reconstruction is sized to
                // the extracted R body: truncate the block-sized XOR result
                // or keep the unprotected overhang from the extraction.
                let full = payload::xor_reconstruct(block, &g_body, &[]);
                let candidate = if r_body.len() <= full.len() {
                    full[..r_body.len()].to_vec()
                } else {
                    let mut c = full;
                    c.extend_from_slice(&r_body[c.len()..]);
                    c
                };
                if crc_matches(&sidecar.crc_r, &candidate) {
                    r_body = candidate;
                    report.recovered_channel = Some(Channel::R);
                    report.status = IntegrityStatus::Recovered;
                    return VerifyOutcome { report, r_body, g_body };
                }
            } else {
                // Rebuild G from parity + R; G's length equals the block's.
                let candidate = payload::xor_reconstruct(block, &r_body, &[]);
                if crc_matches(&sidecar.crc_g, &candidate) {
                    g_body = candidate;
                    report.recovered_channel = Some(Channel::G);
                    report.status = IntegrityStatus::Recovered;
                    return VerifyOutcome { report, r_body, g_body };
                }
            }
        }
    }

    report.status = IntegrityStatus::IntegrityFailed;
    VerifyOutcome { report, r_body, g_body }
}
