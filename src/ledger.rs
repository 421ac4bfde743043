// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Operation ledger interface.
//!
//! The pipeline records one entry per completed encode or decode through
//! [`OperationLedger`]. Recording is fire-and-forget: implementations must
//! swallow their own failures (logging is fine), because a ledger problem
//! must never roll back a finished operation. Persistence lives with the
//! caller — this crate only ships a no-op sink and an in-memory sink.

use std::sync::Mutex;

use serde::Serialize;

/// The two gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Encode,
    Decode,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Encode => "encode",
            Operation::Decode => "decode",
        }
    }
}

/// One recorded operation.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub operation: Operation,
    /// Loose per-channel summary (dimensions, body lengths).
    pub channel_metadata: serde_json::Value,
    pub bits_per_channel: u8,
    /// Final status string: `"ok"` for encode, the integrity status for
    /// decode.
    pub status: String,
}

/// Abstract audit sink consumed by the pipeline.
pub trait OperationLedger {
    /// Record a completed operation. Must not fail the caller.
    fn record(&self, entry: &LedgerEntry);
}

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLedger;

impl OperationLedger for NullLedger {
    fn record(&self, _entry: &LedgerEntry) {}
}

/// Collects entries in memory; used by tests to assert ledger behavior.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().expect("ledger lock poisoned").clone()
    }
}

impl OperationLedger for MemoryLedger {
    fn record(&self, entry: &LedgerEntry) {
        self.entries.lock().expect("ledger lock poisoned").push(entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_ledger_collects() {
        let ledger = MemoryLedger::new();
        ledger.record(&LedgerEntry {
            operation: Operation::Encode,
            channel_metadata: serde_json::json!({"r_len": 12}),
            bits_per_channel: 1,
            status: "ok".to_string(),
        });
        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Encode);
        assert_eq!(entries[0].status, "ok");
    }

    #[test]
    fn operation_strings() {
        assert_eq!(Operation::Encode.as_str(), "encode");
        assert_eq!(Operation::Decode.as_str(), "decode");
    }

    #[test]
    fn entry_serializes_lowercase_operation() {
        let entry = LedgerEntry {
            operation: Operation::Decode,
            channel_metadata: serde_json::json!({}),
            bits_per_channel: 4,
            status: "recovered".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"operation\":\"decode\""));
        assert!(json.contains("\"bits_per_channel\":4"));
    }
}
