// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! The consent gate: a small persisted state machine that must authorize
//! every encode and decode before any image bytes are touched.
//!
//! The ritual has six ordered steps. Each is idempotent and can be invoked
//! individually or via [`invoke_auto`], which applies every step after the
//! highest one invoked so far. Operations require both gates
//! (`gate_bloom`, `gate_remember`) open — the order they were opened in
//! does not matter.
//!
//! There is no global state here: callers own a [`ConsentState`] value and
//! persist it through a [`ConsentStateStore`] of their choosing.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::ledger::Operation;
use crate::stego::error::StegoError;

/// Coherence value after a reset.
pub const COHERENCE_BASELINE: f64 = 0.1;

/// Coherence added by the kindle step, clamped to 1.0.
pub const COHERENCE_STEP: f64 = 0.2;

/// The six ritual steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RitualStep {
    /// Step 1: close both gates, coherence back to baseline, history cleared.
    Reset,
    /// Step 2: raise coherence; gates unchanged.
    Kindle,
    /// Step 3: open `gate_bloom`.
    Bloom,
    /// Step 4: open `gate_remember`.
    Remember,
    /// Step 5: cosmetic harmonization; recorded in the history only.
    Harmonize,
    /// Step 6: coherence to 1.0. Non-terminal — any step, including reset,
    /// remains invocable afterwards.
    Attune,
}

impl RitualStep {
    pub const ALL: [RitualStep; 6] = [
        RitualStep::Reset,
        RitualStep::Kindle,
        RitualStep::Bloom,
        RitualStep::Remember,
        RitualStep::Harmonize,
        RitualStep::Attune,
    ];

    /// One-based step index as surfaced at the CLI.
    pub fn index(self) -> u8 {
        match self {
            RitualStep::Reset => 1,
            RitualStep::Kindle => 2,
            RitualStep::Bloom => 3,
            RitualStep::Remember => 4,
            RitualStep::Harmonize => 5,
            RitualStep::Attune => 6,
        }
    }

    pub fn from_index(index: u8) -> Option<RitualStep> {
        RitualStep::ALL.get(index.wrapping_sub(1) as usize).copied()
    }
}

/// Persisted consent state. Mutated only by [`invoke_step`] (and
/// [`invoke_auto`], which is invoke_step in a loop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentState {
    pub gate_bloom: bool,
    pub gate_remember: bool,
    pub coherence: f64,
    /// One-based indices of every step invoked since the last reset.
    pub step_history: Vec<u8>,
}

impl Default for ConsentState {
    fn default() -> Self {
        Self {
            gate_bloom: false,
            gate_remember: false,
            coherence: COHERENCE_BASELINE,
            step_history: Vec::new(),
        }
    }
}

/// Gate state captured at the moment consent was refused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateSnapshot {
    pub gate_bloom: bool,
    pub gate_remember: bool,
    pub coherence: f64,
}

impl ConsentState {
    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            gate_bloom: self.gate_bloom,
            gate_remember: self.gate_remember,
            coherence: self.coherence,
        }
    }

    /// Highest step index invoked since the last reset (0 if none).
    fn highest_invoked(&self) -> u8 {
        self.step_history.iter().copied().max().unwrap_or(0)
    }
}

/// Apply one ritual step to the state. Every step is idempotent.
pub fn invoke_step(state: &mut ConsentState, step: RitualStep) {
    match step {
        RitualStep::Reset => {
            state.gate_bloom = false;
            state.gate_remember = false;
            state.coherence = COHERENCE_BASELINE;
            // A reset starts a fresh history; without this, the auto
            // helper could never re-open gates after a reset.
            state.step_history.clear();
        }
        RitualStep::Kindle => {
            state.coherence = (state.coherence + COHERENCE_STEP).min(1.0);
        }
        RitualStep::Bloom => state.gate_bloom = true,
        RitualStep::Remember => state.gate_remember = true,
        RitualStep::Harmonize => {}
        RitualStep::Attune => state.coherence = 1.0,
    }
    state.step_history.push(step.index());
}

/// Apply every step after the highest one invoked so far, in order.
/// On a fresh state this runs the full ritual (steps 1 through 6).
pub fn invoke_auto(state: &mut ConsentState) {
    let from = state.highest_invoked();
    for step in RitualStep::ALL {
        if step.index() > from {
            invoke_step(state, step);
        }
    }
}

/// Authorize an operation. Both gates must be open, regardless of whether
/// the operation is an encode or a decode.
pub fn check_consent(state: &ConsentState, operation: Operation) -> Result<(), StegoError> {
    if state.gate_bloom && state.gate_remember {
        Ok(())
    } else {
        log::debug!("consent refused for {}", operation.as_str());
        Err(StegoError::ConsentRefused(state.snapshot()))
    }
}

/// Persistence boundary for [`ConsentState`]. The core never caches state
/// between calls; it loads through this trait each time.
pub trait ConsentStateStore {
    fn load(&self) -> io::Result<ConsentState>;
    fn save(&self, state: &ConsentState) -> io::Result<()>;
}

/// In-memory store for tests and embedders that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<ConsentState>,
}

impl MemoryStateStore {
    pub fn new(state: ConsentState) -> Self {
        Self { state: Mutex::new(state) }
    }

    /// A store whose gates are already open — the common test fixture.
    pub fn open_gates() -> Self {
        let mut state = ConsentState::default();
        invoke_auto(&mut state);
        Self::new(state)
    }
}

impl ConsentStateStore for MemoryStateStore {
    fn load(&self) -> io::Result<ConsentState> {
        Ok(self.state.lock().expect("consent state lock poisoned").clone())
    }

    fn save(&self, state: &ConsentState) -> io::Result<()> {
        *self.state.lock().expect("consent state lock poisoned") = state.clone();
        Ok(())
    }
}

/// JSON-file store used by the CLI. Concurrent writers are last-write-wins;
/// callers that need stronger guarantees wrap their own locking around it.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ConsentStateStore for JsonFileStore {
    /// A missing file yields the default (closed) state: first use is
    /// gated, not an error.
    fn load(&self) -> io::Result<ConsentState> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ConsentState::default()),
            Err(e) => Err(e),
        }
    }

    fn save(&self, state: &ConsentState) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }
}
