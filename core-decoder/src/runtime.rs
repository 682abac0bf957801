//! # Process-Wide Reader Runtime
//!
//! The source-reader backend decodes through a registry of container readers
//! and codecs that is built once per process and shared by every decoder
//! instance. This module owns that state and its init/teardown lifecycle.
//!
//! Initialization is lazy and idempotent: the first call to [`initialize`]
//! (typically via `SourceReaderDecoder::accepts` or `::new`) builds the
//! registries under a lock; concurrent first-time callers observe a single
//! initialization. A failed probe is cached as unavailable and never retried
//! per call.
//!
//! Teardown is an explicit external call ([`shutdown`]), not something
//! individual decoder instances perform. Live decoders hold an `Arc` to the
//! runtime and remain valid across a shutdown; a later [`initialize`] brings
//! the runtime back for new instances.

use parking_lot::Mutex;
use std::sync::Arc;
use symphonia::core::codecs::CodecRegistry;
use symphonia::core::probe::Probe;
use tracing::{debug, info};

/// Shared container-probe and codec registries for the source-reader backend.
pub(crate) struct ReaderRuntime {
    probe: Probe,
    codecs: CodecRegistry,
}

impl ReaderRuntime {
    fn build() -> Option<Self> {
        let mut codecs = CodecRegistry::new();
        symphonia::default::register_enabled_codecs(&mut codecs);

        let mut probe = Probe::default();
        symphonia::default::register_enabled_formats(&mut probe);

        Some(Self { probe, codecs })
    }

    pub(crate) fn probe(&self) -> &Probe {
        &self.probe
    }

    pub(crate) fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }
}

enum RuntimeState {
    Uninitialized,
    Ready(Arc<ReaderRuntime>),
    Unavailable,
}

static RUNTIME: Mutex<RuntimeState> = Mutex::new(RuntimeState::Uninitialized);

/// Initialize the process-wide reader runtime if it has not been already.
///
/// Returns `true` if the runtime is available. Safe to call from multiple
/// threads; only the first call performs work.
pub fn initialize() -> bool {
    let mut state = RUNTIME.lock();
    match &*state {
        RuntimeState::Ready(_) => true,
        RuntimeState::Unavailable => false,
        RuntimeState::Uninitialized => match ReaderRuntime::build() {
            Some(runtime) => {
                info!("Reader runtime initialized");
                *state = RuntimeState::Ready(Arc::new(runtime));
                true
            }
            None => {
                info!("Reader runtime unavailable");
                *state = RuntimeState::Unavailable;
                false
            }
        },
    }
}

/// Tear down the process-wide reader runtime.
///
/// Intended to be called once at process shutdown by the embedding
/// application. Decoders created before the teardown keep their own handle
/// to the runtime and continue to work.
pub fn shutdown() {
    let mut state = RUNTIME.lock();
    if matches!(*state, RuntimeState::Ready(_)) {
        debug!("Reader runtime shut down");
    }
    *state = RuntimeState::Uninitialized;
}

/// Acquire a handle to the runtime, initializing it on first use.
pub(crate) fn acquire() -> Option<Arc<ReaderRuntime>> {
    if !initialize() {
        return None;
    }
    match &*RUNTIME.lock() {
        RuntimeState::Ready(runtime) => Some(Arc::clone(runtime)),
        _ => None,
    }
}
