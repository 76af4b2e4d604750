// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::engine::{Engine, EventSink, UnlockGate};
use drift_core::{FakeClock, UiEvent};
use drift_fs::FakeFs;
use drift_storage::Database;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Event sink that records everything emitted.
#[derive(Clone, Default)]
pub(crate) struct CollectingSink {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl CollectingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn tags(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.tag()).collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().push(event);
    }
}

/// Gate toggled by tests.
pub(crate) struct ToggleGate(pub AtomicBool);

impl ToggleGate {
    pub(crate) fn unlocked() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(true)))
    }

    pub(crate) fn set(&self, unlocked: bool) {
        self.0.store(unlocked, Ordering::SeqCst);
    }
}

impl UnlockGate for ToggleGate {
    fn is_unlocked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A fully wired engine on a temp database and fake filesystem.
pub(crate) struct EngineFixture {
    pub _dir: tempfile::TempDir,
    pub fs: FakeFs,
    pub clock: FakeClock,
    pub sink: CollectingSink,
    pub gate: Arc<ToggleGate>,
    pub engine: Engine<FakeFs, CollectingSink, FakeClock>,
    pub db: Database,
}

pub(crate) fn engine_fixture() -> EngineFixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("drift.db")).unwrap();
    let fs = FakeFs::new();
    let clock = FakeClock::new();
    let sink = CollectingSink::new();
    let gate = ToggleGate::unlocked();

    let engine = Engine::builder(fs.clone(), sink.clone(), clock.clone(), db.clone())
        .gate(gate.clone() as Arc<dyn UnlockGate>)
        .build();

    EngineFixture {
        _dir: dir,
        fs,
        clock,
        sink,
        gate,
        engine,
        db,
    }
}
