// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine assembly
//!
//! A builder constructs the stores, the delta engine, the task engine,
//! and the board executor in dependency order, and hands each part the
//! narrow capability objects it needs. No setters, no globals.

use crate::board::BoardExecutor;
use crate::delta::DeltaEngine;
use crate::error::EngineError;
use crate::tasks::TaskEngine;
use crate::wrap;
use drift_core::{Clock, UiEvent};
use drift_fs::FsAdapter;
use drift_storage::{BoardStore, Database, DeltaStore, HistoryStore};
use std::sync::Arc;

/// One-way publish of typed events to the frontend.
pub trait EventSink: Clone + Send + Sync + 'static {
    fn emit(&self, event: UiEvent);
}

/// Vault gating: the engine refuses to start tasks while locked.
pub trait UnlockGate: Send + Sync + 'static {
    fn is_unlocked(&self) -> bool;
}

/// Gate for setups with no vault configured.
#[derive(Clone, Default)]
pub struct AlwaysUnlocked;

impl UnlockGate for AlwaysUnlocked {
    fn is_unlocked(&self) -> bool {
        true
    }
}

/// The assembled sync orchestration core.
pub struct Engine<F: FsAdapter, E: EventSink, C: Clock> {
    fs: F,
    tasks: Arc<TaskEngine<F, E, C>>,
    delta: Arc<DeltaEngine<F, C>>,
    boards: BoardExecutor<F, E, C>,
}

impl<F: FsAdapter, E: EventSink, C: Clock> Engine<F, E, C> {
    pub fn builder(fs: F, events: E, clock: C, db: Database) -> EngineBuilder<F, E, C> {
        EngineBuilder {
            fs,
            events,
            clock,
            db,
            gate: Arc::new(AlwaysUnlocked),
        }
    }

    pub fn tasks(&self) -> &Arc<TaskEngine<F, E, C>> {
        &self.tasks
    }

    pub fn delta(&self) -> &Arc<DeltaEngine<F, C>> {
        &self.delta
    }

    pub fn boards(&self) -> &BoardExecutor<F, E, C> {
        &self.boards
    }

    /// Startup hygiene: remove crypt remotes orphaned by a crash.
    pub async fn startup(&self) -> Result<(), EngineError> {
        let removed = wrap::sweep_orphans(&self.fs).await?;
        if removed > 0 {
            tracing::info!(removed, "swept orphaned crypt remotes");
        }
        Ok(())
    }

    /// Stop watchers and ask running tasks to cancel.
    pub async fn shutdown(&self) {
        self.tasks.stop_all();
        self.delta.stop_all();
    }
}

/// Assembles an [`Engine`] in dependency order.
pub struct EngineBuilder<F: FsAdapter, E: EventSink, C: Clock> {
    fs: F,
    events: E,
    clock: C,
    db: Database,
    gate: Arc<dyn UnlockGate>,
}

impl<F: FsAdapter, E: EventSink, C: Clock> EngineBuilder<F, E, C> {
    /// Gate task starts on the vault's unlocked state.
    pub fn gate(mut self, gate: Arc<dyn UnlockGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn build(self) -> Engine<F, E, C> {
        let delta = Arc::new(DeltaEngine::new(
            self.fs.clone(),
            self.clock.clone(),
            DeltaStore::new(self.db.clone()),
        ));
        let tasks = Arc::new(TaskEngine::new(
            self.fs.clone(),
            self.events.clone(),
            self.clock.clone(),
            Arc::clone(&delta),
            HistoryStore::new(self.db.clone()),
            self.gate,
        ));
        let boards = BoardExecutor::new(
            self.fs.clone(),
            self.events,
            Arc::clone(&tasks),
            BoardStore::new(self.db),
        );

        Engine {
            fs: self.fs,
            tasks,
            delta,
            boards,
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
