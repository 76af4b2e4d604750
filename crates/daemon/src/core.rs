// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core assembly
//!
//! Builds storage, vault, and engine in dependency order and hands out
//! capability objects: the engine sees the vault only through an
//! [`UnlockGate`], the vault never touches the engine, and both publish
//! to the frontend through the same bus.

use crate::bus::{FrontendBus, DEFAULT_BUS_CAPACITY};
use crate::config::Config;
use drift_core::{Clock, Envelope, UiEvent};
use drift_engine::{Engine, EngineError, UnlockGate};
use drift_fs::FsAdapter;
use drift_storage::Database;
use drift_vault::{Vault, VaultError, VaultPaths};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from core assembly and lifecycle operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("storage error: {0}")]
    Storage(#[from] drift_storage::StorageError),
}

/// Unlock gate fed by vault transitions.
struct VaultGate(AtomicBool);

impl UnlockGate for VaultGate {
    fn is_unlocked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The assembled application core.
pub struct Core<F: FsAdapter, C: Clock> {
    vault: Vault<C>,
    engine: Engine<F, FrontendBus<C>, C>,
    bus: FrontendBus<C>,
    gate: Arc<VaultGate>,
}

impl<F: FsAdapter, C: Clock> Core<F, C> {
    /// Assemble the core and run startup recovery.
    ///
    /// Returns the core plus the frontend event receiver.
    pub async fn build(
        config: &Config,
        fs: F,
        clock: C,
    ) -> Result<(Self, mpsc::Receiver<Envelope>), CoreError> {
        let paths = VaultPaths::new(&config.config_dir);
        let db = Database::closed(paths.db());
        let vault = Vault::load(paths, db.clone(), clock.clone())?;

        // Crash recovery before anything touches the sensitive files
        vault.recover_files().await?;

        let unlocked = vault.is_unlocked().await;
        let gate = Arc::new(VaultGate(AtomicBool::new(unlocked)));

        let capacity = config
            .settings
            .bus_capacity
            .unwrap_or(DEFAULT_BUS_CAPACITY);
        let (bus, rx) = FrontendBus::new(capacity, clock.clone());

        let engine = Engine::builder(fs, bus.clone(), clock, db.clone())
            .gate(Arc::clone(&gate) as Arc<dyn UnlockGate>)
            .build();

        let core = Self {
            vault,
            engine,
            bus,
            gate,
        };

        if unlocked {
            // Plaintext mode (or disabled vault): open immediately
            db.reopen()?;
            core.engine.startup().await?;
        } else {
            // Database opens at unlock
            core.bus.publish(UiEvent::AuthLocked);
        }

        Ok((core, rx))
    }

    pub fn engine(&self) -> &Engine<F, FrontendBus<C>, C> {
        &self.engine
    }

    pub fn vault(&self) -> &Vault<C> {
        &self.vault
    }

    pub fn bus(&self) -> &FrontendBus<C> {
        &self.bus
    }

    /// Enable vault protection.
    pub async fn setup_vault(&self, password: &str) -> Result<(), CoreError> {
        self.vault.setup(password).await?;
        self.gate.0.store(true, Ordering::SeqCst);
        self.bus.publish(UiEvent::AuthUnlocked);
        Ok(())
    }

    /// Unlock: decrypt state, open the database, start orphan sweep.
    pub async fn unlock(&self, password: &str) -> Result<(), CoreError> {
        self.vault.unlock(password).await?;
        self.gate.0.store(true, Ordering::SeqCst);
        self.bus.publish(UiEvent::AuthUnlocked);
        self.engine.startup().await?;
        Ok(())
    }

    /// Lock: stop work, close the database, encrypt at rest.
    pub async fn lock(&self) -> Result<(), CoreError> {
        self.gate.0.store(false, Ordering::SeqCst);
        self.engine.shutdown().await;
        self.vault.lock().await?;
        self.bus.publish(UiEvent::AuthLocked);
        Ok(())
    }

    pub async fn change_password(&self, old: &str, new: &str) -> Result<(), CoreError> {
        match self.vault.change_password(old, new).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // A deep failure degrades the vault to locked
                if !self.vault.is_unlocked().await {
                    self.gate.0.store(false, Ordering::SeqCst);
                    self.bus.publish(UiEvent::AuthLocked);
                }
                Err(e.into())
            }
        }
    }

    /// Disable vault protection entirely.
    pub async fn remove_vault(&self, password: &str) -> Result<(), CoreError> {
        self.vault.remove(password).await?;
        self.gate.0.store(true, Ordering::SeqCst);
        self.bus.publish(UiEvent::AuthUnlocked);
        Ok(())
    }

    /// Graceful shutdown: stop watchers and tasks, then encrypt at rest
    /// when protection is enabled.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.engine.shutdown().await;
        if self.vault.is_enabled().await && self.vault.is_unlocked().await {
            self.gate.0.store(false, Ordering::SeqCst);
            self.vault.lock().await?;
            self.bus.publish(UiEvent::AuthLocked);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
