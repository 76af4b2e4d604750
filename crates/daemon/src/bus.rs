// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontend event bus
//!
//! One-way, bounded, non-blocking: every envelope carries a timestamp
//! and a process-monotonic sequence number, so the frontend can detect
//! gaps when the channel overflows and messages are dropped.

use drift_core::{Clock, Envelope, UiEvent};
use drift_engine::EventSink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default frontend channel capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Sender half of the frontend channel.
pub struct FrontendBus<C: Clock> {
    tx: mpsc::Sender<Envelope>,
    seq: Arc<AtomicU64>,
    clock: C,
}

// Manual impl: `C` is Clone but derive would also bound the channel type
impl<C: Clock> Clone for FrontendBus<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            seq: Arc::clone(&self.seq),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock> FrontendBus<C> {
    /// Create the bus and the receiver the frontend transport drains.
    pub fn new(capacity: usize, clock: C) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                seq: Arc::new(AtomicU64::new(1)),
                clock,
            },
            rx,
        )
    }

    /// Publish without blocking. Returns the envelope's sequence number,
    /// or `None` when the channel was full and the message was dropped.
    pub fn publish(&self, event: UiEvent) -> Option<u64> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let envelope = Envelope {
            seq,
            at_ms: self.clock.epoch_ms(),
            event,
        };

        match self.tx.try_send(envelope) {
            Ok(()) => Some(seq),
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                tracing::warn!(seq, tag = envelope.event.tag(), "frontend bus full, dropping event");
                None
            }
            Err(mpsc::error::TrySendError::Closed(_)) => None,
        }
    }
}

impl<C: Clock> EventSink for FrontendBus<C> {
    fn emit(&self, event: UiEvent) {
        self.publish(event);
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
