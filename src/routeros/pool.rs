// SPDX-License-Identifier: MIT

//! Connection pool keyed by device id
//!
//! Holds at most one live RouterOS session per device. A per-device mutex
//! slot serializes acquire/release for the same id (so two concurrent
//! connect requests cannot both handshake), while different devices
//! proceed fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::session::{ConnectParams, RouterOsSession, Sentence, SessionError};

#[derive(Debug, Default)]
struct Slot {
    session: Option<RouterOsSession>,
}

/// Pool of per-device RouterOS sessions
#[derive(Default)]
pub struct ConnectionPool {
    slots: Mutex<HashMap<String, Arc<Mutex<Slot>>>>,
}

/// Exclusive handle on a device's pooled session
///
/// Holds the device's slot lock for its whole lifetime, so no other
/// acquire or release for the same id can run until it is dropped.
#[derive(Debug)]
pub struct PooledSession {
    guard: OwnedMutexGuard<Slot>,
}

impl PooledSession {
    /// Runs one command on the pooled session
    pub async fn command(
        &mut self,
        path: &str,
        args: &[&str],
    ) -> Result<Vec<Sentence>, SessionError> {
        // acquire only hands out guards over a filled slot, and the slot
        // cannot be emptied while the guard is held
        let Some(session) = self.guard.session.as_mut() else {
            unreachable!("pooled session without a live slot");
        };
        session.command(path, args).await
    }
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the live session for a device, re-establishing or creating one
    /// as needed
    ///
    /// An existing live session is returned unchanged. A pooled but dead
    /// session is re-established with the same params; if that fails the
    /// entry is removed and the error surfaces. With no entry at all, a
    /// fresh session is established and stored only on success.
    pub async fn acquire(
        &self,
        device_id: &str,
        params: &ConnectParams,
    ) -> Result<PooledSession, SessionError> {
        let mut guard = self.lock_slot(device_id).await;

        if guard.session.as_ref().is_some_and(|s| s.is_alive()) {
            tracing::debug!("Reusing pooled session for device {}", device_id);
            return Ok(PooledSession { guard });
        }
        if guard.session.take().is_some() {
            tracing::debug!(
                "Pooled session for device {} is stale, re-establishing",
                device_id
            );
        }

        tracing::debug!("Opening session to {} for device {}", params.addr, device_id);
        match RouterOsSession::open(params).await {
            Ok(session) => {
                guard.session = Some(session);
                Ok(PooledSession { guard })
            }
            Err(e) => {
                drop(guard);
                self.remove_entry(device_id).await;
                Err(e)
            }
        }
    }

    /// Removes and closes any pooled session for the device
    ///
    /// Idempotent. Waits for an in-flight holder of the session before
    /// tearing it down, so a racing acquire never ends up with a second
    /// live session to the same device.
    pub async fn release(&self, device_id: &str) {
        let slot = { self.slots.lock().await.get(device_id).cloned() };
        let Some(slot) = slot else {
            return;
        };

        let mut guard = slot.lock().await;
        if guard.session.take().is_some() {
            tracing::debug!("Closed pooled session for device {}", device_id);
        }
        // Unmap while still holding the slot lock; acquires that raced us
        // re-check slot identity and retry against the fresh map state.
        let mut slots = self.slots.lock().await;
        if let Some(current) = slots.get(device_id) {
            if Arc::ptr_eq(current, &slot) {
                slots.remove(device_id);
            }
        }
    }

    /// Whether the pool currently holds a session for the device
    pub async fn has_session(&self, device_id: &str) -> bool {
        let slot = { self.slots.lock().await.get(device_id).cloned() };
        match slot {
            Some(slot) => slot.lock().await.session.is_some(),
            None => false,
        }
    }

    /// Drops the map entry for a device if its slot holds no session
    ///
    /// Used after a failed establish so the map does not accumulate empty
    /// slots. A racing acquire that already stored a session is left alone.
    async fn remove_entry(&self, device_id: &str) {
        let slot = { self.slots.lock().await.get(device_id).cloned() };
        let Some(slot) = slot else {
            return;
        };

        let guard = slot.lock().await;
        if guard.session.is_none() {
            let mut slots = self.slots.lock().await;
            if let Some(current) = slots.get(device_id) {
                if Arc::ptr_eq(current, &slot) {
                    slots.remove(device_id);
                }
            }
        }
    }

    /// Locks the device's slot, creating it on first use
    ///
    /// Lock order is always slot-then-map; the map lock is never held
    /// across a slot lock await, so the two cannot deadlock.
    async fn lock_slot(&self, device_id: &str) -> OwnedMutexGuard<Slot> {
        loop {
            let slot = {
                let mut slots = self.slots.lock().await;
                slots
                    .entry(device_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Slot::default())))
                    .clone()
            };
            let guard = slot.clone().lock_owned().await;

            // release() may have unmapped this slot while we waited
            let still_mapped = {
                let slots = self.slots.lock().await;
                slots
                    .get(device_id)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot))
            };
            if still_mapped {
                return guard;
            }
        }
    }
}
