// src/gate.rs
//! Fail-fast rotation gate
//!
//! Ordinary operations pass through [`RotationGate::enter`], which never
//! waits: it fails with `RotationInProgress` while a rotation holds the gate.
//! [`RotationGate::begin`] raises the flag first, then takes the gate
//! exclusively, so operations already inside finish before the rotation
//! starts copying.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, StoreError};

#[derive(Default)]
pub struct RotationGate {
    rotating: AtomicBool,
    gate: RwLock<()>,
}

impl RotationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating.load(Ordering::Acquire)
    }

    /// Admit one operation, or refuse it while a rotation is running
    pub fn enter(&self) -> Result<RwLockReadGuard<'_, ()>> {
        if self.is_rotating() {
            return Err(StoreError::RotationInProgress);
        }
        self.gate.try_read().ok_or(StoreError::RotationInProgress)
    }

    /// Raise the flag and wait for admitted operations to drain.
    /// The flag drops with the guard, on every exit path.
    pub fn begin(&self) -> Result<RotationGuard<'_>> {
        if self
            .rotating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::RotationAlreadyInProgress);
        }
        let gate = self.gate.write();
        Ok(RotationGuard {
            flag: &self.rotating,
            _gate: gate,
        })
    }

    pub(crate) fn is_held_by(&self, guard: &RotationGuard<'_>) -> bool {
        std::ptr::eq(&self.rotating, guard.flag)
    }
}

/// Holds a gate's rotation flag; clears it when dropped
pub struct RotationGuard<'a> {
    flag: &'a AtomicBool,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl Drop for RotationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
