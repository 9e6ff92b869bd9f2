// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Lock-free state publication for the time estimators
//!
//! Each estimator has a single writer (the session thread that owns its
//! handle) and arbitrarily many readers. State crosses threads only as whole
//! snapshots through [`SharedState`], which is guarded by one atomic flag:
//! whoever fails to take the flag gives up immediately instead of spinning.
//! A dropped write is fine because pushes are frequent; a failed read is
//! surfaced so the caller can fall back to its last good snapshot.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-slot snapshot mailbox guarded by an atomic flag
pub struct SharedState<T: Copy> {
    flag: AtomicBool,
    state: UnsafeCell<T>,
}

/* The flag grants exclusive access to the cell for the duration of a copy,
 * which is the only access either side performs. */
unsafe impl<T: Copy + Send> Sync for SharedState<T> {}

impl<T: Copy + Default> SharedState<T> {
    /// Makes a mailbox holding the default state
    #[must_use]
    pub fn new() -> SharedState<T> {
        SharedState {
            flag: AtomicBool::new(false),
            state: UnsafeCell::new(T::default()),
        }
    }
}

impl<T: Copy> SharedState<T> {
    fn try_lock(&self) -> bool {
        !self.flag.swap(true, Ordering::Acquire)
    }

    fn unlock(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Publishes a new snapshot
    ///
    /// Returns false when a reader currently holds the flag; the write is
    /// dropped, not retried.
    pub fn save_state(&self, state: &T) -> bool {
        if !self.try_lock() {
            return false;
        }
        unsafe {
            *self.state.get() = *state;
        }
        self.unlock();
        true
    }

    /// Copies out the latest published snapshot
    ///
    /// Returns false when a writer currently holds the flag; `out` is left
    /// untouched and the caller keeps its previous snapshot.
    pub fn load_state(&self, out: &mut T) -> bool {
        if !self.try_lock() {
            return false;
        }
        unsafe {
            *out = *self.state.get();
        }
        self.unlock();
        true
    }
}

impl<T: Copy + Default> Default for SharedState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Common behavior of the estimator handles
pub trait Estimator {
    /// The published snapshot type
    type State: Copy + Default;

    /// Resets the estimator to its default state and publishes that
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn store_then_load() {
        let cell: SharedState<u64> = SharedState::new();
        assert!(cell.save_state(&42));
        let mut out = 0u64;
        assert!(cell.load_state(&mut out));
        assert_eq!(out, 42);
    }

    #[test]
    fn default_state_visible_before_first_store() {
        let cell: SharedState<(bool, u32)> = SharedState::new();
        let mut out = (true, 99);
        assert!(cell.load_state(&mut out));
        assert_eq!(out, (false, 0));
    }

    #[test]
    fn concurrent_readers_never_tear() {
        /* the writer publishes pairs whose halves always match; a torn read
         * would surface as mismatched halves */
        let cell: Arc<SharedState<(u64, u64)>> = Arc::new(SharedState::new());
        let writer_cell = Arc::clone(&cell);
        let writer = std::thread::spawn(move || {
            for i in 0..10_000u64 {
                writer_cell.save_state(&(i, !i));
            }
        });
        let reader_cell = Arc::clone(&cell);
        let reader = std::thread::spawn(move || {
            let mut snapshot = (0u64, !0u64);
            for _ in 0..10_000 {
                if reader_cell.load_state(&mut snapshot) {
                    assert_eq!(snapshot.0, !snapshot.1);
                }
            }
        });
        writer.join().unwrap();
        reader.join().unwrap();
    }
}
