// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Time of week estimation from observation epochs

use std::sync::Arc;

use super::estimator::{Estimator, SharedState};
use crate::time::consts;

/// Accepted step from the current estimate before a push counts as a
/// mismatch, in milliseconds
pub const TOW_TOLERANCE_MS: u32 = 30 * consts::SECS_MS;
/// Consecutive mismatching pushes needed before the estimator jumps to the
/// new value
pub const MISMATCH_LIMIT: usize = 10;

/// Checks if a time of week lies within a wrap-aware tolerance window of a
/// base value, both ends inclusive
#[must_use]
pub fn tow_ms_within_tolerance(tow_ms: u32, base_ms: u32, tolerance_ms: u32) -> bool {
    let week = i64::from(consts::WEEK_MS);
    let half_week = week / 2;
    let diff =
        (i64::from(tow_ms) - i64::from(base_ms) + half_week).rem_euclid(week) - half_week;
    diff.abs() <= i64::from(tolerance_ms)
}

/// Published state of the observation time estimator
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ObservationState {
    /// Whether any time of week has been seen
    pub has_data: bool,
    /// Latest accepted time of week, milliseconds
    pub latest_tow_ms: u32,
    /// Consecutive pushes that disagreed with the estimate
    pub mismatch_count: usize,
}

/// GNSS observation time estimator
///
/// Tracks the most likely time of week for one source stream. Small steps
/// follow the stream directly; a jump (a station change, or a receiver
/// reset) has to persist for [`MISMATCH_LIMIT`] consecutive epochs before it
/// is believed.
pub struct ObservationTimeEstimator {
    state: ObservationState,
    shared: Arc<SharedState<ObservationState>>,
}

impl ObservationTimeEstimator {
    pub(super) fn new(shared: Arc<SharedState<ObservationState>>) -> ObservationTimeEstimator {
        ObservationTimeEstimator {
            state: ObservationState::default(),
            shared,
        }
    }

    /// Feeds the estimator the time of week of the current epoch
    pub fn push(&mut self, tow_ms: u32) {
        if tow_ms >= consts::WEEK_MS {
            return;
        }
        if !self.state.has_data {
            self.state = ObservationState {
                has_data: true,
                latest_tow_ms: tow_ms,
                mismatch_count: 0,
            };
        } else if tow_ms_within_tolerance(tow_ms, self.state.latest_tow_ms, TOW_TOLERANCE_MS) {
            self.state.latest_tow_ms = tow_ms;
            self.state.mismatch_count = 0;
        } else {
            self.state.mismatch_count += 1;
            if self.state.mismatch_count >= MISMATCH_LIMIT {
                self.state.latest_tow_ms = tow_ms;
                self.state.mismatch_count = 0;
            }
        }
        /* a dropped publish is caught up by the next push */
        let _ = self.shared.save_state(&self.state);
    }

    /// Extracts the estimate from a snapshot
    #[must_use]
    pub fn get_estimate(state: &ObservationState) -> Option<u32> {
        state.has_data.then_some(state.latest_tow_ms)
    }
}

impl Estimator for ObservationTimeEstimator {
    type State = ObservationState;

    fn reset(&mut self) {
        self.state = ObservationState::default();
        let _ = self.shared.save_state(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> (ObservationTimeEstimator, Arc<SharedState<ObservationState>>) {
        let shared = Arc::new(SharedState::new());
        (ObservationTimeEstimator::new(Arc::clone(&shared)), shared)
    }

    fn snapshot(shared: &SharedState<ObservationState>) -> ObservationState {
        let mut state = ObservationState::default();
        assert!(shared.load_state(&mut state));
        state
    }

    #[test]
    fn tolerance_window_wraps_week() {
        let tol = 5 * consts::SECS_MS;
        /* base 0s: [604795s, 5s] */
        assert!(tow_ms_within_tolerance(604_795_000, 0, tol));
        assert!(!tow_ms_within_tolerance(604_794_999, 0, tol));
        assert!(tow_ms_within_tolerance(5_000, 0, tol));
        assert!(!tow_ms_within_tolerance(5_001, 0, tol));
        /* base 604795s: [604790s, 0s] */
        assert!(tow_ms_within_tolerance(0, 604_795_000, tol));
        assert!(!tow_ms_within_tolerance(1, 604_795_000, tol));
        assert!(tow_ms_within_tolerance(604_790_000, 604_795_000, tol));
    }

    #[test]
    fn follows_small_steps() {
        let (mut estimator, shared) = estimator();
        estimator.push(1_000);
        estimator.push(2_000);
        estimator.push(3_000);
        let state = snapshot(&shared);
        assert_eq!(ObservationTimeEstimator::get_estimate(&state), Some(3_000));
        assert_eq!(state.mismatch_count, 0);
    }

    #[test]
    fn jump_needs_confirmation() {
        let (mut estimator, shared) = estimator();
        estimator.push(1_000);
        for _ in 0..MISMATCH_LIMIT - 1 {
            estimator.push(500_000_000);
            assert_eq!(
                ObservationTimeEstimator::get_estimate(&snapshot(&shared)),
                Some(1_000)
            );
        }
        /* the tenth consecutive mismatch flips the estimate */
        estimator.push(500_000_000);
        assert_eq!(
            ObservationTimeEstimator::get_estimate(&snapshot(&shared)),
            Some(500_000_000)
        );
    }

    #[test]
    fn agreeing_push_clears_mismatch_count() {
        let (mut estimator, shared) = estimator();
        estimator.push(1_000);
        for _ in 0..MISMATCH_LIMIT - 1 {
            estimator.push(500_000_000);
        }
        estimator.push(2_000);
        for _ in 0..MISMATCH_LIMIT - 1 {
            estimator.push(500_000_000);
        }
        assert_eq!(
            ObservationTimeEstimator::get_estimate(&snapshot(&shared)),
            Some(2_000)
        );
    }

    #[test]
    fn invalid_tow_ignored() {
        let (mut estimator, shared) = estimator();
        estimator.push(consts::WEEK_MS);
        assert_eq!(
            ObservationTimeEstimator::get_estimate(&snapshot(&shared)),
            None
        );
    }

    #[test]
    fn reset_clears_estimate() {
        let (mut estimator, shared) = estimator();
        estimator.push(1_000);
        estimator.reset();
        assert_eq!(
            ObservationTimeEstimator::get_estimate(&snapshot(&shared)),
            None
        );
    }
}
