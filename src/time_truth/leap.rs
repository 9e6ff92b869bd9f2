// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Leap second estimation from RTCM 1013 and UBX-NAV-TIMELS records
//!
//! Both message kinds pair an absolute GPS time with the GPS-UTC leap second
//! count in effect at that time. The estimate is only served while the
//! caller's time of week hint agrees with the stored time stamp, a stale
//! leap second is worse than none.

use std::sync::Arc;

use super::estimator::{Estimator, SharedState};
use super::observation::tow_ms_within_tolerance;
use crate::time::{consts, GpsTime};

/// How far the hint may sit from the stored time stamp before the estimate
/// is withheld, in milliseconds
pub const TIME_MATCH_TOLERANCE_MS: u32 = 5 * consts::SECS_MS;

/// Published state of the leap second estimators
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct LeapSecondState {
    /// Whether a record has been seen
    pub has_data: bool,
    /// Week number of the record
    pub wn: i16,
    /// Time of week of the record in seconds
    pub tow: f64,
    /// GPS-UTC leap seconds of the record
    pub leap_seconds: i8,
}

fn push_record(state: &mut LeapSecondState, time: GpsTime, leap_seconds: i8) {
    if !time.is_valid() {
        return;
    }
    *state = LeapSecondState {
        has_data: true,
        wn: time.wn(),
        tow: time.tow(),
        leap_seconds,
    };
}

fn estimate_from(state: &LeapSecondState, tow_ms_hint: u32) -> Option<(GpsTime, i8)> {
    if !state.has_data {
        return None;
    }
    let time = GpsTime::new(state.wn, state.tow).ok()?;
    if !tow_ms_within_tolerance(tow_ms_hint, time.tow_ms(), TIME_MATCH_TOLERANCE_MS) {
        return None;
    }
    Some((time, state.leap_seconds))
}

/// RTCM 1013 (system parameters) time estimator
pub struct Rtcm1013TimeEstimator {
    state: LeapSecondState,
    shared: Arc<SharedState<LeapSecondState>>,
}

impl Rtcm1013TimeEstimator {
    pub(super) fn new(shared: Arc<SharedState<LeapSecondState>>) -> Rtcm1013TimeEstimator {
        Rtcm1013TimeEstimator {
            state: LeapSecondState::default(),
            shared,
        }
    }

    /// Records the time and leap second count of a 1013 message
    pub fn push(&mut self, time: GpsTime, leap_seconds: i8) {
        push_record(&mut self.state, time, leap_seconds);
        let _ = self.shared.save_state(&self.state);
    }

    /// Extracts the estimate from a snapshot, validated against the hint
    #[must_use]
    pub fn get_estimate(state: &LeapSecondState, tow_ms_hint: u32) -> Option<(GpsTime, i8)> {
        estimate_from(state, tow_ms_hint)
    }
}

impl Estimator for Rtcm1013TimeEstimator {
    type State = LeapSecondState;

    fn reset(&mut self) {
        self.state = LeapSecondState::default();
        let _ = self.shared.save_state(&self.state);
    }
}

/// UBX-NAV-TIMELS time estimator
pub struct UbxLeapTimeEstimator {
    state: LeapSecondState,
    shared: Arc<SharedState<LeapSecondState>>,
}

impl UbxLeapTimeEstimator {
    pub(super) fn new(shared: Arc<SharedState<LeapSecondState>>) -> UbxLeapTimeEstimator {
        UbxLeapTimeEstimator {
            state: LeapSecondState::default(),
            shared,
        }
    }

    /// Records the time and leap second count of a UBX-NAV-TIMELS message
    pub fn push(&mut self, time: GpsTime, leap_seconds: i8) {
        push_record(&mut self.state, time, leap_seconds);
        let _ = self.shared.save_state(&self.state);
    }

    /// Extracts the estimate from a snapshot, validated against the hint
    #[must_use]
    pub fn get_estimate(state: &LeapSecondState, tow_ms_hint: u32) -> Option<(GpsTime, i8)> {
        estimate_from(state, tow_ms_hint)
    }
}

impl Estimator for UbxLeapTimeEstimator {
    type State = LeapSecondState;

    fn reset(&mut self) {
        self.state = LeapSecondState::default();
        let _ = self.shared.save_state(&self.state);
    }
}
