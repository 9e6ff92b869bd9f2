// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Multi-source GPS time resolution
//!
//! Most RTCM observation messages carry a time of day or a time of week but
//! never the week number, and the GPS-UTC leap second count needed for
//! GLONASS only appears in occasional system messages. This module collects
//! every scrap of timing information a stream offers into per-source
//! estimators and fuses them, on demand, into the current week number, time
//! of week and leap second count together with a confidence level each.
//!
//! A [`TimeTruth`] owns one estimator slot per (kind, source). Sessions
//! request estimator handles, push into them from their own thread, and any
//! thread may call [`TimeTruth::get_latest_time`]; state crosses threads
//! only as snapshots through the flag-guarded cells of [`estimator`].

mod ephemeris;
mod estimator;
mod leap;
mod observation;

pub use ephemeris::{EphemerisState, EphemerisTimeEstimator, MIN_SIGNALS_TO_QUALIFY};
pub use estimator::{Estimator, SharedState};
pub use leap::{LeapSecondState, Rtcm1013TimeEstimator, UbxLeapTimeEstimator};
pub use observation::{
    tow_ms_within_tolerance, ObservationState, ObservationTimeEstimator, MISMATCH_LIMIT,
    TOW_TOLERANCE_MS,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::time::{consts, GpsTime};

/// Where timing information is being obtained from
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, strum::Display, strum::EnumIter,
)]
pub enum Source {
    /// A local source, like a GNSS antenna
    Local,
    /// An external source, like an NTRIP broadcaster
    Remote,
}

/// Number of sources
pub const SOURCE_COUNT: usize = 2;

impl Source {
    fn index(self) -> usize {
        self as usize
    }
}

/// Level of confidence in a fused estimate
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, strum::Display)]
pub enum Confidence {
    /// No estimate, there was no timing information to go on
    None,
    /// Sources disagree and the disagreement cannot be resolved
    Bad,
    /// Estimators of one source confirm each other but another source
    /// disagrees
    Good,
    /// A single source, or several sources that all agree
    Best,
}

/// Agreement window for fused times of week, in milliseconds
pub const TOW_AGREEMENT_TOLERANCE_MS: u32 = 250;
/// Agreement window for fused leap second values, in seconds
pub const LEAP_AGREEMENT_TOLERANCE: i8 = 1;

/// The fused time estimate
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeEstimate {
    /// Current GPS week number
    pub wn: Option<u16>,
    /// Confidence in the week number
    pub wn_confidence: Confidence,
    /// Current time of week in milliseconds
    pub tow_ms: Option<u32>,
    /// Confidence in the time of week
    pub tow_confidence: Confidence,
    /// Current GPS-UTC leap second count
    pub leap_seconds: Option<i8>,
    /// Confidence in the leap second count
    pub leap_confidence: Confidence,
}

impl Default for TimeEstimate {
    fn default() -> Self {
        TimeEstimate {
            wn: None,
            wn_confidence: Confidence::None,
            tow_ms: None,
            tow_confidence: Confidence::None,
            leap_seconds: None,
            leap_confidence: Confidence::None,
        }
    }
}

impl TimeEstimate {
    /// Combines the week number and time of week into a [`GpsTime`] when
    /// both are known
    #[must_use]
    pub fn gps_time(&self) -> Option<GpsTime> {
        match (self.wn, self.tow_ms) {
            (Some(wn), Some(tow_ms)) => GpsTime::new(
                wn as i16,
                f64::from(tow_ms) / f64::from(consts::SECS_MS),
            )
            .ok(),
            _ => None,
        }
    }
}

#[derive(Default)]
struct CachedState<T: Copy + Default> {
    available: bool,
    state: T,
}

/// Caches the last successfully loaded estimator snapshots
///
/// [`TimeTruth::get_latest_time`] takes an optional cache so that repeated
/// queries within one frame-processing call neither hammer the atomic cells
/// nor lose an estimate to a concurrent writer holding a flag.
#[derive(Default)]
pub struct TimeTruthCache {
    observation: [CachedState<ObservationState>; SOURCE_COUNT],
    ephemeris: [CachedState<EphemerisState>; SOURCE_COUNT],
    rtcm_1013: [CachedState<LeapSecondState>; SOURCE_COUNT],
    ubx_leap: [CachedState<LeapSecondState>; SOURCE_COUNT],
}

impl TimeTruthCache {
    /// Makes an empty cache
    #[must_use]
    pub fn new() -> TimeTruthCache {
        TimeTruthCache::default()
    }

    /// Drops all cached snapshots
    pub fn reset(&mut self) {
        *self = TimeTruthCache::default();
    }
}

struct EstimatorPool<T: Copy + Default> {
    cells: [Arc<SharedState<T>>; SOURCE_COUNT],
    used: [AtomicBool; SOURCE_COUNT],
}

impl<T: Copy + Default> Default for EstimatorPool<T> {
    fn default() -> Self {
        EstimatorPool {
            cells: [Arc::new(SharedState::new()), Arc::new(SharedState::new())],
            used: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }
}

impl<T: Copy + Default> EstimatorPool<T> {
    fn allocate(&self, source: Source) -> Option<Arc<SharedState<T>>> {
        if self.used[source.index()].swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Arc::clone(&self.cells[source.index()]))
    }

    fn load(
        &self,
        source: Source,
        cached: &mut CachedState<T>,
    ) -> Option<T> {
        let mut fresh = cached.state;
        if self.cells[source.index()].load_state(&mut fresh) {
            cached.available = true;
            cached.state = fresh;
            Some(fresh)
        } else if cached.available {
            Some(cached.state)
        } else {
            None
        }
    }

    fn reset(&self) {
        for cell in &self.cells {
            /* retried once, a reader holding the flag right now is gone by
             * the second attempt in practice; a missed reset only leaves the
             * previous estimate visible which the caller asked to discard */
            if !cell.save_state(&T::default()) {
                let _ = cell.save_state(&T::default());
            }
        }
    }
}

/// Central hub where all system timing information is published and queried
///
/// Holds one estimator slot per estimator kind and [`Source`]. A slot can be
/// allocated once; the returned handle is the single writer for that slot.
#[derive(Default)]
pub struct TimeTruth {
    observation: EstimatorPool<ObservationState>,
    ephemeris: EstimatorPool<EphemerisState>,
    rtcm_1013: EstimatorPool<LeapSecondState>,
    ubx_leap: EstimatorPool<LeapSecondState>,
}

impl TimeTruth {
    /// Makes a time truth with all slots free
    #[must_use]
    pub fn new() -> TimeTruth {
        TimeTruth::default()
    }

    /// Requests the observation time estimator of a source
    ///
    /// Returns `None` when the slot was already handed out.
    pub fn request_observation_estimator(
        &self,
        source: Source,
    ) -> Option<ObservationTimeEstimator> {
        self.observation
            .allocate(source)
            .map(ObservationTimeEstimator::new)
    }

    /// Requests the ephemeris time estimator of a source
    pub fn request_ephemeris_estimator(&self, source: Source) -> Option<EphemerisTimeEstimator> {
        self.ephemeris
            .allocate(source)
            .map(EphemerisTimeEstimator::new)
    }

    /// Requests the RTCM 1013 time estimator of a source
    pub fn request_rtcm_1013_estimator(&self, source: Source) -> Option<Rtcm1013TimeEstimator> {
        self.rtcm_1013
            .allocate(source)
            .map(Rtcm1013TimeEstimator::new)
    }

    /// Requests the UBX leap second estimator of a source
    pub fn request_ubx_leap_estimator(&self, source: Source) -> Option<UbxLeapTimeEstimator> {
        self.ubx_leap.allocate(source).map(UbxLeapTimeEstimator::new)
    }

    /// Resets every estimator slot to its default state
    ///
    /// Handles stay allocated; sessions holding one are expected to reset it
    /// too so their writer-side state matches.
    pub fn reset(&self) {
        self.observation.reset();
        self.ephemeris.reset();
        self.rtcm_1013.reset();
        self.ubx_leap.reset();
    }

    /// Gives the caller the best estimate given all published timing
    /// information
    ///
    /// `cache` amortizes snapshot loads across repeated queries within one
    /// frame-processing call and rides over momentarily unavailable cells.
    pub fn get_latest_time(&self, cache: Option<&mut TimeTruthCache>) -> TimeEstimate {
        let mut local_cache = TimeTruthCache::default();
        let cache = match cache {
            Some(cache) => cache,
            None => &mut local_cache,
        };

        let mut estimate = TimeEstimate::default();

        /* time of week from the observation estimators */
        let tow_candidates = Source::iter_array().map(|source| {
            self.observation
                .load(source, &mut cache.observation[source.index()])
                .and_then(|state| ObservationTimeEstimator::get_estimate(&state))
        });
        let (tow_ms, tow_confidence) = fuse_pair(tow_candidates, |a, b| {
            tow_ms_within_tolerance(*a, *b, TOW_AGREEMENT_TOLERANCE_MS)
        });
        estimate.tow_ms = tow_ms;
        estimate.tow_confidence = tow_confidence;

        let Some(tow_ms) = estimate.tow_ms else {
            return estimate;
        };

        /* week number from the ephemeris estimators, hinted by the tow */
        let wn_candidates = Source::iter_array().map(|source| {
            self.ephemeris
                .load(source, &mut cache.ephemeris[source.index()])
                .and_then(|state| EphemerisTimeEstimator::get_estimate(&state, tow_ms))
                .map(|time| time.wn() as u16)
        });
        let (wn, wn_confidence) = fuse_pair(wn_candidates, |a, b| a == b);
        estimate.wn = wn;
        estimate.wn_confidence = wn_confidence;

        /* leap seconds from the 1013 and UBX estimators */
        let leap_candidates = Source::iter_array().map(|source| {
            let rtcm = self
                .rtcm_1013
                .load(source, &mut cache.rtcm_1013[source.index()])
                .and_then(|state| Rtcm1013TimeEstimator::get_estimate(&state, tow_ms))
                .map(|(_, leap)| leap);
            let ubx = self
                .ubx_leap
                .load(source, &mut cache.ubx_leap[source.index()])
                .and_then(|state| UbxLeapTimeEstimator::get_estimate(&state, tow_ms))
                .map(|(_, leap)| leap);
            SourceLeap { rtcm, ubx }
        });
        let (leap, leap_confidence) = fuse_leap(leap_candidates);
        estimate.leap_seconds = leap;
        estimate.leap_confidence = leap_confidence;

        estimate
    }
}

impl Source {
    fn iter_array() -> [Source; SOURCE_COUNT] {
        [Source::Local, Source::Remote]
    }
}

/// Fuses one candidate per source
fn fuse_pair<T: Copy>(
    candidates: [Option<T>; SOURCE_COUNT],
    agree: impl Fn(&T, &T) -> bool,
) -> (Option<T>, Confidence) {
    match (candidates[0], candidates[1]) {
        (None, None) => (None, Confidence::None),
        (Some(value), None) | (None, Some(value)) => (Some(value), Confidence::Best),
        (Some(local), Some(remote)) => {
            if agree(&local, &remote) {
                (Some(local), Confidence::Best)
            } else {
                (Some(local), Confidence::Bad)
            }
        }
    }
}

#[derive(Copy, Clone)]
struct SourceLeap {
    rtcm: Option<i8>,
    ubx: Option<i8>,
}

impl SourceLeap {
    /// The source's own value plus whether two of its estimators confirm it
    fn resolve(self) -> Option<(i8, bool)> {
        match (self.rtcm, self.ubx) {
            (None, None) => None,
            (Some(value), None) | (None, Some(value)) => Some((value, false)),
            (Some(rtcm), Some(ubx)) => {
                let confirmed = (rtcm - ubx).abs() <= LEAP_AGREEMENT_TOLERANCE;
                Some((rtcm, confirmed))
            }
        }
    }
}

/// Fuses the leap second candidates of both sources
fn fuse_leap(candidates: [SourceLeap; SOURCE_COUNT]) -> (Option<i8>, Confidence) {
    let local = candidates[0].resolve();
    let remote = candidates[1].resolve();

    match (local, remote) {
        (None, None) => (None, Confidence::None),
        (Some((value, _)), None) | (None, Some((value, _))) => (Some(value), Confidence::Best),
        (Some((local_value, local_confirmed)), Some((remote_value, remote_confirmed))) => {
            if (local_value - remote_value).abs() <= LEAP_AGREEMENT_TOLERANCE {
                (Some(local_value), Confidence::Best)
            } else if local_confirmed {
                (Some(local_value), Confidence::Good)
            } else if remote_confirmed {
                (Some(remote_value), Confidence::Good)
            } else {
                (Some(local_value), Confidence::Bad)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Code, GnssSignal};

    fn push_fleet(estimator: &mut EphemerisTimeEstimator, wn: i16, tow: f64) {
        for sat in 1..=10u16 {
            estimator.push(
                GnssSignal::new(sat, Code::GpsL1ca).unwrap(),
                GpsTime::new(wn, tow).unwrap(),
            );
        }
    }

    #[test]
    fn slots_allocate_once() {
        let truth = TimeTruth::new();
        assert!(truth.request_observation_estimator(Source::Local).is_some());
        assert!(truth.request_observation_estimator(Source::Local).is_none());
        assert!(truth.request_observation_estimator(Source::Remote).is_some());
        assert!(truth.request_ephemeris_estimator(Source::Local).is_some());
        assert!(truth.request_ephemeris_estimator(Source::Local).is_none());
    }

    #[test]
    fn empty_truth_has_no_estimate() {
        let truth = TimeTruth::new();
        let estimate = truth.get_latest_time(None);
        assert_eq!(estimate.tow_confidence, Confidence::None);
        assert_eq!(estimate.wn_confidence, Confidence::None);
        assert_eq!(estimate.leap_confidence, Confidence::None);
    }

    #[test]
    fn single_source_is_best() {
        let truth = TimeTruth::new();
        let mut obs = truth.request_observation_estimator(Source::Local).unwrap();
        let mut eph = truth.request_ephemeris_estimator(Source::Local).unwrap();
        let mut rtcm = truth.request_rtcm_1013_estimator(Source::Local).unwrap();

        obs.push(341_562_000);
        push_fleet(&mut eph, 2190, 341_000.0);
        rtcm.push(GpsTime::new(2190, 341_562.0).unwrap(), 18);

        let estimate = truth.get_latest_time(None);
        assert_eq!(estimate.tow_ms, Some(341_562_000));
        assert_eq!(estimate.tow_confidence, Confidence::Best);
        assert_eq!(estimate.wn, Some(2190));
        assert_eq!(estimate.wn_confidence, Confidence::Best);
        assert_eq!(estimate.leap_seconds, Some(18));
        assert_eq!(estimate.leap_confidence, Confidence::Best);
        assert_eq!(
            estimate.gps_time().unwrap(),
            GpsTime::new(2190, 341_562.0).unwrap()
        );
    }

    #[test]
    fn agreeing_sources_are_best() {
        let truth = TimeTruth::new();
        let mut local = truth.request_observation_estimator(Source::Local).unwrap();
        let mut remote = truth.request_observation_estimator(Source::Remote).unwrap();
        local.push(341_562_000);
        remote.push(341_562_100);

        let estimate = truth.get_latest_time(None);
        assert_eq!(estimate.tow_ms, Some(341_562_000));
        assert_eq!(estimate.tow_confidence, Confidence::Best);
    }

    #[test]
    fn disagreeing_sources_are_bad() {
        let truth = TimeTruth::new();
        let mut local = truth.request_observation_estimator(Source::Local).unwrap();
        let mut remote = truth.request_observation_estimator(Source::Remote).unwrap();
        local.push(341_562_000);
        remote.push(100_000_000);

        let estimate = truth.get_latest_time(None);
        /* the local value wins the tie */
        assert_eq!(estimate.tow_ms, Some(341_562_000));
        assert_eq!(estimate.tow_confidence, Confidence::Bad);
    }

    #[test]
    fn confirmed_source_beats_lone_dissenter() {
        let truth = TimeTruth::new();
        let mut obs = truth.request_observation_estimator(Source::Local).unwrap();
        obs.push(341_562_000);

        let mut local_rtcm = truth.request_rtcm_1013_estimator(Source::Local).unwrap();
        let mut local_ubx = truth.request_ubx_leap_estimator(Source::Local).unwrap();
        let mut remote_rtcm = truth.request_rtcm_1013_estimator(Source::Remote).unwrap();

        let time = GpsTime::new(2190, 341_562.0).unwrap();
        local_rtcm.push(time, 18);
        local_ubx.push(time, 18);
        remote_rtcm.push(time, 15);

        let estimate = truth.get_latest_time(None);
        assert_eq!(estimate.leap_seconds, Some(18));
        assert_eq!(estimate.leap_confidence, Confidence::Good);
    }

    #[test]
    fn leap_estimate_requires_tow() {
        let truth = TimeTruth::new();
        let mut rtcm = truth.request_rtcm_1013_estimator(Source::Local).unwrap();
        rtcm.push(GpsTime::new(2190, 341_562.0).unwrap(), 18);

        /* without a time of week the 1013 record cannot be validated */
        let estimate = truth.get_latest_time(None);
        assert_eq!(estimate.leap_seconds, None);
        assert_eq!(estimate.leap_confidence, Confidence::None);
    }

    #[test]
    fn cache_rides_over_reset_estimators() {
        let truth = TimeTruth::new();
        let mut obs = truth.request_observation_estimator(Source::Local).unwrap();
        obs.push(341_562_000);

        let mut cache = TimeTruthCache::new();
        let estimate = truth.get_latest_time(Some(&mut cache));
        assert_eq!(estimate.tow_ms, Some(341_562_000));

        /* the cache still answers from its snapshot */
        let estimate = truth.get_latest_time(Some(&mut cache));
        assert_eq!(estimate.tow_ms, Some(341_562_000));
    }

    #[test]
    fn reset_clears_estimates() {
        let truth = TimeTruth::new();
        let mut obs = truth.request_observation_estimator(Source::Local).unwrap();
        obs.push(341_562_000);
        truth.reset();
        let estimate = truth.get_latest_time(None);
        assert_eq!(estimate.tow_ms, None);
    }
}
