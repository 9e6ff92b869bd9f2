// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Week number estimation from ephemeris times of ephemeris

use std::sync::Arc;

use super::estimator::{Estimator, SharedState};
use crate::signal::{consts as sig_consts, Constellation, GnssSignal};
use crate::time::{consts, GpsTime};

/// Satellites needed before the estimator dares to vote on a week number
pub const MIN_SIGNALS_TO_QUALIFY: usize = 8;

const GPS_SLOTS: usize = sig_consts::NUM_SATS_GPS as usize;
const GAL_SLOTS: usize = sig_consts::NUM_SATS_GAL as usize;
const BDS_SLOTS: usize = sig_consts::NUM_SATS_BDS as usize;

/// One satellite slot: satellite id and its latest time of ephemeris as
/// milliseconds since the GPS epoch
type Entry = (u16, u64);

/// Published state of the ephemeris time estimator
///
/// Per constellation, a sorted bounded set of the latest time of ephemeris
/// of each satellite. Bounds follow the constellation satellite counts so
/// the state stays a flat copyable value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EphemerisState {
    gps_count: usize,
    gal_count: usize,
    bds_count: usize,
    gps_entries: [Entry; GPS_SLOTS],
    gal_entries: [Entry; GAL_SLOTS],
    bds_entries: [Entry; BDS_SLOTS],
}

impl Default for EphemerisState {
    fn default() -> Self {
        EphemerisState {
            gps_count: 0,
            gal_count: 0,
            bds_count: 0,
            gps_entries: [(0, 0); GPS_SLOTS],
            gal_entries: [(0, 0); GAL_SLOTS],
            bds_entries: [(0, 0); BDS_SLOTS],
        }
    }
}

impl EphemerisState {
    fn slots_mut(&mut self, cons: Constellation) -> Option<(&mut usize, &mut [Entry])> {
        match cons {
            Constellation::Gps => Some((&mut self.gps_count, &mut self.gps_entries)),
            Constellation::Gal => Some((&mut self.gal_count, &mut self.gal_entries)),
            Constellation::Bds => Some((&mut self.bds_count, &mut self.bds_entries)),
            _ => None,
        }
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.gps_entries[..self.gps_count]
            .iter()
            .chain(self.gal_entries[..self.gal_count].iter())
            .chain(self.bds_entries[..self.bds_count].iter())
    }

    fn total_count(&self) -> usize {
        self.gps_count + self.gal_count + self.bds_count
    }
}

/// GNSS ephemeris time estimator
///
/// Collects the absolute time of ephemeris of every satellite seen on one
/// source stream and, given a time of week hint, votes on the most likely
/// week number.
pub struct EphemerisTimeEstimator {
    state: EphemerisState,
    shared: Arc<SharedState<EphemerisState>>,
}

impl EphemerisTimeEstimator {
    pub(super) fn new(shared: Arc<SharedState<EphemerisState>>) -> EphemerisTimeEstimator {
        EphemerisTimeEstimator {
            state: EphemerisState::default(),
            shared,
        }
    }

    /// Records the time of ephemeris reported for a signal
    pub fn push(&mut self, signal: GnssSignal, time: GpsTime) {
        if !time.is_valid() {
            return;
        }
        let time_ms = u64::from(time.wn() as u16) * u64::from(consts::WEEK_MS)
            + u64::from(time.tow_ms());
        let sat = signal.sat();
        let Some((count, entries)) = self.state.slots_mut(signal.to_constellation()) else {
            return;
        };

        match entries[..*count].binary_search_by_key(&sat, |entry| entry.0) {
            Ok(found) => entries[found].1 = time_ms,
            Err(insert_at) => {
                if *count >= entries.len() {
                    return;
                }
                entries[insert_at..=*count].rotate_right(1);
                entries[insert_at] = (sat, time_ms);
                *count += 1;
            }
        }
        let _ = self.shared.save_state(&self.state);
    }

    /// Votes on the most likely week number for a time of week hint
    ///
    /// Each satellite nominates the week that brings its time of ephemeris
    /// closest to the hint; the median nomination wins. Satellites more than
    /// a week away from the winning time are stale and get no say, and the
    /// vote only counts with [`MIN_SIGNALS_TO_QUALIFY`] satellites present.
    #[must_use]
    pub fn get_estimate(state: &EphemerisState, tow_ms_hint: u32) -> Option<GpsTime> {
        if state.total_count() < MIN_SIGNALS_TO_QUALIFY {
            return None;
        }

        let week_ms = i64::from(consts::WEEK_MS);
        let mut nominations: Vec<i64> = state
            .entries()
            .map(|&(_, time_ms)| {
                /* the week that places (wn, hint) closest to this entry */
                (time_ms as i64 - i64::from(tow_ms_hint) + week_ms / 2).div_euclid(week_ms)
            })
            .filter(|&wn| wn >= 0)
            .collect();
        if nominations.len() < MIN_SIGNALS_TO_QUALIFY {
            return None;
        }
        nominations.sort_unstable();
        let winner = nominations[nominations.len() / 2];

        /* discard nominations from satellites voting a different week, a
         * satellite reusing a stale issue of data can be arbitrarily old */
        let agreeing = nominations.iter().filter(|&&wn| wn == winner).count();
        if agreeing < MIN_SIGNALS_TO_QUALIFY {
            return None;
        }
        if winner > i64::from(i16::MAX as u16) {
            return None;
        }
        GpsTime::new(
            winner as i16,
            f64::from(tow_ms_hint) / f64::from(consts::SECS_MS),
        )
        .ok()
    }
}

impl Estimator for EphemerisTimeEstimator {
    type State = EphemerisState;

    fn reset(&mut self) {
        self.state = EphemerisState::default();
        let _ = self.shared.save_state(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Code;

    fn estimator() -> (EphemerisTimeEstimator, Arc<SharedState<EphemerisState>>) {
        let shared = Arc::new(SharedState::new());
        (EphemerisTimeEstimator::new(Arc::clone(&shared)), shared)
    }

    fn snapshot(shared: &SharedState<EphemerisState>) -> EphemerisState {
        let mut state = EphemerisState::default();
        assert!(shared.load_state(&mut state));
        state
    }

    fn push_gps_fleet(estimator: &mut EphemerisTimeEstimator, wn: i16, tow: f64, count: u16) {
        for sat in 1..=count {
            estimator.push(
                GnssSignal::new(sat, Code::GpsL1ca).unwrap(),
                GpsTime::new(wn, tow).unwrap(),
            );
        }
    }

    #[test]
    fn needs_enough_satellites() {
        let (mut estimator, shared) = estimator();
        push_gps_fleet(&mut estimator, 2190, 341_000.0, (MIN_SIGNALS_TO_QUALIFY - 1) as u16);
        assert!(
            EphemerisTimeEstimator::get_estimate(&snapshot(&shared), 341_562_000).is_none()
        );
        push_gps_fleet(&mut estimator, 2190, 341_000.0, MIN_SIGNALS_TO_QUALIFY as u16);
        let estimate =
            EphemerisTimeEstimator::get_estimate(&snapshot(&shared), 341_562_000).unwrap();
        assert_eq!(estimate.wn(), 2190);
    }

    #[test]
    fn hint_across_week_boundary() {
        let (mut estimator, shared) = estimator();
        /* ephemerides from the very end of week 2190 */
        push_gps_fleet(&mut estimator, 2190, 604_000.0, 10);
        /* hint from just after the rollover */
        let estimate =
            EphemerisTimeEstimator::get_estimate(&snapshot(&shared), 5_000).unwrap();
        assert_eq!(estimate.wn(), 2191);
    }

    #[test]
    fn stale_satellites_get_no_vote() {
        let (mut estimator, shared) = estimator();
        push_gps_fleet(&mut estimator, 2190, 341_000.0, 10);
        /* two satellites relaying week-old data */
        for sat in 20..22 {
            estimator.push(
                GnssSignal::new(sat, Code::GpsL1ca).unwrap(),
                GpsTime::new(2170, 341_000.0).unwrap(),
            );
        }
        let estimate =
            EphemerisTimeEstimator::get_estimate(&snapshot(&shared), 341_562_000).unwrap();
        assert_eq!(estimate.wn(), 2190);
    }

    #[test]
    fn update_replaces_satellite_entry() {
        let (mut estimator, shared) = estimator();
        push_gps_fleet(&mut estimator, 2190, 300_000.0, 10);
        push_gps_fleet(&mut estimator, 2191, 1_000.0, 10);
        assert_eq!(snapshot(&shared).total_count(), 10);
        let estimate = EphemerisTimeEstimator::get_estimate(&snapshot(&shared), 2_000_000)
            .unwrap();
        assert_eq!(estimate.wn(), 2191);
    }

    #[test]
    fn mixed_constellations_vote_together() {
        let (mut estimator, shared) = estimator();
        push_gps_fleet(&mut estimator, 2190, 341_000.0, 5);
        for sat in 1..=5u16 {
            estimator.push(
                GnssSignal::new(sat, Code::GalE1b).unwrap(),
                GpsTime::new(2190, 341_100.0).unwrap(),
            );
        }
        let estimate =
            EphemerisTimeEstimator::get_estimate(&snapshot(&shared), 341_562_000).unwrap();
        assert_eq!(estimate.wn(), 2190);
    }

    #[test]
    fn glonass_not_tracked() {
        let (mut estimator, shared) = estimator();
        for sat in 1..=10u16 {
            estimator.push(
                GnssSignal::new(sat, Code::GloL1of).unwrap(),
                GpsTime::new(2190, 341_000.0).unwrap(),
            );
        }
        assert_eq!(snapshot(&shared).total_count(), 0);
    }
}
