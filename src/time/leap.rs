// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Built-in GPS-UTC leap second table
//!
//! The table is compiled in and kept up to date in the source as new leap
//! seconds are announced. Once the code is built there is no way to learn of
//! a new leap second, so every lookup is paired with an expiry check; past
//! [`UTC_LEAPS_EXPIRY`] callers should prefer leap second values decoded from
//! the stream (RTCM 1013, UBX-NAV-TIMELS) over the table.

use crate::time::{consts, GpsTime};

/**
 * Start times of UTC leap second events given in GPS time {wn, tow, gps-utc}
 * The leap second event lasts for one second from the start time, and after
 * that the new offset is in effect.
 */
const UTC_LEAPS: [(GpsTime, f64); 18] = [
    (GpsTime::new_unchecked(77, 259_200.), 1.), /* 01-07-1981 */
    (GpsTime::new_unchecked(129, 345_601.), 2.), /* 01-07-1982 */
    (GpsTime::new_unchecked(181, 432_002.), 3.), /* 01-07-1983 */
    (GpsTime::new_unchecked(286, 86403.), 4.),  /* 01-07-1985 */
    (GpsTime::new_unchecked(416, 432_004.), 5.), /* 01-01-1988 */
    (GpsTime::new_unchecked(521, 86405.), 6.),  /* 01-01-1990 */
    (GpsTime::new_unchecked(573, 172_806.), 7.), /* 01-01-1991 */
    (GpsTime::new_unchecked(651, 259_207.), 8.), /* 01-07-1992 */
    (GpsTime::new_unchecked(703, 345_608.), 9.), /* 01-07-1993 */
    (GpsTime::new_unchecked(755, 432_009.), 10.), /* 01-07-1994 */
    (GpsTime::new_unchecked(834, 86410.), 11.), /* 01-01-1996 */
    (GpsTime::new_unchecked(912, 172_811.), 12.), /* 01-07-1997 */
    (GpsTime::new_unchecked(990, 432_012.), 13.), /* 01-01-1999 */
    (GpsTime::new_unchecked(1356, 13.), 14.),   /* 01-01-2006 */
    (GpsTime::new_unchecked(1512, 345_614.), 15.), /* 01-01-2009 */
    (GpsTime::new_unchecked(1695, 15.), 16.),   /* 01-07-2012 */
    (GpsTime::new_unchecked(1851, 259_216.), 17.), /* 01-07-2015 */
    (GpsTime::new_unchecked(1930, 17.), 18.),   /* 01-01-2017 */
];

/// GPS time past which the compiled-in leap second table can no longer be
/// trusted to be complete. Matches the IERS Bulletin C horizon at the time
/// the table was last touched.
pub const UTC_LEAPS_EXPIRY: GpsTime = GpsTime::new_unchecked(2373, 0.0);

/// Gets the GPS-UTC offset in seconds at a GPS time, from the built-in table
#[must_use]
pub fn gps_utc_offset(t: &GpsTime) -> f64 {
    for (t_leap, offset) in UTC_LEAPS.iter().rev() {
        if t.diff(t_leap) >= 0.0 {
            return *offset;
        }
    }
    0.0
}

/// Checks if a GPS time falls within a (positive) leap second event, when
/// UTC clocks read 23:59:60
#[must_use]
pub fn is_leap_second_event(t: &GpsTime) -> bool {
    for (t_leap, _offset) in UTC_LEAPS.iter().rev() {
        let dt = t.diff(t_leap);
        if dt >= 1.0 {
            return false;
        }
        if dt >= 0.0 {
            return true;
        }
    }
    false
}

/// Checks whether the built-in table still covers a GPS time
#[must_use]
pub fn leap_table_current(t: &GpsTime) -> bool {
    t.diff(&UTC_LEAPS_EXPIRY) < 0.0
}

/// Converts seconds since the Unix epoch into GPS time using the built-in
/// leap second table
///
/// Returns `None` for times before the GPS epoch.
#[must_use]
pub fn unix_to_gps(unix_seconds: i64) -> Option<GpsTime> {
    if unix_seconds < consts::GPS_EPOCH {
        return None;
    }
    let utc_seconds = unix_seconds - consts::GPS_EPOCH;
    let mut gps = GpsTime::new_unchecked(
        (utc_seconds / i64::from(consts::WEEK_SECS)) as i16,
        (utc_seconds % i64::from(consts::WEEK_SECS)) as f64,
    );
    /* the offset lookup needs a GPS time, the uncorrected value is within a
     * minute of it which is plenty for a table with year-scale spacing */
    let offset = gps_utc_offset(&gps);
    gps.add_secs(offset);
    Some(gps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn offsets() {
        assert_float_eq!(
            gps_utc_offset(&GpsTime::new(77, 0.0).unwrap()),
            0.0,
            abs <= 1e-9
        );
        assert_float_eq!(
            gps_utc_offset(&GpsTime::new(77, 259_200.0).unwrap()),
            1.0,
            abs <= 1e-9
        );
        assert_float_eq!(
            gps_utc_offset(&GpsTime::new(1930, 16.0).unwrap()),
            17.0,
            abs <= 1e-9
        );
        assert_float_eq!(
            gps_utc_offset(&GpsTime::new(1930, 17.0).unwrap()),
            18.0,
            abs <= 1e-9
        );
        assert_float_eq!(
            gps_utc_offset(&GpsTime::new(2290, 0.0).unwrap()),
            18.0,
            abs <= 1e-9
        );
    }

    #[test]
    fn leap_second_events() {
        assert!(!is_leap_second_event(&GpsTime::new(1930, 16.5).unwrap()));
        assert!(is_leap_second_event(&GpsTime::new(1930, 17.0).unwrap()));
        assert!(is_leap_second_event(&GpsTime::new(1930, 17.5).unwrap()));
        assert!(!is_leap_second_event(&GpsTime::new(1930, 18.0).unwrap()));
    }

    #[test]
    fn table_expiry() {
        assert!(leap_table_current(&GpsTime::new(2200, 0.0).unwrap()));
        assert!(!leap_table_current(&GpsTime::new(2373, 1.0).unwrap()));
    }

    #[test]
    fn unix_conversion() {
        /* 2022-02-17T05:31:56Z */
        let gps = unix_to_gps(1_645_078_316).unwrap();
        assert_eq!(gps.wn(), 2197);
        assert_float_eq!(gps.tow(), 367_934.0, abs <= 1e-9);

        /* before the GPS epoch there is nothing to map to */
        assert!(unix_to_gps(consts::GPS_EPOCH - 1).is_none());

        /* the epoch itself is time zero */
        let gps = unix_to_gps(consts::GPS_EPOCH).unwrap();
        assert_eq!(gps.wn(), 0);
        assert_float_eq!(gps.tow(), 0.0, abs <= 1e-9);
    }
}
