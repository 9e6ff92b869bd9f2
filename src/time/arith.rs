// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Per-constellation time disambiguation
//!
//! RTCM observation and ephemeris records carry truncated time stamps: a GPS
//! time of week modulo one week, a GLONASS time of day modulo one day, or a
//! week number modulo a constellation-specific rollover cycle. The functions
//! here recover the absolute GPS time by placing the truncated value next to
//! a full reference time.

use crate::time::{consts, GpsTime};

/// Error type for time stamp disambiguation failures
#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum TimeConversionError {
    /// A time of week outside [0, 604800) seconds was given
    #[error("Invalid time of week ({0} ms)")]
    InvalidTow(u32),
    /// A GLONASS time of day outside [0, 86401) seconds was given
    #[error("Invalid GLONASS time of day ({0} ms)")]
    InvalidTod(u32),
    /// The supplied reference time was not a valid GPS time
    #[error("Invalid reference time")]
    InvalidReference,
    /// No GPS-UTC leap second value was available
    #[error("Leap second value unknown")]
    MissingLeapSeconds,
}

/// Resolves a GPS/GAL/QZS time of week against a reference time
///
/// The result keeps the given time of week and picks the week number that
/// lands within half a week of the reference, saturating at the week number
/// range limits.
pub fn resolve_gps_tow(
    tow_ms: u32,
    reference: &GpsTime,
) -> Result<GpsTime, TimeConversionError> {
    if tow_ms >= consts::WEEK_MS {
        return Err(TimeConversionError::InvalidTow(tow_ms));
    }
    if !reference.is_valid() {
        return Err(TimeConversionError::InvalidReference);
    }

    let mut obs_time = GpsTime::new_unchecked(
        reference.wn(),
        f64::from(tow_ms) / f64::from(consts::SECS_MS),
    );
    let timediff = obs_time.diff(reference);
    if timediff < -f64::from(consts::WEEK_SECS) / 2.0 && reference.wn() != i16::MAX {
        obs_time = GpsTime::new_unchecked(reference.wn() + 1, obs_time.tow());
    } else if timediff > f64::from(consts::WEEK_SECS) / 2.0 && reference.wn() != 0 {
        obs_time = GpsTime::new_unchecked(reference.wn() - 1, obs_time.tow());
    }
    Ok(obs_time)
}

/// Shifts a BeiDou time of week onto the GPS time base
///
/// BDS system time has a constant offset of 14 seconds behind GPS time.
#[must_use]
pub fn bds_tow_to_gps_tow_ms(tow_ms: u32) -> u32 {
    let shifted = tow_ms + (consts::BDS_SECOND_TO_GPS_SECOND as u32) * consts::SECS_MS;
    if shifted >= consts::WEEK_MS {
        shifted - consts::WEEK_MS
    } else {
        shifted
    }
}

/// Computes a full GPS time stamp from a GLONASS time-of-day count, so that
/// the result is close to the supplied reference GPS time
///
/// GLONASS time runs on UTC(SU), three hours ahead of UTC; converting onto
/// the GPS time base also needs the current leap second count. The day of
/// week is taken from the reference and corrected when the result lands more
/// than half a day away.
pub fn resolve_glo_tod(
    tod_ms: u32,
    reference: &GpsTime,
    leap_seconds: i8,
) -> Result<GpsTime, TimeConversionError> {
    /* a leap second can legitimately push the count to 24:00:00.xxx */
    if tod_ms >= (consts::DAY_SECS + 1) * consts::SECS_MS {
        return Err(TimeConversionError::InvalidTod(tod_ms));
    }
    if !reference.is_valid() {
        return Err(TimeConversionError::InvalidReference);
    }

    /* Approximate DOW from the reference GPS time */
    let glo_dow = (reference.tow() / f64::from(consts::DAY_SECS)).floor() as i64;
    let glo_tod_ms =
        i64::from(tod_ms) - i64::from(consts::UTC_SU_OFFSET_HOURS * consts::HOUR_SECS * consts::SECS_MS);

    let tow_ms =
        glo_dow * i64::from(consts::DAY_MS) + glo_tod_ms + i64::from(leap_seconds) * i64::from(consts::SECS_MS);

    let mut obs_time = GpsTime::new_unchecked(
        reference.wn(),
        tow_ms as f64 / f64::from(consts::SECS_MS),
    );
    obs_time.normalize();
    if !obs_time.is_valid() {
        return Err(TimeConversionError::InvalidReference);
    }

    /* check for day rollover against reference time */
    let timediff = obs_time.diff(reference);
    if timediff.abs() > f64::from(consts::DAY_SECS) / 2.0 {
        obs_time.add_secs(if timediff < 0.0 {
            f64::from(consts::DAY_SECS)
        } else {
            -f64::from(consts::DAY_SECS)
        });
        if !obs_time.is_valid() {
            return Err(TimeConversionError::InvalidReference);
        }
    }

    Ok(obs_time)
}

/// Places a constellation time with a truncated week counter on the absolute
/// GPS time line
///
/// `constellation_time` is the decoded (truncated) week number and time of
/// week, `constellation_offset` the constant difference between the
/// constellation time base and GPS time. The returned time is the earliest
/// candidate, advanced in whole rollover cycles of `2^wn_resolution_bits`
/// weeks, that does not precede the reference time.
#[must_use]
pub fn week_rollover_adjustment(
    constellation_time: &GpsTime,
    reference: &GpsTime,
    wn_resolution_bits: u8,
    constellation_offset: &GpsTime,
) -> GpsTime {
    let cycle_weeks = 1i16 << wn_resolution_bits;

    let mut adjusted = GpsTime::new_unchecked(
        constellation_time.wn() + constellation_offset.wn(),
        constellation_time.tow() + constellation_offset.tow(),
    );
    adjusted.normalize();

    while adjusted < *reference {
        adjusted = GpsTime::new_unchecked(adjusted.wn() + cycle_weeks, adjusted.tow());
    }
    adjusted
}

/// Recovers an absolute GPS time from the 16-bit modified Julian day and UTC
/// seconds-of-day fields of message 1013
///
/// The MJD field rolls over every 179 years; `week_reference` anchors the
/// rollover count.
#[must_use]
pub fn gps_time_from_mjd(
    mjd_raw: u16,
    utc_tod_secs: u32,
    leap_seconds: i8,
    week_reference: u16,
) -> GpsTime {
    let mjd_modulus = 1u32 << consts::MJD_RESOLUTION_BITS;
    let absolute_mjd_reference =
        consts::WEEK_DAYS * u32::from(week_reference) + consts::MJD_JAN_6_1980;
    let mut rollovers = absolute_mjd_reference / mjd_modulus;
    if u32::from(mjd_raw) < absolute_mjd_reference % mjd_modulus {
        rollovers += 1;
    }

    let gps_days = i64::from(mjd_raw) - i64::from(consts::MJD_JAN_6_1980)
        + i64::from(rollovers) * i64::from(mjd_modulus);

    let wn = gps_days.div_euclid(i64::from(consts::WEEK_DAYS));
    let mut gps_time = GpsTime::new_unchecked(
        wn as i16,
        (gps_days - wn * i64::from(consts::WEEK_DAYS)) as f64 * f64::from(consts::DAY_SECS),
    );
    gps_time.add_secs(f64::from(utc_tod_secs));
    gps_time.add_secs(f64::from(leap_seconds));
    gps_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    const GPS_GPS_OFFSET: GpsTime = GpsTime::new_unchecked(0, 0.0);
    const GPS_GAL_OFFSET: GpsTime = GpsTime::new_unchecked(consts::GAL_WEEK_TO_GPS_WEEK, 0.0);
    const GPS_BDS_OFFSET: GpsTime =
        GpsTime::new_unchecked(consts::BDS_WEEK_TO_GPS_WEEK, consts::BDS_SECOND_TO_GPS_SECOND);

    #[test]
    fn gps_tow_near_reference() {
        let reference = GpsTime::new(2190, 41_864.0).unwrap();
        let t = resolve_gps_tow(41_863_000, &reference).unwrap();
        assert_eq!(t.wn(), 2190);
        assert_float_eq!(t.tow(), 41_863.0, abs <= 1e-9);
    }

    #[test]
    fn gps_tow_across_week_boundary() {
        /* reference just after midnight Sunday, observation from just before */
        let reference = GpsTime::new(2191, 1.0).unwrap();
        let t = resolve_gps_tow(604_799_000, &reference).unwrap();
        assert_eq!(t.wn(), 2190);

        /* reference just before midnight, observation from just after */
        let reference = GpsTime::new(2190, 604_799.0).unwrap();
        let t = resolve_gps_tow(1_000, &reference).unwrap();
        assert_eq!(t.wn(), 2191);
    }

    #[test]
    fn gps_tow_range_check() {
        let reference = GpsTime::new(2190, 0.0).unwrap();
        assert_eq!(
            resolve_gps_tow(consts::WEEK_MS, &reference),
            Err(TimeConversionError::InvalidTow(consts::WEEK_MS))
        );
    }

    #[test]
    fn bds_offset() {
        assert_eq!(bds_tow_to_gps_tow_ms(41_849_000), 41_863_000);
        assert_eq!(bds_tow_to_gps_tow_ms(consts::WEEK_MS - 7_000), 7_000);
    }

    #[test]
    fn glo_tod_nominal() {
        /* 03:00:00 UTC(SU) is midnight UTC; with 18 leap seconds the GPS
         * time of day is 18 s */
        let reference = GpsTime::new(2190, 2.0 * f64::from(consts::DAY_SECS)).unwrap();
        let t = resolve_glo_tod(
            (consts::UTC_SU_OFFSET_HOURS * consts::HOUR_SECS) * consts::SECS_MS,
            &reference,
            18,
        )
        .unwrap();
        assert_eq!(t.wn(), 2190);
        assert_float_eq!(t.tow(), 2.0 * f64::from(consts::DAY_SECS) + 18.0, abs <= 1e-9);
    }

    #[test]
    fn glo_tod_day_rollover() {
        /* reference sits early in the GPS day, the GLONASS count is from the
         * end of the previous day */
        let reference = GpsTime::new(2190, 3.0 * f64::from(consts::DAY_SECS) + 10.0).unwrap();
        let tod_ms = (consts::UTC_SU_OFFSET_HOURS * consts::HOUR_SECS - 10) * consts::SECS_MS;
        let t = resolve_glo_tod(tod_ms, &reference, 18).unwrap();
        assert_float_eq!(
            t.tow(),
            3.0 * f64::from(consts::DAY_SECS) + 8.0,
            abs <= 1e-9
        );
    }

    #[test]
    fn glo_tod_leap_second_event() {
        /* UTC(SU) midnight New Year 2017: the GLONASS count runs past
         * 03:00:00.999 while the GPS-UTC offset is still 17 s */
        let reference = GpsTime::new(1930, 16.999).unwrap();
        let t = resolve_glo_tod(10_800_999, &reference, 17).unwrap();
        assert_eq!(t.wn(), 1930);
        assert_float_eq!(t.tow(), 17.999, abs <= 1.0);
    }

    #[test]
    fn glo_tod_range_check() {
        let reference = GpsTime::new(2190, 0.0).unwrap();
        assert!(resolve_glo_tod((consts::DAY_SECS + 1) * consts::SECS_MS, &reference, 18).is_err());
        /* 24:00:00.5 is reachable during a leap second event */
        assert!(resolve_glo_tod(consts::DAY_SECS * consts::SECS_MS + 500, &reference, 18).is_ok());
    }

    #[test]
    fn week_rollover_gps() {
        struct Case {
            constellation_time: GpsTime,
            reference: GpsTime,
            bits: u8,
            offset: GpsTime,
            expected: GpsTime,
        }
        let cases = [
            /* GPS epoch */
            Case {
                constellation_time: GpsTime::new_unchecked(0, 0.0),
                reference: GPS_GPS_OFFSET,
                bits: consts::GPS_WN_RESOLUTION_BITS,
                offset: GPS_GPS_OFFSET,
                expected: GPS_GPS_OFFSET,
            },
            /* just before the third week rollover */
            Case {
                constellation_time: GpsTime::new_unchecked(1023, 604_799.0),
                reference: GpsTime::new_unchecked(2190, 341_562.0),
                bits: consts::GPS_WN_RESOLUTION_BITS,
                offset: GPS_GPS_OFFSET,
                expected: GpsTime::new_unchecked(3071, 604_799.0),
            },
            /* just on the third week rollover */
            Case {
                constellation_time: GpsTime::new_unchecked(0, 0.0),
                reference: GpsTime::new_unchecked(2190, 341_562.0),
                bits: consts::GPS_WN_RESOLUTION_BITS,
                offset: GPS_GPS_OFFSET,
                expected: GpsTime::new_unchecked(3072, 0.0),
            },
            /* just before the reference time */
            Case {
                constellation_time: GpsTime::new_unchecked(142, 41_863.0),
                reference: GpsTime::new_unchecked(2190, 41_864.0),
                bits: consts::GPS_WN_RESOLUTION_BITS,
                offset: GPS_GPS_OFFSET,
                expected: GpsTime::new_unchecked(3214, 41_863.0),
            },
            /* just on the reference time */
            Case {
                constellation_time: GpsTime::new_unchecked(142, 41_864.0),
                reference: GpsTime::new_unchecked(2190, 41_864.0),
                bits: consts::GPS_WN_RESOLUTION_BITS,
                offset: GPS_GPS_OFFSET,
                expected: GpsTime::new_unchecked(2190, 41_864.0),
            },
        ];
        for case in &cases {
            let got = week_rollover_adjustment(
                &case.constellation_time,
                &case.reference,
                case.bits,
                &case.offset,
            );
            assert_eq!(got.wn(), case.expected.wn());
            assert_float_eq!(got.tow(), case.expected.tow(), abs <= 1e-9);
        }
    }

    #[test]
    fn week_rollover_gal() {
        let got = week_rollover_adjustment(
            &GpsTime::new_unchecked(0, 0.0),
            &GpsTime::new_unchecked(2190, 341_562.0),
            consts::GAL_WN_RESOLUTION_BITS,
            &GPS_GAL_OFFSET,
        );
        assert_eq!(got.wn(), 5120);
        assert_float_eq!(got.tow(), 0.0, abs <= 1e-9);

        let got = week_rollover_adjustment(
            &GpsTime::new_unchecked(4095, 604_799.0),
            &GpsTime::new_unchecked(2190, 341_562.0),
            consts::GAL_WN_RESOLUTION_BITS,
            &GPS_GAL_OFFSET,
        );
        assert_eq!(got.wn(), 5119);
        assert_float_eq!(got.tow(), 604_799.0, abs <= 1e-9);
    }

    #[test]
    fn week_rollover_bds() {
        let got = week_rollover_adjustment(
            &GpsTime::new_unchecked(834, 41_849.0),
            &GpsTime::new_unchecked(2190, 41_864.0),
            consts::BDS_WN_RESOLUTION_BITS,
            &GPS_BDS_OFFSET,
        );
        assert_eq!(got.wn(), 10382);
        assert_float_eq!(got.tow(), 41_863.0, abs <= 1e-9);

        /* the 14 s offset pushes the end of week over into the next one */
        let got = week_rollover_adjustment(
            &GpsTime::new_unchecked(8191, 604_799.0),
            &GpsTime::new_unchecked(2190, 341_562.0),
            consts::BDS_WN_RESOLUTION_BITS,
            &GPS_BDS_OFFSET,
        );
        assert_eq!(got.wn(), 9548);
        assert_float_eq!(got.tow(), 13.0, abs <= 1e-9);
    }

    #[test]
    fn mjd_conversion() {
        /* the vector decoded from a live 1013 frame */
        let t = gps_time_from_mjd(59606, 82_451, 18, consts::BUILD_WEEK_REFERENCE);
        assert_eq!(t.wn(), 2194);
        assert_float_eq!(t.tow(), 428_069.0, abs <= 1e-9);
    }
}
