// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

//! Common constant values related to time manipulation

/// Number of days in a week.
pub const WEEK_DAYS: u32 = 7;

/// Number of seconds in a minute.
pub const MINUTE_SECS: u32 = 60;

/// Number of minutes in an hour.
pub const HOUR_MINUTES: u32 = 60;

/// Number of seconds in an hour.
pub const HOUR_SECS: u32 = MINUTE_SECS * HOUR_MINUTES;

/// Number of hours in a day.
pub const DAY_HOURS: u32 = 24;

/// Number of seconds in a day.
pub const DAY_SECS: u32 = DAY_HOURS * HOUR_MINUTES * MINUTE_SECS;

/// Number of seconds in a week.
pub const WEEK_SECS: u32 = WEEK_DAYS * DAY_SECS;

/// Number of milliseconds in a second.
pub const SECS_MS: u32 = 1_000;

/// Number of milliseconds in a day
pub const DAY_MS: u32 = SECS_MS * DAY_SECS;

/// Number of milliseconds in a week
pub const WEEK_MS: u32 = SECS_MS * WEEK_SECS;

/// Unix timestamp of the GPS epoch 1980-01-06 00:00:00 UTC
pub const GPS_EPOCH: i64 = 315_964_800;

/// Modified Julian days of the GPS epoch 1980-01-06 00:00:00 UTC
pub const MJD_JAN_6_1980: u32 = 44244;

/// Constant difference of Galileo time from GPS time
pub const GAL_WEEK_TO_GPS_WEEK: i16 = 1024;

/// Constant difference of Beidou time from GPS time
pub const BDS_WEEK_TO_GPS_WEEK: i16 = 1356;
/// BeiDou system time runs 14 seconds behind GPS time
pub const BDS_SECOND_TO_GPS_SECOND: f64 = 14.0;

/// Offset of UTC(SU), the GLONASS time base, from UTC in hours
pub const UTC_SU_OFFSET_HOURS: u32 = 3;

/// Width of the GPS week counter on the wire (DF076)
pub const GPS_WN_RESOLUTION_BITS: u8 = 10;
/// Width of the Galileo week counter on the wire (DF289)
pub const GAL_WN_RESOLUTION_BITS: u8 = 12;
/// Width of the BeiDou week counter on the wire (DF489)
pub const BDS_WN_RESOLUTION_BITS: u8 = 13;

/// Width of the modified Julian day field of message 1013 (DF051)
pub const MJD_RESOLUTION_BITS: u8 = 16;

/// Week number used to anchor ambiguous wire times when nothing better is
/// available. Bump when cutting a release.
pub const BUILD_WEEK_REFERENCE: u16 = 2188;

/// The threshold for considering two time values as equivalent
/// in [`PartialEq`](std::cmp::PartialEq) and [`PartialOrd`](std::cmp::PartialOrd)
pub const JIFFY: f64 = 1e-12;
