// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Time handling
//!
//! GPS time counts the number of seconds since Midnight Jan 6th 1980 UTC.
//! Leap seconds are not counted, so there is an offset between UTC and GPS
//! time. GPS time is usually represented as a week number, counting the
//! number of elapsed weeks since the start of GPS time, and a time of week
//! counting the number of seconds since the beginning of the week. In GPS
//! time the week begins at midnight on Sunday.
//!
//! [`GpsTime`] is the representation used throughout this crate. The other
//! GNSS time bases never appear as types of their own; the [`arith`]
//! functions move their truncated wire values directly onto the GPS time
//! line, because that is all a protocol translator needs.
//!
//! The GPS-UTC leap second offset is needed whenever GLONASS or UTC-based
//! time stamps are involved. The [`leap`] module carries a compiled-in table
//! of historic leap seconds along with its expiry horizon; live streams are
//! expected to eventually provide the current value themselves (RTCM 1013 or
//! UBX-NAV-TIMELS).

use std::time::Duration;

pub mod arith;
pub mod consts;
mod gnss;
pub mod leap;

pub use arith::*;
pub use gnss::*;

/// A minute long [`Duration`]
pub const MINUTE: Duration = Duration::from_secs(consts::MINUTE_SECS as u64);
/// An hour long [`Duration`]
pub const HOUR: Duration = Duration::from_secs(consts::HOUR_SECS as u64);
/// A day long [`Duration`]
pub const DAY: Duration = Duration::from_secs(consts::DAY_SECS as u64);
/// A week long [`Duration`]
pub const WEEK: Duration = Duration::from_secs(consts::WEEK_SECS as u64);
