// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
use std::{
    cmp::Ordering,
    ops::{Add, AddAssign, Sub, SubAssign},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::time::consts;

/// Representation of GPS Time
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct GpsTime {
    /// Seconds since the GPS start of week.
    tow: f64,
    /// GPS week number
    wn: i16,
}

/// Error type when a given GPS time is not valid
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, thiserror::Error)]
pub enum InvalidGpsTime {
    #[error("Invalid Week Number: {0}")]
    /// Indicates an invalid week number was given, with the invalid value returned
    InvalidWN(i16),
    #[error("Invalid Time of Week: {0}")]
    /// Indicates an invalid time of week was given, with the invalid value returned
    InvalidTOW(f64),
}

impl GpsTime {
    /// Makes a new GPS time object and checks the validity of the given values.
    ///
    /// # Errors
    ///
    /// An error will be returned if an invalid time is given. A valid time
    /// must have a non-negative week number, and a time of week value between 0
    /// and 604800.
    pub fn new(wn: i16, tow: f64) -> Result<GpsTime, InvalidGpsTime> {
        if wn < 0 {
            Err(InvalidGpsTime::InvalidWN(wn))
        } else if !tow.is_finite() || tow < 0.0 || tow >= f64::from(consts::WEEK_SECS) {
            Err(InvalidGpsTime::InvalidTOW(tow))
        } else {
            Ok(GpsTime { tow, wn })
        }
    }

    /// Makes a new GPS time object without checking the validity of the given values.
    pub(crate) const fn new_unchecked(wn: i16, tow: f64) -> GpsTime {
        GpsTime { tow, wn }
    }

    /// Gets the week number
    #[must_use]
    pub fn wn(&self) -> i16 {
        self.wn
    }

    /// Gets the time of week
    #[must_use]
    pub fn tow(&self) -> f64 {
        self.tow
    }

    /// Gets the time of week rounded to integer milliseconds
    #[must_use]
    pub fn tow_ms(&self) -> u32 {
        (self.tow * f64::from(consts::SECS_MS)).round() as u32
    }

    /// Checks if the stored time is valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.tow.is_finite()
            && self.tow >= 0.0
            && self.tow < f64::from(consts::WEEK_SECS)
            && self.wn >= 0
    }

    /// Normalize time of week value so it's within the length of a week
    pub(crate) fn normalize(&mut self) {
        while self.tow < 0.0 {
            self.tow += f64::from(consts::WEEK_SECS);
            self.wn -= 1;
        }

        while self.tow >= f64::from(consts::WEEK_SECS) {
            self.tow -= f64::from(consts::WEEK_SECS);
            self.wn += 1;
        }
    }

    /// Adds a (possibly negative) number of seconds to the time
    pub fn add_secs(&mut self, secs: f64) {
        self.tow += secs;
        self.normalize();
    }

    /// Gets the difference between this and another time value in seconds
    #[must_use]
    pub fn diff(&self, other: &Self) -> f64 {
        let dt = self.tow - other.tow;
        dt + f64::from(self.wn - other.wn) * f64::from(consts::WEEK_SECS)
    }
}

impl PartialEq for GpsTime {
    fn eq(&self, other: &Self) -> bool {
        self.diff(other).abs() < consts::JIFFY
    }
}

impl PartialOrd for GpsTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let diff = self.diff(other);
        if diff.abs() < consts::JIFFY {
            Some(Ordering::Equal)
        } else if diff > 0.0 {
            Some(Ordering::Greater)
        } else {
            Some(Ordering::Less)
        }
    }
}

impl Add<Duration> for GpsTime {
    type Output = Self;
    fn add(mut self, rhs: Duration) -> Self {
        self.add_secs(rhs.as_secs_f64());
        self
    }
}

impl AddAssign<Duration> for GpsTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.add_secs(rhs.as_secs_f64());
    }
}

impl Sub<Duration> for GpsTime {
    type Output = Self;
    fn sub(mut self, rhs: Duration) -> Self {
        self.add_secs(-rhs.as_secs_f64());
        self
    }
}

impl SubAssign<Duration> for GpsTime {
    fn sub_assign(&mut self, rhs: Duration) {
        self.add_secs(-rhs.as_secs_f64());
    }
}
