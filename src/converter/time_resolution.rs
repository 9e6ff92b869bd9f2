// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Current-time oracle for the decoders
//!
//! A thin cache over the available time sources, consulted whenever a
//! decoder needs to place an ambiguous wire time stamp. The priority order:
//!
//! 1. User-supplied time, which overrides everything.
//! 2. The unix wall clock callback.
//! 3. Time Truth fusion.
//! 4. The most recent RTCM 1013 record, a last resort.
//!
//! The result is cached for the duration of one frame-processing call so
//! every decoder that runs for that frame sees the same time.

use std::sync::Arc;

use super::UnixTimeCallback;
use crate::time::{consts, leap, GpsTime};
use crate::time_truth::{Confidence, TimeTruth, TimeTruthCache};

/// How trustworthy a resolved time is
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, strum::Display)]
pub enum TimeQuality {
    /// Nothing could be resolved
    Unknown,
    /// A last-resort source, not fit for production use
    Low,
    /// A source that could not be cross-validated
    Unvalidated,
    /// A trusted or cross-validated source
    Best,
}

/// A resolved current time
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedTime {
    /// Current GPS time, when known
    pub time: Option<GpsTime>,
    /// Current GPS-UTC leap second count, when known
    pub leap_seconds: Option<i8>,
    /// Quality of the resolution
    pub quality: TimeQuality,
}

impl Default for ResolvedTime {
    fn default() -> Self {
        ResolvedTime {
            time: None,
            leap_seconds: None,
            quality: TimeQuality::Unknown,
        }
    }
}

/// Combines the configured time sources into one current-time estimate
pub struct TimeResolver {
    user_time: Option<GpsTime>,
    user_leap_seconds: Option<i8>,
    unix_time_callback: Option<UnixTimeCallback>,
    time_truth: Option<Arc<TimeTruth>>,
    truth_cache: TimeTruthCache,
    gps_week_reference: u16,
    /// Most recent decoded 1013 record
    rtcm_1013: Option<(GpsTime, i8)>,
    cached: Option<ResolvedTime>,
}

impl TimeResolver {
    /// Makes a resolver with no sources configured
    #[must_use]
    pub fn new() -> TimeResolver {
        TimeResolver {
            user_time: None,
            user_leap_seconds: None,
            unix_time_callback: None,
            time_truth: None,
            truth_cache: TimeTruthCache::new(),
            gps_week_reference: consts::BUILD_WEEK_REFERENCE,
            rtcm_1013: None,
            cached: None,
        }
    }

    /// Sets or clears the user-supplied time override
    pub fn set_user_time(&mut self, time: Option<GpsTime>) {
        self.user_time = time;
        self.cached = None;
    }

    /// Sets or clears the user-supplied leap second override
    pub fn set_user_leap_seconds(&mut self, leap_seconds: Option<i8>) {
        self.user_leap_seconds = leap_seconds;
        self.cached = None;
    }

    /// Whether a user-supplied time is overriding the other sources
    #[must_use]
    pub fn using_user_time(&self) -> bool {
        self.user_time.is_some()
    }

    /// Installs the unix wall clock callback
    pub fn set_unix_time_callback(&mut self, callback: UnixTimeCallback) {
        self.unix_time_callback = Some(callback);
    }

    /// Connects Time Truth fusion as a source
    pub fn set_time_truth(&mut self, time_truth: Arc<TimeTruth>) {
        self.time_truth = Some(time_truth);
    }

    /// Anchors wire week numbers and days when no absolute source exists
    pub fn set_gps_week_reference(&mut self, wn: u16) {
        self.gps_week_reference = wn;
    }

    /// The configured week reference
    #[must_use]
    pub fn gps_week_reference(&self) -> u16 {
        self.gps_week_reference
    }

    /// Records a decoded 1013 time, the fallback source
    pub fn record_rtcm_1013(&mut self, time: GpsTime, leap_seconds: i8) {
        self.rtcm_1013 = Some((time, leap_seconds));
    }

    /// Drops the per-frame cache; call at the start of each incoming frame
    pub fn new_frame(&mut self) {
        self.cached = None;
    }

    /// Drops all state except the configuration
    pub fn reset(&mut self) {
        self.rtcm_1013 = None;
        self.cached = None;
        self.truth_cache.reset();
    }

    /// Resolves the current time, serving the per-frame cache when present
    pub fn resolve(&mut self) -> ResolvedTime {
        if let Some(cached) = self.cached {
            return cached;
        }
        let resolved = self.resolve_uncached();
        self.cached = Some(resolved);
        resolved
    }

    /// The current GPS time, when one can be resolved
    pub fn gps_time(&mut self) -> Option<GpsTime> {
        self.resolve().time
    }

    /// The current leap second count, when one can be resolved
    pub fn leap_seconds(&mut self) -> Option<i8> {
        self.resolve().leap_seconds
    }

    fn leap_for_time(&self, time: &GpsTime) -> Option<i8> {
        if leap::leap_table_current(time) {
            return Some(leap::gps_utc_offset(time) as i8);
        }
        /* past the table horizon the stream knows better than the binary */
        if let Some((_, leap_seconds)) = self.rtcm_1013 {
            return Some(leap_seconds);
        }
        Some(leap::gps_utc_offset(time) as i8)
    }

    fn resolve_uncached(&mut self) -> ResolvedTime {
        /* the user override wins outright */
        if let Some(time) = self.user_time {
            let leap_seconds = self
                .user_leap_seconds
                .or_else(|| self.leap_for_time(&time));
            return ResolvedTime {
                time: Some(time),
                leap_seconds,
                quality: TimeQuality::Best,
            };
        }

        /* the wall clock, when the caller wired one up */
        if let Some(callback) = self.unix_time_callback.as_mut() {
            if let Some(unix_seconds) = callback() {
                if let Some(time) = leap::unix_to_gps(unix_seconds) {
                    let table_current = leap::leap_table_current(&time);
                    let leap_seconds = self.leap_for_time(&time);
                    return ResolvedTime {
                        time: Some(time),
                        leap_seconds,
                        quality: if table_current {
                            TimeQuality::Best
                        } else {
                            TimeQuality::Unvalidated
                        },
                    };
                }
            }
        }

        /* fused stream time */
        if let Some(time_truth) = &self.time_truth {
            let estimate = time_truth.get_latest_time(Some(&mut self.truth_cache));
            if let Some(time) = estimate.gps_time() {
                let leap_seconds = estimate
                    .leap_seconds
                    .or_else(|| self.leap_for_time(&time));
                let quality = match estimate.wn_confidence.min(estimate.tow_confidence) {
                    Confidence::Best | Confidence::Good => TimeQuality::Best,
                    Confidence::Bad => TimeQuality::Unvalidated,
                    Confidence::None => TimeQuality::Unknown,
                };
                return ResolvedTime {
                    time: Some(time),
                    leap_seconds,
                    quality,
                };
            }
        }

        /* bare 1013, better than nothing but not by much */
        if let Some((time, leap_seconds)) = self.rtcm_1013 {
            return ResolvedTime {
                time: Some(time),
                leap_seconds: Some(leap_seconds),
                quality: TimeQuality::Low,
            };
        }

        ResolvedTime::default()
    }
}

impl Default for TimeResolver {
    fn default() -> Self {
        Self::new()
    }
}
