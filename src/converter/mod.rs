// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! The translator sessions
//!
//! [`Rtcm2SbpSession`] consumes a raw RTCM byte stream and emits SBP
//! messages through a sink callback; [`Sbp2RtcmSession`] does the reverse.
//! One session owns one input stream and everything that stream needs:
//! frame scanner, observation assembler, time resolution, pairing caches and
//! per-session warning state. Sessions never share mutable state with each
//! other; timing information crosses between threads only through
//! [`crate::time_truth`].

mod assembler;
mod biases;
mod eph;
mod rtcm2sbp;
mod sbp2rtcm;
mod ssr;
mod time_resolution;

pub use assembler::{ObsAssembler, PushOutcome, MAX_OBS_PER_EPOCH, MSM_TIMEOUT};
pub use biases::{glo_biases_from_1033, glo_biases_from_1230};
pub use eph::{ephemeris_to_sbp, sbp_to_ephemeris, SbpEphemeris};
pub use rtcm2sbp::Rtcm2SbpSession;
pub use sbp2rtcm::{MsmOutputMode, Sbp2RtcmSession};
pub use ssr::SsrPairingCache;
pub use time_resolution::{ResolvedTime, TimeQuality, TimeResolver};

use std::time::Duration;

/// Sink for translated SBP messages: sender id, message type, payload
pub type SbpSink = Box<dyn FnMut(u16, u16, &[u8]) + Send>;

/// Sink for translated RTCM frames
pub type RtcmSink = Box<dyn FnMut(&[u8]) + Send>;

/// Optional callback for unix wall clock time, seconds since the epoch
pub type UnixTimeCallback = Box<dyn FnMut() -> Option<i64> + Send>;

/// Callback invoked when a base observation time stamp is implausibly far
/// from the current time; receives the difference in seconds
pub type BaseObsInvalidCallback = Box<dyn FnMut(f64) + Send>;

/// Base observations this far from the current time trip the sanity callback
pub const BASE_FUTURE_THRESHOLD: Duration = Duration::from_secs(2 * 3600);

/// Maps an RTCM reference station id into an SBP sender id
///
/// The upper nibble marks the sender as a converted RTCM station so that
/// downstream consumers can tell translated streams from native ones.
#[must_use]
pub fn stn_to_sbp_sender_id(stn_id: u16) -> u16 {
    0xF000 | (stn_id & 0x0FFF)
}

/// Per-session event counters, inspectable by the caller
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SessionCounters {
    /// Messages decoded and handled
    pub messages_handled: u64,
    /// Payloads whose message number is outside the supported set
    pub messages_ignored: u64,
    /// Payloads that failed to decode
    pub decode_failures: u64,
    /// Observations dropped for an unsupported signal code
    pub unsupported_signals: u64,
    /// Messages dropped because no time could be resolved
    pub time_unresolved: u64,
    /// Observations dropped because the epoch buffer was full
    pub buffer_overflows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_id_marks_rtcm_origin() {
        assert_eq!(stn_to_sbp_sender_id(0), 0xF000);
        assert_eq!(stn_to_sbp_sender_id(813), 0xF000 | 813);
        /* only twelve bits of station id exist on the wire */
        assert_eq!(stn_to_sbp_sender_id(0xFFFF), 0xFFFF);
    }
}
