// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Observation epoch assembly
//!
//! Translated observations trickle in one RTCM message at a time, but SBP
//! consumers want whole epochs. The assembler buffers observations for the
//! current (station, epoch time) pair, flushes into numbered `MSG_OBS`
//! fragments when the epoch completes or changes, and arbitrates between
//! legacy and MSM observations when a stream carries both.

use std::time::Duration;

use crate::sbp::messages::{
    MsgObs, ObservationHeader, PackedObsContent, SbpGpsTime, MSG_OBS_OBS_MAX,
};
use crate::time::GpsTime;

/// Most observations one epoch can hold across all its fragments
pub const MAX_OBS_PER_EPOCH: usize = 156;

/// How long after the last MSM observation legacy observations stay
/// suppressed
pub const MSM_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to a pushed observation
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PushOutcome {
    /// The observation is in the buffer
    Added,
    /// An observation with the same signal was already buffered
    Duplicate,
    /// The epoch buffer is full, the observation was dropped
    Full,
}

/// Buffers translated observations and emits complete epochs
pub struct ObsAssembler {
    obs_buffer: Vec<PackedObsContent>,
    epoch_time: Option<SbpGpsTime>,
    sender_id: u16,
    buffer_from_msm: bool,
    last_msm_received: Option<GpsTime>,
}

impl ObsAssembler {
    /// Makes an empty assembler
    #[must_use]
    pub fn new() -> ObsAssembler {
        ObsAssembler {
            obs_buffer: Vec::with_capacity(MAX_OBS_PER_EPOCH),
            epoch_time: None,
            sender_id: 0,
            buffer_from_msm: false,
            last_msm_received: None,
        }
    }

    /// True when no observations are buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obs_buffer.is_empty()
    }

    /// Checks if MSM observations arrived within the suppression window
    #[must_use]
    pub fn msm_active(&self, now: &GpsTime) -> bool {
        match &self.last_msm_received {
            Some(last) => now.diff(last) < MSM_TIMEOUT.as_secs_f64(),
            None => false,
        }
    }

    /// Records that an MSM observation message arrived
    ///
    /// MSM carries more bands than the legacy messages, so when both are
    /// present MSM wins: buffered legacy observations are discarded and the
    /// caller suppresses legacy processing until [`MSM_TIMEOUT`] passes.
    /// Returns true when buffered legacy observations were thrown away.
    pub fn note_msm_received(&mut self, now: GpsTime) -> bool {
        self.last_msm_received = Some(now);
        if !self.obs_buffer.is_empty() && !self.buffer_from_msm {
            self.obs_buffer.clear();
            self.epoch_time = None;
            return true;
        }
        false
    }

    /// Starts, or continues, the epoch at `time` for `sender_id`
    ///
    /// A change of epoch time or station flushes the previous epoch first;
    /// the returned messages carry the previous sender id and must be
    /// emitted before anything newer.
    pub fn begin_epoch(
        &mut self,
        time: SbpGpsTime,
        sender_id: u16,
        from_msm: bool,
    ) -> (u16, Vec<MsgObs>) {
        let previous_sender = self.sender_id;
        let mut flushed = Vec::new();
        if let Some(current) = self.epoch_time {
            if current != time || self.sender_id != sender_id {
                /* either a message went missing or a new station appeared,
                 * let the old epoch go out as-is */
                flushed = self.flush();
            }
        }
        self.epoch_time = Some(time);
        self.sender_id = sender_id;
        self.buffer_from_msm = from_msm;
        (previous_sender, flushed)
    }

    /// Adds one observation to the current epoch
    pub fn push(&mut self, obs: PackedObsContent) -> PushOutcome {
        if self.obs_buffer.len() >= MAX_OBS_PER_EPOCH {
            return PushOutcome::Full;
        }
        /* one record per signal per epoch */
        if self.obs_buffer.iter().any(|existing| existing.sid == obs.sid) {
            return PushOutcome::Duplicate;
        }
        self.obs_buffer.push(obs);
        PushOutcome::Added
    }

    /// The sender id of the epoch being assembled
    #[must_use]
    pub fn sender_id(&self) -> u16 {
        self.sender_id
    }

    /// Emits the buffered epoch as numbered `MSG_OBS` fragments
    ///
    /// The sequence field of each fragment carries the fragment count in the
    /// upper nibble and the fragment index in the lower one.
    pub fn flush(&mut self) -> Vec<MsgObs> {
        let Some(epoch_time) = self.epoch_time else {
            self.obs_buffer.clear();
            return Vec::new();
        };

        let total_messages = 1 + if self.obs_buffer.is_empty() {
            0
        } else {
            (self.obs_buffer.len() - 1) / MSG_OBS_OBS_MAX
        };

        let mut messages = Vec::with_capacity(total_messages);
        for (index, chunk) in self.obs_buffer.chunks(MSG_OBS_OBS_MAX).enumerate() {
            messages.push(MsgObs {
                header: ObservationHeader {
                    t: epoch_time,
                    n_obs: ((total_messages as u8) << 4) | index as u8,
                },
                obs: chunk.to_vec(),
            });
        }
        if messages.is_empty() {
            /* an epoch with no surviving observations still goes out, the
             * consumer learns the epoch happened */
            messages.push(MsgObs {
                header: ObservationHeader {
                    t: epoch_time,
                    n_obs: (total_messages as u8) << 4,
                },
                obs: Vec::new(),
            });
        }

        self.obs_buffer.clear();
        self.epoch_time = None;
        messages
    }

    /// Drops everything, including the MSM suppression window
    pub fn reset(&mut self) {
        self.obs_buffer.clear();
        self.epoch_time = None;
        self.sender_id = 0;
        self.buffer_from_msm = false;
        self.last_msm_received = None;
    }
}

impl Default for ObsAssembler {
    fn default() -> Self {
        Self::new()
    }
}
