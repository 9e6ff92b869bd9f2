// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! SSR orbit and clock pairing
//!
//! RTCM carries orbit and clock corrections in separate messages, SBP fuses
//! them into one message per satellite. One slot per constellation holds the
//! most recent un-paired half; the complement pairs purely by
//! (epoch time, issue of data SSR) equality, never by arrival order or age.
//! A new un-matching half simply replaces whatever the slot held, so the
//! slot cannot wedge.

use crate::rtcm::ssr::{ClockCorr, OrbitCorr, SsrHeader, SsrMessage};
use crate::sbp::messages::{
    GpsTimeSec, MsgSsrCodeBiases, MsgSsrOrbitClock, SbpMessage, SbpSignal, SsrCodeBias,
};
use crate::signal::{Code, Constellation};
use crate::time::{consts, resolve_glo_tod, resolve_gps_tow, GpsTime};

/// A constellation's pairing slot
#[derive(Debug, Clone, PartialEq, Default)]
enum PairingSlot {
    /// Nothing waiting
    #[default]
    Empty,
    /// An orbit message waiting for its clock complement
    AwaitingClock {
        header: SsrHeader,
        orbits: Vec<OrbitCorr>,
    },
    /// A clock message waiting for its orbit complement
    AwaitingOrbit {
        header: SsrHeader,
        clocks: Vec<ClockCorr>,
    },
}

/// Pairs split SSR orbit/clock messages and converts complete corrections
pub struct SsrPairingCache {
    slots: [PairingSlot; 6],
}

fn constellation_index(cons: Constellation) -> usize {
    cons as usize
}

/// The signal code SBP uses to label corrections of a constellation
fn reference_code(cons: Constellation) -> Code {
    match cons {
        Constellation::Gps => Code::GpsL1ca,
        Constellation::Sbas => Code::SbasL1ca,
        Constellation::Glo => Code::GloL1of,
        Constellation::Bds => Code::Bds2B1,
        Constellation::Qzs => Code::QzsL1ca,
        Constellation::Gal => Code::GalE1b,
    }
}

/// Header tuple that decides whether two halves belong together
fn pairing_key(header: &SsrHeader) -> (u32, u8) {
    (header.epoch_time, header.iod_ssr)
}

fn resolve_epoch(
    header: &SsrHeader,
    cons: Constellation,
    now: &GpsTime,
    leap_seconds: Option<i8>,
) -> Option<GpsTimeSec> {
    let time = if cons == Constellation::Glo {
        resolve_glo_tod(header.epoch_time * consts::SECS_MS, now, leap_seconds?).ok()?
    } else {
        resolve_gps_tow(header.epoch_time * consts::SECS_MS, now).ok()?
    };
    Some(GpsTimeSec {
        tow: time.tow().round() as u32,
        wn: time.wn() as u16,
    })
}

fn orbit_clock_to_sbp(
    header: &SsrHeader,
    cons: Constellation,
    orbits: &[OrbitCorr],
    clocks: &[ClockCorr],
    now: &GpsTime,
    leap_seconds: Option<i8>,
) -> Vec<SbpMessage> {
    let Some(time) = resolve_epoch(header, cons, now, leap_seconds) else {
        return Vec::new();
    };
    let code = reference_code(cons).to_sbp();

    orbits
        .iter()
        .filter_map(|orbit| {
            let clock = clocks.iter().find(|clock| clock.sat_id == orbit.sat_id)?;
            Some(SbpMessage::SsrOrbitClock(MsgSsrOrbitClock {
                time,
                sid: SbpSignal {
                    sat: orbit.sat_id,
                    code,
                },
                update_interval: header.update_interval,
                iod_ssr: header.iod_ssr,
                iod: u32::from(orbit.iode),
                radial: orbit.radial,
                along: orbit.along_track,
                cross: orbit.cross_track,
                dot_radial: orbit.dot_radial,
                dot_along: orbit.dot_along_track,
                dot_cross: orbit.dot_cross_track,
                c0: clock.c0,
                c1: clock.c1,
                c2: clock.c2,
            }))
        })
        .collect()
}

impl SsrPairingCache {
    /// Makes a cache with all slots empty
    #[must_use]
    pub fn new() -> SsrPairingCache {
        SsrPairingCache {
            slots: Default::default(),
        }
    }

    /// Empties all slots
    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    /// Feeds one decoded SSR message, returning any SBP messages that became
    /// complete
    ///
    /// `now` and `leap_seconds` place the truncated epoch time on the GPS
    /// time line; corrections whose epoch cannot be resolved are dropped.
    pub fn handle(
        &mut self,
        msg: &SsrMessage,
        now: &GpsTime,
        leap_seconds: Option<i8>,
    ) -> Vec<SbpMessage> {
        let Some(cons) = msg.header().constellation() else {
            return Vec::new();
        };

        match msg {
            SsrMessage::OrbitClock {
                header,
                orbits,
                clocks,
            } => orbit_clock_to_sbp(header, cons, orbits, clocks, now, leap_seconds),
            SsrMessage::CodeBias { header, sats } => {
                let Some(time) = resolve_epoch(header, cons, now, leap_seconds) else {
                    return Vec::new();
                };
                let code = reference_code(cons).to_sbp();
                sats.iter()
                    .map(|sat| {
                        SbpMessage::SsrCodeBiases(MsgSsrCodeBiases {
                            time,
                            sid: SbpSignal {
                                sat: sat.sat_id,
                                code,
                            },
                            update_interval: header.update_interval,
                            iod_ssr: header.iod_ssr,
                            biases: sat
                                .biases
                                .iter()
                                .map(|bias| SsrCodeBias {
                                    code: bias.signal_id,
                                    value: bias.bias,
                                })
                                .collect(),
                        })
                    })
                    .collect()
            }
            SsrMessage::Orbit { header, orbits } => {
                let slot = &mut self.slots[constellation_index(cons)];
                if let PairingSlot::AwaitingOrbit {
                    header: clock_header,
                    clocks,
                } = slot
                {
                    if pairing_key(clock_header) == pairing_key(header) {
                        let messages =
                            orbit_clock_to_sbp(header, cons, orbits, clocks, now, leap_seconds);
                        *slot = PairingSlot::Empty;
                        return messages;
                    }
                }
                *slot = PairingSlot::AwaitingClock {
                    header: *header,
                    orbits: orbits.clone(),
                };
                Vec::new()
            }
            SsrMessage::Clock { header, clocks } => {
                let slot = &mut self.slots[constellation_index(cons)];
                if let PairingSlot::AwaitingClock {
                    header: orbit_header,
                    orbits,
                } = slot
                {
                    if pairing_key(orbit_header) == pairing_key(header) {
                        let messages = orbit_clock_to_sbp(
                            orbit_header,
                            cons,
                            orbits,
                            clocks,
                            now,
                            leap_seconds,
                        );
                        *slot = PairingSlot::Empty;
                        return messages;
                    }
                }
                *slot = PairingSlot::AwaitingOrbit {
                    header: *header,
                    clocks: clocks.clone(),
                };
                Vec::new()
            }
        }
    }
}

impl Default for SsrPairingCache {
    fn default() -> Self {
        Self::new()
    }
}
