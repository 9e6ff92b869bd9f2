// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! The SBP to RTCM translator session

use super::{eph::sbp_to_ephemeris, eph::SbpEphemeris, RtcmSink, SessionCounters};
use crate::rtcm::{
    self,
    eph::Ephemeris,
    frame::frame_payload,
    msm::{code_to_msm_signal, MsmHeader, MsmMessage, MsmSatData, MsmSignalData},
    obs::{decode_lock_time, Freq, FreqData, ObsFlags, ObsHeader, ObsMessage, SatData},
    station::{Msg1005, Msg1006, Msg1230},
};
use crate::sbp::messages::{
    MsgBasePosEcef, MsgEphemerisBds, MsgEphemerisGal, MsgEphemerisGlo, MsgEphemerisGps,
    MsgGloBiases, MsgObs, PackedObsContent, PackedObsFlags, SbpGpsTime, MSG_BASE_POS_ECEF,
    MSG_EPHEMERIS_BDS, MSG_EPHEMERIS_GAL, MSG_EPHEMERIS_GLO, MSG_EPHEMERIS_GPS,
    MSG_EPHEMERIS_QZSS, MSG_GLO_BIASES, MSG_OBS,
};
use crate::signal::{consts as sig_consts, fcn_from_sbp, Code, Constellation};
use crate::time::consts as time_consts;

/// Which RTCM observation messages the session emits
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, strum::Display)]
pub enum MsmOutputMode {
    /// Legacy 1004 and 1012 messages
    #[default]
    Legacy,
    /// MSM4 messages for every constellation
    Msm4,
    /// MSM5 messages for every constellation
    Msm5,
}

/// Translates SBP messages into RTCM frames
///
/// Observation epochs arrive fragmented; the session collects a complete
/// sequence before emitting the RTCM observation messages for it.
pub struct Sbp2RtcmSession {
    rtcm_sink: RtcmSink,
    msm_output_mode: MsmOutputMode,
    glo_fcn_map: [Option<i8>; sig_consts::NUM_SATS_GLO as usize + 1],
    leap_seconds: Option<i8>,
    counters: SessionCounters,
    pending_obs: Vec<PackedObsContent>,
    pending_time: Option<SbpGpsTime>,
    pending_sender: u16,
    pending_total: u8,
    pending_next_index: u8,
}

impl Sbp2RtcmSession {
    /// Makes a session emitting RTCM frames into `rtcm_sink`
    #[must_use]
    pub fn new(rtcm_sink: RtcmSink) -> Sbp2RtcmSession {
        Sbp2RtcmSession {
            rtcm_sink,
            msm_output_mode: MsmOutputMode::default(),
            glo_fcn_map: [None; sig_consts::NUM_SATS_GLO as usize + 1],
            leap_seconds: None,
            counters: SessionCounters::default(),
            pending_obs: Vec::new(),
            pending_time: None,
            pending_sender: 0,
            pending_total: 0,
            pending_next_index: 0,
        }
    }

    /// Selects the observation message family to emit
    pub fn set_msm_output_mode(&mut self, mode: MsmOutputMode) {
        self.msm_output_mode = mode;
    }

    /// Supplies the frequency channel number of a GLONASS satellite
    pub fn set_glo_fcn(&mut self, sat: u16, sbp_fcn: u8) {
        if let Some(slot) = self.glo_fcn_map.get_mut(usize::from(sat)) {
            *slot = fcn_from_sbp(sbp_fcn);
        }
    }

    /// Supplies the current GPS-UTC leap second count, needed to place
    /// GLONASS epochs on their day counter
    pub fn set_leap_seconds(&mut self, leap_seconds: Option<i8>) {
        self.leap_seconds = leap_seconds;
    }

    /// Event counters accumulated so far
    #[must_use]
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Drops any half-collected observation epoch
    pub fn reset(&mut self) {
        self.pending_obs.clear();
        self.pending_time = None;
        self.pending_total = 0;
        self.pending_next_index = 0;
    }

    /// Feeds one SBP message into the translator
    pub fn handle_sbp(&mut self, sender_id: u16, msg_type: u16, payload: &[u8]) {
        let result = match msg_type {
            MSG_OBS => self.handle_obs(sender_id, payload),
            MSG_BASE_POS_ECEF => self.handle_base_pos(sender_id, payload),
            MSG_GLO_BIASES => self.handle_glo_biases(sender_id, payload),
            MSG_EPHEMERIS_GPS => MsgEphemerisGps::from_payload(payload)
                .map(|msg| self.handle_ephemeris(SbpEphemeris::Gps(msg))),
            MSG_EPHEMERIS_QZSS => MsgEphemerisGps::from_payload(payload)
                .map(|msg| self.handle_ephemeris(SbpEphemeris::Qzss(msg))),
            MSG_EPHEMERIS_GAL => MsgEphemerisGal::from_payload(payload)
                .map(|msg| self.handle_ephemeris(SbpEphemeris::Gal(msg))),
            MSG_EPHEMERIS_BDS => MsgEphemerisBds::from_payload(payload)
                .map(|msg| self.handle_ephemeris(SbpEphemeris::Bds(msg))),
            MSG_EPHEMERIS_GLO => MsgEphemerisGlo::from_payload(payload)
                .map(|msg| self.handle_ephemeris(SbpEphemeris::Glo(msg))),
            _ => {
                self.counters.messages_ignored += 1;
                return;
            }
        };
        match result {
            Ok(()) => self.counters.messages_handled += 1,
            Err(err) => {
                self.counters.decode_failures += 1;
                log::info!("dropping malformed SBP message {msg_type:#06x}: {err}");
            }
        }
    }

    fn emit_payload(&mut self, payload: &[u8]) {
        let mut framed = [0u8; rtcm::consts::MAX_FRAME_LEN];
        if let Some(len) = frame_payload(payload, &mut framed) {
            (self.rtcm_sink)(&framed[..len]);
        }
    }

    fn handle_obs(&mut self, sender_id: u16, payload: &[u8]) -> Result<(), crate::sbp::SbpError> {
        let msg = MsgObs::from_payload(payload)?;
        let total = msg.header.n_obs >> 4;
        let index = msg.header.n_obs & 0x0F;

        if index == 0 {
            if !self.pending_obs.is_empty() {
                log::debug!("dropping incomplete observation sequence");
            }
            self.pending_obs.clear();
            self.pending_time = Some(msg.header.t);
            self.pending_sender = sender_id;
            self.pending_total = total;
            self.pending_next_index = 0;
        }
        if self.pending_time != Some(msg.header.t)
            || self.pending_total != total
            || self.pending_next_index != index
        {
            /* a fragment went missing, wait for the next sequence start */
            self.pending_obs.clear();
            self.pending_time = None;
            return Ok(());
        }

        self.pending_obs.extend_from_slice(&msg.obs);
        self.pending_next_index += 1;
        if self.pending_next_index == total {
            let time = msg.header.t;
            let sender = self.pending_sender;
            let obs = std::mem::take(&mut self.pending_obs);
            self.pending_time = None;
            self.convert_epoch(sender, time, &obs);
        }
        Ok(())
    }

    fn convert_epoch(&mut self, sender_id: u16, time: SbpGpsTime, obs: &[PackedObsContent]) {
        let stn_id = sender_id & 0x0FFF;
        match self.msm_output_mode {
            MsmOutputMode::Legacy => self.convert_epoch_legacy(stn_id, time, obs),
            MsmOutputMode::Msm4 | MsmOutputMode::Msm5 => {
                self.convert_epoch_msm(stn_id, time, obs);
            }
        }
    }

    fn glo_epoch_tod_ms(&self, tow_ms: u32) -> Option<u32> {
        let leap_seconds = self.leap_seconds?;
        let utc_su_ms = i64::from(tow_ms) - i64::from(leap_seconds) * 1000
            + i64::from(time_consts::UTC_SU_OFFSET_HOURS * time_consts::HOUR_SECS) * 1000;
        let week_ms = i64::from(time_consts::WEEK_MS);
        Some((utc_su_ms.rem_euclid(week_ms) % i64::from(time_consts::DAY_MS)) as u32)
    }

    fn glo_epoch_tow_ms(&self, tow_ms: u32) -> Option<u32> {
        let leap_seconds = self.leap_seconds?;
        let utc_su_ms = i64::from(tow_ms) - i64::from(leap_seconds) * 1000
            + i64::from(time_consts::UTC_SU_OFFSET_HOURS * time_consts::HOUR_SECS) * 1000;
        let week_ms = i64::from(time_consts::WEEK_MS);
        Some(utc_su_ms.rem_euclid(week_ms) as u32)
    }

    fn convert_epoch_legacy(&mut self, stn_id: u16, time: SbpGpsTime, obs: &[PackedObsContent]) {
        let gps_msg = self.collect_legacy_sats(obs, Constellation::Gps, time.tow, stn_id, 1004);
        let glo_msg = self.glo_epoch_tod_ms(time.tow).and_then(|tod_ms| {
            let msg = self.collect_legacy_sats(obs, Constellation::Glo, tod_ms, stn_id, 1012);
            msg
        });

        let mut buf = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        if let Some(mut msg) = gps_msg {
            /* more observations of this epoch follow when GLONASS is there */
            msg.header.sync = glo_msg.is_some();
            if let Ok(len) = rtcm::obs::encode_gps_obs(&msg, &mut buf) {
                self.emit_payload(&buf[..len]);
            }
        }
        if let Some(msg) = glo_msg {
            if let Ok(len) = rtcm::obs::encode_glo_obs(&msg, &mut buf) {
                self.emit_payload(&buf[..len]);
            }
        }
    }

    fn collect_legacy_sats(
        &mut self,
        obs: &[PackedObsContent],
        cons: Constellation,
        tow_ms: u32,
        stn_id: u16,
        msg_num: u16,
    ) -> Option<ObsMessage> {
        let mut sats: Vec<SatData> = Vec::new();
        for content in obs {
            let Ok(code) = Code::try_from(content.sid.code) else {
                self.counters.unsupported_signals += 1;
                continue;
            };
            if code.to_constellation() != cons {
                continue;
            }
            let Some((freq, code_ind)) = legacy_band(code) else {
                continue;
            };
            let flags = content.flags;
            if !flags.contains(PackedObsFlags::CODE_VALID)
                || !flags.contains(PackedObsFlags::PHASE_VALID)
            {
                continue;
            }
            let fcn = if cons == Constellation::Glo {
                let fcn = self
                    .glo_fcn_map
                    .get(usize::from(content.sid.sat))
                    .copied()
                    .flatten();
                if fcn.is_none() {
                    /* the legacy phase field cannot be encoded without the
                     * channel wavelength */
                    continue;
                }
                fcn
            } else {
                None
            };

            let sat = match sats.iter_mut().find(|sat| sat.sat_id == content.sid.sat) {
                Some(sat) => sat,
                None => {
                    sats.push(SatData {
                        sat_id: content.sid.sat,
                        fcn,
                        obs: Default::default(),
                    });
                    sats.last_mut().unwrap()
                }
            };
            let freq_data = &mut sat.obs[freq as usize];
            *freq_data = FreqData {
                code: code_ind,
                pseudorange: f64::from(content.p) / 50.0,
                carrier_phase: f64::from(content.l.i) + f64::from(content.l.f) / 256.0,
                lock: decode_lock_time(content.lock),
                cnr: f64::from(content.cn0) / 4.0,
                flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK,
            };
        }
        if sats.is_empty() {
            return None;
        }
        Some(ObsMessage {
            header: ObsHeader {
                msg_num,
                stn_id,
                tow_ms,
                sync: false,
                div_free: false,
                smooth: 0,
            },
            sats,
        })
    }

    fn convert_epoch_msm(&mut self, stn_id: u16, time: SbpGpsTime, obs: &[PackedObsContent]) {
        /* group the epoch by constellation, mask order */
        let mut groups: Vec<(Constellation, Vec<&PackedObsContent>)> = Vec::new();
        for content in obs {
            let Ok(code) = Code::try_from(content.sid.code) else {
                self.counters.unsupported_signals += 1;
                continue;
            };
            if code_to_msm_signal(code).is_none() {
                self.counters.unsupported_signals += 1;
                continue;
            }
            let cons = code.to_constellation();
            match groups.iter_mut().find(|(existing, _)| *existing == cons) {
                Some((_, list)) => list.push(content),
                None => groups.push((cons, vec![content])),
            }
        }

        let group_count = groups.len();
        for (position, (cons, contents)) in groups.into_iter().enumerate() {
            let multiple = position + 1 < group_count;
            if let Some(msm) = self.build_msm(cons, stn_id, time, &contents, multiple) {
                let mut buf = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
                if let Ok(len) = rtcm::msm::encode_msm(&msm, &mut buf) {
                    self.emit_payload(&buf[..len]);
                }
            }
        }
    }

    fn build_msm(
        &mut self,
        cons: Constellation,
        stn_id: u16,
        time: SbpGpsTime,
        contents: &[&PackedObsContent],
        multiple: bool,
    ) -> Option<MsmMessage> {
        let msm_num = match self.msm_output_mode {
            MsmOutputMode::Msm4 => 4,
            MsmOutputMode::Msm5 => 5,
            MsmOutputMode::Legacy => return None,
        };
        let msg_num = cons.msm_base_msg_num() + msm_num;
        let tow_ms = match cons {
            Constellation::Glo => self.glo_epoch_tow_ms(time.tow)?,
            Constellation::Bds => {
                (time.tow + time_consts::WEEK_MS
                    - time_consts::BDS_SECOND_TO_GPS_SECOND as u32 * 1000)
                    % time_consts::WEEK_MS
            }
            _ => time.tow,
        };

        let mut header = MsmHeader {
            msg_num,
            stn_id,
            tow_ms,
            multiple,
            ..Default::default()
        };

        /* build the masks in index order */
        let mut sat_indices: Vec<u8> = Vec::new();
        let mut sig_indices: Vec<u8> = Vec::new();
        for content in contents {
            let code = Code::try_from(content.sid.code).ok()?;
            let sat_idx = prn_to_msm_sat(cons, content.sid.sat)?;
            let sig_idx = code_to_msm_signal(code)? - 1;
            if !sat_indices.contains(&sat_idx) {
                sat_indices.push(sat_idx);
            }
            if !sig_indices.contains(&sig_idx) {
                sig_indices.push(sig_idx);
            }
        }
        sat_indices.sort_unstable();
        sig_indices.sort_unstable();
        if sat_indices.len() * sig_indices.len() > rtcm::consts::MSM_MAX_CELLS {
            log::warn!("MSM cell mask over-long, dropping {cons} observations");
            return None;
        }
        for &idx in &sat_indices {
            header.satellite_mask[usize::from(idx)] = true;
        }
        for &idx in &sig_indices {
            header.signal_mask[usize::from(idx)] = true;
        }

        let num_sigs = sig_indices.len();
        let mut sats = Vec::with_capacity(sat_indices.len());
        let mut signals = Vec::new();
        for (sat_pos, &sat_idx) in sat_indices.iter().enumerate() {
            let mut rough_range_ms = f64::NAN;
            let mut rough_rate = 0.0f64;
            let mut rate_seen = false;
            let mut fcn = None;
            for (sig_pos, &sig_idx) in sig_indices.iter().enumerate() {
                let Some(content) = contents.iter().find(|content| {
                    prn_to_msm_sat(cons, content.sid.sat) == Some(sat_idx)
                        && Code::try_from(content.sid.code)
                            .ok()
                            .and_then(code_to_msm_signal)
                            == Some(sig_idx + 1)
                }) else {
                    continue;
                };
                header.cell_mask[sat_pos * num_sigs + sig_pos] = true;

                let code = Code::try_from(content.sid.code).ok()?;
                if cons == Constellation::Glo {
                    fcn = fcn.or_else(|| {
                        self.glo_fcn_map
                            .get(usize::from(content.sid.sat))
                            .copied()
                            .flatten()
                    });
                }
                let frequency = if cons == Constellation::Glo {
                    fcn.and_then(|fcn| code.glo_channel_frequency(fcn))
                } else {
                    Some(code.carrier_frequency())
                };

                let pr_m = f64::from(content.p) / 50.0;
                let pr_ms = pr_m / (rtcm::consts::GPS_C / 1e3);
                if rough_range_ms.is_nan() {
                    rough_range_ms = (pr_ms * 1024.0).floor() / 1024.0;
                }

                let mut signal = MsmSignalData {
                    pseudorange_ms: pr_ms,
                    flags: ObsFlags::PR,
                    lock_time_s: decode_lock_time(content.lock),
                    hca_indicator: !content.flags.contains(PackedObsFlags::HALF_CYCLE_KNOWN),
                    cnr: f64::from(content.cn0) / 4.0,
                    ..Default::default()
                };
                signal.flags.insert(ObsFlags::LOCK);
                if content.cn0 != 0 {
                    signal.flags.insert(ObsFlags::CNR);
                }
                if let Some(frequency) = frequency {
                    if content.flags.contains(PackedObsFlags::PHASE_VALID) {
                        let cycles =
                            f64::from(content.l.i) + f64::from(content.l.f) / 256.0;
                        signal.carrier_phase_ms = cycles / frequency * 1e3;
                        signal.flags.insert(ObsFlags::CP);
                    }
                    if content.flags.contains(PackedObsFlags::DOPPLER_VALID) {
                        let hz = f64::from(content.d.i) + f64::from(content.d.f) / 256.0;
                        signal.range_rate_m_s = -hz * rtcm::consts::GPS_C / frequency;
                        signal.flags.insert(ObsFlags::DOP);
                        if !rate_seen {
                            rough_rate = signal.range_rate_m_s.round();
                            rate_seen = true;
                        }
                    }
                }
                signals.push(signal);
            }
            sats.push(MsmSatData {
                glo_fcn: fcn,
                rough_range_ms: if rough_range_ms.is_nan() {
                    0.0
                } else {
                    rough_range_ms
                },
                rough_range_rate_m_s: rough_rate,
            });
        }

        Some(MsmMessage {
            header,
            sats,
            signals,
        })
    }

    fn handle_base_pos(
        &mut self,
        sender_id: u16,
        payload: &[u8],
    ) -> Result<(), crate::sbp::SbpError> {
        let msg = MsgBasePosEcef::from_payload(payload)?;
        let rtcm_msg = Msg1006 {
            msg_1005: Msg1005 {
                stn_id: sender_id & 0x0FFF,
                gps_ind: true,
                glo_ind: true,
                ref_stn_ind: true,
                arp_x: msg.x,
                arp_y: msg.y,
                arp_z: msg.z,
                ..Default::default()
            },
            ant_height: 0.0,
        };
        let mut buf = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        if let Ok(len) = rtcm::station::encode_1006(&rtcm_msg, &mut buf) {
            self.emit_payload(&buf[..len]);
        }
        Ok(())
    }

    fn handle_glo_biases(
        &mut self,
        sender_id: u16,
        payload: &[u8],
    ) -> Result<(), crate::sbp::SbpError> {
        let msg = MsgGloBiases::from_payload(payload)?;
        let rtcm_msg = Msg1230 {
            stn_id: sender_id & 0x0FFF,
            bias_indicator: false,
            fdma_signal_mask: msg.mask & 0x0F,
            l1_ca_bias_m: f64::from(msg.l1ca_bias) / 50.0,
            l1_p_bias_m: f64::from(msg.l1p_bias) / 50.0,
            l2_ca_bias_m: f64::from(msg.l2ca_bias) / 50.0,
            l2_p_bias_m: f64::from(msg.l2p_bias) / 50.0,
        };
        let mut buf = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        if let Ok(len) = rtcm::station::encode_1230(&rtcm_msg, &mut buf) {
            self.emit_payload(&buf[..len]);
        }
        Ok(())
    }

    fn handle_ephemeris(&mut self, sbp_eph: SbpEphemeris) {
        if let SbpEphemeris::Glo(glo) = &sbp_eph {
            if let Some(fcn) = fcn_from_sbp(glo.fcn) {
                if let Some(slot) = self.glo_fcn_map.get_mut(usize::from(glo.common.sid.sat)) {
                    *slot = Some(fcn);
                }
            }
        }
        let Some(eph) = sbp_to_ephemeris(&sbp_eph) else {
            self.counters.decode_failures += 1;
            return;
        };
        let mut buf = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        let encoded = encode_ephemeris(&eph, &mut buf);
        if let Ok(len) = encoded {
            self.emit_payload(&buf[..len]);
        }
    }
}

fn encode_ephemeris(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, rtcm::DecodeError> {
    match eph.msg_num {
        1019 => rtcm::eph::encode_1019(eph, buf),
        1020 => rtcm::eph::encode_1020(eph, buf),
        1042 => rtcm::eph::encode_1042(eph, buf),
        1044 => rtcm::eph::encode_1044(eph, buf),
        1045 => rtcm::eph::encode_1045(eph, buf),
        1046 => rtcm::eph::encode_1046(eph, buf),
        other => Err(rtcm::DecodeError::UnsupportedMessage(other)),
    }
}

/// The band and code indicator a code maps to in the legacy messages
fn legacy_band(code: Code) -> Option<(Freq, u8)> {
    match code {
        Code::GpsL1ca | Code::GloL1of => Some((Freq::L1, 0)),
        Code::GpsL1p | Code::GloL1p => Some((Freq::L1, 1)),
        Code::GpsL2cm | Code::GloL2of => Some((Freq::L2, 0)),
        Code::GpsL2p | Code::GloL2p => Some((Freq::L2, 1)),
        _ => None,
    }
}

fn prn_to_msm_sat(cons: Constellation, sat: u8) -> Option<u8> {
    let first = cons.first_prn() as u8;
    let idx = sat.checked_sub(first)?;
    if usize::from(idx) < rtcm::consts::MSM_SATELLITE_MASK_SIZE {
        Some(idx)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbp::messages::{CarrierPhase, Doppler, ObservationHeader, SbpSignal};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<Vec<u8>>>>;

    fn session() -> (Sbp2RtcmSession, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink_capture = Arc::clone(&captured);
        let session = Sbp2RtcmSession::new(Box::new(move |frame| {
            sink_capture.lock().unwrap().push(frame.to_vec());
        }));
        (session, captured)
    }

    fn example_obs() -> MsgObs {
        MsgObs {
            header: ObservationHeader {
                t: SbpGpsTime {
                    tow: 341_562_000,
                    ns_residual: 0,
                    wn: 2190,
                },
                n_obs: 0x10,
            },
            obs: vec![PackedObsContent {
                p: 1_017_977_291,
                l: CarrierPhase {
                    i: 106_990_181,
                    f: 170,
                },
                d: Doppler { i: -890, f: 145 },
                cn0: 146,
                lock: 10,
                flags: PackedObsFlags::from_bits_truncate(15),
                sid: SbpSignal { sat: 3, code: 0 },
            }],
        }
    }

    fn unframe(frame: &[u8]) -> Vec<u8> {
        assert_eq!(frame[0], 0xD3);
        let len = ((usize::from(frame[1]) & 0x03) << 8) | usize::from(frame[2]);
        frame[3..3 + len].to_vec()
    }

    #[test]
    fn obs_to_msm5() {
        let (mut session, captured) = session();
        session.set_msm_output_mode(MsmOutputMode::Msm5);
        let msg = example_obs();
        session.handle_sbp(0xF00D, MSG_OBS, &msg.to_payload());

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let payload = unframe(&captured[0]);
        let decoded = rtcm::msm::decode_msm(&payload).unwrap();
        assert_eq!(decoded.header.msg_num, 1075);
        assert_eq!(decoded.header.stn_id, 0x000D);
        assert_eq!(decoded.header.tow_ms, 341_562_000);
        assert!(!decoded.header.multiple);
        assert_eq!(decoded.signals.len(), 1);
        let signal = &decoded.signals[0];
        assert!(signal.flags.contains(ObsFlags::PR));
        assert!(signal.flags.contains(ObsFlags::CP));
        assert!(signal.flags.contains(ObsFlags::DOP));
    }

    #[test]
    fn obs_to_legacy_1004() {
        let (mut session, captured) = session();
        let msg = example_obs();
        session.handle_sbp(0xF00D, MSG_OBS, &msg.to_payload());

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let payload = unframe(&captured[0]);
        let decoded = rtcm::obs::decode_gps_obs(&payload).unwrap();
        assert_eq!(decoded.header.msg_num, 1004);
        assert_eq!(decoded.header.tow_ms, 341_562_000);
        assert!(!decoded.header.sync);
        assert_eq!(decoded.sats.len(), 1);
        assert_eq!(decoded.sats[0].sat_id, 3);
        float_eq::assert_float_eq!(
            decoded.sats[0].obs[0].pseudorange,
            1_017_977_291.0 / 50.0,
            abs <= 0.02
        );
    }

    #[test]
    fn fragmented_epoch_collected() {
        let (mut session, captured) = session();
        let mut first = example_obs();
        first.header.n_obs = 0x20;
        let mut second = example_obs();
        second.header.n_obs = 0x21;
        second.obs[0].sid.sat = 4;

        session.handle_sbp(0xF00D, MSG_OBS, &first.to_payload());
        assert!(captured.lock().unwrap().is_empty());
        session.handle_sbp(0xF00D, MSG_OBS, &second.to_payload());

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let decoded = rtcm::obs::decode_gps_obs(&unframe(&captured[0])).unwrap();
        assert_eq!(decoded.sats.len(), 2);
    }

    #[test]
    fn missing_fragment_drops_epoch() {
        let (mut session, captured) = session();
        let mut first = example_obs();
        first.header.n_obs = 0x30;
        let mut third = example_obs();
        third.header.n_obs = 0x32;

        session.handle_sbp(0xF00D, MSG_OBS, &first.to_payload());
        session.handle_sbp(0xF00D, MSG_OBS, &third.to_payload());
        assert!(captured.lock().unwrap().is_empty());
    }

    #[test]
    fn glo_obs_needs_fcn_and_leap() {
        let (mut session, captured) = session();
        let mut msg = example_obs();
        msg.obs[0].sid = SbpSignal { sat: 2, code: 3 };

        /* without leap seconds or an FCN nothing can go out */
        session.handle_sbp(0xF00D, MSG_OBS, &msg.to_payload());
        assert!(captured.lock().unwrap().is_empty());

        session.set_leap_seconds(Some(18));
        session.set_glo_fcn(2, 4 + 8);
        session.handle_sbp(0xF00D, MSG_OBS, &msg.to_payload());
        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let decoded = rtcm::obs::decode_glo_obs(&unframe(&captured[0])).unwrap();
        assert_eq!(decoded.header.msg_num, 1012);
        assert_eq!(decoded.sats[0].fcn, Some(4));
    }

    #[test]
    fn base_pos_to_1006() {
        let (mut session, captured) = session();
        let msg = MsgBasePosEcef {
            x: 3_771_793.9685,
            y: 140_253.3547,
            z: 5_124_304.3516,
        };
        session.handle_sbp(0xF01F, MSG_BASE_POS_ECEF, &msg.to_payload());
        let captured = captured.lock().unwrap();
        let decoded = rtcm::station::decode_1006(&unframe(&captured[0])).unwrap();
        assert_eq!(decoded.msg_1005.stn_id, 0x001F);
        float_eq::assert_float_eq!(decoded.msg_1005.arp_x, 3_771_793.9685, abs <= 0.000_05);
    }

    #[test]
    fn glo_biases_to_1230() {
        let (mut session, captured) = session();
        let msg = MsgGloBiases {
            mask: 0x9,
            l1ca_bias: 115,
            l1p_bias: 0,
            l2ca_bias: 0,
            l2p_bias: -357,
        };
        session.handle_sbp(0xF001, MSG_GLO_BIASES, &msg.to_payload());
        let captured = captured.lock().unwrap();
        let decoded = rtcm::station::decode_1230(&unframe(&captured[0])).unwrap();
        assert_eq!(decoded.fdma_signal_mask, 0x9);
        float_eq::assert_float_eq!(decoded.l1_ca_bias_m, 2.3, abs <= 0.01);
    }

    #[test]
    fn gps_ephemeris_round_trips_to_1019() {
        use crate::sbp::messages::{EphemerisCommon, GpsTimeSec};

        let (mut session, captured) = session();
        let eph = MsgEphemerisGps {
            common: EphemerisCommon {
                sid: SbpSignal { sat: 25, code: 0 },
                toe: GpsTimeSec {
                    tow: 463_104,
                    wn: 2195,
                },
                ura: 2.8,
                fit_interval: 14_400,
                valid: 1,
                health_bits: 0,
            },
            ecc: 0.0115966796875,
            sqrta: 5153.6396484375,
            toc: GpsTimeSec {
                tow: 463_104,
                wn: 2195,
            },
            iode: 250,
            iodc: 250,
            ..Default::default()
        };
        session.handle_sbp(0xF001, MSG_EPHEMERIS_GPS, &eph.to_payload());
        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let decoded = rtcm::eph::decode_1019(&unframe(&captured[0])).unwrap();
        assert_eq!(decoded.sat_id, 25);
        assert_eq!(decoded.toe, 463_104 / 16);
        assert_eq!(decoded.wn, 2195 % 1024);
    }
}
