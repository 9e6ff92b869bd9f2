// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! The RTCM to SBP translator session

use std::collections::HashSet;
use std::sync::Arc;

use super::{
    assembler::{ObsAssembler, PushOutcome},
    biases::{glo_biases_from_1033, glo_biases_from_1230},
    eph::ephemeris_to_sbp,
    ssr::SsrPairingCache,
    stn_to_sbp_sender_id,
    time_resolution::TimeResolver,
    BaseObsInvalidCallback, SbpSink, SessionCounters, UnixTimeCallback, BASE_FUTURE_THRESHOLD,
};
use crate::rtcm::{
    self,
    eph::EphemerisData,
    frame::FrameScanner,
    msm::{msm_signal_to_code, MsmMessage},
    obs::{Freq, ObsFlags, ObsMessage},
    swift::{stgsv_field_mask, Msg999, Msg999Stgsv, STGSV_AZ_NOT_VALID, STGSV_CN0_NOT_VALID, STGSV_EL_NOT_VALID},
    DecodeError, Message,
};
use crate::sbp::messages::{
    CarrierPhase, Doppler, MeasurementState, MsgBasePosEcef, MsgLog, MsgMeasurementState,
    MsgObs, MsgSvAzEl, PackedObsContent, PackedObsFlags, SbpGpsTime, SbpSignal, SvAzEl,
    LOG_LEVEL_INFO, MSG_LOG, MSG_OBS,
};
use crate::signal::{consts as sig_consts, Code, Constellation, GnssSignal};
use crate::time::{
    bds_tow_to_gps_tow_ms, consts as time_consts, gps_time_from_mjd, resolve_glo_tod,
    resolve_gps_tow, GpsTime,
};
use crate::time_truth::{
    EphemerisTimeEstimator, ObservationTimeEstimator, Rtcm1013TimeEstimator, Source, TimeTruth,
};

/// Pseudorange resolution of an SBP observation, steps per meter
const OBS_P_MULTIPLIER: f64 = 50.0;
/// CN0 resolution of an SBP observation, steps per dB-Hz
const OBS_CN0_MULTIPLIER: f64 = 4.0;
/// How long a received 1230 keeps the receiver-descriptor bias defaults
/// suppressed, seconds
const MSG_1230_TIMEOUT_SECS: f64 = 30.0;

/// Translates one RTCM byte stream into SBP messages
///
/// Decoding is fire-and-forget per message: a malformed payload costs that
/// message, never the session. Errors surface through [`SessionCounters`]
/// and rate-limited log lines.
pub struct Rtcm2SbpSession {
    scanner: FrameScanner,
    assembler: ObsAssembler,
    resolver: TimeResolver,
    ssr_cache: SsrPairingCache,
    sbp_sink: SbpSink,
    base_obs_invalid_cb: Option<BaseObsInvalidCallback>,
    counters: SessionCounters,
    /// PRN to FCN map fed by ephemerides, MSM satellite info and the caller
    glo_fcn_map: [Option<i8>; sig_consts::NUM_SATS_GLO as usize + 1],
    obs_estimator: Option<ObservationTimeEstimator>,
    eph_estimator: Option<EphemerisTimeEstimator>,
    rtcm_1013_estimator: Option<Rtcm1013TimeEstimator>,
    last_gps_time: Option<GpsTime>,
    last_1230_time: Option<GpsTime>,
    /* one-shot warning latches */
    warned_compact_msm: bool,
    warned_missing_time: bool,
    warned_buffer_full: bool,
    warned_codes: HashSet<(Constellation, u8)>,
}

impl Rtcm2SbpSession {
    /// Makes a session emitting SBP messages into `sbp_sink`
    #[must_use]
    pub fn new(sbp_sink: SbpSink) -> Rtcm2SbpSession {
        Rtcm2SbpSession {
            scanner: FrameScanner::new(),
            assembler: ObsAssembler::new(),
            resolver: TimeResolver::new(),
            ssr_cache: SsrPairingCache::new(),
            sbp_sink,
            base_obs_invalid_cb: None,
            counters: SessionCounters::default(),
            glo_fcn_map: [None; sig_consts::NUM_SATS_GLO as usize + 1],
            obs_estimator: None,
            eph_estimator: None,
            rtcm_1013_estimator: None,
            last_gps_time: None,
            last_1230_time: None,
            warned_compact_msm: false,
            warned_missing_time: false,
            warned_buffer_full: false,
            warned_codes: HashSet::new(),
        }
    }

    /// Overrides the current time, disabling all other time sources
    pub fn set_time(&mut self, time: Option<GpsTime>, leap_seconds: Option<i8>) {
        self.resolver.set_user_time(time);
        self.resolver.set_user_leap_seconds(leap_seconds);
    }

    /// Whether the session is running on user-supplied time
    #[must_use]
    pub fn is_using_user_provided_time(&self) -> bool {
        self.resolver.using_user_time()
    }

    /// Installs the unix wall clock callback
    pub fn set_unix_time_callback(&mut self, callback: UnixTimeCallback) {
        self.resolver.set_unix_time_callback(callback);
    }

    /// Anchors MJD and constellation week rollovers
    pub fn set_gps_week_reference(&mut self, wn: u16) {
        self.resolver.set_gps_week_reference(wn);
    }

    /// Connects the session to a time truth as one of its sources
    ///
    /// Requests the observation, ephemeris and 1013 estimator slots of
    /// `source`; returns false when any slot was already taken.
    pub fn set_time_truth(&mut self, time_truth: &Arc<TimeTruth>, source: Source) -> bool {
        let obs = time_truth.request_observation_estimator(source);
        let eph = time_truth.request_ephemeris_estimator(source);
        let rtcm_1013 = time_truth.request_rtcm_1013_estimator(source);
        if obs.is_none() || eph.is_none() || rtcm_1013.is_none() {
            log::warn!("time truth estimators for {source} already in use");
            return false;
        }
        self.obs_estimator = obs;
        self.eph_estimator = eph;
        self.rtcm_1013_estimator = rtcm_1013;
        self.resolver.set_time_truth(Arc::clone(time_truth));
        true
    }

    /// Supplies the frequency channel number of a GLONASS satellite
    ///
    /// `sbp_fcn` uses the SBP convention, 1 to 14 with 0 marking unknown.
    pub fn set_glo_fcn(&mut self, sat: u16, sbp_fcn: u8) {
        if let Some(slot) = self.glo_fcn_map.get_mut(usize::from(sat)) {
            *slot = crate::signal::fcn_from_sbp(sbp_fcn);
        }
    }

    /// Installs the base observation sanity callback
    pub fn set_base_obs_invalid_callback(&mut self, callback: BaseObsInvalidCallback) {
        self.base_obs_invalid_cb = Some(callback);
    }

    /// Event counters accumulated so far
    #[must_use]
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// The current GPS time as the session resolves it
    pub fn resolved_gps_time(&mut self) -> Option<GpsTime> {
        self.resolver.gps_time()
    }

    /// The current leap second count as the session resolves it
    pub fn resolved_leap_seconds(&mut self) -> Option<i8> {
        self.resolver.leap_seconds()
    }

    /// Pulls bytes from the read callback and translates what arrives
    ///
    /// Returns the callback's byte count; zero or negative means EOF or
    /// error and nothing was processed.
    pub fn process(&mut self, read_stream: &mut dyn FnMut(&mut [u8]) -> isize) -> isize {
        let mut buf = [0u8; 512];
        let bytes_read = read_stream(&mut buf);
        if bytes_read <= 0 {
            return bytes_read;
        }
        self.push_bytes(&buf[..bytes_read as usize]);
        bytes_read
    }

    /// Feeds raw stream bytes and translates every complete frame found
    pub fn push_bytes(&mut self, data: &[u8]) {
        let mut offered = data;
        loop {
            let taken = self.scanner.push_bytes(offered);
            self.drain_frames();
            if taken == offered.len() {
                break;
            }
            offered = &offered[taken..];
        }
    }

    /// Drops all buffered state: FIFO contents, half-assembled epochs,
    /// pairing slots and cached times
    pub fn reset(&mut self) {
        self.scanner.reset();
        self.assembler.reset();
        self.resolver.reset();
        self.ssr_cache.reset();
        self.last_gps_time = None;
        self.last_1230_time = None;
    }

    fn drain_frames(&mut self) {
        let mut payload = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        while let Some(len) = self.scanner.next_frame(&mut payload) {
            self.handle_payload(&payload[..len]);
        }
    }

    fn handle_payload(&mut self, payload: &[u8]) {
        self.resolver.new_frame();
        match rtcm::decode_payload(payload) {
            Ok(message) => {
                self.counters.messages_handled += 1;
                self.convert(message);
            }
            Err(DecodeError::UnsupportedMessage(_)) => {
                /* expected in mixed streams */
                self.counters.messages_ignored += 1;
            }
            Err(DecodeError::UnsupportedMsm(msg_num)) => {
                self.counters.messages_ignored += 1;
                if !self.warned_compact_msm {
                    self.warned_compact_msm = true;
                    log::warn!("MSM1-3 messages are not supported, dropping {msg_num}");
                }
            }
            Err(err) => {
                self.counters.decode_failures += 1;
                log::info!("dropping malformed RTCM message: {err}");
            }
        }
    }

    fn convert(&mut self, message: Message) {
        match message {
            Message::GpsObs(obs) => self.handle_gps_obs(&obs),
            Message::GloObs(obs) => self.handle_glo_obs(&obs),
            Message::Msm(msm) => self.handle_msm(&msm),
            Message::BasePosition(msg) => {
                let base = MsgBasePosEcef {
                    x: msg.arp_x,
                    y: msg.arp_y,
                    z: msg.arp_z,
                };
                self.emit(
                    stn_to_sbp_sender_id(msg.stn_id),
                    MsgBasePosEcef::MSG_TYPE,
                    &base.to_payload(),
                );
            }
            Message::BasePositionHeight(msg) => {
                let base = MsgBasePosEcef {
                    x: msg.msg_1005.arp_x,
                    y: msg.msg_1005.arp_y,
                    z: msg.msg_1005.arp_z,
                };
                self.emit(
                    stn_to_sbp_sender_id(msg.msg_1005.stn_id),
                    MsgBasePosEcef::MSG_TYPE,
                    &base.to_payload(),
                );
            }
            Message::AntennaDescriptor(_) | Message::AntennaDescriptorSerial(_) => {
                /* descriptors have no SBP counterpart */
            }
            Message::SystemParameters(msg) => self.handle_1013(&msg),
            Message::Ephemeris(eph) => self.handle_ephemeris(&eph),
            Message::Text(msg) => {
                let log_msg = MsgLog {
                    level: LOG_LEVEL_INFO,
                    text: String::from_utf8_lossy(&msg.utf8_code_units).into_owned(),
                };
                self.emit(
                    stn_to_sbp_sender_id(msg.stn_id),
                    MSG_LOG,
                    &log_msg.to_payload(),
                );
            }
            Message::ReceiverInfo(msg) => {
                /* the base's own 1230 is authoritative; only fall back to
                 * receiver-descriptor defaults while none is coming in */
                if self.recent_1230() {
                    return;
                }
                if let Some(biases) = glo_biases_from_1033(&msg) {
                    self.emit(
                        stn_to_sbp_sender_id(msg.stn_id),
                        crate::sbp::messages::MSG_GLO_BIASES,
                        &biases.to_payload(),
                    );
                }
            }
            Message::GloBiases(msg) => {
                self.last_1230_time = self.reference_time();
                let biases = glo_biases_from_1230(&msg);
                self.emit(
                    stn_to_sbp_sender_id(msg.stn_id),
                    crate::sbp::messages::MSG_GLO_BIASES,
                    &biases.to_payload(),
                );
            }
            Message::Ssr(msg) => {
                let Some(now) = self.reference_time() else {
                    self.note_missing_time();
                    return;
                };
                let leap_seconds = self.resolver.leap_seconds();
                let outputs = self.ssr_cache.handle(&msg, &now, leap_seconds);
                for output in outputs {
                    self.emit(
                        stn_to_sbp_sender_id(0),
                        output.msg_type(),
                        &output.to_payload(),
                    );
                }
            }
            Message::Proprietary999(Msg999::Stgsv(msg)) => self.handle_stgsv(&msg),
            Message::Proprietary999(_) => {
                /* restart and auxiliary records carry no observation data */
            }
            Message::WrappedSbp(msg) => {
                /* the embedded frame goes out untouched */
                self.emit(msg.sender_id, msg.msg_type, &msg.data);
            }
            Message::NavDataFrames(_) => {
                /* carried opaque, nothing to translate */
            }
        }
    }

    fn emit(&mut self, sender_id: u16, msg_type: u16, payload: &[u8]) {
        (self.sbp_sink)(sender_id, msg_type, payload);
    }

    fn emit_obs(&mut self, sender_id: u16, messages: Vec<MsgObs>) {
        for message in messages {
            self.emit(sender_id, MSG_OBS, &message.to_payload());
        }
    }

    /// The time used to disambiguate wire time stamps: the resolver's, or
    /// failing that the time of the last translated epoch
    fn reference_time(&mut self) -> Option<GpsTime> {
        self.resolver.gps_time().or(self.last_gps_time)
    }

    fn recent_1230(&mut self) -> bool {
        match (self.reference_time(), &self.last_1230_time) {
            (Some(now), Some(last)) => now.diff(last).abs() < MSG_1230_TIMEOUT_SECS,
            /* with no time base at all, seeing any 1230 counts */
            (None, Some(_)) => true,
            _ => false,
        }
    }

    fn note_missing_time(&mut self) {
        self.counters.time_unresolved += 1;
        if !self.warned_missing_time {
            self.warned_missing_time = true;
            log::warn!("no time source available yet, dropping time-dependent messages");
        }
    }

    fn note_unsupported_code(&mut self, cons: Constellation, signal_id: u8) {
        self.counters.unsupported_signals += 1;
        if self.warned_codes.insert((cons, signal_id)) {
            log::warn!("unsupported {cons} signal id {signal_id}, dropping observations");
        }
    }

    fn note_buffer_full(&mut self) {
        self.counters.buffer_overflows += 1;
        if !self.warned_buffer_full {
            self.warned_buffer_full = true;
            log::warn!("observation buffer full, dropping the remainder of the epoch");
        }
    }

    fn validate_base_obs_sanity(&mut self, now: &GpsTime, obs_time: &GpsTime) {
        let timediff = now.diff(obs_time);
        if timediff >= BASE_FUTURE_THRESHOLD.as_secs_f64() {
            if let Some(callback) = self.base_obs_invalid_cb.as_mut() {
                callback(timediff);
            }
        }
    }

    fn note_epoch(&mut self, obs_time: &GpsTime) {
        if let Some(estimator) = self.obs_estimator.as_mut() {
            estimator.push(obs_time.tow_ms());
        }
        match &self.last_gps_time {
            Some(last) if obs_time.diff(last) <= 0.5 / f64::from(time_consts::SECS_MS) => {}
            _ => self.last_gps_time = Some(*obs_time),
        }
    }

    fn handle_gps_obs(&mut self, obs: &ObsMessage) {
        /* without the ambiguity extension the pseudorange is modulo one
         * light millisecond and of no use downstream */
        if obs.header.msg_num != 1002 && obs.header.msg_num != 1004 {
            return;
        }
        let Some(now) = self.reference_time() else {
            self.note_missing_time();
            return;
        };
        let Ok(obs_time) = resolve_gps_tow(obs.header.tow_ms, &now) else {
            self.note_missing_time();
            return;
        };
        if self.assembler.msm_active(&obs_time) {
            /* the stream speaks MSM, the legacy copies are duplicates */
            return;
        }
        self.note_epoch(&obs_time);
        self.validate_base_obs_sanity(&now, &obs_time);

        let sender_id = stn_to_sbp_sender_id(obs.header.stn_id);
        let (old_sender, flushed) =
            self.assembler
                .begin_epoch(to_sbp_gps_time(&obs_time), sender_id, false);
        self.emit_obs(old_sender, flushed);

        for sat in &obs.sats {
            for freq in [Freq::L1, Freq::L2] {
                let freq_data = &sat.obs[freq as usize];
                if !freq_data.flags.contains(ObsFlags::PR)
                    || !freq_data.flags.contains(ObsFlags::CP)
                {
                    continue;
                }
                let sid = if (1..=32).contains(&sat.sat_id) {
                    SbpSignal {
                        sat: sat.sat_id,
                        code: gps_code(freq, freq_data.code).to_sbp(),
                    }
                } else if (40..=58).contains(&sat.sat_id) && freq == Freq::L1 {
                    /* SBAS PRNs ride in the GPS message, offset by 80 */
                    SbpSignal {
                        sat: sat.sat_id + 80,
                        code: Code::SbasL1ca.to_sbp(),
                    }
                } else {
                    continue;
                };
                let content = pack_legacy_obs(freq_data, sid);
                self.push_obs(content);
            }
        }
        if !obs.header.sync {
            let sender = self.assembler.sender_id();
            let flushed = self.assembler.flush();
            self.emit_obs(sender, flushed);
        }
    }

    fn handle_glo_obs(&mut self, obs: &ObsMessage) {
        let Some(now) = self.reference_time() else {
            self.note_missing_time();
            return;
        };
        let Some(leap_seconds) = self.resolver.leap_seconds() else {
            self.note_missing_time();
            return;
        };
        let Ok(obs_time) = resolve_glo_tod(obs.header.tow_ms, &now, leap_seconds) else {
            self.note_missing_time();
            return;
        };
        if self.assembler.msm_active(&obs_time) {
            return;
        }
        self.note_epoch(&obs_time);
        self.validate_base_obs_sanity(&now, &obs_time);

        let sender_id = stn_to_sbp_sender_id(obs.header.stn_id);
        let (old_sender, flushed) =
            self.assembler
                .begin_epoch(to_sbp_gps_time(&obs_time), sender_id, false);
        self.emit_obs(old_sender, flushed);

        for sat in &obs.sats {
            if !(1..=24).contains(&sat.sat_id) {
                continue;
            }
            if let Some(fcn) = sat.fcn {
                self.glo_fcn_map[usize::from(sat.sat_id)] = Some(fcn);
            }
            for freq in [Freq::L1, Freq::L2] {
                let freq_data = &sat.obs[freq as usize];
                if !freq_data.flags.contains(ObsFlags::PR)
                    || !freq_data.flags.contains(ObsFlags::CP)
                {
                    continue;
                }
                let sid = SbpSignal {
                    sat: sat.sat_id,
                    code: glo_code(freq, freq_data.code).to_sbp(),
                };
                let content = pack_legacy_obs(freq_data, sid);
                self.push_obs(content);
            }
        }
        if !obs.header.sync {
            let sender = self.assembler.sender_id();
            let flushed = self.assembler.flush();
            self.emit_obs(sender, flushed);
        }
    }

    fn handle_msm(&mut self, msm: &MsmMessage) {
        let Some(cons) = msm.header.constellation() else {
            return;
        };
        let Some(now) = self.reference_time() else {
            self.note_missing_time();
            return;
        };

        let obs_time = match cons {
            Constellation::Glo => {
                let Some(leap_seconds) = self.resolver.leap_seconds() else {
                    self.note_missing_time();
                    return;
                };
                let tod_ms = msm.header.tow_ms % time_consts::DAY_MS;
                match resolve_glo_tod(tod_ms, &now, leap_seconds) {
                    Ok(time) => time,
                    Err(_) => {
                        self.note_missing_time();
                        return;
                    }
                }
            }
            Constellation::Bds => {
                match resolve_gps_tow(bds_tow_to_gps_tow_ms(msm.header.tow_ms), &now) {
                    Ok(time) => time,
                    Err(_) => {
                        self.note_missing_time();
                        return;
                    }
                }
            }
            _ => match resolve_gps_tow(msm.header.tow_ms, &now) {
                Ok(time) => time,
                Err(_) => {
                    self.note_missing_time();
                    return;
                }
            },
        };

        self.note_epoch(&obs_time);
        self.validate_base_obs_sanity(&now, &obs_time);
        if self.assembler.note_msm_received(obs_time) {
            log::debug!("discarding buffered legacy observations, MSM took over");
        }

        let sender_id = stn_to_sbp_sender_id(msm.header.stn_id);
        let (old_sender, flushed) =
            self.assembler
                .begin_epoch(to_sbp_gps_time(&obs_time), sender_id, true);
        self.emit_obs(old_sender, flushed);

        let mut contents = Vec::with_capacity(msm.signals.len());
        let mut unsupported = Vec::new();
        for (sat_idx, sig_idx, sat, signal) in msm.cells() {
            let signal_id = sig_idx + 1;
            let Some(code) = msm_signal_to_code(cons, signal_id) else {
                unsupported.push(signal_id);
                continue;
            };
            if !signal.flags.contains(ObsFlags::PR) {
                continue;
            }
            let prn = msm_sat_to_prn(cons, sat_idx);

            /* the channel number can come from the satellite info field, an
             * earlier ephemeris, or the caller */
            let fcn = if cons == Constellation::Glo {
                sat.glo_fcn
                    .or_else(|| self.glo_fcn_map.get(usize::from(sat_idx) + 1).copied().flatten())
            } else {
                None
            };
            let frequency = if cons == Constellation::Glo {
                fcn.and_then(|fcn| code.glo_channel_frequency(fcn))
            } else {
                Some(code.carrier_frequency())
            };

            let pr_m = signal.pseudorange_ms * rtcm::consts::GPS_C / 1e3;
            let mut flags = PackedObsFlags::CODE_VALID;
            let mut carrier = CarrierPhase::default();
            let mut doppler = Doppler::default();
            if let Some(frequency) = frequency {
                if signal.flags.contains(ObsFlags::CP) {
                    let cycles = signal.carrier_phase_ms * frequency / 1e3;
                    carrier = pack_carrier_phase(cycles);
                    flags |= PackedObsFlags::PHASE_VALID;
                    if !signal.hca_indicator {
                        flags |= PackedObsFlags::HALF_CYCLE_KNOWN;
                    }
                }
                if signal.flags.contains(ObsFlags::DOP) {
                    let hz = -signal.range_rate_m_s * frequency / rtcm::consts::GPS_C;
                    doppler = pack_doppler(hz);
                    flags |= PackedObsFlags::DOPPLER_VALID;
                }
            }

            contents.push(PackedObsContent {
                p: (pr_m * OBS_P_MULTIPLIER).round() as u32,
                l: carrier,
                d: doppler,
                cn0: if signal.flags.contains(ObsFlags::CNR) {
                    (signal.cnr * OBS_CN0_MULTIPLIER).round() as u8
                } else {
                    0
                },
                lock: crate::rtcm::obs::encode_lock_time(signal.lock_time_s),
                flags,
                sid: SbpSignal {
                    sat: prn as u8,
                    code: code.to_sbp(),
                },
            });
        }
        for signal_id in unsupported {
            self.note_unsupported_code(cons, signal_id);
        }
        for content in contents {
            self.push_obs(content);
        }

        if !msm.header.multiple {
            let sender = self.assembler.sender_id();
            let flushed = self.assembler.flush();
            self.emit_obs(sender, flushed);
        }
    }

    fn push_obs(&mut self, content: PackedObsContent) {
        match self.assembler.push(content) {
            PushOutcome::Added | PushOutcome::Duplicate => {}
            PushOutcome::Full => self.note_buffer_full(),
        }
    }

    fn handle_1013(&mut self, msg: &crate::rtcm::station::Msg1013) {
        if !msg.leap_second_known() {
            return;
        }
        let leap_seconds = msg.leap_second as i8;
        let time = gps_time_from_mjd(
            msg.mjd,
            msg.utc,
            leap_seconds,
            self.resolver.gps_week_reference(),
        );
        self.resolver.record_rtcm_1013(time, leap_seconds);
        if let Some(estimator) = self.rtcm_1013_estimator.as_mut() {
            estimator.push(time, leap_seconds);
        }
    }

    fn handle_ephemeris(&mut self, eph: &crate::rtcm::Ephemeris) {
        if let EphemerisData::Glo(glo) = &eph.data {
            if let Some(fcn) = glo.fcn {
                if let Some(slot) = self.glo_fcn_map.get_mut(usize::from(eph.sat_id)) {
                    *slot = Some(fcn);
                }
            }
        }

        let Some(now) = self.reference_time() else {
            self.note_missing_time();
            return;
        };
        let leap_seconds = self.resolver.leap_seconds();
        let Some(sbp_eph) = ephemeris_to_sbp(eph, &now, leap_seconds) else {
            self.counters.decode_failures += 1;
            return;
        };

        if let Some(estimator) = self.eph_estimator.as_mut() {
            let sid = sbp_eph.sid();
            let toe = sbp_eph.toe();
            if let Ok(signal) = GnssSignal::from_sbp(sid.sat, sid.code) {
                if let Ok(time) = GpsTime::new(toe.wn as i16, f64::from(toe.tow)) {
                    estimator.push(signal, time);
                }
            }
        }

        self.emit(
            stn_to_sbp_sender_id(0),
            sbp_eph.msg_type(),
            &sbp_eph.to_payload(),
        );
    }

    fn handle_stgsv(&mut self, msg: &Msg999Stgsv) {
        let Some(cons) = teseov_constellation(msg.constellation) else {
            return;
        };
        let mut azel = Vec::new();
        let mut states = Vec::new();
        for value in &msg.field_value {
            let Some(prn) = teseov_sat_to_prn(cons, value.sat_id) else {
                continue;
            };
            let sid = SbpSignal {
                sat: prn,
                code: band_code(cons, 0).to_sbp(),
            };
            if msg.field_mask & stgsv_field_mask::EL != 0
                && msg.field_mask & stgsv_field_mask::AZ != 0
                && value.el != STGSV_EL_NOT_VALID
                && value.az != STGSV_AZ_NOT_VALID
            {
                azel.push(SvAzEl {
                    sid,
                    az: (value.az / 2) as u8,
                    el: value.el,
                });
            }
            for (band, cn0) in [value.cn0_b1, value.cn0_b2, value.cn0_b3]
                .into_iter()
                .enumerate()
            {
                let mask_bit = stgsv_field_mask::CN0_B1 << band;
                if msg.field_mask & mask_bit != 0 && cn0 != STGSV_CN0_NOT_VALID {
                    states.push(MeasurementState {
                        mesid: SbpSignal {
                            sat: prn,
                            code: band_code(cons, band).to_sbp(),
                        },
                        cn0,
                    });
                }
            }
        }

        let sender_id = stn_to_sbp_sender_id(0);
        if !azel.is_empty() {
            let msg = MsgSvAzEl { azel };
            self.emit(sender_id, MsgSvAzEl::MSG_TYPE, &msg.to_payload());
        }
        if !states.is_empty() {
            let msg = MsgMeasurementState { states };
            self.emit(sender_id, MsgMeasurementState::MSG_TYPE, &msg.to_payload());
        }
    }
}

fn to_sbp_gps_time(time: &GpsTime) -> SbpGpsTime {
    SbpGpsTime {
        tow: time.tow_ms(),
        ns_residual: 0,
        wn: time.wn() as u16,
    }
}

fn pack_carrier_phase(cycles: f64) -> CarrierPhase {
    let mut whole = cycles.floor();
    let mut frac = ((cycles - whole) * 256.0).round();
    if frac >= 256.0 {
        frac = 0.0;
        whole += 1.0;
    }
    CarrierPhase {
        i: whole as i32,
        f: frac as u8,
    }
}

fn pack_doppler(hz: f64) -> Doppler {
    let mut whole = hz.floor();
    let mut frac = ((hz - whole) * 256.0).round();
    if frac >= 256.0 {
        frac = 0.0;
        whole += 1.0;
    }
    Doppler {
        i: whole as i16,
        f: frac as u8,
    }
}

fn pack_legacy_obs(
    freq_data: &crate::rtcm::obs::FreqData,
    sid: SbpSignal,
) -> PackedObsContent {
    let flags =
        PackedObsFlags::CODE_VALID | PackedObsFlags::PHASE_VALID | PackedObsFlags::HALF_CYCLE_KNOWN;
    let cn0 = if freq_data.flags.contains(ObsFlags::CNR) {
        (freq_data.cnr * OBS_CN0_MULTIPLIER).round() as u8
    } else {
        0
    };
    PackedObsContent {
        p: (freq_data.pseudorange * OBS_P_MULTIPLIER).round() as u32,
        l: pack_carrier_phase(freq_data.carrier_phase),
        d: Doppler::default(),
        cn0,
        lock: crate::rtcm::obs::encode_lock_time(freq_data.lock),
        flags,
        sid,
    }
}

fn gps_code(freq: Freq, code_ind: u8) -> Code {
    match freq {
        Freq::L1 => {
            if code_ind == 0 {
                Code::GpsL1ca
            } else {
                Code::GpsL1p
            }
        }
        Freq::L2 => {
            if code_ind == 0 {
                Code::GpsL2cm
            } else {
                Code::GpsL2p
            }
        }
    }
}

fn glo_code(freq: Freq, code_ind: u8) -> Code {
    match freq {
        Freq::L1 => {
            if code_ind == 0 {
                Code::GloL1of
            } else {
                Code::GloL1p
            }
        }
        Freq::L2 => {
            if code_ind == 0 {
                Code::GloL2of
            } else {
                Code::GloL2p
            }
        }
    }
}

fn msm_sat_to_prn(cons: Constellation, sat_idx: u8) -> u16 {
    match cons {
        Constellation::Qzs => 193 + u16::from(sat_idx),
        Constellation::Sbas => 120 + u16::from(sat_idx),
        _ => 1 + u16::from(sat_idx),
    }
}

/// Maps the proprietary constellation slot of a 999 STGSV to ours
fn teseov_constellation(raw: u8) -> Option<Constellation> {
    match raw {
        0 => Some(Constellation::Gps),
        1 => Some(Constellation::Glo),
        2 => Some(Constellation::Qzs),
        3 => Some(Constellation::Gal),
        4 => Some(Constellation::Sbas),
        7 | 13 => Some(Constellation::Bds),
        _ => None,
    }
}

fn teseov_sat_to_prn(cons: Constellation, sat_id: u8) -> Option<u8> {
    let prn = u16::from(sat_id) + cons.first_prn();
    if prn < cons.first_prn() + cons.sat_count() {
        Some(prn as u8)
    } else {
        None
    }
}

/// A representative code per band of a constellation for measurement states
fn band_code(cons: Constellation, band: usize) -> Code {
    match (cons, band) {
        (Constellation::Gps, 0) => Code::GpsL1ca,
        (Constellation::Gps, 1) => Code::GpsL2cm,
        (Constellation::Gps, _) => Code::GpsL5i,
        (Constellation::Glo, 0) => Code::GloL1of,
        (Constellation::Glo, _) => Code::GloL2of,
        (Constellation::Qzs, 0) => Code::QzsL1ca,
        (Constellation::Qzs, 1) => Code::QzsL2cm,
        (Constellation::Qzs, _) => Code::QzsL5i,
        (Constellation::Gal, 0) => Code::GalE1b,
        (Constellation::Gal, 1) => Code::GalE7i,
        (Constellation::Gal, _) => Code::GalE5i,
        (Constellation::Sbas, 0) => Code::SbasL1ca,
        (Constellation::Sbas, _) => Code::SbasL5i,
        (Constellation::Bds, 0) => Code::Bds2B1,
        (Constellation::Bds, 1) => Code::Bds2B2,
        (Constellation::Bds, _) => Code::Bds3B5i,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtcm::frame::frame_payload;
    use crate::sbp::messages::{MsgObs, MSG_OBS};
    use std::sync::{Arc as StdArc, Mutex};

    type Captured = StdArc<Mutex<Vec<(u16, u16, Vec<u8>)>>>;

    fn session() -> (Rtcm2SbpSession, Captured) {
        let captured: Captured = StdArc::new(Mutex::new(Vec::new()));
        let sink_capture = StdArc::clone(&captured);
        let session = Rtcm2SbpSession::new(Box::new(move |sender, msg_type, payload| {
            sink_capture
                .lock()
                .unwrap()
                .push((sender, msg_type, payload.to_vec()));
        }));
        (session, captured)
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; payload.len() + crate::rtcm::consts::FRAME_OVERHEAD];
        let len = frame_payload(payload, &mut out).unwrap();
        out.truncate(len);
        out
    }

    #[test]
    fn live_1013_frame_resolves_time() {
        let (mut session, _captured) = session();
        session.push_bytes(&[
            0xD3, 0x00, 0x09, 0x3F, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48, 0x36, 0x24,
            0x76,
        ]);
        let time = session.resolved_gps_time().unwrap();
        assert_eq!(time.wn(), 2194);
        assert_eq!(time.tow().round() as u32, 428_069);
        assert_eq!(session.resolved_leap_seconds(), Some(18));
        assert_eq!(session.counters().messages_handled, 1);
    }

    #[test]
    fn msm5_stream_translates_to_obs() {
        let (mut session, captured) = session();
        session.set_time(Some(GpsTime::new(2190, 341_560.0).unwrap()), Some(18));

        let mut msm = crate::rtcm::msm::MsmMessage {
            header: crate::rtcm::msm::MsmHeader {
                msg_num: 1075,
                stn_id: 813,
                tow_ms: 341_562_000,
                multiple: false,
                ..Default::default()
            },
            sats: vec![crate::rtcm::msm::MsmSatData {
                glo_fcn: None,
                rough_range_ms: 70.0 + 250.0 / 1024.0,
                rough_range_rate_m_s: -890.0,
            }],
            signals: vec![crate::rtcm::msm::MsmSignalData {
                pseudorange_ms: 70.0 + 250.2 / 1024.0,
                carrier_phase_ms: 70.0 + 250.1 / 1024.0,
                lock_time_s: 130.0,
                hca_indicator: false,
                cnr: 45.0,
                flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK | ObsFlags::DOP,
                range_rate_m_s: -890.15,
            }],
        };
        msm.header.satellite_mask[2] = true;
        msm.header.signal_mask[1] = true;
        msm.header.cell_mask[0] = true;

        let mut payload = [0u8; crate::rtcm::consts::MAX_PAYLOAD_LEN];
        let len = crate::rtcm::msm::encode_msm(&msm, &mut payload).unwrap();
        session.push_bytes(&frame(&payload[..len]));

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (sender, msg_type, payload) = &captured[0];
        assert_eq!(*sender, stn_to_sbp_sender_id(813));
        assert_eq!(*msg_type, MSG_OBS);
        let obs = MsgObs::from_payload(payload).unwrap();
        assert_eq!(obs.header.t.tow, 341_562_000);
        assert_eq!(obs.header.t.wn, 2190);
        assert_eq!(obs.header.n_obs, 0x10);
        assert_eq!(obs.obs.len(), 1);
        let content = &obs.obs[0];
        assert_eq!(content.sid, SbpSignal { sat: 3, code: 0 });
        assert!(PackedObsFlags::from_bits_truncate(content.flags.bits())
            .contains(PackedObsFlags::CODE_VALID | PackedObsFlags::PHASE_VALID));
        /* the pseudorange lands near 70.24 light milliseconds */
        let pr_m = f64::from(content.p) / OBS_P_MULTIPLIER;
        float_eq::assert_float_eq!(
            pr_m,
            (70.0 + 250.2 / 1024.0) * rtcm::consts::GPS_C / 1e3,
            abs <= 0.02
        );
    }

    #[test]
    fn multiple_message_bit_delays_flush() {
        let (mut session, captured) = session();
        session.set_time(Some(GpsTime::new(2190, 341_560.0).unwrap()), Some(18));

        let mut msm = crate::rtcm::msm::MsmMessage {
            header: crate::rtcm::msm::MsmHeader {
                msg_num: 1074,
                stn_id: 1,
                tow_ms: 341_562_000,
                multiple: true,
                ..Default::default()
            },
            sats: vec![crate::rtcm::msm::MsmSatData {
                glo_fcn: None,
                rough_range_ms: 70.0,
                rough_range_rate_m_s: 0.0,
            }],
            signals: vec![crate::rtcm::msm::MsmSignalData {
                pseudorange_ms: 70.0,
                carrier_phase_ms: 70.0,
                flags: ObsFlags::PR | ObsFlags::CP,
                ..Default::default()
            }],
        };
        msm.header.satellite_mask[0] = true;
        msm.header.signal_mask[1] = true;
        msm.header.cell_mask[0] = true;

        let mut payload = [0u8; crate::rtcm::consts::MAX_PAYLOAD_LEN];
        let len = crate::rtcm::msm::encode_msm(&msm, &mut payload).unwrap();
        session.push_bytes(&frame(&payload[..len]));
        assert!(captured.lock().unwrap().is_empty());

        /* the epoch-closing message flushes everything */
        msm.header.msg_num = 1084;
        msm.header.multiple = false;
        msm.header.tow_ms = 3 * time_consts::DAY_MS + 41_864_000;
        msm.sats[0].glo_fcn = Some(-4);
        let len = crate::rtcm::msm::encode_msm(&msm, &mut payload).unwrap();
        session.push_bytes(&frame(&payload[..len]));

        let captured = captured.lock().unwrap();
        assert!(!captured.is_empty());
    }

    #[test]
    fn wrapped_sbp_passes_through() {
        let (mut session, captured) = session();
        let wrapped = crate::rtcm::swift::Msg4062 {
            protocol_version: 0,
            msg_type: 0x0102,
            sender_id: 0x42,
            data: vec![1, 2, 3, 4],
        };
        let mut payload = [0u8; crate::rtcm::consts::MAX_PAYLOAD_LEN];
        let len = crate::rtcm::swift::encode_4062(&wrapped, &mut payload).unwrap();
        session.push_bytes(&frame(&payload[..len]));

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0], (0x42, 0x0102, vec![1, 2, 3, 4]));
    }

    #[test]
    fn unknown_messages_counted_not_fatal() {
        let (mut session, captured) = session();
        /* message number 1023 is unassigned */
        let mut payload = [0u8; 4];
        payload[0] = (1023u16 >> 4) as u8;
        payload[1] = ((1023u16 & 0x0F) << 4) as u8;
        session.push_bytes(&frame(&payload));
        assert_eq!(session.counters().messages_ignored, 1);
        assert!(captured.lock().unwrap().is_empty());
    }

    #[test]
    fn garbage_between_frames_tolerated() {
        let (mut session, _captured) = session();
        let mut stream = vec![0x55, 0x12, 0xD3];
        stream.extend_from_slice(&[
            0xD3, 0x00, 0x09, 0x3F, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48, 0x36, 0x24,
            0x76,
        ]);
        stream.push(0x00);
        session.push_bytes(&stream);
        assert_eq!(session.counters().messages_handled, 1);
    }

    #[test]
    fn base_obs_sanity_callback_fires() {
        let (mut session, _captured) = session();
        let fired = StdArc::new(Mutex::new(None));
        let fired_cb = StdArc::clone(&fired);
        session.set_base_obs_invalid_callback(Box::new(move |delta| {
            *fired_cb.lock().unwrap() = Some(delta);
        }));
        /* the base reports observations three hours older than now */
        session.set_time(Some(GpsTime::new(2190, 341_560.0).unwrap()), Some(18));

        let obs = ObsMessage {
            header: crate::rtcm::obs::ObsHeader {
                msg_num: 1002,
                stn_id: 1,
                tow_ms: 341_560_000 - 3 * 3_600_000,
                sync: false,
                div_free: false,
                smooth: 0,
            },
            sats: vec![],
        };
        let mut payload = [0u8; crate::rtcm::consts::MAX_PAYLOAD_LEN];
        let len = crate::rtcm::obs::encode_gps_obs(&obs, &mut payload).unwrap();
        session.push_bytes(&frame(&payload[..len]));

        let delta = fired.lock().unwrap().unwrap();
        float_eq::assert_float_eq!(delta, 10_800.0, abs <= 0.5);
    }

    #[test]
    fn process_callback_reads_stream() {
        let (mut session, _captured) = session();
        let frame_bytes = [
            0xD3u8, 0x00, 0x09, 0x3F, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48, 0x36,
            0x24, 0x76,
        ];
        let mut cursor = 0usize;
        let mut read = |buf: &mut [u8]| -> isize {
            if cursor >= frame_bytes.len() {
                return 0;
            }
            let take = (frame_bytes.len() - cursor).min(buf.len());
            buf[..take].copy_from_slice(&frame_bytes[cursor..cursor + take]);
            cursor += take;
            take as isize
        };
        while session.process(&mut read) > 0 {}
        assert_eq!(session.counters().messages_handled, 1);
    }
}
