// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! End to end scenarios across both translator sessions

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use gnss_converters::converter::{MsmOutputMode, Rtcm2SbpSession, Sbp2RtcmSession};
use gnss_converters::edc::compute_crc24q;
use gnss_converters::rtcm;
use gnss_converters::rtcm::frame::{frame_payload, FrameScanner};
use gnss_converters::sbp::messages::{
    CarrierPhase, Doppler, MsgObs, ObservationHeader, PackedObsContent, PackedObsFlags,
    SbpGpsTime, SbpSignal, MSG_OBS,
};
use gnss_converters::time::GpsTime;

type SbpCapture = Arc<Mutex<Vec<(u16, u16, Vec<u8>)>>>;
type RtcmCapture = Arc<Mutex<Vec<Vec<u8>>>>;

fn rtcm2sbp() -> (Rtcm2SbpSession, SbpCapture) {
    let captured: SbpCapture = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let session = Rtcm2SbpSession::new(Box::new(move |sender, msg_type, payload| {
        sink.lock().unwrap().push((sender, msg_type, payload.to_vec()));
    }));
    (session, captured)
}

fn sbp2rtcm() -> (Sbp2RtcmSession, RtcmCapture) {
    let captured: RtcmCapture = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let session = Sbp2RtcmSession::new(Box::new(move |frame| {
        sink.lock().unwrap().push(frame.to_vec());
    }));
    (session, captured)
}

fn msm5_frame(
    msg_num: u16,
    stn_id: u16,
    tow_ms: u32,
    multiple: bool,
    sats: &[(usize, f64)],
) -> Vec<u8> {
    let mut msm = rtcm::msm::MsmMessage {
        header: rtcm::msm::MsmHeader {
            msg_num,
            stn_id,
            tow_ms,
            multiple,
            ..Default::default()
        },
        sats: Vec::new(),
        signals: Vec::new(),
    };
    msm.header.signal_mask[1] = true;
    for &(sat_idx, _) in sats {
        msm.header.satellite_mask[sat_idx] = true;
    }
    for (cell, &(_, range_ms)) in sats.iter().enumerate() {
        msm.header.cell_mask[cell] = true;
        msm.sats.push(rtcm::msm::MsmSatData {
            glo_fcn: None,
            rough_range_ms: (range_ms * 1024.0).floor() / 1024.0,
            rough_range_rate_m_s: 0.0,
        });
        msm.signals.push(rtcm::msm::MsmSignalData {
            pseudorange_ms: range_ms,
            carrier_phase_ms: range_ms,
            lock_time_s: 100.0,
            hca_indicator: false,
            cnr: 40.0,
            flags: rtcm::obs::ObsFlags::PR
                | rtcm::obs::ObsFlags::CP
                | rtcm::obs::ObsFlags::CNR
                | rtcm::obs::ObsFlags::LOCK,
            range_rate_m_s: 0.0,
        });
    }

    let mut payload = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
    let len = rtcm::msm::encode_msm(&msm, &mut payload).unwrap();
    let mut framed = vec![0u8; len + rtcm::consts::FRAME_OVERHEAD];
    let framed_len = frame_payload(&payload[..len], &mut framed).unwrap();
    framed.truncate(framed_len);
    framed
}

#[test]
fn msm5_stream_emits_monotone_epochs() {
    let (mut session, captured) = rtcm2sbp();
    session.set_time(Some(GpsTime::new(2190, 341_559.0).unwrap()), Some(18));

    /* two minutes of one epoch per second */
    for second in 0..120u32 {
        let tow_ms = 341_560_000 + second * 1000;
        let frame = msm5_frame(1075, 813, tow_ms, false, &[(2, 70.2), (16, 72.9)]);
        session.push_bytes(&frame);
    }

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 120);
    let mut previous: Option<u32> = None;
    for (_, msg_type, payload) in captured.iter() {
        assert_eq!(*msg_type, MSG_OBS);
        let obs = MsgObs::from_payload(payload).unwrap();
        if let Some(previous) = previous {
            assert!(obs.header.t.tow > previous, "epochs must be monotone");
            assert!(obs.header.t.tow - previous <= 1000, "gap over a second");
        }
        previous = Some(obs.header.t.tow);
    }
}

#[test]
fn epoch_fragments_form_complete_sequence() {
    let (mut session, captured) = rtcm2sbp();
    session.set_time(Some(GpsTime::new(2190, 341_559.0).unwrap()), Some(18));

    /* three constellations of one epoch, multiple message bit set on all
     * but the last */
    let tow_ms = 341_560_000;
    session.push_bytes(&msm5_frame(1075, 1, tow_ms, true, &[(0, 70.0), (1, 71.0)]));
    session.push_bytes(&msm5_frame(1095, 1, tow_ms, true, &[(0, 74.0), (3, 75.0)]));
    session.push_bytes(&msm5_frame(1115, 1, tow_ms, false, &[(0, 76.0)]));

    let captured = captured.lock().unwrap();
    assert!(!captured.is_empty());
    let mut seen = Vec::new();
    let mut total = 0;
    for (_, _, payload) in captured.iter() {
        let obs = MsgObs::from_payload(payload).unwrap();
        total = obs.header.n_obs >> 4;
        seen.push(obs.header.n_obs & 0x0F);
    }
    let expected: Vec<u8> = (0..total).collect();
    assert_eq!(seen, expected, "sequence headers must form a complete set");

    /* every observation of the epoch came through exactly once */
    let all_obs: usize = captured
        .iter()
        .map(|(_, _, payload)| MsgObs::from_payload(payload).unwrap().obs.len())
        .sum();
    assert_eq!(all_obs, 5);
}

#[test]
fn emitted_epochs_never_duplicate_signals() {
    let (mut session, captured) = rtcm2sbp();
    session.set_time(Some(GpsTime::new(2190, 341_559.0).unwrap()), Some(18));

    /* the same satellites arrive twice within one epoch */
    let tow_ms = 341_560_000;
    session.push_bytes(&msm5_frame(1075, 1, tow_ms, true, &[(0, 70.0), (1, 71.0)]));
    session.push_bytes(&msm5_frame(1075, 1, tow_ms, false, &[(0, 70.0), (1, 71.0)]));

    let captured = captured.lock().unwrap();
    let mut seen = HashSet::new();
    for (_, _, payload) in captured.iter() {
        let obs = MsgObs::from_payload(payload).unwrap();
        for content in &obs.obs {
            assert!(
                seen.insert((content.sid.sat, content.sid.code)),
                "duplicate signal {:?} in epoch",
                content.sid
            );
        }
    }
}

#[test]
fn sbp_obs_round_trips_through_msm5() {
    let original = PackedObsContent {
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
    };
    let msg = MsgObs {
        header: ObservationHeader {
            t: SbpGpsTime {
                tow: 341_562_000,
                ns_residual: 0,
                wn: 2190,
            },
            n_obs: 0x10,
        },
        obs: vec![original],
    };

    let (mut forward, rtcm_captured) = sbp2rtcm();
    forward.set_msm_output_mode(MsmOutputMode::Msm5);
    forward.handle_sbp(0xF00D, MSG_OBS, &msg.to_payload());

    let (mut backward, sbp_captured) = rtcm2sbp();
    backward.set_time(Some(GpsTime::new(2190, 341_561.0).unwrap()), Some(18));
    for frame in rtcm_captured.lock().unwrap().iter() {
        backward.push_bytes(frame);
    }

    let captured = sbp_captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let round_tripped = MsgObs::from_payload(&captured[0].2).unwrap();
    assert_eq!(round_tripped.obs.len(), 1);
    let got = round_tripped.obs[0];

    assert_eq!(got.sid, original.sid);
    assert_eq!(got.p, original.p);
    assert_eq!(got.l, original.l);
    assert_eq!(got.d, original.d);
    assert_eq!(got.lock, original.lock);
    assert_eq!(got.flags, original.flags);
    /* CN0 travels at the 1 dB-Hz wire resolution */
    assert!((i32::from(got.cn0) - i32::from(original.cn0)).abs() <= 4);
    assert_eq!(round_tripped.header.t.tow, msg.header.t.tow);
}

#[test]
fn unix_clock_only_resolves_best_time() {
    let (mut session, _captured) = rtcm2sbp();
    session.set_unix_time_callback(Box::new(|| Some(1_645_078_316)));
    let time = session.resolved_gps_time().unwrap();
    assert_eq!(time.wn(), 2197);
    assert_eq!(time.tow().round() as u32, 367_934);
    assert_eq!(session.resolved_leap_seconds(), Some(18));
}

#[test]
fn single_corrupted_byte_costs_at_most_one_frame() {
    let frame = msm5_frame(1075, 1, 341_560_000, false, &[(0, 70.0)]);

    for position in 0..frame.len() {
        let mut scanner = FrameScanner::new();
        let mut stream = Vec::new();
        /* frame, corrupted frame, frame */
        stream.extend_from_slice(&frame);
        let mut corrupted = frame.clone();
        corrupted[position] ^= 0x5A;
        stream.extend_from_slice(&corrupted);
        stream.extend_from_slice(&frame);
        /* keep the stream flowing so a phantom length field inside the
         * corruption cannot leave the scanner waiting forever */
        stream.resize(stream.len() + rtcm::consts::MAX_FRAME_LEN + 1, 0);

        scanner.push_bytes(&stream);
        let mut payload = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        let mut frames = 0;
        while scanner.next_frame(&mut payload).is_some() {
            frames += 1;
        }
        assert!(
            (2..=3).contains(&frames),
            "corruption at byte {position} lost more than one frame ({frames})"
        );
    }
}

#[test]
fn random_inserted_byte_resynchronizes() {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED);

    let frames: Vec<Vec<u8>> = (0..5)
        .map(|i| msm5_frame(1075, 1, 341_560_000 + i * 1000, false, &[(0, 70.0)]))
        .collect();

    for _ in 0..50 {
        let mut stream: Vec<u8> = frames.iter().flatten().copied().collect();
        let position = rng.gen_range(0..stream.len());
        stream.insert(position, rng.gen());
        stream.resize(stream.len() + rtcm::consts::MAX_FRAME_LEN + 1, 0);

        let mut scanner = FrameScanner::new();
        scanner.push_bytes(&stream);
        let mut payload = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        let mut frames_found = 0;
        while scanner.next_frame(&mut payload).is_some() {
            frames_found += 1;
        }
        assert!(
            frames_found >= 4,
            "insertion at {position} lost more than one frame"
        );
    }
}

#[test]
fn crc_rejects_every_single_bit_flip() {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let len = rng.gen_range(0..64usize);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let mut framed = vec![0u8; payload.len() + rtcm::consts::FRAME_OVERHEAD];
        let framed_len = frame_payload(&payload, &mut framed).unwrap();
        framed.truncate(framed_len);

        /* the encoder's CRC matches an independent computation */
        let crc = compute_crc24q(&framed[..framed.len() - 3], 0);
        let trailer = (u32::from(framed[framed.len() - 3]) << 16)
            | (u32::from(framed[framed.len() - 2]) << 8)
            | u32::from(framed[framed.len() - 1]);
        assert_eq!(crc, trailer);

        /* flipping any single bit must reject the frame */
        let byte = rng.gen_range(0..framed.len());
        let bit = rng.gen_range(0..8);
        let mut corrupted = framed.clone();
        corrupted[byte] ^= 1 << bit;

        let mut scanner = FrameScanner::new();
        scanner.push_bytes(&corrupted);
        let mut out = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
        if let Some(got_len) = scanner.next_frame(&mut out) {
            /* resynchronization inside the corrupted bytes may still find a
             * valid-looking shorter frame, but never the original one */
            assert_ne!(&out[..got_len], payload.as_slice());
        }
    }
}

#[test]
fn live_1013_frame_reports_time_and_leap() {
    let (mut session, _captured) = rtcm2sbp();
    session.push_bytes(&[
        0xD3, 0x00, 0x09, 0x3F, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48, 0x36, 0x24, 0x76,
    ]);
    let time = session.resolved_gps_time().unwrap();
    assert_eq!(time.wn(), 2194);
    assert_eq!(time.tow().round() as u32, 428_069);
    assert_eq!(session.resolved_leap_seconds(), Some(18));
}

#[test]
fn legacy_obs_suppressed_while_msm_active() {
    let (mut session, captured) = rtcm2sbp();
    session.set_time(Some(GpsTime::new(2190, 341_559.0).unwrap()), Some(18));

    /* MSM first */
    session.push_bytes(&msm5_frame(1075, 1, 341_560_000, false, &[(0, 70.0)]));
    let after_msm = captured.lock().unwrap().len();
    assert!(after_msm > 0);

    /* a legacy message for the next epoch must be swallowed */
    let legacy = rtcm::obs::ObsMessage {
        header: rtcm::obs::ObsHeader {
            msg_num: 1002,
            stn_id: 1,
            tow_ms: 341_561_000,
            sync: false,
            div_free: false,
            smooth: 0,
        },
        sats: vec![{
            let mut sat = rtcm::obs::SatData {
                sat_id: 5,
                fcn: None,
                obs: Default::default(),
            };
            sat.obs[0] = rtcm::obs::FreqData {
                code: 0,
                pseudorange: 21_039_666.18,
                carrier_phase: 110_567_912.31,
                lock: 100.0,
                cnr: 40.0,
                flags: rtcm::obs::ObsFlags::PR
                    | rtcm::obs::ObsFlags::CP
                    | rtcm::obs::ObsFlags::CNR
                    | rtcm::obs::ObsFlags::LOCK,
            };
            sat
        }],
    };
    let mut payload = [0u8; rtcm::consts::MAX_PAYLOAD_LEN];
    let len = rtcm::obs::encode_gps_obs(&legacy, &mut payload).unwrap();
    let mut framed = vec![0u8; len + rtcm::consts::FRAME_OVERHEAD];
    let framed_len = frame_payload(&payload[..len], &mut framed).unwrap();
    framed.truncate(framed_len);
    session.push_bytes(&framed);

    assert_eq!(captured.lock().unwrap().len(), after_msm);
}
