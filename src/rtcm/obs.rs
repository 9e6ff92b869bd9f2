// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Legacy RTK observation messages 1001-1004 (GPS) and 1010/1012 (GLONASS)
//!
//! Pseudoranges are carried modulo a constellation-specific light-millisecond
//! unit; 1002/1004/1010/1012 additionally carry the integer ambiguity so the
//! absolute value can be reconstructed. Carrier phase is carried as the
//! difference to the L1 pseudorange in half-millimeter units, rolled over in
//! steps of 1500 cycles when it would leave the 20 bit window.

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitWriter};
use crate::rtcm::{consts, DecodeError};
use crate::signal::fcn_from_mt1012;

bitflags::bitflags! {
    /// Validity flags of one frequency slot of an observation
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
    pub struct ObsFlags: u8 {
        /// Pseudorange is valid
        const PR = 0x01;
        /// Carrier phase is valid
        const CP = 0x02;
        /// Carrier to noise ratio is valid
        const CNR = 0x04;
        /// Lock time is valid
        const LOCK = 0x08;
        /// Doppler is valid
        const DOP = 0x10;
    }
}

/// Frequency band index within a legacy observation
#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::FromRepr)]
#[repr(usize)]
pub enum Freq {
    /// L1 band
    L1 = 0,
    /// L2 band
    L2 = 1,
}

/// Number of bands a legacy message can carry
pub const NUM_FREQS: usize = 2;

/// Observation data of a single frequency slot
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqData {
    /// Code indicator (DF010/DF016/DF039/DF045), constellation-specific
    pub code: u8,
    /// Full pseudorange in meters
    pub pseudorange: f64,
    /// Carrier phase in cycles
    pub carrier_phase: f64,
    /// Lock time in seconds
    pub lock: f64,
    /// Carrier to noise ratio in dB-Hz
    pub cnr: f64,
    /// Field validity
    pub flags: ObsFlags,
}

/// Observations of one satellite
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatData {
    /// Satellite id (DF009/DF038)
    pub sat_id: u8,
    /// GLONASS frequency channel number, `None` for GPS or when unknown
    pub fcn: Option<i8>,
    /// Per-band observations
    pub obs: [FreqData; NUM_FREQS],
}

/// Header common to the legacy observation messages
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObsHeader {
    /// Message number (DF002)
    pub msg_num: u16,
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// GPS time of week, or GLONASS time of day, in milliseconds
    pub tow_ms: u32,
    /// Synchronous GNSS flag (DF005): set means more observations of this
    /// epoch follow in the next message
    pub sync: bool,
    /// Divergence-free smoothing indicator (DF007)
    pub div_free: bool,
    /// Smoothing interval (DF008)
    pub smooth: u8,
}

/// A decoded legacy observation message
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObsMessage {
    /// Common header
    pub header: ObsHeader,
    /// Per-satellite observations
    pub sats: Vec<SatData>,
}

/// Checks if a message number is a legacy GPS observation
#[must_use]
pub fn is_gps_obs_message(msg_num: u16) -> bool {
    (1001..=1004).contains(&msg_num)
}

/// Checks if a message number is a legacy GLONASS observation
#[must_use]
pub fn is_glo_obs_message(msg_num: u16) -> bool {
    msg_num == 1010 || msg_num == 1012
}

/// Convert a lock time in seconds into a 7-bit RTCMv3 Lock Time Indicator
/// DF013. See RTCM 10403.1, Table 3.4-2.
#[must_use]
pub fn to_lock_ind(time: f64) -> u8 {
    if time < 24.0 {
        time as u8
    } else if time < 72.0 {
        ((time + 24.0) / 2.0) as u8
    } else if time < 168.0 {
        ((time + 120.0) / 4.0) as u8
    } else if time < 360.0 {
        ((time + 408.0) / 8.0) as u8
    } else if time < 744.0 {
        ((time + 1176.0) / 16.0) as u8
    } else if time < 937.0 {
        ((time + 3096.0) / 32.0) as u8
    } else {
        127
    }
}

/// Convert a 7-bit Lock Time Indicator DF013 into the minimum lock time in
/// seconds it stands for
#[must_use]
pub fn from_lock_ind(lock: u8) -> f64 {
    let lock = f64::from(lock);
    if lock < 24.0 {
        lock
    } else if lock < 48.0 {
        lock * 2.0 - 24.0
    } else if lock < 72.0 {
        lock * 4.0 - 120.0
    } else if lock < 96.0 {
        lock * 8.0 - 408.0
    } else if lock < 120.0 {
        lock * 16.0 - 1176.0
    } else if lock < 127.0 {
        lock * 32.0 - 3096.0
    } else {
        937.0
    }
}

/// Convert a lock time in seconds into a 4-bit RTCMv3 Lock Time Indicator
/// DF402. See RTCM 10403.1, Table 3.5-74.
#[must_use]
pub fn encode_lock_time(time: f64) -> u8 {
    for ind in 0..15u8 {
        if time < 0.032 * f64::from(1u32 << ind) {
            return ind;
        }
    }
    15
}

/// Convert a 4-bit Lock Time Indicator DF402 into the minimum lock time in
/// seconds it stands for
#[must_use]
pub fn decode_lock_time(lock: u8) -> f64 {
    if lock == 0 {
        0.0
    } else {
        0.032 * f64::from(1u32 << (lock.min(15) - 1))
    }
}

/// Encode PhaseRange - L1 Pseudorange (DF012, DF018, DF042, DF048)
///
/// Certain ionospheric conditions might cause the phase range and pseudorange
/// to diverge over time across the 20 bit range limit. The value is then
/// rolled over in steps of 1500 cycles to bring it back within range; the
/// decoder does not need to know the step count because the full pseudorange
/// travels in the same record.
fn encode_diff_phaserange(mut cp_pr: f64, freq: f64) -> i32 {
    let phase_unit = (consts::GPS_C / freq) / 0.0005;
    let mut ppr = (cp_pr * phase_unit).round();

    if ppr <= -consts::C_2P19 {
        /* add multiples of 1500 cycles */
        cp_pr += 1500.0 * ((-consts::C_2P19 / phase_unit - cp_pr) / 1500.0).ceil();
        ppr = (cp_pr * phase_unit).round();
    } else if ppr >= consts::C_2P19 {
        /* subtract multiples of 1500 cycles */
        cp_pr -= 1500.0 * ((cp_pr - consts::C_2P19 / phase_unit) / 1500.0).ceil();
        ppr = (cp_pr * phase_unit).round();
    }
    ppr as i32
}

fn gps_band_freq(freq: Freq) -> f64 {
    match freq {
        Freq::L1 => consts::GPS_L1_HZ,
        Freq::L2 => consts::GPS_L2_HZ,
    }
}

fn glo_band_freq(freq: Freq, fcn: i8) -> f64 {
    match freq {
        Freq::L1 => consts::GLO_L1_HZ + f64::from(fcn) * consts::GLO_L1_DELTA_HZ,
        Freq::L2 => consts::GLO_L2_HZ + f64::from(fcn) * consts::GLO_L2_DELTA_HZ,
    }
}

fn encode_basic_freq_data(
    writer: &mut BitWriter<'_>,
    freq_data: &FreqData,
    freq: Freq,
    l1_pr: f64,
) -> Result<(), DecodeError> {
    /* Integer L1 Pseudorange Modulus Ambiguity (DF014). */
    let amb = (l1_pr / consts::PRUNIT_GPS) as u32;

    /* L1 pseudorange value as it would be transmitted (DF011). */
    let calc_l1_pr =
        ((l1_pr - f64::from(amb) * consts::PRUNIT_GPS) / 0.02).round() as u32;

    /* Pseudorange (DF011/DF017). */
    let pr = ((freq_data.pseudorange - f64::from(amb) * consts::PRUNIT_GPS) / 0.02).round();

    let l1_prc = f64::from(calc_l1_pr) * 0.02 + f64::from(amb) * consts::PRUNIT_GPS;

    let band_freq = gps_band_freq(freq);
    match freq {
        Freq::L1 => {
            writer.write_u64(u64::from(freq_data.code & 1), 1)?;
            let value = if freq_data.flags.contains(ObsFlags::PR) {
                pr as u32
            } else {
                consts::PR_L1_INVALID
            };
            writer.write_u64(u64::from(value), 24)?;
        }
        Freq::L2 => {
            writer.write_u64(u64::from(freq_data.code & 3), 2)?;
            let value = if freq_data.flags.contains(ObsFlags::PR) {
                pr as i32 - calc_l1_pr as i32
            } else {
                consts::PR_L2_INVALID
            };
            writer.write_i64(i64::from(value), 14)?;
        }
    }

    if freq_data.flags.contains(ObsFlags::CP) {
        /* phaserange - L1 pseudorange */
        let cp_pr = freq_data.carrier_phase - l1_prc / (consts::GPS_C / band_freq);
        let ppr = encode_diff_phaserange(cp_pr, band_freq);
        writer.write_i64(i64::from(ppr), 20)?;
    } else {
        writer.write_i64(i64::from(consts::CP_INVALID), 20)?;
    }
    let lock_ind = if freq_data.flags.contains(ObsFlags::LOCK) {
        to_lock_ind(freq_data.lock)
    } else {
        0
    };
    writer.write_u64(u64::from(lock_ind), 7)?;
    Ok(())
}

fn encode_basic_glo_freq_data(
    writer: &mut BitWriter<'_>,
    freq_data: &FreqData,
    freq: Freq,
    l1_pr: f64,
    fcn: i8,
) -> Result<(), DecodeError> {
    /* Integer L1 Pseudorange Modulus Ambiguity (DF044). */
    let amb = (l1_pr / consts::PRUNIT_GLO) as u32;
    let calc_l1_pr =
        ((l1_pr - f64::from(amb) * consts::PRUNIT_GLO) / 0.02).round() as u32;
    let pr = ((freq_data.pseudorange - f64::from(amb) * consts::PRUNIT_GLO) / 0.02).round();
    let l1_prc = f64::from(calc_l1_pr) * 0.02 + f64::from(amb) * consts::PRUNIT_GLO;

    let band_freq = glo_band_freq(freq, fcn);
    match freq {
        Freq::L1 => {
            writer.write_u64(u64::from(freq_data.code & 1), 1)?;
            /* DF040: satellite frequency channel number */
            writer.write_u64(
                u64::from((fcn + crate::signal::consts::MT1012_GLO_FCN_OFFSET) as u8),
                5,
            )?;
            let value = if freq_data.flags.contains(ObsFlags::PR) {
                pr as u32
            } else {
                consts::PR_L1_INVALID
            };
            writer.write_u64(u64::from(value), 25)?;
        }
        Freq::L2 => {
            writer.write_u64(u64::from(freq_data.code & 3), 2)?;
            let value = if freq_data.flags.contains(ObsFlags::PR) {
                pr as i32 - calc_l1_pr as i32
            } else {
                consts::PR_L2_INVALID
            };
            writer.write_i64(i64::from(value), 14)?;
        }
    }

    if freq_data.flags.contains(ObsFlags::CP) {
        let cp_pr = freq_data.carrier_phase - l1_prc / (consts::GPS_C / band_freq);
        let ppr = encode_diff_phaserange(cp_pr, band_freq);
        writer.write_i64(i64::from(ppr), 20)?;
    } else {
        writer.write_i64(i64::from(consts::CP_INVALID), 20)?;
    }
    let lock_ind = if freq_data.flags.contains(ObsFlags::LOCK) {
        to_lock_ind(freq_data.lock)
    } else {
        0
    };
    writer.write_u64(u64::from(lock_ind), 7)?;
    Ok(())
}

fn encode_obs_header(
    writer: &mut BitWriter<'_>,
    header: &ObsHeader,
    num_sats: u8,
    glo: bool,
) -> Result<(), DecodeError> {
    writer.write_u64(u64::from(header.msg_num), 12)?;
    writer.write_u64(u64::from(header.stn_id), 12)?;
    writer.write_u64(u64::from(header.tow_ms), if glo { 27 } else { 30 })?;
    writer.write_bool(header.sync)?;
    writer.write_u64(u64::from(num_sats), 5)?;
    writer.write_bool(header.div_free)?;
    writer.write_u64(u64::from(header.smooth), 3)?;
    Ok(())
}

fn sat_encodable(sat: &SatData, dual_freq: bool) -> bool {
    let l1 = &sat.obs[Freq::L1 as usize];
    if !(l1.flags.contains(ObsFlags::PR) && l1.flags.contains(ObsFlags::CP)) {
        return false;
    }
    if dual_freq {
        let l2 = &sat.obs[Freq::L2 as usize];
        if !(l2.flags.contains(ObsFlags::PR) && l2.flags.contains(ObsFlags::CP)) {
            return false;
        }
    }
    true
}

/// Encodes a legacy GPS observation message (1001-1004) into `buf`
///
/// Satellites missing the pseudorange or carrier phase required by the
/// message type are skipped. Returns the payload length in bytes.
pub fn encode_gps_obs(msg: &ObsMessage, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let msg_num = msg.header.msg_num;
    if !is_gps_obs_message(msg_num) {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1004,
            found: msg_num,
        });
    }
    let dual_freq = msg_num == 1003 || msg_num == 1004;
    let extended = msg_num == 1002 || msg_num == 1004;

    let sats: Vec<&SatData> = msg
        .sats
        .iter()
        .filter(|sat| sat_encodable(sat, msg_num == 1003))
        .take(consts::MAX_SATS)
        .collect();

    let mut writer = BitWriter::new(buf);
    encode_obs_header(&mut writer, &msg.header, sats.len() as u8, false)?;
    for sat in sats {
        let l1_pr = sat.obs[Freq::L1 as usize].pseudorange;
        writer.write_u64(u64::from(sat.sat_id), 6)?;
        encode_basic_freq_data(&mut writer, &sat.obs[Freq::L1 as usize], Freq::L1, l1_pr)?;
        if extended {
            let amb = (l1_pr / consts::PRUNIT_GPS) as u8;
            writer.write_u64(u64::from(amb), 8)?;
            writer.write_u64(
                (sat.obs[Freq::L1 as usize].cnr * 4.0).round() as u64,
                8,
            )?;
        }
        if dual_freq {
            encode_basic_freq_data(&mut writer, &sat.obs[Freq::L2 as usize], Freq::L2, l1_pr)?;
            if extended {
                writer.write_u64(
                    (sat.obs[Freq::L2 as usize].cnr * 4.0).round() as u64,
                    8,
                )?;
            }
        }
    }
    Ok(writer.byte_len())
}

/// Encodes a legacy GLONASS observation message (1010/1012) into `buf`
///
/// Satellites with an unknown frequency channel number are skipped, the
/// wavelength needed for the phase field cannot be computed without one.
pub fn encode_glo_obs(msg: &ObsMessage, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let msg_num = msg.header.msg_num;
    if !is_glo_obs_message(msg_num) {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1012,
            found: msg_num,
        });
    }
    let dual_freq = msg_num == 1012;

    let sats: Vec<&SatData> = msg
        .sats
        .iter()
        .filter(|sat| sat.fcn.is_some() && sat_encodable(sat, false))
        .take(consts::MAX_SATS)
        .collect();

    let mut writer = BitWriter::new(buf);
    encode_obs_header(&mut writer, &msg.header, sats.len() as u8, true)?;
    for sat in sats {
        let fcn = sat.fcn.unwrap_or(0);
        let l1_pr = sat.obs[Freq::L1 as usize].pseudorange;
        writer.write_u64(u64::from(sat.sat_id), 6)?;
        encode_basic_glo_freq_data(
            &mut writer,
            &sat.obs[Freq::L1 as usize],
            Freq::L1,
            l1_pr,
            fcn,
        )?;
        let amb = (l1_pr / consts::PRUNIT_GLO) as u8;
        writer.write_u64(u64::from(amb), 7)?;
        writer.write_u64((sat.obs[Freq::L1 as usize].cnr * 4.0).round() as u64, 8)?;
        if dual_freq {
            encode_basic_glo_freq_data(
                &mut writer,
                &sat.obs[Freq::L2 as usize],
                Freq::L2,
                l1_pr,
                fcn,
            )?;
            writer.write_u64((sat.obs[Freq::L2 as usize].cnr * 4.0).round() as u64, 8)?;
        }
    }
    Ok(writer.byte_len())
}

struct RawL1 {
    code: u8,
    pr_raw: u32,
    ppr_raw: i32,
    lock_ind: u8,
}

fn decode_l1_body(reader: &mut BitReader<'_>) -> Result<RawL1, DecodeError> {
    let code = reader.read_u8(1)?;
    let pr_raw = reader.read_u32(24)?;
    let ppr_raw = reader.read_i32(20)?;
    let lock_ind = reader.read_u8(7)?;
    Ok(RawL1 {
        code,
        pr_raw,
        ppr_raw,
        lock_ind,
    })
}

fn fill_freq_data(
    freq_data: &mut FreqData,
    code: u8,
    pr: Option<f64>,
    carrier_phase: Option<f64>,
    lock_ind: u8,
) {
    freq_data.code = code;
    if let Some(pr) = pr {
        freq_data.pseudorange = pr;
        freq_data.flags.insert(ObsFlags::PR);
    }
    if let Some(cp) = carrier_phase {
        freq_data.carrier_phase = cp;
        freq_data.flags.insert(ObsFlags::CP);
    }
    freq_data.lock = from_lock_ind(lock_ind);
    freq_data.flags.insert(ObsFlags::LOCK);
}

/// Decodes a legacy GPS observation payload (1001-1004)
pub fn decode_gps_obs(payload: &[u8]) -> Result<ObsMessage, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if !is_gps_obs_message(msg_num) {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1004,
            found: msg_num,
        });
    }
    let dual_freq = msg_num == 1003 || msg_num == 1004;
    let extended = msg_num == 1002 || msg_num == 1004;

    let stn_id = reader.read_u16(12)?;
    let tow_ms = reader.read_u32(30)?;
    let sync = reader.read_bool()?;
    let n_sat = reader.read_u8(5)?;
    let div_free = reader.read_bool()?;
    let smooth = reader.read_u8(3)?;

    let mut msg = ObsMessage {
        header: ObsHeader {
            msg_num,
            stn_id,
            tow_ms,
            sync,
            div_free,
            smooth,
        },
        sats: Vec::with_capacity(usize::from(n_sat)),
    };

    for _ in 0..n_sat {
        let sat_id = reader.read_u8(6)?;
        let l1 = decode_l1_body(&mut reader)?;
        let (amb, l1_cnr) = if extended {
            let amb = reader.read_u8(8)?;
            let cnr = reader.read_u8(8)?;
            (Some(amb), Some(f64::from(cnr) * 0.25))
        } else {
            (None, None)
        };

        let amb_m = f64::from(amb.unwrap_or(0)) * consts::PRUNIT_GPS;
        let mut sat = SatData {
            sat_id,
            fcn: None,
            obs: Default::default(),
        };

        /* without the ambiguity extension the range is only known modulo one
         * light millisecond unit, leave it unset */
        let l1_pr = if l1.pr_raw != consts::PR_L1_INVALID && amb.is_some() {
            Some(f64::from(l1.pr_raw) * 0.02 + amb_m)
        } else {
            None
        };
        let l1_prc = f64::from(l1.pr_raw) * 0.02 + amb_m;
        let lambda = consts::GPS_C / consts::GPS_L1_HZ;
        let l1_cp = if l1.ppr_raw != consts::CP_INVALID {
            Some(l1_prc / lambda + f64::from(l1.ppr_raw) * 0.0005 / lambda)
        } else {
            None
        };
        fill_freq_data(
            &mut sat.obs[Freq::L1 as usize],
            l1.code,
            l1_pr,
            l1_cp,
            l1.lock_ind,
        );
        if let Some(cnr) = l1_cnr {
            sat.obs[Freq::L1 as usize].cnr = cnr;
            sat.obs[Freq::L1 as usize].flags.insert(ObsFlags::CNR);
        }

        if dual_freq {
            let code = reader.read_u8(2)?;
            let pr_diff = reader.read_i32(14)?;
            let ppr_raw = reader.read_i32(20)?;
            let lock_ind = reader.read_u8(7)?;
            let l2_cnr = if extended {
                Some(f64::from(reader.read_u8(8)?) * 0.25)
            } else {
                None
            };

            let l2_pr = if pr_diff != consts::PR_L2_INVALID && l1_pr.is_some() {
                Some(l1_prc + f64::from(pr_diff) * 0.02)
            } else {
                None
            };
            let lambda2 = consts::GPS_C / consts::GPS_L2_HZ;
            let l2_cp = if ppr_raw != consts::CP_INVALID {
                Some(l1_prc / lambda2 + f64::from(ppr_raw) * 0.0005 / lambda2)
            } else {
                None
            };
            fill_freq_data(
                &mut sat.obs[Freq::L2 as usize],
                code,
                l2_pr,
                l2_cp,
                lock_ind,
            );
            if let Some(cnr) = l2_cnr {
                sat.obs[Freq::L2 as usize].cnr = cnr;
                sat.obs[Freq::L2 as usize].flags.insert(ObsFlags::CNR);
            }
        }
        msg.sats.push(sat);
    }
    Ok(msg)
}

/// Decodes a legacy GLONASS observation payload (1010/1012)
pub fn decode_glo_obs(payload: &[u8]) -> Result<ObsMessage, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if !is_glo_obs_message(msg_num) {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1012,
            found: msg_num,
        });
    }
    let dual_freq = msg_num == 1012;

    let stn_id = reader.read_u16(12)?;
    let tod_ms = reader.read_u32(27)?;
    let sync = reader.read_bool()?;
    let n_sat = reader.read_u8(5)?;
    let div_free = reader.read_bool()?;
    let smooth = reader.read_u8(3)?;

    let mut msg = ObsMessage {
        header: ObsHeader {
            msg_num,
            stn_id,
            tow_ms: tod_ms,
            sync,
            div_free,
            smooth,
        },
        sats: Vec::with_capacity(usize::from(n_sat)),
    };

    for _ in 0..n_sat {
        let sat_id = reader.read_u8(6)?;
        let code = reader.read_u8(1)?;
        let fcn = fcn_from_mt1012(reader.read_u8(5)?);
        let pr_raw = reader.read_u32(25)?;
        let ppr_raw = reader.read_i32(20)?;
        let lock_ind = reader.read_u8(7)?;
        let amb = reader.read_u8(7)?;
        let l1_cnr = f64::from(reader.read_u8(8)?) * 0.25;

        let amb_m = f64::from(amb) * consts::PRUNIT_GLO;
        let mut sat = SatData {
            sat_id,
            fcn,
            obs: Default::default(),
        };

        let l1_pr = if pr_raw != consts::PR_L1_INVALID {
            Some(f64::from(pr_raw) * 0.02 + amb_m)
        } else {
            None
        };
        let l1_prc = f64::from(pr_raw) * 0.02 + amb_m;
        /* phase reconstruction needs the channel wavelength */
        let l1_cp = match (ppr_raw != consts::CP_INVALID, fcn) {
            (true, Some(fcn)) => {
                let lambda = consts::GPS_C / glo_band_freq(Freq::L1, fcn);
                Some(l1_prc / lambda + f64::from(ppr_raw) * 0.0005 / lambda)
            }
            _ => None,
        };
        fill_freq_data(
            &mut sat.obs[Freq::L1 as usize],
            code,
            l1_pr,
            l1_cp,
            lock_ind,
        );
        sat.obs[Freq::L1 as usize].cnr = l1_cnr;
        sat.obs[Freq::L1 as usize].flags.insert(ObsFlags::CNR);

        if dual_freq {
            let code = reader.read_u8(2)?;
            let pr_diff = reader.read_i32(14)?;
            let ppr_raw = reader.read_i32(20)?;
            let lock_ind = reader.read_u8(7)?;
            let l2_cnr = f64::from(reader.read_u8(8)?) * 0.25;

            let l2_pr = if pr_diff != consts::PR_L2_INVALID && l1_pr.is_some() {
                Some(l1_prc + f64::from(pr_diff) * 0.02)
            } else {
                None
            };
            let l2_cp = match (ppr_raw != consts::CP_INVALID, fcn) {
                (true, Some(fcn)) => {
                    let lambda = consts::GPS_C / glo_band_freq(Freq::L2, fcn);
                    Some(l1_prc / lambda + f64::from(ppr_raw) * 0.0005 / lambda)
                }
                _ => None,
            };
            fill_freq_data(
                &mut sat.obs[Freq::L2 as usize],
                code,
                l2_pr,
                l2_cp,
                lock_ind,
            );
            sat.obs[Freq::L2 as usize].cnr = l2_cnr;
            sat.obs[Freq::L2 as usize].flags.insert(ObsFlags::CNR);
        }
        msg.sats.push(sat);
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    fn example_gps_sat(sat_id: u8) -> SatData {
        let mut sat = SatData {
            sat_id,
            fcn: None,
            obs: Default::default(),
        };
        sat.obs[0] = FreqData {
            code: 0,
            pseudorange: 21_039_666.18,
            carrier_phase: 110_567_912.31,
            lock: 700.0,
            cnr: 42.25,
            flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK,
        };
        sat.obs[1] = FreqData {
            code: 0,
            pseudorange: 21_039_671.88,
            carrier_phase: 86_161_837.54,
            lock: 33.0,
            cnr: 38.75,
            flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK,
        };
        sat
    }

    #[test]
    fn lock_ind_monotone() {
        let mut prev = 0;
        for time in 0..1000 {
            let ind = to_lock_ind(f64::from(time));
            assert!(ind >= prev);
            prev = ind;
        }
        assert_eq!(to_lock_ind(936.9), 126);
        assert_eq!(to_lock_ind(937.0), 127);
    }

    #[test]
    fn lock_ind_round_trip() {
        for ind in 0..=127u8 {
            let time = from_lock_ind(ind);
            assert_eq!(to_lock_ind(time), ind, "indicator {ind} time {time}");
        }
    }

    #[test]
    fn msm_lock_time_round_trip() {
        for ind in 0..=15u8 {
            assert_eq!(encode_lock_time(decode_lock_time(ind)), ind);
        }
    }

    #[test]
    fn gps_1004_round_trip() {
        let msg = ObsMessage {
            header: ObsHeader {
                msg_num: 1004,
                stn_id: 813,
                tow_ms: 341_562_000,
                sync: false,
                div_free: false,
                smooth: 0,
            },
            sats: vec![example_gps_sat(3), example_gps_sat(17)],
        };

        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_gps_obs(&msg, &mut buf).unwrap();
        let decoded = decode_gps_obs(&buf[..len]).unwrap();

        assert_eq!(decoded.header, msg.header);
        assert_eq!(decoded.sats.len(), 2);
        for (got, want) in decoded.sats.iter().zip(msg.sats.iter()) {
            assert_eq!(got.sat_id, want.sat_id);
            for band in 0..NUM_FREQS {
                assert!(got.obs[band].flags.contains(ObsFlags::PR));
                assert!(got.obs[band].flags.contains(ObsFlags::CP));
                /* half of the 2 cm pseudorange quantization */
                assert_float_eq!(
                    got.obs[band].pseudorange,
                    want.obs[band].pseudorange,
                    abs <= 0.01
                );
                /* half of the 0.5 mm phase quantization, in cycles */
                assert_float_eq!(
                    got.obs[band].carrier_phase,
                    want.obs[band].carrier_phase,
                    abs <= 0.005
                );
                assert_float_eq!(got.obs[band].cnr, want.obs[band].cnr, abs <= 0.125);
            }
        }
    }

    #[test]
    fn glo_1012_round_trip() {
        let mut sat = SatData {
            sat_id: 2,
            fcn: Some(-4),
            obs: Default::default(),
        };
        sat.obs[0] = FreqData {
            code: 0,
            pseudorange: 20_113_709.68,
            carrier_phase: 107_330_634.24,
            lock: 121.0,
            cnr: 42.25,
            flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK,
        };
        sat.obs[1] = FreqData {
            code: 0,
            pseudorange: 20_113_712.52,
            carrier_phase: 83_479_382.01,
            lock: 11.0,
            cnr: 40.0,
            flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK,
        };

        let msg = ObsMessage {
            header: ObsHeader {
                msg_num: 1012,
                stn_id: 11,
                tow_ms: 41_864_000,
                sync: true,
                div_free: false,
                smooth: 0,
            },
            sats: vec![sat],
        };

        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_glo_obs(&msg, &mut buf).unwrap();
        let decoded = decode_glo_obs(&buf[..len]).unwrap();

        assert_eq!(decoded.header, msg.header);
        assert_eq!(decoded.sats.len(), 1);
        let got = &decoded.sats[0];
        assert_eq!(got.fcn, Some(-4));
        assert_float_eq!(
            got.obs[0].pseudorange,
            msg.sats[0].obs[0].pseudorange,
            abs <= 0.01
        );
        assert_float_eq!(
            got.obs[0].carrier_phase,
            msg.sats[0].obs[0].carrier_phase,
            abs <= 0.005
        );
        assert_float_eq!(
            got.obs[1].carrier_phase,
            msg.sats[0].obs[1].carrier_phase,
            abs <= 0.005
        );
    }

    #[test]
    fn glo_unknown_fcn_skipped() {
        let mut sat = SatData {
            sat_id: 2,
            fcn: None,
            obs: Default::default(),
        };
        sat.obs[0].flags = ObsFlags::PR | ObsFlags::CP;
        sat.obs[0].pseudorange = 20_113_709.68;
        sat.obs[0].carrier_phase = 107_330_634.24;

        let msg = ObsMessage {
            header: ObsHeader {
                msg_num: 1010,
                stn_id: 11,
                tow_ms: 41_864_000,
                sync: false,
                div_free: false,
                smooth: 0,
            },
            sats: vec![sat],
        };

        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_glo_obs(&msg, &mut buf).unwrap();
        let decoded = decode_glo_obs(&buf[..len]).unwrap();
        assert!(decoded.sats.is_empty());
    }

    #[test]
    fn phase_rollover_shifts_by_1500_cycles() {
        /* a phase minus range difference outside the 20 bit window must come
         * back shifted by a whole multiple of 1500 cycles */
        let mut sat = example_gps_sat(5);
        sat.obs[0].carrier_phase += 2000.0;
        let msg = ObsMessage {
            header: ObsHeader {
                msg_num: 1002,
                stn_id: 0,
                tow_ms: 0,
                sync: false,
                div_free: false,
                smooth: 0,
            },
            sats: vec![sat],
        };

        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_gps_obs(&msg, &mut buf).unwrap();
        let decoded = decode_gps_obs(&buf[..len]).unwrap();
        let diff = decoded.sats[0].obs[0].carrier_phase - msg.sats[0].obs[0].carrier_phase;
        let cycles = (diff / 1500.0).round() * 1500.0;
        assert_float_eq!(diff, cycles, abs <= 0.005);
    }
}
