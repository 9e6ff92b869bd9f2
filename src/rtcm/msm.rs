// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Multiple Signal Messages (RTCM 1071-1127)
//!
//! An MSM payload carries a satellite mask, a signal mask and a cell mask;
//! the cross product of set satellite and signal bits gives the cells, each
//! holding one observation. Ranges are split into a per-satellite rough part
//! and a per-cell fine part. MSM4/5 use the regular field resolutions, MSM6/7
//! the extended ones; MSM5/7 additionally carry phase range rates.

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitWriter};
use crate::rtcm::obs::{decode_lock_time, encode_lock_time, ObsFlags};
use crate::rtcm::{consts, DecodeError};
use crate::signal::{fcn_from_msm, fcn_to_msm, Code, Constellation};
use crate::time::consts as time_consts;

/// The MSM flavors
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, strum::Display)]
pub enum MsmType {
    /// Compact pseudoranges only
    Msm1,
    /// Compact phase ranges
    Msm2,
    /// Compact pseudoranges and phase ranges
    Msm3,
    /// Full pseudoranges, phase ranges and CN0
    Msm4,
    /// MSM4 plus Doppler
    Msm5,
    /// Extended resolution MSM4
    Msm6,
    /// Extended resolution MSM5
    Msm7,
}

impl MsmType {
    /// Derives the MSM flavor from a message number
    #[must_use]
    pub fn from_msg_num(msg_num: u16) -> Option<MsmType> {
        Constellation::from_msm_msg_num(msg_num)?;
        match msg_num % 10 {
            1 => Some(MsmType::Msm1),
            2 => Some(MsmType::Msm2),
            3 => Some(MsmType::Msm3),
            4 => Some(MsmType::Msm4),
            5 => Some(MsmType::Msm5),
            6 => Some(MsmType::Msm6),
            7 => Some(MsmType::Msm7),
            _ => None,
        }
    }

    fn has_doppler(self) -> bool {
        matches!(self, MsmType::Msm5 | MsmType::Msm7)
    }

    fn extended_resolution(self) -> bool {
        matches!(self, MsmType::Msm6 | MsmType::Msm7)
    }
}

/// MSM message header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsmHeader {
    /// Message number (DF002)
    pub msg_num: u16,
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// GNSS epoch time: GPS time of week, or GLONASS day of week plus time
    /// of day, folded to a time of week in milliseconds
    pub tow_ms: u32,
    /// Multiple message bit (DF393): set means more MSM messages for this
    /// epoch follow
    pub multiple: bool,
    /// Issue of data station (DF409)
    pub iods: u8,
    /// Reserved (DF001)
    pub reserved: u8,
    /// Clock steering indicator (DF411)
    pub steering: u8,
    /// External clock indicator (DF412)
    pub ext_clock: u8,
    /// Divergence-free smoothing indicator (DF417)
    pub div_free: bool,
    /// Smoothing interval (DF418)
    pub smooth: u8,
    /// GNSS satellite mask (DF394)
    #[serde(with = "serde_arrays")]
    pub satellite_mask: [bool; consts::MSM_SATELLITE_MASK_SIZE],
    /// GNSS signal mask (DF395)
    pub signal_mask: [bool; consts::MSM_SIGNAL_MASK_SIZE],
    /// GNSS cell mask (DF396)
    #[serde(with = "serde_arrays")]
    pub cell_mask: [bool; consts::MSM_MAX_CELLS],
}

mod serde_arrays {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        value: &[bool; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[bool; N], D::Error> {
        let vec = Vec::<bool>::deserialize(deserializer)?;
        let mut out = [false; N];
        for (slot, value) in out.iter_mut().zip(vec) {
            *slot = value;
        }
        Ok(out)
    }
}

impl Default for MsmHeader {
    fn default() -> Self {
        MsmHeader {
            msg_num: 0,
            stn_id: 0,
            tow_ms: 0,
            multiple: false,
            iods: 0,
            reserved: 0,
            steering: 0,
            ext_clock: 0,
            div_free: false,
            smooth: 0,
            satellite_mask: [false; consts::MSM_SATELLITE_MASK_SIZE],
            signal_mask: [false; consts::MSM_SIGNAL_MASK_SIZE],
            cell_mask: [false; consts::MSM_MAX_CELLS],
        }
    }
}

impl MsmHeader {
    /// The constellation this message belongs to
    #[must_use]
    pub fn constellation(&self) -> Option<Constellation> {
        Constellation::from_msm_msg_num(self.msg_num)
    }

    /// The MSM flavor of this message
    #[must_use]
    pub fn msm_type(&self) -> Option<MsmType> {
        MsmType::from_msg_num(self.msg_num)
    }

    /// Number of satellites set in the satellite mask
    #[must_use]
    pub fn num_sats(&self) -> usize {
        self.satellite_mask.iter().filter(|&&b| b).count()
    }

    /// Number of signals set in the signal mask
    #[must_use]
    pub fn num_sigs(&self) -> usize {
        self.signal_mask.iter().filter(|&&b| b).count()
    }

    /// Number of cells set in the cell mask
    #[must_use]
    pub fn num_cells(&self) -> usize {
        let size = self.num_sats() * self.num_sigs();
        self.cell_mask[..size.min(consts::MSM_MAX_CELLS)]
            .iter()
            .filter(|&&b| b)
            .count()
    }
}

/// Per-satellite rough values
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsmSatData {
    /// GLONASS frequency channel, MSM5/7 only
    pub glo_fcn: Option<i8>,
    /// Rough range in milliseconds
    pub rough_range_ms: f64,
    /// Rough range rate in m/s
    pub rough_range_rate_m_s: f64,
}

/// Per-cell observation values
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsmSignalData {
    /// Full pseudorange in milliseconds
    pub pseudorange_ms: f64,
    /// Full phase range in milliseconds
    pub carrier_phase_ms: f64,
    /// Lock time in seconds
    pub lock_time_s: f64,
    /// Half cycle ambiguity indicator (DF420): set when the half cycle
    /// ambiguity is unresolved
    pub hca_indicator: bool,
    /// Carrier to noise ratio in dB-Hz
    pub cnr: f64,
    /// Field validity
    pub flags: ObsFlags,
    /// Phase range rate in m/s, MSM5/7 only
    pub range_rate_m_s: f64,
}

/// A decoded MSM message
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsmMessage {
    /// Message header with the masks
    pub header: MsmHeader,
    /// One entry per set satellite mask bit, in mask order
    pub sats: Vec<MsmSatData>,
    /// One entry per set cell mask bit, in mask order
    pub signals: Vec<MsmSignalData>,
}

impl MsmMessage {
    /// Iterates over the set cells as (satellite mask index, signal mask
    /// index, satellite data, signal data)
    pub fn cells(&self) -> impl Iterator<Item = (u8, u8, &MsmSatData, &MsmSignalData)> {
        let num_sigs = self.header.num_sigs();
        let sat_indices: Vec<u8> = (0..consts::MSM_SATELLITE_MASK_SIZE as u8)
            .filter(|&i| self.header.satellite_mask[usize::from(i)])
            .collect();
        let sig_indices: Vec<u8> = (0..consts::MSM_SIGNAL_MASK_SIZE as u8)
            .filter(|&i| self.header.signal_mask[usize::from(i)])
            .collect();

        let mut out = Vec::with_capacity(self.signals.len());
        let mut cell = 0usize;
        for (sat_pos, &sat_idx) in sat_indices.iter().enumerate() {
            for (sig_pos, &sig_idx) in sig_indices.iter().enumerate() {
                if self.header.cell_mask[sat_pos * num_sigs + sig_pos] {
                    if cell < self.signals.len() && sat_pos < self.sats.len() {
                        out.push((sat_idx, sig_idx, sat_pos, cell));
                    }
                    cell += 1;
                }
            }
        }
        out.into_iter()
            .map(move |(sat_idx, sig_idx, sat_pos, cell)| {
                (sat_idx, sig_idx, &self.sats[sat_pos], &self.signals[cell])
            })
    }
}

/// Reads the multiple message bit (DF393) straight out of an MSM payload
///
/// The scanner uses this before full decoding to learn whether more messages
/// of the same epoch follow. The bit sits at a fixed offset of 54 bits.
#[must_use]
pub fn multiple_message_bit(payload: &[u8]) -> Option<bool> {
    let mut reader = BitReader::new(payload);
    reader.seek(54).ok()?;
    reader.read_bool().ok()
}

/// Maps an MSM signal mask index (1-based, DF395) to a signal code
#[must_use]
pub fn msm_signal_to_code(cons: Constellation, signal_id: u8) -> Option<Code> {
    match cons {
        Constellation::Gps => match signal_id {
            2 => Some(Code::GpsL1ca),
            3 | 4 => Some(Code::GpsL1p),
            9 | 10 => Some(Code::GpsL2p),
            15 => Some(Code::GpsL2cm),
            16 => Some(Code::GpsL2cl),
            17 => Some(Code::GpsL2cx),
            22 => Some(Code::GpsL5i),
            23 => Some(Code::GpsL5q),
            24 => Some(Code::GpsL5x),
            30 => Some(Code::GpsL1ci),
            31 => Some(Code::GpsL1cq),
            32 => Some(Code::GpsL1cx),
            _ => None,
        },
        Constellation::Glo => match signal_id {
            2 => Some(Code::GloL1of),
            3 => Some(Code::GloL1p),
            8 => Some(Code::GloL2of),
            9 => Some(Code::GloL2p),
            _ => None,
        },
        Constellation::Gal => match signal_id {
            2 => Some(Code::GalE1c),
            4 => Some(Code::GalE1b),
            5 => Some(Code::GalE1x),
            8 => Some(Code::GalE6c),
            10 => Some(Code::GalE6b),
            11 => Some(Code::GalE6x),
            14 => Some(Code::GalE7i),
            15 => Some(Code::GalE7q),
            16 => Some(Code::GalE7x),
            18 => Some(Code::GalE8i),
            19 => Some(Code::GalE8q),
            20 => Some(Code::GalE8x),
            22 => Some(Code::GalE5i),
            23 => Some(Code::GalE5q),
            24 => Some(Code::GalE5x),
            _ => None,
        },
        Constellation::Sbas => match signal_id {
            2 => Some(Code::SbasL1ca),
            22 => Some(Code::SbasL5i),
            23 => Some(Code::SbasL5q),
            24 => Some(Code::SbasL5x),
            _ => None,
        },
        Constellation::Qzs => match signal_id {
            2 => Some(Code::QzsL1ca),
            15 => Some(Code::QzsL2cm),
            16 => Some(Code::QzsL2cl),
            17 => Some(Code::QzsL2cx),
            22 => Some(Code::QzsL5i),
            23 => Some(Code::QzsL5q),
            24 => Some(Code::QzsL5x),
            30 => Some(Code::QzsL1ci),
            31 => Some(Code::QzsL1cq),
            32 => Some(Code::QzsL1cx),
            _ => None,
        },
        Constellation::Bds => match signal_id {
            2 => Some(Code::Bds2B1),
            8 => Some(Code::Bds3B3i),
            9 => Some(Code::Bds3B3q),
            10 => Some(Code::Bds3B3x),
            14 => Some(Code::Bds2B2),
            15 => Some(Code::Bds3B7q),
            16 => Some(Code::Bds3B7x),
            22 => Some(Code::Bds3B5i),
            23 => Some(Code::Bds3B5q),
            24 => Some(Code::Bds3B5x),
            30 => Some(Code::Bds3B1ci),
            31 => Some(Code::Bds3B1cq),
            32 => Some(Code::Bds3B1cx),
            _ => None,
        },
    }
}

/// Maps a signal code to its MSM signal mask index (1-based, DF395)
#[must_use]
pub fn code_to_msm_signal(code: Code) -> Option<u8> {
    let cons = code.to_constellation();
    (1..=consts::MSM_SIGNAL_MASK_SIZE as u8)
        .find(|&id| msm_signal_to_code(cons, id) == Some(code))
}

/// Convert a 10-bit extended Lock Time Indicator DF407 into the minimum lock
/// time in seconds it stands for
#[must_use]
pub fn decode_lock_time_ext(lock: u16) -> f64 {
    let lock = lock.min(704);
    let ms = if lock < 64 {
        f64::from(lock)
    } else {
        let k = u32::from(lock / 32) - 1;
        (1u64 << k) as f64 * f64::from(lock - (32 * k as u16))
    };
    ms / 1000.0
}

fn decode_msm_header(reader: &mut BitReader<'_>) -> Result<MsmHeader, DecodeError> {
    let msg_num = reader.read_u16(12)?;
    let cons = Constellation::from_msm_msg_num(msg_num)
        .ok_or(DecodeError::UnsupportedMessage(msg_num))?;

    let stn_id = reader.read_u16(12)?;
    let tow_ms = if cons == Constellation::Glo {
        /* day of week and time of day */
        let dow = reader.read_u8(3)?;
        let tod_ms = reader.read_u32(27)?;
        u32::from(dow) * time_consts::DAY_MS + tod_ms
    } else {
        reader.read_u32(30)?
    };

    let mut header = MsmHeader {
        msg_num,
        stn_id,
        tow_ms,
        multiple: reader.read_bool()?,
        iods: reader.read_u8(3)?,
        reserved: reader.read_u8(7)?,
        steering: reader.read_u8(2)?,
        ext_clock: reader.read_u8(2)?,
        div_free: reader.read_bool()?,
        smooth: reader.read_u8(3)?,
        ..Default::default()
    };

    for bit in header.satellite_mask.iter_mut() {
        *bit = reader.read_bool()?;
    }
    for bit in header.signal_mask.iter_mut() {
        *bit = reader.read_bool()?;
    }
    let cell_mask_size = header.num_sats() * header.num_sigs();
    if cell_mask_size > consts::MSM_MAX_CELLS {
        return Err(DecodeError::InvalidMessage(msg_num));
    }
    for bit in header.cell_mask.iter_mut().take(cell_mask_size) {
        *bit = reader.read_bool()?;
    }
    Ok(header)
}

/// Decodes an MSM4-MSM7 payload
///
/// MSM1-3 headers parse but their observation bodies are not supported.
pub fn decode_msm(payload: &[u8]) -> Result<MsmMessage, DecodeError> {
    let mut reader = BitReader::new(payload);
    let header = decode_msm_header(&mut reader)?;
    let msm_type = header
        .msm_type()
        .ok_or(DecodeError::UnsupportedMessage(header.msg_num))?;
    if msm_type < MsmType::Msm4 {
        return Err(DecodeError::UnsupportedMessage(header.msg_num));
    }

    let num_sats = header.num_sats();
    let num_cells = header.num_cells();

    /* satellite data: integer milliseconds first (DF397) */
    let mut int_ms = vec![0u8; num_sats];
    for value in int_ms.iter_mut() {
        *value = reader.read_u8(8)?;
    }
    let mut fcns = vec![None; num_sats];
    if msm_type.has_doppler() {
        /* extended satellite info carries the FCN for GLONASS (DF419) */
        for fcn in fcns.iter_mut() {
            let raw = reader.read_u8(4)?;
            *fcn = fcn_from_msm(raw);
        }
    }
    let mut sats = Vec::with_capacity(num_sats);
    for i in 0..num_sats {
        /* rough range modulo 1 ms (DF398) */
        let modulo = reader.read_u16(10)?;
        sats.push(MsmSatData {
            glo_fcn: fcns[i],
            rough_range_ms: if int_ms[i] == consts::MSM_ROUGH_RANGE_INVALID {
                f64::NAN
            } else {
                f64::from(int_ms[i]) + f64::from(modulo) / 1024.0
            },
            rough_range_rate_m_s: 0.0,
        });
    }
    let mut rate_valid = vec![false; num_sats];
    if msm_type.has_doppler() {
        /* rough range rate (DF399) */
        for (sat, valid) in sats.iter_mut().zip(rate_valid.iter_mut()) {
            let rate = reader.read_i16(14)?;
            *valid = rate != consts::MSM_ROUGH_RATE_INVALID;
            sat.rough_range_rate_m_s = f64::from(rate);
        }
    }

    /* signal data, field major */
    let ext = msm_type.extended_resolution();
    let mut signals = vec![MsmSignalData::default(); num_cells];

    /* fine pseudoranges (DF400/DF405) */
    for signal in signals.iter_mut() {
        let (raw, invalid, scale) = if ext {
            (reader.read_i32(20)?, consts::MSM_PR_EXT_INVALID, consts::C_1_2P29)
        } else {
            (reader.read_i32(15)?, consts::MSM_PR_INVALID, consts::C_1_2P24)
        };
        if raw != invalid {
            signal.pseudorange_ms = f64::from(raw) * scale;
            signal.flags.insert(ObsFlags::PR);
        }
    }
    /* fine phase ranges (DF401/DF406) */
    for signal in signals.iter_mut() {
        let (raw, invalid, scale) = if ext {
            (reader.read_i32(24)?, consts::MSM_CP_EXT_INVALID, consts::C_1_2P31)
        } else {
            (reader.read_i32(22)?, consts::MSM_CP_INVALID, consts::C_1_2P29)
        };
        if raw != invalid {
            signal.carrier_phase_ms = f64::from(raw) * scale;
            signal.flags.insert(ObsFlags::CP);
        }
    }
    /* lock times (DF402/DF407) */
    for signal in signals.iter_mut() {
        signal.lock_time_s = if ext {
            decode_lock_time_ext(reader.read_u16(10)?)
        } else {
            decode_lock_time(reader.read_u8(4)?)
        };
        signal.flags.insert(ObsFlags::LOCK);
    }
    /* half cycle ambiguity indicators (DF420) */
    for signal in signals.iter_mut() {
        signal.hca_indicator = reader.read_bool()?;
    }
    /* CN0 (DF403/DF408) */
    for signal in signals.iter_mut() {
        let cnr = if ext {
            f64::from(reader.read_u16(10)?) * consts::C_1_2P4
        } else {
            f64::from(reader.read_u8(6)?)
        };
        if cnr != 0.0 {
            signal.cnr = cnr;
            signal.flags.insert(ObsFlags::CNR);
        }
    }
    /* fine phase range rates (DF404) */
    if msm_type.has_doppler() {
        for signal in signals.iter_mut() {
            let raw = reader.read_i32(15)?;
            if raw != consts::MSM_DOP_INVALID {
                signal.range_rate_m_s = f64::from(raw) * 0.0001;
                signal.flags.insert(ObsFlags::DOP);
            }
        }
    }

    /* resolve the per-cell fine values into full values */
    let mut msg = MsmMessage {
        header,
        sats,
        signals,
    };
    let num_sigs = msg.header.num_sigs();
    let mut cell = 0usize;
    for sat_pos in 0..num_sats {
        for sig_pos in 0..num_sigs {
            if !msg.header.cell_mask[sat_pos * num_sigs + sig_pos] {
                continue;
            }
            let rough_ms = msg.sats[sat_pos].rough_range_ms;
            let rough_rate = msg.sats[sat_pos].rough_range_rate_m_s;
            let signal = &mut msg.signals[cell];
            if rough_ms.is_nan() {
                signal.flags.remove(ObsFlags::PR);
                signal.flags.remove(ObsFlags::CP);
            } else {
                signal.pseudorange_ms += rough_ms;
                signal.carrier_phase_ms += rough_ms;
            }
            if !rate_valid[sat_pos] {
                signal.flags.remove(ObsFlags::DOP);
            } else {
                signal.range_rate_m_s += rough_rate;
            }
            cell += 1;
        }
    }

    Ok(msg)
}

/// Encodes an MSM4 or MSM5 message into `buf`, returning the payload length
pub fn encode_msm(msg: &MsmMessage, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let msm_type = msg
        .header
        .msm_type()
        .ok_or(DecodeError::UnsupportedMessage(msg.header.msg_num))?;
    if msm_type != MsmType::Msm4 && msm_type != MsmType::Msm5 {
        return Err(DecodeError::UnsupportedMessage(msg.header.msg_num));
    }
    let cons = msg
        .header
        .constellation()
        .ok_or(DecodeError::UnsupportedMessage(msg.header.msg_num))?;

    let num_sats = msg.header.num_sats();
    let num_sigs = msg.header.num_sigs();
    let num_cells = msg.header.num_cells();
    if num_sats * num_sigs > consts::MSM_MAX_CELLS
        || msg.sats.len() != num_sats
        || msg.signals.len() != num_cells
    {
        return Err(DecodeError::InvalidMessage(msg.header.msg_num));
    }

    let mut writer = BitWriter::new(buf);
    writer.write_u64(u64::from(msg.header.msg_num), 12)?;
    writer.write_u64(u64::from(msg.header.stn_id), 12)?;
    if cons == Constellation::Glo {
        let dow = msg.header.tow_ms / time_consts::DAY_MS;
        let tod_ms = msg.header.tow_ms - dow * time_consts::DAY_MS;
        writer.write_u64(u64::from(dow), 3)?;
        writer.write_u64(u64::from(tod_ms), 27)?;
    } else {
        writer.write_u64(u64::from(msg.header.tow_ms), 30)?;
    }
    writer.write_bool(msg.header.multiple)?;
    writer.write_u64(u64::from(msg.header.iods), 3)?;
    writer.write_u64(u64::from(msg.header.reserved), 7)?;
    writer.write_u64(u64::from(msg.header.steering), 2)?;
    writer.write_u64(u64::from(msg.header.ext_clock), 2)?;
    writer.write_bool(msg.header.div_free)?;
    writer.write_u64(u64::from(msg.header.smooth), 3)?;

    for &bit in &msg.header.satellite_mask {
        writer.write_bool(bit)?;
    }
    for &bit in &msg.header.signal_mask {
        writer.write_bool(bit)?;
    }
    for &bit in &msg.header.cell_mask[..num_sats * num_sigs] {
        writer.write_bool(bit)?;
    }

    /* satellite data */
    let mut rough_range_ms = vec![0.0f64; num_sats];
    let mut rough_rate = vec![0.0f64; num_sats];

    let mut int_ms = vec![0u8; num_sats];
    for (i, sat) in msg.sats.iter().enumerate() {
        int_ms[i] = sat.rough_range_ms.floor() as u8;
        writer.write_u64(u64::from(int_ms[i]), 8)?;
    }
    if msm_type == MsmType::Msm5 {
        for sat in &msg.sats {
            writer.write_u64(u64::from(fcn_to_msm(sat.glo_fcn) & 0x0F), 4)?;
        }
    }
    for (i, sat) in msg.sats.iter().enumerate() {
        let range_modulo_ms = sat.rough_range_ms - f64::from(int_ms[i]);
        let encoded = (1024.0 * range_modulo_ms).round() as u16;
        writer.write_u64(u64::from(encoded), 10)?;
        rough_range_ms[i] = f64::from(int_ms[i]) + f64::from(encoded) / 1024.0;
    }
    if msm_type == MsmType::Msm5 {
        for (i, sat) in msg.sats.iter().enumerate() {
            let rate = sat.rough_range_rate_m_s as i16;
            writer.write_i64(i64::from(rate), 14)?;
            rough_rate[i] = f64::from(rate);
        }
    }

    /* collect fine values in cell order */
    let mut fine_pr = vec![0.0f64; num_cells];
    let mut fine_cp = vec![0.0f64; num_cells];
    let mut fine_rate = vec![0.0f64; num_cells];
    let mut flags = vec![ObsFlags::default(); num_cells];

    let mut cell = 0usize;
    for sat_pos in 0..num_sats {
        for sig_pos in 0..num_sigs {
            if !msg.header.cell_mask[sat_pos * num_sigs + sig_pos] {
                continue;
            }
            let signal = &msg.signals[cell];
            flags[cell] = signal.flags;
            if signal.flags.contains(ObsFlags::PR) {
                fine_pr[cell] = signal.pseudorange_ms - rough_range_ms[sat_pos];
            }
            if signal.flags.contains(ObsFlags::CP) {
                fine_cp[cell] = signal.carrier_phase_ms - rough_range_ms[sat_pos];
            }
            if msm_type == MsmType::Msm5 && signal.flags.contains(ObsFlags::DOP) {
                fine_rate[cell] = signal.range_rate_m_s - rough_rate[sat_pos];
            }
            cell += 1;
        }
    }

    /* fine pseudoranges (DF400) */
    for i in 0..num_cells {
        if flags[i].contains(ObsFlags::PR) && fine_pr[i].abs() < consts::C_1_2P10 {
            writer.write_i64((fine_pr[i] / consts::C_1_2P24).round() as i64, 15)?;
        } else {
            writer.write_i64(i64::from(consts::MSM_PR_INVALID), 15)?;
        }
    }
    /* fine phase ranges (DF401) */
    for i in 0..num_cells {
        if flags[i].contains(ObsFlags::CP) && fine_cp[i].abs() < consts::C_1_2P8 {
            writer.write_i64((fine_cp[i] / consts::C_1_2P29).round() as i64, 22)?;
        } else {
            writer.write_i64(i64::from(consts::MSM_CP_INVALID), 22)?;
        }
    }
    /* lock times (DF402) */
    for (i, signal) in msg.signals.iter().enumerate() {
        if flags[i].contains(ObsFlags::LOCK) {
            writer.write_u64(u64::from(encode_lock_time(signal.lock_time_s)), 4)?;
        } else {
            writer.write_u64(0, 4)?;
        }
    }
    /* half cycle ambiguity (DF420) */
    for signal in &msg.signals {
        writer.write_bool(signal.hca_indicator)?;
    }
    /* CN0 (DF403) */
    for (i, signal) in msg.signals.iter().enumerate() {
        if flags[i].contains(ObsFlags::CNR) {
            writer.write_u64(signal.cnr.round() as u64, 6)?;
        } else {
            writer.write_u64(0, 6)?;
        }
    }
    /* fine phase range rates (DF404) */
    if msm_type == MsmType::Msm5 {
        for i in 0..num_cells {
            if flags[i].contains(ObsFlags::DOP) && fine_rate[i].abs() < 0.0001 * consts::C_2P14 {
                writer.write_i64((fine_rate[i] / 0.0001).round() as i64, 15)?;
            } else {
                writer.write_i64(i64::from(consts::MSM_DOP_INVALID), 15)?;
            }
        }
    }

    Ok(writer.byte_len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    fn example_msm5() -> MsmMessage {
        let mut header = MsmHeader {
            msg_num: 1075,
            stn_id: 7,
            tow_ms: 341_562_000,
            multiple: false,
            ..Default::default()
        };
        /* sats 3 and 17, signals 1C and 5Q */
        header.satellite_mask[2] = true;
        header.satellite_mask[16] = true;
        header.signal_mask[1] = true;
        header.signal_mask[22] = true;
        header.cell_mask[0] = true;
        header.cell_mask[1] = true;
        header.cell_mask[2] = true;
        /* satellite 17 tracks L1CA only */

        let sats = vec![
            MsmSatData {
                glo_fcn: None,
                rough_range_ms: 70.0 + 250.0 / 1024.0,
                rough_range_rate_m_s: -890.0,
            },
            MsmSatData {
                glo_fcn: None,
                rough_range_ms: 73.0 + 511.0 / 1024.0,
                rough_range_rate_m_s: 431.0,
            },
        ];
        let mut signal = MsmSignalData {
            pseudorange_ms: 70.0 + 250.5 / 1024.0,
            carrier_phase_ms: 70.0 + 250.4 / 1024.0,
            lock_time_s: 130.0,
            hca_indicator: false,
            cnr: 45.0,
            flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK | ObsFlags::DOP,
            range_rate_m_s: -890.154,
        };
        let signals = vec![
            signal,
            {
                signal.pseudorange_ms += 0.0001;
                signal.range_rate_m_s = -890.5;
                signal
            },
            MsmSignalData {
                pseudorange_ms: 73.0 + 510.0 / 1024.0,
                carrier_phase_ms: 73.0 + 510.2 / 1024.0,
                lock_time_s: 0.1,
                hca_indicator: true,
                cnr: 33.0,
                flags: ObsFlags::PR | ObsFlags::CP | ObsFlags::CNR | ObsFlags::LOCK | ObsFlags::DOP,
                range_rate_m_s: 431.25,
            },
        ];
        MsmMessage {
            header,
            sats,
            signals,
        }
    }

    #[test]
    fn msm_type_from_msg_num() {
        assert_eq!(MsmType::from_msg_num(1074), Some(MsmType::Msm4));
        assert_eq!(MsmType::from_msg_num(1087), Some(MsmType::Msm7));
        assert_eq!(MsmType::from_msg_num(1121), Some(MsmType::Msm1));
        assert_eq!(MsmType::from_msg_num(1128), None);
        assert_eq!(MsmType::from_msg_num(1004), None);
    }

    #[test]
    fn msm5_round_trip() {
        let msg = example_msm5();
        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_msm(&msg, &mut buf).unwrap();
        let decoded = decode_msm(&buf[..len]).unwrap();

        assert_eq!(decoded.header, msg.header);
        assert_eq!(decoded.sats.len(), 2);
        assert_eq!(decoded.signals.len(), 3);
        for (got, want) in decoded.signals.iter().zip(msg.signals.iter()) {
            assert_eq!(got.flags, want.flags);
            /* half of 2^-24 ms converted to meters is ~9 mm */
            assert_float_eq!(got.pseudorange_ms, want.pseudorange_ms, abs <= consts::C_1_2P24);
            assert_float_eq!(
                got.carrier_phase_ms,
                want.carrier_phase_ms,
                abs <= consts::C_1_2P29
            );
            assert_float_eq!(got.range_rate_m_s, want.range_rate_m_s, abs <= 0.0001);
            assert_float_eq!(got.cnr, want.cnr, abs <= 0.5);
            assert_eq!(got.hca_indicator, want.hca_indicator);
        }
    }

    #[test]
    fn msm4_drops_doppler() {
        let mut msg = example_msm5();
        msg.header.msg_num = 1074;
        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_msm(&msg, &mut buf).unwrap();
        let decoded = decode_msm(&buf[..len]).unwrap();
        for signal in &decoded.signals {
            assert!(!signal.flags.contains(ObsFlags::DOP));
        }
    }

    #[test]
    fn glo_msm5_keeps_fcn_and_epoch() {
        let mut msg = example_msm5();
        msg.header.msg_num = 1085;
        /* GLONASS epoch folds into day of week and time of day */
        msg.header.tow_ms = 2 * time_consts::DAY_MS + 41_864_000;
        msg.sats[0].glo_fcn = Some(-4);
        msg.sats[1].glo_fcn = Some(6);

        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_msm(&msg, &mut buf).unwrap();
        let decoded = decode_msm(&buf[..len]).unwrap();
        assert_eq!(decoded.header.tow_ms, msg.header.tow_ms);
        assert_eq!(decoded.sats[0].glo_fcn, Some(-4));
        assert_eq!(decoded.sats[1].glo_fcn, Some(6));
    }

    #[test]
    fn multiple_message_bit_offset() {
        let mut msg = example_msm5();
        msg.header.multiple = true;
        let mut buf = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = encode_msm(&msg, &mut buf).unwrap();
        assert_eq!(multiple_message_bit(&buf[..len]), Some(true));

        msg.header.multiple = false;
        let len = encode_msm(&msg, &mut buf).unwrap();
        assert_eq!(multiple_message_bit(&buf[..len]), Some(false));
    }

    #[test]
    fn cells_iterator_pairs_sats_and_signals() {
        let msg = example_msm5();
        let cells: Vec<_> = msg.cells().collect();
        assert_eq!(cells.len(), 3);
        /* mask indices are zero based; satellite 3 is bit 2 */
        assert_eq!(cells[0].0, 2);
        assert_eq!(cells[1].0, 2);
        assert_eq!(cells[2].0, 16);
        assert_eq!(cells[0].1, 1);
        assert_eq!(cells[1].1, 22);
    }

    #[test]
    fn signal_code_mapping_round_trip() {
        for cons in Constellation::iter() {
            for id in 1..=consts::MSM_SIGNAL_MASK_SIZE as u8 {
                if let Some(code) = msm_signal_to_code(cons, id) {
                    assert_eq!(code.to_constellation(), cons);
                    /* the reverse lookup picks the first matching id, decode
                     * of that id must give the same code back */
                    let back = code_to_msm_signal(code).unwrap();
                    assert_eq!(msm_signal_to_code(cons, back), Some(code));
                }
            }
        }
        assert_eq!(code_to_msm_signal(Code::GpsL1ca), Some(2));
        assert_eq!(code_to_msm_signal(Code::GloL2of), Some(8));
    }

    #[test]
    fn ext_lock_time_table() {
        assert_float_eq!(decode_lock_time_ext(0), 0.0, abs <= 1e-12);
        assert_float_eq!(decode_lock_time_ext(63), 0.063, abs <= 1e-12);
        assert_float_eq!(decode_lock_time_ext(64), 0.064, abs <= 1e-12);
        assert_float_eq!(decode_lock_time_ext(95), 0.126, abs <= 1e-12);
        assert_float_eq!(decode_lock_time_ext(96), 0.128, abs <= 1e-12);
        /* saturation */
        assert_float_eq!(decode_lock_time_ext(704), 67_108.864, abs <= 1e-6);
        assert_float_eq!(decode_lock_time_ext(1023), 67_108.864, abs <= 1e-6);
    }
}
