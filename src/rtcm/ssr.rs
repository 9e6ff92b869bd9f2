// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! State space representation corrections: satellite orbit, clock and code
//! bias messages
//!
//! Orbit and clock corrections travel in separate messages per constellation
//! (1057/1058 for GPS, 1063/1064 for GLONASS, 1240/1241 for Galileo,
//! 1246/1247 for QZSS, 1258/1259 for BeiDou) or combined (1060/1066/1243/
//! 1249/1261). Correction values stay in their raw quantized integers.

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitWriter};
use crate::rtcm::DecodeError;
use crate::signal::Constellation;

/// The SSR correction kinds this codec understands
#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::Display)]
pub enum SsrKind {
    /// Orbit corrections
    Orbit,
    /// Clock corrections
    Clock,
    /// Combined orbit and clock corrections
    OrbitClock,
    /// Code biases
    CodeBias,
}

/// Maps an SSR message number to its constellation and kind
#[must_use]
pub fn ssr_message_kind(msg_num: u16) -> Option<(Constellation, SsrKind)> {
    let (cons, offset) = match msg_num {
        1057..=1062 => (Constellation::Gps, msg_num - 1057),
        1063..=1068 => (Constellation::Glo, msg_num - 1063),
        1240..=1245 => (Constellation::Gal, msg_num - 1240),
        1246..=1251 => (Constellation::Qzs, msg_num - 1246),
        1258..=1263 => (Constellation::Bds, msg_num - 1258),
        _ => return None,
    };
    let kind = match offset {
        0 => SsrKind::Orbit,
        1 => SsrKind::Clock,
        2 => SsrKind::CodeBias,
        3 => SsrKind::OrbitClock,
        /* URA and high rate clock messages are not carried */
        _ => return None,
    };
    Some((cons, kind))
}

/// Maps a constellation and kind back to the SSR message number
#[must_use]
pub fn ssr_message_number(cons: Constellation, kind: SsrKind) -> Option<u16> {
    let base = match cons {
        Constellation::Gps => 1057,
        Constellation::Glo => 1063,
        Constellation::Gal => 1240,
        Constellation::Qzs => 1246,
        Constellation::Bds => 1258,
        Constellation::Sbas => return None,
    };
    let offset = match kind {
        SsrKind::Orbit => 0,
        SsrKind::Clock => 1,
        SsrKind::CodeBias => 2,
        SsrKind::OrbitClock => 3,
    };
    Some(base + offset)
}

fn sat_id_bits(cons: Constellation) -> usize {
    match cons {
        Constellation::Glo => 5,
        Constellation::Qzs => 4,
        _ => 6,
    }
}

fn iode_bits(cons: Constellation) -> usize {
    match cons {
        Constellation::Gal | Constellation::Bds => 10,
        _ => 8,
    }
}

fn epoch_time_bits(cons: Constellation) -> usize {
    if cons == Constellation::Glo {
        17
    } else {
        20
    }
}

/// Common header of the SSR messages
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsrHeader {
    /// Message number
    pub msg_num: u16,
    /// Epoch time in seconds, GPS time of week or GLONASS time of day
    pub epoch_time: u32,
    /// Update interval index (DF391)
    pub update_interval: u8,
    /// Multiple message indicator
    pub multi_message: bool,
    /// Satellite reference datum, orbit messages only
    pub sat_ref_datum: bool,
    /// Issue of data SSR
    pub iod_ssr: u8,
    /// SSR provider id
    pub provider_id: u16,
    /// SSR solution id
    pub solution_id: u8,
}

impl SsrHeader {
    /// The constellation of this message
    #[must_use]
    pub fn constellation(&self) -> Option<Constellation> {
        ssr_message_kind(self.msg_num).map(|(cons, _)| cons)
    }

    /// The correction kind of this message
    #[must_use]
    pub fn kind(&self) -> Option<SsrKind> {
        ssr_message_kind(self.msg_num).map(|(_, kind)| kind)
    }
}

/// Orbit correction of one satellite, raw wire integers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrbitCorr {
    pub sat_id: u8,
    pub iode: u16,
    /// BeiDou only, issue of data CRC
    pub iodcrc: u32,
    pub radial: i32,
    pub along_track: i32,
    pub cross_track: i32,
    pub dot_radial: i32,
    pub dot_along_track: i32,
    pub dot_cross_track: i32,
}

/// Clock correction of one satellite, raw wire integers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ClockCorr {
    pub sat_id: u8,
    pub c0: i32,
    pub c1: i32,
    pub c2: i32,
}

/// Code bias of one signal
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBias {
    /// Signal and tracking mode indicator
    pub signal_id: u8,
    /// Bias in 0.01 m units
    pub bias: i16,
}

/// Code biases of one satellite
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBiasSat {
    /// Satellite id
    pub sat_id: u8,
    /// Per-signal biases
    pub biases: Vec<CodeBias>,
}

/// A decoded SSR message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SsrMessage {
    /// Orbit corrections
    Orbit {
        /// Common header
        header: SsrHeader,
        /// Per-satellite corrections
        orbits: Vec<OrbitCorr>,
    },
    /// Clock corrections
    Clock {
        /// Common header
        header: SsrHeader,
        /// Per-satellite corrections
        clocks: Vec<ClockCorr>,
    },
    /// Combined orbit and clock corrections
    OrbitClock {
        /// Common header
        header: SsrHeader,
        /// Per-satellite orbit corrections
        orbits: Vec<OrbitCorr>,
        /// Per-satellite clock corrections
        clocks: Vec<ClockCorr>,
    },
    /// Code biases
    CodeBias {
        /// Common header
        header: SsrHeader,
        /// Per-satellite biases
        sats: Vec<CodeBiasSat>,
    },
}

impl SsrMessage {
    /// The common header
    #[must_use]
    pub fn header(&self) -> &SsrHeader {
        match self {
            SsrMessage::Orbit { header, .. }
            | SsrMessage::Clock { header, .. }
            | SsrMessage::OrbitClock { header, .. }
            | SsrMessage::CodeBias { header, .. } => header,
        }
    }
}

fn decode_ssr_header(
    reader: &mut BitReader<'_>,
    msg_num: u16,
    cons: Constellation,
    kind: SsrKind,
) -> Result<(SsrHeader, u8), DecodeError> {
    let epoch_time = reader.read_u32(epoch_time_bits(cons))?;
    let update_interval = reader.read_u8(4)?;
    let multi_message = reader.read_bool()?;
    let sat_ref_datum = if matches!(kind, SsrKind::Orbit | SsrKind::OrbitClock) {
        reader.read_bool()?
    } else {
        false
    };
    let iod_ssr = reader.read_u8(4)?;
    let provider_id = reader.read_u16(16)?;
    let solution_id = reader.read_u8(4)?;
    let num_sats = reader.read_u8(6)?;
    Ok((
        SsrHeader {
            msg_num,
            epoch_time,
            update_interval,
            multi_message,
            sat_ref_datum,
            iod_ssr,
            provider_id,
            solution_id,
        },
        num_sats,
    ))
}

fn encode_ssr_header(
    writer: &mut BitWriter<'_>,
    header: &SsrHeader,
    num_sats: u8,
) -> Result<(), DecodeError> {
    let (cons, kind) =
        ssr_message_kind(header.msg_num).ok_or(DecodeError::UnsupportedMessage(header.msg_num))?;
    writer.write_u64(u64::from(header.msg_num), 12)?;
    writer.write_u64(u64::from(header.epoch_time), epoch_time_bits(cons))?;
    writer.write_u64(u64::from(header.update_interval), 4)?;
    writer.write_bool(header.multi_message)?;
    if matches!(kind, SsrKind::Orbit | SsrKind::OrbitClock) {
        writer.write_bool(header.sat_ref_datum)?;
    }
    writer.write_u64(u64::from(header.iod_ssr), 4)?;
    writer.write_u64(u64::from(header.provider_id), 16)?;
    writer.write_u64(u64::from(header.solution_id), 4)?;
    writer.write_u64(u64::from(num_sats), 6)?;
    Ok(())
}

fn decode_orbit_corr(
    reader: &mut BitReader<'_>,
    cons: Constellation,
) -> Result<OrbitCorr, DecodeError> {
    let sat_id = reader.read_u8(sat_id_bits(cons))?;
    let iode = reader.read_u16(iode_bits(cons))?;
    let iodcrc = if cons == Constellation::Bds {
        reader.read_u32(24)?
    } else {
        0
    };
    Ok(OrbitCorr {
        sat_id,
        iode,
        iodcrc,
        radial: reader.read_i32(22)?,
        along_track: reader.read_i32(20)?,
        cross_track: reader.read_i32(20)?,
        dot_radial: reader.read_i32(21)?,
        dot_along_track: reader.read_i32(19)?,
        dot_cross_track: reader.read_i32(19)?,
    })
}

fn encode_orbit_corr(
    writer: &mut BitWriter<'_>,
    orbit: &OrbitCorr,
    cons: Constellation,
) -> Result<(), DecodeError> {
    writer.write_u64(u64::from(orbit.sat_id), sat_id_bits(cons))?;
    writer.write_u64(u64::from(orbit.iode), iode_bits(cons))?;
    if cons == Constellation::Bds {
        writer.write_u64(u64::from(orbit.iodcrc), 24)?;
    }
    writer.write_i64(i64::from(orbit.radial), 22)?;
    writer.write_i64(i64::from(orbit.along_track), 20)?;
    writer.write_i64(i64::from(orbit.cross_track), 20)?;
    writer.write_i64(i64::from(orbit.dot_radial), 21)?;
    writer.write_i64(i64::from(orbit.dot_along_track), 19)?;
    writer.write_i64(i64::from(orbit.dot_cross_track), 19)?;
    Ok(())
}

fn decode_clock_corr(
    reader: &mut BitReader<'_>,
    cons: Constellation,
) -> Result<ClockCorr, DecodeError> {
    Ok(ClockCorr {
        sat_id: reader.read_u8(sat_id_bits(cons))?,
        c0: reader.read_i32(22)?,
        c1: reader.read_i32(21)?,
        c2: reader.read_i32(27)?,
    })
}

fn encode_clock_corr(
    writer: &mut BitWriter<'_>,
    clock: &ClockCorr,
    cons: Constellation,
) -> Result<(), DecodeError> {
    writer.write_u64(u64::from(clock.sat_id), sat_id_bits(cons))?;
    writer.write_i64(i64::from(clock.c0), 22)?;
    writer.write_i64(i64::from(clock.c1), 21)?;
    writer.write_i64(i64::from(clock.c2), 27)?;
    Ok(())
}

/// Decodes an SSR payload
pub fn decode_ssr(payload: &[u8]) -> Result<SsrMessage, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    let (cons, kind) =
        ssr_message_kind(msg_num).ok_or(DecodeError::UnsupportedMessage(msg_num))?;
    let (header, num_sats) = decode_ssr_header(&mut reader, msg_num, cons, kind)?;

    match kind {
        SsrKind::Orbit => {
            let mut orbits = Vec::with_capacity(usize::from(num_sats));
            for _ in 0..num_sats {
                orbits.push(decode_orbit_corr(&mut reader, cons)?);
            }
            Ok(SsrMessage::Orbit { header, orbits })
        }
        SsrKind::Clock => {
            let mut clocks = Vec::with_capacity(usize::from(num_sats));
            for _ in 0..num_sats {
                clocks.push(decode_clock_corr(&mut reader, cons)?);
            }
            Ok(SsrMessage::Clock { header, clocks })
        }
        SsrKind::OrbitClock => {
            let mut orbits = Vec::with_capacity(usize::from(num_sats));
            let mut clocks = Vec::with_capacity(usize::from(num_sats));
            for _ in 0..num_sats {
                let orbit = decode_orbit_corr(&mut reader, cons)?;
                let mut clock = decode_clock_corr_body(&mut reader)?;
                clock.sat_id = orbit.sat_id;
                orbits.push(orbit);
                clocks.push(clock);
            }
            Ok(SsrMessage::OrbitClock {
                header,
                orbits,
                clocks,
            })
        }
        SsrKind::CodeBias => {
            let mut sats = Vec::with_capacity(usize::from(num_sats));
            for _ in 0..num_sats {
                let sat_id = reader.read_u8(sat_id_bits(cons))?;
                let num_biases = reader.read_u8(5)?;
                let mut biases = Vec::with_capacity(usize::from(num_biases));
                for _ in 0..num_biases {
                    biases.push(CodeBias {
                        signal_id: reader.read_u8(5)?,
                        bias: reader.read_i16(14)?,
                    });
                }
                sats.push(CodeBiasSat { sat_id, biases });
            }
            Ok(SsrMessage::CodeBias { header, sats })
        }
    }
}

fn decode_clock_corr_body(reader: &mut BitReader<'_>) -> Result<ClockCorr, DecodeError> {
    Ok(ClockCorr {
        sat_id: 0,
        c0: reader.read_i32(22)?,
        c1: reader.read_i32(21)?,
        c2: reader.read_i32(27)?,
    })
}

/// Encodes an SSR message into `buf`, returning the payload length
pub fn encode_ssr(msg: &SsrMessage, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let header = msg.header();
    let (cons, kind) =
        ssr_message_kind(header.msg_num).ok_or(DecodeError::UnsupportedMessage(header.msg_num))?;

    let mut writer = BitWriter::new(buf);
    match (msg, kind) {
        (SsrMessage::Orbit { orbits, .. }, SsrKind::Orbit) => {
            encode_ssr_header(&mut writer, header, orbits.len() as u8)?;
            for orbit in orbits {
                encode_orbit_corr(&mut writer, orbit, cons)?;
            }
        }
        (SsrMessage::Clock { clocks, .. }, SsrKind::Clock) => {
            encode_ssr_header(&mut writer, header, clocks.len() as u8)?;
            for clock in clocks {
                encode_clock_corr(&mut writer, clock, cons)?;
            }
        }
        (SsrMessage::OrbitClock { orbits, clocks, .. }, SsrKind::OrbitClock) => {
            if orbits.len() != clocks.len() {
                return Err(DecodeError::InvalidMessage(header.msg_num));
            }
            encode_ssr_header(&mut writer, header, orbits.len() as u8)?;
            for (orbit, clock) in orbits.iter().zip(clocks.iter()) {
                encode_orbit_corr(&mut writer, orbit, cons)?;
                writer.write_i64(i64::from(clock.c0), 22)?;
                writer.write_i64(i64::from(clock.c1), 21)?;
                writer.write_i64(i64::from(clock.c2), 27)?;
            }
        }
        (SsrMessage::CodeBias { sats, .. }, SsrKind::CodeBias) => {
            encode_ssr_header(&mut writer, header, sats.len() as u8)?;
            for sat in sats {
                writer.write_u64(u64::from(sat.sat_id), sat_id_bits(cons))?;
                writer.write_u64(sat.biases.len() as u64, 5)?;
                for bias in &sat.biases {
                    writer.write_u64(u64::from(bias.signal_id), 5)?;
                    writer.write_i64(i64::from(bias.bias), 14)?;
                }
            }
        }
        _ => return Err(DecodeError::InvalidMessage(header.msg_num)),
    }
    Ok(writer.byte_len())
}
