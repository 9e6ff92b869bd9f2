// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Ephemeris messages 1019 (GPS), 1020 (GLONASS), 1042 (BeiDou), 1044
//! (QZSS), 1045 (Galileo F/NAV) and 1046 (Galileo I/NAV)
//!
//! All scalar parameters stay in their raw quantized wire representation;
//! the translator carries them, it does not interpret them. Scale factors
//! only matter to consumers of the data and are fixed by the RTCM standard,
//! so preserving the integers preserves the values exactly.

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitWriter};
use crate::rtcm::DecodeError;
use crate::signal::{fcn_from_mt1012, Constellation};

/// Group delay parameters, constellation-specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tgd {
    /// GPS TGD
    Gps(i8),
    /// QZSS TGD
    Qzss(i8),
    /// BeiDou TGD1/TGD2
    Bds {
        /// B1/B3 group delay
        tgd1: i16,
        /// B2/B3 group delay
        tgd2: i16,
    },
    /// Galileo broadcast group delays; E1/E5b only present in I/NAV
    Gal {
        /// E1/E5a group delay
        bgd_e5a: i16,
        /// E1/E5b group delay, I/NAV only
        bgd_e5b: Option<i16>,
    },
}

impl Default for Tgd {
    fn default() -> Self {
        Tgd::Gps(0)
    }
}

/// Keplerian ephemeris body, raw wire integers
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct KeplerRaw {
    pub tgd: Tgd,
    pub crc: i32,
    pub crs: i32,
    pub cuc: i32,
    pub cus: i32,
    pub cic: i32,
    pub cis: i32,
    pub dn: i16,
    pub m0: i32,
    pub ecc: u32,
    pub sqrta: u32,
    pub omega0: i32,
    pub omegadot: i32,
    pub w: i32,
    pub inc: i32,
    pub inc_dot: i16,
    pub af0: i32,
    pub af1: i32,
    pub af2: i16,
    pub toc: u32,
    pub iodc: u16,
    pub iode: u16,
    pub code_l2: u8,
    pub l2_data_bit: bool,
}

/// GLONASS ephemeris body, raw wire integers (sign-magnitude fields are
/// carried as plain signed values)
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct GloRaw {
    pub gamma: i16,
    pub tau: i32,
    pub d_tau: i8,
    pub t_b: u8,
    pub pos: [i32; 3],
    pub vel: [i32; 3],
    pub acc: [i32; 3],
    /// Frequency channel number from the ephemeris
    pub fcn: Option<i8>,
    /// Issue of data, derived from the time slot
    pub iod: u8,
    /// Calendar day within the four year interval (NT)
    pub nt: u16,
}

/// Constellation-specific ephemeris body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EphemerisData {
    /// GPS/GAL/BDS/QZSS Keplerian parameters
    Kepler(KeplerRaw),
    /// GLONASS Cartesian parameters
    Glo(GloRaw),
}

/// A decoded ephemeris message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ephemeris {
    /// Message number this ephemeris arrived in
    pub msg_num: u16,
    /// Satellite id, constellation numbering
    pub sat_id: u8,
    /// Constellation of the satellite
    pub constellation: Constellation,
    /// Week number, raw wire resolution
    pub wn: u16,
    /// Time of ephemeris, raw wire units
    pub toe: u32,
    /// User range accuracy / SISA index, raw
    pub ura: u16,
    /// Fit interval flag, GPS and QZSS only
    pub fit_interval: bool,
    /// Constellation-specific health bits
    pub health_bits: u8,
    /// The orbit parameters
    pub data: EphemerisData,
}

impl Ephemeris {
    fn kepler(&self) -> Result<&KeplerRaw, DecodeError> {
        match &self.data {
            EphemerisData::Kepler(kepler) => Ok(kepler),
            EphemerisData::Glo(_) => Err(DecodeError::InvalidMessage(self.msg_num)),
        }
    }
}

/// Checks if a message number carries an ephemeris
#[must_use]
pub fn is_ephemeris_message(msg_num: u16) -> bool {
    matches!(msg_num, 1019 | 1020 | 1042 | 1044 | 1045 | 1046)
}

/// Decodes message 1019, a GPS ephemeris
pub fn decode_1019(payload: &[u8]) -> Result<Ephemeris, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1019 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1019,
            found: msg_num,
        });
    }
    let sat_id = reader.read_u8(6)?;
    let wn = reader.read_u16(10)?;
    let ura = reader.read_u16(4)?;
    let code_l2 = reader.read_u8(2)?;
    let inc_dot = reader.read_i16(14)?;
    let iode = u16::from(reader.read_u8(8)?);
    let toc = reader.read_u32(16)?;
    let af2 = i16::from(reader.read_i8(8)?);
    let af1 = i32::from(reader.read_i16(16)?);
    let af0 = reader.read_i32(22)?;
    let iodc = reader.read_u16(10)?;
    let crs = i32::from(reader.read_i16(16)?);
    let dn = reader.read_i16(16)?;
    let m0 = reader.read_i32(32)?;
    let cuc = i32::from(reader.read_i16(16)?);
    let ecc = reader.read_u32(32)?;
    let cus = i32::from(reader.read_i16(16)?);
    let sqrta = reader.read_u32(32)?;
    let toe = reader.read_u32(16)?;
    let cic = i32::from(reader.read_i16(16)?);
    let omega0 = reader.read_i32(32)?;
    let cis = i32::from(reader.read_i16(16)?);
    let inc = reader.read_i32(32)?;
    let crc = i32::from(reader.read_i16(16)?);
    let w = reader.read_i32(32)?;
    let omegadot = reader.read_i32(24)?;
    let tgd = reader.read_i8(8)?;
    let health_bits = reader.read_u8(6)?;
    let l2_data_bit = reader.read_bool()?;
    let fit_interval = reader.read_bool()?;

    Ok(Ephemeris {
        msg_num,
        sat_id,
        constellation: Constellation::Gps,
        wn,
        toe,
        ura,
        fit_interval,
        health_bits,
        data: EphemerisData::Kepler(KeplerRaw {
            tgd: Tgd::Gps(tgd),
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            dn,
            m0,
            ecc,
            sqrta,
            omega0,
            omegadot,
            w,
            inc,
            inc_dot,
            af0,
            af1,
            af2,
            toc,
            iodc,
            iode,
            code_l2,
            l2_data_bit,
        }),
    })
}

/// Encodes a GPS ephemeris as message 1019, returning the payload length
pub fn encode_1019(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let kepler = eph.kepler()?;
    let tgd = match kepler.tgd {
        Tgd::Gps(tgd) => tgd,
        _ => return Err(DecodeError::InvalidMessage(1019)),
    };
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1019, 12)?;
    writer.write_u64(u64::from(eph.sat_id), 6)?;
    writer.write_u64(u64::from(eph.wn), 10)?;
    writer.write_u64(u64::from(eph.ura), 4)?;
    writer.write_u64(u64::from(kepler.code_l2), 2)?;
    writer.write_i64(i64::from(kepler.inc_dot), 14)?;
    writer.write_u64(u64::from(kepler.iode), 8)?;
    writer.write_u64(u64::from(kepler.toc), 16)?;
    writer.write_i64(i64::from(kepler.af2), 8)?;
    writer.write_i64(i64::from(kepler.af1), 16)?;
    writer.write_i64(i64::from(kepler.af0), 22)?;
    writer.write_u64(u64::from(kepler.iodc), 10)?;
    writer.write_i64(i64::from(kepler.crs), 16)?;
    writer.write_i64(i64::from(kepler.dn), 16)?;
    writer.write_i64(i64::from(kepler.m0), 32)?;
    writer.write_i64(i64::from(kepler.cuc), 16)?;
    writer.write_u64(u64::from(kepler.ecc), 32)?;
    writer.write_i64(i64::from(kepler.cus), 16)?;
    writer.write_u64(u64::from(kepler.sqrta), 32)?;
    writer.write_u64(u64::from(eph.toe), 16)?;
    writer.write_i64(i64::from(kepler.cic), 16)?;
    writer.write_i64(i64::from(kepler.omega0), 32)?;
    writer.write_i64(i64::from(kepler.cis), 16)?;
    writer.write_i64(i64::from(kepler.inc), 32)?;
    writer.write_i64(i64::from(kepler.crc), 16)?;
    writer.write_i64(i64::from(kepler.w), 32)?;
    writer.write_i64(i64::from(kepler.omegadot), 24)?;
    writer.write_i64(i64::from(tgd), 8)?;
    writer.write_u64(u64::from(eph.health_bits), 6)?;
    writer.write_bool(kepler.l2_data_bit)?;
    writer.write_bool(eph.fit_interval)?;
    Ok(writer.byte_len())
}

/// Decodes message 1044, a QZSS ephemeris
pub fn decode_1044(payload: &[u8]) -> Result<Ephemeris, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1044 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1044,
            found: msg_num,
        });
    }
    let sat_id = reader.read_u8(4)?;
    let toc = reader.read_u32(16)?;
    let af2 = i16::from(reader.read_i8(8)?);
    let af1 = i32::from(reader.read_i16(16)?);
    let af0 = reader.read_i32(22)?;
    let iode = u16::from(reader.read_u8(8)?);
    let crs = i32::from(reader.read_i16(16)?);
    let dn = reader.read_i16(16)?;
    let m0 = reader.read_i32(32)?;
    let cuc = i32::from(reader.read_i16(16)?);
    let ecc = reader.read_u32(32)?;
    let cus = i32::from(reader.read_i16(16)?);
    let sqrta = reader.read_u32(32)?;
    let toe = reader.read_u32(16)?;
    let cic = i32::from(reader.read_i16(16)?);
    let omega0 = reader.read_i32(32)?;
    let cis = i32::from(reader.read_i16(16)?);
    let inc = reader.read_i32(32)?;
    let crc = i32::from(reader.read_i16(16)?);
    let w = reader.read_i32(32)?;
    let omegadot = reader.read_i32(24)?;
    let inc_dot = reader.read_i16(14)?;
    let code_l2 = reader.read_u8(2)?;
    let wn = reader.read_u16(10)?;
    let ura = reader.read_u16(4)?;
    let health_bits = reader.read_u8(6)?;
    let tgd = reader.read_i8(8)?;
    let iodc = reader.read_u16(10)?;
    let fit_interval = reader.read_bool()?;

    Ok(Ephemeris {
        msg_num,
        sat_id,
        constellation: Constellation::Qzs,
        wn,
        toe,
        ura,
        fit_interval,
        health_bits,
        data: EphemerisData::Kepler(KeplerRaw {
            tgd: Tgd::Qzss(tgd),
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            dn,
            m0,
            ecc,
            sqrta,
            omega0,
            omegadot,
            w,
            inc,
            inc_dot,
            af0,
            af1,
            af2,
            toc,
            iodc,
            iode,
            code_l2,
            l2_data_bit: false,
        }),
    })
}

/// Encodes a QZSS ephemeris as message 1044, returning the payload length
pub fn encode_1044(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let kepler = eph.kepler()?;
    let tgd = match kepler.tgd {
        Tgd::Qzss(tgd) => tgd,
        _ => return Err(DecodeError::InvalidMessage(1044)),
    };
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1044, 12)?;
    writer.write_u64(u64::from(eph.sat_id), 4)?;
    writer.write_u64(u64::from(kepler.toc), 16)?;
    writer.write_i64(i64::from(kepler.af2), 8)?;
    writer.write_i64(i64::from(kepler.af1), 16)?;
    writer.write_i64(i64::from(kepler.af0), 22)?;
    writer.write_u64(u64::from(kepler.iode), 8)?;
    writer.write_i64(i64::from(kepler.crs), 16)?;
    writer.write_i64(i64::from(kepler.dn), 16)?;
    writer.write_i64(i64::from(kepler.m0), 32)?;
    writer.write_i64(i64::from(kepler.cuc), 16)?;
    writer.write_u64(u64::from(kepler.ecc), 32)?;
    writer.write_i64(i64::from(kepler.cus), 16)?;
    writer.write_u64(u64::from(kepler.sqrta), 32)?;
    writer.write_u64(u64::from(eph.toe), 16)?;
    writer.write_i64(i64::from(kepler.cic), 16)?;
    writer.write_i64(i64::from(kepler.omega0), 32)?;
    writer.write_i64(i64::from(kepler.cis), 16)?;
    writer.write_i64(i64::from(kepler.inc), 32)?;
    writer.write_i64(i64::from(kepler.crc), 16)?;
    writer.write_i64(i64::from(kepler.w), 32)?;
    writer.write_i64(i64::from(kepler.omegadot), 24)?;
    writer.write_i64(i64::from(kepler.inc_dot), 14)?;
    writer.write_u64(u64::from(kepler.code_l2), 2)?;
    writer.write_u64(u64::from(eph.wn), 10)?;
    writer.write_u64(u64::from(eph.ura), 4)?;
    writer.write_u64(u64::from(eph.health_bits), 6)?;
    writer.write_i64(i64::from(tgd), 8)?;
    writer.write_u64(u64::from(kepler.iodc), 10)?;
    writer.write_bool(eph.fit_interval)?;
    Ok(writer.byte_len())
}

/// Decodes message 1042, a BeiDou ephemeris
pub fn decode_1042(payload: &[u8]) -> Result<Ephemeris, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1042 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1042,
            found: msg_num,
        });
    }
    let sat_id = reader.read_u8(6)?;
    let wn = reader.read_u16(13)?;
    let ura = reader.read_u16(4)?;
    let inc_dot = reader.read_i16(14)?;
    let iode = u16::from(reader.read_u8(5)?);
    let toc = reader.read_u32(17)?;
    let af2 = reader.read_i16(11)?;
    let af1 = reader.read_i32(22)?;
    let af0 = reader.read_i32(24)?;
    let iodc = u16::from(reader.read_u8(5)?);
    let crs = reader.read_i32(18)?;
    let dn = reader.read_i16(16)?;
    let m0 = reader.read_i32(32)?;
    let cuc = reader.read_i32(18)?;
    let ecc = reader.read_u32(32)?;
    let cus = reader.read_i32(18)?;
    let sqrta = reader.read_u32(32)?;
    let toe = reader.read_u32(17)?;
    let cic = reader.read_i32(18)?;
    let omega0 = reader.read_i32(32)?;
    let cis = reader.read_i32(18)?;
    let inc = reader.read_i32(32)?;
    let crc = reader.read_i32(18)?;
    let w = reader.read_i32(32)?;
    let omegadot = reader.read_i32(24)?;
    let tgd1 = reader.read_i16(10)?;
    let tgd2 = reader.read_i16(10)?;
    let health_bits = u8::from(reader.read_bool()?);

    Ok(Ephemeris {
        msg_num,
        sat_id,
        constellation: Constellation::Bds,
        wn,
        toe,
        ura,
        fit_interval: false,
        health_bits,
        data: EphemerisData::Kepler(KeplerRaw {
            tgd: Tgd::Bds { tgd1, tgd2 },
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            dn,
            m0,
            ecc,
            sqrta,
            omega0,
            omegadot,
            w,
            inc,
            inc_dot,
            af0,
            af1,
            af2,
            toc,
            iodc,
            iode,
            code_l2: 0,
            l2_data_bit: false,
        }),
    })
}

/// Encodes a BeiDou ephemeris as message 1042, returning the payload length
pub fn encode_1042(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let kepler = eph.kepler()?;
    let (tgd1, tgd2) = match kepler.tgd {
        Tgd::Bds { tgd1, tgd2 } => (tgd1, tgd2),
        _ => return Err(DecodeError::InvalidMessage(1042)),
    };
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1042, 12)?;
    writer.write_u64(u64::from(eph.sat_id), 6)?;
    writer.write_u64(u64::from(eph.wn), 13)?;
    writer.write_u64(u64::from(eph.ura), 4)?;
    writer.write_i64(i64::from(kepler.inc_dot), 14)?;
    writer.write_u64(u64::from(kepler.iode), 5)?;
    writer.write_u64(u64::from(kepler.toc), 17)?;
    writer.write_i64(i64::from(kepler.af2), 11)?;
    writer.write_i64(i64::from(kepler.af1), 22)?;
    writer.write_i64(i64::from(kepler.af0), 24)?;
    writer.write_u64(u64::from(kepler.iodc), 5)?;
    writer.write_i64(i64::from(kepler.crs), 18)?;
    writer.write_i64(i64::from(kepler.dn), 16)?;
    writer.write_i64(i64::from(kepler.m0), 32)?;
    writer.write_i64(i64::from(kepler.cuc), 18)?;
    writer.write_u64(u64::from(kepler.ecc), 32)?;
    writer.write_i64(i64::from(kepler.cus), 18)?;
    writer.write_u64(u64::from(kepler.sqrta), 32)?;
    writer.write_u64(u64::from(eph.toe), 17)?;
    writer.write_i64(i64::from(kepler.cic), 18)?;
    writer.write_i64(i64::from(kepler.omega0), 32)?;
    writer.write_i64(i64::from(kepler.cis), 18)?;
    writer.write_i64(i64::from(kepler.inc), 32)?;
    writer.write_i64(i64::from(kepler.crc), 18)?;
    writer.write_i64(i64::from(kepler.w), 32)?;
    writer.write_i64(i64::from(kepler.omegadot), 24)?;
    writer.write_i64(i64::from(tgd1), 10)?;
    writer.write_i64(i64::from(tgd2), 10)?;
    writer.write_bool(eph.health_bits != 0)?;
    Ok(writer.byte_len())
}

fn decode_gal_kepler(
    reader: &mut BitReader<'_>,
) -> Result<(u8, u16, u16, u16, KeplerRaw), DecodeError> {
    let sat_id = reader.read_u8(6)?;
    let wn = reader.read_u16(12)?;
    let iodnav = reader.read_u16(10)?;
    let sisa = reader.read_u16(8)?;
    let inc_dot = reader.read_i16(14)?;
    let toc = reader.read_u32(14)?;
    let af2 = reader.read_i16(6)?;
    let af1 = reader.read_i32(21)?;
    let af0 = reader.read_i32(31)?;
    let crs = i32::from(reader.read_i16(16)?);
    let dn = reader.read_i16(16)?;
    let m0 = reader.read_i32(32)?;
    let cuc = i32::from(reader.read_i16(16)?);
    let ecc = reader.read_u32(32)?;
    let cus = i32::from(reader.read_i16(16)?);
    let sqrta = reader.read_u32(32)?;
    let toe = reader.read_u32(14)?;
    let cic = i32::from(reader.read_i16(16)?);
    let omega0 = reader.read_i32(32)?;
    let cis = i32::from(reader.read_i16(16)?);
    let inc = reader.read_i32(32)?;
    let crc = i32::from(reader.read_i16(16)?);
    let w = reader.read_i32(32)?;
    let omegadot = reader.read_i32(24)?;

    Ok((
        sat_id,
        wn,
        sisa,
        toe as u16,
        KeplerRaw {
            tgd: Tgd::Gal {
                bgd_e5a: 0,
                bgd_e5b: None,
            },
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            dn,
            m0,
            ecc,
            sqrta,
            omega0,
            omegadot,
            w,
            inc,
            inc_dot,
            af0,
            af1,
            af2,
            toc,
            iodc: iodnav,
            iode: iodnav,
            code_l2: 0,
            l2_data_bit: false,
        },
    ))
}

fn encode_gal_kepler(
    writer: &mut BitWriter<'_>,
    eph: &Ephemeris,
    kepler: &KeplerRaw,
) -> Result<(), DecodeError> {
    writer.write_u64(u64::from(eph.sat_id), 6)?;
    writer.write_u64(u64::from(eph.wn), 12)?;
    writer.write_u64(u64::from(kepler.iode), 10)?;
    writer.write_u64(u64::from(eph.ura), 8)?;
    writer.write_i64(i64::from(kepler.inc_dot), 14)?;
    writer.write_u64(u64::from(kepler.toc), 14)?;
    writer.write_i64(i64::from(kepler.af2), 6)?;
    writer.write_i64(i64::from(kepler.af1), 21)?;
    writer.write_i64(i64::from(kepler.af0), 31)?;
    writer.write_i64(i64::from(kepler.crs), 16)?;
    writer.write_i64(i64::from(kepler.dn), 16)?;
    writer.write_i64(i64::from(kepler.m0), 32)?;
    writer.write_i64(i64::from(kepler.cuc), 16)?;
    writer.write_u64(u64::from(kepler.ecc), 32)?;
    writer.write_i64(i64::from(kepler.cus), 16)?;
    writer.write_u64(u64::from(kepler.sqrta), 32)?;
    writer.write_u64(u64::from(eph.toe), 14)?;
    writer.write_i64(i64::from(kepler.cic), 16)?;
    writer.write_i64(i64::from(kepler.omega0), 32)?;
    writer.write_i64(i64::from(kepler.cis), 16)?;
    writer.write_i64(i64::from(kepler.inc), 32)?;
    writer.write_i64(i64::from(kepler.crc), 16)?;
    writer.write_i64(i64::from(kepler.w), 32)?;
    writer.write_i64(i64::from(kepler.omegadot), 24)?;
    Ok(())
}

/// Decodes message 1045, a Galileo F/NAV ephemeris
pub fn decode_1045(payload: &[u8]) -> Result<Ephemeris, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1045 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1045,
            found: msg_num,
        });
    }
    let (sat_id, wn, sisa, toe, mut kepler) = decode_gal_kepler(&mut reader)?;
    let bgd_e5a = reader.read_i16(10)?;
    let e5a_hs = reader.read_u8(2)?;
    let e5a_dvs = reader.read_bool()?;
    reader.skip(7)?;
    kepler.tgd = Tgd::Gal {
        bgd_e5a,
        bgd_e5b: None,
    };

    Ok(Ephemeris {
        msg_num,
        sat_id,
        constellation: Constellation::Gal,
        wn,
        toe: u32::from(toe),
        ura: sisa,
        fit_interval: false,
        health_bits: (e5a_hs << 1) | u8::from(e5a_dvs),
        data: EphemerisData::Kepler(kepler),
    })
}

/// Encodes a Galileo F/NAV ephemeris as message 1045
pub fn encode_1045(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let kepler = eph.kepler()?;
    let bgd_e5a = match kepler.tgd {
        Tgd::Gal { bgd_e5a, .. } => bgd_e5a,
        _ => return Err(DecodeError::InvalidMessage(1045)),
    };
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1045, 12)?;
    encode_gal_kepler(&mut writer, eph, kepler)?;
    writer.write_i64(i64::from(bgd_e5a), 10)?;
    writer.write_u64(u64::from(eph.health_bits >> 1), 2)?;
    writer.write_bool(eph.health_bits & 1 != 0)?;
    writer.write_u64(0, 7)?;
    Ok(writer.byte_len())
}

/// Decodes message 1046, a Galileo I/NAV ephemeris
pub fn decode_1046(payload: &[u8]) -> Result<Ephemeris, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1046 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1046,
            found: msg_num,
        });
    }
    let (sat_id, wn, sisa, toe, mut kepler) = decode_gal_kepler(&mut reader)?;
    let bgd_e5a = reader.read_i16(10)?;
    let bgd_e5b = reader.read_i16(10)?;
    let e5b_hs = reader.read_u8(2)?;
    let e5b_dvs = reader.read_bool()?;
    let e1b_hs = reader.read_u8(2)?;
    let e1b_dvs = reader.read_bool()?;
    reader.skip(2)?;
    kepler.tgd = Tgd::Gal {
        bgd_e5a,
        bgd_e5b: Some(bgd_e5b),
    };

    Ok(Ephemeris {
        msg_num,
        sat_id,
        constellation: Constellation::Gal,
        wn,
        toe: u32::from(toe),
        ura: sisa,
        fit_interval: false,
        health_bits: (e5b_hs << 4) | (u8::from(e5b_dvs) << 3) | (e1b_hs << 1) | u8::from(e1b_dvs),
        data: EphemerisData::Kepler(kepler),
    })
}

/// Encodes a Galileo I/NAV ephemeris as message 1046
pub fn encode_1046(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let kepler = eph.kepler()?;
    let (bgd_e5a, bgd_e5b) = match kepler.tgd {
        Tgd::Gal {
            bgd_e5a,
            bgd_e5b: Some(bgd_e5b),
        } => (bgd_e5a, bgd_e5b),
        _ => return Err(DecodeError::InvalidMessage(1046)),
    };
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1046, 12)?;
    encode_gal_kepler(&mut writer, eph, kepler)?;
    writer.write_i64(i64::from(bgd_e5a), 10)?;
    writer.write_i64(i64::from(bgd_e5b), 10)?;
    writer.write_u64(u64::from((eph.health_bits >> 4) & 3), 2)?;
    writer.write_bool(eph.health_bits & 0x08 != 0)?;
    writer.write_u64(u64::from((eph.health_bits >> 1) & 3), 2)?;
    writer.write_bool(eph.health_bits & 1 != 0)?;
    writer.write_u64(0, 2)?;
    Ok(writer.byte_len())
}

/// Decodes message 1020, a GLONASS ephemeris
pub fn decode_1020(payload: &[u8]) -> Result<Ephemeris, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1020 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1020,
            found: msg_num,
        });
    }
    let sat_id = reader.read_u8(6)?;
    let fcn = fcn_from_mt1012(reader.read_u8(5)?);
    let _alm_health = reader.read_bool()?;
    let _alm_health_avail = reader.read_bool()?;
    let _p1 = reader.read_u8(2)?;
    let _tk = reader.read_u16(12)?;
    let bn_msb = reader.read_bool()?;
    let _p2 = reader.read_bool()?;
    let t_b = reader.read_u8(7)?;

    let mut vel = [0i32; 3];
    let mut pos = [0i32; 3];
    let mut acc = [0i32; 3];
    for axis in 0..3 {
        vel[axis] = reader.read_sign_magnitude(24)? as i32;
        pos[axis] = reader.read_sign_magnitude(27)? as i32;
        acc[axis] = reader.read_sign_magnitude(5)? as i32;
    }

    let _p3 = reader.read_bool()?;
    let gamma = reader.read_sign_magnitude(11)? as i16;
    let _p = reader.read_u8(2)?;
    let _ln3 = reader.read_bool()?;
    let tau = reader.read_sign_magnitude(22)? as i32;
    let d_tau = reader.read_sign_magnitude(5)? as i8;
    let en = reader.read_u8(5)?;
    let _p4 = reader.read_bool()?;
    let ft = reader.read_u8(4)?;
    let nt = reader.read_u16(11)?;
    let _m = reader.read_u8(2)?;
    let _avail = reader.read_bool()?;
    let _na = reader.read_u16(11)?;
    let _tau_c = reader.read_sign_magnitude(32)?;
    let _n4 = reader.read_u8(5)?;
    let _tau_gps = reader.read_sign_magnitude(22)?;
    let _ln5 = reader.read_bool()?;
    reader.skip(7)?;

    Ok(Ephemeris {
        msg_num,
        sat_id,
        constellation: Constellation::Glo,
        wn: 0,
        /* time of ephemeris as seconds within the GLONASS day */
        toe: u32::from(t_b) * 900,
        ura: u16::from(ft),
        fit_interval: false,
        health_bits: u8::from(bn_msb),
        data: EphemerisData::Glo(GloRaw {
            gamma,
            tau,
            d_tau,
            t_b,
            pos,
            vel,
            acc,
            fcn,
            iod: t_b & 0x7F,
            nt,
        }),
    })
}

/// Encodes a GLONASS ephemeris as message 1020
///
/// Fields not represented in the record (string flags, almanac data, system
/// time corrections) encode as zero.
pub fn encode_1020(eph: &Ephemeris, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let glo = match &eph.data {
        EphemerisData::Glo(glo) => glo,
        EphemerisData::Kepler(_) => return Err(DecodeError::InvalidMessage(1020)),
    };
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1020, 12)?;
    writer.write_u64(u64::from(eph.sat_id), 6)?;
    let raw_fcn = glo
        .fcn
        .map(|fcn| (fcn + crate::signal::consts::MT1012_GLO_FCN_OFFSET) as u8)
        .unwrap_or(0);
    writer.write_u64(u64::from(raw_fcn), 5)?;
    writer.write_u64(0, 2)?; /* almanac health and availability */
    writer.write_u64(0, 2)?; /* P1 */
    writer.write_u64(0, 12)?; /* tk */
    writer.write_bool(eph.health_bits & 1 != 0)?;
    writer.write_bool(false)?; /* P2 */
    writer.write_u64(u64::from(glo.t_b), 7)?;
    for axis in 0..3 {
        writer.write_sign_magnitude(i64::from(glo.vel[axis]), 24)?;
        writer.write_sign_magnitude(i64::from(glo.pos[axis]), 27)?;
        writer.write_sign_magnitude(i64::from(glo.acc[axis]), 5)?;
    }
    writer.write_bool(false)?; /* P3 */
    writer.write_sign_magnitude(i64::from(glo.gamma), 11)?;
    writer.write_u64(0, 2)?; /* P */
    writer.write_bool(false)?; /* ln */
    writer.write_sign_magnitude(i64::from(glo.tau), 22)?;
    writer.write_sign_magnitude(i64::from(glo.d_tau), 5)?;
    writer.write_u64(0, 5)?; /* En */
    writer.write_bool(false)?; /* P4 */
    writer.write_u64(u64::from(eph.ura & 0x0F), 4)?;
    writer.write_u64(u64::from(glo.nt), 11)?;
    writer.write_u64(0, 2)?; /* M */
    writer.write_bool(false)?; /* additional data available */
    writer.write_u64(0, 11)?; /* NA */
    writer.write_sign_magnitude(0, 32)?; /* tau_c */
    writer.write_u64(0, 5)?; /* N4 */
    writer.write_sign_magnitude(0, 22)?; /* tau_gps */
    writer.write_bool(false)?; /* ln */
    writer.write_u64(0, 7)?;
    Ok(writer.byte_len())
}
