// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Typed SBP messages
//!
//! The payload layouts mirror the libsbp packed structs; every struct knows
//! its message type and how to serialize itself. Only the message set the
//! translator produces or consumes is represented.

use serde::{Deserialize, Serialize};

use super::{PayloadReader, PayloadWriter, SbpError};

/// Observation message type
pub const MSG_OBS: u16 = 0x004A;
/// Base position, latitude/longitude/height
pub const MSG_BASE_POS_LLH: u16 = 0x0044;
/// Base position, ECEF
pub const MSG_BASE_POS_ECEF: u16 = 0x0048;
/// GLONASS code-phase biases
pub const MSG_GLO_BIASES: u16 = 0x0075;
/// BeiDou ephemeris
pub const MSG_EPHEMERIS_BDS: u16 = 0x0089;
/// GPS ephemeris
pub const MSG_EPHEMERIS_GPS: u16 = 0x008A;
/// GLONASS ephemeris
pub const MSG_EPHEMERIS_GLO: u16 = 0x008B;
/// Galileo ephemeris
pub const MSG_EPHEMERIS_GAL: u16 = 0x008D;
/// QZSS ephemeris
pub const MSG_EPHEMERIS_QZSS: u16 = 0x008E;
/// Satellite azimuth and elevation
pub const MSG_SV_AZ_EL: u16 = 0x0097;
/// Measurement state with CN0
pub const MSG_MEASUREMENT_STATE: u16 = 0x0061;
/// Plain text log message
pub const MSG_LOG: u16 = 0x0401;
/// Combined SSR orbit and clock correction
pub const MSG_SSR_ORBIT_CLOCK: u16 = 0x05DD;
/// SSR code biases
pub const MSG_SSR_CODE_BIASES: u16 = 0x05E1;

/// Most observations one `MSG_OBS` can carry
pub const MSG_OBS_OBS_MAX: usize = 14;
/// Most observation messages one epoch may span, limited by the sequence
/// counter nibble
pub const MAX_OBS_SEQ: usize = 15;
/// Log level of informational log messages
pub const LOG_LEVEL_INFO: u8 = 6;
/// Log level of warnings
pub const LOG_LEVEL_WARN: u8 = 4;
/// Log level of errors
pub const LOG_LEVEL_ERROR: u8 = 3;

bitflags::bitflags! {
    /// Validity flags of a packed observation
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
    pub struct PackedObsFlags: u8 {
        /// Pseudorange is valid
        const CODE_VALID = 0x01;
        /// Carrier phase is valid
        const PHASE_VALID = 0x02;
        /// Half cycle ambiguity is resolved
        const HALF_CYCLE_KNOWN = 0x04;
        /// Doppler is valid
        const DOPPLER_VALID = 0x08;
    }
}

/// GNSS signal identifier on the SBP wire
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SbpSignal {
    /// Satellite number
    pub sat: u8,
    /// Signal code
    pub code: u8,
}

impl SbpSignal {
    fn write(&self, writer: &mut PayloadWriter) {
        writer.write_u8(self.sat);
        writer.write_u8(self.code);
    }

    fn parse(reader: &mut PayloadReader<'_>) -> Result<Self, SbpError> {
        Ok(SbpSignal {
            sat: reader.read_u8()?,
            code: reader.read_u8()?,
        })
    }
}

/// Whole-second GPS time stamp used by ephemerides and corrections
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GpsTimeSec {
    /// Time of week in seconds
    pub tow: u32,
    /// Week number
    pub wn: u16,
}

impl GpsTimeSec {
    fn write(&self, writer: &mut PayloadWriter) {
        writer.write_u32(self.tow);
        writer.write_u16(self.wn);
    }

    fn parse(reader: &mut PayloadReader<'_>) -> Result<Self, SbpError> {
        Ok(GpsTimeSec {
            tow: reader.read_u32()?,
            wn: reader.read_u16()?,
        })
    }
}

/// Millisecond GPS time stamp used by observation headers
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SbpGpsTime {
    /// Time of week in milliseconds
    pub tow: u32,
    /// Nanosecond residual, -500000 to 500000
    pub ns_residual: i32,
    /// Week number
    pub wn: u16,
}

impl SbpGpsTime {
    fn write(&self, writer: &mut PayloadWriter) {
        writer.write_u32(self.tow);
        writer.write_i32(self.ns_residual);
        writer.write_u16(self.wn);
    }

    fn parse(reader: &mut PayloadReader<'_>) -> Result<Self, SbpError> {
        Ok(SbpGpsTime {
            tow: reader.read_u32()?,
            ns_residual: reader.read_i32()?,
            wn: reader.read_u16()?,
        })
    }
}

/// Carrier phase split into whole and fractional cycles
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CarrierPhase {
    /// Whole cycles
    pub i: i32,
    /// Fractional cycles in 1/256 units
    pub f: u8,
}

/// Doppler split into whole and fractional Hz
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Doppler {
    /// Whole Hz
    pub i: i16,
    /// Fractional Hz in 1/256 units
    pub f: u8,
}

/// One observation of the observation message
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PackedObsContent {
    /// Pseudorange in 2 cm units
    pub p: u32,
    /// Carrier phase in cycles
    pub l: CarrierPhase,
    /// Doppler in Hz
    pub d: Doppler,
    /// Carrier to noise ratio in quarter dB-Hz
    pub cn0: u8,
    /// Encoded lock time
    pub lock: u8,
    /// Validity flags
    pub flags: PackedObsFlags,
    /// Signal identifier
    pub sid: SbpSignal,
}

impl PackedObsContent {
    fn write(&self, writer: &mut PayloadWriter) {
        writer.write_u32(self.p);
        writer.write_i32(self.l.i);
        writer.write_u8(self.l.f);
        writer.write_i16(self.d.i);
        writer.write_u8(self.d.f);
        writer.write_u8(self.cn0);
        writer.write_u8(self.lock);
        writer.write_u8(self.flags.bits());
        self.sid.write(writer);
    }

    fn parse(reader: &mut PayloadReader<'_>) -> Result<Self, SbpError> {
        Ok(PackedObsContent {
            p: reader.read_u32()?,
            l: CarrierPhase {
                i: reader.read_i32()?,
                f: reader.read_u8()?,
            },
            d: Doppler {
                i: reader.read_i16()?,
                f: reader.read_u8()?,
            },
            cn0: reader.read_u8()?,
            lock: reader.read_u8()?,
            flags: PackedObsFlags::from_bits_truncate(reader.read_u8()?),
            sid: SbpSignal::parse(reader)?,
        })
    }
}

/// Header of the observation message
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObservationHeader {
    /// Epoch time of all carried observations
    pub t: SbpGpsTime,
    /// Sequence field: total messages in the upper nibble, this message's
    /// index in the lower
    pub n_obs: u8,
}

/// GNSS observations for one epoch fragment
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgObs {
    /// Header with epoch time and sequence
    pub header: ObservationHeader,
    /// The observations
    pub obs: Vec<PackedObsContent>,
}

impl MsgObs {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_OBS;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.header.t.write(&mut writer);
        writer.write_u8(self.header.n_obs);
        for obs in &self.obs {
            obs.write(&mut writer);
        }
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        let t = SbpGpsTime::parse(&mut reader)?;
        let n_obs = reader.read_u8()?;
        let mut obs = Vec::new();
        while reader.remaining() > 0 {
            obs.push(PackedObsContent::parse(&mut reader)?);
        }
        Ok(MsgObs {
            header: ObservationHeader { t, n_obs },
            obs,
        })
    }
}

/// Base station position, ECEF
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgBasePosEcef {
    /// ECEF X in meters
    pub x: f64,
    /// ECEF Y in meters
    pub y: f64,
    /// ECEF Z in meters
    pub z: f64,
}

impl MsgBasePosEcef {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_BASE_POS_ECEF;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        writer.write_f64(self.x);
        writer.write_f64(self.y);
        writer.write_f64(self.z);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgBasePosEcef {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
        })
    }
}

/// Base station position, geodetic
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgBasePosLlh {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Height in meters
    pub height: f64,
}

impl MsgBasePosLlh {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_BASE_POS_LLH;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        writer.write_f64(self.lat);
        writer.write_f64(self.lon);
        writer.write_f64(self.height);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgBasePosLlh {
            lat: reader.read_f64()?,
            lon: reader.read_f64()?,
            height: reader.read_f64()?,
        })
    }
}

/// GLONASS inter-signal code-phase biases
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgGloBiases {
    /// Which of the four biases are valid, bit 3 = L1 C/A down to bit 0 =
    /// L2 P, matching the RTCM 1230 FDMA mask
    pub mask: u8,
    /// L1 C/A bias in 0.02 m units
    pub l1ca_bias: i16,
    /// L1 P bias in 0.02 m units
    pub l1p_bias: i16,
    /// L2 C/A bias in 0.02 m units
    pub l2ca_bias: i16,
    /// L2 P bias in 0.02 m units
    pub l2p_bias: i16,
}

impl MsgGloBiases {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_GLO_BIASES;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        writer.write_u8(self.mask);
        writer.write_i16(self.l1ca_bias);
        writer.write_i16(self.l1p_bias);
        writer.write_i16(self.l2ca_bias);
        writer.write_i16(self.l2p_bias);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgGloBiases {
            mask: reader.read_u8()?,
            l1ca_bias: reader.read_i16()?,
            l1p_bias: reader.read_i16()?,
            l2ca_bias: reader.read_i16()?,
            l2p_bias: reader.read_i16()?,
        })
    }
}

/// Fields common to all the ephemeris messages
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisCommon {
    /// Signal the ephemeris was decoded from
    pub sid: SbpSignal,
    /// Time of ephemeris
    pub toe: GpsTimeSec,
    /// User range accuracy in meters
    pub ura: f32,
    /// Fit interval in seconds
    pub fit_interval: u32,
    /// Whether the ephemeris is usable
    pub valid: u8,
    /// Satellite health bits
    pub health_bits: u8,
}

impl EphemerisCommon {
    fn write(&self, writer: &mut PayloadWriter) {
        self.sid.write(writer);
        self.toe.write(writer);
        writer.write_f32(self.ura);
        writer.write_u32(self.fit_interval);
        writer.write_u8(self.valid);
        writer.write_u8(self.health_bits);
    }

    fn parse(reader: &mut PayloadReader<'_>) -> Result<Self, SbpError> {
        Ok(EphemerisCommon {
            sid: SbpSignal::parse(reader)?,
            toe: GpsTimeSec::parse(reader)?,
            ura: reader.read_f32()?,
            fit_interval: reader.read_u32()?,
            valid: reader.read_u8()?,
            health_bits: reader.read_u8()?,
        })
    }
}

/// GPS ephemeris, also the layout of the QZSS ephemeris
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgEphemerisGps {
    pub common: EphemerisCommon,
    pub tgd: f32,
    pub c_rs: f32,
    pub c_rc: f32,
    pub c_uc: f32,
    pub c_us: f32,
    pub c_ic: f32,
    pub c_is: f32,
    pub dn: f64,
    pub m0: f64,
    pub ecc: f64,
    pub sqrta: f64,
    pub omega0: f64,
    pub omegadot: f64,
    pub w: f64,
    pub inc: f64,
    pub inc_dot: f64,
    pub af0: f32,
    pub af1: f32,
    pub af2: f32,
    pub toc: GpsTimeSec,
    pub iode: u8,
    pub iodc: u16,
}

/// QZSS ephemeris, same layout as GPS
pub type MsgEphemerisQzss = MsgEphemerisGps;

impl MsgEphemerisGps {
    /// The message type when carrying a GPS ephemeris
    pub const MSG_TYPE: u16 = MSG_EPHEMERIS_GPS;
    /// The message type when carrying a QZSS ephemeris
    pub const MSG_TYPE_QZSS: u16 = MSG_EPHEMERIS_QZSS;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.common.write(&mut writer);
        writer.write_f32(self.tgd);
        writer.write_f32(self.c_rs);
        writer.write_f32(self.c_rc);
        writer.write_f32(self.c_uc);
        writer.write_f32(self.c_us);
        writer.write_f32(self.c_ic);
        writer.write_f32(self.c_is);
        writer.write_f64(self.dn);
        writer.write_f64(self.m0);
        writer.write_f64(self.ecc);
        writer.write_f64(self.sqrta);
        writer.write_f64(self.omega0);
        writer.write_f64(self.omegadot);
        writer.write_f64(self.w);
        writer.write_f64(self.inc);
        writer.write_f64(self.inc_dot);
        writer.write_f32(self.af0);
        writer.write_f32(self.af1);
        writer.write_f32(self.af2);
        self.toc.write(&mut writer);
        writer.write_u8(self.iode);
        writer.write_u16(self.iodc);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgEphemerisGps {
            common: EphemerisCommon::parse(&mut reader)?,
            tgd: reader.read_f32()?,
            c_rs: reader.read_f32()?,
            c_rc: reader.read_f32()?,
            c_uc: reader.read_f32()?,
            c_us: reader.read_f32()?,
            c_ic: reader.read_f32()?,
            c_is: reader.read_f32()?,
            dn: reader.read_f64()?,
            m0: reader.read_f64()?,
            ecc: reader.read_f64()?,
            sqrta: reader.read_f64()?,
            omega0: reader.read_f64()?,
            omegadot: reader.read_f64()?,
            w: reader.read_f64()?,
            inc: reader.read_f64()?,
            inc_dot: reader.read_f64()?,
            af0: reader.read_f32()?,
            af1: reader.read_f32()?,
            af2: reader.read_f32()?,
            toc: GpsTimeSec::parse(&mut reader)?,
            iode: reader.read_u8()?,
            iodc: reader.read_u16()?,
        })
    }
}

/// Galileo ephemeris
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgEphemerisGal {
    pub common: EphemerisCommon,
    pub bgd_e1e5a: f32,
    pub bgd_e1e5b: f32,
    pub c_rs: f32,
    pub c_rc: f32,
    pub c_uc: f32,
    pub c_us: f32,
    pub c_ic: f32,
    pub c_is: f32,
    pub dn: f64,
    pub m0: f64,
    pub ecc: f64,
    pub sqrta: f64,
    pub omega0: f64,
    pub omegadot: f64,
    pub w: f64,
    pub inc: f64,
    pub inc_dot: f64,
    pub af0: f64,
    pub af1: f64,
    pub af2: f32,
    pub toc: GpsTimeSec,
    pub iode: u16,
    pub iodc: u16,
    /// 0 for I/NAV, 1 for F/NAV
    pub source: u8,
}

impl MsgEphemerisGal {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_EPHEMERIS_GAL;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.common.write(&mut writer);
        writer.write_f32(self.bgd_e1e5a);
        writer.write_f32(self.bgd_e1e5b);
        writer.write_f32(self.c_rs);
        writer.write_f32(self.c_rc);
        writer.write_f32(self.c_uc);
        writer.write_f32(self.c_us);
        writer.write_f32(self.c_ic);
        writer.write_f32(self.c_is);
        writer.write_f64(self.dn);
        writer.write_f64(self.m0);
        writer.write_f64(self.ecc);
        writer.write_f64(self.sqrta);
        writer.write_f64(self.omega0);
        writer.write_f64(self.omegadot);
        writer.write_f64(self.w);
        writer.write_f64(self.inc);
        writer.write_f64(self.inc_dot);
        writer.write_f64(self.af0);
        writer.write_f64(self.af1);
        writer.write_f32(self.af2);
        self.toc.write(&mut writer);
        writer.write_u16(self.iode);
        writer.write_u16(self.iodc);
        writer.write_u8(self.source);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgEphemerisGal {
            common: EphemerisCommon::parse(&mut reader)?,
            bgd_e1e5a: reader.read_f32()?,
            bgd_e1e5b: reader.read_f32()?,
            c_rs: reader.read_f32()?,
            c_rc: reader.read_f32()?,
            c_uc: reader.read_f32()?,
            c_us: reader.read_f32()?,
            c_ic: reader.read_f32()?,
            c_is: reader.read_f32()?,
            dn: reader.read_f64()?,
            m0: reader.read_f64()?,
            ecc: reader.read_f64()?,
            sqrta: reader.read_f64()?,
            omega0: reader.read_f64()?,
            omegadot: reader.read_f64()?,
            w: reader.read_f64()?,
            inc: reader.read_f64()?,
            inc_dot: reader.read_f64()?,
            af0: reader.read_f64()?,
            af1: reader.read_f64()?,
            af2: reader.read_f32()?,
            toc: GpsTimeSec::parse(&mut reader)?,
            iode: reader.read_u16()?,
            iodc: reader.read_u16()?,
            source: reader.read_u8()?,
        })
    }
}

/// BeiDou ephemeris
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgEphemerisBds {
    pub common: EphemerisCommon,
    pub tgd1: f32,
    pub tgd2: f32,
    pub c_rs: f32,
    pub c_rc: f32,
    pub c_uc: f32,
    pub c_us: f32,
    pub c_ic: f32,
    pub c_is: f32,
    pub dn: f64,
    pub m0: f64,
    pub ecc: f64,
    pub sqrta: f64,
    pub omega0: f64,
    pub omegadot: f64,
    pub w: f64,
    pub inc: f64,
    pub inc_dot: f64,
    pub af0: f64,
    pub af1: f32,
    pub af2: f32,
    pub toc: GpsTimeSec,
    pub iode: u8,
    pub iodc: u16,
}

impl MsgEphemerisBds {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_EPHEMERIS_BDS;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.common.write(&mut writer);
        writer.write_f32(self.tgd1);
        writer.write_f32(self.tgd2);
        writer.write_f32(self.c_rs);
        writer.write_f32(self.c_rc);
        writer.write_f32(self.c_uc);
        writer.write_f32(self.c_us);
        writer.write_f32(self.c_ic);
        writer.write_f32(self.c_is);
        writer.write_f64(self.dn);
        writer.write_f64(self.m0);
        writer.write_f64(self.ecc);
        writer.write_f64(self.sqrta);
        writer.write_f64(self.omega0);
        writer.write_f64(self.omegadot);
        writer.write_f64(self.w);
        writer.write_f64(self.inc);
        writer.write_f64(self.inc_dot);
        writer.write_f64(self.af0);
        writer.write_f32(self.af1);
        writer.write_f32(self.af2);
        self.toc.write(&mut writer);
        writer.write_u8(self.iode);
        writer.write_u16(self.iodc);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgEphemerisBds {
            common: EphemerisCommon::parse(&mut reader)?,
            tgd1: reader.read_f32()?,
            tgd2: reader.read_f32()?,
            c_rs: reader.read_f32()?,
            c_rc: reader.read_f32()?,
            c_uc: reader.read_f32()?,
            c_us: reader.read_f32()?,
            c_ic: reader.read_f32()?,
            c_is: reader.read_f32()?,
            dn: reader.read_f64()?,
            m0: reader.read_f64()?,
            ecc: reader.read_f64()?,
            sqrta: reader.read_f64()?,
            omega0: reader.read_f64()?,
            omegadot: reader.read_f64()?,
            w: reader.read_f64()?,
            inc: reader.read_f64()?,
            inc_dot: reader.read_f64()?,
            af0: reader.read_f64()?,
            af1: reader.read_f32()?,
            af2: reader.read_f32()?,
            toc: GpsTimeSec::parse(&mut reader)?,
            iode: reader.read_u8()?,
            iodc: reader.read_u16()?,
        })
    }
}

/// GLONASS ephemeris
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgEphemerisGlo {
    pub common: EphemerisCommon,
    pub gamma: f32,
    pub tau: f32,
    pub d_tau: f32,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub acc: [f32; 3],
    /// Frequency channel number on the SBP convention, 0 marking unknown
    pub fcn: u8,
    pub iod: u8,
}

impl MsgEphemerisGlo {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_EPHEMERIS_GLO;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.common.write(&mut writer);
        writer.write_f32(self.gamma);
        writer.write_f32(self.tau);
        writer.write_f32(self.d_tau);
        for axis in self.pos {
            writer.write_f64(axis);
        }
        for axis in self.vel {
            writer.write_f64(axis);
        }
        for axis in self.acc {
            writer.write_f32(axis);
        }
        writer.write_u8(self.fcn);
        writer.write_u8(self.iod);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        let common = EphemerisCommon::parse(&mut reader)?;
        let gamma = reader.read_f32()?;
        let tau = reader.read_f32()?;
        let d_tau = reader.read_f32()?;
        let mut pos = [0.0f64; 3];
        for axis in pos.iter_mut() {
            *axis = reader.read_f64()?;
        }
        let mut vel = [0.0f64; 3];
        for axis in vel.iter_mut() {
            *axis = reader.read_f64()?;
        }
        let mut acc = [0.0f32; 3];
        for axis in acc.iter_mut() {
            *axis = reader.read_f32()?;
        }
        Ok(MsgEphemerisGlo {
            common,
            gamma,
            tau,
            d_tau,
            pos,
            vel,
            acc,
            fcn: reader.read_u8()?,
            iod: reader.read_u8()?,
        })
    }
}

/// Plain text log message
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLog {
    /// Syslog-style severity
    pub level: u8,
    /// Message text, UTF-8
    pub text: String,
}

impl MsgLog {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_LOG;

    /// Serializes the payload, truncating over-long text on a UTF-8
    /// character boundary
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        writer.write_u8(self.level);
        let max_text = super::MAX_PAYLOAD_LEN - 1;
        let mut end = self.text.len().min(max_text);
        /* never cut a multi-byte sequence in half */
        while end > 0 && !self.text.is_char_boundary(end) {
            end -= 1;
        }
        writer.write_bytes(&self.text.as_bytes()[..end]);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        let level = reader.read_u8()?;
        let text = String::from_utf8_lossy(reader.read_rest()).into_owned();
        Ok(MsgLog { level, text })
    }
}

/// Azimuth and elevation of one satellite
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SvAzEl {
    /// Signal identifier
    pub sid: SbpSignal,
    /// Azimuth in units of 2 degrees
    pub az: u8,
    /// Elevation in degrees
    pub el: i8,
}

/// Satellite azimuths and elevations
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSvAzEl {
    /// Per-satellite entries
    pub azel: Vec<SvAzEl>,
}

impl MsgSvAzEl {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_SV_AZ_EL;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        for entry in &self.azel {
            entry.sid.write(&mut writer);
            writer.write_u8(entry.az);
            writer.write_i8(entry.el);
        }
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        let mut azel = Vec::new();
        while reader.remaining() > 0 {
            azel.push(SvAzEl {
                sid: SbpSignal::parse(&mut reader)?,
                az: reader.read_u8()?,
                el: reader.read_i8()?,
            });
        }
        Ok(MsgSvAzEl { azel })
    }
}

/// Tracking state of one signal
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MeasurementState {
    /// Signal identifier
    pub mesid: SbpSignal,
    /// Carrier to noise ratio in quarter dB-Hz, zero when untracked
    pub cn0: u8,
}

/// Tracked signal states
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMeasurementState {
    /// Per-signal states
    pub states: Vec<MeasurementState>,
}

impl MsgMeasurementState {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_MEASUREMENT_STATE;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        for state in &self.states {
            state.mesid.write(&mut writer);
            writer.write_u8(state.cn0);
        }
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        let mut states = Vec::new();
        while reader.remaining() > 0 {
            states.push(MeasurementState {
                mesid: SbpSignal::parse(&mut reader)?,
                cn0: reader.read_u8()?,
            });
        }
        Ok(MsgMeasurementState { states })
    }
}

/// Combined SSR orbit and clock correction for one satellite
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgSsrOrbitClock {
    pub time: GpsTimeSec,
    pub sid: SbpSignal,
    pub update_interval: u8,
    pub iod_ssr: u8,
    /// Issue of broadcast ephemeris data
    pub iod: u32,
    /// Radial orbit correction in 0.1 mm units
    pub radial: i32,
    /// Along-track orbit correction in 0.4 mm units
    pub along: i32,
    /// Cross-track orbit correction in 0.4 mm units
    pub cross: i32,
    pub dot_radial: i32,
    pub dot_along: i32,
    pub dot_cross: i32,
    /// Clock polynomial C0 in 0.1 mm units
    pub c0: i32,
    pub c1: i32,
    pub c2: i32,
}

impl MsgSsrOrbitClock {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_SSR_ORBIT_CLOCK;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.time.write(&mut writer);
        self.sid.write(&mut writer);
        writer.write_u8(self.update_interval);
        writer.write_u8(self.iod_ssr);
        writer.write_u32(self.iod);
        writer.write_i32(self.radial);
        writer.write_i32(self.along);
        writer.write_i32(self.cross);
        writer.write_i32(self.dot_radial);
        writer.write_i32(self.dot_along);
        writer.write_i32(self.dot_cross);
        writer.write_i32(self.c0);
        writer.write_i32(self.c1);
        writer.write_i32(self.c2);
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        Ok(MsgSsrOrbitClock {
            time: GpsTimeSec::parse(&mut reader)?,
            sid: SbpSignal::parse(&mut reader)?,
            update_interval: reader.read_u8()?,
            iod_ssr: reader.read_u8()?,
            iod: reader.read_u32()?,
            radial: reader.read_i32()?,
            along: reader.read_i32()?,
            cross: reader.read_i32()?,
            dot_radial: reader.read_i32()?,
            dot_along: reader.read_i32()?,
            dot_cross: reader.read_i32()?,
            c0: reader.read_i32()?,
            c1: reader.read_i32()?,
            c2: reader.read_i32()?,
        })
    }
}

/// SSR code bias of one signal
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SsrCodeBias {
    /// Signal and tracking mode indicator
    pub code: u8,
    /// Bias in 0.01 m units
    pub value: i16,
}

/// SSR code biases for one satellite
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgSsrCodeBiases {
    pub time: GpsTimeSec,
    pub sid: SbpSignal,
    pub update_interval: u8,
    pub iod_ssr: u8,
    pub biases: Vec<SsrCodeBias>,
}

impl MsgSsrCodeBiases {
    /// The message type
    pub const MSG_TYPE: u16 = MSG_SSR_CODE_BIASES;

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        self.time.write(&mut writer);
        self.sid.write(&mut writer);
        writer.write_u8(self.update_interval);
        writer.write_u8(self.iod_ssr);
        for bias in &self.biases {
            writer.write_u8(bias.code);
            writer.write_i16(bias.value);
        }
        writer.into_inner()
    }

    /// Parses a payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, SbpError> {
        let mut reader = PayloadReader::new(payload);
        let time = GpsTimeSec::parse(&mut reader)?;
        let sid = SbpSignal::parse(&mut reader)?;
        let update_interval = reader.read_u8()?;
        let iod_ssr = reader.read_u8()?;
        let mut biases = Vec::new();
        while reader.remaining() >= 3 {
            biases.push(SsrCodeBias {
                code: reader.read_u8()?,
                value: reader.read_i16()?,
            });
        }
        Ok(MsgSsrCodeBiases {
            time,
            sid,
            update_interval,
            iod_ssr,
            biases,
        })
    }
}

/// A decoded SBP message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum SbpMessage {
    Obs(MsgObs),
    BasePosEcef(MsgBasePosEcef),
    BasePosLlh(MsgBasePosLlh),
    GloBiases(MsgGloBiases),
    EphemerisGps(MsgEphemerisGps),
    EphemerisQzss(MsgEphemerisQzss),
    EphemerisGal(MsgEphemerisGal),
    EphemerisBds(MsgEphemerisBds),
    EphemerisGlo(MsgEphemerisGlo),
    Log(MsgLog),
    SvAzEl(MsgSvAzEl),
    MeasurementState(MsgMeasurementState),
    SsrOrbitClock(MsgSsrOrbitClock),
    SsrCodeBiases(MsgSsrCodeBiases),
}

impl SbpMessage {
    /// Decodes a payload for a known message type
    pub fn decode(msg_type: u16, payload: &[u8]) -> Result<SbpMessage, SbpError> {
        match msg_type {
            MSG_OBS => Ok(SbpMessage::Obs(MsgObs::from_payload(payload)?)),
            MSG_BASE_POS_ECEF => Ok(SbpMessage::BasePosEcef(MsgBasePosEcef::from_payload(
                payload,
            )?)),
            MSG_BASE_POS_LLH => Ok(SbpMessage::BasePosLlh(MsgBasePosLlh::from_payload(
                payload,
            )?)),
            MSG_GLO_BIASES => Ok(SbpMessage::GloBiases(MsgGloBiases::from_payload(payload)?)),
            MSG_EPHEMERIS_GPS => Ok(SbpMessage::EphemerisGps(MsgEphemerisGps::from_payload(
                payload,
            )?)),
            MSG_EPHEMERIS_QZSS => Ok(SbpMessage::EphemerisQzss(MsgEphemerisGps::from_payload(
                payload,
            )?)),
            MSG_EPHEMERIS_GAL => Ok(SbpMessage::EphemerisGal(MsgEphemerisGal::from_payload(
                payload,
            )?)),
            MSG_EPHEMERIS_BDS => Ok(SbpMessage::EphemerisBds(MsgEphemerisBds::from_payload(
                payload,
            )?)),
            MSG_EPHEMERIS_GLO => Ok(SbpMessage::EphemerisGlo(MsgEphemerisGlo::from_payload(
                payload,
            )?)),
            MSG_LOG => Ok(SbpMessage::Log(MsgLog::from_payload(payload)?)),
            MSG_SV_AZ_EL => Ok(SbpMessage::SvAzEl(MsgSvAzEl::from_payload(payload)?)),
            MSG_MEASUREMENT_STATE => Ok(SbpMessage::MeasurementState(
                MsgMeasurementState::from_payload(payload)?,
            )),
            MSG_SSR_ORBIT_CLOCK => Ok(SbpMessage::SsrOrbitClock(MsgSsrOrbitClock::from_payload(
                payload,
            )?)),
            MSG_SSR_CODE_BIASES => Ok(SbpMessage::SsrCodeBiases(MsgSsrCodeBiases::from_payload(
                payload,
            )?)),
            other => Err(SbpError::UnsupportedType(other)),
        }
    }

    /// The message type of this message
    #[must_use]
    pub fn msg_type(&self) -> u16 {
        match self {
            SbpMessage::Obs(_) => MSG_OBS,
            SbpMessage::BasePosEcef(_) => MSG_BASE_POS_ECEF,
            SbpMessage::BasePosLlh(_) => MSG_BASE_POS_LLH,
            SbpMessage::GloBiases(_) => MSG_GLO_BIASES,
            SbpMessage::EphemerisGps(_) => MSG_EPHEMERIS_GPS,
            SbpMessage::EphemerisQzss(_) => MSG_EPHEMERIS_QZSS,
            SbpMessage::EphemerisGal(_) => MSG_EPHEMERIS_GAL,
            SbpMessage::EphemerisBds(_) => MSG_EPHEMERIS_BDS,
            SbpMessage::EphemerisGlo(_) => MSG_EPHEMERIS_GLO,
            SbpMessage::Log(_) => MSG_LOG,
            SbpMessage::SvAzEl(_) => MSG_SV_AZ_EL,
            SbpMessage::MeasurementState(_) => MSG_MEASUREMENT_STATE,
            SbpMessage::SsrOrbitClock(_) => MSG_SSR_ORBIT_CLOCK,
            SbpMessage::SsrCodeBiases(_) => MSG_SSR_CODE_BIASES,
        }
    }

    /// Serializes the payload
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            SbpMessage::Obs(msg) => msg.to_payload(),
            SbpMessage::BasePosEcef(msg) => msg.to_payload(),
            SbpMessage::BasePosLlh(msg) => msg.to_payload(),
            SbpMessage::GloBiases(msg) => msg.to_payload(),
            SbpMessage::EphemerisGps(msg) | SbpMessage::EphemerisQzss(msg) => msg.to_payload(),
            SbpMessage::EphemerisGal(msg) => msg.to_payload(),
            SbpMessage::EphemerisBds(msg) => msg.to_payload(),
            SbpMessage::EphemerisGlo(msg) => msg.to_payload(),
            SbpMessage::Log(msg) => msg.to_payload(),
            SbpMessage::SvAzEl(msg) => msg.to_payload(),
            SbpMessage::MeasurementState(msg) => msg.to_payload(),
            SbpMessage::SsrOrbitClock(msg) => msg.to_payload(),
            SbpMessage::SsrCodeBiases(msg) => msg.to_payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obs_payload_round_trip() {
        let msg = MsgObs {
            header: ObservationHeader {
                t: SbpGpsTime {
                    tow: 341_562_000,
                    ns_residual: 0,
                    wn: 2190,
                },
                n_obs: 0x20,
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
        };
        let payload = msg.to_payload();
        assert_eq!(payload.len(), 11 + 17);
        let decoded = MsgObs::from_payload(&payload).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn obs_payload_fits_max_frame() {
        let content = PackedObsContent::default();
        let msg = MsgObs {
            header: ObservationHeader::default(),
            obs: vec![content; MSG_OBS_OBS_MAX],
        };
        assert!(msg.to_payload().len() <= super::super::MAX_PAYLOAD_LEN);
    }

    #[test]
    fn log_truncates_on_char_boundary() {
        /* 300 bytes of two-byte characters */
        let text: String = "ж".repeat(150);
        let msg = MsgLog {
            level: LOG_LEVEL_WARN,
            text,
        };
        let payload = msg.to_payload();
        assert!(payload.len() <= super::super::MAX_PAYLOAD_LEN);
        /* 254 is even, so the last two-byte character fits exactly */
        assert_eq!(payload.len(), 255);
        let decoded = MsgLog::from_payload(&payload).unwrap();
        assert!(!decoded.text.contains('\u{FFFD}'));
    }

    #[test]
    fn eph_gps_round_trip() {
        let msg = MsgEphemerisGps {
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
            tgd: -9.8e-9,
            dn: 4.6e-9,
            m0: 1.57,
            ecc: 0.0115,
            sqrta: 5153.64,
            omega0: -2.95,
            omegadot: -8.1e-9,
            w: 0.68,
            inc: 0.96,
            inc_dot: 4.2e-10,
            af0: -1.6e-4,
            af1: -5.2e-11,
            af2: 0.0,
            toc: GpsTimeSec {
                tow: 463_104,
                wn: 2195,
            },
            iode: 250,
            iodc: 250,
            ..Default::default()
        };
        let decoded = MsgEphemerisGps::from_payload(&msg.to_payload()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn dispatch_by_type() {
        let msg = MsgGloBiases {
            mask: 0x0F,
            l1ca_bias: 100,
            l1p_bias: 100,
            l2ca_bias: 100,
            l2p_bias: 100,
        };
        let decoded = SbpMessage::decode(MSG_GLO_BIASES, &msg.to_payload()).unwrap();
        assert_eq!(decoded, SbpMessage::GloBiases(msg));
        assert_eq!(decoded.msg_type(), MSG_GLO_BIASES);

        assert_eq!(
            SbpMessage::decode(0x7777, &[]),
            Err(SbpError::UnsupportedType(0x7777))
        );
    }
}
