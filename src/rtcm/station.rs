// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Station and system messages: reference point (1005/1006), antenna and
//! receiver descriptors (1007/1008/1033), system parameters (1013), text
//! (1029) and GLONASS code-phase biases (1230)

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitWriter};
use crate::rtcm::{consts, DecodeError};

/// Station antenna reference point, message 1005
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Msg1005 {
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// Reserved for ITRF realization year (DF021)
    pub itrf: u8,
    /// GPS indicator (DF022)
    pub gps_ind: bool,
    /// GLONASS indicator (DF023)
    pub glo_ind: bool,
    /// Reserved for Galileo indicator (DF024)
    pub gal_ind: bool,
    /// Reference-station indicator (DF141)
    pub ref_stn_ind: bool,
    /// Antenna reference point ECEF-X in meters (DF025)
    pub arp_x: f64,
    /// Single receiver oscillator indicator (DF142)
    pub osc_ind: bool,
    /// Antenna reference point ECEF-Y in meters (DF026)
    pub arp_y: f64,
    /// Quarter cycle indicator (DF364)
    pub quart_cycle_ind: u8,
    /// Antenna reference point ECEF-Z in meters (DF027)
    pub arp_z: f64,
}

/// Station antenna reference point with height, message 1006
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Msg1006 {
    /// The 1005 body
    pub msg_1005: Msg1005,
    /// Antenna height in meters (DF028)
    pub ant_height: f64,
}

/// Antenna descriptor, message 1007
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg1007 {
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// Antenna descriptor (DF030)
    pub ant_descriptor: String,
    /// Antenna setup id (DF031)
    pub ant_setup_id: u8,
}

/// Antenna descriptor and serial number, message 1008
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg1008 {
    /// The 1007 body
    pub msg_1007: Msg1007,
    /// Antenna serial number (DF033)
    pub ant_serial_num: String,
}

/// One announcement slot of message 1013
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg1013Announcement {
    /// Announced message id (DF055)
    pub id: u16,
    /// Synchronous flag (DF056)
    pub sync_flag: bool,
    /// Transmission interval in units of 0.1 s (DF057)
    pub transmission_interval: u16,
}

/// System parameters, message 1013
///
/// Carries the UTC date as a modified Julian day plus seconds of day, and the
/// current GPS-UTC leap second count, which makes it a time source for the
/// rest of the system.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg1013 {
    /// Reference station id (DF003)
    pub reference_station_id: u16,
    /// Modified Julian day, modulo 2^16 (DF051)
    pub mjd: u16,
    /// UTC seconds of day (DF052)
    pub utc: u32,
    /// GPS-UTC leap seconds (DF054), 255 when unknown
    pub leap_second: u8,
    /// Announced messages
    pub messages: Vec<Msg1013Announcement>,
}

impl Msg1013 {
    /// Checks if the leap second field holds a usable value
    #[must_use]
    pub fn leap_second_known(&self) -> bool {
        self.leap_second != consts::UNKNOWN_LEAP_SECONDS
    }
}

/// Unicode text transmission, message 1029
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg1029 {
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// Modified Julian day (DF051)
    pub mjd_num: u16,
    /// UTC seconds of day (DF052)
    pub utc_sec_of_day: u32,
    /// Number of unicode characters represented (DF138)
    pub unicode_chars: u8,
    /// UTF-8 code units (DF140)
    pub utf8_code_units: Vec<u8>,
}

/// Receiver and antenna descriptors, message 1033
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg1033 {
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// Antenna descriptor (DF030)
    pub ant_descriptor: String,
    /// Antenna setup id (DF031)
    pub ant_setup_id: u8,
    /// Antenna serial number (DF033)
    pub ant_serial_num: String,
    /// Receiver type descriptor (DF228)
    pub rcv_descriptor: String,
    /// Receiver firmware version (DF230)
    pub rcv_fw_version: String,
    /// Receiver serial number (DF232)
    pub rcv_serial_num: String,
}

/// GLONASS code-phase biases, message 1230
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Msg1230 {
    /// Reference station id (DF003)
    pub stn_id: u16,
    /// GLONASS code-phase bias indicator (DF421): set means pseudorange and
    /// phase range are already aligned
    pub bias_indicator: bool,
    /// FDMA signal mask (DF422), bit 3 = L1 C/A down to bit 0 = L2 P
    pub fdma_signal_mask: u8,
    /// L1 C/A code-phase bias in meters (DF423)
    pub l1_ca_bias_m: f64,
    /// L1 P code-phase bias in meters (DF424)
    pub l1_p_bias_m: f64,
    /// L2 C/A code-phase bias in meters (DF425)
    pub l2_ca_bias_m: f64,
    /// L2 P code-phase bias in meters (DF426)
    pub l2_p_bias_m: f64,
}

fn read_string(reader: &mut BitReader<'_>, count: usize) -> Result<String, DecodeError> {
    let mut bytes = Vec::with_capacity(count);
    for _ in 0..count {
        bytes.push(reader.read_u8(8)?);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_string(writer: &mut BitWriter<'_>, value: &str) -> Result<(), DecodeError> {
    let bytes = value.as_bytes();
    let count = bytes.len().min(consts::MAX_STRING_LEN - 1);
    writer.write_u64(count as u64, 8)?;
    for &byte in &bytes[..count] {
        writer.write_u64(u64::from(byte), 8)?;
    }
    Ok(())
}

fn encode_1005_base(writer: &mut BitWriter<'_>, msg: &Msg1005) -> Result<(), DecodeError> {
    writer.write_u64(u64::from(msg.stn_id), 12)?;
    writer.write_u64(u64::from(msg.itrf), 6)?;
    writer.write_bool(msg.gps_ind)?;
    writer.write_bool(msg.glo_ind)?;
    writer.write_bool(msg.gal_ind)?;
    writer.write_bool(msg.ref_stn_ind)?;
    writer.write_i64((msg.arp_x * 10000.0).round() as i64, 38)?;
    writer.write_bool(msg.osc_ind)?;
    writer.write_u64(0, 1)?;
    writer.write_i64((msg.arp_y * 10000.0).round() as i64, 38)?;
    writer.write_u64(u64::from(msg.quart_cycle_ind), 2)?;
    writer.write_i64((msg.arp_z * 10000.0).round() as i64, 38)?;
    Ok(())
}

fn decode_1005_base(reader: &mut BitReader<'_>) -> Result<Msg1005, DecodeError> {
    let stn_id = reader.read_u16(12)?;
    let itrf = reader.read_u8(6)?;
    let gps_ind = reader.read_bool()?;
    let glo_ind = reader.read_bool()?;
    let gal_ind = reader.read_bool()?;
    let ref_stn_ind = reader.read_bool()?;
    let arp_x = reader.read_i64(38)? as f64 / 10000.0;
    let osc_ind = reader.read_bool()?;
    reader.skip(1)?;
    let arp_y = reader.read_i64(38)? as f64 / 10000.0;
    let quart_cycle_ind = reader.read_u8(2)?;
    let arp_z = reader.read_i64(38)? as f64 / 10000.0;
    Ok(Msg1005 {
        stn_id,
        itrf,
        gps_ind,
        glo_ind,
        gal_ind,
        ref_stn_ind,
        arp_x,
        osc_ind,
        arp_y,
        quart_cycle_ind,
        arp_z,
    })
}

/// Encodes message 1005 into `buf`, returning the payload length
pub fn encode_1005(msg: &Msg1005, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1005, 12)?;
    encode_1005_base(&mut writer, msg)?;
    Ok(writer.byte_len())
}

/// Decodes a message 1005 payload
pub fn decode_1005(payload: &[u8]) -> Result<Msg1005, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1005 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1005,
            found: msg_num,
        });
    }
    decode_1005_base(&mut reader)
}

/// Encodes message 1006 into `buf`, returning the payload length
///
/// The antenna height saturates at the DF028 range.
pub fn encode_1006(msg: &Msg1006, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1006, 12)?;
    encode_1005_base(&mut writer, &msg.msg_1005)?;
    let ant_height = msg.ant_height.clamp(0.0, consts::MAX_ANTENNA_HEIGHT_M);
    writer.write_u64((ant_height * 10000.0).round() as u64, 16)?;
    Ok(writer.byte_len())
}

/// Decodes a message 1006 payload
pub fn decode_1006(payload: &[u8]) -> Result<Msg1006, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1006 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1006,
            found: msg_num,
        });
    }
    let msg_1005 = decode_1005_base(&mut reader)?;
    let ant_height = f64::from(reader.read_u16(16)?) / 10000.0;
    Ok(Msg1006 {
        msg_1005,
        ant_height,
    })
}

fn encode_1007_base(writer: &mut BitWriter<'_>, msg: &Msg1007) -> Result<(), DecodeError> {
    writer.write_u64(u64::from(msg.stn_id), 12)?;
    write_string(writer, &msg.ant_descriptor)?;
    writer.write_u64(u64::from(msg.ant_setup_id), 8)?;
    Ok(())
}

fn decode_1007_base(reader: &mut BitReader<'_>) -> Result<Msg1007, DecodeError> {
    let stn_id = reader.read_u16(12)?;
    let count = reader.read_u8(8)?;
    let ant_descriptor = read_string(reader, usize::from(count))?;
    let ant_setup_id = reader.read_u8(8)?;
    Ok(Msg1007 {
        stn_id,
        ant_descriptor,
        ant_setup_id,
    })
}

/// Encodes message 1007 into `buf`, returning the payload length
pub fn encode_1007(msg: &Msg1007, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1007, 12)?;
    encode_1007_base(&mut writer, msg)?;
    Ok(writer.byte_len())
}

/// Decodes a message 1007 payload
pub fn decode_1007(payload: &[u8]) -> Result<Msg1007, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1007 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1007,
            found: msg_num,
        });
    }
    decode_1007_base(&mut reader)
}

/// Encodes message 1008 into `buf`, returning the payload length
pub fn encode_1008(msg: &Msg1008, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1008, 12)?;
    encode_1007_base(&mut writer, &msg.msg_1007)?;
    write_string(&mut writer, &msg.ant_serial_num)?;
    Ok(writer.byte_len())
}

/// Decodes a message 1008 payload
pub fn decode_1008(payload: &[u8]) -> Result<Msg1008, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1008 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1008,
            found: msg_num,
        });
    }
    let msg_1007 = decode_1007_base(&mut reader)?;
    let count = reader.read_u8(8)?;
    let ant_serial_num = read_string(&mut reader, usize::from(count))?;
    Ok(Msg1008 {
        msg_1007,
        ant_serial_num,
    })
}

/// Encodes message 1013 into `buf`, returning the payload length
pub fn encode_1013(msg: &Msg1013, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1013, 12)?;
    writer.write_u64(u64::from(msg.reference_station_id), 12)?;
    writer.write_u64(u64::from(msg.mjd), 16)?;
    writer.write_u64(u64::from(msg.utc), 17)?;
    /* the count field holds only the announcements of this message, repeats
     * carrying more than 31 slots leave it at zero */
    if msg.messages.len() >= 32 {
        writer.write_u64(0, 5)?;
    } else {
        writer.write_u64(msg.messages.len() as u64, 5)?;
    }
    writer.write_u64(u64::from(msg.leap_second), 8)?;
    for announcement in &msg.messages {
        writer.write_u64(u64::from(announcement.id), 12)?;
        writer.write_bool(announcement.sync_flag)?;
        writer.write_u64(u64::from(announcement.transmission_interval), 16)?;
    }
    Ok(writer.byte_len())
}

/// Decodes a message 1013 payload
///
/// Announcements past the count field are read for as long as whole slots
/// remain in the payload.
pub fn decode_1013(payload: &[u8]) -> Result<Msg1013, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1013 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1013,
            found: msg_num,
        });
    }
    let reference_station_id = reader.read_u16(12)?;
    let mjd = reader.read_u16(16)?;
    let utc = reader.read_u32(17)?;
    let count = reader.read_u8(5)?;
    let leap_second = reader.read_u8(8)?;

    let mut messages = Vec::with_capacity(usize::from(count));
    while reader.remaining() >= 29 {
        messages.push(Msg1013Announcement {
            id: reader.read_u16(12)?,
            sync_flag: reader.read_bool()?,
            transmission_interval: reader.read_u16(16)?,
        });
    }
    Ok(Msg1013 {
        reference_station_id,
        mjd,
        utc,
        leap_second,
        messages,
    })
}

/// Encodes message 1029 into `buf`, returning the payload length
pub fn encode_1029(msg: &Msg1029, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1029, 12)?;
    writer.write_u64(u64::from(msg.stn_id), 12)?;
    writer.write_u64(u64::from(msg.mjd_num), 16)?;
    writer.write_u64(u64::from(msg.utc_sec_of_day), 17)?;
    writer.write_u64(u64::from(msg.unicode_chars), 7)?;
    writer.write_u64(msg.utf8_code_units.len() as u64, 8)?;
    for &unit in &msg.utf8_code_units {
        writer.write_u64(u64::from(unit), 8)?;
    }
    Ok(writer.byte_len())
}

/// Decodes a message 1029 payload
pub fn decode_1029(payload: &[u8]) -> Result<Msg1029, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1029 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1029,
            found: msg_num,
        });
    }
    let stn_id = reader.read_u16(12)?;
    let mjd_num = reader.read_u16(16)?;
    let utc_sec_of_day = reader.read_u32(17)?;
    let unicode_chars = reader.read_u8(7)?;
    let count = reader.read_u8(8)?;
    let mut utf8_code_units = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        utf8_code_units.push(reader.read_u8(8)?);
    }
    Ok(Msg1029 {
        stn_id,
        mjd_num,
        utc_sec_of_day,
        unicode_chars,
        utf8_code_units,
    })
}

/// Encodes message 1033 into `buf`, returning the payload length
pub fn encode_1033(msg: &Msg1033, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1033, 12)?;
    writer.write_u64(u64::from(msg.stn_id), 12)?;
    write_string(&mut writer, &msg.ant_descriptor)?;
    writer.write_u64(u64::from(msg.ant_setup_id), 8)?;
    write_string(&mut writer, &msg.ant_serial_num)?;
    write_string(&mut writer, &msg.rcv_descriptor)?;
    write_string(&mut writer, &msg.rcv_fw_version)?;
    write_string(&mut writer, &msg.rcv_serial_num)?;
    Ok(writer.byte_len())
}

/// Decodes a message 1033 payload
pub fn decode_1033(payload: &[u8]) -> Result<Msg1033, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1033 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1033,
            found: msg_num,
        });
    }
    let stn_id = reader.read_u16(12)?;
    let count = reader.read_u8(8)?;
    let ant_descriptor = read_string(&mut reader, usize::from(count))?;
    let ant_setup_id = reader.read_u8(8)?;
    let count = reader.read_u8(8)?;
    let ant_serial_num = read_string(&mut reader, usize::from(count))?;
    let count = reader.read_u8(8)?;
    let rcv_descriptor = read_string(&mut reader, usize::from(count))?;
    let count = reader.read_u8(8)?;
    let rcv_fw_version = read_string(&mut reader, usize::from(count))?;
    let count = reader.read_u8(8)?;
    let rcv_serial_num = read_string(&mut reader, usize::from(count))?;
    Ok(Msg1033 {
        stn_id,
        ant_descriptor,
        ant_setup_id,
        ant_serial_num,
        rcv_descriptor,
        rcv_fw_version,
        rcv_serial_num,
    })
}

/// Encodes message 1230 into `buf`, returning the payload length
///
/// Only the biases selected by the FDMA signal mask are written.
pub fn encode_1230(msg: &Msg1230, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(1230, 12)?;
    writer.write_u64(u64::from(msg.stn_id), 12)?;
    writer.write_bool(msg.bias_indicator)?;
    writer.write_u64(0, 3)?;
    writer.write_u64(u64::from(msg.fdma_signal_mask & 0x0F), 4)?;
    /* biases in 0.02 m steps */
    if msg.fdma_signal_mask & 0x08 != 0 {
        writer.write_i64((msg.l1_ca_bias_m * 50.0).round() as i64, 16)?;
    }
    if msg.fdma_signal_mask & 0x04 != 0 {
        writer.write_i64((msg.l1_p_bias_m * 50.0).round() as i64, 16)?;
    }
    if msg.fdma_signal_mask & 0x02 != 0 {
        writer.write_i64((msg.l2_ca_bias_m * 50.0).round() as i64, 16)?;
    }
    if msg.fdma_signal_mask & 0x01 != 0 {
        writer.write_i64((msg.l2_p_bias_m * 50.0).round() as i64, 16)?;
    }
    Ok(writer.byte_len())
}

/// Decodes a message 1230 payload
pub fn decode_1230(payload: &[u8]) -> Result<Msg1230, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 1230 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 1230,
            found: msg_num,
        });
    }
    let stn_id = reader.read_u16(12)?;
    let bias_indicator = reader.read_bool()?;
    reader.skip(3)?;
    let fdma_signal_mask = reader.read_u8(4)?;

    let mut msg = Msg1230 {
        stn_id,
        bias_indicator,
        fdma_signal_mask,
        ..Default::default()
    };
    if fdma_signal_mask & 0x08 != 0 {
        msg.l1_ca_bias_m = f64::from(reader.read_i16(16)?) / 50.0;
    }
    if fdma_signal_mask & 0x04 != 0 {
        msg.l1_p_bias_m = f64::from(reader.read_i16(16)?) / 50.0;
    }
    if fdma_signal_mask & 0x02 != 0 {
        msg.l2_ca_bias_m = f64::from(reader.read_i16(16)?) / 50.0;
    }
    if fdma_signal_mask & 0x01 != 0 {
        msg.l2_p_bias_m = f64::from(reader.read_i16(16)?) / 50.0;
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtcm::consts::MAX_PAYLOAD_LEN;
    use float_eq::assert_float_eq;

    #[test]
    fn msg_1005_round_trip() {
        let msg = Msg1005 {
            stn_id: 813,
            itrf: 0,
            gps_ind: true,
            glo_ind: true,
            gal_ind: false,
            ref_stn_ind: true,
            arp_x: 3_771_793.9685,
            osc_ind: false,
            arp_y: 140_253.3547,
            quart_cycle_ind: 1,
            arp_z: 5_124_304.3516,
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1005(&msg, &mut buf).unwrap();
        assert_eq!(len, 19);
        let decoded = decode_1005(&buf[..len]).unwrap();
        assert_eq!(decoded.stn_id, msg.stn_id);
        assert_float_eq!(decoded.arp_x, msg.arp_x, abs <= 0.000_05);
        assert_float_eq!(decoded.arp_y, msg.arp_y, abs <= 0.000_05);
        assert_float_eq!(decoded.arp_z, msg.arp_z, abs <= 0.000_05);
        assert_eq!(decoded.quart_cycle_ind, 1);
        assert!(decoded.gps_ind);
    }

    #[test]
    fn msg_1006_clamps_height() {
        let msg = Msg1006 {
            msg_1005: Msg1005 {
                stn_id: 1,
                arp_x: -1_000_000.0,
                ..Default::default()
            },
            ant_height: 20.0,
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1006(&msg, &mut buf).unwrap();
        let decoded = decode_1006(&buf[..len]).unwrap();
        assert_float_eq!(decoded.ant_height, consts::MAX_ANTENNA_HEIGHT_M, abs <= 1e-9);
        assert_float_eq!(decoded.msg_1005.arp_x, -1_000_000.0, abs <= 0.000_05);
    }

    #[test]
    fn msg_1008_round_trip() {
        let msg = Msg1008 {
            msg_1007: Msg1007 {
                stn_id: 22,
                ant_descriptor: "TRM59800.00     SCIS".to_string(),
                ant_setup_id: 3,
            },
            ant_serial_num: "1440911917".to_string(),
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1008(&msg, &mut buf).unwrap();
        let decoded = decode_1008(&buf[..len]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn msg_1013_live_payload() {
        /* payload of the frame D3 00 09 3F 50 01 E8 D6 A1 09 80 48 36 24 76 */
        let payload = [0x3Fu8, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48];
        let msg = decode_1013(&payload).unwrap();
        assert_eq!(msg.reference_station_id, 1);
        assert_eq!(msg.mjd, 59606);
        assert_eq!(msg.utc, 82451);
        assert_eq!(msg.leap_second, 18);
        assert!(msg.leap_second_known());
        assert!(msg.messages.is_empty());

        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1013(&msg, &mut buf).unwrap();
        assert_eq!(&buf[..len], &payload);
    }

    #[test]
    fn msg_1013_announcements() {
        let msg = Msg1013 {
            reference_station_id: 99,
            mjd: 59606,
            utc: 70_000,
            leap_second: 18,
            messages: vec![
                Msg1013Announcement {
                    id: 1004,
                    sync_flag: true,
                    transmission_interval: 10,
                },
                Msg1013Announcement {
                    id: 1012,
                    sync_flag: false,
                    transmission_interval: 10,
                },
            ],
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1013(&msg, &mut buf).unwrap();
        let decoded = decode_1013(&buf[..len]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn msg_1033_round_trip() {
        let msg = Msg1033 {
            stn_id: 1022,
            ant_descriptor: "ADVNULLANTENNA".to_string(),
            ant_setup_id: 0,
            ant_serial_num: "123".to_string(),
            rcv_descriptor: "Geo++ GNSMART (GLO=ASH)".to_string(),
            rcv_fw_version: "1.0.0".to_string(),
            rcv_serial_num: "987654".to_string(),
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1033(&msg, &mut buf).unwrap();
        let decoded = decode_1033(&buf[..len]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn msg_1230_round_trip_partial_mask() {
        let msg = Msg1230 {
            stn_id: 11,
            bias_indicator: false,
            fdma_signal_mask: 0x09,
            l1_ca_bias_m: 2.3,
            l1_p_bias_m: 0.0,
            l2_ca_bias_m: 0.0,
            l2_p_bias_m: -7.14,
            ..Default::default()
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1230(&msg, &mut buf).unwrap();
        /* 12+12+1+3+4 header bits plus two bias slots = 8 bytes */
        assert_eq!(len, 8);
        let decoded = decode_1230(&buf[..len]).unwrap();
        assert_eq!(decoded.fdma_signal_mask, 0x09);
        assert_float_eq!(decoded.l1_ca_bias_m, 2.3, abs <= 0.01);
        assert_float_eq!(decoded.l2_p_bias_m, -7.14, abs <= 0.01);
        assert_float_eq!(decoded.l1_p_bias_m, 0.0, abs <= 1e-12);
    }

    #[test]
    fn msg_1029_round_trip() {
        let text = "UTF-8 проверка";
        let msg = Msg1029 {
            stn_id: 23,
            mjd_num: 132,
            utc_sec_of_day: 59_100,
            unicode_chars: text.chars().count() as u8,
            utf8_code_units: text.as_bytes().to_vec(),
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_1029(&msg, &mut buf).unwrap();
        let decoded = decode_1029(&buf[..len]).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(
            String::from_utf8(decoded.utf8_code_units).unwrap(),
            text
        );
    }
}
