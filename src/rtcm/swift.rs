// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Proprietary messages: 999 subtypes (satellite az/el and signal strength,
//! restart, auxiliary data), 4062 (a wholly embedded SBP frame) and 4075
//! (navigation data frames)

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitWriter};
use crate::rtcm::{consts, DecodeError};

/// Size of the 999 STGSV satellite mask
pub const STGSV_SATELLITE_MASK_SIZE: usize = 40;
/// Satellite mask size of the 13th constellation slot (BDS)
pub const STGSV_SATELLITE_MASK_SIZE_GNSS13: usize = 24;

/// 999 STGSV field mask bits
pub mod stgsv_field_mask {
    /// Elevation present
    pub const EL: u8 = 0x01;
    /// Azimuth present
    pub const AZ: u8 = 0x02;
    /// First band CN0 present
    pub const CN0_B1: u8 = 0x04;
    /// Second band CN0 present
    pub const CN0_B2: u8 = 0x08;
    /// Third band CN0 present
    pub const CN0_B3: u8 = 0x10;
}

/// Wire value marking an invalid STGSV CN0
pub const STGSV_CN0_NOT_VALID: u8 = 0xFF;
/// Wire value marking an invalid STGSV elevation
pub const STGSV_EL_NOT_VALID: i8 = i8::MIN;
/// Wire value marking an invalid STGSV azimuth
pub const STGSV_AZ_NOT_VALID: u16 = 0x1FF;

/// 999 subtype ids used by this codec
#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::FromRepr)]
#[repr(u8)]
pub enum SubtypeId {
    /// Receiver restart
    Restart = 16,
    /// Auxiliary data
    Aux = 22,
    /// Satellite az/el and CN0
    Stgsv = 28,
}

/// Satellite entry of a 999 STGSV message
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StgsvSatSignal {
    /// Bit position in the satellite mask
    pub sat_id: u8,
    /// Elevation angle in degrees
    pub el: i8,
    /// Azimuth angle in degrees
    pub az: u16,
    /// CN0 of the first band, quarter dB-Hz
    pub cn0_b1: u8,
    /// CN0 of the second band, quarter dB-Hz
    pub cn0_b2: u8,
    /// CN0 of the third band, quarter dB-Hz
    pub cn0_b3: u8,
}

/// 999 subtype 28: satellite view with az/el and per-band CN0
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg999Stgsv {
    /// GPS time of week in milliseconds
    pub tow_ms: u32,
    /// Constellation slot of the satellite mask
    pub constellation: u8,
    /// Which of the optional fields are present
    pub field_mask: u8,
    /// Multiple message indicator
    pub mul_msg_ind: bool,
    /// Per-satellite values
    pub field_value: Vec<StgsvSatSignal>,
}

/// 999 subtype 16: receiver restart
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg999Restart {
    /// Restart mask
    pub restart_mask: u32,
}

/// 999 subtype 22: auxiliary data, time to first fix
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg999AuxTtff {
    /// Time to first fix in milliseconds
    pub ttff: u32,
}

/// A decoded 999 message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Msg999 {
    /// Satellite view subframe
    Stgsv(Msg999Stgsv),
    /// Restart subframe
    Restart(Msg999Restart),
    /// Auxiliary subframe
    AuxTtff(Msg999AuxTtff),
}

/// An SBP frame embedded in message 4062
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg4062 {
    /// Reserved protocol discriminator, zero for SBP
    pub protocol_version: u8,
    /// SBP message type
    pub msg_type: u16,
    /// SBP sender id
    pub sender_id: u16,
    /// SBP payload
    pub data: Vec<u8>,
}

/// One navigation data frame of message 4075
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavDataFrame {
    /// Satellite system
    pub sat_sys: u8,
    /// Index into the MSM satellite mask
    pub sat_num: u8,
    /// Extended satellite info, FCN + 7 for GLONASS
    pub ext_sat_info: u8,
    /// Index into the MSM signal mask
    pub sig_type: u8,
    /// Epoch time in milliseconds, same convention as MSM
    pub epoch_time: u32,
    /// Continuous tracking flag
    pub continuous_tracking: bool,
    /// Raw frame bits, most significant bit first, padded to whole bytes
    pub frame_data: Vec<u8>,
    /// Number of valid bits in `frame_data`
    pub frame_data_size_bits: u16,
}

/// Navigation data frames, message 4075
///
/// The frame contents are opaque to the translator; only the framing is
/// length-checked.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg4075 {
    /// Reference station id
    pub stn_id: u16,
    /// The carried frames
    pub frames: Vec<NavDataFrame>,
}

/// Decodes a message 999 payload
pub fn decode_999(payload: &[u8]) -> Result<Msg999, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != 999 {
        return Err(DecodeError::MessageTypeMismatch {
            expected: 999,
            found: msg_num,
        });
    }
    let sub_type_id = reader.read_u8(8)?;
    match SubtypeId::from_repr(sub_type_id) {
        Some(SubtypeId::Restart) => Ok(Msg999::Restart(Msg999Restart {
            restart_mask: reader.read_u32(32)?,
        })),
        Some(SubtypeId::Aux) => {
            let aux_data_type_id = reader.read_u8(8)?;
            /* only the TTFF auxiliary record is carried */
            if aux_data_type_id != 4 {
                return Err(DecodeError::UnsupportedMessage(999));
            }
            Ok(Msg999::AuxTtff(Msg999AuxTtff {
                ttff: reader.read_u32(32)?,
            }))
        }
        Some(SubtypeId::Stgsv) => {
            let tow_ms = reader.read_u32(30)?;
            let constellation = reader.read_u8(4)?;
            let sat_mask = reader.read_u64(40)?;
            let field_mask = reader.read_u8(8)?;
            let mul_msg_ind = reader.read_bool()?;

            let mut msg = Msg999Stgsv {
                tow_ms,
                constellation,
                field_mask,
                mul_msg_ind,
                field_value: Vec::new(),
            };
            for sat_id in 0..STGSV_SATELLITE_MASK_SIZE as u8 {
                if sat_mask & (1 << (STGSV_SATELLITE_MASK_SIZE as u8 - sat_id - 1)) == 0 {
                    continue;
                }
                let mut value = StgsvSatSignal {
                    sat_id,
                    el: STGSV_EL_NOT_VALID,
                    az: STGSV_AZ_NOT_VALID,
                    cn0_b1: STGSV_CN0_NOT_VALID,
                    cn0_b2: STGSV_CN0_NOT_VALID,
                    cn0_b3: STGSV_CN0_NOT_VALID,
                };
                if field_mask & stgsv_field_mask::EL != 0 {
                    value.el = reader.read_i8(8)?;
                }
                if field_mask & stgsv_field_mask::AZ != 0 {
                    value.az = reader.read_u16(9)?;
                }
                if field_mask & stgsv_field_mask::CN0_B1 != 0 {
                    value.cn0_b1 = reader.read_u8(8)?;
                }
                if field_mask & stgsv_field_mask::CN0_B2 != 0 {
                    value.cn0_b2 = reader.read_u8(8)?;
                }
                if field_mask & stgsv_field_mask::CN0_B3 != 0 {
                    value.cn0_b3 = reader.read_u8(8)?;
                }
                msg.field_value.push(value);
            }
            Ok(Msg999::Stgsv(msg))
        }
        None => Err(DecodeError::UnsupportedMessage(999)),
    }
}

/// Encodes a message 999 into `buf`, returning the payload length
pub fn encode_999(msg: &Msg999, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(999, 12)?;
    match msg {
        Msg999::Restart(restart) => {
            writer.write_u64(u64::from(SubtypeId::Restart as u8), 8)?;
            writer.write_u64(u64::from(restart.restart_mask), 32)?;
        }
        Msg999::AuxTtff(aux) => {
            writer.write_u64(u64::from(SubtypeId::Aux as u8), 8)?;
            writer.write_u64(4, 8)?;
            writer.write_u64(u64::from(aux.ttff), 32)?;
        }
        Msg999::Stgsv(stgsv) => {
            writer.write_u64(u64::from(SubtypeId::Stgsv as u8), 8)?;
            writer.write_u64(u64::from(stgsv.tow_ms), 30)?;
            writer.write_u64(u64::from(stgsv.constellation), 4)?;

            let mut sat_mask: u64 = 0;
            for value in &stgsv.field_value {
                sat_mask |= 1 << (STGSV_SATELLITE_MASK_SIZE as u8 - value.sat_id - 1);
            }
            writer.write_u64(sat_mask, 40)?;
            writer.write_u64(u64::from(stgsv.field_mask), 8)?;
            writer.write_bool(stgsv.mul_msg_ind)?;

            for value in &stgsv.field_value {
                if stgsv.field_mask & stgsv_field_mask::EL != 0 {
                    writer.write_i64(i64::from(value.el), 8)?;
                }
                if stgsv.field_mask & stgsv_field_mask::AZ != 0 {
                    writer.write_u64(u64::from(value.az), 9)?;
                }
                if stgsv.field_mask & stgsv_field_mask::CN0_B1 != 0 {
                    writer.write_u64(u64::from(value.cn0_b1), 8)?;
                }
                if stgsv.field_mask & stgsv_field_mask::CN0_B2 != 0 {
                    writer.write_u64(u64::from(value.cn0_b2), 8)?;
                }
                if stgsv.field_mask & stgsv_field_mask::CN0_B3 != 0 {
                    writer.write_u64(u64::from(value.cn0_b3), 8)?;
                }
            }
        }
    }
    Ok(writer.byte_len())
}

/// Decodes a message 4062 payload, the embedded SBP frame
///
/// Nothing beyond the length is validated here, the inner message goes to
/// the SBP side as-is.
pub fn decode_4062(payload: &[u8]) -> Result<Msg4062, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != consts::SWIFT_PROPRIETARY_MSG {
        return Err(DecodeError::MessageTypeMismatch {
            expected: consts::SWIFT_PROPRIETARY_MSG,
            found: msg_num,
        });
    }
    let protocol_version = reader.read_u8(4)?;
    let msg_type = reader.read_u16(16)?;
    let sender_id = reader.read_u16(16)?;
    let len = reader.read_u8(8)?;
    let mut data = Vec::with_capacity(usize::from(len));
    for _ in 0..len {
        data.push(reader.read_u8(8)?);
    }
    Ok(Msg4062 {
        protocol_version,
        msg_type,
        sender_id,
        data,
    })
}

/// Encodes a message 4062 into `buf`, returning the payload length
pub fn encode_4062(msg: &Msg4062, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u64(u64::from(consts::SWIFT_PROPRIETARY_MSG), 12)?;
    writer.write_u64(u64::from(msg.protocol_version & 0x0F), 4)?;
    writer.write_u64(u64::from(msg.msg_type), 16)?;
    writer.write_u64(u64::from(msg.sender_id), 16)?;
    writer.write_u64(msg.data.len() as u64, 8)?;
    for &byte in &msg.data {
        writer.write_u64(u64::from(byte), 8)?;
    }
    Ok(writer.byte_len())
}

/// Decodes a message 4075 payload
pub fn decode_4075(payload: &[u8]) -> Result<Msg4075, DecodeError> {
    let mut reader = BitReader::new(payload);
    let msg_num = reader.read_u16(12)?;
    if msg_num != consts::NDF_MSG {
        return Err(DecodeError::MessageTypeMismatch {
            expected: consts::NDF_MSG,
            found: msg_num,
        });
    }
    let stn_id = reader.read_u16(12)?;
    let frame_count = reader.read_u8(6)?;
    if usize::from(frame_count) > consts::MAX_NDF_FRAMES {
        return Err(DecodeError::InvalidMessage(consts::NDF_MSG));
    }

    let mut frames = Vec::with_capacity(usize::from(frame_count));
    for _ in 0..frame_count {
        let sat_sys = reader.read_u8(4)?;
        let sat_num = reader.read_u8(6)?;
        let ext_sat_info = reader.read_u8(4)?;
        let sig_type = reader.read_u8(5)?;
        let epoch_time = reader.read_u32(30)?;
        let continuous_tracking = reader.read_bool()?;
        let frame_data_size_bits = reader.read_u16(12)?;
        if usize::from(frame_data_size_bits) > consts::MAX_NDF_FRAME_SIZE_BITS {
            return Err(DecodeError::InvalidMessage(consts::NDF_MSG));
        }
        let mut frame_data = Vec::with_capacity(usize::from(frame_data_size_bits).div_ceil(8));
        let mut remaining = usize::from(frame_data_size_bits);
        while remaining > 0 {
            let chunk = remaining.min(8);
            /* keep the bits left aligned like the wire has them */
            frame_data.push(reader.read_u8(chunk)? << (8 - chunk));
            remaining -= chunk;
        }
        frames.push(NavDataFrame {
            sat_sys,
            sat_num,
            ext_sat_info,
            sig_type,
            epoch_time,
            continuous_tracking,
            frame_data,
            frame_data_size_bits,
        });
    }
    Ok(Msg4075 { stn_id, frames })
}

/// Encodes a message 4075 into `buf`, returning the payload length
pub fn encode_4075(msg: &Msg4075, buf: &mut [u8]) -> Result<usize, DecodeError> {
    if msg.frames.len() > consts::MAX_NDF_FRAMES {
        return Err(DecodeError::InvalidMessage(consts::NDF_MSG));
    }
    let mut writer = BitWriter::new(buf);
    writer.write_u64(u64::from(consts::NDF_MSG), 12)?;
    writer.write_u64(u64::from(msg.stn_id), 12)?;
    writer.write_u64(msg.frames.len() as u64, 6)?;
    for frame in &msg.frames {
        writer.write_u64(u64::from(frame.sat_sys), 4)?;
        writer.write_u64(u64::from(frame.sat_num), 6)?;
        writer.write_u64(u64::from(frame.ext_sat_info), 4)?;
        writer.write_u64(u64::from(frame.sig_type), 5)?;
        writer.write_u64(u64::from(frame.epoch_time), 30)?;
        writer.write_bool(frame.continuous_tracking)?;
        writer.write_u64(u64::from(frame.frame_data_size_bits), 12)?;
        let mut remaining = usize::from(frame.frame_data_size_bits);
        for &byte in &frame.frame_data {
            if remaining == 0 {
                break;
            }
            let chunk = remaining.min(8);
            writer.write_u64(u64::from(byte >> (8 - chunk)), chunk)?;
            remaining -= chunk;
        }
    }
    Ok(writer.byte_len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtcm::consts::MAX_PAYLOAD_LEN;

    #[test]
    fn stgsv_round_trip() {
        let msg = Msg999::Stgsv(Msg999Stgsv {
            tow_ms: 341_562_000,
            constellation: 0,
            field_mask: stgsv_field_mask::EL
                | stgsv_field_mask::AZ
                | stgsv_field_mask::CN0_B1,
            mul_msg_ind: false,
            field_value: vec![
                StgsvSatSignal {
                    sat_id: 2,
                    el: 44,
                    az: 310,
                    cn0_b1: 176,
                    cn0_b2: STGSV_CN0_NOT_VALID,
                    cn0_b3: STGSV_CN0_NOT_VALID,
                },
                StgsvSatSignal {
                    sat_id: 17,
                    el: -2,
                    az: 97,
                    cn0_b1: 132,
                    cn0_b2: STGSV_CN0_NOT_VALID,
                    cn0_b3: STGSV_CN0_NOT_VALID,
                },
            ],
        });
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_999(&msg, &mut buf).unwrap();
        assert_eq!(decode_999(&buf[..len]).unwrap(), msg);
    }

    #[test]
    fn restart_round_trip() {
        let msg = Msg999::Restart(Msg999Restart {
            restart_mask: 0x8000_00FF,
        });
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_999(&msg, &mut buf).unwrap();
        assert_eq!(decode_999(&buf[..len]).unwrap(), msg);
    }

    #[test]
    fn aux_ttff_round_trip() {
        let msg = Msg999::AuxTtff(Msg999AuxTtff { ttff: 32_100 });
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_999(&msg, &mut buf).unwrap();
        assert_eq!(decode_999(&buf[..len]).unwrap(), msg);
    }

    #[test]
    fn wrapped_sbp_round_trip() {
        let msg = Msg4062 {
            protocol_version: 0,
            msg_type: 0x004A,
            sender_id: 0x42,
            data: (0..37).collect(),
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_4062(&msg, &mut buf).unwrap();
        assert_eq!(decode_4062(&buf[..len]).unwrap(), msg);
    }

    #[test]
    fn ndf_round_trip() {
        let msg = Msg4075 {
            stn_id: 33,
            frames: vec![NavDataFrame {
                sat_sys: 0,
                sat_num: 2,
                ext_sat_info: 0,
                sig_type: 2,
                epoch_time: 341_562_000,
                continuous_tracking: true,
                frame_data: vec![0xDE, 0xAD, 0xBE, 0xE0],
                frame_data_size_bits: 28,
            }],
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = encode_4075(&msg, &mut buf).unwrap();
        assert_eq!(decode_4075(&buf[..len]).unwrap(), msg);
    }
}
