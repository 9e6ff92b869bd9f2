// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 message codec
//!
//! [`frame`] finds CRC-verified payloads in a byte stream; [`decode_payload`]
//! dispatches on the 12 bit message number and produces a typed [`Message`].
//! The per-group encoders live next to their decoders in the submodules.

use serde::{Deserialize, Serialize};

use crate::bitstream::{BitReader, BitStreamError};

pub mod consts;
pub mod eph;
pub mod frame;
pub mod msm;
pub mod obs;
pub mod ssr;
pub mod station;
pub mod swift;

pub use eph::Ephemeris;
pub use msm::MsmMessage;
pub use obs::ObsMessage;
pub use ssr::SsrMessage;

/// Error type for RTCM message encoding and decoding
///
/// Decoders are fire-and-forget per message, none of these errors tears down
/// a session; the converter turns them into counters and log lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The payload ran out before the message did
    #[error(transparent)]
    BitStream(#[from] BitStreamError),
    /// A codec was handed a payload of a different message number
    #[error("Message type mismatch: expected {expected}, found {found}")]
    MessageTypeMismatch {
        /// Message number the codec handles
        expected: u16,
        /// Message number found in the payload
        found: u16,
    },
    /// The message number is not supported by this codec
    #[error("Unsupported message number ({0})")]
    UnsupportedMessage(u16),
    /// The message is a compact MSM1-3, recognized but not carried
    #[error("Compact MSM message ({0}) not supported")]
    UnsupportedMsm(u16),
    /// The payload structure is inconsistent
    #[error("Invalid message ({0})")]
    InvalidMessage(u16),
}

/// A decoded RTCM message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Legacy GPS observations, 1001-1004
    GpsObs(obs::ObsMessage),
    /// Legacy GLONASS observations, 1010/1012
    GloObs(obs::ObsMessage),
    /// MSM4-7 observations
    Msm(msm::MsmMessage),
    /// Station antenna reference point, 1005
    BasePosition(station::Msg1005),
    /// Station antenna reference point with height, 1006
    BasePositionHeight(station::Msg1006),
    /// Antenna descriptor, 1007
    AntennaDescriptor(station::Msg1007),
    /// Antenna descriptor and serial number, 1008
    AntennaDescriptorSerial(station::Msg1008),
    /// System parameters, 1013
    SystemParameters(station::Msg1013),
    /// An ephemeris, 1019/1020/1042/1044/1045/1046
    Ephemeris(eph::Ephemeris),
    /// Unicode text, 1029
    Text(station::Msg1029),
    /// Receiver and antenna descriptors, 1033
    ReceiverInfo(station::Msg1033),
    /// GLONASS code-phase biases, 1230
    GloBiases(station::Msg1230),
    /// SSR corrections
    Ssr(ssr::SsrMessage),
    /// Proprietary 999 subtypes
    Proprietary999(swift::Msg999),
    /// Swift proprietary wrapped SBP, 4062
    WrappedSbp(swift::Msg4062),
    /// Navigation data frames, 4075
    NavDataFrames(swift::Msg4075),
}

/// Peeks at the 12 bit message number of a payload
#[must_use]
pub fn message_number(payload: &[u8]) -> Option<u16> {
    BitReader::new(payload).read_u16(12).ok()
}

/// Decodes a CRC-verified payload into a typed message
///
/// Message numbers outside the supported set return
/// [`DecodeError::UnsupportedMessage`]; mixed streams routinely carry such
/// messages and callers are expected to skip them quietly.
pub fn decode_payload(payload: &[u8]) -> Result<Message, DecodeError> {
    let msg_num = message_number(payload).ok_or(BitStreamError::Overrun {
        wanted: 12,
        available: payload.len() * 8,
    })?;

    match msg_num {
        999 => Ok(Message::Proprietary999(swift::decode_999(payload)?)),
        1001..=1004 => Ok(Message::GpsObs(obs::decode_gps_obs(payload)?)),
        1005 => Ok(Message::BasePosition(station::decode_1005(payload)?)),
        1006 => Ok(Message::BasePositionHeight(station::decode_1006(payload)?)),
        1007 => Ok(Message::AntennaDescriptor(station::decode_1007(payload)?)),
        1008 => Ok(Message::AntennaDescriptorSerial(station::decode_1008(
            payload,
        )?)),
        1010 | 1012 => Ok(Message::GloObs(obs::decode_glo_obs(payload)?)),
        1013 => Ok(Message::SystemParameters(station::decode_1013(payload)?)),
        1019 => Ok(Message::Ephemeris(eph::decode_1019(payload)?)),
        1020 => Ok(Message::Ephemeris(eph::decode_1020(payload)?)),
        1029 => Ok(Message::Text(station::decode_1029(payload)?)),
        1033 => Ok(Message::ReceiverInfo(station::decode_1033(payload)?)),
        1042 => Ok(Message::Ephemeris(eph::decode_1042(payload)?)),
        1044 => Ok(Message::Ephemeris(eph::decode_1044(payload)?)),
        1045 => Ok(Message::Ephemeris(eph::decode_1045(payload)?)),
        1046 => Ok(Message::Ephemeris(eph::decode_1046(payload)?)),
        1230 => Ok(Message::GloBiases(station::decode_1230(payload)?)),
        _ => {
            if let Some(msm_type) = msm::MsmType::from_msg_num(msg_num) {
                if msm_type < msm::MsmType::Msm4 {
                    return Err(DecodeError::UnsupportedMsm(msg_num));
                }
                return Ok(Message::Msm(msm::decode_msm(payload)?));
            }
            if ssr::ssr_message_kind(msg_num).is_some() {
                return Ok(Message::Ssr(ssr::decode_ssr(payload)?));
            }
            if msg_num == consts::SWIFT_PROPRIETARY_MSG {
                return Ok(Message::WrappedSbp(swift::decode_4062(payload)?));
            }
            if msg_num == consts::NDF_MSG {
                return Ok(Message::NavDataFrames(swift::decode_4075(payload)?));
            }
            Err(DecodeError::UnsupportedMessage(msg_num))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_1013() {
        let payload = [0x3Fu8, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48];
        match decode_payload(&payload).unwrap() {
            Message::SystemParameters(msg) => {
                assert_eq!(msg.mjd, 59606);
                assert_eq!(msg.leap_second, 18);
            }
            other => panic!("wrong dispatch: {other:?}"),
        }
    }

    #[test]
    fn unknown_message_number() {
        /* message number 100 does not exist */
        let payload = [0x06u8, 0x40, 0x00];
        assert_eq!(
            decode_payload(&payload),
            Err(DecodeError::UnsupportedMessage(100))
        );
    }

    #[test]
    fn compact_msm_rejected_specifically() {
        /* an MSM1 header for GPS */
        let mut payload = vec![0u8; 34];
        payload[0] = (1071u16 >> 4) as u8;
        payload[1] = ((1071u16 & 0x0F) << 4) as u8;
        assert_eq!(
            decode_payload(&payload),
            Err(DecodeError::UnsupportedMsm(1071))
        );
    }

    #[test]
    fn truncated_payload_is_recoverable() {
        let payload = [0x3Fu8, 0x50];
        assert!(matches!(
            decode_payload(&payload),
            Err(DecodeError::BitStream(_))
        ));
    }
}
