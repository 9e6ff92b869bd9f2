// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Swift Binary Protocol codec
//!
//! An SBP frame is the preamble byte 0x55, a little-endian 16 bit message
//! type, a little-endian 16 bit sender id, an 8 bit payload length, the
//! payload, and a CRC16-CCITT over everything between preamble and CRC.
//! Payload serialization is little-endian throughout.

pub mod messages;

use crate::edc::compute_crc16_ccitt;

/// Frame preamble byte
pub const PREAMBLE: u8 = 0x55;
/// Largest payload expressible in the 8 bit length field
pub const MAX_PAYLOAD_LEN: usize = 255;
/// Bytes of framing around a payload
pub const FRAME_OVERHEAD: usize = 8;

/// Error type for SBP encoding and decoding
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SbpError {
    /// The payload ended before the message did
    #[error("SBP payload truncated")]
    Truncated,
    /// The message does not fit the 8 bit length field
    #[error("SBP payload over-long ({0} bytes)")]
    Overlong(usize),
    /// The message type does not match the expected one
    #[error("SBP message type mismatch: expected {expected:#06x}, found {found:#06x}")]
    TypeMismatch {
        /// Message type the codec handles
        expected: u16,
        /// Message type found
        found: u16,
    },
    /// The message type is not in the supported set
    #[error("Unsupported SBP message type ({0:#06x})")]
    UnsupportedType(u16),
}

/// Little-endian payload reader
#[derive(Debug)]
pub struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    /// Wraps a payload
    #[must_use]
    pub fn new(buf: &'a [u8]) -> PayloadReader<'a> {
        PayloadReader { buf, pos: 0 }
    }

    /// Number of unread bytes
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], SbpError> {
        if self.remaining() < count {
            return Err(SbpError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Reads a u8
    pub fn read_u8(&mut self) -> Result<u8, SbpError> {
        Ok(self.take(1)?[0])
    }

    /// Reads an i8
    pub fn read_i8(&mut self) -> Result<i8, SbpError> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a little-endian u16
    pub fn read_u16(&mut self) -> Result<u16, SbpError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian i16
    pub fn read_i16(&mut self) -> Result<i16, SbpError> {
        Ok(self.read_u16()? as i16)
    }

    /// Reads a little-endian u32
    pub fn read_u32(&mut self) -> Result<u32, SbpError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian i32
    pub fn read_i32(&mut self) -> Result<i32, SbpError> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads a little-endian f32
    pub fn read_f32(&mut self) -> Result<f32, SbpError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads a little-endian f64
    pub fn read_f64(&mut self) -> Result<f64, SbpError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }

    /// Reads all remaining bytes
    pub fn read_rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }
}

/// Little-endian payload writer
#[derive(Debug, Default)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    /// Makes an empty writer
    #[must_use]
    pub fn new() -> PayloadWriter {
        PayloadWriter::default()
    }

    /// The written payload
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Number of written bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a u8
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Writes an i8
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    /// Writes a little-endian u16
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i16
    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    /// Writes a little-endian u32
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i32
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// Writes a little-endian f32
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes a little-endian f64
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// A complete SBP frame, borrowed from the input buffer
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Frame<'a> {
    /// Message type
    pub msg_type: u16,
    /// Sender id
    pub sender_id: u16,
    /// Message payload
    pub payload: &'a [u8],
}

/// Wraps a payload in a complete SBP frame
pub fn frame_msg(
    msg_type: u16,
    sender_id: u16,
    payload: &[u8],
    out: &mut Vec<u8>,
) -> Result<(), SbpError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(SbpError::Overlong(payload.len()));
    }
    let start = out.len();
    out.push(PREAMBLE);
    out.extend_from_slice(&msg_type.to_le_bytes());
    out.extend_from_slice(&sender_id.to_le_bytes());
    out.push(payload.len() as u8);
    out.extend_from_slice(payload);
    let crc = compute_crc16_ccitt(&out[start + 1..], 0);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(())
}

/// Tries to parse one SBP frame from the front of `buf`
///
/// Returns the parsed frame and the number of consumed bytes, or `None` when
/// no complete valid frame starts at the first byte. Callers resynchronize
/// by skipping a byte and retrying, like the RTCM scanner does.
#[must_use]
pub fn parse_frame(buf: &[u8]) -> Option<(Frame<'_>, usize)> {
    if buf.is_empty() || buf[0] != PREAMBLE || buf.len() < 6 {
        return None;
    }
    let msg_type = u16::from_le_bytes([buf[1], buf[2]]);
    let sender_id = u16::from_le_bytes([buf[3], buf[4]]);
    let len = usize::from(buf[5]);
    if buf.len() < FRAME_OVERHEAD + len {
        return None;
    }
    let crc_index = 6 + len;
    let crc = compute_crc16_ccitt(&buf[1..crc_index], 0);
    let frame_crc = u16::from_le_bytes([buf[crc_index], buf[crc_index + 1]]);
    if crc != frame_crc {
        return None;
    }
    Some((
        Frame {
            msg_type,
            sender_id,
            payload: &buf[6..crc_index],
        },
        FRAME_OVERHEAD + len,
    ))
}
