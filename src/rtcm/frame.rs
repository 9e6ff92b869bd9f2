// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 framing
//!
//! A frame is the preamble byte 0xD3, six reserved bits, a 10 bit big-endian
//! payload length, the payload, and a 24 bit CRC-24Q computed over everything
//! before it. [`FrameScanner`] slides byte-by-byte over an internal FIFO and
//! hands out CRC-verified payloads; a corrupted byte costs at most the frame
//! it lands in, the scanner resynchronizes on the next preamble.

use crate::edc::compute_crc24q;
use crate::rtcm::consts;

/// Fixed-capacity byte FIFO feeding the frame scanner
pub struct Fifo {
    buf: [u8; consts::FIFO_SIZE],
    head: usize,
    tail: usize,
}

impl Fifo {
    /// Makes an empty FIFO
    #[must_use]
    pub fn new() -> Fifo {
        Fifo {
            buf: [0; consts::FIFO_SIZE],
            head: 0,
            tail: 0,
        }
    }

    /// Number of buffered bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.tail.wrapping_sub(self.head) & (consts::FIFO_SIZE - 1)
    }

    /// True when nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Free space left in the FIFO
    #[must_use]
    pub fn free(&self) -> usize {
        consts::FIFO_SIZE - 1 - self.len()
    }

    /// Appends as much of `data` as fits, returning the number of bytes taken
    pub fn extend_from_slice(&mut self, data: &[u8]) -> usize {
        let take = data.len().min(self.free());
        for &byte in &data[..take] {
            self.buf[self.tail] = byte;
            self.tail = (self.tail + 1) & (consts::FIFO_SIZE - 1);
        }
        take
    }

    /// Returns the byte at the given offset from the read position
    ///
    /// # Panics
    ///
    /// Panics when the index is past the buffered length.
    #[must_use]
    pub fn at(&self, idx: usize) -> u8 {
        assert!(idx < self.len());
        self.buf[(self.head + idx) & (consts::FIFO_SIZE - 1)]
    }

    /// Drops `count` bytes from the front, or everything if fewer are buffered
    pub fn skip(&mut self, count: usize) {
        let count = count.min(self.len());
        self.head = (self.head + count) & (consts::FIFO_SIZE - 1);
    }

    /// Drops all buffered bytes
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

impl Default for Fifo {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame-level statistics kept by the scanner
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct FrameCounters {
    /// CRC-verified frames handed to the caller
    pub frames_ok: u64,
    /// Preambles that did not check out, one count per discarded byte
    pub crc_failures: u64,
    /// Bytes skipped while hunting for a preamble
    pub bytes_skipped: u64,
}

/// Byte-wise resynchronizing scanner over an RTCM byte stream
pub struct FrameScanner {
    fifo: Fifo,
    counters: FrameCounters,
}

impl FrameScanner {
    /// Makes a scanner with an empty FIFO
    #[must_use]
    pub fn new() -> FrameScanner {
        FrameScanner {
            fifo: Fifo::new(),
            counters: FrameCounters::default(),
        }
    }

    /// Appends raw stream bytes, returning how many were buffered
    ///
    /// The remainder of `data` must be offered again once frames have been
    /// drained; the FIFO holds several maximum-size frames so this only
    /// happens when the caller does not keep up.
    pub fn push_bytes(&mut self, data: &[u8]) -> usize {
        self.fifo.extend_from_slice(data)
    }

    /// Scan counters accumulated so far
    #[must_use]
    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    /// Drops all buffered bytes and leaves the counters in place
    pub fn reset(&mut self) {
        self.fifo.clear();
    }

    /// Extracts the next CRC-verified payload into `out`
    ///
    /// Returns the payload length, or `None` when the FIFO holds no complete
    /// valid frame. `out` must be able to hold a maximum-size payload.
    pub fn next_frame(&mut self, out: &mut [u8]) -> Option<usize> {
        debug_assert!(out.len() >= consts::MAX_PAYLOAD_LEN);
        loop {
            /* hunt for the preamble */
            while !self.fifo.is_empty() && self.fifo.at(0) != consts::PREAMBLE {
                self.fifo.skip(1);
                self.counters.bytes_skipped += 1;
            }
            if self.fifo.len() < consts::FRAME_OVERHEAD {
                return None;
            }

            let payload_len =
                ((usize::from(self.fifo.at(1)) & 0x03) << 8) | usize::from(self.fifo.at(2));
            let frame_len = payload_len + consts::FRAME_OVERHEAD;
            if self.fifo.len() < frame_len {
                /* wait for the rest of the frame */
                return None;
            }

            /* header and payload feed the CRC, byte at a time since the FIFO
             * may wrap */
            let mut crc = 0;
            for i in 0..payload_len + 3 {
                crc = compute_crc24q(&[self.fifo.at(i)], crc);
            }
            let frame_crc = (u32::from(self.fifo.at(payload_len + 3)) << 16)
                | (u32::from(self.fifo.at(payload_len + 4)) << 8)
                | u32::from(self.fifo.at(payload_len + 5));

            if crc != frame_crc {
                /* advance a single byte and retry, the real frame may start
                 * inside what we just looked at */
                self.fifo.skip(1);
                self.counters.crc_failures += 1;
                continue;
            }

            for i in 0..payload_len {
                out[i] = self.fifo.at(3 + i);
            }
            self.fifo.skip(frame_len);
            self.counters.frames_ok += 1;
            return Some(payload_len);
        }
    }
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a payload in a complete RTCM frame
///
/// Returns the number of bytes written to `out`, or `None` when the payload
/// is over-length or `out` too small.
#[must_use]
pub fn frame_payload(payload: &[u8], out: &mut [u8]) -> Option<usize> {
    if payload.len() > consts::MAX_PAYLOAD_LEN {
        return None;
    }
    let frame_len = payload.len() + consts::FRAME_OVERHEAD;
    if out.len() < frame_len {
        return None;
    }

    out[0] = consts::PREAMBLE;
    out[1] = (payload.len() >> 8) as u8;
    out[2] = (payload.len() & 0xFF) as u8;
    out[3..3 + payload.len()].copy_from_slice(payload);

    let crc = compute_crc24q(&out[..payload.len() + 3], 0);
    out[payload.len() + 3] = (crc >> 16) as u8;
    out[payload.len() + 4] = (crc >> 8) as u8;
    out[payload.len() + 5] = crc as u8;
    Some(frame_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_frame() -> Vec<u8> {
        /* a live 1013 frame */
        vec![
            0xD3, 0x00, 0x09, 0x3F, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48, 0x36, 0x24,
            0x76,
        ]
    }

    #[test]
    fn fifo_wraps() {
        let mut fifo = Fifo::new();
        assert!(fifo.is_empty());
        let data: Vec<u8> = (0..200).map(|i| i as u8).collect();
        for _ in 0..30 {
            assert_eq!(fifo.extend_from_slice(&data), data.len());
            assert_eq!(fifo.at(0), 0);
            assert_eq!(fifo.at(199), 199);
            fifo.skip(data.len());
        }
        assert!(fifo.is_empty());
    }

    #[test]
    fn fifo_partial_accept() {
        let mut fifo = Fifo::new();
        let big = vec![0xAA; consts::FIFO_SIZE * 2];
        let taken = fifo.extend_from_slice(&big);
        assert_eq!(taken, consts::FIFO_SIZE - 1);
        assert_eq!(fifo.free(), 0);
    }

    #[test]
    fn scans_valid_frame() {
        let mut scanner = FrameScanner::new();
        scanner.push_bytes(&example_frame());
        let mut payload = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = scanner.next_frame(&mut payload).unwrap();
        assert_eq!(len, 9);
        assert_eq!(&payload[..2], &[0x3F, 0x50]);
        assert_eq!(scanner.counters().frames_ok, 1);
        assert!(scanner.next_frame(&mut payload).is_none());
    }

    #[test]
    fn resynchronizes_after_garbage() {
        let mut scanner = FrameScanner::new();
        let mut stream = vec![0x12, 0xD3, 0x99];
        stream.extend_from_slice(&example_frame());
        scanner.push_bytes(&stream);

        let mut payload = [0u8; consts::MAX_PAYLOAD_LEN];
        let len = scanner.next_frame(&mut payload).unwrap();
        assert_eq!(len, 9);
        let counters = scanner.counters();
        assert!(counters.crc_failures >= 1);
    }

    #[test]
    fn single_corrupt_byte_costs_one_frame() {
        let mut scanner = FrameScanner::new();
        let mut corrupted = example_frame();
        corrupted[7] ^= 0x40;
        scanner.push_bytes(&corrupted);
        scanner.push_bytes(&example_frame());
        scanner.push_bytes(&example_frame());

        let mut payload = [0u8; consts::MAX_PAYLOAD_LEN];
        let mut good = 0;
        while scanner.next_frame(&mut payload).is_some() {
            good += 1;
        }
        assert_eq!(good, 2);
    }

    #[test]
    fn waits_for_partial_frame() {
        let mut scanner = FrameScanner::new();
        let frame = example_frame();
        scanner.push_bytes(&frame[..8]);
        let mut payload = [0u8; consts::MAX_PAYLOAD_LEN];
        assert!(scanner.next_frame(&mut payload).is_none());
        scanner.push_bytes(&frame[8..]);
        assert_eq!(scanner.next_frame(&mut payload), Some(9));
    }

    #[test]
    fn frame_round_trip() {
        let payload = [0x3Fu8, 0x50, 0x01, 0xE8, 0xD6, 0xA1, 0x09, 0x80, 0x48];
        let mut framed = [0u8; 64];
        let len = frame_payload(&payload, &mut framed).unwrap();
        assert_eq!(&framed[..len], example_frame().as_slice());
    }

    #[test]
    fn frame_rejects_oversize() {
        let payload = [0u8; consts::MAX_PAYLOAD_LEN + 1];
        let mut out = [0u8; consts::MAX_FRAME_LEN + 10];
        assert!(frame_payload(&payload, &mut out).is_none());
    }
}
