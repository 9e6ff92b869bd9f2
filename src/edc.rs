// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Error detection codes
//!
//! Checksum algorithms for the two wire protocols handled by this crate.

/// Generator polynomial of CRC-24Q, x^24 omitted
const CRC24Q_POLY: u32 = 0x0186_4CFB;

/// Calculate Qualcomm 24-bit Cyclical Redundancy Check (CRC-24Q).
///
/// This CRC is used with the RTCM protocol. It is computed over the three
/// byte frame header plus the payload.
///
/// The CRC polynomial used is:
///   x^{24} + x^{23} + x^{18} + x^{17} + x^{14} + x^{11} + x^{10} +
///   x^7    + x^6    + x^5    + x^4    + x^3    + x+1
///
/// Mask 0x1864CFB, not reversed, not XOR'd
#[must_use]
pub fn compute_crc24q(buf: &[u8], initial_value: u32) -> u32 {
    let mut crc = initial_value & 0x00FF_FFFF;
    for byte in buf {
        crc ^= u32::from(*byte) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24Q_POLY;
            }
        }
    }
    crc & 0x00FF_FFFF
}

/// Calculate the CCITT 16-bit Cyclical Redundancy Check (CRC16-CCITT).
///
/// This CRC is used with the Swift Binary Protocol, computed over the
/// message type, sender, length and payload bytes.
///
/// Polynomial 0x1021, not reversed, not XOR'd
#[must_use]
pub fn compute_crc16_ccitt(buf: &[u8], initial_value: u16) -> u16 {
    let mut crc = initial_value;
    for byte in buf {
        crc ^= u16::from(*byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    const TEST_DATA: &[u8] = "123456789".as_bytes();

    #[test]
    fn crc24q() {
        let crc = super::compute_crc24q(&TEST_DATA[0..0], 0);
        assert!(
            crc == 0,
            "CRC of empty buffer with starting value 0 should be 0, not {}",
            crc
        );

        let crc = super::compute_crc24q(&TEST_DATA[0..0], 22);
        assert!(
            crc == 22,
            "CRC of empty buffer with starting value 22 should be 22, not {}",
            crc
        );

        /* Test value taken from python crcmod package tests, see:
         * http://crcmod.sourceforge.net/crcmod.predefined.html */
        let crc = super::compute_crc24q(TEST_DATA, 0xB704CE);
        assert!(
            crc == 0x21CF02,
            "CRC of \"123456789\" with init value 0xB704CE should be 0x21CF02, not {:#08X}",
            crc
        );
    }

    #[test]
    fn crc24q_single_bit_sensitivity() {
        let mut data = *b"a random rtcm payload body";
        let reference = super::compute_crc24q(&data, 0);
        for byte in 0..data.len() {
            for bit in 0..8 {
                data[byte] ^= 1 << bit;
                assert_ne!(reference, super::compute_crc24q(&data, 0));
                data[byte] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn crc16_ccitt() {
        /* XModem variant check value */
        let crc = super::compute_crc16_ccitt(TEST_DATA, 0);
        assert!(
            crc == 0x31C3,
            "CRC of \"123456789\" with init value 0 should be 0x31C3, not {:#06X}",
            crc
        );

        let crc = super::compute_crc16_ccitt(&TEST_DATA[0..0], 0x1D0F);
        assert_eq!(crc, 0x1D0F);
    }

    proptest::proptest! {
        #[test]
        fn crc24q_detects_any_bit_flip(
            mut data in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..128),
            flip_index: proptest::sample::Index,
            bit in 0usize..8,
        ) {
            let reference = super::compute_crc24q(&data, 0);
            let index = flip_index.index(data.len());
            data[index] ^= 1 << bit;
            proptest::prop_assert_ne!(reference, super::compute_crc24q(&data, 0));
        }
    }
}
