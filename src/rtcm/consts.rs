// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

//! Fundamental RTCM 3 constants

/// Frame preamble byte
pub const PREAMBLE: u8 = 0xD3;

/// Bytes of framing around a payload: preamble, length, 24 bit CRC
pub const FRAME_OVERHEAD: usize = 6;
/// Smallest payload that can hold a 12 bit message number
pub const MIN_PAYLOAD_LEN: usize = 2;
/// Largest payload expressible in the 10 bit length field
pub const MAX_PAYLOAD_LEN: usize = 1023;
/// Largest complete frame
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + FRAME_OVERHEAD;
/// Input FIFO capacity, power of two
pub const FIFO_SIZE: usize = 4096;

/// RTCM v3 Unit of GPS Pseudorange (m)
pub const PRUNIT_GPS: f64 = 299_792.458;
/// RTCM v3 Unit of GLO Pseudorange (m)
pub const PRUNIT_GLO: f64 = 599_584.916;

/// Most satellites a legacy observation message can carry
pub const MAX_SATS: usize = 32;

/// Wire pattern marking an invalid L1 pseudorange (DF011)
pub const PR_L1_INVALID: u32 = 0x80000;
/// Wire pattern marking an invalid L2-L1 pseudorange difference (DF017)
pub const PR_L2_INVALID: i32 = -0x2000;
/// Wire pattern marking an invalid carrier phase difference (DF012/DF018)
pub const CP_INVALID: i32 = -0x80000;

/// Maximum number of cells in an MSM message
pub const MSM_MAX_CELLS: usize = 64;
/// Size of the MSM satellite mask (DF394)
pub const MSM_SATELLITE_MASK_SIZE: usize = 64;
/// Size of the MSM signal mask (DF395)
pub const MSM_SIGNAL_MASK_SIZE: usize = 32;

/// Wire pattern marking an invalid MSM fine pseudorange (DF400)
pub const MSM_PR_INVALID: i32 = -16384;
/// Wire pattern marking an invalid extended MSM fine pseudorange (DF405)
pub const MSM_PR_EXT_INVALID: i32 = -524_288;
/// Wire pattern marking an invalid MSM fine phase range (DF401)
pub const MSM_CP_INVALID: i32 = -2_097_152;
/// Wire pattern marking an invalid extended MSM fine phase range (DF406)
pub const MSM_CP_EXT_INVALID: i32 = -8_388_608;
/// Wire pattern marking an invalid MSM fine phase range rate (DF404)
pub const MSM_DOP_INVALID: i32 = -16384;
/// Wire pattern marking an invalid MSM rough range (DF397)
pub const MSM_ROUGH_RANGE_INVALID: u8 = 0xFF;
/// Wire pattern marking an invalid MSM rough range rate (DF399)
pub const MSM_ROUGH_RATE_INVALID: i16 = -8192;

/// Max length of strings in 1008, 1033, etc
pub const MAX_STRING_LEN: usize = 32;

/// Maximum value for time-of-week in integer milliseconds
pub const MAX_TOW_MS: u32 = 7 * 24 * 3600 * 1000 - 1;
/// Maximum value for GLONASS time-of-day in integer milliseconds
pub const GLO_MAX_TOD_MS: u32 = 24 * 3600 * 1000 - 1;

/// Maximum antenna height of message 1006 (DF028)
pub const MAX_ANTENNA_HEIGHT_M: f64 = 6.5535;

/// Leap second field value of message 1013 when the offset is unknown
pub const UNKNOWN_LEAP_SECONDS: u8 = 255;

/// Swift proprietary message number
pub const SWIFT_PROPRIETARY_MSG: u16 = 4062;
/// Navigation data frame message number
pub const NDF_MSG: u16 = 4075;

/// Maximum frame payload of a navigation data frame, in bits
pub const MAX_NDF_FRAME_SIZE_BITS: usize = 4096;
/// Maximum frames in one navigation data frame message
pub const MAX_NDF_FRAMES: usize = 63;

/// 2^-4
pub const C_1_2P4: f64 = 0.0625;
/// 2^-8
pub const C_1_2P8: f64 = 0.003_906_25;
/// 2^-10
pub const C_1_2P10: f64 = 0.000_976_562_5;
/// 2^-24
pub const C_1_2P24: f64 = 5.960_464_477_539_063e-8;
/// 2^-29
pub const C_1_2P29: f64 = 1.862_645_149_230_957e-9;
/// 2^-31
pub const C_1_2P31: f64 = 4.656_612_873_077_393e-10;
/// 2^14
pub const C_2P14: f64 = 16384.0;
/// 2^19
pub const C_2P19: f64 = 524_288.0;

/// The official GPS value of the speed of light in m/s
pub const GPS_C: f64 = 299_792_458.0;

/// The GPS L1 center frequency in Hz
pub const GPS_L1_HZ: f64 = 1.575_42e9;
/// The GPS L2 center frequency in Hz
pub const GPS_L2_HZ: f64 = 1.227_60e9;
/// The GLO L1 center frequency in Hz
pub const GLO_L1_HZ: f64 = 1.602e9;
/// The GLO L2 center frequency in Hz
pub const GLO_L2_HZ: f64 = 1.246e9;
/// Frequency between two adjacent GLO channels in Hz for the L1 band
pub const GLO_L1_DELTA_HZ: f64 = 5.625e5;
/// Frequency between two adjacent GLO channels in Hz for the L2 band
pub const GLO_L2_DELTA_HZ: f64 = 4.375e5;
