// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

//! Constant values describing the GNSS constellations

/// Number of GPS satellites
pub const NUM_SATS_GPS: u16 = 32;
/// Number of SBAS satellites
pub const NUM_SATS_SBAS: u16 = 19;
/// Number of GLONASS satellites
pub const NUM_SATS_GLO: u16 = 28;
/// Number of BeiDou satellites
pub const NUM_SATS_BDS: u16 = 64;
/// Number of Galileo satellites
pub const NUM_SATS_GAL: u16 = 36;
/// Number of QZSS satellites
pub const NUM_SATS_QZS: u16 = 10;

/// First PRN of the GPS satellites
pub const GPS_FIRST_PRN: u16 = 1;
/// First PRN of the SBAS satellites
pub const SBAS_FIRST_PRN: u16 = 120;
/// First PRN of the GLONASS satellites
pub const GLO_FIRST_PRN: u16 = 1;
/// First PRN of the BeiDou satellites
pub const BDS_FIRST_PRN: u16 = 1;
/// First PRN of the Galileo satellites
pub const GAL_FIRST_PRN: u16 = 1;
/// First PRN of the QZSS satellites
pub const QZS_FIRST_PRN: u16 = 193;

/// Lowest GLONASS frequency channel number
pub const GLO_MIN_FCN: i8 = -7;
/// Highest GLONASS frequency channel number
pub const GLO_MAX_FCN: i8 = 6;

/// Offset applied to an FCN stored in an MSM satellite info field (DF419)
pub const MSM_GLO_FCN_OFFSET: i8 = 7;
/// MSM wire value marking an unknown FCN
pub const MSM_GLO_FCN_UNKNOWN: u8 = 255;

/// Offset applied to an FCN stored in a legacy 1010/1012 satellite field (DF040)
pub const MT1012_GLO_FCN_OFFSET: i8 = 7;

/// Offset applied to an FCN carried in an SBP ephemeris or `MSG_GLO_FCN`
pub const SBP_GLO_FCN_OFFSET: i8 = 8;
/// SBP wire value marking an unknown FCN
pub const SBP_GLO_FCN_UNKNOWN: u8 = 0;

/// Centre frequency of GPS L1 in Hz
pub const GPS_L1_HZ: f64 = 1.575_42e9;
/// Centre frequency of GPS L2 in Hz
pub const GPS_L2_HZ: f64 = 1.227_60e9;
/// Centre frequency of GPS L5 in Hz
pub const GPS_L5_HZ: f64 = 1.176_45e9;
/// Centre frequency of SBAS L1 in Hz
pub const SBAS_L1_HZ: f64 = GPS_L1_HZ;
/// Centre frequency of SBAS L5 in Hz
pub const SBAS_L5_HZ: f64 = GPS_L5_HZ;
/// Centre frequency of GLONASS L1 in Hz
pub const GLO_L1_HZ: f64 = 1.602e9;
/// Centre frequency of GLONASS L2 in Hz
pub const GLO_L2_HZ: f64 = 1.246e9;
/// Spacing of adjacent GLONASS L1 channels in Hz
pub const GLO_L1_DELTA_HZ: f64 = 5.625e5;
/// Spacing of adjacent GLONASS L2 channels in Hz
pub const GLO_L2_DELTA_HZ: f64 = 4.375e5;
/// Centre frequency of BeiDou B1I in Hz
pub const BDS2_B1I_HZ: f64 = 1.561_098e9;
/// Centre frequency of BeiDou B1C in Hz
pub const BDS3_B1C_HZ: f64 = GPS_L1_HZ;
/// Centre frequency of BeiDou B2I in Hz
pub const BDS2_B2_HZ: f64 = 1.207_14e9;
/// Centre frequency of BeiDou B3 in Hz
pub const BDS3_B3_HZ: f64 = 1.268_52e9;
/// Centre frequency of BeiDou B2a in Hz
pub const BDS3_B5_HZ: f64 = GPS_L5_HZ;
/// Centre frequency of BeiDou B2b in Hz
pub const BDS3_B7_HZ: f64 = 1.207_14e9;
/// Centre frequency of Galileo E1 in Hz
pub const GAL_E1_HZ: f64 = GPS_L1_HZ;
/// Centre frequency of Galileo E5a in Hz
pub const GAL_E5_HZ: f64 = GPS_L5_HZ;
/// Centre frequency of Galileo E6 in Hz
pub const GAL_E6_HZ: f64 = 1.278_75e9;
/// Centre frequency of Galileo E5b in Hz
pub const GAL_E7_HZ: f64 = 1.207_14e9;
/// Centre frequency of Galileo E5 AltBOC in Hz
pub const GAL_E8_HZ: f64 = 1.191_795e9;
/// Centre frequency of QZSS L1 in Hz
pub const QZS_L1_HZ: f64 = GPS_L1_HZ;
/// Centre frequency of QZSS L2 in Hz
pub const QZS_L2_HZ: f64 = GPS_L2_HZ;
/// Centre frequency of QZSS L5 in Hz
pub const QZS_L5_HZ: f64 = GPS_L5_HZ;
