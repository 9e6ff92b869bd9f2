// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! `gnss-converters` translates GNSS correction streams between RTCM 3 and
//! Swift Binary Protocol (SBP), in both directions.
//!
//! RTCM 3 is the bit-packed message stream produced by differential-GNSS base
//! stations and NTRIP services. SBP is the compact length-prefixed format
//! spoken by Swift Navigation receivers. The translation covers observations
//! (legacy and MSM), reference-station coordinates, multi-constellation
//! ephemerides, SSR corrections, antenna metadata and Swift proprietary
//! extensions.
//!
//! Most RTCM observation messages only carry a time of day or a time of week,
//! so recovering an absolute GPS time stamp is a core part of the job. The
//! [`time_truth`] module fuses timing hints from several message kinds and
//! sources into a week number / time of week / leap second estimate with an
//! attached confidence level, and the converter sessions consult it whenever a
//! message needs to be placed on the GPS time line.
//!
//! ## [RTCM](`rtcm`)
//! Framing (preamble, 10 bit length, CRC-24Q), a byte-wise resynchronizing
//! scanner, and typed encoders/decoders for every supported message number.
//!
//! ## [SBP](`sbp`)
//! Framing (preamble, little-endian type/sender, CRC-16-CCITT) and the typed
//! message records that mirror the RTCM semantics.
//!
//! ## [Time Truth](`time_truth`)
//! Concurrent multi-source estimation of the current GPS week number, time of
//! week and GPS-UTC leap second offset.
//!
//! ## [Converter](`converter`)
//! The per-stream translator sessions: [`converter::Rtcm2SbpSession`] consumes
//! raw RTCM bytes and emits SBP messages through a callback,
//! [`converter::Sbp2RtcmSession`] does the reverse.

pub mod bitstream;
pub mod converter;
pub mod edc;
pub mod rtcm;
pub mod sbp;
pub mod signal;
pub mod time;
pub mod time_truth;
