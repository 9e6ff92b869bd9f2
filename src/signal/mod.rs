// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GNSS Signals and related functionality
//!
//! Signals are specific to a satellite and code combination. A satellite is
//! identified by its assigned number and the constellation it belongs to.
//! Each satellite can send out multiple signals.
//!
//! This module provides:
//! - [`Constellation`] - Representing the supported GNSS constellations
//! - [`Code`] - Representing the codes broadcast from the GNSS satellites
//! - [`GnssSignal`] - Represents a [`Code`] broadcast by a specific satellite,
//!   using the satellite PRN as the identifier
//!
//! GLONASS FDMA satellites are additionally identified by a frequency channel
//! number (FCN). RTCM and SBP disagree on how an FCN is written to the wire,
//! so the conversions live here next to the signal types; inside the crate an
//! FCN is always an `Option<i8>` holding the physical channel -7..=6.
mod code;
mod constellation;
pub mod consts;

pub use code::*;
pub use constellation::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// GNSS Signal identifier
#[derive(
    Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
pub struct GnssSignal {
    code: Code,
    sat: u16,
}

/// An error encountered when the satellite number is not in the valid range
/// for the associated constellation
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("The satellite number is not valid for the associated constellation ({0})")]
pub struct InvalidSatellite(u16);

/// An error encountered when converting wire values into a [`GnssSignal`]
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum InvalidGnssSignal {
    /// The code value is not in the enumeration
    #[error("Invalid code")]
    InvalidCode(#[from] InvalidCodeInt),
    /// The satellite number is out of range
    #[error("Invalid satellite")]
    InvalidSatellite(#[from] InvalidSatellite),
}

impl GnssSignal {
    /// Make a [`GnssSignal`] from its constituent parts, check for a valid satellite PRN
    ///
    /// The `sat` value is checked to be a valid PRN value for the given constellation
    pub fn new(sat: u16, code: Code) -> Result<GnssSignal, InvalidSatellite> {
        let constellation = code.to_constellation();
        if sat < constellation.first_prn()
            || sat >= (constellation.first_prn() + constellation.sat_count())
        {
            Err(InvalidSatellite(sat))
        } else {
            Ok(GnssSignal { code, sat })
        }
    }

    /// Make a [`GnssSignal`] from the SBP wire representation
    pub fn from_sbp(sat: u8, code: u8) -> Result<GnssSignal, InvalidGnssSignal> {
        use std::convert::TryInto;
        Ok(GnssSignal::new(u16::from(sat), code.try_into()?)?)
    }

    /// Get the satellite PRN of the signal
    #[must_use]
    pub fn sat(&self) -> u16 {
        self.sat
    }

    /// Get the [`Code`] of the signal
    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    /// Get the [`Constellation`] of the signal
    #[must_use]
    pub fn to_constellation(self) -> Constellation {
        self.code.to_constellation()
    }
}

impl fmt::Display for GnssSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.sat)
    }
}

/// Converts an SBP FCN field (1..=14, 0 marking unknown) into a channel number
#[must_use]
pub fn fcn_from_sbp(sbp_fcn: u8) -> Option<i8> {
    if sbp_fcn == consts::SBP_GLO_FCN_UNKNOWN {
        return None;
    }
    let fcn = sbp_fcn as i8 - consts::SBP_GLO_FCN_OFFSET;
    if (consts::GLO_MIN_FCN..=consts::GLO_MAX_FCN).contains(&fcn) {
        Some(fcn)
    } else {
        None
    }
}

/// Converts a channel number into the SBP FCN field
#[must_use]
pub fn fcn_to_sbp(fcn: Option<i8>) -> u8 {
    match fcn {
        Some(fcn) => (fcn + consts::SBP_GLO_FCN_OFFSET) as u8,
        None => consts::SBP_GLO_FCN_UNKNOWN,
    }
}

/// Converts an MSM satellite info FCN field (0..=13, 255 marking unknown)
/// into a channel number
#[must_use]
pub fn fcn_from_msm(msm_fcn: u8) -> Option<i8> {
    if msm_fcn == consts::MSM_GLO_FCN_UNKNOWN {
        return None;
    }
    let fcn = msm_fcn as i8 - consts::MSM_GLO_FCN_OFFSET;
    if (consts::GLO_MIN_FCN..=consts::GLO_MAX_FCN).contains(&fcn) {
        Some(fcn)
    } else {
        None
    }
}

/// Converts a channel number into the MSM satellite info FCN field
#[must_use]
pub fn fcn_to_msm(fcn: Option<i8>) -> u8 {
    match fcn {
        Some(fcn) => (fcn + consts::MSM_GLO_FCN_OFFSET) as u8,
        None => consts::MSM_GLO_FCN_UNKNOWN,
    }
}

/// Converts a legacy 1010/1012 satellite FCN field (DF040) into a channel
/// number. Values above 20 are reserved.
#[must_use]
pub fn fcn_from_mt1012(raw_fcn: u8) -> Option<i8> {
    if raw_fcn > 20 {
        return None;
    }
    let fcn = raw_fcn as i8 - consts::MT1012_GLO_FCN_OFFSET;
    if (consts::GLO_MIN_FCN..=consts::GLO_MAX_FCN).contains(&fcn) {
        Some(fcn)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_to_constellation() {
        assert_eq!(
            GnssSignal::new(1, Code::GpsL1ca)
                .unwrap()
                .to_constellation(),
            Constellation::Gps
        );
        assert_eq!(
            GnssSignal::new(120, Code::SbasL1ca)
                .unwrap()
                .to_constellation(),
            Constellation::Sbas
        );
        assert_eq!(
            GnssSignal::new(1, Code::GloL1of)
                .unwrap()
                .to_constellation(),
            Constellation::Glo
        );
        assert_eq!(
            GnssSignal::new(64, Code::Bds3B1cx)
                .unwrap()
                .to_constellation(),
            Constellation::Bds
        );
        assert_eq!(
            GnssSignal::new(193, Code::QzsL1ca)
                .unwrap()
                .to_constellation(),
            Constellation::Qzs
        );
    }

    #[test]
    fn invalid_sats() {
        assert!(GnssSignal::new(0, Code::GpsL1ca).is_err());
        assert!(GnssSignal::new(33, Code::GpsL1ca).is_err());
        assert!(GnssSignal::new(1, Code::SbasL1ca).is_err());
        assert!(GnssSignal::new(139, Code::SbasL1ca).is_err());
        assert!(GnssSignal::new(29, Code::GloL1of).is_err());
        assert!(GnssSignal::new(192, Code::QzsL1ca).is_err());
        assert!(GnssSignal::new(203, Code::QzsL1ca).is_err());
    }

    #[test]
    fn fcn_sbp_boundary() {
        assert_eq!(fcn_from_sbp(0), None);
        assert_eq!(fcn_from_sbp(1), Some(-7));
        assert_eq!(fcn_from_sbp(8), Some(0));
        assert_eq!(fcn_from_sbp(14), Some(6));
        assert_eq!(fcn_from_sbp(15), None);

        assert_eq!(fcn_to_sbp(None), 0);
        assert_eq!(fcn_to_sbp(Some(-7)), 1);
        assert_eq!(fcn_to_sbp(Some(6)), 14);
    }

    #[test]
    fn fcn_msm_boundary() {
        assert_eq!(fcn_from_msm(255), None);
        assert_eq!(fcn_from_msm(0), Some(-7));
        assert_eq!(fcn_from_msm(7), Some(0));
        assert_eq!(fcn_from_msm(13), Some(6));
        assert_eq!(fcn_from_msm(14), None);

        assert_eq!(fcn_to_msm(None), 255);
        assert_eq!(fcn_to_msm(Some(0)), 7);
    }

    #[test]
    fn fcn_mt1012_boundary() {
        assert_eq!(fcn_from_mt1012(0), Some(-7));
        assert_eq!(fcn_from_mt1012(13), Some(6));
        assert_eq!(fcn_from_mt1012(14), None);
        assert_eq!(fcn_from_mt1012(21), None);
    }
}
