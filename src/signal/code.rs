// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

use super::{consts, Constellation};

/// Code identifiers
///
/// The discriminant values are the SBP wire encoding of the code, shared
/// with librtcm and libsbp.
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::AsRefStr,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[repr(u8)]
pub enum Code {
    #[strum(to_string = "GPS L1CA")]
    /// GPS L1CA: BPSK(1)
    GpsL1ca,
    #[strum(to_string = "GPS L2CM")]
    /// GPS L2C: 2 x BPSK(0.5)
    GpsL2cm,
    #[strum(to_string = "SBAS L1")]
    /// SBAS L1: BPSK(1)
    SbasL1ca,
    #[strum(to_string = "GLO L1OF")]
    /// GLONASS L1OF: FDMA BPSK(0.5)
    GloL1of,
    #[strum(to_string = "GLO L2OF")]
    /// GLONASS L2OF: FDMA BPSK(0.5)
    GloL2of,
    #[strum(to_string = "GPS L1P")]
    /// GPS L1P(Y): encrypted BPSK(10)
    GpsL1p,
    #[strum(to_string = "GPS L2P")]
    /// GPS L2P(Y): encrypted BPSK(10)
    GpsL2p,
    #[strum(to_string = "GPS L2CL")]
    GpsL2cl,
    #[strum(to_string = "GPS L2C")]
    GpsL2cx,
    #[strum(to_string = "GPS L5I")]
    /// GPS L5: QPSK(10) at 1150*f0
    GpsL5i,
    #[strum(to_string = "GPS L5Q")]
    GpsL5q,
    #[strum(to_string = "GPS L5")]
    GpsL5x,
    #[strum(to_string = "BDS B1")]
    /// BDS2 B1I: BPSK(2) at 1526*f0
    Bds2B1,
    #[strum(to_string = "BDS B2")]
    /// BDS2 B2I: BPSK(2) at 1180*f0
    Bds2B2,
    #[strum(to_string = "GAL E1B")]
    /// Galileo E1: CASM CBOC(1,1) at 1540*f0
    GalE1b,
    #[strum(to_string = "GAL E1C")]
    GalE1c,
    #[strum(to_string = "GAL E1")]
    GalE1x,
    #[strum(to_string = "GAL E6B")]
    /// Galileo E6: CASM BPSK(5) at 1250*f0
    GalE6b,
    #[strum(to_string = "GAL E6C")]
    GalE6c,
    #[strum(to_string = "GAL E6")]
    GalE6x,
    #[strum(to_string = "GAL E5bI")]
    /// Galileo E5b: QPSK(10) at 1180*f0
    GalE7i,
    #[strum(to_string = "GAL E5bQ")]
    GalE7q,
    #[strum(to_string = "GAL E5b")]
    GalE7x,
    #[strum(to_string = "GAL E8I")]
    /// Galileo E5AltBOC(15,10) at 1165*f0
    GalE8i,
    #[strum(to_string = "GAL E8Q")]
    GalE8q,
    #[strum(to_string = "GAL E8")]
    GalE8x,
    #[strum(to_string = "GAL E5aI")]
    /// Galileo E5a: QPSK(10) at 1150*f0
    GalE5i,
    #[strum(to_string = "GAL E5aQ")]
    GalE5q,
    #[strum(to_string = "GAL E5a")]
    GalE5x,
    #[strum(to_string = "GLO L1P")]
    /// GLONASS L1P: encrypted
    GloL1p,
    #[strum(to_string = "GLO L2P")]
    /// GLONASS L2P: encrypted
    GloL2p,
    #[strum(to_string = "QZS L1CA")]
    /// QZSS L1CA: BPSK(1) at 1540*f0
    QzsL1ca,
    #[strum(to_string = "QZS L1CI")]
    /// QZSS L1C: TM-BOC at 1540*f0
    QzsL1ci,
    #[strum(to_string = "QZS L1CQ")]
    QzsL1cq,
    #[strum(to_string = "QZS L1CX")]
    QzsL1cx,
    #[strum(to_string = "QZS L2CM")]
    /// QZSS L2C: 2 x BPSK(0.5) at 1200*f0
    QzsL2cm,
    #[strum(to_string = "QZS L2CL")]
    QzsL2cl,
    #[strum(to_string = "QZS L2C")]
    QzsL2cx,
    #[strum(to_string = "QZS L5I")]
    /// QZSS L5: QPSK(10) at 1150*f0
    QzsL5i,
    #[strum(to_string = "QZS L5Q")]
    QzsL5q,
    #[strum(to_string = "QZS L5")]
    QzsL5x,
    #[strum(to_string = "SBAS L5I")]
    /// SBAS L5: ? at 1150*f0
    SbasL5i,
    #[strum(to_string = "SBAS L5Q")]
    SbasL5q,
    #[strum(to_string = "SBAS L5")]
    SbasL5x,
    #[strum(to_string = "BDS3 B1CI")]
    /// BDS3 B1C: TM-BOC at 1540*f0
    Bds3B1ci,
    #[strum(to_string = "BDS3 B1CQ")]
    Bds3B1cq,
    #[strum(to_string = "BDS3 B1C")]
    Bds3B1cx,
    #[strum(to_string = "BDS3 B5I")]
    /// BDS3 B2a: QPSK(10) at 1150*f0
    Bds3B5i,
    #[strum(to_string = "BDS3 B5Q")]
    Bds3B5q,
    #[strum(to_string = "BDS3 B5")]
    Bds3B5x,
    #[strum(to_string = "BDS3 B7I")]
    /// BDS3 B2b: QPSK(10) at 1180*f0
    Bds3B7i,
    #[strum(to_string = "BDS3 B7Q")]
    Bds3B7q,
    #[strum(to_string = "BDS3 B7")]
    Bds3B7x,
    #[strum(to_string = "BDS3 B3I")]
    /// BDS3 B3I: QPSK(10) at 1240*f0
    Bds3B3i,
    #[strum(to_string = "BDS3 B3Q")]
    Bds3B3q,
    #[strum(to_string = "BDS3 B3")]
    Bds3B3x,
    #[strum(to_string = "GPS L1CI")]
    /// GPS L1C: TM-BOC at 1540*f0
    GpsL1ci,
    #[strum(to_string = "GPS L1CQ")]
    GpsL1cq,
    #[strum(to_string = "GPS L1C")]
    GpsL1cx,
}

impl Code {
    /// Gets the corresponding [`Constellation`]
    #[must_use]
    pub fn to_constellation(self) -> Constellation {
        match self {
            Code::GpsL1ca
            | Code::GpsL2cm
            | Code::GpsL1p
            | Code::GpsL2p
            | Code::GpsL2cl
            | Code::GpsL2cx
            | Code::GpsL5i
            | Code::GpsL5q
            | Code::GpsL5x
            | Code::GpsL1ci
            | Code::GpsL1cq
            | Code::GpsL1cx => Constellation::Gps,
            Code::SbasL1ca | Code::SbasL5i | Code::SbasL5q | Code::SbasL5x => Constellation::Sbas,
            Code::GloL1of | Code::GloL2of | Code::GloL1p | Code::GloL2p => Constellation::Glo,
            Code::Bds2B1
            | Code::Bds2B2
            | Code::Bds3B1ci
            | Code::Bds3B1cq
            | Code::Bds3B1cx
            | Code::Bds3B5i
            | Code::Bds3B5q
            | Code::Bds3B5x
            | Code::Bds3B7i
            | Code::Bds3B7q
            | Code::Bds3B7x
            | Code::Bds3B3i
            | Code::Bds3B3q
            | Code::Bds3B3x => Constellation::Bds,
            Code::GalE1b
            | Code::GalE1c
            | Code::GalE1x
            | Code::GalE6b
            | Code::GalE6c
            | Code::GalE6x
            | Code::GalE7i
            | Code::GalE7q
            | Code::GalE7x
            | Code::GalE8i
            | Code::GalE8q
            | Code::GalE8x
            | Code::GalE5i
            | Code::GalE5q
            | Code::GalE5x => Constellation::Gal,
            Code::QzsL1ca
            | Code::QzsL1ci
            | Code::QzsL1cq
            | Code::QzsL1cx
            | Code::QzsL2cm
            | Code::QzsL2cl
            | Code::QzsL2cx
            | Code::QzsL5i
            | Code::QzsL5q
            | Code::QzsL5x => Constellation::Qzs,
        }
    }

    /// Checks if this is a GPS code
    #[must_use]
    pub fn is_gps(self) -> bool {
        self.to_constellation() == Constellation::Gps
    }

    /// Checks if this is a SBAS code
    #[must_use]
    pub fn is_sbas(self) -> bool {
        self.to_constellation() == Constellation::Sbas
    }

    /// Checks if this is a GLONASS code
    #[must_use]
    pub fn is_glo(self) -> bool {
        self.to_constellation() == Constellation::Glo
    }

    /// Checks if this is a BeiDou code
    #[must_use]
    pub fn is_bds(self) -> bool {
        self.to_constellation() == Constellation::Bds
    }

    /// Checks if this is a Galileo code
    #[must_use]
    pub fn is_gal(self) -> bool {
        self.to_constellation() == Constellation::Gal
    }

    /// Checks if this is a QZSS code
    #[must_use]
    pub fn is_qzss(self) -> bool {
        self.to_constellation() == Constellation::Qzs
    }

    /// The SBP wire value of the code
    #[must_use]
    pub fn to_sbp(self) -> u8 {
        self as u8
    }

    /// Get the carrier frequency of the code
    ///
    /// # Note
    ///
    /// GLONASS FDMA codes return the center frequency. To get the channel
    /// frequency use [`Code::glo_channel_frequency()`] instead
    #[must_use]
    pub fn carrier_frequency(self) -> f64 {
        match self {
            Code::GpsL1ca | Code::GpsL1p | Code::GpsL1ci | Code::GpsL1cq | Code::GpsL1cx => {
                consts::GPS_L1_HZ
            }
            Code::GpsL2cm | Code::GpsL2p | Code::GpsL2cl | Code::GpsL2cx => consts::GPS_L2_HZ,
            Code::GpsL5i | Code::GpsL5q | Code::GpsL5x => consts::GPS_L5_HZ,
            Code::SbasL1ca => consts::SBAS_L1_HZ,
            Code::SbasL5i | Code::SbasL5q | Code::SbasL5x => consts::SBAS_L5_HZ,
            Code::GloL1of | Code::GloL1p => consts::GLO_L1_HZ,
            Code::GloL2of | Code::GloL2p => consts::GLO_L2_HZ,
            Code::Bds2B1 => consts::BDS2_B1I_HZ,
            Code::Bds3B1ci | Code::Bds3B1cq | Code::Bds3B1cx => consts::BDS3_B1C_HZ,
            Code::Bds2B2 => consts::BDS2_B2_HZ,
            Code::Bds3B3i | Code::Bds3B3q | Code::Bds3B3x => consts::BDS3_B3_HZ,
            Code::Bds3B5i | Code::Bds3B5q | Code::Bds3B5x => consts::BDS3_B5_HZ,
            Code::Bds3B7i | Code::Bds3B7q | Code::Bds3B7x => consts::BDS3_B7_HZ,
            Code::GalE1b | Code::GalE1c | Code::GalE1x => consts::GAL_E1_HZ,
            Code::GalE5i | Code::GalE5q | Code::GalE5x => consts::GAL_E5_HZ,
            Code::GalE6b | Code::GalE6c | Code::GalE6x => consts::GAL_E6_HZ,
            Code::GalE7i | Code::GalE7q | Code::GalE7x => consts::GAL_E7_HZ,
            Code::GalE8i | Code::GalE8q | Code::GalE8x => consts::GAL_E8_HZ,
            Code::QzsL1ca | Code::QzsL1ci | Code::QzsL1cq | Code::QzsL1cx => consts::QZS_L1_HZ,
            Code::QzsL2cm | Code::QzsL2cl | Code::QzsL2cx => consts::QZS_L2_HZ,
            Code::QzsL5i | Code::QzsL5q | Code::QzsL5x => consts::QZS_L5_HZ,
        }
    }

    /// Get the channel frequency of a GLONASS FDMA code on a channel
    ///
    /// Returns the center frequency for the encrypted P codes, which are
    /// FDMA as well; `None` for anything that is not a GLONASS code.
    #[must_use]
    pub fn glo_channel_frequency(self, fcn: i8) -> Option<f64> {
        if !(consts::GLO_MIN_FCN..=consts::GLO_MAX_FCN).contains(&fcn) {
            return None;
        }
        match self {
            Code::GloL1of | Code::GloL1p => {
                Some(consts::GLO_L1_HZ + f64::from(fcn) * consts::GLO_L1_DELTA_HZ)
            }
            Code::GloL2of | Code::GloL2p => {
                Some(consts::GLO_L2_HZ + f64::from(fcn) * consts::GLO_L2_DELTA_HZ)
            }
            _ => None,
        }
    }

    /// Get an iterator through all the codes
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// An error encountered when converting an integer into a [`Code`] and no
/// code is associated with the given value
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("Invalid integer for GNSS Code ({0})")]
pub struct InvalidCodeInt(u8);

impl std::convert::TryFrom<u8> for Code {
    type Error = InvalidCodeInt;
    fn try_from(value: u8) -> Result<Code, Self::Error> {
        Code::from_repr(value).ok_or(InvalidCodeInt(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn code_to_constellation() {
        assert_eq!(Code::GpsL1ca.to_constellation(), Constellation::Gps);
        assert_eq!(Code::SbasL1ca.to_constellation(), Constellation::Sbas);
        assert_eq!(Code::GloL2of.to_constellation(), Constellation::Glo);
        assert_eq!(Code::Bds2B1.to_constellation(), Constellation::Bds);
        assert_eq!(Code::GalE1b.to_constellation(), Constellation::Gal);
        assert_eq!(Code::QzsL2cm.to_constellation(), Constellation::Qzs);
    }

    #[test]
    fn sbp_wire_values() {
        /* spot check the discriminants against the libsbp code table */
        assert_eq!(Code::GpsL1ca.to_sbp(), 0);
        assert_eq!(Code::GloL1of.to_sbp(), 3);
        assert_eq!(Code::Bds2B1.to_sbp(), 12);
        assert_eq!(Code::GalE1b.to_sbp(), 14);
        assert_eq!(Code::GloL2p.to_sbp(), 30);
        assert_eq!(Code::QzsL1ca.to_sbp(), 31);

        assert_eq!(Code::try_from(0).unwrap(), Code::GpsL1ca);
        assert_eq!(Code::try_from(14).unwrap(), Code::GalE1b);
        assert!(Code::try_from(200).is_err());
    }

    #[test]
    fn round_trip_all_codes() {
        for code in Code::iter() {
            assert_eq!(Code::try_from(code.to_sbp()).unwrap(), code);
        }
    }

    #[test]
    fn carrier_frequencies() {
        assert_eq!(Code::GpsL1ca.carrier_frequency(), 1.575_42e9);
        assert_eq!(Code::Bds3B1cx.carrier_frequency(), 1.575_42e9);
        assert_eq!(Code::GalE7q.carrier_frequency(), 1.207_14e9);

        assert_eq!(Code::GloL1of.glo_channel_frequency(0), Some(1.602e9));
        assert_eq!(
            Code::GloL1of.glo_channel_frequency(-4),
            Some(1.602e9 - 4.0 * 5.625e5)
        );
        assert_eq!(Code::GloL2of.glo_channel_frequency(2), Some(1.246e9 + 8.75e5));
        assert_eq!(Code::GloL1of.glo_channel_frequency(7), None);
        assert_eq!(Code::GpsL1ca.glo_channel_frequency(0), None);
    }
}
