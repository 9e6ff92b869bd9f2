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

use super::consts;

/// GNSS satellite constellations
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
#[strum(serialize_all = "UPPERCASE")]
pub enum Constellation {
    /// GPS
    Gps,
    /// SBAS - Space based augmentation systems
    Sbas,
    /// GLONASS
    Glo,
    /// Beidou
    Bds,
    /// QZSS
    Qzs,
    /// Galileo
    Gal,
}

impl Constellation {
    /// Gets the specified maximum number of active satellites for the constellation
    #[must_use]
    pub fn sat_count(self) -> u16 {
        match self {
            Constellation::Gps => consts::NUM_SATS_GPS,
            Constellation::Sbas => consts::NUM_SATS_SBAS,
            Constellation::Glo => consts::NUM_SATS_GLO,
            Constellation::Bds => consts::NUM_SATS_BDS,
            Constellation::Gal => consts::NUM_SATS_GAL,
            Constellation::Qzs => consts::NUM_SATS_QZS,
        }
    }

    /// Get the first PRN value used by the constellation
    #[must_use]
    pub fn first_prn(self) -> u16 {
        match self {
            Constellation::Gps => consts::GPS_FIRST_PRN,
            Constellation::Sbas => consts::SBAS_FIRST_PRN,
            Constellation::Glo => consts::GLO_FIRST_PRN,
            Constellation::Bds => consts::BDS_FIRST_PRN,
            Constellation::Gal => consts::GAL_FIRST_PRN,
            Constellation::Qzs => consts::QZS_FIRST_PRN,
        }
    }

    /// Message number of the constellation's MSM1, the base of its MSM block
    ///
    /// The RTCM MSM message numbers are laid out in blocks of ten per
    /// constellation, 1071-1077 for GPS through 1121-1127 for BeiDou.
    #[must_use]
    pub fn msm_base_msg_num(self) -> u16 {
        match self {
            Constellation::Gps => 1070,
            Constellation::Glo => 1080,
            Constellation::Gal => 1090,
            Constellation::Sbas => 1100,
            Constellation::Qzs => 1110,
            Constellation::Bds => 1120,
        }
    }

    /// Recovers the constellation from an MSM message number
    #[must_use]
    pub fn from_msm_msg_num(msg_num: u16) -> Option<Constellation> {
        match msg_num {
            1071..=1077 => Some(Constellation::Gps),
            1081..=1087 => Some(Constellation::Glo),
            1091..=1097 => Some(Constellation::Gal),
            1101..=1107 => Some(Constellation::Sbas),
            1111..=1117 => Some(Constellation::Qzs),
            1121..=1127 => Some(Constellation::Bds),
            _ => None,
        }
    }

    /// Get an iterator through the constellations
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// An error encountered when converting an integer into a [`Constellation`]
/// and no constellation is associated with the given value
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("Invalid integer for GNSS Constellation ({0})")]
pub struct InvalidConstellationInt(u8);

impl std::convert::TryFrom<u8> for Constellation {
    type Error = InvalidConstellationInt;
    fn try_from(value: u8) -> Result<Constellation, Self::Error> {
        Constellation::from_repr(value).ok_or(InvalidConstellationInt(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sat_count() {
        assert_eq!(Constellation::Gps.sat_count(), 32);
        assert_eq!(Constellation::Sbas.sat_count(), 19);
        assert_eq!(Constellation::Glo.sat_count(), 28);
        assert_eq!(Constellation::Bds.sat_count(), 64);
        assert_eq!(Constellation::Gal.sat_count(), 36);
        assert_eq!(Constellation::Qzs.sat_count(), 10);
    }

    #[test]
    fn msm_msg_num_blocks() {
        for cons in Constellation::iter() {
            for msm in 1..=7u16 {
                let msg_num = cons.msm_base_msg_num() + msm;
                assert_eq!(Constellation::from_msm_msg_num(msg_num), Some(cons));
            }
            /* reserved tail slots of each block are not MSM messages */
            assert_eq!(
                Constellation::from_msm_msg_num(cons.msm_base_msg_num() + 8),
                None
            );
        }
        assert_eq!(Constellation::from_msm_msg_num(1004), None);
        assert_eq!(Constellation::from_msm_msg_num(1070), None);
    }

    #[test]
    fn constellation_strings() {
        use std::str::FromStr;

        assert_eq!(Constellation::Gps.to_string(), "GPS");
        assert_eq!(Constellation::Sbas.to_string(), "SBAS");
        assert_eq!(Constellation::Glo.to_string(), "GLO");
        assert_eq!(Constellation::Bds.to_string(), "BDS");
        assert_eq!(Constellation::Qzs.to_string(), "QZS");
        assert_eq!(Constellation::Gal.to_string(), "GAL");

        assert_eq!(Constellation::from_str("GPS").unwrap(), Constellation::Gps);
        assert_eq!(Constellation::from_str("GLO").unwrap(), Constellation::Glo);
        assert!(Constellation::from_str("Bad String").is_err());
    }
}
