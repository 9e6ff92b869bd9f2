// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GLONASS code-phase bias mapping
//!
//! GLONASS pseudorange and phase observations are not aligned on most
//! receivers, and the correction differs by vendor. When a stream carries
//! message 1230 the biases come straight from the base station; otherwise
//! the receiver descriptor of message 1033 selects a known per-vendor
//! default. The Geo++ GNSMART descriptors name the OEM of the original
//! measurement and must be matched before the plain vendor strings, a
//! GNSMART descriptor also contains the OEM's own substring.

use crate::rtcm::station::{Msg1033, Msg1230};
use crate::sbp::messages::MsgGloBiases;

/// Bias resolution of the SBP message, steps per meter
pub const GLO_BIAS_RESOLUTION: f64 = 50.0;

/// Mask selecting the L1 C/A and L2 P biases
const MASK_L1CA_L2P: u8 = 0x9;
/// Mask selecting all four biases
const MASK_ALL: u8 = 0xF;

const TRIMBLE_BIAS_M: f64 = 19.06;
const NOVATEL_BIAS_M: f64 = -71.94;
const SEPTENTRIO_BIAS_M: f64 = 0.0;
const TOPCON_BIAS_M: f64 = 0.0;
const JAVAD_BIAS_L1CA_M: f64 = -1.5;
const JAVAD_BIAS_L2P_M: f64 = -8.1;
const NAVCOM_BIAS_L1CA_M: f64 = 0.4;
const NAVCOM_BIAS_L2P_M: f64 = 2.1;
const HEMISPHERE_BIAS_L1CA_M: f64 = -0.2;
const HEMISPHERE_BIAS_L2P_M: f64 = 3.4;

const GPP_ASH1_BIAS_L1CA_M: f64 = -14.7;
const GPP_ASH1_BIAS_L2P_M: f64 = -16.2;
const GPP_HEM_BIAS_L1CA_M: f64 = -0.3;
const GPP_HEM_BIAS_L2P_M: f64 = 3.5;
const GPP_JAV_BIAS_L1CA_M: f64 = -1.5;
const GPP_JAV_BIAS_L2P_M: f64 = -8.1;
const GPP_JPS_BIAS_L1CA_M: f64 = -3.7;
const GPP_JPS_BIAS_L2P_M: f64 = -6.2;
const GPP_NOV_BIAS_L1CA_M: f64 = -71.7;
const GPP_NOV_BIAS_L2P_M: f64 = -75.4;
const GPP_NAV_BIAS_L1CA_M: f64 = 0.4;
const GPP_NAV_BIAS_L2P_M: f64 = 2.1;
const GPP_NVR_BIAS_L1CA_M: f64 = 0.0;
const GPP_NVR_BIAS_L2P_M: f64 = 0.0;
const GPP_SEP_BIAS_L1CA_M: f64 = 0.0;
const GPP_SEP_BIAS_L2P_M: f64 = 0.0;
const GPP_SOK_BIAS_L1CA_M: f64 = 0.0;
const GPP_SOK_BIAS_L2P_M: f64 = 0.0;
const GPP_TPS_BIAS_L1CA_M: f64 = 0.0;
const GPP_TPS_BIAS_L2P_M: f64 = 0.0;
const GPP_TRM_BIAS_L1CA_M: f64 = 19.1;
const GPP_TRM_BIAS_L2P_M: f64 = 24.2;

fn scaled(bias_m: f64) -> i16 {
    (bias_m * GLO_BIAS_RESOLUTION).round() as i16
}

fn l1ca_l2p(l1ca_m: f64, l2p_m: f64) -> MsgGloBiases {
    MsgGloBiases {
        mask: MASK_L1CA_L2P,
        l1ca_bias: scaled(l1ca_m),
        l1p_bias: 0,
        l2ca_bias: 0,
        l2p_bias: scaled(l2p_m),
    }
}

fn uniform(bias_m: f64) -> MsgGloBiases {
    MsgGloBiases {
        mask: MASK_ALL,
        l1ca_bias: scaled(bias_m),
        l1p_bias: scaled(bias_m),
        l2ca_bias: scaled(bias_m),
        l2p_bias: scaled(bias_m),
    }
}

/// Geo++ GNSMART per-OEM defaults, matched on the `GLO=XXX` tag
const GNSMART_TABLE: &[(&str, f64, f64)] = &[
    ("Geo++ GNSMART (GLO=ASH)", GPP_ASH1_BIAS_L1CA_M, GPP_ASH1_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=HEM)", GPP_HEM_BIAS_L1CA_M, GPP_HEM_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=JAV)", GPP_JAV_BIAS_L1CA_M, GPP_JAV_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=JPS)", GPP_JPS_BIAS_L1CA_M, GPP_JPS_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=LEI)", GPP_NOV_BIAS_L1CA_M, GPP_NOV_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=NOV)", GPP_NOV_BIAS_L1CA_M, GPP_NOV_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=NAV)", GPP_NAV_BIAS_L1CA_M, GPP_NAV_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=NVR)", GPP_NVR_BIAS_L1CA_M, GPP_NVR_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=SEP)", GPP_SEP_BIAS_L1CA_M, GPP_SEP_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=SOK)", GPP_SOK_BIAS_L1CA_M, GPP_SOK_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=TPS)", GPP_TPS_BIAS_L1CA_M, GPP_TPS_BIAS_L2P_M),
    ("Geo++ GNSMART (GLO=TRM)", GPP_TRM_BIAS_L1CA_M, GPP_TRM_BIAS_L2P_M),
];

/// Derives default GLONASS biases from the receiver descriptor of a 1033
///
/// Returns `None` when the receiver is unknown; downstream then has to wait
/// for a 1230 or live without corrections.
#[must_use]
pub fn glo_biases_from_1033(msg: &Msg1033) -> Option<MsgGloBiases> {
    let descriptor = msg.rcv_descriptor.as_str();

    /* GNSMART names must come first to avoid matching the OEM substring */
    for (tag, l1ca_m, l2p_m) in GNSMART_TABLE {
        if descriptor.contains(tag) {
            return Some(l1ca_l2p(*l1ca_m, *l2p_m));
        }
    }

    if descriptor.contains("TRIMBLE") || descriptor.contains("ASHTECH") {
        return Some(uniform(TRIMBLE_BIAS_M));
    }
    if descriptor.contains("LEICA") || descriptor.contains("NOV") || descriptor.contains("GEOMAX")
    {
        return Some(uniform(NOVATEL_BIAS_M));
    }
    if descriptor.contains("SEPT") {
        return Some(uniform(SEPTENTRIO_BIAS_M));
    }
    if descriptor.contains("TPS") {
        let mut biases = uniform(TOPCON_BIAS_M);
        biases.mask = MASK_L1CA_L2P;
        return Some(biases);
    }
    if descriptor.contains("JAVAD") {
        return Some(l1ca_l2p(JAVAD_BIAS_L1CA_M, JAVAD_BIAS_L2P_M));
    }
    if descriptor.contains("NAVCOM") {
        return Some(l1ca_l2p(NAVCOM_BIAS_L1CA_M, NAVCOM_BIAS_L2P_M));
    }
    if descriptor.contains("HEMI") {
        return Some(l1ca_l2p(HEMISPHERE_BIAS_L1CA_M, HEMISPHERE_BIAS_L2P_M));
    }
    None
}

/// Converts a decoded 1230 into the SBP bias message
///
/// A set bias indicator means the base already aligned pseudorange and
/// phase range, so zero corrections go out.
#[must_use]
pub fn glo_biases_from_1230(msg: &Msg1230) -> MsgGloBiases {
    if msg.bias_indicator {
        return MsgGloBiases {
            mask: msg.fdma_signal_mask,
            l1ca_bias: 0,
            l1p_bias: 0,
            l2ca_bias: 0,
            l2p_bias: 0,
        };
    }
    MsgGloBiases {
        mask: msg.fdma_signal_mask,
        l1ca_bias: scaled(msg.l1_ca_bias_m),
        l1p_bias: scaled(msg.l1_p_bias_m),
        l2ca_bias: scaled(msg.l2_ca_bias_m),
        l2p_bias: scaled(msg.l2_p_bias_m),
    }
}
