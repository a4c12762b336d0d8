// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! IPsec Phase 2 configuration.

use crate::api::DiffieHellmanGroup;
use crate::api::EncryptionAlgorithm;
use crate::api::IpsecAuthenticationAlgorithm;
use crate::api::IpsecEncapsulationMode;
use crate::api::IpsecProtocol;
use crate::api::Ipv4Addr;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;

/// One concrete data-protection combination offered during Phase 2.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IpsecPhase2Proposal {
    pub authentication_algorithm: IpsecAuthenticationAlgorithm,
    pub encryption_algorithm: EncryptionAlgorithm,
    pub protocols: BTreeSet<IpsecProtocol>,

    /// `None` when the provider named a mode we do not recognize.
    pub encapsulation_mode: Option<IpsecEncapsulationMode>,
}

/// A Phase 2 policy: the proposals on offer plus the PFS group.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IpsecPhase2Policy {
    pub pfs_key_group: Option<DiffieHellmanGroup>,

    /// Names of [`IpsecPhase2Proposal`]s, in preference order.
    pub proposals: Vec<String>,
}

/// A statically addressed IPsec peer.
///
/// Binds one IKE Phase 1 policy and one Phase 2 policy to the
/// interfaces and addresses a tunnel runs between.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IpsecPeerConfig {
    /// The overlay interface carrying inside traffic.
    pub tunnel_interface: String,
    pub ike_phase1_policy: String,
    pub ipsec_policy: String,

    /// The underlay interface the tunnel is sourced from.
    pub source_interface: String,
    pub local_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
}
