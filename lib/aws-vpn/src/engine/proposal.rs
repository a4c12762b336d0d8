// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Expand a tunnel's option lists into concrete proposals.
//!
//! Every combination the options allow becomes its own proposal, in the
//! order the provider listed the tokens. Duplicate tokens are not
//! collapsed.

use super::IpsecTunnel;
use super::vocab;
use crate::Result;
use ipsec::api::DiffieHellmanGroup;
use ipsec::api::EncryptionAlgorithm;
use ipsec::api::IkeAuthenticationMethod;
use ipsec::api::IkeHashingAlgorithm;
use ipsec::api::IpsecAuthenticationAlgorithm;
use ipsec::api::IpsecProtocol;
use ipsec::api::Vocabulary;
use ipsec::cfg::IkePhase1Proposal;
use ipsec::cfg::IpsecPhase2Policy;
use ipsec::cfg::IpsecPhase2Proposal;
use ipsec::warn::Warnings;
use itertools::iproduct;
use std::collections::BTreeSet;

/// The name of the Phase 1 proposal for one `(dh, encryption, hash)`
/// combination, built from the raw provider tokens.
pub fn ike_phase1_proposal_name(
    tunnel_id: &str,
    dh: &str,
    enc: &str,
    hash: &str,
) -> String {
    format!("{tunnel_id}-{dh}-{enc}-{hash}")
}

/// IKE Phase 1 proposals: DH group, then hash, then encryption.
///
/// The hash comes from the tunnel's IPsec integrity list and the
/// encryption from its IKE encryption list, itself the provider's
/// phase 2 list.
pub fn ike_phase1_proposals(
    tunnel_id: &str,
    tunnel: &IpsecTunnel,
) -> Result<Vec<IkePhase1Proposal>> {
    let auth = tunnel
        .ike_pre_shared_key_hash()
        .map(|_| IkeAuthenticationMethod::PreSharedKeys);

    iproduct!(
        tunnel.ike_perfect_forward_secrecy(),
        tunnel.ipsec_auth_protocol(),
        tunnel.ike_encryption_protocol()
    )
    .map(|(dh, hash, enc)| -> Result<IkePhase1Proposal> {
        Ok(IkePhase1Proposal {
            name: ike_phase1_proposal_name(tunnel_id, dh, enc, hash),
            authentication_method: auth,
            diffie_hellman_group: DiffieHellmanGroup::from_token(dh)?,
            encryption_algorithms: vec![EncryptionAlgorithm::from_token(enc)?],
            hashing_algorithms: vec![IkeHashingAlgorithm::from_token(hash)?],
            lifetime_seconds: Some(tunnel.ike_lifetime()),
        })
    })
    .collect()
}

/// IPsec Phase 2 proposals: integrity outermost, then encryption.
pub fn ipsec_phase2_proposals(
    tunnel: &IpsecTunnel,
    warnings: &mut Warnings,
) -> Result<Vec<IpsecPhase2Proposal>> {
    let protocol = IpsecProtocol::from_token(tunnel.ipsec_protocol())?;
    let mode = vocab::encapsulation_mode(tunnel.ipsec_mode(), warnings);

    iproduct!(tunnel.ipsec_auth_protocol(), tunnel.ipsec_encryption_protocol())
        .map(|(auth, enc)| -> Result<IpsecPhase2Proposal> {
            Ok(IpsecPhase2Proposal {
                authentication_algorithm:
                    IpsecAuthenticationAlgorithm::from_token(auth)?,
                encryption_algorithm: EncryptionAlgorithm::from_token(enc)?,
                protocols: BTreeSet::from([protocol]),
                encapsulation_mode: mode,
            })
        })
        .collect()
}

/// One Phase 2 policy per PFS group, each offering every proposal in
/// `proposals`.
pub fn ipsec_phase2_policies(
    tunnel: &IpsecTunnel,
    proposals: &[String],
) -> Result<Vec<IpsecPhase2Policy>> {
    let groups: Vec<DiffieHellmanGroup> =
        vocab::convert_all(tunnel.ipsec_perfect_forward_secrecy())?;

    Ok(groups
        .into_iter()
        .map(|dh| IpsecPhase2Policy {
            pfs_key_group: Some(dh),
            proposals: proposals.to_vec(),
        })
        .collect())
}
