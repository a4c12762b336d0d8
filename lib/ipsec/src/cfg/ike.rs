// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! IKE Phase 1 configuration.

use crate::api::DiffieHellmanGroup;
use crate::api::EncryptionAlgorithm;
use crate::api::IkeAuthenticationMethod;
use crate::api::IkeHashingAlgorithm;
use crate::api::Ipv4Addr;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// One concrete algorithm combination offered during IKE Phase 1.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IkePhase1Proposal {
    pub name: String,

    /// How the peers authenticate. `None` when the tunnel carries no
    /// key material.
    pub authentication_method: Option<IkeAuthenticationMethod>,

    pub diffie_hellman_group: DiffieHellmanGroup,

    /// Offered encryption algorithms, in preference order.
    pub encryption_algorithms: Vec<EncryptionAlgorithm>,

    /// Offered hashing algorithms, in preference order.
    pub hashing_algorithms: Vec<IkeHashingAlgorithm>,

    pub lifetime_seconds: Option<u32>,
}

impl IkePhase1Proposal {
    /// Can this proposal be agreed upon with `other`?
    ///
    /// This is an exact match: the authentication method and DH group
    /// must be equal, and the encryption and hashing lists must be
    /// equal element for element, in the same order. Real IKE
    /// implementations select any common algorithm from the offered
    /// lists; two proposals which share one algorithm but list it in a
    /// different position are reported incompatible here. Lifetimes and
    /// names are not compared.
    pub fn is_compatible_with(&self, other: &IkePhase1Proposal) -> bool {
        self.authentication_method == other.authentication_method
            && self.diffie_hellman_group == other.diffie_hellman_group
            && self.encryption_algorithms == other.encryption_algorithms
            && self.hashing_algorithms == other.hashing_algorithms
    }
}

/// The kind of key material held by an [`IkePhase1Key`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum IkeKeyType {
    PreSharedKeyUnencrypted,
}

impl Display for IkeKeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::PreSharedKeyUnencrypted => {
                write!(f, "PRE_SHARED_KEY_UNENCRYPTED")
            }
        }
    }
}

/// Key material for one remote peer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IkePhase1Key {
    pub key_type: IkeKeyType,

    /// Salted digest of the pre-shared key. The key itself is never
    /// stored.
    pub key_hash: Option<String>,

    /// The peer this key is used with.
    pub remote_identity: Ipv4Addr,

    /// The interface negotiation is sourced from.
    pub local_interface: String,
}

/// A named IKE Phase 1 policy.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IkePhase1Policy {
    pub name: String,
    pub key: IkePhase1Key,

    /// Names of [`IkePhase1Proposal`]s, in preference order.
    pub proposals: Vec<String>,

    pub remote_identity: Ipv4Addr,
    pub local_interface: String,
}

#[cfg(test)]
mod test {
    use super::*;

    fn proposal() -> IkePhase1Proposal {
        IkePhase1Proposal {
            name: "vpn-1-14-AES256-SHA2-256".to_string(),
            authentication_method: Some(IkeAuthenticationMethod::PreSharedKeys),
            diffie_hellman_group: DiffieHellmanGroup::Group14,
            encryption_algorithms: vec![EncryptionAlgorithm::Aes256Cbc],
            hashing_algorithms: vec![IkeHashingAlgorithm::Sha256],
            lifetime_seconds: Some(28800),
        }
    }

    #[test]
    fn compatible_is_reflexive() {
        let p = proposal();
        assert!(p.is_compatible_with(&p));
    }

    #[test]
    fn compatible_ignores_name_and_lifetime() {
        let a = proposal();
        let b = IkePhase1Proposal {
            name: "other".to_string(),
            lifetime_seconds: None,
            ..proposal()
        };
        assert!(a.is_compatible_with(&b));
        assert!(b.is_compatible_with(&a));
    }

    #[test]
    fn each_compared_field_matters() {
        let a = proposal();
        let flipped = [
            IkePhase1Proposal { authentication_method: None, ..proposal() },
            IkePhase1Proposal {
                diffie_hellman_group: DiffieHellmanGroup::Group2,
                ..proposal()
            },
            IkePhase1Proposal {
                encryption_algorithms: vec![EncryptionAlgorithm::Aes128Gcm],
                ..proposal()
            },
            IkePhase1Proposal {
                hashing_algorithms: vec![IkeHashingAlgorithm::Sha1],
                ..proposal()
            },
        ];

        for b in &flipped {
            assert!(!a.is_compatible_with(b), "{b:?}");
            assert!(!b.is_compatible_with(&a), "{b:?}");
        }
    }

    #[test]
    fn list_order_matters() {
        let a = IkePhase1Proposal {
            encryption_algorithms: vec![
                EncryptionAlgorithm::Aes128Cbc,
                EncryptionAlgorithm::Aes256Cbc,
            ],
            ..proposal()
        };
        let b = IkePhase1Proposal {
            encryption_algorithms: vec![
                EncryptionAlgorithm::Aes256Cbc,
                EncryptionAlgorithm::Aes128Cbc,
            ],
            ..proposal()
        };
        assert!(!a.is_compatible_with(&b));
    }
}
