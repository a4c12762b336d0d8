// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The closed vocabulary of IKE and IPsec algorithms.
//!
//! Cloud providers describe tunnel options with free-form tokens such
//! as `"AES128-GCM-16"` or `"SHA2-256"`. Each enum in this module has a
//! table mapping every accepted token (including synonyms) to exactly
//! one variant. Conversion is a table lookup, so every enum shares the
//! same failure path: [`UnknownToken`].

use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// The kind of algorithm a token was expected to name.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TokenKind {
    Encryption,
    IkeHashing,
    IpsecAuthentication,
    DiffieHellmanGroup,
    IpsecProtocol,
    EncapsulationMode,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Encryption => "encryption algorithm",
            Self::IkeHashing => "IKE hashing algorithm",
            Self::IpsecAuthentication => "IPsec authentication algorithm",
            Self::DiffieHellmanGroup => "Diffie-Hellman group",
            Self::IpsecProtocol => "IPsec protocol",
            Self::EncapsulationMode => "IPsec encapsulation mode",
        };
        write!(f, "{s}")
    }
}

/// A provider token which has no entry in the vocabulary table.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("no conversion to {kind} for string: \"{token}\"")]
pub struct UnknownToken {
    pub kind: TokenKind,
    pub token: String,
}

/// An algorithm enum backed by a token table.
pub trait Vocabulary: Copy + Sized + 'static {
    const KIND: TokenKind;

    /// Every accepted token and the variant it names.
    const TOKENS: &'static [(&'static str, Self)];

    /// Look up `token` in [`Self::TOKENS`]. Matching is exact and
    /// case-sensitive.
    fn from_token(token: &str) -> Result<Self, UnknownToken> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, v)| *v)
            .ok_or_else(|| UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
            })
    }
}

// Hang `FromStr` off the table so that `"AES256".parse()` and
// `from_token()` can never disagree.
macro_rules! vocabulary_from_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = UnknownToken;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as Vocabulary>::from_token(s)
                }
            }
        )+
    };
}

/// A bulk encryption algorithm, usable in either negotiation phase.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum EncryptionAlgorithm {
    Aes128Cbc,
    Aes256Cbc,
    Aes128Gcm,
    Aes256Gcm,
}

impl Vocabulary for EncryptionAlgorithm {
    const KIND: TokenKind = TokenKind::Encryption;
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("aes-128-cbc", Self::Aes128Cbc),
        ("AES128", Self::Aes128Cbc),
        ("AES256", Self::Aes256Cbc),
        ("AES128-GCM-16", Self::Aes128Gcm),
        ("AES256-GCM-16", Self::Aes256Gcm),
    ];
}

impl Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Aes128Cbc => "AES_128_CBC",
            Self::Aes256Cbc => "AES_256_CBC",
            Self::Aes128Gcm => "AES_128_GCM",
            Self::Aes256Gcm => "AES_256_GCM",
        };
        write!(f, "{s}")
    }
}

/// A hash used by IKE Phase 1 for integrity and the PRF.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum IkeHashingAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl Vocabulary for IkeHashingAlgorithm {
    const KIND: TokenKind = TokenKind::IkeHashing;
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("sha1", Self::Sha1),
        ("SHA1", Self::Sha1),
        ("SHA2-256", Self::Sha256),
        ("SHA2-384", Self::Sha384),
        ("SHA2-512", Self::Sha512),
    ];
}

impl Display for IkeHashingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA_256",
            Self::Sha384 => "SHA_384",
            Self::Sha512 => "SHA_512",
        };
        write!(f, "{s}")
    }
}

/// An ESP/AH integrity algorithm used by IPsec Phase 2.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum IpsecAuthenticationAlgorithm {
    HmacSha1_96,
    HmacSha256_128,
    HmacSha384,
    HmacSha512,
}

impl Vocabulary for IpsecAuthenticationAlgorithm {
    const KIND: TokenKind = TokenKind::IpsecAuthentication;
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("hmac-sha1-96", Self::HmacSha1_96),
        ("SHA1", Self::HmacSha1_96),
        ("SHA2-256", Self::HmacSha256_128),
        ("SHA2-384", Self::HmacSha384),
        ("SHA2-512", Self::HmacSha512),
    ];
}

impl Display for IpsecAuthenticationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::HmacSha1_96 => "HMAC_SHA1_96",
            Self::HmacSha256_128 => "HMAC_SHA_256_128",
            Self::HmacSha384 => "HMAC_SHA_384",
            Self::HmacSha512 => "HMAC_SHA_512",
        };
        write!(f, "{s}")
    }
}

/// A Diffie-Hellman group, named by its IANA group number.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[repr(u8)]
pub enum DiffieHellmanGroup {
    Group2 = 2,
    Group5 = 5,
    Group14 = 14,
    Group15 = 15,
    Group16 = 16,
    Group17 = 17,
    Group18 = 18,
    Group19 = 19,
    Group20 = 20,
    Group21 = 21,
    Group22 = 22,
    Group23 = 23,
    Group24 = 24,
}

impl DiffieHellmanGroup {
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl Vocabulary for DiffieHellmanGroup {
    const KIND: TokenKind = TokenKind::DiffieHellmanGroup;
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("2", Self::Group2),
        ("5", Self::Group5),
        ("14", Self::Group14),
        ("15", Self::Group15),
        ("16", Self::Group16),
        ("17", Self::Group17),
        ("18", Self::Group18),
        ("19", Self::Group19),
        ("20", Self::Group20),
        ("21", Self::Group21),
        ("22", Self::Group22),
        ("23", Self::Group23),
        ("24", Self::Group24),
    ];
}

impl Display for DiffieHellmanGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GROUP{}", self.number())
    }
}

/// The IPsec security protocol carried by a Phase 2 proposal.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum IpsecProtocol {
    Esp,
}

impl Vocabulary for IpsecProtocol {
    const KIND: TokenKind = TokenKind::IpsecProtocol;
    const TOKENS: &'static [(&'static str, Self)] = &[("esp", Self::Esp)];
}

impl Display for IpsecProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Esp => write!(f, "ESP"),
        }
    }
}

/// How IPsec wraps the protected packet.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum IpsecEncapsulationMode {
    Tunnel,
    Transport,
}

impl Vocabulary for IpsecEncapsulationMode {
    const KIND: TokenKind = TokenKind::EncapsulationMode;
    const TOKENS: &'static [(&'static str, Self)] =
        &[("tunnel", Self::Tunnel), ("transport", Self::Transport)];
}

impl Display for IpsecEncapsulationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tunnel => write!(f, "TUNNEL"),
            Self::Transport => write!(f, "TRANSPORT"),
        }
    }
}

/// How IKE Phase 1 peers prove their identity.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum IkeAuthenticationMethod {
    PreSharedKeys,
}

impl Display for IkeAuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::PreSharedKeys => write!(f, "PRE_SHARED_KEYS"),
        }
    }
}

vocabulary_from_str!(
    EncryptionAlgorithm,
    IkeHashingAlgorithm,
    IpsecAuthenticationAlgorithm,
    DiffieHellmanGroup,
    IpsecProtocol,
    IpsecEncapsulationMode,
);
