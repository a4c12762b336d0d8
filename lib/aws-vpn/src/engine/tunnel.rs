// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! One IPsec tunnel of a VPN connection.

use super::descriptor;
use super::descriptor::TunnelSpec;
use crate::Error;
use crate::Result;
use crate::api::DEFAULT_IKE_LIFETIME_SECS;
use crate::api::DEFAULT_IPSEC_LIFETIME_SECS;
use crate::api::Value;
use ipsec::api::Ipv4Addr;
use ipsec::api::Ipv4Cidr;
use ipsec::api::Ipv4PrefixLen;
use rand::Rng;
use sha2::Digest;
use sha2::Sha256;
use std::sync::OnceLock;

pub const IKE_MODE_MAIN: &str = "main";
pub const IPSEC_PROTOCOL_ESP: &str = "esp";
pub const IPSEC_MODE_TUNNEL: &str = "tunnel";

/// The salt mixed into pre-shared key digests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Salt(String);

impl Salt {
    /// A fixed salt, for reproducible output.
    pub fn fixed<S: Into<String>>(salt: S) -> Self {
        Self(salt.into())
    }

    /// The salt shared by every parse in this process, chosen at random
    /// the first time it is asked for.
    pub fn process() -> Self {
        static SALT: OnceLock<String> = OnceLock::new();
        let salt = SALT.get_or_init(|| {
            hex::encode(rand::rng().random::<[u8; 16]>())
        });
        Self(salt.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex encoded SHA-256 digest of `key` followed by this salt.
    pub fn digest(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Default for Salt {
    fn default() -> Self {
        Self::process()
    }
}

/// Everything needed to build an [`IpsecTunnel`].
///
/// "cgw" is the customer gateway, "vgw" the provider side gateway the
/// tunnel terminates on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IpsecTunnelCfg {
    pub cgw_outside_address: Ipv4Addr,
    pub cgw_inside_address: Ipv4Addr,
    pub cgw_bgp_asn: Option<u32>,

    pub vgw_outside_address: Ipv4Addr,
    pub vgw_inside_address: Ipv4Addr,
    pub vgw_inside_prefix_len: Ipv4PrefixLen,
    pub vgw_bgp_asn: Option<u32>,

    pub ike_versions: Vec<String>,
    pub ike_auth_protocol: Vec<String>,
    pub ike_encryption_protocol: Vec<String>,
    pub ike_perfect_forward_secrecy: Vec<String>,
    pub ike_pre_shared_key_hash: Option<String>,
    pub ike_lifetime: u32,

    pub ipsec_auth_protocol: Vec<String>,
    pub ipsec_encryption_protocol: Vec<String>,
    pub ipsec_perfect_forward_secrecy: Vec<String>,
    pub ipsec_lifetime: u32,
}

/// A single tunnel, as parsed. Never modified once built.
///
/// Algorithm lists hold the provider's raw tokens; they are converted
/// when proposals are generated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IpsecTunnel {
    cfg: IpsecTunnelCfg,
}

impl IpsecTunnel {
    pub fn new(cfg: IpsecTunnelCfg) -> Self {
        Self { cfg }
    }

    /// Build a tunnel from its customer gateway configuration element
    /// and options entry.
    ///
    /// Where both sources can supply a value the options entry wins,
    /// except for the provider outside address, which the element
    /// supplies when it has one. The pre-shared key is digested with
    /// `salt` and dropped.
    pub fn from_spec(conn: &str, spec: TunnelSpec, salt: &Salt) -> Result<Self> {
        let TunnelSpec { element: el, options: opts, .. } = spec;

        let inside = match &opts.tunnel_inside_cidr {
            Some(cidr) => cidr.parse::<Ipv4Cidr>().map_err(|e| {
                Error::bad_value(conn, "TunnelInsideCidr", cidr, e)
            })?,

            None => {
                let ip = required(
                    conn,
                    &el.vgw_inside_address,
                    descriptor::VGW_INSIDE_ADDRESS,
                )?;
                let len = required(
                    conn,
                    &el.vgw_inside_network_cidr,
                    descriptor::VGW_INSIDE_NETWORK_CIDR,
                )?;
                let ip = parse_ip(conn, "tunnel inside address", ip)?;
                let len = len.parse::<u8>().map_err(|e| {
                    Error::bad_value(conn, "tunnel inside prefix length", len, e)
                })?;
                Ipv4Cidr::new_checked(ip, len).map_err(|e| {
                    Error::bad_value(conn, "tunnel inside prefix length", len, e)
                })?
            }
        };
        let (vgw_inside_address, cgw_inside_address) = inside.bisect();
        let (_, vgw_inside_prefix_len) = inside.parts();

        let vgw_outside = el
            .vgw_outside_address
            .as_ref()
            .or(opts.outside_ip_address.as_ref())
            .ok_or_else(|| missing(conn, descriptor::VGW_OUTSIDE_ADDRESS))?;
        let cgw_outside = required(
            conn,
            &el.cgw_outside_address,
            descriptor::CGW_OUTSIDE_ADDRESS,
        )?;

        let ike_pre_shared_key_hash = opts
            .pre_shared_key
            .as_deref()
            .or(el.pre_shared_key.as_deref())
            .map(|psk| salt.digest(psk));

        let ike_lifetime = match opts.phase1_lifetime_seconds {
            Some(secs) => secs,
            None => parse_opt(conn, "IKE lifetime", &el.ike_lifetime)?
                .unwrap_or(DEFAULT_IKE_LIFETIME_SECS),
        };
        let ipsec_lifetime = match opts.phase2_lifetime_seconds {
            Some(secs) => secs,
            None => parse_opt(conn, "IPsec lifetime", &el.ipsec_lifetime)?
                .unwrap_or(DEFAULT_IPSEC_LIFETIME_SECS),
        };

        let cgw_outside_address =
            parse_ip(conn, "customer outside address", cgw_outside)?;
        let vgw_outside_address =
            parse_ip(conn, "gateway outside address", vgw_outside)?;
        let cgw_bgp_asn =
            parse_opt(conn, "customer gateway ASN", &el.cgw_bgp_asn)?;
        let vgw_bgp_asn = parse_opt(conn, "gateway ASN", &el.vgw_bgp_asn)?;

        Ok(Self::new(IpsecTunnelCfg {
            cgw_outside_address,
            cgw_inside_address,
            cgw_bgp_asn,
            vgw_outside_address,
            vgw_inside_address,
            vgw_inside_prefix_len,
            vgw_bgp_asn,

            // Preserved as the provider wires them: IKE encryption comes
            // from the phase 2 list, and proposal expansion takes the
            // phase 1 hash from the IPsec integrity list.
            ike_versions: tokens(&opts.ike_versions),
            ike_auth_protocol: tokens(&opts.phase1_integrity_algorithms),
            ike_encryption_protocol: tokens(&opts.phase2_encryption_algorithms),
            ike_perfect_forward_secrecy: tokens(&opts.phase1_dh_group_numbers),
            ike_pre_shared_key_hash,
            ike_lifetime,

            ipsec_auth_protocol: tokens(&opts.phase2_integrity_algorithms),
            ipsec_encryption_protocol: tokens(
                &opts.phase2_encryption_algorithms,
            ),
            ipsec_perfect_forward_secrecy: tokens(
                &opts.phase2_dh_group_numbers,
            ),
            ipsec_lifetime,
        }))
    }

    pub fn cgw_outside_address(&self) -> Ipv4Addr {
        self.cfg.cgw_outside_address
    }

    pub fn cgw_inside_address(&self) -> Ipv4Addr {
        self.cfg.cgw_inside_address
    }

    pub fn cgw_bgp_asn(&self) -> Option<u32> {
        self.cfg.cgw_bgp_asn
    }

    pub fn vgw_outside_address(&self) -> Ipv4Addr {
        self.cfg.vgw_outside_address
    }

    pub fn vgw_inside_address(&self) -> Ipv4Addr {
        self.cfg.vgw_inside_address
    }

    pub fn vgw_inside_prefix_len(&self) -> Ipv4PrefixLen {
        self.cfg.vgw_inside_prefix_len
    }

    pub fn vgw_bgp_asn(&self) -> Option<u32> {
        self.cfg.vgw_bgp_asn
    }

    pub fn ike_mode(&self) -> &'static str {
        IKE_MODE_MAIN
    }

    pub fn ike_versions(&self) -> &[String] {
        &self.cfg.ike_versions
    }

    pub fn ike_auth_protocol(&self) -> &[String] {
        &self.cfg.ike_auth_protocol
    }

    pub fn ike_encryption_protocol(&self) -> &[String] {
        &self.cfg.ike_encryption_protocol
    }

    pub fn ike_perfect_forward_secrecy(&self) -> &[String] {
        &self.cfg.ike_perfect_forward_secrecy
    }

    pub fn ike_pre_shared_key_hash(&self) -> Option<&str> {
        self.cfg.ike_pre_shared_key_hash.as_deref()
    }

    pub fn ike_lifetime(&self) -> u32 {
        self.cfg.ike_lifetime
    }

    pub fn ipsec_protocol(&self) -> &'static str {
        IPSEC_PROTOCOL_ESP
    }

    pub fn ipsec_mode(&self) -> &'static str {
        IPSEC_MODE_TUNNEL
    }

    pub fn ipsec_auth_protocol(&self) -> &[String] {
        &self.cfg.ipsec_auth_protocol
    }

    pub fn ipsec_encryption_protocol(&self) -> &[String] {
        &self.cfg.ipsec_encryption_protocol
    }

    pub fn ipsec_perfect_forward_secrecy(&self) -> &[String] {
        &self.cfg.ipsec_perfect_forward_secrecy
    }

    pub fn ipsec_lifetime(&self) -> u32 {
        self.cfg.ipsec_lifetime
    }
}

fn tokens(values: &[Value]) -> Vec<String> {
    values.iter().map(|v| v.value.clone()).collect()
}

fn missing(conn: &str, path: &[&str]) -> Error {
    Error::MissingElement { conn: conn.to_string(), path: path.join("/") }
}

fn required<'a>(
    conn: &str,
    val: &'a Option<String>,
    path: &[&str],
) -> Result<&'a String> {
    val.as_ref().ok_or_else(|| missing(conn, path))
}

fn parse_ip(conn: &str, what: &'static str, val: &str) -> Result<Ipv4Addr> {
    val.parse().map_err(|e| Error::bad_value(conn, what, val, e))
}

fn parse_opt(
    conn: &str,
    what: &'static str,
    val: &Option<String>,
) -> Result<Option<u32>> {
    val.as_deref()
        .map(|v| v.parse::<u32>().map_err(|e| Error::bad_value(conn, what, v, e)))
        .transpose()
}
