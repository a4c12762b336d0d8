// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The VPN connection record as the provider's API reports it.
//!
//! Field names follow the provider's `PascalCase` JSON. Everything is
//! optional at this level; [`crate::engine::VpnConnection::parse`]
//! decides what is required.

use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

pub const DEFAULT_IKE_LIFETIME_SECS: u32 = 28800;
pub const DEFAULT_IPSEC_LIFETIME_SECS: u32 = 3600;

/// One algorithm token, e.g. `{"Value": "AES128"}` or `{"Value": 14}`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Value {
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: String,
}

impl Value {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self { value: value.into() }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// DH group numbers come back from the provider as JSON integers while
// every other token is a string. A null value becomes the empty token.
fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Str(String),
        Num(i64),
    }

    Ok(match Option::<Token>::deserialize(d)? {
        Some(Token::Str(s)) => s,
        Some(Token::Num(n)) => n.to_string(),
        None => String::new(),
    })
}

fn values(tokens: &[&str]) -> Vec<Value> {
    tokens.iter().map(|t| Value::new(*t)).collect()
}

fn default_ike_versions() -> Vec<Value> {
    values(&["ikev1", "ikev2"])
}

fn default_encryption() -> Vec<Value> {
    values(&["AES128", "AES256", "AES128-GCM-16", "AES256-GCM-16"])
}

fn default_integrity() -> Vec<Value> {
    values(&["SHA1", "SHA2-256", "SHA2-384", "SHA2-512"])
}

fn default_phase1_dh() -> Vec<Value> {
    values(&[
        "2", "14", "15", "16", "17", "18", "19", "20", "21", "22", "23", "24",
    ])
}

fn default_phase2_dh() -> Vec<Value> {
    values(&[
        "2", "5", "14", "15", "16", "17", "18", "19", "20", "21", "22", "23",
        "24",
    ])
}

/// Per-tunnel negotiation options.
///
/// Any algorithm list the provider omits takes the provider's documented
/// default, which is everything it supports.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TunnelOptions {
    #[serde(default = "default_ike_versions")]
    pub ike_versions: Vec<Value>,

    #[serde(default = "default_encryption")]
    pub phase1_encryption_algorithms: Vec<Value>,

    #[serde(default = "default_integrity")]
    pub phase1_integrity_algorithms: Vec<Value>,

    #[serde(rename = "Phase1DHGroupNumbers", default = "default_phase1_dh")]
    pub phase1_dh_group_numbers: Vec<Value>,

    #[serde(default = "default_encryption")]
    pub phase2_encryption_algorithms: Vec<Value>,

    #[serde(default = "default_integrity")]
    pub phase2_integrity_algorithms: Vec<Value>,

    #[serde(rename = "Phase2DHGroupNumbers", default = "default_phase2_dh")]
    pub phase2_dh_group_numbers: Vec<Value>,

    /// The provider side outside address of this tunnel.
    #[serde(default)]
    pub outside_ip_address: Option<String>,

    /// The inside link block, e.g. `169.254.10.0/30`.
    #[serde(default)]
    pub tunnel_inside_cidr: Option<String>,

    #[serde(default)]
    pub pre_shared_key: Option<String>,

    #[serde(default)]
    pub phase1_lifetime_seconds: Option<u32>,

    #[serde(default)]
    pub phase2_lifetime_seconds: Option<u32>,
}

impl Default for TunnelOptions {
    fn default() -> Self {
        Self {
            ike_versions: default_ike_versions(),
            phase1_encryption_algorithms: default_encryption(),
            phase1_integrity_algorithms: default_integrity(),
            phase1_dh_group_numbers: default_phase1_dh(),
            phase2_encryption_algorithms: default_encryption(),
            phase2_integrity_algorithms: default_integrity(),
            phase2_dh_group_numbers: default_phase2_dh(),
            outside_ip_address: None,
            tunnel_inside_cidr: None,
            pre_shared_key: None,
            phase1_lifetime_seconds: None,
            phase2_lifetime_seconds: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Options {
    #[serde(default)]
    pub tunnel_options: Vec<TunnelOptions>,

    #[serde(default)]
    pub static_routes_only: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpnRoute {
    pub destination_cidr_block: String,
}

/// Tunnel status as last reported by the provider. Carried through
/// untouched.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VgwTelemetry {
    #[serde(default)]
    pub accepted_route_count: Option<u32>,

    #[serde(default)]
    pub last_status_change: Option<String>,

    #[serde(default)]
    pub outside_ip_address: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub status_message: Option<String>,
}

/// The kind of provider gateway terminating a connection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GatewayType {
    Transit,
    Vpn,
}

impl Display for GatewayType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Transit => write!(f, "TRANSIT"),
            Self::Vpn => write!(f, "VPN"),
        }
    }
}

/// A VPN connection record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpnConnectionDesc {
    pub vpn_connection_id: Option<String>,
    pub customer_gateway_id: Option<String>,
    pub transit_gateway_id: Option<String>,
    pub vpn_gateway_id: Option<String>,

    /// The customer gateway configuration, an XML document.
    pub customer_gateway_configuration: Option<String>,

    pub routes: Option<Vec<VpnRoute>>,
    pub vgw_telemetry: Option<Vec<VgwTelemetry>>,
    pub options: Option<Options>,
}

/// Read connection records from JSON: either a single record or the
/// provider's `{"VpnConnections": [...]}` listing.
///
/// Only a document that is not JSON, or a listing that is not an array,
/// fails as a whole. Each record is deserialized on its own, so a
/// mistyped record yields an error in its slot and nowhere else.
pub fn descriptors_from_json(
    s: &str,
) -> serde_json::Result<Vec<serde_json::Result<VpnConnectionDesc>>> {
    let mut doc: serde_json::Value = serde_json::from_str(s)?;
    let listing =
        doc.as_object_mut().and_then(|obj| obj.remove("VpnConnections"));

    match listing {
        Some(list) => {
            let records: Vec<serde_json::Value> = serde_json::from_value(list)?;
            Ok(records.into_iter().map(serde_json::from_value).collect())
        }

        None => Ok(vec![serde_json::from_value(doc)]),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn options_defaults() {
        let opts: TunnelOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, TunnelOptions::default());
        assert_eq!(opts.phase1_dh_group_numbers.len(), 12);
        assert_eq!(opts.phase2_dh_group_numbers.len(), 13);
        assert_eq!(opts.phase2_dh_group_numbers[1], Value::from("5"));
        assert_eq!(opts.phase1_encryption_algorithms.len(), 4);
        assert_eq!(opts.phase2_integrity_algorithms.len(), 4);
        assert_eq!(opts.ike_versions, values(&["ikev1", "ikev2"]));
    }

    #[test]
    fn value_string_or_number() {
        let opts: TunnelOptions = serde_json::from_str(
            r#"{
                "Phase1DHGroupNumbers": [{"Value": 14}, {"Value": "2"}],
                "Phase2EncryptionAlgorithms": [{"Value": null}, {}]
            }"#,
        )
        .unwrap();
        assert_eq!(opts.phase1_dh_group_numbers, values(&["14", "2"]));
        assert_eq!(opts.phase2_encryption_algorithms, values(&["", ""]));
        assert_eq!(opts.phase1_encryption_algorithms, default_encryption());
    }

    #[test]
    fn explicit_empty_list_is_kept() {
        let opts: TunnelOptions =
            serde_json::from_str(r#"{"Phase2IntegrityAlgorithms": []}"#)
                .unwrap();
        assert!(opts.phase2_integrity_algorithms.is_empty());
    }

    #[test]
    fn single_or_listing() {
        let one = descriptors_from_json(r#"{"VpnConnectionId": "vpn-1"}"#)
            .unwrap();
        assert_eq!(one.len(), 1);
        let one = one[0].as_ref().unwrap();
        assert_eq!(one.vpn_connection_id.as_deref(), Some("vpn-1"));

        let many = descriptors_from_json(
            r#"{"VpnConnections": [
                {"VpnConnectionId": "vpn-1"},
                {"VpnConnectionId": "vpn-2", "Options": {"StaticRoutesOnly": true}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        let second = many[1].as_ref().unwrap();
        assert!(second.options.as_ref().unwrap().static_routes_only);
    }

    #[test]
    fn mistyped_record_stays_in_its_slot() {
        let many = descriptors_from_json(
            r#"{"VpnConnections": [
                {"VpnConnectionId": "vpn-good"},
                {"VpnConnectionId": "vpn-bad", "Routes": "oops"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        let good = many[0].as_ref().unwrap();
        assert_eq!(good.vpn_connection_id.as_deref(), Some("vpn-good"));
        assert!(many[1].is_err());

        let one = descriptors_from_json(r#"{"Routes": 7}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert!(one[0].is_err());
    }

    #[test]
    fn listing_must_be_an_array() {
        assert!(descriptors_from_json(r#"{"VpnConnections": {}}"#).is_err());
        assert!(descriptors_from_json("[").is_err());
    }
}
