// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The customer gateway configuration document.
//!
//! The provider hands out an XML document describing, per tunnel, the
//! addresses, BGP settings and key material each side should use. Only
//! the handful of elements needed to build an [`IpsecTunnel`] are read.
//! Document type declarations are refused outright, which also shuts
//! out external entities.
//!
//! [`IpsecTunnel`]: super::IpsecTunnel

use crate::Error;
use crate::Result;
use crate::api::TunnelOptions;
use itertools::EitherOrBoth;
use itertools::Itertools;
use roxmltree::Document;
use roxmltree::Node;
use roxmltree::ParsingOptions;

pub const XML_KEY_VPN_CONNECTION: &str = "vpn_connection";
pub const XML_KEY_VPN_CONNECTION_ATTRIBUTES: &str = "vpn_connection_attributes";
pub const XML_KEY_IPSEC_TUNNEL: &str = "ipsec_tunnel";

/// Present in the connection attributes of static-routing connections,
/// e.g. `NoBGPVPNConnection`.
pub const NO_BGP_MARKER: &str = "NoBGP";

pub const CGW_OUTSIDE_ADDRESS: &[&str] =
    &["customer_gateway", "tunnel_outside_address", "ip_address"];
pub const CGW_BGP_ASN: &[&str] = &["customer_gateway", "bgp", "asn"];
pub const VGW_OUTSIDE_ADDRESS: &[&str] =
    &["vpn_gateway", "tunnel_outside_address", "ip_address"];
pub const VGW_INSIDE_ADDRESS: &[&str] =
    &["vpn_gateway", "tunnel_inside_address", "ip_address"];
pub const VGW_INSIDE_NETWORK_CIDR: &[&str] =
    &["vpn_gateway", "tunnel_inside_address", "network_cidr"];
pub const VGW_BGP_ASN: &[&str] = &["vpn_gateway", "bgp", "asn"];
pub const IKE_PRE_SHARED_KEY: &[&str] = &["ike", "pre_shared_key"];
pub const IKE_LIFETIME: &[&str] = &["ike", "lifetime"];
pub const IPSEC_LIFETIME: &[&str] = &["ipsec", "lifetime"];

/// The fields of one `ipsec_tunnel` element, as raw text.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TunnelElement {
    pub cgw_outside_address: Option<String>,
    pub cgw_bgp_asn: Option<String>,
    pub vgw_outside_address: Option<String>,
    pub vgw_inside_address: Option<String>,
    pub vgw_inside_network_cidr: Option<String>,
    pub vgw_bgp_asn: Option<String>,
    pub pre_shared_key: Option<String>,
    pub ike_lifetime: Option<String>,
    pub ipsec_lifetime: Option<String>,
}

impl TunnelElement {
    fn from_node(node: Node) -> Self {
        let get = |path| text_at(node, path);

        Self {
            cgw_outside_address: get(CGW_OUTSIDE_ADDRESS),
            cgw_bgp_asn: get(CGW_BGP_ASN),
            vgw_outside_address: get(VGW_OUTSIDE_ADDRESS),
            vgw_inside_address: get(VGW_INSIDE_ADDRESS),
            vgw_inside_network_cidr: get(VGW_INSIDE_NETWORK_CIDR),
            vgw_bgp_asn: get(VGW_BGP_ASN),
            pre_shared_key: get(IKE_PRE_SHARED_KEY),
            ike_lifetime: get(IKE_LIFETIME),
            ipsec_lifetime: get(IPSEC_LIFETIME),
        }
    }
}

/// What the customer gateway configuration says about a connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CgwConfig {
    pub is_bgp: bool,

    /// Tunnel elements in document order.
    pub tunnels: Vec<TunnelElement>,
}

/// Parse a customer gateway configuration document.
///
/// Any XML error, including the presence of a DOCTYPE, is fatal.
pub fn parse_cgw_config(conn: &str, xml: &str) -> Result<CgwConfig> {
    let opts = ParsingOptions { allow_dtd: false, ..ParsingOptions::default() };
    let doc = Document::parse_with_options(xml, opts)
        .map_err(|source| Error::Xml { conn: conn.to_string(), source })?;

    let vpn_conn = doc
        .descendants()
        .find(|n| n.has_tag_name(XML_KEY_VPN_CONNECTION))
        .ok_or_else(|| Error::MissingElement {
            conn: conn.to_string(),
            path: XML_KEY_VPN_CONNECTION.to_string(),
        })?;

    // The attributes element is absent for BGP connections and reads
    // "NoBGPVPNConnection" for static ones.
    let is_bgp = match vpn_conn
        .descendants()
        .find(|n| n.has_tag_name(XML_KEY_VPN_CONNECTION_ATTRIBUTES))
    {
        None => true,
        Some(attrs) => !text_content(attrs).contains(NO_BGP_MARKER),
    };

    let tunnels = doc
        .descendants()
        .filter(|n| n.has_tag_name(XML_KEY_IPSEC_TUNNEL))
        .map(TunnelElement::from_node)
        .collect();

    Ok(CgwConfig { is_bgp, tunnels })
}

/// A tunnel element together with the options entry at the same index.
#[derive(Clone, Debug, PartialEq)]
pub struct TunnelSpec {
    pub index: usize,
    pub element: TunnelElement,
    pub options: TunnelOptions,
}

/// Pair tunnel elements with options entries by position.
///
/// A tunnel element without an options entry is reported as an out of
/// bounds index, options entries left over once every tunnel is paired
/// as a count mismatch.
pub fn pair_tunnels(
    elements: Vec<TunnelElement>,
    options: Vec<TunnelOptions>,
) -> Result<Vec<TunnelSpec>> {
    let tunnels = elements.len();
    let len = options.len();

    elements
        .into_iter()
        .zip_longest(options)
        .enumerate()
        .map(|(index, pair)| match pair {
            EitherOrBoth::Both(element, options) => {
                Ok(TunnelSpec { index, element, options })
            }
            EitherOrBoth::Left(_) => {
                Err(Error::TunnelIndexOutOfBounds { index, len })
            }
            EitherOrBoth::Right(_) => {
                Err(Error::TunnelCountMismatch { tunnels, options: len })
            }
        })
        .collect()
}

// The concatenated text of `node` and all its descendants.
fn text_content(node: Node) -> String {
    node.descendants().filter(|n| n.is_text()).filter_map(|n| n.text()).collect()
}

// Follow `path` through child elements, taking the first match at each
// step, and return the trimmed text found there. Empty text counts as
// absent.
fn text_at(node: Node, path: &[&str]) -> Option<String> {
    let mut cur = node;
    for tag in path {
        cur = cur.children().find(|c| c.has_tag_name(*tag))?;
    }

    let text = text_content(cur);
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod test {
    use super::*;

    const TUNNEL: &str = r#"
        <ipsec_tunnel>
          <customer_gateway>
            <tunnel_outside_address><ip_address>198.51.100.7</ip_address></tunnel_outside_address>
            <bgp><asn>65000</asn></bgp>
          </customer_gateway>
          <vpn_gateway>
            <tunnel_outside_address><ip_address>203.0.113.10</ip_address></tunnel_outside_address>
            <tunnel_inside_address>
              <ip_address>169.254.44.5</ip_address>
              <network_cidr>30</network_cidr>
            </tunnel_inside_address>
            <bgp><asn>7224</asn></bgp>
          </vpn_gateway>
          <ike><pre_shared_key>s3cret</pre_shared_key><lifetime>28800</lifetime></ike>
          <ipsec><lifetime>3600</lifetime></ipsec>
        </ipsec_tunnel>"#;

    fn doc(attrs: Option<&str>, tunnels: usize) -> String {
        let attrs = attrs
            .map(|a| {
                format!(
                    "<vpn_connection_attributes>{a}</vpn_connection_attributes>"
                )
            })
            .unwrap_or_default();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <vpn_connection id=\"vpn-1\">{attrs}{}</vpn_connection>",
            TUNNEL.repeat(tunnels)
        )
    }

    #[test]
    fn reads_tunnel_fields() {
        let cfg = parse_cgw_config("vpn-1", &doc(None, 1)).unwrap();
        assert_eq!(cfg.tunnels.len(), 1);

        let t = &cfg.tunnels[0];
        assert_eq!(t.cgw_outside_address.as_deref(), Some("198.51.100.7"));
        assert_eq!(t.cgw_bgp_asn.as_deref(), Some("65000"));
        assert_eq!(t.vgw_outside_address.as_deref(), Some("203.0.113.10"));
        assert_eq!(t.vgw_inside_address.as_deref(), Some("169.254.44.5"));
        assert_eq!(t.vgw_inside_network_cidr.as_deref(), Some("30"));
        assert_eq!(t.vgw_bgp_asn.as_deref(), Some("7224"));
        assert_eq!(t.pre_shared_key.as_deref(), Some("s3cret"));
        assert_eq!(t.ike_lifetime.as_deref(), Some("28800"));
        assert_eq!(t.ipsec_lifetime.as_deref(), Some("3600"));
    }

    #[test]
    fn bgp_detection() {
        let bgp = |attrs| parse_cgw_config("c", &doc(attrs, 0)).unwrap().is_bgp;
        assert!(bgp(None));
        assert!(bgp(Some("SomethingElse")));
        assert!(!bgp(Some("NoBGPVPNConnection")));
        assert!(!bgp(Some("NoBGP")));
    }

    #[test]
    fn tunnels_in_document_order() {
        let cfg = parse_cgw_config("c", &doc(None, 2)).unwrap();
        assert_eq!(cfg.tunnels.len(), 2);
    }

    #[test]
    fn doctype_rejected() {
        let xml = r#"<?xml version="1.0"?>
            <!DOCTYPE vpn_connection [
              <!ENTITY xxe SYSTEM "file:///etc/passwd">
            ]>
            <vpn_connection>&xxe;</vpn_connection>"#;
        let err = parse_cgw_config("vpn-bad", xml).unwrap_err();
        assert!(matches!(err, Error::Xml { ref conn, .. } if conn == "vpn-bad"));
    }

    #[test]
    fn malformed_rejected() {
        let err = parse_cgw_config("c", "<vpn_connection>").unwrap_err();
        assert!(matches!(err, Error::Xml { .. }));
    }

    #[test]
    fn missing_connection_element() {
        let err = parse_cgw_config("c", "<other/>").unwrap_err();
        assert!(matches!(err, Error::MissingElement { .. }));
    }

    #[test]
    fn pairing() {
        let el = || TunnelElement::default();
        let opt = || TunnelOptions::default();

        let specs = pair_tunnels(vec![el(), el()], vec![opt(), opt()]).unwrap();
        assert_eq!(
            specs.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1]
        );

        assert!(matches!(
            pair_tunnels(vec![el(), el()], vec![opt()]),
            Err(Error::TunnelIndexOutOfBounds { index: 1, len: 1 })
        ));

        assert!(matches!(
            pair_tunnels(vec![el()], vec![opt(), opt()]),
            Err(Error::TunnelCountMismatch { tunnels: 1, options: 2 })
        ));

        assert!(pair_tunnels(vec![], vec![]).unwrap().is_empty());
    }
}
