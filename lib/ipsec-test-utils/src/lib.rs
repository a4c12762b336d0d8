// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Common routines for integration tests.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

// Let's make our lives easier and pub use a bunch of stuff.
pub use aws_vpn::Error;
pub use aws_vpn::api::Options;
pub use aws_vpn::api::TunnelOptions;
pub use aws_vpn::api::Value;
pub use aws_vpn::api::VgwTelemetry;
pub use aws_vpn::api::VpnConnectionDesc;
pub use aws_vpn::api::VpnRoute;
pub use aws_vpn::engine::ParseCtx;
pub use aws_vpn::engine::Salt;
pub use aws_vpn::engine::SynthCtx;
pub use aws_vpn::engine::VpnArtifacts;
pub use aws_vpn::engine::VpnConnection;
pub use aws_vpn::engine::synth;
pub use aws_vpn::engine::synth::VPN_TO_BACKBONE_EXPORT_POLICY_NAME;
pub use aws_vpn::engine::synth::VPN_UNDERLAY_VRF_NAME;
pub use ipsec::api::Ipv4Addr;
pub use ipsec::api::Ipv4Cidr;
pub use ipsec::cfg::Configuration;
pub use ipsec::cfg::DeviceCfg;
pub use ipsec::warn::Warnings;

pub const TEST_SALT: &str = "ipsec-test-salt";
pub const TUNNEL_VRF: &str = "vrf-tunnels";
pub const HOSTNAME: &str = "gw0";

/// One `ipsec_tunnel` element of a customer gateway configuration.
#[derive(Clone, Debug)]
pub struct TunnelXml {
    pub cgw_outside: String,
    pub cgw_asn: Option<u32>,
    pub vgw_outside: String,
    pub vgw_inside: String,
    pub inside_prefix_len: u8,
    pub vgw_asn: Option<u32>,
    pub psk: Option<String>,
}

impl TunnelXml {
    /// The `n`th tunnel (from 1) of a typical BGP connection.
    pub fn nth(n: u8) -> Self {
        Self {
            cgw_outside: "198.51.100.7".to_string(),
            cgw_asn: Some(65000),
            vgw_outside: format!("203.0.113.{}", 10 + n),
            vgw_inside: format!("169.254.{n}.1"),
            inside_prefix_len: 30,
            vgw_asn: Some(64512),
            psk: Some(format!("psk-{n}")),
        }
    }

    fn render(&self) -> String {
        let bgp = |asn: Option<u32>| {
            asn.map(|a| {
                format!("<bgp><asn>{a}</asn><hold_time>30</hold_time></bgp>")
            })
            .unwrap_or_default()
        };
        let psk = self
            .psk
            .as_ref()
            .map(|k| format!("<pre_shared_key>{k}</pre_shared_key>"))
            .unwrap_or_default();

        format!(
            "<ipsec_tunnel>\
               <customer_gateway>\
                 <tunnel_outside_address>\
                   <ip_address>{}</ip_address>\
                 </tunnel_outside_address>\
                 {}\
               </customer_gateway>\
               <vpn_gateway>\
                 <tunnel_outside_address>\
                   <ip_address>{}</ip_address>\
                 </tunnel_outside_address>\
                 <tunnel_inside_address>\
                   <ip_address>{}</ip_address>\
                   <network_mask>255.255.255.252</network_mask>\
                   <network_cidr>{}</network_cidr>\
                 </tunnel_inside_address>\
                 {}\
               </vpn_gateway>\
               <ike>\
                 <authentication_protocol>sha1</authentication_protocol>\
                 <lifetime>28800</lifetime>\
                 {psk}\
               </ike>\
               <ipsec>\
                 <protocol>esp</protocol>\
                 <lifetime>3600</lifetime>\
                 <mode>tunnel</mode>\
               </ipsec>\
             </ipsec_tunnel>",
            self.cgw_outside,
            bgp(self.cgw_asn),
            self.vgw_outside,
            self.vgw_inside,
            self.inside_prefix_len,
            bgp(self.vgw_asn),
        )
    }
}

/// A customer gateway configuration document.
pub fn cgw_xml(conn: &str, bgp: bool, tunnels: &[TunnelXml]) -> String {
    let attrs = if bgp {
        String::new()
    } else {
        "<vpn_connection_attributes>NoBGPVPNConnection\
         </vpn_connection_attributes>"
            .to_string()
    };
    let tunnels: String = tunnels.iter().map(TunnelXml::render).collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <vpn_connection id=\"{conn}\">\
           <customer_gateway_id>cgw-0123</customer_gateway_id>\
           <vpn_gateway_id>vgw-0123</vpn_gateway_id>\
           <vpn_connection_type>ipsec.1</vpn_connection_type>\
           {attrs}{tunnels}\
         </vpn_connection>"
    )
}

/// Tunnel options narrowed to a single choice per negotiation list, so
/// that proposal counts stay small.
pub fn narrow_tunnel_options() -> TunnelOptions {
    TunnelOptions {
        ike_versions: vec!["ikev2".into()],
        phase1_encryption_algorithms: vec!["AES256".into()],
        phase1_integrity_algorithms: vec!["SHA2-256".into()],
        phase1_dh_group_numbers: vec!["14".into()],
        phase2_encryption_algorithms: vec!["AES256".into()],
        phase2_integrity_algorithms: vec!["SHA2-256".into()],
        phase2_dh_group_numbers: vec!["14".into()],
        ..Default::default()
    }
}

/// A connection record with `n` tunnels, all using `opts`.
pub fn conn_desc(
    id: &str,
    bgp: bool,
    n: u8,
    opts: TunnelOptions,
    routes: &[&str],
) -> VpnConnectionDesc {
    let tunnels: Vec<TunnelXml> = (1..=n).map(TunnelXml::nth).collect();

    VpnConnectionDesc {
        vpn_connection_id: Some(id.to_string()),
        customer_gateway_id: Some("cgw-0123".to_string()),
        transit_gateway_id: None,
        vpn_gateway_id: Some("vgw-0123".to_string()),
        customer_gateway_configuration: Some(cgw_xml(id, bgp, &tunnels)),
        routes: Some(
            routes
                .iter()
                .map(|r| VpnRoute { destination_cidr_block: r.to_string() })
                .collect(),
        ),
        vgw_telemetry: Some(
            tunnels
                .iter()
                .map(|t| VgwTelemetry {
                    outside_ip_address: Some(t.vgw_outside.clone()),
                    status: Some("UP".to_string()),
                    ..Default::default()
                })
                .collect(),
        ),
        options: Some(Options {
            tunnel_options: vec![opts; usize::from(n)],
            static_routes_only: !bgp,
        }),
    }
}

/// A `DescribeVpnConnections` style JSON document.
pub fn descriptor_json(descs: &[VpnConnectionDesc]) -> String {
    let body = serde_json::json!({ "VpnConnections": descs });
    body.to_string()
}

pub fn parse_ctx() -> ParseCtx {
    ParseCtx::new(Salt::fixed(TEST_SALT))
}

pub fn parse(desc: VpnConnectionDesc) -> VpnConnection {
    VpnConnection::parse(desc, &parse_ctx())
        .unwrap_or_else(|e| panic!("failed to parse connection: {e}"))
}

pub fn synth_ctx() -> SynthCtx {
    SynthCtx::new(TUNNEL_VRF)
}

/// A gateway ready to accept VPN connections: it has the VPN
/// infrastructure and the tunnel VRF.
pub fn gateway() -> Configuration {
    let mut cfg = Configuration::new(HOSTNAME);
    synth::init_vpn_infrastructure(&mut cfg);
    cfg.ensure_vrf(TUNNEL_VRF);
    cfg
}
