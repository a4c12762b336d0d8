// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use super::IpsecTunnel;
use super::Salt;
use super::SynthCtx;
use super::descriptor;
use super::synth;
use crate::Error;
use crate::Result;
use crate::api::GatewayType;
use crate::api::VgwTelemetry;
use crate::api::VpnConnectionDesc;
use crate::api::descriptors_from_json;
use ipsec::api::Ipv4Cidr;
use ipsec::cfg::DeviceCfg;
use ipsec::warn::Warnings;

/// Parse-time context shared by every connection of a run.
#[derive(Clone, Debug, Default)]
pub struct ParseCtx {
    pub salt: Salt,
}

impl ParseCtx {
    pub fn new(salt: Salt) -> Self {
        Self { salt }
    }
}

/// A parsed VPN connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VpnConnection {
    id: String,
    customer_gateway_id: String,
    gateway_type: GatewayType,
    gateway_id: String,
    is_bgp: bool,
    tunnels: Vec<IpsecTunnel>,
    routes: Vec<Ipv4Cidr>,
    vgw_telemetry: Vec<VgwTelemetry>,
    static_routes_only: bool,
}

impl VpnConnection {
    /// Validate a connection record and parse its customer gateway
    /// configuration.
    pub fn parse(desc: VpnConnectionDesc, ctx: &ParseCtx) -> Result<Self> {
        let VpnConnectionDesc {
            vpn_connection_id,
            customer_gateway_id,
            transit_gateway_id,
            vpn_gateway_id,
            customer_gateway_configuration,
            routes,
            vgw_telemetry,
            options,
        } = desc;

        let id = vpn_connection_id
            .ok_or_else(|| Error::missing_field(None, "VpnConnectionId"))?;
        let conn = Some(id.as_str());

        let customer_gateway_id = customer_gateway_id
            .ok_or_else(|| Error::missing_field(conn, "CustomerGatewayId"))?;

        let (gateway_type, gateway_id) =
            match (transit_gateway_id, vpn_gateway_id) {
                (Some(tgw), None) => (GatewayType::Transit, tgw),
                (None, Some(vgw)) => (GatewayType::Vpn, vgw),
                (None, None) => {
                    return Err(Error::missing_field(
                        conn,
                        "TransitGatewayId or VpnGatewayId",
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(Error::GatewayConflict { conn: id.clone() });
                }
            };

        let xml = customer_gateway_configuration.ok_or_else(|| {
            Error::missing_field(conn, "CustomerGatewayConfiguration")
        })?;
        let routes =
            routes.ok_or_else(|| Error::missing_field(conn, "Routes"))?;
        let vgw_telemetry = vgw_telemetry
            .ok_or_else(|| Error::missing_field(conn, "VgwTelemetry"))?;
        let options =
            options.ok_or_else(|| Error::missing_field(conn, "Options"))?;

        let cgw = descriptor::parse_cgw_config(&id, &xml)?;
        let tunnels =
            descriptor::pair_tunnels(cgw.tunnels, options.tunnel_options)?;
        let tunnels = tunnels
            .into_iter()
            .map(|spec| IpsecTunnel::from_spec(&id, spec, &ctx.salt))
            .collect::<Result<Vec<_>>>()?;

        let routes = routes
            .iter()
            .map(|r| {
                r.destination_cidr_block.parse::<Ipv4Cidr>().map_err(|e| {
                    Error::bad_value(
                        &id,
                        "DestinationCidrBlock",
                        &r.destination_cidr_block,
                        e,
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            customer_gateway_id,
            gateway_type,
            gateway_id,
            is_bgp: cgw.is_bgp,
            tunnels,
            routes,
            vgw_telemetry,
            static_routes_only: options.static_routes_only,
        })
    }

    /// Parse every connection in a JSON document, see
    /// [`descriptors_from_json`].
    ///
    /// Connections are parsed independently: one bad connection, be it a
    /// mistyped record or an invalid one, does not prevent the others from
    /// being returned.
    pub fn parse_json(s: &str, ctx: &ParseCtx) -> Result<Vec<Result<Self>>> {
        Ok(descriptors_from_json(s)?
            .into_iter()
            .map(|desc| {
                desc.map_err(Error::from).and_then(|d| Self::parse(d, ctx))
            })
            .collect())
    }

    /// Attach this connection to a gateway, see
    /// [`synth::apply_to_gateway`].
    pub fn apply_to_gateway<D: DeviceCfg + ?Sized>(
        &self,
        cfg: &mut D,
        ctx: &SynthCtx,
        warnings: &mut Warnings,
    ) -> Result<bool> {
        synth::apply_to_gateway(cfg, self, ctx, warnings)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_gateway_id(&self) -> &str {
        &self.customer_gateway_id
    }

    pub fn gateway_type(&self) -> GatewayType {
        self.gateway_type
    }

    pub fn gateway_id(&self) -> &str {
        &self.gateway_id
    }

    pub fn is_bgp(&self) -> bool {
        self.is_bgp
    }

    pub fn tunnels(&self) -> &[IpsecTunnel] {
        &self.tunnels
    }

    pub fn routes(&self) -> &[Ipv4Cidr] {
        &self.routes
    }

    pub fn vgw_telemetry(&self) -> &[VgwTelemetry] {
        &self.vgw_telemetry
    }

    pub fn static_routes_only(&self) -> bool {
        self.static_routes_only
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::Options;
    use crate::api::TunnelOptions;
    use crate::api::VpnRoute;

    const XML: &str = "<vpn_connection id=\"vpn-1\">\
        <ipsec_tunnel>\
          <customer_gateway><tunnel_outside_address>\
            <ip_address>198.51.100.7</ip_address>\
          </tunnel_outside_address></customer_gateway>\
          <vpn_gateway>\
            <tunnel_outside_address><ip_address>203.0.113.10</ip_address></tunnel_outside_address>\
            <tunnel_inside_address><ip_address>169.254.1.1</ip_address>\
              <network_cidr>30</network_cidr></tunnel_inside_address>\
          </vpn_gateway>\
        </ipsec_tunnel>\
        </vpn_connection>";

    fn desc() -> VpnConnectionDesc {
        VpnConnectionDesc {
            vpn_connection_id: Some("vpn-1".into()),
            customer_gateway_id: Some("cgw-1".into()),
            transit_gateway_id: None,
            vpn_gateway_id: Some("vgw-1".into()),
            customer_gateway_configuration: Some(XML.into()),
            routes: Some(vec![VpnRoute {
                destination_cidr_block: "10.10.0.0/16".into(),
            }]),
            vgw_telemetry: Some(vec![VgwTelemetry {
                status: Some("UP".into()),
                ..Default::default()
            }]),
            options: Some(Options {
                tunnel_options: vec![TunnelOptions::default()],
                static_routes_only: true,
            }),
        }
    }

    #[test]
    fn parses() {
        let conn = VpnConnection::parse(desc(), &ParseCtx::default()).unwrap();
        assert_eq!(conn.id(), "vpn-1");
        assert_eq!(conn.customer_gateway_id(), "cgw-1");
        assert_eq!(conn.gateway_type(), GatewayType::Vpn);
        assert_eq!(conn.gateway_id(), "vgw-1");
        assert!(conn.is_bgp());
        assert!(conn.static_routes_only());
        assert_eq!(conn.tunnels().len(), 1);
        assert_eq!(conn.routes(), ["10.10.0.0/16".parse::<Ipv4Cidr>().unwrap()]);
        assert_eq!(conn.vgw_telemetry()[0].status.as_deref(), Some("UP"));
    }

    #[test]
    fn transit_gateway() {
        let d = VpnConnectionDesc {
            transit_gateway_id: Some("tgw-1".into()),
            vpn_gateway_id: None,
            ..desc()
        };
        let conn = VpnConnection::parse(d, &ParseCtx::default()).unwrap();
        assert_eq!(conn.gateway_type(), GatewayType::Transit);
        assert_eq!(conn.gateway_id(), "tgw-1");
    }

    #[test]
    fn required_fields() {
        let ctx = ParseCtx::default();
        let cases = [
            (
                VpnConnectionDesc { vpn_connection_id: None, ..desc() },
                "VpnConnectionId",
            ),
            (
                VpnConnectionDesc { customer_gateway_id: None, ..desc() },
                "CustomerGatewayId",
            ),
            (
                VpnConnectionDesc {
                    customer_gateway_configuration: None,
                    ..desc()
                },
                "CustomerGatewayConfiguration",
            ),
            (VpnConnectionDesc { routes: None, ..desc() }, "Routes"),
            (
                VpnConnectionDesc { vgw_telemetry: None, ..desc() },
                "VgwTelemetry",
            ),
            (VpnConnectionDesc { options: None, ..desc() }, "Options"),
        ];

        for (d, expected) in cases {
            match VpnConnection::parse(d, &ctx) {
                Err(Error::MissingField { field, .. }) => {
                    assert_eq!(field, expected)
                }
                res => panic!("expected missing {expected}, got {res:?}"),
            }
        }
    }

    #[test]
    fn gateway_ids_are_exclusive() {
        let ctx = ParseCtx::default();
        let both = VpnConnectionDesc {
            transit_gateway_id: Some("tgw-1".into()),
            ..desc()
        };
        assert!(matches!(
            VpnConnection::parse(both, &ctx),
            Err(Error::GatewayConflict { .. })
        ));

        let neither = VpnConnectionDesc { vpn_gateway_id: None, ..desc() };
        assert!(matches!(
            VpnConnection::parse(neither, &ctx),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn bad_route() {
        let d = VpnConnectionDesc {
            routes: Some(vec![VpnRoute {
                destination_cidr_block: "10.10.0.0".into(),
            }]),
            ..desc()
        };
        assert!(matches!(
            VpnConnection::parse(d, &ParseCtx::default()),
            Err(Error::BadValue { what: "DestinationCidrBlock", .. })
        ));
    }

    #[test]
    fn parse_json_is_per_connection() {
        let json = r#"{"VpnConnections": [
            {"VpnConnectionId": "vpn-a"},
            {"CustomerGatewayId": "cgw-b"}
        ]}"#;
        let res = VpnConnection::parse_json(json, &ParseCtx::default()).unwrap();
        assert_eq!(res.len(), 2);
        assert!(res.iter().all(|r| r.is_err()));

        assert!(matches!(
            VpnConnection::parse_json("[", &ParseCtx::default()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn parse_json_keeps_good_next_to_mistyped() {
        let good = serde_json::to_value(desc()).unwrap();
        let json = serde_json::json!({
            "VpnConnections": [
                good,
                {"VpnConnectionId": "vpn-bad", "Routes": "oops"},
            ]
        })
        .to_string();

        let res = VpnConnection::parse_json(&json, &ParseCtx::default()).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].as_ref().unwrap().id(), "vpn-1");
        assert!(matches!(res[1], Err(Error::Json(_))));
    }
}
