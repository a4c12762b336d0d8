// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Synthesize the gateway side of a VPN connection.
//!
//! Synthesis is split in two. [`synthesize`] is a pure function of a
//! connection and a [`SynthCtx`]: it builds every interface, proposal,
//! key, policy, peer config, BGP peer and static route the connection
//! needs into a [`VpnArtifacts`]. [`apply_to_gateway`] checks that the
//! gateway has the VRFs the artifacts refer to and only then merges
//! them, in one go.

use super::IpsecTunnel;
use super::VpnConnection;
use super::proposal;
use crate::Result;
use ipsec::api::InterfaceAddr;
use ipsec::cfg::BgpPeerConfig;
use ipsec::cfg::DeviceCfg;
use ipsec::cfg::IkeKeyType;
use ipsec::cfg::IkePhase1Key;
use ipsec::cfg::IkePhase1Policy;
use ipsec::cfg::IkePhase1Proposal;
use ipsec::cfg::Interface;
use ipsec::cfg::IpsecPeerConfig;
use ipsec::cfg::IpsecPhase2Policy;
use ipsec::cfg::IpsecPhase2Proposal;
use ipsec::cfg::OriginType;
use ipsec::cfg::PolicyAction;
use ipsec::cfg::PolicyStatement;
use ipsec::cfg::RoutingPolicy;
use ipsec::cfg::RoutingProtocol;
use ipsec::cfg::StaticRoute;
use ipsec::warn::Warnings;
use slog::debug;
use std::collections::BTreeMap;

/// The VRF holding the underlay interfaces, the ones with the publicly
/// routable tunnel endpoints.
pub const VPN_UNDERLAY_VRF_NAME: &str = "vrf-vpn-underlay";

/// Exports the underlay interface addresses to the backbone.
pub const VPN_TO_BACKBONE_EXPORT_POLICY_NAME: &str =
    "~vpn~to~backbone~export~policy~";

pub fn vpn_tunnel_id(conn: &str, n: usize) -> String {
    format!("{conn}-{n}")
}

pub fn vpn_external_interface_name(tunnel_id: &str) -> String {
    format!("external-{tunnel_id}")
}

pub fn vpn_interface_name(tunnel_id: &str) -> String {
    format!("vpn-{tunnel_id}")
}

pub fn ipsec_peer_config_name(policy: &str) -> String {
    format!("{policy}-peer_config")
}

/// Where on the gateway a connection lands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SynthCtx {
    pub underlay_vrf: String,

    /// The VRF holding the tunnel (overlay) interfaces, BGP peers and
    /// static routes.
    pub tunnel_vrf: String,

    pub import_policy: Option<String>,
    pub export_policy: Option<String>,
}

impl SynthCtx {
    pub fn new<S: AsRef<str>>(tunnel_vrf: S) -> Self {
        Self {
            underlay_vrf: VPN_UNDERLAY_VRF_NAME.to_string(),
            tunnel_vrf: tunnel_vrf.as_ref().to_string(),
            import_policy: None,
            export_policy: None,
        }
    }

    pub fn with_policies(
        mut self,
        import: Option<String>,
        export: Option<String>,
    ) -> Self {
        self.import_policy = import;
        self.export_policy = export;
        self
    }
}

/// Everything a connection adds to a gateway.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VpnArtifacts {
    pub interfaces: BTreeMap<String, Interface>,
    pub ike_phase1_proposals: BTreeMap<String, IkePhase1Proposal>,
    pub ike_phase1_keys: BTreeMap<String, IkePhase1Key>,
    pub ike_phase1_policies: BTreeMap<String, IkePhase1Policy>,
    pub ipsec_phase2_proposals: BTreeMap<String, IpsecPhase2Proposal>,
    pub ipsec_phase2_policies: BTreeMap<String, IpsecPhase2Policy>,
    pub ipsec_peer_configs: BTreeMap<String, IpsecPeerConfig>,

    /// BGP peers for the tunnel VRF.
    pub bgp_peers: Vec<BgpPeerConfig>,

    /// Static routes for the tunnel VRF.
    pub static_routes: Vec<StaticRoute>,
}

/// Build the artifacts for every tunnel of `conn`.
///
/// An unknown algorithm token fails the whole connection.
pub fn synthesize(
    conn: &VpnConnection,
    ctx: &SynthCtx,
    warnings: &mut Warnings,
) -> Result<VpnArtifacts> {
    let mut arts = VpnArtifacts::default();

    for (i, tunnel) in conn.tunnels().iter().enumerate() {
        let tunnel_id = vpn_tunnel_id(conn.id(), i + 1);
        synthesize_tunnel(
            &mut arts, conn, &tunnel_id, tunnel, ctx, warnings,
        )?;
    }

    Ok(arts)
}

fn synthesize_tunnel(
    arts: &mut VpnArtifacts,
    conn: &VpnConnection,
    tunnel_id: &str,
    tunnel: &IpsecTunnel,
    ctx: &SynthCtx,
    warnings: &mut Warnings,
) -> Result<()> {
    let ext_name = vpn_external_interface_name(tunnel_id);
    let vpn_name = vpn_interface_name(tunnel_id);

    arts.interfaces.insert(
        ext_name.clone(),
        Interface {
            name: ext_name.clone(),
            vrf: ctx.underlay_vrf.clone(),
            address: InterfaceAddr::host(tunnel.vgw_outside_address()),
            description: format!("IPSec tunnel {tunnel_id}"),
        },
    );
    arts.interfaces.insert(
        vpn_name.clone(),
        Interface {
            name: vpn_name.clone(),
            vrf: ctx.tunnel_vrf.clone(),
            address: InterfaceAddr::new(
                tunnel.vgw_inside_address(),
                tunnel.vgw_inside_prefix_len(),
            ),
            description: format!("VPN {tunnel_id}"),
        },
    );

    // IKE Phase 1
    let p1_props = proposal::ike_phase1_proposals(tunnel_id, tunnel)?;
    let p1_names: Vec<String> =
        p1_props.iter().map(|p| p.name.clone()).collect();
    let n_p1 = p1_names.len();
    arts.ike_phase1_proposals
        .extend(p1_props.into_iter().map(|p| (p.name.clone(), p)));

    let key = IkePhase1Key {
        key_type: IkeKeyType::PreSharedKeyUnencrypted,
        key_hash: tunnel.ike_pre_shared_key_hash().map(str::to_string),
        remote_identity: tunnel.cgw_outside_address(),
        local_interface: ext_name.clone(),
    };
    arts.ike_phase1_keys.insert(tunnel_id.to_string(), key.clone());
    arts.ike_phase1_policies.insert(
        tunnel_id.to_string(),
        IkePhase1Policy {
            name: tunnel_id.to_string(),
            key,
            proposals: p1_names,
            remote_identity: tunnel.cgw_outside_address(),
            local_interface: ext_name.clone(),
        },
    );

    // IPsec Phase 2. Proposals and policies share one counter, so the
    // first policy is numbered right after the last proposal.
    let mut count = 0usize;
    let mut p2_names = vec![];
    for prop in proposal::ipsec_phase2_proposals(tunnel, warnings)? {
        let name = format!("{tunnel_id}-{count}");
        arts.ipsec_phase2_proposals.insert(name.clone(), prop);
        p2_names.push(name);
        count += 1;
    }

    let p2_pols = proposal::ipsec_phase2_policies(tunnel, &p2_names)?;
    let n_p2_pols = p2_pols.len();
    for pol in p2_pols {
        let name = format!("{tunnel_id}-{count}");
        arts.ipsec_peer_configs.insert(
            ipsec_peer_config_name(&name),
            IpsecPeerConfig {
                tunnel_interface: vpn_name.clone(),
                ike_phase1_policy: tunnel_id.to_string(),
                ipsec_policy: name.clone(),
                source_interface: ext_name.clone(),
                local_address: tunnel.vgw_outside_address(),
                destination_address: tunnel.cgw_outside_address(),
            },
        );
        arts.ipsec_phase2_policies.insert(name, pol);
        count += 1;
    }

    if conn.is_bgp() {
        arts.bgp_peers.push(BgpPeerConfig {
            peer_address: tunnel.cgw_inside_address(),
            local_ip: tunnel.vgw_inside_address(),
            local_as: tunnel.vgw_bgp_asn(),
            remote_asns: tunnel.cgw_bgp_asn().into_iter().collect(),
            import_policy: ctx.import_policy.clone(),
            export_policy: ctx.export_policy.clone(),
        });
    }

    if conn.static_routes_only() {
        let next_hop = tunnel.cgw_inside_address();
        arts.static_routes.extend(
            conn.routes().iter().map(|pfx| StaticRoute::new(*pfx, next_hop)),
        );
    }

    debug!(
        warnings.logger(),
        "synthesized tunnel";
        "tunnel" => tunnel_id,
        "ike_phase1_proposals" => n_p1,
        "ipsec_phase2_proposals" => p2_names.len(),
        "ipsec_phase2_policies" => n_p2_pols,
    );

    Ok(())
}

/// Merge `arts` into `cfg`.
///
/// The caller is responsible for making sure the VRFs named by `ctx`
/// exist.
pub fn merge_artifacts<D: DeviceCfg + ?Sized>(
    cfg: &mut D,
    ctx: &SynthCtx,
    arts: VpnArtifacts,
) {
    let VpnArtifacts {
        interfaces,
        ike_phase1_proposals,
        ike_phase1_keys,
        ike_phase1_policies,
        ipsec_phase2_proposals,
        ipsec_phase2_policies,
        ipsec_peer_configs,
        bgp_peers,
        static_routes,
    } = arts;

    cfg.extend_interfaces(interfaces);
    cfg.extend_ike_phase1_proposals(ike_phase1_proposals);
    cfg.extend_ike_phase1_keys(ike_phase1_keys);
    cfg.extend_ike_phase1_policies(ike_phase1_policies);
    cfg.extend_ipsec_phase2_proposals(ipsec_phase2_proposals);
    cfg.extend_ipsec_phase2_policies(ipsec_phase2_policies);
    cfg.extend_ipsec_peer_configs(ipsec_peer_configs);
    if !bgp_peers.is_empty() {
        cfg.extend_bgp_peers(&ctx.tunnel_vrf, bgp_peers);
    }
    if !static_routes.is_empty() {
        cfg.extend_static_routes(&ctx.tunnel_vrf, static_routes);
    }
}

/// Synthesize `conn` and attach it to the gateway `cfg`.
///
/// If the gateway lacks the underlay or tunnel VRF a single red flag is
/// raised, `cfg` is left untouched and `Ok(false)` is returned. An error
/// from synthesis also leaves `cfg` untouched.
pub fn apply_to_gateway<D: DeviceCfg + ?Sized>(
    cfg: &mut D,
    conn: &VpnConnection,
    ctx: &SynthCtx,
    warnings: &mut Warnings,
) -> Result<bool> {
    if cfg.vrf(&ctx.underlay_vrf).is_none() {
        warnings.red_flag(format!(
            "Underlay VRF does not exist on gateway {}",
            cfg.hostname()
        ));
        return Ok(false);
    }

    if cfg.vrf(&ctx.tunnel_vrf).is_none() {
        warnings.red_flag(format!(
            "Tunnel VRF does not exist on gateway {}",
            cfg.hostname()
        ));
        return Ok(false);
    }

    let arts = synthesize(conn, ctx, warnings)?;
    merge_artifacts(cfg, ctx, arts);
    Ok(true)
}

/// The routing policy exporting connected routes, with an INCOMPLETE
/// origin, to the backbone.
pub fn vpn_to_backbone_export_policy() -> RoutingPolicy {
    RoutingPolicy {
        name: VPN_TO_BACKBONE_EXPORT_POLICY_NAME.to_string(),
        statements: vec![PolicyStatement {
            protocol: RoutingProtocol::Connected,
            set_origin: Some(OriginType::Incomplete),
            action: PolicyAction::Accept,
        }],
        default_action: PolicyAction::Reject,
    }
}

/// Set up what every VPN connection on a gateway relies on: the
/// underlay VRF and the export policy towards the backbone.
pub fn init_vpn_infrastructure<D: DeviceCfg + ?Sized>(cfg: &mut D) {
    cfg.ensure_vrf(VPN_UNDERLAY_VRF_NAME);
    cfg.add_routing_policy(vpn_to_backbone_export_policy());
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        let tid = vpn_tunnel_id("vpn-0a1b", 2);
        assert_eq!(tid, "vpn-0a1b-2");
        assert_eq!(vpn_external_interface_name(&tid), "external-vpn-0a1b-2");
        assert_eq!(vpn_interface_name(&tid), "vpn-vpn-0a1b-2");
        assert_eq!(
            ipsec_peer_config_name("vpn-0a1b-2-16"),
            "vpn-0a1b-2-16-peer_config"
        );
    }

    #[test]
    fn export_policy() {
        let pol = vpn_to_backbone_export_policy();
        assert_eq!(pol.name, VPN_TO_BACKBONE_EXPORT_POLICY_NAME);
        assert_eq!(
            pol.evaluate(RoutingProtocol::Connected),
            (PolicyAction::Accept, Some(OriginType::Incomplete))
        );
        let (action, _) = pol.evaluate(RoutingProtocol::Static);
        assert_eq!(action, PolicyAction::Reject);
    }

    #[test]
    fn ctx_defaults() {
        let ctx = SynthCtx::new("tunnels")
            .with_policies(Some("in".into()), Some("out".into()));
        assert_eq!(ctx.underlay_vrf, VPN_UNDERLAY_VRF_NAME);
        assert_eq!(ctx.tunnel_vrf, "tunnels");
        assert_eq!(ctx.import_policy.as_deref(), Some("in"));
        assert_eq!(ctx.export_policy.as_deref(), Some("out"));
    }
}
