// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The device a VPN is attached to.
//!
//! A front end never reaches into a device directly. Everything it
//! needs, a handful of named lookups plus one "extend" operation per
//! artifact kind, goes through [`DeviceCfg`]. The lookups are meant to
//! be answered before any extend call is made so that a front end can
//! bail out without leaving a half-attached VPN behind.

use super::IkePhase1Key;
use super::IkePhase1Policy;
use super::IkePhase1Proposal;
use super::IpsecPeerConfig;
use super::IpsecPhase2Policy;
use super::IpsecPhase2Proposal;
use crate::api::DEFAULT_VRF_NAME;
use crate::api::InterfaceAddr;
use crate::api::Ipv4Addr;
use crate::api::Ipv4Cidr;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// The administrative distance given to statically configured routes.
pub const STATIC_ROUTE_ADMIN_DISTANCE: u8 = 1;

/// A layer-3 interface.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Interface {
    pub name: String,

    /// The VRF this interface is bound to.
    pub vrf: String,

    pub address: InterfaceAddr,
    pub description: String,
}

/// A BGP neighbor.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BgpPeerConfig {
    pub peer_address: Ipv4Addr,
    pub local_ip: Ipv4Addr,
    pub local_as: Option<u32>,

    /// Acceptable remote AS numbers. Empty means any.
    pub remote_asns: Vec<u32>,

    pub import_policy: Option<String>,
    pub export_policy: Option<String>,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct StaticRoute {
    pub network: Ipv4Cidr,
    pub next_hop: Ipv4Addr,
    pub admin_distance: u8,
}

impl StaticRoute {
    pub fn new(network: Ipv4Cidr, next_hop: Ipv4Addr) -> Self {
        Self { network, next_hop, admin_distance: STATIC_ROUTE_ADMIN_DISTANCE }
    }
}

impl Display for StaticRoute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} via {}", self.network, self.next_hop)
    }
}

/// A named routing instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Vrf {
    pub name: String,
    pub bgp_peers: Vec<BgpPeerConfig>,
    pub static_routes: Vec<StaticRoute>,
}

impl Vrf {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self {
            name: name.as_ref().to_string(),
            bgp_peers: vec![],
            static_routes: vec![],
        }
    }

    /// Look up the neighbor configured for `addr`.
    pub fn bgp_peer(&self, addr: Ipv4Addr) -> Option<&BgpPeerConfig> {
        self.bgp_peers.iter().find(|p| p.peer_address == addr)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RoutingProtocol {
    Bgp,
    Connected,
    Static,
}

impl Display for RoutingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Bgp => "bgp",
            Self::Connected => "connected",
            Self::Static => "static",
        };
        write!(f, "{s}")
    }
}

/// The BGP ORIGIN attribute.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OriginType {
    Igp,
    Egp,
    Incomplete,
}

impl Display for OriginType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Igp => "IGP",
            Self::Egp => "EGP",
            Self::Incomplete => "INCOMPLETE",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PolicyAction {
    Accept,
    Reject,
}

impl Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "ACCEPT"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

/// Match routes from one protocol, optionally rewrite their origin, then
/// take `action`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PolicyStatement {
    pub protocol: RoutingProtocol,
    pub set_origin: Option<OriginType>,
    pub action: PolicyAction,
}

/// A named routing policy. Statements are evaluated in order; the first
/// match decides, otherwise `default_action` applies.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoutingPolicy {
    pub name: String,
    pub statements: Vec<PolicyStatement>,
    pub default_action: PolicyAction,
}

impl RoutingPolicy {
    /// The action taken for a route learned from `protocol`.
    pub fn evaluate(
        &self,
        protocol: RoutingProtocol,
    ) -> (PolicyAction, Option<OriginType>) {
        self.statements
            .iter()
            .find(|s| s.protocol == protocol)
            .map(|s| (s.action, s.set_origin))
            .unwrap_or((self.default_action, None))
    }
}

/// The surface a front end writes a VPN into.
///
/// Map-valued extend operations replace any existing entry with the
/// same name. List-valued ones (static routes) append, so extending
/// twice with the same routes installs them twice.
pub trait DeviceCfg {
    fn hostname(&self) -> &str;

    fn vrf(&self, name: &str) -> Option<&Vrf>;

    fn interface(&self, name: &str) -> Option<&Interface>;

    fn routing_policy(&self, name: &str) -> Option<&RoutingPolicy>;

    /// Create an empty VRF named `name` unless one already exists.
    fn ensure_vrf(&mut self, name: &str);

    fn add_routing_policy(&mut self, policy: RoutingPolicy);

    fn extend_interfaces(&mut self, ifaces: BTreeMap<String, Interface>);

    fn extend_ike_phase1_proposals(
        &mut self,
        props: BTreeMap<String, IkePhase1Proposal>,
    );

    fn extend_ike_phase1_keys(&mut self, keys: BTreeMap<String, IkePhase1Key>);

    fn extend_ike_phase1_policies(
        &mut self,
        policies: BTreeMap<String, IkePhase1Policy>,
    );

    fn extend_ipsec_phase2_proposals(
        &mut self,
        props: BTreeMap<String, IpsecPhase2Proposal>,
    );

    fn extend_ipsec_phase2_policies(
        &mut self,
        policies: BTreeMap<String, IpsecPhase2Policy>,
    );

    fn extend_ipsec_peer_configs(
        &mut self,
        peers: BTreeMap<String, IpsecPeerConfig>,
    );

    /// Add BGP neighbors to `vrf`. A neighbor replaces any existing one
    /// with the same peer address.
    fn extend_bgp_peers(&mut self, vrf: &str, peers: Vec<BgpPeerConfig>);

    fn extend_static_routes(&mut self, vrf: &str, routes: Vec<StaticRoute>);
}

/// An in-memory device configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Configuration {
    hostname: String,
    vrfs: BTreeMap<String, Vrf>,
    interfaces: BTreeMap<String, Interface>,
    routing_policies: BTreeMap<String, RoutingPolicy>,
    ike_phase1_proposals: BTreeMap<String, IkePhase1Proposal>,
    ike_phase1_keys: BTreeMap<String, IkePhase1Key>,
    ike_phase1_policies: BTreeMap<String, IkePhase1Policy>,
    ipsec_phase2_proposals: BTreeMap<String, IpsecPhase2Proposal>,
    ipsec_phase2_policies: BTreeMap<String, IpsecPhase2Policy>,
    ipsec_peer_configs: BTreeMap<String, IpsecPeerConfig>,
}

impl Configuration {
    /// A configuration holding only the default VRF.
    pub fn new<S: AsRef<str>>(hostname: S) -> Self {
        let mut cfg =
            Self { hostname: hostname.as_ref().to_string(), ..Default::default() };
        cfg.ensure_vrf(DEFAULT_VRF_NAME);
        cfg
    }

    pub fn vrfs(&self) -> &BTreeMap<String, Vrf> {
        &self.vrfs
    }

    pub fn interfaces(&self) -> &BTreeMap<String, Interface> {
        &self.interfaces
    }

    pub fn routing_policies(&self) -> &BTreeMap<String, RoutingPolicy> {
        &self.routing_policies
    }

    pub fn ike_phase1_proposals(&self) -> &BTreeMap<String, IkePhase1Proposal> {
        &self.ike_phase1_proposals
    }

    pub fn ike_phase1_keys(&self) -> &BTreeMap<String, IkePhase1Key> {
        &self.ike_phase1_keys
    }

    pub fn ike_phase1_policies(&self) -> &BTreeMap<String, IkePhase1Policy> {
        &self.ike_phase1_policies
    }

    pub fn ipsec_phase2_proposals(
        &self,
    ) -> &BTreeMap<String, IpsecPhase2Proposal> {
        &self.ipsec_phase2_proposals
    }

    pub fn ipsec_phase2_policies(&self) -> &BTreeMap<String, IpsecPhase2Policy> {
        &self.ipsec_phase2_policies
    }

    pub fn ipsec_peer_configs(&self) -> &BTreeMap<String, IpsecPeerConfig> {
        &self.ipsec_peer_configs
    }

    /// Names referenced by a policy which do not resolve to a proposal
    /// on this device, as `(policy, proposal)` pairs.
    pub fn dangling_proposal_refs(&self) -> Vec<(String, String)> {
        let mut dangling = vec![];

        for (name, pol) in &self.ike_phase1_policies {
            for prop in &pol.proposals {
                if !self.ike_phase1_proposals.contains_key(prop) {
                    dangling.push((name.clone(), prop.clone()));
                }
            }
        }

        for (name, pol) in &self.ipsec_phase2_policies {
            for prop in &pol.proposals {
                if !self.ipsec_phase2_proposals.contains_key(prop) {
                    dangling.push((name.clone(), prop.clone()));
                }
            }
        }

        dangling
    }

    fn vrf_mut(&mut self, name: &str) -> &mut Vrf {
        self.vrfs.entry(name.to_string()).or_insert_with(|| Vrf::new(name))
    }
}

impl DeviceCfg for Configuration {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn vrf(&self, name: &str) -> Option<&Vrf> {
        self.vrfs.get(name)
    }

    fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    fn routing_policy(&self, name: &str) -> Option<&RoutingPolicy> {
        self.routing_policies.get(name)
    }

    fn ensure_vrf(&mut self, name: &str) {
        let _ = self.vrf_mut(name);
    }

    fn add_routing_policy(&mut self, policy: RoutingPolicy) {
        self.routing_policies.insert(policy.name.clone(), policy);
    }

    fn extend_interfaces(&mut self, ifaces: BTreeMap<String, Interface>) {
        self.interfaces.extend(ifaces);
    }

    fn extend_ike_phase1_proposals(
        &mut self,
        props: BTreeMap<String, IkePhase1Proposal>,
    ) {
        self.ike_phase1_proposals.extend(props);
    }

    fn extend_ike_phase1_keys(&mut self, keys: BTreeMap<String, IkePhase1Key>) {
        self.ike_phase1_keys.extend(keys);
    }

    fn extend_ike_phase1_policies(
        &mut self,
        policies: BTreeMap<String, IkePhase1Policy>,
    ) {
        self.ike_phase1_policies.extend(policies);
    }

    fn extend_ipsec_phase2_proposals(
        &mut self,
        props: BTreeMap<String, IpsecPhase2Proposal>,
    ) {
        self.ipsec_phase2_proposals.extend(props);
    }

    fn extend_ipsec_phase2_policies(
        &mut self,
        policies: BTreeMap<String, IpsecPhase2Policy>,
    ) {
        self.ipsec_phase2_policies.extend(policies);
    }

    fn extend_ipsec_peer_configs(
        &mut self,
        peers: BTreeMap<String, IpsecPeerConfig>,
    ) {
        self.ipsec_peer_configs.extend(peers);
    }

    fn extend_bgp_peers(&mut self, vrf: &str, peers: Vec<BgpPeerConfig>) {
        let vrf = self.vrf_mut(vrf);
        for peer in peers {
            vrf.bgp_peers.retain(|p| p.peer_address != peer.peer_address);
            vrf.bgp_peers.push(peer);
        }
    }

    fn extend_static_routes(&mut self, vrf: &str, routes: Vec<StaticRoute>) {
        self.vrf_mut(vrf).static_routes.extend(routes);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::Ipv4PrefixLen;

    fn addr(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn peer(peer: &str, local_as: u32) -> BgpPeerConfig {
        BgpPeerConfig {
            peer_address: addr(peer),
            local_ip: addr("169.254.0.1"),
            local_as: Some(local_as),
            remote_asns: vec![],
            import_policy: None,
            export_policy: None,
        }
    }

    #[test]
    fn new_has_default_vrf() {
        let cfg = Configuration::new("gw");
        assert_eq!(cfg.hostname(), "gw");
        assert!(cfg.vrf(DEFAULT_VRF_NAME).is_some());
        assert_eq!(cfg.vrfs().len(), 1);
    }

    #[test]
    fn ensure_vrf_keeps_existing() {
        let mut cfg = Configuration::new("gw");
        let route = StaticRoute::new(
            "10.0.0.0/8".parse().unwrap(),
            addr("169.254.0.2"),
        );
        cfg.extend_static_routes(DEFAULT_VRF_NAME, vec![route]);
        cfg.ensure_vrf(DEFAULT_VRF_NAME);
        assert_eq!(cfg.vrf(DEFAULT_VRF_NAME).unwrap().static_routes.len(), 1);
    }

    #[test]
    fn extend_replaces_equal_names() {
        let mut cfg = Configuration::new("gw");
        let iface = |ip: &str| Interface {
            name: "vpn-1".to_string(),
            vrf: DEFAULT_VRF_NAME.to_string(),
            address: InterfaceAddr::new(
                addr(ip),
                Ipv4PrefixLen::new(30).unwrap(),
            ),
            description: "VPN vpn-1".to_string(),
        };

        cfg.extend_interfaces(BTreeMap::from([(
            "vpn-1".to_string(),
            iface("169.254.0.1"),
        )]));
        cfg.extend_interfaces(BTreeMap::from([(
            "vpn-1".to_string(),
            iface("169.254.0.5"),
        )]));

        assert_eq!(cfg.interfaces().len(), 1);
        assert_eq!(
            cfg.interface("vpn-1").unwrap().address.ip,
            addr("169.254.0.5")
        );
    }

    #[test]
    fn bgp_peers_keyed_by_address() {
        let mut cfg = Configuration::new("gw");
        cfg.extend_bgp_peers(
            DEFAULT_VRF_NAME,
            vec![peer("169.254.0.2", 64512), peer("169.254.0.6", 64512)],
        );
        cfg.extend_bgp_peers(DEFAULT_VRF_NAME, vec![peer("169.254.0.2", 7224)]);

        let vrf = cfg.vrf(DEFAULT_VRF_NAME).unwrap();
        assert_eq!(vrf.bgp_peers.len(), 2);
        assert_eq!(
            vrf.bgp_peer(addr("169.254.0.2")).unwrap().local_as,
            Some(7224)
        );
    }

    #[test]
    fn static_routes_append() {
        let mut cfg = Configuration::new("gw");
        let route = StaticRoute::new(
            "10.0.0.0/8".parse().unwrap(),
            addr("169.254.0.2"),
        );
        cfg.extend_static_routes("tunnels", vec![route]);
        cfg.extend_static_routes("tunnels", vec![route]);

        let vrf = cfg.vrf("tunnels").unwrap();
        assert_eq!(vrf.static_routes, vec![route, route]);
        assert_eq!(route.admin_distance, STATIC_ROUTE_ADMIN_DISTANCE);
    }

    #[test]
    fn policy_first_match_wins() {
        let pol = RoutingPolicy {
            name: "export".to_string(),
            statements: vec![PolicyStatement {
                protocol: RoutingProtocol::Connected,
                set_origin: Some(OriginType::Incomplete),
                action: PolicyAction::Accept,
            }],
            default_action: PolicyAction::Reject,
        };

        assert_eq!(
            pol.evaluate(RoutingProtocol::Connected),
            (PolicyAction::Accept, Some(OriginType::Incomplete))
        );
        assert_eq!(
            pol.evaluate(RoutingProtocol::Bgp),
            (PolicyAction::Reject, None)
        );
    }

    #[test]
    fn dangling_refs_reported() {
        let mut cfg = Configuration::new("gw");
        cfg.extend_ipsec_phase2_policies(BTreeMap::from([(
            "vpn-1-1".to_string(),
            IpsecPhase2Policy {
                pfs_key_group: None,
                proposals: vec!["vpn-1-0".to_string()],
            },
        )]));

        assert_eq!(
            cfg.dangling_proposal_refs(),
            vec![("vpn-1-1".to_string(), "vpn-1-0".to_string())]
        );
    }

    #[test]
    fn serializes_to_json() {
        let cfg = Configuration::new("gw");
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
