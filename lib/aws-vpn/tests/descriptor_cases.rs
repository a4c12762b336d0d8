// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Customer gateway configuration cases.
//!
//! These tests capture customer gateway configuration documents, both
//! as the provider hands them out and hand-damaged ones, and check what
//! parsing and synthesis make of them.

use ipsec_test_utils::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
enum Expect {
    /// The connection parses and applies cleanly.
    Applied {
        is_bgp: bool,
        tunnels: usize,
        ike_phase1_proposals: usize,
        bgp_peers: usize,
        static_routes: usize,
    },

    /// Parsing fails with an error whose message contains this text.
    ParseError(String),
}

#[derive(Debug, Clone, Deserialize)]
struct Case {
    description: String,
    document: String,
    tunnel_options: usize,
    #[serde(default)]
    routes: Vec<String>,
    expect: Expect,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct Label {
    family: String,
    name: String,
}

fn load_cases(root_dir: &str) -> Vec<(Label, Case)> {
    let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/resources");

    let mut tests = vec![];
    let my_test_dir = base.join(root_dir);
    for entry in std::fs::read_dir(my_test_dir)
        .unwrap_or_else(|e| panic!("failed to find directory {root_dir}: {e}"))
    {
        let entry = entry.unwrap_or_else(|e| {
            panic!("failed to enumerate child of {root_dir}: {e}")
        });

        let path_owned = entry.path();
        let path = path_owned.as_path();
        if path.extension() != Some("ron".as_ref()) {
            continue;
        }

        let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
            panic!("failed to read contents of {}: {e}", path.display())
        });

        let cases: HashMap<String, Case> = ron::from_str(&contents)
            .unwrap_or_else(|e| {
                panic!("failed to parse {}: {e}", path.display())
            });

        let family =
            path.file_stem().and_then(OsStr::to_str).unwrap_or("<unlabelled>");

        tests.extend(
            cases
                .into_iter()
                .map(|(name, v)| (Label { family: family.into(), name }, v)),
        );
    }

    tests.sort_by(|a, b| {
        (&a.0.family, &a.0.name).cmp(&(&b.0.family, &b.0.name))
    });
    tests
}

fn read_document(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/data")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!("could not read document {}: {e}", path.display())
    })
}

fn desc_for(label: &Label, case: &Case) -> VpnConnectionDesc {
    let id = format!("vpn-{}", label.name.replace('_', "-"));
    VpnConnectionDesc {
        vpn_connection_id: Some(id),
        customer_gateway_id: Some("cgw-0123".to_string()),
        transit_gateway_id: Some("tgw-0123".to_string()),
        vpn_gateway_id: None,
        customer_gateway_configuration: Some(read_document(&case.document)),
        routes: Some(
            case.routes
                .iter()
                .map(|r| VpnRoute { destination_cidr_block: r.clone() })
                .collect(),
        ),
        vgw_telemetry: Some(vec![]),
        options: Some(Options {
            tunnel_options: vec![
                narrow_tunnel_options();
                case.tunnel_options
            ],
            static_routes_only: !case.routes.is_empty(),
        }),
    }
}

fn run_case(label: &Label, case: &Case) {
    let Label { family, name } = label;
    let res = VpnConnection::parse(desc_for(label, case), &parse_ctx());

    match (&case.expect, res) {
        (
            Expect::Applied {
                is_bgp,
                tunnels,
                ike_phase1_proposals,
                bgp_peers,
                static_routes,
            },
            Ok(conn),
        ) => {
            assert_eq!(conn.is_bgp(), *is_bgp, "{family}/{name}: is_bgp");
            assert_eq!(conn.tunnels().len(), *tunnels, "{family}/{name}");

            let mut cfg = gateway();
            let mut warnings = Warnings::default();
            let applied = conn
                .apply_to_gateway(&mut cfg, &synth_ctx(), &mut warnings)
                .unwrap_or_else(|e| panic!("{family}/{name}: {e}"));
            assert!(applied, "{family}/{name}: not applied");

            let vrf = cfg.vrf(TUNNEL_VRF).unwrap();
            assert_eq!(
                cfg.ike_phase1_proposals().len(),
                *ike_phase1_proposals,
                "{family}/{name}: phase 1 proposals"
            );
            assert_eq!(vrf.bgp_peers.len(), *bgp_peers, "{family}/{name}");
            assert_eq!(
                vrf.static_routes.len(),
                *static_routes,
                "{family}/{name}"
            );
        }

        (Expect::ParseError(needle), Err(e)) => {
            let msg = e.to_string();
            assert!(
                msg.contains(needle.as_str()),
                "{family}/{name}: expected error containing {needle:?}, \
                 got {msg:?}"
            );
        }

        (expect, res) => panic!(
            "{family}/{name} ({}): expected {expect:?}, got {res:?}",
            case.description
        ),
    }
}

#[test]
fn customer_gateway_documents() {
    let cases = load_cases("cgw");
    assert!(!cases.is_empty());
    for (label, case) in &cases {
        run_case(label, case);
    }
}
