// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Print device configurations in a human-friendly manner.
//!
//! These routines are shared by vpnadm and the integration tests.

use crate::cfg::Configuration;
use crate::cfg::DeviceCfg;
use crate::cfg::IkePhase1Policy;
use crate::cfg::IkePhase1Proposal;
use crate::cfg::IpsecPhase2Proposal;
use crate::cfg::Vrf;
use crate::warn::Warnings;
use std::fmt::Display;
use std::io::Write;
use tabwriter::TabWriter;

/// Print a [`Configuration`].
pub fn print_configuration(cfg: &Configuration) -> std::io::Result<()> {
    print_configuration_into(&mut std::io::stdout(), cfg)
}

/// Print a [`Configuration`] into a given writer.
pub fn print_configuration_into(
    writer: &mut impl Write,
    cfg: &Configuration,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "Device {}", cfg.hostname())?;
    write_hrb(&mut t)?;

    writeln!(t, "Interfaces")?;
    write_hr(&mut t)?;
    writeln!(t, "NAME\tVRF\tADDRESS\tDESCRIPTION")?;
    for iface in cfg.interfaces().values() {
        writeln!(
            t,
            "{}\t{}\t{}\t{}",
            iface.name, iface.vrf, iface.address, iface.description,
        )?;
    }
    t.flush()?;

    writeln!(t, "\nIKE Phase 1 Proposals")?;
    write_hr(&mut t)?;
    print_ike_phase1_proposal_header(&mut t)?;
    for prop in cfg.ike_phase1_proposals().values() {
        print_ike_phase1_proposal(&mut t, prop)?;
    }
    t.flush()?;

    writeln!(t, "\nIKE Phase 1 Keys")?;
    write_hr(&mut t)?;
    writeln!(t, "NAME\tTYPE\tREMOTE\tLOCAL IFACE\tHASH")?;
    for (name, key) in cfg.ike_phase1_keys() {
        writeln!(
            t,
            "{name}\t{}\t{}\t{}\t{}",
            key.key_type,
            key.remote_identity,
            key.local_interface,
            key.key_hash.as_deref().unwrap_or("-"),
        )?;
    }
    t.flush()?;

    writeln!(t, "\nIKE Phase 1 Policies")?;
    write_hr(&mut t)?;
    writeln!(t, "NAME\tREMOTE\tLOCAL IFACE\tPROPOSALS")?;
    for pol in cfg.ike_phase1_policies().values() {
        print_ike_phase1_policy(&mut t, pol)?;
    }
    t.flush()?;

    writeln!(t, "\nIPsec Phase 2 Proposals")?;
    write_hr(&mut t)?;
    writeln!(t, "NAME\tAUTH\tENCRYPTION\tPROTOCOLS\tMODE")?;
    for (name, prop) in cfg.ipsec_phase2_proposals() {
        print_ipsec_phase2_proposal(&mut t, name, prop)?;
    }
    t.flush()?;

    writeln!(t, "\nIPsec Phase 2 Policies")?;
    write_hr(&mut t)?;
    writeln!(t, "NAME\tPFS\tPROPOSALS")?;
    for (name, pol) in cfg.ipsec_phase2_policies() {
        writeln!(
            t,
            "{name}\t{}\t{}",
            opt(&pol.pfs_key_group),
            pol.proposals.len(),
        )?;
    }
    t.flush()?;

    writeln!(t, "\nIPsec Peers")?;
    write_hr(&mut t)?;
    writeln!(t, "NAME\tLOCAL\tREMOTE\tSOURCE IFACE\tTUNNEL IFACE\tIKE\tIPSEC")?;
    for (name, peer) in cfg.ipsec_peer_configs() {
        writeln!(
            t,
            "{name}\t{}\t{}\t{}\t{}\t{}\t{}",
            peer.local_address,
            peer.destination_address,
            peer.source_interface,
            peer.tunnel_interface,
            peer.ike_phase1_policy,
            peer.ipsec_policy,
        )?;
    }
    t.flush()?;

    for vrf in cfg.vrfs().values() {
        writeln!(t)?;
        print_vrf(&mut t, vrf)?;
    }

    writeln!(t)?;
    t.flush()
}

/// Print the header for the [`print_ike_phase1_proposal()`] output.
pub fn print_ike_phase1_proposal_header(
    t: &mut impl Write,
) -> std::io::Result<()> {
    writeln!(t, "NAME\tAUTH\tDH\tENCRYPTION\tHASHING\tLIFETIME")
}

/// Print an [`IkePhase1Proposal`].
pub fn print_ike_phase1_proposal(
    t: &mut impl Write,
    prop: &IkePhase1Proposal,
) -> std::io::Result<()> {
    writeln!(
        t,
        "{}\t{}\t{}\t{}\t{}\t{}",
        prop.name,
        opt(&prop.authentication_method),
        prop.diffie_hellman_group,
        join(&prop.encryption_algorithms),
        join(&prop.hashing_algorithms),
        opt(&prop.lifetime_seconds),
    )
}

/// Print an [`IkePhase1Policy`].
///
/// The first proposal shares a line with the policy; the rest each get
/// their own continuation line.
pub fn print_ike_phase1_policy(
    t: &mut impl Write,
    pol: &IkePhase1Policy,
) -> std::io::Result<()> {
    let mut props = pol.proposals.iter();
    let first = props.next().map(String::as_str).unwrap_or("-");

    writeln!(
        t,
        "{}\t{}\t{}\t{first}",
        pol.name, pol.remote_identity, pol.local_interface,
    )?;

    for prop in props {
        writeln!(t, "\t\t\t{prop}")?;
    }

    Ok(())
}

fn print_ipsec_phase2_proposal(
    t: &mut impl Write,
    name: &str,
    prop: &IpsecPhase2Proposal,
) -> std::io::Result<()> {
    writeln!(
        t,
        "{name}\t{}\t{}\t{}\t{}",
        prop.authentication_algorithm,
        prop.encryption_algorithm,
        join(&prop.protocols),
        opt(&prop.encapsulation_mode),
    )
}

/// Print a [`Vrf`] along with its BGP peers and static routes.
pub fn print_vrf(t: &mut impl Write, vrf: &Vrf) -> std::io::Result<()> {
    writeln!(t, "VRF {}", vrf.name)?;
    write_hr(t)?;

    writeln!(t, "BGP PEER\tLOCAL IP\tLOCAL AS\tREMOTE AS\tIMPORT\tEXPORT")?;
    for peer in &vrf.bgp_peers {
        writeln!(
            t,
            "{}\t{}\t{}\t{}\t{}\t{}",
            peer.peer_address,
            peer.local_ip,
            opt(&peer.local_as),
            if peer.remote_asns.is_empty() {
                "*".to_string()
            } else {
                join(&peer.remote_asns)
            },
            opt(&peer.import_policy),
            opt(&peer.export_policy),
        )?;
    }

    writeln!(t, "\nROUTE\tNEXT HOP\tDISTANCE")?;
    for route in &vrf.static_routes {
        writeln!(
            t,
            "{}\t{}\t{}",
            route.network, route.next_hop, route.admin_distance
        )?;
    }

    Ok(())
}

/// Print the warnings collected while producing a configuration.
pub fn print_warnings(warnings: &Warnings) -> std::io::Result<()> {
    print_warnings_into(&mut std::io::stdout(), warnings)
}

/// Print the warnings collected while producing a configuration into a
/// given writer.
pub fn print_warnings_into(
    writer: &mut impl Write,
    warnings: &Warnings,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "KIND\tMESSAGE")?;
    for w in warnings.iter() {
        writeln!(t, "{}\t{}", w.kind, w.msg)?;
    }
    t.flush()
}

fn join<'a, T, I>(items: I) -> String
where
    T: Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn opt<T: Display>(val: &Option<T>) -> String {
    match val {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// Output a horizontal rule in bold to the given writer.
pub fn write_hrb(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:=<70}", "=")
}

/// Output a horizontal rule to the given writer.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}
