// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Gateway VPN administration library.
//!
//! `vpnadm` reads a gateway description from TOML and a set of provider
//! VPN connection records from JSON, then attaches every connection it
//! can to the gateway.

use aws_vpn::engine::ParseCtx;
use aws_vpn::engine::Salt;
use aws_vpn::engine::SynthCtx;
use aws_vpn::engine::VpnConnection;
use aws_vpn::engine::synth;
use ipsec::cfg::Configuration;
use ipsec::cfg::DeviceCfg;
use ipsec::warn::Warnings;
use serde::Deserialize;
use serde::Serialize;
use slog::Logger;
use slog::error;
use slog::info;
use slog::o;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tabwriter::TabWriter;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad gateway config: {0}")]
    GatewayCfg(#[from] toml::de::Error),

    #[error(transparent)]
    Vpn(#[from] aws_vpn::Error),
}

fn default_true() -> bool {
    true
}

/// The gateway a set of VPN connections is attached to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GatewayCfg {
    pub hostname: String,

    /// The VRF tunnel interfaces, BGP peers and static routes land in.
    pub tunnel_vrf: String,

    /// Create the underlay VRF and backbone export policy before
    /// attaching connections.
    #[serde(default = "default_true")]
    pub init_infrastructure: bool,

    /// Additional VRFs present on the gateway.
    #[serde(default)]
    pub vrfs: Vec<String>,

    #[serde(default)]
    pub import_policy: Option<String>,

    #[serde(default)]
    pub export_policy: Option<String>,

    /// Salt for pre-shared key digests. A random per-process salt is
    /// used when unset.
    #[serde(default)]
    pub salt: Option<String>,
}

impl GatewayCfg {
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_toml(&read(path)?)
    }

    /// The device configuration connections are merged into.
    pub fn configuration(&self) -> Configuration {
        let mut cfg = Configuration::new(&self.hostname);
        if self.init_infrastructure {
            synth::init_vpn_infrastructure(&mut cfg);
        }
        cfg.ensure_vrf(&self.tunnel_vrf);
        for vrf in &self.vrfs {
            cfg.ensure_vrf(vrf);
        }
        cfg
    }

    pub fn parse_ctx(&self) -> ParseCtx {
        match &self.salt {
            Some(s) => ParseCtx::new(Salt::fixed(s.as_str())),
            None => ParseCtx::default(),
        }
    }

    pub fn synth_ctx(&self) -> SynthCtx {
        SynthCtx::new(&self.tunnel_vrf).with_policies(
            self.import_policy.clone(),
            self.export_policy.clone(),
        )
    }
}

pub fn read<P: AsRef<Path>>(path: P) -> Result<String, Error> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map_err(|source| Error::Read { path: path.to_path_buf(), source })
}

/// What became of each connection of a run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Outcome {
    Applied,

    /// The gateway lacks a VRF the connection needs, see the warnings.
    Skipped,

    Failed(String),
}

#[derive(Debug)]
pub struct Report {
    pub configuration: Configuration,
    pub outcomes: Vec<(String, Outcome)>,
    pub warnings: Warnings,
}

impl Report {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == Outcome::Applied).count()
    }
}

/// Parse the connection records in `json` and attach each one to the
/// gateway described by `gw`.
///
/// A connection that fails to parse or synthesize is reported and
/// skipped; only a malformed JSON document fails the run.
pub fn run(
    gw: &GatewayCfg,
    json: &str,
    log: &Logger,
) -> Result<Report, Error> {
    let log = log.new(o!("gateway" => gw.hostname.clone()));
    let mut cfg = gw.configuration();
    let mut warnings = Warnings::new(&log);
    let pctx = gw.parse_ctx();
    let sctx = gw.synth_ctx();
    let mut outcomes = vec![];

    let conns = VpnConnection::parse_json(json, &pctx)?;
    for (i, res) in conns.into_iter().enumerate() {
        let conn = match res {
            Ok(conn) => conn,
            Err(e) => {
                error!(log, "failed to parse connection";
                    "index" => i,
                    "err" => %e,
                );
                let outcome = Outcome::Failed(e.to_string());
                outcomes.push((format!("#{i}"), outcome));
                continue;
            }
        };

        let id = conn.id().to_string();
        let res = conn.apply_to_gateway(&mut cfg, &sctx, &mut warnings);
        let outcome = match res {
            Ok(true) => {
                info!(log, "applied connection";
                    "conn" => &id,
                    "tunnels" => conn.tunnels().len(),
                    "bgp" => conn.is_bgp(),
                );
                Outcome::Applied
            }
            Ok(false) => Outcome::Skipped,
            Err(e) => {
                error!(log, "failed to synthesize connection";
                    "conn" => &id,
                    "err" => %e,
                );
                Outcome::Failed(e.to_string())
            }
        };
        outcomes.push((id, outcome));
    }

    Ok(Report { configuration: cfg, outcomes, warnings })
}

/// Print a summary of parsed connections.
pub fn print_connections_into(
    writer: &mut impl Write,
    conns: &[VpnConnection],
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "CONNECTION\tGATEWAY\tTYPE\tROUTING\tTUNNELS\tROUTES")?;
    for c in conns {
        writeln!(
            t,
            "{}\t{}\t{}\t{}\t{}\t{}",
            c.id(),
            c.gateway_id(),
            c.gateway_type(),
            if c.is_bgp() { "BGP" } else { "STATIC" },
            c.tunnels().len(),
            c.routes().len(),
        )?;
    }
    t.flush()
}

pub fn print_outcomes_into(
    writer: &mut impl Write,
    report: &Report,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "CONNECTION\tOUTCOME")?;
    for (id, outcome) in &report.outcomes {
        match outcome {
            Outcome::Applied => writeln!(t, "{id}\tapplied")?,
            Outcome::Skipped => writeln!(t, "{id}\tskipped")?,
            Outcome::Failed(e) => writeln!(t, "{id}\tfailed: {e}")?,
        }
    }
    t.flush()
}
