// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use slog::Drain;
use slog::FilterLevel;
use slog::Logger;
use slog::o;

use aws_vpn::engine::ParseCtx;
use aws_vpn::engine::VpnConnection;
use ipsec::print::print_configuration;
use ipsec::print::print_warnings;
use vpnadm::GatewayCfg;
use vpnadm::print_connections_into;
use vpnadm::print_outcomes_into;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Format {
    #[default]
    Table,
    Json,
}

/// Synthesize gateway IPsec configuration from provider VPN connections
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Log more; repeat for more still. RUST_LOG overrides per module.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse connection records and list what they describe.
    List {
        /// A DescribeVpnConnections JSON document.
        connections: PathBuf,
    },

    /// Attach connection records to a gateway and print the result.
    Synth {
        /// The gateway description, in TOML.
        #[arg(short, long)]
        gateway: PathBuf,

        /// A DescribeVpnConnections JSON document.
        connections: PathBuf,

        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
}

fn logger(verbose: u8) -> Logger {
    let level = match verbose {
        0 => FilterLevel::Warning,
        1 => FilterLevel::Info,
        2 => FilterLevel::Debug,
        _ => FilterLevel::Trace,
    };

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let mut builder =
        slog_envlogger::LogBuilder::new(drain).filter(None, level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder = builder.parse(&filters);
    }
    let drain = slog_async::Async::new(builder.build()).build().fuse();
    Logger::root(drain, o!("component" => "vpnadm"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log = logger(cli.verbose);

    match cli.cmd {
        Command::List { connections } => {
            let json = vpnadm::read(&connections)?;
            let parsed = VpnConnection::parse_json(&json, &ParseCtx::default())
                .with_context(|| {
                    format!("failed to parse {}", connections.display())
                })?;
            let mut conns = vec![];
            for res in parsed {
                match res {
                    Ok(c) => conns.push(c),
                    Err(e) => eprintln!("skipping connection: {e}"),
                }
            }
            print_connections_into(&mut io::stdout(), &conns)?;
        }

        Command::Synth { gateway, connections, format } => {
            let gw = GatewayCfg::load(&gateway)?;
            let json = vpnadm::read(&connections)?;
            let report = vpnadm::run(&gw, &json, &log).with_context(|| {
                format!("failed to process {}", connections.display())
            })?;

            match format {
                Format::Table => {
                    print_configuration(&report.configuration)?;
                    println!();
                    print_outcomes_into(&mut io::stdout(), &report)?;
                    if !report.warnings.is_empty() {
                        println!();
                        print_warnings(&report.warnings)?;
                    }
                }

                Format::Json => {
                    let out = serde_json::json!({
                        "configuration": report.configuration,
                        "outcomes": report.outcomes,
                        "warnings":
                            report.warnings.iter().collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
    }

    Ok(())
}
