// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! AWS Site-to-Site VPN connections as IPsec device configuration.
//!
//! A VPN connection, as reported by the provider, is parsed into a
//! [`engine::VpnConnection`]: one [`engine::IpsecTunnel`] per tunnel
//! in its customer gateway configuration. Each tunnel is then expanded
//! into every IKE Phase 1 and IPsec Phase 2 proposal its options
//! permit, the policies and peer configs which reference them, and the
//! interfaces, BGP peers and static routes the tunnel needs on the
//! gateway.

#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub mod api;
pub mod engine;
mod error;

pub use error::Error;

pub type Result<T> = core::result::Result<T, Error>;
