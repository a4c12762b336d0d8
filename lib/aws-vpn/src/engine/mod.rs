// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Turning provider connection records into device configuration.

pub mod connection;
pub mod descriptor;
pub mod proposal;
pub mod synth;
pub mod tunnel;
pub mod vocab;

pub use connection::ParseCtx;
pub use connection::VpnConnection;
pub use synth::SynthCtx;
pub use synth::VpnArtifacts;
pub use tunnel::IpsecTunnel;
pub use tunnel::IpsecTunnelCfg;
pub use tunnel::Salt;
