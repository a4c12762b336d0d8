// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Value types shared by the IPsec configuration model and the
//! provider-specific front ends which produce it.
//!
//! Nothing in here allocates device state: these are addresses,
//! prefixes, and the closed algorithm vocabulary that negotiation
//! proposals are built from.

#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub mod algo;
pub mod ip;

pub use algo::*;
pub use ip::*;

/// The name used for the default routing instance of a device.
pub const DEFAULT_VRF_NAME: &str = "default";
