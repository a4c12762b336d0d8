// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The IPsec side of a device configuration.
//!
//! This crate defines what a front end produces: IKE Phase 1 and IPsec
//! Phase 2 proposals, keys, policies and peer configurations, plus the
//! handful of device objects a VPN needs to hang off of (interfaces,
//! VRFs, BGP peers, static routes). The device itself is reached
//! through [`cfg::DeviceCfg`]; [`cfg::Configuration`] is the in-memory
//! implementation.

#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub mod api;
pub mod cfg;
#[cfg(any(feature = "std", test))]
pub mod print;
pub mod warn;
