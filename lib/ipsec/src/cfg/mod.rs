// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Negotiation entities and the device they are merged into.
//!
//! Cross references between entities are by name: a policy lists the
//! names of its proposals, a peer config names its policies and
//! interfaces. Names are only meaningful relative to the maps of a
//! single device configuration.

pub mod device;
pub mod ike;
pub mod ipsec;

pub use device::*;
pub use ike::*;
pub use ipsec::*;
