// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use ipsec::api::UnknownToken;
use thiserror::Error;

/// Used in place of a connection id when the descriptor lacks one.
pub(crate) const UNKNOWN_CONN: &str = "<unknown>";

/// Errors which abort the processing of a single VPN connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The customer gateway configuration is not well-formed XML, or it
    /// carries a document type declaration.
    #[error(
        "could not parse XML for CustomerGatewayConfiguration for VPN \
         connection {conn}: {source}"
    )]
    Xml {
        conn: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("VPN connection {conn}: missing required field {field}")]
    MissingField { conn: String, field: &'static str },

    #[error(
        "VPN connection {conn}: exactly one of TransitGatewayId and \
         VpnGatewayId must be set"
    )]
    GatewayConflict { conn: String },

    #[error("VPN connection {conn}: no {path} element")]
    MissingElement { conn: String, path: String },

    #[error("VPN connection {conn}: bad {what} \"{val}\": {msg}")]
    BadValue { conn: String, what: &'static str, val: String, msg: String },

    #[error(transparent)]
    UnknownToken(#[from] UnknownToken),

    #[error("Index {index} is out of bounds for length {len}")]
    TunnelIndexOutOfBounds { index: usize, len: usize },

    #[error("{options} TunnelOptions entries for {tunnels} IPsec tunnels")]
    TunnelCountMismatch { tunnels: usize, options: usize },

    /// The connection descriptor itself is not valid JSON.
    #[error("malformed VPN connection descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn missing_field(conn: Option<&str>, field: &'static str) -> Self {
        Self::MissingField {
            conn: conn.unwrap_or(UNKNOWN_CONN).to_string(),
            field,
        }
    }

    pub(crate) fn bad_value<V: ToString, M: ToString>(
        conn: &str,
        what: &'static str,
        val: V,
        msg: M,
    ) -> Self {
        Self::BadValue {
            conn: conn.to_string(),
            what,
            val: val.to_string(),
            msg: msg.to_string(),
        }
    }
}
