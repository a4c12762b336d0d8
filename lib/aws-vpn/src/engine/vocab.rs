// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Provider tokens to algorithm values.
//!
//! Every converter is strict except the encapsulation mode one: an
//! unknown mode leaves the field unset and raises a red flag instead of
//! failing the connection.

use ipsec::api::IpsecEncapsulationMode;
use ipsec::api::Vocabulary;
use ipsec::warn::Warnings;

pub use ipsec::api::UnknownToken;

/// Convert every token in `tokens`, failing on the first unknown one.
pub fn convert_all<V, S>(tokens: &[S]) -> Result<Vec<V>, UnknownToken>
where
    V: Vocabulary,
    S: AsRef<str>,
{
    tokens.iter().map(|t| V::from_token(t.as_ref())).collect()
}

pub fn encapsulation_mode(
    token: &str,
    warnings: &mut Warnings,
) -> Option<IpsecEncapsulationMode> {
    match IpsecEncapsulationMode::from_token(token) {
        Ok(mode) => Some(mode),
        Err(_) => {
            warnings.red_flag(format!(
                "No IPsec encapsulation mode for string '{token}'"
            ));
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ipsec::api::DiffieHellmanGroup;
    use ipsec::api::TokenKind;

    #[test]
    fn unknown_mode_is_a_warning() {
        let mut w = Warnings::default();
        assert_eq!(
            encapsulation_mode("tunnel", &mut w),
            Some(IpsecEncapsulationMode::Tunnel)
        );
        assert!(w.is_empty());

        assert_eq!(encapsulation_mode("gre", &mut w), None);
        assert_eq!(w.len(), 1);
        assert!(w.red_flags().all(|f| f.msg.contains("'gre'")));
    }

    #[test]
    fn convert_all_stops_on_unknown() {
        let groups: Vec<DiffieHellmanGroup> =
            convert_all(&["2", "14"]).unwrap();
        assert_eq!(
            groups,
            vec![DiffieHellmanGroup::Group2, DiffieHellmanGroup::Group14]
        );

        let err = convert_all::<DiffieHellmanGroup, _>(&["2", "1", "3"])
            .unwrap_err();
        assert_eq!(err.kind, TokenKind::DiffieHellmanGroup);
        assert_eq!(err.token, "1");
    }
}
