// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use core::result;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// An IPv4 address.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Ipv4Addr {
    inner: [u8; 4],
}

impl Ipv4Addr {
    /// Mask with a prefix length which is known to be valid.
    pub fn safe_mask(self, prefix_len: Ipv4PrefixLen) -> Self {
        let n = u32::from(self) & prefix_bits(prefix_len.val());
        Self::from(n)
    }
}

/// The network bits of a `/prefix_len` mask, as a host-order `u32`.
///
/// The caller must have already bounded `prefix_len` to `0..=32`.
const fn prefix_bits(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        _ => u32::MAX << (32 - prefix_len as u32),
    }
}

impl From<Ipv4Addr> for u32 {
    fn from(ip: Ipv4Addr) -> u32 {
        u32::from_be_bytes(ip.inner)
    }
}

impl From<u32> for Ipv4Addr {
    fn from(val: u32) -> Self {
        Self { inner: val.to_be_bytes() }
    }
}

impl FromStr for Ipv4Addr {
    type Err = String;

    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let octets: Vec<u8> = val
            .split('.')
            .map(|s| s.parse().map_err(|e| format!("{e}")))
            .collect::<result::Result<Vec<u8>, _>>()?;

        if octets.len() != 4 {
            return Err(format!("malformed ip: {val}"));
        }

        Ok(Self { inner: [octets[0], octets[1], octets[2], octets[3]] })
    }
}

impl Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.inner[0], self.inner[1], self.inner[2], self.inner[3],
        )
    }
}

// There's no reason to view an Ipv4Addr as its raw array, so just
// present it in a human-friendly manner.
impl Debug for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ipv4Addr {{ inner: {self} }}")
    }
}

/// A valid IPv4 prefix length.
///
/// Deserialization goes through [`Ipv4PrefixLen::new`], so an out of
/// range length is refused there too.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, Ord, PartialOrd,
)]
#[serde(try_from = "u8")]
pub struct Ipv4PrefixLen(u8);

impl TryFrom<u8> for Ipv4PrefixLen {
    type Error = String;

    fn try_from(p: u8) -> Result<Self, Self::Error> {
        Self::new(p)
    }
}

impl Ipv4PrefixLen {
    pub const NETMASK_ALL: Self = Self(32);

    pub fn new(prefix_len: u8) -> Result<Self, String> {
        if prefix_len > 32 {
            return Err(format!("bad IPv4 prefix length: {prefix_len}"));
        }

        Ok(Self(prefix_len))
    }

    pub fn val(&self) -> u8 {
        self.0
    }
}

impl Display for Ipv4PrefixLen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An IPv4 CIDR.
///
/// The stored address is always the network address: host bits are
/// masked off on construction, deserialization included.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Ipv4CidrDeser")]
pub struct Ipv4Cidr {
    ip: Ipv4Addr,
    prefix_len: Ipv4PrefixLen,
}

/// A shadow type of [`Ipv4Cidr`] dedicated to deserialization, making
/// sure deserialized values are still sent through [`Ipv4Cidr::new`].
#[derive(Clone, Copy, Debug, Deserialize)]
struct Ipv4CidrDeser {
    ip: Ipv4Addr,
    prefix_len: Ipv4PrefixLen,
}

impl From<Ipv4CidrDeser> for Ipv4Cidr {
    fn from(raw: Ipv4CidrDeser) -> Self {
        Self::new(raw.ip, raw.prefix_len)
    }
}

impl core::cmp::Ord for Ipv4Cidr {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        if self.ip != other.ip {
            self.ip.cmp(&other.ip)
        } else {
            self.prefix_len.cmp(&other.prefix_len)
        }
    }
}

impl core::cmp::PartialOrd for Ipv4Cidr {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    /// Convert a string like "169.254.10.0/30" into an `Ipv4Cidr`.
    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let (ip_s, prefix_s) = match val.split_once('/') {
            Some(v) => v,
            None => return Err("no '/' found".to_string()),
        };

        let ip = match ip_s.parse() {
            Ok(v) => v,
            Err(e) => return Err(format!("bad IP: {e}")),
        };

        let raw = match prefix_s.parse::<u8>() {
            Ok(v) => v,
            Err(e) => {
                return Err(format!("bad prefix length: {e}"));
            }
        };

        let prefix_len = Ipv4PrefixLen::new(raw)?;
        Ok(Ipv4Cidr::new(ip, prefix_len))
    }
}

impl Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len.val())
    }
}

impl Ipv4Cidr {
    pub fn new(ip: Ipv4Addr, prefix_len: Ipv4PrefixLen) -> Self {
        let ip = ip.safe_mask(prefix_len);
        Ipv4Cidr { ip, prefix_len }
    }

    pub fn new_checked(ip: Ipv4Addr, prefix_len: u8) -> Result<Self, String> {
        let pl = Ipv4PrefixLen::new(prefix_len)?;
        Ok(Self::new(ip, pl))
    }

    /// The network address of this CIDR.
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn parts(&self) -> (Ipv4Addr, Ipv4PrefixLen) {
        (self.ip, self.prefix_len)
    }

    pub fn prefix_len(self) -> u8 {
        self.prefix_len.val()
    }

    /// The last address covered by this CIDR.
    pub fn broadcast(&self) -> Ipv4Addr {
        let host_bits = !prefix_bits(self.prefix_len());
        Ipv4Addr::from(u32::from(self.ip) | host_bits)
    }

    /// The lowest usable host address.
    ///
    /// For a `/31` or `/32` there is no network/broadcast pair to skip,
    /// so the network address itself is the first host.
    pub fn first_host(&self) -> Ipv4Addr {
        match self.prefix_len() {
            31 | 32 => self.ip,
            _ => Ipv4Addr::from(u32::from(self.ip) + 1),
        }
    }

    /// The highest usable host address.
    pub fn last_host(&self) -> Ipv4Addr {
        match self.prefix_len() {
            32 => self.ip,
            31 => self.broadcast(),
            _ => Ipv4Addr::from(u32::from(self.broadcast()) - 1),
        }
    }

    /// Split a point-to-point link block into its two ends: the first
    /// host and the last host.
    pub fn bisect(&self) -> (Ipv4Addr, Ipv4Addr) {
        (self.first_host(), self.last_host())
    }
}

/// An address assigned to an interface: unlike [`Ipv4Cidr`], the host
/// bits are kept.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct InterfaceAddr {
    pub ip: Ipv4Addr,
    pub prefix_len: Ipv4PrefixLen,
}

impl InterfaceAddr {
    pub fn new(ip: Ipv4Addr, prefix_len: Ipv4PrefixLen) -> Self {
        Self { ip, prefix_len }
    }

    /// A `/32` host address.
    pub fn host(ip: Ipv4Addr) -> Self {
        Self { ip, prefix_len: Ipv4PrefixLen::NETMASK_ALL }
    }
}

impl Display for InterfaceAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bad_prefix_len() {
        let msg = "bad IPv4 prefix length: 33".to_string();
        assert_eq!(Ipv4PrefixLen::new(33), Err(msg));
    }

    #[test]
    fn bad_cidr() {
        let msg = "bad IPv4 prefix length: 33".to_string();
        assert_eq!("192.168.2.9/33".parse::<Ipv4Cidr>(), Err(msg));
        assert!("192.168.2.9".parse::<Ipv4Cidr>().is_err());
        assert!("192.168.2/24".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn good_cidr() {
        let pl = Ipv4PrefixLen::new(24).unwrap();
        let ip = "192.168.2.0".parse().unwrap();
        assert_eq!(
            Ipv4Cidr::new(ip, pl),
            Ipv4Cidr {
                ip: Ipv4Addr { inner: [192, 168, 2, 0] },
                prefix_len: pl,
            }
        );

        assert_eq!(
            "192.168.2.9/24".parse(),
            Ok(Ipv4Cidr {
                ip: Ipv4Addr { inner: [192, 168, 2, 0] },
                prefix_len: pl,
            })
        );

        assert_eq!(
            "192.168.2.9/24".parse::<Ipv4Cidr>().unwrap().to_string(),
            "192.168.2.0/24".to_string()
        );
    }

    #[test]
    fn ipv4_addr_bad() {
        assert!("192.168.33.1O".parse::<Ipv4Addr>().is_err());
        assert!("192.168.33.256".parse::<Ipv4Addr>().is_err());
        assert!("192.168.33".parse::<Ipv4Addr>().is_err());
    }

    #[test]
    fn bisect_link_block() {
        let cidr: Ipv4Cidr = "10.0.0.0/30".parse().unwrap();
        assert_eq!(
            cidr.bisect(),
            ("10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap())
        );

        let cidr: Ipv4Cidr = "169.254.44.88/30".parse().unwrap();
        assert_eq!(cidr.first_host(), "169.254.44.89".parse().unwrap());
        assert_eq!(cidr.last_host(), "169.254.44.90".parse().unwrap());
        assert_eq!(cidr.broadcast(), "169.254.44.91".parse().unwrap());
    }

    #[test]
    fn bisect_degenerate_blocks() {
        let p2p: Ipv4Cidr = "10.1.1.4/31".parse().unwrap();
        assert_eq!(
            p2p.bisect(),
            ("10.1.1.4".parse().unwrap(), "10.1.1.5".parse().unwrap())
        );

        let host: Ipv4Cidr = "10.1.1.9/32".parse().unwrap();
        let ip = "10.1.1.9".parse().unwrap();
        assert_eq!(host.bisect(), (ip, ip));
    }

    #[test]
    fn interface_addr_keeps_host_bits() {
        let addr = InterfaceAddr::new(
            "169.254.10.1".parse().unwrap(),
            Ipv4PrefixLen::new(30).unwrap(),
        );
        assert_eq!(addr.to_string(), "169.254.10.1/30");
        assert_eq!(
            InterfaceAddr::host("52.1.1.1".parse().unwrap()).to_string(),
            "52.1.1.1/32"
        );
    }

    #[test]
    fn deserialized_cidr_is_masked() {
        let json = r#"{
            "ip": {"inner": [192, 168, 2, 9]},
            "prefix_len": 24
        }"#;
        let cidr: Ipv4Cidr = serde_json::from_str(json).unwrap();
        assert_eq!(cidr, "192.168.2.0/24".parse().unwrap());
        assert_eq!(cidr.ip(), "192.168.2.0".parse().unwrap());

        let back = serde_json::to_string(&cidr).unwrap();
        assert_eq!(serde_json::from_str::<Ipv4Cidr>(&back).unwrap(), cidr);
    }

    #[test]
    fn deserialized_prefix_len_is_checked() {
        assert!(serde_json::from_str::<Ipv4PrefixLen>("33").is_err());
        assert_eq!(
            serde_json::from_str::<Ipv4PrefixLen>("30").unwrap(),
            Ipv4PrefixLen::new(30).unwrap()
        );

        let json = r#"{"ip": {"inner": [10, 0, 0, 0]}, "prefix_len": 40}"#;
        assert!(serde_json::from_str::<Ipv4Cidr>(json).is_err());
    }
}
