//! Client subnet vantage points.
//!
//! Each probe declares one of these prefixes as the querying client's
//! network, so a single machine can observe how a domain resolves for
//! clients in different regions and ISPs.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

/// An IPv4 network prefix in CIDR notation, used as a stand-in client
/// location for probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubnetParseError {
    #[error("expected CIDR notation (e.g. 198.51.100.0/24), got '{0}'")]
    Format(String),
    #[error("invalid network address '{0}'")]
    Address(String),
    #[error("invalid prefix length '{0}' (expected 0-32)")]
    PrefixLength(String),
}

impl Subnet {
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            network,
            prefix_len,
        }
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// The octets covering the prefix, with host bits zeroed.
    ///
    /// This is the ADDRESS field of a CLIENT-SUBNET option: a /24 yields
    /// three octets, a /20 yields three with the low bits of the last
    /// one masked off.
    pub fn prefix_octets(&self) -> Vec<u8> {
        let len = (self.prefix_len as usize).div_ceil(8);
        let mut octets = self.network.octets()[..len].to_vec();

        let partial = self.prefix_len % 8;
        if partial != 0 {
            if let Some(last) = octets.last_mut() {
                *last &= 0xFF << (8 - partial);
            }
        }

        octets
    }
}

impl FromStr for Subnet {
    type Err = SubnetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| SubnetParseError::Format(s.to_string()))?;

        let network: Ipv4Addr = addr
            .parse()
            .map_err(|_| SubnetParseError::Address(addr.to_string()))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| SubnetParseError::PrefixLength(prefix.to_string()))?;
        if prefix_len > 32 {
            return Err(SubnetParseError::PrefixLength(prefix.to_string()));
        }

        Ok(Self {
            network,
            prefix_len,
        })
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// The default vantage list: geographically and ISP-diverse prefixes.
pub fn default_subnets() -> Vec<Subnet> {
    [
        (Ipv4Addr::new(98, 246, 112, 0), 24), // Comcast
        (Ipv4Addr::new(42, 99, 18, 0), 24),   // China Telecom
        (Ipv4Addr::new(139, 47, 240, 0), 24), // Vodafone
        (Ipv4Addr::new(47, 29, 100, 0), 24),  // JIO
    ]
    .into_iter()
    .map(|(network, prefix_len)| Subnet::new(network, prefix_len))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cidr_notation() {
        let subnet: Subnet = "98.246.112.0/24".parse().unwrap();

        assert_eq!(subnet, Subnet::new(Ipv4Addr::new(98, 246, 112, 0), 24));
    }

    #[test]
    fn display_round_trips() {
        let subnet: Subnet = "139.47.240.0/24".parse().unwrap();

        assert_eq!(subnet.to_string(), "139.47.240.0/24");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "10.0.0.0".parse::<Subnet>().unwrap_err();

        assert_eq!(err, SubnetParseError::Format("10.0.0.0".to_string()));
    }

    #[test]
    fn rejects_bad_address() {
        let err = "10.0.0/24".parse::<Subnet>().unwrap_err();

        assert_eq!(err, SubnetParseError::Address("10.0.0".to_string()));
    }

    #[test]
    fn rejects_prefix_over_32() {
        let err = "10.0.0.0/33".parse::<Subnet>().unwrap_err();

        assert_eq!(err, SubnetParseError::PrefixLength("33".to_string()));
    }

    #[test]
    fn prefix_octets_drops_host_octets() {
        let subnet: Subnet = "10.11.12.13/24".parse().unwrap();

        assert_eq!(subnet.prefix_octets(), vec![10, 11, 12]);
    }

    #[test]
    fn prefix_octets_masks_partial_octet() {
        let subnet: Subnet = "172.16.255.1/20".parse().unwrap();

        assert_eq!(subnet.prefix_octets(), vec![172, 16, 240]);
    }

    #[test]
    fn prefix_octets_empty_for_zero_prefix() {
        let subnet: Subnet = "0.0.0.0/0".parse().unwrap();

        assert!(subnet.prefix_octets().is_empty());
    }

    #[test]
    fn default_list_has_four_vantage_points() {
        let subnets = default_subnets();

        assert_eq!(subnets.len(), 4);
        assert_eq!(subnets[0].to_string(), "98.246.112.0/24");
        assert_eq!(subnets[3].to_string(), "47.29.100.0/24");
    }
}
