//! IPv4 to IPv6 address pairing driven by the `v4_v6_map` configuration.
use ipnet::Ipv4Net;
use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};

/// One `{cidr, prefix}` entry: addresses in `cidr` pair with addresses under `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct V4V6Mapping {
    pub cidr: Ipv4Net,
    pub prefix: Ipv6Addr,
}

impl V4V6Mapping {
    /// Host part of `address` added onto the IPv6 prefix.
    pub fn translate(&self, address: Ipv4Addr) -> Option<Ipv6Addr> {
        if !self.cidr.contains(&address) {
            return None;
        }
        let host = u32::from(address) - u32::from(self.cidr.network());
        u128::from(self.prefix)
            .checked_add(u128::from(host))
            .map(Ipv6Addr::from)
    }
}

/// First matching entry wins.
pub fn map_v4_to_v6(address: Ipv4Addr, entries: &[V4V6Mapping]) -> Option<Ipv6Addr> {
    entries.iter().find_map(|entry| entry.translate(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cidr: &str, prefix: &str) -> V4V6Mapping {
        V4V6Mapping {
            cidr: cidr.parse().unwrap(),
            prefix: prefix.parse().unwrap(),
        }
    }

    #[test]
    fn translates_host_part() {
        let map = [entry("192.0.2.0/24", "2001:db8:0:2::")];
        let v6 = map_v4_to_v6("192.0.2.17".parse().unwrap(), &map);
        assert_eq!(v6, Some("2001:db8:0:2::11".parse().unwrap()));
    }

    #[test]
    fn wider_networks_keep_upper_octets() {
        let map = [entry("198.51.100.0/22", "2001:db8::")];
        let v6 = map_v4_to_v6("198.51.101.5".parse().unwrap(), &map);
        assert_eq!(v6, Some("2001:db8::105".parse().unwrap()));
    }

    #[test]
    fn first_match_wins() {
        let map = [
            entry("10.0.0.0/8", "2001:db8:a::"),
            entry("10.1.0.0/16", "2001:db8:b::"),
        ];
        let v6 = map_v4_to_v6("10.1.0.1".parse().unwrap(), &map);
        assert_eq!(v6, Some("2001:db8:a::1:1".parse().unwrap()));
    }

    #[test]
    fn unmapped_address_is_none() {
        let map = [entry("192.0.2.0/24", "2001:db8::")];
        assert_eq!(map_v4_to_v6("203.0.113.1".parse().unwrap(), &map), None);
        assert_eq!(map_v4_to_v6("192.0.2.1".parse().unwrap(), &[]), None);
    }

    #[test]
    fn deserializes_from_config_json() {
        let parsed: V4V6Mapping =
            serde_json::from_str(r#"{"cidr": "192.0.2.0/24", "prefix": "2001:db8::"}"#).unwrap();
        assert_eq!(parsed, entry("192.0.2.0/24", "2001:db8::"));
    }
}
