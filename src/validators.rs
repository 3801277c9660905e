//! Informational checks on parsed endpoints
//!
//! Parsing accepts anything the grammar allows, including expressions that
//! can never match (`20:10`) or addresses that are usually a mistake in a
//! rule (`0.0.0.0/0` negated). The functions here spot those cases and return
//! a warning message. They never block a rule on their own; the checker
//! decides what to do with the warning.

use std::net::IpAddr;

use crate::core::address::NetworkAddress;
use crate::core::port::{PortOperator, PortSpec};

/// Sanitizes a rule label for display and logs.
///
/// Keeps ASCII letters, digits, space and `-_.:`, and cuts the result at 64
/// characters.
///
/// # Examples
///
/// ```
/// use pfrule::validators::sanitize_label;
///
/// assert_eq!(sanitize_label("Allow SSH"), "Allow SSH");
/// assert_eq!(sanitize_label("bad\n\"label\""), "badlabel");
/// ```
pub fn sanitize_label(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | ':'))
        .take(64)
        .collect()
}

/// Returns `true` for a two-port expression whose first port is above the
/// second.
pub fn is_inverted_range(spec: &PortSpec) -> bool {
    matches!(spec.ports().as_slice(), [first, second] if first > second)
}

/// Checks a port expression for selections that are empty or suspicious.
pub fn check_port_spec(spec: &PortSpec) -> Option<String> {
    let ports = spec.ports();

    match (spec.operator(), ports.as_slice()) {
        (_, [first, second]) if first > second => Some(format!(
            "Range {spec} is inverted (start {first} is above end {second})"
        )),
        (PortOperator::RangeExclusive, [first, second]) if second - first < 2 => Some(format!(
            "No port lies strictly between {first} and {second}"
        )),
        (PortOperator::RangeExcept, [0, 65535]) => {
            Some("Range 0<>65535 excludes every port".to_string())
        }
        (PortOperator::LessThan, [0]) => Some("No port is below 0".to_string()),
        (PortOperator::GreaterThan, [65535]) => Some("No port is above 65535".to_string()),
        (PortOperator::Equal, [0]) => Some("Port 0 is reserved and never used".to_string()),
        _ => None,
    }
}

/// Checks whether an address targets a reserved range.
///
/// Prefix 0 networks are reported first, since they match every address
/// (or none, when negated).
pub fn check_reserved_address(addr: &NetworkAddress) -> Option<String> {
    if addr.prefix() == 0 {
        return Some(if addr.is_negated() {
            format!("{addr} matches no {} address", addr.family())
        } else {
            format!("{addr} matches every {} address", addr.family())
        });
    }

    match addr.address() {
        IpAddr::V4(ipv4) => {
            if ipv4.is_private() {
                Some("Private range (RFC 1918)".to_string())
            } else if ipv4.is_loopback() {
                Some("Loopback range (127.0.0.0/8)".to_string())
            } else if ipv4.is_link_local() {
                Some("Link-local range (169.254.0.0/16)".to_string())
            } else if ipv4.is_unspecified() {
                Some("Unspecified address 0.0.0.0".to_string())
            } else if ipv4.is_broadcast() {
                Some("Broadcast address 255.255.255.255".to_string())
            } else {
                None
            }
        }
        IpAddr::V6(ipv6) => {
            let first = ipv6.segments()[0];
            if ipv6.is_loopback() {
                Some("IPv6 loopback (::1)".to_string())
            } else if ipv6.is_unspecified() {
                Some("Unspecified IPv6 address (::)".to_string())
            } else if first & 0xffc0 == 0xfe80 {
                Some("IPv6 link-local (fe80::/10)".to_string())
            } else if first & 0xfe00 == 0xfc00 {
                Some("IPv6 unique local (fc00::/7)".to_string())
            } else if ipv6.to_ipv4_mapped().is_some() {
                Some("IPv4-mapped IPv6 address (::ffff:0:0/96)".to_string())
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::parse_address;
    use crate::core::test_helpers::{addr, port};

    #[test]
    fn test_sanitize_label_normal() {
        assert_eq!(sanitize_label("Allow SSH"), "Allow SSH");
        assert_eq!(sanitize_label("lan:web-1_a.b"), "lan:web-1_a.b");
    }

    #[test]
    fn test_sanitize_label_strips_specials() {
        assert_eq!(sanitize_label("a\nb\tc\0d"), "abcd");
        assert_eq!(sanitize_label("x$`|&;'\"y"), "xy");
        assert_eq!(sanitize_label("caf\u{e9}"), "caf");
    }

    #[test]
    fn test_sanitize_label_length_limit() {
        assert_eq!(sanitize_label(&"a".repeat(100)).len(), 64);
    }

    #[test]
    fn test_inverted_range() {
        assert!(is_inverted_range(&port("20:10")));
        assert!(is_inverted_range(&port("20<>10")));
        assert!(!is_inverted_range(&port("10:20")));
        assert!(!is_inverted_range(&port("10:10")));
        assert!(!is_inverted_range(&port("80")));
        assert!(!is_inverted_range(&port("")));
    }

    #[test]
    fn test_check_port_spec_inverted() {
        let warning = check_port_spec(&port("1024:1")).unwrap();
        assert!(warning.contains("inverted"));
        assert!(warning.contains("1024:1"));
    }

    #[test]
    fn test_check_port_spec_empty_exclusive() {
        assert!(check_port_spec(&port("10><11")).unwrap().contains("strictly between"));
        assert!(check_port_spec(&port("10><10")).is_some());
        assert!(check_port_spec(&port("10><12")).is_none());
    }

    #[test]
    fn test_check_port_spec_edges() {
        assert!(check_port_spec(&port("<0")).is_some());
        assert!(check_port_spec(&port(">65535")).is_some());
        assert!(check_port_spec(&port("0")).unwrap().contains("reserved"));
        assert!(check_port_spec(&port("0<>65535")).is_some());
    }

    #[test]
    fn test_check_port_spec_normal() {
        for expr in ["", "80", "!=22", "<1024", ">=1024", "1:1024", "10<>20"] {
            assert!(check_port_spec(&port(expr)).is_none(), "{expr}");
        }
    }

    #[test]
    fn test_check_reserved_ipv4() {
        assert!(check_reserved_address(&addr("10.0.0.0/8")).unwrap().contains("RFC 1918"));
        assert!(check_reserved_address(&addr("192.168.1.5")).unwrap().contains("RFC 1918"));
        assert!(check_reserved_address(&addr("127.0.0.1")).unwrap().contains("Loopback"));
        assert!(check_reserved_address(&addr("169.254.1.1")).unwrap().contains("Link-local"));
        assert!(check_reserved_address(&addr("255.255.255.255")).unwrap().contains("Broadcast"));
        assert!(check_reserved_address(&addr("8.8.8.8")).is_none());
    }

    #[test]
    fn test_check_reserved_ipv6() {
        assert!(check_reserved_address(&addr("::1")).unwrap().contains("loopback"));
        assert!(check_reserved_address(&addr("fe80::1")).unwrap().contains("link-local"));
        assert!(check_reserved_address(&addr("fd00::/8")).unwrap().contains("unique local"));
        assert!(check_reserved_address(&addr("::ffff:8.8.8.8")).unwrap().contains("mapped"));
        assert!(check_reserved_address(&addr("2001:4860::8888")).is_none());
    }

    #[test]
    fn test_check_reserved_default_route() {
        let any = check_reserved_address(&addr("0.0.0.0/0")).unwrap();
        assert!(any.contains("every inet address"));
        let none = check_reserved_address(&parse_address("::/0", true).unwrap()).unwrap();
        assert!(none.contains("no inet6 address"));
    }
}
