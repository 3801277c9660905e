//! Address parsing for rule endpoints
//!
//! Turns a literal IP (`10.0.0.1`, `fe80::1`) or CIDR network
//! (`192.168.0.0/16`, `2001:db8::/32`) into a [`NetworkAddress`]: the address
//! family, the network address and its mask, plus the negation flag.
//!
//! A bare literal gets an all-ones mask (/32 for IPv4, /128 for IPv6). A CIDR
//! network is stored with its host bits cleared, so `10.1.2.3/8` and
//! `10.0.0.0/8` produce the same value.
//!
//! # Example
//!
//! ```
//! use pfrule::core::address::{parse_address, AddressFamily};
//!
//! let addr = parse_address("192.168.1.0/24", false).unwrap();
//! assert_eq!(addr.family(), AddressFamily::Inet);
//! assert_eq!(addr.mask_bytes(), vec![255, 255, 255, 0]);
//! ```

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;

use super::error::ParseError;

/// IP address family of an endpoint or rule.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4
    #[default]
    #[strum(serialize = "inet")]
    Inet,
    /// IPv6
    #[strum(serialize = "inet6")]
    Inet6,
}

impl AddressFamily {
    /// Guesses the family from raw address text: anything containing a
    /// colon is IPv6.
    ///
    /// This is purely textual and does not validate the address.
    pub fn infer(text: &str) -> Self {
        if text.contains(':') {
            AddressFamily::Inet6
        } else {
            AddressFamily::Inet
        }
    }

    /// Address width in bytes (4 or 16)
    pub const fn width(self) -> usize {
        match self {
            AddressFamily::Inet => 4,
            AddressFamily::Inet6 => 16,
        }
    }

    /// Longest valid prefix length (32 or 128)
    pub const fn max_prefix(self) -> u8 {
        match self {
            AddressFamily::Inet => 32,
            AddressFamily::Inet6 => 128,
        }
    }
}

impl From<IpAddr> for AddressFamily {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Inet,
            IpAddr::V6(_) => AddressFamily::Inet6,
        }
    }
}

/// A parsed, possibly negated, network address.
///
/// Address and mask always share the same family and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredAddress")]
pub struct NetworkAddress {
    network: IpNetwork,
    negate: bool,
}

/// Serialized form, re-parsed on load so host bits are always cleared.
#[derive(Deserialize)]
struct StoredAddress {
    network: IpNetwork,
    #[serde(default)]
    negate: bool,
}

impl TryFrom<StoredAddress> for NetworkAddress {
    type Error = ParseError;

    fn try_from(stored: StoredAddress) -> Result<Self, Self::Error> {
        parse_address(&stored.network.to_string(), stored.negate)
    }
}

impl NetworkAddress {
    pub fn family(&self) -> AddressFamily {
        AddressFamily::from(self.network.ip())
    }

    /// Network address with host bits cleared.
    pub fn address(&self) -> IpAddr {
        self.network.ip()
    }

    pub fn mask(&self) -> IpAddr {
        self.network.mask()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn network(&self) -> IpNetwork {
        self.network
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Address in network byte order, 4 or 16 bytes.
    pub fn address_bytes(&self) -> Vec<u8> {
        octets(self.address())
    }

    /// Mask in network byte order, same width as [`Self::address_bytes`].
    pub fn mask_bytes(&self) -> Vec<u8> {
        octets(self.mask())
    }

    /// Returns `true` when the mask covers the whole address (single host).
    pub fn is_host(&self) -> bool {
        self.prefix() == self.family().max_prefix()
    }
}

fn octets(ip: IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            f.write_str("!")?;
        }
        if self.is_host() {
            write!(f, "{}", self.address())
        } else {
            write!(f, "{}/{}", self.address(), self.prefix())
        }
    }
}

/// Parses `[!]ADDRESS[/PREFIX]`, taking the negation from a leading `!`.
impl FromStr for NetworkAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('!') {
            Some(rest) => parse_address(rest, true),
            None => parse_address(s, false),
        }
    }
}

/// Parses a literal IP or CIDR network into a [`NetworkAddress`].
///
/// Surrounding whitespace is ignored. `negate` is stored as given.
///
/// # Errors
///
/// Returns [`ParseError::InvalidAddress`] if the text is not an IP literal,
/// the prefix is not a decimal number, or the prefix is longer than the
/// address family allows.
pub fn parse_address(text: &str, negate: bool) -> Result<NetworkAddress, ParseError> {
    let trimmed = text.trim();

    let network = match trimmed.split_once('/') {
        Some((ip, prefix)) => parse_cidr(trimmed, ip, prefix)?,
        None => {
            let ip = parse_literal(trimmed, trimmed)?;
            let max = AddressFamily::from(ip).max_prefix();
            IpNetwork::new(ip, max)
                .map_err(|e| ParseError::invalid_address(trimmed, e.to_string()))?
        }
    };

    debug!("Parsed address '{}' as {} (negate: {})", trimmed, network, negate);

    Ok(NetworkAddress { network, negate })
}

fn parse_literal(input: &str, literal: &str) -> Result<IpAddr, ParseError> {
    if literal.is_empty() {
        return Err(ParseError::invalid_address(input, "address is empty"));
    }
    literal
        .parse::<IpAddr>()
        .map_err(|e| ParseError::invalid_address(input, e.to_string()))
}

fn parse_cidr(input: &str, ip: &str, prefix: &str) -> Result<IpNetwork, ParseError> {
    let ip = parse_literal(input, ip)?;

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::invalid_address(
            input,
            "prefix length must be a decimal number",
        ));
    }

    let max = AddressFamily::from(ip).max_prefix();
    let prefix: u8 = prefix
        .parse()
        .ok()
        .filter(|p| *p <= max)
        .ok_or_else(|| {
            ParseError::invalid_address(input, format!("prefix length must be 0-{max}"))
        })?;

    let network = IpNetwork::new(ip, prefix)
        .map_err(|e| ParseError::invalid_address(input, e.to_string()))?;

    // Clear host bits so the stored address is the network itself
    IpNetwork::new(network.network(), prefix)
        .map_err(|e| ParseError::invalid_address(input, e.to_string()))
}
