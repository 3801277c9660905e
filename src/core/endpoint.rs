//! Rule endpoints and the rule that owns them
//!
//! An [`Endpoint`] is one side of a rule (source or destination): a
//! [`NetworkAddress`] plus a [`PortSpec`]. [`build_endpoint`] parses both from
//! text; [`Rule::parse_endpoint`] commits the result to a rule only when both
//! parts parsed, so a failed call leaves the rule untouched.
//!
//! Every endpoint knows its own address family. The rule additionally keeps a
//! recorded family that only the source side sets, which is what a packet
//! filter that tags the whole rule with one family expects. Use
//! [`Rule::address_family`] to get a family both sides agree on.
//!
//! # Example
//!
//! ```
//! use pfrule::core::address::AddressFamily;
//! use pfrule::core::endpoint::Rule;
//!
//! let mut rule = Rule::new("ssh from lan");
//! rule.parse_source("192.168.1.0/24", "", false).unwrap();
//! rule.parse_destination("192.168.1.10", "22", false).unwrap();
//! assert_eq!(rule.address_family().unwrap(), AddressFamily::Inet);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::address::{AddressFamily, NetworkAddress, parse_address};
use super::error::ParseError;
use super::port::{PortSpec, parse_port};

/// Which side of a rule an endpoint describes.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum Side {
    #[strum(serialize = "source")]
    Source,
    #[strum(serialize = "destination")]
    Destination,
}

/// One side of a rule: address and port selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    side: Side,
    family: AddressFamily,
    address: NetworkAddress,
    port: PortSpec,
}

impl Endpoint {
    pub fn side(&self) -> Side {
        self.side
    }

    /// Family inferred from this endpoint's own address text.
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }

    pub fn port(&self) -> &PortSpec {
        &self.port
    }
}

/// Parses the port expression and then the address for one rule side.
///
/// # Errors
///
/// Returns the first error met: a port error takes precedence over an
/// address error.
pub fn build_endpoint(
    side: Side,
    address: &str,
    port: &str,
    negate: bool,
) -> Result<Endpoint, ParseError> {
    let port = parse_port(port)?;
    let parsed = parse_address(address, negate)?;

    Ok(Endpoint {
        side,
        family: AddressFamily::infer(address),
        address: parsed,
        port,
    })
}

/// A rule owning at most one source and one destination endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub label: String,
    source: Option<Endpoint>,
    destination: Option<Endpoint>,
    family: AddressFamily,
}

impl Rule {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Builds an endpoint and stores it on `side`.
    ///
    /// Nothing is changed when parsing fails. A source endpoint also sets the
    /// recorded address family; a destination endpoint never does.
    pub fn parse_endpoint(
        &mut self,
        side: Side,
        address: &str,
        port: &str,
        negate: bool,
    ) -> Result<(), ParseError> {
        let endpoint = build_endpoint(side, address, port, negate)?;
        self.set_endpoint(endpoint);
        Ok(())
    }

    pub fn parse_source(&mut self, address: &str, port: &str, negate: bool) -> Result<(), ParseError> {
        self.parse_endpoint(Side::Source, address, port, negate)
    }

    pub fn parse_destination(
        &mut self,
        address: &str,
        port: &str,
        negate: bool,
    ) -> Result<(), ParseError> {
        self.parse_endpoint(Side::Destination, address, port, negate)
    }

    /// Stores an already built endpoint on the side it was built for.
    pub fn set_endpoint(&mut self, endpoint: Endpoint) {
        debug!(
            "Rule '{}': {} set to {} port '{}'",
            self.label,
            endpoint.side,
            endpoint.address,
            endpoint.port
        );
        match endpoint.side {
            Side::Source => {
                self.family = endpoint.family;
                self.source = Some(endpoint);
            }
            Side::Destination => self.destination = Some(endpoint),
        }
    }

    pub fn source(&self) -> Option<&Endpoint> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&Endpoint> {
        self.destination.as_ref()
    }

    /// Family as last set by a source endpoint, `Inet` if none was parsed.
    pub fn recorded_family(&self) -> AddressFamily {
        self.family
    }

    /// Family shared by both endpoints.
    ///
    /// With only one endpoint present its family wins; with none, the
    /// recorded family is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::AddressFamilyConflict`] when source and
    /// destination use different families.
    pub fn address_family(&self) -> Result<AddressFamily, ParseError> {
        match (&self.source, &self.destination) {
            (Some(src), Some(dst)) if src.family != dst.family => {
                Err(ParseError::AddressFamilyConflict {
                    source_family: src.family,
                    destination_family: dst.family,
                })
            }
            (Some(endpoint), _) | (None, Some(endpoint)) => Ok(endpoint.family),
            (None, None) => Ok(self.family),
        }
    }
}
