//! Shared test utilities for library tests
//!
//! Provides common builders to avoid duplication across test suites.
//! This module is only compiled in test mode.

use crate::core::address::{NetworkAddress, parse_address};
use crate::core::port::{PortSpec, parse_port};
use crate::rules_file::{EndpointText, RuleEntry};

/// Parses an address that the test knows to be valid.
pub fn addr(text: &str) -> NetworkAddress {
    parse_address(text, false).unwrap_or_else(|e| panic!("bad test address {text:?}: {e}"))
}

/// Parses a port expression that the test knows to be valid.
pub fn port(text: &str) -> PortSpec {
    parse_port(text).unwrap_or_else(|e| panic!("bad test port {text:?}: {e}"))
}

pub fn endpoint_text(address: &str, port: &str, negate: bool) -> EndpointText {
    EndpointText {
        address: address.to_string(),
        port: port.to_string(),
        negate,
    }
}

pub fn rule_entry(label: &str, from: Option<EndpointText>, to: Option<EndpointText>) -> RuleEntry {
    RuleEntry {
        label: label.to_string(),
        from,
        to,
    }
}
