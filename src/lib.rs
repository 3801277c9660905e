//! pfrule - packet-filter rule endpoint parser
//!
//! Parses the textual endpoint of a firewall rule (an address with optional
//! negation and CIDR prefix, and a port expression) into structured values a
//! packet-filter control plane can consume.
//!
//! # Architecture
//!
//! - [`core`] - Address, port and endpoint parsers, errors
//! - [`rules_file`] - JSON rules files built into rules
//! - [`check`] - Per-rule diagnostics for a rules file
//! - [`validators`] - Informational warnings on parsed values
//! - [`config`] - Checker configuration
//! - [`utils`] - Utility functions (XDG directories, etc.)
//!
//! # Example
//!
//! ```
//! use pfrule::{parse_address, parse_port, PortOperator};
//!
//! let addr = parse_address("10.0.0.0/8", true).unwrap();
//! assert!(addr.is_negated());
//!
//! let port = parse_port("10<>20").unwrap();
//! assert_eq!(port.operator(), PortOperator::RangeExcept);
//! ```

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod check;
pub mod config;
pub mod core;
pub mod rules_file;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use core::address::{AddressFamily, NetworkAddress, parse_address};
pub use core::endpoint::{Endpoint, Rule, Side, build_endpoint};
pub use core::error::{Error, ParseError, Result};
pub use core::port::{NetworkPort, PortOperator, PortSpec, parse_port};
