//! Core rule endpoint parsing
//!
//! This module contains the parsers that turn rule endpoint text into
//! structured values. It provides:
//!
//! - [`address`]: Literal IP and CIDR parsing into [`address::NetworkAddress`]
//! - [`port`]: Port expression parsing into [`port::PortSpec`]
//! - [`endpoint`]: Endpoint building and the [`endpoint::Rule`] that owns endpoints
//! - [`error`]: Error types and user-facing translations

pub mod address;
pub mod endpoint;
pub mod error;
pub mod port;

#[cfg(test)]
pub mod test_helpers;
